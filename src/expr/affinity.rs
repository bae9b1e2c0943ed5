//! Type affinity
//!
//! Affinity governs how a value is coerced before comparison or storage
//! under a column. The rules follow section 3.1 of the SQLite datatype
//! documentation: a declared type string maps to one of five affinities
//! by substring matching, and expressions derive affinity from their
//! shape.

use crate::parser::ast::{BinaryOp, Expr, Literal, ResultColumn, SelectBody, SelectStmt, UnaryOp};
use crate::schema::SchemaLookup;
use crate::types::Value;

/// Column type affinity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    /// No affinity (bare expressions)
    #[default]
    None,
    /// BLOB affinity (no coercion)
    Blob,
    /// TEXT affinity
    Text,
    /// NUMERIC affinity (prefers integer, then real)
    Numeric,
    /// INTEGER affinity
    Integer,
    /// REAL affinity
    Real,
}

impl Affinity {
    /// Numeric affinities are NUMERIC, INTEGER, and REAL
    pub fn is_numeric(&self) -> bool {
        matches!(self, Affinity::Numeric | Affinity::Integer | Affinity::Real)
    }
}

/// Determine column affinity from a declared type string
///
/// The checks run in order:
/// 1. contains "INT" -> INTEGER
/// 2. contains "CHAR", "CLOB", or "TEXT" -> TEXT
/// 3. contains "BLOB" or empty -> BLOB
/// 4. contains "REAL", "FLOA", or "DOUB" -> REAL
/// 5. otherwise -> NUMERIC
pub fn type_affinity(type_name: &str) -> Affinity {
    if type_name.is_empty() {
        return Affinity::Blob;
    }

    let upper = type_name.to_uppercase();

    if upper.contains("INT") {
        return Affinity::Integer;
    }

    if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        return Affinity::Text;
    }

    if upper.contains("BLOB") {
        return Affinity::Blob;
    }

    if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        return Affinity::Real;
    }

    Affinity::Numeric
}

/// Apply an affinity to a value
///
/// A pure, non-failing conversion: values that cannot be converted pass
/// through unchanged, and applying the same affinity twice is a no-op.
pub fn apply_affinity(value: &Value, affinity: Affinity) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match affinity {
        Affinity::None | Affinity::Blob => value.clone(),

        Affinity::Integer => match value {
            Value::Integer(_) => value.clone(),
            Value::Real(f) => Value::Integer(*f as i64),
            Value::Text(s) => {
                let t = s.trim();
                if let Ok(i) = t.parse::<i64>() {
                    Value::Integer(i)
                } else if let Ok(f) = t.parse::<f64>() {
                    Value::Integer(f as i64)
                } else {
                    value.clone()
                }
            }
            _ => value.clone(),
        },

        Affinity::Real => match value {
            Value::Integer(i) => Value::Real(*i as f64),
            Value::Real(_) => value.clone(),
            Value::Text(s) => match s.trim().parse::<f64>() {
                Ok(f) => Value::Real(f),
                Err(_) => value.clone(),
            },
            _ => value.clone(),
        },

        Affinity::Numeric => match value {
            Value::Integer(_) | Value::Real(_) => value.clone(),
            Value::Text(s) => {
                let t = s.trim();
                if let Ok(i) = t.parse::<i64>() {
                    Value::Integer(i)
                } else if let Ok(f) = t.parse::<f64>() {
                    Value::Real(f)
                } else {
                    value.clone()
                }
            }
            _ => value.clone(),
        },

        Affinity::Text => match value {
            Value::Text(_) => value.clone(),
            _ => Value::Text(value.to_text()),
        },
    }
}

/// Affinity of an expression
///
/// Columns carry their stored affinity (resolved through the schema when
/// one is available), CAST carries the affinity of its target type,
/// COLLATE and unary + are transparent, and a scalar subquery takes the
/// affinity of its first result column. Everything else has no affinity.
pub fn expr_affinity(expr: &Expr, schema: Option<&dyn SchemaLookup>) -> Affinity {
    match expr {
        Expr::Column(col) => match schema
            .and_then(|s| s.resolve_column(col.table.as_deref(), &col.column))
        {
            Some(resolved) => type_affinity(resolved.decl_type.as_deref().unwrap_or("")),
            None => Affinity::None,
        },
        Expr::Cast { type_name, .. } => type_affinity(&type_name.name),
        Expr::Collate { expr, .. } => expr_affinity(expr, schema),
        Expr::Unary {
            op: UnaryOp::Pos,
            expr,
        } => expr_affinity(expr, schema),
        Expr::Parens(inner) => expr_affinity(inner, schema),
        Expr::Subquery(select) => first_column_affinity(select, schema),
        _ => Affinity::None,
    }
}

/// Affinity of the first result column of a SELECT
fn first_column_affinity(select: &SelectStmt, schema: Option<&dyn SchemaLookup>) -> Affinity {
    let mut body = &select.body;
    // Compound selects take the left-most core
    loop {
        match body {
            SelectBody::Select(core) => {
                return match core.columns.first() {
                    Some(ResultColumn::Expr { expr, .. }) => expr_affinity(expr, schema),
                    _ => Affinity::None,
                };
            }
            SelectBody::Compound { left, .. } => body = left.as_ref(),
        }
    }
}

/// Affinity to use when comparing two expressions
///
/// Both sides non-None with at least one numeric gives NUMERIC; both
/// non-None and neither numeric gives BLOB (no conversion); otherwise
/// the non-None side wins, or None when neither side has affinity.
pub fn comparison_affinity(
    left: &Expr,
    right: &Expr,
    schema: Option<&dyn SchemaLookup>,
) -> Affinity {
    let laff = expr_affinity(left, schema);
    let raff = expr_affinity(right, schema);

    match (laff, raff) {
        (Affinity::None, Affinity::None) => Affinity::None,
        (Affinity::None, aff) | (aff, Affinity::None) => aff,
        (l, r) => {
            if l.is_numeric() || r.is_numeric() {
                Affinity::Numeric
            } else {
                Affinity::Blob
            }
        }
    }
}

/// Result affinity of an expression after evaluation (post-order pass)
///
/// Arithmetic yields NUMERIC, concatenation TEXT, bitwise operators
/// INTEGER, and every predicate (comparisons, logic, IS, IN, BETWEEN,
/// LIKE, EXISTS) INTEGER as a boolean. Unary negate preserves a numeric
/// child's affinity; CASE takes the affinity its THEN/ELSE branches
/// agree on.
pub fn propagate_affinity(expr: &Expr, schema: Option<&dyn SchemaLookup>) -> Affinity {
    match expr {
        Expr::Binary { op, .. } => match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                Affinity::Numeric
            }
            BinaryOp::Concat => Affinity::Text,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
                Affinity::Integer
            }
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Is
            | BinaryOp::IsNot
            | BinaryOp::And
            | BinaryOp::Or => Affinity::Integer,
        },

        Expr::IsNull { .. }
        | Expr::In { .. }
        | Expr::Between { .. }
        | Expr::Like { .. }
        | Expr::Exists { .. } => Affinity::Integer,

        Expr::Unary { op, expr: inner } => match op {
            UnaryOp::Neg => {
                let child = propagate_affinity(inner, schema);
                if child.is_numeric() {
                    child
                } else {
                    Affinity::Numeric
                }
            }
            UnaryOp::Pos => propagate_affinity(inner, schema),
            UnaryOp::Not | UnaryOp::BitNot => Affinity::Integer,
        },

        Expr::Case {
            when_clauses,
            else_clause,
            ..
        } => {
            let mut common: Option<Affinity> = None;
            let branches = when_clauses
                .iter()
                .map(|wc| wc.then.as_ref())
                .chain(else_clause.iter().map(|e| e.as_ref()));
            for branch in branches {
                let aff = propagate_affinity(branch, schema);
                match common {
                    None => common = Some(aff),
                    Some(c) if c == aff => {}
                    Some(_) => return Affinity::None,
                }
            }
            common.unwrap_or(Affinity::None)
        }

        Expr::Parens(inner) => propagate_affinity(inner, schema),

        Expr::Literal(lit) => match lit {
            Literal::Integer(_) => Affinity::Integer,
            Literal::Float(_) => Affinity::Real,
            Literal::String(_) => Affinity::Text,
            Literal::Blob(_) => Affinity::Blob,
            _ => Affinity::None,
        },

        _ => expr_affinity(expr, schema),
    }
}
