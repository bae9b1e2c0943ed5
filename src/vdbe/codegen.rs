//! Expression code generation
//!
//! Walks an expression subtree and emits VDBE instructions into a
//! `ProgramBuilder`, returning the register that will hold the result.
//! Registers are allocated monotonically from 1. AND/OR, CASE, and IN
//! emit forward jumps that are recorded and patched before the emitting
//! routine returns, so callers always observe a fully patched program.

use std::collections::HashMap;

use crate::error::{Error, ErrorCode, Result};
use crate::parser::ast::{
    BinaryOp, ColumnRef, Expr, FunctionArgs, FunctionCall, InList, Literal, LikeOp, TypeName,
    UnaryOp, Variable, WhenClause,
};
use crate::schema::SchemaLookup;
use crate::vdbe::builder::ProgramBuilder;
use crate::vdbe::ops::{Opcode, P4};

// ============================================================================
// Code Generator
// ============================================================================

/// Expression code generator
///
/// One instance per statement: it owns the builder, the monotone
/// register counter, and the mapping from table names (or aliases) to
/// the cursors the surrounding query plan opened.
pub struct CodeGenerator<'a> {
    builder: ProgramBuilder,
    next_register: i32,
    cursors: HashMap<String, i32>,
    schema: Option<&'a dyn SchemaLookup>,
    /// Highest bound-variable number handed out so far
    max_param: i32,
    /// Numbers assigned to named parameters, in order of appearance
    param_names: HashMap<String, i32>,
}

impl<'a> CodeGenerator<'a> {
    /// Create a generator without schema access; column indices fall
    /// back to 0 and are recorded in instruction comments
    pub fn new() -> Self {
        CodeGenerator {
            builder: ProgramBuilder::new(),
            next_register: 1,
            cursors: HashMap::new(),
            schema: None,
            max_param: 0,
            param_names: HashMap::new(),
        }
    }

    /// Create a generator that resolves column indices through a schema
    pub fn with_schema(schema: &'a dyn SchemaLookup) -> Self {
        CodeGenerator {
            schema: Some(schema),
            ..CodeGenerator::new()
        }
    }

    /// Bind a table name (or alias) to a cursor id
    pub fn register_cursor(&mut self, name: impl Into<String>, cursor: i32) {
        self.cursors.insert(name.into().to_lowercase(), cursor);
    }

    /// Allocate one register
    pub fn alloc_reg(&mut self) -> i32 {
        let reg = self.next_register;
        self.next_register += 1;
        self.builder.alloc_memory(reg);
        reg
    }

    /// Allocate n consecutive registers, returning the first
    pub fn alloc_regs(&mut self, n: i32) -> i32 {
        let first = self.next_register;
        self.next_register += n;
        self.builder.alloc_memory(self.next_register - 1);
        first
    }

    /// Access the builder (for planner-level emission around
    /// expressions)
    pub fn builder_mut(&mut self) -> &mut ProgramBuilder {
        &mut self.builder
    }

    /// View the builder
    pub fn builder(&self) -> &ProgramBuilder {
        &self.builder
    }

    /// Finish, handing the accumulated program back
    pub fn finish(self) -> ProgramBuilder {
        self.builder
    }

    /// Patch a recorded forward jump to the current end of the program
    pub fn patch_jump(&mut self, addr: i32) {
        let target = self.builder.num_ops();
        self.builder.change_p2(addr, target);
    }

    // ========================================================================
    // Primary Contract
    // ========================================================================

    /// Generate instructions that leave the expression's value in the
    /// returned register
    pub fn generate_expr(&mut self, expr: &Expr) -> Result<i32> {
        match expr {
            Expr::Literal(lit) => self.generate_literal(lit),
            Expr::Column(col) => self.generate_column(col),
            Expr::Variable(var) => self.generate_variable(var),
            Expr::Unary { op, expr } => self.generate_unary(*op, expr),
            Expr::Binary { op, left, right } => self.generate_binary(*op, left, right),
            Expr::IsNull { expr, negated } => self.generate_is_null(expr, *negated),
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => self.generate_between(expr, low, high, *negated),
            Expr::In {
                expr,
                list,
                negated,
            } => self.generate_in(expr, list, *negated),
            Expr::Like {
                expr,
                pattern,
                escape,
                op,
                negated,
            } => self.generate_like(expr, pattern, escape.as_deref(), *op, *negated),
            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => self.generate_case(operand.as_deref(), when_clauses, else_clause.as_deref()),
            Expr::Cast { expr, type_name } => self.generate_cast(expr, type_name),
            Expr::Function(call) => self.generate_function(call),
            Expr::Collate { expr, .. } => self.generate_expr(expr),
            Expr::Parens(inner) => self.generate_expr(inner),
            Expr::Subquery(_) | Expr::Exists { .. } => Err(Error::with_message(
                ErrorCode::Unsupported,
                "subquery expressions not yet implemented",
            )),
        }
    }

    /// Generate a boolean expression and a conditional jump taken when
    /// it is false, returning the jump's address for later patching
    pub fn generate_condition(&mut self, expr: &Expr, jump_if_false: i32) -> Result<i32> {
        let reg = self.generate_expr(expr)?;
        let addr = self.builder.add_op(Opcode::IfNot, reg, jump_if_false, 0);
        Ok(addr)
    }

    /// Generate a WHERE clause guarding a row; no-op without a clause
    pub fn generate_where_clause(
        &mut self,
        expr: Option<&Expr>,
        skip_label: i32,
    ) -> Result<Option<i32>> {
        match expr {
            Some(e) => Ok(Some(self.generate_condition(e, skip_label)?)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Literals, Columns, Variables
    // ========================================================================

    fn generate_literal(&mut self, lit: &Literal) -> Result<i32> {
        let reg = self.alloc_reg();
        match lit {
            Literal::Null => {
                self.builder.add_op(Opcode::Null, 0, reg, 0);
            }
            Literal::Integer(i) => {
                if *i >= i32::MIN as i64 && *i <= i32::MAX as i64 {
                    self.builder.add_op(Opcode::Integer, *i as i32, reg, 0);
                } else {
                    self.builder.add_op4(Opcode::Int64, 0, reg, 0, P4::Int64(*i));
                }
            }
            Literal::Float(f) => {
                self.builder.add_op4(Opcode::Real, 0, reg, 0, P4::Real(*f));
            }
            Literal::String(s) => {
                self.builder
                    .add_op4(Opcode::String8, 0, reg, 0, P4::Text(s.clone()));
            }
            Literal::Blob(b) => {
                self.builder
                    .add_op4(Opcode::Blob, b.len() as i32, reg, 0, P4::Blob(b.clone()));
            }
            Literal::CurrentTime => {
                self.builder
                    .add_op4(Opcode::Function, 0, 0, reg, P4::FuncDef("current_time".into()));
            }
            Literal::CurrentDate => {
                self.builder
                    .add_op4(Opcode::Function, 0, 0, reg, P4::FuncDef("current_date".into()));
            }
            Literal::CurrentTimestamp => {
                self.builder.add_op4(
                    Opcode::Function,
                    0,
                    0,
                    reg,
                    P4::FuncDef("current_timestamp".into()),
                );
            }
        }
        Ok(reg)
    }

    /// Column reference: the cursor comes from the registered map and
    /// the column index from the schema callback. Without a schema the
    /// index falls back to 0 and the intended column is kept in the
    /// instruction comment.
    fn generate_column(&mut self, col: &ColumnRef) -> Result<i32> {
        let resolved = self
            .schema
            .and_then(|s| s.resolve_column(col.table.as_deref(), &col.column));

        let table_name = match (&col.table, &resolved) {
            (Some(t), _) => t.clone(),
            (None, Some(r)) => r.table.clone(),
            (None, None) => {
                // Unqualified and unresolvable: a single registered
                // cursor is unambiguous
                if self.cursors.len() == 1 {
                    self.cursors.keys().next().cloned().unwrap_or_default()
                } else {
                    return Err(Error::with_message(
                        ErrorCode::NotFound,
                        format!("unknown column: {}", col.column),
                    ));
                }
            }
        };

        let cursor = match self.cursors.get(&table_name.to_lowercase()) {
            Some(&c) => c,
            None => {
                return Err(Error::with_message(
                    ErrorCode::NotFound,
                    format!("unknown table: {}", table_name),
                ));
            }
        };

        let index = resolved.as_ref().map(|r| r.index as i32).unwrap_or(0);

        let reg = self.alloc_reg();
        let addr = self.builder.add_op(Opcode::Column, cursor, index, reg);
        self.builder
            .set_comment(addr, format!("{}.{}", table_name, col.column));
        Ok(reg)
    }

    fn generate_variable(&mut self, var: &Variable) -> Result<i32> {
        let reg = self.alloc_reg();
        match var {
            Variable::Numbered(Some(n)) => {
                if *n < 1 {
                    return Err(Error::with_message(
                        ErrorCode::Range,
                        format!("variable number must be ?1 or greater: ?{}", n),
                    ));
                }
                self.max_param = self.max_param.max(*n);
                self.builder.add_op(Opcode::Variable, *n, reg, 0);
            }
            Variable::Numbered(None) => {
                // Bare ? takes the next number after the largest seen
                self.max_param += 1;
                self.builder.add_op(Opcode::Variable, self.max_param, reg, 0);
            }
            Variable::Named(name) => {
                let n = match self.param_names.get(name) {
                    Some(&n) => n,
                    None => {
                        self.max_param += 1;
                        self.param_names.insert(name.clone(), self.max_param);
                        self.max_param
                    }
                };
                let addr = self.builder.add_op(Opcode::Variable, n, reg, 0);
                self.builder
                    .set_comment(addr, name.clone());
            }
        }
        Ok(reg)
    }

    // ========================================================================
    // Unary Operators
    // ========================================================================

    fn generate_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<i32> {
        match op {
            // Unary plus is transparent
            UnaryOp::Pos => self.generate_expr(operand),

            UnaryOp::Not => {
                let r = self.generate_expr(operand)?;
                let reg = self.alloc_reg();
                self.builder.add_op(Opcode::Not, r, reg, 0);
                Ok(reg)
            }

            UnaryOp::BitNot => {
                let r = self.generate_expr(operand)?;
                let reg = self.alloc_reg();
                self.builder.add_op(Opcode::BitNot, r, reg, 0);
                Ok(reg)
            }

            // Negation is subtraction from zero; no dedicated opcode
            UnaryOp::Neg => {
                let r = self.generate_expr(operand)?;
                let zero = self.alloc_reg();
                self.builder.add_op(Opcode::Integer, 0, zero, 0);
                let reg = self.alloc_reg();
                self.builder.add_op(Opcode::Subtract, r, zero, reg);
                Ok(reg)
            }
        }
    }

    fn generate_is_null(&mut self, operand: &Expr, negated: bool) -> Result<i32> {
        let r = self.generate_expr(operand)?;
        let reg = self.alloc_reg();
        let opcode = if negated {
            Opcode::NotNull
        } else {
            Opcode::IsNull
        };
        self.builder.add_op(opcode, r, reg, 0);
        Ok(reg)
    }

    // ========================================================================
    // Binary Operators
    // ========================================================================

    fn generate_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<i32> {
        // AND/OR short-circuit instead of evaluating both sides
        match op {
            BinaryOp::And => return self.generate_and(left, right),
            BinaryOp::Or => return self.generate_or(left, right),
            _ => {}
        }

        let opcode = match op {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Subtract,
            BinaryOp::Mul => Opcode::Multiply,
            BinaryOp::Div => Opcode::Divide,
            BinaryOp::Mod => Opcode::Remainder,
            BinaryOp::Concat => Opcode::Concat,
            BinaryOp::BitAnd => Opcode::BitAnd,
            BinaryOp::BitOr => Opcode::BitOr,
            BinaryOp::ShiftLeft => Opcode::ShiftLeft,
            BinaryOp::ShiftRight => Opcode::ShiftRight,
            BinaryOp::Eq | BinaryOp::Is => Opcode::Eq,
            BinaryOp::Ne | BinaryOp::IsNot => Opcode::Ne,
            BinaryOp::Lt => Opcode::Lt,
            BinaryOp::Le => Opcode::Le,
            BinaryOp::Gt => Opcode::Gt,
            BinaryOp::Ge => Opcode::Ge,
            BinaryOp::And | BinaryOp::Or => unreachable!(),
        };

        let l = self.generate_expr(left)?;
        let r = self.generate_expr(right)?;
        let reg = self.alloc_reg();
        self.builder.add_op(opcode, l, r, reg);
        Ok(reg)
    }

    /// Short-circuit AND: the right-hand side only executes when the
    /// left-hand result register is truthy
    fn generate_and(&mut self, left: &Expr, right: &Expr) -> Result<i32> {
        let result = self.alloc_reg();

        let l = self.generate_expr(left)?;
        self.builder.add_op(Opcode::Copy, l, result, 0);

        let skip = self.builder.add_op(Opcode::IfNot, result, 0, 0);

        let r = self.generate_expr(right)?;
        self.builder.add_op(Opcode::Copy, r, result, 0);

        self.patch_jump(skip);
        Ok(result)
    }

    /// Short-circuit OR, symmetric to AND with an If jump
    fn generate_or(&mut self, left: &Expr, right: &Expr) -> Result<i32> {
        let result = self.alloc_reg();

        let l = self.generate_expr(left)?;
        self.builder.add_op(Opcode::Copy, l, result, 0);

        let skip = self.builder.add_op(Opcode::If, result, 0, 0);

        let r = self.generate_expr(right)?;
        self.builder.add_op(Opcode::Copy, r, result, 0);

        self.patch_jump(skip);
        Ok(result)
    }

    // ========================================================================
    // BETWEEN / IN / LIKE
    // ========================================================================

    fn generate_between(
        &mut self,
        expr: &Expr,
        low: &Expr,
        high: &Expr,
        negated: bool,
    ) -> Result<i32> {
        let probe = self.generate_expr(expr)?;
        let lo = self.generate_expr(low)?;
        let hi = self.generate_expr(high)?;

        let c1 = self.alloc_reg();
        self.builder.add_op(Opcode::Ge, probe, lo, c1);
        let c2 = self.alloc_reg();
        self.builder.add_op(Opcode::Le, probe, hi, c2);

        let result = self.alloc_reg();
        self.builder.add_op(Opcode::And, c1, c2, result);

        if negated {
            let neg = self.alloc_reg();
            self.builder.add_op(Opcode::Not, result, neg, 0);
            return Ok(neg);
        }
        Ok(result)
    }

    fn generate_in(&mut self, expr: &Expr, list: &InList, negated: bool) -> Result<i32> {
        let items = match list {
            InList::Values(items) => items,
            InList::Subquery(_) => {
                return Err(Error::with_message(
                    ErrorCode::Unsupported,
                    "subquery expressions not yet implemented",
                ));
            }
        };

        let probe = self.generate_expr(expr)?;
        let result = self.alloc_reg();
        self.builder.add_op(Opcode::Integer, 0, result, 0);

        let mut end_jumps = Vec::new();
        for item in items {
            let vr = self.generate_expr(item)?;
            let c = self.alloc_reg();
            self.builder.add_op(Opcode::Eq, probe, vr, c);
            let skip = self.builder.add_op(Opcode::If, c, 0, 0);
            self.builder.add_op(Opcode::Integer, 1, result, 0);
            end_jumps.push(self.builder.add_op(Opcode::Goto, 0, 0, 0));
            self.patch_jump(skip);
        }

        for addr in end_jumps {
            self.patch_jump(addr);
        }

        if negated {
            let neg = self.alloc_reg();
            self.builder.add_op(Opcode::Not, result, neg, 0);
            return Ok(neg);
        }
        Ok(result)
    }

    /// LIKE and friends lower to a function-call stub carrying the
    /// operator name; a dedicated opcode may replace this later
    fn generate_like(
        &mut self,
        expr: &Expr,
        pattern: &Expr,
        escape: Option<&Expr>,
        op: LikeOp,
        negated: bool,
    ) -> Result<i32> {
        let name = match op {
            LikeOp::Like => "like",
            LikeOp::Glob => "glob",
            LikeOp::Regexp => "regexp",
            LikeOp::Match => "match",
        };

        // Argument order matches the like(P, X [, E]) function: pattern
        // first
        let pattern_reg = self.generate_expr(pattern)?;
        self.generate_expr(expr)?;
        let mut argc = 2;
        if let Some(esc) = escape {
            self.generate_expr(esc)?;
            argc = 3;
        }

        let result = self.alloc_reg();
        self.builder.add_op4(
            Opcode::Function,
            pattern_reg,
            argc,
            result,
            P4::FuncDef(name.to_string()),
        );

        if negated {
            let neg = self.alloc_reg();
            self.builder.add_op(Opcode::Not, result, neg, 0);
            return Ok(neg);
        }
        Ok(result)
    }

    // ========================================================================
    // CASE / CAST
    // ========================================================================

    fn generate_case(
        &mut self,
        operand: Option<&Expr>,
        when_clauses: &[WhenClause],
        else_clause: Option<&Expr>,
    ) -> Result<i32> {
        let result = self.alloc_reg();

        let base = match operand {
            Some(e) => Some(self.generate_expr(e)?),
            None => None,
        };

        let mut end_jumps = Vec::new();
        for wc in when_clauses {
            // With a base operand each WHEN compares against it;
            // otherwise the WHEN is its own boolean condition
            let cond = match base {
                Some(base_reg) => {
                    let wr = self.generate_expr(&wc.when)?;
                    let c = self.alloc_reg();
                    self.builder.add_op(Opcode::Eq, base_reg, wr, c);
                    c
                }
                None => self.generate_expr(&wc.when)?,
            };

            let skip = self.builder.add_op(Opcode::IfNot, cond, 0, 0);

            let then = self.generate_expr(&wc.then)?;
            self.builder.add_op(Opcode::Copy, then, result, 0);
            end_jumps.push(self.builder.add_op(Opcode::Goto, 0, 0, 0));

            self.patch_jump(skip);
        }

        match else_clause {
            Some(e) => {
                let er = self.generate_expr(e)?;
                self.builder.add_op(Opcode::Copy, er, result, 0);
            }
            None => {
                self.builder.add_op(Opcode::Null, 0, result, 0);
            }
        }

        for addr in end_jumps {
            self.patch_jump(addr);
        }

        Ok(result)
    }

    fn generate_cast(&mut self, expr: &Expr, type_name: &TypeName) -> Result<i32> {
        let inner = self.generate_expr(expr)?;
        let reg = self.alloc_reg();
        self.builder.add_op4(
            Opcode::Cast,
            inner,
            reg,
            0,
            P4::Text(type_name.to_string()),
        );
        Ok(reg)
    }

    // ========================================================================
    // Function Calls
    // ========================================================================

    /// Scalar function call. COUNT(*) currently emits a constant 1
    /// placeholder; aggregates proper belong to the surrounding query
    /// compiler, which also consumes any FILTER clause.
    fn generate_function(&mut self, call: &FunctionCall) -> Result<i32> {
        let args = match &call.args {
            FunctionArgs::Star => {
                if call.name.eq_ignore_ascii_case("count") {
                    let reg = self.alloc_reg();
                    let addr = self.builder.add_op(Opcode::Integer, 1, reg, 0);
                    self.builder.set_comment(addr, "COUNT(*) placeholder");
                    return Ok(reg);
                }
                return Err(Error::with_message(
                    ErrorCode::Misuse,
                    format!("misuse of * in function {}", call.name),
                ));
            }
            FunctionArgs::List(args) => args,
        };

        let mut first_arg = 0;
        for (i, arg) in args.iter().enumerate() {
            let reg = self.generate_expr(arg)?;
            if i == 0 {
                first_arg = reg;
            }
        }

        let result = self.alloc_reg();
        self.builder.add_op4(
            Opcode::Function,
            first_arg,
            args.len() as i32,
            result,
            P4::FuncDef(call.name.clone()),
        );
        Ok(result)
    }
}

impl Default for CodeGenerator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::parse_expression;
    use crate::vdbe::ops::VdbeOp;

    fn gen(sql: &str) -> (i32, Vec<VdbeOp>) {
        let expr = parse_expression(sql).unwrap();
        let mut g = CodeGenerator::new();
        g.register_cursor("t", 0);
        let reg = g.generate_expr(&expr).unwrap();
        (reg, g.finish().build())
    }

    fn opcodes(ops: &[VdbeOp]) -> Vec<Opcode> {
        ops.iter().map(|op| op.opcode).collect()
    }

    #[test]
    fn test_generate_null() {
        let (reg, ops) = gen("NULL");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].opcode, Opcode::Null);
        assert_eq!(ops[0].p2, reg);
    }

    #[test]
    fn test_generate_integer_widths() {
        let (reg, ops) = gen("42");
        assert_eq!(ops[0].opcode, Opcode::Integer);
        assert_eq!(ops[0].p1, 42);
        assert_eq!(ops[0].p2, reg);

        let (_, ops) = gen("5000000000");
        assert_eq!(ops[0].opcode, Opcode::Int64);
        assert_eq!(ops[0].p4, P4::Int64(5_000_000_000));
    }

    #[test]
    fn test_generate_real_string_blob() {
        let (_, ops) = gen("2.5");
        assert_eq!(ops[0].opcode, Opcode::Real);
        assert_eq!(ops[0].p4, P4::Real(2.5));

        let (_, ops) = gen("'hi'");
        assert_eq!(ops[0].opcode, Opcode::String8);
        assert_eq!(ops[0].p4, P4::Text("hi".to_string()));

        let (_, ops) = gen("X'AB'");
        assert_eq!(ops[0].opcode, Opcode::Blob);
        assert_eq!(ops[0].p1, 1);
    }

    #[test]
    fn test_generate_column() {
        let (reg, ops) = gen("t.x");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].opcode, Opcode::Column);
        assert_eq!(ops[0].p1, 0); // cursor
        assert_eq!(ops[0].p2, 0); // stub column index
        assert_eq!(ops[0].p3, reg);
        assert_eq!(ops[0].comment.as_deref(), Some("t.x"));
    }

    #[test]
    fn test_generate_column_unknown_table() {
        let expr = parse_expression("missing.x").unwrap();
        let mut g = CodeGenerator::new();
        g.register_cursor("t", 0);
        let err = g.generate_expr(&expr).unwrap_err();
        assert_eq!(err.to_string(), "unknown table: missing");
    }

    #[test]
    fn test_generate_arithmetic() {
        let (reg, ops) = gen("10 + 20");
        assert_eq!(
            opcodes(&ops),
            vec![Opcode::Integer, Opcode::Integer, Opcode::Add]
        );
        assert_eq!(ops[2].p1, ops[0].p2);
        assert_eq!(ops[2].p2, ops[1].p2);
        assert_eq!(ops[2].p3, reg);
    }

    #[test]
    fn test_generate_comparison_stores_result() {
        let (reg, ops) = gen("1 < 2");
        assert_eq!(
            opcodes(&ops),
            vec![Opcode::Integer, Opcode::Integer, Opcode::Lt]
        );
        assert_eq!(ops[2].p3, reg);
    }

    #[test]
    fn test_generate_and_short_circuit() {
        let (_, ops) = gen("a AND b");
        // Column, Copy, IfNot, Column, Copy
        assert_eq!(
            opcodes(&ops),
            vec![
                Opcode::Column,
                Opcode::Copy,
                Opcode::IfNot,
                Opcode::Column,
                Opcode::Copy
            ]
        );
        // The IfNot skips past the right-hand side
        assert_eq!(ops[2].p2, ops.len() as i32);
    }

    #[test]
    fn test_generate_or_short_circuit() {
        let (_, ops) = gen("a OR b");
        assert_eq!(
            opcodes(&ops),
            vec![
                Opcode::Column,
                Opcode::Copy,
                Opcode::If,
                Opcode::Column,
                Opcode::Copy
            ]
        );
        assert_eq!(ops[2].p2, ops.len() as i32);
    }

    #[test]
    fn test_generate_negate_uses_subtract() {
        let (_, ops) = gen("-x");
        assert_eq!(
            opcodes(&ops),
            vec![Opcode::Column, Opcode::Integer, Opcode::Subtract]
        );
        assert_eq!(ops[1].p1, 0);
    }

    #[test]
    fn test_generate_not_and_bitnot() {
        let (_, ops) = gen("NOT x");
        assert_eq!(opcodes(&ops), vec![Opcode::Column, Opcode::Not]);

        let (_, ops) = gen("~x");
        assert_eq!(opcodes(&ops), vec![Opcode::Column, Opcode::BitNot]);
    }

    #[test]
    fn test_generate_is_null() {
        let (_, ops) = gen("x IS NULL");
        assert_eq!(opcodes(&ops), vec![Opcode::Column, Opcode::IsNull]);

        let (_, ops) = gen("x IS NOT NULL");
        assert_eq!(opcodes(&ops), vec![Opcode::Column, Opcode::NotNull]);
    }

    #[test]
    fn test_generate_in_list() {
        let (_, ops) = gen("x IN (1, 2, 3)");
        let eq_count = ops.iter().filter(|op| op.opcode == Opcode::Eq).count();
        assert_eq!(eq_count, 3);
        // Every forward jump is patched inside the program
        for op in &ops {
            if op.opcode.is_jump() {
                assert!(op.p2 >= 0 && op.p2 <= ops.len() as i32);
            }
        }
    }

    #[test]
    fn test_generate_not_in_wraps() {
        let (_, ops) = gen("x NOT IN (1, 2)");
        assert_eq!(ops.last().unwrap().opcode, Opcode::Not);
    }

    #[test]
    fn test_generate_between() {
        let (_, ops) = gen("x BETWEEN 1 AND 10");
        let kinds = opcodes(&ops);
        assert!(kinds.contains(&Opcode::Ge));
        assert!(kinds.contains(&Opcode::Le));
        assert_eq!(*kinds.last().unwrap(), Opcode::And);

        let (_, ops) = gen("x NOT BETWEEN 1 AND 10");
        assert_eq!(ops.last().unwrap().opcode, Opcode::Not);
    }

    #[test]
    fn test_generate_case_searched() {
        let (_, ops) = gen("CASE WHEN x > 0 THEN 'pos' ELSE 'neg' END");
        let kinds = opcodes(&ops);
        assert!(kinds.contains(&Opcode::IfNot));
        assert!(kinds.contains(&Opcode::Goto));
        assert!(kinds.contains(&Opcode::Copy));
        for op in &ops {
            if op.opcode.is_jump() {
                assert!(op.p2 > 0 && op.p2 <= ops.len() as i32);
            }
        }
    }

    #[test]
    fn test_generate_case_with_operand_no_else() {
        let (_, ops) = gen("CASE x WHEN 1 THEN 'one' END");
        let kinds = opcodes(&ops);
        // Base comparison plus the implicit NULL else
        assert!(kinds.contains(&Opcode::Eq));
        assert!(kinds.contains(&Opcode::Null));
    }

    #[test]
    fn test_generate_cast() {
        let (reg, ops) = gen("CAST(x AS INTEGER)");
        let cast = ops.last().unwrap();
        assert_eq!(cast.opcode, Opcode::Cast);
        assert_eq!(cast.p2, reg);
        assert_eq!(cast.p4, P4::Text("INTEGER".to_string()));
    }

    #[test]
    fn test_generate_like_stub() {
        let (_, ops) = gen("x LIKE 'a%'");
        let func = ops
            .iter()
            .find(|op| op.opcode == Opcode::Function)
            .unwrap();
        assert_eq!(func.p2, 2);
        assert_eq!(func.p4, P4::FuncDef("like".to_string()));

        let (_, ops) = gen("x NOT GLOB 'a*'");
        let func = ops
            .iter()
            .find(|op| op.opcode == Opcode::Function)
            .unwrap();
        assert_eq!(func.p4, P4::FuncDef("glob".to_string()));
        assert_eq!(ops.last().unwrap().opcode, Opcode::Not);
    }

    #[test]
    fn test_generate_like_escape_third_arg() {
        let (_, ops) = gen("x LIKE 'a\\%' ESCAPE '\\'");
        let func = ops
            .iter()
            .find(|op| op.opcode == Opcode::Function)
            .unwrap();
        assert_eq!(func.p2, 3);
    }

    #[test]
    fn test_generate_count_star_placeholder() {
        let (reg, ops) = gen("count(*)");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].opcode, Opcode::Integer);
        assert_eq!(ops[0].p1, 1);
        assert_eq!(ops[0].p2, reg);
    }

    #[test]
    fn test_generate_function_args() {
        let (reg, ops) = gen("substr(x, 1, 3)");
        let func = ops.last().unwrap();
        assert_eq!(func.opcode, Opcode::Function);
        assert_eq!(func.p2, 3);
        assert_eq!(func.p3, reg);
        assert_eq!(func.p4, P4::FuncDef("substr".to_string()));
    }

    #[test]
    fn test_generate_variables_numbering() {
        let expr = parse_expression("? + ?5 + ? + :a + :a").unwrap();
        let mut g = CodeGenerator::new();
        let _ = g.generate_expr(&expr).unwrap();
        let ops = g.finish().build();
        let vars: Vec<i32> = ops
            .iter()
            .filter(|op| op.opcode == Opcode::Variable)
            .map(|op| op.p1)
            .collect();
        // ? -> 1, ?5 -> 5, ? -> 6, :a -> 7 twice
        assert_eq!(vars, vec![1, 5, 6, 7, 7]);
    }

    #[test]
    fn test_generate_subquery_stub() {
        let expr = parse_expression("(SELECT 1)").unwrap();
        let mut g = CodeGenerator::new();
        let err = g.generate_expr(&expr).unwrap_err();
        assert_eq!(err.to_string(), "subquery expressions not yet implemented");
    }

    #[test]
    fn test_generate_condition_returns_patchable_addr() {
        let expr = parse_expression("x > 5").unwrap();
        let mut g = CodeGenerator::new();
        g.register_cursor("t", 0);
        let addr = g.generate_condition(&expr, 0).unwrap();
        g.patch_jump(addr);
        let ops = g.finish().build();
        assert_eq!(ops.last().unwrap().opcode, Opcode::IfNot);
        assert_eq!(ops[addr as usize].p2, ops.len() as i32);
    }

    #[test]
    fn test_generate_where_clause_noop() {
        let mut g = CodeGenerator::new();
        assert_eq!(g.generate_where_clause(None, 0).unwrap(), None);
        assert_eq!(g.builder().num_ops(), 0);
    }

    #[test]
    fn test_registers_monotonic() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let mut g = CodeGenerator::new();
        let reg = g.generate_expr(&expr).unwrap();
        let builder = g.finish();
        assert!(builder.num_mem() >= reg);
    }

    #[test]
    fn test_alloc_regs_block() {
        let mut g = CodeGenerator::new();
        let first = g.alloc_reg();
        assert_eq!(first, 1);
        let block = g.alloc_regs(5);
        assert_eq!(block, 2);
        assert_eq!(g.builder().num_mem(), 6);
    }
}
