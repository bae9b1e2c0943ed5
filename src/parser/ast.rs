//! Abstract Syntax Tree
//!
//! Defines the AST nodes for SQL statements and expressions. These
//! structures represent the parsed form of SQL before analysis and code
//! generation. Nodes carry no parent pointers; traversal is by explicit
//! recursion.

use std::fmt;

use bitflags::bitflags;

// ============================================================================
// Core Types
// ============================================================================

/// A qualified name (optional schema.name)
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        QualifiedName {
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        QualifiedName {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref schema) = self.schema {
            write!(f, "{}.{}", schema, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Conflict resolution action (OR clause)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictAction {
    #[default]
    Abort,
    Rollback,
    Fail,
    Ignore,
    Replace,
}

/// Transaction start mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    Deferred,
    Immediate,
    Exclusive,
}

// ============================================================================
// Statements
// ============================================================================

/// Top-level SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    CreateTable(CreateTableStmt),
    CreateIndex(CreateIndexStmt),
    DropTable(DropStmt),
    DropIndex(DropStmt),
    Begin(BeginStmt),
    Commit,
    Rollback,
    Explain(Box<Stmt>),
    ExplainQueryPlan(Box<Stmt>),
}

// ============================================================================
// SELECT Statement
// ============================================================================

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub body: SelectBody,
    pub order_by: Option<Vec<OrderingTerm>>,
    pub limit: Option<LimitClause>,
}

/// SELECT body (simple select or compound)
#[derive(Debug, Clone, PartialEq)]
pub enum SelectBody {
    Select(SelectCore),
    Compound {
        op: CompoundOp,
        left: Box<SelectBody>,
        right: Box<SelectBody>,
    },
}

/// Core SELECT without ORDER BY and LIMIT
#[derive(Debug, Clone, PartialEq)]
pub struct SelectCore {
    pub distinct: bool,
    pub columns: Vec<ResultColumn>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Box<Expr>>,
    pub group_by: Option<Vec<Expr>>,
    pub having: Option<Box<Expr>>,
}

/// Compound SELECT operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

/// Result column in SELECT
#[derive(Debug, Clone, PartialEq)]
pub enum ResultColumn {
    /// All columns (*)
    Star,
    /// table.*
    TableStar(String),
    /// Expression with optional alias
    Expr { expr: Expr, alias: Option<String> },
}

/// FROM clause; comma-separated tables are implicit cross joins
#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub tables: Vec<TableRef>,
}

/// Table reference in FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// Simple table reference
    Table {
        name: QualifiedName,
        alias: Option<String>,
    },
    /// Subquery
    Subquery {
        query: Box<SelectStmt>,
        alias: Option<String>,
    },
    /// JOIN
    Join {
        left: Box<TableRef>,
        join_type: JoinType,
        right: Box<TableRef>,
        constraint: Option<JoinConstraint>,
    },
}

/// JOIN type: an operator with an optional NATURAL prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinType {
    pub natural: bool,
    pub op: JoinOp,
}

impl JoinType {
    pub fn inner() -> Self {
        JoinType {
            natural: false,
            op: JoinOp::Inner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinOp {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// JOIN constraint
#[derive(Debug, Clone, PartialEq)]
pub enum JoinConstraint {
    On(Box<Expr>),
    Using(Vec<String>),
}

/// ORDER BY term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingTerm {
    pub expr: Expr,
    pub order: SortOrder,
}

/// LIMIT clause
#[derive(Debug, Clone, PartialEq)]
pub struct LimitClause {
    pub limit: Box<Expr>,
    pub offset: Option<Box<Expr>>,
}

// ============================================================================
// INSERT Statement
// ============================================================================

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub or_action: Option<ConflictAction>,
    pub table: QualifiedName,
    pub columns: Option<Vec<String>>,
    pub source: InsertSource,
}

/// INSERT source
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Select(Box<SelectStmt>),
    DefaultValues,
}

/// Assignment (column = expr) in UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub expr: Expr,
}

// ============================================================================
// UPDATE / DELETE Statements
// ============================================================================

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub or_action: Option<ConflictAction>,
    pub table: QualifiedName,
    pub alias: Option<String>,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Box<Expr>>,
    pub order_by: Option<Vec<OrderingTerm>>,
    pub limit: Option<LimitClause>,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub or_action: Option<ConflictAction>,
    pub table: QualifiedName,
    pub alias: Option<String>,
    pub where_clause: Option<Box<Expr>>,
    pub order_by: Option<Vec<OrderingTerm>>,
    pub limit: Option<LimitClause>,
}

// ============================================================================
// CREATE TABLE Statement
// ============================================================================

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub temporary: bool,
    pub if_not_exists: bool,
    pub name: QualifiedName,
    pub definition: TableDefinition,
    pub without_rowid: bool,
    pub strict: bool,
}

/// Table definition (columns or AS SELECT)
#[derive(Debug, Clone, PartialEq)]
pub enum TableDefinition {
    Columns {
        columns: Vec<ColumnDef>,
        constraints: Vec<TableConstraint>,
    },
    AsSelect(Box<SelectStmt>),
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub type_name: Option<TypeName>,
    pub constraints: Vec<ColumnConstraint>,
}

/// Declared type name with optional (N) or (N,M) arguments
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub name: String,
    pub args: Vec<i64>,
}

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        TypeName {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<i64>) -> Self {
        TypeName {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
            write!(f, "({})", args.join(","))?;
        }
        Ok(())
    }
}

/// Column constraint with optional CONSTRAINT name
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConstraint {
    pub name: Option<String>,
    pub kind: ColumnConstraintKind,
}

/// Column constraint kind
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraintKind {
    PrimaryKey {
        order: Option<SortOrder>,
        autoincrement: bool,
    },
    NotNull,
    Unique,
    Check(Box<Expr>),
    Default(Box<Expr>),
    Collate(String),
    ForeignKey(ForeignKeyClause),
    Generated {
        expr: Box<Expr>,
        storage: GeneratedStorage,
    },
}

/// REFERENCES clause
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyClause {
    pub table: String,
    pub columns: Option<Vec<String>>,
}

/// Generated column storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratedStorage {
    #[default]
    Virtual,
    Stored,
}

/// Table constraint with optional CONSTRAINT name
#[derive(Debug, Clone, PartialEq)]
pub struct TableConstraint {
    pub name: Option<String>,
    pub kind: TableConstraintKind,
}

/// Table constraint kind
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraintKind {
    PrimaryKey(Vec<IndexedColumn>),
    Unique(Vec<IndexedColumn>),
    Check(Box<Expr>),
    ForeignKey {
        columns: Vec<String>,
        clause: ForeignKeyClause,
    },
}

/// Indexed column (CREATE INDEX and table constraints)
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedColumn {
    pub name: String,
    pub collation: Option<String>,
    pub order: Option<SortOrder>,
}

// ============================================================================
// CREATE INDEX / DROP Statements
// ============================================================================

/// CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStmt {
    pub unique: bool,
    pub if_not_exists: bool,
    pub name: QualifiedName,
    pub table: String,
    pub columns: Vec<IndexedColumn>,
    pub where_clause: Option<Box<Expr>>,
}

/// DROP TABLE / DROP INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropStmt {
    pub if_exists: bool,
    pub name: QualifiedName,
}

// ============================================================================
// Transaction Statements
// ============================================================================

/// BEGIN statement
#[derive(Debug, Clone, PartialEq)]
pub struct BeginStmt {
    pub mode: Option<TransactionMode>,
}

// ============================================================================
// Expressions
// ============================================================================

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal),

    /// Column reference (optionally table-qualified)
    Column(ColumnRef),

    /// Bound variable
    Variable(Variable),

    /// Unary operator
    Unary { op: UnaryOp, expr: Box<Expr> },

    /// Binary operator
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// expr [NOT] BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// expr [NOT] IN (...)
    In {
        expr: Box<Expr>,
        list: InList,
        negated: bool,
    },

    /// expr [NOT] LIKE/GLOB/REGEXP/MATCH pattern [ESCAPE e]
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        escape: Option<Box<Expr>>,
        op: LikeOp,
        negated: bool,
    },

    /// expr IS [NOT] NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// CASE [operand] WHEN ... THEN ... [ELSE ...] END
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<WhenClause>,
        else_clause: Option<Box<Expr>>,
    },

    /// CAST(expr AS type)
    Cast {
        expr: Box<Expr>,
        type_name: TypeName,
    },

    /// expr COLLATE name
    Collate { expr: Box<Expr>, collation: String },

    /// Function call
    Function(FunctionCall),

    /// Scalar subquery
    Subquery(Box<SelectStmt>),

    /// [NOT] EXISTS (SELECT ...)
    Exists {
        subquery: Box<SelectStmt>,
        negated: bool,
    },

    /// Parenthesized expression
    Parens(Box<Expr>),
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
    Blob(Vec<u8>),
    CurrentTime,
    CurrentDate,
    CurrentTimestamp,
}

/// Column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        ColumnRef {
            table: None,
            column: column.into(),
        }
    }

    pub fn with_table(table: impl Into<String>, column: impl Into<String>) -> Self {
        ColumnRef {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

/// Bound variable; named variables keep their original lexeme including
/// the prefix character
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// ? or ?NNN
    Numbered(Option<i32>),
    /// :name, @name, $name, #name
    Named(String),
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,    // -
    Pos,    // +
    Not,    // NOT
    BitNot, // ~
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Is,
    IsNot,

    // Logical
    And,
    Or,

    // Bitwise
    BitAnd,
    BitOr,
    ShiftLeft,
    ShiftRight,

    // String
    Concat,
}

impl BinaryOp {
    /// Get the precedence of this operator (higher = tighter binding)
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::Is
            | BinaryOp::IsNot => 3,
            BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::ShiftLeft
            | BinaryOp::ShiftRight => 4,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Concat => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        }
    }
}

/// IN list
#[derive(Debug, Clone, PartialEq)]
pub enum InList {
    Values(Vec<Expr>),
    Subquery(Box<SelectStmt>),
}

/// LIKE operator family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOp {
    Like,
    Glob,
    Regexp,
    Match,
}

/// WHEN clause in CASE
#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub when: Box<Expr>,
    pub then: Box<Expr>,
}

/// Function call
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: FunctionArgs,
    pub distinct: bool,
    pub filter: Option<Box<Expr>>,
}

/// Function arguments
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArgs {
    Star,
    List(Vec<Expr>),
}

bitflags! {
    /// Properties of an expression subtree
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExprProps: u16 {
        /// References at least one column
        const HAS_COLUMN    = 0x0001;
        /// Contains a bound variable
        const HAS_VARIABLE  = 0x0002;
        /// Contains a function call
        const HAS_FUNCTION  = 0x0004;
        /// Contains an aggregate function call
        const HAS_AGGREGATE = 0x0008;
        /// Contains an embedded SELECT
        const HAS_SUBQUERY  = 0x0010;
        /// Contains an explicit COLLATE
        const HAS_COLLATE   = 0x0020;
    }
}

/// Aggregate function names recognized by the analyzer
const AGGREGATE_FUNCTIONS: &[&str] = &["avg", "count", "group_concat", "max", "min", "sum", "total"];

/// Function names whose result varies between evaluations
const NONDETERMINISTIC_FUNCTIONS: &[&str] = &["changes", "last_insert_rowid", "random", "randomblob"];

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::new(name))
    }

    /// Direct expression children, in source order. Embedded SELECTs are
    /// not children; a subquery node is a leaf of the expression tree.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::Column(_) | Expr::Variable(_) => Vec::new(),
            Expr::Unary { expr, .. } => vec![expr],
            Expr::Binary { left, right, .. } => vec![left, right],
            Expr::Between {
                expr, low, high, ..
            } => vec![expr, low, high],
            Expr::In { expr, list, .. } => {
                let mut v: Vec<&Expr> = vec![expr];
                if let InList::Values(items) = list {
                    v.extend(items.iter());
                }
                v
            }
            Expr::Like {
                expr,
                pattern,
                escape,
                ..
            } => {
                let mut v: Vec<&Expr> = vec![expr, pattern];
                if let Some(e) = escape {
                    v.push(e);
                }
                v
            }
            Expr::IsNull { expr, .. } => vec![expr],
            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                let mut v: Vec<&Expr> = Vec::new();
                if let Some(op) = operand {
                    v.push(op);
                }
                for wc in when_clauses {
                    v.push(&wc.when);
                    v.push(&wc.then);
                }
                if let Some(e) = else_clause {
                    v.push(e);
                }
                v
            }
            Expr::Cast { expr, .. } => vec![expr],
            Expr::Collate { expr, .. } => vec![expr],
            Expr::Function(call) => match &call.args {
                FunctionArgs::Star => match &call.filter {
                    Some(f) => vec![f],
                    None => Vec::new(),
                },
                FunctionArgs::List(args) => {
                    let mut v: Vec<&Expr> = args.iter().collect();
                    if let Some(f) = &call.filter {
                        v.push(f);
                    }
                    v
                }
            },
            Expr::Subquery(_) | Expr::Exists { .. } => Vec::new(),
            Expr::Parens(expr) => vec![expr],
        }
    }

    /// Tree height: a leaf has height 1, a parent 1 + its tallest child
    pub fn height(&self) -> u32 {
        1 + self
            .children()
            .iter()
            .map(|c| c.height())
            .max()
            .unwrap_or(0)
    }

    /// True iff the subtree contains no column, variable, subquery, or
    /// non-deterministic function reference
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Column(_) | Expr::Variable(_) => false,
            Expr::Subquery(_) | Expr::Exists { .. } => false,
            Expr::Literal(
                Literal::CurrentTime | Literal::CurrentDate | Literal::CurrentTimestamp,
            ) => false,
            Expr::Function(call) => {
                if NONDETERMINISTIC_FUNCTIONS.contains(&call.name.to_lowercase().as_str()) {
                    false
                } else {
                    self.children().iter().all(|c| c.is_constant())
                }
            }
            _ => self.children().iter().all(|c| c.is_constant()),
        }
    }

    /// Compute the property bitset for this subtree
    pub fn properties(&self) -> ExprProps {
        let mut props = match self {
            Expr::Column(_) => ExprProps::HAS_COLUMN,
            Expr::Variable(_) => ExprProps::HAS_VARIABLE,
            Expr::Collate { .. } => ExprProps::HAS_COLLATE,
            Expr::Subquery(_) | Expr::Exists { .. } => ExprProps::HAS_SUBQUERY,
            Expr::In {
                list: InList::Subquery(_),
                ..
            } => ExprProps::HAS_SUBQUERY,
            Expr::Function(call) => {
                let mut p = ExprProps::HAS_FUNCTION;
                if AGGREGATE_FUNCTIONS.contains(&call.name.to_lowercase().as_str()) {
                    p |= ExprProps::HAS_AGGREGATE;
                }
                p
            }
            _ => ExprProps::empty(),
        };

        for child in self.children() {
            props |= child.properties();
        }
        props
    }
}

// ============================================================================
// Tests
// ============================================================================
