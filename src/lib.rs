//! sqlfront - a SQLite-compatible SQL front-end
//!
//! Three stages, leaves first: a total tokenizer, a recursive-descent
//! parser producing a typed AST, and an expression code generator
//! emitting instructions for a register-based VDBE. Alongside them sits
//! a library of pure functions implementing SQLite's expression
//! semantics (affinity, collation, three-valued logic, overflow
//! promotion, LIKE/GLOB).
//!
//! Storage, transactions, and query planning are external collaborators:
//! the front-end consumes only a schema lookup for column resolution and
//! hands back a VDBE program plus the register holding each expression's
//! value.

pub mod error;
pub mod expr;
pub mod parser;
pub mod schema;
pub mod types;
pub mod vdbe;

pub use error::{Error, ErrorCode, Result};
pub use types::{ColumnType, Value};

pub use parser::{parse, parse_expression, parse_single, tokenize, tokenize_all, Stmt};

pub use expr::{
    apply_affinity, evaluate_arithmetic, evaluate_between, evaluate_cast, evaluate_comparison,
    evaluate_concat, evaluate_glob, evaluate_in, evaluate_like, evaluate_logical, evaluate_not,
    type_affinity, Affinity, ArithOp, Collation, CompareOp, LogicalOp,
};

pub use schema::{ResolvedColumn, Schema, SchemaLookup};
pub use vdbe::{CodeGenerator, Opcode, ProgramBuilder, VdbeOp, P4};
