//! Expression semantics
//!
//! A library of pure functions over `Value` implementing SQLite's type
//! system: affinity and coercion, comparison under collations,
//! arithmetic with overflow promotion, three-valued logic, CAST, and
//! LIKE/GLOB pattern matching. Nothing here errors: domain failures
//! produce NULL, and integer overflow promotes to float.

pub mod affinity;
pub mod arith;
pub mod collate;
pub mod compare;
pub mod like;

pub use affinity::{
    apply_affinity, comparison_affinity, expr_affinity, propagate_affinity, type_affinity,
    Affinity,
};
pub use arith::{
    evaluate_arithmetic, evaluate_bit_not, evaluate_bitwise, evaluate_cast, evaluate_concat,
    evaluate_logical, evaluate_negate, evaluate_not, to_numeric, tri_and, tri_or, value_truth,
    ArithOp, BitwiseOp, LogicalOp,
};
pub use collate::Collation;
pub use compare::{
    compare, evaluate_between, evaluate_comparison, evaluate_in, CompareOp,
};
pub use like::{evaluate_glob, evaluate_like};
