//! Value comparison
//!
//! Comparisons are four-valued: `Option<Ordering>` where None is the
//! NULL outcome. Operands first receive the comparison affinity, then
//! compare within their storage class; mixed classes order by
//! NULL < numeric < text < blob.

use std::cmp::Ordering;

use crate::expr::affinity::{apply_affinity, Affinity};
use crate::expr::arith::tri_and;
use crate::expr::collate::Collation;
use crate::types::Value;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Is,
    IsNot,
}

/// Rank in the mixed-type sort order (numeric < text < blob)
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Integer(_) | Value::Real(_) => 1,
        Value::Text(_) => 2,
        Value::Blob(_) => 3,
    }
}

/// Compare two values under an affinity and a collation
///
/// Either operand NULL gives None. After affinity conversion, numbers
/// compare numerically (NaN gives None), text under the collation,
/// blobs byte-wise, and mixed storage classes by type rank.
pub fn compare(
    left: &Value,
    right: &Value,
    affinity: Affinity,
    collation: Collation,
) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }

    let l = apply_affinity(left, affinity);
    let r = apply_affinity(right, affinity);

    match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Integer(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
        (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(collation.compare(a, b)),
        (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
        _ => Some(type_rank(&l).cmp(&type_rank(&r))),
    }
}

/// Evaluate a comparison operator
///
/// The six ordering operators return None when `compare` does. IS and
/// IS NOT are null-aware: NULL IS NULL is true, NULL IS x is false.
pub fn evaluate_comparison(
    op: CompareOp,
    left: &Value,
    right: &Value,
    affinity: Affinity,
    collation: Collation,
) -> Option<bool> {
    match op {
        CompareOp::Is => Some(is_equal(left, right, affinity, collation)),
        CompareOp::IsNot => Some(!is_equal(left, right, affinity, collation)),
        _ => {
            let ord = compare(left, right, affinity, collation)?;
            Some(match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Le => ord != Ordering::Greater,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::Is | CompareOp::IsNot => unreachable!(),
            })
        }
    }
}

/// IS equality: NULLs compare equal to each other and unequal to
/// everything else
fn is_equal(left: &Value, right: &Value, affinity: Affinity, collation: Collation) -> bool {
    match (left.is_null(), right.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => compare(left, right, affinity, collation) == Some(Ordering::Equal),
    }
}

/// BETWEEN: `low <= v AND v <= high` with NULL propagation
pub fn evaluate_between(
    value: &Value,
    low: &Value,
    high: &Value,
    affinity: Affinity,
    collation: Collation,
) -> Option<bool> {
    let lower = compare(value, low, affinity, collation).map(|o| o != Ordering::Less);
    let upper = compare(value, high, affinity, collation).map(|o| o != Ordering::Greater);
    tri_and(lower, upper)
}

/// IN over a list of values
///
/// A NULL probe is NULL. Any Equal member gives true; if no member
/// matched but one compared NULL the result is NULL, otherwise false.
pub fn evaluate_in(
    probe: &Value,
    list: &[Value],
    affinity: Affinity,
    collation: Collation,
) -> Option<bool> {
    if probe.is_null() {
        return None;
    }

    let mut saw_null = false;
    for item in list {
        match compare(probe, item, affinity, collation) {
            Some(Ordering::Equal) => return Some(true),
            Some(_) => {}
            None => saw_null = true,
        }
    }

    if saw_null {
        None
    } else {
        Some(false)
    }
}
