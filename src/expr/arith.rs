//! Arithmetic, bitwise, logical, and cast evaluation
//!
//! Pure functions over `Value` implementing SQLite's numeric semantics:
//! NULL propagates through every operator, integer overflow promotes to
//! float, division and modulo by zero produce NULL, and logic is
//! three-valued with `Option<bool>` (None is the NULL outcome).

use crate::expr::affinity::{type_affinity, Affinity};
use crate::types::Value;

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Bitwise operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
}

/// Logical connective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

// ============================================================================
// Numeric Coercion
// ============================================================================

/// Coerce a value to Integer or Real for arithmetic. Text parses as an
/// integer first, then as a float; anything else becomes integer 0.
/// NULL stays NULL.
pub fn to_numeric(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Integer(_) | Value::Real(_) => value.clone(),
        Value::Text(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                Value::Integer(i)
            } else if let Ok(f) = t.parse::<f64>() {
                Value::Real(f)
            } else {
                Value::Integer(0)
            }
        }
        Value::Blob(_) => Value::Integer(0),
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Evaluate a binary arithmetic operator
///
/// Integer add/sub/mul promote to float on overflow. Integer division by
/// zero and modulo by zero are NULL; `i64::MIN / -1` promotes to float.
/// Float division by zero, and any infinite quotient, are NULL.
pub fn evaluate_arithmetic(op: ArithOp, left: &Value, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }

    let l = to_numeric(left);
    let r = to_numeric(right);

    if let (Value::Integer(a), Value::Integer(b)) = (&l, &r) {
        let (a, b) = (*a, *b);
        match op {
            ArithOp::Add => match a.checked_add(b) {
                Some(v) => return Value::Integer(v),
                None => {}
            },
            ArithOp::Sub => match a.checked_sub(b) {
                Some(v) => return Value::Integer(v),
                None => {}
            },
            ArithOp::Mul => match a.checked_mul(b) {
                Some(v) => return Value::Integer(v),
                None => {}
            },
            ArithOp::Div => {
                if b == 0 {
                    return Value::Null;
                }
                if a == i64::MIN && b == -1 {
                    return Value::Real(-(i64::MIN as f64));
                }
                return Value::Integer(a / b);
            }
            ArithOp::Mod => {
                if b == 0 {
                    return Value::Null;
                }
                return Value::Integer(a.wrapping_rem(b));
            }
        }
        // Overflowed add/sub/mul falls through to the float path
    }

    let a = l.to_f64();
    let b = r.to_f64();
    match op {
        ArithOp::Add => Value::Real(a + b),
        ArithOp::Sub => Value::Real(a - b),
        ArithOp::Mul => Value::Real(a * b),
        ArithOp::Div => {
            if b == 0.0 {
                return Value::Null;
            }
            let q = a / b;
            if q.is_infinite() {
                Value::Null
            } else {
                Value::Real(q)
            }
        }
        ArithOp::Mod => {
            if b == 0.0 {
                Value::Null
            } else {
                Value::Real(a % b)
            }
        }
    }
}

/// Unary minus. `i64::MIN` promotes to float; non-numeric text becomes
/// integer 0 before negation.
pub fn evaluate_negate(value: &Value) -> Value {
    match to_numeric(value) {
        Value::Null => Value::Null,
        Value::Integer(i) => {
            if i == i64::MIN {
                Value::Real(-(i64::MIN as f64))
            } else {
                Value::Integer(-i)
            }
        }
        Value::Real(f) => Value::Real(-f),
        other => other,
    }
}

/// Bitwise NOT. The operand coerces to integer (strings parse, default 0).
pub fn evaluate_bit_not(value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    Value::Integer(!to_numeric(value).to_i64())
}

/// Evaluate a bitwise operator with integer coercion. Shift counts
/// outside [0, 63] yield 0, except an arithmetic right shift of a
/// negative value, which saturates to -1.
pub fn evaluate_bitwise(op: BitwiseOp, left: &Value, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }

    let a = to_numeric(left).to_i64();
    let b = to_numeric(right).to_i64();

    let result = match op {
        BitwiseOp::And => a & b,
        BitwiseOp::Or => a | b,
        BitwiseOp::Xor => a ^ b,
        BitwiseOp::ShiftLeft => {
            if (0..64).contains(&b) {
                a << b
            } else {
                0
            }
        }
        BitwiseOp::ShiftRight => {
            if (0..64).contains(&b) {
                a >> b
            } else if a < 0 {
                -1
            } else {
                0
            }
        }
    };

    Value::Integer(result)
}

/// String concatenation with NULL propagation
pub fn evaluate_concat(left: &Value, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    Value::Text(format!("{}{}", left.to_text(), right.to_text()))
}

// ============================================================================
// Three-Valued Logic
// ============================================================================

/// Truthiness of a value: NULL is unknown, numbers are non-zero, text
/// parses numerically, blobs are false
pub fn value_truth(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(*i != 0),
        Value::Real(f) => Some(*f != 0.0),
        Value::Text(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                Some(i != 0)
            } else if let Ok(f) = t.parse::<f64>() {
                Some(f != 0.0)
            } else {
                Some(false)
            }
        }
        Value::Blob(_) => Some(false),
    }
}

/// Three-valued AND: false dominates NULL
pub fn tri_and(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Three-valued OR: true dominates NULL
pub fn tri_or(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// Evaluate AND/OR over two values with SQLite's truth tables
pub fn evaluate_logical(op: LogicalOp, left: &Value, right: &Value) -> Option<bool> {
    let a = value_truth(left);
    let b = value_truth(right);
    match op {
        LogicalOp::And => tri_and(a, b),
        LogicalOp::Or => tri_or(a, b),
    }
}

/// Logical NOT: NULL stays NULL
pub fn evaluate_not(value: &Value) -> Option<bool> {
    value_truth(value).map(|b| !b)
}

// ============================================================================
// CAST
// ============================================================================

/// Evaluate CAST(value AS type) by the affinity of the type name.
/// Unlike `apply_affinity` the conversion is forced: non-numeric text
/// casts to integer 0 rather than staying text.
pub fn evaluate_cast(value: &Value, type_name: &str) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match type_affinity(type_name) {
        Affinity::Integer => Value::Integer(value.to_i64()),
        Affinity::Real => Value::Real(value.to_f64()),
        Affinity::Text => Value::Text(value.to_text()),
        Affinity::Numeric => match value {
            Value::Integer(_) | Value::Real(_) => value.clone(),
            _ => to_numeric(value),
        },
        Affinity::Blob | Affinity::None => Value::Blob(value.to_blob()),
    }
}
