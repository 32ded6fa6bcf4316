use std::fmt;

use crate::ast::{BinaryOp, LiteralValue, UnaryOp};
use crate::error::RuntimeError;

/// A runtime value. Operators never mutate their operands; each returns a
/// fresh value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// Only `true` is truthy. Every other value, of any type, is falsey.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Str(_) => "string",
            Self::Bool(_) => "bool",
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&LiteralValue> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Int(n) => Self::Int(*n),
            LiteralValue::Double(n) => Self::Double(*n),
            LiteralValue::Str(s) => Self::Str(s.clone()),
            LiteralValue::Bool(b) => Self::Bool(*b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnaryOp::Negate, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Negate, Value::Double(n)) => Ok(Value::Double(-n)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(RuntimeError::new(format!(
            "invalid operand type for '{op}': {}",
            operand.type_name()
        ))),
    }
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            _ => arithmetic(op, left, right, i64::wrapping_add, |a, b| a + b),
        },
        BinaryOp::Subtract => arithmetic(op, left, right, i64::wrapping_sub, |a, b| a - b),
        BinaryOp::Multiply => arithmetic(op, left, right, i64::wrapping_mul, |a, b| a * b),
        BinaryOp::Divide => {
            check_int_divisor(op, left, right)?;
            arithmetic(op, left, right, i64::wrapping_div, |a, b| a / b)
        }
        BinaryOp::Modulo => {
            check_int_divisor(op, left, right)?;
            arithmetic(op, left, right, i64::wrapping_rem, |a, b| a % b)
        }
        BinaryOp::Equal => equals(op, left, right).map(Value::Bool),
        BinaryOp::NotEqual => equals(op, left, right).map(|eq| Value::Bool(!eq)),
        BinaryOp::Less => ordering(op, left, right).map(|(lt, _)| Value::Bool(lt)),
        BinaryOp::Greater => ordering(op, left, right).map(|(lt, eq)| Value::Bool(!lt && !eq)),
        BinaryOp::GreaterEqual => ordering(op, left, right).map(|(lt, _)| Value::Bool(!lt)),
        BinaryOp::LessEqual => ordering(op, left, right).map(|(lt, eq)| Value::Bool(lt || eq)),
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(type_error(op, left, right)),
        },
    }
}

fn type_error(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::new(format!(
        "invalid operand types for '{op}': {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> i64,
    double_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Double(double_op(a, b))),
            _ => Err(type_error(op, left, right)),
        },
    }
}

fn check_int_divisor(op: BinaryOp, left: &Value, right: &Value) -> Result<(), RuntimeError> {
    if let (Value::Int(_), Value::Int(0)) = (left, right) {
        return Err(RuntimeError::new(format!("integer division by zero in '{op}'")));
    }
    Ok(())
}

/// Equality requires both operands to carry the same type.
fn equals(op: BinaryOp, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Double(a), Value::Double(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        _ => Err(type_error(op, left, right)),
    }
}

/// Numeric `(less than, equal)` for the four ordering operators. The
/// derived forms are built from these two facts only.
fn ordering(op: BinaryOp, left: &Value, right: &Value) -> Result<(bool, bool), RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok((a < b, a == b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok((a < b, a == b)),
            _ => Err(type_error(op, left, right)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn int(n: i64) -> Value {
        Value::Int(n)
    }

    fn dbl(n: f64) -> Value {
        Value::Double(n)
    }

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    #[rstest]
    #[case(BinaryOp::Add, int(2), int(3), int(5))]
    #[case(BinaryOp::Add, int(2), dbl(0.5), dbl(2.5))]
    #[case(BinaryOp::Add, dbl(1.5), int(1), dbl(2.5))]
    #[case(BinaryOp::Add, s("ab"), s("cd"), s("abcd"))]
    #[case(BinaryOp::Subtract, int(2), int(5), int(-3))]
    #[case(BinaryOp::Multiply, int(4), dbl(0.5), dbl(2.0))]
    #[case(BinaryOp::Divide, int(7), int(2), int(3))]
    #[case(BinaryOp::Divide, int(-7), int(2), int(-3))]
    #[case(BinaryOp::Divide, int(7), dbl(2.0), dbl(3.5))]
    #[case(BinaryOp::Divide, dbl(1.0), dbl(0.0), dbl(f64::INFINITY))]
    #[case(BinaryOp::Modulo, int(7), int(3), int(1))]
    #[case(BinaryOp::Modulo, int(-7), int(3), int(-1))]
    #[case(BinaryOp::Modulo, dbl(7.5), int(2), dbl(1.5))]
    #[case(BinaryOp::Add, int(i64::MAX), int(1), int(i64::MIN))]
    fn arithmetic_results(
        #[case] op: BinaryOp,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(binary(op, &left, &right).unwrap(), expected);
    }

    #[rstest]
    #[case(BinaryOp::Add, s("a"), int(1))]
    #[case(BinaryOp::Add, Value::Bool(true), Value::Bool(false))]
    #[case(BinaryOp::Subtract, s("a"), s("b"))]
    #[case(BinaryOp::Multiply, Value::Bool(true), int(1))]
    #[case(BinaryOp::Equal, int(1), dbl(1.0))]
    #[case(BinaryOp::NotEqual, s("1"), int(1))]
    #[case(BinaryOp::Less, s("a"), s("b"))]
    #[case(BinaryOp::Greater, s("a"), int(1))]
    #[case(BinaryOp::GreaterEqual, Value::Bool(true), int(1))]
    #[case(BinaryOp::LessEqual, int(1), s("b"))]
    #[case(BinaryOp::And, int(1), Value::Bool(true))]
    #[case(BinaryOp::Or, Value::Bool(false), s("x"))]
    fn type_errors(#[case] op: BinaryOp, #[case] left: Value, #[case] right: Value) {
        let err = binary(op, &left, &right).unwrap_err();
        assert!(err.message.starts_with("invalid operand types"), "{}", err.message);
    }

    #[rstest]
    #[case(int(1), int(2), [true, false, false, true])]
    #[case(int(2), int(2), [false, false, true, true])]
    #[case(int(3), int(2), [false, true, true, false])]
    #[case(int(2), dbl(2.0), [false, false, true, true])]
    #[case(dbl(1.5), int(2), [true, false, false, true])]
    #[case(dbl(2.5), dbl(2.25), [false, true, true, false])]
    fn ordering_operators(#[case] left: Value, #[case] right: Value, #[case] expected: [bool; 4]) {
        let ops = [
            BinaryOp::Less,
            BinaryOp::Greater,
            BinaryOp::GreaterEqual,
            BinaryOp::LessEqual,
        ];
        for (op, want) in ops.into_iter().zip(expected) {
            assert_eq!(binary(op, &left, &right).unwrap(), Value::Bool(want), "{op}");
        }
    }

    #[rstest]
    #[case(int(1), int(1), true)]
    #[case(dbl(0.5), dbl(0.25), false)]
    #[case(s("a"), s("a"), true)]
    #[case(Value::Bool(true), Value::Bool(false), false)]
    fn equality(#[case] left: Value, #[case] right: Value, #[case] expected: bool) {
        assert_eq!(binary(BinaryOp::Equal, &left, &right).unwrap(), Value::Bool(expected));
        assert_eq!(
            binary(BinaryOp::NotEqual, &left, &right).unwrap(),
            Value::Bool(!expected)
        );
    }

    #[rstest]
    #[case(BinaryOp::Divide)]
    #[case(BinaryOp::Modulo)]
    fn integer_division_by_zero(#[case] op: BinaryOp) {
        let err = binary(op, &int(1), &int(0)).unwrap_err();
        assert!(err.message.contains("division by zero"));
    }

    #[test]
    fn logical_operators_need_bools() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        assert_eq!(binary(BinaryOp::And, &t, &f).unwrap(), f);
        assert_eq!(binary(BinaryOp::Or, &t, &f).unwrap(), t);
    }

    #[rstest]
    #[case(UnaryOp::Negate, int(5), Ok(int(-5)))]
    #[case(UnaryOp::Negate, dbl(1.5), Ok(dbl(-1.5)))]
    #[case(UnaryOp::Not, Value::Bool(false), Ok(Value::Bool(true)))]
    #[case(UnaryOp::Negate, s("x"), Err(()))]
    #[case(UnaryOp::Not, int(0), Err(()))]
    fn unary_operators(
        #[case] op: UnaryOp,
        #[case] operand: Value,
        #[case] expected: Result<Value, ()>,
    ) {
        assert_eq!(unary(op, &operand).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case(Value::Bool(true), true)]
    #[case(Value::Bool(false), false)]
    #[case(int(1), false)]
    #[case(s("true"), false)]
    #[case(dbl(1.0), false)]
    fn truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(value.is_truthy(), expected);
    }

    #[rstest]
    #[case(int(-42), "-42")]
    #[case(dbl(2.5), "2.5")]
    #[case(dbl(3.0), "3")]
    #[case(s("hi"), "hi")]
    #[case(Value::Bool(true), "true")]
    fn display(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }
}
