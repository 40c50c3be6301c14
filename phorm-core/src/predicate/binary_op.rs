use crate::{Predicate, Value};
use rust_decimal::Decimal;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub op: BinaryOpType,
    pub lhs: Box<Predicate>,
    pub rhs: Box<Predicate>,
}

fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(v) => *v,
        _ => None,
    }
}

impl BinaryOpType {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOpType::And | BinaryOpType::Or)
    }

    /// Three valued evaluation: any comparison involving null is unknown (`Boolean(None)`).
    pub fn apply(&self, lhs: Value, rhs: Value) -> Value {
        match self {
            BinaryOpType::And => Value::Boolean(match (truth(&lhs), truth(&rhs)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            }),
            BinaryOpType::Or => Value::Boolean(match (truth(&lhs), truth(&rhs)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            }),
            BinaryOpType::Equal
            | BinaryOpType::NotEqual
            | BinaryOpType::Less
            | BinaryOpType::Greater
            | BinaryOpType::LessEqual
            | BinaryOpType::GreaterEqual => {
                if lhs.is_null() || rhs.is_null() {
                    return Value::Boolean(None);
                }
                if matches!(self, BinaryOpType::Equal | BinaryOpType::NotEqual) {
                    let equal = lhs.loose_eq(&rhs);
                    return Value::Boolean(Some(equal == (*self == BinaryOpType::Equal)));
                }
                Value::Boolean(lhs.loose_cmp(&rhs).map(|v| match self {
                    BinaryOpType::Less => v == Ordering::Less,
                    BinaryOpType::Greater => v == Ordering::Greater,
                    BinaryOpType::LessEqual => v != Ordering::Greater,
                    _ => v != Ordering::Less,
                }))
            }
            _ => self.arithmetic(&lhs, &rhs),
        }
    }

    fn arithmetic(&self, lhs: &Value, rhs: &Value) -> Value {
        if lhs.is_integral() && rhs.is_integral() {
            if let (Some(l), Some(r)) = (lhs.as_i128(), rhs.as_i128()) {
                return Value::Int128(match self {
                    BinaryOpType::Addition => l.checked_add(r),
                    BinaryOpType::Subtraction => l.checked_sub(r),
                    BinaryOpType::Multiplication => l.checked_mul(r),
                    BinaryOpType::Division => l.checked_div(r),
                    _ => l.checked_rem(r),
                });
            }
        }
        if let (Value::Decimal(Some(l)), Value::Decimal(Some(r))) = (lhs, rhs) {
            return Value::Decimal(self.decimal(*l, *r));
        }
        match (lhs.as_f64(), rhs.as_f64()) {
            (Some(l), Some(r)) => Value::Float64(Some(match self {
                BinaryOpType::Addition => l + r,
                BinaryOpType::Subtraction => l - r,
                BinaryOpType::Multiplication => l * r,
                BinaryOpType::Division => l / r,
                _ => l % r,
            })),
            _ => Value::Null,
        }
    }

    fn decimal(&self, l: Decimal, r: Decimal) -> Option<Decimal> {
        match self {
            BinaryOpType::Addition => l.checked_add(r),
            BinaryOpType::Subtraction => l.checked_sub(r),
            BinaryOpType::Multiplication => l.checked_mul(r),
            BinaryOpType::Division => l.checked_div(r),
            _ => l.checked_rem(r),
        }
    }
}
