use crate::{Predicate, Value};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOpType {
    Negative,
    Not,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: UnaryOpType,
    pub arg: Box<Predicate>,
}

impl UnaryOpType {
    pub fn apply(&self, value: Value) -> Value {
        match self {
            UnaryOpType::IsNull => Value::Boolean(Some(value.is_null())),
            UnaryOpType::IsNotNull => Value::Boolean(Some(!value.is_null())),
            UnaryOpType::Not => match value {
                Value::Boolean(v) => Value::Boolean(v.map(|v| !v)),
                _ => Value::Boolean(None),
            },
            UnaryOpType::Negative => match value {
                Value::Float32(v) => Value::Float32(v.map(|v| -v)),
                Value::Float64(v) => Value::Float64(v.map(|v| -v)),
                Value::Decimal(v) => Value::Decimal(v.map(|v| -v)),
                v => match v.as_i128() {
                    Some(v) if !matches!(v, i128::MIN) => Value::Int128(Some(-v)),
                    _ => Value::Null,
                },
            },
        }
    }
}
