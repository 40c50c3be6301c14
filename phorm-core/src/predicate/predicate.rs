use crate::{AsValue, BinaryOp, BinaryOpType, Contract, UnaryOp, UnaryOpType, Value};
use std::{
    any::{self, TypeId},
    fmt::{self, Display},
    ops,
};

/// Member of an entity type referenced by a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub owner: TypeId,
    pub owner_name: &'static str,
    pub member: String,
}

/// Row filter expression over the members of an entity.
///
/// Build it with [`Predicate::column`] and the comparison methods, or with the `predicate!`
/// macro. Values are captured when the predicate is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Column(ColumnRef),
    Value(Value),
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// A form that cannot be evaluated over a row, rejected when the filter is created.
    Unsupported(String),
}

impl Predicate {
    pub fn column<T: Contract>(member: impl Into<String>) -> Self {
        Predicate::Column(ColumnRef {
            owner: TypeId::of::<T>(),
            owner_name: any::type_name::<T>(),
            member: member.into(),
        })
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Predicate::Value(value.into())
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Predicate::Unsupported(reason.into())
    }

    fn binary(self, op: BinaryOpType, rhs: impl Into<Predicate>) -> Self {
        Predicate::Binary(BinaryOp {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        })
    }

    fn unary(self, op: UnaryOpType) -> Self {
        Predicate::Unary(UnaryOp {
            op,
            arg: Box::new(self),
        })
    }

    pub fn equal(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::Equal, rhs)
    }
    pub fn not_equal(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::NotEqual, rhs)
    }
    pub fn less(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::Less, rhs)
    }
    pub fn less_equal(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::LessEqual, rhs)
    }
    pub fn greater(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::Greater, rhs)
    }
    pub fn greater_equal(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::GreaterEqual, rhs)
    }
    pub fn and(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::And, rhs)
    }
    pub fn or(self, rhs: impl Into<Predicate>) -> Self {
        self.binary(BinaryOpType::Or, rhs)
    }
    pub fn is_null(self) -> Self {
        self.unary(UnaryOpType::IsNull)
    }
    pub fn is_not_null(self) -> Self {
        self.unary(UnaryOpType::IsNotNull)
    }
    /// Arithmetic node, used by the `predicate!` macro.
    pub fn operation(self, op: BinaryOpType, rhs: impl Into<Predicate>) -> Self {
        self.binary(op, rhs)
    }

    /// Visits every node, depth first.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Predicate)) {
        f(self);
        match self {
            Predicate::Unary(v) => v.arg.visit(f),
            Predicate::Binary(v) => {
                v.lhs.visit(f);
                v.rhs.visit(f);
            }
            _ => {}
        }
    }

    /// Evaluates the predicate, `column` provides the value of each referenced member.
    pub fn evaluate(&self, column: &impl Fn(&ColumnRef) -> Value) -> Value {
        match self {
            Predicate::Column(v) => column(v),
            Predicate::Value(v) => v.clone(),
            Predicate::Unary(v) => v.op.apply(v.arg.evaluate(column)),
            Predicate::Binary(v) => {
                let lhs = v.lhs.evaluate(column);
                // Short circuit, the right side is not evaluated when the result is known
                match (v.op, &lhs) {
                    (BinaryOpType::And, Value::Boolean(Some(false))) => return lhs,
                    (BinaryOpType::Or, Value::Boolean(Some(true))) => return lhs,
                    _ => {}
                }
                v.op.apply(lhs, v.rhs.evaluate(column))
            }
            Predicate::Unsupported(..) => Value::Boolean(None),
        }
    }

    /// Whether the predicate holds. Unknown counts as false.
    pub fn test(&self, column: &impl Fn(&ColumnRef) -> Value) -> bool {
        matches!(self.evaluate(column), Value::Boolean(Some(true)))
    }
}

impl<T: AsValue> From<T> for Predicate {
    fn from(value: T) -> Self {
        Predicate::Value(value.as_value())
    }
}

impl From<&'static str> for Predicate {
    fn from(value: &'static str) -> Self {
        Predicate::Value(value.into())
    }
}

impl ops::Not for Predicate {
    type Output = Predicate;
    fn not(self) -> Self::Output {
        self.unary(UnaryOpType::Not)
    }
}

impl ops::Neg for Predicate {
    type Output = Predicate;
    fn neg(self) -> Self::Output {
        self.unary(UnaryOpType::Negative)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Column(v) => write!(f, "{}", v.member),
            Predicate::Value(v) => write!(f, "{v}"),
            Predicate::Unary(v) => match v.op {
                UnaryOpType::Negative => write!(f, "-{}", v.arg),
                UnaryOpType::Not => write!(f, "!({})", v.arg),
                UnaryOpType::IsNull => write!(f, "{} IS NULL", v.arg),
                UnaryOpType::IsNotNull => write!(f, "{} IS NOT NULL", v.arg),
            },
            Predicate::Binary(v) => {
                let op = match v.op {
                    BinaryOpType::Multiplication => "*",
                    BinaryOpType::Division => "/",
                    BinaryOpType::Remainder => "%",
                    BinaryOpType::Addition => "+",
                    BinaryOpType::Subtraction => "-",
                    BinaryOpType::Equal => "==",
                    BinaryOpType::NotEqual => "!=",
                    BinaryOpType::Less => "<",
                    BinaryOpType::Greater => ">",
                    BinaryOpType::LessEqual => "<=",
                    BinaryOpType::GreaterEqual => ">=",
                    BinaryOpType::And => "&&",
                    BinaryOpType::Or => "||",
                };
                write!(f, "({} {op} {})", v.lhs, v.rhs)
            }
            Predicate::Unsupported(v) => write!(f, "<{v}>"),
        }
    }
}
