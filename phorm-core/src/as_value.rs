use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{any, sync::Arc};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Generated contract code reads members through [`AsValue::as_value`] and writes them back
/// through [`AsValue::try_from_value`], so any member type must implement it. Numeric
/// conversions accept every integer width and check the range before narrowing; text is
/// parsed when the source hands back a `Varchar` for a typed member.
///
/// # Examples
/// ```rust
/// use phorm_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed null for this type, used as the member type tag.
    fn as_empty_value() -> Value;
    /// Owned value representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Whether the type accepts null.
    fn nullable() -> bool {
        false
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $destination(Some(v)) = value {
                    return Ok(v);
                }
                if let Some(v) = value.as_i128() {
                    return <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {v} is out of range for {}",
                            any::type_name::<Self>(),
                        ))
                    });
                }
                match value {
                    Value::Varchar(Some(ref v)) => v.trim().parse::<$source>().map_err(|e| {
                        Error::msg(format!(
                            "Cannot parse `{}` as {}: {e}",
                            truncate_long!(v),
                            any::type_name::<Self>(),
                        ))
                    }),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(i128, Value::Int128);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    Value::Varchar(Some(ref v)) => v.trim().parse::<$source>().map_err(|e| {
                        Error::msg(format!(
                            "Cannot parse `{}` as {}: {e}",
                            truncate_long!(v),
                            any::type_name::<Self>(),
                        ))
                    }),
                    ref v => match v.as_f64() {
                        Some(v) => Ok(v as $source),
                        None => Err(conversion_error::<Self>(&value)),
                    },
                }
            }
        }
    };
}

impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "t" | "y" | "yes" => Ok(true),
                "false" | "0" | "f" | "n" | "no" => Ok(false),
                _ => Err(conversion_error::<Self>(&value)),
            },
            ref v if v.is_integral() => Ok(v.as_i128() != Some(0)),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => Decimal::from_f32(v).ok_or(conversion_error::<Self>(&value)),
            Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or(conversion_error::<Self>(&value)),
            Value::Varchar(Some(ref v)) => Ok(v.trim().parse::<Decimal>()?),
            ref v => match v.as_i128() {
                Some(v) => Decimal::from_i128(v).ok_or(conversion_error::<Self>(&value)),
                None => Err(conversion_error::<Self>(&value)),
            },
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Enum(Some(v)) => Ok(v.name.to_string()),
            Value::Uuid(Some(v)) => Ok(v.to_string()),
            ref v if !v.is_null() && !matches!(v, Value::Blob(..)) => {
                Ok(v.to_string().trim_matches('\'').to_string())
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Uuid(Some(v)) => Ok(v.as_bytes().to_vec().into_boxed_slice()),
            Value::Varchar(Some(ref v)) if v.starts_with("0x") || v.starts_with("0X") => {
                Ok(hex::decode(&v[2..])?.into_boxed_slice())
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Box::<[u8]>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Ok(Uuid::parse_str(v.trim())?),
            Value::Blob(Some(ref v)) => Ok(Uuid::from_slice(v)?),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::TimestampWithTimezone(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => Ok(Date::parse(
                v.trim(),
                format_description!("[year]-[month]-[day]"),
            )?),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.time()),
            Value::Varchar(Some(ref v)) => Ok(Time::parse(
                v.trim(),
                format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]"),
            )?),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Date(Some(v)) => Ok(v.midnight()),
            Value::TimestampWithTimezone(Some(v)) => {
                let v = v.to_offset(time::UtcOffset::UTC);
                Ok(PrimitiveDateTime::new(v.date(), v.time()))
            }
            Value::Varchar(Some(ref v)) => {
                let v = v.trim();
                PrimitiveDateTime::parse(
                    v,
                    format_description!(
                        "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
                    ),
                )
                .or_else(|_| {
                    PrimitiveDateTime::parse(
                        v,
                        format_description!(
                            "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
                        ),
                    )
                })
                .map_err(|e| {
                    Error::msg(format!(
                        "Cannot parse `{}` as a timestamp: {e}",
                        truncate_long!(v)
                    ))
                })
            }
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for OffsetDateTime {
    fn as_empty_value() -> Value {
        Value::TimestampWithTimezone(None)
    }
    fn as_value(self) -> Value {
        Value::TimestampWithTimezone(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::TimestampWithTimezone(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
            Value::Varchar(Some(ref v)) => Ok(OffsetDateTime::parse(v.trim(), &Rfc3339)?),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
    fn nullable() -> bool {
        true
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
    fn nullable() -> bool {
        T::nullable()
    }
}

impl<T: AsValue + Clone> AsValue for Arc<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        Arc::unwrap_or_clone(self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Arc::new)
    }
    fn nullable() -> bool {
        T::nullable()
    }
}
