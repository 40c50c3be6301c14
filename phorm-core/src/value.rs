use crate::{DbType, Error, Result};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{
    cmp::Ordering,
    fmt::{self, Display},
};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    macros::{date, datetime},
};
use uuid::Uuid;

/// A fieldless enum case carried as a value: its type, its case name and its integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: &'static str,
    pub name: &'static str,
    pub value: i64,
}

/// Dynamically typed value exchanged with the data source.
///
/// Every typed variant wraps an `Option`: `Value::Int32(None)` is both a typed null and the
/// type tag stored on a member definition.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Int128(Option<i128>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    Enum(Option<EnumValue>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Int128(l), Self::Int128(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::Enum(l), Self::Enum(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// True for `Value::Null` and for every typed variant holding `None`.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Int128(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::Enum(v) => v.is_none(),
        }
    }

    /// The empty (typed null) version of this value.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::Int128(..) => Value::Int128(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::Enum(..) => Value::Enum(None),
        }
    }

    /// Zero of this value type: `0`, `false`, empty text and bytes, year 1, nil uuid.
    pub fn zero(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(Some(false)),
            Value::Int8(..) => Value::Int8(Some(0)),
            Value::Int16(..) => Value::Int16(Some(0)),
            Value::Int32(..) => Value::Int32(Some(0)),
            Value::Int64(..) | Value::Enum(..) => Value::Int64(Some(0)),
            Value::Int128(..) => Value::Int128(Some(0)),
            Value::UInt8(..) => Value::UInt8(Some(0)),
            Value::UInt16(..) => Value::UInt16(Some(0)),
            Value::UInt32(..) => Value::UInt32(Some(0)),
            Value::UInt64(..) => Value::UInt64(Some(0)),
            Value::Float32(..) => Value::Float32(Some(0.0)),
            Value::Float64(..) => Value::Float64(Some(0.0)),
            Value::Decimal(..) => Value::Decimal(Some(Decimal::ZERO)),
            Value::Varchar(..) => Value::Varchar(Some(String::new())),
            Value::Blob(..) => Value::Blob(Some(Box::new([]))),
            Value::Date(..) => Value::Date(Some(date!(0001-01-01))),
            Value::Time(..) => Value::Time(Some(Time::MIDNIGHT)),
            Value::Timestamp(..) => Value::Timestamp(Some(datetime!(0001-01-01 00:00))),
            Value::TimestampWithTimezone(..) => {
                Value::TimestampWithTimezone(Some(datetime!(0001-01-01 00:00 UTC)))
            }
            Value::Uuid(..) => Value::Uuid(Some(Uuid::nil())),
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Value::Int8(..)
                | Value::Int16(..)
                | Value::Int32(..)
                | Value::Int64(..)
                | Value::Int128(..)
                | Value::UInt8(..)
                | Value::UInt16(..)
                | Value::UInt32(..)
                | Value::UInt64(..)
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Value::Date(..) | Value::Timestamp(..) | Value::TimestampWithTimezone(..)
        )
    }

    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::Boolean(Some(v)) => *v as i128,
            Value::Int8(Some(v)) => *v as i128,
            Value::Int16(Some(v)) => *v as i128,
            Value::Int32(Some(v)) => *v as i128,
            Value::Int64(Some(v)) => *v as i128,
            Value::Int128(Some(v)) => *v,
            Value::UInt8(Some(v)) => *v as i128,
            Value::UInt16(Some(v)) => *v as i128,
            Value::UInt32(Some(v)) => *v as i128,
            Value::UInt64(Some(v)) => *v as i128,
            Value::Enum(Some(v)) => v.value as i128,
            _ => return None,
        })
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(Some(v)) => Some(*v as f64),
            Value::Float64(Some(v)) => Some(*v),
            Value::Decimal(Some(v)) => v.to_f64(),
            v => v.as_i128().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(Some(v)) => Some(v),
            Value::Enum(Some(v)) => Some(v.name),
            _ => None,
        }
    }

    /// Declared type a parameter carrying this value would have.
    pub fn db_type(&self) -> DbType {
        match self {
            Value::Null => DbType::Object,
            Value::Boolean(..) => DbType::Boolean,
            Value::Int8(..) => DbType::SByte,
            Value::Int16(..) => DbType::Int16,
            Value::Int32(..) => DbType::Int32,
            Value::Int64(..) | Value::Enum(..) => DbType::Int64,
            Value::Int128(..) => DbType::Decimal,
            Value::UInt8(..) => DbType::Byte,
            Value::UInt16(..) => DbType::UInt16,
            Value::UInt32(..) => DbType::UInt32,
            Value::UInt64(..) => DbType::UInt64,
            Value::Float32(..) => DbType::Single,
            Value::Float64(..) => DbType::Double,
            Value::Decimal(..) => DbType::Decimal,
            Value::Varchar(..) => DbType::String,
            Value::Blob(..) => DbType::Binary,
            Value::Date(..) => DbType::Date,
            Value::Time(..) => DbType::Time,
            Value::Timestamp(..) => DbType::DateTime,
            Value::TimestampWithTimezone(..) => DbType::DateTimeOffset,
            Value::Uuid(..) => DbType::Guid,
        }
    }

    /// Equality across representations: `Int32(1) == Int64(1)`, an enum equals its integer or
    /// its case name, text compares exactly.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return self.is_null() && other.is_null();
        }
        match (self, other) {
            (Value::Enum(Some(l)), Value::Varchar(Some(r)))
            | (Value::Varchar(Some(r)), Value::Enum(Some(l))) => l.name.eq_ignore_ascii_case(r),
            _ => self.loose_cmp(other) == Some(Ordering::Equal),
        }
    }

    /// Ordering across representations, `None` when the two values are not comparable.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        if let (Some(l), Some(r)) = (self.as_i128(), other.as_i128()) {
            return Some(l.cmp(&r));
        }
        if let (Value::Decimal(Some(l)), Value::Decimal(Some(r))) = (self, other) {
            return Some(l.cmp(r));
        }
        if let (Some(l), Some(r)) = (self.as_f64(), other.as_f64()) {
            return l.partial_cmp(&r);
        }
        match (self, other) {
            (Value::Varchar(Some(l)), Value::Varchar(Some(r))) => Some(l.cmp(r)),
            (Value::Blob(Some(l)), Value::Blob(Some(r))) => Some(l.cmp(r)),
            (Value::Date(Some(l)), Value::Date(Some(r))) => Some(l.cmp(r)),
            (Value::Time(Some(l)), Value::Time(Some(r))) => Some(l.cmp(r)),
            (Value::Timestamp(Some(l)), Value::Timestamp(Some(r))) => Some(l.cmp(r)),
            (Value::TimestampWithTimezone(Some(l)), Value::TimestampWithTimezone(Some(r))) => {
                Some(l.cmp(r))
            }
            (Value::Uuid(Some(l)), Value::Uuid(Some(r))) => Some(l.cmp(r)),
            _ => None,
        }
    }

    /// Plaintext bytes fed to an encryptor, `None` for null values.
    pub fn to_secure_bytes(&self) -> Option<Vec<u8>> {
        Some(match self {
            Value::Boolean(Some(v)) => vec![*v as u8],
            Value::Int8(Some(v)) => v.to_le_bytes().to_vec(),
            Value::Int16(Some(v)) => v.to_le_bytes().to_vec(),
            Value::Int32(Some(v)) => v.to_le_bytes().to_vec(),
            Value::Int64(Some(v)) => v.to_le_bytes().to_vec(),
            Value::Int128(Some(v)) => v.to_le_bytes().to_vec(),
            Value::UInt8(Some(v)) => v.to_le_bytes().to_vec(),
            Value::UInt16(Some(v)) => v.to_le_bytes().to_vec(),
            Value::UInt32(Some(v)) => v.to_le_bytes().to_vec(),
            Value::UInt64(Some(v)) => v.to_le_bytes().to_vec(),
            Value::Float32(Some(v)) => v.to_le_bytes().to_vec(),
            Value::Float64(Some(v)) => v.to_le_bytes().to_vec(),
            Value::Decimal(Some(v)) => v.serialize().to_vec(),
            Value::Varchar(Some(v)) => v.as_bytes().to_vec(),
            Value::Blob(Some(v)) => v.to_vec(),
            Value::Date(Some(v)) => v.to_julian_day().to_le_bytes().to_vec(),
            Value::Time(Some(v)) => time_nanos(v).to_le_bytes().to_vec(),
            Value::Timestamp(Some(v)) => timestamp_nanos(v).to_le_bytes().to_vec(),
            Value::TimestampWithTimezone(Some(v)) => {
                let local = PrimitiveDateTime::new(v.date(), v.time());
                let mut result = timestamp_nanos(&local).to_le_bytes().to_vec();
                result.extend(v.offset().whole_seconds().to_le_bytes());
                result
            }
            Value::Uuid(Some(v)) => v.as_bytes().to_vec(),
            Value::Enum(Some(v)) => v.value.to_le_bytes().to_vec(),
            _ => return None,
        })
    }

    /// Rebuilds a value of the same type as `tag` from decrypted plaintext bytes.
    pub fn from_secure_bytes(tag: &Value, bytes: &[u8]) -> Result<Value> {
        macro_rules! le {
            ($ty:ty) => {
                <$ty>::from_le_bytes(bytes.try_into().map_err(|_| {
                    Error::msg(format!(
                        "Expected {} bytes to decode a {}, found {}",
                        size_of::<$ty>(),
                        stringify!($ty),
                        bytes.len()
                    ))
                })?)
            };
        }
        Ok(match tag {
            Value::Boolean(..) => Value::Boolean(Some(bytes.iter().any(|v| *v != 0))),
            Value::Int8(..) => Value::Int8(Some(le!(i8))),
            Value::Int16(..) => Value::Int16(Some(le!(i16))),
            Value::Int32(..) => Value::Int32(Some(le!(i32))),
            Value::Int64(..) => Value::Int64(Some(le!(i64))),
            Value::Int128(..) => Value::Int128(Some(le!(i128))),
            Value::UInt8(..) => Value::UInt8(Some(le!(u8))),
            Value::UInt16(..) => Value::UInt16(Some(le!(u16))),
            Value::UInt32(..) => Value::UInt32(Some(le!(u32))),
            Value::UInt64(..) => Value::UInt64(Some(le!(u64))),
            Value::Float32(..) => Value::Float32(Some(le!(f32))),
            Value::Float64(..) => Value::Float64(Some(le!(f64))),
            Value::Decimal(..) => Value::Decimal(Some(Decimal::deserialize(
                bytes
                    .try_into()
                    .map_err(|_| Error::msg("Expected 16 bytes to decode a decimal"))?,
            ))),
            Value::Varchar(..) => Value::Varchar(Some(String::from_utf8(bytes.to_vec())?)),
            Value::Null | Value::Blob(..) => Value::Blob(Some(bytes.into())),
            Value::Date(..) => Value::Date(Some(Date::from_julian_day(le!(i32))?)),
            Value::Time(..) => Value::Time(Some(time_from_nanos(le!(u64))?)),
            Value::Timestamp(..) => Value::Timestamp(Some(timestamp_from_nanos(le!(i128))?)),
            Value::TimestampWithTimezone(..) => {
                if bytes.len() != 20 {
                    return Err(Error::msg(format!(
                        "Expected 20 bytes to decode a timestamp with time zone, found {}",
                        bytes.len()
                    )));
                }
                let (local, offset) = bytes.split_at(16);
                let local = timestamp_from_nanos(i128::from_le_bytes(local.try_into()?))?;
                let offset = UtcOffset::from_whole_seconds(i32::from_le_bytes(offset.try_into()?))?;
                Value::TimestampWithTimezone(Some(local.assume_offset(offset)))
            }
            Value::Uuid(..) => Value::Uuid(Some(Uuid::from_slice(bytes)?)),
            Value::Enum(..) => Value::Int64(Some(le!(i64))),
        })
    }
}

fn time_nanos(v: &Time) -> u64 {
    let (h, m, s, n) = v.as_hms_nano();
    ((h as u64 * 60 + m as u64) * 60 + s as u64) * 1_000_000_000 + n as u64
}

fn time_from_nanos(nanos: u64) -> Result<Time> {
    let secs = nanos / 1_000_000_000;
    Ok(Time::from_hms_nano(
        (secs / 3600) as u8,
        ((secs / 60) % 60) as u8,
        (secs % 60) as u8,
        (nanos % 1_000_000_000) as u32,
    )?)
}

fn timestamp_nanos(v: &PrimitiveDateTime) -> i128 {
    v.assume_utc().unix_timestamp_nanos()
}

fn timestamp_from_nanos(nanos: i128) -> Result<PrimitiveDateTime> {
    let v = OffsetDateTime::from_unix_timestamp_nanos(nanos)?;
    Ok(PrimitiveDateTime::new(v.date(), v.time()))
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match self {
            Value::Boolean(Some(v)) => write!(f, "{v}"),
            Value::Float32(Some(v)) => write!(f, "{v}"),
            Value::Float64(Some(v)) => write!(f, "{v}"),
            Value::Decimal(Some(v)) => write!(f, "{v}"),
            Value::Varchar(Some(v)) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Blob(Some(v)) => write!(f, "0x{}", hex::encode(v)),
            Value::Date(Some(v)) => write!(f, "'{v}'"),
            Value::Time(Some(v)) => write!(f, "'{v}'"),
            Value::Timestamp(Some(v)) => write!(f, "'{v}'"),
            Value::TimestampWithTimezone(Some(v)) => write!(f, "'{v}'"),
            Value::Uuid(Some(v)) => write!(f, "'{v}'"),
            Value::Enum(Some(v)) => write!(f, "{}::{}", v.type_name, v.name),
            v => match v.as_i128() {
                Some(v) => write!(f, "{v}"),
                None => f.write_str("NULL"),
            },
        }
    }
}
