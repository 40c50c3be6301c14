use crate::{Result, Value};
use std::fmt::{self, Display};

/// How a member travels between the caller and the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    Input,
    Output,
    InputOutput,
    ReturnValue,
    /// Console capture sink, never bound as a parameter.
    Console,
}

impl ParameterDirection {
    /// Directions that produce a command parameter.
    pub fn is_bindable(&self) -> bool {
        !matches!(self, ParameterDirection::Console)
    }
    /// The caller supplies the value.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            ParameterDirection::Input | ParameterDirection::InputOutput
        )
    }
    /// The data source hands a value back.
    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            ParameterDirection::Output
                | ParameterDirection::InputOutput
                | ParameterDirection::ReturnValue
        )
    }
}

/// Declared parameter type understood by the parameter sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    Object,
    Boolean,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    String,
    Binary,
    Guid,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
}

/// An outbound command parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub direction: ParameterDirection,
    /// Explicit type, `None` lets the sink infer it from the value.
    pub db_type: Option<DbType>,
    pub size: Option<usize>,
    pub value: Value,
}

impl Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.name, self.direction)?;
        if let Some(db_type) = self.db_type {
            write!(f, " {db_type:?}")?;
        }
        if let Some(size) = self.size {
            write!(f, "({size})")?;
        }
        write!(f, " = {}", self.value)
    }
}

/// Receives the parameters of a command, how they become wire bytes is up to the sink.
pub trait ParameterSink {
    fn add_parameter(&mut self, parameter: Parameter) -> Result<()>;
}

impl ParameterSink for Vec<Parameter> {
    fn add_parameter(&mut self, parameter: Parameter) -> Result<()> {
        self.push(parameter);
        Ok(())
    }
}
