use crate::{
    Arguments, Contract, ContractMemberValue, DbType, MemberModel, Parameter, ParameterSink,
    PhormError, Result, Settings, Value, decoder::authenticator_bytes,
};
use anyhow::Context;
use std::any::{self, TypeId};
use time::PrimitiveDateTime;

/// Builds the outbound parameters of a call.
#[derive(Debug, Clone, Default)]
pub struct ParameterEncoder {
    pub settings: Settings,
}

impl ParameterEncoder {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Encodes one member. `authenticator` is the value of the member feeding the cipher of a
    /// secure member.
    pub fn encode(
        &self,
        contract: &str,
        member: &mut ContractMemberValue,
        authenticator: Option<Value>,
    ) -> Result<Parameter> {
        let definition = member.definition;
        if definition.is_required
            && definition.direction.is_inbound()
            && member.value.is_null()
        {
            let error = PhormError::RequiredValueMissing {
                contract: contract.into(),
                member: definition.ident.into(),
            };
            log::error!("{error}");
            return Err(error.into());
        }
        let mut value = std::mem::take(&mut member.value);
        let mut db_type = None;
        if let Some(transform) = definition.transform() {
            value = transform
                .to_datasource(definition, value)
                .with_context(|| format!("While transforming member `{}`", definition.ident))?;
        } else {
            value = match value {
                Value::Enum(v) => {
                    if definition.enum_as_string() {
                        Value::Varchar(v.map(|v| v.name.to_string()))
                    } else {
                        Value::Int64(v.map(|v| v.value))
                    }
                }
                v if v.is_temporal() => {
                    let clamped = self.clamp(&v);
                    if clamped != v {
                        log::trace!("Member `{}` clamped from {v} to {clamped}", definition.ident);
                    }
                    clamped
                }
                v => v,
            };
            if matches!(value, Value::Blob(..) | Value::Uuid(..)) {
                db_type = Some(value.db_type());
            }
        }
        if let Some(secure) = definition.secure() {
            value = match value.to_secure_bytes() {
                Some(plaintext) => {
                    let authenticator = authenticator.as_ref().and_then(authenticator_bytes);
                    let ciphertext = secure.encrypt(
                        definition.ident,
                        &self.settings,
                        &plaintext,
                        authenticator.as_deref(),
                    )?;
                    Value::Blob(Some(ciphertext.into()))
                }
                None => Value::Blob(None),
            };
            db_type = Some(DbType::Binary);
        }
        let size = definition.size.or_else(|| match &value {
            Value::Varchar(Some(v)) => Some(v.chars().count().max(self.settings.default_string_size)),
            Value::Varchar(None) if definition.direction.is_inbound() => {
                Some(self.settings.default_string_size)
            }
            Value::Blob(Some(v)) => Some(v.len()),
            _ => None,
        });
        member.set_value(value.clone());
        Ok(Parameter {
            name: definition.db_name.clone(),
            direction: definition.direction,
            db_type,
            size,
            value,
        })
    }

    /// Temporal values outside the configured range are moved to its closest bound.
    fn clamp(&self, value: &Value) -> Value {
        let range = &self.settings.date_range;
        let clamp = |v: PrimitiveDateTime| v.clamp(range.min, range.max);
        match value {
            Value::Date(Some(v)) => Value::Date(Some(
                (*v).clamp(range.min.date(), range.max.date()),
            )),
            Value::Timestamp(Some(v)) => Value::Timestamp(Some(clamp(*v))),
            // Compared as UTC instants, the bound keeps the original offset when representable
            Value::TimestampWithTimezone(Some(v)) => {
                let instant = v.unix_timestamp_nanos();
                let bound = if instant < range.min.assume_utc().unix_timestamp_nanos() {
                    range.min
                } else if instant > range.max.assume_utc().unix_timestamp_nanos() {
                    range.max
                } else {
                    return value.clone();
                };
                let bound = bound.assume_utc();
                Value::TimestampWithTimezone(Some(
                    bound.checked_to_offset(v.offset()).unwrap_or(bound),
                ))
            }
            v => v.clone(),
        }
    }

    /// Parameters of every bindable member of `C`. Any failure aborts the whole call.
    pub fn encode_contract<C: Contract>(&self, arguments: &Arguments) -> Result<Vec<Parameter>> {
        let members = MemberModel::derive::<C>()?;
        let type_id = TypeId::of::<C>();
        let contract = any::type_name::<C>();
        members
            .iter()
            .filter(|v| v.direction.is_bindable())
            .map(|definition| {
                let value = if definition.direction.is_inbound() {
                    arguments.resolve(type_id, definition)
                } else {
                    None
                }
                .unwrap_or_else(|| definition.value.as_null());
                let authenticator = definition
                    .secure()
                    .and_then(|v| v.authenticator)
                    .and_then(|v| arguments.lookup(type_id, v));
                self.encode(
                    contract,
                    &mut ContractMemberValue::new(definition, value),
                    authenticator,
                )
            })
            .collect()
    }

    /// Encodes every parameter, then hands them to `sink`. Nothing reaches the sink when any
    /// member fails to encode.
    pub fn bind<C: Contract>(
        &self,
        arguments: &Arguments,
        sink: &mut impl ParameterSink,
    ) -> Result<()> {
        let parameters = self.encode_contract::<C>(arguments)?;
        log::debug!(
            "Binding {} parameter(s) of `{}`",
            parameters.len(),
            any::type_name::<C>()
        );
        for parameter in parameters {
            sink.add_parameter(parameter)?;
        }
        Ok(())
    }
}
