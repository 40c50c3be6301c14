use crate::{
    Constructor, Contract, EntityShape, MemberDefinition, Parameter, ParameterDirection,
    PhormError, Result, RowLabeled, Settings, Transformed, Value,
};
use anyhow::Context;

/// Bytes fed to a cipher as authenticator. Integers are widened so the bytes do not depend on
/// the width the value was read with.
pub(crate) fn authenticator_bytes(value: &Value) -> Option<Vec<u8>> {
    if value.is_null() {
        return None;
    }
    match value.as_i128() {
        Some(v) if value.is_integral() || matches!(value, Value::Enum(..)) => {
            Some(v.to_le_bytes().to_vec())
        }
        _ => value.to_secure_bytes(),
    }
}

/// Inbound conversion of a raw value: decryption first, then the transform.
pub(crate) fn read_member(
    member: &MemberDefinition,
    raw: Value,
    settings: &Settings,
    authenticator: impl FnOnce(&str) -> Option<Value>,
) -> Result<Transformed> {
    let mut value = raw;
    if let Some(secure) = member.secure()
        && !value.is_null()
    {
        let ciphertext = match value {
            Value::Blob(Some(v)) => v,
            Value::Varchar(Some(v)) => v.into_bytes().into_boxed_slice(),
            v => {
                return Err(crate::Error::msg(format!(
                    "Member `{}` is secure, expected binary data but found {v:?}",
                    member.ident
                )));
            }
        };
        let authenticator = secure
            .authenticator
            .and_then(authenticator)
            .and_then(|v| authenticator_bytes(&v));
        let plaintext = secure.decrypt(
            member.ident,
            settings,
            &ciphertext,
            authenticator.as_deref(),
        )?;
        // A transformed member receives the plaintext bytes, its outbound type is unknown.
        let tag = if member.transform().is_some() {
            &Value::Null
        } else if member.enum_as_string() {
            &Value::Varchar(None)
        } else {
            &member.value
        };
        value = Value::from_secure_bytes(tag, &plaintext)?;
    }
    match member.transform() {
        Some(transform) => transform.from_datasource(member, value),
        None => Ok(Transformed::Value(value)),
    }
}

/// Turns rows into entities following their [`EntityShape`].
#[derive(Debug, Clone, Default)]
pub struct EntityDecoder {
    pub settings: Settings,
}

impl EntityDecoder {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn decode<T: Contract>(&self, row: &RowLabeled) -> Result<T> {
        let shape = EntityShape::of::<T>()?;
        self.decode_with(&shape, row)
    }

    /// Decodes `row` as `T` using an already resolved shape.
    pub fn decode_with<T: Contract>(&self, shape: &EntityShape, row: &RowLabeled) -> Result<T> {
        self.report(shape, row);
        let mut instance = self.instantiate::<T>(shape, row)?;
        self.apply_setters(shape, &shape.basic_setters, &mut instance, row)?;
        self.apply_setters(shape, &shape.deferred_setters, &mut instance, row)?;
        Ok(instance)
    }

    /// Refreshes an existing instance from `row`. Members without a column, and members whose
    /// transform ignores the value, keep their current value.
    pub fn decode_into<T: Contract>(&self, instance: &mut T, row: &RowLabeled) -> Result<()> {
        let shape = EntityShape::of::<T>()?;
        self.report(&shape, row);
        let setters = shape
            .constructor_fields
            .iter()
            .chain(&shape.basic_setters)
            .filter(|i| !shape.members[**i].is_deferred())
            .copied()
            .collect::<Vec<_>>();
        self.apply_setters(&shape, &setters, instance, row)?;
        let deferred = shape
            .constructor_fields
            .iter()
            .chain(&shape.deferred_setters)
            .filter(|i| shape.members[**i].is_deferred())
            .copied()
            .collect::<Vec<_>>();
        self.apply_setters(&shape, &deferred, instance, row)
    }

    /// Decoded values of the members at `indices`, `None` for members without a column or
    /// ignored by their transform.
    pub fn decode_members(
        &self,
        shape: &EntityShape,
        indices: &[usize],
        row: &RowLabeled,
    ) -> Result<Vec<Option<Value>>> {
        indices
            .iter()
            .map(|i| {
                let member = &shape.members[*i];
                let Some(raw) = row.get_column(&member.db_name) else {
                    return Ok(None);
                };
                let transformed = read_member(member, raw.clone(), &self.settings, |v| {
                    self.raw_member(shape, row, v)
                })
                .with_context(|| self.context(shape, member))?;
                Ok(match transformed {
                    Transformed::Value(v) => Some(v),
                    Transformed::Ignore => None,
                })
            })
            .collect()
    }

    fn context(&self, shape: &EntityShape, member: &MemberDefinition) -> String {
        format!(
            "While decoding member `{}` of `{}`",
            member.ident, shape.type_name
        )
    }

    fn raw_member(&self, shape: &EntityShape, row: &RowLabeled, ident: &str) -> Option<Value> {
        shape
            .members
            .iter()
            .find(|v| v.ident == ident)
            .and_then(|v| row.get_column(&v.db_name))
            .cloned()
    }

    fn report(&self, shape: &EntityShape, row: &RowLabeled) {
        let diagnostics = &self.settings.diagnostics;
        // Setters read columns by wire name only
        for column in row.names() {
            if !shape.members.iter().any(|v| v.db_name.eq_ignore_ascii_case(column)) {
                diagnostics.unexpected_column(shape.type_name, column);
            }
        }
        for (i, member) in shape.members.iter().enumerate() {
            let decoded = member.writable || shape.constructor_fields.contains(&i);
            if decoded
                && member.direction != ParameterDirection::ReturnValue
                && !row.contains(&member.db_name)
            {
                diagnostics.unresolved_member(shape.type_name, &member.db_name);
            }
        }
    }

    fn instantiate<T: Contract>(&self, shape: &EntityShape, row: &RowLabeled) -> Result<T> {
        let missing = || -> crate::Error {
            PhormError::MissingConstructor {
                entity: shape.type_name.into(),
            }
            .into()
        };
        if shape.is_abstract {
            return Err(missing());
        }
        match shape.constructor {
            Constructor::Record => {
                let mut args = Vec::with_capacity(shape.constructor_fields.len());
                for i in &shape.constructor_fields {
                    let member = &shape.members[*i];
                    let value = match row.get_column(&member.db_name) {
                        Some(raw) => {
                            match read_member(member, raw.clone(), &self.settings, |v| {
                                self.raw_member(shape, row, v)
                            })
                            .with_context(|| self.context(shape, member))?
                            {
                                Transformed::Value(v) => v,
                                Transformed::Ignore => member.value.as_null(),
                            }
                        }
                        None => member.value.as_null(),
                    };
                    args.push(if value.is_null() && !member.nullable {
                        member.value.zero()
                    } else {
                        value
                    });
                }
                T::create_record(args)
                    .with_context(|| format!("While constructing a `{}`", shape.type_name))
            }
            Constructor::Default => T::create_default().ok_or_else(missing),
            Constructor::None => Err(missing()),
        }
    }

    fn apply_setters<T: Contract>(
        &self,
        shape: &EntityShape,
        setters: &[usize],
        instance: &mut T,
        row: &RowLabeled,
    ) -> Result<()> {
        for i in setters {
            let member = &shape.members[*i];
            let Some(raw) = row.get_column(&member.db_name) else {
                continue;
            };
            let transformed = read_member(member, raw.clone(), &self.settings, |v| {
                instance.get_member(v)
            })
            .with_context(|| self.context(shape, member))?;
            let Transformed::Value(value) = transformed else {
                log::trace!(
                    "Member `{}` of `{}` ignored by its transform",
                    member.ident,
                    shape.type_name
                );
                continue;
            };
            if value.is_null() && !member.nullable {
                log::trace!(
                    "Null value for non nullable member `{}` of `{}` skipped",
                    member.ident,
                    shape.type_name
                );
                continue;
            }
            instance
                .set_member(member.ident, value)
                .with_context(|| self.context(shape, member))?;
        }
        Ok(())
    }

    /// Writes the values of returned Output, InputOutput and ReturnValue parameters back into
    /// `contract`. Returns the value of the return value parameter, if any.
    pub fn apply_outputs<C: Contract>(
        &self,
        contract: &mut C,
        parameters: &[Parameter],
    ) -> Result<Option<Value>> {
        let shape = EntityShape::of::<C>()?;
        let returned = parameters
            .iter()
            .find(|v| v.direction == ParameterDirection::ReturnValue)
            .map(|v| v.value.clone());
        let row = RowLabeled::new(
            parameters
                .iter()
                .filter(|v| v.direction.is_outbound())
                .map(|v| v.name.clone())
                .collect(),
            parameters
                .iter()
                .filter(|v| v.direction.is_outbound())
                .map(|v| v.value.clone())
                .collect(),
        );
        let outbound = |deferred: bool| {
            shape
                .members
                .iter()
                .enumerate()
                .filter(|(_, v)| {
                    v.writable && v.direction.is_outbound() && v.is_deferred() == deferred
                })
                .map(|(i, _)| i)
                .collect::<Vec<_>>()
        };
        self.apply_setters(&shape, &outbound(false), contract, &row)?;
        self.apply_setters(&shape, &outbound(true), contract, &row)?;
        Ok(returned)
    }
}
