use crate::{
    Behavior, Contract, MemberAttribute, MemberDefinition, MemberInfo, MemberKind,
    ParameterDirection, PhormError, Result, SourceId, TypeDescription, Value, util::TypeCache,
};
use std::{
    any::{self, TypeId},
    collections::HashSet,
    sync::Arc,
};

static MEMBERS: TypeCache<[MemberDefinition]> = TypeCache::new();

/// Derives the bindable members of a contract type.
pub struct MemberModel;

impl MemberModel {
    /// Ordered member definitions of `T`, derived on first use and shared afterwards.
    pub fn derive<T: Contract>() -> Result<Arc<[MemberDefinition]>> {
        MEMBERS.get_or_try_insert(TypeId::of::<T>(), || {
            log::debug!("Deriving the member model of `{}`", any::type_name::<T>());
            Self::from_description(TypeId::of::<T>(), &T::describe()).map(Into::into)
        })
    }

    /// Applies the derivation rules to a type description, without caching.
    pub fn from_description(
        owner: TypeId,
        description: &TypeDescription,
    ) -> Result<Vec<MemberDefinition>> {
        let mut result = Vec::with_capacity(description.members.len());
        let mut names = HashSet::new();
        for (ordinal, member) in description.members.iter().enumerate() {
            if member.has(|v| matches!(v, MemberAttribute::Ignore | MemberAttribute::Console)) {
                log::trace!(
                    "Member `{}` of `{}` is not bindable, skipped",
                    member.ident,
                    description.name
                );
                continue;
            }
            let Some(definition) = Self::definition(owner, description, ordinal, member)? else {
                continue;
            };
            if !names.insert(definition.db_name.to_ascii_lowercase()) {
                return Err(PhormError::contract_definition(
                    description.name,
                    member.ident,
                    format!("the name `{}` is bound more than once", definition.db_name),
                )
                .into());
            }
            result.push(definition);
        }
        Ok(result)
    }

    fn definition(
        owner: TypeId,
        description: &TypeDescription,
        ordinal: usize,
        member: &MemberInfo,
    ) -> Result<Option<MemberDefinition>> {
        let invalid = |reason: &str| -> crate::Error {
            PhormError::contract_definition(description.name, member.ident, reason).into()
        };
        let forced_output = member.has(|v| matches!(v, MemberAttribute::Output));
        let return_value = member.has(|v| matches!(v, MemberAttribute::ReturnValue));
        if forced_output && return_value {
            return Err(invalid("cannot be both an output and the return value"));
        }
        let (readable, writable, direction) = match member.kind {
            MemberKind::Calculated {
                parameters,
                writable,
            } => {
                if parameters != 0 {
                    return Err(invalid(&format!(
                        "a calculated member must take no parameters, found {parameters}"
                    )));
                }
                if writable || forced_output || return_value {
                    return Err(invalid("a calculated member can only be an input"));
                }
                (true, false, ParameterDirection::Input)
            }
            MemberKind::Field { readable, writable } => {
                let direction = if return_value {
                    ParameterDirection::ReturnValue
                } else if forced_output {
                    ParameterDirection::Output
                } else {
                    match (readable, writable) {
                        (true, true) => ParameterDirection::InputOutput,
                        (true, false) => ParameterDirection::Input,
                        (false, true) => ParameterDirection::Output,
                        (false, false) => {
                            log::trace!(
                                "Member `{}` of `{}` is neither readable nor writable, skipped",
                                member.ident,
                                description.name
                            );
                            return Ok(None);
                        }
                    }
                };
                (readable, writable, direction)
            }
        };
        let mut db_name = None;
        let mut is_required = false;
        let mut size = None;
        let mut behaviors = Vec::new();
        for attribute in &member.attributes {
            match attribute {
                MemberAttribute::Rename(name) => db_name = Some(*name),
                MemberAttribute::Required => is_required = true,
                MemberAttribute::Size(v) => size = Some(*v),
                MemberAttribute::Behavior(behavior) => {
                    if behaviors.contains(behavior) {
                        return Err(invalid("the same behavior is attached twice"));
                    }
                    behaviors.push(behavior.clone());
                }
                _ => {}
            }
        }
        let is_enum = matches!(member.value, Value::Enum(..));
        if !is_enum
            && behaviors
                .iter()
                .any(|v| matches!(v, Behavior::EnumAsInt | Behavior::EnumAsString))
        {
            return Err(invalid("enum behaviors only apply to enum members"));
        }
        if is_enum && !behaviors.contains(&Behavior::EnumAsString) {
            if !behaviors.contains(&Behavior::EnumAsInt) {
                behaviors.push(Behavior::EnumAsInt);
            }
        } else if behaviors.contains(&Behavior::EnumAsInt) {
            return Err(invalid("an enum member travels either as an integer or as a name"));
        }
        behaviors.sort_by_key(|v| match v {
            Behavior::Secure(..) => 0,
            Behavior::Transform(..) => 1,
            Behavior::EnumAsInt => 2,
            Behavior::EnumAsString => 3,
        });
        if let Some(authenticator) = behaviors.iter().find_map(|v| match v {
            Behavior::Secure(secure) => secure.authenticator,
            _ => None,
        }) {
            if authenticator == member.ident {
                return Err(invalid("a secure member cannot authenticate itself"));
            }
            if !description
                .members
                .iter()
                .any(|v| v.ident == authenticator)
            {
                return Err(invalid(&format!(
                    "the authenticator `{authenticator}` is not a member"
                )));
            }
        }
        Ok(Some(MemberDefinition {
            db_name: db_name.unwrap_or(member.ident).to_string(),
            ident: member.ident,
            direction,
            value: member.value.clone(),
            nullable: member.nullable,
            is_required,
            behaviors,
            size,
            ordinal,
            readable,
            writable,
            source_id: SourceId {
                owner,
                ident: member.ident,
            },
        }))
    }
}
