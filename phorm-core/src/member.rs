use crate::{Behavior, ParameterDirection, SecureValue, ValueTransform, Value};
use std::{
    any::TypeId,
    fmt::{self, Display},
    sync::Arc,
};

/// Identity of the declaring member: owner type plus identifier.
///
/// Two definitions sharing a `SourceId` are the same member seen through different shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId {
    pub owner: TypeId,
    pub ident: &'static str,
}

/// Derived, immutable description of one bindable member.
#[derive(Debug, Clone)]
pub struct MemberDefinition {
    /// Name on the wire, after renames.
    pub db_name: String,
    /// Identifier on the type.
    pub ident: &'static str,
    pub direction: ParameterDirection,
    /// Type tag.
    pub value: Value,
    pub nullable: bool,
    pub is_required: bool,
    pub behaviors: Vec<Behavior>,
    /// Declared size, `None` lets the encoder compute it.
    pub size: Option<usize>,
    /// Position in the type description.
    pub ordinal: usize,
    pub readable: bool,
    pub writable: bool,
    pub source_id: SourceId,
}

impl MemberDefinition {
    pub fn secure(&self) -> Option<&SecureValue> {
        self.behaviors.iter().find_map(|v| match v {
            Behavior::Secure(secure) => Some(secure),
            _ => None,
        })
    }

    pub fn transform(&self) -> Option<&Arc<dyn ValueTransform>> {
        self.behaviors.iter().find_map(|v| match v {
            Behavior::Transform(transform) => Some(transform),
            _ => None,
        })
    }

    pub fn enum_as_string(&self) -> bool {
        self.behaviors.contains(&Behavior::EnumAsString)
    }

    /// Whether the member is applied in the second decode pass.
    pub fn is_deferred(&self) -> bool {
        self.behaviors.iter().any(Behavior::is_deferred)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.db_name.eq_ignore_ascii_case(name) || self.ident.eq_ignore_ascii_case(name)
    }
}

impl Display for MemberDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.db_name, self.direction)
    }
}

/// A member definition paired with the value the caller supplied for it.
#[derive(Debug, Clone)]
pub struct ContractMemberValue<'a> {
    pub definition: &'a MemberDefinition,
    pub value: Value,
    /// Whether `value` was set after construction.
    pub has_changed: bool,
}

impl<'a> ContractMemberValue<'a> {
    pub fn new(definition: &'a MemberDefinition, value: Value) -> Self {
        Self {
            definition,
            value,
            has_changed: false,
        }
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        self.has_changed = true;
    }
}
