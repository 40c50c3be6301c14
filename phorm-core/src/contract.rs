use crate::{
    AsValue, Behavior, MemberDefinition, MemberModel, PhormError, ResultsetDef, Result, Value,
};
use std::{
    any::{self, Any, TypeId},
    sync::Arc,
};

/// How a member is reached on the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A stored property.
    Field { readable: bool, writable: bool },
    /// A method computing the value on demand.
    Calculated { parameters: usize, writable: bool },
}

/// Annotation attached to a member.
#[derive(Debug, Clone)]
pub enum MemberAttribute {
    Ignore,
    /// Name on the wire, overrides the identifier.
    Rename(&'static str),
    Required,
    /// Forces the Output direction.
    Output,
    ReturnValue,
    /// Console capture sink.
    Console,
    Size(usize),
    Behavior(Behavior),
}

/// Raw description of one member, before any derivation rule is applied.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub ident: &'static str,
    pub kind: MemberKind,
    /// Type tag.
    pub value: Value,
    pub nullable: bool,
    pub attributes: Vec<MemberAttribute>,
}

impl MemberInfo {
    pub fn field<T: AsValue>(ident: &'static str) -> Self {
        Self {
            ident,
            kind: MemberKind::Field {
                readable: true,
                writable: true,
            },
            value: T::as_empty_value(),
            nullable: T::nullable(),
            attributes: Vec::new(),
        }
    }

    pub fn calculated<T: AsValue>(ident: &'static str) -> Self {
        Self {
            ident,
            kind: MemberKind::Calculated {
                parameters: 0,
                writable: false,
            },
            value: T::as_empty_value(),
            nullable: T::nullable(),
            attributes: Vec::new(),
        }
    }

    /// Member without a value type (ignored fields, console sinks).
    pub fn opaque(ident: &'static str) -> Self {
        Self {
            ident,
            kind: MemberKind::Field {
                readable: true,
                writable: true,
            },
            value: Value::Null,
            nullable: true,
            attributes: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: MemberKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn read_only(self) -> Self {
        self.with_kind(MemberKind::Field {
            readable: true,
            writable: false,
        })
    }

    pub fn write_only(self) -> Self {
        self.with_kind(MemberKind::Field {
            readable: false,
            writable: true,
        })
    }

    pub fn with(mut self, attribute: MemberAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn has(&self, f: impl Fn(&MemberAttribute) -> bool) -> bool {
        self.attributes.iter().any(f)
    }
}

/// Declares a type as the specialization selected when `member` equals `value`.
#[derive(Debug, Clone)]
pub struct SpecOf {
    pub member: &'static str,
    pub value: Value,
}

/// Everything the engine needs to know about a type, produced by `#[derive(Contract)]` or
/// written by hand.
#[derive(Debug, Clone)]
pub struct TypeDescription {
    pub name: &'static str,
    pub members: Vec<MemberInfo>,
    /// Primary constructor parameters, in positional order.
    pub record_constructor: Option<Vec<&'static str>>,
    pub is_abstract: bool,
    pub spec_of: Option<SpecOf>,
    pub resultsets: Vec<ResultsetDef>,
}

impl TypeDescription {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            members: Vec::new(),
            record_constructor: None,
            is_abstract: false,
            spec_of: None,
            resultsets: Vec::new(),
        }
    }
    pub fn member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }
    pub fn record(mut self, parameters: impl IntoIterator<Item = &'static str>) -> Self {
        self.record_constructor = Some(parameters.into_iter().collect());
        self
    }
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }
    pub fn spec_of(mut self, member: &'static str, value: impl Into<Value>) -> Self {
        self.spec_of = Some(SpecOf {
            member,
            value: value.into(),
        });
        self
    }
    pub fn resultset(mut self, resultset: ResultsetDef) -> Self {
        self.resultsets.push(resultset);
        self
    }
}

/// A type bound to the data source: a call contract, a table, a view or a result entity.
///
/// Members are reached by identifier, the generated implementation dispatches on it.
pub trait Contract: Any {
    fn describe() -> TypeDescription
    where
        Self: Sized;

    /// Current value of a readable member, `None` when no such member exists.
    fn get_member(&self, ident: &str) -> Option<Value>;

    fn set_member(&mut self, ident: &str, value: Value) -> Result<()>;

    /// Zero argument construction, `None` when the type has none.
    fn create_default() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    /// Construction through the primary constructor, values in positional order.
    fn create_record(values: Vec<Value>) -> Result<Self>
    where
        Self: Sized,
    {
        let _ = values;
        Err(PhormError::MissingConstructor {
            entity: any::type_name::<Self>().into(),
        }
        .into())
    }
}

/// Failure of [`Contract::set_member`] for an identifier that is not a writable member.
pub fn unknown_member(entity: &str, ident: &str) -> crate::Error {
    crate::Error::msg(format!("`{entity}` has no writable member `{ident}`"))
}

/// The argument object of a call.
pub struct Arguments<'a> {
    source: ArgumentSource<'a>,
}

enum ArgumentSource<'a> {
    Empty,
    Contract {
        type_id: TypeId,
        contract: &'a dyn Contract,
        members: fn() -> Result<Arc<[MemberDefinition]>>,
    },
    Bag(Vec<(String, Value)>),
}

impl<'a> Arguments<'a> {
    pub fn none() -> Self {
        Self {
            source: ArgumentSource::Empty,
        }
    }

    pub fn of<C: Contract>(contract: &'a C) -> Self {
        Self {
            source: ArgumentSource::Contract {
                type_id: TypeId::of::<C>(),
                contract,
                members: MemberModel::derive::<C>,
            },
        }
    }

    /// Loose set of named values, matched by name against the contract members.
    pub fn bag<K, V, I>(values: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            source: ArgumentSource::Bag(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Whether the arguments are an instance of the contract type itself.
    pub fn is_instance_of(&self, contract: TypeId) -> bool {
        matches!(self.source, ArgumentSource::Contract { type_id, .. } if type_id == contract)
    }

    /// Value bound to `member`, `None` when the arguments do not carry it.
    pub fn resolve(&self, contract: TypeId, member: &MemberDefinition) -> Option<Value> {
        match &self.source {
            ArgumentSource::Empty => None,
            ArgumentSource::Contract {
                type_id,
                contract: instance,
                members,
            } => {
                if *type_id == contract {
                    instance.get_member(member.ident)
                } else {
                    Self::foreign(*instance, *members, &[member.ident, &member.db_name])
                }
            }
            ArgumentSource::Bag(values) => values
                .iter()
                .find(|(k, _)| {
                    k.eq_ignore_ascii_case(&member.db_name) || k.eq_ignore_ascii_case(member.ident)
                })
                .map(|(_, v)| v.clone()),
        }
    }

    /// Value of any member by identifier, used to feed authenticators.
    pub(crate) fn lookup(&self, contract: TypeId, ident: &str) -> Option<Value> {
        match &self.source {
            ArgumentSource::Empty => None,
            ArgumentSource::Contract {
                type_id,
                contract: instance,
                members,
            } => {
                if *type_id == contract {
                    instance.get_member(ident)
                } else {
                    Self::foreign(*instance, *members, &[ident])
                }
            }
            ArgumentSource::Bag(values) => values
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(ident))
                .map(|(_, v)| v.clone()),
        }
    }

    /// Reads the first of `names` found on an instance of another contract, matched
    /// case-insensitively against its member names and identifiers.
    fn foreign(
        instance: &dyn Contract,
        members: fn() -> Result<Arc<[MemberDefinition]>>,
        names: &[&str],
    ) -> Option<Value> {
        let members = match members() {
            Ok(v) => v,
            Err(e) => {
                log::debug!("Foreign arguments resolved by identifier only: {e:#}");
                return names.iter().find_map(|v| instance.get_member(v));
            }
        };
        names
            .iter()
            .find_map(|name| members.iter().find(|v| v.matches_name(name)))
            .and_then(|v| instance.get_member(v.ident))
    }
}

impl<'a, C: Contract> From<&'a C> for Arguments<'a> {
    fn from(value: &'a C) -> Self {
        Arguments::of(value)
    }
}
