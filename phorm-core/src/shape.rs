use crate::{
    Contract, MemberDefinition, MemberModel, ResultsetDef, Result, SpecOf, util::TypeCache,
};
use std::{
    any::{self, TypeId},
    sync::Arc,
};

static SHAPES: TypeCache<EntityShape> = TypeCache::new();

/// How instances are created while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constructor {
    /// Primary constructor fed from the row.
    Record,
    /// Zero argument construction followed by setters.
    Default,
    None,
}

/// Decode plan of an entity type.
///
/// Indices in `constructor_fields`, `basic_setters` and `deferred_setters` point into `members`.
#[derive(Debug)]
pub struct EntityShape {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub members: Arc<[MemberDefinition]>,
    pub constructor: Constructor,
    pub is_immutable_record: bool,
    /// Constructor arguments in positional order.
    pub constructor_fields: Vec<usize>,
    pub basic_setters: Vec<usize>,
    /// Secure and transformed members, applied after the basic ones.
    pub deferred_setters: Vec<usize>,
    pub is_abstract: bool,
    pub spec_of: Option<SpecOf>,
    pub resultsets: Vec<ResultsetDef>,
}

impl EntityShape {
    /// Shape of `T`, computed on first use and shared afterwards.
    pub fn of<T: Contract>() -> Result<Arc<EntityShape>> {
        SHAPES.get_or_try_insert(TypeId::of::<T>(), || {
            log::debug!("Computing the entity shape of `{}`", any::type_name::<T>());
            Self::build::<T>().map(Arc::new)
        })
    }

    fn build<T: Contract>() -> Result<EntityShape> {
        let description = T::describe();
        let members = MemberModel::derive::<T>()?;
        let record_fields = description.record_constructor.as_ref().and_then(|params| {
            params
                .iter()
                .map(|param| members.iter().position(|v| v.matches_name(param)))
                .collect::<Option<Vec<_>>>()
        });
        if description.record_constructor.is_some() && record_fields.is_none() {
            log::debug!(
                "The record constructor of `{}` does not match its members, using the default one",
                description.name
            );
        }
        let has_default = record_fields.is_none() && T::create_default().is_some();
        let (constructor, constructor_fields) = match record_fields {
            Some(fields) => (Constructor::Record, fields),
            None if has_default => (Constructor::Default, Vec::new()),
            None => (Constructor::None, Vec::new()),
        };
        let setters = members
            .iter()
            .enumerate()
            .filter(|(i, v)| v.writable && !constructor_fields.contains(i));
        let basic_setters = setters
            .clone()
            .filter(|(_, v)| !v.is_deferred())
            .map(|(i, _)| i)
            .collect();
        let deferred_setters = setters
            .filter(|(_, v)| v.is_deferred())
            .map(|(i, _)| i)
            .collect();
        Ok(EntityShape {
            type_id: TypeId::of::<T>(),
            type_name: description.name,
            members,
            is_immutable_record: constructor == Constructor::Record,
            constructor,
            constructor_fields,
            basic_setters,
            deferred_setters,
            is_abstract: description.is_abstract,
            spec_of: description.spec_of,
            resultsets: description.resultsets,
        })
    }

    /// Whether rows can be decoded as this type.
    pub fn is_instantiable(&self) -> bool {
        !self.is_abstract && self.constructor != Constructor::None
    }

    pub fn member(&self, name: &str) -> Option<&MemberDefinition> {
        self.members.iter().find(|v| v.matches_name(name))
    }
}
