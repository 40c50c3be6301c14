use crate::{
    Contract, EntityDecoder, EntityShape, PhormError, Result, RowLabeled, SourceId, Value,
};
use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    fmt::{self, Debug},
    marker::PhantomData,
    sync::Arc,
};

type DecodeVariant = fn(&EntityDecoder, &EntityShape, &RowLabeled) -> Result<Box<dyn Any>>;

fn decode_variant<S: Contract>(
    decoder: &EntityDecoder,
    shape: &EntityShape,
    row: &RowLabeled,
) -> Result<Box<dyn Any>> {
    Ok(Box::new(decoder.decode_with::<S>(shape, row)?))
}

/// A specialized shape, selected when the discriminator member of the general shape equals
/// `discriminator_value`.
#[derive(Clone)]
pub struct GenSpecVariant {
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// Index of the discriminator in the general shape members.
    pub discriminator: usize,
    pub discriminator_value: Value,
    shape: Arc<EntityShape>,
    decode: DecodeVariant,
}

impl Debug for GenSpecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenSpecVariant")
            .field("type_name", &self.type_name)
            .field("discriminator", &self.discriminator)
            .field("discriminator_value", &self.discriminator_value)
            .finish()
    }
}

/// Generalized/specialized resolver: rows are decoded as the first registered variant whose
/// discriminator matches, or as the general type `G`.
pub struct GenSpec<G: Contract> {
    general: Arc<EntityShape>,
    variants: Vec<GenSpecVariant>,
    _general: PhantomData<fn() -> G>,
}

impl<G: Contract> GenSpec<G> {
    pub fn new() -> Result<Self> {
        Ok(Self {
            general: EntityShape::of::<G>()?,
            variants: Vec::new(),
            _general: PhantomData,
        })
    }

    /// Registers `S` through its `spec_of` declaration.
    pub fn with<S: Contract>(self) -> Result<Self> {
        let shape = EntityShape::of::<S>()?;
        let Some(spec_of) = shape.spec_of.clone() else {
            return Err(PhormError::contract_definition(
                shape.type_name,
                "spec_of",
                format!(
                    "has no discriminator declaration, it cannot specialize `{}`",
                    self.general.type_name
                ),
            )
            .into());
        };
        self.register::<S>(shape, spec_of.member, spec_of.value)
    }

    /// Registers `S` for rows where the general member `member` equals `value`.
    pub fn with_variant<S: Contract>(self, member: &str, value: impl Into<Value>) -> Result<Self> {
        let shape = EntityShape::of::<S>()?;
        self.register::<S>(shape, member, value.into())
    }

    fn register<S: Contract>(
        mut self,
        shape: Arc<EntityShape>,
        member: &str,
        value: Value,
    ) -> Result<Self> {
        let Some(discriminator) = self
            .general
            .members
            .iter()
            .position(|v| v.matches_name(member))
        else {
            let error = PhormError::contract_definition(
                self.general.type_name,
                member,
                format!("is not a member, it cannot discriminate `{}`", shape.type_name),
            );
            log::error!("{error}");
            return Err(error.into());
        };
        if !shape.is_instantiable() {
            return Err(PhormError::MissingConstructor {
                entity: shape.type_name.into(),
            }
            .into());
        }
        if let Some(previous) = self.variants.iter().find(|v| {
            v.discriminator == discriminator && v.discriminator_value.loose_eq(&value)
        }) {
            log::warn!(
                "`{}` and `{}` both specialize `{}` for {} = {}, the first one registered wins",
                previous.type_name,
                shape.type_name,
                self.general.type_name,
                member,
                value
            );
        }
        self.variants.push(GenSpecVariant {
            type_id: TypeId::of::<S>(),
            type_name: any::type_name::<S>(),
            discriminator,
            discriminator_value: value,
            shape,
            decode: decode_variant::<S>,
        });
        Ok(self)
    }

    pub fn variants(&self) -> &[GenSpecVariant] {
        &self.variants
    }

    /// Decodes every row as its matching variant or as `G`.
    pub fn resolve<'a>(
        &self,
        decoder: &EntityDecoder,
        rows: impl IntoIterator<Item = &'a RowLabeled>,
    ) -> Result<GenSpecResult<G>> {
        let mut result = GenSpecResult {
            general: Vec::new(),
            specialized: HashMap::new(),
        };
        for row in rows {
            match self.resolve_row(decoder, row)? {
                Resolved::Variant(type_id, value) => {
                    result.specialized.entry(type_id).or_default().push(value)
                }
                Resolved::General(value) => result.general.push(value),
                Resolved::Dropped => {}
            }
        }
        Ok(result)
    }

    fn resolve_row(&self, decoder: &EntityDecoder, row: &RowLabeled) -> Result<Resolved<G>> {
        let mut discriminators: HashMap<SourceId, Option<Value>> = HashMap::new();
        for variant in &self.variants {
            let member = &self.general.members[variant.discriminator];
            let discriminator = match discriminators.get(&member.source_id) {
                Some(v) => v.clone(),
                None => {
                    let decoded = decoder
                        .decode_members(&self.general, &[variant.discriminator], row)?
                        .pop()
                        .flatten();
                    discriminators.insert(member.source_id, decoded.clone());
                    decoded
                }
            };
            if discriminator
                .as_ref()
                .is_some_and(|v| v.loose_eq(&variant.discriminator_value))
            {
                return Ok(Resolved::Variant(
                    variant.type_id,
                    (variant.decode)(decoder, &variant.shape, row)?,
                ));
            }
        }
        if self.general.is_instantiable() {
            return Ok(Resolved::General(
                decoder.decode_with::<G>(&self.general, row)?,
            ));
        }
        let discriminator = discriminators
            .values()
            .flatten()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        decoder
            .settings
            .diagnostics
            .dropped_row(self.general.type_name, &discriminator);
        Ok(Resolved::Dropped)
    }
}

enum Resolved<G> {
    Variant(TypeId, Box<dyn Any>),
    General(G),
    Dropped,
}

/// Decoded rows split by shape.
pub struct GenSpecResult<G> {
    /// Rows that matched no variant, decoded as the general type.
    pub general: Vec<G>,
    specialized: HashMap<TypeId, Vec<Box<dyn Any>>>,
}

impl<G> GenSpecResult<G> {
    /// Rows decoded as `S`, in row order.
    pub fn of<S: Any>(&self) -> Vec<&S> {
        self.specialized
            .get(&TypeId::of::<S>())
            .map(|v| v.iter().filter_map(|v| v.downcast_ref::<S>()).collect())
            .unwrap_or_default()
    }

    /// Moves out the rows decoded as `S`.
    pub fn take<S: Any>(&mut self) -> Vec<S> {
        self.specialized
            .remove(&TypeId::of::<S>())
            .map(|v| {
                v.into_iter()
                    .filter_map(|v| v.downcast::<S>().ok())
                    .map(|v| *v)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of decoded rows.
    pub fn len(&self) -> usize {
        self.general.len() + self.specialized.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
