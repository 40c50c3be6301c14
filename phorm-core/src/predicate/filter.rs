use crate::{
    Contract, EntityDecoder, EntityShape, LazyEntityList, PhormError, Predicate, Result,
    RowLabeled, Value,
};
use std::{any::TypeId, marker::PhantomData, sync::Arc};

/// Row filter decoding only the members a predicate reads, the full decode of matching rows
/// is deferred to a [`LazyEntityList`].
#[derive(Debug)]
pub struct PredicateFilter<T: Contract> {
    predicate: Predicate,
    shape: Arc<EntityShape>,
    /// Indices of the referenced members in the shape.
    referenced: Vec<usize>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Contract> PredicateFilter<T> {
    /// Validates `predicate` against `T`: every column must be a member of `T` and no node can
    /// be unsupported.
    pub fn new(predicate: Predicate) -> Result<Self> {
        let shape = EntityShape::of::<T>()?;
        let mut referenced = Vec::new();
        let mut error = None;
        predicate.visit(&mut |node| {
            if error.is_some() {
                return;
            }
            match node {
                Predicate::Column(column) => {
                    if column.owner != TypeId::of::<T>() {
                        error = Some(format!(
                            "`{}` reaches into `{}`",
                            column.member, column.owner_name
                        ));
                        return;
                    }
                    match shape.members.iter().position(|v| v.matches_name(&column.member)) {
                        Some(i) if !referenced.contains(&i) => referenced.push(i),
                        Some(..) => {}
                        None => {
                            error = Some(format!("`{}` is not a member", column.member));
                        }
                    }
                }
                Predicate::Unsupported(reason) => error = Some(reason.clone()),
                _ => {}
            }
        });
        if let Some(reason) = error {
            let error = PhormError::UnsupportedPredicate {
                entity: shape.type_name.into(),
                reason,
            };
            log::error!("{error}");
            return Err(error.into());
        }
        log::debug!(
            "Filter over `{}` reads {} member(s): {predicate}",
            shape.type_name,
            referenced.len()
        );
        Ok(Self {
            predicate,
            shape,
            referenced,
            _entity: PhantomData,
        })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Names of the members the predicate reads.
    pub fn referenced_members(&self) -> impl Iterator<Item = &str> {
        self.referenced
            .iter()
            .map(|i| self.shape.members[*i].ident)
    }

    /// Whether `row` satisfies the predicate. Only the referenced members are decoded.
    pub fn matches(&self, decoder: &EntityDecoder, row: &RowLabeled) -> Result<bool> {
        let probe = decoder.decode_members(&self.shape, &self.referenced, row)?;
        Ok(self.predicate.test(&|column| {
            self.referenced
                .iter()
                .position(|i| self.shape.members[*i].matches_name(&column.member))
                .and_then(|i| probe[i].clone())
                .unwrap_or(Value::Null)
        }))
    }

    /// Rows satisfying the predicate, decoded when the list is consumed.
    pub fn filter(
        &self,
        decoder: &EntityDecoder,
        rows: impl IntoIterator<Item = RowLabeled>,
    ) -> Result<LazyEntityList<T>> {
        let mut result = LazyEntityList::new();
        for row in rows {
            if !self.matches(decoder, &row)? {
                continue;
            }
            let decoder = decoder.clone();
            let shape = self.shape.clone();
            result.add_resolver(move || decoder.decode_with::<T>(&shape, &row));
        }
        Ok(result)
    }
}
