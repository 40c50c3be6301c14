use crate::{Contract, EntityDecoder, PhormError, Result, RowLabeled};
use std::{
    any::{self, Any, TypeId},
    fmt::{self, Debug},
    sync::Arc,
};

/// Decides whether a child record belongs to a parent record.
pub trait RecordMatcher<P, C>: Send + Sync {
    fn is_match(&self, parent: &P, child: &C) -> bool;
}

impl<P, C, F> RecordMatcher<P, C> for F
where
    F: Fn(&P, &C) -> bool + Send + Sync,
{
    fn is_match(&self, parent: &P, child: &C) -> bool {
        self(parent, child)
    }
}

/// Associates every child with every parent.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatchAll;

impl<P, C> RecordMatcher<P, C> for MatchAll {
    fn is_match(&self, _parent: &P, _child: &C) -> bool {
        true
    }
}

/// Children of `parent` among `candidates`, in candidate order.
pub fn match_many<P, C: Clone>(
    parent: &P,
    candidates: &[C],
    matcher: &impl RecordMatcher<P, C>,
) -> Vec<C> {
    candidates
        .iter()
        .filter(|v| matcher.is_match(parent, v))
        .cloned()
        .collect()
}

/// The only child of `parent` among `candidates`, `None` when nothing matches.
pub fn match_one<P, C: Clone>(
    parent: &P,
    candidates: &[C],
    matcher: &impl RecordMatcher<P, C>,
    member: &str,
) -> Result<Option<C>> {
    single::<P, C>(
        member,
        candidates.iter().filter(|v| matcher.is_match(parent, v)),
    )
    .map(|v| v.cloned())
}

fn single<'a, P, C: 'a>(
    member: &str,
    mut matched: impl Iterator<Item = &'a C>,
) -> Result<Option<&'a C>> {
    let first = matched.next();
    let extra = matched.count();
    if extra > 0 {
        let error = PhormError::MultipleMatchesForSingularAssociation {
            entity: any::type_name::<P>().into(),
            member: member.into(),
            matches: extra + 1,
        };
        log::error!("{error}");
        return Err(error.into());
    }
    Ok(first)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `Vec<C>` association.
    Many,
    /// `Option<C>` association.
    One,
}

type DecodeChild = fn(&EntityDecoder, &RowLabeled) -> Result<Box<dyn Any>>;
type Attach = dyn Fn(&mut dyn Any, &[Box<dyn Any>]) -> Result<()> + Send + Sync;

/// Secondary result set bound to a member of the parent entity.
#[derive(Clone)]
pub struct ResultsetDef {
    /// Index of the secondary result set, 0 being the first one after the primary rows.
    pub order: usize,
    pub member: &'static str,
    pub cardinality: Cardinality,
    pub parent_type: TypeId,
    pub child_type: TypeId,
    pub child_name: &'static str,
    decode: DecodeChild,
    attach: Arc<Attach>,
}

fn decode_child<C: Contract>(decoder: &EntityDecoder, row: &RowLabeled) -> Result<Box<dyn Any>> {
    Ok(Box::new(decoder.decode::<C>(row)?))
}

fn mismatch<P>(member: &str, actual: &str) -> crate::Error {
    PhormError::MatcherTypeMismatch {
        matcher: member.into(),
        expected: any::type_name::<P>().into(),
        actual: actual.into(),
    }
    .into()
}

fn children<'a, C: 'static>(member: &str, values: &'a [Box<dyn Any>]) -> Result<Vec<&'a C>> {
    values
        .iter()
        .map(|v| {
            v.downcast_ref::<C>()
                .ok_or_else(|| mismatch::<C>(member, "a child of another type"))
        })
        .collect()
}

impl ResultsetDef {
    /// `Vec<C>` association filled through `setter`.
    pub fn many<P, C, M>(
        order: usize,
        member: &'static str,
        matcher: M,
        setter: fn(&mut P, Vec<C>),
    ) -> Self
    where
        P: Contract,
        C: Contract + Clone,
        M: RecordMatcher<P, C> + 'static,
    {
        Self {
            order,
            member,
            cardinality: Cardinality::Many,
            parent_type: TypeId::of::<P>(),
            child_type: TypeId::of::<C>(),
            child_name: any::type_name::<C>(),
            decode: decode_child::<C>,
            attach: Arc::new(move |parent: &mut dyn Any, values: &[Box<dyn Any>]| {
                let parent = parent
                    .downcast_mut::<P>()
                    .ok_or_else(|| mismatch::<P>(member, "a parent of another type"))?;
                let matched = children::<C>(member, values)?
                    .into_iter()
                    .filter(|v| matcher.is_match(&*parent, v))
                    .cloned()
                    .collect();
                setter(parent, matched);
                Ok(())
            }),
        }
    }

    /// `Option<C>` association. More than one match fails, no match leaves the member unset.
    pub fn one<P, C, M>(order: usize, member: &'static str, matcher: M, setter: fn(&mut P, C)) -> Self
    where
        P: Contract,
        C: Contract + Clone,
        M: RecordMatcher<P, C> + 'static,
    {
        Self {
            order,
            member,
            cardinality: Cardinality::One,
            parent_type: TypeId::of::<P>(),
            child_type: TypeId::of::<C>(),
            child_name: any::type_name::<C>(),
            decode: decode_child::<C>,
            attach: Arc::new(move |parent: &mut dyn Any, values: &[Box<dyn Any>]| {
                let parent = parent
                    .downcast_mut::<P>()
                    .ok_or_else(|| mismatch::<P>(member, "a parent of another type"))?;
                let candidates = children::<C>(member, values)?;
                let matched = single::<P, C>(
                    member,
                    candidates.into_iter().filter(|v| matcher.is_match(&*parent, v)),
                )?
                .cloned();
                if let Some(child) = matched {
                    setter(parent, child);
                }
                Ok(())
            }),
        }
    }

    /// Decodes one row of the secondary result set as the child type.
    pub fn decode(&self, decoder: &EntityDecoder, row: &RowLabeled) -> Result<Box<dyn Any>> {
        (self.decode)(decoder, row)
    }

    /// Assigns the matching `children` to `parent`.
    pub fn attach(&self, parent: &mut dyn Any, children: &[Box<dyn Any>]) -> Result<()> {
        (self.attach)(parent, children)
    }
}

impl Debug for ResultsetDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsetDef")
            .field("order", &self.order)
            .field("member", &self.member)
            .field("cardinality", &self.cardinality)
            .field("child_name", &self.child_name)
            .finish()
    }
}
