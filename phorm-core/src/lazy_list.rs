use crate::Result;
use std::{
    fmt::{self, Debug},
    mem,
    slice,
    vec,
};

type Resolver<T> = Box<dyn FnOnce() -> Result<T>>;

enum Entry<T> {
    Resolved(T),
    Pending(Resolver<T>),
    /// The resolver failed, the entry no longer counts.
    Failed,
}

fn resolve<T>(entry: &mut Entry<T>) -> Option<Result<&T>> {
    if matches!(entry, Entry::Pending(..)) {
        let Entry::Pending(resolver) = mem::replace(entry, Entry::Failed) else {
            return None;
        };
        match resolver() {
            Ok(v) => *entry = Entry::Resolved(v),
            Err(e) => return Some(Err(e)),
        }
    }
    match &*entry {
        Entry::Resolved(v) => Some(Ok(v)),
        _ => None,
    }
}

/// Sequence of entities decoded on first access.
///
/// Entries resolve in order and at most once, the result is kept. Not meant to be shared
/// between threads: materialize it first with [`LazyEntityList::into_vec`].
pub struct LazyEntityList<T> {
    entries: Vec<Entry<T>>,
}

impl<T> LazyEntityList<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends an entry resolved by `resolver` when first reached.
    pub fn add_resolver(&mut self, resolver: impl FnOnce() -> Result<T> + 'static) {
        self.entries.push(Entry::Pending(Box::new(resolver)));
    }

    pub fn push(&mut self, value: T) {
        self.entries.push(Entry::Resolved(value));
    }

    /// Resolved plus pending entries. Never resolves anything.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|v| !matches!(v, Entry::Failed))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolved(&self) -> usize {
        self.entries
            .iter()
            .filter(|v| matches!(v, Entry::Resolved(..)))
            .count()
    }

    /// Entry at `index`, resolving it and every pending entry before it.
    pub fn get(&mut self, index: usize) -> Option<Result<&T>> {
        let mut iter = self.iter();
        for _ in 0..index {
            if let Err(e) = iter.next()? {
                return Some(Err(e));
            }
        }
        iter.next()
    }

    /// In order iteration, resolving pending entries as they are reached.
    pub fn iter(&mut self) -> LazyIter<'_, T> {
        LazyIter {
            entries: self.entries.iter_mut(),
        }
    }

    /// Whether an already resolved entry equals `value`. Pending entries are not resolved.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.entries
            .iter()
            .any(|v| matches!(v, Entry::Resolved(v) if v == value))
    }

    /// Copies entries into `destination`, resolving only as many as it can hold. Returns the
    /// number of entries written.
    pub fn fill(&mut self, destination: &mut [T]) -> Result<usize>
    where
        T: Clone,
    {
        let mut written = 0;
        for (slot, value) in destination.iter_mut().zip(self.iter()) {
            *slot = value?.clone();
            written += 1;
        }
        Ok(written)
    }

    /// Resolves every entry.
    pub fn into_vec(self) -> Result<Vec<T>> {
        self.into_iter().collect()
    }
}

impl<T> Default for LazyEntityList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for LazyEntityList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEntityList")
            .field("len", &self.len())
            .field("resolved", &self.resolved())
            .finish()
    }
}

impl<T> FromIterator<T> for LazyEntityList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Entry::Resolved).collect(),
        }
    }
}

pub struct LazyIter<'a, T> {
    entries: slice::IterMut<'a, Entry<T>>,
}

impl<'a, T> Iterator for LazyIter<'a, T> {
    type Item = Result<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(v) = resolve(self.entries.next()?) {
                return Some(v);
            }
        }
    }
}

pub struct LazyIntoIter<T> {
    entries: vec::IntoIter<Entry<T>>,
}

impl<T> Iterator for LazyIntoIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.entries.next()? {
                Entry::Resolved(v) => return Some(Ok(v)),
                Entry::Pending(resolver) => return Some(resolver()),
                Entry::Failed => {}
            }
        }
    }
}

impl<T> IntoIterator for LazyEntityList<T> {
    type Item = Result<T>;
    type IntoIter = LazyIntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        LazyIntoIter {
            entries: self.entries.into_iter(),
        }
    }
}
