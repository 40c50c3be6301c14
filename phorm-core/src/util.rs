use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

/// Prefix of `text` holding at most `chars` characters, and whether anything was cut.
pub fn truncate_at(text: &str, chars: usize) -> (&str, bool) {
    match text.char_indices().nth(chars) {
        Some((i, _)) => (&text[..i], true),
        None => (text, false),
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncate_at(&$query, 497).0.trim_end(),
            if $crate::truncate_at(&$query, 497).1 { "..." } else { "" },
        )
    };
}

/// Process-wide map from a type to a value derived once from it.
///
/// Population is compute-once-if-absent: the derivation runs outside the lock and, when two
/// threads race on the same type, the first value inserted wins and both callers get it.
pub struct TypeCache<V: ?Sized> {
    entries: LazyLock<RwLock<HashMap<TypeId, Arc<V>>>>,
}

impl<V: ?Sized> TypeCache<V> {
    pub const fn new() -> Self {
        Self {
            entries: LazyLock::new(Default::default),
        }
    }

    pub fn get_or_try_insert<E>(
        &self,
        key: TypeId,
        derive: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(v) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Ok(v.clone());
        }
        let value = derive()?;
        Ok(self
            .entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_insert(value)
            .clone())
    }
}

/// Case-insensitive lookup from a column label to its position.
pub(crate) fn position_of<'a>(
    labels: impl IntoIterator<Item = &'a String>,
    name: &str,
) -> Option<usize> {
    labels.into_iter().position(|v| v.eq_ignore_ascii_case(name))
}
