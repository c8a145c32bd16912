use fxhash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of token handles. Never reset, never reused.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct TopicInner {
    handle: u64,
    name: Arc<str>,
}

/// Opaque identity token for a registered topic.
///
/// A `Topic` can only be minted by the registry; holding one is proof that
/// the name was registered at some point. Clones share the same identity,
/// and equality compares the identity handle, never the textual form, so a
/// token cannot be forged from a name string and two tokens for
/// identically-spelled names from different registrations never compare
/// equal.
#[derive(Clone)]
pub struct Topic {
    inner: Arc<TopicInner>,
}

impl Topic {
    /// Mints a brand-new token for `name`. Registry-internal.
    pub(crate) fn mint(name: Arc<str>) -> Self {
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        Self { inner: Arc::new(TopicInner { handle, name }) }
    }

    /// Canonical (upper-cased) topic name this token was issued for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.inner.name.clone()
    }

    pub(crate) fn handle(&self) -> u64 {
        self.inner.handle
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle == other.inner.handle
    }
}

impl Eq for Topic {}

impl std::hash::Hash for Topic {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.handle.hash(state);
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic").field("name", &self.inner.name).finish_non_exhaustive()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

/// Immutable point-in-time view of the registered topics.
///
/// Rebuilt by the registry on every growth; previously issued tokens are
/// carried into the new snapshot unchanged, so a holder of an old `Topics`
/// keeps a valid (if stale) view while new holders see the superset.
#[derive(Clone, Debug, Default)]
pub struct Topics {
    entries: Arc<FxHashMap<Arc<str>, Topic>>,
}

impl Topics {
    pub(crate) fn from_map(entries: FxHashMap<Arc<str>, Topic>) -> Self {
        Self { entries: Arc::new(entries) }
    }

    /// Looks up the token for a canonical topic name. The lookup is
    /// case-sensitive against the stored (already upper-cased) name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Topic> {
        self.entries.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, token)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Topic)> {
        self.entries.iter().map(|(name, topic)| (name.as_ref(), topic))
    }

    pub(crate) fn map(&self) -> &FxHashMap<Arc<str>, Topic> {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_compare_by_identity_not_name() {
        let a = Topic::mint(Arc::from("USER"));
        let b = Topic::mint(Arc::from("USER"));
        assert_eq!(a.name(), b.name());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn snapshot_lookup_is_case_sensitive() {
        let token = Topic::mint(Arc::from("USER"));
        let mut map = FxHashMap::default();
        map.insert(token.name_arc(), token.clone());
        let topics = Topics::from_map(map);

        assert_eq!(topics.get("USER"), Some(token));
        assert!(topics.get("user").is_none());
    }
}
