use crate::error::HeraldError;
use crate::topic::{Topic, Topics};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

/// Owns the set of valid topic names and their identity tokens.
///
/// Growth is monotonic: a name, once added, is never removed or renamed,
/// and its token stays valid for the lifetime of the process. Every growth
/// re-derives a fresh [`Topics`] snapshot instead of mutating the current
/// one, so snapshots already handed out are never invalidated.
#[derive(Debug, Default)]
pub(crate) struct TopicRegistry {
    current: RwLock<Topics>,
}

impl TopicRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Cheap to clone and hand out.
    pub(crate) fn snapshot(&self) -> Topics {
        self.current.read().clone()
    }

    /// Adds the given names, normalising each to upper case first.
    ///
    /// Names already present are silently skipped, which makes the call
    /// idempotent. Returns the snapshot in force after the call (fresh only
    /// if at least one name was actually new).
    pub(crate) fn add<I, S>(&self, names: I) -> Result<Topics, HeraldError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<Arc<str>> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(HeraldError::invalid_argument("topic name is blank"));
            }
            normalized.push(Arc::from(name.to_uppercase()));
        }

        let mut current = self.current.write();
        let mut fresh: Option<FxHashMap<Arc<str>, Topic>> = None;
        for name in normalized {
            let present = fresh
                .as_ref()
                .map_or_else(|| current.map().contains_key(&name), |map| map.contains_key(&name));
            if present {
                trace!(topic = %name, "Topic already registered; skipping");
                continue;
            }
            // First genuinely new name: start the copy-on-write rebuild,
            // carrying every existing token forward by identity.
            let mut map = fresh.take().unwrap_or_else(|| current.map().clone());
            debug!(topic = %name, "Registering topic");
            map.insert(name.clone(), Topic::mint(name));
            fresh = Some(map);
        }

        if let Some(map) = fresh {
            *current = Topics::from_map(map);
        }
        Ok(current.clone())
    }

    /// The validator: resolves a token back to its canonical name.
    ///
    /// A token resolves only if this registry's current snapshot holds that
    /// exact token (identity comparison) under the token's name. Tokens
    /// minted elsewhere, even for an identically-spelled name, do not
    /// resolve.
    pub(crate) fn resolve(&self, token: &Topic) -> Option<Arc<str>> {
        let current = self.current.read();
        let registered = current.map().get(token.name())?;
        (registered.handle() == token.handle()).then(|| token.name_arc())
    }
}
