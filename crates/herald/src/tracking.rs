use nanoid::nanoid;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Creation-order sequence shared by every bus in the process, which is
/// what makes tracking numbers unique process-wide and never reused.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Suffix alphabet without visually ambiguous characters (I, O, l, 0, 1).
const SUFFIX_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const SUFFIX_LEN: usize = 8;

/// Correlation id linking a request to its eventual response.
///
/// The textual form is a fixed-width hex sequence number followed by a
/// random suffix, e.g. `000000000000002a.h7Kc9mPq`, so tracking numbers
/// sort lexicographically in creation order while staying unguessable from
/// the sequence alone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackingNo(Arc<str>);

impl TrackingNo {
    /// Mints a fresh tracking number, distinct from all previously minted
    /// ones.
    #[must_use]
    pub fn mint() -> Self {
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        let suffix = nanoid!(SUFFIX_LEN, SUFFIX_ALPHABET);
        Self(Arc::from(format!("{seq:016x}.{suffix}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The switchboard key responses travel on. The `reply:` prefix is
    /// lower case, so it can never collide with an upper-cased topic name.
    pub(crate) fn reply_key(&self) -> String {
        format!("reply:{}", self.0)
    }
}

impl fmt::Display for TrackingNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_is_unique() {
        let a = TrackingNo::mint();
        let b = TrackingNo::mint();
        assert_ne!(a, b);
    }

    #[test]
    fn mint_sorts_by_creation_order() {
        let earlier = TrackingNo::mint();
        let later = TrackingNo::mint();
        assert!(earlier < later);
    }

    #[test]
    fn reply_key_is_namespaced() {
        let id = TrackingNo::mint();
        assert!(id.reply_key().starts_with("reply:"));
    }

    #[test]
    fn suffix_uses_unambiguous_alphabet() {
        let id = TrackingNo::mint();
        let (_, suffix) = id.as_str().split_once('.').unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        for ch in suffix.chars() {
            assert!(SUFFIX_ALPHABET.contains(&ch), "unexpected character in suffix: {ch}");
        }
    }
}
