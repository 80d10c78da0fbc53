//! Entry keys.

use crate::types::SequenceNumber;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Width of the zero-padded sequence prefix.
const SEQUENCE_DIGITS: usize = 20;

/// Width of the hex UUID suffix.
const SUFFIX_LEN: usize = 32;

/// Total key length: prefix, separator, suffix.
const KEY_LEN: usize = SEQUENCE_DIGITS + 1 + SUFFIX_LEN;

/// Store-generated identifier of an entry; also its file name on disk.
///
/// Keys look like `00000000000000000042-9f0c2b...` : the creation sequence
/// zero-padded to 20 digits, a dash, and a random v4 UUID in simple form.
/// Keys therefore sort lexicographically in creation order, and stay unique
/// across restarts even if an unflushed sequence number is handed out again.
#[derive(Clone)]
pub struct EntryKey {
    text: String,
    sequence: SequenceNumber,
}

impl EntryKey {
    /// Creates a fresh key for the given sequence.
    #[must_use]
    pub fn generate(sequence: SequenceNumber) -> Self {
        let text = format!(
            "{:0width$}-{}",
            sequence.as_u64(),
            Uuid::new_v4().simple(),
            width = SEQUENCE_DIGITS
        );
        Self { text, sequence }
    }

    /// Parses a key, typically a file name found in the store directory.
    ///
    /// Returns `None` if the text is not a well-formed entry key.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != KEY_LEN || !text.is_ascii() {
            return None;
        }
        let (digits, rest) = text.split_at(SEQUENCE_DIGITS);
        let suffix = rest.strip_prefix('-')?;

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !suffix.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return None;
        }

        let sequence = digits.parse::<u64>().ok()?;
        Some(Self {
            text: text.to_string(),
            sequence: SequenceNumber::new(sequence),
        })
    }

    /// Returns the creation sequence encoded in the key.
    #[inline]
    #[must_use]
    pub const fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// Returns the key text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Converts into the key text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl PartialEq for EntryKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for EntryKey {}

impl Hash for EntryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for EntryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text.cmp(&other.text)
    }
}

impl Borrow<str> for EntryKey {
    fn borrow(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for EntryKey {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryKey({})", self.text)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
