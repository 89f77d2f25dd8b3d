//! ---
//! trk_section: "01-core-functionality"
//! trk_subsection: "module"
//! trk_type: "source"
//! trk_scope: "code"
//! trk_description: "Application state store and derived views."
//! trk_version: "v0.0.0-prealpha"
//! trk_owner: "tbd"
//! ---
//! Client-side identifiers. Short and readable, not cryptographically secure.

use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const UID_LEN: usize = 7;

/// A 7 character base-36 random identifier.
pub fn uid() -> String {
    let mut rng = rand::thread_rng();
    (0..UID_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// [`uid`] with a prefix, e.g. `uid_with_prefix("ws_")`.
pub fn uid_with_prefix(prefix: &str) -> String {
    format!("{prefix}{}", uid())
}

/// Source of fresh identifiers for records created by callers of the store.
pub trait IdSource {
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Random ids from [`uid_with_prefix`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self, prefix: &str) -> String {
        uid_with_prefix(prefix)
    }
}

/// Deterministic ids `prefix1`, `prefix2`, ...; used by tests and scripted runs.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}{}", self.next)
    }
}
