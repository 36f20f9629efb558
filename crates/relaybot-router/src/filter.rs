//! Content filter — decides whether addressed text gets the apology instead of a reply.

/// Terms that are always blocked.
pub const DEFAULT_BLOCKLIST: &[&str] = &["fuck", "ratio", "shit", "based"];

/// Classifies text as blocked or allowed.
///
/// Implementations must be pure: same text, same answer.
pub trait ContentFilter: Send + Sync {
    fn is_blocked(&self, text: &str) -> bool;
}

/// Case-insensitive substring blocklist.
#[derive(Clone, Debug)]
pub struct Blocklist {
    /// Lowercased, non-empty terms.
    terms: Vec<String>,
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKLIST.iter().copied())
    }
}

impl Blocklist {
    /// Build a blocklist from arbitrary terms. Blank terms are discarded.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// The built-in list plus `extra` terms from configuration.
    pub fn with_extra_terms(extra: &[String]) -> Self {
        Self::new(
            DEFAULT_BLOCKLIST
                .iter()
                .map(|t| t.to_string())
                .chain(extra.iter().cloned()),
        )
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl ContentFilter for Blocklist {
    fn is_blocked(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.terms.iter().any(|t| lowered.contains(t.as_str()))
    }
}
