use tracing::warn;

use crate::envelope::Envelope;
use crate::error::TryOnError;

/// Substrings the hosted GPU backend uses when it refuses work for quota.
pub const DEFAULT_QUOTA_PATTERNS: [&str; 3] = ["GPU task aborted", "ZeroGPU quota", "out of daily"];

/// Detects quota exhaustion from error text. The Space exposes no
/// structured error code for it, so matching is on the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaMatcher {
    patterns: Vec<String>,
}

impl Default for QuotaMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_PATTERNS)
    }
}

impl QuotaMatcher {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::<String>::into)
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Add more patterns on top of the current ones.
    pub fn with_patterns<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for p in extra {
            let p: String = p.into();
            if !p.is_empty() && !self.patterns.contains(&p) {
                self.patterns.push(p);
            }
        }
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| message.contains(p.as_str()))
    }

    /// Turn any try-on error into a failure envelope.
    pub fn classify(&self, err: &TryOnError) -> Envelope {
        let message = err.to_string();
        if self.matches(&message) {
            warn!(error = %message, "GPU quota exceeded");
            return Envelope::quota(message);
        }
        Envelope::failure(message, err.kind())
    }
}
