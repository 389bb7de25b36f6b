use thiserror::Error;

/// A whole-document configuration failure. Per-entry problems do not take
/// this path; they are reported through [`ConfigReport::rejected`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("configuration document is empty")]
    Empty,
}

/// One entry the loader refused, with the position it held in the source
/// document and the reason it was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedEntry {
    pub index: usize,
    pub reason: String,
}

/// The outcome of loading one configuration document: everything that
/// validated, plus everything that did not.
#[derive(Debug)]
pub struct ConfigReport<T> {
    pub accepted: Vec<T>,
    pub rejected: Vec<RejectedEntry>,
}

impl<T> ConfigReport<T> {
    pub fn new() -> Self {
        Self {
            accepted: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn reject(&mut self, index: usize, reason: impl Into<String>) {
        self.rejected.push(RejectedEntry {
            index,
            reason: reason.into(),
        });
    }
}

impl<T> Default for ConfigReport<T> {
    fn default() -> Self {
        Self::new()
    }
}
