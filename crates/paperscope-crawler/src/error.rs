use std::fmt;

use paperscope_core::PaperscopeError;
use paperscope_science::ScienceError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    NoSuchElement,
    StaleElement,
    ClickIntercepted,
    Timeout,
    Navigation,
    Browser,
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverErrorKind::NoSuchElement => "no such element",
            DriverErrorKind::StaleElement => "stale element",
            DriverErrorKind::ClickIntercepted => "click intercepted",
            DriverErrorKind::Timeout => "timeout",
            DriverErrorKind::Navigation => "navigation failed",
            DriverErrorKind::Browser => "browser error",
        };
        f.write_str(name)
    }
}

/// Failure reported by a [`crate::driver::PageDriver`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {target}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    /// Selector, class name or URL the operation was aimed at.
    pub target: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }

    pub fn no_such_element(target: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::NoSuchElement, target)
    }

    pub fn timeout(target: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Timeout, target)
    }

    /// Element lookups and reads.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self.kind,
            DriverErrorKind::NoSuchElement | DriverErrorKind::StaleElement
        )
    }

    pub fn is_click(&self) -> bool {
        self.is_lookup() || self.kind == DriverErrorKind::ClickIntercepted
    }

    /// Any of the transient kinds a wait or click can end with.
    pub fn is_transient(&self) -> bool {
        self.is_click() || self.kind == DriverErrorKind::Timeout
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Science(#[from] ScienceError),

    #[error(transparent)]
    Core(#[from] PaperscopeError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classes() {
        let missing = DriverError::no_such_element("h1.name");
        assert!(missing.is_lookup() && missing.is_click() && missing.is_transient());

        let intercepted = DriverError::new(DriverErrorKind::ClickIntercepted, "a.next");
        assert!(!intercepted.is_lookup());
        assert!(intercepted.is_click());

        let timeout = DriverError::timeout("primary_paper");
        assert!(!timeout.is_click());
        assert!(timeout.is_transient());

        let browser = DriverError::new(DriverErrorKind::Browser, "crashed");
        assert!(!browser.is_transient());
        assert_eq!(browser.to_string(), "browser error: crashed");
    }
}
