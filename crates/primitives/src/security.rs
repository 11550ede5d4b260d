//! Security identifier types.

use std::borrow::Borrow;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Reserved column holding the exchange security code.
pub const SECURITY_CODE_COLUMN: &str = "证券代码";

/// Reserved column holding the security name. Rows of every table are keyed by it.
pub const SECURITY_NAME_COLUMN: &str = "证券名称";

/// Display name of a security, unique within a fundamentals snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityName(pub String);

impl SecurityName {
    /// Create a new security name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether a column label is one of the reserved non-indicator columns.
    #[must_use]
    pub fn is_reserved_column(label: &str) -> bool {
        label == SECURITY_CODE_COLUMN || label == SECURITY_NAME_COLUMN
    }
}

impl From<&str> for SecurityName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SecurityName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for SecurityName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
