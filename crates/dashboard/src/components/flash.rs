//! One-shot notices carried in the session across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "notice-success",
            Self::Error => "notice-error",
            Self::Info => "notice-info",
        }
    }
}

/// A notice shown at the top of the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
    /// Extra lines, e.g. rejected import rows.
    #[serde(default)]
    pub details: Vec<String>,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attach detail lines, keeping at most `limit` and noting the rest.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>, limit: usize) -> Self {
        let hidden = details.len().saturating_sub(limit);
        self.details = details.into_iter().take(limit).collect();
        if hidden > 0 {
            self.details.push(format!("... and {hidden} more"));
        }
        self
    }

    /// CSS class for templates.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        self.kind.css_class()
    }
}

/// Store a notice for the next page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash notice");
    }
}

/// Take the pending notice, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_with_details_caps_lines() {
        let details: Vec<String> = (1..=5).map(|i| format!("row {i}")).collect();
        let flash = Flash::error("rejected").with_details(details, 3);
        assert_eq!(flash.details.len(), 4);
        assert_eq!(flash.details[3], "... and 2 more");
    }

    #[test]
    fn test_with_details_under_limit() {
        let flash = Flash::error("rejected").with_details(vec!["row 2".into()], 3);
        assert_eq!(flash.details, vec!["row 2".to_string()]);
        assert_eq!(flash.css_class(), "notice-error");
    }
}
