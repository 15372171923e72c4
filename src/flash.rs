//! One-shot flash messages carried in the session between requests.
//!
//! Handlers only push. Draining happens once per request in
//! [`crate::context::enrich`].

use crate::models::SessionRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Error,
}

impl FlashCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashCategory::Success => "success",
            FlashCategory::Error => "error",
        }
    }
}

impl std::fmt::Display for FlashCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append a message; earlier unread messages of the same category are kept.
pub fn push(session: &mut SessionRecord, category: FlashCategory, message: impl Into<String>) {
    session
        .flash
        .entry(category.as_str().to_string())
        .or_default()
        .push(message.into());
}

/// Remove and return all pending messages of `category`, in push order.
pub fn drain(session: &mut SessionRecord, category: FlashCategory) -> Vec<String> {
    session.flash.remove(category.as_str()).unwrap_or_default()
}
