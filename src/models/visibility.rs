//! Publication status shared by courses, videos and reels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored as a free-form string; only the exact value `"Public"` is public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Visibility {
    Public,
    Restricted(String),
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Restricted(String::new())
    }
}

impl From<String> for Visibility {
    fn from(value: String) -> Self {
        if value == "Public" {
            Self::Public
        } else {
            Self::Restricted(value)
        }
    }
}

impl From<Visibility> for String {
    fn from(value: Visibility) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "Public"),
            Self::Restricted(s) => write!(f, "{}", s),
        }
    }
}
