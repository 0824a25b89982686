//! Newsletter subscriptions and the tip of the day

use serde::{Deserialize, Serialize};

/// Newsletter signup (`nlemails` collection)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

/// Tip document (`tip` collection); the first one is shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

