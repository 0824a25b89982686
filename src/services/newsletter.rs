//! Newsletter sign-up and the tip of the day

use chrono::Utc;
use serde::Deserialize;

use crate::db::repositories::Collection;
use crate::models::{Subscription, Tip};
use crate::services::error::{ContentError, ContentResult};

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

pub struct NewsletterService {
    subscriptions: Collection<Subscription>,
    tips: Collection<Tip>,
}

impl NewsletterService {
    pub fn new(subscriptions: Collection<Subscription>, tips: Collection<Tip>) -> Self {
        Self { subscriptions, tips }
    }

    pub async fn subscribe(&self, input: SubscribeInput) -> ContentResult<Subscription> {
        let name = input.name.trim();
        let email = input.email.trim();
        if name.is_empty() {
            return Err(ContentError::validation("Please enter your name"));
        }
        if !email.contains('@') {
            return Err(ContentError::validation("Please enter a valid email address"));
        }

        let subscription = self
            .subscriptions
            .insert(&Subscription {
                id: String::new(),
                name: name.to_string(),
                email: email.to_string(),
                created_at: Utc::now().to_rfc3339(),
            })
            .await?;
        tracing::info!("Newsletter subscription {}", subscription.id);
        Ok(subscription)
    }

    /// First tip document, if any
    pub async fn tip_of_the_day(&self) -> ContentResult<Option<Tip>> {
        Ok(self.tips.list(Some(1)).await?.into_iter().next())
    }
}
