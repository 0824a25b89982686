//! User profile document

use serde::{Deserialize, Serialize};

/// Profile document (`users` collection), keyed by account id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "displayName", alias = "name", default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(rename = "socialLinks", default)]
    pub social_links: SocialLinks,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub tiktok: String,
    #[serde(default)]
    pub youtube: String,
}

impl SocialLinks {
    /// (network, url) pairs in display order
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("instagram", &self.instagram),
            ("facebook", &self.facebook),
            ("tiktok", &self.tiktok),
            ("youtube", &self.youtube),
        ]
    }
}
