//! Reel model

use serde::{Deserialize, Serialize};

use super::Visibility;

/// Short vertical video post (`reels` collection).
///
/// `likes` holds user ids and behaves as a set; `comments` keeps append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reel {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "videoURL", default)]
    pub video_url: String,
    #[serde(rename = "thumbnailURL", default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub status: Visibility,
    #[serde(rename = "userName", default)]
    pub user_name: Option<String>,
    #[serde(rename = "userPhoto", default)]
    pub user_photo: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<ReelComment>,
}

impl Reel {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn comment(&self, comment_id: &str) -> Option<&ReelComment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelComment {
    pub id: String,
    pub text: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_photo: Option<String>,
    /// RFC 3339 creation time
    pub timestamp: String,
}
