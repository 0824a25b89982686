//! Course and video models

use serde::{Deserialize, Serialize};

use super::Visibility;

/// Course document (`courses` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// HTML description
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub status: Visibility,
    #[serde(default)]
    pub videos: Vec<Video>,
}

impl Course {
    /// Display name: `name`, falling back to `title`
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or_default()
    }

    pub fn public_videos(&self) -> impl Iterator<Item = &Video> {
        self.videos.iter().filter(|v| v.visibility.is_public())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

/// The "learn" page: the public videos of a course and the one being played.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLearnView {
    pub course_id: String,
    pub course_name: String,
    pub videos: Vec<Video>,
    pub public_video_count: usize,
    pub current_video: Option<Video>,
}
