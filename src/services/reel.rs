//! Reel service
//!
//! Opens reels into a [`ReelViewer`], navigates between public reels, and
//! persists likes and comments. Every write is followed by reconciling the
//! viewer with the stored reel.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::db::repositories::Collection;
use crate::db::FieldUpdate;
use crate::models::{Reel, ReelComment, Visibility};
use crate::services::error::{ContentError, ContentResult};
use crate::services::reel_viewer::{NavDirection, ReelView, ReelViewer};

/// Author attached to new comments
#[derive(Debug, Clone)]
pub struct Commenter {
    pub id: String,
    pub name: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLinks {
    pub url: String,
    pub facebook: String,
    pub twitter: String,
    pub linkedin: String,
}

pub struct ReelService {
    reels: Collection<Reel>,
    public_url: String,
}

impl ReelService {
    pub fn new(reels: Collection<Reel>, public_url: &str) -> Self {
        Self {
            reels,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_public(&self) -> ContentResult<Vec<Reel>> {
        Ok(self
            .reels
            .find_by("status", Value::String(Visibility::Public.to_string()))
            .await?)
    }

    pub async fn open(&self, id: &str, viewer_id: &str) -> ContentResult<ReelView> {
        Ok(self.viewer(id, viewer_id).await?.view())
    }

    /// Open the reel before or after `id`. Fails with `AtBoundary` at either
    /// end of the list.
    pub async fn navigate(
        &self,
        id: &str,
        direction: NavDirection,
        viewer_id: &str,
    ) -> ContentResult<ReelView> {
        let viewer = self.viewer(id, viewer_id).await?;
        let target = viewer.neighbor(direction).map(str::to_string).ok_or_else(|| {
            ContentError::AtBoundary(match direction {
                NavDirection::Prev => "Already at the first reel".to_string(),
                NavDirection::Next => "Already at the last reel".to_string(),
            })
        })?;
        self.open(&target, viewer_id).await
    }

    pub async fn toggle_like(&self, id: &str, viewer_id: &str) -> ContentResult<ReelView> {
        let mut viewer = self.viewer(id, viewer_id).await?;
        let adding = viewer.begin_like_toggle();

        let value = vec![Value::String(viewer_id.to_string())];
        let update = if adding {
            FieldUpdate::array_union("likes", value)
        } else {
            FieldUpdate::array_remove("likes", value)
        };

        match self.reels.update(id, &[update]).await {
            Ok(Some(stored)) => viewer.commit(stored),
            Ok(None) => {
                viewer.rollback();
                return Err(ContentError::not_found(format!("Reel '{}'", id)));
            }
            Err(e) => {
                viewer.rollback();
                tracing::warn!("Like toggle on reel {} failed: {:#}", id, e);
                return Err(e.into());
            }
        }
        Ok(viewer.view())
    }

    pub async fn add_comment(
        &self,
        id: &str,
        author: &Commenter,
        text: &str,
    ) -> ContentResult<ReelView> {
        let mut viewer = self.viewer(id, &author.id).await?;
        viewer.set_draft(text);
        let text = viewer
            .take_draft()
            .ok_or_else(|| ContentError::validation("Comment cannot be empty"))?;

        let comment = ReelComment {
            id: Uuid::new_v4().simple().to_string(),
            text,
            user_id: author.id.clone(),
            user_name: author.name.clone(),
            user_photo: author.photo.clone(),
            timestamp: Utc::now().to_rfc3339(),
        };
        let value = serde_json::to_value(&comment).map_err(anyhow::Error::from)?;

        let stored = self
            .reels
            .update(id, &[FieldUpdate::array_union("comments", vec![value])])
            .await?
            .ok_or_else(|| ContentError::not_found(format!("Reel '{}'", id)))?;
        viewer.commit(stored);
        Ok(viewer.view())
    }

    /// Replace the text of one's own comment.
    pub async fn edit_comment(
        &self,
        id: &str,
        comment_id: &str,
        author_id: &str,
        text: &str,
    ) -> ContentResult<ReelView> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ContentError::validation("Comment cannot be empty"));
        }

        let mut viewer = self.viewer(id, author_id).await?;
        check_owner(viewer.reel(), comment_id, author_id)?;

        let mut patch = Map::new();
        patch.insert("text".to_string(), json!(text));
        let stored = self
            .reels
            .update(
                id,
                &[FieldUpdate::array_patch_where("comments", "id", json!(comment_id), patch)],
            )
            .await?
            .ok_or_else(|| ContentError::not_found(format!("Reel '{}'", id)))?;
        viewer.commit(stored);
        Ok(viewer.view())
    }

    pub async fn delete_comment(
        &self,
        id: &str,
        comment_id: &str,
        author_id: &str,
    ) -> ContentResult<ReelView> {
        let mut viewer = self.viewer(id, author_id).await?;
        check_owner(viewer.reel(), comment_id, author_id)?;

        let stored = self
            .reels
            .update(
                id,
                &[FieldUpdate::array_remove_where("comments", "id", json!(comment_id))],
            )
            .await?
            .ok_or_else(|| ContentError::not_found(format!("Reel '{}'", id)))?;
        viewer.commit(stored);
        Ok(viewer.view())
    }

    pub async fn share_links(&self, id: &str) -> ContentResult<ShareLinks> {
        let reel = self.get_public(id).await?;
        Ok(share_links_for(&self.public_url, &reel))
    }

    async fn get_public(&self, id: &str) -> ContentResult<Reel> {
        self.reels
            .get(id)
            .await?
            .filter(|r| r.status.is_public())
            .ok_or_else(|| ContentError::not_found(format!("Reel '{}'", id)))
    }

    /// Load the reel and the public list concurrently.
    async fn viewer(&self, id: &str, viewer_id: &str) -> ContentResult<ReelViewer> {
        let (reel, public) = tokio::try_join!(
            self.reels.get(id),
            self.reels
                .find_by("status", Value::String(Visibility::Public.to_string()))
        )?;

        let reel = reel
            .filter(|r| r.status.is_public())
            .ok_or_else(|| ContentError::not_found(format!("Reel '{}'", id)))?;
        let visible = public.into_iter().map(|r| r.id).collect();
        Ok(ReelViewer::new(reel, visible, viewer_id))
    }
}

fn check_owner(reel: &Reel, comment_id: &str, user_id: &str) -> ContentResult<()> {
    let comment = reel
        .comment(comment_id)
        .ok_or_else(|| ContentError::not_found(format!("Comment '{}'", comment_id)))?;
    if comment.user_id != user_id {
        return Err(ContentError::Forbidden(
            "You can only change your own comments".to_string(),
        ));
    }
    Ok(())
}

fn share_links_for(public_url: &str, reel: &Reel) -> ShareLinks {
    let url = format!("{}/reels/{}", public_url, reel.id);
    let encoded = urlencoding::encode(&url);
    ShareLinks {
        facebook: format!("https://www.facebook.com/sharer/sharer.php?u={}", encoded),
        twitter: format!(
            "https://twitter.com/intent/tweet?url={}&text={}",
            encoded,
            urlencoding::encode(&reel.caption)
        ),
        linkedin: format!(
            "https://www.linkedin.com/sharing/share-offsite/?url={}",
            encoded
        ),
        url,
    }
}
