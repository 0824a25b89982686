//! Reel viewer state
//!
//! Holds one open reel, its position in the list of public reels, the
//! viewer's like state and a comment draft. Navigation is clamped at both
//! ends. A like toggle is applied locally first and then either committed
//! with the stored reel or rolled back.

use serde::Serialize;

use crate::models::Reel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Prev,
    Next,
}

impl NavDirection {
    /// `ArrowUp` goes back, `ArrowDown` forward; other keys do nothing.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Self::Prev),
            "ArrowDown" => Some(Self::Next),
            _ => None,
        }
    }

    pub fn parse(direction: &str) -> Option<Self> {
        match direction.to_ascii_lowercase().as_str() {
            "prev" | "previous" => Some(Self::Prev),
            "next" => Some(Self::Next),
            _ => None,
        }
    }
}

/// Add `user_id` to the like set if absent, remove it otherwise.
/// Returns whether the user likes the reel afterwards.
pub fn toggle_like(likes: &mut Vec<String>, user_id: &str) -> bool {
    if likes.iter().any(|id| id == user_id) {
        likes.retain(|id| id != user_id);
        false
    } else {
        likes.push(user_id.to_string());
        true
    }
}

/// Snapshot returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelView {
    pub reel: Reel,
    /// Position in the public list; absent when the reel is not listed
    pub index: Option<usize>,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_id: Option<String>,
    pub next_id: Option<String>,
    pub liked: bool,
    pub like_count: usize,
}

#[derive(Debug)]
pub struct ReelViewer {
    reel: Reel,
    visible: Vec<String>,
    index: Option<usize>,
    viewer_id: String,
    draft: String,
    submitting: bool,
    /// Likes before an unconfirmed toggle
    pending_like: Option<Vec<String>>,
}

impl ReelViewer {
    pub fn new(reel: Reel, visible: Vec<String>, viewer_id: impl Into<String>) -> Self {
        let index = visible.iter().position(|id| *id == reel.id);
        Self {
            reel,
            visible,
            index,
            viewer_id: viewer_id.into(),
            draft: String::new(),
            submitting: false,
            pending_like: None,
        }
    }

    pub fn reel(&self) -> &Reel {
        &self.reel
    }

    pub fn liked(&self) -> bool {
        self.reel.is_liked_by(&self.viewer_id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn has_prev(&self) -> bool {
        self.neighbor(NavDirection::Prev).is_some()
    }

    pub fn has_next(&self) -> bool {
        self.neighbor(NavDirection::Next).is_some()
    }

    /// Id of the adjacent reel, `None` at either end of the list
    pub fn neighbor(&self, direction: NavDirection) -> Option<&str> {
        let index = self.index?;
        let target = match direction {
            NavDirection::Prev => index.checked_sub(1)?,
            NavDirection::Next => index + 1,
        };
        self.visible.get(target).map(String::as_str)
    }

    /// Apply a like toggle locally. Returns `true` when the toggle adds a like.
    /// Repeated toggles before a commit keep the first snapshot, so a
    /// rollback restores the last confirmed likes.
    pub fn begin_like_toggle(&mut self) -> bool {
        if self.pending_like.is_none() {
            self.pending_like = Some(self.reel.likes.clone());
        }
        self.submitting = true;
        toggle_like(&mut self.reel.likes, &self.viewer_id)
    }

    /// Replace local state with the stored reel after a successful write.
    pub fn commit(&mut self, stored: Reel) {
        self.reel = stored;
        self.pending_like = None;
        self.submitting = false;
    }

    /// Undo an unconfirmed like toggle.
    pub fn rollback(&mut self) {
        if let Some(likes) = self.pending_like.take() {
            self.reel.likes = likes;
        }
        self.submitting = false;
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Trimmed draft, ready to submit. Empty drafts and drafts submitted while
    /// a write is in flight yield `None`.
    pub fn take_draft(&mut self) -> Option<String> {
        let text = self.draft.trim();
        if text.is_empty() || self.submitting {
            return None;
        }
        let text = text.to_string();
        self.draft.clear();
        self.submitting = true;
        Some(text)
    }

    pub fn view(&self) -> ReelView {
        ReelView {
            reel: self.reel.clone(),
            index: self.index,
            total: self.visible.len(),
            has_prev: self.has_prev(),
            has_next: self.has_next(),
            prev_id: self.neighbor(NavDirection::Prev).map(str::to_string),
            next_id: self.neighbor(NavDirection::Next).map(str::to_string),
            liked: self.liked(),
            like_count: self.reel.likes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Visibility;
    use proptest::prelude::*;

    fn reel(id: &str) -> Reel {
        Reel {
            id: id.to_string(),
            video_url: format!("https://cdn.example/{}.mp4", id),
            thumbnail_url: None,
            caption: String::new(),
            status: Visibility::Public,
            user_name: None,
            user_photo: None,
            timestamp: None,
            likes: vec![],
            comments: vec![],
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_navigation_is_clamped_at_both_ends() {
        let list = ids(&["a", "b", "c"]);

        let first = ReelViewer::new(reel("a"), list.clone(), "u1");
        assert!(!first.has_prev());
        assert_eq!(first.neighbor(NavDirection::Prev), None);
        assert_eq!(first.neighbor(NavDirection::Next), Some("b"));

        let last = ReelViewer::new(reel("c"), list.clone(), "u1");
        assert!(!last.has_next());
        assert_eq!(last.neighbor(NavDirection::Next), None);
        assert_eq!(last.neighbor(NavDirection::Prev), Some("b"));

        let middle = ReelViewer::new(reel("b"), list, "u1");
        assert!(middle.has_prev() && middle.has_next());
    }

    #[test]
    fn test_unlisted_reel_has_no_neighbors() {
        let viewer = ReelViewer::new(reel("x"), ids(&["a", "b"]), "u1");
        let view = viewer.view();
        assert_eq!(view.index, None);
        assert!(!view.has_prev && !view.has_next);
    }

    #[test]
    fn test_keys() {
        assert_eq!(NavDirection::from_key("ArrowUp"), Some(NavDirection::Prev));
        assert_eq!(NavDirection::from_key("ArrowDown"), Some(NavDirection::Next));
        assert_eq!(NavDirection::from_key("ArrowLeft"), None);
        assert_eq!(NavDirection::from_key("Enter"), None);
        assert_eq!(NavDirection::parse("NEXT"), Some(NavDirection::Next));
        assert_eq!(NavDirection::parse("sideways"), None);
    }

    #[test]
    fn test_like_commit_reconciles_with_stored() {
        let mut viewer = ReelViewer::new(reel("a"), ids(&["a"]), "u1");
        assert!(viewer.begin_like_toggle());
        assert!(viewer.liked());
        assert!(viewer.is_submitting());

        let mut stored = reel("a");
        stored.likes = ids(&["u2", "u1"]);
        viewer.commit(stored);
        assert!(viewer.liked());
        assert_eq!(viewer.view().like_count, 2);
        assert!(!viewer.is_submitting());
    }

    #[test]
    fn test_like_rollback_restores_previous_state() {
        let mut start = reel("a");
        start.likes = ids(&["u1", "u2"]);
        let mut viewer = ReelViewer::new(start, ids(&["a"]), "u1");

        assert!(!viewer.begin_like_toggle());
        assert!(!viewer.liked());
        viewer.rollback();
        assert!(viewer.liked());
        assert_eq!(viewer.reel().likes, ids(&["u1", "u2"]));
    }

    #[test]
    fn test_repeated_toggles_roll_back_to_confirmed_likes() {
        let mut viewer = ReelViewer::new(reel("a"), ids(&["a"]), "u1");
        assert!(viewer.begin_like_toggle());
        assert!(!viewer.begin_like_toggle());
        assert!(viewer.begin_like_toggle());
        assert!(viewer.liked());

        viewer.rollback();
        assert!(!viewer.liked());
        assert!(viewer.reel().likes.is_empty());
        assert!(!viewer.is_submitting());
    }

    #[test]
    fn test_draft() {
        let mut viewer = ReelViewer::new(reel("a"), ids(&["a"]), "u1");
        viewer.set_draft("   ");
        assert_eq!(viewer.take_draft(), None);

        viewer.set_draft("  Great tip! ");
        assert_eq!(viewer.take_draft().as_deref(), Some("Great tip!"));
        viewer.set_draft("again");
        assert_eq!(viewer.take_draft(), None);
    }

    proptest! {
        #[test]
        fn like_toggle_is_an_involution(
            likes in proptest::collection::btree_set("[a-z]{1,6}", 0..10),
            user in "[a-z]{1,6}",
        ) {
            let original: Vec<String> = likes.into_iter().collect();
            let mut toggled = original.clone();
            let first = toggle_like(&mut toggled, &user);
            let second = toggle_like(&mut toggled, &user);
            prop_assert_ne!(first, second);

            let mut a = original.clone();
            let mut b = toggled.clone();
            a.sort();
            b.sort();
            prop_assert_eq!(a, b);
        }
    }
}
