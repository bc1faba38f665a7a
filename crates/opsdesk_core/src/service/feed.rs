//! Badge/feed presenter.
//!
//! Derived view over a cached notification window. Nothing here is persisted.

use crate::model::notification::{sort_feed, Notification};
use crate::service::notification_service::NotificationError;

/// Largest unread count rendered verbatim on the badge.
pub const BADGE_CAP: usize = 99;

/// Counts unread entries in a window.
pub fn unread_count(items: &[Notification]) -> usize {
    items.iter().filter(|item| !item.is_read).count()
}

/// Render-ready feed derived from one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    pub items: Vec<Notification>,
    pub unread_count: usize,
}

impl FeedView {
    pub fn from_window(items: &[Notification]) -> Self {
        let mut items = items.to_vec();
        sort_feed(&mut items);
        let unread_count = unread_count(&items);
        Self {
            items,
            unread_count,
        }
    }

    /// Badge text; `None` hides the badge.
    pub fn badge_label(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            count if count > BADGE_CAP => Some(format!("{BADGE_CAP}+")),
            count => Some(count.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Feed surface state, keeping fetch failures distinct from an empty feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Loaded(FeedView),
    /// Render an empty state with a retry affordance.
    Unavailable { message: String },
}

impl FeedState {
    pub fn from_result(result: Result<Vec<Notification>, NotificationError>) -> Self {
        match result {
            Ok(items) => Self::Loaded(FeedView::from_window(&items)),
            Err(err) => Self::Unavailable {
                message: err.to_string(),
            },
        }
    }

    pub fn unread_count(&self) -> usize {
        match self {
            Self::Loaded(view) => view.unread_count,
            Self::Unavailable { .. } => 0,
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedState, FeedView};
    use crate::model::notification::Notification;
    use crate::repo::RepoError;
    use crate::service::notification_service::NotificationError;
    use uuid::Uuid;

    fn window(unread: usize, read: usize) -> Vec<Notification> {
        let recipient = Uuid::new_v4();
        let mut items = Vec::new();
        for index in 0..(unread + read) {
            let mut item = Notification::new(recipient, "t", "m", index as i64);
            if index >= unread {
                item.mark_read(index as i64);
            }
            items.push(item);
        }
        items
    }

    #[test]
    fn view_sorts_newest_first_and_counts_unread() {
        let view = FeedView::from_window(&window(2, 3));
        assert_eq!(view.unread_count, 2);
        assert!(view
            .items
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[test]
    fn badge_is_hidden_at_zero_and_capped() {
        assert_eq!(FeedView::from_window(&window(0, 4)).badge_label(), None);
        assert_eq!(
            FeedView::from_window(&window(7, 0)).badge_label().as_deref(),
            Some("7")
        );
        assert_eq!(
            FeedView::from_window(&window(120, 0))
                .badge_label()
                .as_deref(),
            Some("99+")
        );
    }

    #[test]
    fn fetch_failure_is_not_an_empty_feed() {
        let state = FeedState::from_result(Err(NotificationError::Fetch {
            subject_id: Uuid::new_v4(),
            source: RepoError::Unavailable("timeout".to_string()),
        }));
        assert!(state.can_retry());
        assert_ne!(state, FeedState::Loaded(FeedView::from_window(&[])));
    }
}
