//! Publish policy and the visibility filter built on top of it.
//!
//! A post is publicly visible when it is published, its category (if it has
//! one) is published and its publication date is not in the future. The
//! author of a post sees it regardless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Category, Post};

/// Who is looking at a listing or a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    /// True when the viewer is the given user.
    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id() == Some(user_id)
    }
}

impl From<Option<Uuid>> for Viewer {
    fn from(user_id: Option<Uuid>) -> Self {
        user_id.map_or(Viewer::Anonymous, Viewer::User)
    }
}

/// The publish policy, evaluated at `now`.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && category.is_none_or(|c| c.is_published) && post.pub_date <= now
}

/// Pre-scoping applied before the visibility rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Category(Uuid),
    Author(Uuid),
}

impl PostScope {
    pub fn contains(&self, post: &Post) -> bool {
        match self {
            PostScope::All => true,
            PostScope::Category(id) => post.category_id == Some(*id),
            PostScope::Author(id) => post.author_id == *id,
        }
    }
}

/// Decides which posts a viewer may list or open.
///
/// Stores translate this into their own query language; `admits` is the
/// reference predicate they must agree with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFilter {
    pub viewer: Viewer,
    pub scope: PostScope,
    pub now: DateTime<Utc>,
}

impl VisibilityFilter {
    pub fn new(viewer: Viewer, scope: PostScope) -> Self {
        Self {
            viewer,
            scope,
            now: Utc::now(),
        }
    }

    /// Evaluate the publish policy at a fixed instant instead of the clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Whether `post` (with its resolved `category`) passes the filter.
    pub fn admits(&self, post: &Post, category: Option<&Category>) -> bool {
        self.scope.contains(post)
            && (self.viewer.is(post.author_id) || is_publicly_visible(post, category, self.now))
    }
}
