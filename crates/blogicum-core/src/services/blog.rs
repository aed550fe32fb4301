//! Blog use cases: listings, single-post lookups and author-only mutations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentEntry, Post, PostEntry, User};
use crate::error::{DomainError, RepoError};
use crate::forms::{CommentDraft, FieldErrors, PostDraft, ProfileChanges};
use crate::guard::{AuthorizationResult, authorize};
use crate::navigation::Destination;
use crate::pagination::{DEFAULT_PAGE_SIZE, Page, PageNumber, PageRequest};
use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use crate::visibility::{PostScope, Viewer, VisibilityFilter};

type DomainResult<T> = Result<T, DomainError>;

/// Handles to every store the blog reads and writes.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

/// Listing configuration, injected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlogConfig {
    pub page_size: u64,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Result of an update or delete. Both variants end in a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied(Destination),
    Denied(Destination),
}

impl MutationOutcome {
    pub fn destination(&self) -> &Destination {
        match self {
            MutationOutcome::Applied(d) | MutationOutcome::Denied(d) => d,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }
}

/// A freshly created entity and where to send its author next.
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub entity: T,
    pub redirect: Destination,
}

/// Access to an edit or delete form: the resource itself, or a redirect for
/// anyone but its author.
#[derive(Debug, Clone)]
pub enum Guarded<T> {
    Allowed(T),
    Redirect(Destination),
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostEntry,
    pub comments: Vec<CommentEntry>,
}

#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub profile: User,
    pub posts: Page<PostEntry>,
}

#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Page<PostEntry>,
}

pub struct BlogService {
    repos: Repositories,
    config: BlogConfig,
}

fn missing(entity_type: &'static str, key: impl ToString) -> impl FnOnce(RepoError) -> DomainError {
    let key = key.to_string();
    move |err| match err {
        RepoError::NotFound => DomainError::NotFound { entity_type, key },
        other => other.into(),
    }
}

impl BlogService {
    pub fn new(repos: Repositories, config: BlogConfig) -> Self {
        Self { repos, config }
    }

    pub fn config(&self) -> BlogConfig {
        self.config
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    async fn list(&self, filter: VisibilityFilter, page: PageNumber) -> DomainResult<Page<PostEntry>> {
        let total = self.repos.posts.count_visible(&filter).await?;
        let window = PageRequest::new(page, self.config.page_size)
            .window(total)
            .map_err(|e| DomainError::not_found("page", e))?;
        let items = self.repos.posts.list_visible(&filter, window).await?;
        Ok(Page::new(items, window, total))
    }

    /// Front page: every post the viewer may see.
    pub async fn index(&self, viewer: Viewer, page: PageNumber) -> DomainResult<Page<PostEntry>> {
        self.list(VisibilityFilter::new(viewer, PostScope::All), page).await
    }

    /// The one lookup every single-post accessor goes through. A post the
    /// viewer may not see is reported exactly like a missing one.
    pub async fn visible_post(&self, post_id: Uuid, viewer: Viewer) -> DomainResult<PostEntry> {
        let filter = VisibilityFilter::new(viewer, PostScope::All);
        match self.repos.posts.find_visible(post_id, &filter).await? {
            Some(entry) => Ok(entry),
            None => {
                tracing::debug!(%post_id, "Post missing or hidden from viewer");
                Err(DomainError::not_found("post", post_id))
            }
        }
    }

    pub async fn post_detail(&self, post_id: Uuid, viewer: Viewer) -> DomainResult<PostDetail> {
        let post = self.visible_post(post_id, viewer).await?;
        let comments = self.repos.comments.list_for_post(post_id).await?;
        Ok(PostDetail { post, comments })
    }

    async fn require_user(&self, user_id: Uuid) -> DomainResult<User> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }

    /// Field checks plus resolution of the category and location references.
    async fn check_post_draft(&self, draft: &PostDraft) -> DomainResult<DateTime<Utc>> {
        let mut errors = draft.validate();
        if let Some(id) = draft.category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                errors.add("category", "Select a valid choice. That choice is not one of the available choices.");
            }
        }
        if let Some(id) = draft.location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                errors.add("location", "Select a valid choice. That choice is not one of the available choices.");
            }
        }
        match draft.pub_date {
            Some(pub_date) if errors.is_empty() => Ok(pub_date),
            _ => Err(DomainError::Validation(errors)),
        }
    }

    fn apply_draft(post: &mut Post, draft: PostDraft, pub_date: DateTime<Utc>) {
        post.title = draft.title;
        post.text = draft.text;
        post.image = draft.image.filter(|i| !i.is_empty());
        post.pub_date = pub_date;
        post.is_published = draft.is_published;
        post.category_id = draft.category_id;
        post.location_id = draft.location_id;
    }

    /// Create a post authored by `requester` and send them to their profile.
    pub async fn create_post(&self, requester: Uuid, draft: PostDraft) -> DomainResult<Created<Post>> {
        let author = self.require_user(requester).await?;
        let pub_date = self.check_post_draft(&draft).await?;

        let mut post = Post::new(author.id, String::new(), String::new());
        Self::apply_draft(&mut post, draft, pub_date);
        let post = self.repos.posts.insert(post).await?;

        tracing::info!(post_id = %post.id, author = %author.username, "Post created");
        Ok(Created {
            entity: post,
            redirect: Destination::Profile(author.username),
        })
    }

    /// Load a post for its author's edit or delete form.
    pub async fn edit_post(&self, requester: Uuid, post_id: Uuid) -> DomainResult<Guarded<PostEntry>> {
        let entry = self.visible_post(post_id, Viewer::User(requester)).await?;
        Ok(
            match authorize(entry.post.author_id, requester, Destination::PostDetail(post_id)) {
                AuthorizationResult::Allowed => Guarded::Allowed(entry),
                AuthorizationResult::DeniedRedirect(to) => Guarded::Redirect(to),
            },
        )
    }

    pub async fn update_post(
        &self,
        requester: Uuid,
        post_id: Uuid,
        draft: PostDraft,
    ) -> DomainResult<MutationOutcome> {
        let mut post = match self.edit_post(requester, post_id).await? {
            Guarded::Allowed(entry) => entry.post,
            Guarded::Redirect(to) => return Ok(MutationOutcome::Denied(to)),
        };
        let pub_date = self.check_post_draft(&draft).await?;

        Self::apply_draft(&mut post, draft, pub_date);
        self.repos
            .posts
            .update(post)
            .await
            .map_err(missing("post", post_id))?;

        tracing::info!(%post_id, "Post updated");
        Ok(MutationOutcome::Applied(Destination::PostDetail(post_id)))
    }

    /// Delete a post and, through the store, its comments.
    pub async fn delete_post(&self, requester: Uuid, post_id: Uuid) -> DomainResult<MutationOutcome> {
        if let Guarded::Redirect(to) = self.edit_post(requester, post_id).await? {
            return Ok(MutationOutcome::Denied(to));
        }
        let author = self.require_user(requester).await?;
        self.repos
            .posts
            .delete(post_id)
            .await
            .map_err(missing("post", post_id))?;

        tracing::info!(%post_id, "Post deleted");
        Ok(MutationOutcome::Applied(Destination::Profile(author.username)))
    }

    pub async fn create_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        draft: CommentDraft,
    ) -> DomainResult<Created<Comment>> {
        self.require_user(requester).await?;
        self.visible_post(post_id, Viewer::User(requester)).await?;
        draft.validate().into_result().map_err(DomainError::Validation)?;

        let comment = self
            .repos
            .comments
            .insert(Comment::new(requester, post_id, draft.text))
            .await?;

        tracing::info!(comment_id = %comment.id, %post_id, "Comment added");
        Ok(Created {
            entity: comment,
            redirect: Destination::PostDetail(post_id),
        })
    }

    /// Load a comment for its author's edit or delete form. The comment must
    /// belong to `post_id`.
    pub async fn edit_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> DomainResult<Guarded<Comment>> {
        self.visible_post(post_id, Viewer::User(requester)).await?;
        let comment = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;

        Ok(
            match authorize(comment.author_id, requester, Destination::PostDetail(post_id)) {
                AuthorizationResult::Allowed => Guarded::Allowed(comment),
                AuthorizationResult::DeniedRedirect(to) => Guarded::Redirect(to),
            },
        )
    }

    pub async fn update_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
        draft: CommentDraft,
    ) -> DomainResult<MutationOutcome> {
        let mut comment = match self.edit_comment(requester, post_id, comment_id).await? {
            Guarded::Allowed(comment) => comment,
            Guarded::Redirect(to) => return Ok(MutationOutcome::Denied(to)),
        };
        draft.validate().into_result().map_err(DomainError::Validation)?;

        comment.text = draft.text;
        self.repos
            .comments
            .update(comment)
            .await
            .map_err(missing("comment", comment_id))?;

        tracing::info!(%comment_id, %post_id, "Comment updated");
        Ok(MutationOutcome::Applied(Destination::PostDetail(post_id)))
    }

    pub async fn delete_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> DomainResult<MutationOutcome> {
        if let Guarded::Redirect(to) = self.edit_comment(requester, post_id, comment_id).await? {
            return Ok(MutationOutcome::Denied(to));
        }
        self.repos
            .comments
            .delete(comment_id)
            .await
            .map_err(missing("comment", comment_id))?;

        tracing::info!(%comment_id, %post_id, "Comment deleted");
        Ok(MutationOutcome::Applied(Destination::PostDetail(post_id)))
    }

    /// A user's posts. The owner sees all of them, everyone else the
    /// publicly visible subset; both are ordered and annotated the same way.
    pub async fn profile(&self, username: &str, viewer: Viewer, page: PageNumber) -> DomainResult<ProfilePage> {
        let profile = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;
        let posts = self
            .list(VisibilityFilter::new(viewer, PostScope::Author(profile.id)), page)
            .await?;
        Ok(ProfilePage { profile, posts })
    }

    /// Posts of a published category. Unpublished categories do not exist
    /// as far as visitors are concerned.
    pub async fn category(&self, slug: &str, viewer: Viewer, page: PageNumber) -> DomainResult<CategoryPage> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;
        let posts = self
            .list(VisibilityFilter::new(viewer, PostScope::Category(category.id)), page)
            .await?;
        Ok(CategoryPage { category, posts })
    }

    /// The requester's own record, for the profile edit form.
    pub async fn current_user(&self, requester: Uuid) -> DomainResult<User> {
        self.require_user(requester).await
    }

    /// Self-service profile edit. The target is always the requester.
    pub async fn update_profile(&self, requester: Uuid, changes: ProfileChanges) -> DomainResult<MutationOutcome> {
        let mut user = self.require_user(requester).await?;
        let mut errors = changes.validate();
        if !errors.contains("username") {
            if let Some(other) = self.repos.users.find_by_username(&changes.username).await? {
                if other.id != user.id {
                    errors.add("username", "A user with that username already exists.");
                }
            }
        }
        errors.into_result().map_err(DomainError::Validation)?;

        user.username = changes.username;
        user.first_name = changes.first_name;
        user.last_name = changes.last_name;
        user.email = changes.email;
        let user = self.repos.users.update(user).await.map_err(|e| match e {
            RepoError::Constraint(_) => {
                let mut errors = FieldErrors::new();
                errors.add("username", "A user with that username already exists.");
                DomainError::Validation(errors)
            }
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(MutationOutcome::Applied(Destination::Profile(user.username)))
    }
}
