use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, CommentEntry, Location, Post, PostEntry, User};
use crate::error::RepoError;
use crate::pagination::PageWindow;
use crate::visibility::VisibilityFilter;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Fails with `NotFound` if nothing was deleted.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with lookup by the unique login name.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {}

/// Post repository. Every read goes through a [`VisibilityFilter`].
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Number of posts the filter admits.
    async fn count_visible(&self, filter: &VisibilityFilter) -> Result<u64, RepoError>;

    /// Admitted posts, newest publication date first, restricted to `window`.
    async fn list_visible(
        &self,
        filter: &VisibilityFilter,
        window: PageWindow,
    ) -> Result<Vec<PostEntry>, RepoError>;

    /// A single post, or `None` when it is missing or the filter rejects it.
    async fn find_visible(
        &self,
        id: Uuid,
        filter: &VisibilityFilter,
    ) -> Result<Option<PostEntry>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError>;
}
