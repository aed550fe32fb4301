use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, CommentEntry, Location, Post, PostEntry, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::PageWindow;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::services::Repositories;
use blogicum_core::visibility::VisibilityFilter;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn category_of(&self, post: &Post) -> Option<&Category> {
        post.category_id.and_then(|id| self.categories.get(&id))
    }

    /// Admitted posts, newest publication date first.
    fn visible(&self, filter: &VisibilityFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| filter.admits(p, self.category_of(p)))
            .collect();
        posts.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        posts
    }

    fn entry(&self, post: &Post) -> Result<PostEntry, RepoError> {
        let author = self
            .users
            .get(&post.author_id)
            .cloned()
            .ok_or_else(|| RepoError::Query(format!("author of post {} is missing", post.id)))?;
        let comment_count = self.comments.values().filter(|c| c.post_id == post.id).count();
        Ok(PostEntry {
            post: post.clone(),
            author,
            category: self.category_of(post).cloned(),
            location: post.location_id.and_then(|id| self.locations.get(&id)).cloned(),
            comment_count: comment_count as u64,
        })
    }

    fn unique_username(&self, user: &User) -> Result<(), RepoError> {
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "username '{}' is taken",
                user.username
            )));
        }
        Ok(())
    }

    fn unique_slug(&self, category: &Category) -> Result<(), RepoError> {
        if self
            .categories
            .values()
            .any(|c| c.id != category.id && c.slug == category.slug)
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is taken",
                category.slug
            )));
        }
        Ok(())
    }

    fn check_post_refs(&self, post: &Post) -> Result<(), RepoError> {
        let dangling = !self.users.contains_key(&post.author_id)
            || post.category_id.is_some_and(|id| !self.categories.contains_key(&id))
            || post.location_id.is_some_and(|id| !self.locations.contains_key(&id));
        if dangling {
            return Err(RepoError::Constraint(format!(
                "post {} references a missing row",
                post.id
            )));
        }
        Ok(())
    }

    fn check_comment_refs(&self, comment: &Comment) -> Result<(), RepoError> {
        if !self.users.contains_key(&comment.author_id) || !self.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "comment {} references a missing row",
                comment.id
            )));
        }
        Ok(())
    }

    fn remove_post(&mut self, id: Uuid) -> bool {
        let removed = self.posts.remove(&id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != id);
        }
        removed
    }
}

/// Shared in-memory tables. Cloning yields another handle to the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every repository port backed by this store.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.clone()),
            categories: Arc::new(self.clone()),
            locations: Arc::new(self.clone()),
            posts: Arc::new(self.clone()),
            comments: Arc::new(self.clone()),
        }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(RepoError::Constraint(format!("user {} exists", user.id)));
        }
        tables.unique_username(&user)?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        tables.unique_username(&user)?;
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        let owned: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.contains_key(&category.id) {
            return Err(RepoError::Constraint(format!("category {} exists", category.id)));
        }
        tables.unique_slug(&category)?;
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&category.id) {
            return Err(RepoError::NotFound);
        }
        tables.unique_slug(&category)?;
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }
}

#[async_trait]
impl BaseRepository<Location, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepoError> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn insert(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.locations.contains_key(&location.id) {
            return Err(RepoError::Constraint(format!("location {} exists", location.id)));
        }
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.locations.contains_key(&location.id) {
            return Err(RepoError::NotFound);
        }
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.locations.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!("post {} exists", post.id)));
        }
        tables.check_post_refs(&post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        tables.check_post_refs(&post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.tables.write().await.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn count_visible(&self, filter: &VisibilityFilter) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.visible(filter).len() as u64)
    }

    async fn list_visible(
        &self,
        filter: &VisibilityFilter,
        window: PageWindow,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .visible(filter)
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .map(|post| tables.entry(post))
            .collect()
    }

    async fn find_visible(
        &self,
        id: Uuid,
        filter: &VisibilityFilter,
    ) -> Result<Option<PostEntry>, RepoError> {
        let tables = self.tables.read().await;
        match tables.posts.get(&id) {
            Some(post) if filter.admits(post, tables.category_of(post)) => {
                tables.entry(post).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.comments.contains_key(&comment.id) {
            return Err(RepoError::Constraint(format!("comment {} exists", comment.id)));
        }
        tables.check_comment_refs(&comment)?;
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&comment.id) {
            return Err(RepoError::NotFound);
        }
        tables.check_comment_refs(&comment)?;
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.tables.write().await.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentEntry>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by_key(|c| c.created_at);
        comments
            .into_iter()
            .map(|comment| {
                let author = tables.users.get(&comment.author_id).cloned().ok_or_else(|| {
                    RepoError::Query(format!("author of comment {} is missing", comment.id))
                })?;
                Ok(CommentEntry {
                    comment: comment.clone(),
                    author,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_core::visibility::{PostScope, Viewer};
    use chrono::{TimeDelta, Utc};

    async fn seeded() -> (InMemoryStore, User, Post) {
        let store = InMemoryStore::new();
        let user = User::new("ann".into(), "ann@example.com".into(), "hash".into());
        BaseRepository::<User, Uuid>::insert(&store, user.clone()).await.unwrap();
        let mut post = Post::new(user.id, "Hello".into(), "World".into());
        post.pub_date = Utc::now() - TimeDelta::minutes(5);
        BaseRepository::<Post, Uuid>::insert(&store, post.clone()).await.unwrap();
        (store, user, post)
    }

    #[tokio::test]
    async fn test_deleting_post_removes_its_comments() {
        let (store, user, post) = seeded().await;
        let comment = Comment::new(user.id, post.id, "First".into());
        BaseRepository::<Comment, Uuid>::insert(&store, comment.clone()).await.unwrap();

        BaseRepository::<Post, Uuid>::delete(&store, post.id).await.unwrap();

        let found = BaseRepository::<Comment, Uuid>::find_by_id(&store, comment.id).await.unwrap();
        assert!(found.is_none());
        assert!(matches!(
            BaseRepository::<Post, Uuid>::delete(&store, post.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_constraint_violation() {
        let (store, _, _) = seeded().await;
        let twin = User::new("ann".into(), "other@example.com".into(), "hash".into());
        let result = BaseRepository::<User, Uuid>::insert(&store, twin).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_post_with_unknown_category_is_rejected() {
        let (store, user, _) = seeded().await;
        let mut post = Post::new(user.id, "T".into(), "B".into());
        post.category_id = Some(Uuid::new_v4());
        let result = BaseRepository::<Post, Uuid>::insert(&store, post).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_entries_are_annotated_with_comment_count() {
        let (store, user, post) = seeded().await;
        for text in ["a", "b"] {
            let comment = Comment::new(user.id, post.id, text.into());
            BaseRepository::<Comment, Uuid>::insert(&store, comment).await.unwrap();
        }

        let filter = VisibilityFilter::new(Viewer::Anonymous, PostScope::All);
        let entry = store.find_visible(post.id, &filter).await.unwrap().unwrap();
        assert_eq!(entry.comment_count, 2);
        assert_eq!(entry.author.username, "ann");
    }

    #[tokio::test]
    async fn test_deleting_category_detaches_posts() {
        let (store, user, _) = seeded().await;
        let category = Category::new("Travel".into(), String::new(), "travel".into());
        BaseRepository::<Category, Uuid>::insert(&store, category.clone()).await.unwrap();
        let mut post = Post::new(user.id, "Trip".into(), "Text".into());
        post.category_id = Some(category.id);
        BaseRepository::<Post, Uuid>::insert(&store, post.clone()).await.unwrap();

        BaseRepository::<Category, Uuid>::delete(&store, category.id).await.unwrap();

        let post = BaseRepository::<Post, Uuid>::find_by_id(&store, post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, None);
    }
}
