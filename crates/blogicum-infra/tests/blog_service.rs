//! Listing, visibility and ownership scenarios run against the in-memory store.

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use blogicum_core::DomainError;
use blogicum_core::domain::{Category, Location, Post, User};
use blogicum_core::forms::{CommentDraft, PostDraft, ProfileChanges};
use blogicum_core::navigation::Destination;
use blogicum_core::pagination::PageNumber;
use blogicum_core::services::{BlogConfig, BlogService, Guarded, MutationOutcome};
use blogicum_core::visibility::Viewer;
use blogicum_infra::InMemoryStore;

struct World {
    service: BlogService,
    ann: User,
    bob: User,
}

async fn world() -> World {
    let store = InMemoryStore::new();
    let repos = store.repositories();
    let ann = User::new("ann".into(), "ann@example.com".into(), "hash".into());
    let bob = User::new("bob".into(), "bob@example.com".into(), "hash".into());
    repos.users.insert(ann.clone()).await.unwrap();
    repos.users.insert(bob.clone()).await.unwrap();
    World {
        service: BlogService::new(repos, BlogConfig::default()),
        ann,
        bob,
    }
}

impl World {
    async fn post(&self, author: &User, adjust: impl FnOnce(&mut Post)) -> Post {
        let mut post = Post::new(author.id, "Title".into(), "Text".into());
        post.pub_date = Utc::now() - TimeDelta::hours(1);
        adjust(&mut post);
        self.service.repositories().posts.insert(post).await.unwrap()
    }

    async fn category(&self, slug: &str, published: bool) -> Category {
        let mut category = Category::new(slug.to_uppercase(), String::new(), slug.into());
        category.is_published = published;
        self.service.repositories().categories.insert(category).await.unwrap()
    }

    async fn index_ids(&self, viewer: Viewer) -> Vec<Uuid> {
        self.service
            .index(viewer, PageNumber::Number(1))
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|e| e.post.id)
            .collect()
    }
}

fn draft(title: &str) -> PostDraft {
    PostDraft {
        title: title.into(),
        text: "Body".into(),
        image: None,
        pub_date: Some(Utc::now() - TimeDelta::minutes(1)),
        is_published: true,
        category_id: None,
        location_id: None,
    }
}

fn is_not_found(result: &Result<impl std::fmt::Debug, DomainError>) -> bool {
    matches!(result, Err(DomainError::NotFound { .. }))
}

#[tokio::test]
async fn future_post_is_absent_from_anonymous_index() {
    let w = world().await;
    let visible = w.post(&w.ann, |_| {}).await;
    let tomorrow = w
        .post(&w.ann, |p| p.pub_date = Utc::now() + TimeDelta::days(1))
        .await;

    let ids = w.index_ids(Viewer::Anonymous).await;

    assert_eq!(ids, vec![visible.id]);
    assert!(!ids.contains(&tomorrow.id));
}

#[tokio::test]
async fn index_applies_policy_with_author_bypass() {
    let w = world().await;
    let hidden_category = w.category("secret", false).await;
    let public = w.post(&w.ann, |_| {}).await;
    let unpublished = w.post(&w.ann, |p| p.is_published = false).await;
    let in_hidden_category = w
        .post(&w.ann, |p| p.category_id = Some(hidden_category.id))
        .await;

    let anonymous = w.index_ids(Viewer::Anonymous).await;
    let bob = w.index_ids(Viewer::User(w.bob.id)).await;
    let ann = w.index_ids(Viewer::User(w.ann.id)).await;

    assert_eq!(anonymous, vec![public.id]);
    assert_eq!(bob, vec![public.id]);
    assert_eq!(ann.len(), 3);
    assert!(ann.contains(&unpublished.id));
    assert!(ann.contains(&in_hidden_category.id));
}

#[tokio::test]
async fn index_is_ordered_by_publication_date_descending() {
    let w = world().await;
    let old = w
        .post(&w.ann, |p| p.pub_date = Utc::now() - TimeDelta::days(3))
        .await;
    let new = w
        .post(&w.ann, |p| p.pub_date = Utc::now() - TimeDelta::minutes(3))
        .await;
    let middle = w
        .post(&w.bob, |p| p.pub_date = Utc::now() - TimeDelta::days(1))
        .await;

    assert_eq!(w.index_ids(Viewer::Anonymous).await, vec![new.id, middle.id, old.id]);
}

#[tokio::test]
async fn unpublished_post_is_visible_to_author_only() {
    let w = world().await;
    let created = w
        .service
        .create_post(
            w.ann.id,
            PostDraft {
                is_published: false,
                ..draft("Draft")
            },
        )
        .await
        .unwrap();
    assert_eq!(created.redirect, Destination::Profile("ann".into()));

    let own = w.service.post_detail(created.entity.id, Viewer::User(w.ann.id)).await;
    let anonymous = w.service.post_detail(created.entity.id, Viewer::Anonymous).await;
    let other = w.service.post_detail(created.entity.id, Viewer::User(w.bob.id)).await;
    let missing = w.service.post_detail(Uuid::new_v4(), Viewer::Anonymous).await;

    assert_eq!(own.unwrap().post.post.title, "Draft");
    assert!(is_not_found(&anonymous));
    assert!(is_not_found(&other));
    assert!(is_not_found(&missing));
}

#[tokio::test]
async fn author_is_taken_from_requester() {
    let w = world().await;
    let created = w.service.create_post(w.bob.id, draft("Mine")).await.unwrap();
    assert_eq!(created.entity.author_id, w.bob.id);
    assert_eq!(created.redirect, Destination::Profile("bob".into()));
}

#[tokio::test]
async fn invalid_post_draft_writes_nothing() {
    let w = world().await;
    let result = w
        .service
        .create_post(
            w.ann.id,
            PostDraft {
                title: String::new(),
                category_id: Some(Uuid::new_v4()),
                ..draft("")
            },
        )
        .await;

    match result {
        Err(DomainError::Validation(errors)) => {
            assert!(errors.contains("title"));
            assert!(errors.contains("category"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(w.index_ids(Viewer::User(w.ann.id)).await.is_empty());
}

#[tokio::test]
async fn post_can_reference_category_and_location() {
    let w = world().await;
    let category = w.category("travel", true).await;
    let location = w
        .service
        .repositories()
        .locations
        .insert(Location::new("Island".into()))
        .await
        .unwrap();

    let created = w
        .service
        .create_post(
            w.ann.id,
            PostDraft {
                category_id: Some(category.id),
                location_id: Some(location.id),
                ..draft("Trip")
            },
        )
        .await
        .unwrap();

    let detail = w.service.post_detail(created.entity.id, Viewer::Anonymous).await.unwrap();
    assert_eq!(detail.post.category.map(|c| c.slug), Some("travel".into()));
    assert_eq!(detail.post.location.map(|l| l.name), Some("Island".into()));
}

#[tokio::test]
async fn non_author_update_is_redirected_and_store_unchanged() {
    let w = world().await;
    let post = w.post(&w.ann, |_| {}).await;

    let outcome = w
        .service
        .update_post(w.bob.id, post.id, draft("Hijacked"))
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Denied(Destination::PostDetail(post.id)));
    let detail = w.service.post_detail(post.id, Viewer::Anonymous).await.unwrap();
    assert_eq!(detail.post.post.title, "Title");
}

#[tokio::test]
async fn author_update_keeps_author_and_redirects_to_detail() {
    let w = world().await;
    let post = w.post(&w.ann, |_| {}).await;

    let outcome = w
        .service
        .update_post(w.ann.id, post.id, draft("Renamed"))
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Applied(Destination::PostDetail(post.id)));
    let detail = w.service.post_detail(post.id, Viewer::Anonymous).await.unwrap();
    assert_eq!(detail.post.post.title, "Renamed");
    assert_eq!(detail.post.post.author_id, w.ann.id);
}

#[tokio::test]
async fn edit_form_is_guarded() {
    let w = world().await;
    let post = w.post(&w.ann, |_| {}).await;

    let own = w.service.edit_post(w.ann.id, post.id).await.unwrap();
    let other = w.service.edit_post(w.bob.id, post.id).await.unwrap();

    assert!(matches!(own, Guarded::Allowed(entry) if entry.post.id == post.id));
    assert!(matches!(other, Guarded::Redirect(Destination::PostDetail(id)) if id == post.id));
}

#[tokio::test]
async fn hidden_post_edit_by_non_author_is_not_found() {
    let w = world().await;
    let post = w.post(&w.ann, |p| p.is_published = false).await;

    let result = w.service.edit_post(w.bob.id, post.id).await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn delete_post_cascades_and_repeat_is_not_found() {
    let w = world().await;
    let post = w.post(&w.ann, |_| {}).await;
    let comment = w
        .service
        .create_comment(w.bob.id, post.id, CommentDraft { text: "Hi".into() })
        .await
        .unwrap();

    let outcome = w.service.delete_post(w.ann.id, post.id).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Applied(Destination::Profile("ann".into())));

    let comment = w
        .service
        .repositories()
        .comments
        .find_by_id(comment.entity.id)
        .await
        .unwrap();
    assert!(comment.is_none());

    let again = w.service.delete_post(w.ann.id, post.id).await;
    assert!(is_not_found(&again));
}

#[tokio::test]
async fn non_author_cannot_delete_comment() {
    let w = world().await;
    let post = w.post(&w.ann, |_| {}).await;
    let comment = w
        .service
        .create_comment(w.ann.id, post.id, CommentDraft { text: "Mine".into() })
        .await
        .unwrap()
        .entity;

    let outcome = w
        .service
        .delete_comment(w.bob.id, post.id, comment.id)
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Denied(Destination::PostDetail(post.id)));
    let detail = w.service.post_detail(post.id, Viewer::Anonymous).await.unwrap();
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.post.comment_count, 1);
}

#[tokio::test]
async fn comment_lifecycle_for_its_author() {
    let w = world().await;
    let post = w.post(&w.ann, |_| {}).await;
    let created = w
        .service
        .create_comment(w.bob.id, post.id, CommentDraft { text: "First".into() })
        .await
        .unwrap();
    assert_eq!(created.redirect, Destination::PostDetail(post.id));
    let comment_id = created.entity.id;

    let updated = w
        .service
        .update_comment(w.bob.id, post.id, comment_id, CommentDraft { text: "Edited".into() })
        .await
        .unwrap();
    assert!(updated.is_applied());

    let detail = w.service.post_detail(post.id, Viewer::Anonymous).await.unwrap();
    assert_eq!(detail.comments[0].comment.text, "Edited");
    assert_eq!(detail.comments[0].author.username, "bob");

    let deleted = w.service.delete_comment(w.bob.id, post.id, comment_id).await.unwrap();
    assert_eq!(deleted, MutationOutcome::Applied(Destination::PostDetail(post.id)));
    let again = w.service.delete_comment(w.bob.id, post.id, comment_id).await;
    assert!(is_not_found(&again));
}

#[tokio::test]
async fn comment_must_belong_to_path_post() {
    let w = world().await;
    let first = w.post(&w.ann, |_| {}).await;
    let second = w.post(&w.ann, |_| {}).await;
    let comment = w
        .service
        .create_comment(w.ann.id, first.id, CommentDraft { text: "Here".into() })
        .await
        .unwrap()
        .entity;

    let result = w.service.edit_comment(w.ann.id, second.id, comment.id).await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn commenting_on_hidden_post_is_not_found() {
    let w = world().await;
    let post = w.post(&w.ann, |p| p.is_published = false).await;

    let result = w
        .service
        .create_comment(w.bob.id, post.id, CommentDraft { text: "Hello?".into() })
        .await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn empty_comment_is_rejected() {
    let w = world().await;
    let post = w.post(&w.ann, |_| {}).await;

    let result = w
        .service
        .create_comment(w.bob.id, post.id, CommentDraft { text: " ".into() })
        .await;

    assert!(matches!(result, Err(DomainError::Validation(e)) if e.contains("text")));
}

#[tokio::test]
async fn profile_owner_sees_all_own_posts() {
    let w = world().await;
    let public = w.post(&w.ann, |_| {}).await;
    w.post(&w.ann, |p| p.is_published = false).await;
    w.post(&w.ann, |p| p.pub_date = Utc::now() + TimeDelta::days(2)).await;
    w.post(&w.bob, |_| {}).await;

    let own = w
        .service
        .profile("ann", Viewer::User(w.ann.id), PageNumber::Number(1))
        .await
        .unwrap();
    let visitor = w
        .service
        .profile("ann", Viewer::User(w.bob.id), PageNumber::Number(1))
        .await
        .unwrap();

    assert_eq!(own.profile.username, "ann");
    assert_eq!(own.posts.total_items, 3);
    assert_eq!(visitor.posts.total_items, 1);
    assert_eq!(visitor.posts.items[0].post.id, public.id);
    assert!(is_not_found(
        &w.service.profile("nobody", Viewer::Anonymous, PageNumber::Number(1)).await
    ));
}

#[tokio::test]
async fn unpublished_category_is_not_found() {
    let w = world().await;
    let hidden = w.category("hidden", false).await;
    w.post(&w.ann, |p| p.category_id = Some(hidden.id)).await;

    let result = w
        .service
        .category("hidden", Viewer::User(w.ann.id), PageNumber::Number(1))
        .await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn category_lists_only_its_visible_posts() {
    let w = world().await;
    let travel = w.category("travel", true).await;
    let food = w.category("food", true).await;
    let trip = w.post(&w.ann, |p| p.category_id = Some(travel.id)).await;
    w.post(&w.ann, |p| {
        p.category_id = Some(travel.id);
        p.is_published = false;
    })
    .await;
    w.post(&w.ann, |p| p.category_id = Some(food.id)).await;

    let page = w
        .service
        .category("travel", Viewer::Anonymous, PageNumber::Number(1))
        .await
        .unwrap();

    assert_eq!(page.category.id, travel.id);
    assert_eq!(page.posts.items.len(), 1);
    assert_eq!(page.posts.items[0].post.id, trip.id);
}

#[tokio::test]
async fn pagination_caps_pages_and_counts_everything() {
    let w = world().await;
    for i in 0..23 {
        w.post(&w.ann, |p| p.pub_date = Utc::now() - TimeDelta::minutes(i + 1)).await;
    }
    w.post(&w.ann, |p| p.is_published = false).await;

    let mut seen = 0;
    for n in 1..=3 {
        let page = w.service.index(Viewer::Anonymous, PageNumber::Number(n)).await.unwrap();
        assert!(page.items.len() <= 10);
        assert_eq!(page.total_items, 23);
        assert_eq!(page.total_pages, 3);
        seen += page.items.len();
    }
    assert_eq!(seen, 23);

    let last = w.service.index(Viewer::Anonymous, PageNumber::Last).await.unwrap();
    assert_eq!(last.number, 3);
    assert_eq!(last.items.len(), 3);
    assert!(is_not_found(
        &w.service.index(Viewer::Anonymous, PageNumber::Number(4)).await
    ));
}

#[tokio::test]
async fn page_size_is_configurable() {
    let store = InMemoryStore::new();
    let repos = store.repositories();
    let ann = User::new("ann".into(), "ann@example.com".into(), "hash".into());
    repos.users.insert(ann.clone()).await.unwrap();
    for _ in 0..5 {
        let mut post = Post::new(ann.id, "T".into(), "B".into());
        post.pub_date = Utc::now() - TimeDelta::hours(1);
        repos.posts.insert(post).await.unwrap();
    }
    let service = BlogService::new(repos, BlogConfig { page_size: 2 });

    let page = service.index(Viewer::Anonymous, PageNumber::Number(1)).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages, 3);
}

#[tokio::test]
async fn profile_update_changes_own_record_only() {
    let w = world().await;
    let changes = ProfileChanges {
        username: "annie".into(),
        first_name: "Ann".into(),
        last_name: "Lee".into(),
        email: "annie@example.com".into(),
    };

    let outcome = w.service.update_profile(w.ann.id, changes).await.unwrap();

    assert_eq!(outcome, MutationOutcome::Applied(Destination::Profile("annie".into())));
    let me = w.service.current_user(w.ann.id).await.unwrap();
    assert_eq!(me.display_name(), "Ann Lee");
    let bob = w.service.current_user(w.bob.id).await.unwrap();
    assert_eq!(bob.username, "bob");
}

#[tokio::test]
async fn profile_update_rejects_taken_username() {
    let w = world().await;
    let changes = ProfileChanges {
        username: "bob".into(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
    };

    let result = w.service.update_profile(w.ann.id, changes).await;

    assert!(matches!(result, Err(DomainError::Validation(e)) if e.contains("username")));
}
