//! Conversions between domain values and the DTOs of `blogicum-shared`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, CommentEntry, Location, Post, PostEntry, User};
use blogicum_core::forms::{CommentDraft, FieldErrors, PostDraft, ProfileChanges, Registration};
use blogicum_core::pagination::{Page, PageNumber};
use blogicum_shared::dto::{
    AuthorView, CategoryView, CommentForm, CommentView, LocationView, PageQuery, PageView,
    PostForm, PostView, ProfileView, RegisterUserRequest, UserForm,
};

use crate::middleware::error::{AppError, AppResult};

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_DATETIME: &str = "Enter a valid date/time.";

pub fn author_view(user: &User) -> AuthorView {
    AuthorView {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

pub fn profile_view(user: &User) -> ProfileView {
    ProfileView {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        full_name: user.display_name(),
        date_joined: user.date_joined,
    }
}

pub fn category_view(category: &Category) -> CategoryView {
    CategoryView {
        id: category.id,
        title: category.title.clone(),
        description: category.description.clone(),
        slug: category.slug.clone(),
    }
}

fn location_view(location: &Location) -> LocationView {
    LocationView {
        id: location.id,
        name: location.name.clone(),
    }
}

pub fn post_view(entry: &PostEntry) -> PostView {
    let post = &entry.post;
    PostView {
        id: post.id,
        title: post.title.clone(),
        text: post.text.clone(),
        image: post.image.clone(),
        pub_date: post.pub_date,
        is_published: post.is_published,
        author: author_view(&entry.author),
        category: entry.category.as_ref().map(category_view),
        location: entry.location.as_ref().map(location_view),
        comment_count: entry.comment_count,
        created_at: post.created_at,
    }
}

pub fn comment_view(comment: &Comment, author: &User) -> CommentView {
    CommentView {
        id: comment.id,
        post_id: comment.post_id,
        text: comment.text.clone(),
        author: author_view(author),
        created_at: comment.created_at,
    }
}

pub fn comment_entry_view(entry: &CommentEntry) -> CommentView {
    comment_view(&entry.comment, &entry.author)
}

pub fn page_view(page: Page<PostEntry>) -> PageView<PostView> {
    PageView {
        number: page.number,
        num_pages: page.total_pages,
        count: page.total_items,
        page_size: page.page_size,
        has_next: page.has_next(),
        has_previous: page.has_previous(),
        next_page_number: page.has_next().then(|| page.number + 1),
        previous_page_number: page.has_previous().then(|| page.number - 1),
        object_list: page.items.iter().map(post_view).collect(),
    }
}

/// `?page=` value; absent means the first page, garbage means not found.
pub fn page_number(query: &PageQuery) -> AppResult<PageNumber> {
    match query.page.as_deref() {
        None | Some("") => Ok(PageNumber::default()),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::NotFound(format!("page {raw}"))),
    }
}

/// A post as its edit form shows it.
pub fn post_form(post: &Post) -> PostForm {
    PostForm {
        title: post.title.clone(),
        text: post.text.clone(),
        image: post.image.clone(),
        pub_date: Some(post.pub_date.to_rfc3339_opts(SecondsFormat::Secs, true)),
        is_published: post.is_published,
        category: post.category_id.map(|id| id.to_string()),
        location: post.location_id.map(|id| id.to_string()),
    }
}

pub fn comment_form(comment: &Comment) -> CommentForm {
    CommentForm {
        text: comment.text.clone(),
    }
}

pub fn user_form(user: &User) -> UserForm {
    UserForm {
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Accepts RFC 3339, `datetime-local` input values and bare dates (midnight UTC).
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_choice(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<Uuid> {
    let raw = non_empty(raw)?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// Decode the text fields of a post form. Field rules and reference checks
/// are left to the service.
pub fn post_draft(form: &PostForm) -> Result<PostDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let pub_date = match non_empty(form.pub_date.as_deref()) {
        None => None,
        Some(raw) => {
            let parsed = parse_pub_date(raw);
            if parsed.is_none() {
                errors.add("pub_date", INVALID_DATETIME);
            }
            parsed
        }
    };
    let category_id = parse_choice(&mut errors, "category", form.category.as_deref());
    let location_id = parse_choice(&mut errors, "location", form.location.as_deref());

    errors.into_result()?;
    Ok(PostDraft {
        title: form.title.trim().to_string(),
        text: form.text.clone(),
        image: non_empty(form.image.as_deref()).map(str::to_string),
        pub_date,
        is_published: form.is_published,
        category_id,
        location_id,
    })
}

pub fn comment_draft(form: &CommentForm) -> CommentDraft {
    CommentDraft {
        text: form.text.clone(),
    }
}

pub fn profile_changes(form: &UserForm) -> ProfileChanges {
    ProfileChanges {
        username: form.username.trim().to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_string(),
    }
}

pub fn registration(request: &RegisterUserRequest) -> Registration {
    Registration {
        username: request.username.trim().to_string(),
        email: request.email.trim().to_string(),
        password: request.password.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_pub_date_formats() {
        let rfc = parse_pub_date("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let local = parse_pub_date("2024-03-01T10:30").unwrap();
        assert_eq!((local.hour(), local.minute()), (10, 30));

        let date = parse_pub_date("2024-03-01").unwrap();
        assert_eq!((date.day(), date.hour()), (1, 0));

        assert!(parse_pub_date("yesterday").is_none());
    }

    #[test]
    fn test_post_draft_reports_unparseable_fields() {
        let form = PostForm {
            title: "T".into(),
            text: "B".into(),
            pub_date: Some("soon".into()),
            category: Some("not-a-uuid".into()),
            location: Some(String::new()),
            ..PostForm::default()
        };

        let errors = post_draft(&form).unwrap_err();
        assert!(errors.contains("pub_date"));
        assert!(errors.contains("category"));
        assert!(!errors.contains("location"));
    }

    #[test]
    fn test_post_draft_empty_selects_are_none() {
        let category = Uuid::new_v4();
        let form = PostForm {
            title: " Title ".into(),
            text: "Body".into(),
            image: Some(String::new()),
            pub_date: Some("2024-01-01".into()),
            category: Some(category.to_string()),
            location: Some(String::new()),
            ..PostForm::default()
        };

        let draft = post_draft(&form).unwrap();
        assert_eq!(draft.title, "Title");
        assert_eq!(draft.image, None);
        assert_eq!(draft.category_id, Some(category));
        assert_eq!(draft.location_id, None);
        assert!(draft.is_published);
    }

    #[test]
    fn test_page_number_parsing() {
        let query = |page: Option<&str>| PageQuery {
            page: page.map(str::to_string),
        };
        assert_eq!(page_number(&query(None)).unwrap(), PageNumber::Number(1));
        assert_eq!(page_number(&query(Some("last"))).unwrap(), PageNumber::Last);
        assert_eq!(page_number(&query(Some("3"))).unwrap(), PageNumber::Number(3));
        assert!(matches!(page_number(&query(Some("x"))), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_post_form_round_trips_through_draft() {
        let mut post = Post::new(Uuid::new_v4(), "Title".into(), "Body".into());
        post.category_id = Some(Uuid::new_v4());

        let draft = post_draft(&post_form(&post)).unwrap();
        assert_eq!(draft.category_id, post.category_id);
        assert_eq!(draft.pub_date.map(|d| d.timestamp()), Some(post.pub_date.timestamp()));
    }
}
