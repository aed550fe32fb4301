//! Data Transfer Objects - form payloads and the page contexts handed to the
//! presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Accepts JSON booleans as well as HTML checkbox values (`on`, `true`, `1`).
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => matches!(s.to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes"),
    })
}

/// Post create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    /// RFC 3339 date-time, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD`.
    #[serde(default)]
    pub pub_date: Option<String>,
    /// Browsers leave an unchecked box out of the submission, so a missing
    /// field reads as `false`. Only the blank create form starts checked.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_published: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Default for PostForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            image: None,
            pub_date: None,
            is_published: true,
            category: None,
            location: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// Profile self-edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub username: String,
}

/// Public part of a user, as shown next to posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Profile header of a user's page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationView {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author: AuthorView,
    pub category: Option<CategoryView>,
    pub location: Option<LocationView>,
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub author: AuthorView,
    pub created_at: DateTime<Utc>,
}

/// One page of a listing with navigation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub page_size: u64,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page_number: Option<u64>,
}

/// `/` context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexContext {
    pub page_obj: PageView<PostView>,
}

/// `/posts/{id}/` context: the post, its comments and an empty comment form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailContext {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
}

/// `/profile/{username}/` context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileContext {
    pub profile: ProfileView,
    pub page_obj: PageView<PostView>,
}

/// `/category/{slug}/` context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryContext {
    pub category: CategoryView,
    pub page_obj: PageView<PostView>,
}

/// An edit or delete page: the form, and the entity it was filled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormContext<F, T> {
    pub form: F,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<T>,
}

/// The login page: a blank form and the path to return to afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPageContext {
    pub form: LoginRequest,
    pub next: Option<String>,
}

/// Query string of paginated pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_post_form_starts_published() {
        assert!(PostForm::default().is_published);
    }

    #[test]
    fn test_missing_checkbox_reads_as_unpublished() {
        let form: PostForm = serde_json::from_str(r#"{"title":"t","text":"x"}"#).unwrap();
        assert!(!form.is_published);
        assert_eq!(form.pub_date, None);
    }

    #[test]
    fn test_post_form_checkbox_values() {
        let on: PostForm = serde_json::from_str(r#"{"is_published":"on"}"#).unwrap();
        let off: PostForm = serde_json::from_str(r#"{"is_published":false}"#).unwrap();
        let text_off: PostForm = serde_json::from_str(r#"{"is_published":"false"}"#).unwrap();
        assert!(on.is_published);
        assert!(!off.is_published);
        assert!(!text_off.is_published);
    }

    #[test]
    fn test_page_view_omits_missing_neighbours() {
        let page: PageView<u8> = PageView {
            object_list: vec![],
            number: 1,
            num_pages: 1,
            count: 0,
            page_size: 10,
            has_next: false,
            has_previous: false,
            next_page_number: None,
            previous_page_number: None,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("next_page_number").is_none());
        assert_eq!(json["page_size"], 10);
    }
}
