//! Authentication extractors.
//!
//! Tokens are read from the `Authorization: Bearer` header first and from the
//! `auth_token` cookie set at login otherwise.

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header, web};
use std::future::{Ready, ready};
use std::sync::Arc;

use blogicum_core::ports::{AuthError, TokenClaims, TokenService};
use blogicum_core::visibility::Viewer;

use crate::config::DEFAULT_LOGIN_URL;
use crate::state::AppState;

/// Cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn create_post(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl Identity {
    pub fn viewer(&self) -> Viewer {
        Viewer::User(self.user_id)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// A request that needs a signed-in user but has none. Answered with a
/// redirect to the login entry point carrying the original path.
#[derive(Debug)]
pub struct AuthenticationError {
    pub reason: AuthError,
    pub login_url: String,
    pub next: String,
}

impl AuthenticationError {
    fn new(req: &HttpRequest, reason: AuthError) -> Self {
        let login_url = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.login_url.clone())
            .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());
        let next = match req.query_string() {
            "" => req.path().to_string(),
            query => format!("{}?{}", req.path(), query),
        };
        Self {
            reason,
            login_url,
            next,
        }
    }

    /// `LOGIN_URL?next=<path>`.
    pub fn location(&self) -> String {
        let query = serde_urlencoded::to_string([("next", self.next.as_str())]).unwrap_or_default();
        format!("{}?{}", self.login_url, query)
    }
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::SEE_OTHER
    }

    fn error_response(&self) -> HttpResponse {
        tracing::debug!(reason = %self.reason, next = %self.next, "Redirecting to login");
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, self.location()))
            .finish()
    }
}

fn bearer_token(req: &HttpRequest) -> Result<Option<String>, AuthError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|t| Some(t.to_string()))
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let token_service = req
        .app_data::<web::Data<Arc<dyn TokenService>>>()
        .ok_or_else(|| {
            tracing::error!("TokenService not found in app data");
            AuthError::InvalidToken("Server configuration error".to_string())
        })?;

    let token = match bearer_token(req)? {
        Some(token) => token,
        None => req
            .cookie(AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AuthError::MissingAuth)?,
    };

    token_service.validate_token(&token).map(Identity::from)
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|e| AuthenticationError::new(req, e)))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn viewer(&self) -> Viewer {
        self.0.as_ref().map_or(Viewer::Anonymous, Identity::viewer)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_login_location_keeps_path_and_query() {
        let req = TestRequest::with_uri("/posts/create/?draft=1").to_http_request();
        let err = AuthenticationError::new(&req, AuthError::MissingAuth);
        assert_eq!(
            err.location(),
            "/auth/login/?next=%2Fposts%2Fcreate%2F%3Fdraft%3D1"
        );
    }

    #[test]
    fn test_optional_identity_viewer() {
        let user_id = uuid::Uuid::new_v4();
        let signed_in = OptionalIdentity(Some(Identity {
            user_id,
            username: "ann".to_string(),
        }));

        assert_eq!(signed_in.viewer(), Viewer::User(user_id));
        assert_eq!(OptionalIdentity(None).viewer(), Viewer::Anonymous);
    }

    #[test]
    fn test_bearer_prefix_is_required() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Token abc"))
            .to_http_request();
        assert!(matches!(bearer_token(&req), Err(AuthError::InvalidToken(_))));

        let req = TestRequest::default().to_http_request();
        assert!(matches!(bearer_token(&req), Ok(None)));
    }
}
