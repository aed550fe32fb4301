//! User profile pages and self-service profile edit.

use actix_web::{HttpResponse, web};

use blogicum_shared::dto::{FormContext, PageQuery, ProfileContext, UserForm};

use super::mutation_redirect;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::form::FormBody;
use crate::presenters::{page_number, page_view, profile_changes, profile_view, user_form};
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .service
        .profile(&path, identity.viewer(), page_number(&query)?)
        .await?;

    Ok(HttpResponse::Ok().json(ProfileContext {
        profile: profile_view(&page.profile),
        page_obj: page_view(page.posts),
    }))
}

/// GET /profile/edit/
pub async fn edit_form(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.service.current_user(identity.user_id).await?;

    Ok(HttpResponse::Ok().json(FormContext {
        form: user_form(&user),
        object: Some(profile_view(&user)),
    }))
}

/// POST /profile/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    body: FormBody<UserForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let outcome = state
        .service
        .update_profile(identity.user_id, profile_changes(&form))
        .await
        .map_err(AppError::with_form(&form))?;

    Ok(mutation_redirect(&outcome))
}
