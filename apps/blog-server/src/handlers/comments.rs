//! Comments on a post.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::services::Guarded;
use blogicum_shared::dto::{CommentForm, FormContext};

use super::{mutation_redirect, see_other};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::form::FormBody;
use crate::presenters::{comment_draft, comment_form, comment_view};
use crate::state::AppState;

/// POST /posts/{id}/comment/
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: FormBody<CommentForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let created = state
        .service
        .create_comment(identity.user_id, path.into_inner(), comment_draft(&form))
        .await
        .map_err(AppError::with_form(&form))?;

    Ok(see_other(&created.redirect))
}

/// GET /posts/{id}/comment/{comment_id}/edit/ and .../delete/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    match state
        .service
        .edit_comment(identity.user_id, post_id, comment_id)
        .await?
    {
        Guarded::Allowed(comment) => {
            let author = state.service.current_user(identity.user_id).await?;
            Ok(HttpResponse::Ok().json(FormContext {
                form: comment_form(&comment),
                object: Some(comment_view(&comment, &author)),
            }))
        }
        Guarded::Redirect(to) => Ok(see_other(&to)),
    }
}

/// POST /posts/{id}/comment/{comment_id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: FormBody<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let form = body.into_inner();
    let outcome = state
        .service
        .update_comment(identity.user_id, post_id, comment_id, comment_draft(&form))
        .await
        .map_err(AppError::with_form(&form))?;

    Ok(mutation_redirect(&outcome))
}

/// POST /posts/{id}/comment/{comment_id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .service
        .delete_comment(identity.user_id, post_id, comment_id)
        .await?;

    Ok(mutation_redirect(&outcome))
}
