//! Post listing, detail and author-only mutations.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::services::Guarded;
use blogicum_shared::dto::{
    CommentForm, FormContext, IndexContext, PageQuery, PostDetailContext, PostForm, PostView,
};

use super::{mutation_redirect, see_other};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::form::FormBody;
use crate::presenters::{
    comment_entry_view, page_number, page_view, post_draft, post_form, post_view,
};
use crate::state::AppState;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .service
        .index(identity.viewer(), page_number(&query)?)
        .await?;

    Ok(HttpResponse::Ok().json(IndexContext {
        page_obj: page_view(page),
    }))
}

/// GET /posts/{id}/
pub async fn detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state
        .service
        .post_detail(path.into_inner(), identity.viewer())
        .await?;

    Ok(HttpResponse::Ok().json(PostDetailContext {
        post: post_view(&detail.post),
        comments: detail.comments.iter().map(comment_entry_view).collect(),
        form: CommentForm::default(),
    }))
}

/// GET /posts/create/
pub async fn create_form(_identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(FormContext::<PostForm, PostView> {
        form: PostForm::default(),
        object: None,
    })
}

/// POST /posts/create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: FormBody<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let draft = post_draft(&form).map_err(|errors| AppError::invalid(&form, errors))?;

    let created = state
        .service
        .create_post(identity.user_id, draft)
        .await
        .map_err(AppError::with_form(&form))?;
    tracing::debug!(author = %identity.username, post_id = %created.entity.id, "Post submitted");

    Ok(see_other(&created.redirect))
}

/// GET /posts/{id}/edit/ and GET /posts/{id}/delete/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    match state.service.edit_post(identity.user_id, path.into_inner()).await? {
        Guarded::Allowed(entry) => Ok(HttpResponse::Ok().json(FormContext {
            form: post_form(&entry.post),
            object: Some(post_view(&entry)),
        })),
        Guarded::Redirect(to) => Ok(see_other(&to)),
    }
}

/// POST /posts/{id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: FormBody<PostForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let form = body.into_inner();
    let draft = match post_draft(&form) {
        Ok(draft) => draft,
        // Non-authors are redirected before they learn anything about the form.
        Err(errors) => {
            if let Guarded::Redirect(to) = state.service.edit_post(identity.user_id, post_id).await? {
                return Ok(see_other(&to));
            }
            return Err(AppError::invalid(&form, errors));
        }
    };

    let outcome = state
        .service
        .update_post(identity.user_id, post_id, draft)
        .await
        .map_err(AppError::with_form(&form))?;

    Ok(mutation_redirect(&outcome))
}

/// POST /posts/{id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .service
        .delete_post(identity.user_id, path.into_inner())
        .await?;

    Ok(mutation_redirect(&outcome))
}
