//! Category listing.

use actix_web::{HttpResponse, web};

use blogicum_shared::dto::{CategoryContext, PageQuery};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::presenters::{category_view, page_number, page_view};
use crate::state::AppState;

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .service
        .category(&path, identity.viewer(), page_number(&query)?)
        .await?;

    Ok(HttpResponse::Ok().json(CategoryContext {
        category: category_view(&page.category),
        page_obj: page_view(page.posts),
    }))
}
