//! HTTP handlers and route configuration.

mod auth;
mod category;
mod comments;
mod health;
mod posts;
mod profile;


use actix_web::{HttpResponse, http::header, web};

use blogicum_core::navigation::Destination;
use blogicum_core::services::MutationOutcome;

/// `303 See Other` to a read-only view.
pub(crate) fn see_other(to: &Destination) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, to.path()))
        .finish()
}

/// Applied and denied mutations both end in a redirect.
pub(crate) fn mutation_redirect(outcome: &MutationOutcome) -> HttpResponse {
    see_other(outcome.destination())
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/health/", web::get().to(health::health_check))
        // Literal segments go before the `{id}` patterns they would match.
        .service(
            web::resource("/posts/create/")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create)),
        )
        .route("/posts/{id}/", web::get().to(posts::detail))
        .service(
            web::resource("/posts/{id}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        )
        .service(
            web::resource("/posts/{id}/delete/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::delete)),
        )
        .route("/posts/{id}/comment/", web::post().to(comments::add))
        .service(
            web::resource("/posts/{id}/comment/{comment_id}/edit/")
                .route(web::get().to(comments::edit_form))
                .route(web::post().to(comments::edit)),
        )
        .service(
            web::resource("/posts/{id}/comment/{comment_id}/delete/")
                .route(web::get().to(comments::edit_form))
                .route(web::post().to(comments::delete)),
        )
        .service(
            web::resource("/profile/edit/")
                .route(web::get().to(profile::edit_form))
                .route(web::post().to(profile::edit)),
        )
        .route("/profile/{username}/", web::get().to(profile::profile))
        .route("/category/{slug}/", web::get().to(category::category_posts))
        .service(
            web::scope("/auth")
                .route("/registration/", web::post().to(auth::register))
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::post().to(auth::logout)),
        );
}
