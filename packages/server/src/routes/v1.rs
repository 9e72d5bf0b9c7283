use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/application", application_routes(config))
        .route(
            "/applications",
            get(handlers::application::list_applications),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn application_routes(config: &AppConfig) -> Router<AppState> {
    // Submit and update carry a resume part, so they get the larger limit.
    let submission = Router::new()
        .route(
            "/",
            post(handlers::application::create_application)
                .put(handlers::application::update_application),
        )
        .layer(handlers::application::resume_upload_body_limit(
            config.storage.max_resume_size,
        ));

    let rest = Router::new()
        .route("/self", get(handlers::application::get_self_application))
        .route(
            "/self/resume",
            get(handlers::application::get_self_resume_url),
        )
        .route("/{id}", get(handlers::application::get_application))
        .route("/{id}/resume", get(handlers::application::get_resume_url))
        .route(
            "/{id}/status",
            post(handlers::application::set_application_status),
        );

    rest.merge(submission)
}
