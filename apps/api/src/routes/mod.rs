pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::applications::handlers as applications;
use crate::auth::USER_ID_HEADER;
use crate::config::Config;
use crate::errors::reveal_error_detail;
use crate::generation::handlers as ai;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let expose_details = state.config.is_development();
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .map_response(move |response: Response| reveal_error_detail(expose_details, response));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/test", get(health::test_handler))
        // Job applications
        .route(
            "/api/job-applications",
            get(applications::handle_list).post(applications::handle_create),
        )
        .route(
            "/api/job-applications/:id",
            get(applications::handle_get)
                .put(applications::handle_update)
                .patch(applications::handle_update)
                .delete(applications::handle_delete),
        )
        // Base resumes
        .route(
            "/api/resumes",
            get(resumes::handle_list).post(resumes::handle_create),
        )
        .route("/api/resumes/base", get(resumes::handle_get_base))
        .route(
            "/api/resumes/:id",
            get(resumes::handle_get)
                .put(resumes::handle_update)
                .delete(resumes::handle_delete),
        )
        // AI
        .route("/api/ai/generate-resume", post(ai::handle_generate_demo))
        .route("/api/ai/generate-resume-db", post(ai::handle_generate))
        .route("/api/ai/action-items", post(ai::handle_action_items))
        .route("/api/ai/status", get(ai::handle_status))
        .route(
            "/api/ai/generated-resumes",
            get(ai::handle_list_generated),
        )
        .route(
            "/api/ai/generated-resumes/:id",
            get(ai::handle_get_generated).delete(ai::handle_delete_generated),
        )
        .fallback(health::route_not_found)
        .layer(middleware)
        .with_state(state)
}
