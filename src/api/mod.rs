pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put, delete},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))
        // API routes
        .nest("/api", api_routes(app_state.clone()))
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/properties", property_routes(state.clone()))
        .nest("/invite-codes", invite_code_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/analytics", analytics_routes(state))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public routes (no auth required to sign in)
        .route("/otp/request", post(handlers::auth::request_otp))
        .route("/otp/verify", post(handlers::auth::verify_otp))
        .route("/login", post(handlers::auth::login))
        // Protected routes - wrapped in a nested router with auth middleware
        .nest("/", Router::new()
            .route("/me", get(handlers::auth::me))
            .route("/refresh", post(handlers::auth::refresh))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_auth,
            ))
        )
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::users::list))
        .route("/", post(handlers::users::create))
        .route("/:id", get(handlers::users::get))
        .route("/:id", put(handlers::users::update))
        .route("/:id", delete(handlers::users::delete))
        .route("/:id/password", put(handlers::users::set_password))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn property_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::properties::list))
        .route("/", post(handlers::properties::create))
        .route("/:id", get(handlers::properties::get))
        .route("/:id", put(handlers::properties::update))
        .route("/:id", delete(handlers::properties::delete))
        .route("/:id/bookings", get(handlers::bookings::list_for_property))
        .route("/:id/availability", get(handlers::bookings::check_availability))
        .route("/:id/calendar/:year/:month", get(handlers::bookings::month_calendar))
        .route("/:id/report", get(handlers::analytics::property_report))
        .route("/:id/invite-codes", get(handlers::properties::list_invites))
        .route("/:id/invite-codes", post(handlers::properties::create_invite))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn invite_code_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:code/claim", post(handlers::properties::claim_invite))
        .route("/:code", delete(handlers::properties::deactivate_invite))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn booking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::bookings::list))
        .route("/", post(handlers::bookings::create))
        .route("/mine", get(handlers::bookings::list_mine))
        .route("/:id", get(handlers::bookings::get))
        .route("/:id", put(handlers::bookings::update))
        .route("/:id", delete(handlers::bookings::delete))
        .route("/:id/status", put(handlers::bookings::update_status))
        .route("/:id/payments", get(handlers::payments::list_for_booking))
        .route("/:id/payments", post(handlers::payments::log_payment))
        .route("/:id/payment-status", get(handlers::payments::payment_status))
        .route("/:id/history", get(handlers::payments::history))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:id", delete(handlers::payments::delete))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::notifications::list))
        .route("/unread-count", get(handlers::notifications::unread_count))
        .route("/:id/read", post(handlers::notifications::mark_read))
        .route("/read-all", post(handlers::notifications::mark_all_read))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn analytics_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::analytics::dashboard))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
        // The master export is admin-only at the route level as well
        .nest("/", Router::new()
            .route("/export", get(handlers::analytics::export_csv))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::auth::require_admin,
            ))
        )
}
