// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_middleware;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("failed to initialize application state");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("failed to run database migrations");
    tracing::info!("database migrations applied");

    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let driver_routes =
        Router::new().route("/profile", axum::routing::put(handlers::drivers::submit_profile));

    let space_routes = Router::new()
        .route(
            "/",
            post(handlers::spaces::create_space).get(handlers::spaces::list_my_spaces),
        )
        .route(
            "/{id}/managers",
            post(handlers::spaces::invite_manager).get(handlers::spaces::list_managers),
        );

    let slot_routes = Router::new()
        .route(
            "/",
            patch(handlers::slots::update_slot_group).get(handlers::slots::list_slot_groups),
        )
        .route("/stream", get(handlers::slots::stream_availability));

    let booking_routes = Router::new()
        .route(
            "/",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_bookings),
        )
        .route("/verify", post(handlers::bookings::verify_booking))
        .route("/{id}/cancel", post(handlers::bookings::cancel_booking))
        .route("/next-available", get(handlers::bookings::next_available));

    let search_routes = Router::new().route("/", get(handlers::search::search_spaces));

    let payment_routes = Router::new().route("/", post(handlers::payments::confirm_payment));

    let manager_routes = Router::new().route("/accept", post(handlers::managers::accept_invite));

    // Everything except register/login sits behind the session guard.
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/drivers", driver_routes)
        .nest("/api/spaces", space_routes)
        .nest("/api/slots", slot_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/search", search_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/managers", manager_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("failed to bind TCP listener");
    tracing::info!("server listening on {}", addr);
    axum::serve(listener, app).await.expect("server error");
}
