use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    db::{DbPool, SqliteOrderLedger, UserStore},
    handlers::{auth, reports},
    middleware::require_auth,
    report::document::DocumentSettings,
    services::{AuthService, ReportService},
};

/// Shared handler state; every field is cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub reports: ReportService,
    pub users: UserStore,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(pool: DbPool, auth: AuthService, document: DocumentSettings) -> Self {
        let ledger = Arc::new(SqliteOrderLedger::new(pool.clone()));
        Self {
            reports: ReportService::new(ledger, document),
            users: UserStore::new(pool),
            auth,
        }
    }

    pub fn from_config(pool: DbPool, config: &Config) -> Self {
        Self::new(
            pool,
            AuthService::new(&config.jwt_secret, config.jwt_expiration_hours),
            config.document_settings(),
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    // Protected routes: require a bearer token
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/reports/orders", get(reports::orders_report))
        .route("/api/reports/orders/pdf", get(reports::orders_pdf))
        .route("/api/reports/inventory", get(reports::inventory_report))
        .route("/api/reports/dashboard", get(reports::dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api", get(health))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Carpentry Workshop API is running" }))
}
