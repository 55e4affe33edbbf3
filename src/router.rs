use crate::handlers::{
    health::health_check,
    sip_accounts::{
        create_sip_accounts, delete_sip_account, get_sip_account, get_sip_accounts,
        update_sip_account,
    },
    users::{create_user, delete_user, get_me, get_user, get_users, update_user},
    webphone::{get_webphone_config, logout, post_webphone_config},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let timeout = state.settings.request_timeout();
    let metrics_enabled = state.settings.metrics_enabled;

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Webphone bootstrap
        .route("/phone/webphone/config", get(get_webphone_config))
        .route("/phone/webphone/config", post(post_webphone_config))
        .route("/api/v1/session", delete(logout))
        .route("/api/v1/me", get(get_me))
        // User CRUD routes
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users", get(get_users))
        .route("/api/v1/users/:user_id", get(get_user))
        .route("/api/v1/users/:user_id", put(update_user))
        .route("/api/v1/users/:user_id", delete(delete_user))
        // SIP account routes
        .route("/api/v1/sip-accounts", post(create_sip_accounts))
        .route("/api/v1/sip-accounts", get(get_sip_accounts))
        .route("/api/v1/sip-accounts/:sip_account_id", get(get_sip_account))
        .route("/api/v1/sip-accounts/:sip_account_id", put(update_sip_account))
        .route("/api/v1/sip-accounts/:sip_account_id", delete(delete_sip_account))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let router = with_metrics(router, metrics_enabled);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// The Prometheus recorder is process global, so test builds never install it.
#[cfg(not(test))]
fn with_metrics(router: Router<AppState>, enabled: bool) -> Router<AppState> {
    use axum_prometheus::PrometheusMetricLayer;

    if !enabled {
        return router;
    }
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    router
        .route("/metrics", get(move || async move { metric_handle.render() }))
        .layer(prometheus_layer)
}

#[cfg(test)]
fn with_metrics(router: Router<AppState>, _enabled: bool) -> Router<AppState> {
    router
}
