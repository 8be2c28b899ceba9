use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware,
    routing::MethodRouter,
    Router,
};
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

pub mod broker;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;

use broker::ActionBroker;
use config::{ConfigError, HttpOptions};
use domain::routes::{axum_path, normalize_routes, trailing_slash_variant, RouteRegistry, RouteTable};

#[derive(Clone)]
pub struct AppState {
    pub is_debug: bool,
    pub routes: Arc<RouteTable>,
    pub broker: Arc<dyn ActionBroker>,
}

impl AppState {
    pub fn new(options: HttpOptions, broker: Arc<dyn ActionBroker>) -> Self {
        Self {
            is_debug: options.is_debug,
            routes: Arc::new(normalize_routes(&options.routes)),
            broker,
        }
    }
}

/// Builds the gateway router. Fails when the broker has not finished its own
/// initialization, in which case no route is registered.
pub fn build_app(state: AppState) -> Result<Router, ConfigError> {
    if !state.broker.is_ready() {
        return Err(ConfigError::BrokerNotReady);
    }

    let routes = action_routes(&state.routes)
        .fallback(http::handlers::not_found)
        .with_state(state);

    // Method override must see the request before the router matches it.
    let routes = middleware::from_fn(http::method_override::override_method).layer(routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Ok(Router::new()
        .fallback_service(routes)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .layer(cors))
}

fn action_routes(table: &RouteTable) -> Router<AppState> {
    let mut router = Router::new();
    let mut registry = RouteRegistry::default();
    let mut variants = Vec::new();

    for (url, entry) in table {
        if entry.is_empty() {
            continue;
        }

        let Some(path) = axum_path(url) else {
            warn!(url = %url, "skipping route with an unroutable path");
            continue;
        };

        if !registry.insert(&path) {
            warn!(url = %url, "skipping route that collides with an earlier one");
            continue;
        }

        let mut method_router: MethodRouter<AppState> = MethodRouter::new();
        for (verb, action) in entry {
            info!(url = %url, verb = verb.as_str(), action = %action, "registering route");
            let action: Arc<str> = Arc::from(action.as_str());
            method_router = method_router.on(
                verb.method_filter(),
                move |State(state): State<AppState>, request: Request| {
                    let action = Arc::clone(&action);
                    async move { http::handlers::dispatch_action(state, action, request).await }
                },
            );
        }
        let method_router = method_router.fallback(http::handlers::not_found);

        if let Some(variant) = trailing_slash_variant(&path) {
            variants.push((variant, method_router.clone()));
        }
        router = router.route(&path, method_router);
    }

    // Configured paths take precedence over trailing-slash variants.
    for (variant, method_router) in variants {
        if registry.insert(&variant) {
            router = router.route(&variant, method_router);
        }
    }

    router
}
