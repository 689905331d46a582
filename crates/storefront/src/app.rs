//! Router assembly.
//!
//! The binary and the integration tests build the same application here;
//! they differ only in the session store and the repositories inside
//! [`AppState`].

use axum::{
    Router, extract::Request, middleware::from_fn, middleware::from_fn_with_state, routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{Span, field::Empty};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{brand_middleware, request_id_middleware, security_headers_middleware};
use crate::routes::{self, health};
use crate::state::AppState;

/// URL prefix media is served at when the configured one is unusable.
const FALLBACK_MEDIA_PREFIX: &str = "/media";

/// The per-request span. `request_id` and `brand` start empty and are
/// filled in by their middleware once known.
pub fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = Empty,
        brand = Empty,
    )
}

/// Build the storefront router with every layer except Sentry's.
///
/// Layers, outermost first: trace, request id, security headers, session,
/// then brand resolution around the API routes only, so health checks and
/// media never touch the brand table.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let config = state.config();
    let media_prefix = if config.media.url_prefix.starts_with('/') && config.media.url_prefix.len() > 1
    {
        config.media.url_prefix.clone()
    } else {
        FALLBACK_MEDIA_PREFIX.to_string()
    };
    let media = ServeDir::new(&config.media.root);

    let api = routes::routes(config.rate_limiting)
        .layer(from_fn_with_state(state.clone(), brand_middleware));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(api)
        .nest_service(&media_prefix, media)
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use parking_lot::Mutex;
    use tower::ServiceExt;
    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing_subscriber::{Registry, layer::Context, layer::SubscriberExt};

    use super::*;
    use crate::middleware::request_id::REQUEST_ID_HEADER;

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<(String, String)>>>);

    impl Visit for Recorded {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.lock().push((field.name().to_string(), value.to_string()));
        }

        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0.lock().push((field.name().to_string(), format!("{value:?}")));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Recorded {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            attrs.record(&mut self.clone());
        }

        fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
            values.record(&mut self.clone());
        }
    }

    #[tokio::test]
    async fn test_request_span_receives_request_id() {
        let recorded = Recorded::default();
        let _guard = tracing::subscriber::set_default(Registry::default().with(recorded.clone()));

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http().make_span_with(request_span));
        app.oneshot(
            Request::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, "edge-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        let fields = recorded.0.lock().clone();
        assert!(fields.contains(&("request_id".to_string(), "edge-123".to_string())));
        assert!(fields.contains(&("uri".to_string(), "/".to_string())));

        let span = request_span(&Request::builder().uri("/api/brand").body(Body::empty()).unwrap());
        assert!(span.field("brand").is_some());
        span.record("brand", "acme-sports");
        assert!(recorded.0.lock().contains(&("brand".to_string(), "acme-sports".to_string())));
    }
}
