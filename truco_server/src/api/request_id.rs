//! Request correlation for the HTTP routes.
//!
//! Every request carries an `x-request-id`: the client's own when it sends
//! one, otherwise a fresh UUID. The id is echoed on the response and opens
//! the request's tracing span. Handlers that resolve a room record its code
//! on the same span with [`record_room`], so lobby lookups log with both.

use axum::{
    Router,
    body::Body,
    http::{HeaderName, Request},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span, field};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Stamp, trace and echo request ids around every route of `router`.
pub fn with_request_ids<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = request_id_of(request),
        room = field::Empty,
    )
}

/// The id stamped on `request`, or `-` outside the layers.
fn request_id_of<B>(request: &Request<B>) -> &str {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-")
}

/// Tag the current request's span with the room it is about.
pub fn record_room(code: &str) {
    Span::current().record("room", code);
}
