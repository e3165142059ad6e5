// routes.rs
use axum::{
    body::Body,
    http::{header::ACCEPT, Method, Request},
    response::Redirect,
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use uuid::Uuid;

use crate::admin;
use crate::handlers;
use crate::state::AppState;
use crate::store::Store;

pub const INDEX: &str = "/polls/";
const DETAIL: &str = "/polls/{question_id}/";
const RESULTS: &str = "/polls/{question_id}/results/";
const VOTE: &str = "/polls/{question_id}/vote/";

pub fn index_url() -> String {
    INDEX.to_string()
}

pub fn detail_url(question_id: i64) -> String {
    format!("/polls/{question_id}/")
}

pub fn results_url(question_id: i64) -> String {
    format!("/polls/{question_id}/results/")
}

pub fn vote_url(question_id: i64) -> String {
    format!("/polls/{question_id}/vote/")
}

/// Tags every request with a fresh UUID unless the client sent one.
#[derive(Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub fn create_routes<S: Store>(state: AppState<S>) -> Router {
    let mut router = Router::new()
        .route("/", get(|| async { Redirect::to(INDEX) }))
        .route(INDEX, get(handlers::index::<S>))
        .route(DETAIL, get(handlers::detail::<S>))
        .route(RESULTS, get(handlers::results::<S>))
        .route(VOTE, post(handlers::vote::<S>));

    if state.admin.is_some() {
        router = router.merge(admin::routes::<S>());
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([ACCEPT])
        .allow_origin(Any);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors);

    router.layer(middleware).with_state(state)
}
