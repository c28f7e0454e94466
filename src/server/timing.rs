//! Per-request latency logging

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    extract::{Query, Request},
    http::Uri,
    middleware::Next,
    response::Response,
};

/// Log `<ms> ms <METHOD> <path> <query>` once the response is ready
pub async fn log_latency(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let query = query_params(request.uri());

    let start = Instant::now();
    let response = next.run(request).await;
    let time_in_ms = start.elapsed().as_millis();

    tracing::info!("{} ms {} {} {:?}", time_in_ms, method, path, query);
    response
}

fn query_params(uri: &Uri) -> BTreeMap<String, String> {
    Query::<BTreeMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}
