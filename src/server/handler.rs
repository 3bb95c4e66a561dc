// src/server/handler.rs
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

use crate::health::Aggregator;

/// Serves the health report on the profile's route.
#[derive(Clone)]
pub struct RequestHandler {
    aggregator: Arc<Aggregator>,
    route: Arc<str>,
}

impl RequestHandler {
    pub fn new(aggregator: Arc<Aggregator>, route: impl Into<Arc<str>>) -> Self {
        Self {
            aggregator,
            route: route.into(),
        }
    }

    async fn respond(aggregator: &Aggregator, route: &str, req: Request<Body>) -> Response<Body> {
        if req.uri().path() != route {
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }
        if req.method() != Method::GET && req.method() != Method::HEAD {
            let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        // Always 200: the monitor reads health from the body alone.
        let report = aggregator.report().await;
        match serde_json::to_vec(&report) {
            Ok(body) => {
                let mut response = Response::new(Body::from(body));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Err(err) => {
                tracing::error!(%err, "failed to serialize health report");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

pub(crate) fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let aggregator = self.aggregator.clone();
        let route = self.route.clone();
        Box::pin(async move { Ok(Self::respond(&aggregator, &route, req).await) })
    }
}
