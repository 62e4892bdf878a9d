use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use medverify_core::Principal;

use super::JwtVerifier;

/// Header naming the caller when token auth is disabled.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Tower layer that resolves the caller and stores it in the request
/// extensions as `Option<Principal>`.
#[derive(Clone)]
pub struct AuthLayer {
    verifier: Option<Arc<JwtVerifier>>,
}

impl AuthLayer {
    /// `None` disables token checks and trusts the `x-user-id` header.
    pub fn new(verifier: Option<Arc<JwtVerifier>>) -> Self {
        Self { verifier }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            verifier: self.verifier.clone(),
        }
    }
}

/// Tower service that authenticates requests.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    verifier: Option<Arc<JwtVerifier>>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let verifier = self.verifier.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let principal = match verifier {
                Some(verifier) => match bearer_token(&req) {
                    Some(token) => match verifier.verify(token) {
                        Ok(principal) => Some(principal),
                        Err(e) => {
                            tracing::debug!(error = %e, "bearer token rejected");
                            return Ok(unauthorized(&e));
                        }
                    },
                    None => None,
                },
                None => req
                    .headers()
                    .get(USER_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .filter(|id| !id.is_empty())
                    .map(|id| Principal::new(id, "header")),
            };

            req.extensions_mut().insert(principal);
            inner.call(req).await
        })
    }
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized(message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}
