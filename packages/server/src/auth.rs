//! Service-to-service authentication gate.
//!
//! Every request except `GET /health`, `GET /metrics`, and CORS preflight
//! must present the shared secret in `X-Service-Auth` when one is
//! configured. The comparison is constant-time to avoid leaking how many
//! leading bytes of a guess matched.

use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::Method;
use actix_web::{Error, HttpResponse};
use futures::future::{LocalBoxFuture, Ready, ready};
use subtle::ConstantTimeEq as _;

/// Header carrying the shared service secret.
pub const AUTH_HEADER: &str = "X-Service-Auth";

/// Paths monitoring systems may hit without credentials.
const EXEMPT_PATHS: &[&str] = &["/health", "/metrics"];

/// Middleware factory for the service gate. A `None` secret disables
/// authentication entirely (local development).
pub struct ServiceGate {
    secret: Option<Rc<str>>,
}

impl ServiceGate {
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.map(Rc::from),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ServiceGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ServiceGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ServiceGateMiddleware {
            service: Rc::new(service),
            secret: self.secret.clone(),
        }))
    }
}

pub struct ServiceGateMiddleware<S> {
    service: Rc<S>,
    secret: Option<Rc<str>>,
}

impl<S, B> Service<ServiceRequest> for ServiceGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Preflight never authenticates and never reaches a handler. The
        // CORS middleware sits outside this one and has already attached
        // its headers by the time the response passes back through it.
        if req.method() == Method::OPTIONS {
            let res = req
                .into_response(HttpResponse::Ok().finish())
                .map_into_right_body();
            return Box::pin(ready(Ok(res)));
        }

        let exempt = EXEMPT_PATHS.contains(&req.path());
        if !exempt {
            if let Some(secret) = self.secret.as_deref() {
                let provided = req
                    .headers()
                    .get(AUTH_HEADER)
                    .and_then(|value| value.to_str().ok());

                match provided {
                    None => return reject(req, "Missing X-Service-Auth header"),
                    Some(candidate)
                        if bool::from(candidate.as_bytes().ct_eq(secret.as_bytes())) => {}
                    Some(_) => return reject(req, "Invalid service authentication"),
                }
            }
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

fn reject<B>(
    req: ServiceRequest,
    message: &'static str,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
    let res = req
        .into_response(HttpResponse::Unauthorized().body(message))
        .map_into_right_body();
    Box::pin(ready(Ok(res)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::{Method, StatusCode, header};
    use actix_web::test;

    use crate::test_support::{TEST_ORIGIN, build_app, test_state};

    #[actix_web::test]
    async fn gate_requires_the_shared_secret() {
        let state = test_state(Some("s3cret")).await;
        let app = test::init_service(build_app(&state)).await;

        let missing = test::TestRequest::get().uri("/countries").to_request();
        let res = test::call_service(&app, missing).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        // Differs only in the last byte.
        let wrong = test::TestRequest::get()
            .uri("/countries")
            .insert_header(("X-Service-Auth", "s3creT"))
            .to_request();
        let res = test::call_service(&app, wrong).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let correct = test::TestRequest::get()
            .uri("/countries")
            .insert_header(("X-Service-Auth", "s3cret"))
            .to_request();
        let res = test::call_service(&app, correct).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn health_and_metrics_skip_the_gate() {
        let state = test_state(Some("s3cret")).await;
        let app = test::init_service(build_app(&state)).await;

        for path in ["/health", "/metrics"] {
            let res =
                test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
            assert_eq!(res.status(), StatusCode::OK, "GET {path} without secret");
        }
    }

    #[actix_web::test]
    async fn preflight_bypasses_the_gate_with_cors_headers() {
        let state = test_state(Some("s3cret")).await;
        let app = test::init_service(build_app(&state)).await;

        for path in ["/countries", "/boundaries/batch-lookup", "/landmarks"] {
            let req = test::TestRequest::default()
                .method(Method::OPTIONS)
                .uri(path)
                .insert_header((header::ORIGIN, TEST_ORIGIN))
                .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK, "preflight on {path}");
            assert_eq!(
                res.headers()
                    .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                    .and_then(|v| v.to_str().ok()),
                Some(TEST_ORIGIN),
                "allow-origin on {path}"
            );
        }
    }

    #[actix_web::test]
    async fn no_configured_secret_disables_the_gate() {
        let state = test_state(None).await;
        let app = test::init_service(build_app(&state)).await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/countries").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
