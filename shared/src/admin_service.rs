use crate::http::{plain_response, status_response};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Operational endpoints kept off the public listener. `/health` answers
/// whenever the process is serving; `/ready` additionally consults a
/// caller-supplied readiness check.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }
}

impl<F, E> Service<Request<Incoming>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + Sync + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let is_ready = (self.is_ready)();

        Box::pin(async move {
            let response = match req.uri().path() {
                "/health" => plain_response("ok\n"),
                "/ready" if is_ready => plain_response("ok\n"),
                "/ready" => status_response(StatusCode::SERVICE_UNAVAILABLE),
                _ => status_response(StatusCode::NOT_FOUND),
            };
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::run_http_service;
    use http_body_util::{BodyExt, Empty};
    use hyper_util::client::legacy::Client;
    use hyper_util::client::legacy::connect::HttpConnector;
    use hyper_util::rt::TokioExecutor;
    use tokio::net::TcpListener;

    #[derive(thiserror::Error, Debug)]
    enum ServeError {
        #[error("io error: {0}")]
        Io(#[from] std::io::Error),
    }

    async fn start_admin<F>(is_ready: F) -> u16
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let _ = run_http_service::<_, ServeError>(listener, AdminService::new(is_ready)).await;
        });

        port
    }

    async fn get(port: u16, path: &str) -> (StatusCode, String) {
        let client: Client<HttpConnector, Empty<Bytes>> =
            Client::builder(TokioExecutor::new()).build_http();
        let uri: hyper::Uri = format!("http://127.0.0.1:{port}{path}").parse().unwrap();
        let response = client.get(uri).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_health_always_ok() {
        let port = start_admin(|| false).await;

        let (status, body) = get(port, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok\n");
    }

    #[tokio::test]
    async fn test_ready_reflects_readiness_check() {
        let ready_port = start_admin(|| true).await;
        let unready_port = start_admin(|| false).await;

        let (status, _) = get(ready_port, "/ready").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(unready_port, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let port = start_admin(|| true).await;

        let (status, _) = get(port, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
