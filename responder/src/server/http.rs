//! Admin HTTP server for health checks and metrics

use crate::metrics;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Serve /healthz and /metrics on an already-bound listener until `shutdown`
/// is cancelled.
pub async fn serve_admin(
    listener: TcpListener,
    shutdown: CancellationToken,
) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(|_| async {
        Ok::<_, Infallible>(service_fn(|req: Request<Body>| async move {
            Ok::<_, Infallible>(handle(&req))
        }))
    });

    let server = Server::from_tcp(listener)?.serve(make_svc);
    tracing::info!("Admin HTTP server listening on {}", server.local_addr());
    server
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

fn handle(req: &Request<Body>) -> Response<Body> {
    let path = req.uri().path();
    let response = match path {
        "/healthz" => Response::new(Body::from("ok\n")),
        "/metrics" => {
            let mut response = Response::new(Body::from(metrics::encode_metrics()));
            response.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        _ => {
            let mut response = Response::new(Body::from("not found\n"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    };

    tracing::debug!(path = %path, status = response.status().as_u16(), "admin request");
    response
}
