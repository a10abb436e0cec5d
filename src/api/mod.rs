use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hyper::server::conn::Http;
use hyper::Body;
use routerify::{RequestServiceBuilder, Router};
use tokio::net::TcpSocket;
use tokio::select;
use tokio::time::timeout;

use crate::global::GlobalState;
use crate::http::RouteError;

use self::error::ApiError;

pub mod auth;
pub mod error;
pub mod middleware;
pub mod request_context;
pub mod v1;

pub fn routes(global: &Arc<GlobalState>) -> Router<Body, RouteError<ApiError>> {
    let weak = Arc::downgrade(global);
    Router::builder()
        .data(weak)
        .err_handler_with_info(crate::http::error_handler::<ApiError>)
        // The CORS middleware adds the CORS headers to the response
        .middleware(middleware::cors::cors_middleware(global))
        // The auth middleware resolves the Authorization header into the
        // request context. It does not fail requests without a token, the
        // capability checks in the handlers do.
        .middleware(middleware::auth::auth_middleware(global))
        .scope("/v1", v1::routes(global))
        .build()
        .expect("failed to build router")
}

pub async fn run(global: Arc<GlobalState>) -> anyhow::Result<()> {
    let config = &global.config.api;

    tracing::info!("listening on {}", config.bind_address);
    let socket = if config.bind_address.is_ipv6() {
        TcpSocket::new_v6()?
    } else {
        TcpSocket::new_v4()?
    };

    socket.set_reuseaddr(true)?;
    socket.bind(config.bind_address)?;
    let listener = socket.listen(1024)?;

    let tls_acceptor = if let Some(tls) = &config.tls {
        tracing::info!("tls enabled");
        let cert = tokio::fs::read(&tls.cert).await.context("failed to read ssl cert")?;
        let key = tokio::fs::read(&tls.key)
            .await
            .context("failed to read ssl private key")?;

        let key = rustls_pemfile::pkcs8_private_keys(&mut io::BufReader::new(io::Cursor::new(key)))
            .next()
            .ok_or_else(|| anyhow::anyhow!("failed to find private key in private key file"))??
            .into();

        let certs =
            rustls_pemfile::certs(&mut io::BufReader::new(io::Cursor::new(cert))).collect::<Result<Vec<_>, _>>()?;

        Some(Arc::new(tokio_rustls::TlsAcceptor::from(Arc::new(
            rustls::ServerConfig::builder()
                .with_no_client_auth()
                .with_single_cert(certs, key)?,
        ))))
    } else {
        None
    };

    // The request service holds a Weak reference to the global state so that
    // open keep-alive connections cannot keep the state alive past shutdown.
    let request_service = RequestServiceBuilder::new(routes(&global)).expect("failed to build request service");

    loop {
        select! {
            _ = global.shutdown.cancelled() => {
                return Ok(());
            },
            r = listener.accept() => {
                let (socket, addr) = r?;

                let tls_acceptor = tls_acceptor.clone();
                let service = request_service.build(addr);

                tracing::debug!("accepted connection from {}", addr);

                tokio::spawn(async move {
                    if let Some(tls_acceptor) = tls_acceptor {
                        let Ok(Ok(socket)) = timeout(Duration::from_secs(5), tls_acceptor.accept(socket)).await else {
                            return;
                        };
                        tracing::debug!("tls handshake complete");
                        Http::new().serve_connection(socket, service).await.ok();
                    } else {
                        Http::new().serve_connection(socket, service).await.ok();
                    }
                });
            },
        }
    }
}
