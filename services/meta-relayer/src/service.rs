// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Relayer Service Module 🕸️
//!
//! Builds the HTTP server the relayer runs for its whole lifetime.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use meta_relayer_context::RelayerContext;

/// Hardening headers set on every response.
fn security_headers() -> [(HeaderName, HeaderValue); 9] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::X_XSS_PROTECTION, "0"),
        (header::X_DNS_PREFETCH_CONTROL, "off"),
        (header::REFERRER_POLICY, "no-referrer"),
        (
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=15552000; includeSubDomains",
        ),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            "none",
        ),
        (HeaderName::from_static("x-download-options"), "noopen"),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            "same-origin",
        ),
    ]
    .map(|(name, value)| (name, HeaderValue::from_static(value)))
}

/// The relayer's routes with security headers, CORS and request tracing
/// applied.
pub fn build_router(ctx: RelayerContext) -> Router {
    let routes = security_headers().into_iter().fold(
        meta_relayer_handlers::routes(),
        |routes, (name, value)| {
            routes.layer(SetResponseHeaderLayer::overriding(name, value))
        },
    );
    routes
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(ctx))
}

/// Sets up the web server for the relayer, routing (endpoint queries /
/// requests mapped to handled code). Allows clients to interact with the
/// relayer.
///
/// The server stops accepting connections once [`RelayerContext::shutdown`]
/// is called, and finishes the requests already in flight.
///
/// Returns `Ok((addr, server))` on success.
///
/// # Arguments
///
/// * `ctx` - RelayContext reference that holds the configuration
pub fn build_web_services(
    ctx: RelayerContext,
) -> crate::Result<(SocketAddr, impl Future<Output = crate::Result<()>>)> {
    let socket_addr =
        SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), ctx.config.port);
    let mut shutdown = ctx.shutdown_signal();
    let server = axum::Server::try_bind(&socket_addr)?
        .serve(build_router(ctx).into_make_service());
    let addr = server.local_addr();
    let server = server.with_graceful_shutdown(async move {
        shutdown.recv().await;
        tracing::debug!("server stops accepting connections");
    });
    Ok((addr, async move {
        server.await?;
        Ok(())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use meta_relayer_chain_backends::MockedChainReader;
    use meta_relayer_store::InMemoryStore;
    use tower::ServiceExt;

    fn ctx(port: u16) -> RelayerContext {
        let config = serde_json::from_value(serde_json::json!({
            "port": port,
            "evm": {
                "http-endpoint": "http://localhost:8545",
                "token-address": "0xc00e94cb662c3520282e6f5717214004a7f26888",
                "relay-address": "0xf61d8eef3f479dfa24beaa46bf6f235e6e2f7af8",
                "governor-address": "0xc0da01a04c3f3e0be433606045bb7017a7323e38"
            }
        }))
        .unwrap();
        RelayerContext::builder()
            .config(config)
            .store(Arc::new(InMemoryStore::default()))
            .chain(Arc::new(MockedChainReader::new()))
            .build()
    }

    #[tokio::test]
    async fn any_origin_may_call() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/canDelegate")
            .header(header::ORIGIN, "https://vote.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let res = build_router(ctx(0)).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = build_router(ctx(0)).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
        assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
        assert_eq!(headers["x-permitted-cross-domain-policies"], "none");
    }

    #[tokio::test]
    async fn server_drains_on_shutdown() {
        let ctx = ctx(0);
        let (addr, server) = build_web_services(ctx.clone()).unwrap();
        assert_ne!(addr.port(), 0);
        let handle = tokio::spawn(server);
        ctx.shutdown();
        let res = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            handle,
        )
        .await
        .unwrap()
        .unwrap();
        assert!(res.is_ok());
    }
}
