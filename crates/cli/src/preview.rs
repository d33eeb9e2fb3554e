use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Instant,
};

use axum::{handler::HandlerWithoutStateExt, http::StatusCode, Router};
use tokio::net::TcpSocket;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{debug, Level};

use crate::server_utils::{find_open_port, log_server_start, CustomOnResponse};

/// Serves an already-built site from the output directory, without any
/// rendering or live reload.
pub async fn start_preview_server(dist_dir: PathBuf, host: bool) {
    let start_time = Instant::now();

    async fn handle_404() -> (StatusCode, &'static str) {
        (StatusCode::NOT_FOUND, "Not found")
    }

    let service = handle_404.into_service();
    let serve_dir = ServeDir::new(dist_dir).not_found_service(service);

    let router = Router::new().fallback_service(serve_dir).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(CustomOnResponse),
    );

    let addr = if host {
        IpAddr::from([0, 0, 0, 0])
    } else {
        IpAddr::from([127, 0, 0, 1])
    };
    let port = find_open_port(&addr, 1864).await;
    let socket = TcpSocket::new_v4().unwrap();

    let socket_addr = SocketAddr::new(addr, port);
    socket.bind(socket_addr).unwrap();

    let listener = socket.listen(1024).unwrap();

    debug!("listening on {}", listener.local_addr().unwrap());

    log_server_start(start_time, host, listener.local_addr().unwrap(), "Preview");

    axum::serve(listener, router.into_make_service())
        .await
        .unwrap();
}
