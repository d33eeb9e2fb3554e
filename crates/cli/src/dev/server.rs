use axum::{
    body::{to_bytes, Body},
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    handler::HandlerWithoutStateExt,
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpSocket, signal, sync::broadcast};
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{debug, error, Level};

use axum::extract::connect_info::ConnectInfo;
use carnet::{templates, ContentPipeline, DEV_STYLESHEET};
use futures::{stream::StreamExt, SinkExt};

use crate::server_utils::{find_open_port, log_server_start, CustomOnResponse};

#[derive(Clone, Debug)]
pub struct WebSocketMessage {
    pub data: String,
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<ContentPipeline>,
    tx: broadcast::Sender<WebSocketMessage>,
}

pub async fn start_dev_web_server(
    start_time: Instant,
    pipeline: Arc<ContentPipeline>,
    tx: broadcast::Sender<WebSocketMessage>,
    host: bool,
) {
    async fn handle_404() -> (StatusCode, &'static str) {
        (StatusCode::NOT_FOUND, "Not found")
    }

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

    // Anything the content routes don't claim is served from the static
    // directory, exactly as the emitted site would serve it.
    let service = handle_404.into_service();
    let serve_dir = ServeDir::new("static").not_found_service(service);

    let state = AppState { pipeline, tx };

    let router = Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            intercept_content_routes,
        ))
        .layer(middleware::from_fn(add_dev_client_script))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(CustomOnResponse),
        )
        .with_state(state);

    log_server_start(
        start_time,
        host,
        listener.local_addr().unwrap(),
        "Development",
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();
}

/// Renders the content routes straight from the pipeline, so edits show up
/// without a build step. Everything else falls through to the next service.
async fn intercept_content_routes(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if path == "/posts" || path == "/posts/" {
        return match state.pipeline.posts_metadata() {
            Ok(summaries) => {
                Html(templates::archive_page(&summaries, DEV_STYLESHEET).into_string())
                    .into_response()
            }
            Err(err) => content_error(&err),
        };
    }

    if path == "/api/posts.json" {
        return match state.pipeline.posts_metadata() {
            Ok(summaries) => Json(summaries).into_response(),
            Err(err) => content_error(&err),
        };
    }

    if let Some(slug) = detail_slug(path) {
        match state.pipeline.find(slug) {
            Ok(Some(post)) => {
                return Html(templates::post_page(&post, DEV_STYLESHEET, None).into_string())
                    .into_response();
            }
            // An unknown slug falls through to the static files and their 404.
            Ok(None) => {}
            Err(err) => return content_error(&err),
        }
    }

    next.run(req).await
}

/// Matches `/posts/<slug>` and `/posts/<slug>/` for well-formed slugs.
fn detail_slug(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/posts/")?;
    let slug = rest.strip_suffix('/').unwrap_or(rest);

    let well_formed = !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');

    well_formed.then_some(slug)
}

fn content_error(err: &carnet::errors::ContentError) -> Response {
    error!(name: "content", "{}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

async fn add_dev_client_script(req: Request, next: Next) -> Response {
    let uri = req.uri().clone();
    let mut res = next.run(req).await;

    res.extensions_mut().insert(uri);

    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"));

    if is_html {
        let (mut parts, body) = res.into_parts();
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(_) => return Response::from_parts(parts, Body::empty()),
        };

        let mut body = String::from_utf8_lossy(&bytes).into_owned();
        body.push_str(&format!("<script>{}</script>", include_str!("./client.js")));

        // The body grew, so the original length header no longer applies.
        parts.headers.remove(header::CONTENT_LENGTH);

        return Response::from_parts(parts, Body::from(body));
    }

    res
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    debug!("`{addr} connected.");
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state.tx))
}

async fn handle_socket(
    socket: WebSocket,
    who: SocketAddr,
    tx: broadcast::Sender<WebSocketMessage>,
) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = tx.subscribe();

    tokio::select! {
        _ = async {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(_) => {}
                    Message::Binary(_) => {}
                    _ => {}
                }
            }
        } => {},
        _ = async {
            while let Ok(msg) = rx.recv().await {
                debug!("Forwarding message to client: {0}", msg.data);
                let _ = sender.send(Message::Text(msg.data.into())).await;
            }
        } => {},
    }

    // returning from the handler closes the websocket connection
    debug!("Websocket context {who} destroyed");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::detail_slug;

    #[test]
    fn detail_slug_accepts_trailing_slash() {
        assert_eq!(detail_slug("/posts/hello-world"), Some("hello-world"));
        assert_eq!(detail_slug("/posts/hello-world/"), Some("hello-world"));
        assert_eq!(detail_slug("/posts/post-2"), Some("post-2"));
    }

    #[test]
    fn detail_slug_rejects_malformed_paths() {
        assert_eq!(detail_slug("/posts/"), None);
        assert_eq!(detail_slug("/posts/Hello"), None);
        assert_eq!(detail_slug("/posts/a/b"), None);
        assert_eq!(detail_slug("/posts/has_underscore"), None);
        assert_eq!(detail_slug("/api/posts.json"), None);
        assert_eq!(detail_slug("/other"), None);
    }
}
