use std::{
    io,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

pub(crate) mod server;

use carnet::ContentPipeline;
use notify_debouncer_full::{
    new_debouncer,
    notify::{event::ModifyKind, EventKind, RecursiveMode},
};
use server::WebSocketMessage;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub async fn start_dev_env(cwd: &str, host: bool) -> io::Result<()> {
    let start_time = Instant::now();
    info!(name: "dev", "Preparing dev environment…");

    // Watcher events carry absolute paths, so the pipeline root has to be
    // absolute too for change detection to match.
    let root = Path::new(cwd).canonicalize()?;
    let pipeline = Arc::new(ContentPipeline::new(root));

    // Warm the cache so the first request doesn't pay for the initial scan.
    match pipeline.posts() {
        Ok(posts) => info!(name: "content", "{} posts loaded", posts.len()),
        Err(err) => warn!(name: "content", "Initial content load failed: {}", err),
    }

    let (tx, rx) = std::sync::mpsc::channel();

    let mut debouncer = new_debouncer(Duration::from_millis(300), None, tx).map_err(io::Error::other)?;

    let content_dir = pipeline.content_dir();
    if content_dir.exists() {
        debouncer
            .watch(&content_dir, RecursiveMode::NonRecursive)
            .map_err(io::Error::other)?;
    } else {
        warn!(name: "dev", "{} does not exist, live reload is disabled until the server is restarted", content_dir.display());
    }

    let (tx_ws, _) = broadcast::channel::<WebSocketMessage>(100);

    let web_server_thread = tokio::spawn(server::start_dev_web_server(
        start_time,
        pipeline.clone(),
        tx_ws.clone(),
        host,
    ));

    for result in rx {
        match result {
            Ok(events) => {
                let mut content_changed = false;
                for event in &events {
                    match event.event.kind {
                        EventKind::Create(_)
                        | EventKind::Remove(_)
                        | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_)) => {
                            for path in &event.event.paths {
                                content_changed |= pipeline.on_content_changed(path);
                            }
                        }
                        _ => {}
                    }
                }

                if content_changed {
                    info!(name: "content", "Content changed, reloading…");
                    // Send fails when no browser is connected, which is fine.
                    let _ = tx_ws.send(WebSocketMessage {
                        data: "reload".to_string(),
                    });
                }
            }
            Err(errors) => errors
                .iter()
                .for_each(|error| warn!(name: "dev", "Watch error: {error:?}")),
        }
    }

    web_server_thread.await.unwrap();

    Ok(())
}
