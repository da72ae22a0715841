#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use dqa_core::http_api::{self, AppState};

    env_logger::init();

    let addr: SocketAddr = std::env::var("DQA_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let state = match std::env::var("DQA_DB_PATH") {
        #[cfg(feature = "sqlite")]
        Ok(path) => {
            log::info!("using sqlite document store at {path}");
            AppState::new(Arc::new(dqa_core::SqliteDocumentStore::new(path)?))
        }
        _ => {
            log::info!("using in-memory document store");
            AppState::in_memory()
        }
    };

    log::info!("dqa HTTP API listening on http://{addr}");
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
