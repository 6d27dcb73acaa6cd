use crate::Result;
use serde_json::json;
use tracing::warn;
use url::Url;

/// Best-effort play-count reporting to the backend.
///
/// Fired once per game load. Failures are logged and never surfaced to the
/// user or retried; a missed increment is not worth interrupting play for.
#[derive(Clone)]
pub struct PlayCountReporter {
    http: reqwest::Client,
    backend: Url,
}

impl PlayCountReporter {
    pub fn new(backend: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend,
        }
    }

    /// Report one play of `title`.
    pub async fn report(&self, title: &str) {
        if let Err(err) = self.try_report(title).await {
            warn!(title, error = %err, "failed to report play count");
        }
    }

    async fn try_report(&self, title: &str) -> Result<()> {
        let url = self.backend.join("api/games")?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "title": title }))
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(title, status = %response.status(), "play count report rejected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State as AxumState;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::time::{sleep, Duration};

    async fn serve_router(router: Router) -> (Url, tokio::task::JoinHandle<()>) {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let actual_addr = listener.local_addr().unwrap();
        let base_url: Url = format!("http://{actual_addr}").parse().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap();
        });

        sleep(Duration::from_millis(50)).await;
        (base_url, handle)
    }

    #[tokio::test]
    async fn report_posts_the_game_title() {
        let bodies: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/api/games",
                post(
                    |AxumState(bodies): AxumState<Arc<Mutex<Vec<serde_json::Value>>>>,
                     Json(body): Json<serde_json::Value>| async move {
                        bodies.lock().unwrap().push(body);
                        StatusCode::OK
                    },
                ),
            )
            .with_state(bodies.clone());

        let (base_url, handle) = serve_router(router).await;
        let reporter = PlayCountReporter::new(base_url);
        reporter.report("Viral Defense").await;

        let bodies = bodies.lock().unwrap().clone();
        assert_eq!(bodies, vec![json!({ "title": "Viral Defense" })]);
        handle.abort();
    }

    #[tokio::test]
    async fn failures_are_swallowed_and_not_retried() {
        let hits = Arc::new(Mutex::new(0usize));
        let router = Router::new()
            .route(
                "/api/games",
                post(
                    |AxumState(hits): AxumState<Arc<Mutex<usize>>>| async move {
                        *hits.lock().unwrap() += 1;
                        StatusCode::INTERNAL_SERVER_ERROR
                    },
                ),
            )
            .with_state(hits.clone());

        let (base_url, handle) = serve_router(router).await;
        let reporter = PlayCountReporter::new(base_url);
        // Must not panic or error out.
        reporter.report("Viral Defense").await;
        assert_eq!(*hits.lock().unwrap(), 1);
        handle.abort();
    }

    #[tokio::test]
    async fn unreachable_backend_is_tolerated() {
        // Nothing listens here.
        let reporter = PlayCountReporter::new("http://127.0.0.1:9".parse().unwrap());
        reporter.report("Viral Defense").await;
    }
}
