use mc_core::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;

const POLL_INTERVAL: Duration = Duration::from_millis(800);

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub event_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        let config = match Config::load(&root) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "could not load config, using defaults");
                Config::default()
            }
        };
        Self::with_config(root, config)
    }

    pub fn with_config(root: PathBuf, config: Config) -> Self {
        let (tx, _) = broadcast::channel(64);
        let state = Self {
            root,
            config: Arc::new(config),
            event_tx: tx.clone(),
        };

        // Poll mtimes so that edits made by the CLI or other tools also
        // reach SSE subscribers. Only spawned inside a Tokio runtime.
        if tokio::runtime::Handle::try_current().is_ok() {
            let watched = state.watched_paths();
            tokio::spawn(async move {
                let mut last: Option<Vec<Option<SystemTime>>> = None;
                loop {
                    tokio::time::sleep(POLL_INTERVAL).await;
                    let mut current = Vec::with_capacity(watched.len());
                    for path in &watched {
                        let mtime = match tokio::fs::metadata(path).await {
                            Ok(meta) => meta.modified().ok(),
                            Err(_) => None,
                        };
                        current.push(mtime);
                    }
                    if last.as_ref().is_some_and(|prev| *prev != current) {
                        let _ = tx.send(());
                    }
                    last = Some(current);
                }
            });
        }

        state
    }

    /// Files whose modification marks a dashboard change: the activity log,
    /// the board, and the top level of the docs root.
    fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![
            mc_core::paths::activity_path(&self.root),
            mc_core::paths::board_path(&self.root),
        ];
        if let Ok(docs) = self.config.docs_root(&self.root) {
            paths.push(docs);
        }
        paths
    }

    pub fn notify(&self) {
        let _ = self.event_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_stores_root_and_defaults() {
        let state = AppState::new(PathBuf::from("/tmp/mc-test-missing"));
        assert_eq!(state.root, PathBuf::from("/tmp/mc-test-missing"));
        assert_eq!(state.config.docs_dir, "documents");
    }

    #[test]
    fn watched_paths_cover_log_board_and_docs() {
        let state = AppState::new(PathBuf::from("/tmp/mc"));
        let paths = state.watched_paths();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with(".mission-control/activities.jsonl"));
        assert!(paths[1].ends_with(".mission-control/board.yaml"));
        assert_eq!(paths[2], PathBuf::from("/tmp/mc/documents"));
    }
}
