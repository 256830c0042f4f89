//! Configuration file watcher for hot reload.
//!
//! Watches the directory holding the file rather than the file itself, so
//! editors that save by renaming a temporary file still trigger a reload.
//! Events whose file content matches the last applied version are dropped;
//! notify commonly reports one save as several events.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::BridgeConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<BridgeConfig>,
    last_applied: Arc<Mutex<Option<String>>>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<BridgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let current = std::fs::read_to_string(path).ok();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
                last_applied: Arc::new(Mutex::new(current)),
            },
            update_rx,
        )
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let path = self.path.clone();
        let tx = self.update_tx;
        let last_applied = self.last_applied;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant {
                        reload(&path, &last_applied, &tx);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn reload(
    path: &Path,
    last_applied: &Mutex<Option<String>>,
    tx: &mpsc::UnboundedSender<BridgeConfig>,
) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Config file unreadable, skipping reload");
            return;
        }
    };

    let mut last = match last_applied.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if last.as_deref() == Some(content.as_str()) {
        return;
    }

    match parse_config(&content) {
        Ok(config) => {
            tracing::info!(path = %path.display(), services = config.services.len(), "Config reloaded");
            *last = Some(content);
            let _ = tx.send(config);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current routes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bridge-watch-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bridge.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    const ONE_SERVICE: &str = r#"
[[services]]
interface_name = "UserProvider"
path = "/users"

[[services.methods]]
method_name = "GetUser"
path = "/{id}"
path_params = "0:id"
"#;

    #[test]
    fn test_reload_skips_unchanged_and_invalid() {
        let path = temp_config("reload", ONE_SERVICE);
        let (watcher, mut rx) = ConfigWatcher::new(&path);

        // Same content as at construction.
        reload(&path, &watcher.last_applied, &watcher.update_tx);
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "[listener]\nmax_body_size = 0\n").unwrap();
        reload(&path, &watcher.last_applied, &watcher.update_tx);
        assert!(rx.try_recv().is_err());

        std::fs::write(&path, "[listener]\nbind_address = \"127.0.0.1:9999\"\n").unwrap();
        reload(&path, &watcher.last_applied, &watcher.update_tx);
        let config = rx.try_recv().expect("valid change should be sent");
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert!(config.services.is_empty());
    }

    #[tokio::test]
    async fn test_watcher_sends_on_change() {
        let path = temp_config("watch", "");
        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&path, ONE_SERVICE).unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no reload within timeout")
            .expect("channel closed");
        assert_eq!(config.services[0].interface_name, "UserProvider");
    }
}
