use super::{MAX_FROM_HOST, manifest, read_message, write_message};
use crate::config::RelayConfig;
use crate::error::NativeMessagingError;
use crate::platform::NativeMessenger;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// How long a host may keep running after it has answered
const HOST_EXIT_GRACE: Duration = Duration::from_secs(1);

/// Talks to native hosts by spawning them and exchanging one message over stdio
#[derive(Debug, Clone)]
pub struct StdioNativeMessenger {
    extension_id: String,
    manifest_dirs: Vec<PathBuf>,
}

impl StdioNativeMessenger {
    /// Messenger presenting `extension_id` and searching the platform manifest directories
    pub fn new(extension_id: impl Into<String>) -> Self {
        Self {
            extension_id: extension_id.into(),
            manifest_dirs: manifest::default_manifest_dirs(),
        }
    }

    /// Only look for manifests in `dir`
    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dirs = vec![dir.into()];
        self
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        let messenger = Self::new(config.extension_id.clone());
        match &config.manifest_dir {
            Some(dir) => messenger.with_manifest_dir(dir.clone()),
            None => messenger,
        }
    }

    pub fn manifest_dirs(&self) -> &[PathBuf] {
        &self.manifest_dirs
    }
}

#[async_trait]
impl NativeMessenger for StdioNativeMessenger {
    async fn send_native_message(
        &self,
        host: &str,
        message: &serde_json::Value,
    ) -> Result<serde_json::Value, NativeMessagingError> {
        let resolved = manifest::resolve(host, &self.extension_id, &self.manifest_dirs).await?;
        ::log::debug!(
            "Starting native host {} from {}",
            host,
            resolved.executable.display()
        );

        let mut child = Command::new(&resolved.executable)
            .arg(&resolved.manifest_path)
            .arg(&self.extension_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| NativeMessagingError::Spawn {
                host: host.to_string(),
                source,
            })?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(NativeMessagingError::Disconnected(host.to_string()));
        };

        let send = async move {
            write_message(&mut stdin, message).await?;
            // Closing stdin tells the host no more messages follow
            drop(stdin);
            Ok::<_, NativeMessagingError>(())
        };
        let receive = read_message(&mut stdout, MAX_FROM_HOST);

        let (_, response) = tokio::try_join!(send, receive)?;

        tokio::spawn(reap(child, host.to_string()));

        response.ok_or_else(|| NativeMessagingError::Disconnected(host.to_string()))
    }
}

/// Wait for a host that has already answered, killing it if it lingers
async fn reap(mut child: Child, host: String) {
    match tokio::time::timeout(HOST_EXIT_GRACE, child.wait()).await {
        Ok(Ok(status)) => ::log::debug!("Native host {} exited with {}", host, status),
        Ok(Err(e)) => ::log::warn!("Failed to reap native host {}: {}", host, e),
        Err(_) => {
            ::log::debug!("Native host {} still running after reply, killing it", host);
            if let Err(e) = child.kill().await {
                ::log::warn!("Failed to kill native host {}: {}", host, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config() {
        let config = RelayConfig::default();
        let messenger = StdioNativeMessenger::from_config(&config);
        assert_eq!(messenger.manifest_dirs(), manifest::default_manifest_dirs().as_slice());

        let config = RelayConfig {
            manifest_dir: Some(PathBuf::from("/tmp/hosts")),
            ..RelayConfig::default()
        };
        let messenger = StdioNativeMessenger::from_config(&config);
        assert_eq!(messenger.manifest_dirs(), &[PathBuf::from("/tmp/hosts")]);
    }

    #[tokio::test]
    async fn test_missing_host_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let messenger = StdioNativeMessenger::new("foxhole@localhost").with_manifest_dir(dir.path());

        let result = messenger
            .send_native_message("foxhole_host", &json!({"title": "A"}))
            .await;
        assert!(matches!(result, Err(NativeMessagingError::HostNotFound(_))));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn install_host(dir: &Path, script: &str) {
            let host_path = dir.join("host.sh");
            std::fs::write(&host_path, script).unwrap();
            std::fs::set_permissions(&host_path, std::fs::Permissions::from_mode(0o755)).unwrap();

            let manifest = json!({
                "name": "foxhole_host",
                "description": "test host",
                "path": "host.sh",
                "type": "stdio",
                "allowed_extensions": ["foxhole@localhost"]
            });
            std::fs::write(dir.join("foxhole_host.json"), manifest.to_string()).unwrap();
        }

        #[tokio::test]
        async fn test_echo_host_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            // Echoes the framed message straight back
            install_host(dir.path(), "#!/bin/sh\nexec cat\n");

            let messenger =
                StdioNativeMessenger::new("foxhole@localhost").with_manifest_dir(dir.path());
            let message = json!({"title": "A", "text": "hello", "url": "https://a"});
            let response = messenger
                .send_native_message("foxhole_host", &message)
                .await
                .unwrap();
            assert_eq!(response, message);
        }

        #[tokio::test]
        async fn test_silent_host_is_disconnected() {
            let dir = tempfile::tempdir().unwrap();
            install_host(dir.path(), "#!/bin/sh\ncat > /dev/null\n");

            let messenger =
                StdioNativeMessenger::new("foxhole@localhost").with_manifest_dir(dir.path());
            let result = messenger
                .send_native_message("foxhole_host", &json!({"title": "A"}))
                .await;
            assert!(matches!(result, Err(NativeMessagingError::Disconnected(_))));
        }

        #[tokio::test]
        async fn test_lingering_host_does_not_hold_the_reply() {
            let dir = tempfile::tempdir().unwrap();
            // Answers, then keeps running well past the reply
            install_host(dir.path(), "#!/bin/sh\ncat\nsleep 5\n");

            let messenger =
                StdioNativeMessenger::new("foxhole@localhost").with_manifest_dir(dir.path());
            let message = json!({"title": "A"});
            let response = tokio::time::timeout(
                Duration::from_secs(2),
                messenger.send_native_message("foxhole_host", &message),
            )
            .await
            .expect("reply should not wait for the host to exit")
            .unwrap();
            assert_eq!(response, message);
        }
    }
}
