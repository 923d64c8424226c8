use crate::error::NativeMessagingError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest describing how to launch a native messaging host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostManifest {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Host executable, relative paths are resolved against the manifest directory
    pub path: PathBuf,

    /// Transport type, only `stdio` exists
    #[serde(rename = "type")]
    pub kind: String,

    /// Extension ids allowed to talk to this host
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

/// A manifest that passed every check for a given host and extension
#[derive(Debug, Clone)]
pub struct ResolvedHost {
    pub manifest_path: PathBuf,
    pub executable: PathBuf,
    pub manifest: HostManifest,
}

/// Directories searched for host manifests, most specific first
pub fn default_manifest_dirs() -> Vec<PathBuf> {
    let mut found = Vec::new();

    if cfg!(target_os = "macos") {
        if let Some(home) = dirs::home_dir() {
            found.push(home.join("Library/Application Support/Mozilla/NativeMessagingHosts"));
        }
        found.push(PathBuf::from(
            "/Library/Application Support/Mozilla/NativeMessagingHosts",
        ));
    } else if cfg!(target_os = "windows") {
        if let Some(appdata) = dirs::config_dir() {
            found.push(appdata.join("Mozilla").join("NativeMessagingHosts"));
        }
    } else {
        if let Some(home) = dirs::home_dir() {
            found.push(home.join(".mozilla/native-messaging-hosts"));
        }
        found.push(PathBuf::from("/usr/lib/mozilla/native-messaging-hosts"));
        found.push(PathBuf::from("/usr/lib64/mozilla/native-messaging-hosts"));
    }

    found
}

/// Host names are dot-separated runs of `[A-Za-z0-9_]`
pub fn is_valid_host_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Find, load and check the manifest for `host`
pub async fn resolve(
    host: &str,
    extension_id: &str,
    dirs: &[PathBuf],
) -> Result<ResolvedHost, NativeMessagingError> {
    if !is_valid_host_name(host) {
        return Err(NativeMessagingError::HostNotFound(host.to_string()));
    }

    let file_name = format!("{host}.json");
    for dir in dirs {
        let candidate = dir.join(&file_name);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            ::log::debug!("Found manifest for {} at {}", host, candidate.display());
            return load(&candidate, host, extension_id).await;
        }
        ::log::trace!("No manifest for {} in {}", host, dir.display());
    }

    Err(NativeMessagingError::HostNotFound(host.to_string()))
}

/// Load a manifest file and check it against the requested host and extension
pub async fn load(
    manifest_path: &Path,
    host: &str,
    extension_id: &str,
) -> Result<ResolvedHost, NativeMessagingError> {
    let invalid = |reason: String| NativeMessagingError::InvalidManifest {
        path: manifest_path.to_path_buf(),
        reason,
    };

    let contents = tokio::fs::read_to_string(manifest_path).await?;
    let manifest: HostManifest =
        serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

    if manifest.name != host {
        return Err(invalid(format!(
            "name {:?} does not match host {:?}",
            manifest.name, host
        )));
    }
    if manifest.kind != "stdio" {
        return Err(invalid(format!("unsupported type {:?}", manifest.kind)));
    }
    if !manifest.allowed_extensions.iter().any(|id| id == extension_id) {
        return Err(NativeMessagingError::NotPermitted {
            host: host.to_string(),
            extension_id: extension_id.to_string(),
        });
    }

    let executable = if manifest.path.is_absolute() {
        manifest.path.clone()
    } else {
        manifest_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&manifest.path)
    };

    Ok(ResolvedHost {
        manifest_path: manifest_path.to_path_buf(),
        executable,
        manifest,
    })
}
