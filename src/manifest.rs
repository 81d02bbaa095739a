use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name the extension passes to `sendNativeMessage`.
pub const HOST_NAME: &str = "com.bookmarkmanager.native";
const NATIVE_HOST_BIN: &str = "bookmark-native-host";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Browser {
    Chrome,
    Firefox,
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub name: &'static str,
    pub description: &'static str,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

impl Manifest {
    pub fn new(browser: Browser, host_path: &Path, allowed: &[String]) -> Self {
        let (allowed_origins, allowed_extensions) = match browser {
            Browser::Chrome => (Some(allowed.iter().map(|id| chrome_origin(id)).collect()), None),
            Browser::Firefox => (None, Some(allowed.to_vec())),
        };

        Manifest {
            name: HOST_NAME,
            description: "Bookmark Manager native messaging host",
            path: host_path.to_string_lossy().into_owned(),
            kind: "stdio",
            allowed_origins,
            allowed_extensions,
        }
    }
}

fn chrome_origin(id: &str) -> String {
    let id = id.trim_start_matches("chrome-extension://").trim_end_matches('/');
    format!("chrome-extension://{}/", id)
}

/// The native host binary installed next to the running executable.
pub fn default_host_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate current executable")?;
    let dir = exe
        .parent()
        .context("current executable has no parent directory")?;
    Ok(dir.join(format!("{}{}", NATIVE_HOST_BIN, std::env::consts::EXE_SUFFIX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chrome_manifest_uses_origins() {
        let allowed = vec!["abcdef".to_string(), "chrome-extension://ghijkl/".to_string()];
        let manifest = Manifest::new(Browser::Chrome, Path::new("/opt/bookmark-native-host"), &allowed);

        assert_eq!(
            serde_json::to_value(manifest).unwrap(),
            json!({
                "name": "com.bookmarkmanager.native",
                "description": "Bookmark Manager native messaging host",
                "path": "/opt/bookmark-native-host",
                "type": "stdio",
                "allowed_origins": ["chrome-extension://abcdef/", "chrome-extension://ghijkl/"]
            })
        );
    }

    #[test]
    fn test_firefox_manifest_uses_extension_ids() {
        let allowed = vec!["bookmarks@example.org".to_string()];
        let manifest = Manifest::new(Browser::Firefox, Path::new("/opt/host"), &allowed);
        let value = serde_json::to_value(manifest).unwrap();

        assert_eq!(value["allowed_extensions"], json!(["bookmarks@example.org"]));
        assert!(value.get("allowed_origins").is_none());
    }

    #[test]
    fn test_default_host_path_sits_next_to_executable() {
        let path = default_host_path().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(path.parent(), exe.parent());
        assert!(path.to_string_lossy().contains(NATIVE_HOST_BIN));
    }
}
