//! Type definitions for installation requests.
//!
//! This module defines the resolved request record shared by every
//! installation phase, the clear policy applied to a prior installation,
//! and the proxy configuration read from the environment.

use crate::install::Notifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The Ace release installed when no version is requested.
pub const VERSION_LATEST: &str = "1.3.3";

/// Default archive location; `{version}` is replaced with the release tag.
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/ajaxorg/ace-builds/archive/v{version}.zip";

/// Placeholder substituted in archive URL templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Directory (relative to the target) receiving the minified assets.
pub const INSTALL_DIR: &str = "acemin";

/// File whose presence marks an existing installation.
pub const MARKER_FILE: &str = "acemin/ace.js";

/// Default connect timeout for the archive download.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How to handle an installation already present in the target directory.
///
/// Parsing is case-insensitive and accepts the machine-readable keys
/// `drop`, `keep` and `skip`.
///
/// # Example
///
/// ```rust
/// use ace_installer::ClearPolicy;
/// use std::str::FromStr;
///
/// assert_eq!(ClearPolicy::from_str("Drop").unwrap(), ClearPolicy::Drop);
/// assert_eq!(ClearPolicy::Keep.to_string(), "keep");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClearPolicy {
    /// Remove the existing installation, then install.
    Drop,
    /// Install over the existing files.
    Keep,
    /// Leave the existing installation untouched and stop.
    Skip,
}

impl ClearPolicy {
    /// Human-readable label for selection prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Drop => "Drop the directory & reinstall ACE",
            Self::Keep => "Keep the directory & reinstall ACE by overriding files",
            Self::Skip => "Skip installation",
        }
    }

    /// Every policy, in prompt order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }
}

/// HTTP proxy settings taken from the process environment.
///
/// `https_proxy` wins over `http_proxy`. The "request full URI" flag is read
/// from the variable pair matching the same prefix preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `http://proxy.local:3128`.
    pub url: String,
    /// Whether the proxy expects absolute-form request URIs.
    pub request_fulluri: bool,
}

impl ProxyConfig {
    /// Read the proxy configuration from the environment.
    ///
    /// Returns `None` when neither `https_proxy` nor `http_proxy` is set to a
    /// non-empty value.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ProxyConfig::from_env`] with an injectable variable source.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ace_installer::ProxyConfig;
    ///
    /// let proxy = ProxyConfig::from_lookup(|key| match key {
    ///     "http_proxy" => Some("http://proxy:8080".to_string()),
    ///     "http_proxy_request_fulluri" => Some("1".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(proxy.url, "http://proxy:8080");
    /// assert!(proxy.request_fulluri);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url = non_empty("https_proxy").or_else(|| non_empty("http_proxy"))?;
        let request_fulluri = non_empty("https_proxy_request_fulluri")
            .filter(|value| is_truthy(value))
            .or_else(|| non_empty("http_proxy_request_fulluri"))
            .map(|value| is_truthy(&value))
            .unwrap_or(false);

        Some(Self {
            url,
            request_fulluri,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

/// A validated installation request.
///
/// Built by [`InstallOptions::resolve`](crate::InstallOptions::resolve) and
/// shared read-only by every phase of a single [`install`](fn@crate::install)
/// call.
#[derive(Clone)]
pub struct InstallRequest {
    /// Absolute installation directory, without trailing separators.
    pub target_path: PathBuf,
    /// Release tag to install.
    pub version: String,
    /// Disposition toward a prior installation; `None` means undecided.
    pub clear_policy: Option<ClearPolicy>,
    /// Archive-relative paths that are not written during extraction.
    pub exclude_paths: BTreeSet<String>,
    /// Receiver of progress events and the clear decision.
    pub notifier: Option<Arc<dyn Notifier>>,
    /// Archive URL template containing `{version}`.
    pub archive_url: String,
    /// Proxy used for the download, if any.
    pub proxy: Option<ProxyConfig>,
    /// Connect timeout for the download.
    pub connect_timeout: Duration,
}

impl InstallRequest {
    /// The archive URL with the version substituted.
    pub fn archive_url(&self) -> String {
        self.archive_url.replace(VERSION_PLACEHOLDER, &self.version)
    }

    /// Path of the installation marker file.
    pub fn marker_path(&self) -> PathBuf {
        self.target_path.join(MARKER_FILE)
    }

    /// Directory receiving the minified assets.
    pub fn install_dir(&self) -> PathBuf {
        self.target_path.join(INSTALL_DIR)
    }

    /// Whether the marker file is present.
    pub fn is_installed(&self) -> bool {
        self.marker_path().is_file()
    }
}

impl fmt::Debug for InstallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallRequest")
            .field("target_path", &self.target_path)
            .field("version", &self.version)
            .field("clear_policy", &self.clear_policy)
            .field("exclude_paths", &self.exclude_paths)
            .field("notifier", &self.notifier.is_some())
            .field("archive_url", &self.archive_url)
            .field("proxy", &self.proxy)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::str::FromStr;

    fn request(target: &Path) -> InstallRequest {
        InstallRequest {
            target_path: target.to_path_buf(),
            version: "1.4.0".to_string(),
            clear_policy: None,
            exclude_paths: BTreeSet::new(),
            notifier: None,
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            proxy: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[test]
    fn test_clear_policy_parse() {
        assert_eq!(ClearPolicy::from_str("drop").unwrap(), ClearPolicy::Drop);
        assert_eq!(ClearPolicy::from_str("KEEP").unwrap(), ClearPolicy::Keep);
        assert_eq!(ClearPolicy::from_str("skip").unwrap(), ClearPolicy::Skip);
        assert!(ClearPolicy::from_str("purge").is_err());
    }

    #[test]
    fn test_clear_policy_order_and_labels() {
        let all: Vec<_> = ClearPolicy::all().collect();
        assert_eq!(all, vec![ClearPolicy::Drop, ClearPolicy::Keep, ClearPolicy::Skip]);
        assert_eq!(ClearPolicy::Skip.label(), "Skip installation");
        let key: &'static str = ClearPolicy::Drop.into();
        assert_eq!(key, "drop");
    }

    #[test]
    fn test_clear_policy_serde() {
        let json = serde_json::to_string(&ClearPolicy::Keep).unwrap();
        assert_eq!(json, "\"keep\"");
        let parsed: ClearPolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(parsed, ClearPolicy::Skip);
    }

    #[test]
    fn test_proxy_prefers_https() {
        let proxy = ProxyConfig::from_lookup(|key| match key {
            "https_proxy" => Some("http://secure:3128".to_string()),
            "http_proxy" => Some("http://plain:3128".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(proxy.url, "http://secure:3128");
        assert!(!proxy.request_fulluri);
    }

    #[test]
    fn test_proxy_fulluri_fallback() {
        let proxy = ProxyConfig::from_lookup(|key| match key {
            "https_proxy" => Some("http://secure:3128".to_string()),
            "https_proxy_request_fulluri" => Some("0".to_string()),
            "http_proxy_request_fulluri" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(proxy.request_fulluri);
    }

    #[test]
    fn test_proxy_absent() {
        assert!(ProxyConfig::from_lookup(|_| None).is_none());
        assert!(ProxyConfig::from_lookup(|_| Some("  ".to_string())).is_none());
    }

    #[test]
    fn test_request_paths() {
        let req = request(Path::new("/srv/public"));
        assert_eq!(
            req.archive_url(),
            "https://github.com/ajaxorg/ace-builds/archive/v1.4.0.zip"
        );
        assert_eq!(req.marker_path(), PathBuf::from("/srv/public/acemin/ace.js"));
        assert_eq!(req.install_dir(), PathBuf::from("/srv/public/acemin"));
    }

    #[test]
    fn test_is_installed() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        assert!(!req.is_installed());

        std::fs::create_dir_all(dir.path().join("acemin")).unwrap();
        std::fs::write(dir.path().join("acemin/ace.js"), "ace").unwrap();
        assert!(req.is_installed());
    }
}
