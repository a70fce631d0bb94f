//! Installation options and their resolution.
//!
//! [`InstallOptions`] is the loosely-typed input to an installation: every
//! field is optional and may be filled from code, a TOML file or a JSON
//! mapping. [`InstallOptions::resolve`] merges it with defaults, validates it
//! and produces the [`InstallRequest`] shared by every installation phase.

use crate::install::{
    ClearPolicy, InstallError, InstallRequest, Notifier, ProxyConfig, DEFAULT_ARCHIVE_URL,
    DEFAULT_CONNECT_TIMEOUT, VERSION_LATEST, VERSION_PLACEHOLDER,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Default installation directory, relative to the working directory.
pub const DEFAULT_TARGET_DIR: &str = "Resources/public";

/// Proxy selection for the archive download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProxySetting {
    /// Read `https_proxy` / `http_proxy` from the environment.
    #[default]
    FromEnv,
    /// Connect directly.
    Disabled,
    /// Use the given proxy.
    Explicit(ProxyConfig),
}

/// Loosely-typed installation options.
///
/// All fields default to "unset". Field names match the keys accepted in
/// configuration files: `path`, `version`, `clear`, `excludes`,
/// `archive_url` and `connect_timeout_secs`. Unknown keys are rejected.
///
/// # Example
///
/// ```rust
/// use ace_installer::{ClearPolicy, InstallOptions};
///
/// let request = InstallOptions {
///     path: Some("/srv/www/public/".to_string()),
///     clear: Some("keep".to_string()),
///     excludes: vec!["snippets".to_string()],
///     ..Default::default()
/// }
/// .resolve()
/// .unwrap();
///
/// assert_eq!(request.target_path.to_str(), Some("/srv/www/public"));
/// assert_eq!(request.clear_policy, Some(ClearPolicy::Keep));
/// assert_eq!(request.version, ace_installer::VERSION_LATEST);
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallOptions {
    /// Installation directory. Default: `<cwd>/Resources/public`.
    #[serde(default)]
    pub path: Option<String>,

    /// Release tag, or `latest`. Default: [`VERSION_LATEST`].
    #[serde(default)]
    pub version: Option<String>,

    /// `drop`, `keep` or `skip`. Default: ask the notifier.
    #[serde(default)]
    pub clear: Option<String>,

    /// Archive paths not to extract.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Archive URL template containing `{version}`.
    #[serde(default)]
    pub archive_url: Option<String>,

    /// Download connect timeout in seconds. Default: 30.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Receiver of progress events and the clear decision.
    #[serde(skip)]
    pub notifier: Option<Arc<dyn Notifier>>,

    /// Proxy used for the download.
    #[serde(skip)]
    pub proxy: ProxySetting,
}

impl InstallOptions {
    /// Parse options from a TOML document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ace_installer::InstallOptions;
    ///
    /// let options = InstallOptions::from_toml_str(r#"
    ///     path = "/srv/public"
    ///     version = "1.4.2"
    ///     excludes = ["snippets"]
    /// "#).unwrap();
    /// assert_eq!(options.version.as_deref(), Some("1.4.2"));
    ///
    /// assert!(InstallOptions::from_toml_str("colour = \"blue\"").is_err());
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, InstallError> {
        toml::from_str(source).map_err(|e| InstallError::invalid("options", e.to_string()))
    }

    /// Read and parse a TOML options file.
    pub fn from_toml_file(path: &Path) -> Result<Self, InstallError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            InstallError::invalid("config", format!("cannot read \"{}\": {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Parse options from a JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, InstallError> {
        serde_json::from_value(value).map_err(|e| InstallError::invalid("options", e.to_string()))
    }

    /// Set the notifier.
    pub fn with_notifier<N>(mut self, notifier: N) -> Self
    where
        N: Notifier + 'static,
    {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Set the proxy selection.
    pub fn with_proxy(mut self, proxy: ProxySetting) -> Self {
        self.proxy = proxy;
        self
    }

    /// Fill unset fields from `other`. Fields already set on `self` win.
    pub fn merge(mut self, other: InstallOptions) -> Self {
        self.path = self.path.or(other.path);
        self.version = self.version.or(other.version);
        self.clear = self.clear.or(other.clear);
        if self.excludes.is_empty() {
            self.excludes = other.excludes;
        }
        self.archive_url = self.archive_url.or(other.archive_url);
        self.connect_timeout_secs = self.connect_timeout_secs.or(other.connect_timeout_secs);
        self.notifier = self.notifier.or(other.notifier);
        if self.proxy == ProxySetting::FromEnv {
            self.proxy = other.proxy;
        }
        self
    }

    /// Merge with defaults and validate.
    ///
    /// Fails with [`InstallError::InvalidConfiguration`] naming the first
    /// offending option.
    pub fn resolve(self) -> Result<InstallRequest, InstallError> {
        let target_path = resolve_path(self.path.as_deref())?;
        let version = resolve_version(self.version.as_deref())?;

        let clear_policy = match self.clear.as_deref() {
            None => None,
            Some(value) => Some(ClearPolicy::from_str(value.trim()).map_err(|_| {
                InstallError::invalid(
                    "clear",
                    format!("\"{}\" is not one of \"drop\", \"keep\", \"skip\"", value),
                )
            })?),
        };

        let mut exclude_paths = BTreeSet::new();
        for exclude in &self.excludes {
            let normalized = exclude.trim().trim_matches(|c: char| c == '/' || c == '\\');
            if normalized.is_empty() {
                return Err(InstallError::invalid("excludes", "entries must not be empty"));
            }
            exclude_paths.insert(normalized.replace('\\', "/"));
        }

        let archive_url = self.archive_url.unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string());
        if !archive_url.contains(VERSION_PLACEHOLDER) {
            return Err(InstallError::invalid(
                "archive_url",
                format!("must contain the {} placeholder", VERSION_PLACEHOLDER),
            ));
        }
        if !(archive_url.starts_with("http://") || archive_url.starts_with("https://")) {
            return Err(InstallError::invalid("archive_url", "must be an http or https URL"));
        }

        let connect_timeout = match self.connect_timeout_secs {
            None => DEFAULT_CONNECT_TIMEOUT,
            Some(0) => {
                return Err(InstallError::invalid("connect_timeout_secs", "must be positive"))
            }
            Some(secs) => Duration::from_secs(secs),
        };

        let proxy = match self.proxy {
            ProxySetting::FromEnv => ProxyConfig::from_env(),
            ProxySetting::Disabled => None,
            ProxySetting::Explicit(config) => Some(config),
        };

        Ok(InstallRequest {
            target_path,
            version,
            clear_policy,
            exclude_paths,
            notifier: self.notifier,
            archive_url,
            proxy,
            connect_timeout,
        })
    }
}

impl fmt::Debug for InstallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallOptions")
            .field("path", &self.path)
            .field("version", &self.version)
            .field("clear", &self.clear)
            .field("excludes", &self.excludes)
            .field("archive_url", &self.archive_url)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("notifier", &self.notifier.is_some())
            .field("proxy", &self.proxy)
            .finish()
    }
}

fn resolve_path(path: Option<&str>) -> Result<PathBuf, InstallError> {
    let cwd = || {
        std::env::current_dir().map_err(|e| {
            InstallError::invalid("path", format!("cannot read the working directory: {}", e))
        })
    };

    let Some(raw) = path else {
        return Ok(cwd()?.join(DEFAULT_TARGET_DIR));
    };

    if raw.trim().is_empty() {
        return Err(InstallError::invalid("path", "must not be empty"));
    }

    let trimmed = raw.trim_end_matches(std::path::is_separator);
    let path = if trimmed.is_empty() {
        PathBuf::from(std::path::MAIN_SEPARATOR_STR)
    } else {
        PathBuf::from(trimmed)
    };

    if path.is_absolute() || Path::new(raw).has_root() {
        Ok(path)
    } else {
        Ok(cwd()?.join(path))
    }
}

fn resolve_version(version: Option<&str>) -> Result<String, InstallError> {
    let version = match version.map(str::trim) {
        None | Some("latest") => return Ok(VERSION_LATEST.to_string()),
        Some(version) => version,
    };

    if version.is_empty() {
        return Err(InstallError::invalid("version", "must not be empty"));
    }

    let re = Regex::new(r"^[0-9A-Za-z][0-9A-Za-z._-]*$").expect("Invalid regex pattern");
    if !re.is_match(version) {
        return Err(InstallError::invalid(
            "version",
            format!("\"{}\" is not a valid release tag", version),
        ));
    }

    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::InstallEvent;

    fn resolve(options: InstallOptions) -> InstallRequest {
        options.with_proxy(ProxySetting::Disabled).resolve().unwrap()
    }

    fn invalid_option(options: InstallOptions) -> String {
        match options.resolve() {
            Err(InstallError::InvalidConfiguration { option, .. }) => option,
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let request = resolve(InstallOptions::default());
        let cwd = std::env::current_dir().unwrap();

        assert_eq!(request.target_path, cwd.join("Resources/public"));
        assert_eq!(request.version, VERSION_LATEST);
        assert_eq!(request.clear_policy, None);
        assert!(request.exclude_paths.is_empty());
        assert!(request.notifier.is_none());
        assert!(request.proxy.is_none());
        assert_eq!(request.archive_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(request.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_trailing_separators_trimmed() {
        let request = resolve(InstallOptions {
            path: Some("/srv/www/public///".to_string()),
            ..Default::default()
        });
        assert_eq!(request.target_path, PathBuf::from("/srv/www/public"));
    }

    #[cfg(unix)]
    #[test]
    fn test_root_path_kept() {
        let request = resolve(InstallOptions {
            path: Some("/".to_string()),
            ..Default::default()
        });
        assert_eq!(request.target_path, PathBuf::from("/"));
    }

    #[test]
    fn test_relative_path_made_absolute() {
        let request = resolve(InstallOptions {
            path: Some("web/assets/".to_string()),
            ..Default::default()
        });
        assert!(request.target_path.is_absolute());
        assert!(request.target_path.ends_with("web/assets"));
    }

    #[test]
    fn test_empty_path_rejected() {
        let option = invalid_option(InstallOptions {
            path: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(option, "path");
    }

    #[test]
    fn test_latest_alias() {
        let request = resolve(InstallOptions {
            version: Some("latest".to_string()),
            ..Default::default()
        });
        assert_eq!(request.version, VERSION_LATEST);
    }

    #[test]
    fn test_invalid_version_rejected() {
        for version in ["", "1.3.3/../../x", "v 1", "-rc"] {
            let option = invalid_option(InstallOptions {
                version: Some(version.to_string()),
                ..Default::default()
            });
            assert_eq!(option, "version", "{:?} should be rejected", version);
        }
    }

    #[test]
    fn test_clear_policy_values() {
        for (raw, expected) in [
            ("drop", ClearPolicy::Drop),
            ("Keep", ClearPolicy::Keep),
            (" skip ", ClearPolicy::Skip),
        ] {
            let request = resolve(InstallOptions {
                clear: Some(raw.to_string()),
                ..Default::default()
            });
            assert_eq!(request.clear_policy, Some(expected));
        }

        let option = invalid_option(InstallOptions {
            clear: Some("purge".to_string()),
            ..Default::default()
        });
        assert_eq!(option, "clear");
    }

    #[test]
    fn test_excludes_normalized() {
        let request = resolve(InstallOptions {
            excludes: vec!["/docs/".to_string(), "src-min-noconflict\\snippets".to_string()],
            ..Default::default()
        });
        let excludes: Vec<_> = request.exclude_paths.iter().cloned().collect();
        assert_eq!(excludes, vec!["docs", "src-min-noconflict/snippets"]);

        let option = invalid_option(InstallOptions {
            excludes: vec!["/".to_string()],
            ..Default::default()
        });
        assert_eq!(option, "excludes");
    }

    #[test]
    fn test_archive_url_validated() {
        let option = invalid_option(InstallOptions {
            archive_url: Some("https://mirror.test/ace.zip".to_string()),
            ..Default::default()
        });
        assert_eq!(option, "archive_url");

        let option = invalid_option(InstallOptions {
            archive_url: Some("ftp://mirror.test/{version}.zip".to_string()),
            ..Default::default()
        });
        assert_eq!(option, "archive_url");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let option = invalid_option(InstallOptions {
            connect_timeout_secs: Some(0),
            ..Default::default()
        });
        assert_eq!(option, "connect_timeout_secs");
    }

    #[test]
    fn test_explicit_proxy() {
        let proxy = ProxyConfig {
            url: "http://proxy.test:3128".to_string(),
            request_fulluri: true,
        };
        let request = InstallOptions::default()
            .with_proxy(ProxySetting::Explicit(proxy.clone()))
            .resolve()
            .unwrap();
        assert_eq!(request.proxy, Some(proxy));
    }

    #[test]
    fn test_from_toml() {
        let options = InstallOptions::from_toml_str(
            r#"
            path = "/srv/public"
            version = "1.4.2"
            clear = "drop"
            excludes = ["snippets", "docs"]
            archive_url = "http://mirror.test/ace-{version}.zip"
            connect_timeout_secs = 5
            "#,
        )
        .unwrap();
        let request = resolve(options);

        assert_eq!(request.target_path, PathBuf::from("/srv/public"));
        assert_eq!(request.version, "1.4.2");
        assert_eq!(request.clear_policy, Some(ClearPolicy::Drop));
        assert_eq!(request.exclude_paths.len(), 2);
        assert_eq!(request.archive_url(), "http://mirror.test/ace-1.4.2.zip");
        assert_eq!(request.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("ace.toml");
        std::fs::write(&config, "clear = \"skip\"\nexcludes = [\"demo\"]\n").unwrap();

        let options = InstallOptions::from_toml_file(&config).unwrap();
        assert_eq!(options.clear.as_deref(), Some("skip"));
        assert_eq!(options.excludes, vec!["demo".to_string()]);

        match InstallOptions::from_toml_file(&dir.path().join("missing.toml")) {
            Err(InstallError::InvalidConfiguration { option, .. }) => assert_eq!(option, "config"),
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err =
            InstallOptions::from_json_value(serde_json::json!({ "excludes": "docs" })).unwrap_err();
        assert!(matches!(err, InstallError::InvalidConfiguration { .. }));

        let err = InstallOptions::from_json_value(serde_json::json!({ "path": 42 })).unwrap_err();
        assert!(matches!(err, InstallError::InvalidConfiguration { .. }));

        let err = InstallOptions::from_toml_str("release = \"full\"").unwrap_err();
        assert!(matches!(err, InstallError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_merge_prefers_self() {
        let cli = InstallOptions {
            version: Some("1.4.2".to_string()),
            ..Default::default()
        }
        .with_notifier(|_event: InstallEvent| {});
        let file = InstallOptions {
            path: Some("/srv/public".to_string()),
            version: Some("1.2.0".to_string()),
            excludes: vec!["docs".to_string()],
            ..Default::default()
        };

        let merged = cli.merge(file);

        assert_eq!(merged.version.as_deref(), Some("1.4.2"));
        assert_eq!(merged.path.as_deref(), Some("/srv/public"));
        assert_eq!(merged.excludes, vec!["docs".to_string()]);
        assert!(merged.notifier.is_some());
    }
}
