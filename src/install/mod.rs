//! Installation of the Ace editor release assets.
//!
//! An installation runs three phases against one [`InstallRequest`]:
//!
//! 1. **clear**: detect a prior installation through its marker file and
//!    apply the [`ClearPolicy`], asking the [`Notifier`] when none was given
//! 2. **fetch**: download the release archive into a temporary file
//! 3. **extract**: unpack the archive into the target directory, move the
//!    minified build to `acemin/` and delete the temporary archive
//!
//! Progress is reported as [`InstallEvent`]s. Every failure is an
//! [`InstallError`] carrying a fix suggestion.
//!
//! # Example
//!
//! ```rust,no_run
//! use ace_installer::{install, ClearPolicy, InstallOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = InstallOptions {
//!         path: Some("web".to_string()),
//!         clear: Some(ClearPolicy::Keep.to_string()),
//!         excludes: vec!["demo".to_string(), "kitchen-sink".to_string()],
//!         ..Default::default()
//!     };
//!
//!     if let Err(e) = install(options).await {
//!         eprintln!("{}\n  {}", e, e.fix_suggestion());
//!     }
//! }
//! ```

mod clear;
mod errors;
mod executor;
mod extract;
mod fetch;
mod progress;
mod tree;
mod types;

pub use clear::ClearState;
pub use errors::{EntryKind, InstallError};
pub use executor::{install, install_resolved};
pub use progress::{ClearDecision, EventKind, InstallEvent, Notifier};
pub use types::{
    ClearPolicy, InstallRequest, ProxyConfig, DEFAULT_ARCHIVE_URL, DEFAULT_CONNECT_TIMEOUT,
    INSTALL_DIR, MARKER_FILE, VERSION_LATEST, VERSION_PLACEHOLDER,
};
