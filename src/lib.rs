//! # ace-installer
//!
//! Installer for the [Ace](https://ace.c9.io) code editor assets.
//!
//! This crate downloads an Ace release archive, unpacks it into a
//! web-served directory and moves the minified build to `<target>/acemin`,
//! so pages can load `acemin/ace.js`. An existing installation is detected
//! and dropped, kept or skipped according to a [`ClearPolicy`].
//!
//! ## Features
//!
//! - [`install()`] async function running the whole pipeline
//! - [`InstallOptions`] loosely-typed options, loadable from TOML or JSON
//! - [`Notifier`] trait receiving [`InstallEvent`]s and answering the
//!   clear-policy question; a plain closure only observes progress and
//!   never confirms removing an existing installation
//! - [`InstallError`] with a fix suggestion on every variant
//!
//! ## Example
//!
//! ```rust,no_run
//! use ace_installer::{install, InstallEvent, InstallOptions, VERSION_LATEST};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let options = InstallOptions {
//!         path: Some("Resources/public".to_string()),
//!         version: Some(VERSION_LATEST.to_string()),
//!         clear: Some("drop".to_string()),
//!         ..Default::default()
//!     }
//!     .with_notifier(|event: InstallEvent| {
//!         if event.is_complete() {
//!             println!("{}", event.description());
//!         }
//!     });
//!
//!     match install(options).await {
//!         Ok(true) => println!("Ace installed"),
//!         Ok(false) => println!("Existing installation kept"),
//!         Err(e) => eprintln!("{} ({})", e, e.fix_suggestion()),
//!     }
//! }
//! ```

mod install;
mod options;

pub use install::{
    install, install_resolved, ClearDecision, ClearPolicy, ClearState, EntryKind, EventKind,
    InstallError, InstallEvent, InstallRequest, Notifier, ProxyConfig, DEFAULT_ARCHIVE_URL,
    DEFAULT_CONNECT_TIMEOUT, INSTALL_DIR, MARKER_FILE, VERSION_LATEST, VERSION_PLACEHOLDER,
};
pub use options::{InstallOptions, ProxySetting, DEFAULT_TARGET_DIR};
