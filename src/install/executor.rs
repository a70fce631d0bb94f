//! Installation pipeline.
//!
//! This module provides the main [`install`] function, which runs the clear,
//! fetch and extract phases in order and reports progress to the notifier.

use crate::install::{clear, extract, fetch, InstallError, InstallRequest};
use crate::InstallOptions;
use tracing::info;

/// Install the Ace editor assets.
///
/// This function:
/// 1. Resolves and validates `options`
/// 2. Applies the clear policy to any existing installation
/// 3. Downloads the release archive to a temporary file
/// 4. Extracts it and moves the minified build to `<target>/acemin`
///
/// # Returns
///
/// - `Ok(true)` if the assets were (re)installed
/// - `Ok(false)` if an existing installation was left alone (`skip`)
/// - `Err(InstallError)` with an actionable fix suggestion if any step failed
///
/// # Example
///
/// ```rust,no_run
/// use ace_installer::{install, InstallEvent, InstallOptions};
///
/// #[tokio::main]
/// async fn main() {
///     let options = InstallOptions {
///         path: Some("/srv/www/public".to_string()),
///         clear: Some("drop".to_string()),
///         ..Default::default()
///     }
///     .with_notifier(|event: InstallEvent| println!("{:?}", event));
///
///     match install(options).await {
///         Ok(true) => println!("Installed"),
///         Ok(false) => println!("Skipped"),
///         Err(e) => println!("Failed: {}. Fix: {}", e, e.fix_suggestion()),
///     }
/// }
/// ```
pub async fn install(options: InstallOptions) -> Result<bool, InstallError> {
    install_resolved(options.resolve()?).await
}

/// Run the installation pipeline for an already resolved request.
pub async fn install_resolved(request: InstallRequest) -> Result<bool, InstallError> {
    info!(
        target = %request.target_path.display(),
        version = %request.version,
        "installing ace"
    );

    let clear_request = request.clone();
    let state = blocking("clear", move || clear::run(&clear_request)).await?;
    if !state.proceeds() {
        info!("existing installation kept, nothing to do");
        return Ok(false);
    }

    let archive = fetch::run(&request).await?;

    let extract_request = request.clone();
    blocking("extract", move || extract::run(&extract_request, archive)).await?;

    info!(target = %request.install_dir().display(), "ace installed");
    Ok(true)
}

async fn blocking<T, F>(phase: &'static str, task: F) -> Result<T, InstallError>
where
    F: FnOnce() -> Result<T, InstallError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(InstallError::Interrupted {
            phase,
            fix: "Run the installer again; the target directory may be partially updated"
                .to_string(),
        }),
    }
}
