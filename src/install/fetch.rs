//! Release archive download.

use crate::install::{InstallError, InstallEvent, InstallRequest};
use futures::StreamExt;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("ace-installer/", env!("CARGO_PKG_VERSION"));

/// Download the archive for `request.version` into a temporary file.
///
/// The returned [`TempPath`] deletes the file when dropped, so an error in a
/// later phase never leaves the archive behind.
pub(crate) async fn run(request: &InstallRequest) -> Result<TempPath, InstallError> {
    let url = request.archive_url();
    let notify = |event: InstallEvent| {
        if let Some(notifier) = &request.notifier {
            notifier.emit(event);
        }
    };

    notify(InstallEvent::DownloadStarted { url: url.clone() });
    info!(%url, "downloading archive");

    let download_failed = |reason: String| InstallError::DownloadFailed {
        url: url.clone(),
        fix: format!(
            "Check that release \"{}\" exists and that the network or proxy allows access to it",
            request.version
        ),
        reason,
    };

    let client = build_client(request).map_err(|e| download_failed(e.to_string()))?;
    let response = client
        .get(&url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| download_failed(e.to_string()))?;

    if let Some(total) = response.content_length() {
        notify(InstallEvent::DownloadSizeKnown { total });
    }

    let archive = tempfile::Builder::new()
        .prefix(&format!("ace-{}-", request.version))
        .suffix(".zip")
        .tempfile()
        .map_err(|e| InstallError::TempWriteFailed {
            path: std::env::temp_dir(),
            reason: e.to_string(),
            fix: "Check that the system temporary directory is writable".to_string(),
        })?;
    let path = archive.path().to_path_buf();
    let write_failed = |e: std::io::Error| InstallError::TempWriteFailed {
        path: path.clone(),
        reason: e.to_string(),
        fix: "Check free space in the system temporary directory".to_string(),
    };

    let mut file = tokio::fs::File::from_std(archive.reopen().map_err(write_failed)?);
    let mut stream = response.bytes_stream();
    let mut transferred: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| download_failed(e.to_string()))?;
        file.write_all(&chunk).await.map_err(write_failed)?;
        transferred += chunk.len() as u64;
        notify(InstallEvent::DownloadProgress { transferred });
    }

    file.flush().await.map_err(write_failed)?;
    file.sync_all().await.map_err(write_failed)?;
    drop(file);

    if transferred == 0 {
        return Err(download_failed("empty response body".to_string()));
    }

    debug!(path = %path.display(), transferred, "archive written");
    notify(InstallEvent::DownloadComplete { path: path.clone() });

    Ok(archive.into_temp_path())
}

fn build_client(request: &InstallRequest) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .no_proxy()
        .connect_timeout(request.connect_timeout)
        .user_agent(USER_AGENT);

    if let Some(proxy) = &request.proxy {
        debug!(proxy = %proxy.url, request_fulluri = proxy.request_fulluri, "using proxy");
        builder = builder.proxy(reqwest::Proxy::all(&proxy.url)?);
    }

    builder.build()
}
