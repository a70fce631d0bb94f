//! Error types for installation operations.
//!
//! This module defines the error types that can occur while installing the
//! editor assets. Each error variant includes an actionable fix suggestion to
//! help users resolve the issue.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of filesystem entry a removal failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file or symlink.
    File,
    /// A directory.
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

/// Errors that can occur during installation.
///
/// Every variant is fatal: the installation stops at the failing step and
/// nothing already written is rolled back. Each variant carries a `fix`
/// field with an actionable suggestion for resolving the issue.
///
/// # Example
///
/// ```rust
/// use ace_installer::InstallError;
///
/// fn handle_error(error: InstallError) {
///     eprintln!("Installation failed during {}: {}", error.phase(), error);
///     eprintln!("To fix: {}", error.fix_suggestion());
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// An installation option has the wrong type or an unsupported value.
    #[error("Invalid option \"{option}\": {message}")]
    InvalidConfiguration {
        /// Name of the offending option.
        option: String,
        /// What is wrong with it.
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A file or directory could not be deleted.
    #[error("Unable to remove the {kind} \"{}\" ({reason})", path.display())]
    FilesystemRemovalFailed {
        /// Phase that was removing files (`clear` or `extract`).
        phase: &'static str,
        /// The entry that could not be removed.
        path: PathBuf,
        /// Whether the entry is a file or a directory.
        kind: EntryKind,
        /// Underlying I/O error message.
        reason: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The release archive could not be downloaded.
    #[error("Unable to download ACE ZIP archive from \"{url}\" ({reason})")]
    DownloadFailed {
        /// URL that was requested.
        url: String,
        /// Transport or HTTP status error message.
        reason: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The downloaded bytes could not be written to a temporary file.
    #[error("Unable to write ACE ZIP archive to \"{}\" ({reason})", path.display())]
    TempWriteFailed {
        /// Temporary file location.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The downloaded file is not a readable ZIP archive.
    #[error("Unable to read ACE ZIP archive \"{}\" ({reason})", path.display())]
    CorruptArchive {
        /// Temporary archive location.
        path: PathBuf,
        /// ZIP reader error message.
        reason: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// Relocating the minified assets failed.
    #[error("Unable to copy \"{}\" to \"{}\" ({reason})", from.display(), to.display())]
    CopyFailed {
        /// Source file or directory.
        from: PathBuf,
        /// Destination file or directory.
        to: PathBuf,
        /// Underlying I/O error message.
        reason: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The temporary archive could not be deleted after extraction.
    #[error("Unable to remove the ACE ZIP archive \"{}\" ({reason})", path.display())]
    ArchiveCleanupFailed {
        /// Temporary archive location.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A blocking installation step was cancelled before it finished.
    #[error("Installation interrupted during {phase}")]
    Interrupted {
        /// The phase that did not finish.
        phase: &'static str,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },
}

impl InstallError {
    /// Get an actionable suggestion for fixing this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ace_installer::InstallError;
    ///
    /// let error = InstallError::DownloadFailed {
    ///     url: "https://github.com/ajaxorg/ace-builds/archive/v9.9.9.zip".to_string(),
    ///     reason: "HTTP status client error (404 Not Found)".to_string(),
    ///     fix: "Check that the release tag exists".to_string(),
    /// };
    /// assert!(error.fix_suggestion().contains("tag"));
    /// ```
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::InvalidConfiguration { fix, .. } => fix,
            Self::FilesystemRemovalFailed { fix, .. } => fix,
            Self::DownloadFailed { fix, .. } => fix,
            Self::TempWriteFailed { fix, .. } => fix,
            Self::CorruptArchive { fix, .. } => fix,
            Self::CopyFailed { fix, .. } => fix,
            Self::ArchiveCleanupFailed { fix, .. } => fix,
            Self::Interrupted { fix, .. } => fix,
        }
    }

    /// Name of the installation phase that failed.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "resolve",
            Self::FilesystemRemovalFailed { phase, .. } => *phase,
            Self::DownloadFailed { .. } | Self::TempWriteFailed { .. } => "fetch",
            Self::CorruptArchive { .. }
            | Self::CopyFailed { .. }
            | Self::ArchiveCleanupFailed { .. } => "extract",
            Self::Interrupted { phase, .. } => *phase,
        }
    }

    pub(crate) fn invalid(option: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::InvalidConfiguration {
            fix: format!("Correct the \"{}\" option and try again", option),
            option: option.to_string(),
            message,
        }
    }

    pub(crate) fn removal(
        phase: &'static str,
        path: PathBuf,
        kind: EntryKind,
        error: &std::io::Error,
    ) -> Self {
        let fix = match error.kind() {
            std::io::ErrorKind::PermissionDenied => format!(
                "Check write permissions on the parent of \"{}\"",
                path.display()
            ),
            _ => "Make sure no other process is using the installation directory".to_string(),
        };
        Self::FilesystemRemovalFailed {
            phase,
            path,
            kind,
            reason: error.to_string(),
            fix,
        }
    }

    pub(crate) fn copy(from: PathBuf, to: PathBuf, reason: impl Into<String>) -> Self {
        Self::CopyFailed {
            fix: format!(
                "Check that \"{}\" is writable and has free space",
                to.display()
            ),
            from,
            to,
            reason: reason.into(),
        }
    }
}
