//! Progress reporting types for installation operations.
//!
//! This module provides the [`InstallEvent`] enum describing discrete
//! installation milestones, and the [`Notifier`] trait through which a caller
//! receives those events and answers the single clear-policy decision.

use crate::install::ClearPolicy;
use std::path::PathBuf;

/// Machine-readable name of every notification an installation can produce.
///
/// # Example
///
/// ```rust
/// use ace_installer::EventKind;
///
/// assert_eq!(EventKind::DownloadProgress.to_string(), "download-progress");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    /// The caller is asked how to handle an existing installation.
    ClearDecisionRequest,
    /// A prior installation has been removed.
    ClearComplete,
    /// The temporary archive is about to be deleted.
    ArchiveClearing,
    /// The archive download has begun.
    DownloadStarted,
    /// The archive size is known.
    DownloadSizeKnown,
    /// More archive bytes have arrived.
    DownloadProgress,
    /// The archive has been written to a temporary file.
    DownloadComplete,
    /// Extraction into the target directory has begun.
    ExtractStarted,
    /// The number of archive entries is known.
    ExtractSizeKnown,
    /// Another archive entry has been processed.
    ExtractProgress,
    /// Extraction and relocation are done.
    ExtractComplete,
}

/// Fire-and-forget notifications emitted during installation.
///
/// Events are emitted in pipeline order:
/// `ClearComplete?`, `DownloadStarted`, `DownloadSizeKnown?`,
/// `DownloadProgress*`, `DownloadComplete`, `ExtractStarted`,
/// `ExtractSizeKnown`, `ExtractProgress*`, `ExtractComplete`,
/// `ArchiveClearing`.
///
/// # Example
///
/// ```rust
/// use ace_installer::{EventKind, InstallEvent};
///
/// fn on_event(event: InstallEvent) {
///     match &event {
///         InstallEvent::DownloadStarted { url } => println!("Downloading {}", url),
///         InstallEvent::DownloadProgress { transferred } => println!("{} bytes", transferred),
///         InstallEvent::ExtractComplete => println!("Extracted"),
///         other => println!("{}", other.description()),
///     }
/// }
///
/// let event = InstallEvent::ExtractSizeKnown { entries: 12 };
/// assert_eq!(event.kind(), EventKind::ExtractSizeKnown);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    /// The prior installation has been removed.
    ClearComplete,

    /// The temporary archive is being deleted.
    ArchiveClearing {
        /// Location of the temporary archive.
        path: PathBuf,
    },

    /// Download started.
    DownloadStarted {
        /// The archive URL.
        url: String,
    },

    /// Content length reported by the server.
    DownloadSizeKnown {
        /// Total archive size in bytes.
        total: u64,
    },

    /// Bytes received so far.
    DownloadProgress {
        /// Cumulative bytes transferred.
        transferred: u64,
    },

    /// Archive persisted to a temporary file.
    DownloadComplete {
        /// Location of the temporary archive.
        path: PathBuf,
    },

    /// Extraction started.
    ExtractStarted {
        /// Directory receiving the archive contents.
        destination: PathBuf,
    },

    /// Number of entries in the archive.
    ExtractSizeKnown {
        /// Archive entry count.
        entries: usize,
    },

    /// Entries processed so far, excluded entries included.
    ExtractProgress {
        /// Cumulative entries processed.
        extracted: usize,
    },

    /// Extraction finished.
    ExtractComplete,
}

impl InstallEvent {
    /// The machine-readable kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ClearComplete => EventKind::ClearComplete,
            Self::ArchiveClearing { .. } => EventKind::ArchiveClearing,
            Self::DownloadStarted { .. } => EventKind::DownloadStarted,
            Self::DownloadSizeKnown { .. } => EventKind::DownloadSizeKnown,
            Self::DownloadProgress { .. } => EventKind::DownloadProgress,
            Self::DownloadComplete { .. } => EventKind::DownloadComplete,
            Self::ExtractStarted { .. } => EventKind::ExtractStarted,
            Self::ExtractSizeKnown { .. } => EventKind::ExtractSizeKnown,
            Self::ExtractProgress { .. } => EventKind::ExtractProgress,
            Self::ExtractComplete => EventKind::ExtractComplete,
        }
    }

    /// Get a human-readable description of the event.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ace_installer::InstallEvent;
    ///
    /// assert_eq!(InstallEvent::ClearComplete.description(), "Previous installation removed");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Self::ClearComplete => "Previous installation removed",
            Self::ArchiveClearing { .. } => "Removing archive",
            Self::DownloadStarted { .. } => "Downloading archive",
            Self::DownloadSizeKnown { .. } => "Archive size known",
            Self::DownloadProgress { .. } => "Downloading",
            Self::DownloadComplete { .. } => "Download complete",
            Self::ExtractStarted { .. } => "Extracting archive",
            Self::ExtractSizeKnown { .. } => "Archive entries counted",
            Self::ExtractProgress { .. } => "Extracting",
            Self::ExtractComplete => "Extraction complete",
        }
    }

    /// Check if this event closes a phase.
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Self::ClearComplete | Self::DownloadComplete { .. } | Self::ExtractComplete
        )
    }
}

/// The question asked when an installation already exists and no clear
/// policy was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearDecision {
    /// Directory holding the existing installation.
    pub target: PathBuf,
    /// Offered choices, in display order.
    pub choices: Vec<ClearPolicy>,
    /// Answer used when the caller cannot ask interactively.
    pub default: ClearPolicy,
}

impl ClearDecision {
    pub(crate) fn new(target: PathBuf) -> Self {
        Self {
            target,
            choices: ClearPolicy::all().collect(),
            default: ClearPolicy::Drop,
        }
    }

    /// The machine-readable kind of this request.
    pub fn kind(&self) -> EventKind {
        EventKind::ClearDecisionRequest
    }
}

/// Receiver of installation events and the clear-policy decision.
///
/// `emit` is called for every [`InstallEvent`]; its outcome does not affect
/// installation. `request_decision` is called at most once per installation,
/// and blocks until the caller picks one of `request.choices`.
///
/// Closures taking an [`InstallEvent`] implement this trait. A closure only
/// observes progress, so it answers every decision with
/// [`ClearPolicy::Skip`]: an existing installation is never removed unless a
/// clear policy is set or a full `Notifier` confirms it.
///
/// # Example
///
/// ```rust
/// use ace_installer::{ClearDecision, ClearPolicy, InstallEvent, Notifier};
///
/// struct KeepExisting;
///
/// impl Notifier for KeepExisting {
///     fn emit(&self, event: InstallEvent) {
///         println!("{}", event.description());
///     }
///
///     fn request_decision(&self, _request: &ClearDecision) -> ClearPolicy {
///         ClearPolicy::Keep
///     }
/// }
/// ```
pub trait Notifier: Send + Sync {
    /// Receive a progress event.
    fn emit(&self, event: InstallEvent);

    /// Decide how to handle an existing installation.
    fn request_decision(&self, request: &ClearDecision) -> ClearPolicy {
        request.default
    }
}

impl<F> Notifier for F
where
    F: Fn(InstallEvent) + Send + Sync,
{
    fn emit(&self, event: InstallEvent) {
        self(event)
    }

    fn request_decision(&self, _request: &ClearDecision) -> ClearPolicy {
        ClearPolicy::Skip
    }
}
