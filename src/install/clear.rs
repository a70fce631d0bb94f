//! Handling of a prior installation in the target directory.

use crate::install::tree::{remove_tree, Removal};
use crate::install::{ClearDecision, ClearPolicy, InstallError, InstallEvent, InstallRequest};
use tracing::{debug, info};

/// States of the clear phase.
///
/// `Unchecked` and `DecisionPending` are transient; [`run`] always returns
/// one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearState {
    /// The marker has not been looked at yet.
    Unchecked,
    /// No installation found; nothing to clear.
    NotInstalled,
    /// An installation exists and no policy was given.
    DecisionPending,
    /// The prior installation was removed.
    Dropping,
    /// The prior installation stays and will be overwritten.
    Kept,
    /// The caller chose not to install.
    Skipped,
}

impl ClearState {
    /// Whether installation continues after this state.
    pub fn proceeds(&self) -> bool {
        !matches!(self, Self::Skipped)
    }

    fn step(self, request: &InstallRequest) -> Result<Self, InstallError> {
        match self {
            Self::Unchecked if !request.is_installed() => Ok(Self::NotInstalled),
            Self::Unchecked => match request.clear_policy {
                Some(policy) => Self::apply(policy, request),
                None => Ok(Self::DecisionPending),
            },
            Self::DecisionPending => {
                let policy = match &request.notifier {
                    Some(notifier) => {
                        let decision = ClearDecision::new(request.target_path.clone());
                        let policy = notifier.request_decision(&decision);
                        debug!(%policy, "clear policy decided by notifier");
                        policy
                    }
                    None => {
                        debug!("no notifier to ask, skipping existing installation");
                        ClearPolicy::Skip
                    }
                };
                Self::apply(policy, request)
            }
            terminal => Ok(terminal),
        }
    }

    fn apply(policy: ClearPolicy, request: &InstallRequest) -> Result<Self, InstallError> {
        match policy {
            ClearPolicy::Drop => {
                info!(target = %request.target_path.display(), "dropping existing installation");
                remove_tree("clear", &request.target_path, Removal::ContentsOnly)?;
                if let Some(notifier) = &request.notifier {
                    notifier.emit(InstallEvent::ClearComplete);
                }
                Ok(Self::Dropping)
            }
            ClearPolicy::Keep => Ok(Self::Kept),
            ClearPolicy::Skip => Ok(Self::Skipped),
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unchecked | Self::DecisionPending)
    }
}

/// Detect a prior installation and apply the clear policy to it.
pub(crate) fn run(request: &InstallRequest) -> Result<ClearState, InstallError> {
    let mut state = ClearState::Unchecked;
    while !state.is_terminal() {
        state = state.step(request)?;
    }
    debug!(?state, "clear phase finished");
    Ok(state)
}
