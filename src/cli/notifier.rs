//! Terminal notifier: progress bars and the clear-policy prompt.

use ace_installer::{ClearDecision, ClearPolicy, InstallEvent, Notifier};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Select;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, warn};

const BYTES_TEMPLATE: &str = "   [{bar:50.green/blue}] {bytes}/{total_bytes}  {msg}";
const SPINNER_TEMPLATE: &str = "   {spinner:.green} {bytes}  {msg}";
const ENTRIES_TEMPLATE: &str = "   [{bar:50.cyan/blue}] {pos}/{len} entries";

/// Renders installation events on the terminal.
pub struct ConsoleNotifier {
    interactive: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleNotifier {
    /// Create a notifier. When `interactive` is false, decisions are answered
    /// with their default without prompting.
    pub fn new(interactive: bool) -> Self {
        Self {
            interactive,
            bar: Mutex::new(None),
        }
    }

    fn start_bar(&self, bar: ProgressBar) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn with_bar(&self, update: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                update(bar);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn emit(&self, event: InstallEvent) {
        match event {
            InstallEvent::ClearComplete => println!("  Previous installation removed"),
            InstallEvent::DownloadStarted { url } => {
                println!("  Downloading {}", url);
                let bar = ProgressBar::new_spinner();
                bar.set_style(style(SPINNER_TEMPLATE));
                self.start_bar(bar);
            }
            InstallEvent::DownloadSizeKnown { total } => self.with_bar(|bar| {
                bar.set_style(style(BYTES_TEMPLATE).progress_chars("█▓░"));
                bar.set_length(total);
            }),
            InstallEvent::DownloadProgress { transferred } => {
                self.with_bar(|bar| bar.set_position(transferred))
            }
            InstallEvent::DownloadComplete { path } => {
                self.finish_bar();
                debug!(path = %path.display(), "archive downloaded");
            }
            InstallEvent::ExtractStarted { destination } => {
                println!("  Extracting to {}", destination.display());
            }
            InstallEvent::ExtractSizeKnown { entries } => {
                let bar = ProgressBar::new(entries as u64);
                bar.set_style(style(ENTRIES_TEMPLATE).progress_chars("█▓░"));
                self.start_bar(bar);
            }
            InstallEvent::ExtractProgress { extracted } => {
                self.with_bar(|bar| bar.set_position(extracted as u64))
            }
            InstallEvent::ExtractComplete => self.finish_bar(),
            InstallEvent::ArchiveClearing { path } => {
                debug!(path = %path.display(), "removing archive");
            }
        }
    }

    fn request_decision(&self, request: &ClearDecision) -> ClearPolicy {
        if !self.interactive {
            return request.default;
        }

        let choices: Vec<Choice> = request.choices.iter().copied().map(Choice).collect();
        let cursor = request
            .choices
            .iter()
            .position(|policy| *policy == request.default)
            .unwrap_or(0);
        let message = format!(
            "Ace is already installed in {}. What should happen to it?",
            request.target.display()
        );

        match Select::new(&message, choices).with_starting_cursor(cursor).prompt() {
            Ok(Choice(policy)) => policy,
            Err(e) => {
                warn!(error = %e, "no answer to the clear prompt, skipping installation");
                ClearPolicy::Skip
            }
        }
    }
}

struct Choice(ClearPolicy);

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.label())
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}
