//! Front end of the ace-install binary.

pub mod args;
pub mod logging;
pub mod notifier;

pub use args::Cli;
pub use notifier::ConsoleNotifier;
