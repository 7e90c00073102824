//! User-facing notification port.
//!
//! The hosting shell injects this capability into the view layer instead
//! of the view reaching for a global, so tests can substitute a mock.
//! Notices are non-blocking and dismissable; no failure routed through
//! here may take the application down.

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Show one notice to the user.
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Prints notices to the terminal, above the prompt.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let tag = match level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        println!("\n[{tag}] {message}");
    }
}
