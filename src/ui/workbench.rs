/// Workbench: window-level state shared by every command.
///
/// Holds the context flags keybindings are conditioned on and the
/// transient information message shown above the help bar.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::sim::host::Window;

/// How long an information message stays up.
const MESSAGE_TTL: Duration = Duration::from_millis(2500);

pub struct Workbench {
    contexts: HashMap<&'static str, bool>,
    message: Option<(String, Instant)>,
}

impl Workbench {
    pub fn new() -> Self {
        Workbench {
            contexts: HashMap::new(),
            message: None,
        }
    }

    /// Unset flags read as false.
    pub fn context(&self, key: &str) -> bool {
        self.contexts.get(key).copied().unwrap_or(false)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|(m, _)| m.as_str())
    }

    /// Drop the message once it has been up for `MESSAGE_TTL`.
    pub fn expire_message(&mut self, now: Instant) {
        if let Some((_, shown)) = &self.message {
            if now.duration_since(*shown) >= MESSAGE_TTL {
                self.message = None;
            }
        }
    }
}

impl Window for Workbench {
    fn show_information_message(&mut self, text: &str) {
        tracing::info!(message = text, "info");
        self.message = Some((text.to_string(), Instant::now()));
    }

    fn set_context(&mut self, key: &'static str, value: bool) {
        tracing::debug!(key, value, "set context");
        self.contexts.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_default_to_false() {
        let mut wb = Workbench::new();
        assert!(!wb.context("beat-code.activated"));
        wb.set_context("beat-code.activated", true);
        assert!(wb.context("beat-code.activated"));
        wb.set_context("beat-code.activated", false);
        assert!(!wb.context("beat-code.activated"));
    }

    #[test]
    fn messages_expire() {
        let mut wb = Workbench::new();
        wb.show_information_message("hello");
        let now = Instant::now();
        wb.expire_message(now);
        assert_eq!(wb.message(), Some("hello"));
        wb.expire_message(now + MESSAGE_TTL);
        assert_eq!(wb.message(), None);
    }
}
