//! Terminal output for the `miso` binary
//!
//! Only human-facing text goes through here; everything else is a tracing
//! event. Colour is used when both stdout and stderr are terminals and
//! `NO_COLOR` is unset.

use std::io::{self, IsTerminal};

use miso_core::error::MisoError;

const RED: &str = "31";
const GREEN: &str = "32";
const DIM: &str = "2";

pub struct OutputHandler {
    colors: bool,
}

impl OutputHandler {
    pub fn new() -> Self {
        let colors = std::env::var_os("NO_COLOR").is_none()
            && io::stdout().is_terminal()
            && io::stderr().is_terminal();
        Self { colors }
    }

    /// Handler that never emits escape codes
    pub fn plain() -> Self {
        Self { colors: false }
    }

    pub fn info(&self, message: &str) {
        println!("{}", message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.paint(GREEN, "✓"), message);
    }

    /// Print a failed command's error with its suggestion and cause chain
    pub fn report(&self, error: &anyhow::Error) {
        eprintln!("{}", self.format_error(error));
    }

    pub fn format_error(&self, error: &anyhow::Error) -> String {
        let mut output = format!("{}: {}", self.paint(RED, "error"), error);

        if let Some(suggestion) = error.downcast_ref::<MisoError>().and_then(MisoError::suggestion) {
            output.push_str(&format!("\n\n{}: {}", self.paint(DIM, "help"), suggestion));
        }

        for cause in error.chain().skip(1) {
            output.push_str(&format!("\n{}: {}", self.paint(DIM, "caused by"), cause));
        }

        output
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.colors {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_includes_suggestion() {
        let err = anyhow::Error::new(MisoError::ConfigNotFound {
            searched: "/app/config, ./config".to_string(),
        });

        let text = OutputHandler::plain().format_error(&err);

        assert!(text.starts_with("error: "));
        assert!(text.contains("/app/config, ./config"));
        assert!(text.contains("help: "));
    }

    #[test]
    fn test_format_error_lists_context_chain() {
        let err = anyhow::Error::new(std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"))
            .context("failed to bind 0.0.0.0:8080");

        let text = OutputHandler::plain().format_error(&err);

        assert!(text.starts_with("error: failed to bind 0.0.0.0:8080"));
        assert!(text.contains("caused by: in use"));
        assert!(!text.contains('\x1b'));
    }
}
