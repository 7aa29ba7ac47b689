//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction so the session
//! loop never writes to the terminal directly.  The default implementation
//! uses ANSI escape codes to tell the professor, the learner, and status
//! lines apart.

use std::io::{self, Stdout, Write};

use crate::types::{ChatMessage, ChatRole};

/// ANSI escape code for dim text (used for status lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the professor label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the learner label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for remediation hints).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print a reply from the professor.
    fn print_reply(&mut self, text: &str);

    /// Print something the learner said (used when replaying history).
    fn print_user(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print a remediation hint that accompanies an error.
    fn print_hint(&mut self, hint: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Shown while a request is in flight.
    fn print_thinking_indicator(&mut self);

    /// Replays a transcript, skipping the system message.
    fn print_transcript(&mut self, messages: &[ChatMessage]) {
        for message in messages {
            match message.role {
                ChatRole::System => {}
                ChatRole::User => self.print_user(&message.content),
                ChatRole::Assistant => self.print_reply(&message.content),
            }
        }
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_labelled(&mut self, color: &str, label: &str, text: &str) {
        let label = if self.use_color {
            format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET}")
        } else {
            format!("{label}:")
        };
        println!("{label}");
        println!("{}", text.trim_end());
        println!();
        self.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_reply(&mut self, text: &str) {
        self.print_labelled(ANSI_CYAN, "Professor", text);
    }

    fn print_user(&mut self, text: &str) {
        self.print_labelled(ANSI_GREEN, "You", text);
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("{}", self.styled(ANSI_RED, &format!("Error: {error}")));
    }

    fn print_hint(&mut self, hint: &str) {
        eprintln!("{}", self.styled(ANSI_YELLOW, hint));
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    fn print_thinking_indicator(&mut self) {
        println!("{}", self.styled(ANSI_DIM, "Thinking..."));
        self.flush();
    }
}
