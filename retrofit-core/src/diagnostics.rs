//! Colorized, non-fatal diagnostics for skipped call sites.
//!
//! Every shape the rewrite engine cannot handle is reported here and the
//! file keeps processing; nothing in this module is an error path.

/// ANSI color codes
pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GRAY: &str = "\x1b[90m";
    pub const BG_RED: &str = "\x1b[41m";
    pub const WHITE: &str = "\x1b[37m";
}

/// Determine if color should be used based on mode and environment
pub fn should_use_color(mode: &str) -> bool {
    match mode {
        "always" => true,
        "never" => false,
        _ => {
            // Auto mode: check if stderr is a tty and NO_COLOR is not set
            atty::is(atty::Stream::Stderr) && std::env::var("NO_COLOR").is_err()
        }
    }
}

/// Sink for skip/ambiguity reports. Cheap to copy and share across
/// worker threads.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    use_color: bool,
    verbose: bool,
    silent: bool,
}

impl Diagnostics {
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Diagnostics {
            use_color,
            verbose,
            silent: false,
        }
    }

    /// Silent sink for tests.
    pub fn quiet() -> Self {
        Diagnostics {
            use_color: false,
            verbose: false,
            silent: true,
        }
    }

    /// Report a skipped call site with the offending source highlighted.
    pub fn skip(&self, label: &str, snippet: &str) {
        if self.silent {
            return;
        }
        if self.use_color {
            eprintln!(
                "{}{}{} {}{}{}{}",
                ansi::BOLD,
                label,
                ansi::RESET,
                ansi::BG_RED,
                ansi::WHITE,
                snippet,
                ansi::RESET,
            );
        } else {
            eprintln!("{} {}", label, snippet);
        }
    }

    /// Verbose-only note.
    pub fn note(&self, msg: &str) {
        if self.verbose && !self.silent {
            if self.use_color {
                eprintln!("{}{}{}", ansi::GRAY, msg, ansi::RESET);
            } else {
                eprintln!("{}", msg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_use_color_explicit_modes() {
        assert!(should_use_color("always"));
        assert!(!should_use_color("never"));
    }
}
