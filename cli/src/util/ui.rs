use std::io::Write;

use color_eyre::Report;
use console::style;

/// Writes CLI progress to stdout and failures to stderr.
///
/// Nested steps are indented with [`UI::indent`] / [`UI::outdent`]. Output of
/// [`UI::log`] is suppressed when `debug` is off.
pub struct UI<'a> {
    indentation: usize,
    color: bool,
    debug: bool,
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
}

impl<'a> UI<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write, color: bool, debug: bool) -> Self {
        Self {
            indentation: 0,
            color,
            debug,
            out,
            err,
        }
    }

    pub fn indent(&mut self) {
        self.indentation += 1;
    }

    pub fn outdent(&mut self) {
        self.indentation = self.indentation.saturating_sub(1);
    }

    pub fn log(&mut self, msg: &str) {
        if self.debug {
            let line = format!("{}{}", self.prefix(), msg);
            let _ = writeln!(self.out, "{}", style(line).dim().force_styling(self.color));
        }
    }

    pub fn info(&mut self, msg: &str) {
        let line = format!("{}ℹ️ {}", self.prefix(), msg);
        let _ = writeln!(self.out, "{}", style(line).cyan().force_styling(self.color));
    }

    pub fn success(&mut self, msg: &str) {
        let line = format!("{}✅ {}", self.prefix(), msg);
        let _ = writeln!(self.out, "{}", style(line).green().force_styling(self.color));
    }

    /// Prints `msg` and, in debug mode, the whole error chain of `report`.
    pub fn error(&mut self, msg: &str, report: &Report) {
        let line = format!("{}❌ {}", self.prefix(), msg);
        let _ = writeln!(self.err, "{}", style(line).red().bold().force_styling(self.color));

        if self.debug {
            for cause in report.chain().skip(1) {
                let line = format!("{}   caused by: {}", self.prefix(), cause);
                let _ = writeln!(self.err, "{}", style(line).red().force_styling(self.color));
            }
        }
    }

    fn prefix(&self) -> String {
        "  ".repeat(self.indentation)
    }
}
