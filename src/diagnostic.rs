use crate::span::Span;

/// A translator diagnostic (error, warning, or informational note).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self::with_severity(Severity::Error, message, span)
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self::with_severity(Severity::Warning, message, span)
    }

    pub fn info(message: String, span: Span) -> Self {
        Self::with_severity(Severity::Info, message, span)
    }

    fn with_severity(severity: Severity, message: String, span: Span) -> Self {
        Self {
            severity,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Info => Color::Cyan,
        };

        // Clamp so a span past the end of a truncated source cannot panic ariadne.
        let len = source.len();
        let start = (self.span.start as usize).min(len);
        let end = (self.span.end as usize).clamp(start, len);

        let mut report = Report::build(kind, filename, start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        if let Err(e) = report
            .finish()
            .eprint((filename, Source::from(source)))
        {
            eprintln!("{}: {} ({})", filename, self.message, e);
        }
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

/// True if any diagnostic in the list is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let span = Span::new(0, 10, 15);
        let d = Diagnostic::error("unresolvable operand".to_string(), span);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "unresolvable operand");
        assert_eq!(d.span.start, 10);
        assert_eq!(d.span.end, 15);
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn test_info_is_not_error() {
        let d = Diagnostic::info("no CUDA constructs found".to_string(), Span::dummy());
        assert_eq!(d.severity, Severity::Info);
        assert!(!d.is_error());
        assert!(!has_errors(&[d]));
    }

    #[test]
    fn test_chained_builders() {
        let d = Diagnostic::warning("unsupported CUDA call".to_string(), Span::new(0, 0, 5))
            .with_note("cudaSetDevice has no OpenCL counterpart here".to_string())
            .with_help("select the device during context creation".to_string())
            .with_note("call left unmodified".to_string());
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.notes.len(), 2);
        assert!(d.help.is_some());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_render_does_not_panic() {
        let source = "int main() {\n    cudaSetDevice(0);\n}\n";
        let d = Diagnostic::warning("unsupported CUDA call".to_string(), Span::new(0, 17, 33))
            .with_note("left unmodified".to_string());
        d.render("test.cu", source);
    }

    #[test]
    fn test_render_out_of_range_span_does_not_panic() {
        let d = Diagnostic::error("missing entry point".to_string(), Span::new(0, 90, 99));
        render_diagnostics(&[d], "test.cu", "int x;\n");
    }
}
