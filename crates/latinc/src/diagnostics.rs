use std::fmt;
use std::io::IsTerminal;
use std::ops::Range;
use std::path::Path;

use ariadne::{sources, Config, Label, Report, ReportKind};

use crate::tokenizer::Position;
use crate::CompileError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticStage {
    Tokenize,
    Parse,
    Io,
    Internal,
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticStage::Tokenize => "tokenize",
            DiagnosticStage::Parse => "parse",
            DiagnosticStage::Io => "io",
            DiagnosticStage::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLabel {
    pub span: Range<usize>,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct CompilerDiagnostic {
    pub code: String,
    pub stage: DiagnosticStage,
    pub message: String,
    pub labels: Vec<SourceLabel>,
    pub notes: Vec<String>,
    pub help: Option<String>,
    pub source: Option<(String, String)>,
}

impl CompilerDiagnostic {
    pub fn new(
        code: impl Into<String>,
        stage: DiagnosticStage,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            stage,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
            source: None,
        }
    }

    pub fn with_source(mut self, file_id: impl Into<String>, source: impl Into<String>) -> Self {
        self.source = Some((file_id.into(), source.into()));
        self
    }

    /// Labels always point into the attached source.
    pub fn with_label(mut self, span: Range<usize>, message: impl Into<String>) -> Self {
        self.labels.push(SourceLabel {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn render_plain(&self) -> String {
        self.render_with_color(false)
    }

    pub fn render_terminal_auto(&self) -> String {
        self.render_with_color(std::io::stderr().is_terminal())
    }

    fn render_with_color(&self, use_color: bool) -> String {
        let (file_id, text) = self
            .source
            .clone()
            .unwrap_or_else(|| ("<unknown>".to_string(), String::new()));
        let primary_span = self
            .labels
            .first()
            .map_or(0..1, |label| sanitize_span(&label.span));

        let mut report = Report::build(ReportKind::Error, (file_id.clone(), primary_span))
            .with_code(self.code.clone())
            .with_message(self.headline())
            .with_config(Config::default().with_color(use_color));

        for label in &self.labels {
            report = report.with_label(
                Label::new((file_id.clone(), sanitize_span(&label.span)))
                    .with_message(label.message.clone()),
            );
        }

        for note in &self.notes {
            report = report.with_note(note.clone());
        }

        if let Some(help) = &self.help {
            report = report.with_help(help.clone());
        }

        let mut output = Vec::new();
        match report
            .finish()
            .write(sources([(file_id, text)]), &mut output)
        {
            Ok(()) => String::from_utf8_lossy(&output).trim_end().to_string(),
            Err(_) => self.fallback_render(),
        }
    }

    fn headline(&self) -> String {
        format!("error[{}:{}]: {}", self.stage, self.code, self.message)
    }

    fn fallback_render(&self) -> String {
        let notes = self.notes.iter().map(|note| format!("note: {note}"));
        let help = self.help.iter().map(|help| format!("help: {help}"));
        std::iter::once(self.headline())
            .chain(notes)
            .chain(help)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for CompilerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_plain())
    }
}

pub fn diagnostic_from_anyhow(
    stage: DiagnosticStage,
    code: impl Into<String>,
    message: impl Into<String>,
    error: &anyhow::Error,
) -> CompilerDiagnostic {
    let mut diagnostic = CompilerDiagnostic::new(code, stage, message);

    let mut causes = error.chain();
    if let Some(primary) = causes.next() {
        diagnostic.message = format!("{}: {}", diagnostic.message, primary);
    }
    for cause in causes {
        diagnostic = diagnostic.with_note(format!("caused by: {cause}"));
    }

    diagnostic
}

/// Builds a diagnostic pointing at the character a stage failed on.
pub fn diagnostic_from_compile_error(
    source: &str,
    source_path: Option<&Path>,
    error: &CompileError,
) -> CompilerDiagnostic {
    let file_id = file_id_from_path(source_path);
    let (code, stage, message) = match error {
        CompileError::Lex(_) => (
            "LATINC-TOKENIZE-001",
            DiagnosticStage::Tokenize,
            "tokenization failed",
        ),
        CompileError::Parse(_) => ("LATINC-PARSE-001", DiagnosticStage::Parse, "parse failed"),
    };

    let diagnostic =
        CompilerDiagnostic::new(code, stage, message).with_source(file_id, source);
    match error.position() {
        Some(position) => diagnostic
            .with_label(span_from_position(source, &position), error.to_string())
            .with_note(format!(
                "at line {}, column {}",
                position.line, position.column
            )),
        None => diagnostic
            .with_note(error.to_string())
            .with_help("every statement must be complete before the end of the file"),
    }
}

pub fn file_id_from_path(path: Option<&Path>) -> String {
    path.map(|value| value.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}

/// Span of the character at `position`. Positions past the end of `source`
/// (the terminator the tokenizer appends) land on its last character.
pub fn span_from_position(source: &str, position: &Position) -> Range<usize> {
    let start = if position.offset < source.len() {
        position.offset
    } else {
        source
            .char_indices()
            .last()
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    };
    let end = next_char_boundary(source, start);
    sanitize_span(&(start..end))
}

/// Widens an empty span to one byte so ariadne still draws a marker.
pub fn sanitize_span(span: &Range<usize>) -> Range<usize> {
    span.start..span.end.max(span.start + 1)
}

/// Byte offset just past the character starting at `start`.
pub fn next_char_boundary(source: &str, start: usize) -> usize {
    source
        .get(start..)
        .and_then(|rest| rest.chars().next())
        .map_or(start + 1, |c| start + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use crate::{compile, parser, LexError};

    #[test]
    fn tokenizer_error_marks_offending_character() {
        let source = "dico a esse I;\ndico b esse $;\n";
        let err = compile(source).expect_err("compile should fail");
        let diagnostic = diagnostic_from_compile_error(source, None, &err);
        assert_eq!(diagnostic.stage, DiagnosticStage::Tokenize);
        assert_eq!(diagnostic.labels.len(), 1);
        let span = diagnostic.labels[0].span.clone();
        assert_eq!(&source[span], "$");
        assert_eq!(diagnostic.notes, vec!["at line 2, column 13".to_string()]);
    }

    #[test]
    fn unmatched_brace_marks_the_brace() {
        let source = "si (a sit b) {\n  dico c esse I;";
        let err = tokenize(source).expect_err("tokenize should fail");
        let diagnostic = diagnostic_from_compile_error(source, None, &err.clone().into());
        assert!(matches!(err, LexError::UnmatchedOpening { .. }));
        assert_eq!(&source[diagnostic.labels[0].span.clone()], "{");
    }

    #[test]
    fn parse_error_without_position_gets_a_note() {
        let err: CompileError = parser::ParseError::UnexpectedEnd.into();
        let diagnostic = diagnostic_from_compile_error("dico a esse", None, &err);
        assert_eq!(diagnostic.code, "LATINC-PARSE-001");
        assert!(diagnostic.labels.is_empty());
        assert_eq!(diagnostic.notes, vec!["unexpected end of input".to_string()]);
    }

    #[test]
    fn positions_past_the_end_land_on_the_last_character() {
        let source = "dico a";
        let position = Position {
            offset: 6,
            line: 1,
            column: 7,
        };
        assert_eq!(span_from_position(source, &position), 5..6);
    }

    #[test]
    fn plain_rendering_does_not_contain_ansi_sequences() {
        let source = "dico age XVIII;";
        let err = compile(source).expect_err("compile should fail");
        let text = diagnostic_from_compile_error(source, Some(Path::new("aetas.la")), &err)
            .render_plain();
        assert!(!text.contains("\u{1b}["));
        assert!(text.contains("LATINC-PARSE-001"));
        assert!(text.contains("aetas.la"));
    }

    #[test]
    fn plain_rendering_works_without_labels() {
        let diagnostic = CompilerDiagnostic::new("LATINC-IO-001", DiagnosticStage::Io, "read failed")
            .with_note("no such file");
        let text = diagnostic.render_plain();
        assert!(text.contains("read failed"));
        assert!(text.contains("LATINC-IO-001"));
    }

    #[test]
    fn fallback_lists_notes_then_help() {
        let diagnostic =
            CompilerDiagnostic::new("LATINC-PARSE-001", DiagnosticStage::Parse, "parse failed")
                .with_note("unexpected end of input")
                .with_help("finish the statement");
        assert_eq!(
            diagnostic.fallback_render(),
            "error[parse:LATINC-PARSE-001]: parse failed\n\
             note: unexpected end of input\n\
             help: finish the statement"
        );
    }

    #[test]
    fn empty_spans_are_widened() {
        assert_eq!(sanitize_span(&(4..4)), 4..5);
        assert_eq!(sanitize_span(&(2..6)), 2..6);
        assert_eq!(next_char_boundary("aé", 1), 3);
    }

    #[test]
    fn anyhow_causes_become_notes() {
        let err = anyhow::anyhow!("disk on fire").context("could not open aetas.la");
        let diagnostic =
            diagnostic_from_anyhow(DiagnosticStage::Io, "LATINC-IO-001", "read failed", &err);
        assert_eq!(diagnostic.message, "read failed: could not open aetas.la");
        assert_eq!(diagnostic.notes, vec!["caused by: disk on fire".to_string()]);
    }
}
