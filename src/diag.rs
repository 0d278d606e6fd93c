//! Human-facing diagnostic rendering. Parse failures get a source
//! snippet via `annotate-snippets`; lint diagnostics are rendered as the
//! plain `LEVEL CODE PATH: MSG` line the CLI surface contract specifies.

use annotate_snippets::display_list::DisplayList;
use annotate_snippets::snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation};

use crate::error::ParseError;
use crate::linter::Diagnostic;

/// Renders a fatal parse error as a source-annotated snippet, the way a
/// compiler front end would.
pub fn render_parse_error(filename: &str, src: &str, err: &ParseError) -> String {
    let line_no = err.pos.line.max(1) as usize;
    let line_text = src.lines().nth(line_no - 1).unwrap_or("");
    let len = line_text.len();
    let col0 = (err.pos.col.saturating_sub(1) as usize).min(len);
    let end = if len == 0 { 0 } else { (col0 + 1).min(len) };

    let snippet = Snippet {
        title: Some(Annotation {
            label: Some(&err.msg),
            id: None,
            annotation_type: AnnotationType::Error,
        }),
        footer: vec![],
        slices: vec![Slice {
            source: line_text,
            line_start: line_no,
            origin: Some(filename),
            fold: false,
            annotation: vec![SourceAnnotation {
                label: "",
                annotation_type: AnnotationType::Error,
                range: (col0, end),
            }],
        }],
    };
    DisplayList::from(snippet).to_string()
}

/// Formats one lint diagnostic as `LEVEL CODE PATH: MSG`, matching the
/// CLI `lint` subcommand's documented output format exactly.
pub fn format_diagnostic(d: &Diagnostic) -> String {
    format!(
        "{} {} {}: {}",
        d.level.as_str().to_uppercase(),
        d.code,
        d.path,
        d.msg
    )
}
