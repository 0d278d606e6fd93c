//! The linter: walks a resolved AST and emits coded diagnostics. Never
//! raises — diagnostics are data, consumed by the CLI's `lint` command
//! (nonzero exit if any are errors) and by every export surface that
//! wants to flag a program before rendering it.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::*;
use crate::resolver::is_known_movement;

lazy_static! {
    static ref RE_LOAD_OK: Regex = Regex::new(r"^\d+(\.\d+)?(kg|lb|cm|in|m|km|%.*)?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub code: &'static str,
    pub path: String,
    pub msg: String,
}

impl Diagnostic {
    fn new(level: Level, code: &'static str, path: impl Into<String>, msg: impl Into<String>) -> Self {
        Diagnostic {
            level,
            code,
            path: path.into(),
            msg: msg.into(),
        }
    }
}

fn check_line(line: &Line, path: &str, out: &mut Vec<Diagnostic>) {
    if !is_known_movement(&line.movement) {
        out.push(Diagnostic::new(
            Level::Warning,
            "W001",
            path,
            format!("Unknown movement '{}'", line.movement),
        ));
    }
    if let Some(Load::Raw { value }) = &line.load {
        if !RE_LOAD_OK.is_match(value) {
            out.push(Diagnostic::new(
                Level::Warning,
                "W002",
                path,
                format!("Suspicious load '{value}'"),
            ));
        }
    }
}

/// Runs the lint pass over a resolved AST.
pub fn lint(ast: &Program) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    for note in &ast.meta.normalized {
        out.push(Diagnostic::new(
            Level::Warning,
            "W050",
            "META",
            format!("Alias '{}' -> '{}'", note.from, note.to),
        ));
    }

    for (i, seg) in ast.program.iter().enumerate() {
        match seg {
            Segment::Buyin { stmts } => {
                for (j, line) in stmts.iter().enumerate() {
                    check_line(line, &format!("BUYIN[{j}]"), &mut out);
                }
            }
            Segment::Cashout { stmts } => {
                for (j, line) in stmts.iter().enumerate() {
                    check_line(line, &format!("CASHOUT[{j}]"), &mut out);
                }
            }
            Segment::Rest { duration } => {
                if *duration <= 0 {
                    out.push(Diagnostic::new(
                        Level::Error,
                        "E010",
                        format!("REST[{i}]"),
                        "REST must be > 0",
                    ));
                }
            }
            Segment::Block(b) => {
                if matches!(b.head, BlockHead::Emom { .. })
                    && !b.stmts.iter().any(|s| matches!(s, Stmt::Slot(_)))
                {
                    out.push(Diagnostic::new(
                        Level::Error,
                        "E020",
                        format!("BLOCK[{i}]"),
                        "EMOM has no slots",
                    ));
                }
                for (j, stmt) in b.stmts.iter().enumerate() {
                    let line = match stmt {
                        Stmt::Line(l) => l,
                        Stmt::Slot(s) => &s.line,
                    };
                    check_line(line, &format!("BLOCK[{i}].LINE[{j}]"), &mut out);
                }
            }
            Segment::TrackBlock { .. } => {}
        }
    }
    out
}

/// `true` if any diagnostic in `diags` is an error; used by the CLI to
/// pick the `lint` subcommand's exit code.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.level == Level::Error)
}
