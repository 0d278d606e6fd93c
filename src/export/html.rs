//! Self-contained HTML export: one document, inline CSS, no external
//! assets. Good enough to open straight from disk in a browser.

use crate::ast::{Program, Segment, Stmt};
use crate::render::render_line;

const STYLE: &str = r#"<style>
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Helvetica,Arial;padding:24px;line-height:1.4}
h1{margin:0 0 8px}
.badge{display:inline-block;padding:2px 8px;border-radius:999px;background:#eee;margin-right:8px;font-size:12px}
.block{border:1px solid #e5e7eb;border-radius:12px;padding:12px;margin:12px 0}
.line{padding:2px 0}
.meta{color:#555;margin-bottom:12px}
</style>"#;

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn tiebreak_text(ast_seg: &crate::ast::Tiebreak) -> String {
    use crate::ast::Tiebreak::*;
    match ast_seg {
        AfterThrusters { count } => format!("after {count} thrusters"),
        AfterReps { count } => format!("after {count} reps"),
        AfterCal { count } => format!("after {count} cal"),
        AfterMovement { movement } => format!("after movement {movement}"),
    }
}

/// Builds the HTML document text for a resolved program.
pub fn to_html(ast: &Program) -> String {
    let title = ast.meta.title.clone().unwrap_or_else(|| "WOD".to_string());
    let mut out = String::new();
    out.push_str("<!doctype html><html><head><meta charset=\"utf-8\"><title>WOD</title>\n");
    out.push_str(STYLE);
    out.push_str("</head><body>");
    out.push_str(&format!("<h1>{}</h1>", escape_html(&title)));

    let mut chips = Vec::new();
    if let Some(team) = &ast.meta.team {
        chips.push(format!("<span class='badge'>Team {}</span>", team.size));
    }
    if let Some(cap) = ast.meta.cap {
        chips.push(format!("<span class='badge'>Cap {}m</span>", cap / 60));
    }
    if let Some(primary) = ast.meta.score.get("primary") {
        chips.push(format!(
            "<span class='badge'>Score {}</span>",
            escape_html(primary)
        ));
    }
    if !chips.is_empty() {
        out.push_str(&format!("<div class='meta'>{}</div>", chips.join(" ")));
    }

    for seg in &ast.program {
        match seg {
            Segment::Rest { duration } => {
                out.push_str(&format!(
                    "<div class='block'><strong>REST</strong> {duration}s</div>"
                ));
            }
            Segment::Buyin { stmts } => {
                out.push_str("<div class='block'><strong>BUYIN</strong>");
                for line in stmts {
                    out.push_str(&format!(
                        "<div class='line'>{}</div>",
                        escape_html(&render_line(line))
                    ));
                }
                out.push_str("</div>");
            }
            Segment::Cashout { stmts } => {
                out.push_str("<div class='block'><strong>CASHOUT</strong>");
                for line in stmts {
                    out.push_str(&format!(
                        "<div class='line'>{}</div>",
                        escape_html(&render_line(line))
                    ));
                }
                out.push_str("</div>");
            }
            Segment::Block(b) => {
                out.push_str(&format!(
                    "<div class='block'><strong>{}</strong>",
                    b.head.mode_name()
                ));
                if let crate::ast::BlockHead::Amrap { duration }
                | crate::ast::BlockHead::Emom { duration } = b.head
                {
                    out.push_str(&format!(" <em>{duration}s</em>"));
                }
                let mut badges = Vec::new();
                if let Some(work) = &b.work {
                    badges.push(work.mode_name().to_string());
                }
                if let Some(partition) = &b.partition {
                    badges.push(format!("partition:{}", partition.mode_name()));
                }
                if let Some(cap) = b.cap {
                    badges.push(format!("cap:{cap}s"));
                }
                if !badges.is_empty() {
                    out.push_str(&format!(
                        "<div class='meta'>{}</div>",
                        badges.join(" \u{b7} ")
                    ));
                }
                for stmt in &b.stmts {
                    let line = match stmt {
                        Stmt::Line(l) => l,
                        Stmt::Slot(s) => &s.line,
                    };
                    out.push_str(&format!(
                        "<div class='line'>{}</div>",
                        escape_html(&render_line(line))
                    ));
                }
                if let Some(tb) = &b.tiebreak {
                    out.push_str(&format!(
                        "<div class='meta'><em>TIEBREAK</em> {}</div>",
                        escape_html(&tiebreak_text(tb))
                    ));
                }
                out.push_str("</div>");
            }
            Segment::TrackBlock { .. } => {}
        }
    }
    out.push_str("</body></html>");
    out
}
