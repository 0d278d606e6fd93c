//! Hand-written lexer: splits source text into a flat token stream.
//!
//! Whitespace (other than newlines) is insignificant and dropped here.
//! Newlines are kept as explicit tokens because `spec.md` allows a line to
//! be terminated by either `;` or a newline. Structural punctuation
//! (`{ } ( ) [ ] ; @ ,`) always splits a token run, even when written with
//! no surrounding whitespace (`10 wall_balls;`, `@135kg`). Everything else
//! is grouped into maximal non-whitespace runs ("words"); the parser is
//! responsible for classifying a word as a keyword, identifier, or one of
//! the quantity/load literal shapes in `spec.md` §4.1.
//!
//! One deliberate simplification from the grammar as written in the
//! original prototype: that grammar tokenized with a dynamic/Earley lexer
//! and relied on the parser to resolve tokenization ambiguity between an
//! EMOM slot prefix (`1:`) and an `mm:ss` time literal (`1:00`). Here the
//! ambiguity is resolved lexically and unambiguously: a word is a slot
//! prefix only if the colon is its last character (nothing follows it in
//! the same whitespace-delimited run); a word with digits on both sides of
//! the colon is always a time literal. Every example in `spec.md` and the
//! original test suite is lexed identically under this rule.
//!
//! Token text is owned by a [`typed_arena::Arena`] so the token stream can
//! borrow `&str` slices without copying into a `String` per token.

use typed_arena::Arena;

use crate::error::{ParseError, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind<'a> {
    Word(&'a str),
    Str(&'a str),
    Newline,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    At,
    Comma,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokKind<'a>,
    pub pos: Pos,
}

const STRUCTURAL: &[char] = &['{', '}', '(', ')', '[', ']', ';', '@', ','];

/// Tokenizes `src`, allocating word/string text out of `arena`.
pub fn lex<'a>(src: &str, arena: &'a Arena<String>) -> Result<Vec<Token<'a>>, ParseError> {
    let mut toks = Vec::new();
    let mut line: u32 = 1;
    let mut col: u32 = 1;
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0usize;

    let advance = |i: &mut usize, line: &mut u32, col: &mut u32, c: char| {
        *i += 1;
        if c == '\n' {
            *line += 1;
            *col = 1;
        } else {
            *col += 1;
        }
    };

    while i < chars.len() {
        let c = chars[i];
        let pos = Pos { line, col };
        if c == '\n' {
            toks.push(Token {
                kind: TokKind::Newline,
                pos,
            });
            advance(&mut i, &mut line, &mut col, c);
            continue;
        }
        if c.is_whitespace() {
            advance(&mut i, &mut line, &mut col, c);
            continue;
        }
        if c == '/' && i + 1 < chars.len() && chars[i + 1] == '/' {
            while i < chars.len() && chars[i] != '\n' {
                advance(&mut i, &mut line, &mut col, chars[i]);
            }
            continue;
        }
        if let Some(kind) = structural_kind(c) {
            toks.push(Token { kind, pos });
            advance(&mut i, &mut line, &mut col, c);
            continue;
        }
        if c == '"' {
            advance(&mut i, &mut line, &mut col, c);
            let mut buf = String::new();
            let mut closed = false;
            while i < chars.len() {
                let cc = chars[i];
                if cc == '"' {
                    advance(&mut i, &mut line, &mut col, cc);
                    closed = true;
                    break;
                }
                if cc == '\\' && i + 1 < chars.len() {
                    advance(&mut i, &mut line, &mut col, cc);
                    let esc = chars[i];
                    buf.push(match esc {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    advance(&mut i, &mut line, &mut col, esc);
                    continue;
                }
                buf.push(cc);
                advance(&mut i, &mut line, &mut col, cc);
            }
            if !closed {
                return Err(ParseError::new(pos, "unterminated string literal"));
            }
            let text: &str = arena.alloc(buf).as_str();
            toks.push(Token {
                kind: TokKind::Str(text),
                pos,
            });
            continue;
        }
        // A maximal run of non-whitespace, non-structural characters.
        let mut buf = String::new();
        while i < chars.len() {
            let cc = chars[i];
            if cc.is_whitespace() || STRUCTURAL.contains(&cc) || cc == '"' {
                break;
            }
            buf.push(cc);
            advance(&mut i, &mut line, &mut col, cc);
        }
        let text: &str = arena.alloc(buf).as_str();
        toks.push(Token {
            kind: TokKind::Word(text),
            pos,
        });
    }
    toks.push(Token {
        kind: TokKind::Eof,
        pos: Pos { line, col },
    });
    Ok(toks)
}

fn structural_kind<'a>(c: char) -> Option<TokKind<'a>> {
    Some(match c {
        '{' => TokKind::LBrace,
        '}' => TokKind::RBrace,
        '(' => TokKind::LParen,
        ')' => TokKind::RParen,
        '[' => TokKind::LBracket,
        ']' => TokKind::RBracket,
        ';' => TokKind::Semi,
        '@' => TokKind::At,
        ',' => TokKind::Comma,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(src: &str) -> Vec<String> {
        let arena = Arena::new();
        lex(src, &arena)
            .unwrap()
            .into_iter()
            .filter_map(|t| match t.kind {
                TokKind::Word(w) => Some(format!("W:{w}")),
                TokKind::Str(s) => Some(format!("S:{s}")),
                TokKind::Newline => Some("NL".to_string()),
                TokKind::LBrace => Some("{".to_string()),
                TokKind::RBrace => Some("}".to_string()),
                TokKind::Semi => Some(";".to_string()),
                TokKind::At => Some("@".to_string()),
                TokKind::Comma => Some(",".to_string()),
                TokKind::LBracket => Some("[".to_string()),
                TokKind::RBracket => Some("]".to_string()),
                TokKind::LParen => Some("(".to_string()),
                TokKind::RParen => Some(")".to_string()),
                TokKind::Eof => None,
            })
            .collect()
    }

    #[test]
    fn splits_attached_punctuation() {
        assert_eq!(
            words("10 wall_balls;"),
            vec!["W:10", "W:wall_balls", ";"]
        );
    }

    #[test]
    fn at_sign_always_splits() {
        assert_eq!(words("@135kg"), vec!["@", "W:135kg"]);
    }

    #[test]
    fn slot_colon_vs_time_literal() {
        assert_eq!(words("1: 10 wall_balls"), vec!["W:1:", "W:10", "W:wall_balls"]);
        assert_eq!(words("1:00"), vec!["W:1:00"]);
    }

    #[test]
    fn standalone_colon_token() {
        assert_eq!(words("0:20 : 0:10"), vec!["W:0:20", "W::", "W:0:10"]);
    }

    #[test]
    fn string_literal() {
        assert_eq!(words(r#"WOD "Test""#), vec!["W:WOD", "S:Test"]);
    }

    #[test]
    fn comma_splits_without_space() {
        assert_eq!(words("[RX,SCALED]"), vec!["[", "W:RX", ",", "W:SCALED", "]"]);
    }
}
