//! Hand-written recursive-descent parser: folds the token stream straight
//! into [`crate::ast`] types.
//!
//! The grammar in `spec.md` §4.1 describes a concrete parse tree and a
//! separate AST-folding step; here the two are merged, the way a small
//! recursive-descent parser naturally would — there is no intermediate
//! parse tree to walk a second time. Quantity/load literal classification
//! (the precedence table in §4.1) is implemented with a fixed set of
//! regexes tried in the order the spec lists, most specific first.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use typed_arena::Arena;

use crate::ast::*;
use crate::error::{ParseError, Pos};
use crate::lexer::{lex, TokKind, Token};

lazy_static! {
    static ref RE_DUAL_DIST: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)/(\d+(?:\.\d+)?)(m|km)$").unwrap();
    static ref RE_DUAL_NUM: Regex = Regex::new(r"^(\d+(?:\.\d+)?)/(\d+(?:\.\d+)?)$").unwrap();
    static ref RE_DIST: Regex = Regex::new(r"^(\d+(?:\.\d+)?)(m|km)$").unwrap();
    static ref RE_MMSS: Regex = Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap();
    static ref RE_SECS: Regex = Regex::new(r"^(\d+)s$").unwrap();
    static ref RE_MINUTES: Regex = Regex::new(r"^(\d+)m$").unwrap();
    static ref RE_INT: Regex = Regex::new(r"^\d+$").unwrap();
    static ref RE_NUMBER: Regex = Regex::new(r"^\d+(?:\.\d+)?$").unwrap();
    static ref RE_LOAD_DUAL: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)/(\d+(?:\.\d+)?)(kg|lb|cm|in|m|km|%)$").unwrap();
    static ref RE_LOAD_SINGLE: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)(kg|lb|cm|in|m|km|%)$").unwrap();
}

/// Parses `src` into a [`Program`]. This is the only public entry point
/// into the lexer/parser pair.
pub fn parse_program(src: &str) -> Result<Program, ParseError> {
    let arena = Arena::new();
    let toks = lex(src, &arena)?;
    let mut p = Parser { toks: &toks, idx: 0 };
    p.parse_program()
}

struct Parser<'a> {
    toks: &'a [Token<'a>],
    idx: usize,
}

fn is_ident(w: &str) -> bool {
    let mut chars = w.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn slot_prefix(w: &str) -> Option<u32> {
    let digits = w.strip_suffix(':')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_time_word(w: &str) -> Option<i64> {
    if let Some(c) = RE_MMSS.captures(w) {
        let mm: i64 = c[1].parse().ok()?;
        let ss: i64 = c[2].parse().ok()?;
        return Some(mm * 60 + ss);
    }
    if let Some(c) = RE_MINUTES.captures(w) {
        let n: i64 = c[1].parse().ok()?;
        return Some(n * 60);
    }
    if let Some(c) = RE_SECS.captures(w) {
        let n: i64 = c[1].parse().ok()?;
        return Some(n);
    }
    None
}

fn mk_load(val: f64, unit: &str) -> Load {
    Load::from_magnitude_unit(val, unit).expect("unit already validated by regex")
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Token<'a> {
        self.toks[self.idx]
    }

    fn bump(&mut self) -> Token<'a> {
        let t = self.toks[self.idx];
        if self.idx + 1 < self.toks.len() {
            self.idx += 1;
        }
        t
    }

    fn peek_word(&self) -> Option<&'a str> {
        match self.peek().kind {
            TokKind::Word(w) => Some(w),
            _ => None,
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek().kind, TokKind::Newline) {
            self.bump();
        }
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokKind::Eof)
    }

    fn expect_simple(&mut self, want: TokKind<'static>, label: &str) -> Result<(), ParseError> {
        let matches_kind = matches!(
            (self.peek().kind, want),
            (TokKind::LBrace, TokKind::LBrace)
                | (TokKind::RBrace, TokKind::RBrace)
                | (TokKind::LParen, TokKind::LParen)
                | (TokKind::RParen, TokKind::RParen)
                | (TokKind::LBracket, TokKind::LBracket)
                | (TokKind::RBracket, TokKind::RBracket)
                | (TokKind::Semi, TokKind::Semi)
                | (TokKind::At, TokKind::At)
                | (TokKind::Comma, TokKind::Comma)
                | (TokKind::Eof, TokKind::Eof)
        );
        if matches_kind {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::new(
                self.peek().pos,
                format!("expected {label}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn expect_kind(&mut self, kind: TokKind<'static>) -> Result<(), ParseError> {
        let label = match kind {
            TokKind::LBrace => "'{'",
            TokKind::RBrace => "'}'",
            TokKind::LParen => "'('",
            TokKind::RParen => "')'",
            TokKind::LBracket => "'['",
            TokKind::RBracket => "']'",
            TokKind::Semi => "';'",
            TokKind::At => "'@'",
            TokKind::Comma => "','",
            _ => "token",
        };
        self.expect_simple(kind, label)
    }

    fn expect_word_token(&mut self, lit: &str) -> Result<(), ParseError> {
        if self.peek_word() == Some(lit) {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::new(
                self.peek().pos,
                format!("expected '{lit}', found {:?}", self.peek().kind),
            ))
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokKind::Str(s) => {
                self.bump();
                Ok(s.to_string())
            }
            _ => Err(ParseError::new(tok.pos, "expected a quoted string literal")),
        }
    }

    fn expect_int(&mut self) -> Result<i64, ParseError> {
        let tok = self.peek();
        if let TokKind::Word(w) = tok.kind {
            if let Ok(n) = w.parse::<i64>() {
                self.bump();
                return Ok(n);
            }
        }
        Err(ParseError::new(tok.pos, "expected an integer"))
    }

    fn expect_time(&mut self) -> Result<i64, ParseError> {
        let tok = self.peek();
        if let TokKind::Word(w) = tok.kind {
            if let Some(v) = parse_time_word(w) {
                self.bump();
                return Ok(v);
            }
        }
        Err(ParseError::new(
            tok.pos,
            "expected a time value (mm:ss, Nm, or Ns)",
        ))
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut meta = Meta::default();
        let mut segs = Vec::new();
        self.skip_newlines();
        while !self.at_eof() {
            match self.peek_word() {
                Some("WOD") => {
                    self.bump();
                    meta.title = Some(self.expect_string()?);
                }
                Some("TEAM") => {
                    self.bump();
                    let n = self.expect_int()?;
                    meta.team = Some(Team { size: n });
                }
                Some("CAP") => {
                    self.bump();
                    meta.cap = Some(self.expect_time()?);
                }
                Some("SCORE") => {
                    self.bump();
                    meta.score = self.parse_score_line();
                }
                Some("TRACKS") => {
                    self.bump();
                    meta.tracks_declared = self.parse_bracket_ident_list()?;
                }
                Some("BUYIN") => {
                    self.bump();
                    segs.push(Segment::Buyin {
                        stmts: self.parse_line_block("BUYIN")?,
                    });
                }
                Some("CASHOUT") => {
                    self.bump();
                    segs.push(Segment::Cashout {
                        stmts: self.parse_line_block("CASHOUT")?,
                    });
                }
                Some("REST") => {
                    self.bump();
                    let duration = self.expect_time()?;
                    segs.push(Segment::Rest { duration });
                }
                Some("BLOCK") => {
                    segs.push(self.parse_block()?);
                }
                Some("TRACK") => {
                    segs.push(self.parse_track_block()?);
                }
                Some(other) => {
                    return Err(ParseError::new(
                        self.peek().pos,
                        format!("unexpected token '{other}'"),
                    ));
                }
                None => {
                    return Err(ParseError::new(
                        self.peek().pos,
                        format!("unexpected token {:?}", self.peek().kind),
                    ));
                }
            }
            self.skip_newlines();
        }
        Ok(Program { meta, program: segs })
    }

    fn parse_score_line(&mut self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let mut current = String::new();
        let commit = |part: &str, map: &mut BTreeMap<String, String>| {
            if let Some((k, v)) = part.trim().split_once('=') {
                map.insert(k.trim().to_string(), v.trim().to_string());
            }
        };
        loop {
            match self.peek().kind {
                TokKind::Newline | TokKind::Eof => break,
                TokKind::Comma => {
                    self.bump();
                    commit(&current, &mut map);
                    current.clear();
                }
                TokKind::Word(w) => {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(w);
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
        commit(&current, &mut map);
        map
    }

    fn parse_bracket_ident_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect_kind(TokKind::LBracket)?;
        let mut out = Vec::new();
        loop {
            let tok = self.peek();
            match tok.kind {
                TokKind::Word(w) => {
                    out.push(w.to_string());
                    self.bump();
                }
                _ => return Err(ParseError::new(tok.pos, "expected an identifier")),
            }
            match self.peek().kind {
                TokKind::Comma => {
                    self.bump();
                }
                TokKind::RBracket => {
                    self.bump();
                    break;
                }
                _ => return Err(ParseError::new(self.peek().pos, "expected ',' or ']'")),
            }
        }
        Ok(out)
    }

    fn parse_int_bracket_list(&mut self) -> Result<Vec<u32>, ParseError> {
        self.expect_kind(TokKind::LBracket)?;
        let mut out = Vec::new();
        loop {
            out.push(self.expect_int()? as u32);
            match self.peek().kind {
                TokKind::Comma => {
                    self.bump();
                }
                TokKind::RBracket => {
                    self.bump();
                    break;
                }
                _ => return Err(ParseError::new(self.peek().pos, "expected ',' or ']'")),
            }
        }
        Ok(out)
    }

    fn parse_line_block(&mut self, kw: &str) -> Result<Vec<Line>, ParseError> {
        self.expect_kind(TokKind::LBrace)?;
        self.skip_newlines();
        if matches!(self.peek().kind, TokKind::RBrace) {
            return Err(ParseError::new(
                self.peek().pos,
                format!("{kw} body must not be empty"),
            ));
        }
        let mut lines = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek().kind, TokKind::RBrace) {
                break;
            }
            if matches!(self.peek().kind, TokKind::Eof) {
                return Err(ParseError::new(self.peek().pos, format!("unterminated {kw} block")));
            }
            lines.push(self.parse_line()?);
        }
        self.bump(); // RBrace
        Ok(lines)
    }

    fn parse_track_block(&mut self) -> Result<Segment, ParseError> {
        self.bump(); // TRACK
        let id_tok = self.peek();
        let id = match id_tok.kind {
            TokKind::Word(w) => {
                self.bump();
                w.to_string()
            }
            _ => return Err(ParseError::new(id_tok.pos, "expected a track identifier")),
        };
        self.expect_kind(TokKind::LBrace)?;
        let mut depth = 1i32;
        loop {
            match self.peek().kind {
                TokKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokKind::RBrace => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                }
                TokKind::Eof => {
                    return Err(ParseError::new(self.peek().pos, "unterminated TRACK block"))
                }
                _ => {
                    self.bump();
                }
            }
        }
        Ok(Segment::TrackBlock { id, ignored: true })
    }

    fn parse_block(&mut self) -> Result<Segment, ParseError> {
        self.bump(); // BLOCK
        let head = self.parse_block_head()?;
        let mut work = None;
        let mut partition = None;
        let mut cap = None;
        loop {
            self.skip_newlines();
            match self.peek_word() {
                Some("WORK") => {
                    self.bump();
                    work = Some(self.parse_work_mode()?);
                }
                Some("PARTITION") => {
                    self.bump();
                    partition = Some(self.parse_partition()?);
                }
                Some("CAP") => {
                    self.bump();
                    cap = Some(self.expect_time()?);
                }
                _ => break,
            }
        }
        self.skip_newlines();
        self.expect_kind(TokKind::LBrace)?;
        self.skip_newlines();
        if matches!(self.peek().kind, TokKind::RBrace) {
            return Err(ParseError::new(self.peek().pos, "BLOCK body must not be empty"));
        }
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if matches!(self.peek().kind, TokKind::RBrace) {
                break;
            }
            if matches!(self.peek().kind, TokKind::Eof) {
                return Err(ParseError::new(self.peek().pos, "unterminated BLOCK"));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.bump(); // RBrace
        self.skip_newlines();
        let tiebreak = if self.peek_word() == Some("TIEBREAK") {
            Some(self.parse_tiebreak()?)
        } else {
            None
        };
        Ok(Segment::Block(Block {
            head,
            stmts,
            work,
            partition,
            cap,
            tiebreak,
        }))
    }

    fn parse_block_head(&mut self) -> Result<BlockHead, ParseError> {
        let tok = self.peek();
        match self.peek_word() {
            Some("AMRAP") => {
                self.bump();
                Ok(BlockHead::Amrap {
                    duration: self.expect_time()?,
                })
            }
            Some("EMOM") => {
                self.bump();
                Ok(BlockHead::Emom {
                    duration: self.expect_time()?,
                })
            }
            Some("FT") => {
                self.bump();
                Ok(BlockHead::Ft)
            }
            Some("RFT") => {
                self.bump();
                Ok(BlockHead::Rft {
                    rounds: self.expect_int()? as u32,
                })
            }
            Some("CHIPPER") => {
                self.bump();
                Ok(BlockHead::Chipper)
            }
            Some("TABATA") => {
                self.bump();
                let work = self.expect_time()?;
                self.expect_word_token(":")?;
                let rest = self.expect_time()?;
                self.expect_word_token("x")?;
                let sets = self.expect_int()? as u32;
                Ok(BlockHead::Tabata { work, rest, sets })
            }
            Some("INTERVAL") => {
                self.bump();
                let sets = self.expect_int()? as u32;
                self.expect_word_token("x")?;
                self.expect_kind(TokKind::LParen)?;
                let work = self.expect_time()?;
                self.expect_word_token("on")?;
                self.expect_word_token("/")?;
                let rest = self.expect_time()?;
                self.expect_word_token("off")?;
                self.expect_kind(TokKind::RParen)?;
                Ok(BlockHead::Interval { sets, work, rest })
            }
            Some(other) => Err(ParseError::new(
                tok.pos,
                format!("unrecognized block mode '{other}'"),
            )),
            None => Err(ParseError::new(tok.pos, "expected a block mode")),
        }
    }

    fn parse_work_mode(&mut self) -> Result<WorkMode, ParseError> {
        let tok = self.peek();
        match self.peek_word() {
            Some("split:any") => {
                self.bump();
                Ok(WorkMode::SplitAny)
            }
            Some("split:even") => {
                self.bump();
                Ok(WorkMode::SplitEven)
            }
            Some("ygig") => {
                self.bump();
                Ok(WorkMode::Ygig)
            }
            Some("relay") => {
                self.bump();
                Ok(WorkMode::Relay)
            }
            Some("waterfall") => {
                self.bump();
                Ok(WorkMode::Waterfall {
                    offset: self.parse_offset_time()?,
                })
            }
            Some("synchro") => {
                self.bump();
                match self.peek_word() {
                    Some("all") => {
                        self.bump();
                        Ok(WorkMode::SynchroAll)
                    }
                    Some(w) if w == "lines:" || w.starts_with("lines:") => {
                        let rest = w.strip_prefix("lines:").unwrap().to_string();
                        self.bump();
                        let lines = if rest.is_empty() {
                            self.parse_int_bracket_list()?
                        } else {
                            return Err(ParseError::new(tok.pos, "expected 'lines:' then a bracketed list"));
                        };
                        Ok(WorkMode::SynchroLines { lines })
                    }
                    _ => Err(ParseError::new(self.peek().pos, "expected 'all' or 'lines:'")),
                }
            }
            _ => Err(ParseError::new(tok.pos, "unrecognized WORK modifier")),
        }
    }

    fn parse_offset_time(&mut self) -> Result<i64, ParseError> {
        let tok = self.peek();
        if let TokKind::Word(w) = tok.kind {
            if let Some(rest) = w.strip_prefix("offset:") {
                self.bump();
                if rest.is_empty() {
                    return self.expect_time();
                }
                return parse_time_word(rest)
                    .ok_or_else(|| ParseError::new(tok.pos, format!("bad time '{rest}'")));
            }
        }
        Err(ParseError::new(tok.pos, "expected 'offset:'"))
    }

    fn parse_partition(&mut self) -> Result<Partition, ParseError> {
        let tok = self.peek();
        match self.peek_word() {
            Some("any") => {
                self.bump();
                Ok(Partition::Any)
            }
            Some("even") => {
                self.bump();
                Ok(Partition::Even)
            }
            Some("scheme") => {
                self.bump();
                let scheme_tok = self.peek();
                let w = match scheme_tok.kind {
                    TokKind::Word(w) => w,
                    _ => return Err(ParseError::new(scheme_tok.pos, "expected a rep scheme")),
                };
                self.bump();
                let scheme: Option<Vec<u32>> = w.split('-').map(|p| p.parse().ok()).collect();
                match scheme {
                    Some(s) if !s.is_empty() => Ok(Partition::Scheme { scheme: s }),
                    _ => Err(ParseError::new(scheme_tok.pos, "malformed rep scheme")),
                }
            }
            _ => Err(ParseError::new(tok.pos, "unrecognized PARTITION modifier")),
        }
    }

    fn parse_tiebreak(&mut self) -> Result<Tiebreak, ParseError> {
        self.bump(); // TIEBREAK
        self.expect_word_token("after")?;
        let tok = self.peek();
        if self.peek_word() == Some("movement") {
            self.bump();
            let mv_tok = self.peek();
            let movement = match mv_tok.kind {
                TokKind::Word(w) if is_ident(w) => {
                    self.bump();
                    w.to_string()
                }
                _ => return Err(ParseError::new(mv_tok.pos, "expected a movement identifier")),
            };
            return Ok(Tiebreak::AfterMovement { movement });
        }
        let count = self.expect_int()? as u32;
        match self.peek_word() {
            Some("thrusters") => {
                self.bump();
                Ok(Tiebreak::AfterThrusters { count })
            }
            Some("reps") => {
                self.bump();
                Ok(Tiebreak::AfterReps { count })
            }
            Some("cal") => {
                self.bump();
                Ok(Tiebreak::AfterCal { count })
            }
            _ => Err(ParseError::new(tok.pos, "expected 'thrusters', 'reps', or 'cal'")),
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        if let TokKind::Word(w) = self.peek().kind {
            if let Some(slot) = slot_prefix(w) {
                self.bump();
                let line = self.parse_line()?;
                return Ok(Stmt::Slot(SlotLine { slot, line }));
            }
        }
        Ok(Stmt::Line(self.parse_line()?))
    }

    fn try_parse_quantity(&mut self) -> Result<Option<Qty>, ParseError> {
        let tok = self.peek();
        let w = match tok.kind {
            TokKind::Word(w) if w.chars().next().is_some_and(|c| c.is_ascii_digit()) => w,
            _ => return Ok(None),
        };
        if let Some(c) = RE_DUAL_DIST.captures(w) {
            self.bump();
            let a: f64 = c[1].parse().unwrap();
            let b: f64 = c[2].parse().unwrap();
            let scale = if &c[3] == "km" { 1000.0 } else { 1.0 };
            return Ok(Some(Qty::DualDistance {
                a: a * scale,
                b: b * scale,
            }));
        }
        if let Some(c) = RE_DUAL_NUM.captures(w) {
            let raw_a = &c[1];
            let raw_b = &c[2];
            let next_is_cal = self.toks.get(self.idx + 1).map(|t| t.kind) == Some(TokKind::Word("cal"));
            if next_is_cal {
                let a: f64 = raw_a.parse().unwrap();
                let b: f64 = raw_b.parse().unwrap();
                self.bump();
                self.bump(); // "cal"
                return Ok(Some(Qty::DualCal { a, b }));
            }
            if !raw_a.contains('.') && !raw_b.contains('.') {
                self.bump();
                return Ok(Some(Qty::DualReps {
                    a: raw_a.parse().unwrap(),
                    b: raw_b.parse().unwrap(),
                }));
            }
            return Err(ParseError::new(tok.pos, format!("malformed quantity '{w}'")));
        }
        if let Some(c) = RE_DIST.captures(w) {
            self.bump();
            let v: f64 = c[1].parse().unwrap();
            let scale = if &c[2] == "km" { 1000.0 } else { 1.0 };
            return Ok(Some(Qty::Distance { value: v * scale }));
        }
        if let Some(c) = RE_MMSS.captures(w) {
            self.bump();
            let mm: i64 = c[1].parse().unwrap();
            let ss: i64 = c[2].parse().unwrap();
            return Ok(Some(Qty::Time { value: mm * 60 + ss }));
        }
        if let Some(c) = RE_SECS.captures(w) {
            self.bump();
            return Ok(Some(Qty::Time {
                value: c[1].parse().unwrap(),
            }));
        }
        if RE_INT.is_match(w) {
            let next_is_cal = self.toks.get(self.idx + 1).map(|t| t.kind) == Some(TokKind::Word("cal"));
            let value: i64 = w.parse().unwrap();
            self.bump();
            if next_is_cal {
                self.bump();
                return Ok(Some(Qty::Cal { value: value as f64 }));
            }
            return Ok(Some(Qty::Reps { value }));
        }
        if RE_NUMBER.is_match(w) {
            let next_is_cal = self.toks.get(self.idx + 1).map(|t| t.kind) == Some(TokKind::Word("cal"));
            if next_is_cal {
                let value: f64 = w.parse().unwrap();
                self.bump();
                self.bump();
                return Ok(Some(Qty::Cal { value }));
            }
            return Err(ParseError::new(tok.pos, format!("malformed quantity '{w}'")));
        }
        Err(ParseError::new(tok.pos, format!("malformed quantity '{w}'")))
    }

    fn parse_load(&mut self) -> Result<Load, ParseError> {
        self.bump(); // At
        let tok = self.peek();
        let w = match tok.kind {
            TokKind::Word(w) => w,
            _ => return Err(ParseError::new(tok.pos, "expected a load value")),
        };
        self.bump();
        if let Some(c) = RE_LOAD_DUAL.captures(w) {
            let a: f64 = c[1].parse().unwrap();
            let b: f64 = c[2].parse().unwrap();
            let unit = &c[3];
            return Ok(Load::Dual {
                a: Box::new(mk_load(a, unit)),
                b: Box::new(mk_load(b, unit)),
            });
        }
        if let Some(c) = RE_LOAD_SINGLE.captures(w) {
            let val: f64 = c[1].parse().unwrap();
            return Ok(mk_load(val, &c[2]));
        }
        Ok(Load::Raw { value: w.to_string() })
    }

    fn parse_line(&mut self) -> Result<Line, ParseError> {
        let qty = self.try_parse_quantity()?;
        let mv_tok = self.peek();
        let movement = match mv_tok.kind {
            TokKind::Word(w) if is_ident(w) => {
                self.bump();
                w.to_string()
            }
            _ => return Err(ParseError::new(mv_tok.pos, "expected a movement identifier")),
        };
        // `@shared`/`@each` are bare suffix flags, not load literals: the
        // load grammar only ever admits a leading digit after `@`, so an
        // `@` followed by exactly `shared` or `each` must be left for the
        // flag loop below to consume.
        let next_is_flag_suffix = matches!(
            self.toks.get(self.idx + 1).map(|t| t.kind),
            Some(TokKind::Word("shared")) | Some(TokKind::Word("each"))
        );
        let load = if matches!(self.peek().kind, TokKind::At) && !next_is_flag_suffix {
            Some(self.parse_load()?)
        } else {
            None
        };
        let mut flags = Flags::new();
        loop {
            match self.peek().kind {
                TokKind::Word("SYNC") => {
                    self.bump();
                    flags.push(Flag::Sync);
                }
                TokKind::At => {
                    let save = self.idx;
                    self.bump();
                    match self.peek().kind {
                        TokKind::Word("shared") => {
                            self.bump();
                            flags.push(Flag::Shared);
                        }
                        TokKind::Word("each") => {
                            self.bump();
                            flags.push(Flag::Each);
                        }
                        _ => {
                            self.idx = save;
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
        self.expect_line_terminator()?;
        Ok(Line {
            qty,
            movement,
            load,
            flags,
        })
    }

    fn expect_line_terminator(&mut self) -> Result<(), ParseError> {
        match self.peek().kind {
            TokKind::Semi | TokKind::Newline => {
                self.bump();
                Ok(())
            }
            // Lenient: a line immediately followed by the closing brace
            // does not strictly need its own terminator.
            TokKind::RBrace => Ok(()),
            other => Err(ParseError::new(
                self.peek().pos,
                format!("expected ';' or newline, found {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn seed_1_minimal_program() {
        let ast = parse_program("WOD \"Test\"\nBLOCK FT {\n 10 wall_balls;\n}\n").unwrap();
        assert_eq!(ast.meta.title.as_deref(), Some("Test"));
        assert_eq!(ast.program.len(), 1);
        match &ast.program[0] {
            Segment::Block(b) => {
                assert_eq!(b.head, BlockHead::Ft);
                assert_eq!(b.stmts.len(), 1);
                match &b.stmts[0] {
                    Stmt::Line(l) => {
                        assert_eq!(l.movement, "wall_balls");
                        assert_eq!(l.qty, Some(Qty::Reps { value: 10 }));
                    }
                    _ => panic!("expected a bare line"),
                }
            }
            _ => panic!("expected a BLOCK segment"),
        }
    }

    #[test]
    fn seed_2_emom_missing_duration_fails() {
        assert!(parse_program("BLOCK EMOM { }\n").is_err());
    }

    #[test]
    fn parses_dual_cal_with_spaced_cal_keyword() {
        let ast = parse_program("BLOCK FT {\n 15/12 cal row;\n}\n").unwrap();
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        let Stmt::Line(l) = &b.stmts[0] else { panic!() };
        assert_eq!(l.qty, Some(Qty::DualCal { a: 15.0, b: 12.0 }));
    }

    #[test]
    fn parses_emom_slots() {
        let ast = parse_program(
            "BLOCK EMOM 2:00 {\n 1: 10 wall_balls;\n 2: 8 box_jumps;\n}\n",
        )
        .unwrap();
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        assert_eq!(b.stmts.len(), 2);
        assert_matches!(&b.stmts[0], Stmt::Slot(s) if s.slot == 1);
        assert_matches!(&b.stmts[1], Stmt::Slot(s) if s.slot == 2);
    }

    #[test]
    fn parses_tabata_head() {
        let ast = parse_program("BLOCK TABATA 0:20 : 0:10 x 8 {\n 10 burpees;\n}\n").unwrap();
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        assert_eq!(
            b.head,
            BlockHead::Tabata {
                work: 20,
                rest: 10,
                sets: 8
            }
        );
    }

    #[test]
    fn parses_interval_head() {
        let ast =
            parse_program("BLOCK INTERVAL 4 x (1:00 on / 0:30 off) {\n 200m run;\n}\n").unwrap();
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        assert_eq!(
            b.head,
            BlockHead::Interval {
                sets: 4,
                work: 60,
                rest: 30
            }
        );
    }

    #[test]
    fn empty_block_body_fails() {
        assert!(parse_program("BLOCK FT {\n}\n").is_err());
    }

    #[test]
    fn load_and_flags_parse() {
        let ast = parse_program("BLOCK FT {\n 5 deadlift @135kg SYNC @shared;\n}\n").unwrap();
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        let Stmt::Line(l) = &b.stmts[0] else { panic!() };
        assert_eq!(
            l.load,
            Some(Load::Weight {
                value: 135.0,
                unit: WeightUnit::Kg
            })
        );
        assert_eq!(l.flags.as_slice(), &[Flag::Sync, Flag::Shared]);
    }

    #[test]
    fn bare_shared_flag_is_not_mistaken_for_a_load() {
        let ast = parse_program("BLOCK FT {\n 5 thrusters @shared;\n}\n").unwrap();
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        let Stmt::Line(l) = &b.stmts[0] else { panic!() };
        assert_eq!(l.load, None);
        assert_eq!(l.flags.as_slice(), &[Flag::Shared]);
    }

    #[test]
    fn bare_each_flag_is_not_mistaken_for_a_load() {
        let ast = parse_program("BLOCK FT {\n 10 wall_balls @each;\n}\n").unwrap();
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        let Stmt::Line(l) = &b.stmts[0] else { panic!() };
        assert_eq!(l.load, None);
        assert_eq!(l.flags.as_slice(), &[Flag::Each]);
    }

    #[test]
    fn track_block_ignored() {
        let ast = parse_program("TRACK SCALED {\nanything goes here\n}\nBLOCK FT {\n10 run;\n}\n")
            .unwrap();
        assert_matches!(ast.program[0], Segment::TrackBlock { ignored: true, .. });
    }
}
