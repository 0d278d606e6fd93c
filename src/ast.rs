//! The typed AST produced by the parser, mutated in place by the resolver,
//! and thereafter read-only to the linter, timeline, and renderers.
//!
//! See the data model write-up in the project's design notes for the
//! invariants this tree must uphold end to end: after resolution no `Qty`
//! or `Load` node may be a dual variant, and every movement identifier is
//! either already canonical or has a corresponding alias note in
//! `Meta::normalized`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tinyvec::ArrayVec;

/// A workout program: metadata plus an ordered body of segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub meta: Meta,
    pub program: Vec<Segment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    pub title: Option<String>,
    pub team: Option<Team>,
    /// Program-level time budget, in seconds.
    pub cap: Option<i64>,
    pub score: BTreeMap<String, String>,
    pub tracks_declared: Vec<String>,
    /// Alias rewrite notes appended by the resolver; consumed by the
    /// linter as `W050` warnings.
    pub normalized: Vec<AliasNote>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasNote {
    pub code: String,
    pub from: String,
    pub to: String,
}

impl AliasNote {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        AliasNote {
            code: "W050".to_string(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// One entry of the program body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Segment {
    #[serde(rename = "BUYIN")]
    Buyin { stmts: Vec<Line> },
    #[serde(rename = "CASHOUT")]
    Cashout { stmts: Vec<Line> },
    #[serde(rename = "REST")]
    Rest { duration: i64 },
    #[serde(rename = "BLOCK")]
    Block(Block),
    /// `TRACK <id> { ... }` is recognized but its body is discarded; see
    /// the Open Question in the design notes about per-track bodies.
    #[serde(rename = "TRACK_BLOCK")]
    TrackBlock { id: String, ignored: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub head: BlockHead,
    pub stmts: Vec<Stmt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<WorkMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<Partition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiebreak: Option<Tiebreak>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode")]
pub enum BlockHead {
    #[serde(rename = "AMRAP")]
    Amrap { duration: i64 },
    #[serde(rename = "EMOM")]
    Emom { duration: i64 },
    #[serde(rename = "FT")]
    Ft,
    #[serde(rename = "RFT")]
    Rft { rounds: u32 },
    #[serde(rename = "CHIPPER")]
    Chipper,
    #[serde(rename = "TABATA")]
    Tabata { work: i64, rest: i64, sets: u32 },
    #[serde(rename = "INTERVAL")]
    Interval { sets: u32, work: i64, rest: i64 },
}

impl BlockHead {
    pub fn mode_name(&self) -> &'static str {
        match self {
            BlockHead::Amrap { .. } => "AMRAP",
            BlockHead::Emom { .. } => "EMOM",
            BlockHead::Ft => "FT",
            BlockHead::Rft { .. } => "RFT",
            BlockHead::Chipper => "CHIPPER",
            BlockHead::Tabata { .. } => "TABATA",
            BlockHead::Interval { .. } => "INTERVAL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WorkMode {
    SplitAny,
    SplitEven,
    Ygig,
    Relay,
    Waterfall { offset: i64 },
    SynchroAll,
    SynchroLines { lines: Vec<u32> },
}

impl WorkMode {
    pub fn mode_name(&self) -> &'static str {
        match self {
            WorkMode::SplitAny => "split_any",
            WorkMode::SplitEven => "split_even",
            WorkMode::Ygig => "ygig",
            WorkMode::Relay => "relay",
            WorkMode::Waterfall { .. } => "waterfall",
            WorkMode::SynchroAll => "synchro_all",
            WorkMode::SynchroLines { .. } => "synchro_lines",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Partition {
    Any,
    Even,
    Scheme { scheme: Vec<u32> },
}

impl Partition {
    pub fn mode_name(&self) -> &'static str {
        match self {
            Partition::Any => "any",
            Partition::Even => "even",
            Partition::Scheme { .. } => "scheme",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tiebreak {
    AfterThrusters { count: u32 },
    AfterReps { count: u32 },
    AfterCal { count: u32 },
    AfterMovement { movement: String },
}

/// A bare line, or a slot-prefixed line inside an EMOM block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Stmt {
    Slot(SlotLine),
    Line(Line),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotLine {
    pub slot: u32,
    pub line: Line,
}

/// Flags that may be attached to a line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Flag {
    #[serde(rename = "SYNC")]
    Sync,
    #[serde(rename = "@shared")]
    Shared,
    #[serde(rename = "@each")]
    Each,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Sync => "SYNC",
            Flag::Shared => "@shared",
            Flag::Each => "@each",
        }
    }
}

/// At most three flags can ever apply to a line (`SYNC`, `@shared`,
/// `@each`); a fixed-capacity vector avoids a heap allocation per line.
pub type Flags = ArrayVec<[Flag; 3]>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<Qty>,
    pub movement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<Load>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "flags_serde")]
    pub flags: Flags,
}

impl Line {
    pub fn new(movement: impl Into<String>) -> Self {
        Line {
            qty: None,
            movement: movement.into(),
            load: None,
            flags: Flags::new(),
        }
    }
}

/// `ArrayVec` does not implement `Serialize`/`Deserialize` on its own;
/// bridge through a plain `Vec` for the JSON representation.
mod flags_serde {
    use super::{Flag, Flags};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(flags: &Flags, ser: S) -> Result<S::Ok, S::Error> {
        flags.as_slice().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Flags, D::Error> {
        let v = Vec::<Flag>::deserialize(de)?;
        let mut out = Flags::new();
        for f in v {
            out.push(f);
        }
        Ok(out)
    }
}

/// A quantity: how much of a movement to do. Dual variants only ever
/// appear before the resolver runs; see [`crate::resolver::resolve`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Qty {
    Reps { value: i64 },
    Cal { value: f64 },
    /// Always stored in meters.
    Distance { value: f64 },
    /// Always stored in integer seconds.
    Time { value: i64 },
    DualReps { a: i64, b: i64 },
    DualCal { a: f64, b: f64 },
    /// Always stored in meters.
    DualDistance { a: f64, b: f64 },
}

impl Qty {
    pub fn is_dual(&self) -> bool {
        matches!(
            self,
            Qty::DualReps { .. } | Qty::DualCal { .. } | Qty::DualDistance { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kg" => Some(WeightUnit::Kg),
            "lb" => Some(WeightUnit::Lb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    Cm,
    In,
}

impl HeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeightUnit::Cm => "cm",
            HeightUnit::In => "in",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cm" => Some(HeightUnit::Cm),
            "in" => Some(HeightUnit::In),
            _ => None,
        }
    }
}

/// A load: what's attached to a movement (weight, height, distance,
/// percentage, or a dual form resolved by gender). `Raw` is a fallback for
/// load text that didn't match any structured form; the linter flags it
/// with `W002` when it looks suspicious.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Load {
    Weight { value: f64, unit: WeightUnit },
    Height { value: f64, unit: HeightUnit },
    /// Always stored in meters.
    Distance { value: f64 },
    PercentRaw { value: f64 },
    /// `a`/`b` are always non-dual variants; the resolver picks one and
    /// replaces the whole node, so downstream code never sees a `Dual`
    /// whose branches are themselves `Dual`.
    Dual { a: Box<Load>, b: Box<Load> },
    Raw { value: String },
}

impl Load {
    pub fn is_dual(&self) -> bool {
        matches!(self, Load::Dual { .. })
    }

    /// Builds a structured load from a numeric magnitude and one of the
    /// fixed unit tokens (`kg`, `lb`, `cm`, `in`, `m`, `km`, `%`); `km` is
    /// normalized to meters. Returns `None` for an unrecognized unit.
    pub fn from_magnitude_unit(value: f64, unit: &str) -> Option<Load> {
        Some(match unit {
            "kg" => Load::Weight {
                value,
                unit: WeightUnit::Kg,
            },
            "lb" => Load::Weight {
                value,
                unit: WeightUnit::Lb,
            },
            "cm" => Load::Height {
                value,
                unit: HeightUnit::Cm,
            },
            "in" => Load::Height {
                value,
                unit: HeightUnit::In,
            },
            "m" => Load::Distance { value },
            "km" => Load::Distance { value: value * 1000.0 },
            "%" => Load::PercentRaw { value },
            _ => return None,
        })
    }
}
