//! Type-aware comparison and hashing.
//!
//! A `Comparator` is built per column from the inferred kind and the
//! blank/no-inference flags, and hands out an ordering and a hash that agree
//! with it (compare-equal implies hash-equal). Joins, sorts and grouping all
//! go through here.

use std::cmp::Ordering;
use std::hash::BuildHasher;

use ahash::RandomState;

use crate::context::ParseContext;
use crate::infer::ColumnKind;
use crate::value::TypedCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NullMode {
    /// No blanks in the column: straight native semantics.
    Native,
    /// Nulls sort last and equal each other; the rest compares natively.
    NullsLastNative,
    /// Nulls sort last; the rest compares as text (no-inference).
    NullsLastText,
    /// `--blanks`: everything compares as its raw string.
    RawText,
}

pub struct Comparator<'a> {
    kind: ColumnKind,
    mode: NullMode,
    ctx: &'a ParseContext,
    hasher: RandomState,
}

/// Build the comparator for one column.
pub fn comparator<'a>(
    kind: ColumnKind,
    has_blanks: bool,
    ctx: &'a ParseContext,
) -> Comparator<'a> {
    let mode = if ctx.blanks {
        NullMode::RawText
    } else if ctx.no_inference {
        if has_blanks {
            NullMode::NullsLastText
        } else {
            NullMode::RawText
        }
    } else if has_blanks {
        NullMode::NullsLastNative
    } else {
        NullMode::Native
    };
    Comparator {
        kind,
        mode,
        ctx,
        hasher: RandomState::new(),
    }
}

impl Comparator<'_> {
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn compare(&self, a: &TypedCell, b: &TypedCell) -> Ordering {
        match self.mode {
            NullMode::RawText => self.text_cmp(a, b),
            NullMode::Native => self.native_cmp(a, b),
            NullMode::NullsLastNative | NullMode::NullsLastText => {
                match (a.is_null(self.ctx), b.is_null(self.ctx)) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => {
                        if self.mode == NullMode::NullsLastText {
                            self.text_cmp(a, b)
                        } else {
                            self.native_cmp(a, b)
                        }
                    }
                }
            }
        }
    }

    pub fn equal(&self, a: &TypedCell, b: &TypedCell) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    pub fn hash(&self, cell: &TypedCell) -> u64 {
        match self.mode {
            NullMode::RawText => self.text_hash(cell),
            NullMode::Native => self.native_hash(cell),
            NullMode::NullsLastNative | NullMode::NullsLastText => {
                if cell.is_null(self.ctx) {
                    self.hasher.hash_one(0u8)
                } else if self.mode == NullMode::NullsLastText {
                    self.text_hash(cell)
                } else {
                    self.native_hash(cell)
                }
            }
        }
    }

    fn text_cmp(&self, a: &TypedCell, b: &TypedCell) -> Ordering {
        if self.ctx.ignore_case {
            a.raw().to_lowercase().cmp(&b.raw().to_lowercase())
        } else {
            a.raw().cmp(b.raw())
        }
    }

    fn text_hash(&self, cell: &TypedCell) -> u64 {
        if self.ctx.ignore_case {
            self.hasher.hash_one(cell.raw().to_lowercase())
        } else {
            self.hasher.hash_one(cell.raw())
        }
    }

    fn native_cmp(&self, a: &TypedCell, b: &TypedCell) -> Ordering {
        let ctx = self.ctx;
        match self.kind {
            ColumnKind::Bool => match (a.bool_value(ctx), b.bool_value(ctx)) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.text_cmp(a, b),
            },
            ColumnKind::Number => match (a.number(ctx), b.number(ctx)) {
                (Some(a), Some(b)) => cmp_f64(a, b),
                _ => self.text_cmp(a, b),
            },
            ColumnKind::DateTime => match (a.datetime(ctx), b.datetime(ctx)) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.text_cmp(a, b),
            },
            ColumnKind::Date => match (a.date(ctx), b.date(ctx)) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.text_cmp(a, b),
            },
            ColumnKind::Timedelta => match (a.timedelta(ctx), b.timedelta(ctx)) {
                (Some(a), Some(b)) => cmp_f64(a.seconds, b.seconds),
                _ => self.text_cmp(a, b),
            },
            ColumnKind::Text => self.text_cmp(a, b),
        }
    }

    fn native_hash(&self, cell: &TypedCell) -> u64 {
        let ctx = self.ctx;
        match self.kind {
            ColumnKind::Bool => match cell.bool_value(ctx) {
                Some(v) => self.hasher.hash_one(v),
                None => self.text_hash(cell),
            },
            ColumnKind::Number => match cell.number(ctx) {
                Some(v) => self.hasher.hash_one(canonical_bits(v)),
                None => self.text_hash(cell),
            },
            ColumnKind::DateTime => match cell.datetime(ctx) {
                Some(v) => self.hasher.hash_one(v),
                None => self.text_hash(cell),
            },
            ColumnKind::Date => match cell.date(ctx) {
                Some(v) => self.hasher.hash_one(v),
                None => self.text_hash(cell),
            },
            ColumnKind::Timedelta => match cell.timedelta(ctx) {
                Some(v) => self.hasher.hash_one(canonical_bits(v.seconds)),
                None => self.text_hash(cell),
            },
            ColumnKind::Text => self.text_hash(cell),
        }
    }
}

/// NaN canonicalisation: every NaN is equal to every NaN and sorts after all
/// numbers, which keeps the ordering total and transitive.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0f64.to_bits()
    } else {
        v.to_bits()
    }
}
