//! Explicit parse configuration.
//!
//! The null set, bool semantics and numeric locale travel in a
//! `ParseContext` value that is built once per invocation and passed to the
//! decoder, the inference engine and the comparators. No process-wide
//! state, so reentrancy is not an implicit contract.

use tabcast_helpers::IndexSet;

use crate::errors::Result;
use crate::locale::NumericLocale;

pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";
pub const DEFAULT_DATETIME_FORMAT: &str = "%m/%d/%Y %I:%M %p";

#[derive(Debug, Clone)]
pub struct ParseContext {
    pub locale: NumericLocale,
    /// Case-folded strings recognised as NULL, defaults plus `--null-value`.
    null_set: IndexSet<String>,
    pub date_format: String,
    pub datetime_format: String,
    /// `--blanks`: keep null-equivalent strings as text.
    pub blanks: bool,
    /// `-I/--no-inference`: every column is text.
    pub no_inference: bool,
    /// `--no-leading-zeroes`: `0042` stays text.
    pub no_leading_zeroes: bool,
    /// Case-independent text comparison.
    pub ignore_case: bool,
    /// `-z/--maxfieldsize`, in UTF-8 scalar values.
    pub max_field_size: Option<usize>,
}

impl Default for ParseContext {
    fn default() -> Self {
        ParseContext {
            locale: NumericLocale::c(),
            null_set: default_null_set(),
            date_format: DEFAULT_DATE_FORMAT.into(),
            datetime_format: DEFAULT_DATETIME_FORMAT.into(),
            blanks: false,
            no_inference: false,
            no_leading_zeroes: false,
            ignore_case: false,
            max_field_size: None,
        }
    }
}

fn default_null_set() -> IndexSet<String> {
    ["NA", "N/A", "NONE", "NULL", "."]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

impl ParseContext {
    pub fn with_locale(name: &str) -> Result<Self> {
        Ok(ParseContext {
            locale: NumericLocale::named(name)?,
            ..Default::default()
        })
    }

    /// Register additional `--null-value` literals.
    pub fn add_null_values<I: IntoIterator<Item = S>, S: AsRef<str>>(&mut self, values: I) {
        for v in values {
            self.null_set.insert(v.as_ref().trim().to_uppercase());
        }
    }

    /// Whether a case-folded, trimmed cell string is a NULL literal.
    pub fn is_null_literal(&self, folded: &str) -> bool {
        self.null_set.contains(folded)
    }
}
