//! Numeric locales for formatted-number decoding.
//!
//! A locale supplies the thousands separator, the decimal point, and the
//! currency symbol used when a cell fails the plain number parse but may be
//! a money form. The table is closed: these are the locales the tool family
//! is exercised with, and an unknown name is a user error, not a fallback.

use crate::errors::{Result, TabError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericLocale {
    name: String,
    thousands_sep: &'static [char],
    decimal_point: char,
    currency: &'static str,
    money_frac_digits: u32,
}

const NBSP: char = '\u{a0}';
const NNBSP: char = '\u{202f}';

impl NumericLocale {
    /// The "C" locale: no grouping, `.` decimal point, no currency.
    pub fn c() -> Self {
        NumericLocale {
            name: "C".into(),
            thousands_sep: &[],
            decimal_point: '.',
            currency: "",
            money_frac_digits: 2,
        }
    }

    pub fn named(name: &str) -> Result<Self> {
        let base = name.split('.').next().unwrap_or(name);
        let (sep, point, currency, frac): (&'static [char], char, &'static str, u32) = match base {
            "C" | "POSIX" | "" => return Ok(Self::c()),
            "en_US" => (&[','], '.', "$", 2),
            "en_GB" => (&[','], '.', "£", 2),
            "en_AU" | "en_CA" => (&[','], '.', "$", 2),
            "ja_JP" => (&[','], '.', "¥", 0),
            "zh_CN" => (&[','], '.', "¥", 2),
            "de_DE" | "es_ES" | "it_IT" | "nl_NL" => (&['.'], ',', "€", 2),
            "pt_BR" => (&['.'], ',', "R$", 2),
            "fr_FR" => (&[NNBSP, NBSP, ' '], ',', "€", 2),
            "ru_RU" => (&[NBSP, ' '], ',', "₽", 2),
            "pl_PL" => (&[NBSP, ' '], ',', "zł", 2),
            "sv_SE" => (&[NBSP, ' '], ',', "kr", 2),
            _ => {
                return Err(TabError::Value(format!(
                    "locale {name:?} is not supported by this utility"
                )))
            }
        };
        Ok(NumericLocale {
            name: name.to_owned(),
            thousands_sep: sep,
            decimal_point: point,
            currency,
            money_frac_digits: frac,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_c(&self) -> bool {
        self.thousands_sep.is_empty() && self.decimal_point == '.'
    }

    pub fn decimal_point(&self) -> char {
        self.decimal_point
    }

    pub fn currency(&self) -> &'static str {
        self.currency
    }

    pub fn money_frac_digits(&self) -> u32 {
        self.money_frac_digits
    }

    /// Normalise a formatted number to the C locale: drop thousands
    /// separators and remap the decimal point to `.`.
    ///
    /// Returns `None` when the text contains a literal `.` that is not the
    /// locale's decimal point; such a value is ambiguous and stays text.
    pub fn to_c_locale(&self, s: &str) -> Option<String> {
        let stripped: String = s
            .chars()
            .filter(|c| !self.thousands_sep.contains(c))
            .collect();
        if self.decimal_point == '.' {
            return Some(stripped);
        }
        if stripped.contains('.') {
            return None;
        }
        Some(stripped.replacen(self.decimal_point, ".", 1))
    }

    /// Strip the money dressing from a candidate value, leaving a C-locale
    /// number string, or `None` when this cannot be a money form.
    pub fn strip_money(&self, s: &str) -> Option<String> {
        if self.currency.is_empty() {
            return None;
        }
        // locale-confusable shapes are rejected outright
        if s.contains('/') || s.contains(':') || s.matches('-').count() > 2 {
            return None;
        }
        if !s.contains(self.currency) {
            return None;
        }
        let without = s.replace(self.currency, "");
        let trimmed: String = without.chars().filter(|c| !c.is_whitespace()).collect();
        let negative = trimmed.starts_with('-')
            || (trimmed.starts_with('(') && trimmed.ends_with(')'));
        let digits: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | '-' | '+'))
            .collect();
        let normalised = self.to_c_locale(&digits)?;
        if normalised.is_empty() {
            return None;
        }
        Some(if negative {
            format!("-{normalised}")
        } else {
            normalised
        })
    }
}
