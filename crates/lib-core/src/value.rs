//! Typed cell decoding.
//!
//! A `TypedCell` wraps one decoded cell string and lazily classifies it as
//! null / bool / integer / double / text under a `ParseContext`. Dates,
//! datetimes and timedeltas are separate lazy queries because they depend on
//! the configured formats. All caches are write-once.

use std::sync::OnceLock;

use crate::context::ParseContext;
use crate::datetime;
use crate::timedelta::{self, Timedelta};

/// Decoder-level kind of a single cell. Integer widths are picked from the
/// decoded magnitude; anything with a decimal point or exponent is `Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    Null,
    Str,
    Int8,
    Int16,
    Int32,
    Int64,
    Double,
}

impl ValueKind {
    pub fn is_numeric(self) -> bool {
        self >= ValueKind::Int8
    }

    pub fn is_integer(self) -> bool {
        self >= ValueKind::Int8 && self <= ValueKind::Int64
    }
}

#[derive(Debug, Clone)]
struct Decoded {
    kind: ValueKind,
    num: f64,
    precision: u8,
    folded: String,
}

#[derive(Debug, Default)]
pub struct TypedCell {
    raw: String,
    decoded: OnceLock<Decoded>,
    datetime: OnceLock<Option<i64>>,
    date: OnceLock<Option<i64>>,
    timedelta: OnceLock<Option<Timedelta>>,
}

impl Clone for TypedCell {
    fn clone(&self) -> Self {
        // caches are recomputed on demand
        TypedCell::new(self.raw.clone())
    }
}

impl TypedCell {
    pub fn new(raw: impl Into<String>) -> Self {
        TypedCell {
            raw: raw.into(),
            ..Default::default()
        }
    }

    /// The decoded cell text, exactly as read.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    fn decoded(&self, ctx: &ParseContext) -> &Decoded {
        self.decoded.get_or_init(|| classify(&self.raw, ctx))
    }

    pub fn kind(&self, ctx: &ParseContext) -> ValueKind {
        self.decoded(ctx).kind
    }

    /// Case-folded, trimmed cell text.
    pub fn folded(&self, ctx: &ParseContext) -> &str {
        &self.decoded(ctx).folded
    }

    /// Empty or all-whitespace.
    pub fn is_nil(&self, ctx: &ParseContext) -> bool {
        self.decoded(ctx).kind == ValueKind::Null
    }

    /// Empty, all-whitespace, or a member of the null-literal set.
    pub fn is_null(&self, ctx: &ParseContext) -> bool {
        let d = self.decoded(ctx);
        d.kind == ValueKind::Null
            || (d.kind == ValueKind::Str && ctx.is_null_literal(&d.folded))
    }

    pub fn is_number(&self, ctx: &ParseContext) -> bool {
        self.decoded(ctx).kind.is_numeric()
    }

    pub fn number(&self, ctx: &ParseContext) -> Option<f64> {
        let d = self.decoded(ctx);
        d.kind.is_numeric().then_some(d.num)
    }

    /// Fractional-digit count; zero for integers and non-numbers.
    pub fn precision(&self, ctx: &ParseContext) -> u8 {
        self.decoded(ctx).precision
    }

    pub fn is_boolean(&self, ctx: &ParseContext) -> bool {
        self.bool_value(ctx).is_some()
    }

    pub fn bool_value(&self, ctx: &ParseContext) -> Option<bool> {
        let d = self.decoded(ctx);
        match d.kind {
            k if k.is_integer() && (d.num == 0.0 || d.num == 1.0) => Some(d.num == 1.0),
            ValueKind::Str => match d.folded.as_str() {
                "T" | "TRUE" | "Y" | "YES" => Some(true),
                "F" | "FALSE" | "N" | "NO" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Seconds since the Unix epoch when the cell parses as a datetime.
    pub fn datetime(&self, ctx: &ParseContext) -> Option<i64> {
        *self
            .datetime
            .get_or_init(|| datetime::parse_datetime(self.raw.trim(), &ctx.datetime_format))
    }

    /// Seconds since the Unix epoch (midnight UTC) for a plain date.
    pub fn date(&self, ctx: &ParseContext) -> Option<i64> {
        *self
            .date
            .get_or_init(|| datetime::parse_date(self.raw.trim(), &ctx.date_format))
    }

    pub fn timedelta(&self, _ctx: &ParseContext) -> Option<&Timedelta> {
        self.timedelta
            .get_or_init(|| timedelta::parse(&self.raw))
            .as_ref()
    }
}

fn classify(raw: &str, ctx: &ParseContext) -> Decoded {
    let trimmed = raw.trim();
    let folded = trimmed.to_uppercase();
    let text = |folded: String| Decoded {
        kind: ValueKind::Str,
        num: 0.0,
        precision: 0,
        folded,
    };

    if trimmed.is_empty() {
        return Decoded {
            kind: ValueKind::Null,
            num: 0.0,
            precision: 0,
            folded,
        };
    }

    let c_form = if ctx.locale.is_c() {
        Some(trimmed.to_owned())
    } else {
        ctx.locale.to_c_locale(trimmed)
    };

    if let Some(c_form) = c_form {
        if let NumberParse::Numeric { kind, value } = parse_number(&c_form) {
            if ctx.no_leading_zeroes && has_leading_zero(&c_form) {
                return text(folded);
            }
            let precision = if kind == ValueKind::Double {
                float_precision(value)
            } else {
                0
            };
            return Decoded {
                kind,
                num: value,
                precision,
                folded,
            };
        }
    }

    if let Some(money) = ctx.locale.strip_money(trimmed) {
        if let NumberParse::Numeric { value, .. } = parse_number(&money) {
            return Decoded {
                kind: ValueKind::Double,
                num: value,
                precision: float_precision(value),
                folded,
            };
        }
    }

    match folded.as_str() {
        "NAN" => Decoded {
            kind: ValueKind::Double,
            num: f64::NAN,
            precision: 0,
            folded,
        },
        "INF" | "INFINITY" | "+INF" | "+INFINITY" => Decoded {
            kind: ValueKind::Double,
            num: f64::INFINITY,
            precision: 0,
            folded,
        },
        "-INF" | "-INFINITY" => Decoded {
            kind: ValueKind::Double,
            num: f64::NEG_INFINITY,
            precision: 0,
            folded,
        },
        _ => text(folded),
    }
}

fn has_leading_zero(c_form: &str) -> bool {
    let unsigned = c_form.trim().trim_start_matches(['+', '-']);
    let int_part: &str = unsigned.split(['.', 'e', 'E']).next().unwrap_or("");
    int_part.len() > 1 && int_part.starts_with('0')
}

pub(crate) enum NumberParse {
    Text,
    Null,
    Numeric { kind: ValueKind, value: f64 },
}

/// State-machine number parse over a C-locale string.
///
/// Accepts optional leading `+` signs, one `-` before the digits, one
/// decimal point, one optionally-signed exponent, and leading/trailing
/// spaces. A space between digit groups makes the value text.
pub(crate) fn parse_number(input: &str) -> NumberParse {
    let Some(start) = input.find(|c| c != ' ') else {
        return NumberParse::Null;
    };
    let rest = input[start..].trim_start_matches('+');
    if rest.is_empty() {
        return NumberParse::Text;
    }

    let mut ws_allowed = true;
    let mut digit_allowed = true;
    let mut dot_allowed = true;
    let mut has_digit = false;
    let mut is_float = false;
    let mut negative = false;

    let mut integral = 0f64;
    let mut decimal = 0f64;
    let mut places = 0i32;

    let bytes = rest.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b' ' => {
                if !ws_allowed {
                    if bytes[i - 1].is_ascii_digit() {
                        // trailing padding; no digits may follow
                        digit_allowed = false;
                        ws_allowed = true;
                    } else {
                        return NumberParse::Text;
                    }
                }
            }
            b'-' => {
                if negative || has_digit || is_float {
                    return NumberParse::Text;
                }
                negative = true;
            }
            b'.' => {
                if !dot_allowed {
                    return NumberParse::Text;
                }
                dot_allowed = false;
                is_float = true;
            }
            b'e' | b'E' => {
                let digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
                if !has_digit || !digit_before {
                    return NumberParse::Text;
                }
                let exp_part = rest[i + 1..].trim_start_matches('+');
                return match parse_number(exp_part) {
                    NumberParse::Numeric { kind, value } if kind.is_integer() => {
                        let coeff = apply_sign(integral + decimal, negative);
                        NumberParse::Numeric {
                            kind: ValueKind::Double,
                            value: coeff * 10f64.powf(value),
                        }
                    }
                    _ => NumberParse::Text,
                };
            }
            b'0'..=b'9' => {
                if !digit_allowed {
                    return NumberParse::Text;
                }
                ws_allowed = false;
                has_digit = true;
                let digit = f64::from(bytes[i] - b'0');
                if is_float {
                    places += 1;
                    decimal += digit / 10f64.powi(places);
                } else {
                    integral = integral * 10.0 + digit;
                }
            }
            _ => return NumberParse::Text,
        }
        i += 1;
    }

    if !has_digit {
        return NumberParse::Text;
    }
    let magnitude = integral + decimal;
    let kind = if is_float {
        ValueKind::Double
    } else {
        integral_kind(magnitude)
    };
    NumberParse::Numeric {
        kind,
        value: apply_sign(magnitude, negative),
    }
}

fn apply_sign(value: f64, negative: bool) -> f64 {
    if negative {
        -value
    } else {
        value
    }
}

fn integral_kind(magnitude: f64) -> ValueKind {
    if magnitude <= f64::from(i8::MAX) {
        ValueKind::Int8
    } else if magnitude <= f64::from(i16::MAX) {
        ValueKind::Int16
    } else if magnitude <= f64::from(i32::MAX) {
        ValueKind::Int32
    } else if magnitude <= i64::MAX as f64 {
        ValueKind::Int64
    } else {
        ValueKind::Double
    }
}

/// Count of significant fractional digits of a decoded double, trailing
/// zeros dropped, capped by the double's decimal-digit capacity.
fn float_precision(value: f64) -> u8 {
    const MAX_DIGITS: i32 = 14;
    if !value.is_finite() {
        return 0;
    }
    let abs = value.abs();
    let int_part = abs.trunc();
    if int_part == abs {
        return 0;
    }
    let magnitude = if int_part == 0.0 {
        1
    } else {
        int_part.log10().trunc() as i32 + 1
    };
    if magnitude >= MAX_DIGITS {
        return 0;
    }
    let multiplier = 10f64.powi(MAX_DIGITS - magnitude);
    let mut frac_digits = (multiplier + (multiplier * (abs - int_part) + 0.5).trunc()) as u64;
    while frac_digits % 10 == 0 {
        frac_digits /= 10;
    }
    (frac_digits as f64).log10().trunc() as u8
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kind_of(s: &str) -> ValueKind {
        TypedCell::new(s).kind(&ParseContext::default())
    }

    #[test]
    fn integer_widths() {
        assert_eq!(kind_of("5"), ValueKind::Int8);
        assert_eq!(kind_of("-128"), ValueKind::Int16); // magnitude check is on 128
        assert_eq!(kind_of("1000"), ValueKind::Int16);
        assert_eq!(kind_of("70000"), ValueKind::Int32);
        assert_eq!(kind_of("3000000000"), ValueKind::Int64);
        assert_eq!(kind_of("99999999999999999999"), ValueKind::Double);
    }

    #[test]
    fn doubles_and_exponents() {
        assert_eq!(kind_of("1.5"), ValueKind::Double);
        assert_eq!(kind_of("1."), ValueKind::Double);
        let ctx = ParseContext::default();
        let cell = TypedCell::new("1.5e2");
        assert_eq!(cell.kind(&ctx), ValueKind::Double);
        assert_eq!(cell.number(&ctx), Some(150.0));
        let cell = TypedCell::new("2E-2");
        assert_eq!(cell.number(&ctx), Some(0.02));
        assert_eq!(kind_of("1.5e2.5"), ValueKind::Str);
        assert_eq!(kind_of("e5"), ValueKind::Str);
    }

    #[test]
    fn spaces_and_signs() {
        assert_eq!(kind_of("  42  "), ValueKind::Int8);
        assert_eq!(kind_of("+42"), ValueKind::Int8);
        assert_eq!(kind_of("-42"), ValueKind::Int8);
        assert_eq!(kind_of("510 123 4567"), ValueKind::Str);
        assert_eq!(kind_of("510-123-4567"), ValueKind::Str);
        assert_eq!(kind_of("42-"), ValueKind::Str);
        assert_eq!(kind_of("+++"), ValueKind::Str);
    }

    #[test]
    fn null_and_text() {
        assert_eq!(kind_of(""), ValueKind::Null);
        assert_eq!(kind_of("   "), ValueKind::Null);
        assert_eq!(kind_of("abc"), ValueKind::Str);
        let ctx = ParseContext::default();
        assert!(TypedCell::new("N/A").is_null(&ctx));
        assert!(TypedCell::new("null").is_null(&ctx));
        assert!(!TypedCell::new("n/a").is_nil(&ctx));
    }

    #[test]
    fn special_float_names() {
        let ctx = ParseContext::default();
        assert!(TypedCell::new("NaN").number(&ctx).unwrap().is_nan());
        assert_eq!(
            TypedCell::new("-Infinity").number(&ctx),
            Some(f64::NEG_INFINITY)
        );
        assert_eq!(TypedCell::new("inf").number(&ctx), Some(f64::INFINITY));
    }

    #[test]
    fn booleans() {
        let ctx = ParseContext::default();
        for (s, expected) in [
            ("true", true),
            ("T", true),
            ("YES", true),
            ("y", true),
            ("1", true),
            ("false", false),
            ("No", false),
            ("0", false),
        ] {
            assert_eq!(TypedCell::new(s).bool_value(&ctx), Some(expected), "{s}");
        }
        assert_eq!(TypedCell::new("2").bool_value(&ctx), None);
        assert_eq!(TypedCell::new("maybe").bool_value(&ctx), None);
    }

    #[test]
    fn locale_aware_numbers() {
        let ctx = ParseContext::with_locale("de_DE").unwrap();
        let cell = TypedCell::new("1.234.567,89");
        assert_eq!(cell.kind(&ctx), ValueKind::Double);
        assert_eq!(cell.number(&ctx), Some(1234567.89));
        // a bare dot cannot be German-formatted
        assert_eq!(TypedCell::new("1.5").kind(&ctx), ValueKind::Str);
    }

    #[test]
    fn money_rejoins_the_number_path() {
        let ctx = ParseContext::with_locale("en_US").unwrap();
        let cell = TypedCell::new("$1,234.56");
        assert_eq!(cell.kind(&ctx), ValueKind::Double);
        assert_eq!(cell.number(&ctx), Some(1234.56));
    }

    #[test]
    fn leading_zero_suppression() {
        let mut ctx = ParseContext::default();
        ctx.no_leading_zeroes = true;
        assert_eq!(TypedCell::new("0042").kind(&ctx), ValueKind::Str);
        assert_eq!(TypedCell::new("0").kind(&ctx), ValueKind::Int8);
        assert_eq!(TypedCell::new("0.5").kind(&ctx), ValueKind::Double);
        assert_eq!(TypedCell::new("42").kind(&ctx), ValueKind::Int8);
    }

    #[test]
    fn precision_tracking() {
        let ctx = ParseContext::default();
        assert_eq!(TypedCell::new("1").precision(&ctx), 0);
        assert_eq!(TypedCell::new("1.5").precision(&ctx), 1);
        assert_eq!(TypedCell::new("3.141").precision(&ctx), 3);
        assert_eq!(TypedCell::new("2.50").precision(&ctx), 1);
    }
}
