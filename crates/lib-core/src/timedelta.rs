//! Timedelta parsing.
//!
//! Two surface forms are accepted: positional colon groups (`m:s`, `h:m:s`,
//! `d:h:m:s`) and unit words (`2 weeks, 3 days, 1 hour, 5 min 2.5s`), with
//! word units appearing at most once each and in descending magnitude. The
//! two may be mixed with words first (`1 day, 2:30:00`), which keeps the
//! canonical rendering re-parseable.

#[derive(Debug, Clone, PartialEq)]
pub struct Timedelta {
    /// Total seconds.
    pub seconds: f64,
    /// `[N day[s], ]H:MM:SS[.micro]`.
    pub canonical: String,
}

#[derive(Debug, PartialEq)]
enum Tok {
    Num(String),
    Word(String),
    Colon,
    Comma,
}

const WEEK: f64 = 604_800.0;
const DAY: f64 = 86_400.0;
const HOUR: f64 = 3_600.0;
const MINUTE: f64 = 60.0;

fn unit(word: &str) -> Option<(u8, f64)> {
    Some(match word {
        "w" | "wk" | "wks" | "week" | "weeks" => (0, WEEK),
        "d" | "day" | "days" => (1, DAY),
        "h" | "hr" | "hrs" | "hour" | "hours" => (2, HOUR),
        "m" | "min" | "mins" | "minute" | "minutes" => (3, MINUTE),
        "s" | "sec" | "secs" | "second" | "seconds" => (4, 1.0),
        _ => return None,
    })
}

pub fn parse(input: &str) -> Option<Timedelta> {
    let s = input.trim_matches([' ', '\t', '\r', '\n']);
    if s.is_empty() {
        return None;
    }
    let colons = s.matches(':').count();
    if colons > 3 {
        return None;
    }
    // an hour word next to colon groups is ambiguous
    if colons > 0 && s.to_ascii_lowercase().contains('h') {
        return None;
    }
    // d:h:m:s already carries days; weeks or day words would duplicate them
    if colons == 3 && s.to_ascii_lowercase().contains(['w', 'd']) {
        return None;
    }

    let toks = tokenize(s)?;
    let colon_start = toks
        .iter()
        .position(|t| *t == Tok::Colon)
        .map(|i| i.checked_sub(1))
        .unwrap_or(Some(toks.len()))?;

    let mut total = 0f64;
    let mut matched = false;

    // word region: (Num Word [Comma])*
    let mut last_rank: i8 = -1;
    let mut i = 0usize;
    let mut dangling_comma = false;
    while i < colon_start {
        let (Tok::Num(n), Some(Tok::Word(w))) = (&toks[i], toks.get(i + 1)) else {
            return None;
        };
        let (rank, secs) = unit(w)?;
        if rank as i8 <= last_rank {
            return None;
        }
        last_rank = rank as i8;
        total += n.parse::<f64>().ok()? * secs;
        matched = true;
        i += 2;
        dangling_comma = false;
        if i < colon_start && toks[i] == Tok::Comma {
            i += 1;
            dangling_comma = true;
        }
    }

    // colon region: Num (Colon Num){1..3}
    if colon_start < toks.len() {
        let mut groups: Vec<&str> = Vec::new();
        let mut expect_num = true;
        for tok in &toks[colon_start..] {
            match (expect_num, tok) {
                (true, Tok::Num(n)) => groups.push(n),
                (false, Tok::Colon) => {}
                _ => return None,
            }
            expect_num = !expect_num;
        }
        if expect_num || groups.len() != colons + 1 {
            return None;
        }
        total += colon_seconds(&groups)?;
        matched = true;
    } else if dangling_comma {
        return None;
    }

    if !matched {
        return None;
    }
    Some(Timedelta {
        seconds: total,
        canonical: canonical(total),
    })
}

fn colon_seconds(groups: &[&str]) -> Option<f64> {
    let scales: &[f64] = match groups.len() {
        2 => &[MINUTE, 1.0],
        3 => &[HOUR, MINUTE, 1.0],
        4 => &[DAY, HOUR, MINUTE, 1.0],
        _ => return None,
    };
    let mut total = 0f64;
    for (i, (group, scale)) in groups.iter().zip(scales).enumerate() {
        let last = i == groups.len() - 1;
        let (int_part, frac) = match group.split_once('.') {
            Some((int_part, frac)) if last => (int_part, Some(frac)),
            Some(_) => return None,
            None => (*group, None),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // only the leading group may stretch past two digits
        if i > 0 && int_part.len() != 2 {
            return None;
        }
        if let Some(frac) = frac {
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
        }
        let value: f64 = match frac {
            Some(frac) => format!("{int_part}.{frac}").parse().ok()?,
            None => int_part.parse().ok()?,
        };
        total += value * scale;
    }
    Some(total)
}

fn tokenize(s: &str) -> Option<Vec<Tok>> {
    let mut toks = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            ',' => {
                chars.next();
                if toks.last() == Some(&Tok::Comma) {
                    return None;
                }
                toks.push(Tok::Comma);
            }
            ':' => {
                chars.next();
                toks.push(Tok::Colon);
            }
            '0'..='9' | '.' => {
                let mut num = String::new();
                let mut dots = 0;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        dots += usize::from(c == '.');
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if dots > 1 || num == "." {
                    return None;
                }
                toks.push(Tok::Num(num));
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphabetic() {
                        word.push(c.to_ascii_lowercase());
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok::Word(word));
            }
            _ => return None,
        }
    }
    Some(toks)
}

/// Render total seconds as `[N day[s], ]H:MM:SS[.micro]`.
pub fn canonical(total_seconds: f64) -> String {
    let total_micros = (total_seconds * 1e6).round() as u64;
    let days = total_micros / 86_400_000_000;
    let rem = total_micros % 86_400_000_000;
    let hours = rem / 3_600_000_000;
    let minutes = rem % 3_600_000_000 / 60_000_000;
    let seconds = rem % 60_000_000 / 1_000_000;
    let micros = rem % 1_000_000;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!(
            "{days} day{}, ",
            if days == 1 { "" } else { "s" }
        ));
    }
    out.push_str(&format!("{hours}:{minutes:02}:{seconds:02}"));
    if micros != 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn seconds(s: &str) -> Option<f64> {
        parse(s).map(|t| t.seconds)
    }

    #[test]
    fn colon_forms() {
        assert_eq!(seconds("4:50"), Some(290.0));
        assert_eq!(seconds("1:30:00"), Some(5400.0));
        assert_eq!(seconds("1:01:01:01"), Some(90061.0));
        assert_eq!(seconds("0:00:02.5"), Some(2.5));
        assert_eq!(seconds("100:30"), Some(6030.0));
    }

    #[test]
    fn colon_group_shape_is_enforced() {
        assert_eq!(seconds("1:5"), None); // interior groups are two digits
        assert_eq!(seconds("1.5:30"), None); // no fraction in leading group
        assert_eq!(seconds("1:02:03:04:05"), None);
    }

    #[test]
    fn word_forms() {
        assert_eq!(seconds("2 weeks, 3 days"), Some(2.0 * 604800.0 + 3.0 * 86400.0));
        assert_eq!(seconds("1 hour, 5 min 2.5s"), Some(3902.5));
        assert_eq!(seconds("90 seconds"), Some(90.0));
        assert_eq!(seconds("1wk"), Some(604800.0));
    }

    #[test]
    fn units_must_descend_and_not_repeat() {
        assert_eq!(seconds("5 min 1 hour"), None);
        assert_eq!(seconds("3 days, 3 days"), None);
    }

    #[test]
    fn mixed_word_and_colon() {
        assert_eq!(seconds("1 day, 2:30:00"), Some(86400.0 + 9000.0));
        assert_eq!(seconds("1h 2:30"), None); // hour word with colons
        assert_eq!(seconds("1 week, 0:01:01:00"), None); // days twice
    }

    #[test]
    fn non_timedeltas() {
        for s in ["", "5", "abc", "1 parsec", "1 day,", "1,, 2s", "1:xx"] {
            assert_eq!(seconds(s), None, "{s:?}");
        }
    }

    #[test]
    fn canonical_rendering_roundtrips() {
        let td = parse("1 day, 1:01:01").unwrap();
        assert_eq!(td.canonical, "1 day, 1:01:01");
        assert_eq!(seconds(&td.canonical), Some(td.seconds));

        let td = parse("2.5s").unwrap();
        assert_eq!(td.canonical, "0:00:02.500000");
        assert_eq!(seconds(&td.canonical), Some(2.5));

        let td = parse("3 days").unwrap();
        assert_eq!(td.canonical, "3 days, 0:00:00");
    }
}
