//! Encoding bridge: recode source bytes to UTF-8.
//!
//! Labels are case-insensitive and aliased. UTF-8 input is validated in
//! place, UTF-16/32 (either endianness, with or without BOM) are converted
//! directly, everything else goes through the WHATWG label lookup of
//! `encoding_rs`, with a bare code-page number `N` retried as `cpN` and
//! `windows-N`.

use crate::errors::{Result, TabError};

/// Number of scalar values in a UTF-8 string, i.e. everything that is not a
/// continuation byte. This is the unit `--maxfieldsize` is measured in.
pub fn char_count(s: &str) -> usize {
    s.bytes().filter(|b| b & 0xC0 != 0x80).count()
}

fn normalize(label: &str) -> String {
    label
        .trim()
        .to_ascii_uppercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_' && *c != ' ')
        .collect()
}

fn utf16_to_string(bytes: &[u8], little_endian: bool) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(TabError::Encoding(
            "UTF-16 input has an odd number of bytes".into(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| {
            if little_endian {
                u16::from_le_bytes([c[0], c[1]])
            } else {
                u16::from_be_bytes([c[0], c[1]])
            }
        })
        .collect();
    String::from_utf16(&units)
        .map_err(|_| TabError::Encoding("invalid UTF-16 code unit sequence".into()))
}

fn utf32_to_string(bytes: &[u8], little_endian: bool) -> Result<String> {
    if bytes.len() % 4 != 0 {
        return Err(TabError::Encoding(
            "UTF-32 input length is not a multiple of four".into(),
        ));
    }
    bytes
        .chunks_exact(4)
        .map(|c| {
            let u = if little_endian {
                u32::from_le_bytes([c[0], c[1], c[2], c[3]])
            } else {
                u32::from_be_bytes([c[0], c[1], c[2], c[3]])
            };
            char::from_u32(u)
                .ok_or_else(|| TabError::Encoding(format!("invalid UTF-32 scalar 0x{u:X}")))
        })
        .collect()
}

/// Validate UTF-8, reporting the byte offset of the first invalid sequence.
pub fn validate_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let pos = e.valid_up_to();
        let byte = bytes.get(pos).copied().unwrap_or(0);
        TabError::Encoding(format!(
            "Your file is not \"UTF-8\" encoded. Please specify the correct encoding with the -e flag.\n\
             Decode error: can't decode byte 0x{byte:x} in position {pos}."
        ))
    })
}

/// Recode `bytes` from the encoding named by `label` into a UTF-8 string.
pub fn recode(bytes: &[u8], label: &str) -> Result<String> {
    let norm = normalize(label);
    match norm.as_str() {
        "UTF8" => {
            let s = validate_utf8(bytes)?;
            // strip a UTF-8 BOM if present
            return Ok(s.strip_prefix('\u{feff}').unwrap_or(s).to_owned());
        }
        "UTF16LE" => return utf16_to_string(bytes, true),
        "UTF16BE" => return utf16_to_string(bytes, false),
        "UTF16" => {
            // BOM decides; default to little endian
            return match bytes {
                [0xFE, 0xFF, rest @ ..] => utf16_to_string(rest, false),
                [0xFF, 0xFE, rest @ ..] => utf16_to_string(rest, true),
                _ => utf16_to_string(bytes, true),
            };
        }
        "UTF32LE" => return utf32_to_string(bytes, true),
        "UTF32BE" => return utf32_to_string(bytes, false),
        "UTF32" => {
            return match bytes {
                [0x00, 0x00, 0xFE, 0xFF, rest @ ..] => utf32_to_string(rest, false),
                [0xFF, 0xFE, 0x00, 0x00, rest @ ..] => utf32_to_string(rest, true),
                _ => utf32_to_string(bytes, true),
            };
        }
        _ => {}
    }

    let encoding = lookup(label).ok_or_else(|| {
        TabError::Encoding(format!("LookupError: unknown encoding: {label}"))
    })?;
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(TabError::Encoding(format!(
            "can't decode input as {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

fn lookup(label: &str) -> Option<&'static encoding_rs::Encoding> {
    let label = label.trim();
    if let Some(enc) = encoding_rs::Encoding::for_label(label.as_bytes()) {
        return Some(enc);
    }
    // a bare number is tried as a Windows code page
    if !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()) {
        for prefix in ["cp", "windows-"] {
            let aliased = format!("{prefix}{label}");
            if let Some(enc) = encoding_rs::Encoding::for_label(aliased.as_bytes()) {
                return Some(enc);
            }
        }
    }
    None
}
