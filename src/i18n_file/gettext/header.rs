// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

//! PO header fields and charset handling.

use std::sync::OnceLock;

use regex::Regex;

use super::{PoParseError, PoSaveError};

/// Canonical order of the well-known header fields.
pub const HEADER_ORDER: [&str; 12] = [
    "Project-Id-Version",
    "Report-Msgid-Bugs-To",
    "POT-Creation-Date",
    "PO-Revision-Date",
    "Last-Translator",
    "Language-Team",
    "Language",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
    "Plural-Forms",
    "X-Generator",
];

pub type HeaderFields = Vec<(String, String)>;

// ===== Charset =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Charset {
    /// Resolve a charset label as found in `Content-Type`.
    ///
    /// The `CHARSET` placeholder of fresh templates means UTF-8.
    pub fn from_label(label: &str) -> Result<Self, PoParseError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "charset" => Ok(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            _ => Err(PoParseError::UnsupportedCharset(label.trim().to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "ASCII",
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, PoParseError> {
        let bad_byte_line = |offset: usize| bytes[..offset].iter().filter(|b| **b == b'\n').count() + 1;
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|err| {
                let offset = err.utf8_error().valid_up_to();
                PoParseError::Decode {
                    charset: self.label(),
                    line: bad_byte_line(offset),
                }
            }),
            Self::Latin1 => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(PoParseError::Decode {
                    charset: self.label(),
                    line: bad_byte_line(offset),
                }),
                None => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
            },
        }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>, PoSaveError> {
        let limit = match self {
            Self::Utf8 => return Ok(text.as_bytes().to_vec()),
            Self::Latin1 => 0xFF,
            Self::Ascii => 0x7F,
        };
        text.chars()
            .map(|c| {
                u8::try_from(u32::from(c))
                    .ok()
                    .filter(|b| u32::from(*b) <= limit)
                    .ok_or(PoSaveError::Unencodable { charset: self.label(), character: c })
            })
            .collect()
    }
}

fn charset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"charset=([^\s;"\\]+)"#).unwrap())
}

/// Charset declared by a `Content-Type` value, if any.
pub fn declared_charset(content_type: &str) -> Option<&str> {
    charset_regex()
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ===== Fields =====

/// Split a header msgstr into `Key: value` pairs, keeping their order.
pub fn parse_header_string(text: &str) -> HeaderFields {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub fn render_header_string(fields: &[(String, String)]) -> String {
    fields.iter().map(|(key, value)| format!("{key}: {value}\n")).collect()
}

pub fn header_field<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

fn take_update(pending: &mut Vec<(String, String)>, key: &str) -> Option<String> {
    let position = pending.iter().position(|(name, _)| name.eq_ignore_ascii_case(key))?;
    Some(pending.remove(position).1)
}

/// Merge `updates` into `existing`.
///
/// Well-known fields come first in canonical order, other existing fields keep
/// their relative order. Keys use `_` or `-` interchangeably and match case
/// insensitively. With `add`, update keys absent from `existing` are added.
pub fn update_header_fields(existing: &[(String, String)], add: bool, updates: &[(&str, String)]) -> HeaderFields {
    let mut pending: Vec<(String, String)> = updates
        .iter()
        .map(|(key, value)| (key.replace('_', "-"), value.clone()))
        .collect();
    let mut result = HeaderFields::new();
    for key in HEADER_ORDER {
        match existing.iter().find(|(name, _)| name.eq_ignore_ascii_case(key)) {
            Some((name, value)) => {
                let value = take_update(&mut pending, key).unwrap_or_else(|| value.clone());
                result.push((name.clone(), value));
            }
            None if add => {
                if let Some(value) = take_update(&mut pending, key) {
                    result.push((key.to_string(), value));
                }
            }
            None => {}
        }
    }
    for (name, value) in existing {
        if HEADER_ORDER.iter().any(|key| key.eq_ignore_ascii_case(name)) {
            continue;
        }
        let value = take_update(&mut pending, name).unwrap_or_else(|| value.clone());
        result.push((name.clone(), value));
    }
    if add {
        result.extend(pending);
    }

    for (name, value) in result.iter_mut() {
        if name.eq_ignore_ascii_case("Content-Type") && value.contains("charset=CHARSET") {
            *value = value.replace("charset=CHARSET", "charset=UTF-8");
        }
        if name.eq_ignore_ascii_case("Content-Transfer-Encoding") && value.contains("ENCODING") {
            *value = "8bit".to_string();
        }
    }
    result
}

// ===== Plural forms =====

fn nplurals_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"nplurals\s*=\s*(.+?);").unwrap())
}

fn plural_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"plural\s*=\s*(.+?);?\s*$").unwrap())
}

/// Parse `nplurals=<int>; plural=<expr>;`.
///
/// The two parts are parsed independently. Template placeholders count as
/// not set.
pub fn parse_plural_forms(value: &str) -> (Option<u32>, Option<String>) {
    let nplurals_caps = nplurals_regex().captures(value);
    let nplurals = nplurals_caps
        .as_ref()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|n| *n != "INTEGER")
        .and_then(|n| n.parse::<u32>().ok());
    // "nplurals=" also contains "plural=", skip past it first.
    let rest = match nplurals_caps.as_ref().and_then(|caps| caps.get(0)) {
        Some(m) => &value[m.end()..],
        None => value,
    };
    let plural = plural_regex()
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|expr| expr != "EXPRESSION" && !expr.is_empty());
    (nplurals, plural)
}

pub fn render_plural_forms(nplurals: u32, plural: &str) -> String {
    format!("nplurals={nplurals}; plural={plural};")
}

// ===== Fresh header =====

/// Field values used when a header is built from scratch.
#[derive(Debug, Clone)]
pub struct HeaderDefaults {
    pub project_id_version: String,
    pub report_msgid_bugs_to: String,
    pub pot_creation_date: String,
    pub po_revision_date: String,
    pub last_translator: String,
    pub language_team: String,
    pub charset: String,
    pub encoding: String,
    pub plural_forms: Option<String>,
    pub x_generator: Option<String>,
}

impl Default for HeaderDefaults {
    fn default() -> Self {
        Self {
            project_id_version: "PACKAGE VERSION".to_string(),
            report_msgid_bugs_to: String::new(),
            pot_creation_date: revision_timestamp(),
            po_revision_date: "YEAR-MO-DA HO:MI+ZONE".to_string(),
            last_translator: "FULL NAME <EMAIL@ADDRESS>".to_string(),
            language_team: "LANGUAGE <LL@li.org>".to_string(),
            charset: "CHARSET".to_string(),
            encoding: "ENCODING".to_string(),
            plural_forms: None,
            x_generator: None,
        }
    }
}

impl HeaderDefaults {
    pub fn into_fields(self) -> HeaderFields {
        let mut fields = vec![
            ("Project-Id-Version".to_string(), self.project_id_version),
            ("Report-Msgid-Bugs-To".to_string(), self.report_msgid_bugs_to),
            ("POT-Creation-Date".to_string(), self.pot_creation_date),
            ("PO-Revision-Date".to_string(), self.po_revision_date),
            ("Last-Translator".to_string(), self.last_translator),
            ("Language-Team".to_string(), self.language_team),
            ("MIME-Version".to_string(), "1.0".to_string()),
            ("Content-Type".to_string(), format!("text/plain; charset={}", self.charset)),
            ("Content-Transfer-Encoding".to_string(), self.encoding),
        ];
        if let Some(plural_forms) = self.plural_forms {
            fields.push(("Plural-Forms".to_string(), plural_forms));
        }
        if let Some(generator) = self.x_generator {
            fields.push(("X-Generator".to_string(), generator));
        }
        fields
    }
}

/// Current local time in the format used by `PO-Revision-Date`.
pub fn revision_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M%z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tst_charset_labels() {
        assert_eq!(Charset::from_label("UTF-8").unwrap(), Charset::Utf8);
        assert_eq!(Charset::from_label("CHARSET").unwrap(), Charset::Utf8);
        assert_eq!(Charset::from_label("latin1").unwrap(), Charset::Latin1);
        assert_eq!(Charset::from_label("US-ASCII").unwrap(), Charset::Ascii);
        assert!(matches!(
            Charset::from_label("KOI8-R"),
            Err(PoParseError::UnsupportedCharset(name)) if name == "KOI8-R"
        ));
    }

    #[test]
    fn tst_charset_decode_encode() {
        assert_eq!(Charset::Latin1.decode(b"caf\xe9").unwrap(), "café");
        assert_eq!(Charset::Latin1.encode("café").unwrap(), b"caf\xe9");
        assert!(matches!(
            Charset::Utf8.decode(b"ok\nbad \xff"),
            Err(PoParseError::Decode { line: 2, .. })
        ));
        assert!(Charset::Ascii.decode(b"caf\xe9").is_err());
        assert!(matches!(
            Charset::Latin1.encode("海"),
            Err(PoSaveError::Unencodable { character: '海', .. })
        ));
    }

    #[test]
    fn tst_declared_charset() {
        assert_eq!(declared_charset("text/plain; charset=ISO-8859-1"), Some("ISO-8859-1"));
        assert_eq!(declared_charset("text/plain"), None);
    }

    #[test]
    fn tst_update_header_order() {
        let existing = parse_header_string(
            "X-Custom: yes\nContent-Type: text/plain; charset=CHARSET\nProject-Id-Version: demo 1.0\n",
        );
        let updated = update_header_fields(
            &existing,
            true,
            &[
                ("Last_Translator", "Jane <jane@example.com>".to_string()),
                ("Content-Transfer-Encoding", "ENCODING".to_string()),
            ],
        );
        let keys: Vec<&str> = updated.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["Project-Id-Version", "Last-Translator", "Content-Type", "Content-Transfer-Encoding", "X-Custom"]
        );
        assert_eq!(header_field(&updated, "content-type"), Some("text/plain; charset=UTF-8"));
        assert_eq!(header_field(&updated, "Content-Transfer-Encoding"), Some("8bit"));

        let not_added = update_header_fields(&existing, false, &[("Language", "de".to_string())]);
        assert_eq!(header_field(&not_added, "Language"), None);
    }

    #[test]
    fn tst_plural_forms() {
        assert_eq!(
            parse_plural_forms("nplurals=2; plural=(n != 1);"),
            (Some(2), Some("(n != 1)".to_string()))
        );
        assert_eq!(parse_plural_forms("nplurals=INTEGER; plural=EXPRESSION;"), (None, None));
        assert_eq!(parse_plural_forms("nplurals=1;"), (Some(1), None));
        assert_eq!(parse_plural_forms(""), (None, None));
        assert_eq!(render_plural_forms(1, "0"), "nplurals=1; plural=0;");
    }

    #[test]
    fn tst_header_defaults() {
        let fields = HeaderDefaults::default().into_fields();
        assert_eq!(header_field(&fields, "Last-Translator"), Some("FULL NAME <EMAIL@ADDRESS>"));
        assert_eq!(header_field(&fields, "MIME-Version"), Some("1.0"));
        assert_eq!(header_field(&fields, "Content-Type"), Some("text/plain; charset=CHARSET"));
    }
}
