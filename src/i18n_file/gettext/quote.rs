// SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
//
// SPDX-License-Identifier: MIT

//! Escaping, unescaping and line wrapping of PO string literals.

/// Wrap width used for continuation lines.
const WRAP_WIDTH: usize = 76;
/// Strings longer than this (in characters) are written as multi-line literals.
const SINGLE_LINE_LIMIT: usize = 71;

pub fn escape_for_po(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len() + 8);
    for c in line.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Unknown escape sequences are kept as they are.
pub fn unescape_from_po(escaped: &str) -> String {
    let mut result = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Extract and unescape the content of a quoted literal such as `"foo\n"`.
///
/// Returns `None` when the literal is not properly opened and closed.
pub fn extract_literal(quoted: &str) -> Option<String> {
    let inner = quoted.trim().strip_prefix('"')?;
    let mut escaped = false;
    for (pos, c) in inner.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                if !inner[pos + 1..].trim().is_empty() {
                    return None;
                }
                return Some(unescape_from_po(&inner[..pos]));
            }
            _ => {}
        }
    }
    None
}

/// Greedy word-boundary wrapping that keeps every whitespace character.
///
/// A continuation line never starts with a space: a leading space is moved to
/// the end of the previous line.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut chunks: Vec<&str> = Vec::new();
    let mut start = 0;
    let mut previous_is_space: Option<bool> = None;
    for (pos, c) in line.char_indices() {
        let is_space = c.is_whitespace();
        if previous_is_space.is_some_and(|prev| prev != is_space) {
            chunks.push(&line[start..pos]);
            start = pos;
        }
        previous_is_space = Some(is_space);
    }
    if start < line.len() {
        chunks.push(&line[start..]);
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for chunk in chunks {
        let chunk_len = chunk.chars().count();
        if current_len + chunk_len <= width {
            current.push_str(chunk);
            current_len += chunk_len;
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }
        let mut rest = chunk;
        while rest.chars().count() > width {
            let split = rest.char_indices().nth(width).map(|(pos, _)| pos).unwrap_or(rest.len());
            lines.push(rest[..split].to_string());
            rest = &rest[split..];
        }
        current.push_str(rest);
        current_len = rest.chars().count();
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for index in 1..lines.len() {
        if lines[index].starts_with(' ') {
            lines[index].remove(0);
            lines[index - 1].push(' ');
        }
    }
    lines.retain(|line| !line.is_empty());
    lines
}

/// Quote the given text for a PO file, returning quoted and escaped lines.
///
/// An empty vector means the text is empty and should be written as `""`.
pub fn quote_for_po(text: &str) -> Vec<String> {
    let mut polines = Vec::new();
    let lines: Vec<&str> = text.split('\n').collect();
    let (last, head) = match lines.split_last() {
        Some(split) => split,
        None => return polines,
    };
    if !head.is_empty() || last.chars().count() > SINGLE_LINE_LIMIT {
        // "foo\n" stays on the keyword line, everything else gets a leader.
        if lines.len() != 2 || !last.is_empty() {
            polines.push("\"\"".to_string());
        }
        for line in head {
            let wrapped = wrap_line(line, WRAP_WIDTH);
            match wrapped.split_last() {
                Some((tail, rest)) => {
                    for piece in rest {
                        polines.push(format!("\"{}\"", escape_for_po(piece)));
                    }
                    polines.push(format!("\"{}\\n\"", escape_for_po(tail)));
                }
                None => polines.push("\"\\n\"".to_string()),
            }
        }
    }
    if !last.is_empty() {
        for piece in wrap_line(last, WRAP_WIDTH) {
            polines.push(format!("\"{}\"", escape_for_po(&piece)));
        }
    }
    polines
}

/// Render `keyword "..."` plus continuation lines, without trailing newlines.
pub fn render_part(keyword: &str, text: &str) -> Vec<String> {
    let mut polines = quote_for_po(text).into_iter();
    let first = polines.next().unwrap_or_else(|| "\"\"".to_string());
    let mut rendered = vec![format!("{keyword} {first}")];
    rendered.extend(polines);
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tst_escape_roundtrip() {
        let raw = "Tab\there, \"quoted\" and back\\slash\r";
        let escaped = escape_for_po(raw);
        assert_eq!(escaped, "Tab\\there, \\\"quoted\\\" and back\\\\slash\\r");
        assert_eq!(unescape_from_po(&escaped), raw);
    }

    #[test]
    fn tst_unknown_escape_is_kept() {
        assert_eq!(unescape_from_po("bell\\a"), "bell\\a");
        assert_eq!(unescape_from_po("dangling\\"), "dangling\\");
    }

    #[test]
    fn tst_extract_literal() {
        assert_eq!(extract_literal("\"a \\\"b\\\"\\n\""), Some("a \"b\"\n".to_string()));
        assert_eq!(extract_literal("  \"\"  "), Some(String::new()));
        assert_eq!(extract_literal("\"unterminated"), None);
        assert_eq!(extract_literal("\"a\" junk"), None);
        assert_eq!(extract_literal("no quotes"), None);
    }

    #[test]
    fn tst_quote_short_and_newline() {
        assert_eq!(quote_for_po(""), Vec::<String>::new());
        assert_eq!(quote_for_po("short"), vec!["\"short\""]);
        assert_eq!(quote_for_po("one line\n"), vec!["\"one line\\n\""]);
        assert_eq!(
            quote_for_po("first\nsecond"),
            vec!["\"\"", "\"first\\n\"", "\"second\""]
        );
        assert_eq!(
            quote_for_po("a\n\nb"),
            vec!["\"\"", "\"a\\n\"", "\"\\n\"", "\"b\""]
        );
    }

    #[test]
    fn tst_quote_wraps_long_lines() {
        let text = "This is a rather long message that certainly needs to be wrapped over more than one line of output";
        let quoted = quote_for_po(text);
        assert_eq!(quoted[0], "\"\"");
        assert!(quoted.len() >= 3);
        for line in &quoted[1..] {
            assert!(!line.starts_with("\" "));
            assert!(line.chars().count() <= WRAP_WIDTH + 3);
        }
        let joined: String = quoted.iter().map(|line| extract_literal(line).unwrap()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn tst_render_part() {
        assert_eq!(render_part("msgid", ""), vec!["msgid \"\""]);
        assert_eq!(render_part("msgstr[1]", "x"), vec!["msgstr[1] \"x\""]);
        assert_eq!(render_part("msgstr", "a\nb"), vec!["msgstr \"\"", "\"a\\n\"", "\"b\""]);
    }
}
