//! Byte-level lexical helpers shared by the parsers and the resolver.
//!
//! Tokens are ASCII and compared byte-exact after case folding; templates are
//! UTF-8 and every byte that is not part of a recognized production is copied
//! verbatim by the consumers of these helpers.

use crate::style::STYLE_PREFIX;

/// Remove a leading UTF-8 byte-order mark, if present.
pub fn strip_utf8_bom(s: &str) -> &str {
    s.strip_prefix('\u{feff}').unwrap_or(s)
}

/// Minimal unescape for catalog text: `\n \t \r \\ \:` map to their
/// characters; any other `\x` drops the backslash and keeps `x`.
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// A base token in hex form: 6 to 32 hex digits.
pub fn is_hex_token(s: &str) -> bool {
    (6..=32).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Variant names are 1 to 16 characters from `[a-z0-9_-]`.
pub fn is_variant_valid(variant: &str) -> bool {
    (1..=16).contains(&variant.len())
        && variant
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// Split `base{variant}` into its case-folded parts.
///
/// Returns `None` unless the token ends in a well-formed, valid variant
/// suffix and the base is non-empty.
pub fn parse_variant_suffix(token: &str) -> Option<(String, String)> {
    let open = token.find('{')?;
    let close = token[open + 1..].find('}')? + open + 1;
    if close != token.len() - 1 {
        return None;
    }

    let base = token[..open].to_ascii_lowercase();
    let variant = token[open + 1..close].to_ascii_lowercase();
    if base.is_empty() || !is_variant_valid(&variant) {
        return None;
    }
    Some((base, variant))
}

/// Compose the catalog key for a variant-qualified token.
pub fn variant_key(base: &str, variant: &str) -> String {
    format!("{base}{{{variant}}}")
}

/// Try to read an inline token reference starting at the `@` at byte offset
/// `at`. On success returns the case-folded token (with any `{variant}`
/// suffix) and the number of bytes consumed including the `@`.
///
/// `@@` is not a token (the caller treats it as an escaped `@`), and a lone
/// `@` that does not begin a hex or style token is left for the caller to
/// emit literally.
pub fn try_parse_inline_token(s: &str, at: usize) -> Option<(String, usize)> {
    let b = s.as_bytes();
    if b.get(at) != Some(&b'@') {
        return None;
    }
    let next = *b.get(at + 1)?;
    if next == b'@' {
        return None;
    }

    if let Some(parsed) = parse_style_inline(s, at) {
        return Some(parsed);
    }

    // Hex form: @ followed by 6..=32 hex digits.
    let base_pos = at + 1;
    let mut pos = base_pos;
    while pos < b.len() && pos - base_pos < 32 && b[pos].is_ascii_hexdigit() {
        pos += 1;
    }
    if pos - base_pos < 6 {
        return None;
    }

    let mut token = s[base_pos..pos].to_ascii_lowercase();
    let mut advance = pos - at;
    if let Some((variant, end)) = parse_brace_variant(b, pos) {
        token.push('{');
        token.push_str(&variant);
        token.push('}');
        advance = end - at;
    } else if b.get(pos) == Some(&b'{') {
        // Opened a variant suffix but it is malformed: not a token at all.
        return None;
    }

    Some((token, advance))
}

fn parse_style_inline(s: &str, at: usize) -> Option<(String, usize)> {
    let b = s.as_bytes();
    let base_pos = at + 1;
    // Need the prefix plus at least one name character.
    if base_pos + STYLE_PREFIX.len() >= b.len() {
        return None;
    }
    if !s[base_pos..base_pos + STYLE_PREFIX.len()].eq_ignore_ascii_case(STYLE_PREFIX) {
        return None;
    }

    let mut pos = base_pos + STYLE_PREFIX.len();
    while pos < b.len() && (b[pos].is_ascii_alphanumeric() || b[pos] == b'_' || b[pos] == b'-') {
        if pos - base_pos > 64 {
            return None;
        }
        pos += 1;
    }
    if pos == base_pos + STYLE_PREFIX.len() {
        // Bare "style_" with no name characters.
        return None;
    }

    let mut token = s[base_pos..pos].to_ascii_lowercase();
    let mut advance = pos - at;
    if let Some((variant, end)) = parse_brace_variant(b, pos) {
        token.push('{');
        token.push_str(&variant);
        token.push('}');
        advance = end - at;
    } else if b.get(pos) == Some(&b'{') {
        return None;
    }

    Some((token, advance))
}

/// Read a `{variant}` suffix at `pos`. Returns the case-folded variant and
/// the byte offset just past the closing brace.
fn parse_brace_variant(b: &[u8], pos: usize) -> Option<(String, usize)> {
    if b.get(pos) != Some(&b'{') {
        return None;
    }
    let mut k = pos + 1;
    let mut variant = String::new();
    while k < b.len() && b[k] != b'}' {
        if variant.len() >= 16 {
            return None;
        }
        variant.push(b[k].to_ascii_lowercase() as char);
        k += 1;
    }
    if k >= b.len() || variant.is_empty() || !is_variant_valid(&variant) {
        return None;
    }
    Some((variant, k + 1))
}

/// Collect the distinct inline references of a template, sorted.
pub fn scan_inline_refs(text: &str) -> Vec<String> {
    let b = text.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;
    while i < b.len() {
        if b[i] != b'@' {
            i += 1;
            continue;
        }
        if b.get(i + 1) == Some(&b'@') {
            i += 2;
            continue;
        }
        if let Some((token, advance)) = try_parse_inline_token(text, i) {
            refs.push(token);
            i += advance;
            continue;
        }
        i += 1;
    }
    refs.sort_unstable();
    refs.dedup();
    refs
}
