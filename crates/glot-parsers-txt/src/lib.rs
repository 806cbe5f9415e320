//! Parser for the line-oriented catalog format.
//!
//! A catalog is UTF-8 with an optional BOM. Lines are either blank, a `#`
//! comment, a leading `@meta <key> = <value>` directive, or an entry
//! `token[(label)]: template`. Meta directives are only recognized before
//! the first entry.

use glot_core::lex;
use glot_core::style::is_style_token;
use glot_core::{CatalogSnapshot, GlotError, PluralRule, Result};

struct Entry {
    key: String,
    label: Option<String>,
    text: String,
}

/// Parse a full catalog source into a snapshot.
///
/// In strict mode any malformed line, unknown meta key or late meta
/// directive is fatal; otherwise the offending line is skipped. Duplicate
/// tokens and a catalog with zero valid entries are fatal in both modes.
pub fn parse_text_catalog(src: &str, strict: bool) -> Result<CatalogSnapshot> {
    let src = lex::strip_utf8_bom(src);
    let mut snapshot = CatalogSnapshot::default();
    let mut meta_phase = true;
    let mut loaded = 0usize;

    for (idx, raw_line) in src.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = parse_meta_line(trimmed) {
            if !meta_phase {
                if strict {
                    return Err(GlotError::Parse {
                        line: line_no,
                        message: "meta directive after entries".into(),
                    });
                }
                continue;
            }
            apply_meta(&mut snapshot, &key, value, strict, line_no)?;
            continue;
        }
        meta_phase = false;

        let entry = match parse_entry_line(trimmed) {
            Ok(entry) => entry,
            Err(message) => {
                if strict {
                    return Err(GlotError::Parse {
                        line: line_no,
                        message,
                    });
                }
                continue;
            }
        };

        let token = entry.key.clone();
        if !snapshot.insert_entry(entry.key, entry.text, entry.label) {
            return Err(GlotError::DuplicateToken {
                line: line_no,
                token,
            });
        }
        loaded += 1;
    }

    if loaded == 0 {
        return Err(GlotError::EmptyCatalog);
    }

    snapshot.populate_style_registry();
    Ok(snapshot)
}

fn apply_meta(
    snapshot: &mut CatalogSnapshot,
    key: &str,
    value: String,
    strict: bool,
    line_no: usize,
) -> Result<()> {
    match key {
        "locale" => snapshot.metadata.locale = value,
        "fallback" => snapshot.metadata.fallback = value,
        "note" => snapshot.metadata.note = value,
        "plural" => match PluralRule::parse_name(&value) {
            Some(rule) => snapshot.metadata.plural = rule,
            None if strict => {
                return Err(GlotError::Parse {
                    line: line_no,
                    message: format!("unknown plural rule '{value}'"),
                });
            }
            None => {}
        },
        other => {
            if strict {
                return Err(GlotError::Parse {
                    line: line_no,
                    message: format!("unknown meta key '{other}'"),
                });
            }
        }
    }
    Ok(())
}

/// Recognize `@meta <key> = <value>`. Key is case-folded; both sides must
/// be non-empty, otherwise the line is not treated as a meta directive.
fn parse_meta_line(trimmed: &str) -> Option<(String, String)> {
    let rest = trimmed.strip_prefix("@meta")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (key, value) = rest.trim().split_once('=')?;
    let key = key.trim().to_ascii_lowercase();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value.to_string()))
}

fn parse_entry_line(trimmed: &str) -> std::result::Result<Entry, String> {
    let (head, text) = trimmed.split_once(':').ok_or("missing ':'")?;
    let head = head.trim();
    let text = text.trim_start();

    let (token_part, label) = match head.find('(') {
        None => (head, None),
        Some(open) => {
            let close = head[open + 1..]
                .find(')')
                .ok_or("label '(' without closing ')'")?
                + open
                + 1;
            let label = head[open + 1..close].trim().to_string();
            (head[..open].trim_end(), Some(label))
        }
    };

    let (key, base) = if token_part.contains('{') {
        let (base, variant) =
            lex::parse_variant_suffix(token_part).ok_or("invalid token variant")?;
        (lex::variant_key(&base, &variant), base)
    } else {
        let base = token_part.to_ascii_lowercase();
        (base.clone(), base)
    };

    if !lex::is_hex_token(&base) && !is_style_token(&base) {
        return Err("token is not a valid hex string (6-32 chars) or style name".into());
    }

    Ok(Entry {
        key,
        label: label.filter(|l| !l.is_empty()),
        text: lex::unescape_text(text),
    })
}
