//! Template resolution.
//!
//! The resolver never fails: anomalies degrade to visible text sentinels
//! (`⟦…⟧`) so a rendering pipeline always receives something debuggable.
//! Recursion is bounded by a depth cap and a cycle guard; the `seen` set is
//! extended on entry and restored on exit so sibling references may share
//! tokens without a spurious cycle report.

use std::collections::HashSet;

use glot_core::lex::{is_hex_token, parse_variant_suffix, try_parse_inline_token, variant_key};
use glot_core::{CatalogSnapshot, StyleProperty};
use glot_domain::NativeStyle;

const MAX_DEPTH: u32 = 32;

/// Emitted by callers that have no published snapshot to resolve against.
pub const NO_CATALOG: &str = "\u{27e6}NO_CATALOG\u{27e7}";

const RECURSION_LIMIT: &str = "\u{27e6}RECURSION_LIMIT\u{27e7}";

fn cycle_sentinel(token: &str) -> String {
    format!("\u{27e6}CYCLE:{token}\u{27e7}")
}

fn miss_sentinel(token: &str) -> String {
    format!("\u{27e6}{token}\u{27e7}")
}

fn missing_ref_sentinel(token: &str) -> String {
    format!("\u{27e6}MISSING:@{token}\u{27e7}")
}

fn arg_sentinel(idx: usize) -> String {
    format!("\u{27e6}arg:{idx}\u{27e7}")
}

/// Resolve a token to text. The token is case-folded; a variant-qualified
/// spelling is looked up verbatim.
pub fn translate(snapshot: &CatalogSnapshot, token: &str, args: &[String]) -> String {
    let token = token.to_ascii_lowercase();
    let mut seen = HashSet::new();
    resolve_token(snapshot, &token, args, &mut seen, 0)
}

/// Resolve a token after plural-variant selection.
pub fn translate_plural(
    snapshot: &CatalogSnapshot,
    token: &str,
    count: i64,
    args: &[String],
) -> String {
    let lookup = select_plural_key(snapshot, token, count);
    let mut seen = HashSet::new();
    resolve_token(snapshot, &lookup, args, &mut seen, 0)
}

/// Pick the catalog key for `(token, count)`.
///
/// An explicit `{variant}` wins; otherwise the rule's variant, then
/// `{other}`, then the smallest recorded variant, then the bare base.
pub fn select_plural_key(snapshot: &CatalogSnapshot, token: &str, count: i64) -> String {
    let normalized = token.to_ascii_lowercase();
    if let Some((base, variant)) = parse_variant_suffix(&normalized) {
        return variant_key(&base, &variant);
    }

    let base = normalized;
    let desired = variant_key(&base, snapshot.metadata.plural.pick_variant(count));
    if snapshot.catalog.contains_key(&desired) {
        return desired;
    }
    let other = variant_key(&base, "other");
    if snapshot.catalog.contains_key(&other) {
        return other;
    }
    if let Some(first) = snapshot
        .plural_variants
        .get(&base)
        .and_then(|variants| variants.iter().next())
    {
        return variant_key(&base, first);
    }
    base
}

fn resolve_token(
    snapshot: &CatalogSnapshot,
    token: &str,
    args: &[String],
    seen: &mut HashSet<String>,
    depth: u32,
) -> String {
    if depth > MAX_DEPTH {
        return RECURSION_LIMIT.to_string();
    }
    if seen.contains(token) {
        return cycle_sentinel(token);
    }
    seen.insert(token.to_string());

    if let Some(style) = build_style_string(snapshot, token, args, seen, depth) {
        seen.remove(token);
        return style;
    }

    let raw = match snapshot.catalog.get(token) {
        Some(raw) => raw,
        None => {
            seen.remove(token);
            return miss_sentinel(token);
        }
    };

    let out = expand_template(snapshot, raw, args, seen, depth, depth);
    seen.remove(token);
    out
}

/// Simplified resolution used by the style subsystem: no style
/// short-circuit and no cycle entry for the text itself, but inline
/// references and placeholders expand with the usual semantics.
fn resolve_plain_text(
    snapshot: &CatalogSnapshot,
    raw: &str,
    args: &[String],
    seen: &mut HashSet<String>,
    depth: u32,
) -> String {
    if depth > MAX_DEPTH {
        return RECURSION_LIMIT.to_string();
    }
    expand_template(snapshot, raw, args, seen, depth, depth + 1)
}

/// Shared template scan. `arg_depth` is the depth handed to argument
/// resolution (token resolution keeps the caller's depth, plain-text
/// resolution pre-increments).
fn expand_template(
    snapshot: &CatalogSnapshot,
    raw: &str,
    args: &[String],
    seen: &mut HashSet<String>,
    depth: u32,
    arg_depth: u32,
) -> String {
    let b = raw.as_bytes();
    let mut out = String::with_capacity(raw.len() + 32);
    let mut i = 0;

    while i < b.len() {
        let start = i;
        while i < b.len() && b[i] != b'@' && b[i] != b'%' {
            i += 1;
        }
        out.push_str(&raw[start..i]);
        if i >= b.len() {
            break;
        }

        if b[i] == b'@' {
            if let Some((ref_token, advance)) = try_parse_inline_token(raw, i) {
                if snapshot.catalog.contains_key(&ref_token) {
                    out.push_str(&resolve_token(snapshot, &ref_token, args, seen, depth + 1));
                } else {
                    out.push_str(&missing_ref_sentinel(&ref_token));
                }
                i += advance;
            } else if b.get(i + 1) == Some(&b'@') {
                out.push('@');
                i += 2;
            } else {
                out.push('@');
                i += 1;
            }
            continue;
        }

        // '%'
        if b.get(i + 1).map_or(false, u8::is_ascii_digit) {
            let mut j = i + 1;
            let mut idx = 0usize;
            while j < b.len() && b[j].is_ascii_digit() {
                idx = idx
                    .saturating_mul(10)
                    .saturating_add(usize::from(b[j] - b'0'));
                j += 1;
            }
            match args.get(idx) {
                Some(arg) => out.push_str(&resolve_arg(snapshot, arg, seen, arg_depth)),
                None => out.push_str(&arg_sentinel(idx)),
            }
            i = j;
        } else {
            out.push('%');
            i += 1;
        }
    }

    out
}

/// Substitute one positional argument.
///
/// A leading `=` marks a literal. Otherwise, when the normalized argument
/// is a hex token whose (variant-qualified) key exists in the catalog, the
/// entry is resolved with an empty argument list; nested argument frames
/// are deliberately not inherited. Anything else passes through in its
/// original spelling.
fn resolve_arg(
    snapshot: &CatalogSnapshot,
    arg: &str,
    seen: &mut HashSet<String>,
    depth: u32,
) -> String {
    if let Some(literal) = arg.strip_prefix('=') {
        return literal.to_string();
    }

    let normalized = arg.to_ascii_lowercase();
    let (base, lookup) = match parse_variant_suffix(&normalized) {
        Some((base, variant)) => {
            let lookup = variant_key(&base, &variant);
            (base, lookup)
        }
        None => (normalized.clone(), normalized),
    };

    if !is_hex_token(&base) || !snapshot.catalog.contains_key(&lookup) {
        return arg.to_string();
    }

    resolve_token(snapshot, &lookup, &[], seen, depth + 1)
}

/// Build the canonical style string for a registered style token.
///
/// Bare fragments come first, whitespace-separated, then the declarations
/// in insertion order. Returns `None` when the token has no registry entry
/// or the buffer collapses to empty; the resolver then falls back to plain
/// template expansion.
fn build_style_string(
    snapshot: &CatalogSnapshot,
    token: &str,
    args: &[String],
    seen: &mut HashSet<String>,
    depth: u32,
) -> Option<String> {
    let props = snapshot.style_registry.get(token)?;
    if props.is_empty() {
        return None;
    }

    let mut builder = String::with_capacity(props.len() * 32);
    for prop in props.iter().filter(|p| p.is_bare()) {
        let resolved = resolve_plain_text(snapshot, &prop.value, args, seen, depth + 1);
        // An `@name` that resolved to nothing reads as a class-name
        // fragment: drop the marker, keep the name.
        let fragment = if resolved == prop.value {
            resolved.strip_prefix('@').unwrap_or(&resolved).to_string()
        } else {
            resolved
        };
        if fragment.is_empty() {
            continue;
        }
        if !builder.is_empty() && !builder.ends_with(' ') {
            builder.push(' ');
        }
        builder.push_str(&fragment);
        builder.push(' ');
    }

    for prop in props.iter().filter(|p| !p.is_bare()) {
        let resolved = resolve_plain_text(snapshot, &prop.value, args, seen, depth + 1);
        if !builder.is_empty() && !builder.ends_with(' ') {
            builder.push(' ');
        }
        builder.push_str(&prop.name);
        builder.push_str(": ");
        builder.push_str(&resolved);
        builder.push(';');
    }

    while builder.ends_with(' ') {
        builder.pop();
    }
    if builder.is_empty() {
        None
    } else {
        Some(builder)
    }
}

/// Project the numeric physical properties of a style token.
///
/// Unknown tokens and tokens without a registry entry yield the default
/// record (`gravity_scale` 1, everything else 0, `has_physical` false).
pub fn native_style(snapshot: &CatalogSnapshot, style_token: &str, args: &[String]) -> NativeStyle {
    let normalized = style_token.to_ascii_lowercase();
    match snapshot.style_registry.get(&normalized) {
        Some(props) => evaluate_native_style(snapshot, props, args),
        None => NativeStyle::default(),
    }
}

/// Evaluate a property list into the typed record. Bare fragments carry no
/// physical data and are skipped.
pub fn evaluate_native_style(
    snapshot: &CatalogSnapshot,
    props: &[StyleProperty],
    args: &[String],
) -> NativeStyle {
    let mut style = NativeStyle::default();
    let mut seen = HashSet::new();
    for prop in props {
        if prop.is_bare() {
            continue;
        }
        let resolved = resolve_plain_text(snapshot, &prop.value, args, &mut seen, 0);
        apply_physical_property(&mut style, &prop.name, &resolved);
    }
    style
}

fn apply_physical_property(style: &mut NativeStyle, name: &str, raw_value: &str) {
    let name = name.strip_prefix("--").unwrap_or(name);
    let Some(value) = parse_physical_value(raw_value) else {
        return;
    };
    match name {
        "mass" => style.mass = value,
        "friction" => style.friction = value,
        "restitution" => style.restitution = value,
        "drag" => style.drag = value,
        "gravity-scale" | "gravity_scale" => style.gravity_scale = value,
        "spacing" | "gap" => style.spacing = value,
        _ => return,
    }
    style.has_physical = true;
}

/// `strtof`-like prefix parse: leading whitespace skipped, the longest
/// numeric prefix wins, trailing junk ignored. Overflow counts as failure.
fn parse_physical_value(text: &str) -> Option<f32> {
    let s = text.trim_start();
    let b = s.as_bytes();
    let mut i = 0;

    if matches!(b.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let mut digits = 0;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < b.len() && b[i] == b'.' {
        i += 1;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    let value: f32 = s[..i].parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value)
}
