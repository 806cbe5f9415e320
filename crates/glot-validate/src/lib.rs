//! Catalog integrity checks: placeholder gaps, missing inline references,
//! and reference cycles.

use std::collections::HashMap;
use std::sync::OnceLock;

use glot_core::lex::scan_inline_refs;
use glot_core::CatalogSnapshot;
use glot_domain::{CheckMessage, CheckSummary, SCHEMA_VERSION};
use regex::Regex;

const MAX_PLACEHOLDER_INDEX: usize = 1_000_000;

/// Run all checks over a snapshot.
///
/// Traversal is in sorted token order so two equal catalogs always produce
/// the same report. `code` is 2 for an empty catalog, 3 when any error was
/// found, 0 otherwise (warnings alone do not fail the check).
pub fn check_snapshot(snapshot: &CatalogSnapshot) -> CheckSummary {
    if snapshot.is_empty() {
        return CheckSummary {
            schema_version: SCHEMA_VERSION,
            tokens: 0,
            warnings: 0,
            errors: 0,
            code: 2,
            messages: Vec::new(),
        };
    }

    let mut messages = Vec::new();
    let mut warnings = 0usize;
    let mut errors = 0usize;
    let tokens = snapshot.sorted_tokens();
    let mut edges: HashMap<&str, Vec<String>> = HashMap::new();

    for &token in &tokens {
        let text = &snapshot.catalog[token];

        let idxs = placeholder_indices(text);
        if !idxs.is_empty() && idxs.iter().enumerate().any(|(expect, &got)| got != expect) {
            warnings += 1;
            let found = idxs
                .iter()
                .map(|i| format!("%{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            messages.push(message(
                "warn",
                "placeholder-gap",
                token,
                format!("placeholder gap; found: {found}"),
            ));
        }

        let refs = scan_inline_refs(text);
        for missing in refs.iter().filter(|r| !snapshot.catalog.contains_key(*r)) {
            errors += 1;
            messages.push(message(
                "error",
                "missing-ref",
                token,
                format!("missing inline ref @{missing}"),
            ));
        }
        if !refs.is_empty() {
            edges.insert(token, refs);
        }
    }

    for cycle in find_cycles(snapshot, &tokens, &edges) {
        errors += 1;
        let head = cycle.first().cloned().unwrap_or_default();
        messages.push(message("error", "cycle", &head, cycle.join(" -> ")));
    }

    let code = if errors > 0 { 3 } else { 0 };
    CheckSummary {
        schema_version: SCHEMA_VERSION,
        tokens: tokens.len(),
        warnings,
        errors,
        code,
        messages,
    }
}

/// Render the human-readable report for a summary.
pub fn render_report(summary: &CheckSummary) -> String {
    if summary.code == 2 {
        return "CHECK: FAIL\nReason: catalog is empty or not loaded.\n".to_string();
    }

    let mut out = String::with_capacity(summary.messages.len() * 64 + 128);
    out.push_str("CHECK: REPORT\n");
    out.push_str("------------------------------\n");
    for msg in &summary.messages {
        match msg.kind.as_str() {
            "cycle" => {
                out.push_str("ERROR CYCLE: ");
                out.push_str(&msg.message);
            }
            _ => {
                out.push_str(if msg.severity == "warn" { "WARN " } else { "ERROR " });
                out.push_str(&msg.token);
                out.push_str(": ");
                out.push_str(&msg.message);
            }
        }
        out.push('\n');
    }
    out.push_str("------------------------------\n");
    out.push_str(&format!("Tokens: {}\n", summary.tokens));
    out.push_str(&format!("Warnings: {}\n", summary.warnings));
    out.push_str(&format!("Errors: {}\n", summary.errors));
    out.push_str(match (summary.errors, summary.warnings) {
        (0, 0) => "CHECK: OK\n",
        (0, _) => "CHECK: OK (with warnings)\n",
        _ => "CHECK: FAIL\n",
    });
    out
}

fn message(severity: &str, kind: &str, token: &str, text: String) -> CheckMessage {
    CheckMessage {
        schema_version: SCHEMA_VERSION,
        severity: severity.to_string(),
        kind: kind.to_string(),
        token: token.to_string(),
        message: text,
    }
}

/// Sorted, deduplicated `%N` indices of a template. Indices are capped so a
/// pathological digit run cannot overflow.
fn placeholder_indices(text: &str) -> Vec<usize> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"%(\d+)").unwrap());
    let mut idxs: Vec<usize> = re
        .captures_iter(text)
        .map(|c| {
            c[1].parse::<usize>()
                .unwrap_or(MAX_PLACEHOLDER_INDEX)
                .min(MAX_PLACEHOLDER_INDEX)
        })
        .collect();
    idxs.sort_unstable();
    idxs.dedup();
    idxs
}

/// Three-color depth-first search over the reference graph, iterative so a
/// long reference chain cannot exhaust the stack. Returns one path per
/// gray-hit, shaped `u₁ -> … -> v -> v`.
fn find_cycles(
    snapshot: &CatalogSnapshot,
    tokens: &[&str],
    edges: &HashMap<&str, Vec<String>>,
) -> Vec<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut color: HashMap<&str, Color> = tokens.iter().map(|&t| (t, Color::White)).collect();
    let mut cycles = Vec::new();
    static NO_EDGES: Vec<String> = Vec::new();

    for &root in tokens {
        if color[root] != Color::White {
            continue;
        }

        let mut path: Vec<&str> = vec![root];
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        color.insert(root, Color::Gray);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let targets = edges.get(node).unwrap_or(&NO_EDGES);
            if frame.1 < targets.len() {
                let target = targets[frame.1].as_str();
                frame.1 += 1;
                // Re-anchor the borrow to the snapshot; missing targets are
                // reported separately and do not take part in the DFS.
                let Some((target, _)) = snapshot.catalog.get_key_value(target) else {
                    continue;
                };
                let target = target.as_str();
                match color[target] {
                    Color::White => {
                        color.insert(target, Color::Gray);
                        path.push(target);
                        stack.push((target, 0));
                    }
                    Color::Gray => {
                        let from = path.iter().position(|&p| p == target).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[from..].iter().map(|s| s.to_string()).collect();
                        cycle.push(target.to_string());
                        cycles.push(cycle);
                    }
                    Color::Black => {}
                }
            } else {
                color.insert(node, Color::Black);
                stack.pop();
                path.pop();
            }
        }
    }

    cycles
}
