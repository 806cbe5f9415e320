//! High-level orchestration layer over the leaf crates.
//!
//! [`Engine`] wraps an atomically swappable immutable snapshot. Loads build
//! a new snapshot off to the side and publish it only on success, so
//! concurrent readers always observe a fully-initialized catalog and a
//! failed load never disturbs the published one. Readers clone a
//! reference-counted handle; writers construct and swap.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use glot_core::{CatalogSnapshot, GlotError, Result};
use glot_domain::{CatalogMeta, CheckSummary, DumpRow, NativeStyle, SCHEMA_VERSION};

pub use glot_core::PluralRule;
pub use glot_resolve::NO_CATALOG;

pub struct Engine {
    snapshot: ArcSwapOption<CatalogSnapshot>,
    last_error: Mutex<String>,
    // Путь и strict-флаг последней успешной файловой загрузки (для reload).
    source: Mutex<Option<(PathBuf, bool)>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwapOption::const_empty(),
            last_error: Mutex::new(String::new()),
            source: Mutex::new(None),
        }
    }

    /// Load a catalog from an in-memory buffer. The format is sniffed from
    /// the content; a buffer load is never remembered for [`reload`](Self::reload).
    pub fn load_from_bytes(&self, data: &[u8], strict: bool) -> Result<()> {
        let result = self.build_from_bytes(data, strict).map(|snapshot| {
            debug!(entries = snapshot.len(), strict, "catalog loaded from buffer");
            self.install(snapshot);
        });
        self.record(result)
    }

    pub fn load_from_str(&self, src: &str, strict: bool) -> Result<()> {
        self.load_from_bytes(src.as_bytes(), strict)
    }

    /// Load a catalog file. `.i18n` / `.bin` extensions select the binary
    /// codec, everything else parses as text. The path and strict flag are
    /// remembered for [`reload`](Self::reload).
    pub fn load_file(&self, path: &Path, strict: bool) -> Result<()> {
        let result = self.build_from_file(path, strict);
        match result {
            Ok(snapshot) => {
                *self.lock_source() = Some((path.to_path_buf(), strict));
                info!(
                    path = %path.display(),
                    entries = snapshot.len(),
                    strict,
                    "catalog loaded"
                );
                self.install(snapshot);
                self.record(Ok(()))
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "catalog load failed");
                self.record(Err(err))
            }
        }
    }

    /// Re-run the last successful file load. Errors when nothing was loaded
    /// from a file yet.
    pub fn reload(&self) -> Result<()> {
        let source = self.lock_source().clone();
        match source {
            Some((path, strict)) => self.load_file(&path, strict),
            None => self.record(Err(GlotError::Other("no file loaded yet".into()))),
        }
    }

    fn build_from_bytes(&self, data: &[u8], strict: bool) -> Result<CatalogSnapshot> {
        if data.is_empty() {
            return Err(GlotError::Other("empty source".into()));
        }
        if glot_binfmt::looks_like_binary(data) {
            glot_binfmt::read_catalog(data, strict)
        } else {
            let text = String::from_utf8_lossy(data);
            glot_parsers_txt::parse_text_catalog(&text, strict)
        }
    }

    fn build_from_file(&self, path: &Path, strict: bool) -> Result<CatalogSnapshot> {
        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(GlotError::Other(format!("file is empty: {}", path.display())));
        }
        if glot_binfmt::is_binary_path(path) {
            glot_binfmt::read_catalog(&data, strict)
        } else {
            let text = String::from_utf8_lossy(&data);
            glot_parsers_txt::parse_text_catalog(&text, strict)
        }
    }

    fn install(&self, snapshot: CatalogSnapshot) {
        self.snapshot.store(Some(Arc::new(snapshot)));
    }

    fn acquire(&self) -> Option<Arc<CatalogSnapshot>> {
        self.snapshot.load_full()
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        let mut slot = self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match &result {
            Ok(_) => slot.clear(),
            Err(err) => *slot = err.to_string(),
        }
        result
    }

    fn lock_source(&self) -> std::sync::MutexGuard<'_, Option<(PathBuf, bool)>> {
        self.source
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Message left by the most recent failed load or export; empty after a
    /// successful call.
    pub fn last_error(&self) -> String {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn translate(&self, token: &str, args: &[String]) -> String {
        match self.acquire() {
            Some(snapshot) => glot_resolve::translate(&snapshot, token, args),
            None => NO_CATALOG.to_string(),
        }
    }

    pub fn translate_plural(&self, token: &str, count: i64, args: &[String]) -> String {
        match self.acquire() {
            Some(snapshot) => glot_resolve::translate_plural(&snapshot, token, count, args),
            None => NO_CATALOG.to_string(),
        }
    }

    /// Typed physical record for a style token; the default record when no
    /// catalog is loaded or the token has no style entry.
    pub fn native_style(&self, style_token: &str, args: &[String]) -> NativeStyle {
        match self.acquire() {
            Some(snapshot) => glot_resolve::native_style(&snapshot, style_token, args),
            None => NativeStyle::default(),
        }
    }

    /// Deterministic tabular listing of the catalog, tokens ascending.
    pub fn dump_table(&self) -> String {
        let Some(snapshot) = self.acquire() else {
            return "Catalog not loaded\n".to_string();
        };

        let mut out = String::with_capacity(snapshot.len() * 64);
        out.push_str("Token        | Label                  | Text\n");
        out.push_str("------------------------------------------------------------\n");
        for token in snapshot.sorted_tokens() {
            let text = &snapshot.catalog[token];
            let label = snapshot.labels.get(token).map(String::as_str).unwrap_or("");
            out.push_str(&format!("{token:<12} | {label:<22} | {text}\n"));
        }
        out
    }

    /// The dump as structured rows, tokens ascending.
    pub fn dump_rows(&self) -> Vec<DumpRow> {
        let Some(snapshot) = self.acquire() else {
            return Vec::new();
        };
        snapshot
            .sorted_tokens()
            .into_iter()
            .map(|token| DumpRow {
                schema_version: SCHEMA_VERSION,
                token: token.to_string(),
                label: snapshot.labels.get(token).cloned(),
                text: snapshot.catalog[token].clone(),
            })
            .collect()
    }

    /// Case-insensitive substring search over templates and labels; one
    /// `token(label): text` line per hit, tokens ascending.
    pub fn find_any(&self, query: &str) -> String {
        let Some(snapshot) = self.acquire() else {
            return "(no catalog loaded)\n".to_string();
        };

        let q = query.to_ascii_lowercase();
        let mut out = String::new();
        for token in snapshot.sorted_tokens() {
            let text = &snapshot.catalog[token];
            let label = snapshot.labels.get(token).map(String::as_str).unwrap_or("");
            let hit = text.to_ascii_lowercase().contains(&q)
                || (!label.is_empty() && label.to_ascii_lowercase().contains(&q));
            if hit {
                out.push_str(&format!("{token}({label}): {text}\n"));
            }
        }
        if out.is_empty() {
            out.push_str("(no matches)\n");
        }
        out
    }

    pub fn check_summary(&self) -> CheckSummary {
        match self.acquire() {
            Some(snapshot) => glot_validate::check_snapshot(&snapshot),
            None => glot_validate::check_snapshot(&CatalogSnapshot::default()),
        }
    }

    /// Integrity report plus exit code (0 ok, 2 empty/unloaded, 3 errors).
    pub fn check_report(&self) -> (String, i32) {
        let summary = self.check_summary();
        let code = summary.code;
        (glot_validate::render_report(&summary), code)
    }

    /// Write the published catalog as a v2 binary file, creating parent
    /// directories as needed.
    pub fn export_binary(&self, path: &Path) -> Result<()> {
        let result = (|| {
            let snapshot = self
                .acquire()
                .ok_or_else(|| GlotError::Other("no catalog loaded".into()))?;
            let bytes = glot_binfmt::write_catalog(&snapshot)?;
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(&bytes)?;
            writer.flush()?;
            debug!(path = %path.display(), bytes = bytes.len(), "binary catalog exported");
            Ok(())
        })();
        self.record(result)
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn metadata(&self) -> CatalogMeta {
        let (locale, fallback, note, plural) = match self.acquire() {
            Some(s) => (
                s.metadata.locale.clone(),
                s.metadata.fallback.clone(),
                s.metadata.note.clone(),
                s.metadata.plural,
            ),
            None => (String::new(), String::new(), String::new(), PluralRule::default()),
        };
        CatalogMeta {
            locale,
            fallback,
            note,
            plural: plural.name().to_string(),
        }
    }

    pub fn locale(&self) -> String {
        self.acquire()
            .map(|s| s.metadata.locale.clone())
            .unwrap_or_default()
    }

    pub fn fallback(&self) -> String {
        self.acquire()
            .map(|s| s.metadata.fallback.clone())
            .unwrap_or_default()
    }

    pub fn note(&self) -> String {
        self.acquire()
            .map(|s| s.metadata.note.clone())
            .unwrap_or_default()
    }

    pub fn plural_rule(&self) -> PluralRule {
        self.acquire()
            .map(|s| s.metadata.plural)
            .unwrap_or_default()
    }
}
