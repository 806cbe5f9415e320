//! Binary catalog codec.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! offset  size  field
//! 0       4     magic "I18N"
//! 4       1     version (1 or 2)
//! 5       1     reserved
//! 6       1     plural rule (v2 only)
//! 7       1     reserved
//! 8       4     entry count
//! 12      4     string table size
//! 16      4     checksum (FNV-1a/32)
//! 20      4     metadata size (v2 only; the v1 header ends at 20)
//! ```
//!
//! A v2 metadata block (`locale_len u16, fallback_len u16, note_len u16`,
//! then the three strings concatenated) sits between header and entry
//! table. Each entry is `u8 base_len, base, u8 variant_len, variant,
//! u32 text_offset, u32 text_length`; texts live in the trailing string
//! table. The v1 checksum covers only the string table; v2 chains
//! metadata, entry table and string table under a single seed.
//!
//! Both versions are read; the writer emits v2 with entries sorted by
//! `(base, variant)` so equal snapshots serialize identically.

use std::path::Path;

use glot_core::fnv::{fnv1a32, fnv1a32_append, FNV_SEED};
use glot_core::lex::{is_hex_token, is_variant_valid, parse_variant_suffix, variant_key};
use glot_core::{CatalogSnapshot, GlotError, PluralRule, Result};

pub const MAGIC: &[u8; 4] = b"I18N";
pub const VERSION_V1: u8 = 1;
pub const VERSION_CURRENT: u8 = 2;

const HEADER_SIZE_V1: usize = 20;
const HEADER_SIZE_V2: usize = 24;
const METADATA_HEADER_SIZE: usize = 6;

/// Format sniff: magic plus a known version byte.
pub fn looks_like_binary(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE_V1
        && &data[..4] == MAGIC
        && (data[4] == VERSION_V1 || data[4] == VERSION_CURRENT)
}

/// `.i18n` and `.bin` files are treated as binary catalogs.
pub fn is_binary_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("i18n") || ext.eq_ignore_ascii_case("bin"))
        .unwrap_or(false)
}

fn fail(message: impl Into<String>) -> GlotError {
    GlotError::Format(message.into())
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

struct EntryInfo {
    base: String,
    variant: String,
    text_offset: usize,
    text_length: usize,
}

/// Decode a binary catalog. A checksum mismatch is fatal only in strict
/// mode; every structural inconsistency is fatal in both modes.
pub fn read_catalog(data: &[u8], strict: bool) -> Result<CatalogSnapshot> {
    if data.len() < HEADER_SIZE_V1 {
        return Err(fail("header too short"));
    }
    if &data[..4] != MAGIC {
        return Err(fail("unknown magic"));
    }
    let version = data[4];
    if version != VERSION_V1 && version != VERSION_CURRENT {
        return Err(fail("unsupported version"));
    }

    let mut snapshot = CatalogSnapshot::default();
    let header_size;
    let mut metadata_size = 0usize;
    if version == VERSION_V1 {
        header_size = HEADER_SIZE_V1;
    } else {
        header_size = HEADER_SIZE_V2;
        if data.len() < HEADER_SIZE_V2 {
            return Err(fail("header too short"));
        }
        snapshot.metadata.plural = PluralRule::from_u8(data[6]);
        metadata_size = read_u32(data, 20) as usize;
        if metadata_size > data.len() - header_size {
            return Err(fail("metadata block too large"));
        }
        if metadata_size > 0 && metadata_size < METADATA_HEADER_SIZE {
            return Err(fail("metadata block too short"));
        }
    }

    let entry_count = read_u32(data, 8) as usize;
    let string_table_size = read_u32(data, 12) as usize;
    let checksum = read_u32(data, 16);

    let metadata_offset = header_size;
    if metadata_size > 0 {
        let meta = &data[metadata_offset..metadata_offset + metadata_size];
        let locale_len = read_u16(meta, 0) as usize;
        let fallback_len = read_u16(meta, 2) as usize;
        let note_len = read_u16(meta, 4) as usize;
        if METADATA_HEADER_SIZE + locale_len + fallback_len + note_len != metadata_size {
            return Err(fail("inconsistent metadata length"));
        }
        let mut cursor = METADATA_HEADER_SIZE;
        snapshot.metadata.locale =
            String::from_utf8_lossy(&meta[cursor..cursor + locale_len]).into_owned();
        cursor += locale_len;
        snapshot.metadata.fallback =
            String::from_utf8_lossy(&meta[cursor..cursor + fallback_len]).into_owned();
        cursor += fallback_len;
        snapshot.metadata.note =
            String::from_utf8_lossy(&meta[cursor..cursor + note_len]).into_owned();
    }

    let entry_table_offset = metadata_offset + metadata_size;
    let mut offset = entry_table_offset;
    let mut entries = Vec::with_capacity(entry_count.min(1024));

    for _ in 0..entry_count {
        if offset >= data.len() {
            return Err(fail("entry table truncated"));
        }
        let base_len = data[offset] as usize;
        offset += 1;
        if !(6..=32).contains(&base_len) {
            return Err(fail("invalid token length"));
        }
        if offset + base_len > data.len() {
            return Err(fail("token overruns data"));
        }
        let base = String::from_utf8_lossy(&data[offset..offset + base_len]).to_ascii_lowercase();
        offset += base_len;
        if !is_hex_token(&base) {
            return Err(fail("token is not a hex string"));
        }

        if offset >= data.len() {
            return Err(fail("entry truncated"));
        }
        let variant_len = data[offset] as usize;
        offset += 1;
        let mut variant = String::new();
        if variant_len > 0 {
            if offset + variant_len > data.len() {
                return Err(fail("variant overruns data"));
            }
            variant = String::from_utf8_lossy(&data[offset..offset + variant_len])
                .to_ascii_lowercase();
            offset += variant_len;
            if !is_variant_valid(&variant) {
                return Err(fail("invalid variant"));
            }
        }

        if offset + 8 > data.len() {
            return Err(fail("entry truncated"));
        }
        let text_offset = read_u32(data, offset) as usize;
        let text_length = read_u32(data, offset + 4) as usize;
        offset += 8;

        entries.push(EntryInfo {
            base,
            variant,
            text_offset,
            text_length,
        });
    }

    let strings_base = offset;
    if string_table_size > data.len() - strings_base {
        return Err(fail("string table truncated"));
    }
    let strings = &data[strings_base..strings_base + string_table_size];

    let computed = if version == VERSION_V1 {
        fnv1a32(strings)
    } else {
        let mut hash = FNV_SEED;
        if metadata_size > 0 {
            hash = fnv1a32_append(hash, &data[metadata_offset..metadata_offset + metadata_size]);
        }
        hash = fnv1a32_append(hash, &data[entry_table_offset..strings_base]);
        fnv1a32_append(hash, strings)
    };
    if computed != checksum && strict {
        return Err(fail("checksum mismatch"));
    }

    for entry in entries {
        if entry.text_length > string_table_size
            || entry.text_offset > string_table_size - entry.text_length
        {
            return Err(fail("text range outside string table"));
        }
        let value = String::from_utf8_lossy(
            &strings[entry.text_offset..entry.text_offset + entry.text_length],
        )
        .into_owned();
        let key = if entry.variant.is_empty() {
            entry.base
        } else {
            variant_key(&entry.base, &entry.variant)
        };
        if !snapshot.insert_entry(key, value, None) {
            return Err(fail("duplicate entries"));
        }
    }

    if snapshot.is_empty() {
        return Err(fail("no entries"));
    }

    snapshot.populate_style_registry();
    Ok(snapshot)
}

/// Encode a snapshot as a v2 binary catalog.
///
/// Only hex-base tokens are representable; a catalog containing style
/// tokens cannot be exported. Metadata strings longer than `u16::MAX`
/// bytes are truncated.
pub fn write_catalog(snapshot: &CatalogSnapshot) -> Result<Vec<u8>> {
    if snapshot.is_empty() {
        return Err(fail("no entries to export"));
    }

    struct ExportEntry<'a> {
        base: String,
        variant: String,
        text: &'a str,
        text_offset: u32,
    }

    let mut entries: Vec<ExportEntry<'_>> = Vec::with_capacity(snapshot.catalog.len());
    for (key, text) in &snapshot.catalog {
        let (base, variant) = match parse_variant_suffix(key) {
            Some((base, variant)) => (base, variant),
            None => (key.clone(), String::new()),
        };
        if !is_hex_token(&base) {
            return Err(fail(format!(
                "token '{key}' is not representable in a binary catalog"
            )));
        }
        entries.push(ExportEntry {
            base,
            variant,
            text: text.as_str(),
            text_offset: 0,
        });
    }

    entries.sort_by(|a, b| a.base.cmp(&b.base).then_with(|| a.variant.cmp(&b.variant)));

    let mut current_offset = 0u32;
    for entry in &mut entries {
        entry.text_offset = current_offset;
        current_offset = current_offset.wrapping_add(entry.text.len() as u32);
    }

    let mut entry_table = Vec::with_capacity(entries.len() * 24);
    for entry in &entries {
        entry_table.push(entry.base.len() as u8);
        entry_table.extend_from_slice(entry.base.as_bytes());
        entry_table.push(entry.variant.len() as u8);
        entry_table.extend_from_slice(entry.variant.as_bytes());
        entry_table.extend_from_slice(&entry.text_offset.to_le_bytes());
        entry_table.extend_from_slice(&(entry.text.len() as u32).to_le_bytes());
    }

    let mut string_table = Vec::with_capacity(current_offset as usize);
    for entry in &entries {
        string_table.extend_from_slice(entry.text.as_bytes());
    }

    let cap = |s: &str| s.len().min(u16::MAX as usize);
    let meta = &snapshot.metadata;
    let locale = &meta.locale.as_bytes()[..cap(&meta.locale)];
    let fallback = &meta.fallback.as_bytes()[..cap(&meta.fallback)];
    let note = &meta.note.as_bytes()[..cap(&meta.note)];

    let mut metadata_block =
        Vec::with_capacity(METADATA_HEADER_SIZE + locale.len() + fallback.len() + note.len());
    metadata_block.extend_from_slice(&(locale.len() as u16).to_le_bytes());
    metadata_block.extend_from_slice(&(fallback.len() as u16).to_le_bytes());
    metadata_block.extend_from_slice(&(note.len() as u16).to_le_bytes());
    metadata_block.extend_from_slice(locale);
    metadata_block.extend_from_slice(fallback);
    metadata_block.extend_from_slice(note);

    let mut checksum = FNV_SEED;
    checksum = fnv1a32_append(checksum, &metadata_block);
    checksum = fnv1a32_append(checksum, &entry_table);
    checksum = fnv1a32_append(checksum, &string_table);

    let mut out = Vec::with_capacity(
        HEADER_SIZE_V2 + metadata_block.len() + entry_table.len() + string_table.len(),
    );
    out.extend_from_slice(MAGIC);
    out.push(VERSION_CURRENT);
    out.push(0);
    out.push(meta.plural.as_u8());
    out.push(0);
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    out.extend_from_slice(&(string_table.len() as u32).to_le_bytes());
    out.extend_from_slice(&checksum.to_le_bytes());
    out.extend_from_slice(&(metadata_block.len() as u32).to_le_bytes());
    out.extend_from_slice(&metadata_block);
    out.extend_from_slice(&entry_table);
    out.extend_from_slice(&string_table);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glot_core::CatalogMetadata;

    fn sample_snapshot() -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::default();
        snapshot.insert_entry("abcdef".into(), "hello @fedcba".into(), None);
        snapshot.insert_entry("fedcba".into(), "world".into(), None);
        snapshot.insert_entry("abcdef{one}".into(), "1 thing".into(), None);
        snapshot.metadata = CatalogMetadata {
            locale: "de-DE".into(),
            fallback: "en".into(),
            note: "test".into(),
            plural: PluralRule::Slavic,
        };
        snapshot.populate_style_registry();
        snapshot
    }

    #[test]
    fn round_trip_preserves_catalog_and_metadata() {
        let snapshot = sample_snapshot();
        let bytes = write_catalog(&snapshot).unwrap();
        let back = read_catalog(&bytes, true).unwrap();
        assert_eq!(back.catalog, snapshot.catalog);
        assert_eq!(back.metadata, snapshot.metadata);
        assert_eq!(back.plural_variants, snapshot.plural_variants);
    }

    #[test]
    fn writer_output_is_deterministic() {
        let a = write_catalog(&sample_snapshot()).unwrap();
        let b = write_catalog(&sample_snapshot()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sniffing_accepts_known_versions_only() {
        let bytes = write_catalog(&sample_snapshot()).unwrap();
        assert!(looks_like_binary(&bytes));

        let mut wrong_version = bytes.clone();
        wrong_version[4] = 9;
        assert!(!looks_like_binary(&wrong_version));
        assert!(!looks_like_binary(b"I18N"));
        assert!(!looks_like_binary(b"not a catalog at all......."));
    }

    #[test]
    fn binary_path_detection() {
        assert!(is_binary_path(Path::new("catalog.i18n")));
        assert!(is_binary_path(Path::new("catalog.BIN")));
        assert!(!is_binary_path(Path::new("catalog.txt")));
        assert!(!is_binary_path(Path::new("catalog")));
    }

    #[test]
    fn every_flipped_byte_fails_strict_load() {
        let bytes = write_catalog(&sample_snapshot()).unwrap();
        // Everything past the header participates in the v2 checksum.
        for i in HEADER_SIZE_V2..bytes.len() {
            let mut corrupt = bytes.clone();
            corrupt[i] ^= 0xFF;
            assert!(
                read_catalog(&corrupt, true).is_err(),
                "flip at offset {i} should not load strictly"
            );
        }
    }

    #[test]
    fn checksum_mismatch_is_tolerated_when_not_strict() {
        let mut bytes = write_catalog(&sample_snapshot()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01; // inside the string table
        assert!(read_catalog(&bytes, true).is_err());
        let back = read_catalog(&bytes, false).unwrap();
        assert_eq!(back.len(), 3);
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        let mut bytes = write_catalog(&sample_snapshot()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(read_catalog(&bytes, false), Err(GlotError::Format(_))));

        let mut bytes = write_catalog(&sample_snapshot()).unwrap();
        bytes[4] = 7;
        assert!(read_catalog(&bytes, false).is_err());
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = write_catalog(&sample_snapshot()).unwrap();
        for len in [0, 4, 19, 23, bytes.len() - 1] {
            assert!(read_catalog(&bytes[..len], false).is_err(), "len {len}");
        }
    }

    #[test]
    fn style_tokens_are_not_exportable() {
        let mut snapshot = CatalogSnapshot::default();
        snapshot.insert_entry("style_box".into(), "color: red".into(), None);
        assert!(write_catalog(&snapshot).is_err());
    }

    #[test]
    fn empty_snapshot_is_not_exportable() {
        assert!(write_catalog(&CatalogSnapshot::default()).is_err());
    }

    fn v1_catalog() -> Vec<u8> {
        // One entry "abcdef" -> "hi", hand-assembled v1 image.
        let mut entry_table = Vec::new();
        entry_table.push(6u8);
        entry_table.extend_from_slice(b"abcdef");
        entry_table.push(0u8);
        entry_table.extend_from_slice(&0u32.to_le_bytes());
        entry_table.extend_from_slice(&2u32.to_le_bytes());
        let string_table = b"hi".to_vec();

        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.push(VERSION_V1);
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(string_table.len() as u32).to_le_bytes());
        out.extend_from_slice(&fnv1a32(&string_table).to_le_bytes());
        out.extend_from_slice(&entry_table);
        out.extend_from_slice(&string_table);
        out
    }

    #[test]
    fn reads_v1_catalogs() {
        let bytes = v1_catalog();
        assert!(looks_like_binary(&bytes));
        let snapshot = read_catalog(&bytes, true).unwrap();
        assert_eq!(snapshot.catalog.get("abcdef").unwrap(), "hi");
        assert_eq!(snapshot.metadata.plural, PluralRule::Default);
        assert_eq!(snapshot.metadata.locale, "");
    }

    #[test]
    fn v1_checksum_covers_string_table_only() {
        let mut bytes = v1_catalog();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(read_catalog(&bytes, true).is_err());
        assert!(read_catalog(&bytes, false).is_ok());
    }

    #[test]
    fn rejects_out_of_range_text_window() {
        let mut bytes = v1_catalog();
        // Entry table starts at 20; text_length sits at its last 4 bytes.
        let text_len_at = 20 + 1 + 6 + 1 + 4;
        bytes[text_len_at..text_len_at + 4].copy_from_slice(&100u32.to_le_bytes());
        assert!(read_catalog(&bytes, false).is_err());
    }

    #[test]
    fn rejects_duplicate_entries() {
        let snapshot = {
            let mut s = CatalogSnapshot::default();
            s.insert_entry("abcdef".into(), "x".into(), None);
            s
        };
        let bytes = write_catalog(&snapshot).unwrap();
        // Double the entry count and append a second copy of the record.
        let mut corrupt = bytes.clone();
        corrupt[8..12].copy_from_slice(&2u32.to_le_bytes());
        let entry_at = HEADER_SIZE_V2 + (METADATA_HEADER_SIZE);
        let record: Vec<u8> = bytes[entry_at..entry_at + 1 + 6 + 1 + 8].to_vec();
        let strings_at = corrupt.len() - 1; // "x"
        corrupt.splice(strings_at..strings_at, record);
        assert!(read_catalog(&corrupt, false).is_err());
    }

    #[test]
    fn rejects_invalid_token_length() {
        let mut bytes = v1_catalog();
        bytes[20] = 3; // base_len below the minimum
        assert!(read_catalog(&bytes, false).is_err());
    }
}
