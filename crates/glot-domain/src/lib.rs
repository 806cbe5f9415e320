use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// One finding from the catalog integrity check.
///
/// `kind` is machine-readable: "placeholder-gap" | "missing-ref" | "cycle".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckMessage {
    pub schema_version: u32,
    pub severity: String,
    pub kind: String,
    pub token: String,
    pub message: String,
}

/// Full integrity-check result; `code` matches the process exit code
/// contract (0 ok, 2 empty/unloaded, 3 errors).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckSummary {
    pub schema_version: u32,
    pub tokens: usize,
    pub warnings: usize,
    pub errors: usize,
    pub code: i32,
    pub messages: Vec<CheckMessage>,
}

/// One row of the deterministic catalog dump.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DumpRow {
    pub schema_version: u32,
    pub token: String,
    pub label: Option<String>,
    pub text: String,
}

/// Catalog metadata as exposed to callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CatalogMeta {
    pub locale: String,
    pub fallback: String,
    pub note: String,
    pub plural: String,
}

/// Numeric physical properties projected from a style entry.
///
/// Defaults are all zero except `gravity_scale`; `has_physical` flips when
/// any recognized property parses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NativeStyle {
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub drag: f32,
    pub gravity_scale: f32,
    pub spacing: f32,
    pub has_physical: bool,
}

impl Default for NativeStyle {
    fn default() -> Self {
        Self {
            mass: 0.0,
            friction: 0.0,
            restitution: 0.0,
            drag: 0.0,
            gravity_scale: 1.0,
            spacing: 0.0,
            has_physical: false,
        }
    }
}
