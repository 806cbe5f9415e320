pub mod fnv;
pub mod lex;
pub mod plural;
pub mod snapshot;
pub mod style;

pub use plural::PluralRule;
pub use snapshot::{CatalogMetadata, CatalogSnapshot};
pub use style::{StyleProperty, STYLE_PREFIX};

#[derive(Debug, thiserror::Error)]
pub enum GlotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error in line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("duplicate token in line {line}: {token}")]
    DuplicateToken { line: usize, token: String },
    #[error("binary catalog: {0}")]
    Format(String),
    #[error("no valid entries loaded (empty catalog?)")]
    EmptyCatalog,
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GlotError>;
