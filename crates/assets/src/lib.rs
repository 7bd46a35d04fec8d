//! Asset registry for tile worlds.
//!
//! Worlds and entities only ever hold opaque handles. The store maps logical
//! names to those handles; handles are content-addressed, so registering the
//! same description twice yields the same handle.

mod audio;
mod store;

pub use audio::{AudioSettings, DEFAULT_VOLUME, MAX_VOLUME};
pub use store::{AssetStore, ClipAsset, FontAsset, ImageAsset};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn crate_info() -> &'static str {
    "tileworld-assets v0.1.0"
}
