use std::sync::OnceLock;

use base64::Engine as _;
use bytes::Bytes;

/// 1×1 transparent PNG shown in place of a tile that failed to load.
pub const ERROR_TILE_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

static ERROR_TILE: OnceLock<Bytes> = OnceLock::new();

/// Decoded error tile, shared by every descriptor.
pub fn error_tile_png() -> Bytes {
    ERROR_TILE
        .get_or_init(|| {
            base64::engine::general_purpose::STANDARD
                .decode(ERROR_TILE_PNG_BASE64)
                .map(Bytes::from)
                .unwrap_or_default()
        })
        .clone()
}

/// `data:` URL form for hosts that take an image URL instead of bytes.
pub fn error_tile_data_url() -> String {
    format!("data:image/png;base64,{ERROR_TILE_PNG_BASE64}")
}
