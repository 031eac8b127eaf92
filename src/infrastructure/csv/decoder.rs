// ============================================================
// UPLOAD DECODER
// ============================================================
// Bytes of an uploaded file -> text, with BOM handling

use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::{debug, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::import::ImportConfig;

/// Decode uploaded bytes.
///
/// A byte-order mark selects UTF-8 / UTF-16 and is removed. Without one the
/// bytes are read as UTF-8, falling back to Windows-1252 for legacy
/// spreadsheet exports.
pub fn decode_upload(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        debug!(encoding = encoding.name(), "Decoding upload using BOM");
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return text.into_owned();
    }

    warn!("Upload is not valid UTF-8, decoding as Windows-1252");
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Read and decode a file from disk, enforcing the configured size limit
pub async fn read_upload(path: &Path, config: &ImportConfig) -> Result<String> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::IoError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    if metadata.len() > config.max_file_bytes {
        return Err(AppError::ValidationError(format!(
            "File is too large ({} bytes), maximum allowed: {} bytes",
            metadata.len(),
            config.max_file_bytes
        )));
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    Ok(decode_upload(&bytes))
}
