use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// SHA-256 of an in-memory screenshot.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Content-addressed storage path for a scanned screenshot, so re-scanning
/// the same image never stores a second copy.
/// Layout: `<base>/<first_2_hex_chars>/<full_hex>.<ext>`
pub fn screenshot_path(screenshots_dir: &Path, hash_hex: &str, ext: &str) -> PathBuf {
    screenshots_dir
        .join(&hash_hex[..2])
        .join(format!("{hash_hex}.{ext}"))
}
