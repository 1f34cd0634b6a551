//! Input validation for addresses and uploaded contract files

use alloy_primitives::Address;

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES};

/// Accept `0x` + 40 hex digits. All-lowercase and all-uppercase forms are
/// taken as-is; mixed case must carry a valid EIP-55 checksum.
pub fn validate_address(raw: &str) -> AppResult<Address> {
    let address = raw.trim();
    let Some(digits) = address.strip_prefix("0x") else {
        return Err(AppError::invalid_address(format!(
            "Invalid wallet address (missing 0x prefix): {}",
            address
        )));
    };
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::invalid_address(format!(
            "Invalid wallet address (expected 40 hex digits): {}",
            address
        )));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(address, None).map_err(|_| {
            AppError::invalid_address(format!("Invalid EIP-55 checksum: {}", address))
        });
    }

    address
        .parse::<Address>()
        .map_err(|e| AppError::invalid_address(format!("Invalid wallet address {}: {}", address, e)))
}

/// Filename has an accepted extension (case-insensitive; a dot is required)
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

/// Check an uploaded contract before it is scanned
pub fn validate_upload(filename: &str, source: &str) -> AppResult<()> {
    if filename.trim().is_empty() {
        return Err(AppError::invalid_upload("No file selected"));
    }
    if !allowed_file(filename) {
        return Err(AppError::invalid_upload(format!(
            "Invalid file type: {} (allowed: {})",
            filename,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if source.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::invalid_upload(format!(
            "File too large: {} bytes (max {})",
            source.len(),
            MAX_UPLOAD_BYTES
        )));
    }
    Ok(())
}
