use super::SyncError;

const ADDRESS_PREFIX: &str = "0x";
const ADDRESS_HEX_LEN: usize = 40;

/// Check that `input` is `0x` followed by exactly 40 hex characters.
///
/// Mixed case is accepted without checksum verification. The input is returned
/// unchanged so callers write exactly what the user supplied.
pub fn validate_address(input: &str) -> Result<&str, SyncError> {
    let valid = input
        .strip_prefix(ADDRESS_PREFIX)
        .is_some_and(|hex| hex.len() == ADDRESS_HEX_LEN && hex.bytes().all(|b| b.is_ascii_hexdigit()));

    if valid {
        Ok(input)
    } else {
        Err(SyncError::InvalidAddressFormat(input.to_string()))
    }
}
