use crate::foundation::error::WeftError;

/// Parse a 32-byte value from hex, with or without a `0x` prefix.
pub fn parse_hex_32bytes(value: &str) -> Result<[u8; 32], WeftError> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(trimmed)?;
    let array: [u8; 32] = bytes.as_slice().try_into().map_err(|_| WeftError::SerializationError {
        format: "hex".to_string(),
        details: format!("expected 32 bytes, got {}", bytes.len()),
    })?;
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefixed_and_unprefixed() {
        let plain = "11".repeat(32);
        let prefixed = format!("0x{}", plain);
        assert_eq!(parse_hex_32bytes(&plain).unwrap(), [0x11u8; 32]);
        assert_eq!(parse_hex_32bytes(&prefixed).unwrap(), [0x11u8; 32]);
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(parse_hex_32bytes("abcd").is_err());
        assert!(parse_hex_32bytes("not-hex").is_err());
    }
}
