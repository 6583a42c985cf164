use tracing::warn;

/// Decode a `.txt`/`.md` payload. Invalid UTF-8 is replaced rather than rejected,
/// and a leading byte-order mark is dropped.
pub fn decode(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            warn!(valid_up_to = e.valid_up_to(), "text file is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(bytes).into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::decode;

    #[test]
    fn strips_bom_and_replaces_invalid_bytes() {
        assert_eq!(decode("\u{feff}hello".as_bytes()), "hello");
        assert_eq!(decode(&[b'o', b'k', 0xff]), "ok\u{fffd}");
    }
}
