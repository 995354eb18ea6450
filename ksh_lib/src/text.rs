use crate::{
    ShaderRole,
    error::{EncodingError, EncodingIssue, TextField},
    format::TextEncoding,
};

pub(crate) fn decode_text(
    bytes: &[u8],
    encoding: TextEncoding,
    role: ShaderRole,
    field: TextField,
) -> Result<String, EncodingError> {
    let error = |position, issue| EncodingError {
        role,
        field,
        encoding,
        issue,
        position,
    };

    let text = std::str::from_utf8(bytes)
        .map_err(|e| error(e.valid_up_to(), EncodingIssue::InvalidSequence))?;

    check_text(text, encoding, role, field)?;
    Ok(text.to_string())
}

/// Check that `text` is representable in `encoding`.
/// The encoded bytes are identical to the UTF-8 bytes for all supported encodings.
pub(crate) fn check_text(
    text: &str,
    encoding: TextEncoding,
    role: ShaderRole,
    field: TextField,
) -> Result<(), EncodingError> {
    match encoding {
        TextEncoding::Utf8 => Ok(()),
        TextEncoding::Ascii => match text.char_indices().find(|(_, c)| !c.is_ascii()) {
            Some((position, c)) => Err(EncodingError {
                role,
                field,
                encoding,
                issue: EncodingIssue::UnsupportedCharacter(c),
                position,
            }),
            None => Ok(()),
        },
    }
}

/// Check that `text` can be stored with a NUL terminator.
pub(crate) fn check_nul_terminated(
    text: &str,
    encoding: TextEncoding,
    role: ShaderRole,
    field: TextField,
) -> Result<(), EncodingError> {
    match text.find('\0') {
        Some(position) => Err(EncodingError {
            role,
            field,
            encoding,
            issue: EncodingIssue::InteriorNul,
            position,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_utf8() {
        assert_eq!(
            "vec4 c = vec4(1.0); // é",
            decode_text(
                "vec4 c = vec4(1.0); // é".as_bytes(),
                TextEncoding::Utf8,
                ShaderRole::Pixel,
                TextField::Content
            )
            .unwrap()
        );
    }

    #[test]
    fn decode_invalid_utf8() {
        assert_eq!(
            EncodingError {
                role: ShaderRole::Vertex,
                field: TextField::Name,
                encoding: TextEncoding::Utf8,
                issue: EncodingIssue::InvalidSequence,
                position: 2
            },
            decode_text(
                &[b'a', b'b', 0xff, b'c'],
                TextEncoding::Utf8,
                ShaderRole::Vertex,
                TextField::Name
            )
            .unwrap_err()
        );
    }

    #[test]
    fn decode_non_ascii() {
        assert_eq!(
            EncodingError {
                role: ShaderRole::Pixel,
                field: TextField::Content,
                encoding: TextEncoding::Ascii,
                issue: EncodingIssue::UnsupportedCharacter('é'),
                position: 3
            },
            decode_text(
                "// é".as_bytes(),
                TextEncoding::Ascii,
                ShaderRole::Pixel,
                TextField::Content
            )
            .unwrap_err()
        );
    }

    #[test]
    fn interior_nul() {
        assert!(
            check_nul_terminated("abc", TextEncoding::Utf8, ShaderRole::Pixel, TextField::Content)
                .is_ok()
        );
        assert_eq!(
            EncodingIssue::InteriorNul,
            check_nul_terminated(
                "a\0c",
                TextEncoding::Utf8,
                ShaderRole::Pixel,
                TextField::Content
            )
            .unwrap_err()
            .issue
        );
    }
}
