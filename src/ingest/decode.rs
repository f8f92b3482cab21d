use thiserror::Error;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported file format `{0}` (expected utf-8, utf-8-sig, ascii or latin-1)")]
    UnsupportedEncoding(String),
    #[error("file is not valid {encoding}: invalid byte sequence at offset {offset}")]
    InvalidBytes { encoding: String, offset: usize },
}

/// Text encodings accepted by the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    /// Resolve a user-supplied identifier such as `"UTF_8"` or `"iso-8859-1"`.
    pub fn from_label(label: &str) -> Result<Self, DecodeError> {
        let key = label.trim().to_lowercase().replace('_', "-");
        match key.as_str() {
            "utf-8" | "utf8" | "utf-8-sig" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(DecodeError::UnsupportedEncoding(label.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

/// Decode `bytes` according to the encoding named by `label`.
pub fn decode(bytes: &[u8], label: &str) -> Result<String, DecodeError> {
    let encoding = TextEncoding::from_label(label)?;
    match encoding {
        TextEncoding::Utf8 => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            let skipped = bytes.len() - body.len();
            std::str::from_utf8(body)
                .map(str::to_owned)
                .map_err(|e| DecodeError::InvalidBytes {
                    encoding: encoding.as_str().to_string(),
                    offset: skipped + e.valid_up_to(),
                })
        }
        TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(offset) => Err(DecodeError::InvalidBytes {
                encoding: encoding.as_str().to_string(),
                offset,
            }),
            None => Ok(bytes.iter().map(|&b| b as char).collect()),
        },
        // every byte is its own code point in ISO-8859-1
        TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}
