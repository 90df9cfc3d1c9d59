//! Text codepages used by ROSE resource files

use encoding_rs::{EUC_KR, Encoding, UTF_8};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Codepage of the strings stored in a resource file.
///
/// Most formats use the game's Korean codepage; string tables are UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    EucKr,
    Utf8,
}

impl TextEncoding {
    fn codec(self) -> &'static Encoding {
        match self {
            TextEncoding::EucKr => EUC_KR,
            TextEncoding::Utf8 => UTF_8,
        }
    }

    /// Display name of the codepage.
    pub fn name(self) -> &'static str {
        self.codec().name()
    }

    /// Decode bytes, replacing invalid sequences with U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        self.codec()
            .decode_without_bom_handling(bytes)
            .0
            .into_owned()
    }

    /// Encode text, failing if any character has no representation.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        if self == TextEncoding::Utf8 {
            return Ok(text.as_bytes().to_vec());
        }
        let (bytes, _, had_errors) = self.codec().encode(text);
        if had_errors {
            return Err(Error::UnmappableText {
                encoding: self.name(),
            });
        }
        Ok(bytes.into_owned())
    }
}

/// Per-call codec configuration.
///
/// `encoding: None` keeps each format's own default codepage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecOptions {
    pub encoding: Option<TextEncoding>,
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the text codepage for every string in the document.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// The codepage to use for a format whose default is `default`.
    pub fn encoding_or(&self, default: TextEncoding) -> TextEncoding {
        self.encoding.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euc_kr_round_trip() {
        let text = "주논 필드";
        let bytes = TextEncoding::EucKr.encode(text).unwrap();
        assert_eq!(bytes.len(), 9);
        assert_eq!(TextEncoding::EucKr.decode(&bytes), text);
    }

    #[test]
    fn test_unmappable_text() {
        let err = TextEncoding::EucKr.encode("\u{1F600}").unwrap_err();
        assert!(matches!(err, Error::UnmappableText { .. }));
    }

    #[test]
    fn test_options_override() {
        let options = CodecOptions::new();
        assert_eq!(options.encoding_or(TextEncoding::Utf8), TextEncoding::Utf8);

        let options = options.with_encoding(TextEncoding::EucKr);
        assert_eq!(options.encoding_or(TextEncoding::Utf8), TextEncoding::EucKr);
    }
}
