//! `data:` URI and base64 decoding
//!
//! Parses URIs of the form `data:[<mediatype>][;base64],<data>` (RFC 2397).
//! Payloads without the `;base64` marker are percent-decoded.

use crate::error::{MediaError, MediaResult};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

/// Standard alphabet, padding optional, trailing bits tolerated
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Media type assumed when a data URI does not declare one
const DEFAULT_MEDIA_TYPE: &str = "text/plain";

/// Decodes base64 text, ignoring embedded whitespace and missing padding
///
/// # Errors
///
/// Returns `MediaError::Decode` if the text is not base64.
///
/// # Examples
///
/// ```rust
/// use acton_media::resource::decode_base64;
///
/// assert_eq!(decode_base64("aGVs\nbG8").unwrap(), b"hello");
/// ```
pub fn decode_base64(text: &str) -> MediaResult<Vec<u8>> {
    let compact: Vec<u8> = text
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    Ok(LENIENT_BASE64.decode(compact)?)
}

/// A decoded `data:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mimetype: String,
    data: Vec<u8>,
}

impl DataUri {
    /// Parses and decodes a `data:` URI
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidDataUri` if the scheme or the `,` separator
    /// is missing or the declared media type is malformed, and
    /// `MediaError::Decode` if a base64 payload cannot be decoded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_media::resource::DataUri;
    ///
    /// let uri = DataUri::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
    /// assert_eq!(uri.mimetype(), "image/png");
    /// assert_eq!(uri.data(), &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    /// ```
    pub fn parse(uri: &str) -> MediaResult<Self> {
        let uri = uri.trim();

        let rest = uri
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
            .map(|_| &uri[5..])
            .ok_or_else(|| MediaError::InvalidDataUri("missing data: scheme".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| MediaError::InvalidDataUri("missing ',' separator".to_string()))?;

        let mut params = header.split(';').map(str::trim);
        let declared = params.next().unwrap_or_default();
        let is_base64 = params.any(|param| param.eq_ignore_ascii_case("base64"));

        let mimetype = if declared.is_empty() {
            DEFAULT_MEDIA_TYPE.to_string()
        } else {
            declared
                .parse::<mime::Mime>()
                .map_err(|e| MediaError::InvalidDataUri(format!("media type [{declared}]: {e}")))?
                .essence_str()
                .to_string()
        };

        let unescaped = urlencoding::decode_binary(payload.as_bytes());
        let data = if is_base64 {
            let text = String::from_utf8_lossy(&unescaped);
            decode_base64(&text)?
        } else {
            unescaped.into_owned()
        };

        Ok(Self { mimetype, data })
    }

    /// Declared media type essence, `text/plain` when none was given
    #[must_use]
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Decoded payload
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Splits into the media type and payload
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.mimetype, self.data)
    }
}
