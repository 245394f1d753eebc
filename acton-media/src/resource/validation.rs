//! Mimetype detection with magic number checking
//!
//! Content is identified by its file signature via the `infer` crate. SVG has
//! no binary signature, so XML text whose root element is `<svg` is
//! recognized separately, before `infer` gets a chance to call it `text/xml`.
//!
//! # Examples
//!
//! ```rust
//! use acton_media::resource::MimeValidator;
//!
//! let validator = MimeValidator::new();
//!
//! assert_eq!(validator.detect_mime(&[0xFF, 0xD8, 0xFF]), Some("image/jpeg"));
//! assert_eq!(
//!     validator.detect_mime(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
//!     Some("image/svg+xml"),
//! );
//! assert_eq!(validator.detect_mime(b"plain words"), None);
//! ```

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

/// How much of the content is inspected when looking for an `<svg` root
const SVG_SNIFF_LEN: usize = 4096;

/// Mimetype detector and allow-list check
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeValidator;

impl MimeValidator {
    /// Creates a new validator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Detects the mimetype from content
    ///
    /// Returns `None` if the content has no recognizable signature.
    #[must_use]
    pub fn detect_mime(&self, data: &[u8]) -> Option<&'static str> {
        if is_svg(data) {
            return Some("image/svg+xml");
        }
        infer::get(data).map(|kind| kind.mime_type())
    }

    /// Resolves the mimetype of `data` against the supported table
    ///
    /// The detected type wins; `default` is only used when detection finds
    /// nothing. A default carrying parameters (`image/png; q=1`) is reduced to
    /// its essence.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnknownMimetype` when neither detection nor
    /// `default` yields a type, and `MediaError::UnsupportedMimetype` when the
    /// resolved type is not in `config.mimetypes`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_media::config::MediaConfig;
    /// use acton_media::resource::MimeValidator;
    /// use acton_media::MediaError;
    ///
    /// let config = MediaConfig::default();
    /// let validator = MimeValidator::new();
    ///
    /// // Detection beats the declared default
    /// let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    /// assert_eq!(validator.resolve(&config, &png, Some("image/gif")).unwrap(), "image/png");
    ///
    /// assert!(matches!(
    ///     validator.resolve(&config, b"???", None),
    ///     Err(MediaError::UnknownMimetype)
    /// ));
    /// ```
    pub fn resolve(
        &self,
        config: &MediaConfig,
        data: &[u8],
        default: Option<&str>,
    ) -> MediaResult<String> {
        let mimetype = match self.detect_mime(data) {
            Some(detected) => detected.to_string(),
            None => default
                .map(essence)
                .filter(|mime| !mime.is_empty())
                .ok_or(MediaError::UnknownMimetype)?,
        };

        if !config.supports(&mimetype) {
            return Err(MediaError::UnsupportedMimetype { mimetype });
        }

        Ok(mimetype)
    }
}

/// Reduces a declared content type to its lowercase `type/subtype` essence
fn essence(declared: &str) -> String {
    declared.trim().parse::<mime::Mime>().map_or_else(
        |_| declared.trim().to_ascii_lowercase(),
        |parsed| parsed.essence_str().to_string(),
    )
}

/// Whether `data` is XML text with an `<svg` root element
fn is_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SVG_SNIFF_LEN)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();

    if !text.starts_with('<') {
        return false;
    }

    let lowered = text.to_ascii_lowercase();
    let mut rest = lowered.as_str();

    // Skip the prolog: XML declaration, comments, doctype, processing instructions
    while let Some(after) = rest.strip_prefix('<') {
        if after.starts_with("svg") {
            return after[3..]
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace() || c == '>' || c == '/');
        }

        match prolog_item_len(after) {
            Some(len) => rest = after[len..].trim_start(),
            None => return false,
        }
    }

    false
}

/// Length of the prolog item at the start of `item` (after its `<`)
///
/// A doctype may carry an internal subset in brackets, which can itself
/// contain `>`; the doctype only ends at a `]` followed by `>`.
fn prolog_item_len(item: &str) -> Option<usize> {
    if item.starts_with("!--") {
        return item.find("-->").map(|end| end + 3);
    }

    let close = item.find('>')?;
    if item.starts_with("!doctype") {
        if let Some(open) = item.find('[').filter(|open| *open < close) {
            return item[open..].match_indices(']').find_map(|(offset, _)| {
                let after = open + offset + 1;
                let gap = item[after..].len() - item[after..].trim_start().len();
                item[after + gap..].starts_with('>').then_some(after + gap + 1)
            });
        }
    }

    Some(close + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const GIF_MAGIC: &[u8] = b"GIF89a";
    const BMP_MAGIC: &[u8] = &[0x42, 0x4D, 0x3A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x36, 0x00];
    const PDF_MAGIC: &[u8] = b"%PDF-1.4";

    #[test]
    fn test_detect_signatures() {
        let validator = MimeValidator::new();
        assert_eq!(validator.detect_mime(JPEG_MAGIC), Some("image/jpeg"));
        assert_eq!(validator.detect_mime(PNG_MAGIC), Some("image/png"));
        assert_eq!(validator.detect_mime(GIF_MAGIC), Some("image/gif"));
        assert_eq!(validator.detect_mime(BMP_MAGIC), Some("image/bmp"));
        assert_eq!(validator.detect_mime(PDF_MAGIC), Some("application/pdf"));
    }

    #[test]
    fn test_detect_svg() {
        let validator = MimeValidator::new();

        let bare = b"<svg width=\"1\" height=\"1\"></svg>";
        assert_eq!(validator.detect_mime(bare), Some("image/svg+xml"));

        let with_prolog = b"\xEF\xBB\xBF<?xml version=\"1.0\"?>\n<!-- drawn by hand -->\n\
            <!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"x\">\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        assert_eq!(validator.detect_mime(with_prolog), Some("image/svg+xml"));
    }

    #[test]
    fn test_xml_that_is_not_svg() {
        let validator = MimeValidator::new();
        let xml = b"<?xml version=\"1.0\"?><svgfont></svgfont>";
        assert_ne!(validator.detect_mime(xml), Some("image/svg+xml"));
    }

    #[test]
    fn test_detect_unknown() {
        let validator = MimeValidator::new();
        assert_eq!(validator.detect_mime(b"hello"), None);
        assert_eq!(validator.detect_mime(b""), None);
    }

    #[test]
    fn test_detect_svg_with_internal_subset() {
        let validator = MimeValidator::new();
        let svg = b"<?xml version=\"1.0\"?>\n\
            <!DOCTYPE svg [ <!ENTITY ns \"http://www.w3.org/2000/svg\"> ]>\n\
            <svg xmlns=\"&ns;\"/>";
        assert_eq!(validator.detect_mime(svg), Some("image/svg+xml"));

        let config = MediaConfig::default();
        let mime = validator.resolve(&config, svg, Some("image/svg+xml"));
        assert_eq!(mime.unwrap(), "image/svg+xml");
    }

    #[test]
    fn test_unterminated_internal_subset() {
        let validator = MimeValidator::new();
        let broken = b"<!DOCTYPE svg [ <!ENTITY ns \"x\"> <svg/>";
        assert_ne!(validator.detect_mime(broken), Some("image/svg+xml"));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let config = MediaConfig::default();
        let validator = MimeValidator::new();

        let mime = validator.resolve(&config, b"opaque", Some("Image/PNG; charset=binary"));
        assert_eq!(mime.unwrap(), "image/png");
    }

    #[test]
    fn test_resolve_rejects_unsupported() {
        let config = MediaConfig::default();
        let validator = MimeValidator::new();

        let result = validator.resolve(&config, PDF_MAGIC, Some("image/png"));
        assert!(matches!(
            result,
            Err(MediaError::UnsupportedMimetype { mimetype }) if mimetype == "application/pdf"
        ));

        let result = validator.resolve(&config, b"opaque", Some("text/plain"));
        assert!(matches!(result, Err(MediaError::UnsupportedMimetype { .. })));
    }

    #[test]
    fn test_resolve_unknown() {
        let config = MediaConfig::default();
        let validator = MimeValidator::new();

        assert!(matches!(
            validator.resolve(&config, b"opaque", None),
            Err(MediaError::UnknownMimetype)
        ));
        assert!(matches!(
            validator.resolve(&config, b"opaque", Some("  ")),
            Err(MediaError::UnknownMimetype)
        ));
    }
}
