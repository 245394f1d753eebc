//! Integration tests for building resources from uploads

use acton_media::resource::{MimeValidator, ResourceBuilder};
use acton_media::{MediaConfig, MediaError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Local, TimeZone};
use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

fn png_data_uri(width: u32, height: u32) -> String {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |x, _| Rgba([u8::try_from(x).unwrap_or(u8::MAX), 128, 64, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

#[test]
fn test_image_data_uri_reencoded_as_jpeg() {
    let config = MediaConfig::default();
    let at = Local.with_ymd_and_hms(2016, 12, 10, 15, 45, 37).unwrap();

    let resource = ResourceBuilder::from_image_data_uri(&config, &png_data_uri(12, 7), Some("image/jpg"))
        .unwrap()
        .pathname("avatars")
        .filename("me")
        .finalize_at(at)
        .unwrap();

    assert_eq!(resource.mimetype(), "image/jpeg");
    assert_eq!(resource.extension(), "jpg");
    assert_eq!(resource.dimensions(), Some((12, 7)));
    assert_eq!(resource.path(), "/avatars/me@2016Dec10T154537.jpg");
    assert_eq!(
        MimeValidator::new().detect_mime(resource.raw()),
        Some("image/jpeg")
    );
}

#[test]
fn test_image_data_uri_keeps_declared_format() {
    let config = MediaConfig {
        suffix: None,
        ..MediaConfig::default()
    };

    let resource = ResourceBuilder::from_image_data_uri(&config, &png_data_uri(3, 3), None)
        .unwrap()
        .finalize()
        .unwrap();

    assert_eq!(resource.mimetype(), "image/png");
    assert_eq!(resource.width(), Some(3));
    assert_eq!(resource.basename().len(), 16);
}

#[test]
fn test_image_data_uri_rejects_non_images() {
    let config = MediaConfig::default();

    let result = ResourceBuilder::from_image_data_uri(&config, "data:image/png;base64,aGVsbG8=", None);
    assert!(matches!(result, Err(MediaError::InvalidImage(_))));

    let result = ResourceBuilder::from_image_data_uri(&config, &png_data_uri(2, 2), Some("image/webp"));
    assert!(matches!(result, Err(MediaError::UnsupportedMimetype { .. })));
}

#[test]
fn test_image_data_uri_respects_mimetype_table() {
    let mut config = MediaConfig::default();
    config.mimetypes.remove("image/gif");

    let result = ResourceBuilder::from_image_data_uri(&config, &png_data_uri(2, 2), Some("image/gif"));
    assert!(matches!(
        result,
        Err(MediaError::UnsupportedMimetype { mimetype }) if mimetype == "image/gif"
    ));
}

#[test]
fn test_svg_data_uri() {
    let config = MediaConfig {
        suffix: None,
        ..MediaConfig::default()
    };

    let resource = ResourceBuilder::from_data_uri(
        &config,
        "data:image/svg+xml;charset=utf-8,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%2F%3E",
    )
    .unwrap()
    .filename("icon")
    .finalize()
    .unwrap();

    assert_eq!(resource.mimetype(), "image/svg+xml");
    assert_eq!(resource.filename(), "icon.svg");
    assert_eq!(resource.path(), "/icon.svg");
}

#[test]
fn test_plain_text_is_unsupported() {
    let config = MediaConfig::default();

    let result = ResourceBuilder::from_data_uri(&config, "data:,just%20words");
    assert!(matches!(
        result,
        Err(MediaError::UnsupportedMimetype { mimetype }) if mimetype == "text/plain"
    ));
}

#[test]
fn test_extended_mimetype_table() {
    let mut config = MediaConfig {
        suffix: None,
        ..MediaConfig::default()
    };
    config
        .mimetypes
        .insert("application/pdf".to_string(), "pdf".to_string());

    let resource = ResourceBuilder::from_raw(&config, b"%PDF-1.7\n".to_vec(), None)
        .unwrap()
        .pathname("docs")
        .filename("manual")
        .finalize()
        .unwrap();

    assert_eq!(resource.path(), "/docs/manual.pdf");
}
