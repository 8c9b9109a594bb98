//! Image decoding checks used by the asset validator gate.

use std::io::Cursor;

use adscope_models::sampling::MIN_IMAGE_DIMENSION;

use crate::error::{MediaError, MediaResult};

/// Decode an image header and return its dimensions.
pub fn image_dimensions(bytes: &[u8]) -> MediaResult<(u32, u32)> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MediaError::invalid_image(format!("unreadable image data: {}", e)))?;
    reader
        .into_dimensions()
        .map_err(|e| MediaError::invalid_image(format!("undecodable image: {}", e)))
}

/// Confirm candidate image bytes decode to non-degenerate dimensions.
///
/// Both width and height must be strictly greater than
/// [`MIN_IMAGE_DIMENSION`]; platform placeholder images and error pages
/// masquerading as images fail here.
pub fn validate_image_bytes(bytes: &[u8]) -> MediaResult<(u32, u32)> {
    if bytes.is_empty() {
        return Err(MediaError::invalid_image("empty response body"));
    }

    let (width, height) = image_dimensions(bytes)?;
    if width <= MIN_IMAGE_DIMENSION || height <= MIN_IMAGE_DIMENSION {
        return Err(MediaError::invalid_image(format!(
            "degenerate dimensions {}x{}",
            width, height
        )));
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([120, 40, 200]);
        }
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_valid_image_passes() {
        let bytes = tiny_png(120, 90);
        assert_eq!(validate_image_bytes(&bytes).unwrap(), (120, 90));
    }

    #[test]
    fn test_degenerate_dimensions_rejected() {
        let bytes = tiny_png(1, 1);
        let err = validate_image_bytes(&bytes).unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage(_)));
    }

    #[test]
    fn test_boundary_dimension_rejected() {
        // Strictly-greater-than floor: the threshold itself fails
        let bytes = tiny_png(MIN_IMAGE_DIMENSION, MIN_IMAGE_DIMENSION + 10);
        assert!(validate_image_bytes(&bytes).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_image_bytes(b"<html>403 Forbidden</html>").is_err());
        assert!(validate_image_bytes(&[]).is_err());
    }
}
