use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader, Rgb, RgbImage};
use std::io::Cursor;
use thiserror::Error;

const THUMBNAIL_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unsupported or corrupt image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("thumbnail generation failed: {0}")]
    Thumbnail(#[source] image::ImageError),
}

pub struct ProcessedImage {
    /// Dimensions after orientation has been applied.
    pub width: u32,
    pub height: u32,
    pub thumbnail: Option<Thumbnail>,
}

pub struct Thumbnail {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes, orients and thumbnails an upload. Only a failed decode is an
/// error; a failed thumbnail leaves `thumbnail` empty.
pub fn process(data: &[u8], thumb_size: u32) -> Result<ProcessedImage, ImageError> {
    let img = decode_oriented(data)?;
    let (width, height) = img.dimensions();

    let thumbnail = match generate_thumbnail(&img, thumb_size) {
        Ok(thumb) => Some(thumb),
        Err(e) => {
            tracing::warn!("Continuing without thumbnail: {}", e);
            None
        }
    };

    Ok(ProcessedImage {
        width,
        height,
        thumbnail,
    })
}

/// Decodes with the format sniffed from content and applies the embedded
/// EXIF orientation, so the result looks the way the camera was held.
pub fn decode_oriented(data: &[u8]) -> Result<DynamicImage, ImageError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(image::ImageError::IoError(e)))?;
    let mut decoder = reader.into_decoder().map_err(ImageError::Decode)?;

    let orientation = decoder
        .exif_metadata()
        .ok()
        .flatten()
        .and_then(|exif| {
            let tiff = exif.strip_prefix(b"Exif\0\0").unwrap_or(exif.as_slice());
            Orientation::from_exif_chunk(tiff)
        })
        .unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder).map_err(ImageError::Decode)?;
    if orientation != Orientation::NoTransforms {
        tracing::debug!("Applying EXIF orientation {:?}", orientation);
        img.apply_orientation(orientation);
    }
    Ok(img)
}

/// Longer edge clamped to `max_edge`, aspect ratio kept, never upscaled.
pub fn generate_thumbnail(img: &DynamicImage, max_edge: u32) -> Result<Thumbnail, ImageError> {
    let (width, height) = img.dimensions();
    let resized = if width.max(height) > max_edge {
        img.resize(max_edge, max_edge, FilterType::Lanczos3)
    } else {
        img.clone()
    };

    let (width, height) = resized.dimensions();
    let data = encode_jpeg(&resized)?;

    Ok(Thumbnail {
        data,
        width,
        height,
    })
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let rgb = flatten_alpha(img);
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, THUMBNAIL_QUALITY);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(ImageError::Thumbnail)?;
    Ok(buffer.into_inner())
}

/// JPEG has no alpha channel; composite transparent areas onto white.
fn flatten_alpha(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
