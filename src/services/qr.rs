use anyhow::Result;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

const MODULE_PX: u32 = 10;
const QUIET_ZONE: u32 = 4;

pub fn upload_url(base_url: &str) -> String {
    format!("{}/upload", base_url.trim_end_matches('/'))
}

/// Renders `data` as a black-on-white PNG QR code.
pub fn render_png(data: &str) -> Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)?;
    let width = code.width() as u32;
    let colors = code.to_colors();
    let size = (width + 2 * QUIET_ZONE) * MODULE_PX;

    let img = GrayImage::from_fn(size, size, |x, y| {
        let (mx, my) = (x / MODULE_PX, y / MODULE_PX);
        let inside = (QUIET_ZONE..QUIET_ZONE + width).contains(&mx)
            && (QUIET_ZONE..QUIET_ZONE + width).contains(&my);
        if !inside {
            return Luma([255]);
        }
        let index = ((my - QUIET_ZONE) * width + (mx - QUIET_ZONE)) as usize;
        match colors[index] {
            Color::Dark => Luma([0]),
            Color::Light => Luma([255]),
        }
    });

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
