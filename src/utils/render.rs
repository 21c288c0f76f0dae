use ndarray::ArrayView3;

use crate::core::{GymError, RenderFrame, Result};

/// Encodes the RGBA pixels of a rendered frame as PNG.
///
/// Without the `image` feature this returns `GymError::NotSupported`.
pub fn encode_png(frame: &RenderFrame) -> Result<Vec<u8>> {
    match frame {
        RenderFrame::Pixels { width, height, data } => {
            let expected = (*width as usize) * (*height as usize) * 4;
            if data.len() != expected {
                return Err(GymError::InvalidObservation(format!(
                    "render frame has {} bytes, expected {} for {}x{} RGBA",
                    data.len(),
                    expected,
                    width,
                    height
                )));
            }
            encode(*width, *height, 4, data)
        }
        RenderFrame::Text(_) => Err(GymError::NotSupported("text frames cannot be encoded to PNG".into())),
    }
}

/// Encodes one processed frame, `(height, width, 1)` greyscale or
/// `(height, width, 3)` RGB, as PNG. Useful to inspect what the agent sees.
pub fn encode_frame_png(frame: ArrayView3<u8>) -> Result<Vec<u8>> {
    let (height, width, channels) = frame.dim();
    if channels != 1 && channels != 3 {
        return Err(GymError::InvalidObservation(format!(
            "cannot encode a frame with {} channels",
            channels
        )));
    }
    // History slots are standard layout; the copy only covers foreign views.
    let pixels: Vec<u8> = frame.iter().copied().collect();
    encode(width as u32, height as u32, channels, &pixels)
}

#[cfg(feature = "image")]
fn encode(width: u32, height: u32, channels: usize, pixels: &[u8]) -> Result<Vec<u8>> {
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    let color = match channels {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        _ => ExtendedColorType::Rgba8,
    };
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(pixels, width, height, color)
        .map_err(|e| GymError::Other(format!("PNG encode error: {}", e)))?;
    Ok(buf)
}

#[cfg(not(feature = "image"))]
fn encode(_width: u32, _height: u32, _channels: usize, _pixels: &[u8]) -> Result<Vec<u8>> {
    Err(GymError::NotSupported("PNG encoding requires the `image` feature".into()))
}

/// Writes a rendered frame to `path` as PNG.
pub fn save_png<P: AsRef<std::path::Path>>(path: P, frame: &RenderFrame) -> Result<()> {
    write(path, encode_png(frame)?)
}

/// Writes one processed frame to `path` as PNG.
pub fn save_frame_png<P: AsRef<std::path::Path>>(path: P, frame: ArrayView3<u8>) -> Result<()> {
    write(path, encode_frame_png(frame)?)
}

fn write<P: AsRef<std::path::Path>>(path: P, bytes: Vec<u8>) -> Result<()> {
    std::fs::write(path.as_ref(), bytes)
        .map_err(|e| GymError::Other(format!("failed to write {}: {}", path.as_ref().display(), e)))
}
