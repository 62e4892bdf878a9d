use image::imageops::FilterType;

use crate::error::EngineError;

/// A decoded image laid out as an NHWC `[1, size, size, 3]` tensor with
/// channel values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub size: u32,
    pub data: Vec<f32>,
}

impl PreparedImage {
    /// Tensor shape as `[batch, height, width, channels]`.
    pub fn shape(&self) -> [usize; 4] {
        let side = self.size as usize;
        [1, side, side, 3]
    }
}

/// Decode `bytes`, resize to a `size`x`size` square and normalise to RGB floats.
pub fn prepare(bytes: &[u8], size: u32) -> Result<PreparedImage, EngineError> {
    if size == 0 {
        return Err(EngineError::Configuration("input size must be positive".into()));
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| EngineError::Decode(e.to_string()))?;
    let rgb = decoded.resize_exact(size, size, FilterType::Triangle).to_rgb8();

    let data = rgb
        .pixels()
        .flat_map(|p| p.0)
        .map(|channel| f32::from(channel) / 255.0)
        .collect();

    Ok(PreparedImage { size, data })
}
