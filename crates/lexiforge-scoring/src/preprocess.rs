//! Image preprocessing for CLIP.
//!
//! Decodes artifact bytes, resizes to the CLIP input resolution with a
//! triangle filter, and produces a `(1, 3, 224, 224)` f32 tensor scaled to
//! [-1, 1].

use candle_core::{DType, Device, Result as CandleResult, Tensor};
use image::imageops::FilterType;

/// CLIP vit-base-patch32 input edge length.
pub const CLIP_IMAGE_SIZE: usize = 224;

/// Decode and preprocess one image into a batched CHW tensor.
pub fn image_to_tensor(bytes: &[u8], device: &Device) -> CandleResult<Tensor> {
    let img = image::load_from_memory(bytes)
        .map_err(candle_core::Error::wrap)?
        .resize_exact(
            CLIP_IMAGE_SIZE as u32,
            CLIP_IMAGE_SIZE as u32,
            FilterType::Triangle,
        )
        .to_rgb8();
    let data = img.into_raw();
    Tensor::from_vec(data, (CLIP_IMAGE_SIZE, CLIP_IMAGE_SIZE, 3), device)?
        .permute((2, 0, 1))?
        .to_dtype(DType::F32)?
        .affine(2.0 / 255.0, -1.0)?
        .unsqueeze(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_tensor_shape_is_batched_chw() {
        let tensor = image_to_tensor(&png_bytes(2, 2, [0, 0, 0]), &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_values_scaled_to_unit_range() {
        let black = image_to_tensor(&png_bytes(4, 4, [0, 0, 0]), &Device::Cpu).unwrap();
        let min: f32 = black.flatten_all().unwrap().min(0).unwrap().to_scalar().unwrap();
        assert!((min - (-1.0)).abs() < 1e-6);

        let white = image_to_tensor(&png_bytes(4, 4, [255, 255, 255]), &Device::Cpu).unwrap();
        let max: f32 = white.flatten_all().unwrap().max(0).unwrap().to_scalar().unwrap();
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_undecodable_bytes_error() {
        assert!(image_to_tensor(b"not an image", &Device::Cpu).is_err());
    }
}
