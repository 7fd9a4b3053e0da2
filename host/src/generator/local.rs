use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use poa_core::art::{FULL_WIDTH, HEIGHT};
use poa_core::{render_artwork, sha256};

use super::Generator;
use crate::error::{PoaError, Result, Service};

/// Largest upscale factor; 64 * 32 keeps a side at 2048 pixels
pub const MAX_SCALE: u32 = 32;

/// Offline generator: a mirrored ink-blot seeded by the prompt digest,
/// upscaled and PNG-encoded. Same prompt, same bytes.
pub struct LocalGenerator {
    scale: u32,
}

impl LocalGenerator {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.clamp(1, MAX_SCALE),
        }
    }

    pub fn render(&self, prompt: &str) -> Result<RgbImage> {
        let canvas = render_artwork(&sha256(prompt.as_bytes()));
        let full = ImageBuffer::from_raw(FULL_WIDTH as u32, HEIGHT as u32, canvas.mirrored_rgb())
            .ok_or_else(|| PoaError::upstream(Service::Generator, "canvas size mismatch"))?;

        Ok(upscale(&full, self.scale))
    }

    pub fn render_png(&self, prompt: &str) -> Result<Vec<u8>> {
        let image = self.render(prompt)?;
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| PoaError::upstream(Service::Generator, e))?;
        Ok(bytes)
    }
}

fn upscale(image: &RgbImage, factor: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut scaled: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width * factor, height * factor);

    for y in 0..height {
        for x in 0..width {
            let pixel = image.get_pixel(x, y);
            for dy in 0..factor {
                for dx in 0..factor {
                    scaled.put_pixel(x * factor + dx, y * factor + dy, *pixel);
                }
            }
        }
    }

    scaled
}

#[async_trait]
impl Generator for LocalGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        self.render_png(prompt)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
