//! Offline artwork renderer.
//!
//! Draws a symmetric ink-blot by running bounded random walks over a virtual
//! 64×64 canvas and folding the right half onto a 32×64 buffer. The walk RNG
//! is seeded with the prompt digest, so a prompt always renders the same
//! picture. Mirroring back to full width and encoding happen on the host.

use alloc::vec::Vec;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const HALF_WIDTH: u64 = 32;
pub const FULL_WIDTH: u64 = 64;
pub const HEIGHT: u64 = 64;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgb_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Pixel,
    pub background: Pixel,
}

impl Palette {
    /// Colors come from seed bytes 8..14; the foreground is forced into the
    /// upper half of each channel and the background into the lower half so
    /// the blot always contrasts.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            foreground: Pixel::new(seed[8] | 0x80, seed[9] | 0x80, seed[10] | 0x80),
            background: Pixel::new(seed[11] & 0x7f, seed[12] & 0x7f, seed[13] & 0x7f),
        }
    }
}

/// Left half of a mirrored artwork (32×64)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pixels: Vec<Pixel>,
}

impl Canvas {
    pub fn new(background: Pixel) -> Self {
        Self {
            pixels: alloc::vec![background; (HALF_WIDTH * HEIGHT) as usize],
        }
    }

    pub fn get_pixel(&self, x: u64, y: u64) -> Option<Pixel> {
        if x < HALF_WIDTH && y < HEIGHT {
            Some(self.pixels[(y * HALF_WIDTH + x) as usize])
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: u64, y: u64, pixel: Pixel) {
        if x < HALF_WIDTH && y < HEIGHT {
            self.pixels[(y * HALF_WIDTH + x) as usize] = pixel;
        }
    }

    /// Full-width row-major RGB bytes with the right half mirrored
    pub fn mirrored_rgb(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((FULL_WIDTH * HEIGHT * 3) as usize);
        for y in 0..HEIGHT {
            for x in 0..FULL_WIDTH {
                let source_x = if x < HALF_WIDTH { x } else { FULL_WIDTH - x - 1 };
                let pixel = self.pixels[(y * HALF_WIDTH + source_x) as usize];
                bytes.extend_from_slice(&pixel.to_rgb_array());
            }
        }
        bytes
    }
}

enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Walk count (3..=10) and steps per walk (100..=300) from seed bytes 0..8
pub fn derive_parameters(seed: &[u8; 32]) -> (u64, u64) {
    let walks_raw = u32::from_le_bytes([seed[0], seed[1], seed[2], seed[3]]);
    let steps_raw = u32::from_le_bytes([seed[4], seed[5], seed[6], seed[7]]);

    let walks = 3 + (walks_raw % 8) as u64;
    let steps = 100 + (steps_raw % 201) as u64;

    (walks, steps)
}

/// Render the artwork for a 32-byte seed (normally the prompt digest)
pub fn render_artwork(seed: &[u8; 32]) -> Canvas {
    let (walks, steps) = derive_parameters(seed);
    render_half(seed, walks, steps, Palette::from_seed(seed))
}

/// Run `walks` random walks of `steps` each inside the central region of the
/// virtual canvas and fold them onto the half canvas.
pub fn render_half(seed: &[u8; 32], walks: u64, steps: u64, palette: Palette) -> Canvas {
    let left = FULL_WIDTH / 4;
    let right = 3 * FULL_WIDTH / 4;
    let top = HEIGHT / 4;
    let bottom = 3 * HEIGHT / 4;

    let mut rng = ChaCha8Rng::from_seed(*seed);
    let mut canvas = Canvas::new(palette.background);

    for _ in 0..walks {
        let mut x = rng.gen_range(left..right);
        let mut y = rng.gen_range(top..bottom);
        canvas.set_pixel(fold(x), y, palette.foreground);

        for _ in 0..steps {
            match decide_direction(&mut rng, x, y) {
                Direction::Left if x > left => x -= 1,
                Direction::Right if x < right - 1 => x += 1,
                Direction::Up if y > top => y -= 1,
                Direction::Down if y < bottom - 1 => y += 1,
                _ => {}
            }
            canvas.set_pixel(fold(x), y, palette.foreground);
        }
    }

    canvas
}

fn fold(x: u64) -> u64 {
    if x >= HALF_WIDTH {
        FULL_WIDTH - x - 1
    } else {
        x
    }
}

// Probability of each move shrinks linearly as the cursor nears that edge of
// the central region. Fixed-point so the output is identical on every target.
fn decide_direction(rng: &mut ChaCha8Rng, x: u64, y: u64) -> Direction {
    const SCALE: u64 = 1_000_000;
    let band_x = FULL_WIDTH / 4;
    let band_y = HEIGHT / 4;

    let weight = |distance: u64, band: u64| -> u64 {
        if distance >= band {
            SCALE
        } else {
            distance * SCALE / band
        }
    };

    let left = weight(x.saturating_sub(band_x), band_x);
    let right = weight((3 * band_x).saturating_sub(x), band_x);
    let up = weight(y.saturating_sub(band_y), band_y);
    let down = weight((3 * band_y).saturating_sub(y), band_y);

    let roll = rng.gen::<u64>() % (left + right + up + down);

    if roll < left {
        Direction::Left
    } else if roll < left + right {
        Direction::Right
    } else if roll < left + right + up {
        Direction::Up
    } else {
        Direction::Down
    }
}
