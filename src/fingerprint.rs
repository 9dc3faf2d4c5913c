//! Perceptual fingerprints of rendered images.
//!
//! A fingerprint is built from the seven Hu moment invariants of every colour
//! channel, once in sRGB and once in the HCLp colourspace, after a light
//! Gaussian blur. Each invariant is stored as `-log10(|h|)` in fixed point and
//! rendered as five lowercase hex digits, so visually similar images differ in
//! few positions of the resulting string.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Result};
use image::{imageops, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CHANNELS: usize = 3;
const COLORSPACES: usize = 2;
const INVARIANTS: usize = 7;
const DIGITS_PER_INVARIANT: usize = 5;
const MAX_ENCODED: f64 = 0xF_FFFF as f64;
const FIXED_POINT_SCALE: f64 = 100.0;
const BLUR_SIGMA: f32 = 1.0;

/// Length in characters of every fingerprint produced by [`full_fingerprint`].
pub const FINGERPRINT_LEN: usize = CHANNELS * COLORSPACES * INVARIANTS * DIGITS_PER_INVARIANT;

/// Largest start offset [`random_fingerprint_slice`] may pick.
pub const SLICE_OFFSET_MAX: usize = 128;

pub const DEFAULT_SLICE_LEN: usize = 16;

/// Canonical perceptual hash of `image`. Identical pixels give identical output.
pub fn full_fingerprint(image: &RgbaImage) -> Result<String> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        bail!("cannot fingerprint an empty {}x{} image", width, height);
    }

    let blurred = imageops::blur(image, BLUR_SIGMA);
    let planes = ChannelPlanes::from_image(&blurred);

    let mut out = String::with_capacity(FINGERPRINT_LEN);
    for channel in 0..CHANNELS {
        for plane in [&planes.srgb[channel], &planes.hclp[channel]] {
            for invariant in hu_invariants(plane, width as usize, height as usize) {
                out.push_str(&format!("{:05x}", encode_invariant(invariant)));
            }
        }
    }
    Ok(out)
}

/// Up to `length` characters of the fingerprint starting at a random offset.
///
/// The generator is seeded from the wall clock in whole seconds, so two calls
/// within the same second on the same image return the same slice. The slice
/// is shorter than `length` when the offset lands near the end.
pub fn random_fingerprint_slice(image: &RgbaImage, length: usize) -> Result<String> {
    let full = full_fingerprint(image)?;
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    Ok(fingerprint_slice(&full, seed, length))
}

/// Deterministic core of [`random_fingerprint_slice`].
pub fn fingerprint_slice(fingerprint: &str, seed: u64, length: usize) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let offset = rng.gen_range(0..=SLICE_OFFSET_MAX);
    fingerprint.chars().skip(offset).take(length).collect()
}

fn encode_invariant(invariant: f64) -> u32 {
    if invariant == 0.0 || !invariant.is_finite() {
        return 0;
    }
    let value = (-invariant.abs().log10()).abs() * FIXED_POINT_SCALE;
    value.round().clamp(0.0, MAX_ENCODED) as u32
}

struct ChannelPlanes {
    srgb: [Vec<f64>; CHANNELS],
    hclp: [Vec<f64>; CHANNELS],
}

impl ChannelPlanes {
    fn from_image(image: &RgbaImage) -> Self {
        let pixels = image.width() as usize * image.height() as usize;
        let mut srgb: [Vec<f64>; CHANNELS] = std::array::from_fn(|_| Vec::with_capacity(pixels));
        let mut hclp: [Vec<f64>; CHANNELS] = std::array::from_fn(|_| Vec::with_capacity(pixels));

        for pixel in image.pixels() {
            // Transparent areas contribute no mass.
            let alpha = f64::from(pixel[3]) / 255.0;
            let r = f64::from(pixel[0]) / 255.0 * alpha;
            let g = f64::from(pixel[1]) / 255.0 * alpha;
            let b = f64::from(pixel[2]) / 255.0 * alpha;

            srgb[0].push(r);
            srgb[1].push(g);
            srgb[2].push(b);

            let (hue, chroma, luma) = rgb_to_hclp(r, g, b);
            hclp[0].push(hue);
            hclp[1].push(chroma);
            hclp[2].push(luma);
        }

        Self { srgb, hclp }
    }
}

fn rgb_to_hclp(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;
    let mut hue = 0.0;
    if chroma > 0.0 {
        hue = if r == max {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if g == max {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };
        hue /= 6.0;
    }
    let luma = 0.298_839 * r + 0.586_811 * g + 0.114_350 * b;
    (hue, chroma, luma)
}

/// Hu's seven moment invariants of a row-major intensity plane.
fn hu_invariants(plane: &[f64], width: usize, height: usize) -> [f64; INVARIANTS] {
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        for (x, &value) in row.iter().enumerate() {
            m00 += value;
            m10 += x as f64 * value;
            m01 += y as f64 * value;
        }
    }
    if m00 <= 0.0 {
        return [0.0; INVARIANTS];
    }

    let cx = m10 / m00;
    let cy = m01 / m00;
    let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
    let (mut mu30, mut mu03, mut mu21, mut mu12) = (0.0, 0.0, 0.0, 0.0);
    for y in 0..height {
        let dy = y as f64 - cy;
        let row = &plane[y * width..(y + 1) * width];
        for (x, &value) in row.iter().enumerate() {
            if value == 0.0 {
                continue;
            }
            let dx = x as f64 - cx;
            mu20 += dx * dx * value;
            mu02 += dy * dy * value;
            mu11 += dx * dy * value;
            mu30 += dx * dx * dx * value;
            mu03 += dy * dy * dy * value;
            mu21 += dx * dx * dy * value;
            mu12 += dx * dy * dy * value;
        }
    }

    let norm2 = m00.powf(2.0);
    let norm3 = m00.powf(2.5);
    let n20 = mu20 / norm2;
    let n02 = mu02 / norm2;
    let n11 = mu11 / norm2;
    let n30 = mu30 / norm3;
    let n03 = mu03 / norm3;
    let n21 = mu21 / norm3;
    let n12 = mu12 / norm3;

    let a = n30 + n12;
    let b = n21 + n03;
    let c = n30 - 3.0 * n12;
    let d = 3.0 * n21 - n03;

    [
        n20 + n02,
        (n20 - n02).powi(2) + 4.0 * n11 * n11,
        c * c + d * d,
        a * a + b * b,
        c * a * (a * a - 3.0 * b * b) + d * b * (3.0 * a * a - b * b),
        (n20 - n02) * (a * a - b * b) + 4.0 * n11 * a * b,
        d * a * (a * a - 3.0 * b * b) - c * b * (3.0 * a * a - b * b),
    ]
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::{
        encode_invariant, fingerprint_slice, full_fingerprint, hu_invariants, FINGERPRINT_LEN,
        SLICE_OFFSET_MAX,
    };

    #[test]
    fn fingerprint_has_canonical_hex_length() {
        let image = RgbaImage::from_pixel(12, 8, Rgba([200, 40, 40, 255]));
        let fingerprint = full_fingerprint(&image).unwrap();
        assert_eq!(fingerprint.len(), FINGERPRINT_LEN);
        assert!(fingerprint
            .chars()
            .all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
    }

    #[test]
    fn empty_image_is_rejected() {
        let err = full_fingerprint(&RgbaImage::new(0, 0)).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn zero_and_non_finite_invariants_encode_as_zero() {
        assert_eq!(encode_invariant(0.0), 0);
        assert_eq!(encode_invariant(f64::NAN), 0);
        assert_eq!(encode_invariant(0.01), 200);
        assert_eq!(encode_invariant(-0.01), 200);
    }

    #[test]
    fn black_plane_has_no_moments() {
        assert_eq!(hu_invariants(&[0.0; 16], 4, 4), [0.0; 7]);
    }

    #[test]
    fn first_invariant_ignores_translation() {
        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        for y in 2..5 {
            for x in 1..3 {
                left[y * 8 + x] = 1.0;
                right[y * 8 + x + 4] = 1.0;
            }
        }
        let a = hu_invariants(&left, 8, 8);
        let b = hu_invariants(&right, 8, 8);
        assert!((a[0] - b[0]).abs() < 1e-12);
        assert!(a[0] > 0.0);
    }

    #[test]
    fn slice_is_stable_for_a_seed_and_bounded() {
        let fingerprint = "0123456789abcdef".repeat(14);
        let first = fingerprint_slice(&fingerprint, 42, 16);
        let second = fingerprint_slice(&fingerprint, 42, 16);
        assert_eq!(first, second);
        assert!(fingerprint.contains(&first));
        assert!(first.len() <= 16);
    }

    #[test]
    fn slice_of_short_fingerprint_underfills() {
        let short = "abc";
        for seed in 0..32 {
            let slice = fingerprint_slice(short, seed, 16);
            assert!(short.contains(&slice));
        }
        let long = "x".repeat(SLICE_OFFSET_MAX + 16);
        assert_eq!(fingerprint_slice(&long, 7, 16).len(), 16);
    }
}
