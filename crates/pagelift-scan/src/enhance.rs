// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-warp enhancement — contrast-limited adaptive histogram equalization
// on the Lab lightness channel, and global Otsu binarization for
// black-and-white output.

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use tracing::{debug, instrument};

/// Tile grid for the adaptive equalization.
const TILE_GRID: u32 = 8;
/// Contrast limit applied to each tile histogram, as a multiple of the mean
/// bin height.
const CLIP_LIMIT: f64 = 2.0;
/// Histogram resolution for the quantized lightness channel.
const BINS: usize = 256;

/// Boost local contrast without shifting colour.
///
/// Each pixel is converted to CIE Lab; contrast-limited adaptive histogram
/// equalization (CLAHE) runs on the lightness channel over an 8x8 tile grid
/// with clip limit 2.0, and the result converts back to sRGB. Illumination
/// gradients flatten while hue and saturation stay put. Alpha passes through
/// untouched, and zero-dimension inputs come back unchanged.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn enhance_document(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return DynamicImage::ImageRgba8(rgba);
    }

    // Quantized lightness plane driving the tile histograms.
    let mut lightness = vec![0u8; width as usize * height as usize];
    for (i, pixel) in rgba.pixels().enumerate() {
        let (l, _, _) = srgb_to_lab(pixel[0], pixel[1], pixel[2]);
        lightness[i] = quantize_lightness(l);
    }

    let mapping = TileMapping::build(&lightness, width, height);

    let mut output = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let pixel = rgba.get_pixel(x, y);
            let (l, a, b) = srgb_to_lab(pixel[0], pixel[1], pixel[2]);
            let equalized = mapping.lookup(x, y, quantize_lightness(l));
            let (r, g, b) = lab_to_srgb(equalized * 100.0 / 255.0, a, b);
            output.put_pixel(x, y, Rgba([r, g, b, pixel[3]]));
        }
    }

    debug!("Adaptive contrast enhancement applied");
    DynamicImage::ImageRgba8(output)
}

/// Threshold the image into pure black and white.
///
/// The threshold comes from Otsu's method: the histogram split that
/// maximizes between-class variance. Zero-dimension inputs come back
/// unchanged.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn binarize_otsu(image: &DynamicImage) -> DynamicImage {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return DynamicImage::ImageLuma8(gray);
    }

    let threshold = otsu_threshold(&gray);
    debug!(threshold, "Otsu threshold computed");

    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = gray.get_pixel(x, y).0[0];
            output.put_pixel(x, y, Luma([if value > threshold { 255 } else { 0 }]));
        }
    }
    DynamicImage::ImageLuma8(output)
}

// -- Adaptive equalization ----------------------------------------------------

/// Per-tile equalization tables with bilinear blending between neighbouring
/// tiles.
struct TileMapping {
    tables: Vec<[u8; BINS]>,
    tiles_x: u32,
    tiles_y: u32,
    tile_w: f64,
    tile_h: f64,
}

impl TileMapping {
    fn build(lightness: &[u8], width: u32, height: u32) -> Self {
        let tiles_x = TILE_GRID.min(width);
        let tiles_y = TILE_GRID.min(height);
        let tile_w = f64::from(width) / f64::from(tiles_x);
        let tile_h = f64::from(height) / f64::from(tiles_y);

        let mut tables = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let x0 = (f64::from(tx) * tile_w) as u32;
                let x1 = ((f64::from(tx + 1) * tile_w) as u32).min(width).max(x0 + 1);
                let y0 = (f64::from(ty) * tile_h) as u32;
                let y1 = ((f64::from(ty + 1) * tile_h) as u32).min(height).max(y0 + 1);
                tables.push(equalization_table(lightness, width, x0, x1, y0, y1));
            }
        }

        Self {
            tables,
            tiles_x,
            tiles_y,
            tile_w,
            tile_h,
        }
    }

    /// Equalized value for `bin` at pixel (x, y), blended bilinearly between
    /// the four nearest tile tables.
    fn lookup(&self, x: u32, y: u32, bin: u8) -> f64 {
        let (tx0, tx1, fx) = neighbour_tiles(f64::from(x), self.tile_w, self.tiles_x);
        let (ty0, ty1, fy) = neighbour_tiles(f64::from(y), self.tile_h, self.tiles_y);

        let table = |tx: u32, ty: u32| {
            f64::from(self.tables[(ty * self.tiles_x + tx) as usize][bin as usize])
        };

        let top = table(tx0, ty0) * (1.0 - fx) + table(tx1, ty0) * fx;
        let bottom = table(tx0, ty1) * (1.0 - fx) + table(tx1, ty1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}

/// The two tile indices bracketing `coord`, plus the blend fraction between
/// their centres. Pixels outside the first and last tile centres clamp.
fn neighbour_tiles(coord: f64, tile_size: f64, tiles: u32) -> (u32, u32, f64) {
    let u = coord / tile_size - 0.5;
    if u <= 0.0 {
        return (0, 0, 0.0);
    }
    let last = tiles - 1;
    if u >= f64::from(last) {
        return (last, last, 0.0);
    }
    let lower = u.floor();
    (lower as u32, lower as u32 + 1, u - lower)
}

/// Clipped-histogram equalization table for one tile.
///
/// Bins above the clip limit are trimmed and the pooled excess is
/// redistributed evenly, which caps how steeply the tile can amplify
/// contrast.
fn equalization_table(
    lightness: &[u8],
    width: u32,
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
) -> [u8; BINS] {
    let mut histogram = [0u64; BINS];
    for y in y0..y1 {
        let row = y as usize * width as usize;
        for x in x0..x1 {
            histogram[lightness[row + x as usize] as usize] += 1;
        }
    }

    let tile_pixels = u64::from(x1 - x0) * u64::from(y1 - y0);
    let clip = (((CLIP_LIMIT * tile_pixels as f64) / BINS as f64) as u64).max(1);

    let mut excess = 0u64;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let per_bin = excess / BINS as u64;
    let remainder = (excess % BINS as u64) as usize;
    for (i, count) in histogram.iter_mut().enumerate() {
        *count += per_bin + u64::from(i < remainder);
    }

    let mut table = [0u8; BINS];
    let scale = 255.0 / tile_pixels as f64;
    let mut cumulative = 0u64;
    for (i, &count) in histogram.iter().enumerate() {
        cumulative += count;
        table[i] = (cumulative as f64 * scale).round().min(255.0) as u8;
    }
    table
}

fn quantize_lightness(l: f64) -> u8 {
    (l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8
}

/// Otsu threshold of a grayscale image: the histogram split that maximizes
/// between-class variance.
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total = u64::from(gray.width()) * u64::from(gray.height());
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut background_count = 0u64;
    let mut background_sum = 0.0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = 0.0f64;

    for (value, &count) in histogram.iter().enumerate() {
        background_count += count;
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }
        background_sum += value as f64 * count as f64;

        let mean_background = background_sum / background_count as f64;
        let mean_foreground = (weighted_sum - background_sum) / foreground_count as f64;
        let variance = background_count as f64
            * foreground_count as f64
            * (mean_background - mean_foreground).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = value as u8;
        }
    }

    best_threshold
}

// -- Lab colour space ---------------------------------------------------------

const D65_WHITE: (f64, f64, f64) = (0.950489, 1.0, 1.088840);
const LAB_EPSILON: f64 = 216.0 / 24389.0;
const LAB_KAPPA: f64 = 24389.0 / 27.0;

/// sRGB (8-bit) to CIE Lab under the D65 white point.
fn srgb_to_lab(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let rl = srgb_linearize(r);
    let gl = srgb_linearize(g);
    let bl = srgb_linearize(b);

    let x = 0.4124564 * rl + 0.3575761 * gl + 0.1804375 * bl;
    let y = 0.2126729 * rl + 0.7151522 * gl + 0.0721750 * bl;
    let z = 0.0193339 * rl + 0.1191920 * gl + 0.9503041 * bl;

    let fx = lab_f(x / D65_WHITE.0);
    let fy = lab_f(y / D65_WHITE.1);
    let fz = lab_f(z / D65_WHITE.2);

    (116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

/// CIE Lab (D65) back to sRGB, clamped to gamut.
fn lab_to_srgb(l: f64, a: f64, b: f64) -> (u8, u8, u8) {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = D65_WHITE.0 * lab_f_inv(fx);
    let y = D65_WHITE.1
        * if l > LAB_EPSILON * LAB_KAPPA {
            fy.powi(3)
        } else {
            l / LAB_KAPPA
        };
    let z = D65_WHITE.2 * lab_f_inv(fz);

    let rl = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let gl = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let bl = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    (
        srgb_delinearize(rl),
        srgb_delinearize(gl),
        srgb_delinearize(bl),
    )
}

fn srgb_linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn srgb_delinearize(linear: f64) -> u8 {
    let c = if linear <= 0.0031308 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f64) -> f64 {
    let cubed = f.powi(3);
    if cubed > LAB_EPSILON {
        cubed
    } else {
        (116.0 * f - 16.0) / LAB_KAPPA
    }
}

// -- Tests --------------------------------------------------------------------
