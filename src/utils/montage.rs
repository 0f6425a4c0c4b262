//! Sample-Image Montages
//!
//! Composes a grid of MRI scans into a single PNG so the dataset (and the
//! SMOTE-synthesized samples) can be inspected visually.

use std::path::Path;

use image::{imageops, Rgb, RgbImage};

/// Gap between grid cells in pixels
const CELL_GAP: u32 = 4;

/// Convert a CHW float image in [0, 1] back to an RGB image
pub fn chw_to_rgb(data: &[f32], width: usize, height: usize) -> RgbImage {
    let plane = width * height;
    let mut img = RgbImage::new(width as u32, height as u32);

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let r = (data[idx].clamp(0.0, 1.0) * 255.0) as u8;
            let g = (data[plane + idx].clamp(0.0, 1.0) * 255.0) as u8;
            let b = (data[2 * plane + idx].clamp(0.0, 1.0) * 255.0) as u8;
            img.put_pixel(x as u32, y as u32, Rgb([r, g, b]));
        }
    }

    img
}

/// Compose CHW float images into a rows x cols grid and save it as PNG
///
/// Takes at most `rows * cols` images; a short input leaves trailing cells
/// blank.
pub fn save_sample_grid(
    images: &[Vec<f32>],
    width: usize,
    height: usize,
    rows: usize,
    cols: usize,
    output_path: &Path,
) -> image::ImageResult<()> {
    let cell_w = width as u32;
    let cell_h = height as u32;
    let canvas_w = cols as u32 * (cell_w + CELL_GAP) + CELL_GAP;
    let canvas_h = rows as u32 * (cell_h + CELL_GAP) + CELL_GAP;

    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb([255, 255, 255]));

    for (idx, data) in images.iter().take(rows * cols).enumerate() {
        let row = idx / cols;
        let col = idx % cols;
        let x = CELL_GAP + col as u32 * (cell_w + CELL_GAP);
        let y = CELL_GAP + row as u32 * (cell_h + CELL_GAP);

        let tile = chw_to_rgb(data, width, height);
        imageops::replace(&mut canvas, &tile, x as i64, y as i64);
    }

    canvas.save(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chw_to_rgb_roundtrip() {
        let width = 2;
        let height = 2;
        // Red in the top-left corner, black elsewhere
        let mut data = vec![0.0f32; 3 * width * height];
        data[0] = 1.0;

        let img = chw_to_rgb(&data, width, height);
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(1, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_save_sample_grid() {
        let images: Vec<Vec<f32>> = (0..4).map(|_| vec![0.5f32; 3 * 8 * 8]).collect();

        let path = std::env::temp_dir().join("bioad_test_grid.png");
        save_sample_grid(&images, 8, 8, 2, 2, &path).unwrap();

        assert!(path.exists());
        let saved = image::open(&path).unwrap();
        assert_eq!(saved.width(), 2 * (8 + CELL_GAP) + CELL_GAP);
        std::fs::remove_file(&path).ok();
    }
}
