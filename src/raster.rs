//! Decoding the active image and burning the grid into a display copy.

use crate::grid::GridInterval;
use crate::options::{DisplayOptions, GridColor};
use image::{imageops::FilterType, DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Could not read the image file {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded image plus the gridded copy shown on screen.
pub struct ActiveImage {
    pub path: PathBuf,
    source: DynamicImage,
    display: RgbaImage,
}

impl ActiveImage {
    pub fn open(path: &Path, options: &DisplayOptions) -> Result<Self, RasterError> {
        let source = image::open(path).map_err(|source| RasterError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "Decoded {} ({}x{})",
            path.display(),
            source.width(),
            source.height()
        );
        Ok(Self::from_image(path.to_path_buf(), source, options))
    }

    pub fn from_image(path: PathBuf, source: DynamicImage, options: &DisplayOptions) -> Self {
        let display = render(&source, options);
        Self {
            path,
            source,
            display,
        }
    }

    /// Rebuild the display copy after the options changed.
    pub fn rerender(&mut self, options: &DisplayOptions) {
        self.display = render(&self.source, options);
    }

    pub fn display(&self) -> &RgbaImage {
        &self.display
    }

    pub fn width(&self) -> u32 {
        self.display.width()
    }

    pub fn height(&self) -> u32 {
        self.display.height()
    }

    /// Whether an image-space point lies on the displayed image, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width() as f64).contains(&x) && (0.0..=self.height() as f64).contains(&y)
    }
}

/// Resize (if requested) and draw the grid lines.
pub fn render(source: &DynamicImage, options: &DisplayOptions) -> RgbaImage {
    let mut img = match options.resize {
        Some((w, h)) => source.resize_exact(w, h, FilterType::CatmullRom).to_rgba8(),
        None => source.to_rgba8(),
    };
    draw_grid(&mut img, options.interval(), options.grid_color);
    img
}

/// Paint every column `x % ix == 0` and row `y % iy == 0`.
pub fn draw_grid(img: &mut RgbaImage, interval: GridInterval, color: GridColor) {
    let [r, g, b] = color.rgb();
    let (w, h) = img.dimensions();
    for y in 0..h {
        let on_row = y % interval.y == 0;
        for x in 0..w {
            if on_row || x % interval.x == 0 {
                let a = img.get_pixel(x, y)[3];
                img.put_pixel(x, y, Rgba([r, g, b, a]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gray(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255])))
    }

    #[test]
    fn test_grid_lines_land_on_multiples() {
        let mut img = gray(25, 12).to_rgba8();
        draw_grid(&mut img, GridInterval { x: 10, y: 5 }, GridColor::White);

        let white = Rgba([255, 255, 255, 255]);
        for x in [0, 10, 20] {
            assert_eq!(*img.get_pixel(x, 3), white);
        }
        for y in [0, 5, 10] {
            assert_eq!(*img.get_pixel(7, y), white);
        }
        assert_eq!(*img.get_pixel(7, 3), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_render_applies_resize_before_grid() {
        let options = DisplayOptions {
            grid_intervals: (4, 4),
            resize: Some((8, 6)),
            ..DisplayOptions::default()
        };
        let img = render(&gray(30, 30), &options);
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(4, 1).0[..3], [0, 0, 0]);
        assert_ne!(img.get_pixel(5, 1).0[..3], [0, 0, 0]);
    }

    #[test]
    fn test_rerender_follows_options() {
        let mut active = ActiveImage::from_image(
            PathBuf::from("mem.png"),
            gray(40, 20),
            &DisplayOptions::default(),
        );
        assert_eq!((active.width(), active.height()), (40, 20));
        active.rerender(&DisplayOptions {
            resize: Some((10, 10)),
            ..DisplayOptions::default()
        });
        assert_eq!((active.width(), active.height()), (10, 10));
    }

    #[test]
    fn test_contains_is_bounded_by_display_size() {
        let active = ActiveImage::from_image(
            PathBuf::from("mem.png"),
            gray(300, 250),
            &DisplayOptions::default(),
        );
        assert!(active.contains(0.0, 0.0));
        assert!(active.contains(299.5, 249.9));
        assert!(active.contains(300.0, 250.0));
        assert!(!active.contains(-500.0, 10.0));
        assert!(!active.contains(5000.0, -900.0));
        assert!(!active.contains(300.1, 10.0));
        assert!(!active.contains(f64::NAN, 10.0));
    }

    #[test]
    fn test_open_reports_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = ActiveImage::open(&path, &DisplayOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, RasterError::Decode { .. }));
    }

    #[test]
    fn test_open_decodes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tile.png");
        gray(12, 9).save(&path).unwrap();
        let active = ActiveImage::open(&path, &DisplayOptions::default()).unwrap();
        assert_eq!((active.width(), active.height()), (12, 9));
    }
}
