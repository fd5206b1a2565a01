//! Grid-based ROI labeling for folders of images.
//!
//! The user overlays a fixed grid on each image, toggles cells to mark
//! regions of interest and saves them with a text label as a JSON record.

pub mod app;
pub mod config;
pub mod grid;
pub mod navigator;
pub mod options;
pub mod raster;
pub mod record;
pub mod selection;
pub mod session;
