//! Ordered walk over the images of a folder.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("No usable images found in {dir:?}")]
    Empty { dir: Option<PathBuf> },

    #[error("Failed to read image folder {dir:?}: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Saved navigator cursor, used to keep showing the previous image when a
/// step lands on one that fails to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigatorPosition {
    index: usize,
    active: usize,
}

/// List of image paths with a bounds-clamped cursor.
///
/// `index` is where the last step landed (possibly clamped) and `active` is
/// the image last handed to the caller. They diverge after a step overshoots
/// the ends of the list or lands on an image the caller could not load.
#[derive(Clone, Debug)]
pub struct ImageNavigator {
    paths: Vec<PathBuf>,
    index: usize,
    active: usize,
}

impl ImageNavigator {
    pub fn new(paths: Vec<PathBuf>) -> Result<Self, NavigatorError> {
        if paths.is_empty() {
            return Err(NavigatorError::Empty { dir: None });
        }
        Ok(Self {
            paths,
            index: 0,
            active: 0,
        })
    }

    /// Collect the decodable images directly inside `dir`, sorted by path.
    pub fn from_dir(dir: &Path) -> Result<Self, NavigatorError> {
        let entries = std::fs::read_dir(dir).map_err(|source| NavigatorError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_image_path(p))
            .collect();
        paths.sort();

        log::info!("Found {} images in {}", paths.len(), dir.display());
        if paths.is_empty() {
            return Err(NavigatorError::Empty {
                dir: Some(dir.to_path_buf()),
            });
        }
        Self::new(paths)
    }

    /// Move by `step` images.
    ///
    /// Returns the newly active path when the target is in range. Otherwise
    /// the cursor clamps to the nearest end, `None` is returned and the active
    /// image stays what it was.
    pub fn advance(&mut self, step: isize) -> Option<&Path> {
        let last = self.paths.len() - 1;
        let target = (self.index as isize).saturating_add(step);
        if (0..=last as isize).contains(&target) {
            self.index = target as usize;
            self.active = self.index;
            Some(&self.paths[self.active])
        } else {
            self.index = if target < 0 { 0 } else { last };
            log::debug!("Navigation clamped at index {}", self.index);
            None
        }
    }

    pub fn current(&self) -> &Path {
        &self.paths[self.active]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn position(&self) -> NavigatorPosition {
        NavigatorPosition {
            index: self.index,
            active: self.active,
        }
    }

    /// Make the image active at `position` current again, leaving the cursor
    /// where the last step put it.
    pub fn restore_active(&mut self, position: NavigatorPosition) {
        self.active = position.active.min(self.paths.len() - 1);
    }
}

fn is_image_path(path: &Path) -> bool {
    image::ImageFormat::from_path(path).is_ok()
}
