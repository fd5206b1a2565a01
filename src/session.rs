//! The single live annotation context: which image is shown, how, and which
//! of its cells are selected.

use crate::grid::{self, GridCell};
use crate::navigator::{ImageNavigator, NavigatorError};
use crate::options::{DisplayOptions, OptionFields};
use crate::raster::{ActiveImage, RasterError};
use crate::record::{self, ConfirmOverwrite, PendingLabel, RecordError, SaveOutcome};
use crate::selection::SelectionSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Navigator(#[from] NavigatorError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// What the renderer has to do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderInstruction {
    Unchanged,
    /// New image, new options or cleared selection
    Redraw,
    /// One cell flipped its selection state
    Highlight { cell: GridCell, selected: bool },
}

pub struct SessionController {
    navigator: Option<ImageNavigator>,
    image: Option<ActiveImage>,
    options: DisplayOptions,
    selection: SelectionSet,
    save_dir: PathBuf,
}

impl SessionController {
    pub fn new(options: DisplayOptions, save_dir: Option<PathBuf>) -> Self {
        Self {
            navigator: None,
            image: None,
            options,
            selection: SelectionSet::new(),
            save_dir: save_dir.unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Switch to the images of `dir`, showing the first one that decodes.
    ///
    /// On failure the previous folder stays loaded.
    pub fn open_folder(&mut self, dir: &Path) -> Result<RenderInstruction, SessionError> {
        let mut navigator = ImageNavigator::from_dir(dir)?;
        let mut candidate = Some(navigator.current().to_path_buf());
        while let Some(path) = candidate {
            match ActiveImage::open(&path, &self.options) {
                Ok(image) => {
                    log::info!("Opened {} ({} images)", dir.display(), navigator.len());
                    self.navigator = Some(navigator);
                    self.show(image);
                    return Ok(RenderInstruction::Redraw);
                }
                Err(e) => {
                    log::warn!("Skipping {e}");
                    candidate = navigator.advance(1).map(Path::to_path_buf);
                }
            }
        }
        Err(NavigatorError::Empty {
            dir: Some(dir.to_path_buf()),
        }
        .into())
    }

    /// Step through the folder. Overshooting an end clamps silently and
    /// keeps the current image and its selection.
    ///
    /// An image that fails to decode is reported and stepped over: the
    /// current image stays on screen while the cursor stays on the broken
    /// file, so the next step moves past it.
    pub fn navigate(&mut self, step: isize) -> Result<RenderInstruction, SessionError> {
        let Some(navigator) = self.navigator.as_mut() else {
            return Ok(RenderInstruction::Unchanged);
        };
        let saved = navigator.position();
        let Some(path) = navigator.advance(step).map(Path::to_path_buf) else {
            return Ok(RenderInstruction::Unchanged);
        };
        match ActiveImage::open(&path, &self.options) {
            Ok(image) => {
                log::debug!("Navigated to {}", path.display());
                self.show(image);
                Ok(RenderInstruction::Redraw)
            }
            Err(e) => {
                navigator.restore_active(saved);
                Err(e.into())
            }
        }
    }

    fn show(&mut self, image: ActiveImage) {
        self.selection = SelectionSet::new();
        self.image = Some(image);
    }

    /// Toggle the cell under an image-space click.
    pub fn on_cell_clicked(&mut self, x: f64, y: f64) -> RenderInstruction {
        let Some(image) = &self.image else {
            return RenderInstruction::Unchanged;
        };
        let cell = grid::resolve_in(x, y, self.options.interval(), image.width(), image.height());
        let selected = self.selection.toggle(cell);
        log::debug!("Click ({x:.2}, {y:.2}) -> {cell:?}, selected: {selected}");
        RenderInstruction::Highlight { cell, selected }
    }

    pub fn reset(&mut self) -> RenderInstruction {
        if self.image.is_none() {
            return RenderInstruction::Unchanged;
        }
        self.selection.clear();
        RenderInstruction::Redraw
    }

    /// Apply the option inputs and re-render the current image.
    pub fn commit_options(&mut self, fields: &OptionFields) -> RenderInstruction {
        let next = self.options.commit(fields);
        if !self.selection.is_empty() && !next.same_geometry(&self.options) {
            log::warn!(
                "Grid or size changed with {} cells selected; they keep their old coordinates",
                self.selection.len()
            );
        }
        self.options = next;
        log::info!("Display options: {:?}", self.options);
        match self.image.as_mut() {
            Some(image) => {
                image.rerender(&self.options);
                RenderInstruction::Redraw
            }
            None => RenderInstruction::Unchanged,
        }
    }

    pub fn set_save_dir(&mut self, dir: PathBuf) {
        log::info!("Saving labels to {}", dir.display());
        self.save_dir = dir;
    }

    /// Snapshot the current selection into a record awaiting its label.
    pub fn prepare_label(&self) -> Option<PendingLabel> {
        let image = self.image.as_ref()?;
        let save_dir = absolute(&self.save_dir);
        Some(PendingLabel {
            path: record::record_path(&save_dir, &image.path),
            image_path: absolute(&image.path).to_string_lossy().to_string(),
            roi: self.selection.snapshot(),
            image_size: (image.height(), image.width()),
        })
    }

    pub fn save_label(
        &self,
        pending: &PendingLabel,
        label: &str,
        confirm: &mut dyn ConfirmOverwrite,
    ) -> Result<SaveOutcome, SessionError> {
        let record = pending.with_label(label);
        Ok(record::save(&record, &pending.path, confirm)?)
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn image(&self) -> Option<&ActiveImage> {
        self.image.as_ref()
    }

    pub fn navigator(&self) -> Option<&ImageNavigator> {
        self.navigator.as_ref()
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
