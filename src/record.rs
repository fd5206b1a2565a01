//! Labeled ROI records and their on-disk collision policy.

use crate::grid::GridCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to write label file {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read label file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What gets persisted for one labeled image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Absolute path of the source image
    pub image_path: String,
    pub roi: Vec<GridCell>,
    /// `(height, width)` of the image the cells were picked on
    pub image_size: (u32, u32),
    pub label: String,
}

/// A record waiting for its label, together with the file it is routed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingLabel {
    pub path: PathBuf,
    pub image_path: String,
    pub roi: Vec<GridCell>,
    pub image_size: (u32, u32),
}

impl PendingLabel {
    pub fn with_label(&self, label: impl Into<String>) -> LabelRecord {
        LabelRecord {
            image_path: self.image_path.clone(),
            roi: self.roi.clone(),
            image_size: self.image_size,
            label: label.into(),
        }
    }
}

/// Asked before a record replaces one with the same label.
pub trait ConfirmOverwrite {
    fn confirm_overwrite(&mut self, path: &Path) -> bool;
}

impl<F> ConfirmOverwrite for F
where
    F: FnMut(&Path) -> bool,
{
    fn confirm_overwrite(&mut self, path: &Path) -> bool {
        self(path)
    }
}

/// Used when there is nobody to ask.
pub struct AlwaysOverwrite;

impl ConfirmOverwrite for AlwaysOverwrite {
    fn confirm_overwrite(&mut self, _path: &Path) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No earlier record existed at the target
    Created(PathBuf),
    /// The target held a different label; written next to it instead
    Diverted(PathBuf),
    /// Replaced an earlier record with the same label
    Overwritten(PathBuf),
    /// Same label already saved and the user kept it
    Declined,
}

impl SaveOutcome {
    pub fn written_path(&self) -> Option<&Path> {
        match self {
            SaveOutcome::Created(p) | SaveOutcome::Diverted(p) | SaveOutcome::Overwritten(p) => {
                Some(p)
            }
            SaveOutcome::Declined => None,
        }
    }
}

/// Base name of a file: everything before the first `.` of its file name.
pub fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

/// `<save_dir>/<image stem>.json`
pub fn record_path(save_dir: &Path, image_path: &Path) -> PathBuf {
    save_dir.join(format!("{}.json", file_stem(image_path)))
}

/// `<dir>/<stem>_<label>.<ext>` next to `target`.
pub fn alternate_path(target: &Path, label: &str) -> PathBuf {
    numbered_alternate_path(target, label, 0)
}

/// [`alternate_path`] with a `_<n>` suffix for `n > 0`.
pub fn numbered_alternate_path(target: &Path, label: &str, n: u32) -> PathBuf {
    let stem = file_stem(target);
    let ext = target
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "json".to_string());
    let label = filename_safe(label);
    let name = match n {
        0 => format!("{stem}_{label}.{ext}"),
        n => format!("{stem}_{label}_{n}.{ext}"),
    };
    target.with_file_name(name)
}

// Labels are free text; keep them from escaping the save directory.
fn filename_safe(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

pub fn load(path: &Path) -> Result<LabelRecord, RecordError> {
    let data = std::fs::read_to_string(path).map_err(|source| RecordError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&data)?)
}

fn write(record: &LabelRecord, path: &Path) -> Result<(), RecordError> {
    let data = serde_json::to_string_pretty(record)?;
    std::fs::write(path, data).map_err(|source| RecordError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

// `None` when the file cannot be read as a record.
fn stored_label(path: &Path) -> Option<String> {
    match load(path) {
        Ok(previous) => Some(previous.label),
        Err(e) => {
            log::warn!("Existing label file is unreadable, keeping it: {e}");
            None
        }
    }
}

/// Write `record` to `path`, asking first when a record with the same label
/// is already there. `None` means `path` holds something else.
fn write_unless_other_label(
    record: &LabelRecord,
    path: &Path,
    confirm: &mut dyn ConfirmOverwrite,
) -> Result<Option<Written>, RecordError> {
    if !path.exists() {
        write(record, path)?;
        log::info!("Saved label {:?} to {}", record.label, path.display());
        return Ok(Some(Written::Created));
    }
    if stored_label(path).as_deref() != Some(record.label.as_str()) {
        return Ok(None);
    }
    if !confirm.confirm_overwrite(path) {
        log::info!("Overwrite of {} declined", path.display());
        return Ok(Some(Written::Declined));
    }
    write(record, path)?;
    log::info!("Overwrote label {:?} in {}", record.label, path.display());
    Ok(Some(Written::Overwritten))
}

enum Written {
    Created,
    Overwritten,
    Declined,
}

/// Persist `record` at `target`, never clobbering a record with another label.
///
/// When `target` holds another label the record goes to
/// [`alternate_path`], then to `_1`, `_2`, ... variants of it until a free
/// slot or one with the same label is found.
pub fn save(
    record: &LabelRecord,
    target: &Path,
    confirm: &mut dyn ConfirmOverwrite,
) -> Result<SaveOutcome, RecordError> {
    match write_unless_other_label(record, target, confirm)? {
        Some(Written::Created) => return Ok(SaveOutcome::Created(target.to_path_buf())),
        Some(Written::Overwritten) => return Ok(SaveOutcome::Overwritten(target.to_path_buf())),
        Some(Written::Declined) => return Ok(SaveOutcome::Declined),
        None => {}
    }

    let mut n = 0;
    loop {
        let alternate = numbered_alternate_path(target, &record.label, n);
        match write_unless_other_label(record, &alternate, confirm)? {
            Some(Written::Declined) => return Ok(SaveOutcome::Declined),
            Some(_) => {
                log::info!(
                    "{} holds a different label, saved to {} instead",
                    target.display(),
                    alternate.display()
                );
                return Ok(SaveOutcome::Diverted(alternate));
            }
            None => log::debug!("{} holds a different label", alternate.display()),
        }
        n += 1;
    }
}
