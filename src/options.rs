//! Display options and parsing of the free-text option fields.

use crate::grid::GridInterval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Expected two comma-separated integers, got {input:?}")]
    Parse { input: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridColor {
    #[default]
    Black,
    White,
}

impl GridColor {
    pub fn all() -> &'static [GridColor] {
        &[GridColor::Black, GridColor::White]
    }

    pub fn name(&self) -> &'static str {
        match self {
            GridColor::Black => "black",
            GridColor::White => "white",
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        match self {
            GridColor::Black => [0, 0, 0],
            GridColor::White => [255, 255, 255],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Grid spacing `(x, y)`, both > 0
    pub grid_intervals: (u32, u32),
    pub grid_color: GridColor,
    /// Exact `(width, height)` to resize to before the grid is drawn
    pub resize: Option<(u32, u32)>,
    pub show_cell_labels: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            grid_intervals: (100, 100),
            grid_color: GridColor::Black,
            resize: None,
            show_cell_labels: false,
        }
    }
}

impl DisplayOptions {
    pub fn interval(&self) -> GridInterval {
        GridInterval {
            x: self.grid_intervals.0.max(1),
            y: self.grid_intervals.1.max(1),
        }
    }

    /// Build the next options from the raw option fields.
    ///
    /// Bad intervals keep the current ones, a bad or empty resize field means
    /// no resize, and no colour keeps the current colour.
    pub fn commit(&self, fields: &OptionFields) -> Self {
        let (grid_intervals, used_default) =
            parse_or_default(&fields.intervals, self.grid_intervals, parse_positive_pair);
        if used_default {
            log::debug!(
                "Keeping grid intervals {:?} (input {:?})",
                self.grid_intervals,
                fields.intervals
            );
        }
        let (resize, _) =
            parse_or_default(&fields.resize, None, |s| parse_positive_pair(s).map(Some));

        Self {
            grid_intervals,
            grid_color: fields.color.unwrap_or(self.grid_color),
            resize,
            show_cell_labels: fields.show_cell_labels,
        }
    }

    /// Whether cells picked under `other` keep their meaning under `self`.
    pub fn same_geometry(&self, other: &DisplayOptions) -> bool {
        self.grid_intervals == other.grid_intervals && self.resize == other.resize
    }

    /// Text for the option fields that reproduces these options.
    pub fn to_fields(&self) -> OptionFields {
        OptionFields {
            intervals: format!("{},{}", self.grid_intervals.0, self.grid_intervals.1),
            color: Some(self.grid_color),
            resize: self
                .resize
                .map(|(w, h)| format!("{w},{h}"))
                .unwrap_or_default(),
            show_cell_labels: self.show_cell_labels,
        }
    }
}

/// Raw, uncommitted contents of the option inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionFields {
    pub intervals: String,
    pub color: Option<GridColor>,
    pub resize: String,
    pub show_cell_labels: bool,
}

/// Parse `"x,y"` into two integers, tolerating whitespace around each value.
pub fn parse_pair(input: &str) -> Result<(i64, i64), OptionsError> {
    let err = || OptionsError::Parse {
        input: input.to_string(),
    };
    let mut parts = input.split(',').map(str::trim);
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(err());
    };
    let a = a.parse::<i64>().map_err(|_| err())?;
    let b = b.parse::<i64>().map_err(|_| err())?;
    Ok((a, b))
}

/// [`parse_pair`] restricted to strictly positive values.
pub fn parse_positive_pair(input: &str) -> Result<(u32, u32), OptionsError> {
    let (a, b) = parse_pair(input)?;
    match (u32::try_from(a), u32::try_from(b)) {
        (Ok(a), Ok(b)) if a > 0 && b > 0 => Ok((a, b)),
        _ => Err(OptionsError::Parse {
            input: input.to_string(),
        }),
    }
}

/// Run `parse` on `input`, falling back to `default` on failure.
///
/// The flag is `true` when the default was used.
pub fn parse_or_default<T, F>(input: &str, default: T, parse: F) -> (T, bool)
where
    F: FnOnce(&str) -> Result<T, OptionsError>,
{
    match parse(input) {
        Ok(value) => (value, false),
        Err(e) => {
            log::debug!("{e}, using default");
            (default, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("50,80"), Ok((50, 80)));
        assert_eq!(parse_pair(" 50 , 80 "), Ok((50, 80)));
        assert_eq!(parse_pair("-3,4"), Ok((-3, 4)));
        assert!(parse_pair("").is_err());
        assert!(parse_pair("50").is_err());
        assert!(parse_pair("1,2,3").is_err());
        assert!(parse_pair("a,b").is_err());
        assert!(parse_pair("1.5,2").is_err());
    }

    #[test]
    fn test_parse_or_default_both_branches() {
        assert_eq!(
            parse_or_default("20,30", (100, 100), parse_positive_pair),
            ((20, 30), false)
        );
        assert_eq!(
            parse_or_default("twenty", (100, 100), parse_positive_pair),
            ((100, 100), true)
        );
        assert_eq!(
            parse_or_default("0,30", (100, 100), parse_positive_pair),
            ((100, 100), true)
        );
    }

    #[test]
    fn test_commit_keeps_previous_intervals_on_bad_input() {
        let current = DisplayOptions {
            grid_intervals: (64, 32),
            ..DisplayOptions::default()
        };
        let fields = OptionFields {
            intervals: "oops".to_string(),
            ..OptionFields::default()
        };
        let next = current.commit(&fields);
        assert_eq!(next.grid_intervals, (64, 32));
        assert_eq!(next.grid_color, GridColor::Black);
    }

    #[test]
    fn test_commit_clears_resize_on_bad_input() {
        let current = DisplayOptions {
            resize: Some((640, 480)),
            ..DisplayOptions::default()
        };
        let fields = OptionFields {
            intervals: "50,50".to_string(),
            resize: String::new(),
            color: Some(GridColor::White),
            show_cell_labels: true,
        };
        let next = current.commit(&fields);
        assert_eq!(next.grid_intervals, (50, 50));
        assert_eq!(next.resize, None);
        assert_eq!(next.grid_color, GridColor::White);
        assert!(next.show_cell_labels);
    }

    #[test]
    fn test_commit_applies_resize() {
        let fields = OptionFields {
            intervals: "10,10".to_string(),
            resize: "800, 600".to_string(),
            ..OptionFields::default()
        };
        let next = DisplayOptions::default().commit(&fields);
        assert_eq!(next.resize, Some((800, 600)));
    }

    #[test]
    fn test_fields_round_trip_through_commit() {
        let options = DisplayOptions {
            grid_intervals: (25, 40),
            grid_color: GridColor::White,
            resize: Some((320, 200)),
            show_cell_labels: true,
        };
        assert_eq!(DisplayOptions::default().commit(&options.to_fields()), options);
    }

    #[test]
    fn test_same_geometry_ignores_cosmetic_options() {
        let base = DisplayOptions::default();
        let recoloured = DisplayOptions {
            grid_color: GridColor::White,
            show_cell_labels: true,
            ..base.clone()
        };
        assert!(recoloured.same_geometry(&base));

        let regridded = DisplayOptions {
            grid_intervals: (50, 100),
            ..base.clone()
        };
        assert!(!regridded.same_geometry(&base));

        let resized = DisplayOptions {
            resize: Some((300, 250)),
            ..base.clone()
        };
        assert!(!resized.same_geometry(&base));
    }

    #[test]
    fn test_grid_color_serde_names() {
        assert_eq!(serde_json::to_string(&GridColor::White).unwrap(), "\"white\"");
        assert_eq!(GridColor::Black.rgb(), [0, 0, 0]);
    }
}
