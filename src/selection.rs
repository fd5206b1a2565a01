//! Toggled grid cells for the image currently on screen.

use crate::grid::GridCell;

/// Insertion-ordered set of selected cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    cells: Vec<GridCell>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `cell` and return whether it is now selected.
    pub fn toggle(&mut self, cell: GridCell) -> bool {
        if let Some(pos) = self.cells.iter().position(|c| *c == cell) {
            self.cells.remove(pos);
            false
        } else {
            self.cells.push(cell);
            true
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Cells in the order they were first selected.
    pub fn snapshot(&self) -> Vec<GridCell> {
        self.cells.clone()
    }

    pub fn contains(&self, cell: &GridCell) -> bool {
        self.cells.contains(cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: u32, y: u32) -> GridCell {
        GridCell::new(x, y, x + 100, y + 100)
    }

    #[test]
    fn test_toggle_reports_membership() {
        let mut set = SelectionSet::new();
        assert!(set.toggle(cell(0, 0)));
        assert!(set.contains(&cell(0, 0)));
        assert!(!set.toggle(cell(0, 0)));
        assert!(!set.contains(&cell(0, 0)));
    }

    #[test]
    fn test_double_toggle_restores_prior_state() {
        let mut set = SelectionSet::new();
        set.toggle(cell(0, 0));
        set.toggle(cell(100, 0));
        let before = set.clone();

        set.toggle(cell(200, 100));
        set.toggle(cell(200, 100));
        assert_eq!(set, before);

        set.toggle(cell(0, 0));
        set.toggle(cell(0, 0));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&cell(0, 0)));
    }

    #[test]
    fn test_snapshot_is_insertion_ordered() {
        let mut set = SelectionSet::new();
        set.toggle(cell(200, 0));
        set.toggle(cell(0, 100));
        set.toggle(cell(100, 100));
        set.toggle(cell(0, 100));
        set.toggle(cell(0, 100));
        assert_eq!(
            set.snapshot(),
            vec![cell(200, 0), cell(100, 100), cell(0, 100)]
        );
    }

    #[test]
    fn test_clear_empties() {
        let mut set = SelectionSet::new();
        set.toggle(cell(0, 0));
        set.toggle(cell(100, 0));
        set.clear();
        assert!(set.is_empty());
        assert!(set.snapshot().is_empty());
    }
}
