//! Two-click rectangle selection
//!
//! The first click anchors a corner, the second click completes the
//! selection. The completed rectangle is normalised so the clicks may come in
//! any order, and clamped to [`MIN_SELECTION_SIZE`].

use crate::domain::core::{MIN_SELECTION_SIZE, Point, Rect};

/// Errors that can occur during selection operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no selection has been started")]
    NoSelectionStarted,
    #[error("selection is already complete")]
    SelectionAlreadyComplete,
}

/// State of the current selection process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// No point has been chosen
    NoSelection,
    /// First corner has been clicked, waiting for the second
    FirstPointChosen { first: Point },
    /// Selection is complete with a normalised rectangle
    Complete { rect: Rect },
}

/// Tracks the two-click selection workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    state: SelectionState,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    /// Creates a new, empty selection
    ///
    /// # Example
    /// ```rust
    /// use screen_filter::domain::selection::Selection;
    ///
    /// let selection = Selection::new();
    /// assert!(selection.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            state: SelectionState::NoSelection,
        }
    }

    /// Creates an already completed selection, used when a saved
    /// rectangle is loaded
    pub fn completed(rect: Rect) -> Self {
        Self {
            state: SelectionState::Complete { rect },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, SelectionState::NoSelection)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.state, SelectionState::FirstPointChosen { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, SelectionState::Complete { .. })
    }

    /// Anchors the first corner
    pub fn start(&mut self, point: Point) -> Result<(), SelectionError> {
        if self.is_complete() {
            return Err(SelectionError::SelectionAlreadyComplete);
        }
        self.state = SelectionState::FirstPointChosen { first: point };
        Ok(())
    }

    /// Completes the selection with the second corner
    ///
    /// # Returns
    /// The normalised, size-clamped rectangle
    ///
    /// # Example
    /// ```rust
    /// use screen_filter::domain::core::{Point, Rect};
    /// use screen_filter::domain::selection::Selection;
    ///
    /// let mut selection = Selection::new();
    /// selection.start(Point::new(400, 300)).unwrap();
    /// let rect = selection.complete(Point::new(100, 50)).unwrap();
    /// assert_eq!(rect, Rect::new(100, 50, 400, 300));
    /// ```
    pub fn complete(&mut self, point: Point) -> Result<Rect, SelectionError> {
        let first = match self.state {
            SelectionState::FirstPointChosen { first } => first,
            SelectionState::NoSelection => return Err(SelectionError::NoSelectionStarted),
            SelectionState::Complete { .. } => return Err(SelectionError::SelectionAlreadyComplete),
        };

        let rect = Rect::from_points(first, point).with_min_size(MIN_SELECTION_SIZE);
        self.state = SelectionState::Complete { rect };
        Ok(rect)
    }

    /// Feeds a click into the workflow: first click starts, second completes
    pub fn add_point(&mut self, point: Point) -> Result<Option<Rect>, SelectionError> {
        match self.state {
            SelectionState::NoSelection => self.start(point).map(|_| None),
            SelectionState::FirstPointChosen { .. } => self.complete(point).map(Some),
            SelectionState::Complete { .. } => Err(SelectionError::SelectionAlreadyComplete),
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        match self.state {
            SelectionState::Complete { rect } => Some(rect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_selection_is_empty() {
        let selection = Selection::new();
        assert!(selection.is_empty());
        assert!(!selection.is_in_progress());
        assert!(!selection.is_complete());
        assert_eq!(selection.rect(), None);
    }

    #[test]
    fn two_clicks_complete_selection() {
        let mut selection = Selection::new();

        assert_eq!(selection.add_point(Point::new(500, 400)), Ok(None));
        assert!(selection.is_in_progress());
        assert_eq!(
            selection.state,
            SelectionState::FirstPointChosen {
                first: Point::new(500, 400)
            }
        );

        let rect = selection.add_point(Point::new(100, 200)).unwrap();
        assert_eq!(rect, Some(Rect::new(100, 200, 500, 400)));
        assert!(selection.is_complete());
    }

    #[test]
    fn small_selection_is_clamped() {
        let mut selection = Selection::new();
        selection.start(Point::new(10, 10)).unwrap();
        let rect = selection.complete(Point::new(20, 30)).unwrap();
        assert_eq!(rect, Rect::new(10, 10, 110, 110));
    }

    #[test]
    fn complete_without_start_fails() {
        let mut selection = Selection::new();
        let result = selection.complete(Point::new(0, 0));
        assert_eq!(result, Err(SelectionError::NoSelectionStarted));
    }

    #[test]
    fn clicks_after_completion_are_rejected() {
        let mut selection = Selection::completed(Rect::new(0, 0, 200, 200));
        assert_eq!(
            selection.add_point(Point::new(5, 5)),
            Err(SelectionError::SelectionAlreadyComplete)
        );
        assert_eq!(
            selection.start(Point::new(5, 5)),
            Err(SelectionError::SelectionAlreadyComplete)
        );
        assert_eq!(selection.rect(), Some(Rect::new(0, 0, 200, 200)));
    }
}
