//! Session state for the interaction controller
//!
//! Tracks whether a voice cycle is running and the collection being
//! traversed, with a cursor used by the next/previous commands:
//! (no collection) → read headers/links/main → cursor moves → reset

use crate::error::{Boundary, DomainError};
use crate::page::ContentElement;

/// Mutable state of one controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// True between the start of a voice cycle and its end
    pub is_interacting: bool,

    /// Last traversed collection, `None` before the first traversal
    pub elements: Option<Vec<ContentElement>>,

    /// Position inside `elements`, `None` when unset
    pub cursor: Option<usize>,
}

impl SessionState {
    /// Create the default state
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore every field to its default
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace the traversed collection; the cursor is cleared
    pub fn replace_elements(&mut self, elements: Vec<ContentElement>) {
        self.elements = Some(elements);
        self.cursor = None;
    }

    /// Number of elements in the collection
    pub fn element_count(&self) -> usize {
        self.elements.as_ref().map_or(0, Vec::len)
    }

    /// Element under the cursor
    pub fn current_element(&self) -> Option<&ContentElement> {
        let elements = self.elements.as_ref()?;
        elements.get(self.cursor?)
    }

    /// Element under the cursor, or the error a read would report
    pub fn require_current(&self) -> Result<&ContentElement, DomainError> {
        self.current_element().ok_or(DomainError::NoCurrentElement)
    }

    /// Move the cursor one step back
    pub fn move_previous(&mut self) -> Result<usize, DomainError> {
        if self.elements.is_none() {
            return Err(DomainError::NoCurrentElement);
        }
        match self.cursor {
            None => Err(DomainError::NoCurrentElement),
            Some(0) => Err(DomainError::BoundaryReached(Boundary::First)),
            Some(index) => {
                self.cursor = Some(index - 1);
                Ok(index - 1)
            }
        }
    }

    /// Move the cursor one step forward
    ///
    /// An unset cursor moves to the first element. An empty collection is
    /// already at its end.
    pub fn move_next(&mut self) -> Result<usize, DomainError> {
        let count = match &self.elements {
            None => return Err(DomainError::NoCurrentElement),
            Some(elements) => elements.len(),
        };
        let next = self.cursor.map_or(0, |index| index + 1);
        if next >= count {
            return Err(DomainError::BoundaryReached(Boundary::Last));
        }
        self.cursor = Some(next);
        Ok(next)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let activity = if self.is_interacting {
            "Interacting"
        } else {
            "Idle"
        };
        match (&self.elements, self.cursor) {
            (None, _) => write!(f, "{}", activity),
            (Some(elements), None) => write!(f, "{} ({} elements)", activity, elements.len()),
            (Some(elements), Some(cursor)) => {
                write!(f, "{} ({}/{})", activity, cursor + 1, elements.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<ContentElement> {
        vec![
            ContentElement::new(1, "h1", "Intro"),
            ContentElement::new(2, "h2", "Details"),
            ContentElement::new(3, "h2", "Contact"),
        ]
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = SessionState::new();
        assert!(!state.is_interacting);
        assert!(state.elements.is_none());
        assert!(state.cursor.is_none());
        assert!(state.current_element().is_none());
    }

    #[test]
    fn test_replace_clears_cursor() {
        let mut state = SessionState::new();
        state.replace_elements(headers());
        state.cursor = Some(2);

        state.replace_elements(vec![ContentElement::new(9, "a", "Home")]);
        assert_eq!(state.cursor, None);
        assert_eq!(state.element_count(), 1);
    }

    #[test]
    fn test_reset() {
        let mut state = SessionState::new();
        state.is_interacting = true;
        state.replace_elements(headers());
        state.cursor = Some(1);

        state.reset();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_previous_at_first_keeps_cursor() {
        let mut state = SessionState::new();
        state.replace_elements(headers());
        state.cursor = Some(0);

        assert_eq!(
            state.move_previous(),
            Err(DomainError::BoundaryReached(Boundary::First))
        );
        assert_eq!(state.cursor, Some(0));
    }

    #[test]
    fn test_next_at_last_keeps_cursor() {
        let mut state = SessionState::new();
        state.replace_elements(headers());
        state.cursor = Some(2);

        assert_eq!(
            state.move_next(),
            Err(DomainError::BoundaryReached(Boundary::Last))
        );
        assert_eq!(state.cursor, Some(2));
    }

    #[test]
    fn test_cursor_moves() {
        let mut state = SessionState::new();
        state.replace_elements(headers());

        assert_eq!(state.move_next(), Ok(0));
        assert_eq!(state.move_next(), Ok(1));
        assert_eq!(state.current_element().map(|e| e.text()), Some("Details"));
        assert_eq!(state.move_previous(), Ok(0));
        assert_eq!(state.current_element().map(|e| e.text()), Some("Intro"));
    }

    #[test]
    fn test_moves_without_collection() {
        let mut state = SessionState::new();
        assert_eq!(state.move_next(), Err(DomainError::NoCurrentElement));
        assert_eq!(state.move_previous(), Err(DomainError::NoCurrentElement));
        assert_eq!(state.require_current(), Err(DomainError::NoCurrentElement));
    }

    #[test]
    fn test_empty_collection_is_at_end() {
        let mut state = SessionState::new();
        state.replace_elements(vec![]);
        state.cursor = Some(0);

        assert_eq!(
            state.move_next(),
            Err(DomainError::BoundaryReached(Boundary::Last))
        );
        assert_eq!(state.require_current(), Err(DomainError::NoCurrentElement));
    }

    #[test]
    fn test_state_display() {
        let mut state = SessionState::new();
        assert_eq!(format!("{}", state), "Idle");

        state.is_interacting = true;
        state.replace_elements(headers());
        assert_eq!(format!("{}", state), "Interacting (3 elements)");

        state.cursor = Some(1);
        assert_eq!(format!("{}", state), "Interacting (2/3)");
    }
}
