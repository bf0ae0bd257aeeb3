//! Two-Slot History
//!
//! Holds the latest value and the one immediately before it. Pushing a new
//! value shifts `current` into `previous`; nothing older is ever kept.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct History<T> {
    current: Option<T>,
    previous: Option<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            current: None,
            previous: None,
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new value; the old current becomes previous
    pub fn push(&mut self, value: T) {
        self.previous = self.current.replace(value);
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&T> {
        self.previous.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

impl<T: Copy> History<T> {
    /// `(current, previous)` by value
    pub fn pair(&self) -> (Option<T>, Option<T>) {
        (self.current, self.previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let history: History<u32> = History::new();
        assert!(history.is_empty());
        assert_eq!(history.pair(), (None, None));
    }

    #[test]
    fn test_previous_is_one_push_behind() {
        let mut history = History::new();

        history.push(1);
        assert_eq!(history.pair(), (Some(1), None));

        history.push(2);
        assert_eq!(history.pair(), (Some(2), Some(1)));

        history.push(3);
        assert_eq!(history.current(), Some(&3));
        assert_eq!(history.previous(), Some(&2));
    }
}
