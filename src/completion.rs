//! Completed-set tracking

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

/// Answers and flips "is set N of exercise E done?"
pub trait CompletionStore {
    fn is_completed(&self, exercise_id: &str, set_number: u32) -> bool;

    /// Flip a set and return its new state
    fn toggle(&mut self, exercise_id: &str, set_number: u32) -> bool;
}

/// In-memory completion state, lives for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionState {
    sets: HashMap<String, HashSet<u32>>,
}

impl CompletionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed_count(&self, exercise_id: &str) -> usize {
        self.sets.get(exercise_id).map_or(0, |s| s.len())
    }

    pub fn total_completed(&self) -> usize {
        self.sets.values().map(|s| s.len()).sum()
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.sets.clear();
    }
}

impl CompletionStore for CompletionState {
    fn is_completed(&self, exercise_id: &str, set_number: u32) -> bool {
        self.sets
            .get(exercise_id)
            .is_some_and(|s| s.contains(&set_number))
    }

    fn toggle(&mut self, exercise_id: &str, set_number: u32) -> bool {
        if set_number == 0 {
            warn!("Ignoring toggle of set 0 for {}", exercise_id);
            return false;
        }

        let sets = self.sets.entry(exercise_id.to_string()).or_default();
        let completed = if sets.remove(&set_number) {
            false
        } else {
            sets.insert(set_number);
            true
        };
        if sets.is_empty() {
            self.sets.remove(exercise_id);
        }

        debug!(
            "Set {} of {} {}",
            set_number,
            exercise_id,
            if completed { "completed" } else { "cleared" }
        );
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_on_and_off() {
        let mut state = CompletionState::new();
        assert!(state.toggle("squat", 1));
        assert!(state.is_completed("squat", 1));
        assert!(!state.toggle("squat", 1));
        assert!(!state.is_completed("squat", 1));
    }

    #[test]
    fn test_unknown_exercise_is_not_completed() {
        let state = CompletionState::new();
        assert!(!state.is_completed("bench", 1));
        assert_eq!(state.completed_count("bench"), 0);
    }

    #[test]
    fn test_sets_are_per_exercise() {
        let mut state = CompletionState::new();
        state.toggle("squat", 2);
        state.toggle("bench", 3);
        assert!(state.is_completed("squat", 2));
        assert!(!state.is_completed("squat", 3));
        assert_eq!(state.total_completed(), 2);
    }

    #[test]
    fn test_set_zero_is_rejected() {
        let mut state = CompletionState::new();
        assert!(!state.toggle("squat", 0));
        assert_eq!(state.total_completed(), 0);
    }

    #[test]
    fn test_set_beyond_count_is_tolerated() {
        let mut state = CompletionState::new();
        assert!(state.toggle("squat", 99));
        assert_eq!(state.completed_count("squat"), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = CompletionState::new();
        state.toggle("squat", 1);
        state.toggle("bench", 1);
        state.reset();
        assert_eq!(state.total_completed(), 0);
        assert_eq!(state, CompletionState::new());
    }
}
