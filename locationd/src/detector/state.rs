//! Last-published values, one slot per field group.

use crate::fix::{Accuracy, Course, FixMode, FixTime, Position, Satellite};

/// What listeners last heard for each group.
///
/// Starts with every slot unknown, so the first known value of any group
/// always differs. Each slot always equals the payload of the most recent
/// event of its group, or the initial sentinel if none was emitted.
#[derive(Debug, Clone)]
pub struct PublishedState {
    pub mode: FixMode,
    pub time: Option<FixTime>,
    pub position: Position,
    pub course: Course,
    pub accuracy: Accuracy,
    pub satellites: Vec<Satellite>,
}

impl PublishedState {
    pub fn new() -> Self {
        Self {
            mode: FixMode::NotSeen,
            time: None,
            position: Position::UNKNOWN,
            course: Course::UNKNOWN,
            accuracy: Accuracy::UNKNOWN,
            satellites: Vec::new(),
        }
    }
}

impl Default for PublishedState {
    fn default() -> Self {
        Self::new()
    }
}
