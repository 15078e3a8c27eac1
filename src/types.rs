//! Scalar vocabulary shared by all diagram variants.
use std::fmt;

/// Value assigned to a variable on a layer transition.
pub type Label = i32;

/// Cost attached to an arc of a cost diagram.
pub type Cost = i64;

/// Depth of a layer in a diagram, as handed to a visitor. Level 0 holds
/// the root and the last level holds the terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    pub fn new(index: usize) -> Self {
        Level(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}
