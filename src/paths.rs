//! Iterator over accepted label sequences of a diagram.
//!
//! # Example
//!
//! ```
//! use mdd_rs::mdd::{DiagramKind, Mdd};
//!
//! let mut mdd = Mdd::new();
//! let d = mdd.create_diagram(DiagramKind::Plain);
//! mdd.set_size(d, 3).unwrap();
//! mdd.add_path(d, &[0, 1]).unwrap();
//! mdd.add_path(d, &[2, 3]).unwrap();
//!
//! let paths: Vec<_> = mdd.paths(d).unwrap().collect();
//! assert_eq!(paths, vec![vec![0, 1], vec![2, 3]]);
//! ```
//!
//! Paths come out in lexicographic label order. The number of paths can be
//! exponential in the number of layers; use
//! [`Mdd::count_paths`][crate::mdd::Mdd::count_paths] when only the count is
//! needed.

use crate::error::Result;
use crate::mdd::Mdd;
use crate::reference::{DiagramId, NodeId};
use crate::types::Label;

impl Mdd {
    /// Returns an iterator over all root-to-terminal label sequences.
    pub fn paths(&self, d: DiagramId) -> Result<MddPaths<'_>> {
        let root = self.root(d)?;
        let tt = self.tt(d)?;
        Ok(MddPaths::new(self, root, tt))
    }
}

/// Frame on the exploration stack.
#[derive(Debug)]
struct StackFrame {
    /// Outgoing arcs of the node being explored.
    arcs: Vec<(Label, NodeId)>,
    /// Index of the next arc to follow.
    next: usize,
}

/// Depth-first iterator over accepted paths.
pub struct MddPaths<'a> {
    mdd: &'a Mdd,
    tt: NodeId,
    stack: Vec<StackFrame>,
    path: Vec<Label>,
}

impl<'a> MddPaths<'a> {
    fn new(mdd: &'a Mdd, root: NodeId, tt: NodeId) -> Self {
        let mut iter = Self {
            mdd,
            tt,
            stack: Vec::new(),
            path: Vec::new(),
        };
        iter.push(root);
        iter
    }

    fn push(&mut self, node: NodeId) -> bool {
        let arcs: Vec<(Label, NodeId)> = match self.mdd.children(node) {
            Ok(arcs) => arcs.iter().collect(),
            Err(_) => return false,
        };
        if arcs.is_empty() {
            return false;
        }
        self.stack.push(StackFrame { arcs, next: 0 });
        true
    }
}

impl Iterator for MddPaths<'_> {
    type Item = Vec<Label>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            if frame.next == frame.arcs.len() {
                self.stack.pop();
                self.path.pop();
                continue;
            }

            let (label, child) = frame.arcs[frame.next];
            frame.next += 1;
            self.path.push(label);

            if child == self.tt {
                let result = self.path.clone();
                self.path.pop();
                return Some(result);
            }
            if !self.push(child) {
                // Dead end.
                self.path.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::mdd::DiagramKind;

    #[test]
    fn test_paths_skip_dead_ends() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 4).unwrap();
        mdd.add_path(d, &[0, 0, 0]).unwrap();
        mdd.add_path(d, &[0, 1, 2]).unwrap();
        let root = mdd.root(d).unwrap();
        let dead = mdd.add_node_and_edge(d, root, 3, 1).unwrap();
        mdd.add_node_and_edge(d, dead, 3, 2).unwrap();

        let paths: Vec<_> = mdd.paths(d).unwrap().collect();
        assert_eq!(paths, vec![vec![0, 0, 0], vec![0, 1, 2]]);
    }

    #[test]
    fn test_paths_of_empty_diagram() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 3).unwrap();
        assert_eq!(mdd.paths(d).unwrap().count(), 0);
    }
}
