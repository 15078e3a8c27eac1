//! Memo table for pairwise diagram operations.
//!
//! A product construction builds one result node per pair of operand nodes
//! that can be reached together. [`PairCache`] maps each such pair to its
//! node and counts how often a pair comes back, so operations can report how
//! much sharing they found.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::reference::NodeId;

/// Pair of operand nodes, left operand first.
pub type NodePair = (NodeId, NodeId);

#[derive(Debug, Default)]
pub struct PairCache {
    map: HashMap<NodePair, NodeId>,
    hits: usize,
    misses: usize,
}

impl PairCache {
    /// Creates a cache for at most `pairs` entries, preallocating no more
    /// than `2^bits` of them.
    pub fn with_limit(pairs: usize, bits: usize) -> Self {
        let limit = 1usize.checked_shl(bits as u32).unwrap_or(usize::MAX);
        Self {
            map: HashMap::with_capacity(pairs.min(limit)),
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Records `node` for `pair` without counting a lookup.
    pub fn seed(&mut self, pair: NodePair, node: NodeId) {
        self.map.insert(pair, node);
    }

    /// Returns the node recorded for `pair`, building it with `make` on a
    /// miss. The flag is true when the node was just built. If `make` fails
    /// nothing is recorded.
    pub fn get_or_insert_with<E>(
        &mut self,
        pair: NodePair,
        make: impl FnOnce() -> Result<NodeId, E>,
    ) -> Result<(NodeId, bool), E> {
        match self.map.entry(pair) {
            Entry::Occupied(e) => {
                self.hits += 1;
                Ok((*e.get(), false))
            }
            Entry::Vacant(e) => {
                self.misses += 1;
                let node = make()?;
                e.insert(node);
                Ok((node, true))
            }
        }
    }
}
