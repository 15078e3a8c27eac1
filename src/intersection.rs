//! Intersection by product construction.

use log::debug;

use crate::cache::PairCache;
use crate::error::{MddError, Result};
use crate::mdd::{DiagramKind, Mdd};
use crate::reference::{DiagramId, NodeId};
use crate::types::Label;

impl Mdd {
    /// Build a new plain diagram accepting exactly the label sequences
    /// accepted by both `a` and `b`.
    ///
    /// Nodes of the result stand for pairs `(na, nb)` reachable together from
    /// the two roots; the pair of terminals is the result's terminal. The
    /// result may hold dead ends and is not reduced.
    pub fn intersection(&mut self, a: DiagramId, b: DiagramId) -> Result<DiagramId> {
        let size = self.size(a)?;
        let size_b = self.size(b)?;
        if size != size_b {
            return Err(MddError::SizeMismatch {
                left: size,
                right: size_b,
            });
        }
        let (ra, ta) = (self.root(a)?, self.tt(a)?);
        let (rb, tb) = (self.root(b)?, self.tt(b)?);
        debug!("intersection(a = {}, b = {}, size = {})", a, b, size);

        let result = self.create_diagram(DiagramKind::Plain);
        self.set_size(result, size)?;
        let root = self.root(result)?;
        let tt = self.tt(result)?;

        let pairs = self.node_count(a)?.saturating_mul(self.node_count(b)?);
        let mut cache = PairCache::with_limit(pairs, self.config().cache_bits);
        cache.seed((ra, rb), root);
        cache.seed((ta, tb), tt);

        let mut frontier = vec![(ra, rb, root)];
        for level in 1..size {
            let mut next = Vec::new();
            for (na, nb, node) in frontier {
                let arcs_a: Vec<(Label, NodeId)> = self.children(na)?.iter().collect();
                for (label, ca) in arcs_a {
                    let Some(cb) = self.children(nb)?.get(label) else {
                        continue;
                    };
                    let (child, created) = cache.get_or_insert_with((ca, cb), || -> Result<NodeId> {
                        let child = self.new_node(result)?;
                        self.add_node(result, child, level)?;
                        Ok(child)
                    })?;
                    if created {
                        next.push((ca, cb, child));
                    }
                    self.add_edge(node, label, child)?;
                }
            }
            frontier = next;
        }

        debug!(
            "intersection(a = {}, b = {}) -> {}: {} pairs, {} hits, {} misses",
            a,
            b,
            result,
            cache.len(),
            cache.hits(),
            cache.misses()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn build(mdd: &mut Mdd, size: usize, paths: &[&[Label]]) -> DiagramId {
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, size).unwrap();
        for path in paths {
            mdd.add_path(d, path).unwrap();
        }
        mdd.reduce(d).unwrap();
        d
    }

    #[test]
    fn test_intersection_common_paths() {
        let mut mdd = Mdd::new();
        let a = build(&mut mdd, 3, &[&[0, 0], &[0, 1], &[1, 1]]);
        let b = build(&mut mdd, 3, &[&[0, 1], &[1, 1], &[2, 2]]);

        let c = mdd.intersection(a, b).unwrap();
        mdd.reduce(c).unwrap();
        let mut paths: Vec<_> = mdd.paths(c).unwrap().collect();
        paths.sort();
        assert_eq!(paths, vec![vec![0, 1], vec![1, 1]]);
    }

    #[test]
    fn test_intersection_shares_pairs() {
        let mut mdd = Mdd::new();
        // Both diagrams reconverge after the first layer.
        let a = build(&mut mdd, 3, &[&[0, 5], &[1, 5]]);
        let b = build(&mut mdd, 3, &[&[0, 5], &[1, 5]]);

        let c = mdd.intersection(a, b).unwrap();
        assert_eq!(mdd.layer(c, 1).unwrap().len(), 1);
        assert_eq!(mdd.count_paths(c).unwrap(), 2u32.into());
    }

    #[test]
    fn test_intersection_with_empty() {
        let mut mdd = Mdd::new();
        let a = build(&mut mdd, 3, &[&[0, 1]]);
        let empty = build(&mut mdd, 3, &[]);

        let c = mdd.intersection(a, empty).unwrap();
        assert_eq!(mdd.count_paths(c).unwrap(), 0u32.into());
        assert_eq!(mdd.paths(c).unwrap().count(), 0);
    }

    #[test]
    fn test_intersection_disjoint() {
        let mut mdd = Mdd::new();
        let a = build(&mut mdd, 4, &[&[0, 1, 2]]);
        let b = build(&mut mdd, 4, &[&[0, 1, 3]]);

        let c = mdd.intersection(a, b).unwrap();
        assert_eq!(mdd.count_paths(c).unwrap(), 0u32.into());
        mdd.reduce(c).unwrap();
        assert_eq!(mdd.node_count(c).unwrap(), 2);
    }

    #[test]
    fn test_intersection_size_mismatch() {
        let mut mdd = Mdd::new();
        let a = build(&mut mdd, 3, &[&[0, 1]]);
        let b = build(&mut mdd, 4, &[&[0, 1, 2]]);
        assert_eq!(
            mdd.intersection(a, b),
            Err(MddError::SizeMismatch { left: 3, right: 4 })
        );
    }
}
