//! Property diagrams and forward propagation.
//!
//! A property is plain data implementing [`Property`]: `create` derives the
//! value a child receives through an arc with a given label, `merge` folds
//! another parent's contribution into a value the child already holds. With
//! these two operations, [`Mdd::propagate_properties`] is a generic forward
//! dynamic program over the diagram.
//!
//! Merge order is fixed: layers top-down, nodes in handle order, properties
//! in name order, arcs in ascending label order. Implementations whose
//! `merge` is associative and commutative get results independent of it.
//!
//! ```
//! use mdd_rs::mdd::{DiagramKind, Mdd};
//! use mdd_rs::property::{LabelSumRange, PropertyValue};
//!
//! let mut mdd = Mdd::new();
//! let d = mdd.create_diagram(DiagramKind::Property);
//! mdd.set_size(d, 3).unwrap();
//! mdd.add_path(d, &[1, 2]).unwrap();
//! mdd.add_path(d, &[4, 4]).unwrap();
//!
//! let root = mdd.root(d).unwrap();
//! mdd.set_property(root, "sum", PropertyValue::new(LabelSumRange::default())).unwrap();
//!
//! let result = mdd.propagate_properties(d).unwrap();
//! let sum = result["sum"].downcast_ref::<LabelSumRange>().unwrap();
//! assert_eq!((sum.min, sum.max), (3, 8));
//! ```

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use log::debug;
use num_bigint::BigUint;

use crate::error::{MddError, Result};
use crate::mdd::Mdd;
use crate::reference::{DiagramId, NodeId};
use crate::types::Label;

pub trait Property: Clone + Debug + 'static {
    /// Value received by a child through the arc labeled `label`.
    fn create(&self, label: Label) -> Self;

    /// Fold the contribution `parent` sends through `label` into `self`.
    fn merge(&mut self, label: Label, parent: &Self);
}

/// Object-safe face of [`Property`].
trait DynProperty: Debug {
    fn create_dyn(&self, label: Label) -> Box<dyn DynProperty>;
    fn merge_dyn(&mut self, label: Label, parent: &dyn DynProperty) -> bool;
    fn clone_dyn(&self) -> Box<dyn DynProperty>;
    fn as_any(&self) -> &dyn Any;
}

impl<P: Property> DynProperty for P {
    fn create_dyn(&self, label: Label) -> Box<dyn DynProperty> {
        Box::new(self.create(label))
    }

    fn merge_dyn(&mut self, label: Label, parent: &dyn DynProperty) -> bool {
        match parent.as_any().downcast_ref::<P>() {
            Some(parent) => {
                self.merge(label, parent);
                true
            }
            None => false,
        }
    }

    fn clone_dyn(&self) -> Box<dyn DynProperty> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased property value stored on a node.
#[derive(Debug)]
pub struct PropertyValue(Box<dyn DynProperty>);

impl PropertyValue {
    pub fn new<P: Property>(value: P) -> Self {
        Self(Box::new(value))
    }

    pub fn downcast_ref<P: Property>(&self) -> Option<&P> {
        self.0.as_any().downcast_ref::<P>()
    }

    pub fn create(&self, label: Label) -> Self {
        Self(self.0.create_dyn(label))
    }

    /// Returns `false` if `parent` holds a different concrete type.
    pub fn merge(&mut self, label: Label, parent: &PropertyValue) -> bool {
        self.0.merge_dyn(label, parent.0.as_ref())
    }

    fn concrete_type(&self) -> TypeId {
        self.0.as_any().type_id()
    }
}

impl Clone for PropertyValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_dyn())
    }
}

/// Property name -> value, per node.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Number of paths. Starts at 1 on the root; the terminal ends up with the
/// number of accepted paths.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PathCount(pub BigUint);

impl Default for PathCount {
    fn default() -> Self {
        Self(BigUint::from(1u32))
    }
}

impl Property for PathCount {
    fn create(&self, _label: Label) -> Self {
        self.clone()
    }

    fn merge(&mut self, _label: Label, parent: &Self) {
        self.0 += &parent.0;
    }
}

/// Smallest and largest sum of labels over the paths leading to a node.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct LabelSumRange {
    pub min: i64,
    pub max: i64,
}

impl Property for LabelSumRange {
    fn create(&self, label: Label) -> Self {
        Self {
            min: self.min + label as i64,
            max: self.max + label as i64,
        }
    }

    fn merge(&mut self, label: Label, parent: &Self) {
        self.min = self.min.min(parent.min + label as i64);
        self.max = self.max.max(parent.max + label as i64);
    }
}

impl Mdd {
    /// Attach a property value to a property node, replacing any previous one.
    pub fn set_property(&mut self, node: NodeId, name: &str, value: PropertyValue) -> Result<()> {
        self.node_mut(node)?
            .properties_mut()
            .ok_or(MddError::NotAPropertyNode(node))?
            .insert(name.to_string(), value);
        Ok(())
    }

    pub fn property(&self, node: NodeId, name: &str) -> Result<Option<&PropertyValue>> {
        Ok(self
            .node(node)?
            .properties()
            .ok_or(MddError::NotAPropertyNode(node))?
            .get(name))
    }

    /// Push every property from the root down to the terminal and return the
    /// terminal's accumulated map.
    ///
    /// A node's properties are cleared as soon as they have been handed to all
    /// of its children; the returned map is taken out of the terminal. Nodes
    /// and property types are checked first, so on error the diagram is left
    /// untouched.
    pub fn propagate_properties(&mut self, d: DiagramId) -> Result<PropertyMap> {
        let size = self.size(d)?;
        debug!("propagate_properties(d = {}, size = {})", d, size);
        self.check_property_types(d)?;

        let mut transfers = 0;
        for level in 0..size - 1 {
            for node in self.layer_nodes(d, level)? {
                let n = self.node_mut(node)?;
                let arcs: Vec<(Label, NodeId)> = n.arcs().iter().collect();
                let properties =
                    std::mem::take(n.properties_mut().ok_or(MddError::NotAPropertyNode(node))?);

                for (name, value) in properties {
                    for &(label, child) in &arcs {
                        let target = self
                            .node_mut(child)?
                            .properties_mut()
                            .ok_or(MddError::NotAPropertyNode(child))?;
                        match target.get_mut(&name) {
                            Some(existing) => {
                                if !existing.merge(label, &value) {
                                    return Err(MddError::PropertyTypeMismatch { name });
                                }
                            }
                            None => {
                                target.insert(name.clone(), value.create(label));
                            }
                        }
                        transfers += 1;
                    }
                }
            }
        }

        let tt = self.tt(d)?;
        let result = std::mem::take(
            self.node_mut(tt)?
                .properties_mut()
                .ok_or(MddError::NotAPropertyNode(tt))?,
        );
        debug!(
            "propagate_properties(d = {}): {} transfers, {} properties on tt",
            d,
            transfers,
            result.len()
        );
        Ok(result)
    }

    /// Dry run of propagation tracking only the concrete type under each
    /// name. Fails where propagation would meet two types under one name.
    fn check_property_types(&self, d: DiagramId) -> Result<()> {
        let size = self.size(d)?;
        let mut incoming: HashMap<NodeId, BTreeMap<&str, TypeId>> = HashMap::new();

        for level in 0..size {
            for node in self.layer_nodes(d, level)? {
                let n = self.node(node)?;
                let own = n.properties().ok_or(MddError::NotAPropertyNode(node))?;
                let mut types = incoming.remove(&node).unwrap_or_default();
                for (name, value) in own {
                    let ty = value.concrete_type();
                    if *types.entry(name.as_str()).or_insert(ty) != ty {
                        return Err(MddError::PropertyTypeMismatch { name: name.clone() });
                    }
                }

                for (_, child) in n.arcs().iter() {
                    let target = incoming.entry(child).or_default();
                    for (&name, &ty) in &types {
                        if *target.entry(name).or_insert(ty) != ty {
                            return Err(MddError::PropertyTypeMismatch {
                                name: name.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::mdd::DiagramKind;
    use crate::node::NodeKind;

    fn diagram(mdd: &mut Mdd, size: usize, paths: &[&[Label]]) -> DiagramId {
        let d = mdd.create_diagram(DiagramKind::Property);
        mdd.set_size(d, size).unwrap();
        for path in paths {
            mdd.add_path(d, path).unwrap();
        }
        d
    }

    #[test]
    fn test_path_count_matches_count_paths() {
        let mut mdd = Mdd::new();
        let d = diagram(
            &mut mdd,
            4,
            &[&[0, 1, 2], &[0, 2, 2], &[1, 1, 2], &[1, 1, 3], &[2, 0, 0]],
        );
        mdd.reduce(d).unwrap();
        let root = mdd.root(d).unwrap();
        mdd.set_property(root, "count", PropertyValue::new(PathCount::default()))
            .unwrap();

        let expected = mdd.count_paths(d).unwrap();
        let result = mdd.propagate_properties(d).unwrap();
        let count = result["count"].downcast_ref::<PathCount>().unwrap();
        assert_eq!(count.0, expected);
        assert_eq!(count.0, BigUint::from(5u32));
    }

    #[test]
    fn test_properties_cleared_after_transfer() {
        let mut mdd = Mdd::new();
        let d = diagram(&mut mdd, 3, &[&[1, 2]]);
        let root = mdd.root(d).unwrap();
        mdd.set_property(root, "sum", PropertyValue::new(LabelSumRange::default()))
            .unwrap();

        let result = mdd.propagate_properties(d).unwrap();
        assert!(mdd.property(root, "sum").unwrap().is_none());
        let mid = mdd.node(root).unwrap().child(1).unwrap();
        assert!(mdd.property(mid, "sum").unwrap().is_none());

        let sum = result["sum"].downcast_ref::<LabelSumRange>().unwrap();
        assert_eq!(*sum, LabelSumRange { min: 3, max: 3 });
        let tt = mdd.tt(d).unwrap();
        assert!(mdd.property(tt, "sum").unwrap().is_none());
    }

    #[test]
    fn test_same_parent_different_labels() {
        let mut mdd = Mdd::new();
        let d = diagram(&mut mdd, 2, &[&[1], &[5], &[7]]);
        let root = mdd.root(d).unwrap();
        mdd.set_property(root, "count", PropertyValue::new(PathCount::default()))
            .unwrap();
        mdd.set_property(root, "sum", PropertyValue::new(LabelSumRange::default()))
            .unwrap();

        let result = mdd.propagate_properties(d).unwrap();
        assert_eq!(
            result["count"].downcast_ref::<PathCount>().unwrap().0,
            BigUint::from(3u32)
        );
        assert_eq!(
            *result["sum"].downcast_ref::<LabelSumRange>().unwrap(),
            LabelSumRange { min: 1, max: 7 }
        );
    }

    #[test]
    fn test_type_mismatch() {
        let mut mdd = Mdd::new();
        let d = diagram(&mut mdd, 3, &[&[0, 0], &[1, 0]]);
        let root = mdd.root(d).unwrap();
        let left = mdd.node(root).unwrap().child(0).unwrap();
        mdd.set_property(root, "p", PropertyValue::new(PathCount::default()))
            .unwrap();
        mdd.set_property(left, "p", PropertyValue::new(LabelSumRange::default()))
            .unwrap();

        assert_eq!(
            mdd.propagate_properties(d).unwrap_err(),
            MddError::PropertyTypeMismatch {
                name: "p".to_string()
            }
        );

        // Nothing moved: both values are still where they were set.
        let at_root = mdd.property(root, "p").unwrap().unwrap();
        assert!(at_root.downcast_ref::<PathCount>().is_some());
        let at_left = mdd.property(left, "p").unwrap().unwrap();
        assert!(at_left.downcast_ref::<LabelSumRange>().is_some());
        let right = mdd.node(root).unwrap().child(1).unwrap();
        assert!(mdd.property(right, "p").unwrap().is_none());

        mdd.set_property(left, "p", PropertyValue::new(PathCount::default()))
            .unwrap();
        let result = mdd.propagate_properties(d).unwrap();
        assert_eq!(
            result["p"].downcast_ref::<PathCount>().unwrap().0,
            BigUint::from(3u32)
        );
    }

    #[test]
    fn test_plain_node_has_no_properties() {
        let mut mdd = Mdd::new();
        let node = mdd.allocate_node(NodeKind::Plain);
        assert_eq!(
            mdd.set_property(node, "p", PropertyValue::new(PathCount::default())),
            Err(MddError::NotAPropertyNode(node))
        );
    }
}
