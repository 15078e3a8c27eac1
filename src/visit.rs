//! Structured traversal of a diagram for printers and exporters.
//!
//! [`Mdd::accept`] walks the diagram and hands every part to a [`Visitor`]:
//! first the diagram itself, then each layer top-down, and inside each layer
//! every node followed by its outgoing arcs. All callbacks default to no-ops,
//! so a visitor only implements what it needs. The traversal itself never
//! performs I/O.

use crate::error::Result;
use crate::layer::Layer;
use crate::mdd::{Diagram, Mdd};
use crate::node::{Node, OutArcs};
use crate::reference::{DiagramId, NodeId};
use crate::types::Level;

pub trait Visitor {
    fn visit_diagram(&mut self, _id: DiagramId, _diagram: &Diagram) {}
    fn visit_layer(&mut self, _level: Level, _layer: &Layer) {}
    fn visit_node(&mut self, _id: NodeId, _node: &Node) {}
    fn visit_out_arcs(&mut self, _id: NodeId, _arcs: &OutArcs) {}
}

impl Mdd {
    pub fn accept<V: Visitor + ?Sized>(&self, d: DiagramId, visitor: &mut V) -> Result<()> {
        let diagram = self.diagram(d)?;
        visitor.visit_diagram(d, diagram);
        for (i, layer) in diagram.layers().iter().enumerate() {
            visitor.visit_layer(Level::new(i), layer);
            for id in layer.iter() {
                let node = self.node(id)?;
                visitor.visit_node(id, node);
                visitor.visit_out_arcs(id, node.arcs());
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
    use crate::types::Label;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        arcs: Vec<(NodeId, Label, NodeId)>,
    }

    impl Visitor for Recorder {
        fn visit_diagram(&mut self, id: DiagramId, diagram: &Diagram) {
            self.events.push(format!("{} size={}", id, diagram.size()));
        }

        fn visit_layer(&mut self, level: Level, layer: &Layer) {
            self.events.push(format!("{} nodes={}", level, layer.len()));
        }

        fn visit_out_arcs(&mut self, id: NodeId, arcs: &OutArcs) {
            self.arcs
                .extend(arcs.iter().map(|(label, child)| (id, label, child)));
        }
    }

    #[test]
    fn test_accept_visits_everything() {
        let mut mdd = Mdd::new();
        let d = mdd.create_diagram(DiagramKind::Plain);
        mdd.set_size(d, 3).unwrap();
        mdd.add_path(d, &[0, 1]).unwrap();
        mdd.add_path(d, &[2, 1]).unwrap();
        mdd.reduce(d).unwrap();

        let mut recorder = Recorder::default();
        mdd.accept(d, &mut recorder).unwrap();

        assert_eq!(recorder.events.len(), 4);
        assert!(recorder.events[0].ends_with("size=3"));
        assert_eq!(recorder.events[1], "L0 nodes=1");
        assert_eq!(recorder.events[2], "L1 nodes=1");
        assert_eq!(recorder.events[3], "L2 nodes=1");
        assert_eq!(recorder.arcs.len(), 3);
        assert_eq!(recorder.arcs.len(), mdd.arc_count(d).unwrap());
    }
}
