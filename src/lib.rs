//! # mdd-rs: Multi-valued Decision Diagrams in Rust
//!
//! **`mdd-rs`** is a manager-centric library for building, reducing and combining
//! **Multi-valued Decision Diagrams (MDDs)**, together with a small engine for
//! **stochastic cost filtering**.
//!
//! ## What is an MDD?
//!
//! An MDD is a layered, edge-labeled, directed acyclic graph. Layer 0 holds a single root,
//! the last layer holds the terminal `tt`, and every root-to-`tt` path spells out one
//! admissible assignment of the variables, one label per layer crossed.
//! After [reduction][crate::mdd::Mdd::reduce], no two nodes of a layer have the same outgoing arcs,
//! so equal sub-languages are stored once.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All operations go through the [`Mdd`][crate::mdd::Mdd] manager, which owns every node and diagram.
//! - **Pooled Storage**: Nodes and diagrams live in generational [arenas][crate::arena::Arena]. Freed slots are reused, and stale [handles][crate::reference] are detected.
//! - **Three Diagram Flavors**: plain diagrams, [cost diagrams][crate::cost] with an integer cost per arc, and [property diagrams][crate::property] carrying user-defined values propagated top-down.
//! - **Stochastic Filtering**: [`stochastic`] tightens per-variable quantity bounds against an aggregate cost budget using three independent algorithms.
//!
//! ## Basic Usage
//!
//! ```rust
//! use mdd_rs::mdd::{DiagramKind, Mdd};
//!
//! // 1. Initialize the manager
//! let mut mdd = Mdd::new();
//!
//! // 2. Create a diagram over 3 variables (4 layers)
//! let a = mdd.create_diagram(DiagramKind::Plain);
//! mdd.set_size(a, 4).unwrap();
//! mdd.add_path(a, &[0, 1, 2]).unwrap();
//! mdd.add_path(a, &[1, 1, 2]).unwrap();
//! mdd.reduce(a).unwrap();
//!
//! // Both paths share the suffix `1, 2`
//! assert_eq!(mdd.node_count(a).unwrap(), 4);
//!
//! // 3. Intersect with another diagram
//! let b = mdd.create_diagram(DiagramKind::Plain);
//! mdd.set_size(b, 4).unwrap();
//! mdd.add_path(b, &[1, 1, 2]).unwrap();
//! mdd.add_path(b, &[2, 2, 2]).unwrap();
//!
//! let c = mdd.intersection(a, b).unwrap();
//! mdd.reduce(c).unwrap();
//! let paths: Vec<_> = mdd.paths(c).unwrap().collect();
//! assert_eq!(paths, vec![vec![1, 1, 2]]);
//! ```
//!
//! ## Core Components
//!
//! - **[`mdd`]**: The [`Mdd`][crate::mdd::Mdd] manager, diagram construction and queries.
//! - **[`reduce`]** and **[`intersection`]**: canonicalization and product construction.
//! - **[`cost`]** and **[`property`]**: the cost and property extensions.
//! - **[`visit`]**: a [`Visitor`][crate::visit::Visitor] interface for printers and exporters.
//! - **[`stochastic`]**: quantity-bound filtering for discrete random variables.

pub mod arena;
pub mod cache;
pub mod cost;
pub mod error;
pub mod intersection;
pub mod layer;
pub mod mdd;
pub mod node;
pub mod paths;
pub mod property;
pub mod reduce;
pub mod reference;
pub mod stochastic;
pub mod types;
pub mod visit;
