//! Matching trees.
//!
//! Endpoints are grouped by [`order`](RouteEndpoint::order) and each group is
//! inserted into its own [`UrlMatchingTree`]. Nodes live in an arena and refer
//! to their children by [`NodeId`].
//!
//! Every node has one child map for literals and four single-child slots:
//!
//! ```text
//! node
//! ├── literals["products"]     literal segment (lower-cased key)
//! ├── constrained_parameters   {id:int}, and complex segments like {a}-{b}
//! ├── parameters               {id}
//! ├── constrained_catch_alls   {*path:nonfile}
//! └── catch_alls               {*path}
//! ```
//!
//! An endpoint is added as a match to the node where its template ends, and
//! also to every node from which all remaining segments may be absent. The
//! template `{controller}/{action=Index}/{id?}` is therefore a match at depths
//! 1, 2 and 3.

use crate::debug_log;
use crate::route::RouteEndpoint;
use crate::template::TemplatePart;
use crate::values::fold_case;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

/// One node of a matching tree.
#[derive(Debug, Default)]
pub struct UrlMatchingNode {
    /// Number of path segments consumed to reach this node.
    pub depth: usize,
    /// `true` for nodes reached through a catch-all slot.
    pub is_catch_all: bool,
    pub literals: HashMap<String, NodeId>,
    pub constrained_parameters: Option<NodeId>,
    pub parameters: Option<NodeId>,
    pub constrained_catch_alls: Option<NodeId>,
    pub catch_alls: Option<NodeId>,
    /// Candidate endpoints, most specific first.
    pub matches: Vec<Arc<RouteEndpoint>>,
}

#[derive(Clone, Copy)]
enum Slot {
    ConstrainedParameters,
    Parameters,
    ConstrainedCatchAlls,
    CatchAlls,
}

/// A matching tree for all endpoints sharing one order.
#[derive(Debug)]
pub struct UrlMatchingTree {
    order: i32,
    nodes: Vec<UrlMatchingNode>,
}

impl UrlMatchingTree {
    /// The root node's id.
    pub const ROOT: NodeId = 0;

    pub fn new(order: i32) -> Self {
        Self {
            order,
            nodes: vec![UrlMatchingNode::default()],
        }
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn node(&self, id: NodeId) -> &UrlMatchingNode {
        &self.nodes[id]
    }

    pub fn root(&self) -> &UrlMatchingNode {
        &self.nodes[Self::ROOT]
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.root().matches.is_empty()
    }

    /// Insert an endpoint. Call [`sort_matches`](Self::sort_matches) once all
    /// endpoints are inserted.
    pub fn insert(&mut self, endpoint: Arc<RouteEndpoint>) {
        let pattern = endpoint.pattern();
        let mut current = Self::ROOT;

        for (i, segment) in pattern.segments().iter().enumerate() {
            if !segment.is_simple() {
                // Complex segments are matched as an opaque unit.
                current = self.slot_child(current, Slot::ConstrainedParameters, false);
                continue;
            }

            match &segment.parts()[0] {
                TemplatePart::Literal(text) | TemplatePart::Separator(text) => {
                    current = self.literal_child(current, text);
                }
                TemplatePart::Parameter(parameter) => {
                    if pattern.remaining_segments_can_be_absent(i) {
                        self.add_match(current, &endpoint);
                    }
                    let slot = match (parameter.is_catch_all(), parameter.is_constrained()) {
                        (false, true) => Slot::ConstrainedParameters,
                        (false, false) => Slot::Parameters,
                        (true, true) => Slot::ConstrainedCatchAlls,
                        (true, false) => Slot::CatchAlls,
                    };
                    current = self.slot_child(current, slot, parameter.is_catch_all());
                }
            }
        }

        self.add_match(current, &endpoint);
    }

    /// Sort every node's matches by inbound precedence, then template text.
    pub fn sort_matches(&mut self) {
        for node in &mut self.nodes {
            node.matches.sort_by(|a, b| {
                a.inbound_precedence()
                    .cmp(b.inbound_precedence())
                    .then_with(|| a.template().cmp(b.template()))
            });
        }
    }

    fn add_match(&mut self, node: NodeId, endpoint: &Arc<RouteEndpoint>) {
        let matches = &mut self.nodes[node].matches;
        if !matches.iter().any(|m| m.id() == endpoint.id()) {
            matches.push(Arc::clone(endpoint));
        }
    }

    fn new_node(&mut self, parent: NodeId, is_catch_all: bool) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(UrlMatchingNode {
            depth: self.nodes[parent].depth + 1,
            is_catch_all,
            ..UrlMatchingNode::default()
        });
        id
    }

    fn literal_child(&mut self, parent: NodeId, text: &str) -> NodeId {
        let key = fold_case(text);
        if let Some(&id) = self.nodes[parent].literals.get(&key) {
            return id;
        }
        let id = self.new_node(parent, false);
        self.nodes[parent].literals.insert(key, id);
        id
    }

    fn slot_child(&mut self, parent: NodeId, slot: Slot, is_catch_all: bool) -> NodeId {
        let existing = {
            let node = &self.nodes[parent];
            match slot {
                Slot::ConstrainedParameters => node.constrained_parameters,
                Slot::Parameters => node.parameters,
                Slot::ConstrainedCatchAlls => node.constrained_catch_alls,
                Slot::CatchAlls => node.catch_alls,
            }
        };
        if let Some(id) = existing {
            return id;
        }

        let id = self.new_node(parent, is_catch_all);
        let node = &mut self.nodes[parent];
        let target = match slot {
            Slot::ConstrainedParameters => &mut node.constrained_parameters,
            Slot::Parameters => &mut node.parameters,
            Slot::ConstrainedCatchAlls => &mut node.constrained_catch_alls,
            Slot::CatchAlls => &mut node.catch_alls,
        };
        *target = Some(id);
        id
    }
}

/// Build one tree per distinct order, ascending.
pub fn build_trees(endpoints: &[Arc<RouteEndpoint>]) -> Vec<UrlMatchingTree> {
    let mut by_order: BTreeMap<i32, UrlMatchingTree> = BTreeMap::new();
    for endpoint in endpoints {
        by_order
            .entry(endpoint.order())
            .or_insert_with(|| UrlMatchingTree::new(endpoint.order()))
            .insert(Arc::clone(endpoint));
    }

    let mut trees: Vec<UrlMatchingTree> = by_order.into_values().collect();
    for tree in &mut trees {
        tree.sort_matches();
        debug_log!("Matching tree for order {} has {} nodes", tree.order(), tree.len());
    }
    trees
}
