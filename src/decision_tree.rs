//! Decision trees over key/value criteria.
//!
//! Each item carries a set of `(key, value)` criteria. The tree discriminates
//! on one key per level so that a lookup with a value set only visits the
//! branches those values select. Keys and values compare case-insensitively;
//! an empty value stands for "no value".
//!
//! ```text
//! root
//! ├── criterion "controller"
//! │   ├── "store" ─┬─ criterion "action"
//! │   │            │   └── "buy" → [Store/Buy route]
//! │   └── "home"  → [Home route]
//! └── matches: items without criteria
//! ```
//!
//! When a key is not supplied the walk follows the branch of the ambient
//! value, if any, and always the empty-value branch. Items reached through an
//! empty-value branch in that situation are reported as fallback matches.

use crate::values::{fold_case, RouteValues};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct DecisionTreeNode {
    matches: Vec<usize>,
    criteria: Vec<DecisionCriterion>,
}

#[derive(Debug)]
struct DecisionCriterion {
    key: String,
    branches: HashMap<String, DecisionTreeNode>,
}

/// An immutable decision tree over items of type `T`.
#[derive(Debug)]
pub struct DecisionTree<T> {
    items: Vec<T>,
    root: DecisionTreeNode,
}

/// An item reached by [`DecisionTree::walk`].
#[derive(Debug, Clone, Copy)]
pub struct DecisionMatch<'t, T> {
    pub item: &'t T,
    /// Reached through an empty-value branch for an unsupplied key.
    pub is_fallback: bool,
}

impl<T> DecisionTree<T> {
    /// Build a tree from items and their criteria.
    pub fn build(entries: Vec<(T, Vec<(String, String)>)>) -> Self {
        let mut items = Vec::with_capacity(entries.len());
        let mut criteria = Vec::with_capacity(entries.len());
        for (item, item_criteria) in entries {
            items.push(item);
            criteria.push(
                item_criteria
                    .into_iter()
                    .map(|(k, v)| (fold_case(&k), fold_case(&v)))
                    .collect::<Vec<_>>(),
            );
        }

        let mut builder = TreeBuilder {
            criteria: &criteria,
            used: Vec::new(),
            matched: HashSet::new(),
        };
        let root = builder.build_node((0..items.len()).collect());
        Self { items, root }
    }

    /// All items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Items whose criteria are satisfied by `values`, falling back to
    /// `ambient` for keys `values` does not contain.
    pub fn walk<'t>(&'t self, values: &RouteValues, ambient: Option<&RouteValues>) -> Vec<DecisionMatch<'t, T>> {
        let mut found = Vec::new();
        walk_node(&self.root, values, ambient, false, &mut found);
        found
            .into_iter()
            .map(|(index, is_fallback)| DecisionMatch {
                item: &self.items[index],
                is_fallback,
            })
            .collect()
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        fn depth_of(node: &DecisionTreeNode) -> usize {
            node.criteria
                .iter()
                .flat_map(|c| c.branches.values())
                .map(|child| 1 + depth_of(child))
                .max()
                .unwrap_or(0)
        }
        depth_of(&self.root)
    }
}

struct TreeBuilder<'c> {
    criteria: &'c [Vec<(String, String)>],
    /// Keys already discriminated on along the current path.
    used: Vec<String>,
    /// Items already placed; each item lands in exactly one node.
    matched: HashSet<usize>,
}

impl<'c> TreeBuilder<'c> {
    fn build_node(&mut self, indices: Vec<usize>) -> DecisionTreeNode {
        // key -> [(value, items)], both in first-seen order
        let mut grouped: Vec<(&'c str, Vec<(&'c str, Vec<usize>)>)> = Vec::new();
        let mut matches = Vec::new();

        let all_criteria = self.criteria;
        for index in indices {
            let mut has_unused = false;
            for (key, value) in &all_criteria[index] {
                if self.used.iter().any(|u| u == key) {
                    continue;
                }
                has_unused = true;

                let position = match grouped.iter().position(|entry| entry.0 == key.as_str()) {
                    Some(p) => p,
                    None => {
                        grouped.push((key.as_str(), Vec::new()));
                        grouped.len() - 1
                    }
                };
                let branches = &mut grouped[position].1;
                match branches.iter_mut().find(|entry| entry.0 == value.as_str()) {
                    Some(entry) => entry.1.push(index),
                    None => branches.push((value.as_str(), vec![index])),
                }
            }

            if !has_unused && self.matched.insert(index) {
                matches.push(index);
            }
        }

        let mut criteria = Vec::with_capacity(grouped.len());
        for (key, branches) in grouped {
            self.used.push(key.to_string());
            let mut children = HashMap::with_capacity(branches.len());
            for (value, items) in branches {
                children.insert(value.to_string(), self.build_node(items));
            }
            self.used.pop();
            criteria.push(DecisionCriterion {
                key: key.to_string(),
                branches: children,
            });
        }
        // Most discriminating criteria first; stable for equal counts.
        criteria.sort_by(|a, b| b.branches.len().cmp(&a.branches.len()));

        DecisionTreeNode { matches, criteria }
    }
}

fn walk_node(
    node: &DecisionTreeNode,
    values: &RouteValues,
    ambient: Option<&RouteValues>,
    is_fallback: bool,
    found: &mut Vec<(usize, bool)>,
) {
    found.extend(node.matches.iter().map(|&m| (m, is_fallback)));

    for criterion in &node.criteria {
        match values.get(&criterion.key) {
            Some(value) => {
                if let Some(branch) = criterion.branches.get(&fold_case(value)) {
                    walk_node(branch, values, ambient, is_fallback, found);
                }
            }
            None => {
                let ambient_value = ambient.and_then(|a| a.get_non_empty(&criterion.key));
                if let Some(branch) = ambient_value.and_then(|v| criterion.branches.get(&fold_case(v))) {
                    walk_node(branch, values, ambient, is_fallback, found);
                }
                if let Some(branch) = criterion.branches.get("") {
                    walk_node(branch, values, ambient, true, found);
                }
            }
        }
    }
}
