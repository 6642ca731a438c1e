//! Request matching.
//!
//! [`TreeMatcher`] walks the matching trees for a tokenized path and yields
//! every endpoint whose template matches the path and whose constraints
//! accept the extracted values.
//!
//! # Traversal
//!
//! Trees are visited in ascending order. Within a tree the walk is depth-first
//! with an explicit stack. At each node children are pushed as
//!
//! ```text
//! catch_alls, constrained_catch_alls, parameters, constrained_parameters, literal
//! ```
//!
//! so they are popped most specific first. A node is yielded when it is a
//! catch-all node with matches, or when the whole path is consumed and it has
//! matches. Nodes deeper than the path without matches prune their subtree.
//!
//! # Example
//!
//! ```
//! use route_trie::{Route, Router};
//!
//! let router = Router::builder()
//!     .route(Route::new("Customer/Index/{id}"))
//!     .route(Route::new("{controller}/{action}/{*parameters}"))
//!     .build()
//!     .unwrap();
//!
//! let m = router.match_path("/Customer/Index/5").unwrap();
//! assert_eq!(m.endpoint.template(), "Customer/Index/{id}");
//! assert_eq!(m.values.get("id"), Some("5"));
//! ```

use crate::constraints::RouteDirection;
use crate::route::RouteEndpoint;
use crate::template::{ParameterPart, RoutePattern, TemplatePart};
use crate::trace_log;
use crate::tree::{NodeId, UrlMatchingTree};
use crate::values::{fold_case, values_equal, RouteValues};
use std::sync::Arc;

/// An endpoint that matched a path, with the values extracted from it.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched endpoint.
    pub endpoint: Arc<RouteEndpoint>,
    /// Route values: captured parameters plus defaults.
    pub values: RouteValues,
}

/// Split a request path into segments.
///
/// The leading `/` and a single trailing `/` are ignored. Interior empty
/// segments are kept so that `a//b` cannot match a two-segment template.
///
/// ```
/// use route_trie::tokenize;
///
/// assert_eq!(tokenize("/a/b/"), vec!["a", "b"]);
/// assert_eq!(tokenize("/a//b"), vec!["a", "", "b"]);
/// assert!(tokenize("/").is_empty());
/// assert!(tokenize("").is_empty());
/// ```
pub fn tokenize(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

/// Read-only matcher over a set of trees sorted by order.
#[derive(Debug, Clone, Copy)]
pub struct TreeMatcher<'a> {
    trees: &'a [UrlMatchingTree],
}

impl<'a> TreeMatcher<'a> {
    pub fn new(trees: &'a [UrlMatchingTree]) -> Self {
        Self { trees }
    }

    /// Every endpoint matching `path`, in traversal order.
    pub fn candidates(&self, path: &'a str) -> Candidates<'a> {
        Candidates {
            trees: self.trees,
            segments: tokenize(path),
            tree_index: 0,
            stack: if self.trees.is_empty() {
                Vec::new()
            } else {
                vec![UrlMatchingTree::ROOT]
            },
            current: None,
        }
    }

    /// The first endpoint matching `path`.
    pub fn match_path(&self, path: &'a str) -> Option<RouteMatch> {
        self.candidates(path).next()
    }
}

/// Iterator over matching endpoints. See [`TreeMatcher::candidates`].
pub struct Candidates<'a> {
    trees: &'a [UrlMatchingTree],
    segments: Vec<&'a str>,
    tree_index: usize,
    stack: Vec<NodeId>,
    /// Node being drained and the index of its next match.
    current: Option<(NodeId, usize)>,
}

impl<'a> Candidates<'a> {
    /// The path segments being matched.
    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    fn next_node(&mut self) -> Option<NodeId> {
        let trees = self.trees;
        loop {
            let tree = trees.get(self.tree_index)?;

            while let Some(id) = self.stack.pop() {
                let node = tree.node(id);
                if node.is_catch_all && !node.matches.is_empty() {
                    return Some(id);
                }
                if node.depth >= self.segments.len() {
                    if !node.matches.is_empty() {
                        return Some(id);
                    }
                    continue;
                }

                let slots = [
                    node.catch_alls,
                    node.constrained_catch_alls,
                    node.parameters,
                    node.constrained_parameters,
                ];
                self.stack.extend(slots.into_iter().flatten());
                let segment = fold_case(&self.segments[node.depth]);
                if let Some(&literal) = node.literals.get(&segment) {
                    self.stack.push(literal);
                }
            }

            self.tree_index += 1;
            if self.tree_index < trees.len() {
                self.stack.push(UrlMatchingTree::ROOT);
            }
        }
    }
}

impl<'a> Iterator for Candidates<'a> {
    type Item = RouteMatch;

    fn next(&mut self) -> Option<RouteMatch> {
        loop {
            if let Some((node_id, index)) = self.current {
                let trees = self.trees;
                let node = trees[self.tree_index].node(node_id);
                if let Some(endpoint) = node.matches.get(index) {
                    self.current = Some((node_id, index + 1));
                    match match_values(endpoint.pattern(), &self.segments) {
                        Some(values)
                            if endpoint.matches_constraints(&values, RouteDirection::IncomingRequest) =>
                        {
                            return Some(RouteMatch {
                                endpoint: Arc::clone(endpoint),
                                values,
                            });
                        }
                        Some(_) => {}
                        None => {
                            trace_log!(
                                "Route '{}' reached but its segments did not match",
                                endpoint.display_name()
                            );
                        }
                    }
                    continue;
                }
                self.current = None;
            }

            let node_id = self.next_node()?;
            self.current = Some((node_id, 0));
        }
    }
}

// ============================================================================
// Value extraction
// ============================================================================

/// Match path segments against a pattern and extract route values.
///
/// Literals compare case-insensitively. A catch-all captures the remaining
/// segments joined with `/`. Defaults fill in absent parameters and are
/// added for non-parameter keys. Constraints are not evaluated.
pub fn match_values(pattern: &RoutePattern, segments: &[&str]) -> Option<RouteValues> {
    let mut values = RouteValues::new();
    let template = pattern.segments();

    for (i, segment) in template.iter().enumerate() {
        let request = segments.get(i).copied();

        if !segment.is_simple() {
            let request = request.filter(|s| !s.is_empty())?;
            if !match_complex_segment(segment.parts(), request, &mut values) {
                return None;
            }
            continue;
        }

        match &segment.parts()[0] {
            TemplatePart::Literal(text) | TemplatePart::Separator(text) => {
                if !request.is_some_and(|s| values_equal(s, text)) {
                    return None;
                }
            }
            TemplatePart::Parameter(p) if p.is_catch_all() => {
                if i < segments.len() {
                    let rest = segments[i..].join("/");
                    if !rest.is_empty() {
                        values.insert(p.name(), rest);
                    }
                }
                return Some(with_defaults(values, pattern));
            }
            TemplatePart::Parameter(p) => match request {
                Some("") => return None,
                Some(value) => {
                    values.insert(p.name(), value);
                }
                None if p.can_be_absent() => {}
                None => return None,
            },
        }
    }

    if segments.len() > template.len() {
        return None;
    }
    Some(with_defaults(values, pattern))
}

fn with_defaults(mut values: RouteValues, pattern: &RoutePattern) -> RouteValues {
    for (key, value) in pattern.defaults().iter() {
        if !values.contains_key(key) {
            values.insert(key, value);
        }
    }
    values
}

// ============================================================================
// Complex segments
// ============================================================================

/// Match a multi-part segment such as `{a}-{b}` or `{name}.{ext?}`.
///
/// Literals are located right to left using their last occurrence, so
/// `{a}-{b}` against `x-y-z` yields `a = x-y`, `b = z`. A trailing optional
/// parameter after a separator is first matched as present, then retried as
/// absent.
fn match_complex_segment(parts: &[TemplatePart], request: &str, values: &mut RouteValues) -> bool {
    let mut captured = Vec::new();

    if let [init @ .., TemplatePart::Separator(separator), TemplatePart::Parameter(last)] = parts {
        if last.is_optional() {
            if match_complex_core(parts, request, &mut captured) {
                commit(values, captured);
                return true;
            }
            // Retry without the separator and optional parameter.
            captured.clear();
            if request.ends_with(separator.as_str()) {
                return false;
            }
            if match_complex_core(init, request, &mut captured) {
                commit(values, captured);
                return true;
            }
            return false;
        }
    }

    if match_complex_core(parts, request, &mut captured) {
        commit(values, captured);
        return true;
    }
    false
}

fn commit(values: &mut RouteValues, captured: Vec<(&ParameterPart, &str)>) {
    for (parameter, value) in captured {
        values.insert(parameter.name(), value);
    }
}

fn match_complex_core<'p, 'r>(
    parts: &'p [TemplatePart],
    request: &'r str,
    captured: &mut Vec<(&'p ParameterPart, &'r str)>,
) -> bool {
    let Some(last_part) = parts.len().checked_sub(1) else {
        return request.is_empty();
    };

    let mut last_index = request.len();
    let mut pending: Option<&ParameterPart> = None;
    let mut last_literal: Option<&str> = None;

    for index in (0..parts.len()).rev() {
        let part = &parts[index];
        let mut new_last_index = last_index;

        match part {
            TemplatePart::Parameter(p) => pending = Some(p),
            TemplatePart::Literal(text) | TemplatePart::Separator(text) => {
                last_literal = Some(text.as_str());

                let mut start = last_index;
                if pending.is_some() {
                    // Leave at least one character for the pending parameter.
                    if start == 0 {
                        return false;
                    }
                    start = prev_char_boundary(request, start);
                }
                if start == 0 {
                    return false;
                }

                let Some(found) = rfind_ignore_case(&request[..start], text) else {
                    return false;
                };
                // A literal at the right edge must end the segment.
                if index == last_part && found + text.len() != request.len() {
                    return false;
                }
                new_last_index = found;
            }
        }

        if let Some(parameter) = pending {
            if (last_literal.is_some() && !part.is_parameter()) || index == 0 {
                let start = match last_literal {
                    Some(literal) if !part.is_parameter() => new_last_index + literal.len(),
                    _ => 0,
                };
                if start >= last_index {
                    return false;
                }
                captured.push((parameter, &request[start..last_index]));
                pending = None;
                last_literal = None;
            }
        }

        last_index = new_last_index;
    }

    last_index == 0 || parts[0].is_parameter()
}

fn prev_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index - 1;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn rfind_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let (hay, pin) = (haystack.as_bytes(), needle.as_bytes());
    if pin.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - pin.len())
        .rev()
        .find(|&i| {
            haystack.is_char_boundary(i)
                && haystack.is_char_boundary(i + pin.len())
                && values_equal(&haystack[i..i + pin.len()], needle)
        })
}
