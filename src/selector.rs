//! Endpoint selection and matcher policies.
//!
//! The matcher produces every endpoint whose template and constraints accept
//! the path. The [`EndpointSelector`] then narrows that set with a chain of
//! [`MatcherPolicy`] implementations and picks one endpoint.
//!
//! # Policies
//!
//! A policy looks at all endpoints once, when the router is built, and splits
//! them into **edges**: one per distinct state it cares about (an HTTP method,
//! a host pattern). It then builds a [`PolicyJumpTable`] that maps a request
//! to the edges it reaches. At request time each policy keeps only the
//! candidates present in one of those edges.
//!
//! | Policy | Order | State |
//! |--------|-------|-------|
//! | [`HttpMethodMatcherPolicy`] | -1000 | request method |
//! | [`HostMatcherPolicy`] | -100 | `Host` header |
//!
//! Policies run in ascending [`order`](MatcherPolicy::order). Endpoints that
//! carry no metadata for a policy stay reachable for every request.
//!
//! # Final pick
//!
//! After the last policy the surviving candidates are ranked by
//! `(order, inbound precedence)`, then by each policy's
//! [`compare`](MatcherPolicy::compare) in policy order. A single best
//! candidate is [`RouteOutcome::Matched`]; several tied ones are
//! [`RouteOutcome::Ambiguous`].

use crate::error::RouteOutcome;
use crate::matcher::RouteMatch;
use crate::route::RouteEndpoint;
use crate::values::RouteValues;
use crate::{debug_log, trace_log};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// RouteRequest
// ============================================================================

/// The parts of an incoming request the router looks at.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    path: String,
    method: String,
    host: Option<String>,
    headers: RouteValues,
}

impl RouteRequest {
    /// A `GET` request for `path` with no host.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: "GET".to_string(),
            host: None,
            headers: RouteValues::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    /// Set the `Host` header, e.g. `example.com:8080`.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add a header for custom policies. Names are case-insensitive.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}

// ============================================================================
// MatcherPolicy trait
// ============================================================================

/// A group of endpoints sharing one policy state.
#[derive(Debug, Clone)]
pub struct PolicyEdge {
    pub state: String,
    pub endpoints: Vec<Arc<RouteEndpoint>>,
}

/// An edge's state and the index the jump table must return for it.
#[derive(Debug, Clone)]
pub struct PolicyJumpTableEdge {
    pub state: String,
    pub destination: usize,
}

/// Maps a request to an edge index.
pub trait PolicyJumpTable: Send + Sync {
    /// The destination of the edge `request` belongs to, or the `exit`
    /// index passed to [`MatcherPolicy::build_jump_table`] when none fits.
    fn destination(&self, request: &RouteRequest) -> usize;

    /// Every edge `request` reaches. Candidates in any of them survive.
    fn destinations(&self, request: &RouteRequest) -> Vec<usize> {
        vec![self.destination(request)]
    }
}

/// A narrowing step applied to matched candidates.
///
/// # Example
///
/// A policy routing on a tenant header:
///
/// ```
/// use route_trie::{
///     MatcherPolicy, PolicyEdge, PolicyJumpTable, PolicyJumpTableEdge, RouteEndpoint,
///     RouteRequest,
/// };
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// struct TenantPolicy;
///
/// struct TenantTable {
///     destinations: HashMap<String, usize>,
///     exit: usize,
/// }
///
/// impl PolicyJumpTable for TenantTable {
///     fn destination(&self, request: &RouteRequest) -> usize {
///         request
///             .header("x-tenant")
///             .and_then(|t| self.destinations.get(t).copied())
///             .unwrap_or(self.exit)
///     }
/// }
///
/// impl MatcherPolicy for TenantPolicy {
///     fn order(&self) -> i32 {
///         0
///     }
///
///     fn applies_to(&self, endpoints: &[Arc<RouteEndpoint>]) -> bool {
///         endpoints.iter().any(|e| e.metadata("tenant").is_some())
///     }
///
///     fn edges(&self, endpoints: &[Arc<RouteEndpoint>]) -> Vec<PolicyEdge> {
///         let mut by_tenant: HashMap<String, Vec<Arc<RouteEndpoint>>> = HashMap::new();
///         for e in endpoints {
///             if let Some(tenant) = e.metadata("tenant") {
///                 by_tenant.entry(tenant.to_string()).or_default().push(e.clone());
///             }
///         }
///         by_tenant
///             .into_iter()
///             .map(|(state, endpoints)| PolicyEdge { state, endpoints })
///             .collect()
///     }
///
///     fn build_jump_table(&self, exit: usize, edges: &[PolicyJumpTableEdge]) -> Box<dyn PolicyJumpTable> {
///         let destinations = edges.iter().map(|e| (e.state.clone(), e.destination)).collect();
///         Box::new(TenantTable { destinations, exit })
///     }
/// }
/// ```
pub trait MatcherPolicy: Send + Sync + 'static {
    /// Policy name for diagnostics.
    fn name(&self) -> &'static str {
        "MatcherPolicy"
    }

    /// Lower runs first.
    fn order(&self) -> i32;

    /// Whether this policy has anything to say about this endpoint set.
    fn applies_to(&self, endpoints: &[Arc<RouteEndpoint>]) -> bool;

    /// Partition `endpoints` by state. An endpoint may appear in many edges.
    fn edges(&self, endpoints: &[Arc<RouteEndpoint>]) -> Vec<PolicyEdge>;

    /// Build the request-to-edge lookup. `exit` means "no edge".
    fn build_jump_table(&self, exit: usize, edges: &[PolicyJumpTableEdge]) -> Box<dyn PolicyJumpTable>;

    /// Outcome to report when this policy rejected every candidate.
    /// `None` reports [`RouteOutcome::NotFound`].
    fn on_exhausted(&self, rejected: &[Arc<RouteEndpoint>]) -> Option<RouteOutcome> {
        let _ = rejected;
        None
    }

    /// Rank two surviving endpoints that tie on order and precedence.
    /// `Less` prefers `a`. The default has no preference.
    fn compare(&self, request: &RouteRequest, a: &RouteEndpoint, b: &RouteEndpoint) -> Ordering {
        let _ = (request, a, b);
        Ordering::Equal
    }
}

// ============================================================================
// HTTP method policy
// ============================================================================

/// Narrows candidates by HTTP method.
///
/// When a path matches but no candidate accepts the method the outcome is
/// [`RouteOutcome::MethodNotAllowed`] listing the methods that would have
/// been accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpMethodMatcherPolicy;

impl HttpMethodMatcherPolicy {
    /// State of the edge holding endpoints that accept any method.
    pub const ANY_METHOD: &'static str = "*";
}

struct HttpMethodJumpTable {
    destinations: HashMap<String, usize>,
    any: usize,
}

impl PolicyJumpTable for HttpMethodJumpTable {
    fn destination(&self, request: &RouteRequest) -> usize {
        self.destinations
            .get(&request.method().to_ascii_uppercase())
            .copied()
            .unwrap_or(self.any)
    }
}

impl MatcherPolicy for HttpMethodMatcherPolicy {
    fn name(&self) -> &'static str {
        "HttpMethodMatcherPolicy"
    }

    fn order(&self) -> i32 {
        -1000
    }

    fn applies_to(&self, endpoints: &[Arc<RouteEndpoint>]) -> bool {
        endpoints.iter().any(|e| !e.http_methods().is_empty())
    }

    fn edges(&self, endpoints: &[Arc<RouteEndpoint>]) -> Vec<PolicyEdge> {
        let methods: BTreeSet<&str> = endpoints
            .iter()
            .flat_map(|e| e.http_methods().iter().map(String::as_str))
            .collect();
        let any: Vec<Arc<RouteEndpoint>> = endpoints
            .iter()
            .filter(|e| e.http_methods().is_empty())
            .cloned()
            .collect();

        let mut edges: Vec<PolicyEdge> = methods
            .into_iter()
            .map(|method| PolicyEdge {
                state: method.to_string(),
                endpoints: endpoints
                    .iter()
                    .filter(|e| e.http_methods().is_empty() || e.http_methods().iter().any(|m| m == method))
                    .cloned()
                    .collect(),
            })
            .collect();
        edges.push(PolicyEdge {
            state: Self::ANY_METHOD.to_string(),
            endpoints: any,
        });
        edges
    }

    fn build_jump_table(&self, exit: usize, edges: &[PolicyJumpTableEdge]) -> Box<dyn PolicyJumpTable> {
        let mut destinations = HashMap::new();
        let mut any = exit;
        for edge in edges {
            if edge.state == Self::ANY_METHOD {
                any = edge.destination;
            } else {
                destinations.insert(edge.state.to_ascii_uppercase(), edge.destination);
            }
        }
        Box::new(HttpMethodJumpTable { destinations, any })
    }

    fn on_exhausted(&self, rejected: &[Arc<RouteEndpoint>]) -> Option<RouteOutcome> {
        let allowed: BTreeSet<&str> = rejected
            .iter()
            .flat_map(|e| e.http_methods().iter().map(String::as_str))
            .collect();
        if allowed.is_empty() {
            return None;
        }
        Some(RouteOutcome::MethodNotAllowed {
            allowed_methods: allowed.into_iter().map(str::to_string).collect(),
        })
    }

    /// Endpoints that name the method beat endpoints accepting any method.
    fn compare(&self, _request: &RouteRequest, a: &RouteEndpoint, b: &RouteEndpoint) -> Ordering {
        a.http_methods().is_empty().cmp(&b.http_methods().is_empty())
    }
}

// ============================================================================
// Host policy
// ============================================================================

/// Narrows candidates by the request's `Host`.
///
/// Host patterns are `example.com`, `*.example.com` (subdomains only) or `*`,
/// each optionally followed by `:port` or `:*`. Every candidate with a
/// pattern accepting the request survives, along with candidates that name no
/// host. Among those the most specific matching pattern wins: exact hosts
/// before suffix wildcards before `*`, a concrete port before any port, and
/// any pattern before no pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMatcherPolicy;

impl HostMatcherPolicy {
    /// State of the edge holding endpoints that accept any host.
    pub const ANY_HOST: &'static str = "*:*";
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostKind {
    Exact(String),
    /// Stored with its leading dot, e.g. `.example.com`.
    Suffix(String),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HostPattern {
    host: HostKind,
    port: Option<u16>,
}

impl HostPattern {
    fn parse(pattern: &str) -> Self {
        let (host, port) = split_host_port(pattern.trim());
        let host = host.to_ascii_lowercase();
        let host = if host.is_empty() || host == "*" {
            HostKind::Any
        } else if let Some(suffix) = host.strip_prefix('*') {
            HostKind::Suffix(suffix.to_string())
        } else {
            HostKind::Exact(host)
        };
        let port = port.and_then(|p| p.parse().ok());
        Self { host, port }
    }

    fn state(&self) -> String {
        let host = match &self.host {
            HostKind::Exact(h) => h.clone(),
            HostKind::Suffix(s) => format!("*{}", s),
            HostKind::Any => "*".to_string(),
        };
        match self.port {
            Some(port) => format!("{}:{}", host, port),
            None => format!("{}:*", host),
        }
    }

    /// Sort key: lower is more specific.
    fn specificity(&self) -> HostSpecificity {
        let (rank, len) = match &self.host {
            HostKind::Exact(h) => (0, h.len()),
            HostKind::Suffix(s) => (1, s.len()),
            HostKind::Any => (2, 0),
        };
        (rank, u8::from(self.port.is_none()), Reverse(len))
    }

    fn matches(&self, host: &str, port: Option<u16>) -> bool {
        let host_ok = match &self.host {
            HostKind::Any => true,
            HostKind::Exact(h) => h.eq_ignore_ascii_case(host),
            HostKind::Suffix(s) => {
                host.len() > s.len()
                    && host.is_char_boundary(host.len() - s.len())
                    && host[host.len() - s.len()..].eq_ignore_ascii_case(s)
            }
        };
        host_ok && self.port.map_or(true, |p| port == Some(p))
    }

    /// Like [`matches`](Self::matches), but a request without a host only
    /// reaches `*` patterns.
    fn accepts(&self, host: &str, port: Option<u16>) -> bool {
        (!host.is_empty() || self.host == HostKind::Any) && self.matches(host, port)
    }
}

type HostSpecificity = (u8, u8, Reverse<usize>);

/// Ranks endpoints that name no host after every pattern.
const NO_HOST: HostSpecificity = (3, 1, Reverse(0));

fn request_host(request: &RouteRequest) -> (&str, Option<u16>) {
    match request.host() {
        Some(value) => {
            let (host, port) = split_host_port(value);
            (host, port.and_then(|p| p.parse().ok()))
        }
        None => ("", None),
    }
}

/// The most specific of `endpoint`'s patterns that accepts the request.
fn endpoint_host_rank(endpoint: &RouteEndpoint, host: &str, port: Option<u16>) -> HostSpecificity {
    endpoint
        .hosts()
        .iter()
        .map(|h| HostPattern::parse(h.as_str()))
        .filter(|pattern| pattern.accepts(host, port))
        .map(|pattern| pattern.specificity())
        .min()
        .unwrap_or(NO_HOST)
}

/// Split `host[:port]`, accepting bracketed IPv6 literals.
fn split_host_port(value: &str) -> (&str, Option<&str>) {
    if let Some(rest) = value.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            return (host, tail.strip_prefix(':').filter(|p| !p.is_empty()));
        }
    }
    match value.rsplit_once(':') {
        Some((host, port)) if port == "*" || port.bytes().all(|b| b.is_ascii_digit()) => {
            (host, Some(port).filter(|p| !p.is_empty()))
        }
        _ => (value, None),
    }
}

struct HostJumpTable {
    patterns: Vec<(HostPattern, usize)>,
    exit: usize,
}

impl PolicyJumpTable for HostJumpTable {
    fn destination(&self, request: &RouteRequest) -> usize {
        self.destinations(request).first().copied().unwrap_or(self.exit)
    }

    fn destinations(&self, request: &RouteRequest) -> Vec<usize> {
        let (host, port) = request_host(request);
        self.patterns
            .iter()
            .filter(|(pattern, _)| pattern.accepts(host, port))
            .map(|(_, destination)| *destination)
            .collect()
    }
}

impl MatcherPolicy for HostMatcherPolicy {
    fn name(&self) -> &'static str {
        "HostMatcherPolicy"
    }

    fn order(&self) -> i32 {
        -100
    }

    fn applies_to(&self, endpoints: &[Arc<RouteEndpoint>]) -> bool {
        endpoints.iter().any(|e| !e.hosts().is_empty())
    }

    /// One edge per distinct pattern. Host-less endpoints join the `*:*`
    /// edge, which every request with a host reaches.
    fn edges(&self, endpoints: &[Arc<RouteEndpoint>]) -> Vec<PolicyEdge> {
        let mut edges: Vec<PolicyEdge> = vec![PolicyEdge {
            state: Self::ANY_HOST.to_string(),
            endpoints: endpoints
                .iter()
                .filter(|e| e.hosts().is_empty())
                .cloned()
                .collect(),
        }];
        for endpoint in endpoints {
            for host in endpoint.hosts() {
                let state = HostPattern::parse(host).state();
                match edges.iter_mut().find(|e| e.state == state) {
                    Some(edge) => edge.endpoints.push(Arc::clone(endpoint)),
                    None => edges.push(PolicyEdge {
                        state,
                        endpoints: vec![Arc::clone(endpoint)],
                    }),
                }
            }
        }
        edges
    }

    fn build_jump_table(&self, exit: usize, edges: &[PolicyJumpTableEdge]) -> Box<dyn PolicyJumpTable> {
        let mut patterns: Vec<(HostPattern, usize)> = edges
            .iter()
            .map(|e| (HostPattern::parse(&e.state), e.destination))
            .collect();
        patterns.sort_by_key(|(pattern, _)| pattern.specificity());
        Box::new(HostJumpTable { patterns, exit })
    }

    fn compare(&self, request: &RouteRequest, a: &RouteEndpoint, b: &RouteEndpoint) -> Ordering {
        let (host, port) = request_host(request);
        endpoint_host_rank(a, host, port).cmp(&endpoint_host_rank(b, host, port))
    }
}

// ============================================================================
// EndpointSelector
// ============================================================================

struct CompiledPolicy {
    policy: Arc<dyn MatcherPolicy>,
    /// Sorted endpoint ids per edge.
    edges: Vec<Vec<usize>>,
    table: Box<dyn PolicyJumpTable>,
}

/// Applies the policy chain to matched candidates and picks the winner.
pub struct EndpointSelector {
    policies: Vec<CompiledPolicy>,
}

impl EndpointSelector {
    /// Compile `policies` against the full endpoint set. Policies that do not
    /// apply to any endpoint are dropped.
    pub fn new(policies: &[Arc<dyn MatcherPolicy>], endpoints: &[Arc<RouteEndpoint>]) -> Self {
        let mut sorted: Vec<Arc<dyn MatcherPolicy>> = policies.to_vec();
        sorted.sort_by_key(|p| p.order());

        let mut compiled = Vec::new();
        for policy in sorted {
            if !policy.applies_to(endpoints) {
                continue;
            }
            let edges = policy.edges(endpoints);
            let jump_edges: Vec<PolicyJumpTableEdge> = edges
                .iter()
                .enumerate()
                .map(|(destination, edge)| PolicyJumpTableEdge {
                    state: edge.state.clone(),
                    destination,
                })
                .collect();
            let table = policy.build_jump_table(edges.len(), &jump_edges);
            let edges: Vec<Vec<usize>> = edges
                .into_iter()
                .map(|edge| {
                    let mut ids: Vec<usize> = edge.endpoints.iter().map(|e| e.id()).collect();
                    ids.sort_unstable();
                    ids.dedup();
                    ids
                })
                .collect();

            debug_log!("Policy '{}' compiled with {} edges", policy.name(), edges.len());
            compiled.push(CompiledPolicy {
                policy,
                edges,
                table,
            });
        }

        Self { policies: compiled }
    }

    /// Names of the policies that will run, in order.
    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.policy.name()).collect()
    }

    /// Narrow `candidates` and pick one.
    pub fn select(&self, mut candidates: Vec<RouteMatch>, request: &RouteRequest) -> RouteOutcome {
        if candidates.is_empty() {
            return RouteOutcome::NotFound;
        }

        for compiled in &self.policies {
            let allowed: Vec<&[usize]> = compiled
                .table
                .destinations(request)
                .into_iter()
                .filter_map(|d| compiled.edges.get(d).map(Vec::as_slice))
                .collect();

            let (kept, rejected): (Vec<RouteMatch>, Vec<RouteMatch>) = candidates
                .into_iter()
                .partition(|c| allowed.iter().any(|ids| ids.binary_search(&c.endpoint.id()).is_ok()));
            trace_log!(
                "Policy '{}' kept {} of {} candidates",
                compiled.policy.name(),
                kept.len(),
                kept.len() + rejected.len()
            );

            if kept.is_empty() {
                let rejected: Vec<Arc<RouteEndpoint>> =
                    rejected.into_iter().map(|c| c.endpoint).collect();
                return compiled
                    .policy
                    .on_exhausted(&rejected)
                    .unwrap_or(RouteOutcome::NotFound);
            }
            candidates = kept;
        }

        self.pick_best(candidates, request)
    }

    fn pick_best(&self, candidates: Vec<RouteMatch>, request: &RouteRequest) -> RouteOutcome {
        let Some(best) = candidates
            .iter()
            .map(|c| (c.endpoint.order(), c.endpoint.inbound_precedence().clone()))
            .min()
        else {
            return RouteOutcome::NotFound;
        };

        let mut winners: Vec<RouteMatch> = candidates
            .into_iter()
            .filter(|c| c.endpoint.order() == best.0 && *c.endpoint.inbound_precedence() == best.1)
            .collect();

        // Policies break the remaining ties, first policy first.
        for compiled in &self.policies {
            if winners.len() < 2 {
                break;
            }
            let policy = &compiled.policy;
            let leader = winners
                .iter()
                .map(|c| &c.endpoint)
                .reduce(|leader, e| {
                    if policy.compare(request, e, leader) == Ordering::Less {
                        e
                    } else {
                        leader
                    }
                })
                .map(Arc::clone);
            if let Some(leader) = leader {
                winners.retain(|c| policy.compare(request, &c.endpoint, &leader) != Ordering::Greater);
            }
        }

        if winners.len() == 1 {
            if let Some(winner) = winners.pop() {
                return RouteOutcome::Matched(winner);
            }
        }
        trace_log!("{} candidates tied for '{}'", winners.len(), request.path());
        RouteOutcome::Ambiguous {
            candidates: winners.into_iter().map(|c| c.endpoint).collect(),
        }
    }
}

impl fmt::Debug for EndpointSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointSelector")
            .field("policies", &self.policy_names())
            .finish()
    }
}
