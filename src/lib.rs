//! # route-trie
//!
//! A URL routing engine built around route templates such as
//! `{controller=Home}/{action=Index}/{id:int?}`.
//!
//! - **Matching**: templates compile into trees keyed by literal segments.
//!   A request path walks the trees, the extracted values are checked by
//!   inline constraints, and the surviving candidates are narrowed by
//!   matcher policies (HTTP method, host, or your own) before the most
//!   specific route wins.
//! - **Link generation**: route values (supplied plus the ambient values of
//!   the current request) select candidate routes through a decision tree
//!   and are bound back into a path.
//!
//! ## Quick start
//!
//! ```
//! use route_trie::{Route, Router, RouteValues};
//!
//! let router = Router::builder()
//!     .route(Route::new("{controller=Home}/{action=Index}/{id:int?}").name("default"))
//!     .route(Route::new("files/{*path}"))
//!     .build()
//!     .unwrap();
//!
//! let current = router.match_path("/Products/Details/42").unwrap();
//! assert_eq!(current.values.get("controller"), Some("Products"));
//! assert_eq!(current.values.get("id"), Some("42"));
//!
//! let m = router.match_path("/").unwrap();
//! assert_eq!(m.values.get("action"), Some("Index"));
//!
//! let m = router.match_path("/files/a/b.txt").unwrap();
//! assert_eq!(m.values.get("path"), Some("a/b.txt"));
//!
//! // Changing the controller drops the ambient action and id.
//! let url = router
//!     .links()
//!     .get_path_by_name(
//!         "default",
//!         &RouteValues::from([("controller", "Cart"), ("id", "3")]),
//!         Some(&current.values),
//!     )
//!     .unwrap();
//! assert_eq!(url, "/Cart/Index/3");
//! ```
//!
//! ## Inline policies
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `int`, `long`, `bool`, `double`, `float`, `decimal`, `guid` | value parses as the type |
//! | `alpha`, `required` | letters only, non-empty |
//! | `min(n)`, `max(n)`, `range(a,b)` | integer bounds |
//! | `length(n)`, `length(a,b)`, `minlength(n)`, `maxlength(n)` | length bounds |
//! | `regex(expr)` | case-insensitive regular expression |
//! | `file`, `nonfile` | looks (or does not look) like a file name |
//! | `slugify` | outbound transformer, `MyPage` → `my-page` |
//!
//! More can be registered through [`RouteOptions::constraint`].
//!
//! ## Features
//!
//! | Feature   | Default | Purpose |
//! |-----------|---------|---------|
//! | `log`     | yes     | diagnostics through the `log` crate |
//! | `tracing` | no      | diagnostics through the `tracing` crate |
//! | `cache`   | yes     | [`RouteCache`], an LRU cache of routing outcomes |

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
pub mod logging;

pub mod constraints;
pub mod decision_tree;
pub mod error;
pub mod link;
pub mod matcher;
pub mod options;
pub mod precedence;
pub mod resolver;
pub mod route;
pub mod router;
pub mod selector;
pub mod template;
pub mod tree;
pub mod uri;
pub mod values;

#[cfg(feature = "cache")]
#[cfg_attr(docsrs, doc(cfg(feature = "cache")))]
pub mod cache;

pub use constraints::{
    constraint_fn, transformer_fn, ParameterPolicy, ParameterTransformer, RouteConstraint, RouteDirection,
};
pub use error::{
    BoxError, InvalidArgumentError, LinkError, PolicyError, RouteOutcome, RouterError, TemplateErrorKind,
    TemplateParseError,
};
pub use link::{LinkGenerationDecisionTree, LinkGenerator, OutboundMatchResult};
pub use matcher::{tokenize, RouteMatch, TreeMatcher};
pub use options::RouteOptions;
pub use precedence::Precedence;
pub use resolver::{parse_argument, ParameterPolicyResolver, PolicyFactory};
pub use route::{ResolvedPolicy, Route, RouteEndpoint};
pub use router::{Router, RouterBuilder};
pub use selector::{
    EndpointSelector, HostMatcherPolicy, HttpMethodMatcherPolicy, MatcherPolicy, PolicyEdge, PolicyJumpTable,
    PolicyJumpTableEdge, RouteRequest,
};
pub use template::{InlineConstraint, ParameterKind, ParameterPart, PathSegment, RoutePattern, TemplatePart};
pub use tree::{build_trees, UrlMatchingNode, UrlMatchingTree};
pub use uri::{UriBuildingContext, UriBuildingContextPool};
pub use values::RouteValues;

#[cfg(feature = "cache")]
pub use cache::{CacheStats, RouteCache};
