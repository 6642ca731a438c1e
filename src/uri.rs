//! URI building.
//!
//! [`UriBuildingContext`] is the buffer link generation writes a path and
//! query string into. Segments whose value equals the template default are
//! held back and only written if a later non-default segment follows, so
//! trailing defaults are elided:
//!
//! ```
//! use route_trie::UriBuildingContext;
//!
//! let mut context = UriBuildingContext::new();
//! context.begin_segment(false);
//! context.append_literal("store");
//! context.begin_segment(true);
//! context.encode_value("Index", 0, 5, true, None);
//! assert_eq!(context.path(), "/store");
//!
//! context.begin_segment(false);
//! context.encode_value("a b", 0, 3, true, None);
//! assert_eq!(context.path(), "/store/Index/a%20b");
//! ```
//!
//! Contexts are reused through [`UriBuildingContextPool`]; a borrowed context
//! is cleared and returned when its guard drops.

use crate::constraints::ParameterTransformer;
use parking_lot::Mutex;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Characters escaped in path segments and query components: everything but
/// unreserved characters.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Reusable buffer for generated URLs.
#[derive(Debug, Default)]
pub struct UriBuildingContext {
    path: String,
    /// Defaultable segments not yet known to be needed.
    pending: String,
    buffering: bool,
    query: String,
}

impl UriBuildingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a path segment, writing its leading `/`.
    ///
    /// A defaultable segment is held back. A non-defaultable one first
    /// flushes every held-back segment.
    pub fn begin_segment(&mut self, defaultable: bool) {
        if defaultable {
            self.buffering = true;
            self.pending.push('/');
        } else {
            self.flush_pending();
            self.buffering = false;
            self.path.push('/');
        }
    }

    /// `true` if defaultable segments are currently held back.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            self.path.push_str(&self.pending);
            self.pending.clear();
        }
    }

    fn target(&mut self) -> &mut String {
        if self.buffering {
            &mut self.pending
        } else {
            &mut self.path
        }
    }

    /// Append literal template text verbatim.
    pub fn append_literal(&mut self, text: &str) {
        self.target().push_str(text);
    }

    /// Percent-encode `value[start..start + length]` into the current segment.
    ///
    /// The transformer, if any, is applied to the slice first. With
    /// `encode_slashes` false each `/`-separated piece is encoded on its own
    /// and the slashes are kept.
    pub fn encode_value(
        &mut self,
        value: &str,
        start: usize,
        length: usize,
        encode_slashes: bool,
        transformer: Option<&dyn ParameterTransformer>,
    ) {
        let end = start.saturating_add(length).min(value.len());
        let slice = value.get(start..end).unwrap_or("");

        let transformed;
        let text = match transformer {
            Some(t) => {
                transformed = t.transform_outbound(slice);
                transformed.as_str()
            }
            None => slice,
        };

        let target = self.target();
        if encode_slashes {
            target.extend(utf8_percent_encode(text, SEGMENT));
        } else {
            for (i, piece) in text.split('/').enumerate() {
                if i > 0 {
                    target.push('/');
                }
                target.extend(utf8_percent_encode(piece, SEGMENT));
            }
        }
    }

    /// Append `key=value` to the query string, encoding both.
    pub fn append_query(&mut self, key: &str, value: &str) {
        self.query.push(if self.query.is_empty() { '?' } else { '&' });
        self.query.extend(utf8_percent_encode(key, SEGMENT));
        self.query.push('=');
        self.query.extend(utf8_percent_encode(value, SEGMENT));
    }

    /// The path written so far, without held-back segments.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query string including its leading `?`, or empty.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Reset for reuse, keeping allocations.
    pub fn clear(&mut self) {
        self.path.clear();
        self.pending.clear();
        self.buffering = false;
        self.query.clear();
    }
}

impl fmt::Display for UriBuildingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.path.is_empty() { "/" } else { &self.path })?;
        f.write_str(&self.query)
    }
}

// ============================================================================
// Pool
// ============================================================================

/// Thread-safe pool of [`UriBuildingContext`] buffers.
#[derive(Debug)]
pub struct UriBuildingContextPool {
    contexts: Mutex<Vec<UriBuildingContext>>,
    capacity: usize,
}

impl UriBuildingContextPool {
    /// A pool retaining at most `capacity` idle contexts.
    pub fn new(capacity: usize) -> Self {
        Self {
            contexts: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Borrow a cleared context. It returns to the pool when dropped.
    pub fn get(&self) -> PooledUriBuildingContext<'_> {
        let context = self.contexts.lock().pop().unwrap_or_default();
        PooledUriBuildingContext {
            pool: self,
            context,
        }
    }

    /// Number of idle contexts.
    pub fn idle(&self) -> usize {
        self.contexts.lock().len()
    }

    fn put(&self, mut context: UriBuildingContext) {
        context.clear();
        let mut contexts = self.contexts.lock();
        if contexts.len() < self.capacity {
            contexts.push(context);
        }
    }
}

/// A context borrowed from a [`UriBuildingContextPool`].
pub struct PooledUriBuildingContext<'p> {
    pool: &'p UriBuildingContextPool,
    context: UriBuildingContext,
}

impl Deref for PooledUriBuildingContext<'_> {
    type Target = UriBuildingContext;

    fn deref(&self) -> &UriBuildingContext {
        &self.context
    }
}

impl DerefMut for PooledUriBuildingContext<'_> {
    fn deref_mut(&mut self) -> &mut UriBuildingContext {
        &mut self.context
    }
}

impl Drop for PooledUriBuildingContext<'_> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.context));
    }
}
