//! Logging facade used throughout the routing engine.
//!
//! Every diagnostic in the crate goes through the macros below, which forward
//! to the [`log`](https://docs.rs/log) crate or the
//! [`tracing`](https://docs.rs/tracing) crate depending on the enabled
//! feature. Enable at most one of the two. With neither enabled the macros
//! expand to nothing and routing carries no logging cost at all.
//!
//! | Feature    | Backend         | Default |
//! |------------|-----------------|---------|
//! | `log`      | `log` crate     | yes     |
//! | `tracing`  | `tracing` crate | no      |
//!
//! # Levels used by the engine
//!
//! - `trace_log!`: per-request detail (tree traversal, constraint rejections,
//!   policy narrowing, link candidates that failed to bind).
//! - `debug_log!`: router construction summaries.
//! - `warn_log!`: templates or policies rejected while building a router.
//!
//! ```ignore
//! use route_trie::{debug_log, trace_log};
//!
//! debug_log!("Built {} matching trees", trees.len());
//! trace_log!("Constraint '{}' rejected value for '{}'", token, key);
//! ```

/// Emit a **trace**-level message through the active backend.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Emit a **debug**-level message through the active backend.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Emit an **info**-level message through the active backend.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Emit a **warn**-level message through the active backend.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Emit an **error**-level message through the active backend.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}
