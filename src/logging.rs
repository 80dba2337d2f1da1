//! # Observability & Tracing
//!
//! Every store operation emits structured `tracing` events; [`setup_tracing`]
//! installs a subscriber that prints them.
//!
//! ## Configuration
//!
//! The subscriber uses a compact format without the module prefix
//! (`with_target(false)`). Each event carries a `model` field instead, and the
//! level is taken from `RUST_LOG`.
//!
//! ```bash
//! # Cache changes and failed requests
//! RUST_LOG=info cargo run -p remodel-sample
//!
//! # Every request with its method and URL
//! RUST_LOG=debug cargo run -p remodel-sample
//!
//! # Only the HTTP layer
//! RUST_LOG=remodel::api=debug cargo run -p remodel-sample
//! ```
//!
//! ## What Gets Traced
//!
//! | Level | Event |
//! |-------|-------|
//! | `debug` | request sent (`method`, `url`), batch progress, store creation |
//! | `info`  | entry cached or evicted (`model`, `id`, `size`), cache replaced |
//! | `warn`  | attribute type mismatch on an optional field, non-2xx response |
//! | `error` | failed request swallowed by the default error hook |
//!
//! Network operations run inside a span named after the operation, so with the
//! compact format a line reads like:
//!
//! ```text
//! INFO update_entry{model=user}: Cached entry model=user id=1 size=3
//! ```

/// Initializes the global subscriber. Call once, at program start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // events carry `model` instead
        .compact()
        .init();
}
