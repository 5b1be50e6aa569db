// scour-core/src/lib.rs
//! # Scour Core Library
//!
//! `scour-core` provides typed sanitization of untrusted input values at
//! application boundaries. Given an arbitrary value and a named type
//! (integer, alphanumeric, HTML, email, path, ...), it returns a cleaned
//! value conforming to that type's rules. The library is pure and
//! stateless between calls: no I/O, no network, and every transform is a
//! bounded, in-memory operation.
//!
//! ## Modules
//!
//! * `filter`: The `InputFilter` registry mapping type names to rules and
//!   dispatching `clean` calls, with a default handler for unknown names.
//! * `rules`: The rule representation (`FilterRule`, the `Cleaner` trait)
//!   and the built-in coercion table.
//! * `cleaner`: `HtmlCleaner`, which decodes HTML entities and strips
//!   markup not covered by a tag/attribute allowlist.
//! * `config`: The persisted allowlist configuration and its YAML
//!   load/save boundary.
//! * `errors`: The structured error enum for configuration failures.
//!
//! ## Usage Example
//!
//! ```rust
//! use scour_core::{InputFilter, Value};
//!
//! let filter = InputFilter::new();
//!
//! assert_eq!(filter.clean("abc123", InputFilter::UINT), Value::from(123));
//! assert_eq!(filter.clean("-42", InputFilter::INTEGER), Value::from(-42));
//! assert_eq!(
//!     filter.clean("<script>alert(1)</script>hello", InputFilter::STRING),
//!     Value::from("hello"),
//! );
//! ```
//!
//! ## Error Handling
//!
//! Per-value cleaning never fails: pattern rules that find no match yield
//! `Value::Null`, and markup cleaning degrades gracefully on malformed
//! input. Configuration mistakes (blank handler names, malformed persisted
//! allowlists) surface as [`ScourError`].
//!
//! ## Design Principles
//!
//! * **Types are data:** new input types are registered rules, not
//!   subclasses.
//! * **Stateless cleaning:** registry and cleaner hold configuration only;
//!   `clean` calls are pure and safe to run concurrently.
//! * **Bounded transforms:** every fixed-point loop carries an explicit
//!   pass cap, so adversarial input cannot spin the cleaner.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod cleaner;
pub mod config;
pub mod errors;
pub mod filter;
pub mod rules;

/// Re-exports the markup cleaner and its pass caps.
pub use cleaner::{HtmlCleaner, DECODE_PASS_LIMIT, REMOVE_PASS_LIMIT};

/// Re-exports the persisted cleaner configuration.
pub use config::CleanerConfig;

/// Re-exports the custom error type for clear error reporting.
pub use errors::ScourError;

/// Re-exports the filter registry.
pub use filter::InputFilter;

/// Re-exports the rule representation.
pub use rules::{Cleaner, FilterRule, RuleFn};

/// The dynamically-typed value model used throughout the registry.
pub use serde_json::Value;
