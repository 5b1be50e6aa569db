// scour-core/src/filter.rs
//! The filter registry and dispatcher.
//!
//! `InputFilter` maps uppercase type names to cleaning rules and applies
//! them to incoming values. New types are data, not code: callers extend or
//! override built-in type handling by registering rules in the flat map,
//! never by subclassing. Unknown names fall through to a default handler.

use std::collections::HashMap;

use log::debug;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::cleaner::HtmlCleaner;
use crate::config::CleanerConfig;
use crate::errors::ScourError;
use crate::rules::{self, FilterRule};

/// A registry of named cleaning rules with a fallback handler.
///
/// Constructed once per application context, pre-populated with the
/// built-in rules, then optionally customized. `clean` takes `&self` and
/// never mutates the registry; all reconfiguration takes `&mut self`, so
/// concurrent mutation requires external synchronization.
#[derive(Debug)]
pub struct InputFilter {
    handlers: HashMap<String, FilterRule>,
    default_handler: Option<FilterRule>,
    html_cleaner: HtmlCleaner,
}

impl InputFilter {
    pub const INTEGER: &'static str = "INTEGER";
    pub const INT: &'static str = "INT";
    pub const UINT: &'static str = "UINT";
    pub const FLOAT: &'static str = "FLOAT";
    pub const DOUBLE: &'static str = "DOUBLE";
    pub const BOOLEAN: &'static str = "BOOLEAN";
    pub const BOOL: &'static str = "BOOL";
    pub const WORD: &'static str = "WORD";
    pub const ALNUM: &'static str = "ALNUM";
    pub const CMD: &'static str = "CMD";
    pub const BASE64: &'static str = "BASE64";
    pub const STRING: &'static str = "STRING";
    pub const HTML: &'static str = "HTML";
    pub const ARRAY: &'static str = "ARRAY";
    pub const PATH: &'static str = "PATH";
    pub const USERNAME: &'static str = "USERNAME";
    pub const EMAIL: &'static str = "EMAIL";
    pub const URL: &'static str = "URL";
    pub const RAW: &'static str = "RAW";

    /// Creates a filter with the built-in rules and the baseline cleaner.
    pub fn new() -> Self {
        Self::with_cleaner(HtmlCleaner::new())
    }

    /// Creates a filter with the built-in rules and a caller-supplied
    /// markup cleaner.
    pub fn with_cleaner(html_cleaner: HtmlCleaner) -> Self {
        Self {
            handlers: rules::builtin_handlers(),
            default_handler: Some(rules::default_handler()),
            html_cleaner,
        }
    }

    /// Cleans `source` according to the rule registered for `filter_type`.
    ///
    /// Type names are matched case-insensitively. When no rule is
    /// registered, the default handler runs; with no default handler the
    /// source is returned unchanged. This never errors and never mutates
    /// the registry.
    pub fn clean<V>(&self, source: V, filter_type: &str) -> Value
    where
        V: Into<Value>,
    {
        let source = source.into();
        let key = filter_type.to_uppercase();
        if let Some(handler) = self.handlers.get(&key) {
            return handler.apply(source, &self.html_cleaner);
        }

        debug!("No handler registered for type '{}'; using the default handler.", key);
        match &self.default_handler {
            Some(handler) => handler.apply(source, &self.html_cleaner),
            None => source,
        }
    }

    /// Cleans `source` with the conventional default type, STRING.
    pub fn clean_string<V>(&self, source: V) -> Value
    where
        V: Into<Value>,
    {
        self.clean(source, Self::STRING)
    }

    /// Cleans `source` with an ad-hoc rule, bypassing all registry lookup.
    pub fn clean_with<V, F>(&self, source: V, rule: F) -> Value
    where
        V: Into<Value>,
        F: FnOnce(Value) -> Value,
    {
        rule(source.into())
    }

    /// Registers or replaces the rule for `name`.
    ///
    /// The name is uppercased before storage. A blank name is an
    /// `InvalidConfiguration` error.
    pub fn set_handler(&mut self, name: &str, handler: FilterRule) -> Result<(), ScourError> {
        if name.trim().is_empty() {
            return Err(ScourError::InvalidConfiguration(
                "Handler names must not be blank.".to_string(),
            ));
        }
        debug!("Registering handler for type '{}'.", name.to_uppercase());
        self.handlers.insert(name.to_uppercase(), handler);
        Ok(())
    }

    /// Case-insensitive rule lookup; `None` when unregistered.
    pub fn get_handler(&self, name: &str) -> Option<&FilterRule> {
        self.handlers.get(&name.to_uppercase())
    }

    /// Like [`get_handler`](Self::get_handler), but guarantees presence.
    pub fn require_handler(&self, name: &str) -> Result<&FilterRule, ScourError> {
        self.get_handler(name)
            .ok_or_else(|| ScourError::HandlerNotFound(name.to_uppercase()))
    }

    /// Replaces the fallback handler for unregistered type names.
    pub fn set_default_handler(&mut self, handler: FilterRule) {
        self.default_handler = Some(handler);
    }

    pub fn default_handler(&self) -> Option<&FilterRule> {
        self.default_handler.as_ref()
    }

    pub fn html_cleaner(&self) -> &HtmlCleaner {
        &self.html_cleaner
    }

    /// Mutable access to the markup cleaner. Allowlist changes are
    /// immediately visible to subsequent `clean` calls.
    pub fn html_cleaner_mut(&mut self) -> &mut HtmlCleaner {
        &mut self.html_cleaner
    }

    /// Replaces the markup cleaner used by the markup-backed rules.
    pub fn set_html_cleaner(&mut self, cleaner: HtmlCleaner) {
        self.html_cleaner = cleaner;
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Handlers are code, not data: serialization emits only the cleaner
/// configuration.
impl Serialize for InputFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.html_cleaner.config().serialize(serializer)
    }
}

/// Reconstruction restores the rule table to the built-in defaults and
/// rebuilds the cleaner from the persisted configuration.
impl<'de> Deserialize<'de> for InputFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let config = CleanerConfig::deserialize(deserializer)?;
        Ok(Self::with_cleaner(HtmlCleaner::from_config(config)))
    }
}
