// scour-core/src/rules.rs
//! Rule representation and the built-in cleaning rules.
//!
//! A rule is either a pure function over the raw value or a reusable
//! [`Cleaner`] object invoked with the value's text form. The built-in
//! table maps every supported type name to its coercion; all pattern-based
//! coercions that find no match yield `Value::Null` rather than an error.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::cleaner::HtmlCleaner;

/// A reusable, stateful cleaning capability.
///
/// Implementors receive the text form of the value being cleaned and return
/// the cleaned result. Cleaners hold configuration only, so they are shared
/// freely across `clean` calls.
pub trait Cleaner: Send + Sync {
    fn clean(&self, source: &str) -> Value;
}

/// A boxed rule function.
///
/// Rule functions receive the registry's [`HtmlCleaner`] at dispatch time
/// rather than capturing one, so markup-backed rules always observe the
/// current allowlist, including mutations made after registration.
pub type RuleFn = Box<dyn Fn(Value, &HtmlCleaner) -> Value + Send + Sync>;

/// A named cleaning rule: a pure function or a stateful cleaner.
pub enum FilterRule {
    Func(RuleFn),
    Cleaner(Box<dyn Cleaner>),
}

impl fmt::Debug for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRule::Func(_) => f.write_str("FilterRule::Func(..)"),
            FilterRule::Cleaner(_) => f.write_str("FilterRule::Cleaner(..)"),
        }
    }
}

impl FilterRule {
    /// Wraps a plain transform that needs no markup cleaner.
    pub fn func<F>(rule: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        FilterRule::Func(Box::new(move |source, _| rule(source)))
    }

    /// Wraps a transform that delegates to the registry's markup cleaner.
    pub fn func_with_cleaner<F>(rule: F) -> Self
    where
        F: Fn(Value, &HtmlCleaner) -> Value + Send + Sync + 'static,
    {
        FilterRule::Func(Box::new(rule))
    }

    /// Wraps a reusable [`Cleaner`] object.
    pub fn cleaner<C>(cleaner: C) -> Self
    where
        C: Cleaner + 'static,
    {
        FilterRule::Cleaner(Box::new(cleaner))
    }

    /// Applies the rule to `source`.
    ///
    /// `Cleaner`-backed rules are invoked with the text form of the value.
    pub fn apply(&self, source: Value, cleaner: &HtmlCleaner) -> Value {
        match self {
            FilterRule::Func(rule) => rule(source, cleaner),
            FilterRule::Cleaner(object) => object.clean(&text_form(&source)),
        }
    }
}

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?[0-9]+").unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?[0-9]+(\.[0-9]+)?").unwrap());
static WORD_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z_]").unwrap());
static ALNUM_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());
static CMD_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());
static BASE64_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9/+=]").unwrap());
static PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+[A-Za-z0-9_.-]*([\\/][A-Za-z0-9_-]+[A-Za-z0-9_.-]*)*$").unwrap()
});
static USERNAME_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\x00-\x1F\x7F<>"'%&]"#).unwrap());
static EMAIL_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9!#$%&'*+=?^_`{|}~@.\[\]-]").unwrap());
static URL_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^A-Za-z0-9$\-_.+!*'(),{}|\\^~\[\]`<>#%";/?:@&=]"#).unwrap());

/// Text form of a value, as seen by the string-shaped rules.
///
/// Collections and null have no text form and coerce to the empty string.
pub(crate) fn text_form(source: &Value) -> String {
    match source {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn truthiness(source: &Value) -> bool {
    match source {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

fn clean_integer(source: Value) -> Value {
    match INTEGER_RE.find(&text_form(&source)) {
        Some(found) => found.as_str().parse::<i64>().map_or(Value::Null, Value::from),
        None => Value::Null,
    }
}

fn clean_uint(source: Value) -> Value {
    match INTEGER_RE.find(&text_form(&source)) {
        Some(found) => found
            .as_str()
            .parse::<i64>()
            .map_or(Value::Null, |n| Value::from(n.unsigned_abs())),
        None => Value::Null,
    }
}

fn clean_float(source: Value) -> Value {
    match FLOAT_RE.find(&text_form(&source)) {
        Some(found) => found.as_str().parse::<f64>().map_or(Value::Null, Value::from),
        None => Value::Null,
    }
}

fn clean_boolean(source: Value) -> Value {
    Value::Bool(truthiness(&source))
}

fn clean_word(source: Value) -> Value {
    Value::from(WORD_STRIP_RE.replace_all(&text_form(&source), "").into_owned())
}

fn clean_alnum(source: Value) -> Value {
    Value::from(ALNUM_STRIP_RE.replace_all(&text_form(&source), "").into_owned())
}

fn clean_cmd(source: Value) -> Value {
    let text = text_form(&source);
    let stripped = CMD_STRIP_RE.replace_all(&text, "");
    Value::from(stripped.trim_start_matches('.').to_string())
}

fn clean_base64(source: Value) -> Value {
    Value::from(BASE64_STRIP_RE.replace_all(&text_form(&source), "").into_owned())
}

fn clean_string(source: Value, cleaner: &HtmlCleaner) -> Value {
    Value::from(cleaner.remove(&cleaner.decode(&text_form(&source))))
}

fn clean_html(source: Value, cleaner: &HtmlCleaner) -> Value {
    Value::from(cleaner.remove(&text_form(&source)))
}

/// Coerces any value to an ordered collection without touching its contents.
fn clean_array(source: Value) -> Value {
    match source {
        Value::Array(_) => source,
        Value::Null => Value::Array(Vec::new()),
        Value::Object(entries) => Value::Array(entries.into_iter().map(|(_, v)| v).collect()),
        scalar => Value::Array(vec![scalar]),
    }
}

fn clean_path(source: Value) -> Value {
    let text = text_form(&source);
    if PATH_RE.is_match(&text) {
        Value::from(text)
    } else {
        Value::Null
    }
}

fn clean_username(source: Value) -> Value {
    Value::from(
        USERNAME_STRIP_RE
            .replace_all(&text_form(&source), "")
            .into_owned(),
    )
}

fn clean_email(source: Value) -> Value {
    Value::from(EMAIL_STRIP_RE.replace_all(&text_form(&source), "").into_owned())
}

/// Sanitizes to the URL character set, then requires both a path and a
/// query component; a URL missing either yields `Value::Null`.
fn clean_url(source: Value) -> Value {
    let stripped = URL_STRIP_RE
        .replace_all(&text_form(&source), "")
        .into_owned();
    if has_path_and_query(&stripped) {
        Value::from(stripped)
    } else {
        Value::Null
    }
}

fn has_path_and_query(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split_once('?')
        .map_or(false, |(before_query, _)| before_query.contains('/'))
}

fn clean_raw(source: Value) -> Value {
    source
}

/// The fallback applied to unregistered type names.
///
/// Strings get STRING-style cleaning; collections are walked recursively and
/// every string element is cleaned in place; everything else passes through.
fn clean_unknown(source: Value, cleaner: &HtmlCleaner) -> Value {
    match source {
        Value::String(text) => Value::from(cleaner.remove(&cleaner.decode(&text))),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| clean_unknown(item, cleaner))
                .collect(),
        ),
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, item)| (key, clean_unknown(item, cleaner)))
                .collect(),
        ),
        other => other,
    }
}

/// Builds the full built-in rule table, aliases included.
pub(crate) fn builtin_handlers() -> HashMap<String, FilterRule> {
    let mut handlers = HashMap::with_capacity(20);

    handlers.insert("INTEGER".to_string(), FilterRule::func(clean_integer));
    handlers.insert("INT".to_string(), FilterRule::func(clean_integer));
    handlers.insert("UINT".to_string(), FilterRule::func(clean_uint));
    handlers.insert("FLOAT".to_string(), FilterRule::func(clean_float));
    handlers.insert("DOUBLE".to_string(), FilterRule::func(clean_float));
    handlers.insert("BOOLEAN".to_string(), FilterRule::func(clean_boolean));
    handlers.insert("BOOL".to_string(), FilterRule::func(clean_boolean));
    handlers.insert("WORD".to_string(), FilterRule::func(clean_word));
    handlers.insert("ALNUM".to_string(), FilterRule::func(clean_alnum));
    handlers.insert("CMD".to_string(), FilterRule::func(clean_cmd));
    handlers.insert("BASE64".to_string(), FilterRule::func(clean_base64));
    handlers.insert(
        "STRING".to_string(),
        FilterRule::func_with_cleaner(clean_string),
    );
    handlers.insert("HTML".to_string(), FilterRule::func_with_cleaner(clean_html));
    handlers.insert("ARRAY".to_string(), FilterRule::func(clean_array));
    handlers.insert("PATH".to_string(), FilterRule::func(clean_path));
    handlers.insert("USERNAME".to_string(), FilterRule::func(clean_username));
    handlers.insert("EMAIL".to_string(), FilterRule::func(clean_email));
    handlers.insert("URL".to_string(), FilterRule::func(clean_url));
    handlers.insert("RAW".to_string(), FilterRule::func(clean_raw));

    handlers
}

/// The built-in default handler for unregistered type names.
pub(crate) fn default_handler() -> FilterRule {
    FilterRule::func_with_cleaner(clean_unknown)
}
