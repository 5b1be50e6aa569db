// scour-core/src/cleaner.rs
//! HTML entity decoding and tag/attribute stripping.
//!
//! `HtmlCleaner` is a reusable, configurable component that removes
//! disallowed markup from text. It holds only allowlist configuration and
//! no per-call state, so a single instance can serve many cleaning calls.
//! Both `decode` and `remove` are best-effort transforms: malformed markup
//! degrades to an imperfect but non-crashing result, never an error.
//!
//! License: MIT OR Apache-2.0

use std::collections::HashMap;

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::CleanerConfig;

/// Upper bound on tag-stripping passes before giving up on a fixed point.
///
/// A single pass can itself expose new apparent tags through concatenation
/// (`<<script>script>`), so `remove` re-runs until the output stabilizes.
/// The cap turns a pathological never-converging input into a bounded,
/// imperfect result instead of a spin.
pub const REMOVE_PASS_LIMIT: usize = 32;

/// Upper bound on entity-decoding passes, guarding double-encoded payloads.
pub const DECODE_PASS_LIMIT: usize = 10;

/// Longest entity body considered between `&` and `;`.
const MAX_ENTITY_LEN: usize = 32;

/// Tags whose content is code rather than document text. When one of these
/// is dropped as disallowed, everything through its matching closing tag is
/// dropped with it; stripping only the markers would leak the script body
/// into the cleaned text.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

static NAMED_ENTITIES: Lazy<HashMap<&'static str, char>> = Lazy::new(|| {
    HashMap::from([
        ("amp", '&'),
        ("lt", '<'),
        ("gt", '>'),
        ("quot", '"'),
        ("apos", '\''),
        ("nbsp", '\u{a0}'),
        ("iexcl", '\u{a1}'),
        ("cent", '\u{a2}'),
        ("pound", '\u{a3}'),
        ("curren", '\u{a4}'),
        ("yen", '\u{a5}'),
        ("brvbar", '\u{a6}'),
        ("sect", '\u{a7}'),
        ("uml", '\u{a8}'),
        ("copy", '\u{a9}'),
        ("ordf", '\u{aa}'),
        ("laquo", '\u{ab}'),
        ("not", '\u{ac}'),
        ("shy", '\u{ad}'),
        ("reg", '\u{ae}'),
        ("macr", '\u{af}'),
        ("deg", '\u{b0}'),
        ("plusmn", '\u{b1}'),
        ("sup2", '\u{b2}'),
        ("sup3", '\u{b3}'),
        ("acute", '\u{b4}'),
        ("micro", '\u{b5}'),
        ("para", '\u{b6}'),
        ("middot", '\u{b7}'),
        ("cedil", '\u{b8}'),
        ("sup1", '\u{b9}'),
        ("ordm", '\u{ba}'),
        ("raquo", '\u{bb}'),
        ("frac14", '\u{bc}'),
        ("frac12", '\u{bd}'),
        ("frac34", '\u{be}'),
        ("iquest", '\u{bf}'),
        ("times", '\u{d7}'),
        ("divide", '\u{f7}'),
        ("szlig", '\u{df}'),
        ("agrave", '\u{e0}'),
        ("aacute", '\u{e1}'),
        ("acirc", '\u{e2}'),
        ("atilde", '\u{e3}'),
        ("auml", '\u{e4}'),
        ("aring", '\u{e5}'),
        ("aelig", '\u{e6}'),
        ("ccedil", '\u{e7}'),
        ("egrave", '\u{e8}'),
        ("eacute", '\u{e9}'),
        ("ecirc", '\u{ea}'),
        ("euml", '\u{eb}'),
        ("igrave", '\u{ec}'),
        ("iacute", '\u{ed}'),
        ("icirc", '\u{ee}'),
        ("iuml", '\u{ef}'),
        ("eth", '\u{f0}'),
        ("ntilde", '\u{f1}'),
        ("ograve", '\u{f2}'),
        ("oacute", '\u{f3}'),
        ("ocirc", '\u{f4}'),
        ("otilde", '\u{f5}'),
        ("ouml", '\u{f6}'),
        ("oslash", '\u{f8}'),
        ("ugrave", '\u{f9}'),
        ("uacute", '\u{fa}'),
        ("ucirc", '\u{fb}'),
        ("uuml", '\u{fc}'),
        ("yacute", '\u{fd}'),
        ("thorn", '\u{fe}'),
        ("yuml", '\u{ff}'),
        ("ndash", '\u{2013}'),
        ("mdash", '\u{2014}'),
        ("lsquo", '\u{2018}'),
        ("rsquo", '\u{2019}'),
        ("sbquo", '\u{201a}'),
        ("ldquo", '\u{201c}'),
        ("rdquo", '\u{201d}'),
        ("bdquo", '\u{201e}'),
        ("dagger", '\u{2020}'),
        ("Dagger", '\u{2021}'),
        ("bull", '\u{2022}'),
        ("hellip", '\u{2026}'),
        ("permil", '\u{2030}'),
        ("prime", '\u{2032}'),
        ("Prime", '\u{2033}'),
        ("lsaquo", '\u{2039}'),
        ("rsaquo", '\u{203a}'),
        ("oline", '\u{203e}'),
        ("euro", '\u{20ac}'),
        ("trade", '\u{2122}'),
    ])
});

/// A stateful markup cleaner backed by a tag/attribute allowlist.
///
/// The cleaner holds configuration only; `decode` and `remove` take `&self`
/// and are safe to call concurrently. Mutating the allowlist takes
/// `&mut self`, so callers needing concurrent reconfiguration must provide
/// their own synchronization.
///
/// Serialization is transparent: a cleaner serializes as its
/// [`CleanerConfig`], which is the only part of the system meant to survive
/// persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HtmlCleaner {
    config: CleanerConfig,
}

impl Default for HtmlCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlCleaner {
    /// Creates a cleaner with the baseline allowlist.
    pub fn new() -> Self {
        Self {
            config: CleanerConfig::default(),
        }
    }

    /// Creates a cleaner from a persisted configuration.
    ///
    /// Tag and attribute names are case-normalized on entry.
    pub fn from_config(config: CleanerConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// The current allowlist configuration.
    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Allows a tag, merging `attributes` into its allowed-attribute set.
    pub fn add_allowed_tag(&mut self, tag: &str, attributes: &[&str]) {
        let entry = self
            .config
            .tags
            .entry(tag.to_ascii_lowercase())
            .or_default();
        for attribute in attributes {
            entry.insert(attribute.to_ascii_lowercase());
        }
    }

    /// Disallows a tag entirely.
    pub fn remove_allowed_tag(&mut self, tag: &str) {
        self.config.tags.remove(&tag.to_ascii_lowercase());
    }

    /// Allows an attribute on a tag, allowing the tag itself if needed.
    pub fn add_allowed_attribute(&mut self, tag: &str, attribute: &str) {
        self.config
            .tags
            .entry(tag.to_ascii_lowercase())
            .or_default()
            .insert(attribute.to_ascii_lowercase());
    }

    /// Disallows an attribute on a tag.
    pub fn remove_allowed_attribute(&mut self, tag: &str, attribute: &str) {
        if let Some(attributes) = self.config.tags.get_mut(&tag.to_ascii_lowercase()) {
            attributes.remove(&attribute.to_ascii_lowercase());
        }
    }

    pub fn is_tag_allowed(&self, tag: &str) -> bool {
        self.config.tags.contains_key(&tag.to_ascii_lowercase())
    }

    pub fn is_attribute_allowed(&self, tag: &str, attribute: &str) -> bool {
        self.config
            .tags
            .get(&tag.to_ascii_lowercase())
            .map_or(false, |attributes| {
                attributes.contains(&attribute.to_ascii_lowercase())
            })
    }

    /// Names of all currently allowed tags.
    pub fn allowed_tags(&self) -> impl Iterator<Item = &str> {
        self.config.tags.keys().map(String::as_str)
    }

    /// Decodes numeric and named HTML entities to their literal characters.
    ///
    /// Decoding repeats until the string stops changing, so double-encoded
    /// payloads (`&amp;amp;`) fully resolve; [`DECODE_PASS_LIMIT`] bounds
    /// the repetition. Unknown entities pass through untouched. This never
    /// fails, regardless of how malformed the input is.
    pub fn decode(&self, source: &str) -> String {
        let mut current = source.to_string();
        for _ in 0..DECODE_PASS_LIMIT {
            let next = decode_entities(&current);
            if next == current {
                return next;
            }
            current = next;
        }
        current
    }

    /// Strips all markup not covered by the allowlist.
    ///
    /// Disallowed tags are dropped (closing tags are tracked independently,
    /// not paired with their opener); allowed tags are rebuilt keeping only
    /// their allowed attributes, re-quoted with double quotes. Unterminated
    /// tag candidates are dropped entirely so raw markup never leaks into
    /// the output. Disallowed `script`/`style` elements lose their content
    /// as well as their markers.
    ///
    /// One pass can expose new apparent tags through concatenation, so the
    /// pass repeats until a fixed point is reached, capped at
    /// [`REMOVE_PASS_LIMIT`]. Never fails on malformed markup.
    pub fn remove(&self, source: &str) -> String {
        let mut current = source.to_string();
        for _ in 0..REMOVE_PASS_LIMIT {
            let next = self.clean_pass(&current);
            if next == current {
                return next;
            }
            current = next;
        }
        warn!(
            "Tag stripping did not reach a fixed point within {} passes.",
            REMOVE_PASS_LIMIT
        );
        current
    }

    /// A single stripping pass over `source`.
    fn clean_pass(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut segments = Segments::new(source);
        while let Some(segment) = segments.next() {
            match segment {
                Segment::Text(text) => out.push_str(text),
                // A '<' that opened a candidate which never closed.
                Segment::Truncated => {}
                Segment::Tag(body) => {
                    // Comments, doctypes and processing instructions have no
                    // valid tag name and fall out here.
                    let Some(tag) = parse_tag(body) else { continue };
                    match self.config.tags.get(&tag.name) {
                        Some(allowed_attributes) => {
                            out.push_str(&rebuild_tag(&tag, allowed_attributes));
                        }
                        None => {
                            if !tag.closing
                                && !tag.self_closing
                                && RAW_TEXT_TAGS.contains(&tag.name.as_str())
                            {
                                skip_raw_text(&mut segments, &tag.name);
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

/// One tokenized piece of the input: literal text or a `<...>` candidate.
enum Segment<'a> {
    Text(&'a str),
    /// Body between `<` and `>`, excluding the delimiters.
    Tag(&'a str),
    /// A plausible tag opener with no closing `>` before end of input.
    Truncated,
}

/// Lazy tokenizer producing alternating text and tag-candidate segments.
struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    fn new(source: &'a str) -> Self {
        Self { rest: source }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match tag_start(self.rest) {
            Some(0) => match self.rest.find('>') {
                Some(end) => {
                    let body = &self.rest[1..end];
                    self.rest = &self.rest[end + 1..];
                    Some(Segment::Tag(body))
                }
                None => {
                    self.rest = "";
                    Some(Segment::Truncated)
                }
            },
            Some(start) => {
                let (text, rest) = self.rest.split_at(start);
                self.rest = rest;
                Some(Segment::Text(text))
            }
            None => {
                let text = self.rest;
                self.rest = "";
                Some(Segment::Text(text))
            }
        }
    }
}

/// Index of the first `<` that plausibly opens a tag.
///
/// A `<` only opens a tag when followed by a letter, `/`, `!` or `?`;
/// anything else (`1 < 2`, a trailing `<`) is literal text.
fn tag_start(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut from = 0;
    while let Some(pos) = s[from..].find('<') {
        let at = from + pos;
        match bytes.get(at + 1) {
            Some(next) if next.is_ascii_alphabetic() || matches!(next, b'/' | b'!' | b'?') => {
                return Some(at);
            }
            Some(_) => from = at + 1,
            None => return None,
        }
    }
    None
}

struct ParsedTag<'a> {
    /// Lowercased tag name.
    name: String,
    closing: bool,
    self_closing: bool,
    /// Raw attribute region, parsed on demand.
    attributes: &'a str,
}

/// Parses a tag candidate body. Returns `None` when no valid tag name is
/// present (comments, doctype, processing instructions, stray slashes).
fn parse_tag(body: &str) -> Option<ParsedTag<'_>> {
    let mut rest = body.trim();
    let closing = match rest.strip_prefix('/') {
        Some(after) => {
            rest = after.trim_start();
            true
        }
        None => false,
    };
    let self_closing = match rest.strip_suffix('/') {
        Some(before) => {
            rest = before.trim_end();
            true
        }
        None => false,
    };

    if !rest.chars().next().map_or(false, |c| c.is_ascii_alphabetic()) {
        return None;
    }
    let name_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(rest.len());

    Some(ParsedTag {
        name: rest[..name_end].to_ascii_lowercase(),
        closing,
        self_closing,
        attributes: &rest[name_end..],
    })
}

struct TagAttribute {
    /// Lowercased attribute name.
    name: String,
    value: Option<String>,
}

/// Parses an attribute region, handling double-quoted, single-quoted and
/// unquoted values as well as bare (valueless) attributes. An unterminated
/// quote consumes the remainder of the tag body as the value.
fn parse_attributes(input: &str) -> Vec<TagAttribute> {
    let mut attributes = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')))
            .unwrap_or(rest.len());
        if name_end == 0 {
            // Stray quote or other garbage; skip one char and resync.
            let mut chars = rest.chars();
            chars.next();
            rest = chars.as_str();
            continue;
        }
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after_eq) => {
                let after_eq = after_eq.trim_start();
                if let Some(quoted) = after_eq.strip_prefix('"') {
                    match quoted.find('"') {
                        Some(end) => {
                            rest = &quoted[end + 1..];
                            Some(quoted[..end].to_string())
                        }
                        None => {
                            rest = "";
                            Some(quoted.to_string())
                        }
                    }
                } else if let Some(quoted) = after_eq.strip_prefix('\'') {
                    match quoted.find('\'') {
                        Some(end) => {
                            rest = &quoted[end + 1..];
                            Some(quoted[..end].to_string())
                        }
                        None => {
                            rest = "";
                            Some(quoted.to_string())
                        }
                    }
                } else {
                    let end = after_eq
                        .find(|c: char| c.is_whitespace())
                        .unwrap_or(after_eq.len());
                    let value = &after_eq[..end];
                    rest = &after_eq[end..];
                    Some(value.to_string())
                }
            }
            None => None,
        };

        attributes.push(TagAttribute { name, value });
    }

    attributes
}

/// Rebuilds an allowed tag, keeping only allowed attributes in their
/// original relative order and re-quoting values with double quotes.
fn rebuild_tag(tag: &ParsedTag<'_>, allowed: &std::collections::BTreeSet<String>) -> String {
    if tag.closing {
        return format!("</{}>", tag.name);
    }

    let mut out = String::with_capacity(tag.name.len() + tag.attributes.len() + 4);
    out.push('<');
    out.push_str(&tag.name);
    for attribute in parse_attributes(tag.attributes) {
        if !allowed.contains(&attribute.name) {
            continue;
        }
        out.push(' ');
        out.push_str(&attribute.name);
        if let Some(value) = attribute.value {
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
    }
    if tag.self_closing {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Consumes segments through the closing tag of a raw-text element.
fn skip_raw_text(segments: &mut Segments<'_>, name: &str) {
    for segment in segments {
        if let Segment::Tag(body) = segment {
            if let Some(tag) = parse_tag(body) {
                if tag.closing && tag.name == name {
                    return;
                }
            }
        }
    }
}

/// One entity-decoding pass over `source`.
///
/// An entity is `&`, a run of alphanumerics (plus `#` for numeric forms),
/// and a terminating `;`. A bare `&` that opens no such run stays literal
/// and does not mask a real entity following it.
fn decode_entities(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let body_len = rest[1..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
            .unwrap_or(rest.len() - 1);
        let terminated = rest[1 + body_len..].starts_with(';');
        if terminated && body_len > 0 && body_len <= MAX_ENTITY_LEN {
            let body = &rest[1..1 + body_len];
            match decode_entity(body) {
                Some(c) => out.push(c),
                // Not an entity; keep the original text.
                None => out.push_str(&rest[..body_len + 2]),
            }
            rest = &rest[body_len + 2..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = if let Some(hex) = numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            numeric.parse::<u32>().ok()?
        };
        char::from_u32(code)
    } else {
        NAMED_ENTITIES.get(body).copied()
    }
}
