// scour-core/tests/filter_tests.rs
use serde_json::json;

use scour_core::{Cleaner, FilterRule, InputFilter, ScourError, Value};

#[test]
fn lookup_is_case_insensitive() {
    let filter = InputFilter::new();
    assert_eq!(filter.clean("abc-42", "int"), filter.clean("abc-42", "INT"));
    assert_eq!(filter.clean("x9!", "alnum"), filter.clean("x9!", "ALNUM"));
    assert!(filter.get_handler("uint").is_some());
}

#[test]
fn integer_rules_extract_first_match() {
    let filter = InputFilter::new();
    assert_eq!(filter.clean("abc123", "UINT"), json!(123));
    assert_eq!(filter.clean("-42", "INTEGER"), json!(-42));
    assert_eq!(filter.clean("-42", "UINT"), json!(42));
    assert_eq!(filter.clean("v1.2.3", "INTEGER"), json!(1));
    assert_eq!(filter.clean("none here", "INTEGER"), Value::Null);
}

#[test]
fn float_rule_takes_first_decimal() {
    let filter = InputFilter::new();
    assert_eq!(filter.clean("price: 3.95 today", "FLOAT"), json!(3.95));
    assert_eq!(filter.clean("1.2.3", "DOUBLE"), json!(1.2));
    assert_eq!(filter.clean("n/a", "FLOAT"), Value::Null);
}

#[test]
fn boolean_rule_uses_loose_truthiness() {
    let filter = InputFilter::new();
    assert_eq!(filter.clean("0", "BOOL"), json!(false));
    assert_eq!(filter.clean("", "BOOLEAN"), json!(false));
    assert_eq!(filter.clean(0, "BOOLEAN"), json!(false));
    // Any non-empty string other than "0" is truthy, even "false".
    assert_eq!(filter.clean("false", "BOOLEAN"), json!(true));
    assert_eq!(filter.clean(json!([]), "BOOL"), json!(false));
}

#[test]
fn character_class_rules_strip_everything_else() {
    let filter = InputFilter::new();
    assert_eq!(filter.clean("hello_world 42!", "WORD"), json!("hello_world"));
    assert_eq!(filter.clean("a1-b2_c3", "ALNUM"), json!("a1b2c3"));
    assert_eq!(filter.clean("Zm9v+bar/==!", "BASE64"), json!("Zm9v+bar/=="));
    assert_eq!(
        filter.clean("ad<min>\"'%&x\u{7f}", "USERNAME"),
        json!("adminx")
    );
}

#[test]
fn cmd_rule_strips_leading_dots() {
    let filter = InputFilter::new();
    assert_eq!(filter.clean("../bin/run.sh", "CMD"), json!("binrun.sh"));
    assert_eq!(filter.clean("tar --extract", "CMD"), json!("tar--extract"));
}

#[test]
fn path_rule_is_full_match_or_null() {
    let filter = InputFilter::new();
    assert_eq!(
        filter.clean("images/logo.png", "PATH"),
        json!("images/logo.png")
    );
    assert_eq!(
        filter.clean(r"windows\system32", "PATH"),
        json!(r"windows\system32")
    );
    assert_eq!(filter.clean("../etc/passwd", "PATH"), Value::Null);
    assert_eq!(filter.clean("usr//local", "PATH"), Value::Null);
    assert_eq!(filter.clean("", "PATH"), Value::Null);
}

#[test]
fn email_rule_strips_to_plausible_charset() {
    let filter = InputFilter::new();
    assert_eq!(
        filter.clean("joe (comment)@example.com", "EMAIL"),
        json!("joecomment@example.com")
    );
}

#[test]
fn url_rule_requires_path_and_query() {
    let filter = InputFilter::new();
    assert_eq!(
        filter.clean("https://example.com/search?q=rust tutorial", "URL"),
        json!("https://example.com/search?q=rusttutorial")
    );
    assert_eq!(filter.clean("https://example.com?q=1", "URL"), Value::Null);
    assert_eq!(filter.clean("https://example.com/about", "URL"), Value::Null);
}

#[test]
fn string_rule_decodes_then_strips() {
    let filter = InputFilter::new();
    assert_eq!(
        filter.clean("<script>alert(1)</script>hello", "STRING"),
        json!("hello")
    );
    // Entity-encoded markup is decoded first, then stripped.
    assert_eq!(
        filter.clean("&lt;script&gt;alert(1)&lt;/script&gt;safe", "STRING"),
        json!("safe")
    );
    assert_eq!(filter.clean_string("<b>kept</b>"), json!("<b>kept</b>"));
}

#[test]
fn html_rule_strips_without_decoding() {
    let filter = InputFilter::new();
    assert_eq!(
        filter.clean("<b>bold</b><script>x</script>", "HTML"),
        json!("<b>bold</b>")
    );
    // No entity decoding on the HTML path.
    assert_eq!(
        filter.clean("&lt;script&gt;", "HTML"),
        json!("&lt;script&gt;")
    );
}

#[test]
fn array_rule_coerces_without_filtering() {
    let filter = InputFilter::new();
    assert_eq!(
        filter.clean(json!(["<script>a</script>", "ok"]), "ARRAY"),
        json!(["<script>a</script>", "ok"])
    );
    assert_eq!(filter.clean("solo", "ARRAY"), json!(["solo"]));
    assert_eq!(filter.clean(Value::Null, "ARRAY"), json!([]));
}

#[test]
fn raw_rule_is_identity() {
    let filter = InputFilter::new();
    assert_eq!(
        filter.clean("<script>x</script>", "RAW"),
        json!("<script>x</script>")
    );
    assert_eq!(filter.clean(json!({"k": 1}), "RAW"), json!({"k": 1}));
}

#[test]
fn unknown_types_fall_through_to_default_handler() {
    let filter = InputFilter::new();
    assert_eq!(filter.clean(42, "UNKNOWN_TYPE"), json!(42));
    assert_eq!(
        filter.clean("<script>x</script>keep", "UNKNOWN_TYPE"),
        json!("keep")
    );
    // Collections are walked recursively; non-strings pass through.
    assert_eq!(
        filter.clean(
            json!({"note": "<script>x</script>keep", "count": 5, "nested": ["<u onclick='x'>hi</u>"]}),
            "UNKNOWN_TYPE"
        ),
        json!({"note": "keep", "count": 5, "nested": ["<u>hi</u>"]})
    );
}

#[test]
fn default_handler_is_replaceable() {
    let mut filter = InputFilter::new();
    filter.set_default_handler(FilterRule::func(|_| Value::Null));
    assert_eq!(filter.clean(42, "UNKNOWN_TYPE"), Value::Null);
    // Registered rules are unaffected.
    assert_eq!(filter.clean("7", "INT"), json!(7));
}

#[test]
fn custom_handlers_override_builtins() {
    let mut filter = InputFilter::new();
    filter
        .set_handler("int", FilterRule::func(|_| json!(0)))
        .unwrap();
    assert_eq!(filter.clean("42", "INT"), json!(0));
}

struct UppercaseCleaner;

impl Cleaner for UppercaseCleaner {
    fn clean(&self, source: &str) -> Value {
        Value::from(source.to_uppercase())
    }
}

#[test]
fn cleaner_objects_receive_the_text_form() {
    let mut filter = InputFilter::new();
    filter
        .set_handler("SHOUT", FilterRule::cleaner(UppercaseCleaner))
        .unwrap();
    assert_eq!(filter.clean("hey", "shout"), json!("HEY"));
    assert_eq!(filter.clean(7, "SHOUT"), json!("7"));
}

#[test]
fn blank_handler_names_are_rejected() {
    let mut filter = InputFilter::new();
    let err = filter
        .set_handler("  ", FilterRule::func(|source| source))
        .unwrap_err();
    assert!(matches!(err, ScourError::InvalidConfiguration(_)));
}

#[test]
fn require_handler_reports_missing_names() {
    let filter = InputFilter::new();
    assert!(filter.get_handler("NOPE").is_none());
    let err = filter.require_handler("nope").unwrap_err();
    assert!(matches!(err, ScourError::HandlerNotFound(name) if name == "NOPE"));
    assert!(filter.require_handler("path").is_ok());
}

#[test]
fn ad_hoc_rules_bypass_the_registry() {
    let filter = InputFilter::new();
    // Even markup passes through untouched; no lookup happens.
    assert_eq!(
        filter.clean_with("<b>x</b>", |source| source),
        json!("<b>x</b>")
    );
    assert_eq!(
        filter.clean_with("abc", |source| json!(format!("{}!", source.as_str().unwrap()))),
        json!("abc!")
    );
}

#[test]
fn allowlist_mutation_is_visible_to_markup_rules() {
    let mut filter = InputFilter::new();
    assert_eq!(filter.clean("<b>x</b>", "HTML"), json!("<b>x</b>"));

    filter.html_cleaner_mut().remove_allowed_tag("b");
    assert_eq!(filter.clean("<b>x</b>", "HTML"), json!("x"));

    filter.html_cleaner_mut().add_allowed_tag("video", &["src"]);
    assert_eq!(
        filter.clean("<video src=\"clip.mp4\">", "HTML"),
        json!("<video src=\"clip.mp4\">")
    );
}

#[test]
fn serialization_persists_only_the_cleaner_config() {
    let mut filter = InputFilter::new();
    filter
        .set_handler("CUSTOM", FilterRule::func(|_| Value::Null))
        .unwrap();
    filter.html_cleaner_mut().add_allowed_tag("video", &["src"]);
    filter.html_cleaner_mut().remove_allowed_tag("img");

    let payload = serde_json::to_string(&filter).unwrap();
    let restored: InputFilter = serde_json::from_str(&payload).unwrap();

    // Function-valued rules are not data: the table is back to defaults.
    assert!(restored.get_handler("CUSTOM").is_none());
    assert!(restored.get_handler("INT").is_some());

    // The allowlist customization survived.
    assert!(restored.html_cleaner().is_tag_allowed("video"));
    assert!(!restored.html_cleaner().is_tag_allowed("img"));
}
