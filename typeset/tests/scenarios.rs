use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use typeset::{
    Caster, DefaultsMode, Effect, SanitizeRegistry, evaluate, get_defaults,
    parse_value_typesets, resolve, validate_condition_set, validate_typesets,
    data::typeset::typesets_to_value,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cast(typesets: Value, raw: Value) -> Value {
    let registry = SanitizeRegistry::with_builtins();
    let typesets = parse_value_typesets(&typesets).unwrap();
    let raw = raw.as_object().cloned().unwrap_or_default();
    Value::Object(Caster::new(&registry).cast_values(&raw, &typesets))
}

fn meta_screen() -> Value {
    json!({
        "general": {
            "type": "tabs",
            "wrap": {
                "titles": {
                    "type": "tab",
                    "wrap": {
                        "title_format": { "input_type": "text", "layout": "input-row" },
                        "separator": {
                            "type": "radio",
                            "items": { "-": "Dash", "|": "Pipe" },
                            "conds": { "title_format": { "op": "!=", "value": "" } },
                        },
                    },
                },
                "empty_tab": { "type": "tab", "wrap": {} },
            },
        },
        "archives": {
            "dynamic": { "noindex": { "type": "checkbox" } },
            "input_items": { "category": "Categories", "post_tag": "Tags" },
            "layout": "sideways",
        },
        "broken": { "type": "select" },
        "orphan": { "title": "no type at all" },
    })
}

#[test]
fn validation_is_idempotent() {
    init_logger();
    let once = validate_typesets(&meta_screen());
    let twice = validate_typesets(&typesets_to_value(&once));
    assert_eq!(once, twice);
    assert_eq!(once.keys().collect::<Vec<_>>(), vec!["general", "archives"]);
}

#[test]
fn reserved_left_var_does_not_break_idempotence() {
    let raw = json!({
        "f": {
            "type": "text",
            "conditions": {
                "0": { "left_var": "action", "operator": "==", "right_value": 1 },
                "g": { "operator": "==", "right_value": 2 },
            },
        },
    });
    let once = validate_typesets(&raw);
    let twice = validate_typesets(&typesets_to_value(&once));
    assert_eq!(once, twice);
    let conditions = once["f"].conditions.as_ref().unwrap();
    assert_eq!(conditions.conditions.keys().collect::<Vec<_>>(), vec!["g"]);
}

#[test]
fn shorthand_equals_canonical() {
    let shorthand = validate_typesets(&json!({
        "f": {
            "input_type": "multicheckbox",
            "input_items": { "a": "A" },
            "attr": { "class": "wide" },
            "condition": { "g": { "left": "g", "op": "==", "right_val": 1 } },
            "item_condition": { "a": { "g": { "op": "TRUE", "value": true } } },
        },
        "d": { "type": "dynamic", "items": { "x": "X" }, "dynamic": { "c": { "type": "text" } } },
    }));
    let canonical = validate_typesets(&json!({
        "f": {
            "type": "multi-checkbox",
            "items": { "a": "A" },
            "attrs": { "class": "wide" },
            "conditions": { "g": { "left_var": "g", "operator": "==", "right_value": 1 } },
            "item_conditions": { "a": { "g": { "operator": "TRUE", "right_value": true } } },
        },
        "d": {
            "type": "wrap_dynamic",
            "items": { "x": "X" },
            "wrap_dynamic": { "c": { "type": "text" } },
        },
    }));
    assert_eq!(shorthand, canonical);
}

#[test]
fn invalid_nodes_are_dropped_not_nulled() {
    let typesets = validate_typesets(&meta_screen());
    let tabs = &typesets["general"].wrap;
    assert!(tabs.contains_key("titles"));
    assert!(!tabs.contains_key("empty_tab"));
    assert!(!typesets.contains_key("broken"));
    assert!(!typesets.contains_key("orphan"));
    assert_eq!(
        typesets["archives"].layout,
        typeset::data::types::Layout::LabelInputRow
    );
}

#[test]
fn condition_set_empty_iff_no_complete_entry() {
    let cases = [
        (json!({ "relation": "OR", "action": "hide" }), true),
        (json!({ "a": { "operator": "==" } }), true),
        (json!({ "a": { "right_value": 1 } }), true),
        (json!({ "a": { "operator": "is", "right_value": 1 } }), true),
        (json!({ "a": { "operator": "==", "right_var": "b" } }), false),
        (json!({ "a": { "operator": "==", "right_value": 0 } }), false),
    ];
    for (raw, empty) in cases {
        assert_eq!(validate_condition_set(&raw).is_none(), empty, "{raw}");
    }
}

#[test]
fn numeric_string_casts_to_first_declared_type() {
    assert_eq!(
        cast(json!({ "n": { "type": ["int", "string"], "value": 0 } }), json!({ "n": "5" })),
        json!({ "n": 5 })
    );
}

#[test]
fn string_true_is_not_a_bool() {
    assert_eq!(
        cast(json!({ "b": { "type": "bool", "value": false } }), json!({ "b": "true" })),
        json!({ "b": false })
    );
}

#[test]
fn dynamic_cast_fills_missing_items() {
    let typesets = json!({
        "pt": {
            "type": "cast_dynamic",
            "items": { "a": "A", "b": "B" },
            "cast_dynamic": { "x": { "type": "int", "value": 0 } },
        },
    });
    assert_eq!(
        cast(typesets, json!({ "pt": { "a": { "x": "7" } } })),
        json!({ "pt": { "a": { "x": 7 }, "b": { "x": 0 } } })
    );
}

#[test]
fn dynamic_fill_keeps_existing_data() {
    let typesets = parse_value_typesets(&json!({
        "pt": {
            "type": "cast_dynamic",
            "items": { "k1": "One", "k2": "Two" },
            "value": { "k1": { "meta": { "title": "custom" } } },
            "cast_dynamic": {
                "enable": { "type": "bool", "value": true },
                "meta": {
                    "cast": {
                        "title": { "type": "string", "value": "%title%" },
                        "desc": { "type": "string", "value": "%excerpt%" },
                    },
                },
            },
        },
    }))
    .unwrap();

    let filled = get_defaults(&typesets, DefaultsMode::Fill);
    assert_eq!(
        filled["pt"],
        json!({
            "k1": { "enable": true, "meta": { "title": "custom", "desc": "%excerpt%" } },
            "k2": { "enable": true, "meta": { "title": "%title%", "desc": "%excerpt%" } },
        })
    );

    let blank = get_defaults(&typesets, DefaultsMode::Default);
    assert_eq!(blank["pt"], json!({ "k1": { "meta": { "title": "custom" } } }));
}

#[test]
fn or_relation_with_one_match_shows() {
    let set = validate_condition_set(&json!({
        "relation": "OR",
        "action": "show",
        "fieldA": { "operator": "==", "right_value": 1 },
        "fieldB": { "operator": "==", "right_value": 2 },
    }))
    .unwrap();
    let values = json!({ "fieldA": 1, "fieldB": 5 });
    assert!(evaluate(&set, &values));
    assert_eq!(resolve(&set, &values), Effect::Show);
}

#[test]
fn and_relation_with_one_mismatch_hides() {
    let set = validate_condition_set(&json!({
        "relation": "AND",
        "action": "show",
        "fieldA": { "operator": "==", "right_value": 1 },
        "fieldB": { "operator": "==", "right_value": 2 },
    }))
    .unwrap();
    let values = json!({ "fieldA": 1, "fieldB": 5 });
    assert!(!evaluate(&set, &values));
    assert_eq!(resolve(&set, &values), Effect::Hide);
}
