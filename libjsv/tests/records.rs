//! Fixture-driven round-trip coverage: canonical template text, template
//! equality across spellings and construction paths, and record coding for
//! each well-formed template.

use libjsv::{RecordError, Template, TemplateError};
use serde_json::{json, Value};

struct Fixture {
    template: &'static str,
    /// Spellings that canonicalize to (and equal) `template`.
    alt_templates: &'static [&'static str],
    /// Sample records that infer a template equal to `template`.
    sample_values: fn() -> Vec<Value>,
    /// `(record_text, decoded)` pairs that hold in both directions.
    records: fn() -> Vec<(&'static str, Value)>,
    /// `(record_text, message)` pairs for records the template rejects.
    invalid_records: &'static [(&'static str, &'static str)],
}

const NO_SAMPLES: fn() -> Vec<Value> = Vec::new;
const NO_RECORDS: fn() -> Vec<(&'static str, Value)> = Vec::new;

fn fixtures() -> Vec<Fixture> {
    vec![
        Fixture {
            template: "[{\"key_1\"}]",
            alt_templates: &[
                "[{ \"key_1\" \t }   \n]",
                "[ {  \"key_1\" \t}\n]",
                "[{ \"key_1\" : []}]",
                "[{\"key_1\"},{\"key_1\"}]",
            ],
            sample_values: || vec![json!([{"key_1": null}])],
            records: || {
                vec![
                    ("[{1}]", json!([{"key_1": 1}])),
                    (
                        "[{1},{\"two\"},{3.0}]",
                        json!([{"key_1": 1}, {"key_1": "two"}, {"key_1": 3.0}]),
                    ),
                ]
            },
            invalid_records: &[],
        },
        Fixture {
            template: "{\"key_1\":[{\"key_2\",\"key_3\"}]}",
            alt_templates: &[],
            sample_values: || {
                vec![json!({
                    "key_1": [
                        {"key_2": [2, 3, 4], "key_3": null},
                        {"key_2": "value", "key_3": true}
                    ]
                })]
            },
            records: || {
                vec![
                    (
                        "{[{\"two\",3}]}",
                        json!({"key_1": [{"key_2": "two", "key_3": 3}]}),
                    ),
                    (
                        "{[{\"two\",3},{4,\"five\"}],\"key_4\":{\"sub_key\":\"value\"}}",
                        json!({
                            "key_1": [
                                {"key_2": "two", "key_3": 3},
                                {"key_2": 4, "key_3": "five"}
                            ],
                            "key_4": {"sub_key": "value"}
                        }),
                    ),
                ]
            },
            invalid_records: &[],
        },
        Fixture {
            template: "{\"key_1\",\"key_2\",\"key_3\",\"key_4\"}",
            alt_templates: &[],
            sample_values: NO_SAMPLES,
            records: || {
                vec![
                    (
                        "{1,2,3,4}",
                        json!({"key_1": 1, "key_2": 2, "key_3": 3, "key_4": 4}),
                    ),
                    (
                        "{1,2,3,4,\"key_5\":5}",
                        json!({"key_1": 1, "key_2": 2, "key_3": 3, "key_4": 4, "key_5": 5}),
                    ),
                    (
                        "{1,2,3,4,\"key_5\":5,\"key_6\":\"six\"}",
                        json!({
                            "key_1": 1, "key_2": 2, "key_3": 3, "key_4": 4,
                            "key_5": 5, "key_6": "six"
                        }),
                    ),
                    ("{1,,3,}", json!({"key_1": 1, "key_3": 3})),
                    (
                        "{1,2,3,,\"key_5\":5}",
                        json!({"key_1": 1, "key_2": 2, "key_3": 3, "key_5": 5}),
                    ),
                ]
            },
            invalid_records: &[
                ("{1,2,3,,}", "Expecting `\"`: column 8"),
                (
                    "{1,2,3,4,",
                    "End of string reached unexpectedly while awaiting `\"`: column 8",
                ),
            ],
        },
        Fixture {
            template: "{\"key_1\":{\"key_1_1\"},\"key_2\"}",
            alt_templates: &[],
            sample_values: NO_SAMPLES,
            records: NO_RECORDS,
            invalid_records: &[],
        },
        Fixture {
            template: "[{\"key_1\"},]",
            alt_templates: &[],
            sample_values: NO_SAMPLES,
            records: || {
                vec![(
                    "[{\"value_1\"},3,{\"key_2\":\"value_2\"}]",
                    json!([{"key_1": "value_1"}, 3, {"key_2": "value_2"}]),
                )]
            },
            invalid_records: &[],
        },
        Fixture {
            template: "[[{\"key_1\"}]]",
            alt_templates: &[
                "[[{\"key_1\"}],[{\"key_1\"}]]",
                "[[{\"key_1\"},{\"key_1\"}]]",
                "[[{\"key_1\"},{\"key_1\"}],[{\"key_1\"},{\"key_1\"}]]",
            ],
            sample_values: NO_SAMPLES,
            records: NO_RECORDS,
            invalid_records: &[],
        },
    ]
}

fn compile(source: &str) -> Template {
    match Template::compile(source) {
        Ok(template) => template,
        Err(err) => panic!("template {:?} failed to compile: {}", source, err),
    }
}

#[test]
fn test_canonical_text_is_stable() {
    for fixture in fixtures() {
        let template = compile(fixture.template);
        assert_eq!(template.to_string(), fixture.template);
        // Canonicalization is idempotent.
        let again = compile(&template.to_string());
        assert_eq!(again.to_string(), fixture.template);
    }
}

#[test]
fn test_alt_spellings_canonicalize() {
    for fixture in fixtures() {
        for alt in fixture.alt_templates {
            let template = compile(alt);
            assert_eq!(
                template.to_string(),
                fixture.template,
                "spelling {:?}",
                alt
            );
        }
    }
}

#[test]
fn test_alt_spellings_compare_equal() {
    for fixture in fixtures() {
        let reference = compile(fixture.template);
        for alt in fixture.alt_templates {
            assert_eq!(compile(alt), reference, "spelling {:?}", alt);
        }
    }
}

#[test]
fn test_distinct_templates_compare_unequal() {
    let all = fixtures();
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert_ne!(compile(a.template), compile(b.template));
        }
    }
}

#[test]
fn test_inferred_templates_match() {
    for fixture in fixtures() {
        let reference = compile(fixture.template);
        for sample in (fixture.sample_values)() {
            assert_eq!(
                Template::from_value(&sample),
                reference,
                "sample {}",
                sample
            );
        }
    }
}

#[test]
fn test_encode_records() {
    for fixture in fixtures() {
        let template = compile(fixture.template);
        for (text, value) in (fixture.records)() {
            match template.encode(&value) {
                Ok(encoded) => assert_eq!(encoded, text, "template {:?}", fixture.template),
                Err(err) => panic!("encoding {} against {:?}: {}", value, fixture.template, err),
            }
        }
    }
}

#[test]
fn test_decode_records() {
    for fixture in fixtures() {
        let template = compile(fixture.template);
        for (text, value) in (fixture.records)() {
            match template.decode(text) {
                Ok(decoded) => assert_eq!(decoded, value, "record {:?}", text),
                Err(err) => panic!("decoding {:?} against {:?}: {}", text, fixture.template, err),
            }
        }
    }
}

#[test]
fn test_round_trip() {
    for fixture in fixtures() {
        let template = compile(fixture.template);
        for (_, value) in (fixture.records)() {
            let encoded = template.encode(&value).unwrap();
            assert_eq!(template.decode(&encoded).unwrap(), value);
        }
    }
}

#[test]
fn test_invalid_records() {
    for fixture in fixtures() {
        let template = compile(fixture.template);
        for (text, message) in fixture.invalid_records {
            match template.decode(text) {
                Ok(value) => panic!("{:?} decoded to {} unexpectedly", text, value),
                Err(err) => assert_eq!(&err.to_string(), message),
            }
        }
    }
}

#[test]
fn test_malformed_templates() {
    let err = Template::compile("{\"key_1\"").unwrap_err();
    assert_eq!(
        err.to_string(),
        "End of string reached unexpectedly: column 7"
    );
    assert!(matches!(err, TemplateError::UnexpectedEnd { column: 7 }));

    let err = Template::compile("{}").unwrap_err();
    assert_eq!(err.to_string(), "Object must contain at least 1 key: column 1");
}

#[test]
fn test_keyless_array_templates_are_wildcards() {
    // A template with no keys anywhere elides nothing, so every spelling
    // of a keyless composite compiles to the wildcard template and both
    // codec directions pass arbitrary JSON through. The wildcard's
    // canonical `{}` is the one text the grammar itself does not accept,
    // so it is pinned here rather than in the fixture database.
    let template = compile("[,]");
    assert_eq!(template.to_string(), "{}");
    assert_eq!(template, compile("[]"));
    assert_eq!(template, compile("[[],[]]"));
    assert_eq!(template, Template::from_value(&json!([[1, 2]])));
    for value in [json!({"a": 1}), json!([1, 2]), json!(5), json!(null)] {
        let encoded = template.encode(&value).unwrap();
        assert_eq!(template.decode(&encoded).unwrap(), value, "value {}", value);
    }
}

#[test]
fn test_keyless_array_element_round_trips() {
    let template = compile("[{\"key_1\"},[]]");
    assert_eq!(template.to_string(), "[{\"key_1\"},]");
    let value = json!([{"key_1": 1}, [2, 3], {"key_2": 4}]);
    let encoded = template.encode(&value).unwrap();
    assert_eq!(encoded, "[{1},[2,3],{\"key_2\":4}]");
    assert_eq!(template.decode(&encoded).unwrap(), value);
}

#[test]
fn test_wildcard_template_passes_values_through() {
    let template = Template::from_value(&json!(null));
    assert_eq!(template.to_string(), "{}");
    let value = json!({"key_1": 1, "nested": [1, 2, {"deep": true}]});
    let encoded = template.encode(&value).unwrap();
    assert_eq!(template.decode(&encoded).unwrap(), value);
}

#[test]
fn test_omission_round_trip() {
    let template = compile("{\"key_1\",\"key_2\",\"key_3\",\"key_4\"}");
    let value = json!({"key_1": 1, "key_3": 3});
    let encoded = template.encode(&value).unwrap();
    assert_eq!(encoded, "{1,,3,}");
    let decoded = template.decode(&encoded).unwrap();
    assert_eq!(decoded, value);
    assert!(decoded.get("key_2").is_none());
}

#[test]
fn test_nested_repeating_arrays() {
    let template = compile("[[{\"key_1\"}]]");
    let value = json!([
        [{"key_1": 1}, {"key_1": 2}],
        [{"key_1": 3}],
        [{"key_1": 4}, {"key_1": 5}, {"key_1": 6}]
    ]);
    let encoded = template.encode(&value).unwrap();
    assert_eq!(encoded, "[[{1},{2}],[{3}],[{4},{5},{6}]]");
    assert_eq!(template.decode(&encoded).unwrap(), value);
}

#[test]
fn test_decode_preserves_key_order() {
    let template = compile("{\"key_1\",\"key_2\"}");
    let decoded = template.decode("{1,2,\"key_0\":0}").unwrap();
    let keys: Vec<&String> = decoded.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["key_1", "key_2", "key_0"]);
}

#[test]
fn test_record_error_is_typed() {
    let template = compile("[{\"key_1\"}]");
    let err = template.decode("{\"key_1\":1}").unwrap_err();
    assert!(matches!(err, RecordError::UnexpectedCharacter { .. }));
    assert_eq!(err.to_string(), "Expecting `[`: column 0");
}

#[test]
fn test_templates_share_across_threads() {
    let template = std::sync::Arc::new(compile("[{\"key_1\"}]"));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let template = std::sync::Arc::clone(&template);
            std::thread::spawn(move || {
                let value = json!([{"key_1": i}]);
                let encoded = template.encode(&value).unwrap();
                assert_eq!(template.decode(&encoded).unwrap(), value);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
