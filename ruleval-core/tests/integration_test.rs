//! Integration tests for ruleval-core

use ruleval_core::*;
use ruleval_macro::Introspectable;
use std::collections::BTreeMap;

#[derive(Introspectable)]
pub struct Credentials {
    #[rule(validate = "not_empty,lowercase,min(3),max(16)", label = "Login")]
    pub login: String,
    #[rule(validate = "empty,min(8)")]
    pub password: String,
    #[rule(validate = "not_empty")]
    #[allow(dead_code)]
    secret: String,
}

fn credentials(login: &str, password: &str) -> Credentials {
    Credentials {
        login: login.to_string(),
        password: password.to_string(),
        secret: String::new(),
    }
}

#[test]
fn test_valid_credentials() {
    let report = validate(&credentials("jdoe", "")).unwrap();
    assert!(report.is_empty(), "{}", report);
}

#[test]
fn test_private_fields_are_ignored() {
    let report = validate(&credentials("jdoe", "long enough")).unwrap();
    assert!(report.get_field_errors("secret").is_empty());
}

#[test]
fn test_errors_follow_rule_order() {
    let report = validate(&credentials("JD", "")).unwrap();

    let rules: Vec<&str> = report.iter().map(|e| e.rule.as_str()).collect();
    assert_eq!(rules, vec!["lowercase", "min"]);
    assert_eq!(report.errors[0].message, "Login must be in lower case.");
    assert_eq!(report.errors[1].message, "Login cannot be shorter than 3 characters.");
    assert!(report.iter().all(|e| e.field == "login"));
}

#[test]
fn test_empty_short_circuits() {
    let report = validate(&credentials("jdoe", "")).unwrap();
    assert!(report.get_field_errors("password").is_empty());

    let report = validate(&credentials("jdoe", "short")).unwrap();
    assert_eq!(report.get_field_errors("password").len(), 1);
}

#[derive(Introspectable)]
pub struct Measurement {
    #[rule(validate = "min(5),max(10)")]
    pub reading: f64,
    #[rule(validate = "max(2)")]
    pub labels: BTreeMap<String, String>,
    #[rule(validate = "min(1)")]
    pub samples: Vec<i32>,
    #[rule(validate = "uppercase")]
    pub flag: bool,
}

#[test]
fn test_limits_across_value_kinds() {
    let mut labels = BTreeMap::new();
    labels.insert("a".to_string(), "1".to_string());
    labels.insert("b".to_string(), "2".to_string());
    labels.insert("c".to_string(), "3".to_string());

    let measurement = Measurement {
        reading: 10.5,
        labels,
        samples: vec![],
        flag: true,
    };

    let report = validate(&measurement).unwrap();
    let messages: Vec<&str> = report.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "reading cannot be greater than 10.",
            "labels cannot contain more keys than 2.",
            "samples cannot contain fewer items than 1.",
            "Validator 'uppercase' does not support boolean values on struct 'Measurement' and field 'flag'.",
        ]
    );
}

#[test]
fn test_invalid_rule_arguments_are_reported() {
    #[derive(Introspectable)]
    pub struct Bad {
        #[rule(validate = "min(abc)")]
        pub value: i32,
    }

    let report = validate(&Bad { value: 1 }).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].rule, "min");
    assert_eq!(
        report.errors[0].message,
        "Unable to parse 'min' validator value 'abc'."
    );
}

#[test]
fn test_annotation_error_fails_validation() {
    #[derive(Introspectable)]
    pub struct Typo {
        #[rule(validate = "not_empty,,min(1)")]
        pub name: String,
    }

    let err = validate(&Typo {
        name: "x".to_string(),
    })
    .unwrap_err();

    assert_eq!(err.type_name, "Typo");
    assert_eq!(err.field, "name");
    assert!(matches!(err.source, ParseError::EmptyRule { .. }));
}

#[derive(Introspectable)]
pub struct Shipment {
    #[rule(validate = "func")]
    pub weight: i64,
    #[rule(validate = "func(check_route)")]
    pub route: String,
    #[rule(validate = "func")]
    pub missing: String,
}

fn register_shipment_methods() {
    register_method::<Shipment, _>("validate_weight", |shipment, _context, _options| {
        if shipment.weight > 1000 {
            Err(ValidationFailure::new("{field} of {struct} is too heavy."))
        } else {
            Ok(())
        }
    });

    register_method::<Shipment, _>("check_route", |_shipment, context, _options| {
        match context.value().as_str() {
            Some(route) if route.contains("->") => Ok(()),
            _ => Err(ValidationFailure::new("{field} must look like 'A->B'.")),
        }
    });
}

#[test]
fn test_func_calls_record_methods() {
    register_shipment_methods();

    let shipment = Shipment {
        weight: 1200,
        route: "nowhere".to_string(),
        missing: String::new(),
    };

    let report = validate(&shipment).unwrap();
    let messages: Vec<&str> = report.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "weight of Shipment is too heavy.",
            "route must look like 'A->B'.",
            "Validation method 'validate_missing' on field 'missing' does not exist.",
        ]
    );
    assert!(report.iter().all(|e| e.rule == "func"));
}

#[test]
fn test_func_rejects_mismatched_signatures() {
    #[derive(Introspectable)]
    pub struct Odd {
        #[rule(validate = "func")]
        pub value: i32,
    }

    register_raw_method::<Odd, _>("validate_value", vec![ParamKind::Value], |_odd, _args| {
        vec![Returned::Unit]
    });

    let report = validate(&Odd { value: 1 }).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.errors[0].message,
        "Invalid return value(s) of validation method 'validate_value'. Return value must be of type 'error'."
    );
}

#[test]
fn test_func_rejects_unexpected_returns() {
    #[derive(Introspectable)]
    pub struct Chatty {
        #[rule(validate = "func")]
        pub value: i32,
    }

    register_raw_method::<Chatty, _>(
        "validate_value",
        vec![ParamKind::Context, ParamKind::Options],
        |_chatty, _args| vec![Returned::Unit, Returned::Other("String")],
    );

    let report = validate(&Chatty { value: 1 }).unwrap();
    assert_eq!(report.len(), 1);
    assert!(report.errors[0].message.starts_with("Invalid return value(s)"));
}

#[test]
fn test_func_path_includes_enclosing_field() {
    #[derive(Introspectable)]
    pub struct Leaf {
        #[rule(validate = "func")]
        pub code: String,
    }

    #[derive(Introspectable)]
    pub struct Branch {
        pub leaf: Leaf,
    }

    let branch = Branch {
        leaf: Leaf {
            code: String::new(),
        },
    };

    let report = validate(&branch).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].field, "leaf.code");
    assert_eq!(
        report.errors[0].message,
        "Validation method 'leaf.validate_code' on field 'leaf.code' does not exist."
    );
}

#[test]
fn test_skipped_fields_are_not_walked() {
    #[derive(Introspectable)]
    pub struct Draft {
        #[rule(validate = "not_empty", skip)]
        pub body: String,
        #[rule(validate = "not_empty")]
        pub title: String,
    }

    let report = validate(&Draft {
        body: String::new(),
        title: String::new(),
    })
    .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].field, "title");
}

#[test]
fn test_custom_tags() {
    #[derive(Introspectable)]
    pub struct Tagged {
        #[rule(check = "max(3)", title = "Short code")]
        pub code: String,
    }

    let engine = ValidationEngine::new().with_config(
        EngineConfig::new()
            .with_rule_tag("check")
            .with_display_tag(Some("title")),
    );

    let report = engine
        .validate(&Tagged {
            code: "ABCD".to_string(),
        })
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(
        report.errors[0].message,
        "Short code is longer than 3 characters."
    );
}

#[test]
fn test_global_registration_is_used() {
    #[derive(Introspectable)]
    pub struct Ticket {
        #[rule(validate = "starts_with_t")]
        pub id: String,
    }

    register("starts_with_t", |context, _options| {
        match context.value().as_str() {
            Some(text) if text.starts_with('T') => Ok(()),
            _ => Err(ValidationFailure::new("{field} must start with 'T'.")),
        }
    });

    assert!(validate(&Ticket { id: "T-1".to_string() }).unwrap().is_empty());
    assert_eq!(
        validate(&Ticket { id: "X-1".to_string() }).unwrap().len(),
        1
    );
}
