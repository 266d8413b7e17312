//! Integration tests for common validation workflows.
//!
//! These tests go through the facade crate the way an application would.

use ruleval::*;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

// =============================================================================
// Records
// =============================================================================

#[derive(Introspectable)]
pub struct LineItem {
    #[rule(validate = "not_empty", label = "Product")]
    pub product: String,
    #[rule(validate = "min(1),max(99)")]
    pub quantity: u32,
}

#[derive(Introspectable)]
pub struct Invoice {
    #[rule(validate = "not_empty,uppercase,min(3)", label = "Invoice number")]
    pub number: String,
    #[rule(validate = "numeric,min(1),max(31)")]
    pub due_day: String,
    pub items: Vec<LineItem>,
    #[rule(validate = "max(3)")]
    pub metadata: HashMap<String, String>,
    pub billing: Option<Address>,
}

#[derive(Introspectable)]
pub struct Address {
    #[rule(validate = "not_empty", label = "Street")]
    pub street: String,
    #[rule(validate = "empty,numeric")]
    pub zip: String,
}

fn item(product: &str, quantity: u32) -> LineItem {
    LineItem {
        product: product.to_string(),
        quantity,
    }
}

fn invoice() -> Invoice {
    Invoice {
        number: "INV-001".to_string(),
        due_day: "15".to_string(),
        items: vec![item("widget", 2)],
        metadata: HashMap::new(),
        billing: None,
    }
}

// =============================================================================
// Walk Tests
// =============================================================================

#[test]
fn test_valid_invoice() {
    let report = validate(&invoice()).unwrap();
    assert!(report.is_empty(), "{}", report);
    assert!(report.into_result().is_ok());
}

#[test]
fn test_introspection_is_idempotent() {
    let invoice = invoice();
    let first = fields(&invoice, "validate", Some("label")).unwrap();
    let second = fields(&invoice, "validate", Some("label")).unwrap();

    assert_eq!(first, second);
    let names: Vec<&str> = first.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["number", "due_day", "items", "metadata", "billing"]);
}

#[test]
fn test_rule_order_is_preserved() {
    let mut invoice = invoice();
    invoice.number = "in".to_string();

    let report = validate(&invoice).unwrap();
    let rules: Vec<&str> = report.iter().map(|e| e.rule.as_str()).collect();
    assert_eq!(rules, vec!["uppercase", "min"]);
    assert_eq!(
        report.errors[1].message,
        "Invoice number cannot be shorter than 3 characters."
    );
}

#[test]
fn test_nested_sequence_errors_carry_index_paths() {
    let mut invoice = invoice();
    invoice.items = vec![item("", 1), item("bolt", 0), item("nut", 1), item("", 100)];

    let report = validate(&invoice).unwrap();
    let fields: Vec<&str> = report.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(
        fields,
        vec![
            "items.0.product",
            "items.1.quantity",
            "items.3.product",
            "items.3.quantity",
        ]
    );
    assert_eq!(report.errors[0].message, "items.0.Product cannot be empty.");
    assert_eq!(
        report.errors[3].message,
        "items.3.quantity cannot be greater than 99."
    );
}

#[test]
fn test_three_failing_nested_records() {
    let mut invoice = invoice();
    invoice.items = vec![item("", 1), item("", 1), item("", 1)];

    let report = validate(&invoice).unwrap();
    assert_eq!(report.len(), 3);
    for (index, error) in report.iter().enumerate() {
        assert!(error.field.starts_with(&format!("items.{}.", index)));
    }
}

#[test]
fn test_coerced_value_is_checked_as_number() {
    let mut invoice = invoice();
    invoice.due_day = "40".to_string();

    let report = validate(&invoice).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].rule, "max");
    assert_eq!(report.errors[0].message, "due_day cannot be greater than 31.");

    invoice.due_day = "4O".to_string();
    let report = validate(&invoice).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].rule, "numeric");
    assert_eq!(report.errors[0].message, "due_day must contain numbers only.");
}

#[test]
fn test_optional_record_is_walked_when_present() {
    let mut invoice = invoice();
    invoice.billing = Some(Address {
        street: String::new(),
        zip: String::new(),
    });

    let report = validate(&invoice).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].field, "billing.street");
    assert_eq!(report.errors[0].message, "billing.Street cannot be empty.");
}

#[test]
fn test_empty_short_circuits_remaining_rules() {
    let address = Address {
        street: "Main St".to_string(),
        zip: String::new(),
    };
    assert!(validate(&address).unwrap().is_empty());

    let address = Address {
        street: "Main St".to_string(),
        zip: "ABC".to_string(),
    };
    let report = validate(&address).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].rule, "numeric");
}

#[test]
fn test_map_values_are_walked_in_key_order() {
    #[derive(Introspectable)]
    pub struct Catalog {
        pub sections: HashMap<String, LineItem>,
    }

    let mut sections = HashMap::new();
    sections.insert("tools".to_string(), item("", 1));
    sections.insert("bolts".to_string(), item("", 1));
    sections.insert("nuts".to_string(), item("nut", 1));

    let report = validate(&Catalog { sections }).unwrap();
    let fields: Vec<&str> = report.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["sections.bolts.product", "sections.tools.product"]);
}

#[test]
fn test_map_limits() {
    let mut invoice = invoice();
    for key in ["a", "b", "c", "d"] {
        invoice.metadata.insert(key.to_string(), "x".to_string());
    }

    let report = validate(&invoice).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.errors[0].message,
        "metadata cannot contain more keys than 3."
    );
}

// =============================================================================
// Rule Resolution Tests
// =============================================================================

#[test]
fn test_unknown_rule_is_isolated() {
    #[derive(Introspectable)]
    pub struct Pair {
        #[rule(validate = "min(2)")]
        pub a: String,
        #[rule(validate = "bogus")]
        pub b: String,
    }

    let report = validate(&Pair {
        a: "valid".to_string(),
        b: String::new(),
    })
    .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.errors[0].field, "b");
    assert_eq!(report.errors[0].rule, "bogus");
    assert_eq!(
        report.errors[0].message,
        "Validator 'bogus' used on field 'b' does not exist."
    );
}

#[test]
fn test_range_boundaries_are_inclusive() {
    #[derive(Introspectable)]
    pub struct Bounds {
        #[rule(validate = "min(5)")]
        pub low_text: String,
        #[rule(validate = "max(5)")]
        pub high_text: String,
        #[rule(validate = "min(5)")]
        pub low_number: i32,
        #[rule(validate = "max(5)")]
        pub high_number: i32,
    }

    let check = |text_len: usize, number: i32| {
        let text = "x".repeat(text_len);
        let report = validate(&Bounds {
            low_text: text.clone(),
            high_text: text,
            low_number: number,
            high_number: number,
        })
        .unwrap();
        report
            .iter()
            .map(|e| e.field.clone())
            .collect::<Vec<String>>()
    };

    assert_eq!(check(4, 4), vec!["low_text", "low_number"]);
    assert!(check(5, 5).is_empty());
    assert_eq!(check(6, 6), vec!["high_text", "high_number"]);
}

#[test]
fn test_malformed_annotation_fails_the_call() {
    #[derive(Introspectable)]
    pub struct Broken {
        #[rule(validate = "min(2")]
        pub name: String,
    }

    let err = validate(&Broken {
        name: "x".to_string(),
    })
    .unwrap_err();

    assert!(matches!(err.source, ParseError::UnclosedArguments { .. }));
    assert!(err.to_string().starts_with("invalid rule annotation on Broken.name"));
}

#[test]
fn test_custom_method_validator() {
    #[derive(Introspectable)]
    pub struct Reservation {
        pub nights: i64,
        #[rule(validate = "func")]
        pub guests: i64,
    }

    register_method::<Reservation, _>("validate_guests", |reservation, context, _options| {
        match context.value().as_int() {
            Some(guests) if guests > reservation.nights * 4 => {
                Err(ValidationFailure::new("{field} exceeds the capacity of {struct}."))
            }
            _ => Ok(()),
        }
    });

    let report = validate(&Reservation {
        nights: 1,
        guests: 5,
    })
    .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.errors[0].message,
        "guests exceeds the capacity of Reservation."
    );

    assert!(
        validate(&Reservation {
            nights: 2,
            guests: 5,
        })
        .unwrap()
        .is_empty()
    );
}

// =============================================================================
// Report Tests
// =============================================================================

#[test]
fn test_report_to_json() {
    let mut invoice = invoice();
    invoice.number = String::new();

    let report = validate(&invoice).unwrap();
    let json = report.to_json();

    assert_eq!(json["errors"][0]["field"], "number");
    assert_eq!(json["errors"][0]["rule"], "not_empty");
    assert_eq!(json["errors"][0]["message"], "Invoice number cannot be empty.");

    let serialized = serde_json::to_value(&report).unwrap();
    assert_eq!(serialized, json);
}

#[test]
fn test_report_into_result() {
    let mut invoice = invoice();
    invoice.items = vec![item("", 1)];

    let err = validate(&invoice).unwrap().into_result().unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.to_string(), "items.0.product: items.0.Product cannot be empty.\n");
}

#[test]
fn test_validation_with_tracing_enabled() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("ruleval_core=trace"))
        .with_test_writer()
        .try_init();

    let mut invoice = invoice();
    invoice.number = "x".to_string();

    let report = validate(&invoice).unwrap();
    assert_eq!(report.len(), 2);
}
