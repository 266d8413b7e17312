//! Fuzz target for rule annotation parsing.
//!
//! Parsed rules rendered back in canonical form must parse to the same rules,
//! and errors must point inside the annotation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ruleval_core::parse;

fuzz_target!(|annotation: &str| {
    match parse(annotation) {
        Ok(rules) => {
            let canonical = rules
                .iter()
                .map(|rule| rule.to_string())
                .collect::<Vec<_>>()
                .join(",");

            let reparsed = parse(&canonical).expect("canonical form must parse");
            assert_eq!(rules, reparsed);
        }
        Err(err) => {
            assert!(err.position() <= annotation.len());
            assert_eq!(err.annotation(), annotation);
        }
    }
});
