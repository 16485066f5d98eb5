//! Property-based tests for resolution totality.

use proptest::prelude::*;
use std::collections::HashMap;
use strata::key::{KeyName, Segment};
use strata::resolve::{resolve_name, LayerMap};

/// Render a generated template from raw parts
fn template_from(parts: &[TemplatePart]) -> KeyName {
    let rendered: Vec<String> = parts
        .iter()
        .map(|part| match part {
            TemplatePart::Literal(text) => text.clone(),
            TemplatePart::Placeholder(tag) => format!("%{}%", tag),
            TemplatePart::Wildcard => "%".to_string(),
        })
        .collect();
    KeyName::parse(&format!("/{}", rendered.join("/"))).unwrap()
}

#[derive(Debug, Clone)]
enum TemplatePart {
    Literal(String),
    Placeholder(String),
    Wildcard,
}

fn part_strategy() -> impl Strategy<Value = TemplatePart> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(TemplatePart::Literal),
        "[a-z]{1,5}".prop_map(TemplatePart::Placeholder),
        Just(TemplatePart::Wildcard),
    ]
}

fn layers_strategy() -> impl Strategy<Value = LayerMap> {
    proptest::collection::hash_map("[a-z]{1,5}", "[a-z]{1,8}", 0..6)
}

/// Resolution always yields exactly one well-formed, placeholder-free name
#[test]
fn test_resolution_totality_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::collection::vec(part_strategy(), 1..6),
                layers_strategy(),
            ),
            |(parts, layers)| {
                let template = template_from(&parts);
                let resolved = resolve_name(&template, &layers);

                // Total: the result is a well-formed name that re-parses to itself.
                let reparsed = KeyName::parse(&resolved.to_string()).unwrap();
                assert_eq!(reparsed, resolved);

                // No placeholder survives resolution.
                assert!(resolved
                    .segments()
                    .iter()
                    .all(|s| !matches!(s, Segment::Placeholder(_))));

                Ok(())
            },
        )
        .unwrap();
}

/// Unresolved tags degrade to the wildcard segment, position by position
#[test]
fn test_unresolved_tags_degrade_to_wildcard_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::vec(part_strategy(), 1..6),
            |parts| {
                let template = template_from(&parts);
                let resolved = resolve_name(&template, &LayerMap::new());

                assert_eq!(resolved.segments().len(), template.segments().len());
                for (original, result) in template.segments().iter().zip(resolved.segments()) {
                    match original {
                        Segment::Literal(text) => {
                            assert_eq!(result, &Segment::Literal(text.clone()))
                        }
                        Segment::Placeholder(_) | Segment::Wildcard => {
                            assert_eq!(result, &Segment::Wildcard)
                        }
                    }
                }

                Ok(())
            },
        )
        .unwrap();
}

/// Same template and layer snapshot always resolve to the same name
#[test]
fn test_resolution_determinism_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::collection::vec(part_strategy(), 1..6),
                layers_strategy(),
            ),
            |(parts, layers)| {
                let template = template_from(&parts);
                assert_eq!(
                    resolve_name(&template, &layers),
                    resolve_name(&template, &layers)
                );
                Ok(())
            },
        )
        .unwrap();
}

/// An active tag substitutes its current string for every occurrence
#[test]
fn test_active_tag_substitutes_everywhere() {
    let template = KeyName::parse("/%env%/shared/%env%/leaf").unwrap();
    let mut layers = HashMap::new();
    layers.insert("env".to_string(), "prod".to_string());
    assert_eq!(
        resolve_name(&template, &layers).to_string(),
        "/prod/shared/prod/leaf"
    );
}
