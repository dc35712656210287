//! Property-based tests for drupal-probe.
//!
//! Uses proptest to verify identifier composition invariants hold for
//! arbitrary field names and positions.

#![allow(clippy::unwrap_used)]

use drupal_probe::prelude::*;
use proptest::prelude::*;

/// Field names the form markup can produce: letters, digits, spaces, underscores
fn field_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_ ]{0,24}"
}

fn kind() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::Leaf),
        Just(FieldKind::Composite),
        Just(FieldKind::Paragraph),
    ]
}

// === Normalization ===

proptest! {
    /// Normalizing twice changes nothing.
    #[test]
    fn prop_normalize_idempotent(s in "\\PC{0,30}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    /// Normalized names carry no spaces, underscores or upper-case ASCII.
    #[test]
    fn prop_normalize_output_shape(name in field_name()) {
        let normalized = normalize(&name);
        prop_assert!(!normalized.contains(' '));
        prop_assert!(!normalized.contains('_'));
        prop_assert!(!normalized.chars().any(|c| c.is_ascii_uppercase()));
    }
}

// === Identifier composition ===

proptest! {
    /// Top-level identifiers are the root prefix plus the normalized name.
    #[test]
    fn prop_top_level_identifier(name in field_name(), kind in kind()) {
        let field = FormField::builder(name.as_str()).kind(kind).build().unwrap();
        prop_assert_eq!(field.identifier(), format!("{ROOT_PREFIX}{}", normalize(&name)));
    }

    /// Nested identifiers extend the parent's current identifier.
    #[test]
    fn prop_nested_identifier(
        parent_name in field_name(),
        parent_kind in kind(),
        position in 0usize..50,
        name in field_name(),
    ) {
        let parent = FormField::builder(parent_name.as_str())
            .kind(parent_kind)
            .position(position)
            .build()
            .unwrap();
        let child = FormField::child(name.as_str(), &parent).unwrap();
        prop_assert_eq!(
            child.identifier(),
            format!("{}-{}", parent.current_identifier(), normalize(&name))
        );
    }

    /// The identifier does not follow later moves of the parent.
    #[test]
    fn prop_identifier_computed_once(name in field_name(), steps in 1usize..10) {
        let mut parent = FormField::new("field_items").unwrap();
        let child = FormField::child(name.as_str(), &parent).unwrap();
        let before = child.identifier().to_string();
        for _ in 0..steps {
            let _ = parent.next();
        }
        prop_assert_eq!(child.identifier(), before.as_str());
    }

    /// Paragraph items are addressed as `<id>-<position>-subform`.
    #[test]
    fn prop_paragraph_current_identifier(name in field_name(), position in 0usize..100) {
        let field = FormField::builder(name.as_str())
            .kind(FieldKind::Paragraph)
            .position(position)
            .build()
            .unwrap();
        let suffix = format!("-{position}-subform");
        prop_assert!(field.current_identifier().ends_with(&suffix));
    }

    /// Composite sub-forms ignore the position entirely.
    #[test]
    fn prop_composite_current_identifier(name in field_name(), position in 0usize..100) {
        let field = FormField::builder(name.as_str())
            .kind(FieldKind::Composite)
            .position(position)
            .build()
            .unwrap();
        prop_assert_eq!(field.current_identifier(), field.identifier());
    }

    /// Locators never leak template placeholders.
    #[test]
    fn prop_locators_fully_resolved(name in field_name(), kind in kind(), member in "[a-z_]{0,12}") {
        let field = FormField::builder(name.as_str()).kind(kind).build().unwrap();
        for xpath in [field.get(&member), field.get_current(&member), field.element(&member), field.add_more(&member)] {
            prop_assert!(unresolved_placeholders(&xpath).is_empty(), "leaked placeholder in {}", xpath);
            prop_assert!(xpath.starts_with("//*[@data-drupal-selector=\""));
        }
    }
}

// === Position navigation ===

proptest! {
    /// `next` then `previous` restores the position.
    #[test]
    fn prop_next_previous_round_trip(start in 0usize..1000) {
        let mut field = FormField::builder("field_items").position(start).build().unwrap();
        let _ = field.next().previous();
        prop_assert_eq!(field.position(), start);
    }

    /// `previous` never goes below zero.
    #[test]
    fn prop_previous_saturates(steps in 1usize..20) {
        let mut field = FormField::new("field_items").unwrap();
        for _ in 0..steps {
            let _ = field.previous();
        }
        prop_assert_eq!(field.position(), 0);
    }
}

// === Pattern resolution ===

proptest! {
    /// Per-call overrides win over template defaults.
    #[test]
    fn prop_override_wins(default in "[a-z]{1,8}", value in "[a-z]{1,8}") {
        let template = XpathTemplate::new("//{element}").with_replacement("element", default.as_str());
        prop_assert_eq!(template.xpath(&[("element", value.as_str())]), format!("//{value}"));
    }

    /// Text without placeholders is left untouched.
    #[test]
    fn prop_resolve_without_placeholders(text in "[a-z/@\\[\\]=\" ]{0,40}") {
        let values = std::collections::BTreeMap::from([("element", "div")]);
        prop_assert_eq!(resolve(&text, &values), text);
    }
}
