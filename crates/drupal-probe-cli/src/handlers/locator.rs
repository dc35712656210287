//! Locator command handler

use drupal_probe::{FieldKind, FormField, IdentifiableFormField};
use serde::Serialize;

use crate::commands::{FormatArg, LocatorArgs};
use crate::error::CliResult;
use crate::output::Reporter;

/// Everything the locator command reports for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorReport {
    /// Field name as given
    pub field: String,
    /// Widget kind
    pub kind: FieldKind,
    /// Identifier, independent of position
    pub identifier: String,
    /// Identifier of the current item
    pub current_identifier: String,
    /// XPath of the field wrapper
    pub get: String,
    /// XPath of the current item
    pub get_current: String,
    /// XPath of the add-more button
    pub add_more: String,
    /// XPath of the requested sub-element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl LocatorReport {
    /// Compose every locator of `field`
    #[must_use]
    pub fn new(field: &FormField, element: Option<&str>, add_more_type: &str) -> Self {
        Self {
            field: field.field_name().to_string(),
            kind: field.kind(),
            identifier: field.identifier().to_string(),
            current_identifier: field.current_identifier(),
            get: field.get(""),
            get_current: field.get_current(""),
            add_more: field.add_more(add_more_type),
            element: element.map(|member| field.element(member)),
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("field", self.field.clone()),
            ("kind", self.kind.to_string()),
            ("identifier", self.identifier.clone()),
            ("current", self.current_identifier.clone()),
            ("get", self.get.clone()),
            ("get_current", self.get_current.clone()),
            ("add_more", self.add_more.clone()),
        ];
        if let Some(element) = &self.element {
            rows.push(("element", element.clone()));
        }
        rows
    }
}

/// Build the field described by the arguments, ancestors first
pub fn build_field(args: &LocatorArgs) -> CliResult<FormField> {
    let mut parent: Option<FormField> = None;
    for spec in &args.parents {
        let mut builder = FormField::builder(spec.name.as_str())
            .kind(spec.kind)
            .position(spec.position);
        if let Some(parent) = &parent {
            builder = builder.parent(parent);
        }
        parent = Some(builder.build()?);
    }

    let mut builder = FormField::builder(args.field.as_str())
        .kind(args.kind.into())
        .position(args.position);
    if let Some(parent) = &parent {
        builder = builder.parent(parent);
    }
    Ok(builder.build()?)
}

/// Execute the locator command
pub fn execute_locator(reporter: &Reporter, args: &LocatorArgs) -> CliResult<()> {
    let field = build_field(args)?;
    let report = LocatorReport::new(
        &field,
        args.element.as_deref(),
        args.add_more.as_deref().unwrap_or_default(),
    );

    match args.format {
        FormatArg::Text => reporter.fields(&report.rows()),
        FormatArg::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(drupal_probe::ProbeError::from)?;
            println!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{KindArg, ParentSpec};

    fn args(field: &str) -> LocatorArgs {
        LocatorArgs {
            field: field.to_string(),
            kind: KindArg::Leaf,
            position: 0,
            parents: Vec::new(),
            element: None,
            add_more: None,
            format: FormatArg::Text,
        }
    }

    mod build_tests {
        use super::*;

        #[test]
        fn test_top_level() {
            let field = build_field(&args("field_body")).unwrap();
            assert_eq!(field.identifier(), "edit-field-body");
        }

        #[test]
        fn test_parent_chain() {
            let mut args = args("Target Label");
            args.parents = vec!["field_items@2".parse::<ParentSpec>().unwrap()];
            let field = build_field(&args).unwrap();
            assert_eq!(field.identifier(), "edit-field-items-2-target-label");
        }

        #[test]
        fn test_nested_paragraph_chain() {
            let mut args = args("field_title");
            args.parents = vec![
                "paragraph:field_sections@1".parse().unwrap(),
                "composite:field_teaser".parse().unwrap(),
            ];
            args.position = 3;
            let field = build_field(&args).unwrap();
            assert_eq!(field.current_identifier(), "edit-field-sections-1-subform-field-teaser-field-title-3");
        }

        #[test]
        fn test_invalid_name_is_error() {
            assert!(build_field(&args("  ")).is_err());
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_report_contents() {
            let field = build_field(&args("field_media")).unwrap();
            let report = LocatorReport::new(&field, Some("target_id"), "image");
            assert_eq!(report.current_identifier, "edit-field-media-0");
            assert_eq!(
                report.add_more,
                r#"//*[@data-drupal-selector="edit-field-media-add-more-image"]"#
            );
            assert_eq!(
                report.element.as_deref(),
                Some(r#"//*[@data-drupal-selector="edit-field-media-0-target-id"]"#)
            );
        }

        #[test]
        fn test_json_skips_missing_element() {
            let field = build_field(&args("field_body")).unwrap();
            let json = serde_json::to_value(LocatorReport::new(&field, None, "")).unwrap();
            assert_eq!(json["kind"], "leaf");
            assert!(json.get("element").is_none());
        }
    }
}
