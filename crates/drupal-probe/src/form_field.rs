//! Form field locator composition.
//!
//! Drupal renders every form element with a `data-drupal-selector` attribute
//! derived from the field's machine name, its containing widgets and, for
//! multi-value widgets, the delta of the item. [`FormField`] rebuilds those
//! identifiers so a test can address any control in arbitrarily nested,
//! repeatable sub-forms:
//!
//! ```text
//! edit-field-items                       field_items (identifier)
//! edit-field-items-2                     field_items at position 2 (current)
//! edit-field-items-2-target-label        "Target Label" nested under it
//! edit-field-items-add-more              the field's "add another item" button
//! ```
//!
//! Identifiers are composed once, at construction. Moving a parent with
//! [`FormField::next`] does not update children built earlier; build a new
//! child after moving the parent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::xpath::XpathTemplate;

/// Prefix of every top-level form element identifier
pub const ROOT_PREFIX: &str = "edit-";

/// Anything that can act as the parent of a form field.
pub trait IdentifiableFormField {
    /// The field's own identifier, independent of position
    fn identifier(&self) -> &str;

    /// The identifier children are composed under
    fn current_identifier(&self) -> String;
}

/// Lowercase `value` and turn every space and underscore into a hyphen.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.to_lowercase().replace([' ', '_'], "-")
}

/// Widget shape of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Multi-value leaf widget (text, link, entity reference)
    #[default]
    Leaf,
    /// Single embedded sub-form, addressed without a delta
    Composite,
    /// One of many removable embedded sub-forms (paragraphs)
    Paragraph,
}

impl FieldKind {
    /// Kind name as accepted by [`FromStr`]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Composite => "composite",
            Self::Paragraph => "paragraph",
        }
    }

    /// Whether the position takes part in the identifiers
    #[must_use]
    pub const fn is_positional(self) -> bool {
        matches!(self, Self::Leaf | Self::Paragraph)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "leaf" | "field" => Ok(Self::Leaf),
            "composite" | "mto" => Ok(Self::Composite),
            "paragraph" => Ok(Self::Paragraph),
            other => Err(ProbeError::config(format!(
                "unknown field kind '{other}' (expected leaf, composite or paragraph)"
            ))),
        }
    }
}

fn validate_field_name(name: &str) -> ProbeResult<()> {
    let reason = if name.trim().is_empty() {
        "field name is empty"
    } else if name.contains('"') {
        "field name contains a double quote"
    } else {
        return Ok(());
    };
    Err(ProbeError::InvalidFieldName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

/// Builder for [`FormField`]
#[derive(Debug, Clone)]
pub struct FormFieldBuilder {
    field_name: String,
    kind: FieldKind,
    parent: Option<String>,
    position: usize,
    template: XpathTemplate,
}

impl FormFieldBuilder {
    /// Set the widget kind
    #[must_use]
    pub const fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Nest the field under `parent`'s current identifier
    #[must_use]
    pub fn parent(mut self, parent: &dyn IdentifiableFormField) -> Self {
        self.parent = Some(parent.current_identifier());
        self
    }

    /// Set the starting position
    #[must_use]
    pub const fn position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Use a custom xpath template
    #[must_use]
    pub fn template(mut self, template: XpathTemplate) -> Self {
        self.template = template;
        self
    }

    /// Validate the name and compose the identifier
    pub fn build(self) -> ProbeResult<FormField> {
        validate_field_name(&self.field_name)?;
        let prefix = self
            .parent
            .as_ref()
            .map_or_else(|| ROOT_PREFIX.to_string(), |parent| format!("{parent}-"));
        let identifier = format!("{prefix}{}", normalize(&self.field_name));
        Ok(FormField {
            field_name: self.field_name,
            kind: self.kind,
            parent: self.parent,
            position: self.position,
            identifier,
            template: self.template,
        })
    }
}

/// Locator composer for one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    field_name: String,
    kind: FieldKind,
    parent: Option<String>,
    position: usize,
    identifier: String,
    template: XpathTemplate,
}

impl FormField {
    /// Start building a field
    #[must_use]
    pub fn builder(field_name: impl Into<String>) -> FormFieldBuilder {
        FormFieldBuilder {
            field_name: field_name.into(),
            kind: FieldKind::Leaf,
            parent: None,
            position: 0,
            template: XpathTemplate::drupal_selector(),
        }
    }

    /// Top-level multi-value leaf field at position 0
    pub fn new(field_name: impl Into<String>) -> ProbeResult<Self> {
        Self::builder(field_name).build()
    }

    /// Top-level single embedded sub-form
    pub fn composite(field_name: impl Into<String>) -> ProbeResult<Self> {
        Self::builder(field_name).kind(FieldKind::Composite).build()
    }

    /// Top-level paragraphs field at position 0
    pub fn paragraph(field_name: impl Into<String>) -> ProbeResult<Self> {
        Self::builder(field_name).kind(FieldKind::Paragraph).build()
    }

    /// Leaf field nested under `parent`
    pub fn child(field_name: impl Into<String>, parent: &dyn IdentifiableFormField) -> ProbeResult<Self> {
        Self::builder(field_name).parent(parent).build()
    }

    /// Raw field name as given
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Widget kind
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Parent's current identifier captured at construction
    #[must_use]
    pub fn parent_identifier(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Current position
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Jump to a position
    pub fn set_position(&mut self, position: usize) -> &mut Self {
        self.position = position;
        self
    }

    /// Move to the next item
    pub fn next(&mut self) -> &mut Self {
        self.position += 1;
        self
    }

    /// Move to the previous item, never below 0
    pub fn previous(&mut self) -> &mut Self {
        self.position = self.position.saturating_sub(1);
        self
    }

    fn xpath_for(&self, identifier: &str) -> String {
        self.template.xpath(&[("identifier", identifier)])
    }

    fn suffixed(base: &str, element: &str) -> String {
        if element.is_empty() {
            base.to_string()
        } else {
            format!("{base}-{}", normalize(element))
        }
    }

    /// XPath of an element under the field's own identifier.
    ///
    /// Used for controls that exist once per field, whichever item is
    /// current, such as the "add another item" button.
    #[must_use]
    pub fn get(&self, element: &str) -> String {
        self.xpath_for(&Self::suffixed(&self.identifier, element))
    }

    /// XPath of an element belonging to the item at the current position
    #[must_use]
    pub fn get_current(&self, element: &str) -> String {
        let base = if self.kind.is_positional() {
            format!("{}-{}", self.identifier, self.position)
        } else {
            self.identifier.clone()
        };
        self.xpath_for(&Self::suffixed(&base, element))
    }

    /// XPath of a named sub-element such as `value`, `uri`, `title` or
    /// `target_id`.
    #[must_use]
    pub fn element(&self, member: &str) -> String {
        match self.kind {
            FieldKind::Composite => self.get(member),
            FieldKind::Leaf | FieldKind::Paragraph => {
                self.xpath_for(&Self::suffixed(&self.current_identifier(), member))
            }
        }
    }

    /// XPath of the "add another" button; `item_type` selects a typed
    /// button when the widget offers several.
    #[must_use]
    pub fn add_more(&self, item_type: &str) -> String {
        let button = match self.kind {
            FieldKind::Leaf => "add-more",
            FieldKind::Composite | FieldKind::Paragraph => "add-more-add-more-button",
        };
        if item_type.is_empty() {
            self.get(button)
        } else {
            self.get(&format!("{button}-{item_type}"))
        }
    }

    /// Locator for [`get`](Self::get)
    #[must_use]
    pub fn locator(&self, element: &str) -> Locator {
        Locator::xpath(self.get(element))
    }

    /// Locator for [`get_current`](Self::get_current)
    #[must_use]
    pub fn current_locator(&self, element: &str) -> Locator {
        Locator::xpath(self.get_current(element))
    }

    /// Locator for [`element`](Self::element)
    #[must_use]
    pub fn element_locator(&self, member: &str) -> Locator {
        Locator::xpath(self.element(member))
    }
}

impl IdentifiableFormField for FormField {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn current_identifier(&self) -> String {
        match self.kind {
            FieldKind::Leaf => format!("{}-{}", self.identifier, self.position),
            FieldKind::Composite => self.identifier.clone(),
            FieldKind::Paragraph => format!("{}-{}-subform", self.identifier, self.position),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn selector(identifier: &str) -> String {
        format!(r#"//*[@data-drupal-selector="{identifier}"]"#)
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_lowercases_and_hyphenates() {
            assert_eq!(normalize("Target Label"), "target-label");
            assert_eq!(normalize("field_body"), "field-body");
            assert_eq!(normalize("A_b C"), "a-b-c");
        }

        #[test]
        fn test_each_separator_becomes_one_hyphen() {
            assert_eq!(normalize("a  b"), "a--b");
            assert_eq!(normalize("a _b"), "a--b");
        }

        #[test]
        fn test_idempotent_on_samples() {
            for s in ["Field_Name", "top links remove button", "x-y", ""] {
                assert_eq!(normalize(&normalize(s)), normalize(s));
            }
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_top_level_identifier() {
            let field = FormField::new("field_body").unwrap();
            assert_eq!(field.identifier(), "edit-field-body");
            assert_eq!(field.position(), 0);
            assert!(field.parent_identifier().is_none());
        }

        #[test]
        fn test_nested_identifier_uses_parent_position() {
            let parent = FormField::builder("field_items").position(2).build().unwrap();
            let child = FormField::child("Target Label", &parent).unwrap();
            assert_eq!(child.identifier(), "edit-field-items-2-target-label");
            assert_eq!(child.parent_identifier(), Some("edit-field-items-2"));
        }

        #[test]
        fn test_child_of_paragraph_sits_in_subform() {
            let paragraphs = FormField::builder("field_sections")
                .kind(FieldKind::Paragraph)
                .position(1)
                .build()
                .unwrap();
            let title = FormField::child("field_title", &paragraphs).unwrap();
            assert_eq!(title.identifier(), "edit-field-sections-1-subform-field-title");
        }

        #[test]
        fn test_child_of_composite_has_no_delta() {
            let author = FormField::composite("field_author").unwrap();
            let name = FormField::child("name", &author).unwrap();
            assert_eq!(name.identifier(), "edit-field-author-name");
        }

        #[test]
        fn test_identifier_is_not_recomputed_after_parent_moves() {
            let mut parent = FormField::new("field_items").unwrap();
            let child = FormField::child("value", &parent).unwrap();
            parent.next();
            assert_eq!(child.identifier(), "edit-field-items-0-value");
            let fresh = FormField::child("value", &parent).unwrap();
            assert_eq!(fresh.identifier(), "edit-field-items-1-value");
        }

        #[test]
        fn test_empty_name_rejected() {
            let err = FormField::new("  ").unwrap_err();
            assert!(matches!(err, ProbeError::InvalidFieldName { .. }));
        }

        #[test]
        fn test_quote_in_name_rejected() {
            let err = FormField::new("say \"hi\"").unwrap_err();
            assert!(matches!(err, ProbeError::InvalidFieldName { .. }));
        }

        #[test]
        fn test_field_kind_from_str() {
            assert_eq!("paragraph".parse::<FieldKind>().unwrap(), FieldKind::Paragraph);
            assert_eq!("MTO".parse::<FieldKind>().unwrap(), FieldKind::Composite);
            assert_eq!("leaf".parse::<FieldKind>().unwrap(), FieldKind::Leaf);
            assert!("table".parse::<FieldKind>().is_err());
        }
    }

    mod leaf_tests {
        use super::*;

        #[test]
        fn test_current_identifier_appends_position() {
            let field = FormField::builder("field_tags").position(3).build().unwrap();
            assert_eq!(field.current_identifier(), "edit-field-tags-3");
        }

        #[test]
        fn test_get_ignores_position() {
            let field = FormField::builder("field_tags").position(3).build().unwrap();
            assert_eq!(field.get(""), selector("edit-field-tags"));
            assert_eq!(field.get("Add More"), selector("edit-field-tags-add-more"));
        }

        #[test]
        fn test_get_current_uses_position() {
            let field = FormField::builder("field_tags").position(3).build().unwrap();
            assert_eq!(field.get_current(""), selector("edit-field-tags-3"));
            assert_eq!(field.get_current("target_id"), selector("edit-field-tags-3-target-id"));
        }

        #[test]
        fn test_element_under_current_identifier() {
            let field = FormField::new("field_link").unwrap();
            assert_eq!(field.element("uri"), selector("edit-field-link-0-uri"));
            assert_eq!(field.element("title"), selector("edit-field-link-0-title"));
            assert_eq!(field.element("target_id"), selector("edit-field-link-0-target-id"));
        }

        #[test]
        fn test_add_more() {
            let field = FormField::new("field_media").unwrap();
            assert_eq!(field.add_more(""), selector("edit-field-media-add-more"));
            assert_eq!(field.add_more("image"), selector("edit-field-media-add-more-image"));
        }

        #[test]
        fn test_add_more_type_is_normalized() {
            let field = FormField::new("field_media").unwrap();
            assert_eq!(field.add_more("Remote Video"), selector("edit-field-media-add-more-remote-video"));
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_next_and_previous() {
            let mut field = FormField::new("field_tags").unwrap();
            field.next().next();
            assert_eq!(field.position(), 2);
            assert_eq!(field.current_identifier(), "edit-field-tags-2");
            field.previous();
            assert_eq!(field.position(), 1);
        }

        #[test]
        fn test_previous_clamps_at_zero() {
            let mut field = FormField::new("field_tags").unwrap();
            field.previous().previous();
            assert_eq!(field.position(), 0);
        }

        #[test]
        fn test_set_position() {
            let mut field = FormField::new("field_tags").unwrap();
            field.set_position(7);
            assert_eq!(field.get_current("value"), selector("edit-field-tags-7-value"));
        }
    }

    mod composite_tests {
        use super::*;

        #[test]
        fn test_current_identifier_equals_identifier() {
            let mut field = FormField::composite("field_address").unwrap();
            field.next();
            assert_eq!(field.current_identifier(), "edit-field-address");
        }

        #[test]
        fn test_element_resolves_like_get() {
            let field = FormField::composite("field_address").unwrap();
            assert_eq!(field.element("postal_code"), field.get("postal_code"));
            assert_eq!(field.element("postal_code"), selector("edit-field-address-postal-code"));
        }

        #[test]
        fn test_get_current_has_no_delta() {
            let field = FormField::composite("field_address").unwrap();
            assert_eq!(field.get_current("city"), selector("edit-field-address-city"));
        }

        #[test]
        fn test_add_more_uses_nested_button() {
            let field = FormField::composite("field_address").unwrap();
            assert_eq!(field.add_more(""), selector("edit-field-address-add-more-add-more-button"));
        }
    }

    mod paragraph_tests {
        use super::*;

        #[test]
        fn test_current_identifier_ends_in_subform() {
            let field = FormField::builder("field_sections")
                .kind(FieldKind::Paragraph)
                .position(4)
                .build()
                .unwrap();
            assert_eq!(field.current_identifier(), "edit-field-sections-4-subform");
        }

        #[test]
        fn test_get_current_is_positional() {
            let field = FormField::paragraph("field_sections").unwrap();
            assert_eq!(field.get_current("subform"), selector("edit-field-sections-0-subform"));
        }

        #[test]
        fn test_element_under_subform() {
            let field = FormField::paragraph("field_sections").unwrap();
            assert_eq!(field.element("field_text"), selector("edit-field-sections-0-subform-field-text"));
        }

        #[test]
        fn test_add_more_typed() {
            let field = FormField::paragraph("field_sections").unwrap();
            assert_eq!(
                field.add_more("Text Block"),
                selector("edit-field-sections-add-more-add-more-button-text-block")
            );
            assert_eq!(field.add_more(""), selector("edit-field-sections-add-more-add-more-button"));
        }
    }

    mod template_tests {
        use super::*;

        #[test]
        fn test_custom_template() {
            let field = FormField::builder("title")
                .template(XpathTemplate::drupal_selector().with_replacement("element", "input"))
                .build()
                .unwrap();
            assert_eq!(field.element("value"), r#"//input[@data-drupal-selector="edit-title-0-value"]"#);
        }

        #[test]
        fn test_locators_wrap_xpaths() {
            let field = FormField::new("title").unwrap();
            assert_eq!(field.element_locator("value").selector().as_str(), field.element("value"));
            assert_eq!(field.locator("").selector().as_str(), field.get(""));
            assert_eq!(field.current_locator("").selector().as_str(), field.get_current(""));
        }
    }
}
