//! Browser helpers for Drupal entity forms.
//!
//! Each helper resolves locators through a [`FormField`] and hands the
//! interaction to a [`WebDriver`]. Nothing here inspects the page; the
//! driver's waits are what make multi-step widgets such as paragraphs
//! reliable.

use std::time::Duration;

use crate::config::AcceptanceConfig;
use crate::driver::{BrowserLogEntry, WebDriver};
use crate::form_field::{FieldKind, FormField};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// Pause after pushing content into a WYSIWYG editor
pub const WYSIWYG_SETTLE: Duration = Duration::from_secs(1);

/// Form interaction helpers bound to a driver
#[derive(Debug)]
pub struct Acceptance<D: WebDriver> {
    driver: D,
    timeout: Option<Duration>,
}

impl<D: WebDriver> Acceptance<D> {
    /// Wrap a driver
    #[must_use]
    pub const fn new(driver: D) -> Self {
        Self { driver, timeout: None }
    }

    /// Wrap a driver, taking the element timeout from `config`
    #[must_use]
    pub fn from_config(driver: D, config: &AcceptanceConfig) -> Self {
        Self {
            driver,
            timeout: config.timeout(),
        }
    }

    /// Wait at most `timeout` for every element
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Borrow the driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Borrow the driver mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    fn locate(&self, locator: Locator) -> Locator {
        match self.timeout {
            Some(timeout) => locator.with_timeout(timeout),
            None => locator,
        }
    }

    fn expect_paragraph(field: &FormField) -> ProbeResult<()> {
        if field.kind() == FieldKind::Paragraph {
            Ok(())
        } else {
            Err(ProbeError::assertion(format!(
                "{} is a {} field, not a paragraph field",
                field.field_name(),
                field.kind()
            )))
        }
    }

    /// Add a paragraph of `paragraph_type` and wait for its sub-form.
    ///
    /// `field` must already point at the position the new item will take.
    pub fn add_paragraph(&mut self, paragraph_type: &str, field: &FormField) -> ProbeResult<()> {
        Self::expect_paragraph(field)?;
        let button = self.locate(Locator::xpath(field.add_more(paragraph_type)));
        let subform = self.locate(field.current_locator("subform"));
        self.driver.click(&button)?;
        self.driver.wait_for_element_clickable(&subform)
    }

    /// Remove the paragraph at the field's current position, confirming the
    /// removal and waiting for its sub-form to disappear.
    pub fn remove_paragraph(&mut self, field: &FormField) -> ProbeResult<()> {
        Self::expect_paragraph(field)?;
        let position = field.position();
        let remove = self.locate(field.locator(&format!("{position} top links remove button")));
        let confirm = self.locate(field.locator(&format!("{position} top links confirm remove button")));
        let subform = self.locate(field.current_locator("subform"));
        self.driver.click(&remove)?;
        self.driver.wait_for_element_clickable(&confirm)?;
        self.driver.click(&confirm)?;
        self.driver.wait_for_element_not_visible(&subform)
    }

    /// Fill the `value` input of a text field
    pub fn fill_text_field(&mut self, field: &FormField, value: &str) -> ProbeResult<()> {
        let input = self.locate(field.element_locator("value"));
        self.driver.fill_field(&input, value)
    }

    /// Fill the `uri` and, when given, the `title` of a link field
    pub fn fill_link_field(&mut self, field: &FormField, uri: &str, title: Option<&str>) -> ProbeResult<()> {
        let input = self.locate(field.element_locator("uri"));
        self.driver.fill_field(&input, uri)?;
        if let Some(title) = title {
            let input = self.locate(field.element_locator("title"));
            self.driver.fill_field(&input, title)?;
        }
        Ok(())
    }

    /// Type a label into an entity reference autocomplete
    pub fn fill_reference_field(&mut self, field: &FormField, target_label: &str) -> ProbeResult<()> {
        let input = self.locate(field.element_locator("target_id"));
        self.driver.fill_field(&input, target_label)
    }

    /// Choose `option` in the select list at `target` (`value` when `None`)
    pub fn select_option_from_list(
        &mut self,
        field: &FormField,
        option: &str,
        target: Option<&str>,
    ) -> ProbeResult<()> {
        let select = self.locate(field.element_locator(target.unwrap_or("value")));
        self.driver.select_option(&select, option)
    }

    /// Click an element under the field's own identifier
    pub fn click_on(&mut self, field: &FormField, target: &str) -> ProbeResult<()> {
        let element = self.locate(field.locator(target));
        self.driver.click(&element)
    }

    /// Add another item to a reference field and wait for its input.
    ///
    /// `field` must already point at the new item's position.
    pub fn add_reference_field_item(&mut self, field: &FormField) -> ProbeResult<()> {
        let button = self.locate(Locator::xpath(field.add_more("")));
        let input = self.locate(field.element_locator("target_id"));
        self.driver.click(&button)?;
        self.driver.wait_for_element_clickable(&input)
    }

    /// Replace the content of the CKEditor instance attached to the field's
    /// `value` textarea.
    pub fn fill_wysiwyg_editor(&mut self, field: &FormField, content: &str) -> ProbeResult<()> {
        let textarea = self.locate(field.element_locator("value"));
        let editor_id = self.driver.grab_attribute_from(&textarea, "id")?;
        let script = ckeditor_script(&editor_id, content)?;
        tracing::debug!(editor = %editor_id, "setting wysiwyg content");
        let _ = self.driver.execute_script(&script)?;
        self.driver.wait(WYSIWYG_SETTLE)
    }

    /// Browser console log
    pub fn js_log(&mut self) -> ProbeResult<Vec<BrowserLogEntry>> {
        self.driver.browser_logs()
    }
}

/// Script that sets the data of the CKEditor instance `editor_id` once the
/// document is ready. Both values are emitted as JSON string literals.
pub fn ckeditor_script(editor_id: &str, content: &str) -> ProbeResult<String> {
    let id = serde_json::to_string(editor_id)?;
    let data = serde_json::to_string(content)?;
    Ok(format!("jQuery(function(){{CKEDITOR.instances[{id}].setData({data})}});"))
}
