use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Input kinds an input typeset can render as.
///
/// Names not in the vocabulary are kept as [`InputType::Other`] so renderers
/// can register their own kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputType {
    Text,
    Textarea,
    Number,
    Checkbox,
    MultiCheckbox,
    Radio,
    Select,
    MultiSelect,
    Select2MultiSelect,
    Date,
    Url,
    Email,
    Tel,
    Password,
    Hidden,
    Color,
    ImageMedia,
    Html,
    Wrap,
    WrapDynamic,
    Tabs,
    Tab,
    AddFieldRobotsTxt,
    TableFormTable,
    AddFieldList,
    ListTable,
    Other(String),
}

impl InputType {
    /// Parse a type name, resolving shorthand aliases.
    pub fn parse(name: &str) -> Self {
        match name {
            "text" => InputType::Text,
            "textarea" => InputType::Textarea,
            "number" => InputType::Number,
            "checkbox" => InputType::Checkbox,
            "multi-checkbox" | "multicheckbox" | "checkboxes" => InputType::MultiCheckbox,
            "radio" => InputType::Radio,
            "select" => InputType::Select,
            "multi-select" | "multiselect" => InputType::MultiSelect,
            "select2-multi-select" => InputType::Select2MultiSelect,
            "date" => InputType::Date,
            "url" => InputType::Url,
            "email" => InputType::Email,
            "tel" => InputType::Tel,
            "password" => InputType::Password,
            "hidden" => InputType::Hidden,
            "color" => InputType::Color,
            "image-media" => InputType::ImageMedia,
            "html" => InputType::Html,
            "wrap" => InputType::Wrap,
            "wrap_dynamic" | "dynamic" => InputType::WrapDynamic,
            "tabs" => InputType::Tabs,
            "tab" => InputType::Tab,
            "add-field-robots-txt" => InputType::AddFieldRobotsTxt,
            "table-form-table" => InputType::TableFormTable,
            "add-field-list" => InputType::AddFieldList,
            "list-table" => InputType::ListTable,
            other => InputType::Other(other.to_string()),
        }
    }

    /// Canonical type name.
    pub fn as_str(&self) -> &str {
        match self {
            InputType::Text => "text",
            InputType::Textarea => "textarea",
            InputType::Number => "number",
            InputType::Checkbox => "checkbox",
            InputType::MultiCheckbox => "multi-checkbox",
            InputType::Radio => "radio",
            InputType::Select => "select",
            InputType::MultiSelect => "multi-select",
            InputType::Select2MultiSelect => "select2-multi-select",
            InputType::Date => "date",
            InputType::Url => "url",
            InputType::Email => "email",
            InputType::Tel => "tel",
            InputType::Password => "password",
            InputType::Hidden => "hidden",
            InputType::Color => "color",
            InputType::ImageMedia => "image-media",
            InputType::Html => "html",
            InputType::Wrap => "wrap",
            InputType::WrapDynamic => "wrap_dynamic",
            InputType::Tabs => "tabs",
            InputType::Tab => "tab",
            InputType::AddFieldRobotsTxt => "add-field-robots-txt",
            InputType::TableFormTable => "table-form-table",
            InputType::AddFieldList => "add-field-list",
            InputType::ListTable => "list-table",
            InputType::Other(name) => name,
        }
    }

    /// Types whose children live under `wrap`.
    pub fn requires_wrap(&self) -> bool {
        matches!(
            self,
            InputType::Wrap
                | InputType::Tabs
                | InputType::Tab
                | InputType::AddFieldRobotsTxt
                | InputType::TableFormTable
        )
    }

    /// Types whose child template lives under `wrap_dynamic`.
    pub fn requires_wrap_dynamic(&self) -> bool {
        matches!(
            self,
            InputType::WrapDynamic | InputType::AddFieldList | InputType::ListTable
        )
    }

    /// Types that cannot render without `items`.
    pub fn requires_items(&self) -> bool {
        matches!(
            self,
            InputType::WrapDynamic
                | InputType::MultiCheckbox
                | InputType::Radio
                | InputType::Select
                | InputType::MultiSelect
                | InputType::Select2MultiSelect
                | InputType::ListTable
        )
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InputType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InputType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(InputType::parse(&name))
    }
}

/// Layout template used to render a field row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "label-input-row")]
    LabelInputRow,
    #[serde(rename = "input-row")]
    InputRow,
    #[serde(rename = "h2-input-column")]
    H2InputColumn,
}

impl Layout {
    /// Parse a layout name; unknown names fall back to the default row.
    pub fn parse(name: &str) -> Self {
        match name {
            "input-row" => Layout::InputRow,
            "h2-input-column" => Layout::H2InputColumn,
            _ => Layout::LabelInputRow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_aliases() {
        assert_eq!(InputType::parse("dynamic"), InputType::WrapDynamic);
        assert_eq!(InputType::parse("checkboxes"), InputType::MultiCheckbox);
        assert_eq!(InputType::parse("multicheckbox"), InputType::MultiCheckbox);
        assert_eq!(InputType::parse("multiselect"), InputType::MultiSelect);
        assert_eq!(InputType::parse("multiselect").as_str(), "multi-select");
    }

    #[test]
    fn test_unknown_type_kept() {
        let t = InputType::parse("snippet-default");
        assert_eq!(t, InputType::Other("snippet-default".to_string()));
        assert_eq!(t.to_string(), "snippet-default");
        assert!(!t.requires_wrap());
        assert!(!t.requires_items());
    }

    #[test]
    fn test_layout_fallback() {
        assert_eq!(Layout::parse("input-row"), Layout::InputRow);
        assert_eq!(Layout::parse("two-column"), Layout::LabelInputRow);
    }
}
