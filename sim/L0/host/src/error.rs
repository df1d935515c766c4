//! Error types for plugin descriptors.

use thiserror::Error;

/// Errors that can occur when reading a `<plugin>` descriptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// The document has no element of the expected name.
    #[error("missing <{element}> element in {context}")]
    MissingElement {
        /// Element that was expected.
        element: String,
        /// Where it was expected.
        context: String,
    },

    /// Required attribute missing from an element.
    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        /// Name of the attribute.
        attribute: String,
        /// Element that lacks it.
        element: String,
    },

    /// A required configuration field is absent.
    #[error("plugin {plugin}: missing field <{field}>")]
    MissingField {
        /// Plugin instance name.
        plugin: String,
        /// The absent field.
        field: String,
    },

    /// A configuration field could not be parsed into the expected type.
    #[error("plugin {plugin}: field <{field}> = {value:?} is invalid: {reason}")]
    InvalidField {
        /// Plugin instance name.
        plugin: String,
        /// The field.
        field: String,
        /// Its raw text.
        value: String,
        /// Parser message.
        reason: String,
    },
}

impl DescriptorError {
    /// Create a missing element error.
    #[must_use]
    pub fn missing_element(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element: element.into(),
            context: context.into(),
        }
    }

    /// Create a missing attribute error.
    #[must_use]
    pub fn missing_attribute(attribute: impl Into<String>, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute: attribute.into(),
            element: element.into(),
        }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(plugin: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            plugin: plugin.into(),
            field: field.into(),
        }
    }

    /// The field this error is about, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field, .. } | Self::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type for descriptor operations.
pub type Result<T> = std::result::Result<T, DescriptorError>;
