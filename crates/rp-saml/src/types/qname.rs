//! Qualified XML names and generic extension elements.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A namespace-qualified XML name.
///
/// Used both for element names and for `xsi:type` schema types, and as the
/// key type of the condition and statement validator registries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    namespace: Cow<'static, str>,
    local_name: Cow<'static, str>,
}

impl QName {
    /// Creates a qualified name from owned parts.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Cow::Owned(namespace.into()),
            local_name: Cow::Owned(local_name.into()),
        }
    }

    /// Creates a qualified name from static strings, usable in constants.
    #[must_use]
    pub const fn from_static(namespace: &'static str, local_name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            local_name: Cow::Borrowed(local_name),
        }
    }

    /// Returns the namespace URI.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the local part of the name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

/// An element this crate has no dedicated model for.
///
/// Extension conditions and statements are carried with their element name,
/// their `xsi:type` (if any) and their attributes, so that callers can plug
/// in validators for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionElement {
    /// The element's qualified name.
    pub element: QName,

    /// The element's `xsi:type`, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<QName>,

    /// Attributes of the element, keyed by local name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ExtensionElement {
    /// Creates an extension element with no schema type.
    #[must_use]
    pub fn new(element: QName) -> Self {
        Self {
            element,
            schema_type: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates an abstract element (`Condition`, `Statement`) whose concrete
    /// type is given by `xsi:type`.
    #[must_use]
    pub fn typed(element: QName, schema_type: QName) -> Self {
        Self {
            element,
            schema_type: Some(schema_type),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}
