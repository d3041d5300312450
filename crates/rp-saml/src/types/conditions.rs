//! Assertion conditions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{elements, ExtensionElement, QName};

/// Conditions for assertion validity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conditions {
    /// Time before which the assertion is not valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Time at or after which the assertion is not valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Condition elements in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl Conditions {
    /// Creates an empty conditions block with no time bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both time bounds.
    #[must_use]
    pub fn valid_between(mut self, not_before: DateTime<Utc>, not_on_or_after: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self.not_on_or_after = Some(not_on_or_after);
        self
    }

    /// Adds an audience restriction.
    #[must_use]
    pub fn with_audience(self, audience: impl Into<String>) -> Self {
        self.with_condition(Condition::AudienceRestriction(AudienceRestriction {
            audiences: vec![audience.into()],
        }))
    }

    /// Adds a one-time use condition.
    #[must_use]
    pub fn one_time_use(self) -> Self {
        self.with_condition(Condition::OneTimeUse)
    }

    /// Appends a condition element.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// A single condition element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `<AudienceRestriction>`.
    AudienceRestriction(AudienceRestriction),

    /// `<OneTimeUse>`.
    OneTimeUse,

    /// `<ProxyRestriction>`.
    ProxyRestriction(ProxyRestriction),

    /// Any other condition, including `<Condition xsi:type="...">`.
    Extension(ExtensionElement),
}

impl Condition {
    /// Returns the element name, the primary validator lookup key.
    #[must_use]
    pub fn element_name(&self) -> QName {
        match self {
            Self::AudienceRestriction(_) => elements::AUDIENCE_RESTRICTION,
            Self::OneTimeUse => elements::ONE_TIME_USE,
            Self::ProxyRestriction(_) => elements::PROXY_RESTRICTION,
            Self::Extension(ext) => ext.element.clone(),
        }
    }

    /// Returns the `xsi:type`, the fallback validator lookup key.
    #[must_use]
    pub fn schema_type(&self) -> Option<QName> {
        match self {
            Self::Extension(ext) => ext.schema_type.clone(),
            _ => None,
        }
    }
}

/// Audience restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceRestriction {
    /// List of valid audiences.
    pub audiences: Vec<String>,
}

/// Proxy restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRestriction {
    /// Maximum number of proxies allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// List of allowed proxy audiences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<String>,
}
