//! Assertion statements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{elements, AuthnContextClass, ExtensionElement, QName};

/// A single statement element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    /// `<AuthnStatement>`.
    Authn(AuthnStatement),

    /// `<AttributeStatement>`.
    Attribute(AttributeStatement),

    /// Any other statement, including `<Statement xsi:type="...">`.
    Extension(ExtensionElement),
}

impl Statement {
    /// Returns the element name, the primary validator lookup key.
    #[must_use]
    pub fn element_name(&self) -> QName {
        match self {
            Self::Authn(_) => elements::AUTHN_STATEMENT,
            Self::Attribute(_) => elements::ATTRIBUTE_STATEMENT,
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

impl From<AuthnStatement> for Statement {
    fn from(statement: AuthnStatement) -> Self {
        Self::Authn(statement)
    }
}

impl From<AttributeStatement> for Statement {
    fn from(statement: AttributeStatement) -> Self {
        Self::Attribute(statement)
    }
}

impl From<ExtensionElement> for Statement {
    fn from(element: ExtensionElement) -> Self {
        Self::Extension(element)
    }
}

/// Authentication statement.
///
/// Describes the act of authentication performed by the subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnStatement {
    /// The time of authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authn_instant: Option<DateTime<Utc>>,

    /// The session index (for session management).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,

    /// Time at which the session ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_not_on_or_after: Option<DateTime<Utc>>,

    /// The authentication context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authn_context: Option<AuthnContext>,

    /// The subject locality information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_locality: Option<SubjectLocality>,
}

impl AuthnStatement {
    /// Creates an authentication statement for an authentication that
    /// happened at `authn_instant`.
    #[must_use]
    pub fn new(authn_instant: DateTime<Utc>, context_class: AuthnContextClass) -> Self {
        Self {
            authn_instant: Some(authn_instant),
            session_index: Some(format!("_session{}", uuid::Uuid::new_v4())),
            session_not_on_or_after: None,
            authn_context: Some(AuthnContext::class_ref(context_class)),
            subject_locality: None,
        }
    }

    /// Sets the session end.
    #[must_use]
    pub fn with_session_not_on_or_after(mut self, instant: DateTime<Utc>) -> Self {
        self.session_not_on_or_after = Some(instant);
        self
    }

    /// Sets the subject locality.
    #[must_use]
    pub fn with_locality(mut self, address: impl Into<String>) -> Self {
        self.subject_locality = Some(SubjectLocality {
            address: Some(address.into()),
            dns_name: None,
        });
        self
    }
}

/// Authentication context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthnContext {
    /// Authentication context class reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authn_context_class_ref: Option<String>,

    /// Authentication context declaration reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authn_context_decl_ref: Option<String>,

    /// Authenticating authorities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authenticating_authorities: Vec<String>,
}

impl AuthnContext {
    /// Creates an authentication context with a class reference.
    #[must_use]
    pub fn class_ref(class: AuthnContextClass) -> Self {
        Self {
            authn_context_class_ref: Some(class.uri().to_string()),
            authn_context_decl_ref: None,
            authenticating_authorities: Vec::new(),
        }
    }
}

/// Subject locality information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectLocality {
    /// IP address of the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// DNS name of the system from which the subject authenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
}

/// Attribute statement.
///
/// Contains attributes about the subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// List of attributes.
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    /// Creates a new empty attribute statement.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }
}

/// SAML Attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute name (typically a URI).
    pub name: String,

    /// The format of the attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,

    /// A human-readable name for the attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// The attribute values.
    #[serde(default)]
    pub values: Vec<String>,
}

impl Attribute {
    /// Creates a new attribute with a single value.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values: vec![value.into()],
        }
    }

    /// Sets the friendly name.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authn_statement_carries_context() {
        let statement = AuthnStatement::new(Utc::now(), AuthnContextClass::Password);
        assert!(statement.authn_instant.is_some());
        assert_eq!(
            statement
                .authn_context
                .and_then(|ctx| ctx.authn_context_class_ref)
                .as_deref(),
            Some(AuthnContextClass::Password.uri())
        );
    }

    #[test]
    fn statement_keys() {
        let statement = Statement::from(AttributeStatement::new());
        assert_eq!(statement.element_name(), elements::ATTRIBUTE_STATEMENT);
        assert_eq!(statement.schema_type(), None);
    }

    #[test]
    fn tagged_json_roundtrip_keeps_variant() {
        let statement = Statement::from(
            AttributeStatement::new()
                .with_attribute(Attribute::single("email", "user@example.com")),
        );
        let json = serde_json::to_string(&statement).unwrap();
        assert!(json.contains("\"type\":\"attribute\""));
        let parsed: Statement = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, Statement::Attribute(ref s) if s.attributes.len() == 1));
    }
}
