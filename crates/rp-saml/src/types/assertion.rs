//! SAML Assertion types.
//!
//! Assertions contain statements about a subject made by an issuer. The
//! model mirrors what the XML layer hands over after unmarshalling: every
//! element or attribute that may be absent on the wire is optional here,
//! so that validators can report its absence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{confirmation_methods, Condition, Conditions, NameId, Statement, SAML_VERSION_20};
use crate::error::{SamlError, SamlResult};
use crate::signature::XmlSignature;

/// SAML Assertion.
///
/// A package of information that supplies one or more statements made
/// by a SAML authority (the issuer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion. Empty when absent.
    #[serde(default)]
    pub id: String,

    /// Version of the SAML protocol.
    #[serde(default = "default_version")]
    pub version: String,

    /// Timestamp when this assertion was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_instant: Option<DateTime<Utc>>,

    /// The issuer of this assertion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    /// The enveloped XML signature, if the assertion is signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<XmlSignature>,

    /// The subject of this assertion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Conditions that must be evaluated for the assertion to be valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Statements in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<Statement>,
}

fn default_version() -> String {
    SAML_VERSION_20.to_string()
}

impl Assertion {
    /// Creates a new assertion issued now.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            version: SAML_VERSION_20.to_string(),
            issue_instant: Some(Utc::now()),
            issuer: Some(Issuer::new(issuer)),
            signature: None,
            subject: None,
            conditions: None,
            statements: Vec::new(),
        }
    }

    /// Creates a new assertion with a custom ID.
    #[must_use]
    pub fn with_id(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(issuer)
        }
    }

    /// Sets the issue instant.
    #[must_use]
    pub fn issued_at(mut self, instant: DateTime<Utc>) -> Self {
        self.issue_instant = Some(instant);
        self
    }

    /// Sets the signature.
    #[must_use]
    pub fn with_signature(mut self, signature: XmlSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Appends a statement.
    #[must_use]
    pub fn with_statement(mut self, statement: impl Into<Statement>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Returns the issuer value, if the Issuer element carries one.
    #[must_use]
    pub fn issuer_value(&self) -> Option<&str> {
        self.issuer
            .as_ref()
            .map(|issuer| issuer.value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Returns the canonical form of this assertion without its signature.
    ///
    /// Used as the reference content of an enveloped signature when the XML
    /// layer does not hand over the canonicalized element itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the assertion cannot be serialized.
    pub fn canonical_content(&self) -> SamlResult<String> {
        let unsigned = Self {
            signature: None,
            ..self.clone()
        };
        serde_json::to_string(&unsigned)
            .map_err(|e| SamlError::Internal(format!("cannot canonicalize assertion: {e}")))
    }

    /// Returns true if any statement is an `AuthnStatement`.
    #[must_use]
    pub fn has_authn_statement(&self) -> bool {
        self.statements
            .iter()
            .any(|statement| matches!(statement, Statement::Authn(_)))
    }

    /// Returns the declared conditions, or an empty slice.
    #[must_use]
    pub fn condition_elements(&self) -> &[Condition] {
        self.conditions
            .as_ref()
            .map(|conditions| conditions.conditions.as_slice())
            .unwrap_or(&[])
    }
}

/// Issuer of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// The issuer's entity ID. Empty when the element has no value.
    #[serde(default)]
    pub value: String,

    /// The issuer name format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Issuer {
    /// Creates an issuer with the given entity ID.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
        }
    }
}

/// Subject of an assertion.
///
/// Identifies the principal that is the subject of all statements in the assertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    /// The name identifier for the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Subject confirmations, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    /// Creates a new subject with a name ID.
    #[must_use]
    pub fn new(name_id: NameId) -> Self {
        Self {
            name_id: Some(name_id),
            subject_confirmations: Vec::new(),
        }
    }

    /// Adds a subject confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.subject_confirmations.push(confirmation);
        self
    }
}

/// Subject confirmation.
///
/// Information that allows the assertion consumer to confirm the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// The confirmation method.
    #[serde(default)]
    pub method: String,

    /// Identifier of the attesting entity, when it differs from the subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Additional confirmation data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_confirmation_data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Creates a confirmation with the given method URI.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            name_id: None,
            subject_confirmation_data: None,
        }
    }

    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer() -> Self {
        Self::new(confirmation_methods::BEARER)
    }

    /// Creates a sender-vouches confirmation.
    #[must_use]
    pub fn sender_vouches() -> Self {
        Self::new(confirmation_methods::SENDER_VOUCHES)
    }

    /// Sets the confirmation data.
    #[must_use]
    pub fn with_data(mut self, data: SubjectConfirmationData) -> Self {
        self.subject_confirmation_data = Some(data);
        self
    }
}

/// Subject confirmation data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// The request ID that this assertion responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Time after which the subject can no longer be confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Time before which the subject cannot be confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// The location to which the assertion can be presented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    /// Network address of the presenter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SubjectConfirmationData {
    /// Creates confirmation data answering the given request.
    #[must_use]
    pub fn for_request(
        request_id: impl Into<String>,
        recipient: impl Into<String>,
        not_on_or_after: DateTime<Utc>,
    ) -> Self {
        Self {
            in_response_to: Some(request_id.into()),
            recipient: Some(recipient.into()),
            not_on_or_after: Some(not_on_or_after),
            not_before: None,
            address: None,
        }
    }

    /// Sets the presenter address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}
