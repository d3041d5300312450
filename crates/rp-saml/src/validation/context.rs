//! Validation context: static policy inputs and dynamic outputs.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::error::{SamlError, SamlResult};
use crate::signature::CriteriaSet;
use crate::types::{AuthnRequest, SubjectConfirmation};

use super::ValidationResult;

/// Converts a legacy millisecond count into a duration.
///
/// # Errors
///
/// Returns an error for negative or out of range values.
pub fn duration_from_millis(millis: i64) -> SamlResult<Duration> {
    if millis < 0 {
        return Err(SamlError::Config(format!("negative duration: {millis}ms")));
    }
    Duration::try_milliseconds(millis)
        .ok_or_else(|| SamlError::Config(format!("duration out of range: {millis}ms")))
}

/// Converts a legacy epoch millisecond timestamp into an instant.
///
/// # Errors
///
/// Returns an error if the timestamp is out of range.
pub fn instant_from_millis(millis: i64) -> SamlResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| SamlError::Config(format!("timestamp out of range: {millis}")))
}

/// Static validation parameters.
///
/// Built by the caller before validation and never modified by validators.
/// Every field is optional; the accessors in [`policy`](super::policy)
/// supply the defaults.
#[derive(Debug, Clone, Default)]
pub struct ValidationParams {
    /// See [`ParamKey::StrictValidation`](super::ParamKey::StrictValidation).
    pub strict_validation: Option<bool>,
    /// See [`ParamKey::ClockSkew`](super::ParamKey::ClockSkew).
    pub clock_skew: Option<Duration>,
    /// See [`ParamKey::MaxMessageAge`](super::ParamKey::MaxMessageAge).
    pub max_message_age: Option<Duration>,
    /// See [`ParamKey::ReceiveInstant`](super::ParamKey::ReceiveInstant).
    pub receive_instant: Option<DateTime<Utc>>,
    /// See [`ParamKey::SignatureRequired`](super::ParamKey::SignatureRequired).
    pub signature_required: Option<bool>,
    /// See [`ParamKey::SignatureCriteria`](super::ParamKey::SignatureCriteria).
    pub signature_criteria: Option<CriteriaSet>,
    /// See [`ParamKey::ExpectedIssuer`](super::ParamKey::ExpectedIssuer).
    pub expected_issuer: Option<String>,
    /// See [`ParamKey::ResponseIssueInstant`](super::ParamKey::ResponseIssueInstant).
    pub response_issue_instant: Option<DateTime<Utc>>,
    /// See [`ParamKey::AuthnRequest`](super::ParamKey::AuthnRequest).
    pub authn_request: Option<AuthnRequest>,
    /// See [`ParamKey::AuthnRequestIssueInstant`](super::ParamKey::AuthnRequestIssueInstant).
    pub authn_request_issue_instant: Option<DateTime<Utc>>,
    /// See [`ParamKey::ForceAuthn`](super::ParamKey::ForceAuthn).
    pub force_authn: Option<bool>,
    /// See [`ParamKey::MaxSsoSession`](super::ParamKey::MaxSsoSession).
    pub max_sso_session: Option<Duration>,
    /// See [`ParamKey::InResponseTo`](super::ParamKey::InResponseTo).
    pub in_response_to: Option<String>,
    /// See [`ParamKey::ValidRecipients`](super::ParamKey::ValidRecipients).
    pub valid_recipients: BTreeSet<String>,
    /// See [`ParamKey::ValidAudiences`](super::ParamKey::ValidAudiences).
    pub valid_audiences: BTreeSet<String>,
    /// See [`ParamKey::ValidAddresses`](super::ParamKey::ValidAddresses).
    pub valid_addresses: BTreeSet<String>,
    /// See [`ParamKey::CheckAddress`](super::ParamKey::CheckAddress).
    pub check_address: Option<bool>,
}

impl ValidationParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets strict validation.
    #[must_use]
    pub const fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = Some(strict);
        self
    }

    /// Sets the allowed clock skew.
    #[must_use]
    pub const fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = Some(skew);
        self
    }

    /// Sets the allowed clock skew from a legacy millisecond count.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or out of range values.
    pub fn with_clock_skew_millis(self, millis: i64) -> SamlResult<Self> {
        Ok(self.with_clock_skew(duration_from_millis(millis)?))
    }

    /// Sets the maximum age of a received message.
    #[must_use]
    pub const fn with_max_message_age(mut self, age: Duration) -> Self {
        self.max_message_age = Some(age);
        self
    }

    /// Sets the maximum message age from a legacy millisecond count.
    ///
    /// # Errors
    ///
    /// Returns an error for negative or out of range values.
    pub fn with_max_message_age_millis(self, millis: i64) -> SamlResult<Self> {
        Ok(self.with_max_message_age(duration_from_millis(millis)?))
    }

    /// Sets the receive instant.
    #[must_use]
    pub const fn with_receive_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.receive_instant = Some(instant);
        self
    }

    /// Sets the receive instant from legacy epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp is out of range.
    pub fn with_receive_instant_millis(self, millis: i64) -> SamlResult<Self> {
        Ok(self.with_receive_instant(instant_from_millis(millis)?))
    }

    /// Sets whether a signature is required.
    #[must_use]
    pub const fn with_signature_required(mut self, required: bool) -> Self {
        self.signature_required = Some(required);
        self
    }

    /// Sets the caller supplied signature criteria.
    #[must_use]
    pub fn with_signature_criteria(mut self, criteria: CriteriaSet) -> Self {
        self.signature_criteria = Some(criteria);
        self
    }

    /// Sets the expected issuer.
    #[must_use]
    pub fn with_expected_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.expected_issuer = Some(issuer.into());
        self
    }

    /// Sets the IssueInstant of the enclosing Response.
    #[must_use]
    pub const fn with_response_issue_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.response_issue_instant = Some(instant);
        self
    }

    /// Sets the AuthnRequest the assertion answers.
    #[must_use]
    pub fn with_authn_request(mut self, request: AuthnRequest) -> Self {
        self.authn_request = Some(request);
        self
    }

    /// Sets the AuthnRequest IssueInstant explicitly.
    #[must_use]
    pub const fn with_authn_request_issue_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.authn_request_issue_instant = Some(instant);
        self
    }

    /// Sets the force-authn flag explicitly.
    #[must_use]
    pub const fn with_force_authn(mut self, force: bool) -> Self {
        self.force_authn = Some(force);
        self
    }

    /// Sets the maximum accepted SSO session age.
    #[must_use]
    pub const fn with_max_sso_session(mut self, max: Duration) -> Self {
        self.max_sso_session = Some(max);
        self
    }

    /// Sets the expected InResponseTo.
    #[must_use]
    pub fn with_in_response_to(mut self, id: impl Into<String>) -> Self {
        self.in_response_to = Some(id.into());
        self
    }

    /// Adds valid recipients.
    #[must_use]
    pub fn with_valid_recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_recipients
            .extend(recipients.into_iter().map(Into::into));
        self
    }

    /// Adds valid audiences.
    #[must_use]
    pub fn with_valid_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_audiences.extend(audiences.into_iter().map(Into::into));
        self
    }

    /// Adds valid presenter addresses.
    #[must_use]
    pub fn with_valid_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_addresses.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Sets whether confirmation addresses are checked.
    #[must_use]
    pub const fn with_check_address(mut self, check: bool) -> Self {
        self.check_address = Some(check);
        self
    }

    /// Returns the effective force-authn flag.
    ///
    /// The explicit parameter wins over the AuthnRequest's attribute.
    #[must_use]
    pub fn effective_force_authn(&self) -> Option<bool> {
        self.force_authn
            .or_else(|| self.authn_request.as_ref().and_then(|r| r.force_authn))
    }

    /// Returns the effective AuthnRequest IssueInstant.
    ///
    /// The explicit parameter wins over the AuthnRequest's attribute.
    #[must_use]
    pub fn effective_authn_request_issue_instant(&self) -> Option<DateTime<Utc>> {
        self.authn_request_issue_instant
            .or_else(|| self.authn_request.as_ref().and_then(|r| r.issue_instant))
    }
}

/// Dynamic validation outputs.
///
/// Each output is written at most once per context; later writes are
/// ignored. The failure message is the exception and always holds the most
/// recent reason.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutputs {
    confirmed_subject_confirmation: Option<SubjectConfirmation>,
    confirmed_recipient: Option<String>,
    confirmed_address: Option<String>,
    confirmed_in_response_to: Option<String>,
    confirmed_not_on_or_after: Option<DateTime<Utc>>,
    matched_audience: Option<String>,
    message: Option<String>,
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

impl ValidationOutputs {
    /// Records the subject confirmation that succeeded.
    pub fn record_subject_confirmation(&mut self, confirmation: SubjectConfirmation) -> bool {
        set_once(&mut self.confirmed_subject_confirmation, confirmation)
    }

    /// Records the confirmed recipient.
    pub fn record_recipient(&mut self, recipient: impl Into<String>) -> bool {
        set_once(&mut self.confirmed_recipient, recipient.into())
    }

    /// Records the confirmed presenter address.
    pub fn record_address(&mut self, address: impl Into<String>) -> bool {
        set_once(&mut self.confirmed_address, address.into())
    }

    /// Records the confirmed InResponseTo.
    pub fn record_in_response_to(&mut self, id: impl Into<String>) -> bool {
        set_once(&mut self.confirmed_in_response_to, id.into())
    }

    /// Records the confirmed NotOnOrAfter.
    pub fn record_not_on_or_after(&mut self, instant: DateTime<Utc>) -> bool {
        set_once(&mut self.confirmed_not_on_or_after, instant)
    }

    /// Records the audience that satisfied an audience restriction.
    pub fn record_audience(&mut self, audience: impl Into<String>) -> bool {
        set_once(&mut self.matched_audience, audience.into())
    }

    /// The subject confirmation that succeeded.
    #[must_use]
    pub fn subject_confirmation(&self) -> Option<&SubjectConfirmation> {
        self.confirmed_subject_confirmation.as_ref()
    }

    /// The confirmed recipient.
    #[must_use]
    pub fn recipient(&self) -> Option<&str> {
        self.confirmed_recipient.as_deref()
    }

    /// The confirmed presenter address.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.confirmed_address.as_deref()
    }

    /// The confirmed InResponseTo.
    #[must_use]
    pub fn in_response_to(&self) -> Option<&str> {
        self.confirmed_in_response_to.as_deref()
    }

    /// The confirmed NotOnOrAfter.
    #[must_use]
    pub const fn not_on_or_after(&self) -> Option<DateTime<Utc>> {
        self.confirmed_not_on_or_after
    }

    /// The audience that satisfied an audience restriction.
    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.matched_audience.as_deref()
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Parameter carrier threaded through every validator call.
///
/// Created per validation call and discarded afterwards.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    params: ValidationParams,
    outputs: ValidationOutputs,
}

impl ValidationContext {
    /// Creates a context over the given static parameters.
    #[must_use]
    pub fn new(params: ValidationParams) -> Self {
        Self {
            params,
            outputs: ValidationOutputs::default(),
        }
    }

    /// The static parameters.
    #[must_use]
    pub const fn params(&self) -> &ValidationParams {
        &self.params
    }

    /// The dynamic outputs.
    #[must_use]
    pub const fn outputs(&self) -> &ValidationOutputs {
        &self.outputs
    }

    /// Mutable access to the dynamic outputs.
    pub fn outputs_mut(&mut self) -> &mut ValidationOutputs {
        &mut self.outputs
    }

    /// Consumes the context, returning the outputs.
    #[must_use]
    pub fn into_outputs(self) -> ValidationOutputs {
        self.outputs
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.outputs.message()
    }

    /// Sets the failure message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.outputs.message = Some(message.into());
    }

    /// Clears the failure message, returning the previous one.
    pub fn take_message(&mut self) -> Option<String> {
        self.outputs.message.take()
    }

    /// Puts back a message returned by [`take_message`](Self::take_message).
    pub fn restore_message(&mut self, message: Option<String>) {
        self.outputs.message = message;
    }

    /// Sets the failure message and returns [`ValidationResult::Invalid`].
    pub fn invalid(&mut self, message: impl Into<String>) -> ValidationResult {
        self.set_message(message);
        ValidationResult::Invalid
    }

    /// Sets the failure message and returns [`ValidationResult::Indeterminate`].
    pub fn indeterminate(&mut self, message: impl Into<String>) -> ValidationResult {
        self.set_message(message);
        ValidationResult::Indeterminate
    }
}

impl From<ValidationParams> for ValidationContext {
    fn from(params: ValidationParams) -> Self {
        Self::new(params)
    }
}
