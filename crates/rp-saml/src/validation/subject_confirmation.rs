//! Bundled subject confirmation validators.

use tracing::debug;

use crate::error::SamlResult;
use crate::types::{confirmation_methods, Assertion, SubjectConfirmation};

use super::{policy, SubjectConfirmationValidator, ValidationContext, ValidationResult};

/// Validates bearer confirmations per the Web Browser SSO profile.
///
/// - `SubjectConfirmationData` is required and must not carry `NotBefore`;
/// - `NotOnOrAfter` is required and must not have passed;
/// - `Recipient` must be a configured valid recipient, when any are set;
/// - `InResponseTo` must match the expected request ID, when one is set;
/// - `Address` is checked only when address checking is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerSubjectConfirmationValidator;

impl BearerSubjectConfirmationValidator {
    fn check(
        confirmation: &SubjectConfirmation,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> ValidationResult {
        let id = assertion.id.as_str();
        let Some(data) = confirmation.subject_confirmation_data.as_ref() else {
            return ctx.invalid(format!(
                "Bearer confirmation of assertion '{id}' has no SubjectConfirmationData"
            ));
        };

        if data.not_before.is_some() {
            return ctx.invalid(format!(
                "Bearer confirmation of assertion '{id}' must not carry NotBefore"
            ));
        }

        let Some(not_on_or_after) = data.not_on_or_after else {
            return ctx.invalid(format!(
                "Bearer confirmation of assertion '{id}' has no NotOnOrAfter"
            ));
        };
        let now = policy::receive_instant(ctx);
        let skew = policy::allowed_clock_skew(ctx);
        if not_on_or_after <= policy::minus(now, skew) {
            return ctx.invalid(format!(
                "Bearer confirmation of assertion '{id}' expired at {not_on_or_after}"
            ));
        }

        let params = ctx.params();
        if !params.valid_recipients.is_empty() {
            let accepted = data
                .recipient
                .as_deref()
                .is_some_and(|r| params.valid_recipients.contains(r));
            if !accepted {
                let recipient = data.recipient.clone().unwrap_or_default();
                return ctx.invalid(format!(
                    "Bearer confirmation of assertion '{id}' has invalid recipient '{recipient}'"
                ));
            }
        }

        if let Some(expected) = params.in_response_to.as_deref() {
            if data.in_response_to.as_deref() != Some(expected) {
                let actual = data.in_response_to.clone().unwrap_or_default();
                return ctx.invalid(format!(
                    "Bearer confirmation of assertion '{id}' answers '{actual}', expected '{expected}'"
                ));
            }
        }

        if policy::is_check_address(ctx) {
            if let Some(address) = data.address.as_deref() {
                if ctx.params().valid_addresses.is_empty() {
                    return ctx.indeterminate(
                        "Address checking is enabled but no valid addresses were configured",
                    );
                }
                if !ctx.params().valid_addresses.contains(address) {
                    return ctx.invalid(format!(
                        "Bearer confirmation of assertion '{id}' has invalid address '{address}'"
                    ));
                }
            }
        }

        let outputs = ctx.outputs_mut();
        if let Some(recipient) = data.recipient.as_deref() {
            outputs.record_recipient(recipient);
        }
        if let Some(address) = data.address.as_deref() {
            outputs.record_address(address);
        }
        if let Some(in_response_to) = data.in_response_to.as_deref() {
            outputs.record_in_response_to(in_response_to);
        }
        outputs.record_not_on_or_after(not_on_or_after);
        debug!(id, "Bearer confirmation accepted");
        ValidationResult::Valid
    }
}

impl SubjectConfirmationValidator for BearerSubjectConfirmationValidator {
    fn method(&self) -> &str {
        confirmation_methods::BEARER
    }

    fn validate(
        &self,
        confirmation: &SubjectConfirmation,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult> {
        Ok(Self::check(confirmation, assertion, ctx))
    }
}

/// Accepts sender-vouches confirmations.
///
/// The attesting entity is authenticated by the transport, outside of the
/// assertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderVouchesSubjectConfirmationValidator;

impl SubjectConfirmationValidator for SenderVouchesSubjectConfirmationValidator {
    fn method(&self) -> &str {
        confirmation_methods::SENDER_VOUCHES
    }

    fn validate(
        &self,
        _confirmation: &SubjectConfirmation,
        _assertion: &Assertion,
        _ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult> {
        Ok(ValidationResult::Valid)
    }
}
