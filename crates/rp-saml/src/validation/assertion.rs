//! The assertion validation pipeline.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::signature::{SignaturePrevalidator, TrustEngine};
use crate::types::{Assertion, SAML_VERSION_20};

use super::support::{check, finish};
use super::{
    policy, AudienceRestrictionConditionValidator, AuthnStatementValidator,
    BearerSubjectConfirmationValidator, ConditionRegistry, ConditionValidator,
    InMemoryReplayCache, ObjectValidator, OneTimeUseConditionValidator,
    SenderVouchesSubjectConfirmationValidator, SignatureTrustValidator, StatementRegistry,
    StatementValidator, SubjectConfirmationRegistry, SubjectConfirmationValidator,
    ValidationContext, ValidationResult,
};

/// Validates SAML 2.0 assertions.
///
/// Checks run in a fixed order and stop at the first one that does not
/// pass:
///
/// 1. ID
/// 2. version
/// 3. IssueInstant
/// 4. issuer
/// 5. signature
/// 6. subject confirmation
/// 7. conditions
/// 8. statements
///
/// The validator holds no per-call state; share it behind an [`Arc`].
#[derive(Debug)]
pub struct AssertionValidator {
    signature: SignatureTrustValidator,
    subject_confirmations: SubjectConfirmationRegistry,
    conditions: ConditionRegistry,
    statements: StatementRegistry,
    strict: bool,
}

impl AssertionValidator {
    /// Creates a validator from sub-validator collections and signature
    /// collaborators.
    ///
    /// `None` entries are ignored. A later validator for an already
    /// registered key replaces the earlier one.
    pub fn new<SC, C, S>(
        confirmation_validators: SC,
        condition_validators: C,
        statement_validators: S,
        trust_engine: Option<Arc<dyn TrustEngine>>,
        prevalidator: Option<Arc<dyn SignaturePrevalidator>>,
    ) -> Self
    where
        SC: IntoIterator,
        SC::Item: Into<Option<Arc<dyn SubjectConfirmationValidator>>>,
        C: IntoIterator,
        C::Item: Into<Option<Arc<dyn ConditionValidator>>>,
        S: IntoIterator,
        S::Item: Into<Option<Arc<dyn StatementValidator>>>,
    {
        Self {
            signature: SignatureTrustValidator::new(trust_engine, prevalidator),
            subject_confirmations: SubjectConfirmationRegistry::from_validators(
                confirmation_validators,
            ),
            conditions: ConditionRegistry::from_validators(condition_validators),
            statements: StatementRegistry::from_validators(statement_validators),
            strict: false,
        }
    }

    /// Creates a validator wired with the bundled sub-validators.
    ///
    /// - bearer and sender-vouches subject confirmations;
    /// - audience restriction and one-time-use conditions, the latter
    ///   backed by a process-local replay cache;
    /// - authentication statements.
    #[must_use]
    pub fn with_defaults(
        trust_engine: Option<Arc<dyn TrustEngine>>,
        prevalidator: Option<Arc<dyn SignaturePrevalidator>>,
    ) -> Self {
        let confirmations: [Arc<dyn SubjectConfirmationValidator>; 2] = [
            Arc::new(BearerSubjectConfirmationValidator),
            Arc::new(SenderVouchesSubjectConfirmationValidator),
        ];
        let conditions: [Arc<dyn ConditionValidator>; 2] = [
            Arc::new(AudienceRestrictionConditionValidator),
            Arc::new(OneTimeUseConditionValidator::new(Arc::new(
                InMemoryReplayCache::new(),
            ))),
        ];
        let statements: [Arc<dyn StatementValidator>; 1] =
            [Arc::new(AuthnStatementValidator::new())];
        Self::new(
            confirmations,
            conditions,
            statements,
            trust_engine,
            prevalidator,
        )
    }

    /// Forces strict validation regardless of the context flag.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The signature trust validator.
    #[must_use]
    pub const fn signature_validator(&self) -> &SignatureTrustValidator {
        &self.signature
    }

    /// The registered subject confirmation validators.
    #[must_use]
    pub const fn subject_confirmation_validators(&self) -> &SubjectConfirmationRegistry {
        &self.subject_confirmations
    }

    /// The registered condition validators.
    #[must_use]
    pub const fn condition_validators(&self) -> &ConditionRegistry {
        &self.conditions
    }

    /// The registered statement validators.
    #[must_use]
    pub const fn statement_validators(&self) -> &StatementRegistry {
        &self.statements
    }

    /// Validates `assertion`.
    ///
    /// On a non-valid result the reason is left in [`ValidationContext::message`].
    pub fn validate(&self, assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        let result = finish(self.run(assertion, ctx));
        match result {
            ValidationResult::Valid => debug!(id = %assertion.id, "Assertion is valid"),
            other => debug!(
                id = %assertion.id,
                result = %other,
                reason = ctx.message().unwrap_or_default(),
                "Assertion rejected"
            ),
        }
        result
    }

    fn run(&self, assertion: &Assertion, ctx: &mut ValidationContext) -> Result<(), ValidationResult> {
        check(Self::validate_id(assertion, ctx))?;
        check(Self::validate_version(assertion, ctx))?;
        check(Self::validate_issue_instant(assertion, ctx))?;
        check(Self::validate_issuer(assertion, ctx))?;
        check(self.validate_signature(assertion, ctx))?;
        check(self.validate_subject_confirmation(assertion, ctx))?;
        check(self.validate_conditions(assertion, ctx))?;
        check(self.validate_statements(assertion, ctx))?;
        Ok(())
    }

    fn is_strict(&self, ctx: &ValidationContext) -> bool {
        self.strict || policy::is_strict_validation(ctx)
    }

    fn validate_id(assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        if assertion.id.is_empty() {
            return ctx.invalid("Assertion did not contain the required ID attribute");
        }
        ValidationResult::Valid
    }

    fn validate_version(assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        if assertion.version != SAML_VERSION_20 {
            return ctx.invalid(format!(
                "Assertion '{}' has unsupported SAML version '{}'",
                assertion.id, assertion.version
            ));
        }
        ValidationResult::Valid
    }

    fn validate_issue_instant(assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        let Some(issue_instant) = assertion.issue_instant else {
            return ctx.invalid(format!(
                "Assertion '{}' did not contain the required IssueInstant",
                assertion.id
            ));
        };

        if let Some(response_instant) = ctx.params().response_issue_instant {
            if issue_instant > response_instant {
                return ctx.invalid(format!(
                    "Assertion '{}' IssueInstant {issue_instant} is after the enclosing Response IssueInstant {response_instant}",
                    assertion.id
                ));
            }
            return ValidationResult::Valid;
        }

        let receive_instant = policy::receive_instant(ctx);
        let skew = policy::allowed_clock_skew(ctx);
        let max_age = policy::max_age_received_message(ctx);

        let earliest = policy::minus(policy::minus(receive_instant, max_age), skew);
        if issue_instant < earliest {
            return ctx.invalid(format!(
                "Assertion '{}' IssueInstant {issue_instant} is older than the maximum message age allows (earliest {earliest})",
                assertion.id
            ));
        }

        let latest = policy::plus(receive_instant, skew);
        if issue_instant > latest {
            return ctx.invalid(format!(
                "Assertion '{}' IssueInstant {issue_instant} is in the future (latest {latest})",
                assertion.id
            ));
        }
        ValidationResult::Valid
    }

    fn validate_issuer(assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        let Some(issuer) = assertion.issuer_value() else {
            return ctx.invalid(format!(
                "Assertion '{}' did not contain the required Issuer",
                assertion.id
            ));
        };

        match ctx.params().expected_issuer.as_deref() {
            Some(expected) if expected != issuer => {
                let message = format!(
                    "Assertion '{}' issuer '{issuer}' does not match the expected issuer '{expected}'",
                    assertion.id
                );
                ctx.invalid(message)
            }
            Some(_) => ValidationResult::Valid,
            None => {
                warn!(
                    id = %assertion.id,
                    issuer,
                    "No expected issuer configured, issuer identity is not checked"
                );
                ValidationResult::Valid
            }
        }
    }

    fn validate_signature(&self, assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        self.signature.validate_signature(assertion, ctx)
    }

    fn validate_subject_confirmation(
        &self,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> ValidationResult {
        let Some(subject) = assertion.subject.as_ref() else {
            if assertion.has_authn_statement() {
                return ctx.invalid(format!(
                    "Assertion '{}' contains an AuthnStatement but no Subject",
                    assertion.id
                ));
            }
            return ValidationResult::Valid;
        };

        if subject.subject_confirmations.is_empty() {
            return ValidationResult::Valid;
        }

        // Rejections of alternatives must not outlive a later success.
        let prior_message = ctx.take_message();
        for confirmation in &subject.subject_confirmations {
            let Some(validator) = self.subject_confirmations.get(confirmation.method.as_str()) else {
                debug!(
                    id = %assertion.id,
                    method = %confirmation.method,
                    "No validator registered for confirmation method"
                );
                continue;
            };
            match validator.validate(confirmation, assertion, ctx) {
                Ok(ValidationResult::Valid) => {
                    debug!(id = %assertion.id, method = %confirmation.method, "Subject confirmed");
                    ctx.outputs_mut()
                        .record_subject_confirmation(confirmation.clone());
                    ctx.restore_message(prior_message);
                    return ValidationResult::Valid;
                }
                Ok(result) => debug!(
                    id = %assertion.id,
                    method = %confirmation.method,
                    %result,
                    reason = ctx.message().unwrap_or_default(),
                    "Subject confirmation did not pass"
                ),
                Err(e) => warn!(
                    id = %assertion.id,
                    method = %confirmation.method,
                    error = %e,
                    "Subject confirmation could not be evaluated"
                ),
            }
        }

        ctx.invalid(format!(
            "No subject confirmation of assertion '{}' could be confirmed",
            assertion.id
        ))
    }

    fn validate_conditions(&self, assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        let Some(conditions) = assertion.conditions.as_ref() else {
            return ValidationResult::Valid;
        };

        let now = policy::receive_instant(ctx);
        let skew = policy::allowed_clock_skew(ctx);

        if let Some(not_before) = conditions.not_before {
            if not_before > policy::plus(now, skew) {
                return ctx.invalid(format!(
                    "Assertion '{}' is not valid before {not_before}",
                    assertion.id
                ));
            }
        }

        if let Some(not_on_or_after) = conditions.not_on_or_after {
            if not_on_or_after <= policy::minus(now, skew) {
                return ctx.invalid(format!(
                    "Assertion '{}' is no longer valid, it expired at {not_on_or_after}",
                    assertion.id
                ));
            }
        }

        let strict = self.is_strict(ctx);
        for condition in &conditions.conditions {
            let name = condition.element_name();
            let schema_type = condition.schema_type();
            let kind = schema_type.as_ref().unwrap_or(&name).clone();

            let Some(validator) = self.conditions.lookup(&name, schema_type.as_ref()) else {
                if strict {
                    return ctx.indeterminate(format!(
                        "Unknown condition '{name}' of type '{kind}' in assertion '{}'",
                        assertion.id
                    ));
                }
                warn!(id = %assertion.id, condition = %name, "Skipping unknown condition");
                continue;
            };

            let reason = match validator.validate(condition, assertion, ctx) {
                Ok(ValidationResult::Valid) => continue,
                Ok(_) => ctx.message().unwrap_or("no reason given").to_string(),
                Err(e) => e.to_string(),
            };
            return ctx.invalid(format!(
                "Condition '{name}' of type '{kind}' in assertion '{}' was not valid: {reason}",
                assertion.id
            ));
        }

        ValidationResult::Valid
    }

    fn validate_statements(&self, assertion: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        for statement in &assertion.statements {
            let name = statement.element_name();
            let schema_type = statement.schema_type();
            let Some(validator) = self.statements.lookup(&name, schema_type.as_ref()) else {
                debug!(id = %assertion.id, statement = %name, "No validator for statement");
                continue;
            };

            match validator.validate(statement, assertion, ctx) {
                Ok(ValidationResult::Valid) => {}
                Ok(result) => return result,
                Err(e) => {
                    return ctx.invalid(format!(
                        "Statement '{name}' in assertion '{}' could not be validated: {e}",
                        assertion.id
                    ));
                }
            }
        }
        ValidationResult::Valid
    }
}

impl ObjectValidator<Assertion> for AssertionValidator {
    fn validate(&self, object: &Assertion, ctx: &mut ValidationContext) -> ValidationResult {
        Self::validate(self, object, ctx)
    }
}
