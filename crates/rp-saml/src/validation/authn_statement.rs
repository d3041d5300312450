//! `<AuthnStatement>` validation: authentication instant and SSO policy.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{SamlError, SamlResult};
use crate::types::{elements, Assertion, AuthnStatement, QName, Statement};

use super::support::{check, finish};
use super::{policy, StatementValidator, ValidationContext, ValidationResult};

/// Overridable checks of an authentication statement.
///
/// Every hook accepts by default.
pub trait AuthnStatementPolicy: Send + Sync {
    /// Checks the `SessionIndex`.
    fn validate_session_index(
        &self,
        _statement: &AuthnStatement,
        _assertion: &Assertion,
        _ctx: &mut ValidationContext,
    ) -> ValidationResult {
        ValidationResult::Valid
    }

    /// Checks the `SessionNotOnOrAfter`.
    fn validate_session_not_on_or_after(
        &self,
        _statement: &AuthnStatement,
        _assertion: &Assertion,
        _ctx: &mut ValidationContext,
    ) -> ValidationResult {
        ValidationResult::Valid
    }

    /// Checks the `SubjectLocality`.
    fn validate_subject_locality(
        &self,
        _statement: &AuthnStatement,
        _assertion: &Assertion,
        _ctx: &mut ValidationContext,
    ) -> ValidationResult {
        ValidationResult::Valid
    }
}

/// Accepts session index, session end and locality unchecked.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuthnStatementPolicy;

impl AuthnStatementPolicy for DefaultAuthnStatementPolicy {}

/// Rejects statements whose IdP session has already ended.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionLifetimePolicy;

impl AuthnStatementPolicy for SessionLifetimePolicy {
    fn validate_session_not_on_or_after(
        &self,
        statement: &AuthnStatement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> ValidationResult {
        let Some(session_end) = statement.session_not_on_or_after else {
            return ValidationResult::Valid;
        };
        let now = policy::receive_instant(ctx);
        if session_end <= policy::minus(now, policy::allowed_clock_skew(ctx)) {
            return ctx.invalid(format!(
                "Authentication session of assertion '{}' ended at {session_end}",
                assertion.id
            ));
        }
        ValidationResult::Valid
    }
}

/// Validates `<AuthnStatement>` elements.
#[derive(Clone)]
pub struct AuthnStatementValidator {
    policy: Arc<dyn AuthnStatementPolicy>,
}

impl std::fmt::Debug for AuthnStatementValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthnStatementValidator").finish_non_exhaustive()
    }
}

impl Default for AuthnStatementValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthnStatementValidator {
    /// Creates a validator with the default, permissive policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(DefaultAuthnStatementPolicy)
    }

    /// Creates a validator with a custom policy.
    pub fn with_policy(policy: impl AuthnStatementPolicy + 'static) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    /// Validates `statement` of `assertion`.
    pub fn validate_authn_statement(
        &self,
        statement: &AuthnStatement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> ValidationResult {
        finish(self.run(statement, assertion, ctx))
    }

    fn run(
        &self,
        statement: &AuthnStatement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationResult> {
        check(Self::validate_authn_instant(statement, assertion, ctx))?;
        check(Self::validate_sso_policy(statement, assertion, ctx))?;
        check(self.policy.validate_session_index(statement, assertion, ctx))?;
        check(
            self.policy
                .validate_session_not_on_or_after(statement, assertion, ctx),
        )?;
        check(self.policy.validate_subject_locality(statement, assertion, ctx))?;
        check(Self::validate_authn_context(statement, assertion, ctx))?;
        Ok(())
    }

    fn validate_authn_instant(
        statement: &AuthnStatement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> ValidationResult {
        let Some(authn_instant) = statement.authn_instant else {
            return ctx.invalid(format!(
                "AuthnStatement of assertion '{}' has no AuthnInstant",
                assertion.id
            ));
        };
        if let Some(issue_instant) = assertion.issue_instant {
            if authn_instant > issue_instant {
                return ctx.invalid(format!(
                    "AuthnInstant {authn_instant} of assertion '{}' is after its IssueInstant {issue_instant}",
                    assertion.id
                ));
            }
        }
        ValidationResult::Valid
    }

    fn validate_sso_policy(
        statement: &AuthnStatement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> ValidationResult {
        let Some(authn_instant) = statement.authn_instant else {
            return ValidationResult::Valid;
        };
        let params = ctx.params();
        let force_authn = params.effective_force_authn().unwrap_or(false);

        if force_authn {
            let Some(request_instant) = params.effective_authn_request_issue_instant() else {
                warn!(
                    id = %assertion.id,
                    "ForceAuthn was requested but the request IssueInstant is unknown, skipping re-authentication check"
                );
                return ValidationResult::Valid;
            };
            let skew = policy::allowed_clock_skew(ctx);
            if policy::plus(authn_instant, skew) < request_instant {
                return ctx.invalid(format!(
                    "ForceAuthn was requested at {request_instant} but assertion '{}' reports an earlier authentication at {authn_instant}",
                    assertion.id
                ));
            }
            debug!(id = %assertion.id, "Forced re-authentication confirmed");
            return ValidationResult::Valid;
        }

        if let Some(max_session) = params.max_sso_session {
            let receive_instant = policy::receive_instant(ctx);
            if policy::plus(authn_instant, max_session) < receive_instant {
                return ctx.invalid(format!(
                    "Authentication at {authn_instant} of assertion '{}' is too old for single sign-on",
                    assertion.id
                ));
            }
        }
        ValidationResult::Valid
    }

    fn validate_authn_context(
        statement: &AuthnStatement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> ValidationResult {
        if statement.authn_context.is_none() {
            return ctx.invalid(format!(
                "AuthnStatement of assertion '{}' has no AuthnContext",
                assertion.id
            ));
        }
        ValidationResult::Valid
    }
}

impl StatementValidator for AuthnStatementValidator {
    fn services(&self) -> QName {
        elements::AUTHN_STATEMENT
    }

    fn validate(
        &self,
        statement: &Statement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult> {
        match statement {
            Statement::Authn(authn) => Ok(self.validate_authn_statement(authn, assertion, ctx)),
            other => Err(SamlError::InvalidAssertion(format!(
                "expected AuthnStatement, got {}",
                other.element_name()
            ))),
        }
    }
}
