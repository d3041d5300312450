//! Bundled condition validators.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::types::{elements, Assertion, Condition, QName};

use super::{policy, ConditionValidator, ReplayCache, ValidationContext, ValidationResult};

/// Validates `<AudienceRestriction>` against the configured audiences.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudienceRestrictionConditionValidator;

impl ConditionValidator for AudienceRestrictionConditionValidator {
    fn services(&self) -> QName {
        elements::AUDIENCE_RESTRICTION
    }

    fn validate(
        &self,
        condition: &Condition,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult> {
        let Condition::AudienceRestriction(restriction) = condition else {
            return Err(SamlError::InvalidAssertion(format!(
                "expected AudienceRestriction, got {}",
                condition.element_name()
            )));
        };

        if ctx.params().valid_audiences.is_empty() {
            return Ok(ctx.indeterminate("No valid audiences were configured"));
        }

        let matched = restriction
            .audiences
            .iter()
            .find(|audience| ctx.params().valid_audiences.contains(audience.as_str()))
            .cloned();

        match matched {
            Some(audience) => {
                debug!(id = %assertion.id, audience = %audience, "Audience restriction satisfied");
                ctx.outputs_mut().record_audience(audience);
                Ok(ValidationResult::Valid)
            }
            None => Ok(ctx.invalid(format!(
                "None of the audiences [{}] of assertion '{}' is a valid audience",
                restriction.audiences.join(", "),
                assertion.id
            ))),
        }
    }
}

/// Rejects a second use of an assertion carrying `<OneTimeUse>`.
#[derive(Clone)]
pub struct OneTimeUseConditionValidator {
    cache: Arc<dyn ReplayCache>,
    default_expiration: Duration,
}

impl std::fmt::Debug for OneTimeUseConditionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneTimeUseConditionValidator")
            .field("default_expiration", &self.default_expiration)
            .finish_non_exhaustive()
    }
}

impl OneTimeUseConditionValidator {
    /// Creates a validator backed by `cache`.
    ///
    /// Assertions without a NotOnOrAfter are remembered for 8 hours.
    #[must_use]
    pub fn new(cache: Arc<dyn ReplayCache>) -> Self {
        Self {
            cache,
            default_expiration: Duration::hours(8),
        }
    }

    /// Overrides how long assertions without a NotOnOrAfter are remembered.
    #[must_use]
    pub const fn with_default_expiration(mut self, expiration: Duration) -> Self {
        self.default_expiration = expiration;
        self
    }
}

impl ConditionValidator for OneTimeUseConditionValidator {
    fn services(&self) -> QName {
        elements::ONE_TIME_USE
    }

    fn validate(
        &self,
        condition: &Condition,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult> {
        if !matches!(condition, Condition::OneTimeUse) {
            return Err(SamlError::InvalidAssertion(format!(
                "expected OneTimeUse, got {}",
                condition.element_name()
            )));
        }

        let now = policy::receive_instant(ctx);
        let expires = assertion
            .conditions
            .as_ref()
            .and_then(|c| c.not_on_or_after)
            .map(|t| policy::plus(t, policy::allowed_clock_skew(ctx)))
            .unwrap_or_else(|| policy::plus(now, self.default_expiration));
        let key = format!("{}!{}", assertion.issuer_value().unwrap_or_default(), assertion.id);

        if self.cache.check_and_record(&key, now, expires)? {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ctx.invalid(format!(
                "Assertion '{}' carries OneTimeUse and has already been used",
                assertion.id
            )))
        }
    }
}
