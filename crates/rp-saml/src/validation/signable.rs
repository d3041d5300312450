//! Signature trust evaluation for signable objects.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::SamlResult;
use crate::signature::{
    CriteriaSet, Criterion, SignaturePrevalidator, TrustEngine, UsageType, XmlSignature,
};
use crate::types::Assertion;

use super::{policy, ValidationContext, ValidationResult};

/// An object that may carry an XML signature.
pub trait SignableObject {
    /// The object's ID attribute.
    fn object_id(&self) -> &str;

    /// The issuer entity ID, if present.
    fn issuer(&self) -> Option<&str>;

    /// A short name of the object type for diagnostics.
    fn object_name(&self) -> &'static str;

    /// The object's signature, if signed.
    fn signature(&self) -> Option<&XmlSignature>;

    /// The canonical content the signature reference covers.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be canonicalized.
    fn signed_content(&self) -> SamlResult<String>;
}

impl SignableObject for Assertion {
    fn object_id(&self) -> &str {
        &self.id
    }

    fn issuer(&self) -> Option<&str> {
        self.issuer_value()
    }

    fn object_name(&self) -> &'static str {
        "Assertion"
    }

    fn signature(&self) -> Option<&XmlSignature> {
        self.signature.as_ref()
    }

    fn signed_content(&self) -> SamlResult<String> {
        self.canonical_content()
    }
}

/// Decides whether the signature of a [`SignableObject`] is acceptable.
///
/// The trust engine and prevalidator are shared collaborators; both must be
/// safe for concurrent use.
#[derive(Clone, Default)]
pub struct SignatureTrustValidator {
    trust_engine: Option<Arc<dyn TrustEngine>>,
    prevalidator: Option<Arc<dyn SignaturePrevalidator>>,
}

impl std::fmt::Debug for SignatureTrustValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureTrustValidator")
            .field("trust_engine", &self.trust_engine.is_some())
            .field("prevalidator", &self.prevalidator.is_some())
            .finish()
    }
}

impl SignatureTrustValidator {
    /// Creates a validator with the given collaborators.
    #[must_use]
    pub fn new(
        trust_engine: Option<Arc<dyn TrustEngine>>,
        prevalidator: Option<Arc<dyn SignaturePrevalidator>>,
    ) -> Self {
        Self {
            trust_engine,
            prevalidator,
        }
    }

    /// The configured trust engine.
    #[must_use]
    pub fn trust_engine(&self) -> Option<&Arc<dyn TrustEngine>> {
        self.trust_engine.as_ref()
    }

    /// The configured signature prevalidator.
    #[must_use]
    pub fn prevalidator(&self) -> Option<&Arc<dyn SignaturePrevalidator>> {
        self.prevalidator.as_ref()
    }

    /// Validates the signature of `token`.
    ///
    /// An unsigned token is valid only when signatures are not required. A
    /// missing trust engine yields [`ValidationResult::Indeterminate`].
    pub fn validate_signature<T>(&self, token: &T, ctx: &mut ValidationContext) -> ValidationResult
    where
        T: SignableObject + ?Sized,
    {
        let Some(signature) = token.signature() else {
            if policy::is_signature_required(ctx) {
                return ctx.invalid(format!(
                    "{} '{}' was not signed and a signature is required",
                    token.object_name(),
                    token.object_id()
                ));
            }
            debug!(id = token.object_id(), "Unsigned {} accepted", token.object_name());
            return ValidationResult::Valid;
        };

        let Some(trust_engine) = self.trust_engine.as_deref() else {
            warn!(
                id = token.object_id(),
                "Signature trust engine not configured, cannot validate {} signature",
                token.object_name()
            );
            return ctx.indeterminate(format!(
                "No signature trust engine is configured, the signature of {} '{}' cannot be validated",
                token.object_name(),
                token.object_id()
            ));
        };

        self.perform_signature_validation(token, signature, trust_engine, ctx)
    }

    /// Prevalidates and trust-checks a present signature.
    pub fn perform_signature_validation<T>(
        &self,
        token: &T,
        signature: &XmlSignature,
        trust_engine: &dyn TrustEngine,
        ctx: &mut ValidationContext,
    ) -> ValidationResult
    where
        T: SignableObject + ?Sized,
    {
        if let Some(prevalidator) = self.prevalidator.as_deref() {
            if let Err(e) = prevalidator.validate(signature, token.object_id()) {
                debug!(id = token.object_id(), error = %e, "Signature prevalidation failed");
                return ctx.invalid(format!(
                    "{} '{}' signature is not valid under the signature profile: {e}",
                    token.object_name(),
                    token.object_id()
                ));
            }
        }

        let signature = match Self::bind_referenced_content(token, signature) {
            Ok(signature) => signature,
            Err(e) => {
                return ctx.invalid(format!(
                    "{} '{}' signature cannot be bound to its content: {e}",
                    token.object_name(),
                    token.object_id()
                ));
            }
        };

        let criteria = Self::signature_validation_criteria(token, ctx);
        let issuer = token.issuer().unwrap_or("<unknown>");

        match trust_engine.validate(&signature, &criteria) {
            Ok(true) => {
                debug!(id = token.object_id(), issuer, "Signature trusted");
                ValidationResult::Valid
            }
            Ok(false) => ctx.invalid(format!(
                "Signature of {} '{}' from issuer '{issuer}' was not valid or not trusted",
                token.object_name(),
                token.object_id()
            )),
            Err(e) => {
                warn!(id = token.object_id(), issuer, error = %e, "Trust engine failed");
                ctx.invalid(format!(
                    "Trust evaluation of {} '{}' from issuer '{issuer}' failed: {e}",
                    token.object_name(),
                    token.object_id()
                ))
            }
        }
    }

    /// Makes the reference digest cover `token`.
    ///
    /// Content handed over by the XML layer is kept. Otherwise the token's
    /// own canonical content is attached.
    fn bind_referenced_content<'a, T>(
        token: &T,
        signature: &'a XmlSignature,
    ) -> SamlResult<Cow<'a, XmlSignature>>
    where
        T: SignableObject + ?Sized,
    {
        if signature.referenced_content.is_some() {
            return Ok(Cow::Borrowed(signature));
        }
        let content = token.signed_content()?;
        Ok(Cow::Owned(signature.clone().with_referenced_content(content)))
    }

    /// Builds the criteria the trust engine evaluates against.
    ///
    /// Starts from the caller supplied set and adds the issuer entity ID and
    /// signing usage when those kinds are missing.
    #[must_use]
    pub fn signature_validation_criteria<T>(token: &T, ctx: &ValidationContext) -> CriteriaSet
    where
        T: SignableObject + ?Sized,
    {
        let mut criteria = ctx.params().signature_criteria.clone().unwrap_or_default();
        if let Some(issuer) = token.issuer() {
            criteria.insert_if_absent(Criterion::EntityId(issuer.to_string()));
        }
        criteria.insert_if_absent(Criterion::Usage(UsageType::Signing));
        criteria
    }
}
