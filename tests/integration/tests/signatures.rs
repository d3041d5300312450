//! Signature trust evaluation with real ECDSA keys.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Duration;

use rp_saml::signature::{
    CanonicalizationAlgorithm, CriteriaSet, Criterion, SamlSignatureProfileValidator,
    SignatureAlgorithm, SignaturePrevalidator,
};
use rp_saml::validation::AssertionValidator;
use rp_saml::{Conditions, NameId, ValidationContext, ValidationResult};

use crate::common::{TestEnv, TestIdp, IDP};

#[test]
fn untrusted_key_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let impostor = TestIdp::new()?;
    let mut assertion = env.unsigned_assertion("_forged");
    impostor.sign(&mut assertion)?;

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("not valid or not trusted"));
    Ok(())
}

#[test]
fn altered_digest_value_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.assertion("_digest")?;
    if let Some(signature) = assertion.signature.as_mut() {
        signature.digest_value = "dGFtcGVyZWQ=".to_string();
    }

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("Digest value mismatch"));
    Ok(())
}

#[test]
fn altered_signature_value_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.assertion("_sigvalue")?;
    if let Some(signature) = assertion.signature.as_mut() {
        let mut raw = STANDARD.decode(&signature.signature_value)?;
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        signature.signature_value = STANDARD.encode(raw);
    }

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("not valid or not trusted"));
    Ok(())
}

#[test]
fn content_changed_after_signing_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.assertion("_abc123")?;

    // Swap the subject and widen the conditions, keeping the original signature.
    let now = env.receive_instant;
    if let Some(subject) = assertion.subject.as_mut() {
        subject.name_id = Some(NameId::persistent("admin"));
    }
    assertion.conditions =
        Some(Conditions::new().valid_between(now - Duration::days(1), now + Duration::days(365)));

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    let message = ctx.message().unwrap_or_default();
    assert!(message.contains("Digest value mismatch"), "{message}");
    Ok(())
}

#[test]
fn missing_trust_engine_is_indeterminate() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let validator = AssertionValidator::with_defaults(None, None);
    let assertion = env.assertion("_no_engine")?;

    let mut ctx = ValidationContext::new(env.params());
    let result = validator.validate(&assertion, &mut ctx);

    assert_eq!(result, ValidationResult::Indeterminate);
    assert!(ctx.message().unwrap_or_default().contains("trust engine"));
    Ok(())
}

#[test]
fn unsigned_assertion_skips_missing_trust_engine_when_optional() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let validator = AssertionValidator::with_defaults(None, None);
    let assertion = env.unsigned_assertion("_optional");

    let mut ctx = ValidationContext::new(env.params().with_signature_required(false));
    let result = validator.validate(&assertion, &mut ctx);

    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}

#[test]
fn reference_to_another_element_fails_profile_check() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.assertion("_ref")?;
    if let Some(signature) = assertion.signature.as_mut() {
        signature.reference_uri = "#_someone_else".to_string();
    }

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("signature profile"));
    Ok(())
}

#[test]
fn inclusive_canonicalization_fails_profile_check() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.unsigned_assertion("_c14n");
    env.idp.sign(&mut assertion)?;
    if let Some(signature) = assertion.signature.as_mut() {
        signature.canonicalization = CanonicalizationAlgorithm::C14N;
    }

    let (result, _) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    Ok(())
}

#[test]
fn sha1_is_rejected_by_default_profile() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.assertion("_sha1")?;
    if let Some(signature) = assertion.signature.as_mut() {
        signature.algorithm = SignatureAlgorithm::RsaSha1;
    }

    let (result, ctx) = env.validate(&assertion, env.params());
    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("signature profile"));

    // Without the profile check the trust engine still refuses the SHA-1 digest.
    let lenient: Arc<dyn SignaturePrevalidator> =
        Arc::new(SamlSignatureProfileValidator::new().allow_sha1(true));
    let validator =
        AssertionValidator::with_defaults(Some(env.idp.trust_engine()), Some(lenient));
    let mut ctx = ValidationContext::new(env.params());
    assert_eq!(validator.validate(&assertion, &mut ctx), ValidationResult::Invalid);
    Ok(())
}

#[test]
fn caller_criteria_cannot_be_overridden() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion("_criteria")?;

    // Caller pins a different entity; the issuer from the assertion must not replace it.
    let criteria =
        CriteriaSet::new().with(Criterion::EntityId("https://other-idp.example.org".into()));
    let params = env.params().with_signature_criteria(criteria);
    let (result, _) = env.validate(&assertion, params);
    assert_eq!(result, ValidationResult::Invalid);

    let criteria = CriteriaSet::new().with(Criterion::EntityId(IDP.into()));
    let params = env.params().with_signature_criteria(criteria);
    let (result, ctx) = env.validate(&assertion, params);
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}
