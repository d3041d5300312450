//! Deployment settings driving the validator.

use std::sync::Arc;

use chrono::Duration;

use rp_saml::config::ValidatorSettings;
use rp_saml::signature::SignaturePrevalidator;
use rp_saml::validation::AssertionValidator;
use rp_saml::{Condition, Conditions, ExtensionElement, QName, ValidationContext, ValidationResult};

use crate::common::{TestEnv, ACS, IDP, REQUEST_ID, SP};

fn settings_toml() -> String {
    format!(
        r#"
strict_validation = true
clock_skew = "30s"
max_message_age = 180000
expected_issuer = "{IDP}"
valid_recipients = ["{ACS}"]
valid_audiences = ["{SP}"]
"#
    )
}

fn validator_for(env: &TestEnv, settings: &ValidatorSettings) -> AssertionValidator {
    let prevalidator: Arc<dyn SignaturePrevalidator> = Arc::new(settings.prevalidator());
    AssertionValidator::with_defaults(Some(env.idp.trust_engine()), Some(prevalidator))
}

#[test]
fn settings_file_drives_validation() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let path = std::env::temp_dir()
        .join(format!("rp-saml-settings-{}.toml", std::process::id()));
    std::fs::write(&path, settings_toml())?;
    let loaded = ValidatorSettings::from_file(&path);
    std::fs::remove_file(&path)?;
    let settings = loaded?;

    assert_eq!(settings.clock_skew, Some(Duration::seconds(30)));
    assert_eq!(settings.max_message_age, Some(Duration::minutes(3)));

    let validator = validator_for(&env, &settings);
    let params = settings
        .to_params()
        .with_receive_instant(env.receive_instant)
        .with_in_response_to(REQUEST_ID);

    let assertion = env.assertion("_from_file")?;
    let mut ctx = ValidationContext::new(params.clone());
    assert_eq!(
        validator.validate(&assertion, &mut ctx),
        ValidationResult::Valid,
        "{:?}",
        ctx.message()
    );

    // 31 seconds ahead is outside the configured skew.
    let mut ahead = env.assertion("_ahead")?;
    ahead.issue_instant = Some(env.receive_instant + Duration::seconds(31));
    let mut ctx = ValidationContext::new(params);
    assert_eq!(validator.validate(&ahead, &mut ctx), ValidationResult::Invalid);
    Ok(())
}

#[test]
fn strict_setting_makes_unknown_conditions_indeterminate() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let settings = ValidatorSettings::from_toml(&settings_toml())?;
    let validator = validator_for(&env, &settings);

    let now = env.receive_instant;
    let mut assertion = env.unsigned_assertion("_strict");
    assertion.conditions = Some(
        Conditions::new()
            .valid_between(now - Duration::seconds(1), now + Duration::minutes(5))
            .with_audience(SP)
            .with_condition(Condition::Extension(ExtensionElement::new(QName::new(
                "urn:example:conditions",
                "Quota",
            )))),
    );
    env.idp.sign(&mut assertion)?;

    let params = settings
        .to_params()
        .with_receive_instant(now)
        .with_in_response_to(REQUEST_ID);
    let mut ctx = ValidationContext::new(params);
    assert_eq!(
        validator.validate(&assertion, &mut ctx),
        ValidationResult::Indeterminate
    );
    Ok(())
}

#[test]
fn environment_style_variables_drive_validation() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let settings = ValidatorSettings::from_vars([
        ("RP_SAML_EXPECTED_ISSUER", "https://other-idp.example.org"),
        ("RP_SAML_VALID_AUDIENCES", SP),
        ("RP_SAML_VALID_RECIPIENTS", ACS),
        ("RP_SAML_SIGNATURE_REQUIRED", "false"),
        ("PATH", "/usr/bin"),
    ])?;
    let validator = validator_for(&env, &settings);

    let assertion = env.unsigned_assertion("_vars");
    let params = settings
        .to_params()
        .with_receive_instant(env.receive_instant)
        .with_in_response_to(REQUEST_ID);
    let mut ctx = ValidationContext::new(params);

    assert_eq!(validator.validate(&assertion, &mut ctx), ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("expected issuer"));
    Ok(())
}

#[test]
fn malformed_settings_are_rejected() {
    assert!(ValidatorSettings::from_toml("clock_skew = \"5 fortnights\"").is_err());
    assert!(ValidatorSettings::from_toml("unknown_key = 1").is_err());
    assert!(ValidatorSettings::from_vars([("RP_SAML_CHECK_ADDRESS", "maybe")]).is_err());
}
