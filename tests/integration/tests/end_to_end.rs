//! A complete browser SSO exchange from the relying party's side.

use chrono::Duration;

use rp_saml::validation::ValidationOutputs;
use rp_saml::{
    AuthnContextClass, AuthnRequest, AuthnStatement, Conditions, SubjectConfirmation,
    SubjectConfirmationData, ValidationResult,
};

use crate::common::{TestEnv, ACS, REQUEST_ID, SP};

#[test]
fn bearer_sso_assertion_is_accepted() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion("_abc123")?;

    let (result, ctx) = env.validate(&assertion, env.params());
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());

    let outputs: ValidationOutputs = ctx.into_outputs();
    let confirmation = outputs
        .subject_confirmation()
        .ok_or_else(|| anyhow::anyhow!("no confirmation recorded"))?;
    assert!(confirmation.method.ends_with(":bearer"));
    assert_eq!(outputs.recipient(), Some(ACS));
    assert_eq!(outputs.in_response_to(), Some(REQUEST_ID));
    assert_eq!(outputs.audience(), Some(SP));
    assert_eq!(
        outputs.not_on_or_after(),
        Some(env.receive_instant + Duration::minutes(5))
    );
    Ok(())
}

#[test]
fn bearer_for_another_request_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion("_other_req")?;

    let (result, ctx) = env.validate(&assertion, env.params().with_in_response_to("_req99"));

    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.outputs().subject_confirmation().is_none());
    Ok(())
}

#[test]
fn bearer_for_another_recipient_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion("_other_acs")?;
    let mut params = env.params();
    params.valid_recipients = ["https://sp.example.org/other".to_string()].into();

    let (result, _) = env.validate(&assertion, params);

    assert_eq!(result, ValidationResult::Invalid);
    Ok(())
}

#[test]
fn stale_confirmation_before_matching_one_leaves_no_message() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let stale = SubjectConfirmation::bearer().with_data(SubjectConfirmationData::for_request(
        "_req_old",
        ACS,
        env.receive_instant + Duration::minutes(5),
    ));
    let assertion = env.assertion_with("_two_confirmations", |a| {
        if let Some(subject) = a.subject.as_mut() {
            subject.subject_confirmations.insert(0, stale);
        }
    })?;

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    assert!(ctx.message().is_none(), "{:?}", ctx.message());
    assert_eq!(ctx.outputs().in_response_to(), Some(REQUEST_ID));
    Ok(())
}

#[test]
fn one_time_use_assertion_cannot_be_replayed() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let now = env.receive_instant;
    let mut assertion = env.unsigned_assertion("_once");
    assertion.conditions = Some(
        Conditions::new()
            .valid_between(now - Duration::seconds(1), now + Duration::minutes(5))
            .with_audience(SP)
            .one_time_use(),
    );
    env.idp.sign(&mut assertion)?;

    let (first, ctx) = env.validate(&assertion, env.params());
    assert_eq!(first, ValidationResult::Valid, "{:?}", ctx.message());

    let (second, ctx) = env.validate(&assertion, env.params());
    assert_eq!(second, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("OneTimeUse"));
    Ok(())
}

#[test]
fn force_authn_requires_fresh_authentication() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut request = AuthnRequest::with_id(REQUEST_ID, SP)
        .issued_at(env.receive_instant - Duration::seconds(30));
    request.force_authn = Some(true);

    let mut stale = env.unsigned_assertion("_stale");
    stale.statements = vec![AuthnStatement::new(
        env.receive_instant - Duration::hours(1),
        AuthnContextClass::PasswordProtectedTransport,
    )
    .into()];
    env.idp.sign(&mut stale)?;
    let (result, ctx) = env.validate(&stale, env.params().with_authn_request(request.clone()));
    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("ForceAuthn"));

    let fresh = env.assertion("_fresh")?;
    let (result, ctx) = env.validate(&fresh, env.params().with_authn_request(request));
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}

#[test]
fn reused_session_older_than_max_sso_session_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.unsigned_assertion("_sso");
    assertion.statements = vec![AuthnStatement::new(
        env.receive_instant - Duration::hours(3),
        AuthnContextClass::PasswordProtectedTransport,
    )
    .into()];
    env.idp.sign(&mut assertion)?;

    let params = env.params().with_max_sso_session(Duration::hours(2));
    let (result, _) = env.validate(&assertion, params);
    assert_eq!(result, ValidationResult::Invalid);

    let params = env.params().with_max_sso_session(Duration::hours(4));
    let (result, ctx) = env.validate(&assertion, params);
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}
