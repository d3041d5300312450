//! Ordering, timing and policy properties of the assertion pipeline.

use chrono::Duration;

use rp_saml::{
    AuthnContextClass, AuthnStatement, Condition, Conditions, ExtensionElement, QName,
    ValidationParams, ValidationResult,
};

use crate::common::{TestEnv, SP};

const EXTENSION_NS: &str = "urn:example:conditions";

#[test]
fn baseline_assertion_is_valid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion("_baseline")?;

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    assert!(ctx.message().is_none());
    Ok(())
}

#[test]
fn missing_id_is_reported_before_issue_instant() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let mut assertion = env.assertion("_noid")?;
    assertion.id.clear();
    assertion.issue_instant = Some(env.receive_instant + Duration::hours(1));

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    let message = ctx.message().unwrap_or_default();
    assert!(message.contains("ID"), "{message}");
    assert!(!message.contains("IssueInstant"), "{message}");
    Ok(())
}

#[test]
fn issue_instant_at_future_skew_boundary_is_valid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let skew = Duration::seconds(30);
    let params = env.params().with_clock_skew(skew);

    let at_boundary = env.assertion_with("_edge", |a| {
        a.issue_instant = Some(env.receive_instant + skew);
    })?;
    let (result, ctx) = env.validate(&at_boundary, params.clone());
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());

    let past_boundary = env.assertion_with("_edge2", |a| {
        a.issue_instant = Some(env.receive_instant + skew + Duration::milliseconds(1));
    })?;
    let (result, ctx) = env.validate(&past_boundary, params);
    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("future"));
    Ok(())
}

#[test]
fn issue_instant_older_than_max_age_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let params = env
        .params()
        .with_clock_skew(Duration::zero())
        .with_max_message_age(Duration::minutes(3));

    let oldest = env.assertion_with("_old", |a| {
        a.issue_instant = Some(env.receive_instant - Duration::minutes(3));
        a.statements.clear();
    })?;
    let (result, ctx) = env.validate(&oldest, params.clone());
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());

    let too_old = env.assertion_with("_older", |a| {
        a.issue_instant =
            Some(env.receive_instant - Duration::minutes(3) - Duration::milliseconds(1));
        a.statements.clear();
    })?;
    let (result, _) = env.validate(&too_old, params);
    assert_eq!(result, ValidationResult::Invalid);
    Ok(())
}

#[test]
fn response_issue_instant_replaces_receive_window() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    // Far outside the receive window, but not after the enclosing response.
    let assertion = env.assertion_with("_inresponse", |a| {
        a.issue_instant = Some(env.receive_instant - Duration::hours(2));
        a.statements.clear();
    })?;

    let params = env
        .params()
        .with_response_issue_instant(env.receive_instant - Duration::hours(1));
    let (result, ctx) = env.validate(&assertion, params);
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());

    let params = env
        .params()
        .with_response_issue_instant(env.receive_instant - Duration::hours(3));
    let (result, _) = env.validate(&assertion, params);
    assert_eq!(result, ValidationResult::Invalid);
    Ok(())
}

#[test]
fn not_on_or_after_boundary_without_skew() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let params = env.params().with_clock_skew(Duration::zero());
    let now = env.receive_instant;

    let expired = env.assertion_with("_expired", |a| {
        a.conditions = Some(
            Conditions::new()
                .valid_between(now - Duration::seconds(1), now)
                .with_audience(SP),
        );
    })?;
    let (result, ctx) = env.validate(&expired, params.clone());
    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("expired"));

    let current = env.assertion_with("_current", |a| {
        a.conditions = Some(
            Conditions::new()
                .valid_between(now - Duration::seconds(1), now + Duration::milliseconds(1))
                .with_audience(SP),
        );
    })?;
    let (result, ctx) = env.validate(&current, params);
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}

#[test]
fn not_before_beyond_skew_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let now = env.receive_instant;
    let assertion = env.assertion_with("_early", |a| {
        a.conditions = Some(
            Conditions::new()
                .valid_between(now + Duration::minutes(6), now + Duration::minutes(10))
                .with_audience(SP),
        );
    })?;

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("not valid before"));
    Ok(())
}

#[test]
fn authn_statement_without_subject_is_always_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion_with("_nosubject", |a| a.subject = None)?;

    let contexts = [
        env.params(),
        env.params().with_strict_validation(true),
        env.params().with_signature_required(false),
        ValidationParams::new().with_receive_instant(env.receive_instant),
    ];
    for params in contexts {
        let (result, ctx) = env.validate(&assertion, params);
        assert_eq!(result, ValidationResult::Invalid);
        assert!(ctx.message().unwrap_or_default().contains("no Subject"));
    }
    Ok(())
}

#[test]
fn subject_is_optional_without_authn_statement() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion_with("_attrs_only", |a| {
        a.subject = None;
        a.statements.clear();
    })?;

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}

#[test]
fn unknown_condition_depends_on_strict_mode() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let now = env.receive_instant;
    let assertion = env.assertion_with("_unknown_cond", |a| {
        a.conditions = Some(
            Conditions::new()
                .valid_between(now - Duration::seconds(1), now + Duration::minutes(5))
                .with_audience(SP)
                .with_condition(Condition::Extension(ExtensionElement::new(QName::new(
                    EXTENSION_NS,
                    "GeoFence",
                )))),
        );
    })?;

    let (result, ctx) = env.validate(&assertion, env.params().with_strict_validation(true));
    assert_eq!(result, ValidationResult::Indeterminate);
    assert!(ctx.message().unwrap_or_default().contains("GeoFence"));

    let (result, ctx) = env.validate(&assertion, env.params().with_strict_validation(false));
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}

#[test]
fn failing_audience_condition_is_invalid_with_composed_message() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion("_aud")?;
    let mut params = env.params();
    params.valid_audiences = ["https://other-sp.example.org".to_string()].into();

    let (result, ctx) = env.validate(&assertion, params);

    assert_eq!(result, ValidationResult::Invalid);
    let message = ctx.message().unwrap_or_default();
    assert!(message.starts_with("Condition '"), "{message}");
    assert!(message.contains("AudienceRestriction"), "{message}");
    assert!(message.contains("_aud"), "{message}");
    Ok(())
}

#[test]
fn unsigned_assertion_follows_signature_requirement() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.unsigned_assertion("_unsigned");

    let (result, ctx) = env.validate(&assertion, env.params());
    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("not signed"));

    let (result, ctx) = env.validate(&assertion, env.params().with_signature_required(true));
    assert_eq!(result, ValidationResult::Invalid, "{:?}", ctx.message());

    let (result, ctx) = env.validate(&assertion, env.params().with_signature_required(false));
    assert_eq!(result, ValidationResult::Valid, "{:?}", ctx.message());
    Ok(())
}

#[test]
fn authn_instant_after_issue_instant_is_invalid() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion_with("_late_authn", |a| {
        a.statements = vec![AuthnStatement::new(
            env.receive_instant + Duration::seconds(1),
            AuthnContextClass::PasswordProtectedTransport,
        )
        .into()];
    })?;

    let (result, ctx) = env.validate(&assertion, env.params());

    assert_eq!(result, ValidationResult::Invalid);
    assert!(ctx.message().unwrap_or_default().contains("after its IssueInstant"));
    Ok(())
}

#[test]
fn validation_is_idempotent() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = env.assertion_with("_again", |a| {
        a.issue_instant = Some(env.receive_instant + Duration::hours(1));
    })?;

    let (first, first_ctx) = env.validate(&assertion, env.params());
    let (second, second_ctx) = env.validate(&assertion, env.params());

    assert_eq!(first, ValidationResult::Invalid);
    assert_eq!(first, second);
    assert_eq!(first_ctx.message(), second_ctx.message());
    Ok(())
}
