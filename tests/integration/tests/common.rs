//! Common test utilities and fixtures.

use std::sync::Arc;

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};

use rp_saml::signature::{
    Credential, ExplicitKeyTrustEngine, SamlSignatureProfileValidator, SignatureAlgorithm,
    SignaturePrevalidator, StaticCredentialResolver, TrustEngine, XmlSignature,
};
use rp_saml::validation::{
    AssertionValidator, ValidationContext, ValidationParams, ValidationResult,
};
use rp_saml::{
    Assertion, AuthnContextClass, AuthnStatement, Conditions, NameId, Subject,
    SubjectConfirmation, SubjectConfirmationData,
};

/// Entity ID of the test identity provider.
pub const IDP: &str = "https://idp.example.org";

/// Entity ID of the test service provider.
pub const SP: &str = "https://sp.example.org";

/// Assertion consumer service URL of the test service provider.
pub const ACS: &str = "https://sp.example.org/saml/acs";

/// ID of the AuthnRequest the test assertions answer.
pub const REQUEST_ID: &str = "_req42";

/// An identity provider holding a freshly generated signing key.
pub struct TestIdp {
    key_pair: EcdsaKeyPair,
}

impl TestIdp {
    /// Generates a new identity provider key.
    pub fn new() -> anyhow::Result<Self> {
        let key_pair = EcdsaKeyPair::generate(&ECDSA_P256_SHA256_FIXED_SIGNING)?;
        Ok(Self { key_pair })
    }

    /// The credential a relying party trusts for this IdP.
    pub fn credential(&self) -> Credential {
        Credential::from_public_key(IDP, self.key_pair.public_key().as_ref())
    }

    /// A trust engine trusting only this IdP.
    pub fn trust_engine(&self) -> Arc<dyn TrustEngine> {
        Arc::new(ExplicitKeyTrustEngine::new(StaticCredentialResolver::new(
            vec![self.credential()],
        )))
    }

    /// Signs `assertion` as it is now, replacing any existing signature.
    pub fn sign(&self, assertion: &mut Assertion) -> anyhow::Result<()> {
        let algorithm = SignatureAlgorithm::EcdsaSha256;
        let content = assertion.canonical_content()?;
        let mut signature = XmlSignature::new(
            algorithm,
            &assertion.id,
            algorithm.digest_value(content.as_bytes()),
            "",
        );
        let signed = self
            .key_pair
            .sign(&SystemRandom::new(), &signature.signed_info_bytes())?;
        signature.signature_value =
            base64::engine::general_purpose::STANDARD.encode(signed.as_ref());
        assertion.signature = Some(signature);
        Ok(())
    }
}

/// Test environment holding an IdP and a validator that trusts it.
pub struct TestEnv {
    /// The identity provider.
    pub idp: TestIdp,
    /// The shared validator.
    pub validator: Arc<AssertionValidator>,
    /// Reference instant for every test assertion.
    pub receive_instant: DateTime<Utc>,
}

impl TestEnv {
    /// Creates a new test environment.
    pub fn new() -> anyhow::Result<Self> {
        init_tracing();

        let idp = TestIdp::new()?;
        let prevalidator: Arc<dyn SignaturePrevalidator> =
            Arc::new(SamlSignatureProfileValidator::new());
        let validator =
            AssertionValidator::with_defaults(Some(idp.trust_engine()), Some(prevalidator));

        Ok(Self {
            idp,
            validator: Arc::new(validator),
            receive_instant: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        })
    }

    /// Static parameters of a relying party expecting the test IdP.
    pub fn params(&self) -> ValidationParams {
        ValidationParams::new()
            .with_receive_instant(self.receive_instant)
            .with_expected_issuer(IDP)
            .with_valid_recipients([ACS])
            .with_valid_audiences([SP])
            .with_in_response_to(REQUEST_ID)
    }

    /// An unsigned assertion that passes every check.
    pub fn unsigned_assertion(&self, id: &str) -> Assertion {
        let now = self.receive_instant;
        let confirmation = SubjectConfirmation::bearer().with_data(
            SubjectConfirmationData::for_request(REQUEST_ID, ACS, now + Duration::minutes(5)),
        );
        Assertion::with_id(id, IDP)
            .issued_at(now)
            .with_subject(
                Subject::new(NameId::persistent("u-1001")).with_confirmation(confirmation),
            )
            .with_conditions(
                Conditions::new()
                    .valid_between(now - Duration::seconds(1), now + Duration::minutes(5))
                    .with_audience(SP),
            )
            .with_statement(AuthnStatement::new(
                now,
                AuthnContextClass::PasswordProtectedTransport,
            ))
    }

    /// A signed assertion that passes every check.
    pub fn assertion(&self, id: &str) -> anyhow::Result<Assertion> {
        self.assertion_with(id, |_| {})
    }

    /// A signed assertion, edited before signing.
    pub fn assertion_with(
        &self,
        id: &str,
        edit: impl FnOnce(&mut Assertion),
    ) -> anyhow::Result<Assertion> {
        let mut assertion = self.unsigned_assertion(id);
        edit(&mut assertion);
        self.idp.sign(&mut assertion)?;
        Ok(assertion)
    }

    /// Validates `assertion` with the shared validator.
    pub fn validate(
        &self,
        assertion: &Assertion,
        params: ValidationParams,
    ) -> (ValidationResult, ValidationContext) {
        let mut ctx = ValidationContext::new(params);
        let result = self.validator.validate(assertion, &mut ctx);
        (result, ctx)
    }
}

/// Installs a test subscriber once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rp_saml=debug")
        .with_test_writer()
        .try_init();
}
