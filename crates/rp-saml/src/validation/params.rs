//! Well-known validation context parameters.

use std::fmt;

/// A well-known key of the validation context.
///
/// Static keys are policy inputs supplied by the caller and read by
/// validators. Dynamic keys are outputs written by validators during a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    // ==== Static: core policy ====
    /// Unknown conditions are indeterminate instead of skipped.
    StrictValidation,
    /// Tolerance applied to every time comparison.
    ClockSkew,
    /// Maximum age of an assertion's IssueInstant.
    MaxMessageAge,
    /// Reference instant for time checks.
    ReceiveInstant,
    /// Whether unsigned assertions are rejected.
    SignatureRequired,
    /// Caller supplied trust engine criteria.
    SignatureCriteria,
    /// Required issuer entity ID.
    ExpectedIssuer,
    /// IssueInstant of an already validated enclosing Response.
    ResponseIssueInstant,

    // ==== Static: SSO policy ====
    /// The AuthnRequest the assertion answers.
    AuthnRequest,
    /// IssueInstant of the AuthnRequest.
    AuthnRequestIssueInstant,
    /// Whether forced re-authentication was requested.
    ForceAuthn,
    /// Maximum age of a reused authentication.
    MaxSsoSession,

    // ==== Static: sub-validator inputs ====
    /// Expected InResponseTo of bearer confirmations.
    InResponseTo,
    /// Acceptable bearer confirmation recipients.
    ValidRecipients,
    /// Acceptable audiences.
    ValidAudiences,
    /// Acceptable presenter addresses.
    ValidAddresses,
    /// Whether bearer confirmation addresses are checked.
    CheckAddress,

    // ==== Dynamic ====
    /// The subject confirmation that succeeded.
    ConfirmedSubjectConfirmation,
    /// Recipient of the confirmed subject confirmation.
    ConfirmedRecipient,
    /// Address of the confirmed subject confirmation.
    ConfirmedAddress,
    /// InResponseTo of the confirmed subject confirmation.
    ConfirmedInResponseTo,
    /// NotOnOrAfter of the confirmed subject confirmation.
    ConfirmedNotOnOrAfter,
    /// The audience that satisfied an audience restriction.
    MatchedAudience,
}

impl ParamKey {
    /// Every key, static keys first.
    pub const ALL: [Self; 23] = [
        Self::StrictValidation,
        Self::ClockSkew,
        Self::MaxMessageAge,
        Self::ReceiveInstant,
        Self::SignatureRequired,
        Self::SignatureCriteria,
        Self::ExpectedIssuer,
        Self::ResponseIssueInstant,
        Self::AuthnRequest,
        Self::AuthnRequestIssueInstant,
        Self::ForceAuthn,
        Self::MaxSsoSession,
        Self::InResponseTo,
        Self::ValidRecipients,
        Self::ValidAudiences,
        Self::ValidAddresses,
        Self::CheckAddress,
        Self::ConfirmedSubjectConfirmation,
        Self::ConfirmedRecipient,
        Self::ConfirmedAddress,
        Self::ConfirmedInResponseTo,
        Self::ConfirmedNotOnOrAfter,
        Self::MatchedAudience,
    ];

    /// Returns the stable parameter name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StrictValidation => "saml2.StrictValidation",
            Self::ClockSkew => "saml2.ClockSkew",
            Self::MaxMessageAge => "saml2.MaxMessageAge",
            Self::ReceiveInstant => "saml2.ReceiveInstant",
            Self::SignatureRequired => "saml2.SignatureRequired",
            Self::SignatureCriteria => "saml2.SignatureValidationCriteriaSet",
            Self::ExpectedIssuer => "saml2.ExpectedIssuer",
            Self::ResponseIssueInstant => "saml2.ResponseIssueInstant",
            Self::AuthnRequest => "saml2.AuthnRequest",
            Self::AuthnRequestIssueInstant => "saml2.AuthnRequest.IssueInstant",
            Self::ForceAuthn => "saml2.AuthnRequest.ForceAuthn",
            Self::MaxSsoSession => "saml2.Statement.AuthnStatement.MaxSsoSession",
            Self::InResponseTo => "saml2.SubjectConfirmation.InResponseTo",
            Self::ValidRecipients => "saml2.SubjectConfirmation.ValidRecipients",
            Self::ValidAudiences => "saml2.Conditions.ValidAudiences",
            Self::ValidAddresses => "saml2.SubjectConfirmation.ValidAddresses",
            Self::CheckAddress => "saml2.SubjectConfirmation.CheckAddress",
            Self::ConfirmedSubjectConfirmation => "saml2.ConfirmedSubjectConfirmation",
            Self::ConfirmedRecipient => "saml2.SubjectConfirmation.ConfirmedRecipient",
            Self::ConfirmedAddress => "saml2.SubjectConfirmation.ConfirmedAddress",
            Self::ConfirmedInResponseTo => "saml2.SubjectConfirmation.ConfirmedInResponseTo",
            Self::ConfirmedNotOnOrAfter => "saml2.SubjectConfirmation.ConfirmedNotOnOrAfter",
            Self::MatchedAudience => "saml2.Conditions.MatchedAudience",
        }
    }

    /// Returns the environment variable a deployment sets this key with.
    ///
    /// Per-call and dynamic keys cannot be configured and return `None`.
    #[must_use]
    pub const fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::StrictValidation => Some("RP_SAML_STRICT_VALIDATION"),
            Self::ClockSkew => Some("RP_SAML_CLOCK_SKEW"),
            Self::MaxMessageAge => Some("RP_SAML_MAX_MESSAGE_AGE"),
            Self::SignatureRequired => Some("RP_SAML_SIGNATURE_REQUIRED"),
            Self::ExpectedIssuer => Some("RP_SAML_EXPECTED_ISSUER"),
            Self::MaxSsoSession => Some("RP_SAML_MAX_SSO_SESSION"),
            Self::ValidRecipients => Some("RP_SAML_VALID_RECIPIENTS"),
            Self::ValidAudiences => Some("RP_SAML_VALID_AUDIENCES"),
            Self::ValidAddresses => Some("RP_SAML_VALID_ADDRESSES"),
            Self::CheckAddress => Some("RP_SAML_CHECK_ADDRESS"),
            _ => None,
        }
    }

    /// Returns true for keys written by validators.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(
            self,
            Self::ConfirmedSubjectConfirmation
                | Self::ConfirmedRecipient
                | Self::ConfirmedAddress
                | Self::ConfirmedInResponseTo
                | Self::ConfirmedNotOnOrAfter
                | Self::MatchedAudience
        )
    }

    /// Looks a key up by its parameter name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
