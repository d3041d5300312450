//! Validator settings.
//!
//! A deployment sets its validation policy once, from a TOML file or from
//! `RP_SAML_*` environment variables, and derives per-call
//! [`ValidationParams`] from it.
//!
//! ```toml
//! strict_validation = true
//! clock_skew = "90s"
//! max_message_age = 180000   # legacy milliseconds
//! expected_issuer = "https://idp.example.org"
//! valid_audiences = ["https://sp.example.org"]
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Deserializer};

use crate::error::{SamlError, SamlResult};
use crate::signature::SamlSignatureProfileValidator;
use crate::validation::{duration_from_millis, ParamKey, ValidationParams};

/// Deployment-wide validation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorSettings {
    /// Treat unknown conditions as indeterminate.
    pub strict_validation: bool,

    /// Allowed clock skew.
    #[serde(deserialize_with = "deserialize_duration")]
    pub clock_skew: Option<Duration>,

    /// Maximum age of a received message.
    #[serde(deserialize_with = "deserialize_duration")]
    pub max_message_age: Option<Duration>,

    /// Whether unsigned assertions are rejected. Defaults to required.
    pub signature_required: Option<bool>,

    /// Required issuer entity ID.
    pub expected_issuer: Option<String>,

    /// Maximum age of a reused authentication.
    #[serde(deserialize_with = "deserialize_duration")]
    pub max_sso_session: Option<Duration>,

    /// Acceptable bearer confirmation recipients.
    pub valid_recipients: Vec<String>,

    /// Acceptable audiences.
    pub valid_audiences: Vec<String>,

    /// Acceptable presenter addresses.
    pub valid_addresses: Vec<String>,

    /// Whether presenter addresses are checked.
    pub check_address: bool,

    /// Whether SHA-1 based signatures are accepted.
    pub allow_sha1: bool,
}

impl ValidatorSettings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> SamlResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses settings from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid settings.
    pub fn from_toml(content: &str) -> SamlResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads settings from `RP_SAML_*` environment variables.
    ///
    /// A `.env` file in the working directory is honoured.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparseable value.
    pub fn from_env() -> SamlResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Builds settings from `(name, value)` pairs named like environment
    /// variables. Unrelated names are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognised variable holds an unparseable value.
    pub fn from_vars<I, K, V>(vars: I) -> SamlResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let var = |key: ParamKey| key.env_var().and_then(|name| vars.get(name));

        let mut settings = Self::default();
        if let Some(v) = var(ParamKey::StrictValidation) {
            settings.strict_validation = parse_bool(ParamKey::StrictValidation, v)?;
        }
        if let Some(v) = var(ParamKey::ClockSkew) {
            settings.clock_skew = Some(parse_duration(v)?);
        }
        if let Some(v) = var(ParamKey::MaxMessageAge) {
            settings.max_message_age = Some(parse_duration(v)?);
        }
        if let Some(v) = var(ParamKey::SignatureRequired) {
            settings.signature_required = Some(parse_bool(ParamKey::SignatureRequired, v)?);
        }
        if let Some(v) = var(ParamKey::ExpectedIssuer) {
            settings.expected_issuer = Some(v.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(v) = var(ParamKey::MaxSsoSession) {
            settings.max_sso_session = Some(parse_duration(v)?);
        }
        if let Some(v) = var(ParamKey::ValidRecipients) {
            settings.valid_recipients = parse_list(v);
        }
        if let Some(v) = var(ParamKey::ValidAudiences) {
            settings.valid_audiences = parse_list(v);
        }
        if let Some(v) = var(ParamKey::ValidAddresses) {
            settings.valid_addresses = parse_list(v);
        }
        if let Some(v) = var(ParamKey::CheckAddress) {
            settings.check_address = parse_bool(ParamKey::CheckAddress, v)?;
        }
        if let Some(v) = vars.get(ALLOW_SHA1_VAR) {
            settings.allow_sha1 = parse_bool_named(ALLOW_SHA1_VAR, v)?;
        }
        Ok(settings)
    }

    /// Produces the static parameters these settings describe.
    ///
    /// Per-call values (receive instant, InResponseTo, enclosing Response,
    /// original request) are added by the caller.
    #[must_use]
    pub fn to_params(&self) -> ValidationParams {
        let mut params = ValidationParams::new()
            .with_strict_validation(self.strict_validation)
            .with_check_address(self.check_address)
            .with_valid_recipients(self.valid_recipients.iter().cloned())
            .with_valid_audiences(self.valid_audiences.iter().cloned())
            .with_valid_addresses(self.valid_addresses.iter().cloned());
        params.clock_skew = self.clock_skew;
        params.max_message_age = self.max_message_age;
        params.signature_required = self.signature_required;
        params.expected_issuer.clone_from(&self.expected_issuer);
        params.max_sso_session = self.max_sso_session;
        params
    }

    /// Builds the signature profile validator these settings describe.
    #[must_use]
    pub const fn prevalidator(&self) -> SamlSignatureProfileValidator {
        SamlSignatureProfileValidator::new().allow_sha1(self.allow_sha1)
    }
}

/// Environment variable for [`ValidatorSettings::allow_sha1`].
pub const ALLOW_SHA1_VAR: &str = "RP_SAML_ALLOW_SHA1";

/// Parses a duration.
///
/// Accepts a bare integer as legacy milliseconds, or an integer with one of
/// the suffixes `ms`, `s`, `m` or `h`.
///
/// # Errors
///
/// Returns an error for any other form.
pub fn parse_duration(value: &str) -> SamlResult<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: i64 = digits
        .parse()
        .map_err(|_| SamlError::Config(format!("invalid duration: '{value}'")))?;

    let millis_per_unit: i64 = match unit.trim() {
        "" | "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        other => {
            return Err(SamlError::Config(format!(
                "invalid duration unit '{other}' in '{value}'"
            )))
        }
    };
    let millis = amount
        .checked_mul(millis_per_unit)
        .ok_or_else(|| SamlError::Config(format!("duration out of range: '{value}'")))?;
    duration_from_millis(millis)
}

fn parse_bool(key: ParamKey, value: &str) -> SamlResult<bool> {
    parse_bool_named(key.env_var().unwrap_or(key.name()), value)
}

fn parse_bool_named(name: &str, value: &str) -> SamlResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(SamlError::Config(format!("{name}: invalid boolean '{other}'"))),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Millis(i64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDuration>::deserialize(deserializer)?;
    raw.map(|raw| match raw {
        RawDuration::Millis(millis) => duration_from_millis(millis),
        RawDuration::Text(text) => parse_duration(&text),
    })
    .transpose()
    .map_err(serde::de::Error::custom)
}
