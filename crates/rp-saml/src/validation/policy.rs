//! Typed accessors for the core policy parameters.
//!
//! All accessors are pure functions of the context. Absent parameters fall
//! back to the defaults defined here.

use chrono::{DateTime, Duration, Utc};

use super::ValidationContext;

/// Default allowed clock skew in milliseconds (5 minutes).
pub const DEFAULT_CLOCK_SKEW_MILLIS: i64 = 5 * 60 * 1000;

/// Default maximum age of a received message in milliseconds (3 minutes).
pub const DEFAULT_MAX_MESSAGE_AGE_MILLIS: i64 = 3 * 60 * 1000;

/// Returns the default allowed clock skew.
#[must_use]
pub fn default_clock_skew() -> Duration {
    Duration::milliseconds(DEFAULT_CLOCK_SKEW_MILLIS)
}

/// Returns the default maximum message age.
#[must_use]
pub fn default_max_message_age() -> Duration {
    Duration::milliseconds(DEFAULT_MAX_MESSAGE_AGE_MILLIS)
}

/// Whether strict validation is enabled. Defaults to `false`.
#[must_use]
pub fn is_strict_validation(ctx: &ValidationContext) -> bool {
    ctx.params().strict_validation.unwrap_or(false)
}

/// The allowed clock skew.
#[must_use]
pub fn allowed_clock_skew(ctx: &ValidationContext) -> Duration {
    ctx.params().clock_skew.unwrap_or_else(default_clock_skew)
}

/// The maximum age of a received message.
#[must_use]
pub fn max_age_received_message(ctx: &ValidationContext) -> Duration {
    ctx.params()
        .max_message_age
        .unwrap_or_else(default_max_message_age)
}

/// The receive instant, or the current instant if none was supplied.
#[must_use]
pub fn receive_instant(ctx: &ValidationContext) -> DateTime<Utc> {
    ctx.params().receive_instant.unwrap_or_else(Utc::now)
}

/// Whether a signature is required. Defaults to `true`.
#[must_use]
pub fn is_signature_required(ctx: &ValidationContext) -> bool {
    ctx.params().signature_required.unwrap_or(true)
}

/// Whether confirmation addresses are checked. Defaults to `false`.
#[must_use]
pub fn is_check_address(ctx: &ValidationContext) -> bool {
    ctx.params().check_address.unwrap_or(false)
}

/// Adds `duration` to `instant`, clamping at the representable maximum.
pub(crate) fn plus(instant: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    instant
        .checked_add_signed(duration)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Subtracts `duration` from `instant`, clamping at the representable minimum.
pub(crate) fn minus(instant: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    instant
        .checked_sub_signed(duration)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
