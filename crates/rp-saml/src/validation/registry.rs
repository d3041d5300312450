//! Sub-validator contracts and the registries that dispatch to them.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::SamlResult;
use crate::types::{Assertion, Condition, QName, Statement, SubjectConfirmation};

use super::{ValidationContext, ValidationResult};

/// Validates subject confirmations of one confirmation method.
///
/// Returning `Err` signals that the confirmation could not be evaluated; the
/// assertion pipeline treats it as that confirmation failing.
pub trait SubjectConfirmationValidator: Send + Sync {
    /// The confirmation method URI this validator handles.
    fn method(&self) -> &str;

    /// Validates `confirmation` of `assertion`.
    ///
    /// # Errors
    ///
    /// Returns an error if the confirmation cannot be evaluated.
    fn validate(
        &self,
        confirmation: &SubjectConfirmation,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult>;
}

/// Validates one kind of `Condition`.
pub trait ConditionValidator: Send + Sync {
    /// The element name or schema type this validator handles.
    fn services(&self) -> QName;

    /// Validates `condition` of `assertion`.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition cannot be evaluated.
    fn validate(
        &self,
        condition: &Condition,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult>;
}

/// Validates one kind of `Statement`.
pub trait StatementValidator: Send + Sync {
    /// The element name or schema type this validator handles.
    fn services(&self) -> QName;

    /// Validates `statement` of `assertion`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be evaluated.
    fn validate(
        &self,
        statement: &Statement,
        assertion: &Assertion,
        ctx: &mut ValidationContext,
    ) -> SamlResult<ValidationResult>;
}

/// Immutable mapping from a key to exactly one validator.
pub struct ValidatorRegistry<K, V: ?Sized> {
    validators: HashMap<K, Arc<V>>,
}

/// Subject confirmation validators keyed by confirmation method.
pub type SubjectConfirmationRegistry = ValidatorRegistry<String, dyn SubjectConfirmationValidator>;

/// Condition validators keyed by element name or schema type.
pub type ConditionRegistry = ValidatorRegistry<QName, dyn ConditionValidator>;

/// Statement validators keyed by element name or schema type.
pub type StatementRegistry = ValidatorRegistry<QName, dyn StatementValidator>;

impl<K, V> ValidatorRegistry<K, V>
where
    K: Eq + Hash,
    V: ?Sized,
{
    /// Builds a registry from `validators`, keyed by `key_of`.
    ///
    /// `None` entries are ignored. A later validator for an already
    /// registered key replaces the earlier one.
    pub fn build<I, F>(validators: I, key_of: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Arc<V>>>,
        F: Fn(&V) -> K,
    {
        let validators = validators
            .into_iter()
            .filter_map(|item| -> Option<Arc<V>> { item.into() })
            .map(|validator| (key_of(validator.as_ref()), validator))
            .collect();
        Self { validators }
    }

    /// Returns the validator registered under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.validators.get(key)
    }

    /// Looks up by element name, then by schema type.
    pub fn lookup(&self, element: &K, schema_type: Option<&K>) -> Option<&Arc<V>> {
        self.validators
            .get(element)
            .or_else(|| schema_type.and_then(|t| self.validators.get(t)))
    }

    /// Returns true if a validator is registered under `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.validators.contains_key(key)
    }

    /// Iterates over the registered keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.validators.keys()
    }

    /// Returns the number of registered validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true if no validator is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<K, V: ?Sized> Default for ValidatorRegistry<K, V> {
    fn default() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }
}

impl<K: fmt::Debug, V: ?Sized> fmt::Debug for ValidatorRegistry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.validators.keys()).finish()
    }
}

impl SubjectConfirmationRegistry {
    /// Builds a registry keyed by each validator's confirmation method.
    pub fn from_validators<I>(validators: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Arc<dyn SubjectConfirmationValidator>>>,
    {
        Self::build(validators, |v| v.method().to_string())
    }
}

impl ConditionRegistry {
    /// Builds a registry keyed by each validator's serviced name.
    pub fn from_validators<I>(validators: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Arc<dyn ConditionValidator>>>,
    {
        Self::build(validators, |v| v.services())
    }
}

impl StatementRegistry {
    /// Builds a registry keyed by each validator's serviced name.
    pub fn from_validators<I>(validators: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Arc<dyn StatementValidator>>>,
    {
        Self::build(validators, |v| v.services())
    }
}
