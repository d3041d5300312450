//! Trust evaluation criteria.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Intended use of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    /// The key may be used for any purpose.
    #[default]
    Unspecified,
    /// Signature creation and verification.
    Signing,
    /// Encryption and decryption.
    Encryption,
}

impl UsageType {
    /// Returns true if a key declared for `self` may serve `required`.
    #[must_use]
    pub const fn permits(&self, required: Self) -> bool {
        matches!(
            (self, required),
            (Self::Unspecified, _)
                | (_, Self::Unspecified)
                | (Self::Signing, Self::Signing)
                | (Self::Encryption, Self::Encryption)
        )
    }
}

/// The kind of a [`Criterion`]. A [`CriteriaSet`] holds at most one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CriterionKind {
    /// See [`Criterion::EntityId`].
    EntityId,
    /// See [`Criterion::Usage`].
    Usage,
    /// See [`Criterion::KeyName`].
    KeyName,
}

/// A single fact the trust engine evaluates a signature against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// The entity ID of the party expected to have signed.
    EntityId(String),
    /// The usage the signing key must permit.
    Usage(UsageType),
    /// A key name hint.
    KeyName(String),
}

impl Criterion {
    /// Returns the kind of this criterion.
    #[must_use]
    pub const fn kind(&self) -> CriterionKind {
        match self {
            Self::EntityId(_) => CriterionKind::EntityId,
            Self::Usage(_) => CriterionKind::Usage,
            Self::KeyName(_) => CriterionKind::KeyName,
        }
    }
}

/// An unordered collection of criteria, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSet {
    criteria: BTreeMap<CriterionKind, Criterion>,
}

impl CriteriaSet {
    /// Creates an empty criteria set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a criterion, replacing any existing one of the same kind.
    #[must_use]
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.insert(criterion);
        self
    }

    /// Adds a criterion, replacing any existing one of the same kind.
    pub fn insert(&mut self, criterion: Criterion) {
        self.criteria.insert(criterion.kind(), criterion);
    }

    /// Adds a criterion only if none of the same kind is present.
    ///
    /// Returns true if the criterion was added.
    pub fn insert_if_absent(&mut self, criterion: Criterion) -> bool {
        let kind = criterion.kind();
        if self.criteria.contains_key(&kind) {
            return false;
        }
        self.criteria.insert(kind, criterion);
        true
    }

    /// Returns true if a criterion of the given kind is present.
    #[must_use]
    pub fn contains(&self, kind: CriterionKind) -> bool {
        self.criteria.contains_key(&kind)
    }

    /// Returns the criterion of the given kind.
    #[must_use]
    pub fn get(&self, kind: CriterionKind) -> Option<&Criterion> {
        self.criteria.get(&kind)
    }

    /// Returns the entity ID criterion value.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        match self.get(CriterionKind::EntityId) {
            Some(Criterion::EntityId(id)) => Some(id),
            _ => None,
        }
    }

    /// Returns the usage criterion value.
    #[must_use]
    pub fn usage(&self) -> Option<UsageType> {
        match self.get(CriterionKind::Usage) {
            Some(Criterion::Usage(usage)) => Some(*usage),
            _ => None,
        }
    }

    /// Returns the key name criterion value.
    #[must_use]
    pub fn key_name(&self) -> Option<&str> {
        match self.get(CriterionKind::KeyName) {
            Some(Criterion::KeyName(name)) => Some(name),
            _ => None,
        }
    }

    /// Iterates over the criteria.
    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.values()
    }

    /// Returns the number of criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl FromIterator<Criterion> for CriteriaSet {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        let mut set = Self::new();
        for criterion in iter {
            set.insert(criterion);
        }
        set
    }
}
