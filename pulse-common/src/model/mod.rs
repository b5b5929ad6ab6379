pub mod author;
pub mod content;
pub mod filter;
pub mod stats;
pub mod tag;
pub mod text;

use crate::model::text::InvalidTextError;
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    marker::PhantomData,
    num::{ParseIntError, TryFromIntError},
    str::FromStr,
};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Text(#[from] InvalidTextError),
    #[error("A counter was out of range: {0}")]
    Counter(#[from] TryFromIntError),
}

/// Store-assigned identity of a record. Ids grow in creation order, so sorting
/// by id descending lists the most recently created records first.
#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Id<Marker>(u64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str(s).map(Self::new)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, content::ContentMarker};

    #[test]
    fn id_parsing() {
        assert_eq!("42".parse::<Id<ContentMarker>>(), Ok(Id::new(42)));
        assert!("-1".parse::<Id<ContentMarker>>().is_err());
        assert!("abc".parse::<Id<ContentMarker>>().is_err());
        assert!("".parse::<Id<ContentMarker>>().is_err());
    }

    #[test]
    fn id_ordering_follows_inner_value() {
        let older = Id::<ContentMarker>::new(3);
        let newer = Id::<ContentMarker>::new(10);
        assert!(newer > older);
        assert_eq!(serde_json::to_string(&newer).unwrap(), "10");
    }
}
