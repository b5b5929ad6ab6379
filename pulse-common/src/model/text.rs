//! Length-checked string types for the bounded text columns of the schema.

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub const NAME_MAX_LEN: usize = 100;
pub const LONG_TEXT_MAX_LEN: usize = 1024;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidTextError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },
    #[error("{kind} is longer than {max_len} characters")]
    TooLong { kind: &'static str, max_len: usize },
}

fn check_text(
    text: &str,
    kind: &'static str,
    max_len: usize,
    allow_empty: bool,
) -> Result<(), InvalidTextError> {
    if !allow_empty && text.is_empty() {
        return Err(InvalidTextError::Empty { kind });
    }
    if text.chars().count() > max_len {
        return Err(InvalidTextError::TooLong { kind, max_len });
    }

    Ok(())
}

macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident: max = $max_len:expr, allow_empty = $allow_empty:literal) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(text: String) -> Result<Self, InvalidTextError> {
                check_text(&text, stringify!($name), $max_len, $allow_empty)?;
                Ok(Self(text))
            }

            #[must_use]
            pub fn get(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidTextError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let inner = String::deserialize(deserializer)?;
                check_text(&inner, stringify!($name), $max_len, $allow_empty).map_err(|err| {
                    Error::invalid_value(Unexpected::Str(&inner), &err.to_string().as_str())
                })?;
                Ok(Self(inner))
            }
        }
    };
}

bounded_text!(
    /// Unique handle an author is resolved by.
    AuthorUsername: max = NAME_MAX_LEN, allow_empty = false
);
bounded_text!(AuthorName: max = NAME_MAX_LEN, allow_empty = true);
bounded_text!(TagName: max = NAME_MAX_LEN, allow_empty = false);
bounded_text!(LinkUrl: max = LONG_TEXT_MAX_LEN, allow_empty = true);
bounded_text!(
    /// Profile headline of an author.
    Headline: max = LONG_TEXT_MAX_LEN, allow_empty = true
);
