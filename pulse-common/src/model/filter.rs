use crate::model::{Id, author::AuthorMarker, tag::TagMarker};
use std::{num::NonZeroU32, str::FromStr};
use thiserror::Error;
use time::{Duration, OffsetDateTime, macros::datetime};

/// Content timestamps are RFC 3339, so none of them precede year 0.
const EARLIEST_TIMESTAMP: OffsetDateTime = datetime!(0000-01-01 0:00 UTC);

/// Length of the window, ending now, that content timestamps must fall into.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Timeframe(Duration);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Timeframe must be a positive number of days: {0:?}")]
pub struct InvalidTimeframeError(String);

impl Timeframe {
    #[must_use]
    pub fn days(days: NonZeroU32) -> Self {
        Self(Duration::days(days.get().into()))
    }

    #[must_use]
    pub fn get(self) -> Duration {
        self.0
    }

    /// Inclusive `(start, end)` bounds of the window ending at `end`.
    ///
    /// `start` is `None` when the window reaches back past every timestamp a
    /// content record can carry.
    #[must_use]
    pub fn window_ending_at(
        self,
        end: OffsetDateTime,
    ) -> (Option<OffsetDateTime>, OffsetDateTime) {
        let start = end
            .checked_sub(self.0)
            .filter(|start| *start >= EARLIEST_TIMESTAMP);
        (start, end)
    }
}

impl FromStr for Timeframe {
    type Err = InvalidTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NonZeroU32::from_str(s.trim())
            .map(Self::days)
            .map_err(|_| InvalidTimeframeError(s.to_owned()))
    }
}

/// Restrictions applied to a content listing. Every present restriction must
/// hold for a record to be listed.
///
/// Names are kept as given: a name no tag or author can have matches nothing.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ContentFilter {
    pub tag: Option<String>,
    pub tag_id: Option<Id<TagMarker>>,
    pub author_id: Option<Id<AuthorMarker>>,
    pub author_username: Option<String>,
    pub timeframe: Option<Timeframe>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
}
