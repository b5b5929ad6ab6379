use crate::model::content::{Content, ratio, serialize_rate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How [`ContentStats`] folds a collection into totals.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsAccumulation {
    /// Totals as historically reported: every record adds the *running*
    /// like/share/comment totals to `total_engagement`, and every record adds
    /// its author's followers, even when the author was already counted.
    /// `total_engagement_rate` is never computed and stays 0.
    #[default]
    Legacy,
    /// Per-record engagement summed once, followers counted once per
    /// distinct author, rate computed over all views.
    Corrected,
}

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize)]
pub struct ContentStats {
    pub total_likes: u64,
    pub total_shares: u64,
    pub total_views: u64,
    pub total_comments: u64,
    pub total_engagement: u64,
    #[serde(serialize_with = "serialize_rate")]
    pub total_engagement_rate: f64,
    pub total_contents: u64,
    pub total_followers: u64,
}

impl ContentStats {
    pub fn accumulate<'a>(
        contents: impl IntoIterator<Item = &'a Content>,
        accumulation: StatsAccumulation,
    ) -> Self {
        match accumulation {
            StatsAccumulation::Legacy => Self::accumulate_legacy(contents),
            StatsAccumulation::Corrected => Self::accumulate_corrected(contents),
        }
    }

    fn add_counters(&mut self, content: &Content) {
        let counters = content.counters;
        self.total_likes = self.total_likes.saturating_add(counters.like_count);
        self.total_shares = self.total_shares.saturating_add(counters.share_count);
        self.total_comments = self.total_comments.saturating_add(counters.comment_count);
        self.total_views = self.total_views.saturating_add(counters.view_count);
        self.total_contents += 1;
    }

    fn accumulate_legacy<'a>(contents: impl IntoIterator<Item = &'a Content>) -> Self {
        let mut stats = Self::default();
        for content in contents {
            stats.add_counters(content);
            let running = stats
                .total_likes
                .saturating_add(stats.total_shares)
                .saturating_add(stats.total_comments);
            stats.total_engagement = stats.total_engagement.saturating_add(running);
            stats.total_followers = stats
                .total_followers
                .saturating_add(content.author.followers);
        }

        stats
    }

    fn accumulate_corrected<'a>(contents: impl IntoIterator<Item = &'a Content>) -> Self {
        let mut stats = Self::default();
        let mut counted_authors = HashSet::new();
        for content in contents {
            stats.add_counters(content);
            stats.total_engagement = stats
                .total_engagement
                .saturating_add(content.counters.total_engagement());
            if counted_authors.insert(content.author.id) {
                stats.total_followers = stats
                    .total_followers
                    .saturating_add(content.author.followers);
            }
        }
        stats.total_engagement_rate = ratio(stats.total_engagement, stats.total_views);

        stats
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        content::{
            Content,
            tests::{author, content, counters},
        },
        stats::{ContentStats, StatsAccumulation},
    };

    #[test]
    fn empty_collection_is_all_zero() {
        for accumulation in [StatsAccumulation::Legacy, StatsAccumulation::Corrected] {
            let empty: [Content; 0] = [];
            let stats = ContentStats::accumulate(&empty, accumulation);
            assert_eq!(stats, ContentStats::default());

            let value = serde_json::to_value(stats).unwrap();
            for key in [
                "total_likes",
                "total_shares",
                "total_views",
                "total_comments",
                "total_engagement",
                "total_contents",
                "total_followers",
            ] {
                assert_eq!(value[key], 0, "{key}");
            }
            assert_eq!(value["total_engagement_rate"], 0.0);
        }
    }

    #[test]
    fn legacy_resums_running_totals() {
        let same_author = author(1, 100);
        let contents = [
            content(2, same_author.clone(), counters(1, 1, 1, 10)),
            content(1, same_author, counters(1, 1, 1, 10)),
        ];

        let stats = ContentStats::accumulate(&contents, StatsAccumulation::Legacy);

        assert_eq!(stats.total_likes, 2);
        assert_eq!(stats.total_shares, 2);
        assert_eq!(stats.total_comments, 2);
        assert_eq!(stats.total_views, 20);
        // 3 after the first record, then 3 + 6 after the second.
        assert_eq!(stats.total_engagement, 9);
        assert_eq!(stats.total_contents, 2);
        assert_eq!(stats.total_followers, 200);
        assert!(stats.total_engagement_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn corrected_sums_each_record_once() {
        let same_author = author(1, 100);
        let contents = [
            content(3, same_author.clone(), counters(1, 1, 1, 10)),
            content(2, same_author, counters(1, 1, 1, 10)),
            content(1, author(2, 5), counters(10, 2, 3, 100)),
        ];

        let stats = ContentStats::accumulate(&contents, StatsAccumulation::Corrected);

        assert_eq!(stats.total_likes, 12);
        assert_eq!(stats.total_engagement, 21);
        assert_eq!(stats.total_views, 120);
        assert_eq!(stats.total_contents, 3);
        assert_eq!(stats.total_followers, 105);
        assert!((stats.total_engagement_rate - 21.0 / 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strategies_agree_on_a_single_record() {
        let contents = [content(1, author(1, 42), counters(10, 2, 3, 100))];

        let legacy = ContentStats::accumulate(&contents, StatsAccumulation::Legacy);
        let corrected = ContentStats::accumulate(&contents, StatsAccumulation::Corrected);

        assert_eq!(legacy.total_engagement, 15);
        assert_eq!(corrected.total_engagement, 15);
        assert_eq!(legacy.total_followers, corrected.total_followers);
    }

    #[test]
    fn accumulation_parses_from_config_value() {
        let legacy: StatsAccumulation = serde_json::from_str("\"legacy\"").unwrap();
        let corrected: StatsAccumulation = serde_json::from_str("\"corrected\"").unwrap();

        assert_eq!(legacy, StatsAccumulation::Legacy);
        assert_eq!(corrected, StatsAccumulation::Corrected);
        assert_eq!(StatsAccumulation::default(), StatsAccumulation::Legacy);
    }
}
