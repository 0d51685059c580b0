//! Statistics snapshot and named readings.
//!
//! This module contains:
//! - [`StatsSnapshot`] - The six counters returned by the stats endpoint
//! - [`StatKind`] - One named reading derived from a snapshot

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Stats Snapshot
// ============================================================================

/// The latest successfully retrieved set of counters.
///
/// Snapshots are never mutated after creation. The coordinator replaces the
/// whole value on each successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Number of bookmarks.
    pub bookmarks: u64,
    /// Number of bookmarks marked as favorite.
    pub favorites: u64,
    /// Number of archived bookmarks.
    pub archived: u64,
    /// Number of highlights.
    pub highlights: u64,
    /// Number of lists.
    pub lists: u64,
    /// Number of tags.
    pub tags: u64,
}

impl StatsSnapshot {
    /// Creates a snapshot from the six counters.
    pub const fn new(
        bookmarks: u64,
        favorites: u64,
        archived: u64,
        highlights: u64,
        lists: u64,
        tags: u64,
    ) -> Self {
        Self {
            bookmarks,
            favorites,
            archived,
            highlights,
            lists,
            tags,
        }
    }

    /// Returns the value of a single reading.
    pub fn get(&self, kind: StatKind) -> u64 {
        match kind {
            StatKind::Bookmarks => self.bookmarks,
            StatKind::Favorites => self.favorites,
            StatKind::Archived => self.archived,
            StatKind::Highlights => self.highlights,
            StatKind::Lists => self.lists,
            StatKind::Tags => self.tags,
        }
    }

    /// Returns all six readings in display order.
    pub fn readings(&self) -> [(StatKind, u64); 6] {
        StatKind::ALL.map(|kind| (kind, self.get(kind)))
    }
}

// ============================================================================
// Stat Kind
// ============================================================================

/// A named numeric reading exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// Bookmark count.
    Bookmarks,
    /// Favorite count.
    Favorites,
    /// Archived count.
    Archived,
    /// Highlight count.
    Highlights,
    /// List count.
    Lists,
    /// Tag count.
    Tags,
}

impl StatKind {
    /// All readings in display order.
    pub const ALL: [StatKind; 6] = [
        StatKind::Bookmarks,
        StatKind::Favorites,
        StatKind::Archived,
        StatKind::Highlights,
        StatKind::Lists,
        StatKind::Tags,
    ];

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bookmarks => "Bookmarks",
            Self::Favorites => "Favorites",
            Self::Archived => "Archived",
            Self::Highlights => "Highlights",
            Self::Lists => "Lists",
            Self::Tags => "Tags",
        }
    }

    /// Material Design icon for hosts that render one.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Bookmarks => "mdi:bookmark",
            Self::Favorites => "mdi:star",
            Self::Archived => "mdi:archive",
            Self::Highlights => "mdi:marker",
            Self::Lists => "mdi:format-list-bulleted",
            Self::Tags => "mdi:tag",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
