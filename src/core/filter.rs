//! Composable boolean filters over log entries
//!
//! A [`Filter`] is an immutable predicate tree. Leaves compare an entry's
//! [`EventType`] against masks; combinators own their children and may nest
//! to any depth.
//!
//! # Example
//!
//! ```
//! use log_dispatch::{EventType, Filter, LogEntry};
//!
//! let failures = Filter::any_mask([EventType::ERROR, EventType::CRITICAL]);
//! let lifecycle = Filter::mask(EventType::START).or(Filter::mask(EventType::STOP));
//! let filter = failures.and(lifecycle);
//!
//! let entry = LogEntry::new(EventType::ERROR | EventType::STOP, "worker aborted");
//! assert!(filter.matches(&entry));
//!
//! let entry = LogEntry::new(EventType::ERROR, "unrelated failure");
//! assert!(!filter.matches(&entry));
//! ```

use super::event_type::EventType;
use super::log_entry::LogEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "args", rename_all = "snake_case")]
pub enum Filter {
    /// Accepts every entry
    #[default]
    AlwaysPass,
    /// Rejects every entry
    AlwaysBlock,
    /// Accepts entries carrying every bit of the mask
    SingleMask(EventType),
    /// Accepts entries satisfying every mask; vacuously true when empty
    AllMasks(Vec<EventType>),
    /// Accepts entries satisfying at least one mask; false when empty
    AnyMask(Vec<EventType>),
    /// Accepts entries every child accepts; vacuously true when empty
    CombinedAnd(Vec<Filter>),
    /// Accepts entries at least one child accepts; false when empty
    CombinedOr(Vec<Filter>),
}

/// Mask rule shared by every mask-based filter: all bits of `mask` present
#[inline]
fn mask_matches(event_type: EventType, mask: EventType) -> bool {
    event_type & mask == mask
}

impl Filter {
    pub fn mask(mask: EventType) -> Self {
        Filter::SingleMask(mask)
    }

    pub fn all_masks(masks: impl IntoIterator<Item = EventType>) -> Self {
        Filter::AllMasks(masks.into_iter().collect())
    }

    pub fn any_mask(masks: impl IntoIterator<Item = EventType>) -> Self {
        Filter::AnyMask(masks.into_iter().collect())
    }

    pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::CombinedAnd(filters.into_iter().collect())
    }

    pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::CombinedOr(filters.into_iter().collect())
    }

    /// Evaluate the filter against an entry
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.matches_event_type(entry.event_type())
    }

    /// Evaluate the filter against a bare event type
    pub fn matches_event_type(&self, event_type: EventType) -> bool {
        match self {
            Filter::AlwaysPass => true,
            Filter::AlwaysBlock => false,
            Filter::SingleMask(mask) => mask_matches(event_type, *mask),
            Filter::AllMasks(masks) => masks.iter().all(|m| mask_matches(event_type, *m)),
            Filter::AnyMask(masks) => masks.iter().any(|m| mask_matches(event_type, *m)),
            Filter::CombinedAnd(children) => {
                children.iter().all(|f| f.matches_event_type(event_type))
            }
            Filter::CombinedOr(children) => {
                children.iter().any(|f| f.matches_event_type(event_type))
            }
        }
    }

    /// Wrap `self` and `other` in a two-element [`Filter::CombinedAnd`]
    ///
    /// Chaining does not flatten: `a.and(b).and(c)` is `And[And[a, b], c]`.
    #[must_use]
    pub fn and(self, other: Filter) -> Filter {
        Filter::CombinedAnd(vec![self, other])
    }

    /// Wrap `self` and `other` in a two-element [`Filter::CombinedOr`]
    #[must_use]
    pub fn or(self, other: Filter) -> Filter {
        Filter::CombinedOr(vec![self, other])
    }

    /// Child filters of a combinator; empty for leaves
    pub fn children(&self) -> &[Filter] {
        match self {
            Filter::CombinedAnd(children) | Filter::CombinedOr(children) => children,
            _ => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Filter::CombinedAnd(_) | Filter::CombinedOr(_))
    }

    /// Height of the tree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Filter::depth).max().unwrap_or(0)
    }

    /// Visit every node, parents before children
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Filter, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, level: usize, visit: &mut impl FnMut(&'a Filter, usize)) {
        visit(self, level);
        for child in self.children() {
            child.walk_at(level + 1, visit);
        }
    }
}

fn write_masks(f: &mut fmt::Formatter<'_>, name: &str, masks: &[EventType]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (idx, mask) in masks.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", mask)?;
    }
    f.write_str(")")
}

fn write_children(f: &mut fmt::Formatter<'_>, op: &str, children: &[Filter]) -> fmt::Result {
    if children.is_empty() {
        return write!(f, "{}()", op);
    }
    f.write_str("(")?;
    for (idx, child) in children.iter().enumerate() {
        if idx > 0 {
            write!(f, " {} ", op)?;
        }
        write!(f, "{}", child)?;
    }
    f.write_str(")")
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::AlwaysPass => f.write_str("pass"),
            Filter::AlwaysBlock => f.write_str("block"),
            Filter::SingleMask(mask) => write!(f, "mask({})", mask),
            Filter::AllMasks(masks) => write_masks(f, "all", masks),
            Filter::AnyMask(masks) => write_masks(f, "any", masks),
            Filter::CombinedAnd(children) => write_children(f, "AND", children),
            Filter::CombinedOr(children) => write_children(f, "OR", children),
        }
    }
}
