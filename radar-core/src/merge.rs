//! Event merger
//!
//! Combines event lists from several feeds into one list ordered newest
//! first. Two events are the same physical event iff their `time` values
//! are identical; the list supplied first wins. This is a deliberate
//! approximation: distinct events sharing a millisecond collapse into one,
//! and one event reported with slightly different times by two feeds is
//! kept twice.

use std::collections::HashSet;

use crate::{Event, MAX_MERGED_EVENTS};

/// Merge event lists, newest first, deduplicated on `time`, capped at
/// [`MAX_MERGED_EVENTS`].
pub fn merge_events<I>(lists: I) -> Vec<Event>
where
    I: IntoIterator<Item = Vec<Event>>,
{
    merge_events_capped(lists, MAX_MERGED_EVENTS)
}

/// Same as [`merge_events`] with an explicit cap
pub fn merge_events_capped<I>(lists: I, cap: usize) -> Vec<Event>
where
    I: IntoIterator<Item = Vec<Event>>,
{
    let mut combined: Vec<Event> = lists.into_iter().flatten().collect();

    // Stable: equal times keep input order, so the earlier list wins below
    combined.sort_by(|a, b| b.time.cmp(&a.time));

    let mut seen: HashSet<i64> = HashSet::new();
    let mut merged = Vec::with_capacity(combined.len().min(cap));

    for event in combined {
        if merged.len() >= cap {
            break;
        }
        if seen.insert(event.time) {
            merged.push(event);
        }
    }

    merged
}

/// Largest magnitude in a list, `None` when no event carries one
pub fn max_magnitude(events: &[Event]) -> Option<f64> {
    events
        .iter()
        .filter_map(|e| e.magnitude)
        .fold(None, |max, m| match max {
            Some(current) if current >= m => Some(current),
            _ => Some(m),
        })
}
