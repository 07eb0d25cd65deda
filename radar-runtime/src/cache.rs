//! Score cache - the last successfully computed result
//!
//! One [`CacheWriter`] (owned by the orchestrator) and any number of
//! [`CacheReader`]s. A publish builds the complete entry first and swaps a
//! single `Arc`, so readers see either the previous entry or the new one,
//! never a mix. Entries are never mutated after publish.

use std::sync::Arc;

use parking_lot::RwLock;

use radar_core::{CompositeScore, Event, QuakeList};

/// A published cycle result
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Cycle number that produced this entry
    pub cycle: u64,
    pub score: CompositeScore,
    /// Merged events, newest first, already capped
    pub quakes: Vec<Event>,
}

impl CacheEntry {
    pub fn quake_list(&self) -> QuakeList {
        QuakeList::from_events(&self.quakes)
    }
}

type Slot = Arc<RwLock<Option<Arc<CacheEntry>>>>;

/// Create an empty cache
pub fn score_cache() -> (CacheWriter, CacheReader) {
    let slot: Slot = Arc::new(RwLock::new(None));
    (
        CacheWriter { slot: slot.clone() },
        CacheReader { slot },
    )
}

/// Exclusive write handle
#[derive(Debug)]
pub struct CacheWriter {
    slot: Slot,
}

impl CacheWriter {
    /// Replace the current entry
    pub fn publish(&mut self, entry: CacheEntry) {
        let entry = Arc::new(entry);
        // Only the pointer swap happens under the lock
        let previous = self.slot.write().replace(entry);
        drop(previous);
    }

    pub fn reader(&self) -> CacheReader {
        CacheReader {
            slot: self.slot.clone(),
        }
    }
}

/// Shared read handle
#[derive(Debug, Clone)]
pub struct CacheReader {
    slot: Slot,
}

impl CacheReader {
    /// Latest entry, or `None` while warming up
    pub fn read(&self) -> Option<Arc<CacheEntry>> {
        self.slot.read().clone()
    }

    pub fn is_warm(&self) -> bool {
        self.slot.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::{
        ComponentInputs, CrowdIndicator, EventSource, IonosphereIndicator, SeismicIndicator,
        TimeIndicator,
    };

    fn entry(cycle: u64, total_hint: f64) -> CacheEntry {
        let score = CompositeScore::compute(ComponentInputs {
            seismic: SeismicIndicator {
                normalized: total_hint,
                events48h: 1,
                baseline: 12.5,
                etas_prob: total_hint,
                max_mag: 2.0,
            },
            ionosphere: IonosphereIndicator {
                normalized: 0.0,
                tec: "--".to_string(),
                tec_anomaly: "--".to_string(),
                pressure: "1012.0 hPa".to_string(),
                pressure_anomaly: "Normal".to_string(),
            },
            time: TimeIndicator {
                normalized: 0.0,
                last_major_date: "11-07-1927".to_string(),
                cycle_percent: 0.0,
            },
            crowd: CrowdIndicator {
                normalized: 0.0,
                felt24h: 0,
                felt1h: 0,
                avg: 12,
            },
        })
        .unwrap();

        CacheEntry {
            cycle,
            score,
            quakes: vec![Event::builder(EventSource::Gsi, cycle as i64).build()],
        }
    }

    #[test]
    fn test_cold_cache_is_empty() {
        let (_writer, reader) = score_cache();
        assert!(reader.read().is_none());
        assert!(!reader.is_warm());
    }

    #[test]
    fn test_publish_replaces_entry() {
        let (mut writer, reader) = score_cache();

        writer.publish(entry(1, 10.0));
        let first = reader.read().unwrap();
        assert_eq!(first.cycle, 1);

        writer.publish(entry(2, 50.0));
        let second = reader.read().unwrap();
        assert_eq!(second.cycle, 2);
        assert_eq!(second.quakes[0].time, 2);

        // A reader holding the old entry keeps an intact snapshot
        assert_eq!(first.cycle, 1);
        assert_eq!(first.quakes[0].time, 1);
    }

    #[test]
    fn test_readers_share_slot() {
        let (mut writer, reader) = score_cache();
        let other = writer.reader();
        let cloned = reader.clone();

        writer.publish(entry(7, 0.0));
        assert_eq!(other.read().unwrap().cycle, 7);
        assert_eq!(cloned.read().unwrap().cycle, 7);
    }

    #[test]
    fn test_quake_list() {
        let list = entry(3, 0.0).quake_list();
        assert_eq!(list.count, 1);
        assert_eq!(list.features[0].properties.time, 3);
    }
}
