//! Date alignment of independently fetched series.
//!
//! The primary series defines the timeline. Auxiliary series only fill in
//! fields on dates the primary already has; their extra dates are dropped.
//! Missing values stay `None` (no forward-fill, no interpolation).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::schema::SourceSeries;
use crate::domain::{CrossEvent, CrossKind, CrossPair, Dated, TimePoint};

/// Crossover marker attached to the record of the day it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossMarker {
    pub kind: CrossKind,
    pub pair: CrossPair,
}

/// One row of the merged timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub date: NaiveDate,
    /// Union of every declared field of every source, `None` where missing.
    pub fields: BTreeMap<String, Option<f64>>,
    pub cross: Option<CrossMarker>,
}

impl AlignedRecord {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().flatten()
    }
}

impl Dated for AlignedRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Merge a primary series with any number of auxiliary series.
///
/// Output is ascending by date with one record per distinct primary date.
/// If the primary repeats a date, its first point wins; likewise an auxiliary
/// point only counts the first time its date appears in that source.
pub fn align_series(primary: &SourceSeries, auxiliaries: &[SourceSeries]) -> Vec<AlignedRecord> {
    if primary.is_empty() {
        return Vec::new();
    }

    // Every record starts with every declared field set to None.
    let mut template: BTreeMap<String, Option<f64>> = BTreeMap::new();
    for name in primary
        .schema
        .field_names()
        .chain(auxiliaries.iter().flat_map(|a| a.schema.field_names()))
    {
        template.insert(name.to_string(), None);
    }

    let mut timeline: BTreeMap<NaiveDate, AlignedRecord> = BTreeMap::new();
    for point in &primary.points {
        timeline.entry(point.date).or_insert_with(|| {
            let mut fields = template.clone();
            fill_missing(&mut fields, point);
            AlignedRecord {
                date: point.date,
                fields,
                cross: None,
            }
        });
    }

    for aux in auxiliaries {
        let lookup = first_by_date(&aux.points);
        let mut matched = 0usize;
        for (date, record) in timeline.iter_mut() {
            if let Some(point) = lookup.get(date) {
                fill_missing(&mut record.fields, point);
                matched += 1;
            }
        }
        log::debug!(
            "{}: matched {matched} of {} points onto {} primary dates",
            aux.label(),
            aux.len(),
            timeline.len()
        );
    }

    timeline.into_values().collect()
}

/// Date → point, keeping the first point seen for each date.
fn first_by_date(points: &[TimePoint]) -> HashMap<NaiveDate, &TimePoint> {
    let mut map = HashMap::with_capacity(points.len());
    for point in points {
        map.entry(point.date).or_insert(point);
    }
    map
}

/// Copy values from `point`, never overwriting a value already present.
fn fill_missing(fields: &mut BTreeMap<String, Option<f64>>, point: &TimePoint) {
    for (name, value) in &point.fields {
        let slot = fields.entry(name.clone()).or_insert(None);
        if slot.is_none() {
            *slot = *value;
        }
    }
}

/// Mark the records on which a moving-average crossover happened.
///
/// When both pairs cross on the same day the MA20/MA60 marker is kept.
/// Events on dates outside the timeline are ignored.
pub fn attach_cross_markers(records: &mut [AlignedRecord], events: &[CrossEvent]) {
    if records.is_empty() || events.is_empty() {
        return;
    }
    let index: HashMap<NaiveDate, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.date, i))
        .collect();

    for event in events {
        let Some(&i) = index.get(&event.date) else {
            continue;
        };
        let marker = CrossMarker {
            kind: event.kind,
            pair: event.pair,
        };
        let record = &mut records[i];
        let shadowed = marker.pair == CrossPair::Ma50Ma200
            && matches!(record.cross, Some(m) if m.pair == CrossPair::Ma20Ma60);
        if !shadowed {
            record.cross = Some(marker);
        }
    }
}
