//! Medication timing heuristic.
//!
//! Symptom log times are binned into a 24-slot hour-of-day histogram per
//! symptom kind. For each active medication the kinds below are scanned in
//! order; the first one with a clear peak (a maximal bin holding more than one
//! entry) yields a suggestion to take the dose one hour earlier.

use chrono::{FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::model::{Medication, Symptom, SymptomKind};

pub const TIMING_SYMPTOMS: [SymptomKind; 4] = [
    SymptomKind::Stiffness,
    SymptomKind::Pain,
    SymptomKind::Tremor,
    SymptomKind::Fatigue,
];

pub type HourHistogram = [u32; 24];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSuggestion {
    pub medication_id: String,
    pub medication_name: String,
    pub symptom: SymptomKind,
    pub peak_hour: u32,
    pub suggested_hour: u32,
    pub occurrences: u32,
}

/// Hour-of-day counts for one symptom kind, in the given offset.
pub fn hourly_histogram(symptoms: &[Symptom], kind: SymptomKind, offset: FixedOffset) -> HourHistogram {
    let mut bins = [0u32; 24];
    for s in symptoms.iter().filter(|s| s.kind() == Some(kind)) {
        let hour = s.logged_at.with_timezone(&offset).hour() as usize;
        bins[hour] += 1;
    }
    bins
}

/// Earliest hour holding the maximum count, if that count is above one.
pub fn peak_hour(bins: &HourHistogram) -> Option<u32> {
    let max = bins.iter().copied().max().unwrap_or(0);
    if max <= 1 {
        return None;
    }
    bins.iter().position(|&c| c == max).map(|h| h as u32)
}

pub fn suggest(
    medications: &[Medication],
    symptoms: &[Symptom],
    offset: FixedOffset,
) -> Vec<TimingSuggestion> {
    let peaks: Vec<(SymptomKind, Option<(u32, u32)>)> = TIMING_SYMPTOMS
        .iter()
        .map(|&kind| {
            let bins = hourly_histogram(symptoms, kind, offset);
            (kind, peak_hour(&bins).map(|h| (h, bins[h as usize])))
        })
        .collect();

    let Some((symptom, (peak, occurrences))) = peaks
        .iter()
        .find_map(|&(kind, peak)| peak.map(|p| (kind, p)))
    else {
        return Vec::new();
    };

    medications
        .iter()
        .filter(|m| m.active)
        .map(|m| TimingSuggestion {
            medication_id: m.id.clone(),
            medication_name: m.name.clone(),
            symptom,
            peak_hour: peak,
            suggested_hour: (peak + 23) % 24,
            occurrences,
        })
        .collect()
}
