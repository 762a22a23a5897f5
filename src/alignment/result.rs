use std::collections::BTreeMap;

use chrono::Duration;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::alignment::state::{AlignmentSession, WarningFlags};

pub const GENERAL_WARNING_KEY: &str = "general warning";
pub const SHIFT_WARNING_KEY: &str = "shift warning";
pub const DATA_MISSING_KEY: &str = "data missing warning";

const GENERAL_WARNING_MESSAGE: &str =
    "Aligner was generally concerned with the quality of the alignment";
const SHIFT_WARNING_MESSAGE: &str =
    "Suspected data shift, alignments do not match across recording";
const DATA_MISSING_MESSAGE: &str = "Enough data was missing that this alignment is uncertain";

/// Final answer handed back to the caller once the operator is done.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    offsets: Vec<(String, Duration)>,
    scales: Vec<(String, f64)>,
    warnings: BTreeMap<String, String>,
    comment: String,
}

impl AlignmentResult {
    pub fn from_session(session: &AlignmentSession) -> Self {
        let offsets = session
            .committed_entries()
            .map(|(name, alignment)| (name.to_string(), seconds_to_duration(alignment.offset_seconds)))
            .collect();
        let scales = session
            .committed_entries()
            .map(|(name, alignment)| (name.to_string(), alignment.scale))
            .collect();

        Self {
            offsets,
            scales,
            warnings: warning_messages(session.flags()),
            comment: session.comment().to_string(),
        }
    }

    /// Offsets in queue order.
    pub fn offsets(&self) -> &[(String, Duration)] {
        &self.offsets
    }

    pub fn offset(&self, name: &str) -> Option<Duration> {
        self.offsets
            .iter()
            .find(|(queued, _)| queued == name)
            .map(|(_, offset)| *offset)
    }

    /// Committed amplitude scales. Not part of the serialized result.
    pub fn scales(&self) -> &[(String, f64)] {
        &self.scales
    }

    pub fn warnings(&self) -> &BTreeMap<String, String> {
        &self.warnings
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// `{ <name>: <offset seconds>, ..., "warnings": {...}, "comment": "..." }`
impl Serialize for AlignmentResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.offsets.len() + 2))?;
        for (name, offset) in &self.offsets {
            map.serialize_entry(name, &duration_to_seconds(*offset))?;
        }
        map.serialize_entry("warnings", &self.warnings)?;
        map.serialize_entry("comment", &self.comment)?;
        map.end()
    }
}

pub fn warning_messages(flags: WarningFlags) -> BTreeMap<String, String> {
    let mut warnings = BTreeMap::new();
    if flags.general_warning {
        warnings.insert(GENERAL_WARNING_KEY.to_string(), GENERAL_WARNING_MESSAGE.to_string());
    }
    if flags.shift_warning {
        warnings.insert(SHIFT_WARNING_KEY.to_string(), SHIFT_WARNING_MESSAGE.to_string());
    }
    if flags.data_missing {
        warnings.insert(DATA_MISSING_KEY.to_string(), DATA_MISSING_MESSAGE.to_string());
    }
    warnings
}

pub fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::nanoseconds((seconds * 1e9).round() as i64)
}

pub fn duration_to_seconds(duration: Duration) -> f64 {
    match duration.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => duration.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::state::Alignment;
    use crate::series::TimeSeries;

    fn session() -> AlignmentSession {
        let series = TimeSeries::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        AlignmentSession::new(
            series.clone(),
            vec![("rcs_left".into(), series.clone()), ("rcs_right".into(), series)],
        )
        .unwrap()
    }

    #[test]
    fn negative_offsets_survive_conversion() {
        let duration = seconds_to_duration(-1.2345);
        assert!(duration < Duration::zero());
        assert!((duration_to_seconds(duration) + 1.2345).abs() < 1e-9);
    }

    #[test]
    fn only_raised_flags_become_warnings() {
        let mut session = session();
        assert!(AlignmentResult::from_session(&session).warnings().is_empty());

        session.toggle_data_missing();
        let result = AlignmentResult::from_session(&session);
        assert_eq!(result.warnings().len(), 1);
        assert_eq!(
            result.warnings().get(DATA_MISSING_KEY).map(String::as_str),
            Some(DATA_MISSING_MESSAGE)
        );
    }

    #[test]
    fn serializes_flat_offsets_then_warnings_and_comment() {
        let mut session = session();
        session.commit(
            0,
            Alignment {
                offset_seconds: 2.5,
                scale: 1.21,
            },
        );
        session.toggle_general_warning();
        session.set_comment("ok");

        let result = AlignmentResult::from_session(&session);
        assert_eq!(result.scales()[0], ("rcs_left".to_string(), 1.21));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rcs_left"], serde_json::json!(2.5));
        assert_eq!(json["rcs_right"], serde_json::json!(0.0));
        assert_eq!(json["comment"], serde_json::json!("ok"));
        assert_eq!(
            json["warnings"][GENERAL_WARNING_KEY],
            serde_json::json!(GENERAL_WARNING_MESSAGE)
        );
        assert!(json.get("scales").is_none());
    }
}
