use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::{EngagementError, Result};
use crate::models::{ActorId, Event};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "actor.id")]
    actor_id: ActorId,
    #[serde(rename = "verb.id")]
    verb: String,
    #[serde(rename = "object.definition.type")]
    object_category: String,
    #[serde(rename = "result.score.scaled", default)]
    score_scaled: Option<f64>,
    #[serde(rename = "result.success", default, deserialize_with = "flag")]
    success: Option<bool>,
    timestamp: String,
    #[serde(rename = "Course")]
    course: String,
    #[serde(rename = "Institution")]
    institution: String,
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn read_events_from<R: Read>(reader: R) -> Result<Vec<Event>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut events = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let timestamp =
            parse_timestamp(&row.timestamp).ok_or_else(|| EngagementError::Timestamp {
                row: index as u64 + 1,
                value: row.timestamp.clone(),
            })?;

        events.push(Event {
            actor_id: row.actor_id,
            verb: row.verb,
            object_category: row.object_category,
            score_scaled: row.score_scaled,
            success: row.success,
            timestamp,
            course: row.course,
            institution: row.institution,
        });
    }

    Ok(events)
}

pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let file = std::fs::File::open(path).map_err(|source| EngagementError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let events = read_events_from(file)?;
    info!(path = %path.display(), events = events.len(), "loaded event log");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    const SAMPLE: &str = "\
actor.id,verb.id,object.definition.type,result.score.scaled,result.success,timestamp,Course,Institution,Teaching
1,scored,assessment,0.75,True,2023-03-01 09:00:00+00:00,Algebra,North,Flipped classroom
1,viewed,page,,,2023-03-01 09:05:00,Algebra,North,Flipped classroom
2,completed,quiz,0.4,false,2023-03-02T10:00:00Z,Biology,North,Lecture
";

    #[test]
    fn reads_processed_export() {
        let events = read_events_from(SAMPLE.as_bytes()).expect("sample parses");

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].score_scaled, Some(0.75));
        assert_eq!(events[0].success, Some(true));
        assert_eq!(events[1].score_scaled, None);
        assert_eq!(events[1].success, None);
        assert_eq!(
            events[1].timestamp,
            Utc.with_ymd_and_hms(2023, 3, 1, 9, 5, 0).unwrap()
        );
        assert_eq!(events[2].success, Some(false));
        assert_eq!(events[2].course, "Biology");
    }

    #[test]
    fn reports_bad_timestamp_row() {
        let data = "\
actor.id,verb.id,object.definition.type,result.score.scaled,result.success,timestamp,Course,Institution
1,scored,homework,0.5,True,yesterday,Algebra,North
";
        let err = read_events_from(data.as_bytes()).expect_err("timestamp is invalid");
        assert!(matches!(err, EngagementError::Timestamp { row: 1, .. }));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write sample");

        let events = read_events(file.path()).expect("file parses");
        assert_eq!(events.len(), 3);

        let missing = read_events(Path::new("/nonexistent/events.csv"));
        assert!(matches!(missing, Err(EngagementError::Io { .. })));
    }
}
