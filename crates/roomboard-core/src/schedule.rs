use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One timetabled lesson. Owned by the store; the engine only ever
/// borrows these for the currently displayed date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub subject: String,
    pub teacher: String,
    pub groups: String,
    /// Kind label shown on the colored banner.
    #[serde(rename = "type")]
    pub kind: String,
    /// Hex color string, passed through to the renderer untouched.
    pub color: String,
}

impl Lesson {
    pub fn start_minutes(&self) -> u32 {
        self.start.hour() * 60 + self.start.minute()
    }

    pub fn end_minutes(&self) -> u32 {
        self.end.hour() * 60 + self.end.minute()
    }
}

/// Minute-of-day serialization as "HH:MM".
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
    }
}

/// The adapter boundary to lesson storage.
///
/// `lesson_at` returning `None` for an index below `lesson_count_for`
/// is a contract violation; callers must abort the operation in
/// progress and keep their prior state.
pub trait LessonSource {
    fn lesson_count_for(&self, date: NaiveDate) -> usize;
    fn lesson_at(&self, date: NaiveDate, index: usize) -> Option<&Lesson>;
}

/// In-memory schedule for one room, populated once at startup and
/// read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Dates serialize as "YYYY-MM-DD" keys.
    #[serde(default)]
    pub days: BTreeMap<NaiveDate, Vec<Lesson>>,
}

impl Schedule {
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading schedule from {}", path.display()))?;
        let schedule: Schedule =
            serde_json::from_str(&contents).with_context(|| "parsing schedule JSON")?;
        schedule.validate()?;
        Ok(schedule)
    }

    fn validate(&self) -> Result<()> {
        for (date, lessons) in &self.days {
            for lesson in lessons {
                if lesson.start >= lesson.end {
                    bail!(
                        "{}: lesson '{}' has start {} not before end {}",
                        date,
                        lesson.subject,
                        lesson.start.format("%H:%M"),
                        lesson.end.format("%H:%M"),
                    );
                }
            }
        }
        Ok(())
    }
}

impl LessonSource for Schedule {
    fn lesson_count_for(&self, date: NaiveDate) -> usize {
        self.days.get(&date).map_or(0, Vec::len)
    }

    fn lesson_at(&self, date: NaiveDate, index: usize) -> Option<&Lesson> {
        self.days.get(&date)?.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn lesson(start: &str, end: &str) -> Lesson {
        Lesson {
            start: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            subject: "Физика".into(),
            teacher: "Петров П.П.".into(),
            groups: "ИС-21, ИС-22".into(),
            kind: "Лекция".into(),
            color: "#2196F3".into(),
        }
    }

    #[test]
    fn minutes_accessors() {
        let l = lesson("09:00", "10:30");
        assert_eq!(l.start_minutes(), 540);
        assert_eq!(l.end_minutes(), 630);
    }

    #[test]
    fn empty_date_has_zero_lessons() {
        let schedule = Schedule::default();
        assert_eq!(schedule.lesson_count_for(d(2024, 3, 15)), 0);
        assert!(schedule.lesson_at(d(2024, 3, 15), 0).is_none());
    }

    #[test]
    fn lessons_are_indexed_in_stored_order() {
        let mut schedule = Schedule::default();
        schedule
            .days
            .insert(d(2024, 3, 15), vec![lesson("09:00", "10:30"), lesson("10:40", "12:10")]);
        assert_eq!(schedule.lesson_count_for(d(2024, 3, 15)), 2);
        assert_eq!(
            schedule.lesson_at(d(2024, 3, 15), 1).unwrap().start_minutes(),
            640
        );
        assert!(schedule.lesson_at(d(2024, 3, 15), 2).is_none());
    }

    #[test]
    fn schedule_json_parses_hhmm_times() {
        let json = r##"{
            "days": {
                "2024-03-15": [
                    {
                        "start": "09:00",
                        "end": "10:30",
                        "subject": "Математический анализ",
                        "teacher": "Иванов И.И.",
                        "groups": "ИС-21",
                        "type": "Лекция",
                        "color": "#9C27B0"
                    }
                ]
            }
        }"##;
        let schedule: Schedule = serde_json::from_str(json).unwrap();
        let l = schedule.lesson_at(d(2024, 3, 15), 0).unwrap();
        assert_eq!(l.start_minutes(), 540);
        assert_eq!(l.kind, "Лекция");
    }

    #[test]
    fn validate_rejects_inverted_spans() {
        let mut schedule = Schedule::default();
        let mut bad = lesson("10:30", "10:31");
        bad.end = bad.start;
        schedule.days.insert(d(2024, 3, 15), vec![bad]);
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_days() {
        let mut schedule = Schedule::default();
        schedule.days.insert(d(2024, 3, 15), vec![lesson("09:00", "10:30")]);
        assert!(schedule.validate().is_ok());
    }
}
