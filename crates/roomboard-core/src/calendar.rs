use chrono::{Datelike, NaiveDate};

/// Where a date stands relative to "today", ignoring time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateClass {
    Past,
    Today,
    Future,
}

pub fn classify(date: NaiveDate, today: NaiveDate) -> DateClass {
    match date.cmp(&today) {
        std::cmp::Ordering::Less => DateClass::Past,
        std::cmp::Ordering::Equal => DateClass::Today,
        std::cmp::Ordering::Greater => DateClass::Future,
    }
}

/// First day of the month `delta` months away from `date`'s month.
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let months = date.year() * 12 + date.month0() as i32 + delta;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    // Day 1 exists in every month, so this cannot fail.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// The Sep 1 – Jul 31 span bounding calendar navigation.
///
/// Computed once from "today" at engine startup and immutable for the
/// process lifetime; a mid-session academic-year rollover is not handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademicWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AcademicWindow {
    pub fn containing(today: NaiveDate) -> Self {
        // January through August belong to the year that started the
        // previous September.
        let start_year = if today.month() <= 8 {
            today.year() - 1
        } else {
            today.year()
        };
        let start = NaiveDate::from_ymd_opt(start_year, 9, 1).unwrap_or(today);
        let end = NaiveDate::from_ymd_opt(start_year + 1, 7, 31).unwrap_or(today);
        Self { start, end }
    }

    /// Inclusive bounds check.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the calendar may navigate one month back from `shown_month`.
    pub fn allows_prev(&self, shown_month: NaiveDate) -> bool {
        shift_month(shown_month, -1) >= shift_month(self.start, 0)
    }

    /// Whether the calendar may navigate one month forward from `shown_month`.
    pub fn allows_next(&self, shown_month: NaiveDate) -> bool {
        shift_month(shown_month, 1) <= self.end
    }
}

const WEEKDAYS: [&str; 7] = [
    "Воскресенье",
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
];

const MONTHS: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

pub const NO_LESSONS_TODAY: &str = "На сегодня занятий нет";
pub const NO_LESSONS_ON_DATE: &str = "Нет занятий на выбранную дату";

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_sunday() as usize]
}

/// "15 марта 2024"
pub fn date_label(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}
