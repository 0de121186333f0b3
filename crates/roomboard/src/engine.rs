use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use roomboard_core::calendar::{
    self, classify, date_label, shift_month, weekday_name, AcademicWindow, DateClass,
};
use roomboard_core::ipc::{LessonView, RenderMsg};
use roomboard_core::schedule::LessonSource;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::progress::lesson_progress;

/// Cached view of one displayed lesson slot. Holding the time span
/// here lets the periodic refresh run without touching the store.
#[derive(Debug, Clone)]
struct Slot {
    start_min: u32,
    end_min: u32,
    progress: u8,
}

#[derive(Debug, Clone)]
struct Displayed {
    date: NaiveDate,
    slots: Vec<Slot>,
}

#[derive(Debug)]
struct Popup {
    expires: Instant,
}

/// Snapshot for status queries.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub displayed_date: Option<NaiveDate>,
    pub lesson_count: usize,
    /// Foreground mode: "schedule", "calendar" or "popup".
    pub mode: &'static str,
}

/// The temporal state engine: owns the displayed date, the lesson-slot
/// cache, overlay visibility and the popup lifecycle. Every operation
/// takes `now` from the caller and returns the render instructions it
/// wants applied; the engine never touches a renderer itself.
pub struct Engine<S> {
    store: S,
    window: AcademicWindow,
    displayed: Option<Displayed>,
    overlay_open: bool,
    /// First day of the month the calendar overlay shows.
    shown_month: NaiveDate,
    popup: Option<Popup>,
    popup_duration: Duration,
}

impl<S: LessonSource> Engine<S> {
    pub fn new(store: S, today: NaiveDate, popup_duration: Duration) -> Self {
        Self {
            store,
            window: AcademicWindow::containing(today),
            displayed: None,
            overlay_open: false,
            shown_month: shift_month(today, 0),
            popup: None,
            popup_duration,
        }
    }

    pub fn window(&self) -> AcademicWindow {
        self.window
    }

    /// Show the schedule for `date`. Selecting the already-displayed
    /// date is a no-op, which makes repeated taps and repeated
    /// inactivity checks harmless.
    pub fn request_display(&mut self, date: NaiveDate, now: NaiveDateTime) -> Vec<RenderMsg> {
        if self.displayed.as_ref().is_some_and(|d| d.date == date) {
            debug!(%date, "already displayed, nothing to do");
            return Vec::new();
        }

        let today = now.date();
        let count = self.store.lesson_count_for(date);

        if count == 0 {
            if date == today {
                // An empty "today" is a valid display state.
                self.displayed = Some(Displayed { date, slots: Vec::new() });
                let mut out = vec![RenderMsg::ShowEmptySchedule {
                    date_label: calendar::NO_LESSONS_TODAY.into(),
                }];
                out.extend(self.dismiss_overlay(today));
                return out;
            }
            // Keep whatever was on screen and notify instead.
            debug!(%date, "no lessons on selected date");
            return self.arm_popup(calendar::NO_LESSONS_ON_DATE);
        }

        let mut lessons = Vec::with_capacity(count);
        for index in 0..count {
            match self.store.lesson_at(date, index) {
                Some(lesson) => lessons.push(lesson.clone()),
                None => {
                    error!(%date, index, count, "lesson store broke its contract, aborting rebuild");
                    return Vec::new();
                }
            }
        }

        let class = classify(date, today);
        let now_min = minute_of_day(now);
        let mut slots = Vec::with_capacity(count);
        let mut views = Vec::with_capacity(count);
        for lesson in &lessons {
            let (start_min, end_min) = (lesson.start_minutes(), lesson.end_minutes());
            let progress = lesson_progress(start_min, end_min, class, now_min);
            slots.push(Slot { start_min, end_min, progress });
            views.push(LessonView {
                start: lesson.start.format("%H:%M").to_string(),
                end: lesson.end.format("%H:%M").to_string(),
                kind: lesson.kind.clone(),
                subject: lesson.subject.clone(),
                teacher: lesson.teacher.clone(),
                groups: lesson.groups.clone(),
                color: lesson.color.clone(),
                progress,
            });
        }

        self.displayed = Some(Displayed { date, slots });
        let mut out = vec![RenderMsg::ShowSchedule {
            date_label: date_label(date),
            weekday: weekday_name(date).into(),
            lessons: views,
        }];
        out.extend(self.dismiss_overlay(today));
        out
    }

    /// Recompute progress for every displayed slot. Only meaningful
    /// while today's schedule is on screen; otherwise a no-op.
    pub fn refresh_progress(&mut self, now: NaiveDateTime) -> Vec<RenderMsg> {
        let now_min = minute_of_day(now);
        let today = now.date();
        let Some(displayed) = self.displayed.as_mut() else {
            return Vec::new();
        };
        if displayed.date != today || displayed.slots.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(displayed.slots.len());
        for (index, slot) in displayed.slots.iter_mut().enumerate() {
            let progress =
                lesson_progress(slot.start_min, slot.end_min, DateClass::Today, now_min);
            slot.progress = progress;
            out.push(RenderMsg::UpdateProgress { index, progress });
        }
        out
    }

    /// Reveal the calendar overlay at the current shown month. The
    /// displayed date is untouched.
    pub fn open_calendar(&mut self) -> Vec<RenderMsg> {
        self.overlay_open = true;
        vec![RenderMsg::OpenCalendarOverlay {
            year: self.shown_month.year(),
            month: self.shown_month.month(),
            highlighted: self
                .displayed
                .as_ref()
                .map(|d| d.date.format("%Y-%m-%d").to_string()),
            left_enabled: self.window.allows_prev(self.shown_month),
            right_enabled: self.window.allows_next(self.shown_month),
        }]
    }

    /// Hide the overlay and re-center its month on the displayed date
    /// (today if nothing is committed yet).
    pub fn close_calendar(&mut self, now: NaiveDateTime) -> Vec<RenderMsg> {
        self.dismiss_overlay(now.date())
    }

    /// Move the overlay's shown month by `delta` months, refusing to
    /// leave the academic window. Arrow state is re-emitted either way.
    pub fn navigate_month(&mut self, delta: i32) -> Vec<RenderMsg> {
        let target = shift_month(self.shown_month, delta);
        if target >= shift_month(self.window.start, 0) && target <= self.window.end {
            self.shown_month = target;
        } else {
            debug!(%target, "navigation blocked at academic window boundary");
        }
        vec![self.arrow_state()]
    }

    /// Earliest instant at which `check_timer` needs to run, or `None`
    /// when no popup is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.popup.as_ref().map(|p| p.expires)
    }

    /// Auto-dismiss the popup once its deadline has passed.
    pub fn check_timer(&mut self) -> Vec<RenderMsg> {
        match &self.popup {
            Some(popup) if Instant::now() >= popup.expires => {
                debug!("popup expired");
                self.popup = None;
                vec![RenderMsg::DismissPopup]
            }
            _ => Vec::new(),
        }
    }

    /// Rebuild instructions for the current display state, for a
    /// renderer that just connected. State is not mutated.
    pub fn snapshot(&self) -> Vec<RenderMsg> {
        let Some(displayed) = self.displayed.as_ref() else {
            return Vec::new();
        };
        if displayed.slots.is_empty() {
            return vec![RenderMsg::ShowEmptySchedule {
                date_label: calendar::NO_LESSONS_TODAY.into(),
            }];
        }
        let mut views = Vec::with_capacity(displayed.slots.len());
        for (index, slot) in displayed.slots.iter().enumerate() {
            let Some(lesson) = self.store.lesson_at(displayed.date, index) else {
                error!(date = %displayed.date, index, "lesson store broke its contract, sending no snapshot");
                return Vec::new();
            };
            views.push(LessonView {
                start: lesson.start.format("%H:%M").to_string(),
                end: lesson.end.format("%H:%M").to_string(),
                kind: lesson.kind.clone(),
                subject: lesson.subject.clone(),
                teacher: lesson.teacher.clone(),
                groups: lesson.groups.clone(),
                color: lesson.color.clone(),
                progress: slot.progress,
            });
        }
        vec![RenderMsg::ShowSchedule {
            date_label: date_label(displayed.date),
            weekday: weekday_name(displayed.date).into(),
            lessons: views,
        }]
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            displayed_date: self.displayed.as_ref().map(|d| d.date),
            lesson_count: self.displayed.as_ref().map_or(0, |d| d.slots.len()),
            mode: if self.popup.is_some() {
                "popup"
            } else if self.overlay_open {
                "calendar"
            } else {
                "schedule"
            },
        }
    }

    /// Replace any pending popup; the old deadline can never fire.
    fn arm_popup(&mut self, message: &str) -> Vec<RenderMsg> {
        self.popup = Some(Popup { expires: Instant::now() + self.popup_duration });
        vec![RenderMsg::ShowPopup { message: message.into() }]
    }

    /// Committing a date change always hides the overlay and re-centers
    /// it, even when it was not visible (hiding is idempotent).
    fn dismiss_overlay(&mut self, today: NaiveDate) -> Vec<RenderMsg> {
        self.overlay_open = false;
        let anchor = self.displayed.as_ref().map_or(today, |d| d.date);
        self.shown_month = shift_month(anchor, 0);
        vec![RenderMsg::CloseCalendarOverlay, self.arrow_state()]
    }

    fn arrow_state(&self) -> RenderMsg {
        RenderMsg::UpdateCalendarArrows {
            left_enabled: self.window.allows_prev(self.shown_month),
            right_enabled: self.window.allows_next(self.shown_month),
        }
    }
}

fn minute_of_day(now: NaiveDateTime) -> u32 {
    now.hour() * 60 + now.minute()
}
