use serde::{Deserialize, Serialize};

/// One lesson row as the renderer should draw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonView {
    /// "09:00"
    pub start: String,
    /// "10:30"
    pub end: String,
    /// Lesson kind label ("Лекция", "Практика", ...).
    pub kind: String,
    pub subject: String,
    pub teacher: String,
    pub groups: String,
    /// Hex color for the kind banner, e.g. "#9C27B0".
    pub color: String,
    /// Completion percentage, 0–100.
    pub progress: u8,
}

/// Render instructions from the daemon to renderer clients
/// (JSON-lines over a Unix socket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RenderMsg {
    /// Rebuild the schedule view for a newly displayed date.
    #[serde(rename = "show_schedule")]
    ShowSchedule {
        /// "15 марта 2024"
        date_label: String,
        /// "Пятница"
        weekday: String,
        lessons: Vec<LessonView>,
    },
    /// Displayed date committed but has no lessons.
    #[serde(rename = "show_empty_schedule")]
    ShowEmptySchedule { date_label: String },
    /// In-place progress update for one lesson slot; labels untouched.
    #[serde(rename = "update_progress")]
    UpdateProgress { index: usize, progress: u8 },
    /// Transient notification; replaces any popup already shown.
    #[serde(rename = "show_popup")]
    ShowPopup { message: String },
    #[serde(rename = "dismiss_popup")]
    DismissPopup,
    /// Reveal the calendar overlay.
    #[serde(rename = "open_calendar_overlay")]
    OpenCalendarOverlay {
        year: i32,
        month: u32,
        /// Date to decorate as selected ("YYYY-MM-DD"), if any.
        highlighted: Option<String>,
        left_enabled: bool,
        right_enabled: bool,
    },
    #[serde(rename = "update_calendar_arrows")]
    UpdateCalendarArrows { left_enabled: bool, right_enabled: bool },
    #[serde(rename = "close_calendar_overlay")]
    CloseCalendarOverlay,
    /// Minute boundary: redraw the clock / date header widgets.
    #[serde(rename = "refresh_clock")]
    RefreshClock,
    /// Theme pass-through; the engine never interprets it.
    #[serde(rename = "set_theme")]
    SetTheme { dark: bool },
    /// Status response.
    #[serde(rename = "status")]
    Status {
        room_id: String,
        displayed_date: Option<String>,
        lesson_count: usize,
        mode: String,
        dark_theme: bool,
        version: String,
    },
    /// Acknowledgement for commands.
    #[serde(rename = "ack")]
    Ack { ok: bool, message: String },
}

/// Messages from renderers / control clients to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Renderer announcing itself (for routing render instructions).
    #[serde(rename = "register_renderer")]
    RegisterRenderer,
    /// A calendar day was tapped. The daemon normalizes the raw values.
    #[serde(rename = "select_date")]
    SelectDate { year: i32, month: u32, day: u32 },
    #[serde(rename = "open_calendar")]
    OpenCalendar,
    #[serde(rename = "close_calendar")]
    CloseCalendar,
    /// Calendar arrow tapped; delta is months, usually -1 or 1.
    #[serde(rename = "navigate_month")]
    NavigateMonth { delta: i32 },
    /// Interaction ping with no other effect (resets the idle clock).
    #[serde(rename = "touch")]
    Touch,
    #[serde(rename = "toggle_theme")]
    ToggleTheme,
    #[serde(rename = "get_status")]
    GetStatus,
}

/// Serialize a message as a JSON line (with trailing newline).
pub fn encode(msg: &impl Serialize) -> String {
    let mut s = serde_json::to_string(msg).expect("serialize IPC message");
    s.push('\n');
    s
}

/// Deserialize a JSON line. Returns None on empty/whitespace input.
pub fn decode_render(line: &str) -> Option<RenderMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

pub fn decode_client(line: &str) -> Option<ClientMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
