use roomboard_core::calendar::DateClass;

/// Completion percentage of a lesson as of `now_min` (minute of day).
///
/// Past dates are always 100, future dates always 0. For today the
/// division truncates, matching what the progress bars have always
/// shown; do not round.
pub fn lesson_progress(start_min: u32, end_min: u32, class: DateClass, now_min: u32) -> u8 {
    match class {
        DateClass::Past => 100,
        DateClass::Future => 0,
        DateClass::Today => {
            if now_min > end_min {
                100
            } else if now_min < start_min {
                0
            } else if end_min == start_min {
                // Violates the lesson invariant; treat as finished
                // rather than dividing by zero.
                100
            } else {
                (((now_min - start_min) * 100) / (end_min - start_min)) as u8
            }
        }
    }
}
