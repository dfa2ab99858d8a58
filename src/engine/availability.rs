use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, TimeZone, Timelike};

use crate::model::{Ms, Span};

// ── Business rules ────────────────────────────────────────────────

/// First bookable hour of the day, local wall clock.
pub const OPEN_HOUR: u32 = 9;
/// Closing hour: a booking may not start at or after it and must end at or
/// before it.
pub const CLOSE_HOUR: u32 = 21;
/// Required gap after an existing appointment before the next one may start.
pub const BUFFER_MS: Ms = 60 * 60 * 1000;
/// Slot grid step for day listings.
pub const SLOT_MINUTES: u32 = 30;

const FIRST_SLOT_MINUTE: u32 = OPEN_HOUR * 60;
const LAST_SLOT_MINUTE: u32 = (CLOSE_HOUR - 1) * 60 + 30;
/// 09:00 through 20:30 inclusive, every 30 minutes.
pub const SLOTS_PER_DAY: u32 = (LAST_SLOT_MINUTE - FIRST_SLOT_MINUTE) / SLOT_MINUTES + 1;

// ── Decisions ─────────────────────────────────────────────────────

/// Why a candidate was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    OutsideHours,
    Overlap,
    /// Unknown or deactivated employee/service.
    InvalidReference,
    /// Non-positive service duration.
    InvalidDuration,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::OutsideHours => "outside_hours",
            Reason::Overlap => "overlap",
            Reason::InvalidReference => "invalid_reference",
            Reason::InvalidDuration => "invalid_duration",
        }
    }
}

/// The engine's answer. "Unavailable" is an ordinary business outcome, so it
/// is a value, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Available,
    Unavailable(Reason),
}

impl Decision {
    pub fn is_available(&self) -> bool {
        matches!(self, Decision::Available)
    }

    pub fn reason(&self) -> Option<Reason> {
        match self {
            Decision::Available => None,
            Decision::Unavailable(r) => Some(*r),
        }
    }
}

// ── The rule set ──────────────────────────────────────────────────

fn local_hour_minute(t: Ms) -> Option<(u32, u32)> {
    let dt = Local.timestamp_millis_opt(t).single()?;
    Some((dt.hour(), dt.minute()))
}

/// Business-hours rule: a booking may start any time from 09:00 up to (but
/// not including) 21:00, and must finish at or before 21:00 exactly. Both
/// ends are judged by local wall-clock hour and minute alone.
pub fn within_business_hours(span: &Span) -> bool {
    let Some((start_hour, _)) = local_hour_minute(span.start) else {
        return false;
    };
    let Some((end_hour, end_minute)) = local_hour_minute(span.end) else {
        return false;
    };
    if start_hour < OPEN_HOUR || start_hour >= CLOSE_HOUR {
        return false;
    }
    if end_hour > CLOSE_HOUR || (end_hour == CLOSE_HOUR && end_minute > 0) {
        return false;
    }
    true
}

/// The buffered conflict rule. An existing appointment `[b.start, b.end)`
/// blocks a candidate `[c.start, c.end)` when
///
///   `b.start < c.end  AND  b.end > c.start - 60min`
///
/// The buffer is one-sided: only the candidate's start must clear an earlier
/// appointment's end by 60 minutes. An appointment lying entirely after the
/// candidate is held to plain overlap, with no gap required before it. The
/// asymmetry is deliberate (the hour reads as setup time before the next
/// client) and must not be symmetrized without a product decision.
pub fn conflicts_with_buffer(existing: &Span, candidate: &Span) -> bool {
    existing.start < candidate.end && existing.end > candidate.start - BUFFER_MS
}

/// Decide one candidate against business hours and the given set of
/// non-cancelled appointment spans. Pure: same inputs, same decision.
pub fn decide(candidate: &Span, busy: &[Span]) -> Decision {
    if !within_business_hours(candidate) {
        return Decision::Unavailable(Reason::OutsideHours);
    }
    if busy.iter().any(|b| conflicts_with_buffer(b, candidate)) {
        return Decision::Unavailable(Reason::Overlap);
    }
    Decision::Available
}

// ── Day listing ───────────────────────────────────────────────────

fn local_midnight(date: NaiveDate) -> Option<Ms> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        chrono::LocalResult::Ambiguous(earlier, _) => Some(earlier.timestamp_millis()),
        chrono::LocalResult::None => {
            // Midnight erased by a DST jump: the day starts where the gap ends.
            let later = date.and_hms_opt(1, 0, 0)?;
            Local
                .from_local_datetime(&later)
                .earliest()
                .map(|dt| dt.timestamp_millis())
        }
    }
}

/// The local calendar day containing `t`, as an absolute half-open window.
pub fn local_day_window(t: Ms) -> Option<Span> {
    let date = Local.timestamp_millis_opt(t).single()?.date_naive();
    let start = local_midnight(date)?;
    let end = local_midnight(date.succ_opt()?)?;
    Some(Span::new(start, end))
}

/// One entry of a day listing. `hour`/`minute` restate the wall-clock grid
/// position already encoded in `start`, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: Ms,
    pub hour: u32,
    pub minute: u32,
    pub available: bool,
}

/// Lazy iterator over one day's slot grid. Every slot is decided with the
/// same rules as a single availability check, against one snapshot of the
/// employee's non-cancelled appointments. `restart` (or a clone) replays the
/// sequence from the top.
#[derive(Debug, Clone)]
pub struct DaySlots {
    date: NaiveDate,
    duration_ms: Ms,
    busy: Arc<[Span]>,
    cursor: u32,
}

impl DaySlots {
    /// `day` is any instant within the intended local calendar day.
    pub fn new(day: Ms, duration_ms: Ms) -> Option<Self> {
        let date = Local.timestamp_millis_opt(day).single()?.date_naive();
        Some(Self {
            date,
            duration_ms,
            busy: Vec::new().into(),
            cursor: 0,
        })
    }

    /// Snapshot of the employee's non-cancelled appointment spans that every
    /// slot will be decided against.
    pub fn with_busy(mut self, busy: Vec<Span>) -> Self {
        self.busy = busy.into();
        self
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Fetch window covering every candidate this listing will decide,
    /// buffer included. Bookings outside it cannot affect any slot, whatever
    /// day they started on.
    pub fn fetch_window(&self) -> Option<Span> {
        let mut starts = (0..SLOTS_PER_DAY).filter_map(|i| self.slot_start(i));
        let first = starts.next()?;
        let last = starts.last().unwrap_or(first);
        Some(Span::new(first - BUFFER_MS, last + self.duration_ms))
    }

    /// Wall-clock slot instant, built the same way the booking UI builds it.
    /// `None` when a DST gap erases that wall-clock time from the day.
    fn slot_start(&self, index: u32) -> Option<Ms> {
        let minute = FIRST_SLOT_MINUTE + index * SLOT_MINUTES;
        let dt = Local
            .with_ymd_and_hms(
                self.date.year(),
                self.date.month(),
                self.date.day(),
                minute / 60,
                minute % 60,
                0,
            )
            .earliest()?;
        Some(dt.timestamp_millis())
    }
}

impl Iterator for DaySlots {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        while self.cursor < SLOTS_PER_DAY {
            let index = self.cursor;
            self.cursor += 1;
            if let Some(start) = self.slot_start(index) {
                let candidate = Span::new(start, start + self.duration_ms);
                let minute_of_day = FIRST_SLOT_MINUTE + index * SLOT_MINUTES;
                return Some(Slot {
                    start,
                    hour: minute_of_day / 60,
                    minute: minute_of_day % 60,
                    available: decide(&candidate, &self.busy).is_available(),
                });
            }
            // Wall-clock time erased by a DST gap: nothing to offer.
        }
        None
    }
}
