use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds, the only time type in the crate.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// Appointment lifecycle. Cancelled bookings stay in the store forever; they
/// just stop occupying the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let all = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ];
        all.into_iter().find(|st| s.eq_ignore_ascii_case(st.as_str()))
    }
}

/// A staff member. Deactivated employees are hidden from the public catalog
/// and refuse new bookings; their history is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Ulid,
    pub name: String,
    pub photo_url: String,
    pub specialties: String,
    pub bio: String,
    pub active: bool,
}

/// A bookable service. `duration_minutes` is always positive; enforced at
/// catalog write time, never trusted from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: Ulid,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub duration_minutes: u32,
    pub active: bool,
}

impl Service {
    pub fn duration_ms(&self) -> Ms {
        Ms::from(self.duration_minutes) * 60_000
    }
}

/// Who the appointment is for. All contact fields are required non-empty
/// after trimming; notes are free-form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub notes: Option<String>,
}

/// A persisted appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub employee_id: Ulid,
    pub service_id: Ulid,
    pub span: Span,
    pub status: BookingStatus,
    pub customer: Customer,
    pub created_at: Ms,
}

impl Booking {
    pub fn occupies_calendar(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// One booking attempt, consumed once. Produces a `Booking` or a rejection,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub id: Ulid,
    pub employee_id: Ulid,
    pub service_id: Ulid,
    pub start: Ms,
    pub customer: Customer,
}

/// Partial catalog update: only the provided fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub specialties: Option<String>,
    pub bio: Option<String>,
    pub active: Option<bool>,
}

/// Partial catalog update. Duration stays raw here; the engine rejects
/// non-positive values before anything is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub active: Option<bool>,
}

/// Per-employee calendar: the employee record plus every booking ever taken
/// for them (cancelled included), sorted by `span.start`.
#[derive(Debug, Clone)]
pub struct EmployeeState {
    pub info: Employee,
    pub bookings: Vec<Booking>,
}

impl EmployeeState {
    pub fn new(info: Employee) -> Self {
        Self {
            info,
            bookings: Vec::new(),
        }
    }

    /// Insert a booking maintaining sort order by span.start.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Status transitions never move a booking, so sort order survives.
    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Bookings whose span overlaps the query window, any status.
    /// Binary search skips everything starting at or after `query.end`; a
    /// booking that began before the window but runs into it is still found,
    /// so day-window reads cannot miss cross-midnight appointments.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        let right_bound = self.bookings.partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }
}

/// Event records as written to the WAL, one variant per mutation. The same
/// records are the notification payloads; the rename only shows in JSON,
/// bincode encodes variants by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    EmployeeAdded {
        employee: Employee,
    },
    /// Full-record replace; deactivation is an update with `active: false`.
    EmployeeUpdated {
        employee: Employee,
    },
    ServiceAdded {
        service: Service,
    },
    ServiceUpdated {
        service: Service,
    },
    BookingCreated {
        booking: Booking,
    },
    /// Cancellation is a status change like any other; the record stays.
    BookingStatusChanged {
        employee_id: Ulid,
        booking_id: Ulid,
        status: BookingStatus,
        at: Ms,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> Employee {
        Employee {
            id: Ulid::new(),
            name: "Ana".into(),
            photo_url: String::new(),
            specialties: "cuts".into(),
            bio: String::new(),
            active: true,
        }
    }

    fn booking(start: Ms, end: Ms) -> Booking {
        Booking {
            id: Ulid::new(),
            employee_id: Ulid::new(),
            service_id: Ulid::new(),
            span: Span::new(start, end),
            status: BookingStatus::Confirmed,
            customer: Customer {
                name: "Jo".into(),
                phone: "555".into(),
                address: "1 Main St".into(),
                notes: None,
            },
            created_at: 0,
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn status_strings_roundtrip() {
        for st in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(st.as_str()), Some(st));
        }
        assert_eq!(BookingStatus::parse("CANCELLED"), Some(BookingStatus::Cancelled));
        assert_eq!(BookingStatus::parse("no-show"), None);
    }

    #[test]
    fn cancelled_does_not_occupy_calendar() {
        let mut b = booking(100, 200);
        assert!(b.occupies_calendar());
        b.status = BookingStatus::Cancelled;
        assert!(!b.occupies_calendar());
    }

    #[test]
    fn booking_ordering() {
        let mut st = EmployeeState::new(employee());
        st.insert_booking(booking(300, 400));
        st.insert_booking(booking(100, 200));
        st.insert_booking(booking(200, 300));
        assert_eq!(st.bookings[0].span.start, 100);
        assert_eq!(st.bookings[1].span.start, 200);
        assert_eq!(st.bookings[2].span.start, 300);
    }

    #[test]
    fn status_update_keeps_order() {
        let mut st = EmployeeState::new(employee());
        st.insert_booking(booking(100, 200));
        let id = st.bookings[0].id;
        st.insert_booking(booking(300, 400));

        let b = st.booking_mut(id).unwrap();
        b.status = BookingStatus::Cancelled;

        assert_eq!(st.bookings.len(), 2);
        assert_eq!(st.bookings[0].id, id);
        assert_eq!(st.booking(id).unwrap().status, BookingStatus::Cancelled);
    }

    #[test]
    fn overlapping_skips_past_and_future() {
        let mut st = EmployeeState::new(employee());
        st.insert_booking(booking(100, 200)); // past
        st.insert_booking(booking(450, 600)); // overlaps
        st.insert_booking(booking(1000, 1100)); // starts after query end

        let query = Span::new(500, 800);
        let hits: Vec<_> = st.overlapping(&query).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].span, Span::new(450, 600));
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        // A booking ending exactly at query.start is NOT overlapping (half-open)
        let mut st = EmployeeState::new(employee());
        st.insert_booking(booking(100, 200));
        let hits: Vec<_> = st.overlapping(&Span::new(200, 300)).collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn overlapping_crosses_window_start() {
        // Booking begins before the window and runs into it; the day-window
        // read must still see it.
        let mut st = EmployeeState::new(employee());
        st.insert_booking(booking(0, 10_000));
        let hits: Vec<_> = st.overlapping(&Span::new(500, 600)).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn overlapping_empty_calendar() {
        let st = EmployeeState::new(employee());
        let hits: Vec<_> = st.overlapping(&Span::new(0, 1000)).collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn overlapping_single_ms() {
        let mut st = EmployeeState::new(employee());
        st.insert_booking(booking(100, 201));
        let hits: Vec<_> = st.overlapping(&Span::new(200, 300)).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::BookingCreated {
            booking: booking(100, 200),
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
