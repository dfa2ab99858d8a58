use ulid::Ulid;

use crate::limits::RECENT_BOOKINGS_LIMIT;
use crate::model::*;

use super::availability::{self, DaySlots, Decision, Reason, decide};
use super::{Engine, SharedEmployeeState, busy_spans};

impl Engine {
    /// Advisory availability check. The answer is a snapshot; only
    /// [`Engine::book`] decides for real, under the employee's write lock.
    pub async fn check_availability(
        &self,
        employee_id: Ulid,
        service_id: Ulid,
        start: Ms,
    ) -> Decision {
        let Some(service) = self.services.get(&service_id).map(|s| s.clone()) else {
            return Decision::Unavailable(Reason::InvalidReference);
        };
        if !service.active {
            return Decision::Unavailable(Reason::InvalidReference);
        }
        let duration_ms = service.duration_ms();
        if duration_ms <= 0 {
            return Decision::Unavailable(Reason::InvalidDuration);
        }
        let Some(st) = self.get_employee(&employee_id) else {
            return Decision::Unavailable(Reason::InvalidReference);
        };
        let candidate = Span::new(start, start + duration_ms);

        let guard = st.read().await;
        if !guard.info.active {
            return Decision::Unavailable(Reason::InvalidReference);
        }
        decide(&candidate, &busy_spans(&guard, &candidate))
    }

    /// The slot grid for one employee, one service, one local calendar day.
    /// Unknown or inactive references yield `None`, which callers render as
    /// an empty listing.
    pub async fn day_slots(
        &self,
        employee_id: Ulid,
        service_id: Ulid,
        day: Ms,
    ) -> Option<DaySlots> {
        let service = self.services.get(&service_id).map(|s| s.clone())?;
        if !service.active {
            return None;
        }
        let duration_ms = service.duration_ms();
        if duration_ms <= 0 {
            return None;
        }
        let st = self.get_employee(&employee_id)?;

        let slots = DaySlots::new(day, duration_ms)?;
        let window = slots.fetch_window()?;

        let guard = st.read().await;
        if !guard.info.active {
            return None;
        }
        let busy: Vec<Span> = guard
            .overlapping(&window)
            .filter(|b| b.occupies_calendar())
            .map(|b| b.span)
            .collect();
        Some(slots.with_busy(busy))
    }

    /// Every booking whose span touches the local calendar day containing
    /// `day`, cancelled ones included.
    pub async fn bookings_for_day(&self, employee_id: Ulid, day: Ms) -> Vec<Booking> {
        let Some(st) = self.get_employee(&employee_id) else {
            return Vec::new();
        };
        let Some(window) = availability::local_day_window(day) else {
            return Vec::new();
        };
        let guard = st.read().await;
        guard.overlapping(&window).cloned().collect()
    }

    pub async fn list_employees(&self, include_inactive: bool) -> Vec<Employee> {
        let states: Vec<SharedEmployeeState> =
            self.employees.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::with_capacity(states.len());
        for st in states {
            let guard = st.read().await;
            if include_inactive || guard.info.active {
                out.push(guard.info.clone());
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        out
    }

    pub fn list_services(&self, include_inactive: bool) -> Vec<Service> {
        let mut out: Vec<Service> = self
            .services
            .iter()
            .filter(|s| include_inactive || s.active)
            .map(|s| s.clone())
            .collect();
        out.sort_by(|a, b| {
            a.price_cents
                .cmp(&b.price_cents)
                .then(a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        });
        out
    }

    /// Latest bookings across the whole shop, newest start first, capped at
    /// [`RECENT_BOOKINGS_LIMIT`].
    pub async fn recent_bookings(&self) -> Vec<Booking> {
        let states: Vec<SharedEmployeeState> =
            self.employees.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::new();
        for st in states {
            let guard = st.read().await;
            out.extend(guard.bookings.iter().cloned());
        }
        out.sort_by(|a, b| b.span.start.cmp(&a.span.start).then(b.id.cmp(&a.id)));
        out.truncate(RECENT_BOOKINGS_LIMIT);
        out
    }
}
