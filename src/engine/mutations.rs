use tokio::sync::oneshot;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::availability::{Decision, Reason, decide};
use super::{Engine, EngineError, SharedEmployeeState, WalCommand, busy_spans};

pub(super) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Trim, require non-empty, bound the length.
fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, EngineError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(EngineError::EmptyField(field));
    }
    if v.len() > max {
        return Err(EngineError::FieldTooLong { field, max });
    }
    Ok(v.to_string())
}

/// Trim and bound the length; empty is fine.
fn optional_text(field: &'static str, value: &str, max: usize) -> Result<String, EngineError> {
    let v = value.trim();
    if v.len() > max {
        return Err(EngineError::FieldTooLong { field, max });
    }
    Ok(v.to_string())
}

fn validate_duration(minutes: i64) -> Result<u32, EngineError> {
    if minutes <= 0 {
        return Err(EngineError::InvalidDuration(minutes));
    }
    if minutes > i64::from(MAX_SERVICE_DURATION_MINUTES) {
        return Err(EngineError::LimitExceeded("service duration too long"));
    }
    Ok(minutes as u32)
}

impl Engine {
    pub async fn create_employee(
        &self,
        id: Ulid,
        name: String,
        photo_url: String,
        specialties: String,
        bio: String,
    ) -> Result<(), EngineError> {
        if self.employees.len() >= MAX_EMPLOYEES_PER_SHOP {
            return Err(EngineError::LimitExceeded("too many employees"));
        }
        if self.employees.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }
        let employee = Employee {
            id,
            name: required_text("name", &name, MAX_NAME_LEN)?,
            photo_url: optional_text("photo_url", &photo_url, MAX_TEXT_LEN)?,
            specialties: optional_text("specialties", &specialties, MAX_TEXT_LEN)?,
            bio: optional_text("bio", &bio, MAX_TEXT_LEN)?,
            active: true,
        };
        self.persist_catalog(&Event::EmployeeAdded { employee }).await
    }

    pub async fn update_employee(
        &self,
        id: Ulid,
        update: EmployeeUpdate,
    ) -> Result<(), EngineError> {
        let mut guard = self.employee_write(id).await?;
        let mut info = guard.info.clone();
        if let Some(name) = update.name {
            info.name = required_text("name", &name, MAX_NAME_LEN)?;
        }
        if let Some(url) = update.photo_url {
            info.photo_url = optional_text("photo_url", &url, MAX_TEXT_LEN)?;
        }
        if let Some(s) = update.specialties {
            info.specialties = optional_text("specialties", &s, MAX_TEXT_LEN)?;
        }
        if let Some(b) = update.bio {
            info.bio = optional_text("bio", &b, MAX_TEXT_LEN)?;
        }
        if let Some(active) = update.active {
            info.active = active;
        }
        let event = Event::EmployeeUpdated { employee: info };
        self.persist_and_apply(id, &mut guard, &event).await
    }

    pub async fn create_service(
        &self,
        id: Ulid,
        name: String,
        description: String,
        price_cents: i64,
        duration_minutes: i64,
    ) -> Result<(), EngineError> {
        if self.services.len() >= MAX_SERVICES_PER_SHOP {
            return Err(EngineError::LimitExceeded("too many services"));
        }
        if self.services.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }
        if price_cents < 0 {
            return Err(EngineError::NegativePrice(price_cents));
        }
        let service = Service {
            id,
            name: required_text("name", &name, MAX_NAME_LEN)?,
            description: optional_text("description", &description, MAX_TEXT_LEN)?,
            price_cents,
            duration_minutes: validate_duration(duration_minutes)?,
            active: true,
        };
        self.persist_catalog(&Event::ServiceAdded { service }).await
    }

    pub async fn update_service(&self, id: Ulid, update: ServiceUpdate) -> Result<(), EngineError> {
        let mut service = self
            .services
            .get(&id)
            .map(|s| s.clone())
            .ok_or(EngineError::NotFound(id))?;
        if let Some(name) = update.name {
            service.name = required_text("name", &name, MAX_NAME_LEN)?;
        }
        if let Some(d) = update.description {
            service.description = optional_text("description", &d, MAX_TEXT_LEN)?;
        }
        if let Some(cents) = update.price_cents {
            if cents < 0 {
                return Err(EngineError::NegativePrice(cents));
            }
            service.price_cents = cents;
        }
        if let Some(minutes) = update.duration_minutes {
            service.duration_minutes = validate_duration(minutes)?;
        }
        if let Some(active) = update.active {
            service.active = active;
        }
        self.persist_catalog(&Event::ServiceUpdated { service }).await
    }

    /// The booking write path. Validates the request shape (malformed input
    /// is an error), resolves references (unknown or inactive refs are a
    /// decision), then decides and persists under the employee's write lock.
    ///
    /// Holding the lock from decision through WAL commit is what makes two
    /// racing requests for the same employee impossible to both accept: the
    /// loser re-decides against the winner's already-applied booking.
    pub async fn book(&self, request: BookingRequest) -> Result<Decision, EngineError> {
        let customer = Customer {
            name: required_text("customer_name", &request.customer.name, MAX_NAME_LEN)?,
            phone: required_text("customer_phone", &request.customer.phone, MAX_NAME_LEN)?,
            address: required_text("customer_address", &request.customer.address, MAX_TEXT_LEN)?,
            notes: match &request.customer.notes {
                Some(n) => {
                    let t = optional_text("notes", n, MAX_NOTES_LEN)?;
                    (!t.is_empty()).then_some(t)
                }
                None => None,
            },
        };
        if self.booking_owner.contains_key(&request.id) {
            return Err(EngineError::AlreadyExists(request.id));
        }
        if request.start < MIN_VALID_TIMESTAMP_MS || request.start > MAX_VALID_TIMESTAMP_MS {
            return Err(EngineError::LimitExceeded("timestamp out of range"));
        }

        let Some(service) = self.services.get(&request.service_id).map(|s| s.clone()) else {
            return Ok(Decision::Unavailable(Reason::InvalidReference));
        };
        if !service.active {
            return Ok(Decision::Unavailable(Reason::InvalidReference));
        }
        let duration_ms = service.duration_ms();
        if duration_ms <= 0 {
            return Ok(Decision::Unavailable(Reason::InvalidDuration));
        }
        let Some(st) = self.get_employee(&request.employee_id) else {
            return Ok(Decision::Unavailable(Reason::InvalidReference));
        };
        let candidate = Span::new(request.start, request.start + duration_ms);

        let mut guard = st.write_owned().await;
        if !guard.info.active {
            return Ok(Decision::Unavailable(Reason::InvalidReference));
        }
        if guard.bookings.len() >= MAX_BOOKINGS_PER_EMPLOYEE {
            return Err(EngineError::LimitExceeded("too many bookings for employee"));
        }

        let decision = decide(&candidate, &busy_spans(&guard, &candidate));
        if !decision.is_available() {
            return Ok(decision);
        }

        let booking = Booking {
            id: request.id,
            employee_id: request.employee_id,
            service_id: service.id,
            span: candidate,
            status: BookingStatus::Confirmed,
            customer,
            created_at: now_ms(),
        };
        let event = Event::BookingCreated { booking };
        self.persist_and_apply(request.employee_id, &mut guard, &event)
            .await?;
        Ok(Decision::Available)
    }

    /// Admin status transition. Cancellation frees the calendar but the
    /// record is kept forever.
    pub async fn set_booking_status(
        &self,
        booking_id: Ulid,
        status: BookingStatus,
    ) -> Result<Ulid, EngineError> {
        let (employee_id, mut guard) = self.resolve_booking_write(&booking_id).await?;
        let event = Event::BookingStatusChanged {
            employee_id,
            booking_id,
            status,
            at: now_ms(),
        };
        self.persist_and_apply(employee_id, &mut guard, &event).await?;
        Ok(employee_id)
    }

    /// Compact the WAL by rewriting it with only the events needed to
    /// recreate the current state. Cancelled bookings are part of that state
    /// and survive compaction.
    ///
    /// The snapshot is serialized against persists: catalog writes are
    /// excluded and every employee's read guard is held from collection
    /// until the writer has swapped in the rewritten file. An event acked
    /// before a guard was taken is in the snapshot; anything later waits
    /// and lands in the new file.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _catalog_excl = self.compact_lock.write().await;

        let mut events = Vec::new();
        for entry in self.services.iter() {
            events.push(Event::ServiceAdded {
                service: entry.value().clone(),
            });
        }

        let states: Vec<SharedEmployeeState> =
            self.employees.iter().map(|e| e.value().clone()).collect();
        let mut guards = Vec::with_capacity(states.len());
        for st in states {
            guards.push(st.read_owned().await);
        }
        for guard in &guards {
            events.push(Event::EmployeeAdded {
                employee: guard.info.clone(),
            });
            for booking in &guard.bookings {
                events.push(Event::BookingCreated {
                    booking: booking.clone(),
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        let result = rx
            .await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()));
        drop(guards);
        result
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
