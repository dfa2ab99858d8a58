pub mod availability;
mod error;
mod mutations;
mod queries;

pub use availability::{DaySlots, Decision, Reason, Slot};
pub use error::EngineError;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::wal::Wal;

pub type SharedEmployeeState = Arc<RwLock<EmployeeState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond Ok to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                // Drain all immediately available appends
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // Flush current batch first, then handle the non-append command
                            metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
                                .record(batch.len() as f64);
                            let flush_start = std::time::Instant::now();
                            let result = flush_batch(&mut wal, &mut batch);
                            metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
                                .record(flush_start.elapsed().as_secs_f64());
                            respond_batch(&mut batch, &result);
                            handle_non_append(&mut wal, other);
                            break;
                        }
                        Err(_) => break, // channel empty, flush batch
                    }
                }

                if !batch.is_empty() {
                    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
                        .record(batch.len() as f64);
                    let flush_start = std::time::Instant::now();
                    let result = flush_batch(&mut wal, &mut batch);
                    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
                        .record(flush_start.elapsed().as_secs_f64());
                    respond_batch(&mut batch, &result);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn flush_batch(
    wal: &mut Wal,
    batch: &mut [(Event, oneshot::Sender<io::Result<()>>)],
) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush, even on append error, so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn respond_batch(
    batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>,
    result: &io::Result<()>,
) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// One shop's scheduling state: the catalog plus every employee's calendar,
/// rebuilt from the WAL on startup.
pub struct Engine {
    pub employees: DashMap<Ulid, SharedEmployeeState>,
    pub services: DashMap<Ulid, Service>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    pub notify: Arc<NotifyHub>,
    /// Reverse lookup: booking id → employee id.
    pub(super) booking_owner: DashMap<Ulid, Ulid>,
    /// Read side: catalog persists. Write side: compaction. Keeps a catalog
    /// event acked mid-snapshot from being erased by the rewrite.
    pub(super) compact_lock: RwLock<()>,
}

/// Apply an event directly to an EmployeeState. The caller holds the lock.
fn apply_to_employee(st: &mut EmployeeState, event: &Event, booking_owner: &DashMap<Ulid, Ulid>) {
    match event {
        Event::EmployeeUpdated { employee } => {
            st.info = employee.clone();
        }
        Event::BookingCreated { booking } => {
            booking_owner.insert(booking.id, booking.employee_id);
            st.insert_booking(booking.clone());
        }
        Event::BookingStatusChanged {
            booking_id, status, ..
        } => {
            if let Some(b) = st.booking_mut(*booking_id) {
                b.status = *status;
            }
        }
        // Catalog additions are handled at the map level, not here
        Event::EmployeeAdded { .. } | Event::ServiceAdded { .. } | Event::ServiceUpdated { .. } => {}
    }
}

impl Engine {
    pub fn new(wal_path: PathBuf, notify: Arc<NotifyHub>) -> std::io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            employees: DashMap::new(),
            services: DashMap::new(),
            wal_tx,
            notify,
            booking_owner: DashMap::new(),
            compact_lock: RwLock::new(()),
        };

        // Replay events. We are the sole owner of these Arcs, so try_write
        // always succeeds instantly (no contention). Never use blocking_write
        // here because this may run inside an async context (lazy shop creation).
        for event in &events {
            match event {
                Event::EmployeeAdded { employee } => {
                    engine.employees.insert(
                        employee.id,
                        Arc::new(RwLock::new(EmployeeState::new(employee.clone()))),
                    );
                }
                Event::ServiceAdded { service } | Event::ServiceUpdated { service } => {
                    engine.services.insert(service.id, service.clone());
                }
                other => {
                    if let Some(employee_id) = event_employee_id(other)
                        && let Some(entry) = engine.employees.get(&employee_id)
                    {
                        let st_arc = entry.clone();
                        let mut guard = st_arc.try_write().expect("replay: uncontended write");
                        apply_to_employee(&mut guard, other, &engine.booking_owner);
                    }
                }
            }
        }

        Ok(engine)
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_employee(&self, id: &Ulid) -> Option<SharedEmployeeState> {
        self.employees.get(id).map(|e| e.value().clone())
    }

    pub fn employee_of_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_owner.get(booking_id).map(|e| *e.value())
    }

    /// WAL-append + apply + notify in one call, for events targeting one
    /// employee's calendar. The caller holds that employee's write lock.
    pub(super) async fn persist_and_apply(
        &self,
        employee_id: Ulid,
        st: &mut EmployeeState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_employee(st, event, &self.booking_owner);
        self.notify.send(employee_id, event);
        Ok(())
    }

    /// WAL-append + apply for catalog-level events (no per-employee lock).
    /// Shares `compact_lock` so the append cannot land in the gap between a
    /// compaction snapshot and the file swap.
    pub(super) async fn persist_catalog(&self, event: &Event) -> Result<(), EngineError> {
        let _shared = self.compact_lock.read().await;
        self.wal_append(event).await?;
        match event {
            Event::EmployeeAdded { employee } => {
                self.employees.insert(
                    employee.id,
                    Arc::new(RwLock::new(EmployeeState::new(employee.clone()))),
                );
            }
            Event::ServiceAdded { service } | Event::ServiceUpdated { service } => {
                self.services.insert(service.id, service.clone());
            }
            _ => {}
        }
        Ok(())
    }

    /// Acquire one employee's calendar for writing.
    pub(super) async fn employee_write(
        &self,
        id: Ulid,
    ) -> Result<tokio::sync::OwnedRwLockWriteGuard<EmployeeState>, EngineError> {
        let st = self.get_employee(&id).ok_or(EngineError::NotFound(id))?;
        Ok(st.write_owned().await)
    }

    /// Lookup booking → employee, then acquire that employee's write lock.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<EmployeeState>), EngineError> {
        let employee_id = self
            .employee_of_booking(booking_id)
            .ok_or(EngineError::NotFound(*booking_id))?;
        let guard = self.employee_write(employee_id).await?;
        Ok((employee_id, guard))
    }
}

/// Non-cancelled spans that could conflict with the candidate. The fetch
/// window is the candidate padded by the buffer on its start side, so no
/// qualifying appointment can be missed, whatever day it started on.
pub(super) fn busy_spans(st: &EmployeeState, candidate: &Span) -> Vec<Span> {
    let window = Span::new(candidate.start - availability::BUFFER_MS, candidate.end);
    st.overlapping(&window)
        .filter(|b| b.occupies_calendar())
        .map(|b| b.span)
        .collect()
}

/// Extract the owning employee from an event (None for catalog-level events).
fn event_employee_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::EmployeeUpdated { employee } => Some(employee.id),
        Event::BookingCreated { booking } => Some(booking.employee_id),
        Event::BookingStatusChanged { employee_id, .. } => Some(*employee_id),
        Event::EmployeeAdded { .. } | Event::ServiceAdded { .. } | Event::ServiceUpdated { .. } => {
            None
        }
    }
}
