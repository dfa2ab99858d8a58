use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::{stream, Sink, SinkExt};
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{DefaultServerParameterProvider, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::data::DataRow;
use pgwire::messages::response::NotificationResponse;
use pgwire::messages::PgWireBackendMessage;
use pgwire::tokio::{process_socket, TlsAcceptor};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use ulid::Ulid;

use crate::auth::{AuthConfig, Role, SlotdAuthSource};
use crate::engine::{Decision, Engine};
use crate::model::*;
use crate::observability;
use crate::shop::ShopDirectory;
use crate::sql::{self, Command};

pub struct SlotdHandler {
    shops: Arc<ShopDirectory>,
    subs: Subscriptions,
    query_parser: Arc<SlotdQueryParser>,
}

impl SlotdHandler {
    pub fn new(shops: Arc<ShopDirectory>) -> Self {
        Self {
            shops,
            subs: Subscriptions::new(),
            query_parser: Arc::new(SlotdQueryParser),
        }
    }

    fn resolve_engine<C: ClientInfo>(&self, client: &C) -> PgWireResult<Arc<Engine>> {
        let db = client
            .metadata()
            .get("database")
            .cloned()
            .unwrap_or_else(|| "default".to_string());
        self.shops.get_or_create(&db).map_err(|e| {
            PgWireError::UserError(Box::new(ErrorInfo::new(
                "ERROR".into(),
                "08006".into(),
                format!("shop error: {e}"),
            )))
        })
    }

    /// Push events queued on this connection's LISTEN channels. Runs before
    /// every query, so notifications ride ahead of the next response.
    async fn flush_notifications<C>(&self, client: &mut C) -> PgWireResult<()>
    where
        C: Sink<PgWireBackendMessage> + Unpin + Send,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        for notification in self.subs.drain().await {
            client
                .send(PgWireBackendMessage::NotificationResponse(notification))
                .await?;
        }
        Ok(())
    }

    async fn execute_command(
        &self,
        engine: &Engine,
        role: Role,
        cmd: Command,
    ) -> PgWireResult<Vec<Response>> {
        match cmd {
            Command::CreateEmployee {
                id,
                name,
                photo_url,
                specialties,
                bio,
            } => {
                require_admin(role, "creating employees")?;
                engine
                    .create_employee(id, name, photo_url, specialties, bio)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::UpdateEmployee { id, update } => {
                require_admin(role, "updating employees")?;
                engine.update_employee(id, update).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::CreateService {
                id,
                name,
                description,
                price_cents,
                duration_minutes,
            } => {
                require_admin(role, "creating services")?;
                engine
                    .create_service(id, name, description, price_cents, duration_minutes)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::UpdateService { id, update } => {
                require_admin(role, "updating services")?;
                engine.update_service(id, update).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::BookAppointment { request } => {
                let booking_id = request.id;
                let decision = engine.book(request).await.map_err(engine_err)?;
                metrics::counter!(
                    observability::DECISIONS_TOTAL,
                    "outcome" => decision_label(&decision)
                )
                .increment(1);

                let schema = Arc::new(decision_schema());
                let booking = decision.is_available().then_some(booking_id);
                let rows = decision_rows(&schema, &decision, booking);
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SetBookingStatus { id, status } => {
                require_admin(role, "changing booking status")?;
                engine.set_booking_status(id, status).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::CheckAvailability {
                employee_id,
                service_id,
                start,
            } => {
                let decision = engine.check_availability(employee_id, service_id, start).await;
                metrics::counter!(
                    observability::DECISIONS_TOTAL,
                    "outcome" => decision_label(&decision)
                )
                .increment(1);

                let schema = Arc::new(decision_schema());
                let rows = decision_rows(&schema, &decision, None);
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::ListSlots {
                employee_id,
                service_id,
                day,
            } => {
                let slots = match engine.day_slots(employee_id, service_id, day).await {
                    Some(day_slots) => day_slots.collect(),
                    None => Vec::new(),
                };

                let schema = Arc::new(slots_schema());
                let rows: Vec<PgWireResult<_>> = slots
                    .into_iter()
                    .map(|slot| {
                        let status = if slot.available { "available" } else { "unavailable" };
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&slot.start)?;
                        encoder.encode_field(&format!("{:02}:{:02}", slot.hour, slot.minute))?;
                        encoder.encode_field(&status.to_string())?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::ListEmployees { include_inactive } => {
                if include_inactive {
                    require_admin(role, "listing inactive employees")?;
                }
                let employees = engine.list_employees(include_inactive).await;

                let schema = Arc::new(employees_schema());
                let rows: Vec<PgWireResult<_>> = employees
                    .into_iter()
                    .map(|e| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&e.id.to_string())?;
                        encoder.encode_field(&e.name)?;
                        encoder.encode_field(&e.photo_url)?;
                        encoder.encode_field(&e.specialties)?;
                        encoder.encode_field(&e.bio)?;
                        encoder.encode_field(&e.active.to_string())?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::ListServices { include_inactive } => {
                if include_inactive {
                    require_admin(role, "listing inactive services")?;
                }
                let services = engine.list_services(include_inactive);

                let schema = Arc::new(services_schema());
                let rows: Vec<PgWireResult<_>> = services
                    .into_iter()
                    .map(|s| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&s.id.to_string())?;
                        encoder.encode_field(&s.name)?;
                        encoder.encode_field(&s.description)?;
                        encoder.encode_field(&s.price_cents)?;
                        encoder.encode_field(&(s.duration_minutes as i64))?;
                        encoder.encode_field(&s.active.to_string())?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::ListBookings { employee_id, day } => {
                require_admin(role, "reading bookings")?;
                let bookings = engine.bookings_for_day(employee_id, day).await;

                let schema = Arc::new(bookings_schema());
                let rows = booking_rows(&schema, bookings);
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::RecentBookings => {
                require_admin(role, "reading bookings")?;
                let bookings = engine.recent_bookings().await;

                let schema = Arc::new(bookings_schema());
                let rows = booking_rows(&schema, bookings);
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::Listen { channel } => {
                require_admin(role, "LISTEN")?;
                let employee_id = parse_channel(&channel)?;
                let receiver = engine.notify.subscribe(employee_id);
                self.subs.listen(channel, receiver).await;
                Ok(vec![Response::Execution(Tag::new("LISTEN"))])
            }
            Command::Unlisten { channel } => {
                require_admin(role, "UNLISTEN")?;
                self.subs.unlisten(channel.as_deref()).await;
                Ok(vec![Response::Execution(Tag::new("UNLISTEN"))])
            }
        }
    }
}

/// LISTEN state for one connection. Calendar events pile up in the broadcast
/// receivers until the next query on this connection flushes them out, so a
/// dashboard that polls keeps its feed live without a second wire protocol.
struct Subscriptions {
    channels: Mutex<HashMap<String, broadcast::Receiver<Event>>>,
}

impl Subscriptions {
    fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Duplicate LISTEN keeps the original receiver so nothing arrives twice.
    async fn listen(&self, channel: String, receiver: broadcast::Receiver<Event>) {
        self.channels.lock().await.entry(channel).or_insert(receiver);
    }

    async fn unlisten(&self, channel: Option<&str>) {
        let mut channels = self.channels.lock().await;
        match channel {
            Some(name) => {
                channels.remove(name);
            }
            None => channels.clear(),
        }
    }

    async fn drain(&self) -> Vec<NotificationResponse> {
        let mut out = Vec::new();
        let mut channels = self.channels.lock().await;
        for (name, receiver) in channels.iter_mut() {
            loop {
                match receiver.try_recv() {
                    Ok(event) => {
                        if let Ok(payload) = serde_json::to_string(&event) {
                            out.push(NotificationResponse::new(0, name.clone(), payload));
                        }
                    }
                    Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
        out
    }
}

fn require_admin(role: Role, what: &'static str) -> PgWireResult<()> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(PgWireError::UserError(Box::new(ErrorInfo::new(
            "ERROR".into(),
            "42501".into(),
            format!("permission denied: {what} requires the admin login"),
        ))))
    }
}

fn resolve_role<C: ClientInfo>(client: &C) -> Role {
    client
        .metadata()
        .get("user")
        .map(|u| Role::for_user(u))
        .unwrap_or(Role::Public)
}

fn parse_channel(channel: &str) -> PgWireResult<Ulid> {
    let employee_id_str = channel.strip_prefix("employee_").ok_or_else(|| {
        PgWireError::UserError(Box::new(ErrorInfo::new(
            "ERROR".into(),
            "42000".into(),
            format!("invalid channel: {channel} (expected employee_{{id}})"),
        )))
    })?;
    Ulid::from_string(employee_id_str).map_err(|e| {
        PgWireError::UserError(Box::new(ErrorInfo::new(
            "ERROR".into(),
            "42000".into(),
            format!("bad ULID in channel: {e}"),
        )))
    })
}

fn decision_label(decision: &Decision) -> &'static str {
    match decision.reason() {
        None => "available",
        Some(reason) => reason.as_str(),
    }
}

// ── Row schemas ──────────────────────────────────────────────────

fn decision_schema() -> Vec<FieldInfo> {
    vec![
        FieldInfo::new("decision".into(), None, None, Type::VARCHAR, FieldFormat::Text),
        FieldInfo::new("reason".into(), None, None, Type::VARCHAR, FieldFormat::Text),
        FieldInfo::new("booking".into(), None, None, Type::VARCHAR, FieldFormat::Text),
    ]
}

fn slots_schema() -> Vec<FieldInfo> {
    vec![
        FieldInfo::new("start".into(), None, None, Type::INT8, FieldFormat::Text),
        FieldInfo::new("time".into(), None, None, Type::VARCHAR, FieldFormat::Text),
        FieldInfo::new("status".into(), None, None, Type::VARCHAR, FieldFormat::Text),
    ]
}

fn employees_schema() -> Vec<FieldInfo> {
    ["id", "name", "photo_url", "specialties", "bio", "active"]
        .into_iter()
        .map(|name| FieldInfo::new(name.into(), None, None, Type::VARCHAR, FieldFormat::Text))
        .collect()
}

fn services_schema() -> Vec<FieldInfo> {
    vec![
        FieldInfo::new("id".into(), None, None, Type::VARCHAR, FieldFormat::Text),
        FieldInfo::new("name".into(), None, None, Type::VARCHAR, FieldFormat::Text),
        FieldInfo::new(
            "description".into(),
            None,
            None,
            Type::VARCHAR,
            FieldFormat::Text,
        ),
        FieldInfo::new(
            "price_cents".into(),
            None,
            None,
            Type::INT8,
            FieldFormat::Text,
        ),
        FieldInfo::new(
            "duration_minutes".into(),
            None,
            None,
            Type::INT8,
            FieldFormat::Text,
        ),
        FieldInfo::new("active".into(), None, None, Type::VARCHAR, FieldFormat::Text),
    ]
}

fn bookings_schema() -> Vec<FieldInfo> {
    [
        ("id", Type::VARCHAR),
        ("employee_id", Type::VARCHAR),
        ("service_id", Type::VARCHAR),
        ("start", Type::INT8),
        ("end", Type::INT8),
        ("status", Type::VARCHAR),
        ("customer_name", Type::VARCHAR),
        ("customer_phone", Type::VARCHAR),
        ("customer_address", Type::VARCHAR),
        ("notes", Type::VARCHAR),
        ("created_at", Type::INT8),
    ]
    .into_iter()
    .map(|(name, ty)| FieldInfo::new(name.into(), None, None, ty, FieldFormat::Text))
    .collect()
}

/// One `(decision, reason, booking)` row. `booking` is the accepted booking's
/// id on a successful insert, NULL on rejections and advisory checks.
fn decision_rows(
    schema: &Arc<Vec<FieldInfo>>,
    decision: &Decision,
    booking: Option<Ulid>,
) -> Vec<PgWireResult<DataRow>> {
    let label = if decision.is_available() {
        "available"
    } else {
        "unavailable"
    };
    let reason = decision.reason().map(|r| r.as_str().to_string());
    let booking = booking.map(|id| id.to_string());

    std::iter::once((label.to_string(), reason, booking))
        .map(|(label, reason, booking)| {
            let mut encoder = DataRowEncoder::new(schema.clone());
            encoder.encode_field(&label)?;
            encoder.encode_field(&reason)?;
            encoder.encode_field(&booking)?;
            Ok(encoder.take_row())
        })
        .collect()
}

fn booking_rows(
    schema: &Arc<Vec<FieldInfo>>,
    bookings: Vec<Booking>,
) -> Vec<PgWireResult<DataRow>> {
    bookings
        .into_iter()
        .map(|b| {
            let mut encoder = DataRowEncoder::new(schema.clone());
            encoder.encode_field(&b.id.to_string())?;
            encoder.encode_field(&b.employee_id.to_string())?;
            encoder.encode_field(&b.service_id.to_string())?;
            encoder.encode_field(&b.span.start)?;
            encoder.encode_field(&b.span.end)?;
            encoder.encode_field(&b.status.as_str().to_string())?;
            encoder.encode_field(&b.customer.name)?;
            encoder.encode_field(&b.customer.phone)?;
            encoder.encode_field(&b.customer.address)?;
            encoder.encode_field(&b.customer.notes)?;
            encoder.encode_field(&b.created_at)?;
            Ok(encoder.take_row())
        })
        .collect()
}

#[async_trait]
impl SimpleQueryHandler for SlotdHandler {
    async fn do_query<C>(&self, client: &mut C, query: &str) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let engine = self.resolve_engine(client)?;
        let role = resolve_role(client);
        self.flush_notifications(client).await?;

        let cmd = sql::parse_sql(query).map_err(sql_err)?;
        metrics::counter!(
            observability::QUERIES_TOTAL,
            "command" => observability::command_label(&cmd)
        )
        .increment(1);

        let started = Instant::now();
        let result = self.execute_command(&engine, role, cmd).await;
        metrics::histogram!(observability::QUERY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct SlotdQueryParser;

#[async_trait]
impl QueryParser for SlotdQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        _column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(schema_for(&stmt.to_uppercase()))
    }
}

/// Best-effort schema prediction for Describe, keyed on table keywords.
/// Booking INSERTs answer with a decision row, like the availability probe.
fn schema_for(sql_upper: &str) -> Vec<FieldInfo> {
    if sql_upper.contains("AVAILABILITY") {
        decision_schema()
    } else if sql_upper.contains("INSERT") && sql_upper.contains("BOOKINGS") {
        decision_schema()
    } else if sql_upper.contains("SELECT") && sql_upper.contains("SLOTS") {
        slots_schema()
    } else if sql_upper.contains("SELECT") && sql_upper.contains("EMPLOYEES") {
        employees_schema()
    } else if sql_upper.contains("SELECT") && sql_upper.contains("SERVICES") {
        services_schema()
    } else if sql_upper.contains("SELECT") && sql_upper.contains("BOOKINGS") {
        bookings_schema()
    } else {
        vec![]
    }
}

#[async_trait]
impl ExtendedQueryHandler for SlotdHandler {
    type Statement = String;
    type QueryParser = SlotdQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let engine = self.resolve_engine(client)?;
        let role = resolve_role(client);
        self.flush_notifications(client).await?;

        let sql = substitute_params(portal);
        let cmd = sql::parse_sql(&sql).map_err(sql_err)?;
        metrics::counter!(
            observability::QUERIES_TOTAL,
            "command" => observability::command_label(&cmd)
        )
        .increment(1);

        let started = Instant::now();
        let result = self.execute_command(&engine, role, cmd).await;
        metrics::histogram!(observability::QUERY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        let mut responses = result?;
        Ok(responses.remove(0))
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        let schema = schema_for(&target.statement.to_uppercase());
        Ok(DescribeStatementResponse::new(param_types, schema))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let schema = schema_for(&target.statement.statement.to_uppercase());
        Ok(DescribePortalResponse::new(schema))
    }
}

/// Count the highest $N parameter placeholder in the SQL string.
fn count_params(sql: &str) -> usize {
    let mut highest = 0usize;
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i > start {
                if let Ok(n) = sql[start..i].parse::<usize>() {
                    highest = highest.max(n);
                }
            }
        } else {
            i += 1;
        }
    }
    highest
}

/// Substitute $1, $2, ... placeholders with bound parameter values (text format).
fn substitute_params(portal: &Portal<String>) -> String {
    let sql = portal.statement.statement.to_string();
    let params = &portal.parameters;
    let mut result = sql;

    for (i, param) in params.iter().enumerate().rev() {
        let placeholder = format!("${}", i + 1);
        let value = match param {
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                format!("'{}'", text.replace('\'', "''"))
            }
            None => "NULL".to_string(),
        };
        result = result.replace(&placeholder, &value);
    }

    result
}

// ── Factory ──────────────────────────────────────────────────────

pub struct SlotdFactory {
    handler: Arc<SlotdHandler>,
    auth_handler:
        Arc<CleartextPasswordAuthStartupHandler<SlotdAuthSource, DefaultServerParameterProvider>>,
    noop: Arc<NoopHandler>,
}

impl SlotdFactory {
    pub fn new(shops: Arc<ShopDirectory>, auth: AuthConfig) -> Self {
        let auth_source = SlotdAuthSource::new(auth);
        let param_provider = DefaultServerParameterProvider::default();
        Self {
            handler: Arc::new(SlotdHandler::new(shops)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(
                auth_source,
                param_provider,
            )),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for SlotdFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Drive one client connection end to end. Every connection gets its own
/// handler, so LISTEN subscriptions die with the socket.
pub async fn process_connection(
    socket: TcpStream,
    shops: Arc<ShopDirectory>,
    auth: AuthConfig,
    tls: Option<TlsAcceptor>,
) -> std::io::Result<()> {
    let factory = Arc::new(SlotdFactory::new(shops, auth));
    process_socket(socket, tls, factory).await
}

fn engine_err(e: crate::engine::EngineError) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "P0001".into(),
        e.to_string(),
    )))
}

fn sql_err(e: crate::sql::SqlError) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "42601".into(),
        e.to_string(),
    )))
}
