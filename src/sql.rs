use sqlparser::ast::{
    self, Expr, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value, ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::model::*;

/// Parsed command from SQL input.
///
/// The dialect is deliberately small: positional INSERTs, single-row UPDATEs
/// by id, and a handful of virtual tables for reads. There is no DELETE;
/// catalog rows are retired with `active = false` and bookings by status.
#[derive(Debug, PartialEq)]
pub enum Command {
    CreateEmployee {
        id: Ulid,
        name: String,
        photo_url: String,
        specialties: String,
        bio: String,
    },
    UpdateEmployee {
        id: Ulid,
        update: EmployeeUpdate,
    },
    CreateService {
        id: Ulid,
        name: String,
        description: String,
        price_cents: i64,
        duration_minutes: i64,
    },
    UpdateService {
        id: Ulid,
        update: ServiceUpdate,
    },
    BookAppointment {
        request: BookingRequest,
    },
    SetBookingStatus {
        id: Ulid,
        status: BookingStatus,
    },
    CheckAvailability {
        employee_id: Ulid,
        service_id: Ulid,
        start: Ms,
    },
    ListSlots {
        employee_id: Ulid,
        service_id: Ulid,
        day: Ms,
    },
    ListEmployees {
        include_inactive: bool,
    },
    ListServices {
        include_inactive: bool,
    },
    ListBookings {
        employee_id: Ulid,
        day: Ms,
    },
    RecentBookings,
    Listen {
        channel: String,
    },
    /// `None` unsubscribes from every channel (`UNLISTEN *`).
    Unlisten {
        channel: Option<String>,
    },
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    // LISTEN/UNLISTEN carry a bare channel name, handled before the parser.
    let trimmed = sql.trim();
    let upper = trimmed.to_uppercase();
    if upper.starts_with("LISTEN ") {
        let channel = channel_name(&trimmed[7..]);
        return Ok(Command::Listen { channel });
    }
    if upper.starts_with("UNLISTEN") {
        let rest = channel_name(&trimmed[8..]);
        let channel = match rest.as_str() {
            "" | "*" => None,
            _ => Some(rest),
        };
        return Ok(Command::Unlisten { channel });
    }

    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    if stmts.is_empty() {
        return Err(SqlError::Empty);
    }

    match &stmts[0] {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(table, assignments, selection),
        Statement::Query(query) => parse_select(query),
        Statement::Delete(_) => Err(SqlError::Unsupported(
            "DELETE; retire rows with UPDATE ... SET active = false".into(),
        )),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

fn channel_name(raw: &str) -> String {
    raw.trim().trim_end_matches(';').trim().trim_matches('"').to_string()
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    let values = extract_insert_values(insert)?;

    match table.as_str() {
        "employees" => {
            if values.len() != 5 {
                return Err(SqlError::WrongArity("employees", 5, values.len()));
            }
            Ok(Command::CreateEmployee {
                id: parse_ulid_expr(&values[0])?,
                name: parse_string(&values[1])?,
                photo_url: parse_string_or_empty(&values[2])?,
                specialties: parse_string_or_empty(&values[3])?,
                bio: parse_string_or_empty(&values[4])?,
            })
        }
        "services" => {
            if values.len() != 5 {
                return Err(SqlError::WrongArity("services", 5, values.len()));
            }
            Ok(Command::CreateService {
                id: parse_ulid_expr(&values[0])?,
                name: parse_string(&values[1])?,
                description: parse_string_or_empty(&values[2])?,
                price_cents: parse_i64_expr(&values[3])?,
                duration_minutes: parse_i64_expr(&values[4])?,
            })
        }
        "bookings" => {
            if values.len() != 8 {
                return Err(SqlError::WrongArity("bookings", 8, values.len()));
            }
            Ok(Command::BookAppointment {
                request: BookingRequest {
                    id: parse_ulid_expr(&values[0])?,
                    employee_id: parse_ulid_expr(&values[1])?,
                    service_id: parse_ulid_expr(&values[2])?,
                    start: parse_i64_expr(&values[3])?,
                    customer: Customer {
                        name: parse_string(&values[4])?,
                        phone: parse_string(&values[5])?,
                        address: parse_string(&values[6])?,
                        notes: parse_string_or_null(&values[7])?,
                    },
                },
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(&table.relation)?;
    let id = extract_where_id(selection)?;

    match table.as_str() {
        "employees" => {
            let mut update = EmployeeUpdate::default();
            for a in assignments {
                match assignment_column(a)?.as_str() {
                    "name" => update.name = Some(parse_string(&a.value)?),
                    "photo_url" => update.photo_url = Some(parse_string_or_empty(&a.value)?),
                    "specialties" => update.specialties = Some(parse_string_or_empty(&a.value)?),
                    "bio" => update.bio = Some(parse_string_or_empty(&a.value)?),
                    "active" => update.active = Some(parse_bool(&a.value)?),
                    other => return Err(SqlError::UnknownColumn(other.to_string())),
                }
            }
            Ok(Command::UpdateEmployee { id, update })
        }
        "services" => {
            let mut update = ServiceUpdate::default();
            for a in assignments {
                match assignment_column(a)?.as_str() {
                    "name" => update.name = Some(parse_string(&a.value)?),
                    "description" => update.description = Some(parse_string_or_empty(&a.value)?),
                    "price_cents" => update.price_cents = Some(parse_i64_expr(&a.value)?),
                    "duration_minutes" => {
                        update.duration_minutes = Some(parse_i64_expr(&a.value)?)
                    }
                    "active" => update.active = Some(parse_bool(&a.value)?),
                    other => return Err(SqlError::UnknownColumn(other.to_string())),
                }
            }
            Ok(Command::UpdateService { id, update })
        }
        "bookings" => {
            let mut status = None;
            for a in assignments {
                match assignment_column(a)?.as_str() {
                    "status" => status = Some(parse_status(&a.value)?),
                    other => return Err(SqlError::UnknownColumn(other.to_string())),
                }
            }
            Ok(Command::SetBookingStatus {
                id,
                status: status.ok_or(SqlError::MissingFilter("status"))?,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    let mut filters = Filters::default();
    if let Some(selection) = &select.selection {
        collect_filters(selection, &mut filters)?;
    }

    match table.as_str() {
        "availability" => Ok(Command::CheckAvailability {
            employee_id: filters.employee_id.ok_or(SqlError::MissingFilter("employee_id"))?,
            service_id: filters.service_id.ok_or(SqlError::MissingFilter("service_id"))?,
            start: filters.start.ok_or(SqlError::MissingFilter("start"))?,
        }),
        "slots" => Ok(Command::ListSlots {
            employee_id: filters.employee_id.ok_or(SqlError::MissingFilter("employee_id"))?,
            service_id: filters.service_id.ok_or(SqlError::MissingFilter("service_id"))?,
            day: filters.day.ok_or(SqlError::MissingFilter("day"))?,
        }),
        "employees" => Ok(Command::ListEmployees {
            include_inactive: filters.include_inactive.unwrap_or(false),
        }),
        "services" => Ok(Command::ListServices {
            include_inactive: filters.include_inactive.unwrap_or(false),
        }),
        "bookings" => Ok(Command::ListBookings {
            employee_id: filters.employee_id.ok_or(SqlError::MissingFilter("employee_id"))?,
            day: filters.day.ok_or(SqlError::MissingFilter("day"))?,
        }),
        "recent_bookings" => Ok(Command::RecentBookings),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

#[derive(Default)]
struct Filters {
    employee_id: Option<Ulid>,
    service_id: Option<Ulid>,
    start: Option<Ms>,
    day: Option<Ms>,
    include_inactive: Option<bool>,
}

/// WHERE clauses are conjunctions of `column = value` pairs, nothing more.
fn collect_filters(expr: &Expr, out: &mut Filters) -> Result<(), SqlError> {
    match expr {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::And,
            right,
        } => {
            collect_filters(left, out)?;
            collect_filters(right, out)?;
        }
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } => match expr_column_name(left).as_deref() {
            Some("employee_id") => out.employee_id = Some(parse_ulid_expr(right)?),
            Some("service_id") => out.service_id = Some(parse_ulid_expr(right)?),
            Some("start") => out.start = Some(parse_i64_expr(right)?),
            Some("day") => out.day = Some(parse_i64_expr(right)?),
            Some("include_inactive") => out.include_inactive = Some(parse_bool(right)?),
            Some(other) => return Err(SqlError::UnknownColumn(other.to_string())),
            None => return Err(SqlError::Parse("expected column = value".into())),
        },
        Expr::Nested(inner) => collect_filters(inner, out)?,
        _ => return Err(SqlError::Unsupported("filter expression".into())),
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_values(insert: &ast::Insert) -> Result<Vec<Expr>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.as_slice() {
            [] => Err(SqlError::Parse("empty VALUES".into())),
            [row] => Ok(row.clone()),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn assignment_column(a: &ast::Assignment) -> Result<String, SqlError> {
    match &a.target {
        ast::AssignmentTarget::ColumnName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty column name".into()))
        }
        _ => Err(SqlError::Parse("unsupported assignment target".into())),
    }
}

fn extract_where_id(selection: &Option<Expr>) -> Result<Ulid, SqlError> {
    let sel = selection.as_ref().ok_or(SqlError::MissingFilter("id"))?;
    match sel {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } => {
            if expr_column_name(left).as_deref() == Some("id") {
                parse_ulid_expr(right)
            } else {
                Err(SqlError::MissingFilter("id"))
            }
        }
        _ => Err(SqlError::MissingFilter("id")),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_ulid_expr(expr: &Expr) -> Result<Ulid, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::SingleQuotedString(s) | Value::Number(s, _) => {
                Ulid::from_string(s).map_err(|e| SqlError::Parse(format!("bad ULID: {e}")))
            }
            _ => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_i64_expr(expr: &Expr) -> Result<i64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
            Value::SingleQuotedString(s) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_i64_expr(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_string(expr: &Expr) -> Result<String, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::SingleQuotedString(s) => Ok(s.clone()),
            _ => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_string_or_empty(expr: &Expr) -> Result<String, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(String::new()),
        _ => parse_string(expr),
    }
}

fn parse_string_or_null(expr: &Expr) -> Result<Option<String>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        _ => Ok(Some(parse_string(expr)?)),
    }
}

fn parse_status(expr: &Expr) -> Result<BookingStatus, SqlError> {
    let s = parse_string(expr)?;
    BookingStatus::parse(&s).ok_or_else(|| SqlError::Parse(format!("unknown status: {s}")))
}

fn parse_bool(expr: &Expr) -> Result<bool, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::SingleQuotedString(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(SqlError::Parse(format!("bad bool: {s}"))),
            },
            Value::Number(n, _) => Ok(n != "0"),
            _ => Err(SqlError::Parse(format!("expected bool, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    UnknownColumn(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::UnknownColumn(c) => write!(f, "unknown column: {c}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}
