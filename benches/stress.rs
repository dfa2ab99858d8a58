use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, Local, TimeZone};
use tokio_postgres::{Config, NoTls};
use ulid::Ulid;

// Requires a running server started with SLOTD_ADMIN_PASSWORD, since seeding
// the catalog is an admin operation. Every phase creates its own shops, so a
// run never interferes with another, but repeated runs against one server
// eventually hit the shop cap; restart the server between runs.

async fn connect(host: &str, port: u16, shop: &str, password: &str) -> tokio_postgres::Client {
    let mut config = Config::new();
    config
        .host(host)
        .port(port)
        .dbname(shop)
        .user("admin")
        .password(password);

    let (client, conn) = config.connect(NoTls).await.expect("connect failed");
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            eprintln!("connection error: {e}");
        }
    });
    client
}

/// Fresh shop with one employee and one 45-minute service.
async fn seed_shop(host: &str, port: u16, password: &str) -> (tokio_postgres::Client, Ulid, Ulid) {
    let shop = format!("bench_{}", Ulid::new());
    let client = connect(host, port, &shop, password).await;

    let employee_id = Ulid::new();
    let service_id = Ulid::new();
    client
        .batch_execute(&format!(
            "INSERT INTO employees (id, name, photo_url, specialties, bio) \
             VALUES ('{employee_id}', 'Bench', NULL, NULL, NULL)"
        ))
        .await
        .unwrap();
    client
        .batch_execute(&format!(
            "INSERT INTO services (id, name, description, price_cents, duration_minutes) \
             VALUES ('{service_id}', 'Cut', 'bench service', 4500, 45)"
        ))
        .await
        .unwrap();
    (client, employee_id, service_id)
}

/// 10:00 local on the i-th day after a fixed base date. Spreading bookings
/// across days keeps every one inside business hours and conflict-free.
fn slot_on_day(i: u64) -> i64 {
    let base = Local.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap();
    (base + Days::new(i)).timestamp_millis()
}

fn book_sql(employee_id: Ulid, service_id: Ulid, start: i64) -> String {
    format!(
        "INSERT INTO bookings (id, employee_id, service_id, start, customer_name, \
         customer_phone, customer_address, notes) \
         VALUES ('{}', '{employee_id}', '{service_id}', {start}, 'Load Test', '555-0000', \
         '1 Bench Way', NULL)",
        Ulid::new()
    )
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

async fn phase1_sequential(host: &str, port: u16, password: &str) {
    let (client, employee_id, service_id) = seed_shop(host, port, password).await;

    let n = 1000;
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();

    for i in 0..n {
        let t = Instant::now();
        client
            .batch_execute(&book_sql(employee_id, service_id, slot_on_day(i as u64)))
            .await
            .unwrap();
        latencies.push(t.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} bookings in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("write latency", &mut latencies);
}

async fn phase2_concurrent(host: &str, port: u16, password: &str) {
    let n_tasks = 10;
    let n_per_task = 200;

    let start = Instant::now();
    let mut handles = Vec::new();

    for _ in 0..n_tasks {
        let host = host.to_string();
        let password = password.to_string();
        handles.push(tokio::spawn(async move {
            let (client, employee_id, service_id) = seed_shop(&host, port, &password).await;
            for j in 0..n_per_task {
                client
                    .batch_execute(&book_sql(employee_id, service_id, slot_on_day(j as u64)))
                    .await
                    .unwrap();
            }
        }));
    }

    for h in handles {
        h.await.unwrap();
    }

    let elapsed = start.elapsed();
    let total = n_tasks * n_per_task;
    let ops = total as f64 / elapsed.as_secs_f64();
    println!(
        "  {n_tasks} shops x {n_per_task} bookings = {total} total in {:.2}s = {ops:.0} ops/sec",
        elapsed.as_secs_f64()
    );
}

async fn phase3_reads_under_load(host: &str, port: u16, password: &str) {
    // Writers keep booking in their own shops for the whole phase
    let stop = Arc::new(AtomicBool::new(false));
    let mut writer_handles = Vec::new();
    for _ in 0..5 {
        let host = host.to_string();
        let password = password.to_string();
        let stop = stop.clone();
        writer_handles.push(tokio::spawn(async move {
            let (client, employee_id, service_id) = seed_shop(&host, port, &password).await;
            let mut i = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let _ = client
                    .batch_execute(&book_sql(employee_id, service_id, slot_on_day(i)))
                    .await;
                i += 1;
            }
        }));
    }

    // Readers pull full day grids from their own pre-filled shops
    let n_readers = 10;
    let reads_per_reader = 300;
    let mut reader_handles = Vec::new();

    for _ in 0..n_readers {
        let host = host.to_string();
        let password = password.to_string();
        reader_handles.push(tokio::spawn(async move {
            let (client, employee_id, service_id) = seed_shop(&host, port, &password).await;
            for i in 0..50 {
                client
                    .batch_execute(&book_sql(employee_id, service_id, slot_on_day(i)))
                    .await
                    .unwrap();
            }

            let mut latencies = Vec::with_capacity(reads_per_reader);
            for i in 0..reads_per_reader {
                let t = Instant::now();
                client
                    .simple_query(&format!(
                        "SELECT * FROM slots WHERE employee_id = '{employee_id}' \
                         AND service_id = '{service_id}' AND day = {}",
                        slot_on_day((i % 50) as u64)
                    ))
                    .await
                    .unwrap();
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for h in reader_handles {
        all_latencies.extend(h.await.unwrap());
    }

    stop.store(true, Ordering::Relaxed);
    for h in writer_handles {
        let _ = h.await;
    }

    print_latency("slot grid query", &mut all_latencies);
}

async fn phase4_connection_storm(host: &str, port: u16, password: &str) {
    let n_conns = 50;
    let ops_per_conn = 10;

    let start = Instant::now();
    let mut handles = Vec::new();
    let success = Arc::new(AtomicUsize::new(0));

    for _ in 0..n_conns {
        let host = host.to_string();
        let password = password.to_string();
        let success = success.clone();
        handles.push(tokio::spawn(async move {
            let (client, employee_id, service_id) = seed_shop(&host, port, &password).await;
            for i in 0..ops_per_conn {
                client
                    .batch_execute(&book_sql(employee_id, service_id, slot_on_day(i as u64)))
                    .await
                    .unwrap();
            }
            success.fetch_add(1, Ordering::Relaxed);
        }));
    }

    for h in handles {
        let _ = h.await;
    }

    let elapsed = start.elapsed();
    let ok = success.load(Ordering::Relaxed);
    println!(
        "  {n_conns} connections, {ops_per_conn} bookings each: {ok}/{n_conns} succeeded in {:.2}s",
        elapsed.as_secs_f64()
    );
}

#[tokio::main]
async fn main() {
    let host = std::env::var("SLOTD_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("SLOTD_PORT")
        .unwrap_or_else(|_| "5433".into())
        .parse()
        .expect("invalid SLOTD_PORT");
    let password = std::env::var("SLOTD_ADMIN_PASSWORD").unwrap_or_else(|_| "adminpw".into());

    println!("=== slotd stress benchmark ===");
    println!("target: {host}:{port}\n");

    println!("[phase 1] sequential booking throughput");
    phase1_sequential(&host, port, &password).await;

    println!("\n[phase 2] concurrent bookings across shops");
    phase2_concurrent(&host, port, &password).await;

    println!("\n[phase 3] slot-grid reads under write load");
    phase3_reads_under_load(&host, port, &password).await;

    println!("\n[phase 4] connection storm");
    phase4_connection_storm(&host, port, &password).await;

    println!("\n=== benchmark complete ===");
}
