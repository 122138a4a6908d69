//! Stress test — concurrent users hammering `/api/calculate` to exercise the store and bridge.
//! Run with gateway up: cargo run --bin stress_test

use reqwest::Client;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const CONCURRENT_USERS: usize = 10;
const REQUESTS_PER_USER: usize = 5;

// Mix of "too easy" expressions (the persona tends to answer wrong) and longer chains.
const EXPRESSIONS: &[&str] = &[
    "2 + 2",
    "1 + 1",
    "7 × 6",
    "100 ÷ 0",
    "3.14159 × 2",
    "999 - 1000",
    "12 ÷ 4",
    "0.1 + 0.2",
    "123456 × 789",
    "5 - 5",
];

#[tokio::main]
async fn main() {
    let base_url = std::env::var("SNARKULATOR_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    println!(
        "[STRESS TEST] Starting: {} users × {} requests = {} total",
        CONCURRENT_USERS,
        REQUESTS_PER_USER,
        CONCURRENT_USERS * REQUESTS_PER_USER
    );
    println!("[STRESS TEST] Target: {} (ensure gateway is running)", base_url);

    let success = Arc::new(AtomicU32::new(0));
    let failure = Arc::new(AtomicU32::new(0));
    let fallbacks = Arc::new(AtomicU32::new(0));
    let latencies: Arc<RwLock<Vec<u64>>> = Arc::new(RwLock::new(Vec::new()));

    let client = Client::new();

    let mut handles = Vec::new();
    for user_id in 0..CONCURRENT_USERS {
        let client = client.clone();
        let base_url = base_url.clone();
        let success = Arc::clone(&success);
        let failure = Arc::clone(&failure);
        let fallbacks = Arc::clone(&fallbacks);
        let latencies = Arc::clone(&latencies);

        let h = tokio::spawn(async move {
            for r in 0..REQUESTS_PER_USER {
                let expression = EXPRESSIONS[(user_id + r) % EXPRESSIONS.len()];
                let start = Instant::now();
                let res = client
                    .post(format!("{}/api/calculate", base_url))
                    .json(&json!({ "expression": expression }))
                    .send()
                    .await;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                match res {
                    Ok(resp) if resp.status().is_success() => {
                        success.fetch_add(1, Ordering::Relaxed);
                        latencies.write().await.push(elapsed_ms);
                        let body: serde_json::Value = resp.json().await.unwrap_or_default();
                        if body["calculation"]["result"] == "ERROR" {
                            fallbacks.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    _ => {
                        failure.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });
        handles.push(h);
    }

    for h in handles {
        let _ = h.await;
    }

    let s = success.load(Ordering::Relaxed);
    let f = failure.load(Ordering::Relaxed);
    let fb = fallbacks.load(Ordering::Relaxed);
    let total = s + f;
    let success_rate = if total > 0 { (s as f64 / total as f64) * 100.0 } else { 0.0 };
    let latencies_guard = latencies.read().await;
    let avg_latency_ms = if latencies_guard.is_empty() {
        0.0
    } else {
        latencies_guard.iter().sum::<u64>() as f64 / latencies_guard.len() as f64
    };

    println!(
        "[STRESS TEST] Success rate: {:.1}% | Average Latency: {:.0}ms",
        success_rate, avg_latency_ms
    );
    println!(
        "[STRESS TEST] Total: {} | Success: {} | Failure: {} | Fallback replies: {}",
        total, s, f, fb
    );
    println!("[STRESS TEST] Check GET /api/calculations to confirm every expression was stored.");
}
