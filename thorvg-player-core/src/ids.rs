//! Process-unique identifiers for instances and requests.
//!
//! Ids are a base36 millisecond timestamp, a random suffix and a process-wide
//! sequence number, so two ids minted in the same millisecond still differ.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Unique id body, without a prefix.
pub fn generate_unique_id() -> String {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}{}",
        to_base36(now_millis()),
        &random[..9],
        to_base36(sequence)
    )
}

pub fn instance_id() -> String {
    format!("thorvg-{}", generate_unique_id())
}

pub fn request_id() -> String {
    format!("thorvg-request-{}", generate_unique_id())
}

pub fn wasm_url_request_id() -> String {
    format!("set-wasm-url-{}", generate_unique_id())
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(target_arch = "wasm32")]
fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
