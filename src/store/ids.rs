use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha1::{Digest, Sha1};

static COUNTER: AtomicU64 = AtomicU64::new(0);
static SALT: OnceLock<u64> = OnceLock::new();

const SUFFIX_SPACE: u64 = 1 << 20;

pub fn form_id() -> String {
    generate("form")
}

pub fn field_id() -> String {
    generate("f")
}

pub fn submission_id() -> String {
    generate("sub")
}

/// `<prefix>_<millis>_<5 hex chars>`. The suffix is a per-process salt plus
/// a counter, so ids minted by one process never repeat a suffix before
/// 2^20 ids.
fn generate(prefix: &str) -> String {
    let millis = now().as_millis();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = (salt().wrapping_add(seq)) % SUFFIX_SPACE;

    format!("{}_{}_{:05x}", prefix, millis, suffix)
}

fn salt() -> u64 {
    *SALT.get_or_init(|| {
        let mut hasher = Sha1::new();
        hasher.update(now().as_nanos().to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    })
}

fn now() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}
