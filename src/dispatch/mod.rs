pub mod http;
pub mod sse;

use std::future::Future;
use std::io::Write;

use crate::config::Config;
use crate::record::RequestRecord;

/// Performs one request and always returns a finalized record. Failures are
/// reported through the record, never as an error.
pub trait Executor {
    fn execute(&self, config: &Config, sequence: u32) -> impl Future<Output = RequestRecord> + Send;
}

/// Side channel for live output. Not part of any record.
pub trait ProgressSink: Send + Sync {
    fn on_start(&self, _sequence: u32, _total: u32) {}

    fn on_fragment(&self, sequence: u32, fragment: &str);

    fn on_finish(&self, _record: &RequestRecord) {}
}

/// Discards everything.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_fragment(&self, _sequence: u32, _fragment: &str) {}
}

/// Echoes fragments to stdout as they arrive.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_start(&self, sequence: u32, total: u32) {
        println!("\n===== Request {sequence}/{total} started =====");
    }

    fn on_fragment(&self, _sequence: u32, fragment: &str) {
        let mut out = std::io::stdout().lock();
        // Console echo is best effort.
        let _ = out.write_all(fragment.as_bytes());
        let _ = out.flush();
    }

    fn on_finish(&self, record: &RequestRecord) {
        let secs = record.duration.as_secs_f64();
        if record.is_success() {
            println!("\n===== Request {} finished in {secs:.3}s =====", record.sequence);
        } else {
            println!("\n===== Request {} failed in {secs:.3}s =====", record.sequence);
            if let Some(ref msg) = record.error_message {
                println!("{msg}");
            }
        }
    }
}
