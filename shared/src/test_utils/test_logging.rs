use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

static INIT: Once = Once::new();

thread_local! {
    static CAPTURED: RefCell<Vec<CapturedLog>> = RefCell::new(Vec::new());
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLog {
    pub level: Level,
    pub message: String,
}

/// Records every log line for the current thread, then forwards to env_logger
struct CapturingLogger {
    inner: env_logger::Logger,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|captured| {
            captured.borrow_mut().push(CapturedLog {
                level: record.level(),
                message: record.args().to_string(),
            })
        });

        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs the capturing logger once per process and clears this thread's
/// captured lines. Output printed to the console follows `RUST_LOG`
/// (default `warn`).
///
/// `#[tokio::test]` runs on the current thread, so lines logged by the code
/// under test are visible through [`captured_logs`].
pub fn init_test_logging() {
    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("warn");
        let inner = env_logger::Builder::from_env(env).is_test(true).build();

        if log::set_boxed_logger(Box::new(CapturingLogger { inner })).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    clear_captured_logs();
}

pub fn captured_logs() -> Vec<CapturedLog> {
    CAPTURED.with(|captured| captured.borrow().clone())
}

pub fn clear_captured_logs() {
    CAPTURED.with(|captured| captured.borrow_mut().clear());
}

/// True if a line at `level` containing `needle` was logged on this thread
pub fn logged(level: Level, needle: &str) -> bool {
    captured_logs()
        .iter()
        .any(|line| line.level == level && line.message.contains(needle))
}
