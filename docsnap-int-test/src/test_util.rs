use docsnap::backend::MemoryBackend;
use docsnap::common::Timestamp;
use docsnap::errors::SnapshotResult;
use docsnap::store::Store;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Server time, in seconds, of a fresh [TestContext].
pub const START_SECONDS: i64 = 1_700_000_000;

/// Runs `test` against the context built by `before`, then `after`, which
/// also runs when the test fails. Panics with the first error.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> SnapshotResult<()>,
    B: Fn() -> SnapshotResult<TestContext>,
    A: Fn(TestContext) -> SnapshotResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let test_result = test(ctx.clone());
    let after_result = after(ctx);

    if let Err(e) = test_result {
        panic!("Test failed: {:?}", e);
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// A store over a fresh in-memory backend whose server clock only moves
/// when the test says so.
#[derive(Clone)]
pub struct TestContext {
    store: Store,
    backend: MemoryBackend,
    clock: Arc<AtomicI64>,
}

impl TestContext {
    pub fn store(&self) -> Store {
        self.store.clone()
    }

    pub fn backend(&self) -> MemoryBackend {
        self.backend.clone()
    }

    /// The time the backend will stamp on the next write.
    pub fn now(&self) -> Timestamp {
        Timestamp::from_seconds(self.clock.load(Ordering::SeqCst))
    }

    /// [TestContext::now] as a `chrono` date.
    pub fn now_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.clock.load(Ordering::SeqCst), 0)
    }

    pub fn advance_clock(&self, seconds: i64) {
        self.clock.fetch_add(seconds, Ordering::SeqCst);
    }
}

pub fn create_test_context() -> SnapshotResult<TestContext> {
    let clock = Arc::new(AtomicI64::new(START_SECONDS));
    let source = clock.clone();
    let backend = MemoryBackend::with_clock(Arc::new(move || {
        Timestamp::from_seconds(source.load(Ordering::SeqCst))
    }));
    let store = Store::builder().backend(backend.clone()).build()?;
    Ok(TestContext {
        store,
        backend,
        clock,
    })
}

/// Fails the test when a listener registration was left behind.
pub fn cleanup(ctx: TestContext) -> SnapshotResult<()> {
    if ctx.backend().has_listeners() {
        log::error!("Test left listeners registered");
        return Err(docsnap::errors::SnapshotError::new(
            "Test left listeners registered",
            docsnap::errors::ErrorKind::InvalidOperation,
        ));
    }
    Ok(())
}

/// Blocks until `check` holds, failing after `timeout_ms`.
pub fn wait_for<F: Fn() -> bool>(timeout_ms: u64, check: F) {
    awaitility::at_most(Duration::from_millis(timeout_ms)).until(check);
}
