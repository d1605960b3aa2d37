use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

// Unique database name per pool so independent tests never share state.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

// Returns a sqlite pool backed by a private in-memory database, usable from
// `#[tokio::test(start_paused = true)]` tests.
//
// Two facts about sqlx-on-tokio make the naive setup deadlock under a paused
// clock:
//
//   * sqlx's `acquire` wraps the whole acquisition in `tokio::time::timeout`.
//     Whenever acquisition has to *wait* (park), the paused clock has no other
//     work to drive and auto-advances straight to that timeout, producing a
//     spurious `PoolTimedOut` long before the real work would finish.
//   * A connection returned to the pool is handed back by a spawned task that
//     first runs a ROLLBACK round-trip to the connection's worker thread. With a
//     single pooled connection, the next `acquire` parks waiting for that return
//     and hits the auto-advance described above.
//
// The fixes, all confined to this test harness:
//
//   * Establish the pool on a dedicated thread with its own *real-time* runtime,
//     and keep that runtime alive for the life of the process. Opening a
//     connection (spawning the worker thread, opening the DB) takes long enough
//     that doing it on the paused runtime would itself auto-advance to the
//     timeout. Keeping the runtime alive keeps the connections — and the
//     in-memory database — open.
//   * Use a named, shared-cache in-memory database so several connections can
//     share one logical database, and pre-open a handful of them
//     (`min_connections == max_connections`). A test's `acquire` then always
//     finds a ready idle connection and completes on its first poll, so the
//     acquire timeout never gets a chance to fire even while another connection
//     is mid-return.
//   * Disable `test_before_acquire`: the pinned in-memory connections never go
//     stale, and the liveness ping would otherwise park the paused runtime.
pub async fn sqlite_pool() -> SqlitePool {
    let id = DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let url = format!("sqlite:file:studybell_test_{id}?mode=memory&cache=shared");

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("pool runtime should build");
        let pool = rt.block_on(async {
            let pool = SqlitePoolOptions::new()
                .min_connections(5)
                .max_connections(5)
                .test_before_acquire(false)
                .connect(&url)
                .await
                .expect("in-memory sqlite should open");
            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("migrations should apply");

            pool
        });
        tx.send(pool).expect("pool hand-off should succeed");
        // Keep the runtime — and thus the open connections and their shared
        // in-memory database — alive for the remainder of the process.
        rt.block_on(std::future::pending::<()>());
    });

    rx.recv().expect("pool setup thread should deliver a pool")
}
