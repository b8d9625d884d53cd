use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;

use groove_store::Transport;

use crate::catalog::Catalog;

/// Background thread purging expired sessions on an interval. Dropping
/// the sweeper stops the thread and waits for it.
pub struct SessionSweeper {
    shutdown: Arc<AtomicBool>,
    notify: Arc<(Mutex<()>, Condvar)>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SessionSweeper {
    pub fn spawn<T>(catalog: Arc<Catalog<T>>, interval: Duration) -> Self
    where
        T: Transport + Send + Sync + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let notify = Arc::new((Mutex::new(()), Condvar::new()));
        let sweep_flag = Arc::clone(&shutdown);
        let sweep_notify = Arc::clone(&notify);
        let handle = thread::spawn(move || {
            loop {
                let (lock, cvar) = &*sweep_notify;
                let guard = lock.lock().unwrap();
                let _ = cvar.wait_timeout(guard, interval).unwrap();
                if sweep_flag.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(error) = catalog.purge_expired_sessions(Utc::now()) {
                    tracing::error!(%error, "session sweep failed");
                }
            }
        });

        Self {
            shutdown,
            notify,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.notify.1.notify_one();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for SessionSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
