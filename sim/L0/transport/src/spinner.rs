//! Background delivery thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::bus::Bus;
use crate::error::{Result, TransportError};

/// Upper bound on how long the spinner sleeps without a wake-up.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A thread that runs subscription callbacks as messages arrive.
///
/// Callbacks therefore execute concurrently with whatever thread steps the
/// simulation. Dropping the spinner stops and joins the thread.
#[derive(Debug)]
pub struct Spinner {
    bus: Bus,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub(crate) fn spawn(bus: Bus) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_bus = bus.clone();
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("bus-spinner".into())
            .spawn(move || spin_loop(&thread_bus, &thread_stop))
            .map_err(|e| TransportError::Spawn(e.to_string()))?;

        debug!("bus spinner started");
        Ok(Self {
            bus,
            stop,
            handle: Some(handle),
        })
    }

    /// Returns true while the thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        self.bus.notify();
        if handle.join().is_err() {
            warn!("bus spinner panicked");
        } else {
            debug!("bus spinner stopped");
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spin_loop(bus: &Bus, stop: &AtomicBool) {
    let inner = bus.inner();
    let mut seen = 0_u64;
    while !stop.load(Ordering::Acquire) {
        {
            let mut generation = inner.generation.lock();
            if *generation == seen {
                inner.wake.wait_for(&mut generation, POLL_INTERVAL);
            }
            seen = *generation;
        }
        bus.spin_once();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Instant;

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_spinner_delivers_in_background() {
        let bus = Bus::new();
        let latest = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&latest);
        let _sub = bus
            .subscribe::<f32, _>("/flap_frequency", 10, move |v| *sink.lock() = Some(v))
            .unwrap();

        let spinner = bus.spawn_spinner().unwrap();
        assert!(spinner.is_running());

        bus.advertise::<f32>("/flap_frequency").unwrap().publish(4.0);
        assert!(wait_until(|| *latest.lock() == Some(4.0)));

        spinner.stop();
    }

    #[test]
    fn test_drop_joins_thread() {
        let bus = Bus::new();
        let spinner = bus.spawn_spinner().unwrap();
        drop(spinner);
        // Publishing after shutdown is still accepted
        assert_eq!(
            bus.publish("/z_amplitude", crate::Payload::Float32(0.1)).unwrap(),
            0
        );
    }
}
