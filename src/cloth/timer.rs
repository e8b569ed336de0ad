//! Background ticking for native hosts.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use log::{debug, warn};
use parking_lot::Mutex;

use super::simulator::{ClothSimulator, ClothState};

enum TimerCommand {
    Halt,
}

struct Worker {
    tx: Sender<TimerCommand>,
    handle: JoinHandle<()>,
}

/// Ticks a shared [`ClothSimulator`] every `period` on its own thread.
///
/// `pause` and `stop` return only after the thread has exited, so no tick
/// runs once they return.
pub struct ClothTimer {
    simulator: Arc<Mutex<ClothSimulator>>,
    period: Duration,
    origin: Instant,
    worker: Option<Worker>,
}

impl ClothTimer {
    /// Ticks at the simulator's fixed step.
    pub fn new(simulator: ClothSimulator) -> Self {
        let period = simulator.cloth().params().fixed_step;
        Self::with_period(simulator, period)
    }

    pub fn with_period(simulator: ClothSimulator, period: Duration) -> Self {
        Self {
            simulator: Arc::new(Mutex::new(simulator)),
            period,
            origin: Instant::now(),
            worker: None,
        }
    }

    /// Shared handle for reading snapshots while the timer runs.
    pub fn simulator(&self) -> Arc<Mutex<ClothSimulator>> {
        Arc::clone(&self.simulator)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.simulator.lock().start(self.origin.elapsed());

        let (tx, rx) = channel::bounded(1);
        let simulator = Arc::clone(&self.simulator);
        let period = self.period;
        let origin = self.origin;
        let handle = thread::spawn(move || {
            loop {
                match rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        let mut sim = simulator.lock();
                        if sim.state() != ClothState::Running {
                            break;
                        }
                        sim.tick(origin.elapsed());
                    }
                    Ok(TimerCommand::Halt) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("cloth timer thread exiting");
        });
        self.worker = Some(Worker { tx, handle });
    }

    pub fn pause(&mut self) {
        self.halt();
        self.simulator.lock().pause(self.origin.elapsed());
    }

    pub fn stop(&mut self) {
        self.halt();
        self.simulator.lock().stop();
    }

    fn halt(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.tx.send(TimerCommand::Halt);
        if worker.handle.join().is_err() {
            warn!("cloth timer thread panicked");
        }
    }
}

impl Drop for ClothTimer {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloth::{ClothMesh, ClothParams};

    fn timer() -> ClothTimer {
        let cloth = ClothMesh::new(ClothParams::new(1.0, 1.0, 4, 4)).unwrap();
        ClothTimer::with_period(ClothSimulator::new(cloth), Duration::from_millis(2))
    }

    #[test]
    fn runs_until_paused() {
        let mut timer = timer();
        timer.start();
        assert!(timer.is_running());
        thread::sleep(Duration::from_millis(80));
        timer.pause();
        assert!(!timer.is_running());

        let sim = timer.simulator();
        let steps = sim.lock().steps();
        assert!(steps > 0);
        assert_eq!(sim.lock().state(), ClothState::Paused);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(sim.lock().steps(), steps);
    }

    #[test]
    fn stop_joins_and_resets() {
        let mut timer = timer();
        timer.start();
        thread::sleep(Duration::from_millis(20));
        timer.stop();
        assert!(!timer.is_running());
        let sim = timer.simulator();
        assert_eq!(sim.lock().state(), ClothState::Stopped);
        assert_eq!(sim.lock().elapsed(), Duration::ZERO);
    }
}
