//! Single-flight guard

use std::sync::atomic::{AtomicBool, Ordering};

/// Lets at most one poll sequence of an action run at a time
#[derive(Debug, Default)]
pub struct SingleFlight {
    running: AtomicBool,
}

impl SingleFlight {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Take the flag, or `None` if another sequence holds it
    pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                running: &self.running,
            })
    }

    pub fn is_held(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the flag when dropped
#[derive(Debug)]
pub struct FlightGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let flight = SingleFlight::new();
        let guard = flight.try_acquire();
        assert!(guard.is_some());
        assert!(flight.is_held());
        assert!(flight.try_acquire().is_none());

        drop(guard);
        assert!(!flight.is_held());
        assert!(flight.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_early_return() {
        fn run(flight: &SingleFlight, bail: bool) -> Option<()> {
            let _guard = flight.try_acquire()?;
            if bail {
                return None;
            }
            Some(())
        }

        let flight = SingleFlight::new();
        assert!(run(&flight, true).is_none());
        assert!(!flight.is_held());
        assert!(run(&flight, false).is_some());
        assert!(!flight.is_held());
    }
}
