//! Seconds-until-next-poll display counter.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    period_secs: u64,
    remaining_secs: u64,
    suspended: bool,
}

impl Countdown {
    pub fn new(period_secs: u64) -> Self {
        Self {
            period_secs,
            remaining_secs: period_secs,
            suspended: false,
        }
    }

    /// Advance one second. Wraps to the full period after reaching zero.
    pub fn tick(&mut self) -> u64 {
        if !self.suspended {
            self.remaining_secs = match self.remaining_secs {
                0 => self.period_secs,
                n => n - 1,
            };
        }
        self.remaining_secs
    }

    /// Back to the full period; called when a cycle commits
    pub fn reset(&mut self) {
        self.remaining_secs = self.period_secs;
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn remaining(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_wraps() {
        let mut countdown = Countdown::new(2);
        assert_eq!(countdown.tick(), 1);
        assert_eq!(countdown.tick(), 0);
        assert_eq!(countdown.tick(), 2);
    }

    #[test]
    fn test_suspended_holds() {
        let mut countdown = Countdown::new(60);
        countdown.tick();
        countdown.suspend();
        assert_eq!(countdown.tick(), 59);
        assert_eq!(countdown.tick(), 59);

        countdown.resume();
        assert_eq!(countdown.tick(), 58);

        countdown.reset();
        assert_eq!(countdown.remaining(), 60);
    }
}
