//! Time control for move generation.
//!
//! The accepted grammar is the engine's classic one:
//! - `=NUM` fixed number of simulations per move
//! - `NUM` seconds per move (may be fractional)
//! - `_NUM` seconds for the whole game
//! - empty string: engine default

use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::Error;

/// Parsed time specification.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum TimeSpec {
    #[default]
    Default,
    Simulations(usize),
    PerMove(Duration),
    PerGame(Duration),
}

fn invalid(s: &str) -> Error {
    Error::InvalidTimeSpec(format!(
        "Invalid timekeeping specification: {s}\n\
         Format:\n\
         *   =NUM - fixed number of simulations per move\n\
         *   NUM - number of seconds to spend per move (can be fractional)\n\
         *   _NUM - number of seconds to spend per game"
    ))
}

fn parse_seconds(s: &str, whole: &str) -> Result<Duration, Error> {
    let secs: f64 = s.parse().map_err(|_| invalid(whole))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid(whole));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid(whole))
}

impl FromStr for TimeSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() {
            return Ok(TimeSpec::Default);
        }
        if let Some(n) = t.strip_prefix('=') {
            return match n.parse::<usize>() {
                Ok(sims) if sims > 0 => Ok(TimeSpec::Simulations(sims)),
                _ => Err(invalid(s)),
            };
        }
        if let Some(n) = t.strip_prefix('_') {
            return parse_seconds(n, s).map(TimeSpec::PerGame);
        }
        parse_seconds(t, s).map(TimeSpec::PerMove)
    }
}

/// How much work a single `genmove` may do.
#[derive(Copy, Clone, Debug)]
pub enum Budget {
    Sims(usize),
    Until(Instant),
}

impl Budget {
    /// Deadline `d` from now. A deadline past what `Instant` can hold never
    /// arrives, so it becomes an unlimited simulation count.
    fn after(d: Duration) -> Budget {
        Instant::now()
            .checked_add(d)
            .map_or(Budget::Sims(usize::MAX), Budget::Until)
    }

    /// Whether `done` iterations exhaust the budget.
    pub fn exhausted(&self, done: usize) -> bool {
        match *self {
            Budget::Sims(n) => done >= n,
            Budget::Until(deadline) => done > 0 && Instant::now() >= deadline,
        }
    }

    /// Simulation cap, if the budget is count-based.
    pub fn sims(&self) -> Option<usize> {
        match *self {
            Budget::Sims(n) => Some(n),
            Budget::Until(_) => None,
        }
    }
}

/// Tracks the remaining whole-game time for `_NUM` specifications.
#[derive(Debug, Default)]
pub struct Clock {
    used: Duration,
}

impl Clock {
    /// Turn a specification into a budget for the next move.
    ///
    /// A whole-game budget is spread over an estimate of the moves left,
    /// half the empty points but never fewer than ten.
    pub fn budget(&self, spec: &TimeSpec, default_sims: usize, empty_points: usize) -> Budget {
        match *spec {
            TimeSpec::Default => Budget::Sims(default_sims),
            TimeSpec::Simulations(n) => Budget::Sims(n),
            TimeSpec::PerMove(d) => Budget::after(d),
            TimeSpec::PerGame(total) => {
                let left = total.saturating_sub(self.used);
                let moves_left = (empty_points / 2).max(10) as u32;
                Budget::after(left / moves_left)
            }
        }
    }

    pub fn charge(&mut self, elapsed: Duration) {
        self.used += elapsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("".parse::<TimeSpec>().unwrap(), TimeSpec::Default);
        assert_eq!("=100".parse::<TimeSpec>().unwrap(), TimeSpec::Simulations(100));
        assert_eq!(
            "1.5".parse::<TimeSpec>().unwrap(),
            TimeSpec::PerMove(Duration::from_millis(1500))
        );
        assert_eq!(
            "_2400".parse::<TimeSpec>().unwrap(),
            TimeSpec::PerGame(Duration::from_secs(2400))
        );
    }

    #[test]
    fn test_invalid_forms_describe_grammar() {
        for bad in ["=", "=abc", "=0", "_", "fast", "-3", "_-1", "1e30", "_1e30", "inf"] {
            match bad.parse::<TimeSpec>() {
                Err(Error::InvalidTimeSpec(msg)) => {
                    assert!(msg.contains("=NUM"), "message should list formats: {msg}");
                    assert!(msg.contains("_NUM"));
                }
                other => panic!("{bad:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_budget_exhaustion() {
        assert!(!Budget::Sims(3).exhausted(2));
        assert!(Budget::Sims(3).exhausted(3));
        let past = Budget::Until(Instant::now());
        assert!(!past.exhausted(0), "at least one iteration always runs");
        assert!(past.exhausted(1));
    }

    #[test]
    fn test_huge_durations_do_not_overflow() {
        let clock = Clock::default();
        for spec in ["1e19", "_1e19"] {
            let spec: TimeSpec = spec.parse().unwrap();
            let budget = clock.budget(&spec, 10, 81);
            assert!(!budget.exhausted(1));
        }
    }

    #[test]
    fn test_game_clock_spreads_time() {
        let mut clock = Clock::default();
        let spec = TimeSpec::PerGame(Duration::from_secs(100));
        clock.charge(Duration::from_secs(100));
        match clock.budget(&spec, 10, 81) {
            Budget::Until(deadline) => assert!(deadline <= Instant::now() + Duration::from_millis(50)),
            Budget::Sims(_) => panic!("expected a deadline"),
        }
    }
}
