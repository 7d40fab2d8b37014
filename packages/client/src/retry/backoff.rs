//! Backoff delay calculation
//!
//! `Exponential` grows quadratically (`base * attempt^2`), not by powers of
//! two. Jitter only applies to a positive delay.

use std::str::FromStr;
use std::time::Duration;

use fastrand::Rng;
use serde::{Deserialize, Deserializer};

/// Base delay used when the retry options do not name one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Growth of the delay across attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackoffMode {
    /// `base`
    Fixed,
    /// `base * attempt`
    Linear,
    /// `base * attempt^2`
    #[default]
    Exponential,
    /// No delay at all
    None,
}

/// Randomization applied on top of the computed delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JitterMode {
    /// Use the delay as computed
    None,
    /// Uniform in `[0, delay)`
    #[default]
    Full,
    /// Uniform in `[delay / 2, delay)`
    Equal,
}

impl FromStr for BackoffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(BackoffMode::Fixed),
            "linear" => Ok(BackoffMode::Linear),
            "exponential" => Ok(BackoffMode::Exponential),
            "none" => Ok(BackoffMode::None),
            other => Err(format!("unknown backoff mode: {other}")),
        }
    }
}

impl FromStr for JitterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(JitterMode::None),
            "full" => Ok(JitterMode::Full),
            "equal" => Ok(JitterMode::Equal),
            other => Err(format!("unknown jitter mode: {other}")),
        }
    }
}

// Deserialization goes through `FromStr` so both accept the same spellings.
impl<'de> Deserialize<'de> for BackoffMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for JitterMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of uniformly distributed values in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl RandomSource for Rng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        self.f64()
    }
}

/// Delay before the retry that follows failed attempt `attempt` (1-based).
#[must_use]
pub fn compute_delay<R: RandomSource + ?Sized>(
    attempt: u32,
    base: Duration,
    mode: BackoffMode,
    jitter: JitterMode,
    rng: &mut R,
) -> Duration {
    let delay = match mode {
        BackoffMode::Fixed => base,
        BackoffMode::Linear => base.saturating_mul(attempt),
        BackoffMode::Exponential => base.saturating_mul(attempt).saturating_mul(attempt),
        BackoffMode::None => Duration::ZERO,
    };

    if delay.is_zero() {
        return delay;
    }

    match jitter {
        JitterMode::None => delay,
        JitterMode::Full => scale_below(delay, rng.next_f64()),
        JitterMode::Equal => {
            let half = delay / 2;
            (half + scale_below(delay - half, rng.next_f64())).min(below(delay))
        }
    }
}

/// `delay * factor`, kept strictly below `delay` for factors in `[0, 1)`.
fn scale_below(delay: Duration, factor: f64) -> Duration {
    let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };
    delay.mul_f64(factor).min(below(delay))
}

fn below(delay: Duration) -> Duration {
    delay.saturating_sub(Duration::from_nanos(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_f64(&mut self) -> f64 {
            self.0
        }
    }

    const BASE: Duration = Duration::from_millis(100);

    #[test]
    fn modes_without_jitter() {
        let mut rng = Fixed(0.5);
        for attempt in 1..=6u32 {
            assert_eq!(compute_delay(attempt, BASE, BackoffMode::Fixed, JitterMode::None, &mut rng), BASE);
            assert_eq!(
                compute_delay(attempt, BASE, BackoffMode::Linear, JitterMode::None, &mut rng),
                BASE * attempt
            );
            assert_eq!(
                compute_delay(attempt, BASE, BackoffMode::Exponential, JitterMode::None, &mut rng),
                BASE * attempt * attempt
            );
        }
    }

    #[test]
    fn none_mode_is_zero_for_every_jitter() {
        let mut rng = Fixed(0.9);
        for jitter in [JitterMode::None, JitterMode::Full, JitterMode::Equal] {
            assert_eq!(compute_delay(3, BASE, BackoffMode::None, jitter, &mut rng), Duration::ZERO);
        }
    }

    #[test]
    fn full_jitter_stays_below_delay() {
        let mut rng = Rng::with_seed(7);
        let delay = BASE * 9;
        for _ in 0..1_000 {
            let jittered = compute_delay(3, BASE, BackoffMode::Exponential, JitterMode::Full, &mut rng);
            assert!(jittered < delay);
        }
        assert_eq!(compute_delay(3, BASE, BackoffMode::Exponential, JitterMode::Full, &mut Fixed(0.0)), Duration::ZERO);
    }

    #[test]
    fn equal_jitter_stays_in_upper_half() {
        let mut rng = Rng::with_seed(11);
        let delay = BASE * 2;
        for _ in 0..1_000 {
            let jittered = compute_delay(2, BASE, BackoffMode::Linear, JitterMode::Equal, &mut rng);
            assert!(jittered >= delay / 2);
            assert!(jittered < delay);
        }
    }

    #[test]
    fn jitter_never_reaches_the_delay() {
        let almost_one = 1.0 - f64::EPSILON;
        let delay = compute_delay(1, BASE, BackoffMode::Fixed, JitterMode::Full, &mut Fixed(almost_one));
        assert!(delay < BASE);
        let delay = compute_delay(1, BASE, BackoffMode::Fixed, JitterMode::Equal, &mut Fixed(almost_one));
        assert!(delay < BASE);
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!("Linear".parse::<BackoffMode>(), Ok(BackoffMode::Linear));
        assert_eq!("equal".parse::<JitterMode>(), Ok(JitterMode::Equal));
        assert!("quadratic".parse::<BackoffMode>().is_err());
    }

    #[test]
    fn deserialization_accepts_the_same_spellings_as_parsing() {
        let backoff: BackoffMode = serde_json::from_value(serde_json::json!("Linear")).expect("known mode");
        assert_eq!(backoff, BackoffMode::Linear);
        let jitter: JitterMode = serde_json::from_value(serde_json::json!(" EQUAL ")).expect("known mode");
        assert_eq!(jitter, JitterMode::Equal);
        assert!(serde_json::from_value::<BackoffMode>(serde_json::json!("quadratic")).is_err());
    }
}
