//! Timed interpolation of parameter values.
//!
//! The host drives [`Animator::step`] from its paint timer. Each in-flight
//! interpolation moves a live value towards its target and finishes exactly
//! on the target.

use crate::doodle::DoodleId;
use crate::params::{NumericRange, ParamSpec, Range, round_to};
use serde::{Deserialize, Serialize};

/// Easing curves for parameter animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    #[default]
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// Animation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Time for an interpolation to reach its target. Zero disables animation.
    pub duration_secs: f64,
    pub ease: Ease,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 0.3,
            ease: Ease::default(),
        }
    }
}

impl AnimationConfig {
    pub fn is_enabled(&self) -> bool {
        self.duration_secs > 0.0
    }
}

/// One in-flight interpolation.
#[derive(Debug, Clone)]
struct Interpolation {
    doodle: DoodleId,
    parameter: &'static str,
    from: f64,
    /// Signed distance to travel; for angles this is the shortest way round.
    delta: f64,
    target: f64,
    precision: u32,
    wrap: Option<NumericRange>,
    elapsed: f64,
}

/// A live value written by one animation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub doodle: DoodleId,
    pub parameter: &'static str,
    pub value: f64,
}

/// Stepper owning every in-flight interpolation of a drawing.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    config: AnimationConfig,
    active: Vec<Interpolation>,
}

impl Animator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
        }
    }

    /// Start animating a parameter from its live value `from` to `target`.
    ///
    /// Replaces any interpolation already running for the same parameter.
    /// Returns false (and starts nothing) if animation is disabled or there
    /// is no distance to cover; the caller then assigns the target directly.
    pub fn start(&mut self, doodle: DoodleId, spec: &'static ParamSpec, from: f64, target: f64) -> bool {
        self.cancel(doodle, spec.name);
        if !self.config.is_enabled() {
            return false;
        }
        let wrap = match spec.range {
            Range::Modular(r) => Some(r),
            _ => None,
        };
        let mut delta = target - from;
        if let Some(r) = wrap {
            let span = r.max - r.min;
            delta = (delta + span / 2.0).rem_euclid(span) - span / 2.0;
        }
        if delta.abs() < f64::EPSILON {
            return false;
        }
        self.active.push(Interpolation {
            doodle,
            parameter: spec.name,
            from,
            delta,
            target,
            precision: spec.precision,
            wrap,
            elapsed: 0.0,
        });
        true
    }

    /// Stop animating one parameter, leaving its live value where it is.
    pub fn cancel(&mut self, doodle: DoodleId, parameter: &str) {
        self.active
            .retain(|a| !(a.doodle == doodle && a.parameter == parameter));
    }

    /// Stop every animation of a doodle.
    pub fn cancel_doodle(&mut self, doodle: DoodleId) {
        self.active.retain(|a| a.doodle != doodle);
    }

    /// Targets of every in-flight interpolation of a doodle.
    pub fn targets(&self, doodle: DoodleId) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.active
            .iter()
            .filter(move |a| a.doodle == doodle)
            .map(|a| (a.parameter, a.target))
    }

    pub fn is_animating(&self) -> bool {
        !self.active.is_empty()
    }

    /// Advance every interpolation by `dt` seconds.
    pub fn step(&mut self, dt: f64) -> Vec<Frame> {
        let duration = self.config.duration_secs;
        let ease = self.config.ease;
        let mut frames = Vec::with_capacity(self.active.len());

        for a in &mut self.active {
            a.elapsed += dt.max(0.0);
            let t = if duration > 0.0 { a.elapsed / duration } else { 1.0 };
            let value = if t >= 1.0 {
                a.target
            } else {
                let v = round_to(a.from + a.delta * ease.apply(t), a.precision);
                a.wrap.map_or(v, |r| r.wrap(v))
            };
            frames.push(Frame {
                doodle: a.doodle,
                parameter: a.parameter,
                value,
            });
        }

        self.active.retain(|a| a.elapsed < duration);
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSpec;
    use uuid::Uuid;

    static APEX: ParamSpec = ParamSpec::simple("apexY", -300.0, 0.0).animated();
    static ROTATION: ParamSpec = ParamSpec::angle("rotation").animated();

    fn linear(duration_secs: f64) -> Animator {
        Animator::new(AnimationConfig {
            duration_secs,
            ease: Ease::Linear,
        })
    }

    #[test]
    fn test_ease_endpoints_are_stable() {
        for ease in [
            Ease::Linear,
            Ease::InQuad,
            Ease::OutQuad,
            Ease::InOutQuad,
            Ease::InCubic,
            Ease::OutCubic,
            Ease::InOutCubic,
        ] {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
            assert!(ease.apply(0.25) < ease.apply(0.75));
        }
    }

    #[test]
    fn test_stops_exactly_at_target() {
        let mut animator = linear(1.0);
        let id = Uuid::new_v4();
        assert!(animator.start(id, &APEX, -100.0, -260.0));

        let frames = animator.step(0.5);
        assert_eq!(frames[0].value, -180.0);
        assert!(animator.is_animating());

        let frames = animator.step(0.7);
        assert_eq!(frames[0].value, -260.0);
        assert!(!animator.is_animating());
        assert!(animator.step(0.1).is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let mut animator = linear(1.0);
        let id = Uuid::new_v4();
        animator.start(id, &APEX, -100.0, -260.0);
        animator.step(0.5);
        animator.start(id, &APEX, -180.0, -200.0);
        let targets: Vec<_> = animator.targets(id).collect();
        assert_eq!(targets, vec![("apexY", -200.0)]);
    }

    #[test]
    fn test_disabled_or_zero_distance_does_not_start() {
        let id = Uuid::new_v4();
        assert!(!linear(0.0).start(id, &APEX, -100.0, -200.0));
        assert!(!linear(1.0).start(id, &APEX, -100.0, -100.0));
    }

    #[test]
    fn test_angles_take_the_short_way() {
        let mut animator = linear(1.0);
        let id = Uuid::new_v4();
        animator.start(id, &ROTATION, 0.1, std::f64::consts::TAU - 0.1);
        let frames = animator.step(0.5);
        // Halfway across zero, not halfway round the circle.
        assert!(frames[0].value.abs() < 1e-6 || (frames[0].value - std::f64::consts::TAU).abs() < 1e-6);
    }
}
