//! Speed models
//!
//! Pure functions: the time-driven ramp depends only on the tick count and
//! the voice curve only on the loudness level.

/// Two-slope acceleration ramp
///
/// `v(t) = v_min + a1*t` up to `break_tick`, then
/// `v(t) = v_min + a1*break_tick + a2*(t - break_tick)`, capped at `v_max`.
/// The phase-1 term is carried over so the curve is continuous at the break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampParams {
    pub v_min: f32,
    pub v_max: f32,
    pub accel_phase1: f32,
    pub accel_phase2: f32,
    pub break_tick: u64,
}

/// `v = v_min + (v_max - v_min) * level^gamma`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceCurve {
    pub v_min: f32,
    pub v_max: f32,
    pub gamma: f32,
}

/// Speed model assigned to one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedModel {
    Ramp(RampParams),
    Voice(VoiceCurve),
}

impl SpeedModel {
    /// Speed for this tick. Each model ignores the input it does not use.
    pub fn speed(&self, tick: u64, level: f32) -> f32 {
        match self {
            SpeedModel::Ramp(ramp) => ramp_speed(ramp, tick),
            SpeedModel::Voice(curve) => voice_speed(curve, level),
        }
    }

    pub fn is_voice(&self) -> bool {
        matches!(self, SpeedModel::Voice(_))
    }
}

/// Time-driven speed at `tick` (0 = first tick of the session)
pub fn ramp_speed(ramp: &RampParams, tick: u64) -> f32 {
    let v = if tick <= ramp.break_tick {
        ramp.v_min + ramp.accel_phase1 * tick as f32
    } else {
        ramp.v_min
            + ramp.accel_phase1 * ramp.break_tick as f32
            + ramp.accel_phase2 * (tick - ramp.break_tick) as f32
    };
    v.min(ramp.v_max)
}

/// Loudness-driven speed. `level` is clamped to [0, 1].
pub fn voice_speed(curve: &VoiceCurve, level: f32) -> f32 {
    let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    let shaped = level.powf(curve.gamma);
    (curve.v_min + (curve.v_max - curve.v_min) * shaped).clamp(curve.v_min, curve.v_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> RampParams {
        RampParams {
            v_min: 0.05,
            v_max: 0.60,
            accel_phase1: 0.0014,
            accel_phase2: 0.0019,
            break_tick: 400,
        }
    }

    #[test]
    fn test_ramp_starts_at_v_min() {
        assert_eq!(ramp_speed(&ramp(), 0), 0.05);
    }

    #[test]
    fn test_ramp_phase_one() {
        let v = ramp_speed(&ramp(), 100);
        assert!((v - (0.05 + 0.14)).abs() < 1e-6);
    }

    #[test]
    fn test_ramp_continuous_at_break() {
        // Raise the cap so the break value (0.61) is not clipped
        let r = RampParams {
            v_max: 1.0,
            ..ramp()
        };
        let at_break = ramp_speed(&r, r.break_tick);
        let phase2_offset = r.v_min + r.accel_phase1 * r.break_tick as f32;
        assert!((at_break - phase2_offset).abs() < 1e-6);

        // First step past the break uses the steeper slope, no jump
        let next = ramp_speed(&r, r.break_tick + 1);
        assert!((next - at_break - r.accel_phase2).abs() < 1e-5);
    }

    #[test]
    fn test_ramp_caps_at_v_max() {
        assert_eq!(ramp_speed(&ramp(), 1_000_000), 0.60);
    }

    #[test]
    fn test_voice_curve_endpoints() {
        let curve = VoiceCurve {
            v_min: 0.03,
            v_max: 0.125,
            gamma: 1.6,
        };
        assert_eq!(voice_speed(&curve, 0.0), 0.03);
        assert!((voice_speed(&curve, 1.0) - 0.125).abs() < 1e-7);
        assert_eq!(voice_speed(&curve, 7.0), voice_speed(&curve, 1.0));
        assert_eq!(voice_speed(&curve, -1.0), 0.03);
        assert_eq!(voice_speed(&curve, f32::NAN), 0.03);
    }

    #[test]
    fn test_gamma_softens_mid_range() {
        let linear = VoiceCurve {
            v_min: 0.0,
            v_max: 1.0,
            gamma: 1.0,
        };
        let soft = VoiceCurve { gamma: 1.5, ..linear };
        assert!(voice_speed(&soft, 0.5) < voice_speed(&linear, 0.5));
    }

    #[test]
    fn test_model_dispatch() {
        let model = SpeedModel::Ramp(ramp());
        assert_eq!(model.speed(0, 1.0), 0.05);
        assert!(!model.is_voice());

        let model = SpeedModel::Voice(VoiceCurve {
            v_min: 0.1,
            v_max: 0.2,
            gamma: 1.0,
        });
        assert!((model.speed(9999, 0.5) - 0.15).abs() < 1e-6);
    }
}
