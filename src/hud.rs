//! HUD readouts
//!
//! Derived, read-only numbers a renderer shows next to the track. Nothing here
//! feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::consts::{CLOSE_CALL_GAP, NEAR_FINISH_DISTANCE};
use crate::sim::{Agent, Role, TrackConfig};

/// Meter colour band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelBand {
    Low,
    Mid,
    High,
}

impl LevelBand {
    pub fn from_level(level: f32) -> Self {
        if level > 0.8 {
            LevelBand::High
        } else if level > 0.5 {
            LevelBand::Mid
        } else {
            LevelBand::Low
        }
    }
}

/// Lit cells of a `cells`-segment volume meter. Any audible level lights at least one.
pub fn meter_cells(level: f32, cells: usize) -> usize {
    let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    let lit = (level * cells as f32) as usize;
    if level > 0.0 && lit == 0 {
        1.min(cells)
    } else {
        lit.min(cells)
    }
}

/// Distances and alerts for the current positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    /// Distance from the leading pursuer to the trailing pursued (never negative)
    pub gap: f32,
    /// Distance left for the leading pursued; `None` without a finish line
    pub to_finish: Option<f32>,
    pub near_finish: bool,
    pub close_call: bool,
    pub band: LevelBand,
}

impl Hud {
    pub fn measure(agents: &[Agent], track: &TrackConfig, level: f32) -> Self {
        let positions = |role: Role| agents.iter().filter(move |a| a.role == role).map(|a| a.position);

        let lead_pursuer = positions(Role::Pursuer).fold(f32::NEG_INFINITY, f32::max);
        let last_pursued = positions(Role::Pursued).fold(f32::INFINITY, f32::min);
        let lead_pursued = positions(Role::Pursued).fold(f32::NEG_INFINITY, f32::max);

        let gap = if lead_pursuer.is_finite() && last_pursued.is_finite() {
            (last_pursued - lead_pursuer).max(0.0)
        } else {
            0.0
        };
        let to_finish = track
            .finish_line
            .filter(|_| lead_pursued.is_finite())
            .map(|finish| (finish - lead_pursued).max(0.0));

        Self {
            gap,
            to_finish,
            near_finish: to_finish.is_some_and(|d| d < NEAR_FINISH_DISTANCE),
            close_call: gap < CLOSE_CALL_GAP,
            band: LevelBand::from_level(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackConfig {
        TrackConfig {
            min: 0.0,
            max: 12.0,
            finish_line: Some(11.0),
            capture_margin: 0.2,
        }
    }

    #[test]
    fn test_meter_cells() {
        assert_eq!(meter_cells(0.0, 10), 0);
        assert_eq!(meter_cells(0.01, 10), 1);
        assert_eq!(meter_cells(0.55, 10), 5);
        assert_eq!(meter_cells(1.0, 10), 10);
        assert_eq!(meter_cells(2.0, 10), 10);
        assert_eq!(meter_cells(0.5, 0), 0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(LevelBand::from_level(0.5), LevelBand::Low);
        assert_eq!(LevelBand::from_level(0.6), LevelBand::Mid);
        assert_eq!(LevelBand::from_level(0.81), LevelBand::High);
    }

    #[test]
    fn test_measure_gap_and_finish() {
        let agents = [
            Agent::new(1, Role::Pursuer, 3.0),
            Agent::new(2, Role::Pursued, 10.5),
        ];
        let hud = Hud::measure(&agents, &track(), 0.9);
        assert_eq!(hud.gap, 7.5);
        assert_eq!(hud.to_finish, Some(0.5));
        assert!(hud.near_finish);
        assert!(!hud.close_call);
        assert_eq!(hud.band, LevelBand::High);
    }

    #[test]
    fn test_measure_close_call_without_finish() {
        let track = TrackConfig {
            finish_line: None,
            ..track()
        };
        let agents = [
            Agent::new(1, Role::Pursuer, 4.5),
            Agent::new(2, Role::Pursued, 5.0),
        ];
        let hud = Hud::measure(&agents, &track, 0.0);
        assert_eq!(hud.to_finish, None);
        assert!(!hud.near_finish);
        assert!(hud.close_call);
    }
}
