use serde::{Deserialize, Serialize};

/// Number of values stored per detector in a listmode record
pub const FIELDS_PER_DETECTOR: usize = 5;

/// Identifier of a detector within a run (0-based)
pub type DetectorId = usize;

/// Identifier of a worker thread within a run (0-based)
pub type WorkerId = usize;

/// Column of a detector's slot in a listmode record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Smeared deposited energy (keV)
    Energy,
    /// Average interaction time plus detector offset (ps)
    Time,
    /// Average local x-coordinate (mm)
    X,
    /// Average local y-coordinate (mm)
    Y,
    /// Average local z-coordinate (mm)
    Z,
}

impl Field {
    /// All fields in record order
    pub const ALL: [Field; FIELDS_PER_DETECTOR] =
        [Field::Energy, Field::Time, Field::X, Field::Y, Field::Z];

    /// Column index of this field inside a detector slot
    pub fn index(self) -> usize {
        match self {
            Field::Energy => 0,
            Field::Time => 1,
            Field::X => 2,
            Field::Y => 3,
            Field::Z => 4,
        }
    }
}

/// Point in a detector's local frame (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Unit vector giving a gamma's direction of flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub cos_theta: f64,
    pub phi: f64,
}

impl Direction {
    /// Polar angle in radians
    pub fn theta(&self) -> f64 {
        self.cos_theta.clamp(-1.0, 1.0).acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_indices_follow_record_order() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }

    #[test]
    fn test_direction_theta() {
        let up = Direction { cos_theta: 1.0, phi: 0.0 };
        assert_eq!(up.theta(), 0.0);
        let side = Direction { cos_theta: 0.0, phi: 0.0 };
        assert!((side.theta() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
