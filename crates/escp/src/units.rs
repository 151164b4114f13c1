//! # The 1/3600-inch coordinate grid
//!
//! Every ESC/P denominator (1/60, 1/72, 1/120, 1/180, 1/360, m/3600)
//! divides 3600, so all position arithmetic stays in integers. The one
//! exception is the 9-pin 1/216 inch, which is rounded to the nearest
//! subunit. Coordinates are converted to PDF points (1/72 inch) exactly
//! once, at the drawing boundary.

/// A length or coordinate in 1/3600 inch.
pub type Unit = i32;

/// One inch in grid units.
pub const INCH: Unit = 3600;

/// One PDF point (1/72 inch) in grid units.
pub const POINT: Unit = 50;

/// `n` units of 1/60 inch (default `ESC $` unit).
pub const fn from_60ths(n: i32) -> Unit {
    n * 60
}

/// `n` units of 1/72 inch.
pub const fn from_72nds(n: i32) -> Unit {
    n * 50
}

/// `n` units of 1/120 inch (draft `ESC \` unit).
pub const fn from_120ths(n: i32) -> Unit {
    n * 30
}

/// `n` units of 1/180 inch (LQ `ESC \` unit, `ESC 3`, `ESC J`).
pub const fn from_180ths(n: i32) -> Unit {
    n * 20
}

/// `n` units of 1/216 inch, rounded to the nearest subunit.
///
/// 216 does not divide 3600; the error is at most 1/7200 inch.
pub fn from_216ths(n: i32) -> Unit {
    (n * 50 + n.signum()) / 3
}

/// `n` units of 1/360 inch (default `ESC ( V` / `ESC ( v` unit).
pub const fn from_360ths(n: i32) -> Unit {
    n * 10
}

/// Millimetres to grid units, rounded.
pub fn from_mm(mm: f64) -> Unit {
    (mm * 3600.0 / 25.4).round() as Unit
}

/// Grid units to PDF points.
pub fn to_points(u: Unit) -> f32 {
    u as f32 / POINT as f32
}

/// PDF points to grid units, rounded.
pub fn from_points(pt: f64) -> Unit {
    (pt * POINT as f64).round() as Unit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denominators_are_exact() {
        assert_eq!(from_60ths(60), INCH);
        assert_eq!(from_72nds(72), INCH);
        assert_eq!(from_120ths(120), INCH);
        assert_eq!(from_180ths(180), INCH);
        assert_eq!(from_360ths(360), INCH);
    }

    #[test]
    fn points_round_trip() {
        assert_eq!(to_points(INCH), 72.0);
        assert_eq!(from_points(72.0), INCH);
        assert_eq!(from_points(0.5), 25);
    }

    #[test]
    fn ninth_pin_denominator_rounds() {
        // 3/216 in is exactly 50 subunits; 1/216 rounds 16.67 up to 17
        assert_eq!(from_216ths(3), 50);
        assert_eq!(from_216ths(1), 17);
        assert_eq!(from_216ths(2), 33);
        assert_eq!(from_216ths(216), INCH);
    }

    #[test]
    fn mm_conversion() {
        // 25.4 mm is one inch
        assert_eq!(from_mm(25.4), INCH);
        assert_eq!(from_mm(6.35), 900);
    }
}
