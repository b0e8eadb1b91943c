//! Physical constants, the planar vector type, and unit-checked scalars.
//!
//! Positions, velocities, accelerations and forces are all [`Vector2`] in
//! SI base units (m, m/s, m/s², N). Scene data written in astronomical
//! units, kilometers or days goes through the `uom`-backed wrappers below
//! so conversions are checked once at the boundary instead of being
//! sprinkled through the integrator.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use uom::si::f64::{Length, Mass, Time};
use uom::si::length::{astronomical_unit, kilometer, meter};
use uom::si::mass::kilogram;
use uom::si::time::{day, second};

/// Gravitational constant (m³ kg⁻¹ s⁻²).
pub const G: f64 = 6.674_30e-11;

/// Astronomical unit in meters.
pub const AU: f64 = 1.495_978_707e11;

/// Seconds in one day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// 2D vector with `f64` components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vector2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Magnitude squared.
    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Magnitude (length).
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).magnitude()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product of two planar vectors.
    #[must_use]
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag)
        } else {
            Self::zero()
        }
    }

    /// Scale by a dimensionless factor.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Rotate counter-clockwise about the origin.
    #[must_use]
    pub fn rotated(&self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self::new(self.x * cos_a - self.y * sin_a, self.x * sin_a + self.y * cos_a)
    }

    /// Check if all components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// Type-safe mass.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OrbitMass(pub Mass);

impl OrbitMass {
    /// Create from kilograms.
    #[must_use]
    pub fn from_kg(kg: f64) -> Self {
        Self(Mass::new::<kilogram>(kg))
    }

    /// Get mass in kilograms.
    #[must_use]
    pub fn as_kg(&self) -> f64 {
        self.0.get::<kilogram>()
    }
}

/// Type-safe duration.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OrbitTime(pub Time);

impl OrbitTime {
    /// Create from seconds.
    #[must_use]
    pub fn from_seconds(s: f64) -> Self {
        Self(Time::new::<second>(s))
    }

    /// Create from days.
    #[must_use]
    pub fn from_days(d: f64) -> Self {
        Self(Time::new::<day>(d))
    }

    /// Get time in seconds.
    #[must_use]
    pub fn as_seconds(&self) -> f64 {
        self.0.get::<second>()
    }

    /// Get time in days.
    #[must_use]
    pub fn as_days(&self) -> f64 {
        self.0.get::<day>()
    }
}

/// Type-safe distance.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct OrbitLength(pub Length);

impl OrbitLength {
    /// Create from meters.
    #[must_use]
    pub fn from_meters(m: f64) -> Self {
        Self(Length::new::<meter>(m))
    }

    /// Create from kilometers.
    #[must_use]
    pub fn from_km(km: f64) -> Self {
        Self(Length::new::<kilometer>(km))
    }

    /// Create from astronomical units.
    #[must_use]
    pub fn from_au(au: f64) -> Self {
        Self(Length::new::<astronomical_unit>(au))
    }

    /// Get distance in meters.
    #[must_use]
    pub fn as_meters(&self) -> f64 {
        self.0.get::<meter>()
    }
}

impl Add for OrbitLength {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

/// Speed of a circular orbit of radius `radius` (m) about a central mass (kg).
#[must_use]
pub fn circular_speed(central_mass: f64, radius: f64) -> f64 {
    (G * central_mass / radius).sqrt()
}

/// Period (s) of a bound two-body orbit from a state at distance `radius`
/// moving at `speed`, via the vis-viva equation. Returns `None` for
/// unbound (parabolic or hyperbolic) states.
#[must_use]
pub fn orbital_period(central_mass: f64, radius: f64, speed: f64) -> Option<f64> {
    let mu = G * central_mass;
    let inverse_a = 2.0 / radius - speed * speed / mu;
    if inverse_a <= 0.0 {
        return None;
    }
    let semi_major_axis = 1.0 / inverse_a;
    Some(2.0 * std::f64::consts::PI * (semi_major_axis.powi(3) / mu).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_vector_arithmetic() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, -4.0);

        assert_eq!(a + b, Vector2::new(4.0, -2.0));
        assert_eq!(a - b, Vector2::new(-2.0, 6.0));
        assert_eq!(a * 2.0, Vector2::new(2.0, 4.0));
        assert_eq!(b / 2.0, Vector2::new(1.5, -2.0));
        assert_eq!(-a, Vector2::new(-1.0, -2.0));

        let mut c = a;
        c += b;
        c -= a;
        assert_eq!(c, b);
    }

    #[test]
    fn test_vector_magnitude() {
        let v = Vector2::new(3.0, 4.0);
        assert!((v.magnitude() - 5.0).abs() < EPSILON);
        assert!((v.magnitude_squared() - 25.0).abs() < EPSILON);
        assert!((v.distance(&Vector2::zero()) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_vector_normalized() {
        let v = Vector2::new(0.0, 10.0).normalized();
        assert!((v.y - 1.0).abs() < EPSILON);
        assert_eq!(Vector2::zero().normalized(), Vector2::zero());
    }

    #[test]
    fn test_vector_products() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 1.0);
        assert!((a.dot(&b)).abs() < EPSILON);
        assert!((a.cross(&b) - 1.0).abs() < EPSILON);
        assert!((b.cross(&a) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_vector_rotated() {
        let v = Vector2::new(1.0, 0.0).rotated(std::f64::consts::FRAC_PI_2);
        assert!(v.x.abs() < EPSILON);
        assert!((v.y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_vector_is_finite() {
        assert!(Vector2::new(1.0, 2.0).is_finite());
        assert!(!Vector2::new(f64::NAN, 0.0).is_finite());
        assert!(!Vector2::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_unit_conversions() {
        assert!((OrbitLength::from_km(1.5).as_meters() - 1500.0).abs() < EPSILON);
        let au = OrbitLength::from_au(1.0).as_meters();
        assert!((au - AU).abs() / AU < 1e-9);
        assert!((OrbitTime::from_days(2.0).as_seconds() - 2.0 * SECONDS_PER_DAY).abs() < 1e-6);
        assert!((OrbitTime::from_seconds(SECONDS_PER_DAY).as_days() - 1.0).abs() < EPSILON);
        assert!((OrbitMass::from_kg(42.0).as_kg() - 42.0).abs() < EPSILON);

        let sum = OrbitLength::from_km(1.0) + OrbitLength::from_meters(500.0);
        assert!((sum.as_meters() - 1500.0).abs() < EPSILON);
    }

    #[test]
    fn test_circular_period_matches_kepler() {
        let mass = 1.989e30;
        let r = AU;
        let v = circular_speed(mass, r);
        let period = orbital_period(mass, r, v).unwrap_or(f64::NAN);
        let expected = 2.0 * std::f64::consts::PI * r / v;
        assert!((period - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn test_unbound_has_no_period() {
        let mass = 1.989e30;
        let escape = (2.0 * G * mass / AU).sqrt();
        assert!(orbital_period(mass, AU, escape * 1.01).is_none());
    }
}
