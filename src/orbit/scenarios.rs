//! Pre-built scenes.
//!
//! Four canonical configurations with real body data:
//! - Sun and Earth
//! - Sun, Earth and Moon
//! - Earth and Moon
//! - Earth and the International Space Station
//!
//! Each preset is plain [`SceneConfig`] data; building an engine from one
//! goes through the same validation as a YAML scene.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::SceneConfig;
use crate::engine::PhysicsEngine;
use crate::error::{SimError, SimResult};
use crate::orbit::body::{BodyConfig, BodyType};
use crate::orbit::units::{OrbitLength, OrbitMass, OrbitTime, Vector2};

/// Sun mass (kg).
pub const SUN_MASS: f64 = 1.989e30;
/// Sun radius (m).
pub const SUN_RADIUS: f64 = 6.955e8;
/// Earth mass (kg).
pub const EARTH_MASS: f64 = 5.9746e24;
/// Earth radius (m).
pub const EARTH_RADIUS: f64 = 6.371e6;
/// Earth perihelion distance (km).
pub const EARTH_PERIHELION_KM: f64 = 147_098_290.0;
/// Earth speed at perihelion (m/s).
pub const EARTH_PERIHELION_SPEED: f64 = 30_300.0;
/// Moon mass (kg).
pub const MOON_MASS: f64 = 7.3477e22;
/// Moon radius (m).
pub const MOON_RADIUS: f64 = 1.7371e6;
/// Moon perigee distance (km).
pub const MOON_PERIGEE_KM: f64 = 363_104.0;
/// Moon speed relative to Earth at perigee (m/s).
pub const MOON_PERIGEE_SPEED: f64 = 1_082.0;
/// Moon sidereal period (days); the moon is tidally locked.
pub const MOON_ROTATION_DAYS: f64 = 27.321_661;
/// Space station mass (kg).
pub const SPACE_STATION_MASS: f64 = 369_914.0;
/// Space station half-span (m).
pub const SPACE_STATION_RADIUS: f64 = 109.0;
/// Space station altitude (km).
pub const SPACE_STATION_ALTITUDE_KM: f64 = 408.0;
/// Space station orbital speed (m/s).
pub const SPACE_STATION_SPEED: f64 = 7_706.0;

/// Which preset scene to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// Pinned sun with the Earth at perihelion.
    SunEarth,
    /// Pinned sun, the Earth at perihelion and the Moon at perigee.
    SunEarthMoon,
    /// The Earth with the Moon at perigee.
    EarthMoon,
    /// The Earth with the space station in low orbit.
    EarthSpaceStation,
}

impl SceneKind {
    /// Every preset.
    pub const ALL: [Self; 4] = [
        Self::SunEarth,
        Self::SunEarthMoon,
        Self::EarthMoon,
        Self::EarthSpaceStation,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SunEarth => "sun_earth",
            Self::SunEarthMoon => "sun_earth_moon",
            Self::EarthMoon => "earth_moon",
            Self::EarthSpaceStation => "earth_space_station",
        }
    }

    /// Base sub-step size (s), scaled to the scene's fastest orbit.
    #[must_use]
    pub fn base_time_step(self) -> f64 {
        let day = OrbitTime::from_days(1.0).as_seconds();
        match self {
            Self::SunEarth | Self::SunEarthMoon => day,
            Self::EarthMoon => day / 3.0,
            Self::EarthSpaceStation => day * 9e-4,
        }
    }

    /// Scene data.
    #[must_use]
    pub fn config(self) -> SceneConfig {
        let builder = SceneConfig::builder(self.name()).base_time_step(self.base_time_step());
        match self {
            Self::SunEarth => builder.body(sun()).body(earth_at_perihelion()).build(),
            Self::SunEarthMoon => {
                let earth = earth_at_perihelion();
                let moon = moon_around(&earth);
                builder.body(sun()).body(earth).body(moon).build()
            }
            Self::EarthMoon => {
                let mut earth = earth_at_rest();
                let moon = moon_around(&earth);
                // Zero total momentum keeps the pair from drifting off screen.
                earth.velocity = -moon.velocity * (moon.mass / earth.mass);
                builder.body(earth).body(moon).build()
            }
            Self::EarthSpaceStation => {
                let earth = earth_at_rest();
                let station = space_station_around(&earth);
                builder.body(earth).body(station).build()
            }
        }
    }

    /// Validate the preset and build a paused engine.
    ///
    /// # Errors
    ///
    /// Returns error if the preset fails validation.
    pub fn build_engine(self) -> SimResult<PhysicsEngine> {
        self.config().build_engine()
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| SimError::config(format!("Unknown scene '{s}'")))
    }
}

/// The sun, pinned at the origin.
#[must_use]
pub fn sun() -> BodyConfig {
    let mass = OrbitMass::from_kg(SUN_MASS).as_kg();
    let mut config = BodyConfig::new(
        "sun",
        BodyType::Star,
        mass,
        SUN_RADIUS,
        Vector2::zero(),
        Vector2::zero(),
    )
    .with_movable(false)
    .with_mass_range(mass / 2.0, mass * 2.0);
    config.tick_value = Some(mass);
    config.tick_label = Some("our sun".to_string());
    config
}

/// The Earth at perihelion, moving perpendicular to the sun line.
#[must_use]
pub fn earth_at_perihelion() -> BodyConfig {
    let distance = OrbitLength::from_km(EARTH_PERIHELION_KM).as_meters();
    earth(Vector2::new(distance, 0.0), Vector2::new(0.0, EARTH_PERIHELION_SPEED))
}

/// The Earth at rest at the origin.
#[must_use]
pub fn earth_at_rest() -> BodyConfig {
    earth(Vector2::zero(), Vector2::zero())
}

fn earth(position: Vector2, velocity: Vector2) -> BodyConfig {
    let mass = OrbitMass::from_kg(EARTH_MASS).as_kg();
    let mut config =
        BodyConfig::new("earth", BodyType::Planet, mass, EARTH_RADIUS, position, velocity)
            .with_mass_range(mass / 2.0, mass * 2.0);
    config.tick_value = Some(mass);
    config.tick_label = Some("our earth".to_string());
    config
}

/// The Moon at perigee, offset from `earth` along +x and moving with it.
#[must_use]
pub fn moon_around(earth: &BodyConfig) -> BodyConfig {
    let perigee = OrbitLength::from_km(MOON_PERIGEE_KM).as_meters();
    let rotation_period = OrbitTime::from_days(MOON_ROTATION_DAYS).as_seconds();
    let mut config = BodyConfig::new(
        "moon",
        BodyType::Moon,
        MOON_MASS,
        MOON_RADIUS,
        earth.position + Vector2::new(perigee, 0.0),
        earth.velocity + Vector2::new(0.0, MOON_PERIGEE_SPEED),
    )
    .with_rotation_period(rotation_period)
    .with_mass_range(MOON_MASS / 2.0, MOON_MASS * 2.0);
    config.tick_value = Some(MOON_MASS);
    config.tick_label = Some("our moon".to_string());
    config.mass_readout_below = true;
    config
}

/// The space station in low orbit above `earth`.
#[must_use]
pub fn space_station_around(earth: &BodyConfig) -> BodyConfig {
    let orbit_radius = (OrbitLength::from_meters(earth.radius)
        + OrbitLength::from_km(SPACE_STATION_ALTITUDE_KM))
    .as_meters();
    let mut config = BodyConfig::new(
        "space station",
        BodyType::Satellite,
        SPACE_STATION_MASS,
        SPACE_STATION_RADIUS,
        earth.position + Vector2::new(orbit_radius, 0.0),
        earth.velocity + Vector2::new(0.0, SPACE_STATION_SPEED),
    );
    config.mass_readout_below = true;
    config
}
