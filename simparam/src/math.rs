//! Compound value types carried by parameters.
//!
//! Every type here has a canonical, whitespace-separated text form produced by
//! `Display` and accepted back by `FromStr`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::value::ValueKind;

const NSEC_PER_SEC: i64 = 1_000_000_000;

/// Split `text` on whitespace, drop empty tokens and parse each one.
///
/// The token count must be one of `accepted`; the first entry is the count
/// reported on mismatch. Nothing is returned unless every token parses.
pub(crate) fn parse_components<T: FromStr>(
    kind: ValueKind,
    text: &str,
    accepted: &[usize],
) -> Result<Vec<T>, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if !accepted.contains(&tokens.len()) {
        return Err(ParseError::WrongComponentCount {
            kind,
            expected: accepted[0],
            found: tokens.len(),
        });
    }
    tokens
        .into_iter()
        .map(|token| {
            token.parse::<T>().map_err(|_| ParseError::InvalidNumber {
                kind,
                token: token.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

impl FromStr for Vector3 {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = parse_components::<f64>(ValueKind::Vector3, s, &[3])?;
        Ok(Self::new(c[0], c[1], c[2]))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

impl Vector2i {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vector2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

impl FromStr for Vector2i {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = parse_components::<i32>(ValueKind::Vector2i, s, &[2])?;
        Ok(Self::new(c[0], c[1]))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2d {
    pub x: f64,
    pub y: f64,
}

impl Vector2d {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vector2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

impl FromStr for Vector2d {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = parse_components::<f64>(ValueKind::Vector2d, s, &[2])?;
        Ok(Self::new(c[0], c[1]))
    }
}

/// Rotation stored as `(w, x, y, z)`.
///
/// Text form is `"w x y z"`. Three tokens are read as roll, pitch and yaw in
/// radians, the way description files usually spell orientations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(1.0, 0.0, 0.0, 0.0);

    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn from_euler(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();
        Self {
            w: cr * cp * cy + sr * sp * sy,
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.w, self.x, self.y, self.z)
    }
}

impl FromStr for Quaternion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = parse_components::<f64>(ValueKind::Quaternion, s, &[4, 3])?;
        Ok(match c.len() {
            3 => Self::from_euler(c[0], c[1], c[2]),
            _ => Self::new(c[0], c[1], c[2], c[3]),
        })
    }
}

/// Position plus orientation.
///
/// Text form is `"x y z w qx qy qz"`; `"x y z roll pitch yaw"` is also accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3,
    pub orientation: Quaternion,
}

impl Pose {
    pub const fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.position, self.orientation)
    }
}

impl FromStr for Pose {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = parse_components::<f64>(ValueKind::Pose, s, &[7, 6])?;
        let position = Vector3::new(c[0], c[1], c[2]);
        let orientation = match c.len() {
            6 => Quaternion::from_euler(c[3], c[4], c[5]),
            _ => Quaternion::new(c[3], c[4], c[5], c[6]),
        };
        Ok(Self::new(position, orientation))
    }
}

/// RGBA color, `"r g b a"`. A missing alpha reads as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = parse_components::<f32>(ValueKind::Color, s, &[4, 3])?;
        let a = c.get(3).copied().unwrap_or(1.0);
        Ok(Self::new(c[0], c[1], c[2], a))
    }
}

/// Simulation time, always normalized so that `0 <= nsec < 1e9`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time {
    pub sec: i32,
    pub nsec: i32,
}

impl Time {
    pub const MIN: Time = Time { sec: i32::MIN, nsec: 0 };
    pub const MAX: Time = Time {
        sec: i32::MAX,
        nsec: 999_999_999,
    };

    /// Normalized time. Values past the `i32` seconds range saturate.
    pub fn new(sec: i32, nsec: i32) -> Self {
        Self::checked_new(i64::from(sec), i64::from(nsec)).unwrap_or(if sec < 0 {
            Self::MIN
        } else {
            Self::MAX
        })
    }

    /// Normalized time, or `None` when the seconds do not fit in an `i32`.
    pub fn checked_new(sec: i64, nsec: i64) -> Option<Self> {
        let total = sec.checked_mul(NSEC_PER_SEC)?.checked_add(nsec)?;
        Some(Self {
            sec: i32::try_from(total.div_euclid(NSEC_PER_SEC)).ok()?,
            nsec: total.rem_euclid(NSEC_PER_SEC) as i32,
        })
    }

    /// `None` for non-finite input or seconds outside the `i32` range.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() {
            return None;
        }
        let sec = secs.floor();
        if sec < f64::from(i32::MIN) || sec > f64::from(i32::MAX) {
            return None;
        }
        let nsec = ((secs - sec) * NSEC_PER_SEC as f64).round();
        Self::checked_new(sec as i64, nsec as i64)
    }

    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.sec) + f64::from(self.nsec) / NSEC_PER_SEC as f64
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sec, self.nsec)
    }
}

impl FromStr for Time {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |token: &str| ParseError::InvalidNumber {
            kind: ValueKind::Time,
            token: token.to_string(),
        };
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if let [token] = tokens.as_slice() {
            return token
                .parse::<f64>()
                .ok()
                .and_then(Self::from_secs_f64)
                .ok_or_else(|| invalid(token));
        }
        let c = parse_components::<i64>(ValueKind::Time, s, &[2])?;
        Self::checked_new(c[0], c[1]).ok_or_else(|| invalid(s.trim()))
    }
}

/// Parse a floating point token, rejecting values that overflow to infinity.
/// Spelled-out infinities and NaN are accepted as written.
pub(crate) fn parse_float<T>(kind: ValueKind, token: &str) -> Result<T, ParseError>
where
    T: FromStr + Copy + Into<f64>,
{
    let invalid = || ParseError::InvalidNumber {
        kind,
        token: token.to_string(),
    };
    let value: T = token.parse().map_err(|_| invalid())?;
    if value.into().is_infinite() && !token.to_ascii_lowercase().contains("inf") {
        return Err(invalid());
    }
    Ok(value)
}
