//! Typed, string-serializable simulation parameters.
//!
//! A [`Param`] holds one value of a closed set of kinds (see [`ValueKind`]),
//! converts to and from its canonical string form and enforces strict typed
//! access. [`Element`] trees group parameters the way a world description
//! does, and [`physics::PhysicsEngine`] exposes engine tuning parameters by
//! string key.

pub mod config;
pub mod element;
pub mod error;
pub mod math;
pub mod param;
pub mod physics;
pub mod registry;
pub mod value;

pub use element::{Element, ElementPtr};
pub use error::{ParamError, ParseError, Result};
pub use math::{Color, Pose, Quaternion, Time, Vector2d, Vector2i, Vector3};
pub use param::{Param, ParamPtr};
pub use physics::{PhysicsEngine, SharedEngine};
pub use registry::ParamRegistry;
pub use value::{ParamValue, TypedValue, ValueKind};
