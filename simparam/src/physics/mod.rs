//! Physics engine parameter dispatch.
//!
//! Parameters are addressed by string key and carried as [`TypedValue`]s.
//! Updates arrive as [`PhysicsMsg`] batches, either applied directly or queued
//! through an [`UpdateHandler`] until the stepping loop drains them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ SharedEngine                                         │
//! │  ├── inner: Arc<Mutex<PhysicsEngine>>                │
//! │  │    ├── sdf: <physics> element (persisted values)  │
//! │  │    └── backend: engine-specific keys              │
//! │  └── queue: flume channel of PhysicsMsg              │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! [`TypedValue`]: crate::value::TypedValue

pub mod engine;
pub mod handler;
pub mod msg;
pub mod slot;

pub use engine::{DefaultBackend, PhysicsBackend, PhysicsEngine, SharedEngine};
pub use handler::UpdateHandler;
pub use msg::{NamedParam, PhysicsMsg, Request, Response};
pub use slot::{ValueSlot, any_cast};
