//! String-keyed access to the physics engine's tunable parameters.
//!
//! `PhysicsEngine` owns the live values of the well-known simulation
//! parameters and a copy of its `<physics>` description element. Every write
//! goes through a typed setter that also persists the value into the element,
//! so re-serializing the description reflects live state.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::handler::UpdateHandler;
use super::msg::{NamedParam, PhysicsMsg, Request, Response};
use super::slot::{ValueSlot, any_cast};
use crate::element::{Element, ElementPtr};
use crate::error::{ParamError, Result};
use crate::math::Vector3;
use crate::value::{ParamValue, TypedValue};

pub const TYPE: &str = "type";
pub const MAX_STEP_SIZE: &str = "max_step_size";
pub const REAL_TIME_UPDATE_RATE: &str = "real_time_update_rate";
pub const REAL_TIME_FACTOR: &str = "real_time_factor";
pub const GRAVITY: &str = "gravity";
pub const MAGNETIC_FIELD: &str = "magnetic_field";

/// Keys understood by every engine, in reporting order.
pub const PARAM_KEYS: [&str; 6] = [
    TYPE,
    MAX_STEP_SIZE,
    REAL_TIME_UPDATE_RATE,
    REAL_TIME_FACTOR,
    GRAVITY,
    MAGNETIC_FIELD,
];

/// Engine-specific part of a physics engine.
///
/// Keys the backend does not recognize must yield `None` so the engine can
/// report them as unknown.
pub trait PhysicsBackend: Send {
    fn engine_type(&self) -> &str;

    /// Called after gravity has been changed and persisted.
    fn on_gravity_changed(&mut self, _gravity: Vector3) {}

    fn set_param(&mut self, _key: &str, _value: &TypedValue) -> Option<Result<()>> {
        None
    }

    fn get_param(&self, _key: &str) -> Option<TypedValue> {
        None
    }
}

/// Backend with no engine-specific parameters.
#[derive(Debug, Clone)]
pub struct DefaultBackend {
    engine_type: String,
}

impl DefaultBackend {
    pub fn new(engine_type: impl Into<String>) -> Self {
        Self {
            engine_type: engine_type.into(),
        }
    }
}

impl PhysicsBackend for DefaultBackend {
    fn engine_type(&self) -> &str {
        &self.engine_type
    }
}

pub struct PhysicsEngine {
    sdf: ElementPtr,
    backend: Box<dyn PhysicsBackend>,
    max_step_size: f64,
    real_time_update_rate: f64,
    target_real_time_factor: f64,
}

impl PhysicsEngine {
    /// Create an engine initialized from the stock `<physics>` defaults.
    pub fn new(backend: impl PhysicsBackend + 'static) -> Result<Self> {
        let sdf = Element::physics_template(None)?;
        if let Some(attr) = sdf.attribute(TYPE) {
            attr.write().try_set_from_string(backend.engine_type())?;
        }
        let mut engine = Self {
            sdf,
            backend: Box::new(backend),
            max_step_size: 0.0,
            real_time_update_rate: 0.0,
            target_real_time_factor: 0.0,
        };
        engine.read_timing()?;
        Ok(engine)
    }

    /// Copy `sdf` into the engine's own description and re-read the timing
    /// parameters from it.
    ///
    /// The `type` attribute always names this engine, whatever `sdf` says.
    /// Values the description rejects are reported after every other value
    /// has been copied and read.
    pub fn load(&mut self, sdf: &Element) -> Result<()> {
        let copied = self.sdf.copy_from(sdf);
        if let Some(attr) = self.sdf.attribute(TYPE) {
            let engine_type = self.engine_type().to_string();
            attr.write().try_set_from_string(&engine_type)?;
        }
        self.read_timing()?;
        copied
    }

    fn read_timing(&mut self) -> Result<()> {
        self.real_time_update_rate = self.sdf.get::<f64>(REAL_TIME_UPDATE_RATE)?;
        self.target_real_time_factor = self.sdf.get::<f64>(REAL_TIME_FACTOR)?;
        self.max_step_size = self.sdf.get::<f64>(MAX_STEP_SIZE)?;
        Ok(())
    }

    pub fn engine_type(&self) -> &str {
        self.backend.engine_type()
    }

    /// The engine's description element, kept in sync with live values.
    pub fn sdf(&self) -> &ElementPtr {
        &self.sdf
    }

    pub fn max_step_size(&self) -> f64 {
        self.max_step_size
    }

    pub fn set_max_step_size(&mut self, step_size: f64) {
        self.persist(MAX_STEP_SIZE, step_size);
        self.max_step_size = step_size;
    }

    pub fn real_time_update_rate(&self) -> f64 {
        self.real_time_update_rate
    }

    pub fn set_real_time_update_rate(&mut self, rate: f64) {
        self.persist(REAL_TIME_UPDATE_RATE, rate);
        self.real_time_update_rate = rate;
    }

    pub fn target_real_time_factor(&self) -> f64 {
        self.target_real_time_factor
    }

    pub fn set_target_real_time_factor(&mut self, factor: f64) {
        self.persist(REAL_TIME_FACTOR, factor);
        self.target_real_time_factor = factor;
    }

    /// Wall-clock seconds per update, or zero when the rate is unbounded.
    pub fn update_period(&self) -> f64 {
        if self.real_time_update_rate > 0.0 {
            1.0 / self.real_time_update_rate
        } else {
            0.0
        }
    }

    pub fn gravity(&self) -> Vector3 {
        self.sdf.get::<Vector3>(GRAVITY).unwrap_or_default()
    }

    pub fn set_gravity(&mut self, gravity: Vector3) {
        self.persist(GRAVITY, gravity);
        self.backend.on_gravity_changed(gravity);
    }

    pub fn magnetic_field(&self) -> Vector3 {
        self.sdf.get::<Vector3>(MAGNETIC_FIELD).unwrap_or_default()
    }

    pub fn set_magnetic_field(&mut self, field: Vector3) {
        self.persist(MAGNETIC_FIELD, field);
    }

    fn persist<T: ParamValue>(&self, name: &str, value: T) {
        match self.sdf.get_element(name) {
            Some(element) => {
                element.set(value);
            }
            None => tracing::warn!("Physics description has no <{}> element", name),
        }
    }

    /// Set a parameter by key. Failures are logged and leave every field
    /// unchanged.
    pub fn set_param(&mut self, key: &str, value: &TypedValue) -> bool {
        match self.try_set_param(key, value) {
            Ok(()) => true,
            Err(e @ (ParamError::ReadOnlyField(_) | ParamError::UnknownKey { .. })) => {
                tracing::warn!("SetParam failed: {}", e);
                false
            }
            Err(e) => {
                tracing::error!("SetParam failed: {}", e);
                false
            }
        }
    }

    pub fn try_set_param(&mut self, key: &str, value: &TypedValue) -> Result<()> {
        match key {
            TYPE => return Err(ParamError::ReadOnlyField(key.to_string())),
            MAX_STEP_SIZE => self.set_max_step_size(any_cast(key, value)?),
            REAL_TIME_UPDATE_RATE => self.set_real_time_update_rate(any_cast(key, value)?),
            REAL_TIME_FACTOR => self.set_target_real_time_factor(any_cast(key, value)?),
            GRAVITY => self.set_gravity(any_cast(key, value)?),
            MAGNETIC_FIELD => self.set_magnetic_field(any_cast(key, value)?),
            _ => {
                return self.backend.set_param(key, value).unwrap_or_else(|| {
                    Err(ParamError::UnknownKey {
                        key: key.to_string(),
                        engine: self.engine_type().to_string(),
                    })
                });
            }
        }
        Ok(())
    }

    /// Read a parameter by key.
    pub fn get_param(&self, key: &str) -> Option<TypedValue> {
        let value = match key {
            TYPE => TypedValue::String(self.engine_type().to_string()),
            MAX_STEP_SIZE => TypedValue::Double(self.max_step_size),
            REAL_TIME_UPDATE_RATE => TypedValue::Double(self.real_time_update_rate),
            REAL_TIME_FACTOR => TypedValue::Double(self.target_real_time_factor),
            GRAVITY => TypedValue::Vector3(self.gravity()),
            MAGNETIC_FIELD => TypedValue::Vector3(self.magnetic_field()),
            _ => match self.backend.get_param(key) {
                Some(value) => value,
                None => {
                    tracing::warn!(
                        "GetParam failed for [{}] in physics engine {}",
                        key,
                        self.engine_type()
                    );
                    return None;
                }
            },
        };
        Some(value)
    }

    /// Decode every usable entry of `msg`, in message order.
    ///
    /// Entries without a derivable type are logged and skipped.
    pub fn decode_update_message(msg: &PhysicsMsg) -> impl Iterator<Item = (String, TypedValue)> + '_ {
        msg.parameters
            .iter()
            .filter_map(|entry| match entry.decode() {
                Ok(value) => Some((entry.name.clone(), value)),
                Err(e) => {
                    tracing::warn!("Skipping physics message entry: {}", e);
                    None
                }
            })
    }

    /// Apply an update message entry by entry. Returns how many were applied.
    #[tracing::instrument(name = "physics_msg", skip_all, fields(
        engine = %self.engine_type(),
        entries = msg.parameters.len()
    ))]
    pub fn on_physics_msg(&mut self, msg: &PhysicsMsg) -> usize {
        let mut slot = ValueSlot::default();
        let mut applied = 0;
        for (key, value) in Self::decode_update_message(msg) {
            let value = slot.store(value);
            if self.set_param(&key, value) {
                applied += 1;
            }
        }
        tracing::debug!("Applied {} physics parameters", applied);
        applied
    }

    /// Snapshot of the well-known parameters as an explicitly typed message.
    pub fn physics_info(&self) -> PhysicsMsg {
        let parameters = PARAM_KEYS
            .iter()
            .filter_map(|key| {
                let value = self.get_param(key)?;
                NamedParam::typed(*key, &value)
            })
            .collect();
        PhysicsMsg::new(parameters)
    }
}

impl std::fmt::Debug for PhysicsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsEngine")
            .field("type", &self.engine_type())
            .field("max_step_size", &self.max_step_size)
            .field("real_time_update_rate", &self.real_time_update_rate)
            .field("target_real_time_factor", &self.target_real_time_factor)
            .finish()
    }
}

/// A physics engine shared between update delivery and the stepping loop.
///
/// Each message is applied under one lock acquisition, so a stepping loop
/// holding [`SharedEngine::lock`] never observes a half-applied update.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<PhysicsEngine>>,
    tx: flume::Sender<PhysicsMsg>,
    rx: flume::Receiver<PhysicsMsg>,
}

impl SharedEngine {
    pub fn new(engine: PhysicsEngine) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            inner: Arc::new(Mutex::new(engine)),
            tx,
            rx,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, PhysicsEngine> {
        self.inner.lock()
    }

    pub fn on_physics_msg(&self, msg: &PhysicsMsg) -> usize {
        self.inner.lock().on_physics_msg(msg)
    }

    /// Handler that queues messages until [`SharedEngine::process_pending`].
    pub fn queue_handler(&self) -> UpdateHandler {
        UpdateHandler::Queue(self.tx.clone())
    }

    /// Handler that applies messages immediately on the delivering thread.
    pub fn callback_handler(&self) -> UpdateHandler {
        let inner = self.inner.clone();
        UpdateHandler::Callback(Arc::new(move |msg: PhysicsMsg| {
            inner.lock().on_physics_msg(&msg);
        }))
    }

    /// Apply every queued message. Returns the number of parameters applied.
    pub fn process_pending(&self) -> usize {
        self.rx
            .try_iter()
            .map(|msg| self.on_physics_msg(&msg))
            .sum()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Answer a request. Only `physics_info` is handled here.
    pub fn on_request(&self, request: &Request) -> Option<Response> {
        if request.request != Request::PHYSICS_INFO {
            return None;
        }
        let info = self.lock().physics_info();
        match Response::physics(request, &info) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::error!("Failed to encode physics info: {}", e);
                None
            }
        }
    }
}
