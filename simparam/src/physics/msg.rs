//! Physics update, request and response messages.
//!
//! `NamedParam` carries at most one populated value field plus an optional
//! explicit type discriminator. On the wire optional fields are flattened into
//! `WireNamedParam` with a presence bitmask, encoded as little-endian CDR.

use cdr::{Bounded, CdrLe, Infinite};
use serde::{Deserialize, Serialize};

use crate::error::{ParamError, Result};
use crate::math::Vector3;
use crate::value::TypedValue;

/// Explicit type discriminators of a [`NamedParam`].
pub mod named_param_type {
    pub const DOUBLE_TYPE: u8 = 1;
    pub const INT_TYPE: u8 = 2;
    pub const STRING_TYPE: u8 = 3;
    pub const VECTOR3D_TYPE: u8 = 4;
    pub const BOOL_TYPE: u8 = 5;
    pub const FLOAT_TYPE: u8 = 6;
}

use named_param_type::*;

/// One named value of a physics update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParam {
    pub name: String,
    pub kind: Option<u8>,
    pub double_value: Option<f64>,
    pub int_value: Option<i32>,
    pub string_value: Option<String>,
    pub vector3d: Option<Vector3>,
    pub bool_value: Option<bool>,
    pub float_value: Option<f32>,
}

impl NamedParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build an explicitly typed entry. Kinds without a message field give `None`.
    pub fn typed(name: impl Into<String>, value: &TypedValue) -> Option<Self> {
        let mut param = Self::new(name);
        match value {
            TypedValue::Double(v) => {
                param.kind = Some(DOUBLE_TYPE);
                param.double_value = Some(*v);
            }
            TypedValue::Int(v) => {
                param.kind = Some(INT_TYPE);
                param.int_value = Some(*v);
            }
            TypedValue::String(v) => {
                param.kind = Some(STRING_TYPE);
                param.string_value = Some(v.clone());
            }
            TypedValue::Vector3(v) => {
                param.kind = Some(VECTOR3D_TYPE);
                param.vector3d = Some(*v);
            }
            TypedValue::Bool(v) => {
                param.kind = Some(BOOL_TYPE);
                param.bool_value = Some(*v);
            }
            TypedValue::Float(v) => {
                param.kind = Some(FLOAT_TYPE);
                param.float_value = Some(*v);
            }
            _ => return None,
        }
        Some(param)
    }

    /// Decode the carried value.
    ///
    /// An explicit discriminator wins; a missing field then reads as that
    /// field's zero value. Without one, the first populated field in the order
    /// double, int, string, vector3, bool, float is used.
    pub fn decode(&self) -> Result<TypedValue> {
        match self.kind {
            Some(DOUBLE_TYPE) => Ok(TypedValue::Double(self.double_value.unwrap_or_default())),
            Some(INT_TYPE) => Ok(TypedValue::Int(self.int_value.unwrap_or_default())),
            Some(STRING_TYPE) => Ok(TypedValue::String(
                self.string_value.clone().unwrap_or_default(),
            )),
            Some(VECTOR3D_TYPE) => Ok(TypedValue::Vector3(self.vector3d.unwrap_or_default())),
            Some(BOOL_TYPE) => Ok(TypedValue::Bool(self.bool_value.unwrap_or_default())),
            Some(FLOAT_TYPE) => Ok(TypedValue::Float(self.float_value.unwrap_or_default())),
            Some(_) => Err(ParamError::IncompleteMessageEntry(self.name.clone())),
            None => self
                .double_value
                .map(TypedValue::Double)
                .or_else(|| self.int_value.map(TypedValue::Int))
                .or_else(|| self.string_value.clone().map(TypedValue::String))
                .or_else(|| self.vector3d.map(TypedValue::Vector3))
                .or_else(|| self.bool_value.map(TypedValue::Bool))
                .or_else(|| self.float_value.map(TypedValue::Float))
                .ok_or_else(|| ParamError::IncompleteMessageEntry(self.name.clone())),
        }
    }

    fn to_wire(&self) -> WireNamedParam {
        let mut present = 0u8;
        let mut flag = |bit: u8, is_some: bool| {
            if is_some {
                present |= bit;
            }
        };
        flag(presence::KIND, self.kind.is_some());
        flag(presence::DOUBLE, self.double_value.is_some());
        flag(presence::INT, self.int_value.is_some());
        flag(presence::STRING, self.string_value.is_some());
        flag(presence::VECTOR3D, self.vector3d.is_some());
        flag(presence::BOOL, self.bool_value.is_some());
        flag(presence::FLOAT, self.float_value.is_some());
        WireNamedParam {
            name: self.name.clone(),
            present,
            kind: self.kind.unwrap_or_default(),
            double_value: self.double_value.unwrap_or_default(),
            int_value: self.int_value.unwrap_or_default(),
            string_value: self.string_value.clone().unwrap_or_default(),
            vector3d: self.vector3d.unwrap_or_default(),
            bool_value: self.bool_value.unwrap_or_default(),
            float_value: self.float_value.unwrap_or_default(),
        }
    }

    fn from_wire(wire: WireNamedParam) -> Self {
        let has = |bit: u8| wire.present & bit != 0;
        Self {
            kind: has(presence::KIND).then_some(wire.kind),
            double_value: has(presence::DOUBLE).then_some(wire.double_value),
            int_value: has(presence::INT).then_some(wire.int_value),
            string_value: has(presence::STRING).then_some(wire.string_value),
            vector3d: has(presence::VECTOR3D).then_some(wire.vector3d),
            bool_value: has(presence::BOOL).then_some(wire.bool_value),
            float_value: has(presence::FLOAT).then_some(wire.float_value),
            name: wire.name,
        }
    }
}

/// Builder-style setters used when composing update messages by hand.
impl NamedParam {
    pub fn with_kind(mut self, kind: u8) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_double(mut self, v: f64) -> Self {
        self.double_value = Some(v);
        self
    }

    pub fn with_int(mut self, v: i32) -> Self {
        self.int_value = Some(v);
        self
    }

    pub fn with_string(mut self, v: impl Into<String>) -> Self {
        self.string_value = Some(v.into());
        self
    }

    pub fn with_vector3d(mut self, v: Vector3) -> Self {
        self.vector3d = Some(v);
        self
    }

    pub fn with_bool(mut self, v: bool) -> Self {
        self.bool_value = Some(v);
        self
    }

    pub fn with_float(mut self, v: f32) -> Self {
        self.float_value = Some(v);
        self
    }
}

mod presence {
    pub const KIND: u8 = 1 << 0;
    pub const DOUBLE: u8 = 1 << 1;
    pub const INT: u8 = 1 << 2;
    pub const STRING: u8 = 1 << 3;
    pub const VECTOR3D: u8 = 1 << 4;
    pub const BOOL: u8 = 1 << 5;
    pub const FLOAT: u8 = 1 << 6;
}

#[derive(Debug, Serialize, Deserialize)]
struct WireNamedParam {
    #[serde(deserialize_with = "cdr_string")]
    name: String,
    present: u8,
    kind: u8,
    double_value: f64,
    int_value: i32,
    #[serde(deserialize_with = "cdr_string")]
    string_value: String,
    vector3d: Vector3,
    bool_value: bool,
    float_value: f32,
}

/// Read a CDR string as a byte sequence.
///
/// A CDR string is a length-prefixed, NUL-terminated byte sequence. Reading it
/// element by element keeps a forged length prefix from reserving the whole
/// claimed size before the input runs out.
fn cdr_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut bytes = Vec::<u8>::deserialize(deserializer)?;
    if bytes.pop() != Some(0) {
        return Err(serde::de::Error::custom("string is not NUL-terminated"));
    }
    String::from_utf8(bytes).map_err(serde::de::Error::custom)
}

/// A batch of named parameter changes addressed to the physics engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicsMsg {
    pub parameters: Vec<NamedParam>,
}

impl PhysicsMsg {
    pub fn new(parameters: Vec<NamedParam>) -> Self {
        Self { parameters }
    }

    pub fn to_cdr(&self) -> Result<Vec<u8>> {
        let wire: Vec<WireNamedParam> = self.parameters.iter().map(NamedParam::to_wire).collect();
        cdr::serialize::<_, _, CdrLe>(&wire, Infinite).map_err(|e| ParamError::Decode(e.to_string()))
    }

    pub fn from_cdr(bytes: &[u8]) -> Result<Self> {
        let wire: Vec<WireNamedParam> = cdr::deserialize_from(bytes, Bounded(bytes.len() as u64))
            .map_err(|e| ParamError::Decode(e.to_string()))?;
        Ok(Self {
            parameters: wire.into_iter().map(NamedParam::from_wire).collect(),
        })
    }
}

/// Request addressed to the engine's owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: i32,
    pub request: String,
    pub data: String,
}

impl Request {
    pub const PHYSICS_INFO: &'static str = "physics_info";

    pub fn new(id: i32, request: impl Into<String>) -> Self {
        Self {
            id,
            request: request.into(),
            data: String::new(),
        }
    }
}

/// Answer to a [`Request`]; `payload` holds a CDR-encoded message of `kind`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i32,
    pub request: String,
    pub response: String,
    pub kind: String,
    pub payload: Vec<u8>,
}

impl Response {
    pub const SUCCESS: &'static str = "success";
    pub const PHYSICS_KIND: &'static str = "physics";

    pub fn physics(request: &Request, msg: &PhysicsMsg) -> Result<Self> {
        Ok(Self {
            id: request.id,
            request: request.request.clone(),
            response: Self::SUCCESS.to_string(),
            kind: Self::PHYSICS_KIND.to_string(),
            payload: msg.to_cdr()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_kind_wins() {
        let p = NamedParam::new("x")
            .with_kind(FLOAT_TYPE)
            .with_double(1.0)
            .with_float(2.0);
        assert_eq!(p.decode().unwrap(), TypedValue::Float(2.0));
    }

    #[test]
    fn test_explicit_kind_without_field_reads_zero() {
        let p = NamedParam::new("x").with_kind(VECTOR3D_TYPE);
        assert_eq!(p.decode().unwrap(), TypedValue::Vector3(Vector3::ZERO));
    }

    #[test]
    fn test_legacy_precedence() {
        let p = NamedParam::new("x").with_int(3).with_string("three");
        assert_eq!(p.decode().unwrap(), TypedValue::Int(3));

        let p = NamedParam::new("x").with_float(1.5).with_bool(true);
        assert_eq!(p.decode().unwrap(), TypedValue::Bool(true));

        let p = NamedParam::new("x")
            .with_vector3d(Vector3::new(1.0, 2.0, 3.0))
            .with_double(0.5);
        assert_eq!(p.decode().unwrap(), TypedValue::Double(0.5));
    }

    #[test]
    fn test_incomplete_entries() {
        assert_eq!(
            NamedParam::new("empty").decode(),
            Err(ParamError::IncompleteMessageEntry("empty".into()))
        );
        assert!(NamedParam::new("odd").with_kind(42).with_int(1).decode().is_err());
    }

    #[test]
    fn test_typed_entries() {
        let p = NamedParam::typed("gravity", &TypedValue::Vector3(Vector3::new(0.0, 0.0, -1.0))).unwrap();
        assert_eq!(p.kind, Some(VECTOR3D_TYPE));
        assert_eq!(p.decode().unwrap(), TypedValue::Vector3(Vector3::new(0.0, 0.0, -1.0)));
        assert!(NamedParam::typed("c", &TypedValue::Char('c')).is_none());
    }

    #[test]
    fn test_cdr_round_trip() {
        let msg = PhysicsMsg::new(vec![
            NamedParam::new("max_step_size").with_kind(DOUBLE_TYPE).with_double(0.01),
            NamedParam::new("gravity").with_vector3d(Vector3::new(0.0, 0.0, -3.7)),
            NamedParam::new("empty"),
            NamedParam::new("name").with_string("world").with_int(7),
        ]);
        let bytes = msg.to_cdr().unwrap();
        assert_eq!(PhysicsMsg::from_cdr(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_cdr_forged_string_length() {
        // One entry whose name claims 0xfffffff0 bytes
        let bytes = [0, 1, 0, 0, 1, 0, 0, 0, 0xf0, 0xff, 0xff, 0xff];
        let start = std::time::Instant::now();
        assert!(matches!(PhysicsMsg::from_cdr(&bytes), Err(ParamError::Decode(_))));
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_cdr_string_wire_form() {
        let msg = PhysicsMsg::new(vec![NamedParam::new("ab").with_string("")]);
        let bytes = msg.to_cdr().unwrap();
        // Header, sequence length, then "ab\0" as a CDR string
        assert_eq!(&bytes[8..15], &[3, 0, 0, 0, b'a', b'b', 0]);
        assert_eq!(PhysicsMsg::from_cdr(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_cdr_garbage() {
        assert!(matches!(
            PhysicsMsg::from_cdr(&[0, 1, 0, 0, 0xff]),
            Err(ParamError::Decode(_))
        ));
    }
}
