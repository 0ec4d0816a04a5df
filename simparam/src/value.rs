//! Runtime representation of parameter values.
//!
//! `TypedValue` is the closed set of value kinds a parameter can hold and
//! `ValueKind` is its type tag. Both convert to and from their canonical
//! string forms; conversion never logs, it only reports a [`ParseError`].

use std::fmt;

use crate::error::ParseError;
use crate::math::{Color, Pose, Quaternion, Time, Vector2d, Vector2i, Vector3, parse_float};

/// Type tag of a parameter value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display, strum::AsRefStr,
    strum::IntoStaticStr, strum::EnumIter,
)]
pub enum ValueKind {
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "int")]
    Int,
    #[strum(to_string = "unsigned int", serialize = "uint")]
    UInt,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "double")]
    Double,
    #[strum(serialize = "char")]
    Char,
    #[strum(to_string = "string", serialize = "std::string")]
    String,
    #[strum(serialize = "vector3")]
    Vector3,
    #[strum(serialize = "vector2i")]
    Vector2i,
    #[strum(serialize = "vector2d")]
    Vector2d,
    #[strum(serialize = "quaternion")]
    Quaternion,
    #[strum(serialize = "pose")]
    Pose,
    #[strum(serialize = "color")]
    Color,
    #[strum(serialize = "time")]
    Time,
}

impl ValueKind {
    /// Parse a type tag such as `"double"` or `"vector3"`.
    pub fn from_tag(tag: &str) -> Result<Self, ParseError> {
        tag.trim()
            .parse()
            .map_err(|_| ParseError::UnknownKind(tag.to_string()))
    }

    /// Whether values of this kind are whitespace-separated component lists
    /// that typed vector access may re-parse from text.
    pub fn is_vector(self) -> bool {
        matches!(self, Self::Vector3 | Self::Vector2i | Self::Vector2d)
    }
}

/// A value of one of the supported parameter kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Vector3(Vector3),
    Vector2i(Vector2i),
    Vector2d(Vector2d),
    Quaternion(Quaternion),
    Pose(Pose),
    Color(Color),
    Time(Time),
}

impl TypedValue {
    /// Returns the type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::UInt(_) => ValueKind::UInt,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Char(_) => ValueKind::Char,
            Self::String(_) => ValueKind::String,
            Self::Vector3(_) => ValueKind::Vector3,
            Self::Vector2i(_) => ValueKind::Vector2i,
            Self::Vector2d(_) => ValueKind::Vector2d,
            Self::Quaternion(_) => ValueKind::Quaternion,
            Self::Pose(_) => ValueKind::Pose,
            Self::Color(_) => ValueKind::Color,
            Self::Time(_) => ValueKind::Time,
        }
    }

    /// Parse `text` as a value of `kind`.
    ///
    /// Scalars tolerate surrounding whitespace. Strings are taken verbatim.
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self, ParseError> {
        let number = |token: &str| ParseError::InvalidNumber {
            kind,
            token: token.to_string(),
        };
        let trimmed = text.trim();
        Ok(match kind {
            ValueKind::Bool => Self::Bool(parse_bool(trimmed)?),
            ValueKind::Int => Self::Int(trimmed.parse().map_err(|_| number(trimmed))?),
            ValueKind::UInt => Self::UInt(trimmed.parse().map_err(|_| number(trimmed))?),
            ValueKind::Float => Self::Float(parse_float(kind, trimmed)?),
            ValueKind::Double => Self::Double(parse_float(kind, trimmed)?),
            ValueKind::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => return Err(ParseError::InvalidChar(text.to_string())),
                }
            }
            ValueKind::String => Self::String(text.to_string()),
            ValueKind::Vector3 => Self::Vector3(text.parse()?),
            ValueKind::Vector2i => Self::Vector2i(text.parse()?),
            ValueKind::Vector2d => Self::Vector2d(text.parse()?),
            ValueKind::Quaternion => Self::Quaternion(text.parse()?),
            ValueKind::Pose => Self::Pose(text.parse()?),
            ValueKind::Color => Self::Color(text.parse()?),
            ValueKind::Time => Self::Time(text.parse()?),
        })
    }

    /// Extract a typed payload if the tag matches `T`.
    pub fn get<T: ParamValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

fn parse_bool(text: &str) -> Result<bool, ParseError> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ParseError::InvalidBool(text.to_string())),
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Vector3(v) => write!(f, "{v}"),
            Self::Vector2i(v) => write!(f, "{v}"),
            Self::Vector2d(v) => write!(f, "{v}"),
            Self::Quaternion(v) => write!(f, "{v}"),
            Self::Pose(v) => write!(f, "{v}"),
            Self::Color(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{v}"),
        }
    }
}

/// Rust types that map one-to-one onto a [`ValueKind`].
pub trait ParamValue: Sized {
    const KIND: ValueKind;

    fn into_value(self) -> TypedValue;

    fn from_value(value: &TypedValue) -> Option<Self>;
}

/// Implements `ParamValue` and `From<T> for TypedValue` for a payload type.
macro_rules! impl_param_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ParamValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn into_value(self) -> TypedValue {
                    TypedValue::$variant(self)
                }

                fn from_value(value: &TypedValue) -> Option<Self> {
                    match value {
                        TypedValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for TypedValue {
                fn from(v: $ty) -> Self {
                    TypedValue::$variant(v)
                }
            }
        )*
    };
}

impl_param_value! {
    bool => Bool,
    i32 => Int,
    u32 => UInt,
    f32 => Float,
    f64 => Double,
    char => Char,
    String => String,
    Vector3 => Vector3,
    Vector2i => Vector2i,
    Vector2d => Vector2d,
    Quaternion => Quaternion,
    Pose => Pose,
    Color => Color,
    Time => Time,
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn samples() -> Vec<TypedValue> {
        vec![
            TypedValue::Bool(true),
            TypedValue::Int(-42),
            TypedValue::UInt(4_000_000_000),
            TypedValue::Float(0.1),
            TypedValue::Double(-9.81),
            TypedValue::Char('x'),
            TypedValue::String("hello world".into()),
            TypedValue::Vector3(Vector3::new(1.0, 2.0, 3.0)),
            TypedValue::Vector2i(Vector2i::new(-4, 7)),
            TypedValue::Vector2d(Vector2d::new(0.5, 1e-9)),
            TypedValue::Quaternion(Quaternion::new(0.5, 0.5, -0.5, 0.5)),
            TypedValue::Pose(Pose::new(
                Vector3::new(1.0, 0.0, 0.25),
                Quaternion::from_euler(0.1, 0.2, 0.3),
            )),
            TypedValue::Color(Color::new(0.1, 0.2, 0.3, 0.4)),
            TypedValue::Time(Time::new(12, 345)),
        ]
    }

    #[test]
    fn test_round_trip_every_kind() {
        let values = samples();
        // One sample per kind
        assert_eq!(values.len(), ValueKind::iter().count());
        for value in values {
            let text = value.to_string();
            let parsed = TypedValue::parse(value.kind(), &text).unwrap();
            assert_eq!(parsed, value, "round trip of {text:?}");
        }
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(TypedValue::Vector3(Vector3::new(1.0, 2.0, 3.0)).to_string(), "1 2 3");
        assert_eq!(TypedValue::Bool(false).to_string(), "false");
        assert_eq!(TypedValue::Double(0.001).to_string(), "0.001");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ValueKind::UInt.to_string(), "unsigned int");
        assert_eq!(ValueKind::from_tag("unsigned int").unwrap(), ValueKind::UInt);
        assert_eq!(ValueKind::from_tag("std::string").unwrap(), ValueKind::String);
        assert_eq!(ValueKind::String.as_ref(), "string");
        assert_eq!(
            ValueKind::from_tag("matrix"),
            Err(ParseError::UnknownKind("matrix".to_string()))
        );
        for kind in ValueKind::iter() {
            assert_eq!(ValueKind::from_tag(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn test_scalar_parse_errors() {
        assert!(matches!(
            TypedValue::parse(ValueKind::Double, "1.0.0"),
            Err(ParseError::InvalidNumber { kind: ValueKind::Double, .. })
        ));
        assert!(TypedValue::parse(ValueKind::UInt, "-1").is_err());
        assert!(TypedValue::parse(ValueKind::Int, "3.5").is_err());
        assert_eq!(
            TypedValue::parse(ValueKind::Bool, "yes"),
            Err(ParseError::InvalidBool("yes".to_string()))
        );
        assert!(TypedValue::parse(ValueKind::Char, "ab").is_err());
        assert!(matches!(
            TypedValue::parse(ValueKind::Float, "1e40"),
            Err(ParseError::InvalidNumber { kind: ValueKind::Float, .. })
        ));
        assert!(TypedValue::parse(ValueKind::Time, "NaN").is_err());
        assert_eq!(
            TypedValue::parse(ValueKind::Int, " 17 ").unwrap(),
            TypedValue::Int(17)
        );
    }

    #[test]
    fn test_bool_spellings() {
        for (text, expected) in [("1", true), ("TRUE", true), ("0", false), ("False", false)] {
            assert_eq!(
                TypedValue::parse(ValueKind::Bool, text).unwrap(),
                TypedValue::Bool(expected)
            );
        }
    }

    #[test]
    fn test_typed_extraction() {
        let v = TypedValue::from(2.5f64);
        assert_eq!(v.get::<f64>(), Some(2.5));
        assert_eq!(v.get::<f32>(), None);
        assert_eq!(v.get::<i32>(), None);
        assert_eq!(TypedValue::from("abc").get::<String>().as_deref(), Some("abc"));
    }
}
