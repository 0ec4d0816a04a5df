//! Named, typed parameter handles.
//!
//! A `Param` stores its value as a [`TypedValue`] whose tag always equals the
//! handle's declared [`ValueKind`]. Writes go through the canonical string form
//! so the text and typed views never diverge; reads check the tag before
//! touching the payload.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ParamError, Result};
use crate::registry::ParamRegistry;
use crate::value::{ParamValue, TypedValue, ValueKind};

/// Shared handle to a parameter, as held by description elements.
pub type ParamPtr = Arc<RwLock<Param>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    key: String,
    kind: ValueKind,
    required: bool,
    set: bool,
    description: String,
    default: TypedValue,
    value: TypedValue,
}

/// Generates the per-kind tag predicates.
macro_rules! impl_kind_predicates {
    ($($method:ident => $kind:ident),* $(,)?) => {
        impl Param {
            $(
                #[doc = concat!("Whether this parameter is tagged `", stringify!($kind), "`.")]
                pub fn $method(&self) -> bool {
                    self.is_kind(ValueKind::$kind)
                }
            )*
        }
    };
}

impl_kind_predicates! {
    is_bool => Bool,
    is_int => Int,
    is_uint => UInt,
    is_float => Float,
    is_double => Double,
    is_char => Char,
    is_str => String,
    is_vector3 => Vector3,
    is_vector2i => Vector2i,
    is_vector2d => Vector2d,
    is_quaternion => Quaternion,
    is_pose => Pose,
    is_color => Color,
    is_time => Time,
}

impl Param {
    /// Create a parameter of `kind` whose default is parsed from `default`.
    pub fn new(
        key: impl Into<String>,
        kind: ValueKind,
        default: &str,
        required: bool,
        description: impl Into<String>,
    ) -> Result<Self> {
        let key = key.into();
        let default = TypedValue::parse(kind, default).map_err(|source| ParamError::Parse {
            key: key.clone(),
            source,
        })?;
        Ok(Self {
            key,
            kind,
            required,
            set: false,
            description: description.into(),
            value: default.clone(),
            default,
        })
    }

    /// Create a shared parameter and record it in `registry` when one is given.
    pub fn create(
        key: impl Into<String>,
        kind: ValueKind,
        default: &str,
        required: bool,
        description: impl Into<String>,
        registry: Option<&mut ParamRegistry>,
    ) -> Result<ParamPtr> {
        let param = Arc::new(RwLock::new(Self::new(
            key,
            kind,
            default,
            required,
            description,
        )?));
        if let Some(registry) = registry {
            registry.register(&param);
        }
        Ok(param)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Type tag as text, e.g. `"unsigned int"`.
    pub fn type_name(&self) -> &'static str {
        self.kind.into()
    }

    pub fn is_kind(&self, kind: ValueKind) -> bool {
        self.kind == kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// True once a value has been assigned, regardless of the default.
    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn value(&self) -> &TypedValue {
        &self.value
    }

    pub fn default_value(&self) -> &TypedValue {
        &self.default
    }

    pub fn as_string(&self) -> String {
        self.value.to_string()
    }

    pub fn default_as_string(&self) -> String {
        self.default.to_string()
    }

    /// Parse `text` according to this parameter's kind and store it.
    ///
    /// On failure the error is logged and the current value is kept.
    pub fn set_from_string(&mut self, text: &str) -> bool {
        match self.try_set_from_string(text) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{}", e);
                false
            }
        }
    }

    pub fn try_set_from_string(&mut self, text: &str) -> Result<()> {
        let value = TypedValue::parse(self.kind, text).map_err(|source| ParamError::Parse {
            key: self.key.clone(),
            source,
        })?;
        self.value = value;
        self.set = true;
        Ok(())
    }

    /// Store a typed value through its canonical string form.
    ///
    /// Any `T` is accepted as long as its text parses as this parameter's
    /// kind, so an `i32` can be written to a `double` parameter.
    pub fn set<T: ParamValue>(&mut self, value: T) -> bool {
        self.set_from_string(&value.into_value().to_string())
    }

    /// Read the value as `T`.
    ///
    /// The tag must match `T`, except for the vector kinds: reading a
    /// `Vector3`, `Vector2i` or `Vector2d` from a parameter of another kind
    /// re-parses its current text instead of failing.
    pub fn get<T: ParamValue>(&self) -> Result<T> {
        let result = self.lookup::<T>();
        if let Err(e) = &result {
            tracing::error!("{}", e);
        }
        result
    }

    /// Boolean form of [`Param::get`]; `out` is only written on success.
    pub fn get_into<T: ParamValue>(&self, out: &mut T) -> bool {
        match self.get::<T>() {
            Ok(v) => {
                *out = v;
                true
            }
            Err(_) => false,
        }
    }

    fn lookup<T: ParamValue>(&self) -> Result<T> {
        if self.kind == T::KIND {
            return T::from_value(&self.value).ok_or_else(|| self.mismatch(T::KIND));
        }
        if T::KIND.is_vector() {
            let parsed = TypedValue::parse(T::KIND, &self.as_string()).map_err(|source| {
                ParamError::Parse {
                    key: self.key.clone(),
                    source,
                }
            })?;
            return T::from_value(&parsed).ok_or_else(|| self.mismatch(T::KIND));
        }
        Err(self.mismatch(T::KIND))
    }

    fn mismatch(&self, expected: ValueKind) -> ParamError {
        ParamError::TypeMismatch {
            key: self.key.clone(),
            expected,
            actual: self.kind,
        }
    }

    /// Restore the default value and clear the set flag.
    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.set = false;
    }

    /// Copy of this parameter as a new shared handle, registered in
    /// `registry` if one is given.
    pub fn clone_detached(&self, registry: Option<&mut ParamRegistry>) -> ParamPtr {
        let param = Arc::new(RwLock::new(self.clone()));
        if let Some(registry) = registry {
            registry.register(&param);
        }
        param
    }
}
