//! Single-value holder used while dispatching an update message.

use crate::error::{ParamError, Result};
use crate::value::{ParamValue, TypedValue};

/// Holds the most recently decoded message value, and nothing else.
#[derive(Debug, Default)]
pub struct ValueSlot {
    value: Option<TypedValue>,
}

impl ValueSlot {
    /// Replace the held value and return a reference to it.
    pub fn store(&mut self, value: TypedValue) -> &TypedValue {
        self.value.insert(value)
    }

    pub fn get(&self) -> Option<&TypedValue> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<TypedValue> {
        self.value.take()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Strictly typed read of the held value on behalf of `key`.
    pub fn cast<T: ParamValue>(&self, key: &str) -> Result<T> {
        match &self.value {
            Some(value) => any_cast(key, value),
            None => Err(ParamError::IncompleteMessageEntry(key.to_string())),
        }
    }
}

/// Extract `T` from `value` with no conversion between kinds.
pub fn any_cast<T: ParamValue>(key: &str, value: &TypedValue) -> Result<T> {
    T::from_value(value).ok_or_else(|| ParamError::TypeMismatch {
        key: key.to_string(),
        expected: T::KIND,
        actual: value.kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::value::ValueKind;

    #[test]
    fn test_holds_latest_value() {
        let mut slot = ValueSlot::default();
        assert!(slot.is_empty());
        slot.store(TypedValue::Int(1));
        slot.store(TypedValue::Double(2.0));
        assert_eq!(slot.get(), Some(&TypedValue::Double(2.0)));
        assert_eq!(slot.take(), Some(TypedValue::Double(2.0)));
        assert!(slot.is_empty());
    }

    #[test]
    fn test_cast_is_strict() {
        let mut slot = ValueSlot::default();
        slot.store(TypedValue::Int(5));
        assert_eq!(slot.cast::<i32>("k").unwrap(), 5);
        assert_eq!(
            slot.cast::<f64>("k"),
            Err(ParamError::TypeMismatch {
                key: "k".into(),
                expected: ValueKind::Double,
                actual: ValueKind::Int,
            })
        );
        assert!(ValueSlot::default().cast::<f64>("k").is_err());
        assert!(any_cast::<Vector3>("g", &TypedValue::String("0 0 1".into())).is_err());
    }
}
