//! The JSON value tree.

use std::str::FromStr;

use super::{Error, Kind, Result};

/// Object members in insertion order.
///
/// Keys are unique: inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a member, replacing the value of an existing key.
    ///
    /// Returns the previous value, if any. A replaced member keeps its
    /// original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns true if the map has a member named `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of members.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no members.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for Map {
    // Members compare as a set of key/value pairs; order is irrelevant.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A JSON value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// `null`
    #[default]
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// Integer number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    String(String),
    /// Array.
    Array(Vec<Value>),
    /// Object.
    Object(Map),
}

impl Value {
    /// Creates an empty value of the given kind.
    ///
    /// Scalars start out as zero, `false` or the empty string.
    #[must_use]
    pub const fn new(kind: Kind) -> Self {
        match kind {
            Kind::Null => Self::Null,
            Kind::Bool => Self::Bool(false),
            Kind::Int => Self::Int(0),
            Kind::Float => Self::Float(0.0),
            Kind::String => Self::String(String::new()),
            Kind::Array => Self::Array(Vec::new()),
            Kind::Object => Self::Object(Map::new()),
        }
    }

    /// Creates an empty object.
    #[must_use]
    pub const fn object() -> Self {
        Self::Object(Map::new())
    }

    /// Creates an empty array.
    #[must_use]
    pub const fn empty_array() -> Self {
        Self::Array(Vec::new())
    }

    /// Creates a string from bytes taken as ASCII.
    ///
    /// Bytes outside the ASCII range become `?`.
    #[must_use]
    pub fn from_ascii(bytes: &[u8]) -> Self {
        Self::String(
            bytes
                .iter()
                .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
                .collect(),
        )
    }

    /// Returns the variant this value holds.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::String(_) => Kind::String,
            Self::Array(_) => Kind::Array,
            Self::Object(_) => Kind::Object,
        }
    }

    /// Returns true for `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    const fn type_error(&self, expected: Kind) -> Error {
        Error::Type {
            expected,
            got: self.kind(),
        }
    }

    /// Returns the value as a 64-bit integer.
    ///
    /// Floats are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns a type error for non-numbers and a range error for floats
    /// outside the `i64` range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn to_long(&self) -> Result<i64> {
        match *self {
            Self::Int(n) => Ok(n),
            Self::Float(x) => {
                let t = x.trunc();
                // i64::MIN is exact as f64; i64::MAX rounds up to 2^63.
                if t >= i64::MIN as f64 && t < i64::MAX as f64 {
                    Ok(t as i64)
                } else {
                    Err(Error::Range { target: "i64" })
                }
            }
            _ => Err(self.type_error(Kind::Int)),
        }
    }

    /// Returns the value as a 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns a type error for non-numbers and a range error if the
    /// value does not fit in `i32`.
    pub fn to_int(&self) -> Result<i32> {
        let n = self.to_long()?;
        i32::try_from(n).map_err(|_| Error::Range { target: "i32" })
    }

    /// Returns the value as a float. Integers are converted.
    ///
    /// # Errors
    ///
    /// Returns a type error for non-numbers.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_double(&self) -> Result<f64> {
        match *self {
            Self::Float(x) => Ok(x),
            Self::Int(n) => Ok(n as f64),
            _ => Err(self.type_error(Kind::Float)),
        }
    }

    /// Returns the boolean.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not a boolean.
    pub fn to_bool(&self) -> Result<bool> {
        match *self {
            Self::Bool(b) => Ok(b),
            _ => Err(self.type_error(Kind::Bool)),
        }
    }

    /// Borrows the string.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not a string.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(self.type_error(Kind::String)),
        }
    }

    /// Takes the string out of the value.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not a string.
    pub fn into_string(self) -> Result<String> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.type_error(Kind::String)),
        }
    }

    /// Borrows the members of an object.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not an object.
    pub fn children(&self) -> Result<&Map> {
        match self {
            Self::Object(map) => Ok(map),
            _ => Err(self.type_error(Kind::Object)),
        }
    }

    /// Borrows the elements of an array.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not an array.
    pub fn array(&self) -> Result<&[Self]> {
        match self {
            Self::Array(items) => Ok(items),
            _ => Err(self.type_error(Kind::Array)),
        }
    }

    /// Returns a copy of the member named `key`, or `null` if absent.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not an object.
    pub fn get(&self, key: &str) -> Result<Self> {
        Ok(self.children()?.get(key).cloned().unwrap_or_default())
    }

    /// Inserts a member into an object, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not an object.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Self>) -> Result<()> {
        match self {
            Self::Object(map) => {
                map.insert(key, value.into());
                Ok(())
            }
            _ => Err(self.type_error(Kind::Object)),
        }
    }

    /// Appends an element to an array.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value is not an array.
    pub fn push_back(&mut self, value: impl Into<Self>) -> Result<()> {
        match self {
            Self::Array(items) => {
                items.push(value.into());
                Ok(())
            }
            _ => Err(self.type_error(Kind::Array)),
        }
    }

    /// Resets the value to `null`.
    pub fn clear(&mut self) {
        *self = Self::Null;
    }
}

impl PartialEq for Value {
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(n), Self::Float(x)) | (Self::Float(x), Self::Int(n)) => *n as f64 == *x,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Object(map)
    }
}

impl FromStr for Value {
    type Err = Error;

    /// Parses exactly one value; anything but whitespace after it is an
    /// error.
    fn from_str(s: &str) -> Result<Self> {
        super::Parser::new(s.chars()).load_all()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_new_by_kind() {
        assert_eq!(Value::new(Kind::Object), Value::object());
        assert_eq!(Value::new(Kind::Array), Value::empty_array());
        assert_eq!(Value::new(Kind::Null), Value::Null);
        assert_eq!(Value::new(Kind::String).as_str().unwrap(), "");
    }

    #[test]
    fn test_from_ascii_replaces_high_bytes() {
        let value = Value::from_ascii(b"caf\xc3\xa9!");
        assert_eq!(value.as_str().unwrap(), "caf??!");
    }

    #[test]
    fn test_type_error_message() {
        let value = Value::from(true);
        let err = value.to_int().unwrap_err();
        assert_eq!(
            err,
            Error::Type {
                expected: Kind::Int,
                got: Kind::Bool
            }
        );
        assert_eq!(err.to_string(), "expected int, got bool");
    }

    #[test]
    fn test_to_int_range() {
        assert_eq!(Value::from(i64::from(i32::MAX)).to_int().unwrap(), i32::MAX);
        assert_eq!(
            Value::from(i64::from(i32::MAX) + 1).to_int(),
            Err(Error::Range { target: "i32" })
        );
        assert_eq!(Value::from(i64::MIN).to_long().unwrap(), i64::MIN);
    }

    #[test]
    fn test_float_truncates_toward_zero() {
        assert_eq!(Value::from(2.7).to_int().unwrap(), 2);
        assert_eq!(Value::from(-2.7).to_int().unwrap(), -2);
        assert_eq!(Value::from(1e300).to_long(), Err(Error::Range { target: "i64" }));
        assert_eq!(Value::from(f64::NAN).to_long(), Err(Error::Range { target: "i64" }));
    }

    #[test]
    fn test_to_double_accepts_int() {
        assert!((Value::from(3).to_double().unwrap() - 3.0).abs() < f64::EPSILON);
        assert!(Value::from("3").to_double().is_err());
    }

    #[test]
    fn test_get_absent_is_null() {
        let mut obj = Value::object();
        obj.insert("a", 1).unwrap();
        assert_eq!(obj.get("a").unwrap(), Value::Int(1));
        assert!(obj.get("missing").unwrap().is_null());
    }

    #[test]
    fn test_get_on_array_is_type_error() {
        let err = Value::empty_array().get("a").unwrap_err();
        assert_eq!(err.to_string(), "expected object, got array");
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut obj = Value::object();
        obj.insert("a", 1).unwrap();
        obj.insert("b", 2).unwrap();
        obj.insert("a", 3).unwrap();
        let keys: Vec<_> = obj.children().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(obj.get("a").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_push_back() {
        let mut arr = Value::empty_array();
        arr.push_back("x").unwrap();
        arr.push_back(Value::Null).unwrap();
        assert_eq!(arr.array().unwrap().len(), 2);
        assert!(Value::object().push_back(1).is_err());
    }

    #[test]
    fn test_clear() {
        let mut value = Value::from("text");
        value.clear();
        assert!(value.is_null());
    }

    #[test]
    fn test_int_float_equality() {
        assert_eq!(Value::Int(3), Value::Float(3.0));
        assert_eq!(Value::Float(3.0), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Float(3.5));
        assert_ne!(Value::Int(0), Value::Null);
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let a: Map = [("x", Value::Int(1)), ("y", Value::Bool(true))]
            .into_iter()
            .collect();
        let b: Map = [("y", Value::Bool(true)), ("x", Value::Int(1))]
            .into_iter()
            .collect();
        assert_eq!(Value::from(a), Value::from(b.clone()));

        let c: Map = [("y", Value::Bool(true))].into_iter().collect();
        assert_ne!(Value::from(c), Value::from(b));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut original = Value::empty_array();
        original.push_back(Value::object()).unwrap();
        let copy = original.clone();
        original.push_back(1).unwrap();
        assert_eq!(copy.array().unwrap().len(), 1);
    }
}
