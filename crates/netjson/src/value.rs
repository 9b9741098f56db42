use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Number;

/// Object members, kept in key order so encoded output is deterministic.
pub type Map = BTreeMap<String, Value>;

/// A JSON document tree that can also hold channels.
///
/// When used as a decode destination the existing tree acts as a template:
/// channel slots stay channel slots and are filled through the configured
/// [`ChannelDecoder`](crate::ChannelDecoder), everything else is replaced by
/// whatever the input holds.
#[derive(Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Channel(Channel),
}

impl Value {
    /// Name of this value's type as reported in type mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Channel(channel) => channel.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Value::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    pub fn as_channel_mut(&mut self) -> Option<&mut Channel> {
        match self {
            Value::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    /// Look up an object member.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    /// Mutably look up an object member.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Object(map) => map.get_mut(key),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Channel> for Value {
    fn from(channel: Channel) -> Self {
        Value::Channel(channel)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Object(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

/// An opaque, runtime-typed value with no JSON representation of its own.
///
/// A channel is either live (it owns a handle) or nil (it only records the
/// type it is declared to hold). Nil channels are how a decode destination
/// is pre-allocated: the decoder overwrites the slot in place.
pub struct Channel {
    type_name: &'static str,
    handle: Option<Box<dyn Any + Send>>,
}

impl Channel {
    /// A live channel owning `handle`.
    pub fn new<T: Any + Send>(handle: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            handle: Some(Box::new(handle)),
        }
    }

    /// A nil channel declared to hold a `T`.
    pub fn nil<T: Any + Send>() -> Self {
        Self {
            type_name: type_name::<T>(),
            handle: None,
        }
    }

    /// The declared type of this channel.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_nil(&self) -> bool {
        self.handle.is_none()
    }

    /// Borrow the handle if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.as_deref()?.downcast_ref()
    }

    /// Mutably borrow the handle if it is a `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.handle.as_deref_mut()?.downcast_mut()
    }

    /// Take the handle out, leaving a nil channel of the same declared type.
    pub fn take(&mut self) -> Option<Box<dyn Any + Send>> {
        self.handle.take()
    }

    /// Drop the handle, leaving a nil channel of the same declared type.
    pub fn clear(&mut self) {
        self.handle = None;
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("type_name", &self.type_name)
            .field("nil", &self.is_nil())
            .finish()
    }
}
