// Copyright 2025 Cowboy AI, LLC.

//! Runtime values of the source and destination graphs
//!
//! Scalars and containers are plain values. Objects are shared through
//! [`ObjectRef`], a thread-safe handle with reference identity, so graphs can
//! hold shared references and cycles the same way the models they stand for do.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::json;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::types::{FloatWidth, IntWidth, TypeRef};

/// Identity token of an object instance
///
/// Stable for as long as at least one [`ObjectRef`] to the instance is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// A class instance: a class name plus ordered named fields
#[derive(Clone, Default)]
pub struct Object {
    class: String,
    fields: IndexMap<String, Value>,
}

impl Object {
    /// Create an empty instance of a class
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Class name of this instance
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Field value, if the field is present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Check if a field is present
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is present
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(&self.class);
        for (name, value) in &self.fields {
            s.field(name, value);
        }
        s.finish()
    }
}

/// Shared handle to an [`Object`]
///
/// Cloning the handle shares the instance. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Wrap an object into a new shared instance
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// Create an empty instance of a class
    pub fn of(class: impl Into<String>) -> Self {
        Self::new(Object::new(class))
    }

    /// Identity token of the instance
    pub fn id(&self) -> ObjectId {
        ObjectId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Check whether two handles point at the same instance
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Class name of the instance
    pub fn class(&self) -> String {
        self.0.read().class.clone()
    }

    /// Field value, `Null` when absent
    pub fn get(&self, field: &str) -> Value {
        self.0.read().get(field).cloned().unwrap_or(Value::Null)
    }

    /// Set a field value
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.write().set(field, value.into());
    }

    /// Shared read access
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    /// Exclusive write access
    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    /// Snapshot of the present fields
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .fields()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // shallow: nested graphs may be cyclic
        write!(f, "{}{}", self.class(), self.id())
    }
}

impl From<Object> for ObjectRef {
    fn from(object: Object) -> Self {
        ObjectRef::new(object)
    }
}

/// A runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer of any width
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Single character
    Char(char),
    /// Text
    Str(String),
    /// Calendar date
    Date(NaiveDate),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// Enum variant
    Enum {
        /// Enum type name
        type_name: String,
        /// Variant name
        variant: String,
    },
    /// Shared object instance
    Object(ObjectRef),
    /// Ordered elements
    List(Vec<Value>),
    /// Elements without duplicates, insertion ordered
    Set(Vec<Value>),
    /// Entries with unique keys, insertion ordered
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Enum variant value
    pub fn enum_variant(type_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Value::Enum {
            type_name: type_name.into(),
            variant: variant.into(),
        }
    }

    /// Build a set, collapsing duplicates
    pub fn set_of(items: impl IntoIterator<Item = Value>) -> Self {
        let mut elements = Vec::new();
        for item in items {
            insert_unique(&mut elements, item);
        }
        Value::Set(elements)
    }

    /// Build a map, later keys replacing earlier equal keys
    pub fn map_of(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut out = Vec::new();
        for (k, v) in entries {
            insert_entry(&mut out, k, v);
        }
        Value::Map(out)
    }

    /// Check for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's variant
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Enum { .. } => "enum",
            Value::Object(_) => "object",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    /// Runtime type of the value
    ///
    /// Integers report `i64`, floats `f64`. Containers report the element
    /// type shared by all non-null elements, or `Any`.
    pub fn runtime_type(&self) -> TypeRef {
        match self {
            Value::Null => TypeRef::Any,
            Value::Bool(_) => TypeRef::Bool,
            Value::Int(_) => TypeRef::Int(IntWidth::I64),
            Value::Float(_) => TypeRef::Float(FloatWidth::F64),
            Value::Char(_) => TypeRef::Char,
            Value::Str(_) => TypeRef::String,
            Value::Date(_) => TypeRef::Date,
            Value::DateTime(_) => TypeRef::DateTime,
            Value::Enum { type_name, .. } => TypeRef::Enum(type_name.clone()),
            Value::Object(o) => TypeRef::Class(o.class()),
            Value::List(items) => TypeRef::list(common_type(items.iter())),
            Value::Set(items) => TypeRef::set(common_type(items.iter())),
            Value::Map(entries) => TypeRef::map(
                common_type(entries.iter().map(|(k, _)| k)),
                common_type(entries.iter().map(|(_, v)| v)),
            ),
        }
    }

    /// Text content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float content
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean content
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Elements of a list or set
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Entries of a map
    pub fn as_entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Value stored under a key of a map value
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        self.as_entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Build a value from JSON
    ///
    /// JSON objects become maps keyed by strings; numbers become `Int` when
    /// they are integral and `Float` otherwise.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (Value::Str(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render the value as JSON
    ///
    /// Objects render as JSON objects with a `$type` member. An object that is
    /// reached again while it is still being rendered renders as `{"$ref": id}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = HashSet::new();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut HashSet<ObjectId>) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::Char(c) => json!(c.to_string()),
            Value::Str(s) => json!(s),
            Value::Date(d) => json!(d.to_string()),
            Value::DateTime(dt) => json!(dt.to_rfc3339()),
            Value::Enum { variant, .. } => json!(variant),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_inner(path)).collect())
            }
            Value::Map(entries) => {
                let mut out = serde_json::Map::new();
                for (k, v) in entries {
                    let key = match k {
                        Value::Str(s) => s.clone(),
                        other => other.to_json_inner(path).to_string(),
                    };
                    out.insert(key, v.to_json_inner(path));
                }
                serde_json::Value::Object(out)
            }
            Value::Object(o) => {
                let id = o.id();
                if !path.insert(id) {
                    return json!({ "$ref": id.to_string() });
                }
                let mut out = serde_json::Map::new();
                out.insert("$type".to_string(), json!(o.class()));
                for (name, value) in o.snapshot() {
                    out.insert(name, value.to_json_inner(path));
                }
                path.remove(&id);
                serde_json::Value::Object(out)
            }
        }
    }
}

fn common_type<'a>(values: impl Iterator<Item = &'a Value>) -> TypeRef {
    let mut common: Option<TypeRef> = None;
    for value in values {
        if value.is_null() {
            continue;
        }
        let ty = value.runtime_type();
        match &common {
            None => common = Some(ty),
            Some(existing) if *existing == ty => {}
            Some(_) => return TypeRef::Any,
        }
    }
    common.unwrap_or(TypeRef::Any)
}

/// Push an element unless an equal one is already present
///
/// Returns `true` when the element was added.
pub fn insert_unique(elements: &mut Vec<Value>, value: Value) -> bool {
    if elements.contains(&value) {
        return false;
    }
    elements.push(value);
    true
}

/// Insert or replace a map entry
pub fn insert_entry(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (
                Value::Enum { type_name: ta, variant: va },
                Value::Enum { type_name: tb, variant: vb },
            ) => ta == tb && va == vb,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a.len() == b.len() && a.iter().all(|v| b.contains(v)),
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.iter().any(|(kb, vb)| k == kb && v == vb))
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(ObjectRef::new(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
