// Copyright 2025 Cowboy AI, LLC.

//! Property access
//!
//! Field paths are resolved once per `(class, path)` into a
//! [`PropertyAccessor`] that reads and writes values on instances. Paths are
//! dotted (`address.city`) and may index sequences (`lines[0].amount`).

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::builder::DestinationBuilder;
use crate::catalog::TypeCatalog;
use crate::errors::{MappingError, MappingResult};
use crate::types::TypeRef;
use crate::value::{ObjectRef, Value};

/// Reads and writes one property path on instances of one class
pub trait PropertyAccessor: Send + Sync + fmt::Debug {
    /// The path this accessor was resolved for
    fn path(&self) -> &str;

    /// Declared type of the property at the end of the path
    fn declared_type(&self) -> &TypeRef;

    /// Read the property; `Null` when an intermediate object is absent
    fn read(&self, target: &ObjectRef) -> MappingResult<Value>;

    /// Write the property, creating absent intermediate objects
    fn write(&self, target: &ObjectRef, value: Value) -> MappingResult<()>;
}

/// Resolves accessors and enumerates properties
pub trait AccessorResolver: Send + Sync {
    /// Resolve an accessor for a path on a class
    ///
    /// # Errors
    ///
    /// Returns an access error when the path cannot be resolved on the class.
    fn accessor_for(&self, class: &str, path: &str) -> MappingResult<Arc<dyn PropertyAccessor>>;

    /// Top-level properties of a class with their declared types
    fn properties(&self, class: &str) -> MappingResult<Vec<(String, TypeRef)>>;
}

/// One segment of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Field name
    pub field: String,
    /// Optional sequence index
    pub index: Option<usize>,
}

/// Parse a field path into segments
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, String> {
    if path.is_empty() {
        return Err("empty path".to_string());
    }
    path.split('.')
        .map(|raw| {
            let (field, index) = match raw.find('[') {
                Some(open) => {
                    let close = raw
                        .strip_suffix(']')
                        .ok_or_else(|| format!("unterminated index in '{}'", raw))?;
                    let index = close[open + 1..]
                        .parse::<usize>()
                        .map_err(|_| format!("invalid index in '{}'", raw))?;
                    (&raw[..open], Some(index))
                }
                None => (raw, None),
            };
            if field.is_empty() {
                return Err(format!("empty segment in '{}'", path));
            }
            Ok(PathSegment {
                field: field.to_string(),
                index,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Step {
    field: String,
    index: Option<usize>,
    // type after indexing
    ty: TypeRef,
}

/// Accessor produced by [`CatalogAccessorResolver`]
struct PathAccessor {
    class: String,
    path: String,
    steps: Vec<Step>,
    builder: Arc<dyn DestinationBuilder>,
}

impl fmt::Debug for PathAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathAccessor")
            .field("class", &self.class)
            .field("path", &self.path)
            .finish()
    }
}

impl PathAccessor {
    fn access_error(&self, message: impl Into<String>) -> MappingError {
        MappingError::access(self.class.clone(), self.path.clone(), message)
    }

    fn read_step(&self, object: &ObjectRef, step: &Step) -> MappingResult<Value> {
        let value = object.get(&step.field);
        match step.index {
            None => Ok(value),
            Some(i) => match value {
                Value::Null => Ok(Value::Null),
                Value::List(items) | Value::Set(items) => {
                    Ok(items.get(i).cloned().unwrap_or(Value::Null))
                }
                other => Err(self.access_error(format!(
                    "cannot index into {} at '{}'",
                    other.kind_name(),
                    step.field
                ))),
            },
        }
    }

    fn write_step(&self, object: &ObjectRef, step: &Step, value: Value) -> MappingResult<()> {
        let Some(i) = step.index else {
            object.set(step.field.clone(), value);
            return Ok(());
        };
        let mut guard = object.write();
        let slot = guard
            .get(&step.field)
            .cloned()
            .unwrap_or(Value::Null);
        let updated = match slot {
            Value::Null => {
                let mut items = vec![Value::Null; i + 1];
                items[i] = value;
                Value::List(items)
            }
            Value::List(mut items) => {
                if items.len() <= i {
                    items.resize(i + 1, Value::Null);
                }
                items[i] = value;
                Value::List(items)
            }
            Value::Set(mut items) => {
                if items.len() <= i {
                    items.resize(i + 1, Value::Null);
                }
                items[i] = value;
                Value::Set(items)
            }
            other => {
                return Err(self.access_error(format!(
                    "cannot index into {} at '{}'",
                    other.kind_name(),
                    step.field
                )))
            }
        };
        guard.set(step.field.clone(), updated);
        Ok(())
    }
}

impl PropertyAccessor for PathAccessor {
    fn path(&self) -> &str {
        &self.path
    }

    fn declared_type(&self) -> &TypeRef {
        // resolution guarantees at least one step
        &self.steps[self.steps.len() - 1].ty
    }

    fn read(&self, target: &ObjectRef) -> MappingResult<Value> {
        let mut current = target.clone();
        let last = self.steps.len() - 1;
        for (i, step) in self.steps.iter().enumerate() {
            let value = self.read_step(&current, step)?;
            if i == last {
                return Ok(value);
            }
            current = match value {
                Value::Null => return Ok(Value::Null),
                Value::Object(next) => next,
                other => {
                    return Err(self.access_error(format!(
                        "expected an object at '{}', found {}",
                        step.field,
                        other.kind_name()
                    )))
                }
            };
        }
        Ok(Value::Null)
    }

    fn write(&self, target: &ObjectRef, value: Value) -> MappingResult<()> {
        let mut current = target.clone();
        let last = self.steps.len() - 1;
        for step in &self.steps[..last] {
            current = match self.read_step(&current, step)? {
                Value::Object(next) => next,
                Value::Null => {
                    let class = step.ty.class_name().ok_or_else(|| {
                        self.access_error(format!("'{}' is not an object property", step.field))
                    })?;
                    let created = self.builder.create_object(class)?;
                    self.write_step(&current, step, Value::Object(created.clone()))?;
                    created
                }
                other => {
                    return Err(self.access_error(format!(
                        "expected an object at '{}', found {}",
                        step.field,
                        other.kind_name()
                    )))
                }
            };
        }
        self.write_step(&current, &self.steps[last], value)
    }
}

/// Accessor resolver backed by the type catalog
///
/// Resolved accessors are cached per `(class, path)`; the catalog is
/// immutable so a resolution never changes.
pub struct CatalogAccessorResolver {
    catalog: Arc<TypeCatalog>,
    builder: Arc<dyn DestinationBuilder>,
    resolved: DashMap<(String, String), Arc<dyn PropertyAccessor>>,
}

impl CatalogAccessorResolver {
    /// Create a resolver; the builder creates absent intermediate objects
    pub fn new(catalog: Arc<TypeCatalog>, builder: Arc<dyn DestinationBuilder>) -> Self {
        Self {
            catalog,
            builder,
            resolved: DashMap::new(),
        }
    }

    /// Number of cached resolutions
    pub fn cached(&self) -> usize {
        self.resolved.len()
    }

    fn resolve(&self, class: &str, path: &str) -> MappingResult<PathAccessor> {
        let segments =
            parse_path(path).map_err(|message| MappingError::access(class, path, message))?;
        if self.catalog.class(class).is_none() {
            return Err(MappingError::access(class, path, "class is not catalogued"));
        }

        let mut steps = Vec::with_capacity(segments.len());
        let mut owner = class.to_string();
        let last = segments.len() - 1;
        for (i, segment) in segments.into_iter().enumerate() {
            let declared = self
                .catalog
                .field_type(&owner, &segment.field)
                .cloned()
                .ok_or_else(|| {
                    MappingError::access(
                        class,
                        path,
                        format!("no property '{}' on {}", segment.field, owner),
                    )
                })?;
            let ty = match segment.index {
                None => declared,
                Some(_) => declared.element_type().cloned().ok_or_else(|| {
                    MappingError::access(
                        class,
                        path,
                        format!("property '{}' is not a sequence", segment.field),
                    )
                })?,
            };
            if i < last {
                owner = ty
                    .class_name()
                    .ok_or_else(|| {
                        MappingError::access(
                            class,
                            path,
                            format!("cannot traverse into '{}' of type {}", segment.field, ty),
                        )
                    })?
                    .to_string();
            }
            steps.push(Step {
                field: segment.field,
                index: segment.index,
                ty,
            });
        }

        Ok(PathAccessor {
            class: class.to_string(),
            path: path.to_string(),
            steps,
            builder: self.builder.clone(),
        })
    }
}

impl AccessorResolver for CatalogAccessorResolver {
    fn accessor_for(&self, class: &str, path: &str) -> MappingResult<Arc<dyn PropertyAccessor>> {
        let key = (class.to_string(), path.to_string());
        if let Some(found) = self.resolved.get(&key) {
            return Ok(found.value().clone());
        }
        let accessor: Arc<dyn PropertyAccessor> = Arc::new(self.resolve(class, path)?);
        self.resolved.insert(key, accessor.clone());
        Ok(accessor)
    }

    fn properties(&self, class: &str) -> MappingResult<Vec<(String, TypeRef)>> {
        if self.catalog.class(class).is_none() {
            return Err(MappingError::access(class, "*", "class is not catalogued"));
        }
        Ok(self.catalog.fields(class))
    }
}
