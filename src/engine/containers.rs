// Copyright 2025 Cowboy AI, LLC.

//! Collections, maps and object/map flattening
//!
//! Elements are mapped one by one into a container created by the
//! destination builder. When the destination field already holds a
//! collection and the relationship is cumulative, existing elements are kept
//! (minus orphans when asked) and mapped elements not already present are
//! added. Sets collapse duplicates in every case.

use tracing::trace;

use super::field_mapper::ValueOptions;
use super::MappingRun;
use crate::errors::{MappingError, MappingResult};
use crate::rules::Relationship;
use crate::types::TypeRef;
use crate::value::{insert_entry, insert_unique, ObjectRef, Value};

fn entry_label(key: &Value) -> String {
    match key {
        Value::Str(s) => format!("[{}]", s),
        Value::Int(i) => format!("[{}]", i),
        other => format!("[{}]", other.kind_name()),
    }
}

impl MappingRun<'_> {
    pub(super) fn map_sequence(
        &mut self,
        items: &[Value],
        existing: &Value,
        target: &TypeRef,
        options: &ValueOptions<'_>,
    ) -> MappingResult<Value> {
        let inner = self.inner;
        let element_type = target.element_type().cloned().unwrap_or(TypeRef::Any);

        let mut mapped = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let value = self
                .convert_value(item, &Value::Null, &element_type, options)
                .map_err(|e| e.at(target.to_string(), format!("[{}]", index)))?;
            mapped.push(value);
        }

        let mut elements = match inner.builder.create_container(target)? {
            Value::List(elements) | Value::Set(elements) => elements,
            other => {
                return Err(MappingError::instantiation(
                    target,
                    format!("builder produced a {} instead of a sequence", other.kind_name()),
                ))
            }
        };
        let is_set = matches!(target, TypeRef::Set(_));
        let previous: &[Value] = match (options.relationship, existing.as_elements()) {
            (Relationship::Cumulative, Some(previous)) => previous,
            _ => &[],
        };

        for element in previous {
            if options.remove_orphans && !mapped.contains(element) {
                trace!(orphan = element.kind_name(), "dropping orphaned element");
                continue;
            }
            if is_set {
                insert_unique(&mut elements, element.clone());
            } else {
                elements.push(element.clone());
            }
        }
        let merge = is_set || !previous.is_empty();
        for element in mapped {
            if merge {
                insert_unique(&mut elements, element);
            } else {
                elements.push(element);
            }
        }

        Ok(match target {
            TypeRef::Set(_) => Value::Set(elements),
            _ => Value::List(elements),
        })
    }

    pub(super) fn map_entries(
        &mut self,
        entries: &[(Value, Value)],
        existing: &Value,
        target: &TypeRef,
        options: &ValueOptions<'_>,
    ) -> MappingResult<Value> {
        let TypeRef::Map(key_type, value_type) = target else {
            return Err(MappingError::conversion("Map", target, "not a map type"));
        };
        let inner = self.inner;

        let mut mapped = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let label = entry_label(key);
            let key = self
                .convert_value(key, &Value::Null, key_type, options)
                .map_err(|e| e.at(target.to_string(), label.clone()))?;
            let current = existing.map_get(&key).cloned().unwrap_or(Value::Null);
            let value = self
                .convert_value(value, &current, value_type, options)
                .map_err(|e| e.at(target.to_string(), label))?;
            mapped.push((key, value));
        }

        let mut out = match inner.builder.create_container(target)? {
            Value::Map(out) => out,
            other => {
                return Err(MappingError::instantiation(
                    target,
                    format!("builder produced a {} instead of a map", other.kind_name()),
                ))
            }
        };
        if let (Relationship::Cumulative, Some(previous)) = (options.relationship, existing.as_entries()) {
            for (key, value) in previous {
                if options.remove_orphans && !mapped.iter().any(|(k, _)| k == key) {
                    continue;
                }
                insert_entry(&mut out, key.clone(), value.clone());
            }
        }
        for (key, value) in mapped {
            insert_entry(&mut out, key, value);
        }
        Ok(Value::Map(out))
    }

    /// Flatten an object into a map of field name to converted value
    pub(super) fn object_to_map(
        &mut self,
        object: &ObjectRef,
        target: &TypeRef,
        options: &ValueOptions<'_>,
    ) -> MappingResult<Value> {
        let TypeRef::Map(key_type, value_type) = target else {
            return Err(MappingError::conversion(object.class(), target, "not a map type"));
        };
        if !self.ctx.enter_flattening(object) {
            return Err(MappingError::conversion(
                object.class(),
                target,
                "cyclic object graph cannot be flattened into a map",
            ));
        }

        let class = object.class();
        let mut flattened = || -> MappingResult<Value> {
            let mut out = match self.inner.builder.create_container(target)? {
                Value::Map(out) => out,
                other => {
                    return Err(MappingError::instantiation(
                        target,
                        format!("builder produced a {} instead of a map", other.kind_name()),
                    ))
                }
            };
            for (name, value) in object.snapshot() {
                let key = self
                    .convert_value(&Value::Str(name.clone()), &Value::Null, key_type, options)
                    .map_err(|e| e.at(class.clone(), name.clone()))?;
                let value = self
                    .convert_value(&value, &Value::Null, value_type, options)
                    .map_err(|e| e.at(class.clone(), name.clone()))?;
                insert_entry(&mut out, key, value);
            }
            Ok(Value::Map(out))
        };
        let result = flattened();
        self.ctx.exit_flattening(object);
        result
    }

    /// Build an object of a class from a map with string keys
    pub(super) fn map_to_object(
        &mut self,
        entries: &[(Value, Value)],
        class: &str,
        existing: Option<&ObjectRef>,
        options: &ValueOptions<'_>,
    ) -> MappingResult<Value> {
        let inner = self.inner;
        let adoptable = existing.filter(|e| inner.catalog.distance(&e.class(), class).is_some());
        let destination = match adoptable {
            Some(existing) => existing.clone(),
            None => inner.builder.create_object(class)?,
        };
        self.map_entries_into_object(entries, &destination, options)?;
        Ok(Value::Object(destination))
    }

    /// Write map entries into same-named properties; unknown keys are ignored
    pub(super) fn map_entries_into_object(
        &mut self,
        entries: &[(Value, Value)],
        destination: &ObjectRef,
        options: &ValueOptions<'_>,
    ) -> MappingResult<()> {
        let inner = self.inner;
        let class = destination.class();
        for (key, value) in entries {
            let Value::Str(name) = key else {
                return Err(MappingError::conversion(
                    key.runtime_type(),
                    &class,
                    "map keys must be strings to populate an object",
                ));
            };
            let writer = match inner.accessors.accessor_for(&class, name) {
                Ok(writer) => writer,
                Err(err) => {
                    trace!(key = %name, error = %err, "ignoring map entry without property");
                    continue;
                }
            };
            let current = writer.read(destination)?;
            let converted = self
                .convert_value(value, &current, writer.declared_type(), options)
                .map_err(|e| e.at(class.clone(), name.clone()))?;
            writer
                .write(destination, converted)
                .map_err(|e| e.at(class.clone(), name.clone()))?;
        }
        Ok(())
    }
}
