// Copyright 2025 Cowboy AI, LLC.

//! Object and field mapping
//!
//! A field value is resolved in this order:
//!
//! 1. the converter named by the field rule
//! 2. copy by reference, when the rule asks for it
//! 3. the most specific converter registered for the type pair
//! 4. the built-in scalar conversion table
//! 5. recursion into nested objects, through the call's identity map
//! 6. element-wise mapping of lists, sets, arrays and maps
//!
//! Anything else is a conversion error.

use tracing::trace;

use super::class_map_resolver::{EffectiveClassMap, ResolvedField};
use super::MappingRun;
use crate::converter::{convert_scalar, ConversionRequest, CustomConverter, ScalarContext};
use crate::errors::{MappingError, MappingResult};
use crate::events::{MappingEvent, MappingEventKind, Phase};
use crate::field_hook::FieldHookRequest;
use crate::rules::{FieldMap, GlobalConfiguration, NullPolicy, Relationship};
use crate::types::TypeRef;
use crate::value::{ObjectRef, Value};

/// Field settings that travel with a value into nested mappings
#[derive(Debug, Clone, Copy)]
pub(super) struct ValueOptions<'a> {
    /// Scope id for nested objects
    pub map_id: Option<&'a str>,
    pub parameter: Option<&'a str>,
    pub date_format: &'a str,
    pub explicit_format: Option<&'a str>,
    pub relationship: Relationship,
    pub remove_orphans: bool,
}

impl<'a> ValueOptions<'a> {
    fn for_field(rule: &'a FieldMap, class_map: &'a EffectiveClassMap) -> Self {
        Self {
            map_id: rule.map_id.as_deref(),
            parameter: rule.converter_param.as_deref(),
            date_format: rule
                .date_format
                .as_deref()
                .unwrap_or(&class_map.policies.date_format),
            explicit_format: rule
                .date_format
                .as_deref()
                .or(class_map.class_date_format.as_deref()),
            relationship: rule.relationship.unwrap_or(class_map.policies.relationship),
            remove_orphans: rule.remove_orphans,
        }
    }

    fn top_level(global: &'a GlobalConfiguration, scope: Option<&'a str>) -> Self {
        Self {
            map_id: scope,
            parameter: None,
            date_format: &global.date_format,
            explicit_format: None,
            relationship: global.relationship,
            remove_orphans: false,
        }
    }
}

/// Narrow a declared type with a rule's type hint
///
/// On containers the hint replaces the element (or map value) type.
fn with_hint(declared: &TypeRef, hint: Option<&TypeRef>) -> TypeRef {
    let Some(hint) = hint else {
        return declared.clone();
    };
    match declared {
        TypeRef::List(_) => TypeRef::list(hint.clone()),
        TypeRef::Set(_) => TypeRef::set(hint.clone()),
        TypeRef::Array(_) => TypeRef::array(hint.clone()),
        TypeRef::Map(key, _) => TypeRef::Map(key.clone(), Box::new(hint.clone())),
        _ => hint.clone(),
    }
}

fn invoke(
    converter: &dyn CustomConverter,
    value: &Value,
    existing: &Value,
    source_type: &TypeRef,
    target: &TypeRef,
    parameter: Option<&str>,
) -> MappingResult<Value> {
    trace!(converter = converter.name(), %source_type, %target, "invoking converter");
    let request = ConversionRequest {
        source: value,
        existing_destination: existing,
        source_type,
        destination_type: target,
        parameter,
    };
    converter
        .convert(&request)
        .map_err(|cause| MappingError::converter_failed(source_type, target, cause))
}

impl MappingRun<'_> {
    /// Map a value to a destination type at the top of a call
    pub(super) fn map_top(&mut self, source: &Value, destination_type: &TypeRef) -> MappingResult<Value> {
        let inner = self.inner;
        let scope = self.ctx.scope().map(str::to_string);
        match (source, destination_type) {
            (Value::Null, TypeRef::Class(class)) => {
                if !inner.accepts_null_source(class, scope.as_deref()) {
                    return Err(MappingError::configuration(format!(
                        "source mapped to {} must not be null",
                        class
                    )));
                }
                Ok(Value::Object(inner.builder.create_object(class)?))
            }
            (Value::Object(object), TypeRef::Class(class)) => {
                if let Some(converted) = self.registered_conversion(source, &Value::Null, destination_type)? {
                    return Ok(converted);
                }
                self.map_object(object, class, None, scope.as_deref())
            }
            _ => {
                let options = ValueOptions::top_level(inner.registry.defaults(), scope.as_deref());
                self.convert_value(source, &Value::Null, destination_type, &options)
            }
        }
    }

    /// Populate a caller-supplied destination object
    pub(super) fn map_into_top(&mut self, source: &Value, destination: &ObjectRef) -> MappingResult<()> {
        let inner = self.inner;
        let scope = self.ctx.scope().map(str::to_string);
        let class = destination.class();
        match source {
            Value::Null if inner.accepts_null_source(&class, scope.as_deref()) => Ok(()),
            Value::Null => Err(MappingError::configuration(format!(
                "source mapped into {} must not be null",
                class
            ))),
            Value::Object(object) => {
                let existing = Value::Object(destination.clone());
                let converted = self.registered_conversion(source, &existing, &TypeRef::class(class.as_str()))?;
                match converted {
                    None => {
                        self.ctx.register(object, &class, destination);
                        self.populate(object, destination, scope.as_deref())
                    }
                    Some(Value::Null) => Ok(()),
                    Some(Value::Object(result)) if result.ptr_eq(destination) => Ok(()),
                    Some(Value::Object(result)) => {
                        for (field, value) in result.snapshot() {
                            destination.set(field, value);
                        }
                        Ok(())
                    }
                    Some(other) => Err(MappingError::conversion(
                        other.runtime_type(),
                        class,
                        "converter must produce an object to populate an object",
                    )),
                }
            }
            Value::Map(entries) => {
                let options = ValueOptions::top_level(inner.registry.defaults(), scope.as_deref());
                self.map_entries_into_object(entries, destination, &options)
            }
            other => Err(MappingError::conversion(
                other.runtime_type(),
                class,
                "only objects and maps can populate an object",
            )),
        }
    }

    /// Map a source object to a destination of a declared class
    ///
    /// Reuses the destination already created for the source in this call.
    /// Otherwise the destination is created (or the existing field value
    /// adopted), registered, and only then populated.
    pub(super) fn map_object(
        &mut self,
        source: &ObjectRef,
        declared: &str,
        existing: Option<&ObjectRef>,
        scope: Option<&str>,
    ) -> MappingResult<Value> {
        let inner = self.inner;
        let concrete = inner.concrete_destination(&source.class(), declared, scope)?;
        if let Some(mapped) = self.ctx.mapped(source, &concrete) {
            trace!(source = %source.id(), destination = %mapped.id(), "reusing mapped destination");
            return Ok(Value::Object(mapped));
        }

        let adoptable = existing.filter(|e| {
            let class = e.class();
            inner.catalog.distance(&class, &concrete).is_some()
        });
        let destination = match adoptable {
            Some(existing) => existing.clone(),
            None => inner.builder.create_object(&concrete)?,
        };
        self.ctx.register(source, &concrete, &destination);
        self.populate(source, &destination, scope)?;
        Ok(Value::Object(destination))
    }

    fn populate(&mut self, source: &ObjectRef, destination: &ObjectRef, scope: Option<&str>) -> MappingResult<()> {
        let inner = self.inner;
        let class_map = inner.effective_class_map(&source.class(), &destination.class(), scope)?;
        let call_id = self.ctx.call_id();
        let source_value = Value::Object(source.clone());
        let destination_value = Value::Object(destination.clone());
        let event = MappingEvent::new(MappingEventKind::Object, call_id, &source_value, &destination_value)
            .class_map(&class_map.key);

        self.notify(Phase::Before, event)?;
        for field in &class_map.fields {
            self.map_field(source, destination, &class_map, field)
                .map_err(|e| e.at(class_map.key.source.clone(), field.rule.source.clone()))?;
        }
        self.notify(Phase::After, event)?;
        Ok(())
    }

    fn map_field(
        &mut self,
        source: &ObjectRef,
        destination: &ObjectRef,
        class_map: &EffectiveClassMap,
        field: &ResolvedField,
    ) -> MappingResult<()> {
        let call_id = self.ctx.call_id();
        let source_value = Value::Object(source.clone());
        let destination_value = Value::Object(destination.clone());
        let event = MappingEvent::new(MappingEventKind::Field, call_id, &source_value, &destination_value)
            .class_map(&class_map.key)
            .field_map(&field.rule);

        self.notify(Phase::Before, event)?;
        let written = self.apply_field(source, destination, class_map, field)?;
        let event = match &written {
            Some(value) => event.written(value),
            None => event,
        };
        self.notify(Phase::After, event)
    }

    /// Read, convert and write one field; `None` when nothing was written
    fn apply_field(
        &mut self,
        source: &ObjectRef,
        destination: &ObjectRef,
        class_map: &EffectiveClassMap,
        field: &ResolvedField,
    ) -> MappingResult<Option<Value>> {
        let inner = self.inner;
        let rule = &field.rule;

        let reader = inner.accessors.accessor_for(&source.class(), &rule.source)?;
        let mut value = reader.read(source)?;
        let writer = match inner.accessors.accessor_for(&destination.class(), &rule.destination) {
            Ok(writer) => writer,
            Err(err) if rule.optional => {
                trace!(field = %rule.destination, error = %err, "skipping optional field");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let target = with_hint(writer.declared_type(), rule.destination_hint.as_ref());

        if field.implicit {
            if let Some(hook) = &inner.field_mapper {
                let request = FieldHookRequest {
                    source,
                    destination,
                    source_field: &rule.source,
                    destination_field: &rule.destination,
                    value: &value,
                    destination_type: &target,
                };
                let handled = hook
                    .map_field(&request)
                    .map_err(|cause| MappingError::converter_failed(value.runtime_type(), &target, cause))?;
                if handled {
                    trace!(field = %rule.destination, "field handled by custom field mapper");
                    return Ok(None);
                }
            }
        }

        let policies = &class_map.policies;
        if policies.trim_strings {
            if let Value::Str(text) = &mut value {
                *text = text.trim().to_string();
            }
        }
        if matches!(&value, Value::Str(text) if text.is_empty())
            && !policies.map_empty_string
            && target != TypeRef::String
        {
            value = Value::Null;
        }

        let resolved = if value.is_null() {
            match rule.null_policy.unwrap_or(policies.null_policy) {
                NullPolicy::Skip => return Ok(None),
                NullPolicy::MapNull => Value::Null,
                NullPolicy::MapDefault => inner.builder.default_value(&target),
            }
        } else {
            let existing = writer.read(destination)?;
            let options = ValueOptions::for_field(rule, class_map);
            self.resolve_field_value(&value, &existing, &target, rule, &options)?
        };

        match writer.write(destination, resolved.clone()) {
            Ok(()) => Ok(Some(resolved)),
            Err(err) if rule.optional => {
                trace!(field = %rule.destination, error = %err, "skipping unwritable optional field");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_field_value(
        &mut self,
        value: &Value,
        existing: &Value,
        target: &TypeRef,
        rule: &FieldMap,
        options: &ValueOptions<'_>,
    ) -> MappingResult<Value> {
        let source_type = with_hint(&value.runtime_type(), rule.source_hint.as_ref());
        if let Some(id) = &rule.converter_id {
            let converter = self.inner.converters.resolve_by_id(id)?;
            return invoke(converter.as_ref(), value, existing, &source_type, target, options.parameter);
        }
        if rule.copy_by_reference {
            return Ok(value.clone());
        }
        self.convert_typed(value, existing, &source_type, target, options)
    }

    /// Convert a value to a target type, recursing as needed
    pub(super) fn convert_value(
        &mut self,
        value: &Value,
        existing: &Value,
        target: &TypeRef,
        options: &ValueOptions<'_>,
    ) -> MappingResult<Value> {
        let source_type = value.runtime_type();
        self.convert_typed(value, existing, &source_type, target, options)
    }

    /// Result of the converter registered for the value's type pair, if any
    fn registered_conversion(
        &self,
        value: &Value,
        existing: &Value,
        target: &TypeRef,
    ) -> MappingResult<Option<Value>> {
        let source_type = value.runtime_type();
        match self.inner.converters.resolve_by_type_pair(&source_type, target) {
            Some(registration) => {
                invoke(registration.converter.as_ref(), value, existing, &source_type, target, None).map(Some)
            }
            None => Ok(None),
        }
    }

    fn convert_typed(
        &mut self,
        value: &Value,
        existing: &Value,
        source_type: &TypeRef,
        target: &TypeRef,
        options: &ValueOptions<'_>,
    ) -> MappingResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let inner = self.inner;
        if let Some(registration) = inner.converters.resolve_by_type_pair(source_type, target) {
            return invoke(
                registration.converter.as_ref(),
                value,
                existing,
                source_type,
                target,
                options.parameter,
            );
        }

        match (value, target) {
            (Value::Object(object), TypeRef::Any) => {
                match inner.inferred_destination(&object.class(), options.map_id) {
                    Some(class) => self.map_object(object, &class, None, options.map_id),
                    None => Ok(value.clone()),
                }
            }
            (_, TypeRef::Any) => Ok(value.clone()),
            (Value::Object(object), TypeRef::Class(class)) => {
                self.map_object(object, class, existing.as_object(), options.map_id)
            }
            (Value::Object(object), TypeRef::Map(_, _)) => self.object_to_map(object, target, options),
            (Value::Map(entries), TypeRef::Class(class)) => {
                self.map_to_object(entries, class, existing.as_object(), options)
            }
            (Value::Map(entries), TypeRef::Map(_, _)) => self.map_entries(entries, existing, target, options),
            (Value::List(items) | Value::Set(items), t) if t.is_sequence() => {
                self.map_sequence(items, existing, target, options)
            }
            (Value::Object(_) | Value::List(_) | Value::Set(_) | Value::Map(_), _) => Err(
                MappingError::conversion(source_type, target, "no applicable conversion"),
            ),
            (_, t) if t.is_scalar() => {
                if inner.converters.is_supertype(target, &value.runtime_type()) {
                    return Ok(value.clone());
                }
                let ctx = ScalarContext {
                    catalog: &inner.catalog,
                    date_format: options.date_format,
                    explicit_format: options.explicit_format,
                };
                convert_scalar(value, target, &ctx)
            }
            _ => Err(MappingError::conversion(source_type, target, "no applicable conversion")),
        }
    }
}
