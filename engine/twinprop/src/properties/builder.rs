use std::ops::{Deref, DerefMut};

use super::{
    ACK_CODE, ACK_DESCRIPTION, ACK_VALUE, ACK_VERSION, COMPONENT_MARKER, COMPONENT_MARKER_VALUE,
};
use crate::error::{TwinError, TwinResult};
use crate::json::JsonWriter;

/// Opens `"<name>":{"__t":"c"` inside the object `writer` is currently in.
///
/// The caller appends the component's properties through the returned scope,
/// which closes the component object on [`ComponentScope::end`] or on drop.
/// Nothing is written when the call fails.
pub fn begin_component<'w, 'b>(
    writer: &'w mut JsonWriter<'b>,
    component_name: &str,
) -> TwinResult<ComponentScope<'w, 'b>> {
    if component_name.is_empty() {
        return Err(TwinError::InvalidArgument("component name is empty"));
    }
    write_fragment(writer, |writer| {
        writer.property_name(component_name)?;
        writer.begin_object()?;
        writer.property_name(COMPONENT_MARKER)?;
        writer.string(COMPONENT_MARKER_VALUE)
    })?;
    Ok(ComponentScope {
        writer,
        open: true,
    })
}

/// Opens the acknowledgement envelope for a writable property:
/// `"<name>":{"ac":<code>,"av":<version>,"ad":"<description>","value":`.
///
/// The caller writes exactly one value (the acknowledged payload) through the
/// returned scope. An empty description is left out like a missing one.
/// Nothing is written when the call fails.
pub fn begin_response_status<'w, 'b>(
    writer: &'w mut JsonWriter<'b>,
    property_name: &str,
    ack_code: i32,
    ack_version: i32,
    description: Option<&str>,
) -> TwinResult<ResponseStatusScope<'w, 'b>> {
    if property_name.is_empty() {
        return Err(TwinError::InvalidArgument("property name is empty"));
    }
    write_fragment(writer, |writer| {
        writer.property_name(property_name)?;
        writer.begin_object()?;
        writer.property_name(ACK_CODE)?;
        writer.int32(ack_code)?;
        writer.property_name(ACK_VERSION)?;
        writer.int32(ack_version)?;
        if let Some(description) = description.filter(|text| !text.is_empty()) {
            writer.property_name(ACK_DESCRIPTION)?;
            writer.string(description)?;
        }
        writer.property_name(ACK_VALUE)
    })?;
    Ok(ResponseStatusScope {
        writer,
        open: true,
    })
}

fn write_fragment(
    writer: &mut JsonWriter<'_>,
    fragment: impl FnOnce(&mut JsonWriter<'_>) -> TwinResult<()>,
) -> TwinResult<()> {
    let checkpoint = writer.checkpoint();
    let result = fragment(writer);
    if result.is_err() {
        writer.rollback(checkpoint);
    }
    result
}

fn close_on_drop(writer: &mut JsonWriter<'_>, scope: &'static str) {
    if let Err(err) = writer.end_object() {
        tracing::warn!(scope, "could not close object on drop: {err}");
    }
}

/// An open component object. Derefs to the underlying writer.
#[derive(Debug)]
#[must_use = "dropping the scope closes the component immediately"]
pub struct ComponentScope<'w, 'b> {
    writer: &'w mut JsonWriter<'b>,
    open: bool,
}

impl ComponentScope<'_, '_> {
    /// Closes the component object.
    pub fn end(mut self) -> TwinResult<()> {
        self.open = false;
        self.writer.end_object()
    }
}

impl<'b> Deref for ComponentScope<'_, 'b> {
    type Target = JsonWriter<'b>;

    fn deref(&self) -> &Self::Target {
        self.writer
    }
}

impl DerefMut for ComponentScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer
    }
}

impl Drop for ComponentScope<'_, '_> {
    fn drop(&mut self) {
        if self.open {
            close_on_drop(self.writer, "component");
        }
    }
}

/// An open acknowledgement envelope awaiting its value. Derefs to the
/// underlying writer.
#[derive(Debug)]
#[must_use = "dropping the scope closes the envelope immediately"]
pub struct ResponseStatusScope<'w, 'b> {
    writer: &'w mut JsonWriter<'b>,
    open: bool,
}

impl ResponseStatusScope<'_, '_> {
    /// Closes the envelope object. The value must have been written.
    pub fn end(mut self) -> TwinResult<()> {
        self.open = false;
        self.writer.end_object()
    }
}

impl<'b> Deref for ResponseStatusScope<'_, 'b> {
    type Target = JsonWriter<'b>;

    fn deref(&self) -> &Self::Target {
        self.writer
    }
}

impl DerefMut for ResponseStatusScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer
    }
}

impl Drop for ResponseStatusScope<'_, '_> {
    fn drop(&mut self) {
        if self.open {
            close_on_drop(self.writer, "response status");
        }
    }
}
