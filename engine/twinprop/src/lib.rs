/* Copyright (c) 2026 Olle Mårtensson. This Source Code Form is subject to the terms of the Eclipse Public License, v. 2.0. */
//! Twinprop: component-aware property codec for device twin documents.
//!
//! The crate walks twin documents (full snapshots and writable-property
//! patches) one logical property at a time, reads the root `$version`
//! counter, and writes the component and acknowledgement fragments a device
//! sends back. Reading and writing work directly over caller buffers through
//! the [`json`] cursor and never allocate.
//!
//! # Examples
//! ```
//! use twinprop::json::JsonWriter;
//! use twinprop::properties::begin_response_status;
//!
//! let mut buf = [0u8; 96];
//! let mut writer = JsonWriter::new(&mut buf);
//! writer.begin_object().expect("begin");
//! let mut ack = begin_response_status(&mut writer, "target", 200, 4, Some("ok")).expect("ack");
//! ack.int32(21).expect("value");
//! ack.end().expect("end");
//! writer.end_object().expect("end");
//!
//! assert_eq!(
//!     writer.as_str(),
//!     r#"{"target":{"ac":200,"av":4,"ad":"ok","value":21}}"#
//! );
//! ```

mod error;
pub mod json;
pub mod options;
pub mod properties;

pub use error::{TwinError, TwinResult};
pub use options::PropertiesOptions;
pub use properties::{
    begin_component, begin_response_status, properties_version, skip_value, ComponentRegistry,
    ComponentScope, MessageType, Property, PropertyIter, PropertyKind, ResponseStatusScope,
};
