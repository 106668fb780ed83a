//! Component-aware reading and writing of twin property documents.
//!
//! A twin document is one JSON object. Keys that match an entry of the
//! [`ComponentRegistry`] and hold an object are components: their inner keys
//! are reported as properties of that component. Every other root key except
//! the reserved `$version` counter is a root-level property.
//!
//! # Examples
//! ```
//! use twinprop::json::JsonReader;
//! use twinprop::properties::{ComponentRegistry, MessageType, PropertyIter, PropertyKind};
//!
//! let registry = ComponentRegistry::new(["thermostat"]).expect("registry");
//! let doc = br#"{"thermostat":{"target":21},"led":true,"$version":3}"#;
//! let mut reader = JsonReader::new(doc);
//! let mut iter = PropertyIter::new(
//!     &mut reader,
//!     MessageType::WritablePatch,
//!     PropertyKind::Writable,
//!     &registry,
//! )
//! .expect("iterator");
//!
//! let target = iter.next_property().expect("next").expect("property");
//! assert_eq!(target.component(), Some("thermostat"));
//! assert!(target.name_equals("target"));
//! assert_eq!(target.read_i32().expect("value"), 21);
//!
//! let led = iter.next_property().expect("next").expect("property");
//! assert_eq!(led.component(), None);
//! assert!(led.read_bool().expect("value"));
//!
//! assert!(iter.next_property().expect("next").is_none());
//! ```

mod builder;
mod iter;
mod registry;
mod skip;
mod version;

pub use builder::{begin_component, begin_response_status, ComponentScope, ResponseStatusScope};
pub use iter::{Property, PropertyIter};
pub use registry::ComponentRegistry;
pub use skip::skip_value;
pub use version::properties_version;

use crate::error::{TwinError, TwinResult};

/// Reserved root-level field carrying the document revision.
pub const VERSION_PROPERTY: &str = "$version";
/// Marker field the writer puts first inside every component object.
pub const COMPONENT_MARKER: &str = "__t";
pub const COMPONENT_MARKER_VALUE: &str = "c";
pub const ACK_CODE: &str = "ac";
pub const ACK_VERSION: &str = "av";
pub const ACK_DESCRIPTION: &str = "ad";
pub const ACK_VALUE: &str = "value";

/// Semantic origin of a document handed to the codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Complete twin snapshot.
    FullDocument,
    /// Service-pushed delta of writable properties.
    WritablePatch,
    /// Service acknowledgement of a reported update. Carries no properties.
    ReportedAck,
}

impl MessageType {
    /// Whether documents of this type can be walked for properties and `$version`.
    pub fn carries_properties(self) -> bool {
        matches!(self, MessageType::FullDocument | MessageType::WritablePatch)
    }
}

/// Caller classification of the properties being walked, handed back on every
/// yielded [`Property`] for downstream dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Writable,
    Reported,
}

fn ensure_property_document(message_type: MessageType) -> TwinResult<()> {
    if !message_type.carries_properties() {
        return Err(TwinError::InvalidArgument(
            "message type does not carry properties",
        ));
    }
    Ok(())
}
