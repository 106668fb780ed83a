use super::{
    ensure_property_document, skip_value, ComponentRegistry, MessageType, PropertyKind,
    VERSION_PROPERTY,
};
use crate::error::{TwinError, TwinResult};
use crate::json::{JsonReader, TokenKind};

/// Walks a property document one logical property at a time.
///
/// Each yielded [`Property`] borrows the iterator's reader, which rests on the
/// property name. Its value has to be consumed through one of the `Property`
/// readers (or [`Property::skip`]) before the next call; otherwise
/// [`next_property`](Self::next_property) fails with
/// [`TwinError::ValueNotConsumed`].
#[derive(Debug)]
pub struct PropertyIter<'r, 'a, 'c> {
    reader: &'r mut JsonReader<'a>,
    registry: &'c ComponentRegistry,
    message_type: MessageType,
    property_kind: PropertyKind,
    component: Option<&'c str>,
    pending: bool,
}

impl<'r, 'a, 'c> PropertyIter<'r, 'a, 'c> {
    /// Wraps `reader`. Fails with `InvalidArgument`, leaving the reader
    /// untouched, when `message_type` carries no properties.
    ///
    /// The reader may be fresh, on the root begin-object token, or on the first
    /// root property name.
    pub fn new(
        reader: &'r mut JsonReader<'a>,
        message_type: MessageType,
        property_kind: PropertyKind,
        registry: &'c ComponentRegistry,
    ) -> TwinResult<Self> {
        ensure_property_document(message_type)?;
        Ok(Self {
            reader,
            registry,
            message_type,
            property_kind,
            component: None,
            pending: false,
        })
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn property_kind(&self) -> PropertyKind {
        self.property_kind
    }

    /// Component the iterator is currently inside, if any.
    pub fn current_component(&self) -> Option<&'c str> {
        self.component
    }

    /// Advances to the next property. `Ok(None)` marks the end of the
    /// document and is returned again on every later call.
    pub fn next_property(&mut self) -> TwinResult<Option<Property<'_, 'a, 'c>>> {
        if self.pending {
            return Err(TwinError::ValueNotConsumed);
        }
        self.position_at_root()?;

        loop {
            match (self.reader.token_kind(), self.reader.depth()) {
                (TokenKind::PropertyName, 1) => {
                    self.component = None;
                    if self.reader.text_equals(VERSION_PROPERTY) {
                        tracing::trace!("skipping {VERSION_PROPERTY}");
                        self.reader.next_token()?;
                        skip_value(self.reader)?;
                        continue;
                    }
                    if let Some(component) = self.enter_component()? {
                        tracing::trace!(component, "entered component");
                        self.component = Some(component);
                        continue;
                    }
                    return Ok(Some(self.yield_current()));
                }
                (TokenKind::PropertyName, 2) if self.component.is_some() => {
                    return Ok(Some(self.yield_current()));
                }
                (TokenKind::EndObject, 1) if self.component.is_some() => {
                    tracing::trace!(component = ?self.component, "left component");
                    self.component = None;
                    self.reader.next_token()?;
                }
                (TokenKind::EndObject, 0) => return Ok(None),
                _ => return Err(self.reader.unexpected("a property name")),
            }
        }
    }

    fn position_at_root(&mut self) -> TwinResult<()> {
        if self.reader.token_kind() == TokenKind::None {
            self.reader.next_token()?;
            if self.reader.token_kind() != TokenKind::BeginObject {
                return Err(self.reader.unexpected("the document object"));
            }
        }
        if self.reader.token_kind() == TokenKind::BeginObject && self.reader.depth() == 1 {
            self.reader.next_token()?;
        }
        Ok(())
    }

    /// On a root name matching the registry whose value is an object, moves
    /// the reader inside that object and returns the component name. Any other
    /// name leaves the reader where it is.
    fn enter_component(&mut self) -> TwinResult<Option<&'c str>> {
        let registry = self.registry;
        let Some(component) = registry.lookup(self.reader) else {
            return Ok(None);
        };
        let mut lookahead = self.reader.clone();
        lookahead.next_token()?;
        if lookahead.token_kind() != TokenKind::BeginObject {
            return Ok(None);
        }
        lookahead.next_token()?;
        *self.reader = lookahead;
        Ok(Some(component))
    }

    fn yield_current(&mut self) -> Property<'_, 'a, 'c> {
        self.pending = true;
        Property {
            reader: &mut *self.reader,
            pending: &mut self.pending,
            component: self.component,
            kind: self.property_kind,
            message_type: self.message_type,
        }
    }
}

/// One property yielded by [`PropertyIter`], positioned on its name.
///
/// Consuming readers step past the value whether or not the typed read
/// succeeds, so iteration can continue after a type mismatch.
#[derive(Debug)]
#[must_use = "a property's value must be read or skipped before advancing"]
pub struct Property<'p, 'a, 'c> {
    reader: &'p mut JsonReader<'a>,
    pending: &'p mut bool,
    component: Option<&'c str>,
    kind: PropertyKind,
    message_type: MessageType,
}

impl<'p, 'a, 'c> Property<'p, 'a, 'c> {
    /// Owning component, or `None` for a root-level property.
    pub fn component(&self) -> Option<&'c str> {
        self.component
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Raw name text as it appears in the document.
    pub fn name_bytes(&self) -> &'a [u8] {
        self.reader.token_bytes()
    }

    pub fn name_str(&self) -> TwinResult<&'a str> {
        self.reader.token_str()
    }

    pub fn name_equals(&self, name: &str) -> bool {
        self.reader.text_equals(name)
    }

    pub fn skip(self) -> TwinResult<()> {
        self.consume(|_| Ok(()))
    }

    pub fn read_i32(self) -> TwinResult<i32> {
        self.consume(JsonReader::read_i32)
    }

    pub fn read_i64(self) -> TwinResult<i64> {
        self.consume(JsonReader::read_i64)
    }

    pub fn read_u32(self) -> TwinResult<u32> {
        self.consume(JsonReader::read_u32)
    }

    pub fn read_f64(self) -> TwinResult<f64> {
        self.consume(JsonReader::read_f64)
    }

    pub fn read_bool(self) -> TwinResult<bool> {
        self.consume(JsonReader::read_bool)
    }

    /// Raw text of a string value, escapes left as written.
    pub fn read_str(self) -> TwinResult<&'a str> {
        self.consume(|value| {
            if value.token_kind() != TokenKind::String {
                return Err(value.unexpected("string"));
            }
            value.token_str()
        })
    }

    /// Detached reader resting on the value token, for values that need more
    /// than a scalar read. The iterator itself moves past the whole value.
    pub fn value(self) -> TwinResult<JsonReader<'a>> {
        self.consume(|value| Ok(value.clone()))
    }

    fn consume<T>(self, read: impl FnOnce(&JsonReader<'a>) -> TwinResult<T>) -> TwinResult<T> {
        self.reader.next_token()?;
        let result = read(self.reader);
        skip_value(self.reader)?;
        *self.pending = false;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ComponentRegistry {
        ComponentRegistry::new(["one_component", "two_component"]).unwrap()
    }

    fn drain(doc: &[u8], registry: &ComponentRegistry) -> TwinResult<Vec<(Option<String>, String)>> {
        let mut reader = JsonReader::new(doc);
        let mut iter = PropertyIter::new(
            &mut reader,
            MessageType::WritablePatch,
            PropertyKind::Writable,
            registry,
        )?;
        let mut out = Vec::new();
        while let Some(property) = iter.next_property()? {
            let entry = (
                property.component().map(str::to_owned),
                property.name_str()?.to_owned(),
            );
            property.skip()?;
            out.push(entry);
        }
        Ok(out)
    }

    fn pair(component: Option<&str>, name: &str) -> (Option<String>, String) {
        (component.map(str::to_owned), name.to_owned())
    }

    #[test]
    fn empty_document_ends_immediately() {
        assert!(drain(b"{}", &registry()).unwrap().is_empty());
    }

    #[test]
    fn empty_component_yields_nothing() {
        let got = drain(br#"{"one_component":{},"a":1}"#, &registry()).unwrap();
        assert_eq!(got, vec![pair(None, "a")]);
    }

    #[test]
    fn registered_name_with_scalar_value_is_root_property() {
        let got = drain(br#"{"one_component":3,"two_component":{"x":1}}"#, &registry()).unwrap();
        assert_eq!(
            got,
            vec![pair(None, "one_component"), pair(Some("two_component"), "x")]
        );
    }

    #[test]
    fn unregistered_objects_are_root_properties() {
        let got = drain(br#"{"other":{"x":1,"y":{"z":2}},"b":[1,2]}"#, &registry()).unwrap();
        assert_eq!(got, vec![pair(None, "other"), pair(None, "b")]);
    }

    #[test]
    fn version_between_components_is_skipped() {
        let got = drain(
            br#"{"one_component":{"a":1},"$version":9,"two_component":{"b":2}}"#,
            &registry(),
        )
        .unwrap();
        assert_eq!(
            got,
            vec![
                pair(Some("one_component"), "a"),
                pair(Some("two_component"), "b")
            ]
        );
    }

    #[test]
    fn nested_version_is_yielded() {
        let got = drain(br#"{"one_component":{"$version":1}}"#, &registry()).unwrap();
        assert_eq!(got, vec![pair(Some("one_component"), "$version")]);
    }

    #[test]
    fn end_of_properties_repeats() {
        let mut reader = JsonReader::new(br#"{"a":1}"#);
        let registry = registry();
        let mut iter = PropertyIter::new(
            &mut reader,
            MessageType::FullDocument,
            PropertyKind::Reported,
            &registry,
        )
        .unwrap();
        let property = iter.next_property().unwrap().unwrap();
        assert_eq!(property.kind(), PropertyKind::Reported);
        assert_eq!(property.message_type(), MessageType::FullDocument);
        assert_eq!(property.read_i32().unwrap(), 1);
        assert!(iter.next_property().unwrap().is_none());
        assert!(iter.next_property().unwrap().is_none());
    }

    #[test]
    fn unconsumed_value_is_reported() {
        let mut reader = JsonReader::new(br#"{"a":1,"b":2}"#);
        let registry = registry();
        let mut iter = PropertyIter::new(
            &mut reader,
            MessageType::WritablePatch,
            PropertyKind::Writable,
            &registry,
        )
        .unwrap();
        let property = iter.next_property().unwrap().unwrap();
        drop(property);
        assert_eq!(
            iter.next_property().unwrap_err(),
            TwinError::ValueNotConsumed
        );
    }

    #[test]
    fn type_mismatch_still_advances() {
        let mut reader = JsonReader::new(br#"{"a":"text","b":{"c":1},"d":2}"#);
        let registry = registry();
        let mut iter = PropertyIter::new(
            &mut reader,
            MessageType::WritablePatch,
            PropertyKind::Writable,
            &registry,
        )
        .unwrap();
        let a = iter.next_property().unwrap().unwrap();
        assert!(matches!(
            a.read_i32(),
            Err(TwinError::UnexpectedToken { .. })
        ));
        let b = iter.next_property().unwrap().unwrap();
        assert!(matches!(b.read_str(), Err(TwinError::UnexpectedToken { .. })));
        let d = iter.next_property().unwrap().unwrap();
        assert!(d.name_equals("d"));
        assert_eq!(d.read_i64().unwrap(), 2);
        assert!(iter.next_property().unwrap().is_none());
    }

    #[test]
    fn value_returns_detached_reader() {
        let mut reader = JsonReader::new(br#"{"a":{"x":[1,2]},"b":true}"#);
        let registry = registry();
        let mut iter = PropertyIter::new(
            &mut reader,
            MessageType::WritablePatch,
            PropertyKind::Writable,
            &registry,
        )
        .unwrap();
        let mut value = iter.next_property().unwrap().unwrap().value().unwrap();
        assert_eq!(value.token_kind(), TokenKind::BeginObject);
        value.next_token().unwrap();
        assert!(value.text_equals("x"));

        let b = iter.next_property().unwrap().unwrap();
        assert!(b.name_equals("b"));
        assert!(b.read_bool().unwrap());
    }

    #[test]
    fn ack_documents_are_rejected_without_touching_reader() {
        let mut reader = JsonReader::new(br#"{"a":1}"#);
        let registry = registry();
        let err = PropertyIter::new(
            &mut reader,
            MessageType::ReportedAck,
            PropertyKind::Reported,
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, TwinError::InvalidArgument(_)));
        assert_eq!(reader.token_kind(), TokenKind::None);
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(matches!(
            drain(b"[1,2]", &registry()),
            Err(TwinError::UnexpectedToken {
                found: TokenKind::BeginArray,
                ..
            })
        ));
    }

    #[test]
    fn malformed_document_is_fatal() {
        let err = drain(br#"{"one_component":{"a":1,"b":}}"#, &registry()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn current_component_tracks_traversal() {
        let mut reader = JsonReader::new(br#"{"one_component":{"a":1},"z":2}"#);
        let registry = registry();
        let mut iter = PropertyIter::new(
            &mut reader,
            MessageType::WritablePatch,
            PropertyKind::Writable,
            &registry,
        )
        .unwrap();
        assert_eq!(iter.current_component(), None);
        iter.next_property().unwrap().unwrap().skip().unwrap();
        assert_eq!(iter.current_component(), Some("one_component"));
        iter.next_property().unwrap().unwrap().skip().unwrap();
        assert_eq!(iter.current_component(), None);
    }
}
