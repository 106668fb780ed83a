use super::{ensure_property_document, skip_value, MessageType, VERSION_PROPERTY};
use crate::error::{TwinError, TwinResult};
use crate::json::{JsonReader, TokenKind};

/// Reads the root-level `$version` counter of a property document.
///
/// The scan runs on a rewound copy of `reader`, so the caller's position is
/// left alone. `$version` may sit anywhere among the root fields, including
/// after component objects.
pub fn properties_version(reader: &JsonReader<'_>, message_type: MessageType) -> TwinResult<u32> {
    ensure_property_document(message_type)?;

    let mut cursor = reader.rewound();
    cursor.next_token()?;
    if cursor.token_kind() != TokenKind::BeginObject {
        return Err(cursor.unexpected("the document object"));
    }
    cursor.next_token()?;

    loop {
        match cursor.token_kind() {
            TokenKind::PropertyName if cursor.depth() == 1 => {
                if cursor.text_equals(VERSION_PROPERTY) {
                    cursor.next_token()?;
                    return cursor.read_u32();
                }
                cursor.next_token()?;
                skip_value(&mut cursor)?;
            }
            TokenKind::EndObject if cursor.depth() == 0 => {
                tracing::debug!("document has no {VERSION_PROPERTY} field");
                return Err(TwinError::PropertyNotFound(VERSION_PROPERTY));
            }
            _ => return Err(cursor.unexpected("a root property name")),
        }
    }
}
