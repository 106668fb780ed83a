use crate::error::TwinResult;
use crate::json::JsonReader;

/// Consumes the value the reader rests on and steps to the token after it.
///
/// The reader must be on a scalar, begin-object, or begin-array token. Nested
/// containers are skipped up to their matching closer.
pub fn skip_value(reader: &mut JsonReader<'_>) -> TwinResult<()> {
    let kind = reader.token_kind();
    if !kind.is_scalar() && !kind.is_container_start() {
        return Err(reader.unexpected("a value"));
    }
    reader.skip_children()?;
    reader.next_token()
}
