/// Kind of the token a [`JsonReader`](super::JsonReader) currently rests on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// No token has been read yet.
    None,
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    PropertyName,
    String,
    Number,
    True,
    False,
    Null,
}

impl TokenKind {
    /// Scalars are values that span a single token.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::Number
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    pub fn is_container_start(self) -> bool {
        matches!(self, TokenKind::BeginObject | TokenKind::BeginArray)
    }

    pub fn is_container_end(self) -> bool {
        matches!(self, TokenKind::EndObject | TokenKind::EndArray)
    }
}
