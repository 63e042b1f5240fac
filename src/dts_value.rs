//! Raw devicetree value tokens
//!
//! `DtsValue` mirrors the literal shapes a devicetree property can carry
//! after parsing but before any schema check. The host's parser produces
//! these; the type checker consumes them. A `Macro` is an unexpanded
//! preprocessor token whose concrete shape is unknown until preprocessing,
//! so it is treated as compatible with anything.

/// One parsed value token of a devicetree property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DtsValue {
    /// Quoted string literal.
    String(String),
    /// Integer cell.
    Int(i64),
    /// Parenthesized arithmetic expression; evaluates to a cell.
    Expression,
    /// `&label` or `&{/path}` reference.
    PHandle,
    /// Byte inside a `[...]` byte array.
    Byte(u8),
    /// `<...>` cell array.
    CellArray(Vec<DtsValue>),
    /// `[...]` byte array.
    ByteArray(Vec<DtsValue>),
    /// Unexpanded preprocessor token.
    Macro,
}

impl DtsValue {
    pub fn is_macro(&self) -> bool {
        matches!(self, DtsValue::Macro)
    }
}
