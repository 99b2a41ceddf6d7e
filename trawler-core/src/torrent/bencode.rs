//! Bencode decoding and canonical re-encoding
//!
//! Torrent files arrive as bencoded bytes. Decoding produces a [`Value`]
//! tree; re-encoding the `info` dictionary with [`encode`] yields the
//! canonical byte form that info-hash derivation hashes over.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::torrent::TorrentError;

/// Maximum nesting depth accepted by the decoder.
const MAX_DEPTH: usize = 64;

/// A decoded bencode value.
///
/// Dictionary entries live in a `BTreeMap`, so re-encoding always emits keys
/// in raw lexicographic byte order regardless of the order they were decoded
/// in. That ordering is the canonical form the info-hash is defined over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed 64-bit integer (`i...e`).
    Integer(i64),
    /// Byte string (`<len>:<bytes>`), not necessarily valid UTF-8.
    Bytes(Bytes),
    /// Ordered list (`l...e`).
    List(Vec<Value>),
    /// Dictionary with byte-string keys (`d...e`).
    Dict(BTreeMap<Bytes, Value>),
}

impl Value {
    /// Creates a byte-string value from a UTF-8 string.
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the raw bytes, if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this is a dictionary.
    pub fn as_dict(&self) -> Option<&BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Consumes the value and returns the entries, if this is a dictionary.
    pub fn into_dict(self) -> Option<BTreeMap<Bytes, Value>> {
        match self {
            Value::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a key if this value is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    /// Returns the bencode type name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "byte string",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
        }
    }
}

/// Decodes a complete bencoded buffer into a [`Value`].
///
/// # Errors
///
/// - `TorrentError::InvalidBencode` - If the buffer is truncated, contains
///   malformed tokens, nests too deeply, or has bytes after the root value
pub fn decode(data: &[u8]) -> Result<Value, TorrentError> {
    let mut cursor = Cursor { data, pos: 0 };
    let value = cursor.parse_value(0)?;

    if cursor.pos != data.len() {
        return Err(invalid(format!("trailing data after value at offset {}", cursor.pos)));
    }

    Ok(value)
}

/// Encodes a [`Value`] into canonical bencode bytes.
///
/// Dictionary keys are emitted in raw lexicographic byte order. For input
/// that was already canonically encoded, `encode(decode(x)) == x`.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Integer(number) => {
            out.push(b'i');
            out.extend_from_slice(number.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(bytes) => {
            out.extend_from_slice(bytes.len().to_string().as_bytes());
            out.push(b':');
            out.extend_from_slice(bytes);
        }
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(entries) => {
            out.push(b'd');
            for (key, entry) in entries {
                out.extend_from_slice(key.len().to_string().as_bytes());
                out.push(b':');
                out.extend_from_slice(key);
                encode_into(entry, out);
            }
            out.push(b'e');
        }
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn parse_value(&mut self, depth: usize) -> Result<Value, TorrentError> {
        if depth > MAX_DEPTH {
            return Err(invalid("nesting too deep"));
        }

        match self.peek()? {
            b'i' => self.parse_integer(),
            b'l' => self.parse_list(depth),
            b'd' => self.parse_dict(depth),
            b'0'..=b'9' => Ok(Value::Bytes(self.parse_byte_string()?)),
            other => Err(invalid(format!("unexpected byte {other:#04x} at offset {}", self.pos))),
        }
    }

    fn peek(&self) -> Result<u8, TorrentError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| invalid("unexpected end of input"))
    }

    fn parse_integer(&mut self) -> Result<Value, TorrentError> {
        self.pos += 1; // consume 'i'
        let start = self.pos;
        while self.peek()? != b'e' {
            self.pos += 1;
        }
        let digits = &self.data[start..self.pos];
        self.pos += 1; // consume 'e'

        let text =
            std::str::from_utf8(digits).map_err(|_| invalid("integer contains non-ASCII bytes"))?;
        if text.is_empty() {
            return Err(invalid("empty integer"));
        }
        if (text.starts_with('0') && text != "0") || text.starts_with("-0") {
            return Err(invalid(format!("integer with leading zeros: {text:?}")));
        }

        let number = text
            .parse::<i64>()
            .map_err(|_| invalid(format!("malformed integer: {text:?}")))?;
        Ok(Value::Integer(number))
    }

    fn parse_byte_string(&mut self) -> Result<Bytes, TorrentError> {
        let start = self.pos;
        while self.peek()? != b':' {
            self.pos += 1;
        }
        let length_text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| invalid("string length contains non-ASCII bytes"))?;
        let length = length_text
            .parse::<usize>()
            .map_err(|_| invalid(format!("malformed string length: {length_text:?}")))?;
        self.pos += 1; // consume ':'

        let end = self
            .pos
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| invalid("string length past end of input"))?;
        let bytes = Bytes::copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(bytes)
    }

    fn parse_list(&mut self, depth: usize) -> Result<Value, TorrentError> {
        self.pos += 1; // consume 'l'
        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.parse_value(depth + 1)?);
        }
        self.pos += 1; // consume 'e'
        Ok(Value::List(items))
    }

    fn parse_dict(&mut self, depth: usize) -> Result<Value, TorrentError> {
        self.pos += 1; // consume 'd'
        let mut entries = BTreeMap::new();
        while self.peek()? != b'e' {
            let key = match self.parse_value(depth + 1)? {
                Value::Bytes(key) => key,
                other => {
                    return Err(invalid(format!(
                        "dictionary key must be a byte string, got {}",
                        other.type_name()
                    )));
                }
            };
            let entry = self.parse_value(depth + 1)?;
            // Duplicate keys: the last occurrence wins.
            entries.insert(key, entry);
        }
        self.pos += 1; // consume 'e'
        Ok(Value::Dict(entries))
    }
}

fn invalid(reason: impl Into<String>) -> TorrentError {
    TorrentError::InvalidBencode {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_decode_integer() {
        assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
        assert_eq!(decode(b"i-17e").unwrap(), Value::Integer(-17));
        assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_decode_integer_rejects_leading_zeros() {
        assert!(decode(b"i01e").is_err());
        assert!(decode(b"i00e").is_err());
        assert!(decode(b"i-0e").is_err());
        assert!(decode(b"i-01e").is_err());
    }

    #[test]
    fn test_decode_integer_rejects_garbage() {
        assert!(decode(b"ie").is_err());
        assert!(decode(b"i1a2e").is_err());
        assert!(decode(b"i42").is_err()); // missing terminator
    }

    #[test]
    fn test_decode_byte_string() {
        assert_eq!(decode(b"4:spam").unwrap(), Value::string("spam"));
        assert_eq!(decode(b"0:").unwrap(), Value::string(""));
    }

    #[test]
    fn test_decode_byte_string_truncated() {
        assert!(decode(b"5:spam").is_err());
        assert!(decode(b"999:x").is_err());
        assert!(decode(b"4spam").is_err()); // missing ':'
    }

    #[test]
    fn test_decode_list() {
        let value = decode(b"li1e3:twoe").unwrap();
        assert_eq!(value, Value::List(vec![Value::Integer(1), Value::string("two")]));
    }

    #[test]
    fn test_decode_dict() {
        let value = decode(b"d3:fooi1e3:bar4:spame").unwrap();
        assert_eq!(value.get(b"foo").and_then(Value::as_integer), Some(1));
        assert_eq!(value.get(b"bar").and_then(Value::as_bytes), Some(b"spam".as_slice()));
    }

    #[test]
    fn test_decode_dict_rejects_non_string_key() {
        assert!(decode(b"di1ei2ee").is_err());
    }

    #[test]
    fn test_decode_dict_duplicate_key_last_wins() {
        let value = decode(b"d3:keyi1e3:keyi2ee").unwrap();
        assert_eq!(value.get(b"key").and_then(Value::as_integer), Some(2));
    }

    #[test]
    fn test_decode_rejects_trailing_data() {
        assert!(decode(b"i42ei43e").is_err());
        assert!(decode(b"4:spamx").is_err());
    }

    #[test]
    fn test_decode_rejects_unterminated_structures() {
        assert!(decode(b"l4:spam").is_err());
        assert!(decode(b"d3:key").is_err());
        assert!(decode(b"").is_err());
    }

    #[test]
    fn test_decode_rejects_deep_nesting() {
        let bomb = "l".repeat(MAX_DEPTH + 2);
        assert!(decode(bomb.as_bytes()).is_err());
    }

    #[test]
    fn test_encode_sorts_dictionary_keys() {
        // Keys arrive out of order; canonical encoding restores sorted order.
        let value = decode(b"d1:bi2e1:ai1ee").unwrap();
        assert_eq!(encode(&value), b"d1:ai1e1:bi2ee");
    }

    #[test]
    fn test_encode_canonical_forms() {
        assert_eq!(encode(&Value::Integer(-7)), b"i-7e");
        assert_eq!(encode(&Value::string("spam")), b"4:spam");
        assert_eq!(encode(&Value::List(vec![Value::Integer(1), Value::string("x")])), b"li1e1:xe");
    }

    #[test]
    fn test_encode_decode_identity_on_sorted_input() {
        let original = b"d3:fool3:bari-42ee4:spamd1:a0:ee".as_slice();
        let value = decode(original).unwrap();
        assert_eq!(encode(&value), original);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            proptest::collection::vec(any::<u8>(), 0..32)
                .prop_map(|bytes| Value::Bytes(Bytes::from(bytes))),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                proptest::collection::btree_map(
                    proptest::collection::vec(any::<u8>(), 0..8).prop_map(Bytes::from),
                    inner,
                    0..4
                )
                .prop_map(Value::Dict),
            ]
        })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(value in value_strategy()) {
            let encoded = encode(&value);
            let decoded = decode(&encoded).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }
}
