//! Key byte encodings.

use super::{Id, KeyError, KeyResult};
use std::fmt;

/// A value that can be used as a bucket key.
pub trait KeyEncode {
    /// Appends the key bytes for this value to `out`.
    fn encode_key(&self, out: &mut Vec<u8>);
}

impl<K: KeyEncode + ?Sized> KeyEncode for &K {
    fn encode_key(&self, out: &mut Vec<u8>) {
        (**self).encode_key(out);
    }
}

impl KeyEncode for str {
    fn encode_key(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl KeyEncode for String {
    fn encode_key(&self, out: &mut Vec<u8>) {
        self.as_str().encode_key(out);
    }
}

impl KeyEncode for [u8] {
    fn encode_key(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl KeyEncode for Vec<u8> {
    fn encode_key(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl<const N: usize> KeyEncode for [u8; N] {
    fn encode_key(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl KeyEncode for Id {
    fn encode_key(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

macro_rules! unsigned_key {
    ($($ty:ty),*) => {$(
        impl KeyEncode for $ty {
            fn encode_key(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }
        }
    )*};
}

// Flipping the sign bit maps MIN..=MAX onto 0..=MAX of the unsigned type,
// which keeps big-endian byte order equal to numeric order.
macro_rules! signed_key {
    ($($ty:ty => $unsigned:ty),*) => {$(
        impl KeyEncode for $ty {
            fn encode_key(&self, out: &mut Vec<u8>) {
                let flipped = (*self as $unsigned) ^ (1 << (<$unsigned>::BITS - 1));
                out.extend_from_slice(&flipped.to_be_bytes());
            }
        }
    )*};
}

unsigned_key!(u8, u16, u32, u64, u128);
signed_key!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, i128 => u128);

/// Encoded, non-empty key bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyBytes(Vec<u8>);

impl KeyBytes {
    /// Encodes `key`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::EmptyKey`] when the encoding has no bytes.
    pub fn encode<K: KeyEncode + ?Sized>(key: &K) -> KeyResult<Self> {
        let mut out = Vec::new();
        key.encode_key(&mut out);
        Self::from_vec(out)
    }

    /// Wraps bytes that are already encoded.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::EmptyKey`] when `bytes` is empty.
    pub fn from_vec(bytes: Vec<u8>) -> KeyResult<Self> {
        if bytes.is_empty() {
            return Err(KeyError::EmptyKey);
        }
        Ok(Self(bytes))
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the key and returns its bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl KeyEncode for KeyBytes {
    fn encode_key(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

impl AsRef<[u8]> for KeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Printable keys are shown as quoted text, anything else as hex.
impl fmt::Display for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) if !text.chars().any(char::is_control) => write!(f, "{text:?}"),
            _ => {
                f.write_str("0x")?;
                for byte in &self.0 {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyBytes({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bytes<K: KeyEncode + ?Sized>(key: &K) -> Vec<u8> {
        KeyBytes::encode(key).unwrap().into_vec()
    }

    #[test]
    fn empty_keys_rejected() {
        assert_eq!(KeyBytes::encode(""), Err(KeyError::EmptyKey));
        assert_eq!(KeyBytes::encode(&Vec::<u8>::new()), Err(KeyError::EmptyKey));
        assert_eq!(KeyBytes::from_vec(Vec::new()), Err(KeyError::EmptyKey));
    }

    #[test]
    fn integer_widths() {
        assert_eq!(bytes(&1u8), vec![1]);
        assert_eq!(bytes(&0x0102u16), vec![1, 2]);
        assert_eq!(bytes(&0i32), vec![0x80, 0, 0, 0]);
        assert_eq!(bytes(&i64::MIN), vec![0; 8]);
        assert_eq!(bytes(&i64::MAX), vec![0xFF; 8]);
    }

    #[test]
    fn display_text_and_hex() {
        assert_eq!(KeyBytes::encode("arrow").unwrap().to_string(), "\"arrow\"");
        assert_eq!(KeyBytes::encode(&7u16).unwrap().to_string(), "0x0007");
    }

    proptest! {
        #[test]
        fn signed_order_preserved(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(a.cmp(&b), bytes(&a).cmp(&bytes(&b)));
        }

        #[test]
        fn small_signed_order_preserved(a in any::<i16>(), b in any::<i16>()) {
            prop_assert_eq!(a.cmp(&b), bytes(&a).cmp(&bytes(&b)));
        }

        #[test]
        fn unsigned_order_preserved(a in any::<u32>(), b in any::<u32>()) {
            prop_assert_eq!(a.cmp(&b), bytes(&a).cmp(&bytes(&b)));
        }

        #[test]
        fn string_order_preserved(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            prop_assert_eq!(a.cmp(&b), bytes(&a).cmp(&bytes(&b)));
        }
    }
}
