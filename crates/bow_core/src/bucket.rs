//! Typed bucket handles.

use crate::database::Shared;
use crate::error::{CoreError, CoreResult};
use crate::iter::Iter;
use crate::key::{KeyBytes, KeyEncode, Record};
use bow_codec::{CborCodec, Codec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A named collection of records of one type.
///
/// Handles are cheap to clone and safe to share between threads. A bucket
/// comes into existence on its first `put`; before that, reads behave as
/// if it were empty.
///
/// Each operation runs in its own transaction: writes are serialized and
/// durable on return, reads see the latest committed state.
///
/// ```rust
/// use bow_core::Database;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Arrow {
///     id: String,
///     length: i64,
/// }
///
/// bow_core::impl_record!(Arrow, id: str);
///
/// let db = Database::open_in_memory().unwrap();
/// let arrows = db.bucket("arrows");
/// arrows.put(&Arrow { id: "123".into(), length: 7 }).unwrap();
///
/// let arrow: Arrow = arrows.get("123").unwrap();
/// assert_eq!(arrow.length, 7);
/// ```
pub struct Bucket<C: Codec = CborCodec> {
    pub(crate) name: String,
    pub(crate) shared: Arc<Shared<C>>,
}

impl<C: Codec> Bucket<C> {
    pub(crate) fn new(name: &str, shared: Arc<Shared<C>>) -> Self {
        Self {
            name: name.to_string(),
            shared,
        }
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts or replaces a record under its key.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Key`] if the key is empty
    /// - [`CoreError::Codec`] if the codec cannot marshal the record
    /// - an engine error if the write fails
    pub fn put<T: Record>(&self, record: &T) -> CoreResult<()> {
        let key = KeyBytes::encode(record.key())
            .map_err(|source| CoreError::key::<T>(&self.name, source))?;
        self.put_encoded(&key, record)
    }

    /// Stores any serializable value under an already encoded key.
    ///
    /// For values without a [`Record`] impl, such as documents keyed
    /// through a [`KeySchema`](crate::KeySchema).
    pub fn put_encoded<V: Serialize + ?Sized>(&self, key: &KeyBytes, value: &V) -> CoreResult<()> {
        let bytes = self
            .shared
            .codec
            .marshal(value)
            .map_err(|source| CoreError::codec(&self.name, Some(key), source))?;

        let mut txn = self.shared.store.begin_write()?;
        let bucket = txn.bucket_or_create(&self.name);
        txn.put(bucket, key.as_bytes().to_vec(), bytes);
        txn.commit()?;
        Ok(())
    }

    /// Reads the record stored under `key`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if nothing is stored under the key
    /// - [`CoreError::Codec`] if the stored bytes do not decode as `T`
    pub fn get<T: Record>(&self, key: &T::Key) -> CoreResult<T> {
        self.get_value(key)
    }

    /// Reads the record stored under `key` into `target`.
    ///
    /// `target` is left untouched on error.
    pub fn get_into<T: Record>(&self, key: &T::Key, target: &mut T) -> CoreResult<()> {
        *target = self.get(key)?;
        Ok(())
    }

    /// Reads the value under `key` as any deserializable type.
    pub fn get_value<V: DeserializeOwned, K: KeyEncode + ?Sized>(&self, key: &K) -> CoreResult<V> {
        let key = self.encode_key(key)?;
        let bytes = self
            .read(&key)?
            .ok_or_else(|| CoreError::not_found(&self.name, &key))?;
        self.shared
            .codec
            .unmarshal(&bytes)
            .map_err(|source| CoreError::codec(&self.name, Some(&key), source))
    }

    /// Returns true if a record is stored under `key`.
    pub fn contains<K: KeyEncode + ?Sized>(&self, key: &K) -> CoreResult<bool> {
        let key = self.encode_key(key)?;
        Ok(self.read(&key)?.is_some())
    }

    /// Removes the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if nothing is stored under the key.
    pub fn delete<K: KeyEncode + ?Sized>(&self, key: &K) -> CoreResult<()> {
        let key = self.encode_key(key)?;
        let mut txn = self.shared.store.begin_write()?;

        let bucket = match txn.bucket(&self.name) {
            Some(bucket) if txn.get(bucket, key.as_bytes())?.is_some() => bucket,
            _ => return Err(CoreError::not_found(&self.name, &key)),
        };
        txn.delete(bucket, key.into_vec());
        txn.commit()?;
        Ok(())
    }

    /// Returns the number of records.
    pub fn len(&self) -> CoreResult<usize> {
        let txn = self.shared.store.begin_read()?;
        match txn.bucket(&self.name)? {
            Some(bucket) => txn.count(bucket),
            None => Ok(0),
        }
    }

    /// Returns true if the bucket holds no records.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Iterates every record in key order.
    ///
    /// The iterator reads a snapshot taken now; writes committed while it
    /// is open are not visible to it. Close it (or drop it) to release the
    /// snapshot.
    pub fn iter<T: DeserializeOwned>(&self) -> CoreResult<Iter<T, C>> {
        Iter::open(self, None)
    }

    /// Iterates records with keys at or after `start`.
    pub fn iter_from<T: DeserializeOwned, K: KeyEncode + ?Sized>(&self, start: &K) -> CoreResult<Iter<T, C>> {
        let start = self.encode_key(start)?;
        Iter::open(self, Some(start))
    }

    fn encode_key<K: KeyEncode + ?Sized>(&self, key: &K) -> CoreResult<KeyBytes> {
        KeyBytes::encode(key).map_err(|source| CoreError::key::<K>(&self.name, source))
    }

    fn read(&self, key: &KeyBytes) -> CoreResult<Option<Vec<u8>>> {
        let txn = self.shared.store.begin_read()?;
        match txn.bucket(&self.name)? {
            Some(bucket) => txn.get(bucket, key.as_bytes()),
            None => Ok(None),
        }
    }
}

impl<C: Codec> Clone for Bucket<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Codec> fmt::Debug for Bucket<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.name)
            .field("format", &self.shared.codec.format())
            .finish()
    }
}
