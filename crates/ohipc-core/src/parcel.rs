//! Request/reply buffer and its binary codec.
//!
//! A [`MessageParcel`] is a FIFO byte stream: values are read back in the
//! exact order they were written, with no field names and no random access.
//! All scalars are little-endian and every field is padded to a 4-byte
//! boundary.
//!
//! | Value | Encoding |
//! |-------|----------|
//! | `bool` | `i32` 0/1, any non-zero reads as `true` |
//! | `i32` / `u32` / `f32` | 4 bytes |
//! | `i64` / `u64` / `f64` | 8 bytes |
//! | string | `i32` byte length (`-1` = null) + UTF-8 + pad |
//! | string16 | `i32` UTF-16 unit count (`-1` = null) + UTF-16LE + pad |
//! | parcelable | `i32` presence flag + payload |
//! | vector | `i32` count + elements |
//! | remote object | `i32` slot into the object table (`-1` = null) |
//! | file descriptor | `i32` slot into the descriptor table |
//!
//! Remote objects and file descriptors travel in side tables next to the
//! byte stream, so a handle is never reconstructed from raw bytes.
//!
//! A failed read leaves the cursor where it was.

use std::fmt;
use std::fs::File;
use std::sync::Arc;

use ohipc_errors::{ParcelError, ParcelResult};

use crate::remote::RemoteObject;

/// Hard upper bound on the element count of any bulk argument.
pub const CYCLE_LIMIT: usize = 2000;

/// Default cap on the size of a single parcel (1 MiB).
pub const DEFAULT_MAX_PARCEL_SIZE: usize = 1024 * 1024;

const ALIGNMENT: usize = 4;
const NULL_MARKER: i32 = -1;
const MAX_LENGTH_PREFIX: usize = 0x7fff_ffff;

/// Value with a defined parcel encoding.
///
/// `unmarshal` must consume exactly the fields `marshal` wrote, in the same
/// order.
pub trait Parcelable: Sized {
    /// Write the value into `parcel`.
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()>;

    /// Read a value from `parcel`.
    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self>;
}

/// Ordered request/reply buffer.
pub struct MessageParcel {
    data: Vec<u8>,
    read_pos: usize,
    max_size: usize,
    max_collection_len: usize,
    objects: Vec<Arc<dyn RemoteObject>>,
    fds: Vec<File>,
}

impl MessageParcel {
    /// Create an empty parcel with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_PARCEL_SIZE, CYCLE_LIMIT)
    }

    /// Create an empty parcel with explicit limits.
    ///
    /// `max_collection_len` is clamped to [`CYCLE_LIMIT`].
    #[must_use]
    pub fn with_limits(max_size: usize, max_collection_len: usize) -> Self {
        Self {
            data: Vec::new(),
            read_pos: 0,
            max_size,
            max_collection_len: max_collection_len.min(CYCLE_LIMIT),
            objects: Vec::new(),
            fds: Vec::new(),
        }
    }

    /// Wrap raw bytes received from elsewhere. The parcel carries no objects
    /// or descriptors, so every handle slot in `bytes` reads as out of range.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut parcel = Self::new();
        parcel.data.extend_from_slice(bytes);
        parcel
    }

    /// Replace the size and collection limits.
    pub fn set_limits(&mut self, max_size: usize, max_collection_len: usize) {
        self.max_size = max_size;
        self.max_collection_len = max_collection_len.min(CYCLE_LIMIT);
    }

    /// Encoded bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of encoded bytes.
    #[must_use]
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Current read cursor.
    #[must_use]
    pub fn read_position(&self) -> usize {
        self.read_pos
    }

    /// Bytes left after the read cursor.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.read_pos)
    }

    /// Move the read cursor back to the first field.
    pub fn rewind_read(&mut self) {
        self.read_pos = 0;
    }

    /// Number of remote objects attached.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of file descriptors attached.
    #[must_use]
    pub fn fd_count(&self) -> usize {
        self.fds.len()
    }

    /// Configured collection limit.
    #[must_use]
    pub fn max_collection_len(&self) -> usize {
        self.max_collection_len
    }

    // ---- writers -------------------------------------------------------

    /// Write a boolean as an `i32`.
    pub fn write_bool(&mut self, value: bool) -> ParcelResult<()> {
        self.write_i32(i32::from(value))
    }

    /// Write an `i32`.
    pub fn write_i32(&mut self, value: i32) -> ParcelResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Write a `u32`.
    pub fn write_u32(&mut self, value: u32) -> ParcelResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Write an `i64`.
    pub fn write_i64(&mut self, value: i64) -> ParcelResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Write a `u64`.
    pub fn write_u64(&mut self, value: u64) -> ParcelResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Write an `f32`.
    pub fn write_f32(&mut self, value: f32) -> ParcelResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Write an `f64`.
    pub fn write_f64(&mut self, value: f64) -> ParcelResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Write a UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> ParcelResult<()> {
        self.write_prefixed(length_prefix(value.len())?, value.as_bytes())
    }

    /// Write a length-prefixed byte buffer.
    pub fn write_bytes(&mut self, value: &[u8]) -> ParcelResult<()> {
        self.write_prefixed(length_prefix(value.len())?, value)
    }

    /// Write a UTF-8 string that may be null.
    pub fn write_nullable_string(&mut self, value: Option<&str>) -> ParcelResult<()> {
        match value {
            Some(value) => self.write_string(value),
            None => self.write_i32(NULL_MARKER),
        }
    }

    /// Write a UTF-16 string.
    pub fn write_string16(&mut self, value: &str) -> ParcelResult<()> {
        let units: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let count = length_prefix(units.len() / 2)?;
        self.write_prefixed(count, &units)
    }

    /// Write the interface token. Must be the first field of every request.
    pub fn write_interface_token(&mut self, descriptor: &str) -> ParcelResult<()> {
        self.write_string16(descriptor)
    }

    /// Write a collection count for a caller-encoded sequence.
    pub fn write_count(&mut self, len: usize) -> ParcelResult<()> {
        self.write_i32(length_prefix(len)?)
    }

    /// Write a count followed by that many UTF-8 strings.
    pub fn write_string_vector<S: AsRef<str>>(&mut self, values: &[S]) -> ParcelResult<()> {
        self.write_count(values.len())?;
        values
            .iter()
            .try_for_each(|value| self.write_string(value.as_ref()))
    }

    /// Write an optional parcelable as presence flag plus payload.
    pub fn write_parcelable<T: Parcelable>(&mut self, value: Option<&T>) -> ParcelResult<()> {
        match value {
            Some(value) => {
                self.write_i32(1)?;
                value.marshal(self)
            }
            None => self.write_i32(0),
        }
    }

    /// Write a count followed by that many parcelables (each without a presence flag).
    pub fn write_vec<T: Parcelable>(&mut self, values: &[T]) -> ParcelResult<()> {
        self.write_i32(length_prefix(values.len())?)?;
        values.iter().try_for_each(|value| value.marshal(self))
    }

    /// Attach a remote object handle, or write the null slot.
    pub fn write_remote_object(
        &mut self,
        object: Option<&Arc<dyn RemoteObject>>,
    ) -> ParcelResult<()> {
        match object {
            Some(object) => {
                let slot = length_prefix(self.objects.len())?;
                self.write_i32(slot)?;
                self.objects.push(Arc::clone(object));
                Ok(())
            }
            None => self.write_i32(NULL_MARKER),
        }
    }

    /// Attach a duplicate of `file`.
    pub fn write_file_descriptor(&mut self, file: &File) -> ParcelResult<()> {
        let duplicate = file
            .try_clone()
            .map_err(|e| ParcelError::DescriptorDup(e.to_string()))?;
        let slot = length_prefix(self.fds.len())?;
        self.write_i32(slot)?;
        self.fds.push(duplicate);
        Ok(())
    }

    // ---- readers -------------------------------------------------------

    /// Read a boolean.
    pub fn read_bool(&mut self) -> ParcelResult<bool> {
        Ok(self.read_i32()? != 0)
    }

    /// Read an `i32`.
    pub fn read_i32(&mut self) -> ParcelResult<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a `u32`.
    pub fn read_u32(&mut self) -> ParcelResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read an `i64`.
    pub fn read_i64(&mut self) -> ParcelResult<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// Read a `u64`.
    pub fn read_u64(&mut self) -> ParcelResult<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read an `f32`.
    pub fn read_f32(&mut self) -> ParcelResult<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read an `f64`.
    pub fn read_f64(&mut self) -> ParcelResult<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Read a UTF-8 string. A null string is an error.
    pub fn read_string(&mut self) -> ParcelResult<String> {
        self.rollback_on_err(|parcel| {
            parcel
                .read_nullable_string()?
                .ok_or(ParcelError::UnexpectedNull("string"))
        })
    }

    /// Read a UTF-8 string that may be null.
    pub fn read_nullable_string(&mut self) -> ParcelResult<Option<String>> {
        self.rollback_on_err(|parcel| {
            let Some(len) = parcel.read_length()? else {
                return Ok(None);
            };
            match std::str::from_utf8(parcel.read_padded(len)?) {
                Ok(value) => Ok(Some(value.to_owned())),
                Err(_) => Err(ParcelError::InvalidUtf8),
            }
        })
    }

    /// Read a byte buffer written by [`MessageParcel::write_bytes`].
    pub fn read_bytes(&mut self) -> ParcelResult<Vec<u8>> {
        self.rollback_on_err(|parcel| {
            let len = parcel
                .read_length()?
                .ok_or(ParcelError::UnexpectedNull("bytes"))?;
            Ok(parcel.read_padded(len)?.to_vec())
        })
    }

    /// Read a UTF-16 string. A null string is an error.
    pub fn read_string16(&mut self) -> ParcelResult<String> {
        self.rollback_on_err(|parcel| {
            let len = parcel
                .read_length()?
                .ok_or(ParcelError::UnexpectedNull("string16"))?;
            let byte_len = len
                .checked_mul(2)
                .ok_or(ParcelError::underflow(parcel.read_pos, usize::MAX, parcel.remaining()))?;
            let units: Vec<u16> = parcel
                .read_padded(byte_len)?
                .chunks_exact(2)
                .filter_map(|pair| pair.first_chunk::<2>())
                .map(|pair| u16::from_le_bytes(*pair))
                .collect();
            match String::from_utf16(&units) {
                Ok(value) => Ok(value),
                Err(_) => Err(ParcelError::InvalidUtf16),
            }
        })
    }

    /// Read the interface token.
    pub fn read_interface_token(&mut self) -> ParcelResult<String> {
        self.read_string16()
    }

    /// Read a collection count, validated against the collection limit
    /// before any element is read.
    pub fn read_count(&mut self) -> ParcelResult<usize> {
        self.rollback_on_err(|parcel| {
            let raw = parcel.read_i32()?;
            let count = usize::try_from(raw).map_err(|_negative| ParcelError::InvalidLength(raw))?;
            if count > parcel.max_collection_len {
                return Err(ParcelError::CollectionTooLarge {
                    count,
                    limit: parcel.max_collection_len,
                });
            }
            Ok(count)
        })
    }

    /// Read a count followed by that many UTF-8 strings.
    pub fn read_string_vector(&mut self) -> ParcelResult<Vec<String>> {
        self.rollback_on_err(|parcel| {
            let count = parcel.read_count()?;
            let mut values = Vec::with_capacity(parcel.bounded_capacity(count));
            for _ in 0..count {
                values.push(parcel.read_string()?);
            }
            Ok(values)
        })
    }

    /// Read an optional parcelable written by [`MessageParcel::write_parcelable`].
    pub fn read_parcelable<T: Parcelable>(&mut self) -> ParcelResult<Option<T>> {
        self.rollback_on_err(|parcel| {
            if parcel.read_i32()? == 0 {
                return Ok(None);
            }
            T::unmarshal(parcel).map(Some)
        })
    }

    /// Read a parcelable that must be present.
    pub fn read_required_parcelable<T: Parcelable>(
        &mut self,
        what: &'static str,
    ) -> ParcelResult<T> {
        self.rollback_on_err(|parcel| {
            parcel
                .read_parcelable()?
                .ok_or(ParcelError::UnexpectedNull(what))
        })
    }

    /// Read a count followed by that many parcelables.
    pub fn read_vec<T: Parcelable>(&mut self) -> ParcelResult<Vec<T>> {
        self.rollback_on_err(|parcel| {
            let count = parcel.read_count()?;
            let mut values = Vec::with_capacity(parcel.bounded_capacity(count));
            for _ in 0..count {
                values.push(T::unmarshal(parcel)?);
            }
            Ok(values)
        })
    }

    /// Read a remote object handle; `None` when the null slot was written.
    pub fn read_remote_object(&mut self) -> ParcelResult<Option<Arc<dyn RemoteObject>>> {
        self.rollback_on_err(|parcel| {
            let slot = parcel.read_i32()?;
            if slot == NULL_MARKER {
                return Ok(None);
            }
            usize::try_from(slot)
                .ok()
                .and_then(|index| parcel.objects.get(index))
                .map(|object| Some(Arc::clone(object)))
                .ok_or(ParcelError::ObjectSlot {
                    slot,
                    len: parcel.objects.len(),
                })
        })
    }

    /// Read a file descriptor, returning an owned duplicate.
    pub fn read_file_descriptor(&mut self) -> ParcelResult<File> {
        self.rollback_on_err(|parcel| {
            let slot = parcel.read_i32()?;
            let file = usize::try_from(slot)
                .ok()
                .and_then(|index| parcel.fds.get(index))
                .ok_or(ParcelError::DescriptorSlot {
                    slot,
                    len: parcel.fds.len(),
                })?;
            file.try_clone()
                .map_err(|e| ParcelError::DescriptorDup(e.to_string()))
        })
    }

    // ---- internals -----------------------------------------------------

    fn rollback_on_err<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> ParcelResult<T>,
    ) -> ParcelResult<T> {
        let mark = self.read_pos;
        let result = read(self);
        if result.is_err() {
            self.read_pos = mark;
        }
        result
    }

    /// Never pre-allocate more slots than the remaining bytes could encode.
    fn bounded_capacity(&self, count: usize) -> usize {
        count.min(self.remaining() / ALIGNMENT)
    }

    fn ensure_capacity(&self, additional: usize) -> ParcelResult<()> {
        let requested = self.data.len().saturating_add(additional);
        if requested > self.max_size {
            return Err(ParcelError::CapacityExceeded {
                requested,
                limit: self.max_size,
            });
        }
        Ok(())
    }

    fn write_aligned(&mut self, bytes: &[u8]) -> ParcelResult<()> {
        let padded = padded_len(bytes.len());
        self.ensure_capacity(padded)?;
        self.push_padded(bytes, padded);
        Ok(())
    }

    /// Length prefix and payload are reserved together so a failed write
    /// never leaves a dangling prefix behind.
    fn write_prefixed(&mut self, prefix: i32, payload: &[u8]) -> ParcelResult<()> {
        let padded = padded_len(payload.len());
        self.ensure_capacity(padded.saturating_add(ALIGNMENT))?;
        self.data.extend_from_slice(&prefix.to_le_bytes());
        self.push_padded(payload, padded);
        Ok(())
    }

    fn push_padded(&mut self, bytes: &[u8], padded: usize) {
        self.data.extend_from_slice(bytes);
        let pad = padded.saturating_sub(bytes.len());
        self.data.extend(std::iter::repeat_n(0u8, pad));
    }

    /// Read a length prefix; `None` for the null marker.
    fn read_length(&mut self) -> ParcelResult<Option<usize>> {
        let raw = self.read_i32()?;
        if raw == NULL_MARKER {
            return Ok(None);
        }
        usize::try_from(raw)
            .map(Some)
            .map_err(|_negative| ParcelError::InvalidLength(raw))
    }

    fn read_padded(&mut self, len: usize) -> ParcelResult<&[u8]> {
        let start = self.read_pos;
        let available = self.remaining();
        let padded = padded_len(len);
        let end = start.saturating_add(len);
        if padded > available || self.data.get(start..end).is_none() {
            return Err(ParcelError::underflow(start, padded, available));
        }
        self.read_pos = start.saturating_add(padded);
        self.data
            .get(start..end)
            .ok_or(ParcelError::underflow(start, padded, available))
    }

    fn read_array<const N: usize>(&mut self) -> ParcelResult<[u8; N]> {
        let start = self.read_pos;
        let available = self.remaining();
        let needed = padded_len(N);
        let bytes = self
            .data
            .get(start..)
            .and_then(|rest| rest.first_chunk::<N>())
            .copied()
            .filter(|_| needed <= available)
            .ok_or(ParcelError::underflow(start, needed, available))?;
        self.read_pos = start.saturating_add(needed);
        Ok(bytes)
    }
}

fn padded_len(len: usize) -> usize {
    len.saturating_add(ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

fn length_prefix(len: usize) -> ParcelResult<i32> {
    i32::try_from(len).map_err(|_overflow| ParcelError::CapacityExceeded {
        requested: len,
        limit: MAX_LENGTH_PREFIX,
    })
}

impl Default for MessageParcel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageParcel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageParcel")
            .field("data_size", &self.data.len())
            .field("read_pos", &self.read_pos)
            .field("max_size", &self.max_size)
            .field("objects", &self.objects.len())
            .field("fds", &self.fds.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(7)?;
        parcel.write_string("event")?;
        parcel.write_bool(true)?;
        parcel.write_i64(-3)?;

        assert_eq!(parcel.read_i32()?, 7);
        assert_eq!(parcel.read_string()?, "event");
        assert!(parcel.read_bool()?);
        assert_eq!(parcel.read_i64()?, -3);
        assert_eq!(parcel.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_fields_are_four_byte_aligned() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_string("abcde")?;
        // 4 prefix + 5 bytes padded to 8
        assert_eq!(parcel.data_size(), 12);
        parcel.write_string16("ab")?;
        // 4 prefix + 4 bytes of UTF-16
        assert_eq!(parcel.data_size(), 20);
        Ok(())
    }

    #[test]
    fn test_bytes_are_padded() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_bytes(&[1, 2, 3])?;
        parcel.write_i32(9)?;
        assert_eq!(parcel.data_size(), 12);
        assert_eq!(parcel.read_bytes()?, vec![1, 2, 3]);
        assert_eq!(parcel.read_i32()?, 9);
        Ok(())
    }

    #[test]
    fn test_failed_read_does_not_move_cursor() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(100)?;
        let before = parcel.read_position();
        assert!(matches!(
            parcel.read_string(),
            Err(ParcelError::Underflow { .. })
        ));
        assert_eq!(parcel.read_position(), before);
        assert_eq!(parcel.read_i32()?, 100);
        Ok(())
    }

    #[test]
    fn test_null_string_and_string16() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_nullable_string(None)?;
        parcel.write_i32(-1)?;
        assert_eq!(parcel.read_nullable_string()?, None);
        assert_eq!(
            parcel.read_string16(),
            Err(ParcelError::UnexpectedNull("string16"))
        );
        Ok(())
    }

    #[test]
    fn test_negative_length_rejected() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(-7)?;
        assert_eq!(parcel.read_string(), Err(ParcelError::InvalidLength(-7)));
        Ok(())
    }

    #[test]
    fn test_count_limit_checked_before_elements() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(2001)?;
        assert_eq!(
            parcel.read_count(),
            Err(ParcelError::CollectionTooLarge {
                count: 2001,
                limit: CYCLE_LIMIT
            })
        );
        assert_eq!(parcel.read_position(), 0);
        Ok(())
    }

    #[test]
    fn test_custom_collection_limit() -> ParcelResult<()> {
        let mut parcel = MessageParcel::with_limits(DEFAULT_MAX_PARCEL_SIZE, 2);
        parcel.write_string_vector(&["a", "b", "c"])?;
        assert!(matches!(
            parcel.read_string_vector(),
            Err(ParcelError::CollectionTooLarge { count: 3, limit: 2 })
        ));
        Ok(())
    }

    #[test]
    fn test_capacity_exceeded_leaves_parcel_untouched() -> ParcelResult<()> {
        let mut parcel = MessageParcel::with_limits(8, CYCLE_LIMIT);
        parcel.write_i32(1)?;
        let result = parcel.write_string("too long for the limit");
        assert!(matches!(
            result,
            Err(ParcelError::CapacityExceeded { limit: 8, .. })
        ));
        assert_eq!(parcel.data_size(), 4);
        Ok(())
    }

    #[test]
    fn test_bool_reads_any_non_zero_as_true() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(42)?;
        assert!(parcel.read_bool()?);
        Ok(())
    }

    #[test]
    fn test_unknown_object_slot() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(0)?;
        assert!(matches!(
            parcel.read_remote_object(),
            Err(ParcelError::ObjectSlot { slot: 0, len: 0 })
        ));
        parcel.rewind_read();
        parcel.write_remote_object(None)?;
        assert_eq!(parcel.read_i32()?, 0);
        assert!(parcel.read_remote_object()?.is_none());
        Ok(())
    }

    #[test]
    fn test_from_bytes_truncated_scalar() {
        let mut parcel = MessageParcel::from_bytes(&[1, 0]);
        assert_eq!(parcel.read_i32(), Err(ParcelError::underflow(0, 4, 2)));
    }
}
