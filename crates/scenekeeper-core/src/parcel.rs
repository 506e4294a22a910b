//! Length-prefixed primitive transport used by every request and reply.
//!
//! Layout rules:
//! - integers and floats are little-endian fixed width
//! - `bool` is one byte and only `0`/`1` decode
//! - strings and blobs are a `u32` byte length followed by the bytes
//! - vectors are a `u32` element count followed by the elements
//! - remote objects travel as opaque `u64` handles
//!
//! A parcel has a byte capacity. A write that would exceed it fails and
//! leaves the buffer untouched, so callers can roll back a half-written
//! group with [`Parcel::mark`] / [`Parcel::truncate`].

use thiserror::Error;

/// Default capacity in bytes for parcels created with [`Parcel::new`].
pub const DEFAULT_CAPACITY: usize = 200 * 1024;

/// Upper bound on any single vector count read from a parcel.
pub const MAX_VEC_LEN: u32 = 4096;

/// Primitive transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParcelError {
    #[error("parcel capacity exceeded: need {needed} bytes, {available} available")]
    CapacityExceeded { needed: usize, available: usize },

    #[error("parcel underflow: need {needed} bytes, {available} remaining")]
    Underflow { needed: usize, available: usize },

    #[error("invalid bool byte {0}")]
    InvalidBool(u8),

    #[error("string is not valid utf-8")]
    InvalidUtf8,

    #[error("length {len} exceeds limit {limit}")]
    LengthOverflow { len: u64, limit: u64 },

    #[error("invalid value {value} for {kind}")]
    InvalidEnum { kind: &'static str, value: u64 },
}

/// Compound values with a dedicated wire form.
///
/// `unmarshal` fails closed: on error no value is produced and the read
/// cursor is restored by [`Parcel::read_value`].
pub trait Marshal: Sized {
    fn marshal(&self, parcel: &mut Parcel) -> Result<(), ParcelError>;

    fn unmarshal(parcel: &mut Parcel) -> Result<Self, ParcelError>;
}

/// A growable byte buffer with a write cursor (the end) and a read cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parcel {
    data: Vec<u8>,
    read_pos: usize,
    capacity: usize,
}

impl Default for Parcel {
    fn default() -> Self {
        Self::new()
    }
}

impl Parcel {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            read_pos: 0,
            capacity,
        }
    }

    /// Wrap received bytes for reading. The capacity is the byte length.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let capacity = data.len().max(DEFAULT_CAPACITY);
        Self {
            data,
            read_pos: 0,
            capacity,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes not yet consumed by reads.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }

    /// Current write length, for a later [`Self::truncate`].
    #[must_use]
    pub fn mark(&self) -> usize {
        self.data.len()
    }

    /// Drop everything written after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.data.truncate(mark);
        self.read_pos = self.read_pos.min(mark);
    }

    #[must_use]
    pub const fn read_position(&self) -> usize {
        self.read_pos
    }

    /// Move the read cursor back to a previously observed position.
    pub fn rewind(&mut self, pos: usize) {
        self.read_pos = pos.min(self.data.len());
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    fn put(&mut self, bytes: &[u8]) -> Result<(), ParcelError> {
        let available = self.capacity.saturating_sub(self.data.len());
        if bytes.len() > available {
            return Err(ParcelError::CapacityExceeded {
                needed: bytes.len(),
                available,
            });
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), ParcelError> {
        self.put(&[u8::from(value)])
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), ParcelError> {
        self.put(&[value])
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), ParcelError> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), ParcelError> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), ParcelError> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<(), ParcelError> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), ParcelError> {
        self.put(&value.to_bits().to_le_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), ParcelError> {
        self.put(&value.to_bits().to_le_bytes())
    }

    /// Length-prefixed blob, written atomically.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), ParcelError> {
        let len = u32::try_from(value.len()).map_err(|_| ParcelError::LengthOverflow {
            len: value.len() as u64,
            limit: u64::from(u32::MAX),
        })?;
        let mut buf = Vec::with_capacity(4 + value.len());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(value);
        self.put(&buf)
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), ParcelError> {
        self.write_bytes(value.as_bytes())
    }

    /// Reference to a remote object owned by the connection.
    pub fn write_remote_object(&mut self, handle: u64) -> Result<(), ParcelError> {
        self.write_u64(handle)
    }

    /// Element count prefix for a vector.
    pub fn write_len(&mut self, len: usize) -> Result<(), ParcelError> {
        let len = u32::try_from(len).map_err(|_| ParcelError::LengthOverflow {
            len: len as u64,
            limit: u64::from(MAX_VEC_LEN),
        })?;
        self.write_u32(len)
    }

    pub fn write_u32_vec(&mut self, values: &[u32]) -> Result<(), ParcelError> {
        self.write_len(values.len())?;
        for value in values {
            self.write_u32(*value)?;
        }
        Ok(())
    }

    pub fn write_f32_vec(&mut self, values: &[f32]) -> Result<(), ParcelError> {
        self.write_len(values.len())?;
        for value in values {
            self.write_f32(*value)?;
        }
        Ok(())
    }

    /// Run `f` and roll the parcel back to its prior length if it fails.
    pub fn write_group<F>(&mut self, f: F) -> Result<(), ParcelError>
    where
        F: FnOnce(&mut Self) -> Result<(), ParcelError>,
    {
        let mark = self.mark();
        let result = f(self);
        if result.is_err() {
            self.truncate(mark);
        }
        result
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ParcelError> {
        let available = self.remaining();
        if available < N {
            return Err(ParcelError::Underflow {
                needed: N,
                available,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.read_pos..self.read_pos + N]);
        self.read_pos += N;
        Ok(out)
    }

    pub fn read_bool(&mut self) -> Result<bool, ParcelError> {
        match self.take::<1>()?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => {
                self.read_pos -= 1;
                Err(ParcelError::InvalidBool(other))
            }
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, ParcelError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32, ParcelError> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, ParcelError> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, ParcelError> {
        self.take::<8>().map(i64::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, ParcelError> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, ParcelError> {
        self.take::<4>().map(|b| f32::from_bits(u32::from_le_bytes(b)))
    }

    pub fn read_f64(&mut self) -> Result<f64, ParcelError> {
        self.take::<8>().map(|b| f64::from_bits(u64::from_le_bytes(b)))
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, ParcelError> {
        let start = self.read_pos;
        let len = self.read_u32()? as usize;
        let available = self.remaining();
        if len > available {
            self.read_pos = start;
            return Err(ParcelError::Underflow {
                needed: len,
                available,
            });
        }
        let out = self.data[self.read_pos..self.read_pos + len].to_vec();
        self.read_pos += len;
        Ok(out)
    }

    pub fn read_string(&mut self) -> Result<String, ParcelError> {
        let start = self.read_pos;
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| {
            self.read_pos = start;
            ParcelError::InvalidUtf8
        })
    }

    pub fn read_remote_object(&mut self) -> Result<u64, ParcelError> {
        self.read_u64()
    }

    /// Element count bounded by `limit`.
    pub fn read_len(&mut self, limit: u32) -> Result<usize, ParcelError> {
        let len = self.read_u32()?;
        if len > limit {
            return Err(ParcelError::LengthOverflow {
                len: u64::from(len),
                limit: u64::from(limit),
            });
        }
        Ok(len as usize)
    }

    pub fn read_u32_vec(&mut self) -> Result<Vec<u32>, ParcelError> {
        let len = self.read_len(MAX_VEC_LEN)?;
        (0..len).map(|_| self.read_u32()).collect()
    }

    pub fn read_f32_vec(&mut self) -> Result<Vec<f32>, ParcelError> {
        let len = self.read_len(MAX_VEC_LEN)?;
        (0..len).map(|_| self.read_f32()).collect()
    }

    /// Write a compound value, rolling back on failure.
    pub fn write_value<T: Marshal>(&mut self, value: &T) -> Result<(), ParcelError> {
        self.write_group(|p| value.marshal(p))
    }

    /// Read a compound value, restoring the cursor on failure.
    pub fn read_value<T: Marshal>(&mut self) -> Result<T, ParcelError> {
        self.read_group(T::unmarshal)
    }

    /// Bounded vector of compound values.
    pub fn write_values<T: Marshal>(&mut self, values: &[T]) -> Result<(), ParcelError> {
        self.write_group(|p| {
            p.write_len(values.len())?;
            values.iter().try_for_each(|v| v.marshal(p))
        })
    }

    pub fn read_values<T: Marshal>(&mut self, limit: u32) -> Result<Vec<T>, ParcelError> {
        self.read_group(|p| {
            let len = p.read_len(limit)?;
            (0..len).map(|_| T::unmarshal(p)).collect()
        })
    }

    /// Run `f` and restore the read cursor if it fails.
    pub fn read_group<T, F>(&mut self, f: F) -> Result<T, ParcelError>
    where
        F: FnOnce(&mut Self) -> Result<T, ParcelError>,
    {
        let pos = self.read_position();
        let result = f(self);
        if result.is_err() {
            self.rewind(pos);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_in_order() {
        let mut parcel = Parcel::new();
        parcel.write_bool(true).unwrap();
        parcel.write_i32(-7).unwrap();
        parcel.write_u64(u64::MAX).unwrap();
        parcel.write_f32(1.5).unwrap();
        parcel.write_string("SCBDock").unwrap();

        assert!(parcel.read_bool().unwrap());
        assert_eq!(parcel.read_i32().unwrap(), -7);
        assert_eq!(parcel.read_u64().unwrap(), u64::MAX);
        assert!((parcel.read_f32().unwrap() - 1.5).abs() < f32::EPSILON);
        assert_eq!(parcel.read_string().unwrap(), "SCBDock");
        assert_eq!(parcel.remaining(), 0);
    }

    #[test]
    fn capacity_rejects_without_partial_write() {
        let mut parcel = Parcel::with_capacity(6);
        parcel.write_u32(1).unwrap();
        let err = parcel.write_u32(2).unwrap_err();
        assert_eq!(
            err,
            ParcelError::CapacityExceeded {
                needed: 4,
                available: 2
            }
        );
        assert_eq!(parcel.len(), 4);
        assert!(parcel.write_string("abc").is_err());
        assert_eq!(parcel.len(), 4);
    }

    #[test]
    fn write_group_rolls_back() {
        let mut parcel = Parcel::with_capacity(10);
        parcel.write_u32(9).unwrap();
        let result = parcel.write_group(|p| {
            p.write_u32(1)?;
            p.write_u32(2)
        });
        assert!(result.is_err());
        assert_eq!(parcel.len(), 4);
    }

    #[test]
    fn underflow_and_bad_bool() {
        let mut parcel = Parcel::from_bytes(vec![2, 0, 0]);
        assert_eq!(parcel.read_bool().unwrap_err(), ParcelError::InvalidBool(2));
        assert_eq!(parcel.read_position(), 0);
        assert!(matches!(
            parcel.read_u32().unwrap_err(),
            ParcelError::Underflow { needed: 4, available: 3 }
        ));
    }

    #[test]
    fn truncated_blob_restores_cursor() {
        let mut parcel = Parcel::new();
        parcel.write_u32(100).unwrap();
        parcel.write_u8(1).unwrap();
        assert!(parcel.read_bytes().is_err());
        assert_eq!(parcel.read_position(), 0);
    }

    #[test]
    fn vector_length_is_bounded() {
        let mut parcel = Parcel::new();
        parcel.write_u32(MAX_VEC_LEN + 1).unwrap();
        assert!(matches!(
            parcel.read_u32_vec().unwrap_err(),
            ParcelError::LengthOverflow { .. }
        ));
    }

    #[test]
    fn read_group_restores_on_failure() {
        let mut parcel = Parcel::new();
        parcel.write_u32(5).unwrap();
        let result: Result<(u32, u32), _> =
            parcel.read_group(|p| Ok((p.read_u32()?, p.read_u32()?)));
        assert!(result.is_err());
        assert_eq!(parcel.read_position(), 0);
        assert_eq!(parcel.read_u32().unwrap(), 5);
    }
}
