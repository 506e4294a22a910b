//! Framing for boundary transactions.
//!
//! A frame is:
//!
//! ```text
//! len:     leb128   (bytes of everything after this field)
//! serial:  leb128
//! opcode:  leb128   (a SceneSessionManagerMessage code)
//! payload: len - |serial| - |opcode| bytes (a parcel)
//! ```
//!
//! Replies reuse the request's serial so a client can match them up.

use std::io::{Read, Write};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame of {len} bytes exceeds limit of {max}")]
    TooLarge { len: u64, max: usize },

    #[error("corrupt frame: {0}")]
    Corrupt(String),

    #[error("leb128 value is too large")]
    Overflow,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Number of bytes `value` takes as unsigned leb128.
fn encoded_length(value: u64) -> usize {
    let bits = (u64::BITS - value.leading_zeros()) as usize;
    bits.max(1).div_ceil(7)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub serial: u64,
    pub opcode: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn new(serial: u64, opcode: u32, payload: Vec<u8>) -> Self {
        Self {
            serial,
            opcode,
            payload,
        }
    }

    fn body_len(&self) -> usize {
        encoded_length(self.serial) + encoded_length(u64::from(self.opcode)) + self.payload.len()
    }

    /// Encode into one buffer so the header and payload go out in a single
    /// write.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let len = self.body_len() as u64;
        let mut buffer = Vec::with_capacity(self.body_len() + encoded_length(len));
        leb128::write::unsigned(&mut buffer, len)?;
        leb128::write::unsigned(&mut buffer, self.serial)?;
        leb128::write::unsigned(&mut buffer, u64::from(self.opcode))?;
        buffer.extend_from_slice(&self.payload);
        metrics::histogram!("frame.encode.size").record(buffer.len() as f64);
        Ok(buffer)
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> Result<usize, FrameError> {
        let buffer = self.encode()?;
        w.write_all(&buffer)?;
        Ok(buffer.len())
    }

    pub async fn write_to_async<W: AsyncWrite + Unpin>(&self, w: &mut W) -> Result<usize, FrameError> {
        let buffer = self.encode()?;
        w.write_all(&buffer).await?;
        Ok(buffer.len())
    }

    /// Decode one frame, rejecting anything longer than `max_frame_len`.
    pub fn decode<R: Read>(mut r: R, max_frame_len: usize) -> Result<Self, FrameError> {
        let len = read_u64(r.by_ref())?;
        check_len(len, max_frame_len)?;
        let serial = read_u64(r.by_ref())?;
        let opcode = read_u64(r.by_ref())?;
        let data_len = payload_len(len, serial, opcode)?;
        metrics::histogram!("frame.decode.size").record(data_len as f64);

        let mut payload = vec![0u8; data_len];
        r.read_exact(&mut payload)?;
        Ok(Self::new(serial, opcode_u32(opcode)?, payload))
    }

    pub async fn decode_async<R: AsyncRead + Unpin>(
        r: &mut R,
        max_frame_len: usize,
    ) -> Result<Self, FrameError> {
        let len = read_u64_async(r).await?;
        check_len(len, max_frame_len)?;
        let serial = read_u64_async(r).await?;
        let opcode = read_u64_async(r).await?;
        let data_len = payload_len(len, serial, opcode)?;
        metrics::histogram!("frame.decode.size").record(data_len as f64);

        let mut payload = vec![0u8; data_len];
        r.read_exact(&mut payload).await?;
        Ok(Self::new(serial, opcode_u32(opcode)?, payload))
    }
}

fn check_len(len: u64, max_frame_len: usize) -> Result<(), FrameError> {
    if len > max_frame_len as u64 {
        return Err(FrameError::TooLarge {
            len,
            max: max_frame_len,
        });
    }
    Ok(())
}

fn payload_len(len: u64, serial: u64, opcode: u64) -> Result<usize, FrameError> {
    (len as usize)
        .checked_sub(encoded_length(serial) + encoded_length(opcode))
        .ok_or_else(|| {
            FrameError::Corrupt(format!(
                "sizes don't make sense: len:{len} serial:{serial} (enc={}) opcode:{opcode} (enc={})",
                encoded_length(serial),
                encoded_length(opcode)
            ))
        })
}

fn opcode_u32(opcode: u64) -> Result<u32, FrameError> {
    u32::try_from(opcode).map_err(|_| FrameError::Corrupt(format!("opcode {opcode} out of range")))
}

fn read_u64<R: Read>(mut r: R) -> Result<u64, FrameError> {
    leb128::read::unsigned(&mut r).map_err(|err| match err {
        leb128::read::Error::IoError(io) => FrameError::Io(io),
        leb128::read::Error::Overflow => FrameError::Overflow,
    })
}

async fn read_u64_async<R: AsyncRead + Unpin>(r: &mut R) -> Result<u64, FrameError> {
    let mut buf = Vec::with_capacity(10);
    loop {
        let byte = r.read_u8().await?;
        buf.push(byte);
        match leb128::read::unsigned(&mut buf.as_slice()) {
            Ok(n) => return Ok(n),
            Err(leb128::read::Error::IoError(_)) => {}
            Err(leb128::read::Error::Overflow) => return Err(FrameError::Overflow),
        }
    }
}
