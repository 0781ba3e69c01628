use anyhow::{Result, anyhow, bail};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a frame body, checked before the body buffer is allocated.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Frame type byte plus the big-endian call id.
const HEADER_LEN: usize = 1 + 4;

/// Logical frame type on the gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Request = 1,
    Response = 2,
    Error = 3,
    Shutdown = 4,
}

impl TryFrom<u8> for FrameType {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(FrameType::Request),
            2 => Ok(FrameType::Response),
            3 => Ok(FrameType::Error),
            4 => Ok(FrameType::Shutdown),
            other => Err(anyhow!("unknown frame type: {}", other)),
        }
    }
}

/// Wire frame: `[len:u32][type:u8][call_id:u32][payload:bytes]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub call_id: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(frame_type: FrameType, call_id: u32, payload: Vec<u8>) -> Self {
        Self {
            frame_type,
            call_id,
            payload,
        }
    }

    /// Length-prefixed wire form. Fails when the body would exceed
    /// [`MAX_FRAME_LEN`], the bound every reader enforces.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body_len = HEADER_LEN + self.payload.len();
        if body_len > MAX_FRAME_LEN {
            bail!(
                "{:?} frame body of {} bytes exceeds limit of {}",
                self.frame_type,
                body_len,
                MAX_FRAME_LEN
            );
        }
        let mut out = Vec::with_capacity(4 + body_len);
        out.extend_from_slice(&(body_len as u32).to_be_bytes());
        out.push(self.frame_type as u8);
        out.extend_from_slice(&self.call_id.to_be_bytes());
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parse a frame body (everything after the length prefix).
    pub fn decode(body: &[u8]) -> Result<Self> {
        let Some((header, payload)) = body.split_first_chunk::<HEADER_LEN>() else {
            bail!("frame body too short: {}", body.len());
        };
        let [kind, id @ ..] = *header;
        Ok(Self {
            frame_type: FrameType::try_from(kind)?,
            call_id: u32::from_be_bytes(id),
            payload: payload.to_vec(),
        })
    }
}

pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let body_len = reader.read_u32().await? as usize;
    if !(HEADER_LEN..=MAX_FRAME_LEN).contains(&body_len) {
        bail!(
            "frame body of {} bytes outside {}..={}",
            body_len,
            HEADER_LEN,
            MAX_FRAME_LEN
        );
    }
    let mut body = vec![0u8; body_len];
    reader.read_exact(&mut body).await?;
    Frame::decode(&body)
}

pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.encode()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/frame_tests.rs"]
mod tests;
