use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::{FrameError, Message};

/// Wire format: a big-endian u16 length prefix followed by a bincode
/// message body. A frame therefore never exceeds `u16::MAX` body bytes.
const LEN_PREFIX: usize = std::mem::size_of::<u16>();

pub fn from_socket(socket: TcpStream) -> (ConnectionTx<OwnedWriteHalf>, ConnectionRx<OwnedReadHalf>) {
    let (read_stream, write_stream) = socket.into_split();
    (ConnectionTx::new(write_stream), ConnectionRx::new(read_stream))
}

#[derive(Debug)]
pub struct ConnectionTx<W> {
    write_stream: BufWriter<W>,
}

pub struct ConnectionRx<R> {
    read_stream: R,
    buffer: BytesMut,
}

impl<W: AsyncWrite + Unpin> ConnectionTx<W> {
    pub fn new(write_stream: W) -> Self {
        Self {
            write_stream: BufWriter::new(write_stream),
        }
    }

    pub async fn write_frame(&mut self, frame: &Message) -> Result<(), FrameError> {
        let bytes = bincode::serialize(frame)?;
        let len = u16::try_from(bytes.len()).map_err(|_| FrameError::FrameLength)?;
        self.write_stream.write_all(&len.to_be_bytes()).await?;
        self.write_stream.write_all(&bytes).await?;
        self.write_stream.flush().await?;
        Ok(())
    }
}

impl<R: AsyncRead + Unpin> ConnectionRx<R> {
    pub fn new(read_stream: R) -> Self {
        Self {
            read_stream,
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Read the next full frame, or `None` once the peer cleanly closes.
    pub async fn read_frame(&mut self) -> Result<Option<Message>, FrameError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            if self.read_stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    // Remote closed the connection between frames
                    return Ok(None);
                }
                // Closed mid-frame
                return Err(FrameError::ConnectionReset);
            }
        }
    }

    fn parse_frame(&mut self) -> Result<Option<Message>, FrameError> {
        if self.buffer.len() < LEN_PREFIX {
            return Ok(None);
        }

        // Peek the length through a Cursor so the buffer's own cursor
        // only advances once the full frame is available.
        let mut peek = Cursor::new(&self.buffer[..]);
        let body_len = peek.get_u16() as usize;
        if self.buffer.len() < LEN_PREFIX + body_len {
            return Ok(None);
        }

        self.buffer.advance(LEN_PREFIX);
        let message = bincode::deserialize::<Message>(&self.buffer[..body_len])?;
        self.buffer.advance(body_len);

        Ok(Some(message))
    }
}
