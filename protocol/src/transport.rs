//! 传输层
//!
//! 提供 TCP 连接、帧编解码，以及 `RecordSource`/`RecordSink` 两个 trait，
//! 使对局逻辑与具体连接解耦（测试中可以换成内存管道）。
//!
//! 帧格式：1 字节版本 + 4 字节大端长度 + bincode 消息体。
//! 握手阶段的准入信号是一个不带帧头的裸字节。

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::record::MoveRecord;
use crate::square::Square;
use crate::{CONNECT_TIMEOUT, DEFAULT_PORT, MAX_FRAME_SIZE, PROTOCOL_VERSION};

/// 网络配置
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

impl NetworkConfig {
    /// `host:port` 形式的地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// 走法记录的接收端
#[async_trait]
pub trait RecordSource: Send {
    /// 在 `wait` 时间内接收一条记录；超时返回 `Ok(None)`（不是错误）
    async fn recv_record(&mut self, wait: Duration) -> Result<Option<MoveRecord>>;
}

/// 走法记录的发送端
#[async_trait]
pub trait RecordSink: Send {
    /// 发送一条记录（一条记录对应一帧）
    async fn send_record(&mut self, record: &MoveRecord) -> Result<()>;

    /// 关闭发送端
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 连接器
pub struct TcpConnector;

impl TcpConnector {
    /// 建立连接
    pub async fn connect(&self, addr: &str) -> Result<TcpConnection> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)?
            .map_err(ProtocolError::Io)?;

        TcpConnection::from_stream(stream)
    }
}

/// TCP 连接
pub struct TcpConnection {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    peer_addr: Option<String>,
}

impl TcpConnection {
    /// 从 TcpStream 创建（服务端使用）
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: FrameReader::new(read_half),
            writer: FrameWriter::new(write_half),
            peer_addr,
        })
    }

    /// 读端
    pub fn reader(&mut self) -> &mut FrameReader<OwnedReadHalf> {
        &mut self.reader
    }

    /// 写端
    pub fn writer(&mut self) -> &mut FrameWriter<OwnedWriteHalf> {
        &mut self.writer
    }

    /// 分离读写端
    pub fn split(self) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
        (self.reader, self.writer)
    }

    /// 获取远端地址
    pub fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// TCP 监听器
pub struct TcpListener {
    listener: tokio::net::TcpListener,
}

impl TcpListener {
    /// 绑定地址
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ProtocolError::Io)?;
        Ok(Self { listener })
    }

    /// 接受连接
    pub async fn accept(&self) -> Result<TcpConnection> {
        let (stream, _addr) = self.listener.accept().await.map_err(ProtocolError::Io)?;
        TcpConnection::from_stream(stream)
    }

    /// 获取本地地址
    pub fn local_addr(&self) -> Option<String> {
        self.listener.local_addr().ok().map(|a| a.to_string())
    }
}

// ============================================================================
// 帧编解码
// ============================================================================

/// 帧头大小: 1 字节版本 + 4 字节长度
const HEADER_SIZE: usize = 5;

/// 序列化消息体
pub fn encode_payload<M: Serialize>(msg: &M) -> Result<Vec<u8>> {
    let payload = bincode::serialize(msg)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(payload)
}

/// 帧读取器
///
/// 已读到的字节都留在内部缓冲区里，所以 `read_payload` 可以被超时或
/// `select!` 取消而不会丢失半帧数据。
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    /// 创建新的帧读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// 读取握手阶段的裸字节
    pub async fn read_byte(&mut self) -> Result<u8> {
        if self.buffer.is_empty() {
            self.fill().await?;
        }
        Ok(self.buffer.remove(0))
    }

    /// 读取一帧的原始消息体（不反序列化）
    pub async fn read_payload(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(payload) = self.take_buffered_frame()? {
                return Ok(payload);
            }
            self.fill().await?;
        }
    }

    /// 读取并解码一帧消息
    pub async fn read_frame<M: DeserializeOwned>(&mut self) -> Result<M> {
        let payload = self.read_payload().await?;
        let msg = bincode::deserialize(&payload)?;
        Ok(msg)
    }

    /// 从缓冲区中取出一个完整帧（不足一帧时返回 None）
    fn take_buffered_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.buffer.len() < HEADER_SIZE {
            return Ok(None);
        }

        // 解析版本号
        let version = self.buffer[0];
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        // 解析长度（大端序）
        let length = u32::from_be_bytes([
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
            self.buffer[4],
        ]) as usize;

        if length > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: length,
                max: MAX_FRAME_SIZE,
            });
        }

        if self.buffer.len() < HEADER_SIZE + length {
            return Ok(None);
        }

        let payload = self.buffer[HEADER_SIZE..HEADER_SIZE + length].to_vec();
        self.buffer.drain(..HEADER_SIZE + length);
        Ok(Some(payload))
    }

    /// 从底层读取更多字节，对端关闭时返回 ConnectionClosed
    async fn fill(&mut self) -> Result<()> {
        let n = self.reader.read_buf(&mut self.buffer).await?;
        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> RecordSource for FrameReader<R> {
    async fn recv_record(&mut self, wait: Duration) -> Result<Option<MoveRecord>> {
        let payload = match timeout(wait, self.read_payload()).await {
            Ok(payload) => payload?,
            Err(_) => return Ok(None),
        };

        // 先按裸序列解码，空序列视为"尚无数据"
        let squares: Vec<Square> = bincode::deserialize(&payload)?;
        if squares.is_empty() {
            debug!("Ignoring empty move record");
            return Ok(None);
        }

        MoveRecord::try_from(squares).map(Some)
    }
}

/// 帧写入器
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    /// 创建新的帧写入器
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 写入握手阶段的裸字节
    pub async fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.writer.write_all(&[byte]).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// 为已序列化的消息体加帧头并写入
    pub async fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: payload.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        // 构造帧头
        let length = payload.len() as u32;
        let mut header = [0u8; HEADER_SIZE];
        header[0] = PROTOCOL_VERSION;
        header[1..5].copy_from_slice(&length.to_be_bytes());

        // 写入帧头和消息体
        self.writer.write_all(&header).await?;
        self.writer.write_all(payload).await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// 编码并写入一帧消息
    pub async fn write_frame<M: Serialize>(&mut self, msg: &M) -> Result<()> {
        let payload = encode_payload(msg)?;
        self.write_payload(&payload).await
    }

    /// 关闭写端
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> RecordSink for FrameWriter<W> {
    async fn send_record(&mut self, record: &MoveRecord) -> Result<()> {
        self.write_frame(record).await
    }

    async fn close(&mut self) -> Result<()> {
        self.shutdown().await
    }
}
