//! 与中继的连接
//!
//! 加入流程：连接 -> 读取准入字节 -> 等待配对消息（得知本方阵营）。
//! 配对后拆成读写两端，分别交给后台接收任务和前台对局任务。

use anyhow::{Context, Result};
use protocol::{Admission, FrameReader, FrameWriter, MatchFound, Side, TcpConnector};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{info, warn};

/// 加入结果
pub enum JoinOutcome<C> {
    /// 已被中继接受，等待配对
    Joined(C),
    /// 连接失败或中继已满
    CouldNotJoin,
}

impl<C> JoinOutcome<C> {
    pub fn is_joined(&self) -> bool {
        matches!(self, JoinOutcome::Joined(_))
    }
}

/// 对等通道：经由中继与对手相连的一条连接
pub struct PeerChannel<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

/// TCP 上的对等通道
pub type TcpPeerChannel = PeerChannel<OwnedReadHalf, OwnedWriteHalf>;

impl<R, W> PeerChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>) -> Self {
        Self { reader, writer }
    }

    /// 读取准入字节，被拒绝或读取失败都视为无法加入
    pub async fn handshake(mut self) -> JoinOutcome<Self> {
        let byte = match self.reader.read_byte().await {
            Ok(byte) => byte,
            Err(e) => {
                warn!("Handshake failed: {}", e);
                return JoinOutcome::CouldNotJoin;
            }
        };

        match Admission::from_byte(byte) {
            Ok(Admission::Accepted) => {
                info!("Accepted by relay, waiting for an opponent");
                JoinOutcome::Joined(self)
            }
            Ok(Admission::Rejected) => {
                warn!("Relay is full");
                JoinOutcome::CouldNotJoin
            }
            Err(e) => {
                warn!("Handshake failed: {}", e);
                JoinOutcome::CouldNotJoin
            }
        }
    }

    /// 阻塞等待配对，返回本方阵营
    pub async fn wait_for_opponent(&mut self) -> Result<Side> {
        let found: MatchFound = self
            .reader
            .read_frame()
            .await
            .context("Failed to receive pairing message")?;

        let side = found
            .side()
            .with_context(|| format!("Unknown side id: {}", found.side_id))?;
        info!("Opponent found, playing as {:?}", side);
        Ok(side)
    }

    /// 等待配对；配对消息读取失败时视为无法加入，调用方可以回到菜单重试
    pub async fn pair(mut self) -> JoinOutcome<(Side, Self)> {
        match self.wait_for_opponent().await {
            Ok(side) => JoinOutcome::Joined((side, self)),
            Err(e) => {
                warn!("Pairing failed: {:#}", e);
                JoinOutcome::CouldNotJoin
            }
        }
    }

    /// 拆分为读写两端
    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }
}

/// 连接中继并完成准入握手
pub async fn join(addr: &str) -> JoinOutcome<TcpPeerChannel> {
    let conn = match TcpConnector.connect(addr).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("Could not connect to {}: {}", addr, e);
            return JoinOutcome::CouldNotJoin;
        }
    };

    info!("Connected to relay: {}", addr);
    let (reader, writer) = conn.split();
    PeerChannel::new(reader, writer).handshake().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    type DuplexChannel = PeerChannel<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    /// 返回客户端通道和模拟中继的一端
    fn fake_relay() -> (DuplexChannel, DuplexStream) {
        let (client, relay) = tokio::io::duplex(1024);
        let (read, write) = tokio::io::split(client);
        (
            PeerChannel::new(FrameReader::new(read), FrameWriter::new(write)),
            relay,
        )
    }

    #[tokio::test]
    async fn test_join_and_pair() {
        let (channel, relay) = fake_relay();
        let mut relay = FrameWriter::new(relay);
        relay.write_byte(Admission::Accepted.to_byte()).await.unwrap();
        relay.write_frame(&MatchFound::new(Side::B)).await.unwrap();

        let JoinOutcome::Joined(mut channel) = channel.handshake().await else {
            panic!("expected to join");
        };
        assert_eq!(channel.wait_for_opponent().await.unwrap(), Side::B);
    }

    #[tokio::test]
    async fn test_rejected_when_full() {
        let (channel, mut relay) = fake_relay();
        relay.write_all(&[Admission::Rejected.to_byte()]).await.unwrap();
        assert!(!channel.handshake().await.is_joined());
    }

    #[tokio::test]
    async fn test_malformed_or_closed_handshake() {
        let (channel, mut relay) = fake_relay();
        relay.write_all(b"x").await.unwrap();
        assert!(!channel.handshake().await.is_joined());

        let (channel, relay) = fake_relay();
        drop(relay);
        assert!(!channel.handshake().await.is_joined());
    }

    #[tokio::test]
    async fn test_unknown_side_is_error() {
        let (channel, relay) = fake_relay();
        let mut relay = FrameWriter::new(relay);
        relay.write_byte(Admission::Accepted.to_byte()).await.unwrap();
        relay.write_frame(&MatchFound { side_id: 7 }).await.unwrap();

        let JoinOutcome::Joined(mut channel) = channel.handshake().await else {
            panic!("expected to join");
        };
        assert!(channel.wait_for_opponent().await.is_err());
    }

    #[tokio::test]
    async fn test_pair_returns_side() {
        let (channel, relay) = fake_relay();
        let mut relay = FrameWriter::new(relay);
        relay.write_byte(Admission::Accepted.to_byte()).await.unwrap();
        relay.write_frame(&MatchFound::new(Side::A)).await.unwrap();

        let JoinOutcome::Joined(channel) = channel.handshake().await else {
            panic!("expected to join");
        };
        let JoinOutcome::Joined((side, _channel)) = channel.pair().await else {
            panic!("expected to pair");
        };
        assert_eq!(side, Side::A);
    }

    #[tokio::test]
    async fn test_pair_fails_when_relay_leaves() {
        let (channel, mut relay) = fake_relay();
        relay.write_all(&[Admission::Accepted.to_byte()]).await.unwrap();

        let JoinOutcome::Joined(channel) = channel.handshake().await else {
            panic!("expected to join");
        };
        drop(relay);
        assert!(!channel.pair().await.is_joined());
    }

    #[tokio::test]
    async fn test_pair_fails_on_garbage_frame() {
        let (channel, mut relay) = fake_relay();
        relay.write_all(&[Admission::Accepted.to_byte()]).await.unwrap();
        // 版本号错误的帧头
        relay.write_all(&[7, 0, 0, 0, 0]).await.unwrap();

        let JoinOutcome::Joined(channel) = channel.handshake().await else {
            panic!("expected to join");
        };
        assert!(!channel.pair().await.is_joined());
    }

    #[tokio::test]
    async fn test_join_unreachable_relay() {
        // 绑定后立即释放，得到一个无人监听的端口
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        assert!(!join(&addr).await.is_joined());
    }
}
