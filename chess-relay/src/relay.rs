//! 中继服务主逻辑
//!
//! 中继只负责配对和转发，从不解析走法内容。
//! 每个连接一个读任务和一个写任务；共享状态放在一把锁后面，
//! 持锁期间只做簿记，实际发送在释放锁之后进行。

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use protocol::{
    encode_payload, Admission, FrameReader, FrameWriter, MatchFound, MoveRecord, ProtocolError,
    Side, TcpConnection, TcpListener,
};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::pairing::{ConnectionId, Enqueued, PairingTable};

/// 每个连接的发送队列长度
const OUTBOUND_QUEUE_SIZE: usize = 32;

/// 发往某个连接的数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// 握手字节（不带帧头）
    Admission(Admission),
    /// 一帧消息体，原样转发
    Payload(Vec<u8>),
}

/// 中继状态
pub struct RelayState {
    pub pairing: PairingTable,
    /// 连接 ID -> 发送通道
    connections: HashMap<ConnectionId, mpsc::Sender<Outbound>>,
}

impl RelayState {
    pub fn new(max_connections: usize) -> Self {
        Self {
            pairing: PairingTable::new(max_connections),
            connections: HashMap::new(),
        }
    }

    fn sender(&self, id: ConnectionId) -> Option<mpsc::Sender<Outbound>> {
        self.connections.get(&id).cloned()
    }
}

/// 待发送的消息
///
/// 持锁时收集，释放锁之后再 `flush`。
struct PendingMessages {
    messages: Vec<(ConnectionId, mpsc::Sender<Outbound>, Outbound)>,
}

impl PendingMessages {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    fn send(&mut self, state: &RelayState, id: ConnectionId, msg: Outbound) {
        match state.sender(id) {
            Some(tx) => self.messages.push((id, tx, msg)),
            None => debug!("Connection {} already gone, dropping message", id),
        }
    }

    async fn flush(self) {
        for (id, tx, msg) in self.messages {
            if tx.send(msg).await.is_err() {
                debug!("Writer for connection {} has stopped", id);
            }
        }
    }
}

/// 中继服务
#[derive(Clone)]
pub struct RelayService {
    state: Arc<Mutex<RelayState>>,
}

impl RelayService {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(RelayState::new(config.max_connections))),
        }
    }

    /// 当前存活连接数
    pub async fn live_connections(&self) -> usize {
        self.state.lock().await.pairing.live()
    }

    /// 接受连接的主循环，每个连接一个任务
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(
            "Relay listening on {}",
            listener.local_addr().unwrap_or_default()
        );

        loop {
            let conn = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    continue;
                }
            };

            let service = self.clone();
            tokio::spawn(async move {
                service.handle_connection(conn).await;
            });
        }
    }

    /// 处理单个连接：准入、配对、转发，结束时通知对手
    async fn handle_connection(&self, conn: TcpConnection) {
        let peer = conn.peer_addr().unwrap_or_else(|| "unknown".to_string());
        let (reader, mut writer) = conn.split();

        let admitted = self.state.lock().await.pairing.try_admit();
        let Some(id) = admitted else {
            info!("Rejecting {}: relay is full", peer);
            if let Err(e) = writer.write_byte(Admission::Rejected.to_byte()).await {
                debug!("Failed to send rejection to {}: {}", peer, e);
            }
            let _ = writer.shutdown().await;
            return;
        };

        info!("Connection {} accepted from {}", id, peer);

        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let writer_task = tokio::spawn(run_writer(id, writer, rx));

        match self.register(id, tx).await {
            Ok(()) => self.forward_loop(id, reader).await,
            Err(e) => warn!("Connection {} setup failed: {:#}", id, e),
        }

        self.disconnect(id).await;
        let _ = writer_task.await;
    }

    /// 发送准入字节，登记发送通道，并尝试配对
    ///
    /// 准入字节必须在连接对配对可见之前进入自己的发送队列，
    /// 否则对手的配对消息可能排在它前面。
    async fn register(&self, id: ConnectionId, tx: mpsc::Sender<Outbound>) -> Result<()> {
        let side_a = encode_payload(&MatchFound::new(Side::A))?;
        let side_b = encode_payload(&MatchFound::new(Side::B))?;

        tx.send(Outbound::Admission(Admission::Accepted))
            .await
            .context("Writer stopped before admission")?;

        let mut pending = PendingMessages::new();
        {
            let mut state = self.state.lock().await;
            state.connections.insert(id, tx);

            match state.pairing.enqueue(id) {
                Enqueued::Waiting => {
                    info!("Connection {} waiting for an opponent", id);
                }
                Enqueued::Matched { waiting_peer } => {
                    // 等待者先手（A），新来的后手（B）
                    info!("Paired connection {} (A) with {} (B)", waiting_peer, id);
                    pending.send(&state, waiting_peer, Outbound::Payload(side_a));
                    pending.send(&state, id, Outbound::Payload(side_b));
                }
            }
        }
        pending.flush().await;

        Ok(())
    }

    /// 读取帧并原样转发给对手，直到连接关闭或出错
    async fn forward_loop(&self, id: ConnectionId, mut reader: FrameReader<OwnedReadHalf>) {
        loop {
            let payload = match reader.read_payload().await {
                Ok(payload) => payload,
                Err(ProtocolError::ConnectionClosed) => {
                    info!("Connection {} closed", id);
                    return;
                }
                Err(e) => {
                    warn!("Connection {} read error: {}", id, e);
                    return;
                }
            };

            let mut pending = PendingMessages::new();
            {
                let state = self.state.lock().await;
                match state.pairing.partner_of(id) {
                    Some(partner) => {
                        debug!("Forwarding {} bytes: {} -> {}", payload.len(), id, partner);
                        pending.send(&state, partner, Outbound::Payload(payload));
                    }
                    None => {
                        debug!("Connection {} has no partner, dropping {} bytes", id, payload.len());
                    }
                }
            }
            pending.flush().await;
        }
    }

    /// 清理连接，并向对手发送断线通知
    async fn disconnect(&self, id: ConnectionId) {
        let notice = match encode_payload(&MoveRecord::disconnect_notice()) {
            Ok(notice) => Some(notice),
            Err(e) => {
                warn!("Failed to encode disconnect notice: {}", e);
                None
            }
        };

        let mut pending = PendingMessages::new();
        {
            let mut state = self.state.lock().await;
            state.connections.remove(&id);

            if let Some(partner) = state.pairing.release(id) {
                info!("Notifying connection {} that its opponent left", partner);
                if let Some(notice) = notice {
                    pending.send(&state, partner, Outbound::Payload(notice));
                }
            }
            debug!("Live connections: {}", state.pairing.live());
        }
        pending.flush().await;
    }
}

/// 写任务：按顺序写出队列中的数据，队列关闭后关闭写端
async fn run_writer(
    id: ConnectionId,
    mut writer: FrameWriter<OwnedWriteHalf>,
    mut rx: mpsc::Receiver<Outbound>,
) {
    while let Some(msg) = rx.recv().await {
        let result = match &msg {
            Outbound::Admission(admission) => writer.write_byte(admission.to_byte()).await,
            Outbound::Payload(payload) => writer.write_payload(payload).await,
        };

        if let Err(e) = result {
            debug!("Write to connection {} failed: {}", id, e);
            break;
        }
    }

    let _ = writer.shutdown().await;
}
