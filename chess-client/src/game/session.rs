//! 对局会话
//!
//! 两个任务：
//! - 对局任务独占 [`GameState`]，处理展示层事件和对手记录，负责所有发送；
//! - 接收任务只从连接读取记录，经通道交给对局任务。
//!
//! 对局结束时对局任务置位停止标志，等接收任务退出后再关闭连接。

use anyhow::{Context, Result};
use chess_rules::GameState;
use protocol::{GameResult, MoveRecord, RecordSink, RecordSource, Side, POLL_IDLE, RECEIVE_WAIT};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::input::GameEvent;
use super::state::GameView;

/// 事件通道长度
const EVENT_QUEUE_SIZE: usize = 32;

/// 接收任务发给对局任务的消息
#[derive(Debug)]
enum RemoteEvent {
    Record(MoveRecord),
    Failed(String),
}

/// 进行中的对局
pub struct Session {
    events: mpsc::Sender<GameEvent>,
    view: watch::Receiver<GameView>,
    driver: JoinHandle<GameResult>,
}

impl Session {
    /// 启动对局任务和接收任务
    ///
    /// `source` 必须能在 `recv_record` 被取消时保留已读到的数据。
    pub fn start<S, K>(me: Side, source: S, sink: K) -> Self
    where
        S: RecordSource + 'static,
        K: RecordSink + 'static,
    {
        let state = GameState::new(me);
        let (view_tx, view) = watch::channel(GameView::from_state(&state, None));
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        let (remote_tx, remote_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        let (stop_tx, stop_rx) = watch::channel(false);

        let pump = tokio::spawn(run_pump(source, remote_tx, stop_rx));
        let driver = tokio::spawn(
            Driver {
                state,
                sink,
                view_tx,
                notice: None,
            }
            .run(events_rx, remote_rx, stop_tx, pump),
        );

        info!("Game started as {:?}", me);
        Self {
            events: events_tx,
            view,
            driver,
        }
    }

    /// 订阅对局快照
    pub fn view(&self) -> watch::Receiver<GameView> {
        self.view.clone()
    }

    /// 发送一个事件，对局已结束时返回 false
    ///
    /// 对局未结束时丢弃会话视为认输。
    pub async fn send(&self, event: GameEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// 等待对局任务结束，返回最终结果
    pub async fn finish(self) -> Result<GameResult> {
        self.driver.await.context("Game task panicked")
    }
}

/// 对局任务
struct Driver<K> {
    state: GameState,
    sink: K,
    view_tx: watch::Sender<GameView>,
    notice: Option<String>,
}

impl<K: RecordSink> Driver<K> {
    async fn run(
        mut self,
        mut events: mpsc::Receiver<GameEvent>,
        mut remote: mpsc::Receiver<RemoteEvent>,
        stop_tx: watch::Sender<bool>,
        pump: JoinHandle<()>,
    ) -> GameResult {
        while !self.state.result().is_over() {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        info!("Input closed, resigning");
                        self.handle_event(GameEvent::Resign).await;
                    }
                },
                remote_event = remote.recv() => match remote_event {
                    Some(RemoteEvent::Record(record)) => self.handle_remote(record).await,
                    Some(RemoteEvent::Failed(reason)) => {
                        warn!("Connection failed: {}", reason);
                        self.state.connection_lost();
                    }
                    None => self.state.connection_lost(),
                },
            }
            self.publish();
        }

        // 结束：先停接收任务，再关闭连接
        let _ = stop_tx.send(true);
        drop(remote);
        if pump.await.is_err() {
            warn!("Receive task panicked");
        }
        if let Err(e) = self.sink.close().await {
            debug!("Close failed: {}", e);
        }

        let result = self.state.result();
        info!("Game over: {}", result);
        self.publish();
        result
    }

    async fn handle_event(&mut self, event: GameEvent) {
        let outcome = match event {
            GameEvent::SelectPiece(square) => self.state.select_piece(square).map(|_| Vec::new()),
            GameEvent::DropPiece(square) => self.state.attempt_move(square),
            GameEvent::Resign => self.state.resign(),
        };

        match outcome {
            Ok(outbox) => {
                self.notice = None;
                self.send_all(&outbox).await;
            }
            Err(e) => {
                debug!("Rejected {:?}: {}", event, e);
                self.notice = Some(e.to_string());
            }
        }
    }

    async fn handle_remote(&mut self, record: MoveRecord) {
        match self.state.apply_remote(&record) {
            Ok(outbox) => self.send_all(&outbox).await,
            Err(e) => {
                warn!("Protocol violation, dropping connection: {}", e);
                self.state.connection_lost();
            }
        }
    }

    async fn send_all(&mut self, outbox: &[MoveRecord]) {
        for record in outbox {
            debug!("Sending {}", record);
            if let Err(e) = self.sink.send_record(record).await {
                warn!("Send failed: {}", e);
                self.state.connection_lost();
                return;
            }
        }
    }

    fn publish(&self) {
        self.view_tx
            .send_replace(GameView::from_state(&self.state, self.notice.clone()));
    }
}

/// 接收任务：限时接收，无数据时短暂空闲，直到停止标志置位
async fn run_pump<S: RecordSource>(
    mut source: S,
    tx: mpsc::Sender<RemoteEvent>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            _ = stop.changed() => break,
            received = source.recv_record(RECEIVE_WAIT) => match received {
                Ok(Some(record)) => {
                    debug!("Received {}", record);
                    if tx.send(RemoteEvent::Record(record)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tokio::select! {
                        _ = stop.changed() => break,
                        _ = sleep(POLL_IDLE) => {}
                    }
                }
                Err(e) => {
                    let _ = tx.send(RemoteEvent::Failed(e.to_string())).await;
                    break;
                }
            },
        }
    }
    debug!("Receive task stopped");
}
