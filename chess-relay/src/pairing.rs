//! 配对管理
//!
//! 等待中的连接放在一个栈里，新连接总是和最近进入等待的连接配对（后进先出）。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// 连接 ID
pub type ConnectionId = u64;

/// 入队结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// 没有等待者，进入等待栈
    Waiting,
    /// 与栈顶的等待者配对
    Matched { waiting_peer: ConnectionId },
}

/// 配对表
pub struct PairingTable {
    /// 等待配对的连接（栈顶为最近加入的）
    waiting: Vec<ConnectionId>,
    /// 连接 ID -> 对手连接 ID（双向各一条）
    partners: HashMap<ConnectionId, ConnectionId>,
    /// 当前存活的连接数
    live: usize,
    /// 最大连接数
    capacity: usize,
    /// ID 生成器
    next_id: AtomicU64,
}

impl PairingTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            waiting: Vec::new(),
            partners: HashMap::new(),
            live: 0,
            capacity,
            next_id: AtomicU64::new(1),
        }
    }

    /// 生成新的连接 ID
    fn generate_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// 准入检查：未满时分配 ID 并计入存活数，已满返回 None
    pub fn try_admit(&mut self) -> Option<ConnectionId> {
        if self.live >= self.capacity {
            return None;
        }
        self.live += 1;
        Some(self.generate_id())
    }

    /// 加入配对：有等待者则与栈顶配对，否则进入等待
    pub fn enqueue(&mut self, id: ConnectionId) -> Enqueued {
        match self.waiting.pop() {
            Some(waiting_peer) => {
                self.partners.insert(id, waiting_peer);
                self.partners.insert(waiting_peer, id);
                Enqueued::Matched { waiting_peer }
            }
            None => {
                self.waiting.push(id);
                Enqueued::Waiting
            }
        }
    }

    /// 获取对手
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.partners.get(&id).copied()
    }

    /// 连接关闭：清理等待栈和双方的配对记录，返回原对手
    pub fn release(&mut self, id: ConnectionId) -> Option<ConnectionId> {
        self.waiting.retain(|&waiting| waiting != id);

        let partner = self.partners.remove(&id);
        if let Some(partner) = partner {
            self.partners.remove(&partner);
        }

        self.live = self.live.saturating_sub(1);
        partner
    }

    /// 当前存活连接数
    pub fn live(&self) -> usize {
        self.live
    }

    /// 等待中的连接数
    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }
}
