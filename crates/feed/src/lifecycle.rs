use gridpulse_core::market::entity::ChannelState;
use std::sync::Mutex;
use tokio::task::AbortHandle;

struct Inner {
    state: ChannelState,
    // 每次连接/断开都会递增，后台任务据此判断自己是否已过期
    epoch: u64,
    task: Option<AbortHandle>,
}

/// # Summary
/// 订阅通道共用的连接状态机。
///
/// # Invariants
/// - 状态转换：`Disconnected → Connecting → Connected → Disconnected`。
/// - 只有持有当前 epoch 且处于 `Connected` 的后台任务才允许投递。
pub(crate) struct Lifecycle {
    inner: Mutex<Inner>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ChannelState::Disconnected,
                epoch: 0,
                task: None,
            }),
        }
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// 从 `Disconnected` 进入 `Connecting`，返回本次连接的 epoch；其他状态返回 None
    pub(crate) fn begin_connect(&self) -> Option<u64> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state != ChannelState::Disconnected {
            return None;
        }
        inner.epoch += 1;
        inner.state = ChannelState::Connecting;
        Some(inner.epoch)
    }

    /// 连接建立成功。期间若已被断开则返回 false。
    pub(crate) fn mark_connected(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.epoch != epoch || inner.state != ChannelState::Connecting {
            return false;
        }
        inner.state = ChannelState::Connected;
        true
    }

    /// 登记后台任务句柄；若 epoch 已过期则立即中止该任务
    pub(crate) fn attach_task(&self, epoch: u64, task: AbortHandle) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.epoch == epoch && inner.state == ChannelState::Connected {
            inner.task = Some(task);
        } else {
            task.abort();
        }
    }

    /// 建连失败或连接中途丢失，回落到 `Disconnected`
    pub(crate) fn connection_lost(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.epoch != epoch || inner.state == ChannelState::Disconnected {
            return false;
        }
        inner.epoch += 1;
        inner.state = ChannelState::Disconnected;
        inner.task = None;
        true
    }

    /// 主动断开：作废当前 epoch 并中止后台任务。返回断开前是否处于非断开状态。
    pub(crate) fn disconnect(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let was_active = inner.state != ChannelState::Disconnected;
        inner.epoch += 1;
        inner.state = ChannelState::Disconnected;
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        was_active
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.epoch == epoch && inner.state == ChannelState::Connected
    }
}
