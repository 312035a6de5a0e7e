use alloc::{sync::Weak, vec::Vec};
use core::mem;

use crossbeam_queue::SegQueue;
use spin::Mutex;

use super::TwoRoundClean;

pub(crate) type Registration = Weak<dyn TwoRoundClean>;

/// 注册记录的多生产者队列，外加一个不消费的重放游标。
///
/// # 教案式说明
/// - **意图 (Why)**：两阶段清扫需要对同一批池各访问两次：第一次把 `live` 降级为 `victim`，
///   下一次清扫再丢弃 `victim`。主出队位置服务第一阶段，重放游标服务第二阶段。
/// - **逻辑 (How)**：
///   - `pending` 为 `SegQueue`，任意线程注册时入队；
///   - `try_dequeue` 出队的记录会同时追加到 `retained` 日志（“保留数据”）；
///   - `replay_available` 一次取走日志中截至当前出队位置的全部记录，游标只前进不后退，
///     被重放过的记录随之释放。
/// - **契约 (What)**：`try_dequeue` 与 `replay_available` 只能由唯一的清扫执行方调用，
///   由 [`EpochState`](super::epoch::EpochState) 保证同一时刻只有一次清扫；`retained` 的锁因此永远无竞争。
pub(crate) struct RegistrationQueue {
    pending: SegQueue<Registration>,
    retained: Mutex<Vec<Registration>>,
}

impl RegistrationQueue {
    pub(crate) fn new() -> Self {
        Self {
            pending: SegQueue::new(),
            retained: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn enqueue(&self, registration: Registration) {
        self.pending.push(registration);
    }

    pub(crate) fn try_dequeue(&self) -> Option<Registration> {
        let registration = self.pending.pop()?;
        self.retained.lock().push(Weak::clone(&registration));
        Some(registration)
    }

    pub(crate) fn replay_available(&self) -> Vec<Registration> {
        mem::take(&mut *self.retained.lock())
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// 此刻已入队、尚未出队的记录数；清扫以它为本轮第一阶段的上限，
    /// 本轮执行期间新到达的登记留给下一轮。
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 是否仍有已出队、等待重放的记录。
    pub(crate) fn has_retained(&self) -> bool {
        !self.retained.lock().is_empty()
    }
}
