use alloc::sync::Arc;
use core::fmt;

use crate::{
    generation::QueueGeneration, pool::ValuePool, slots::GenerationSlots, sweep::SweepRegistry,
};

/// 多生产者、单消费者的分代自由链表。
///
/// # 教案式说明
/// - **意图 (Why)**：值常在一个线程上取用、在另一批线程上归还（例如请求对象在工作线程释放），
///   此时 `put` 必须允许并发调用；
/// - **逻辑 (How)**：每一代是一个无锁 `SegQueue`，并发 `put` 直接入队；
///   首次 `put` 通过比较交换建立 live 代，只有赢家向注册表登记；
/// - **契约 (What)**：`put` 可在任意线程并发调用；`get`/`get_or_create` 约定只由一个指定消费者调用，
///   多个消费者并发取用依旧内存安全，但先进先出的顺序不再有意义。
pub struct MpFreeList<V> {
    slots: Arc<GenerationSlots<QueueGeneration<V>>>,
    registry: Arc<SweepRegistry>,
}

impl<V: Send + 'static> MpFreeList<V> {
    /// 创建挂在进程级注册表上的空池，见 [`SweepRegistry::global`]。
    pub fn new() -> Self {
        Self::with_registry(Arc::clone(SweepRegistry::global()))
    }

    /// 创建挂在指定注册表上的空池；首次 `put` 时登记。
    pub fn with_registry(registry: Arc<SweepRegistry>) -> Self {
        Self {
            slots: Arc::new(GenerationSlots::new()),
            registry,
        }
    }

    /// 可并发调用。
    pub fn put(&self, value: V) {
        self.slots.put(&self.registry, value);
    }

    /// 仅限指定消费者调用。
    pub fn get(&self) -> Option<V> {
        self.slots.get()
    }

    /// 仅限指定消费者调用；池为空时才调用 `factory`。
    pub fn get_or_create(&self, factory: impl FnOnce() -> V) -> V {
        self.get().unwrap_or_else(factory)
    }
}

impl<V: Send + 'static> Default for MpFreeList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + 'static> ValuePool<V> for MpFreeList<V> {
    fn with_registry(registry: Arc<SweepRegistry>) -> Self {
        MpFreeList::with_registry(registry)
    }

    fn put(&self, value: V) {
        MpFreeList::put(self, value);
    }

    fn get(&self) -> Option<V> {
        MpFreeList::get(self)
    }
}

impl<V> fmt::Debug for MpFreeList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpFreeList").finish_non_exhaustive()
    }
}
