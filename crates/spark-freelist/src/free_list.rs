use alloc::sync::Arc;
use core::{cell::Cell, fmt, marker::PhantomData};

use crate::{
    generation::StackGeneration, pool::ValuePool, slots::GenerationSlots, sweep::SweepRegistry,
};

/// 单属主分代自由链表。
///
/// # 模块角色（Why）
/// - 面向“每线程/每任务一份”的热路径暂存对象：取用与归还都在同一个逻辑属主上发生，
///   因此用栈（后进先出）保存值，优先复用最近归还、缓存最热的对象；
/// - 长时间未被取用的值由 [`SweepRegistry`] 在两个清扫周期内回收。
///
/// # 契约说明（What）
/// - `FreeList` 是 `Send` 但不是 `Sync`：可以整体移交给另一个线程，却不能被多个线程同时访问，
///   单属主约束由类型系统保证。需要多线程归还时使用 [`MpFreeList`](crate::MpFreeList)；
/// - `get` 永不分配；`get_or_create` 仅在池为空时调用工厂。
///
/// # 示例
/// ```
/// use std::sync::Arc;
/// use spark_freelist::{FreeList, ManualTrigger, SweepRegistry};
///
/// let registry = SweepRegistry::with_trigger(Arc::new(ManualTrigger::new()));
/// let pool = FreeList::with_registry(registry);
/// pool.put(1);
/// pool.put(2);
/// assert_eq!(pool.get(), Some(2));
/// assert_eq!(pool.get(), Some(1));
/// assert_eq!(pool.get(), None);
/// ```
pub struct FreeList<V> {
    slots: Arc<GenerationSlots<StackGeneration<V>>>,
    registry: Arc<SweepRegistry>,
    _single_owner: PhantomData<Cell<()>>,
}

impl<V: Send + 'static> FreeList<V> {
    /// 创建挂在进程级注册表上的空池。
    pub fn new() -> Self {
        Self::with_registry(Arc::clone(SweepRegistry::global()))
    }

    /// 创建挂在指定注册表上的空池；构造时不登记，首次 `put` 才建立 live 代并登记。
    pub fn with_registry(registry: Arc<SweepRegistry>) -> Self {
        Self {
            slots: Arc::new(GenerationSlots::new()),
            registry,
            _single_owner: PhantomData,
        }
    }

    /// 归还一个值；必要时建立新的 live 代并向注册表登记。
    pub fn put(&self, value: V) {
        self.slots.put(&self.registry, value);
    }

    /// 取出最近归还的值：先查 live 代，再查 victim 代。
    pub fn get(&self) -> Option<V> {
        self.slots.get()
    }

    /// 池中有值时返回该值且不调用 `factory`；否则返回 `factory()` 的结果。
    pub fn get_or_create(&self, factory: impl FnOnce() -> V) -> V {
        self.get().unwrap_or_else(factory)
    }
}

impl<V: Send + 'static> Default for FreeList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + 'static> ValuePool<V> for FreeList<V> {
    fn with_registry(registry: Arc<SweepRegistry>) -> Self {
        FreeList::with_registry(registry)
    }

    fn put(&self, value: V) {
        FreeList::put(self, value);
    }

    fn get(&self) -> Option<V> {
        FreeList::get(self)
    }
}

impl<V> fmt::Debug for FreeList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeList").finish_non_exhaustive()
    }
}
