use alloc::{sync::Arc, vec::Vec};
use core::{array, fmt, marker::PhantomData};

use bytes::BytesMut;

use crate::{
    buffer::PoolableBuffer,
    free_list::FreeList,
    mp_free_list::MpFreeList,
    pool::ValuePool,
    size_class::{SIZE_CLASSES, ceil_log2, floor_log2, in_range},
    sweep::SweepRegistry,
};

/// 按 2 的幂容量分级的缓冲池。
///
/// # 模块角色（Why）
/// - 序列化缓冲、临时切片的长度各不相同，单一自由链表无法保证取出的缓冲足够大；
/// - 以 32 个自由链表覆盖 `2^0..2^31` 的容量阶梯，取用时只查一个分级，保持 O(1)。
///
/// # 核心机制（How）
/// - `put`：容量越界（`< 1` 或 `> 2^31 - 1`）直接丢弃；否则放入 `floor_log2(capacity)` 级；
/// - `get`：长度越界返回 `None`；否则查 `ceil_log2(length)` 级，命中后把缓冲重置为恰好 `length` 个元素；
/// - `get_or_create`：未命中时按该级名义容量 `2^idx` 新建，越界长度则按 `length` 精确分配。
///
/// # 契约说明（What）
/// - 容量为 `C` 的缓冲恰好能被 `ceil_log2(length) == floor_log2(C)` 的请求取到；
/// - 线程约束沿用底层池 `P`：[`SliceFreeList`] 单属主，[`SliceMpFreeList`] 多生产者单消费者；
/// - 返回的缓冲内容均为默认值，不携带上一位使用者的数据。
///
/// # 示例
/// ```
/// use std::sync::Arc;
/// use spark_freelist::{ManualTrigger, SliceFreeList, SweepRegistry};
///
/// let registry = SweepRegistry::with_trigger(Arc::new(ManualTrigger::new()));
/// let pool: SliceFreeList<u8> = SliceFreeList::with_registry(registry);
/// let buf = pool.get_or_create(10);
/// assert_eq!(buf.len(), 10);
/// assert_eq!(buf.capacity(), 16);
/// pool.put(buf);
/// assert!(pool.get(9).is_some());
/// ```
pub struct SizeClassedPool<B, P> {
    slots: [P; SIZE_CLASSES],
    _buffer: PhantomData<fn(B) -> B>,
}

/// 单属主的 `Vec<T>` 分级池。
pub type SliceFreeList<T> = SizeClassedPool<Vec<T>, FreeList<Vec<T>>>;

/// 多生产者单消费者的 `Vec<T>` 分级池。
pub type SliceMpFreeList<T> = SizeClassedPool<Vec<T>, MpFreeList<Vec<T>>>;

/// 单属主的 `BytesMut` 分级池。
pub type BytesFreeList = SizeClassedPool<BytesMut, FreeList<BytesMut>>;

/// 多生产者单消费者的 `BytesMut` 分级池。
pub type BytesMpFreeList = SizeClassedPool<BytesMut, MpFreeList<BytesMut>>;

impl<B: PoolableBuffer, P: ValuePool<B>> SizeClassedPool<B, P> {
    /// 32 个分级都挂在进程级注册表上。
    pub fn new() -> Self {
        Self::with_registry(Arc::clone(SweepRegistry::global()))
    }

    /// 32 个分级共享同一个注册表，各自独立登记与清扫。
    pub fn with_registry(registry: Arc<SweepRegistry>) -> Self {
        Self {
            slots: array::from_fn(|_| P::with_registry(Arc::clone(&registry))),
            _buffer: PhantomData,
        }
    }

    /// 归还缓冲；容量越界时静默丢弃。
    pub fn put(&self, buf: B) {
        let capacity = buf.capacity();
        if !in_range(capacity) {
            return;
        }
        self.slots[floor_log2(capacity)].put(buf);
    }

    /// 取出长度恰为 `length` 的缓冲；未命中或长度越界时返回 `None`，由调用方自行分配。
    pub fn get(&self, length: usize) -> Option<B> {
        if !in_range(length) {
            return None;
        }
        self.take(ceil_log2(length), length)
    }

    /// 同 [`SizeClassedPool::get`]，未命中时按该级名义容量 `2^idx` 新建；长度越界时按 `length` 精确分配。
    pub fn get_or_create(&self, length: usize) -> B {
        if !in_range(length) {
            return fresh(length, length);
        }
        let idx = ceil_log2(length);
        self.take(idx, length)
            .unwrap_or_else(|| fresh(1 << idx, length))
    }

    fn take(&self, idx: usize, length: usize) -> Option<B> {
        let mut buf = self.slots[idx].get()?;
        debug_assert!(buf.capacity() >= length);
        buf.reset_to_len(length);
        Some(buf)
    }
}

fn fresh<B: PoolableBuffer>(capacity: usize, length: usize) -> B {
    let mut buf = B::with_capacity(capacity);
    buf.reset_to_len(length);
    buf
}

impl<B: PoolableBuffer, P: ValuePool<B>> Default for SizeClassedPool<B, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, P> fmt::Debug for SizeClassedPool<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeClassedPool")
            .field("size_classes", &SIZE_CLASSES)
            .finish_non_exhaustive()
    }
}
