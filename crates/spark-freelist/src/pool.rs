use alloc::sync::Arc;

use crate::sweep::SweepRegistry;

/// 按值存取的池能力，供 [`SizeClassedPool`](crate::SizeClassedPool) 在两种自由链表之间泛型切换。
///
/// # 契约（What）
/// - `with_registry` 构造挂在指定注册表上的空池；
/// - `put`/`get` 的线程约束沿用具体实现：[`FreeList`](crate::FreeList) 单属主，
///   [`MpFreeList`](crate::MpFreeList) 多生产者单消费者。
pub trait ValuePool<V>: Sized {
    /// 构造挂在 `registry` 上的空池。
    fn with_registry(registry: Arc<SweepRegistry>) -> Self;

    /// 归还一个值；永远成功。
    fn put(&self, value: V);

    /// 取出一个值；池为空时返回 `None`，从不分配。
    fn get(&self) -> Option<V>;
}
