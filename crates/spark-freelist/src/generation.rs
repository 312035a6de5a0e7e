//! 一代（generation）池化值的容器。
//!
//! # 模块定位（Why）
//! - 自由链表的 `live`/`victim` 槽位各持有一代数据；清扫驱动只移动整代的 `Arc`，
//!   从不触碰其中的值，因此代容器本身只需提供 `push`/`pop`。
//! - 单属主池使用栈（后进先出），多生产者池使用无锁队列（先进先出）。
//!
//! # 契约说明（What）
//! - 两种实现都是 `Send + Sync`，以便最终在清扫线程上被释放；
//! - 容量不设上限，受限于可用内存。

use alloc::vec::Vec;

use crossbeam_queue::SegQueue;
use spin::Mutex;

/// 代容器的最小能力集合，由 [`GenerationSlots`](crate::slots::GenerationSlots) 泛型消费。
pub(crate) trait Generation: Default + Send + Sync + 'static {
    type Item;

    fn push(&self, item: Self::Item);

    fn pop(&self) -> Option<Self::Item>;
}

/// 单属主池使用的栈式代容器。
///
/// # 教案式说明
/// - **意图 (Why)**：单属主池的 `put`/`get` 只会在一个逻辑属主上执行，
///   后进先出可以让最近归还、缓存最热的值最先被复用。
/// - **逻辑 (How)**：`spin::Mutex<Vec<V>>`。属主独占访问，锁永远无竞争，
///   代价是一次原子比较交换；换来的是类型可以安全地跨线程移动和释放。
pub(crate) struct StackGeneration<V> {
    items: Mutex<Vec<V>>,
}

impl<V> Default for StackGeneration<V> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }
}

impl<V: Send + 'static> Generation for StackGeneration<V> {
    type Item = V;

    fn push(&self, item: V) {
        self.items.lock().push(item);
    }

    fn pop(&self) -> Option<V> {
        self.items.lock().pop()
    }
}

/// 多生产者单消费者池使用的队列式代容器，底层为 `crossbeam_queue::SegQueue`。
pub(crate) struct QueueGeneration<V> {
    items: SegQueue<V>,
}

impl<V> Default for QueueGeneration<V> {
    fn default() -> Self {
        Self {
            items: SegQueue::new(),
        }
    }
}

impl<V: Send + 'static> Generation for QueueGeneration<V> {
    type Item = V;

    fn push(&self, item: V) {
        self.items.push(item);
    }

    fn pop(&self) -> Option<V> {
        self.items.pop()
    }
}
