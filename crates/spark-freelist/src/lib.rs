#![deny(unsafe_code)]

//! `spark-freelist` 提供分代式对象/缓冲自由链表，以及在后台回收陈旧池化数据的两阶段清扫驱动。
//!
//! # 模块定位（Why）
//! - 热路径（序列化缓冲、每请求暂存对象）反复分配/释放代价高昂，自由链表让调用方复用已分配的值；
//! - 池化数据不能无限期驻留：长时间未被取用的值会在有限个清扫周期内被释放，限制内存峰值。
//!
//! # 设计概要（How）
//! - 每个池持有 `live`、`victim` 两代，槽位由 `arc_swap::ArcSwapOption` 原子替换，清扫从不阻塞调用方；
//! - [`FreeList`] 为单属主栈式池，[`MpFreeList`] 为多生产者单消费者队列式池；
//! - [`SizeClassedPool`] 以 32 个 2 的幂分级复用变长缓冲（`Vec<T>`、`BytesMut`）；
//! - [`SweepRegistry`] 登记持有 live 代的池，由 [`SweepTrigger`] 驱动“先丢 victim、再降级 live”的清扫。
//!
//! # 生命周期（What）
//! - 进程启动时调用 [`SweepRegistry::install_global`] 显式安装全局注册表；
//!   未安装时首个 `FreeList::new()` 等调用以默认配置初始化；
//! - 测试或嵌入场景可通过 `with_registry` 把池挂到独立注册表上，例如配合 [`ManualTrigger`] 手动驱动清扫。

extern crate alloc;

mod buffer;
mod config;
mod error;
mod free_list;
mod generation;
mod mp_free_list;
mod pool;
mod size_class;
mod sized;
mod slots;

pub mod sweep;

pub use buffer::PoolableBuffer;
pub use config::{DEFAULT_SWEEP_INTERVAL_MS, DEFAULT_SWEEP_THREAD_NAME, SweepConfig};
pub use error::{FreeListError, Result};
pub use free_list::FreeList;
pub use mp_free_list::MpFreeList;
pub use pool::ValuePool;
pub use size_class::{MAX_BUCKET_LEN, SIZE_CLASSES, ceil_log2, floor_log2};
pub use sized::{BytesFreeList, BytesMpFreeList, SizeClassedPool, SliceFreeList, SliceMpFreeList};
#[cfg(feature = "tokio")]
pub use sweep::TokioTrigger;
pub use sweep::{
    EpochPhase, ManualTrigger, SweepOutcome, SweepRegistry, SweepStats, SweepTask, SweepTrigger,
    ThreadTrigger, TwoRoundClean,
};
