//! 延迟触发器：决定“何时”执行下一次清扫。
//!
//! # 设计初衷（Why）
//! - 清扫必须在调用方线程之外执行，且只在有待清理工作时才产生后台活动；
//! - 驱动本身不关心时机从何而来：后台线程、异步运行时定时器、宿主自己的事件循环都可以。
//!   因此以 [`SweepTrigger`] 抽象“稍后执行一次”，由 [`SweepRegistry`](super::SweepRegistry) 注入。
//!
//! # 实现清单（What）
//! - [`ThreadTrigger`]：首次投递时拉起一个具名后台线程，每个任务延迟 `interval` 后执行；
//! - [`ManualTrigger`]：任务排队等待宿主调用 [`ManualTrigger::fire_pending`]，适用于外部驱动与测试；
//! - `TokioTrigger`（`tokio` 特性）：在给定运行时上 `sleep` 后执行。

use alloc::{boxed::Box, string::String, vec::Vec};
use core::{fmt, mem, time::Duration};
use std::{
    panic::{self, AssertUnwindSafe},
    thread,
};

use crossbeam_channel::Sender;
use spin::Mutex;
use tracing::{debug, warn};

use crate::{
    config::SweepConfig,
    error::{FreeListError, Result},
};

/// 一次待执行的清扫。
pub struct SweepTask {
    run: Box<dyn FnOnce() + Send + 'static>,
}

impl SweepTask {
    /// 包装一次清扫；触发器实现只需在合适的时机调用一次 [`SweepTask::run`]。
    pub fn new(run: impl FnOnce() + Send + 'static) -> Self {
        Self { run: Box::new(run) }
    }

    /// 在当前线程上执行清扫。回调中的 panic 原样向调用方传播，驱动状态已在传播前复位。
    pub fn run(self) {
        (self.run)();
    }
}

impl fmt::Debug for SweepTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepTask").finish_non_exhaustive()
    }
}

/// “稍后执行一次”的调度能力。
///
/// # 契约（What）
/// - `schedule` 不得在调用栈内同步执行任务：注册发生在调用方的 `put` 路径上；
/// - 每次成功的 `schedule` 必须最终恰好执行一次任务；
/// - 返回错误时任务被丢弃，驱动会回到空闲并在下一次注册时重试。
pub trait SweepTrigger: Send + Sync + 'static {
    fn schedule(&self, task: SweepTask) -> Result<()>;
}

/// 基于专用后台线程的触发器。
///
/// # 教案式说明
/// - **逻辑 (How)**：首次投递时创建无界 `crossbeam_channel` 并拉起具名线程，
///   线程按到达顺序取出任务，先休眠 `interval` 再执行；所有发送端释放后线程自然退出。
/// - **风险 (Trade-offs)**：线程拉起失败或线程已退出时返回错误并清空发送端，下一次投递会重新拉起。
pub struct ThreadTrigger {
    interval: Duration,
    thread_name: String,
    sender: Mutex<Option<Sender<SweepTask>>>,
}

impl ThreadTrigger {
    /// 记录间隔与线程名；线程推迟到首次 `schedule` 才拉起，构造本身不会失败。
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            interval: config.interval(),
            thread_name: config.thread_name.clone(),
            sender: Mutex::new(None),
        }
    }

    fn sender(&self) -> Result<Sender<SweepTask>> {
        let mut slot = self.sender.lock();
        if let Some(sender) = slot.as_ref() {
            return Ok(sender.clone());
        }

        let (sender, receiver) = crossbeam_channel::unbounded::<SweepTask>();
        let interval = self.interval;
        thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "sweep worker started");
                for task in receiver.iter() {
                    thread::sleep(interval);
                    if panic::catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
                        warn!("sweep task panicked, worker keeps serving");
                    }
                }
                debug!("sweep worker stopped");
            })
            .map_err(|err| FreeListError::TriggerSpawn {
                detail: err.to_string(),
            })?;
        *slot = Some(sender.clone());
        Ok(sender)
    }
}

impl SweepTrigger for ThreadTrigger {
    fn schedule(&self, task: SweepTask) -> Result<()> {
        let sender = self.sender()?;
        if sender.send(task).is_err() {
            *self.sender.lock() = None;
            return Err(FreeListError::TriggerUnavailable);
        }
        Ok(())
    }
}

impl fmt::Debug for ThreadTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTrigger")
            .field("interval", &self.interval)
            .field("thread_name", &self.thread_name)
            .finish()
    }
}

/// 由宿主显式驱动的触发器。
///
/// 投递的任务只排队不执行，直到宿主调用 [`ManualTrigger::fire_pending`]；
/// 执行过程中重新投递的任务留到下一次调用。
#[derive(Default)]
pub struct ManualTrigger {
    pending: Mutex<Vec<SweepTask>>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前排队中的任务数。
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// 执行此刻已排队的全部任务，返回执行数量。
    ///
    /// 某个任务 panic 时其余任务照常执行，全部执行完毕后再把第一个 panic 传播给调用方，
    /// 避免共享同一触发器的其他注册表丢失在途触发。
    pub fn fire_pending(&self) -> usize {
        let tasks = mem::take(&mut *self.pending.lock());
        let fired = tasks.len();
        let mut first_panic = None;
        for task in tasks {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
                first_panic.get_or_insert(payload);
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        fired
    }
}

impl SweepTrigger for ManualTrigger {
    fn schedule(&self, task: SweepTask) -> Result<()> {
        self.pending.lock().push(task);
        Ok(())
    }
}

impl fmt::Debug for ManualTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTrigger")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(feature = "tokio")]
pub use self::tokio_trigger::TokioTrigger;

#[cfg(feature = "tokio")]
mod tokio_trigger {
    use core::time::Duration;

    use tokio::runtime::Handle;

    use super::{SweepTask, SweepTrigger};
    use crate::{config::SweepConfig, error::Result};

    /// 在 Tokio 运行时上延迟执行清扫的触发器。
    ///
    /// - **意图 (Why)**：已运行 Tokio 的宿主无需再为清扫额外占用一个系统线程；
    /// - **契约 (What)**：持有运行时 `Handle`，运行时关闭后投递的任务会被静默丢弃，
    ///   池中数据随之不再被回收，但池操作不受影响。
    #[derive(Debug, Clone)]
    pub struct TokioTrigger {
        handle: Handle,
        interval: Duration,
    }

    impl TokioTrigger {
        /// 在 `handle` 指向的运行时上投递，延迟取自 `config.interval_ms`。
        pub fn new(handle: Handle, config: &SweepConfig) -> Self {
            Self {
                handle,
                interval: config.interval(),
            }
        }

        /// 绑定当前上下文中的运行时；不在运行时内调用时返回 `None`。
        pub fn current(config: &SweepConfig) -> Option<Self> {
            Handle::try_current()
                .ok()
                .map(|handle| Self::new(handle, config))
        }
    }

    impl SweepTrigger for TokioTrigger {
        fn schedule(&self, task: SweepTask) -> Result<()> {
            let interval = self.interval;
            self.handle.spawn(async move {
                tokio::time::sleep(interval).await;
                task.run();
            });
            Ok(())
        }
    }
}
