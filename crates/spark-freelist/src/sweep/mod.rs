//! 进程级清扫注册表与两阶段回收驱动。
//!
//! # 模块定位（Why）
//! - 自由链表不能无限期持有归还的值：长时间未被取用的数据必须在有限个清扫周期内释放，
//!   以限制池化内存的峰值；
//! - 清扫既不能阻塞调用方，也不能在没有工作时常驻后台，因此由注册驱动、按需自我续约。
//!
//! # 核心机制（How）
//! - 池在“无 live 代 -> 有 live 代”时调用 [`SweepRegistry::register`]，登记一个
//!   `Weak<dyn TwoRoundClean>` 句柄；
//! - 每次清扫先对重放游标可见的旧记录执行 `round_two_clean`（丢弃上一轮降级的 `victim`），
//!   再对新出队的记录执行 `round_one_clean`（把 `live` 降级为 `victim`）；
//!   先二后一保证降级出的 `victim` 至少跨越一个完整周期才被丢弃；
//! - [`EpochState`](epoch::EpochState) 协调注册方与清扫方，[`SweepTrigger`] 决定清扫何时发生。
//!
//! # 契约说明（What）
//! - 池最后一次 `put` 之后，至多两次清扫即可清空其 `live` 与 `victim`；
//! - 从未有池注册时，驱动保持 `Idle`，不产生任何后台活动；
//! - 清扫路径没有可恢复错误：触发投递失败只记录告警，并把重试留给下一次注册。

mod epoch;
mod queue;
mod trigger;

use alloc::sync::{Arc, Weak};
use core::{
    fmt, mem,
    sync::atomic::{AtomicU64, Ordering},
};
use std::sync::OnceLock;

use tracing::{debug, trace, warn};

use crate::{
    config::SweepConfig,
    error::{FreeListError, Result},
};

use self::{
    epoch::{ArmOutcome, EpochState, FinishOutcome},
    queue::RegistrationQueue,
};

pub use self::epoch::EpochPhase;
#[cfg(feature = "tokio")]
pub use self::trigger::TokioTrigger;
pub use self::trigger::{ManualTrigger, SweepTask, SweepTrigger, ThreadTrigger};

static GLOBAL: OnceLock<Arc<SweepRegistry>> = OnceLock::new();

/// 可被两阶段清扫的池能力。
///
/// 清扫驱动只依赖这两个无参操作，不关心池中值的类型，因此异构的池可以放进同一个注册表。
pub trait TwoRoundClean: Send + Sync + 'static {
    /// 把当前 `live` 代整体降级为 `victim`，并丢弃原有的 `victim`。
    fn round_one_clean(&self);

    /// 丢弃 `victim` 代。
    fn round_two_clean(&self);
}

/// 单次清扫的结果。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SweepOutcome {
    /// 执行了 `round_two_clean` 的池数量。
    pub evicted: u64,
    /// 执行了 `round_one_clean` 的池数量。
    pub demoted: u64,
}

/// 注册表累计统计快照。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SweepStats {
    pub registrations: u64,
    pub sweeps: u64,
    pub evicted: u64,
    pub demoted: u64,
    pub phase: EpochPhase,
}

#[derive(Default)]
struct SweepCounters {
    registrations: AtomicU64,
    sweeps: AtomicU64,
    evicted: AtomicU64,
    demoted: AtomicU64,
}

/// 清扫注册表：登记持有 live 代的池，并驱动周期性的两阶段清扫。
///
/// # 教案式说明
/// - **意图 (Why)**：为所有自由链表提供唯一、可审计的回收入口；生产环境通过
///   [`SweepRegistry::install_global`] 在启动时显式安装，测试或嵌入场景可用
///   [`SweepRegistry::with_trigger`] 构造独立实例。
/// - **逻辑 (How)**：
///   1. `register` 入队后尝试 `arm`；若完成 `Idle -> Armed`，投递一次触发；
///   2. 触发执行 `run_epoch`：置 `Running`，执行一次清扫，随后根据是否仍有降级中的池决定归于空闲或续约；
///   3. 归于空闲后再检查一次队列，弥补与注册方的极窄竞态窗口。
/// - **契约 (What)**：同一注册表任意时刻至多一个触发在途、至多一次清扫在执行；
///   触发任务只持有 `Weak` 引用，注册表释放后在途任务自动失效。
pub struct SweepRegistry {
    queue: RegistrationQueue,
    epoch: EpochState,
    trigger: Arc<dyn SweepTrigger>,
    counters: SweepCounters,
    this: Weak<SweepRegistry>,
}

impl SweepRegistry {
    /// 以后台线程触发器构造独立注册表。
    pub fn new(config: SweepConfig) -> Result<Arc<Self>> {
        config.validate()?;
        Ok(Self::with_trigger(Arc::new(ThreadTrigger::new(&config))))
    }

    /// 以任意触发器构造独立注册表。
    pub fn with_trigger(trigger: Arc<dyn SweepTrigger>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            queue: RegistrationQueue::new(),
            epoch: EpochState::new(),
            trigger,
            counters: SweepCounters::default(),
            this: Weak::clone(this),
        })
    }

    /// 安装进程级注册表。
    ///
    /// # 契约（What）
    /// - 必须先于任何 [`SweepRegistry::global`] 调用（包括 `FreeList::new` 等隐式调用）；
    /// - 已安装时返回 [`FreeListError::GlobalAlreadyInstalled`]，既有实例保持不变。
    pub fn install_global(config: SweepConfig) -> Result<&'static Arc<Self>> {
        let registry = Self::new(config)?;
        let mut installed = false;
        let global = GLOBAL.get_or_init(|| {
            installed = true;
            registry
        });
        if installed {
            debug!("global sweep registry installed");
            Ok(global)
        } else {
            Err(FreeListError::GlobalAlreadyInstalled)
        }
    }

    /// 进程级注册表；尚未显式安装时以默认配置初始化。
    ///
    /// # 契约（What）
    /// - 隐式初始化会记录一条告警：此后 [`SweepRegistry::install_global`] 一律失败，
    ///   宿主应在创建任何 `new()` 池之前完成安装；
    /// - 只想观察而不触发初始化时使用 [`SweepRegistry::installed`]。
    pub fn global() -> &'static Arc<Self> {
        GLOBAL.get_or_init(|| {
            warn!("global sweep registry not installed, falling back to default config");
            Self::with_trigger(Arc::new(ThreadTrigger::new(&SweepConfig::default())))
        })
    }

    /// 已安装（显式或隐式）的进程级注册表；尚未初始化时返回 `None`，不会触发初始化。
    pub fn installed() -> Option<&'static Arc<Self>> {
        GLOBAL.get()
    }

    /// 登记一个刚建立 live 代的池。
    ///
    /// 由池在“无 live 代 -> 有 live 代”时调用一次；也可供自定义池实现 [`TwoRoundClean`] 后直接使用。
    pub fn register(&self, handle: Weak<dyn TwoRoundClean>) {
        self.queue.enqueue(handle);
        self.counters.registrations.fetch_add(1, Ordering::Relaxed);
        if self.epoch.arm() == ArmOutcome::ScheduleTrigger {
            trace!("sweep driver armed");
            self.schedule();
        }
    }

    /// 累计统计快照。
    ///
    /// 各计数器独立读取，并发清扫期间快照内的字段之间不保证同一时刻一致。
    pub fn stats(&self) -> SweepStats {
        SweepStats {
            registrations: self.counters.registrations.load(Ordering::Relaxed),
            sweeps: self.counters.sweeps.load(Ordering::Relaxed),
            evicted: self.counters.evicted.load(Ordering::Relaxed),
            demoted: self.counters.demoted.load(Ordering::Relaxed),
            phase: self.epoch.phase(),
        }
    }

    fn schedule(&self) {
        let this = Weak::clone(&self.this);
        let task = SweepTask::new(move || {
            if let Some(registry) = this.upgrade() {
                registry.run_epoch();
            }
        });
        if let Err(error) = self.trigger.schedule(task) {
            warn!(%error, "failed to schedule sweep, driver goes idle until next registration");
            self.epoch.disarm();
        }
    }

    fn run_epoch(&self) {
        self.epoch.begin();
        let guard = UnwindRearm { registry: self };
        let outcome = self.sweep_step();
        mem::forget(guard);
        match self.epoch.finish(outcome.demoted > 0) {
            FinishOutcome::Rearm => self.schedule(),
            FinishOutcome::Idle => {
                trace!("sweep driver idle");
                if self.queue.has_pending() && self.epoch.arm() == ArmOutcome::ScheduleTrigger {
                    self.schedule();
                }
            }
        }
    }

    /// 一次清扫：先重放上一轮出队的记录，再降级本轮开始时已入队的记录。
    ///
    /// 本轮执行期间到达的登记（包括被清扫的池在回调里重新 `put` 触发的登记）留到下一轮，
    /// 否则同一个池会在一轮内被降级两次，刚降级的 `victim` 将得不到完整的宽限周期。
    fn sweep_step(&self) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        let batch = self.queue.pending_len();

        for handle in self.queue.replay_available() {
            if let Some(pool) = handle.upgrade() {
                pool.round_two_clean();
                outcome.evicted += 1;
            }
        }

        for _ in 0..batch {
            let Some(handle) = self.queue.try_dequeue() else {
                break;
            };
            if let Some(pool) = handle.upgrade() {
                pool.round_one_clean();
                outcome.demoted += 1;
            }
        }

        self.counters.sweeps.fetch_add(1, Ordering::Relaxed);
        self.counters
            .evicted
            .fetch_add(outcome.evicted, Ordering::Relaxed);
        self.counters
            .demoted
            .fetch_add(outcome.demoted, Ordering::Relaxed);
        debug!(
            evicted = outcome.evicted,
            demoted = outcome.demoted,
            "sweep step finished"
        );
        outcome
    }
}

/// 清扫回调（通常是池中值的 `Drop`）发生 panic 时复位驱动。
///
/// 若不复位，状态将停留在 `Running`：后续注册只会把它改成 `Armed` 而不再投递触发，回收永久停止。
/// 复位后只要仍有待降级或待重放的记录，就重新投递一次触发。
struct UnwindRearm<'a> {
    registry: &'a SweepRegistry,
}

impl Drop for UnwindRearm<'_> {
    fn drop(&mut self) {
        let registry = self.registry;
        warn!("sweep step panicked, resetting driver");
        registry.epoch.disarm();
        if (registry.queue.has_pending() || registry.queue.has_retained())
            && registry.epoch.arm() == ArmOutcome::ScheduleTrigger
        {
            registry.schedule();
        }
    }
}

impl fmt::Debug for SweepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepRegistry")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
