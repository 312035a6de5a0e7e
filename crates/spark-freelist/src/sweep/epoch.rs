//! 清扫驱动的三态标志。
//!
//! # 设计初衷（Why）
//! - 注册方（任意调用线程）与清扫方（后台触发器）需要在不加锁的前提下达成两点共识：
//!   同一时刻至多一次清扫在执行、只要仍有待清理的池就一定还有一次触发在路上；
//! - 单个原子字节足以表达 `Idle` / `Armed` / `Running` 三态，所有转换都是 CAS 或单步写入。
//!
//! # 状态转换（How）
//! - `arm`：`Idle -> Armed`（调用方负责投递触发）；`Armed` 保持不变；
//!   `Running -> Armed`（正在执行的清扫在收尾时会看到并重新投递）；若 CAS 失败说明清扫刚刚归于 `Idle`，重试。
//! - `begin`：触发执行时无条件写入 `Running`；
//! - `finish`：没有新工作且 `Running -> Idle` 成功时归于空闲，否则写入 `Armed` 并要求重新投递；
//! - `disarm`：触发投递失败时回到 `Idle`，把重试机会留给下一次注册。

#[cfg(not(any(loom, spark_loom)))]
use core::sync::atomic::{AtomicU8, Ordering};
#[cfg(any(loom, spark_loom))]
use loom::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const ARMED: u8 = 1;
const RUNNING: u8 = 2;

/// 对外可观测的驱动阶段。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EpochPhase {
    /// 无待清理工作，也没有任何后台活动。
    Idle,
    /// 有待清理工作，且恰有一次触发已投递、尚未执行。
    Armed,
    /// 一次清扫正在执行。
    Running,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ArmOutcome {
    /// 本次调用完成了 `Idle -> Armed`，必须由调用方投递一次触发。
    ScheduleTrigger,
    /// 已有触发在途或清扫正在执行，无需额外动作。
    AlreadyArmed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FinishOutcome {
    Idle,
    Rearm,
}

pub(crate) struct EpochState {
    state: AtomicU8,
}

impl EpochState {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    pub(crate) fn arm(&self) -> ArmOutcome {
        loop {
            match self.state.load(Ordering::SeqCst) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, ARMED, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        return ArmOutcome::ScheduleTrigger;
                    }
                }
                ARMED => return ArmOutcome::AlreadyArmed,
                _ => {
                    if self
                        .state
                        .compare_exchange(RUNNING, ARMED, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                    {
                        return ArmOutcome::AlreadyArmed;
                    }
                }
            }
        }
    }

    pub(crate) fn begin(&self) {
        self.state.store(RUNNING, Ordering::SeqCst);
    }

    pub(crate) fn finish(&self, more: bool) -> FinishOutcome {
        if !more
            && self
                .state
                .compare_exchange(RUNNING, IDLE, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return FinishOutcome::Idle;
        }
        self.state.store(ARMED, Ordering::SeqCst);
        FinishOutcome::Rearm
    }

    pub(crate) fn disarm(&self) {
        self.state.store(IDLE, Ordering::SeqCst);
    }

    pub(crate) fn phase(&self) -> EpochPhase {
        match self.state.load(Ordering::SeqCst) {
            IDLE => EpochPhase::Idle,
            ARMED => EpochPhase::Armed,
            _ => EpochPhase::Running,
        }
    }
}

#[cfg(all(test, not(any(loom, spark_loom))))]
mod tests {
    use super::*;

    #[test]
    fn first_arm_requests_trigger_and_later_arms_do_not() {
        let epoch = EpochState::new();
        assert_eq!(epoch.arm(), ArmOutcome::ScheduleTrigger);
        assert_eq!(epoch.arm(), ArmOutcome::AlreadyArmed);
        assert_eq!(epoch.phase(), EpochPhase::Armed);
    }

    #[test]
    fn quiet_sweep_goes_idle() {
        let epoch = EpochState::new();
        epoch.arm();
        epoch.begin();
        assert_eq!(epoch.finish(false), FinishOutcome::Idle);
        assert_eq!(epoch.phase(), EpochPhase::Idle);
    }

    #[test]
    fn sweep_with_demotions_rearms() {
        let epoch = EpochState::new();
        epoch.arm();
        epoch.begin();
        assert_eq!(epoch.finish(true), FinishOutcome::Rearm);
        assert_eq!(epoch.phase(), EpochPhase::Armed);
    }

    #[test]
    fn registration_during_sweep_forces_rearm() {
        let epoch = EpochState::new();
        epoch.arm();
        epoch.begin();
        assert_eq!(epoch.arm(), ArmOutcome::AlreadyArmed, "运行中只标记，不重复投递");
        assert_eq!(epoch.finish(false), FinishOutcome::Rearm);
    }

    #[test]
    fn disarm_allows_next_registration_to_schedule() {
        let epoch = EpochState::new();
        epoch.arm();
        epoch.disarm();
        assert_eq!(epoch.arm(), ArmOutcome::ScheduleTrigger);
    }
}

#[cfg(all(test, any(loom, spark_loom)))]
mod loom_tests {
    use super::*;
    use loom::{sync::Arc, thread};

    fn outstanding(arm: ArmOutcome, finish: FinishOutcome) -> usize {
        usize::from(arm == ArmOutcome::ScheduleTrigger) + usize::from(finish == FinishOutcome::Rearm)
    }

    #[test]
    fn register_racing_with_quiet_sweep_leaves_one_trigger_iff_armed() {
        //
        // 教案级说明：一次“无新工作”的清扫与一次注册并发。
        // - **Why**：若收尾的 `Running -> Idle` 吞掉了注册写入的 `Armed`，注册的池将永远得不到清扫；
        // - **What**：收尾后阶段为 `Armed` 当且仅当恰有一次触发在途，为 `Idle` 当且仅当没有触发在途。
        loom::model(|| {
            let epoch = Arc::new(EpochState::new());
            assert_eq!(epoch.arm(), ArmOutcome::ScheduleTrigger);

            let driver = {
                let epoch = Arc::clone(&epoch);
                thread::spawn(move || {
                    epoch.begin();
                    epoch.finish(false)
                })
            };
            let registrar = {
                let epoch = Arc::clone(&epoch);
                thread::spawn(move || epoch.arm())
            };

            let finish = driver.join().expect("清扫线程不应 panic");
            let arm = registrar.join().expect("注册线程不应 panic");
            match epoch.phase() {
                EpochPhase::Armed => assert_eq!(outstanding(arm, finish), 1),
                EpochPhase::Idle => assert_eq!(outstanding(arm, finish), 0),
                EpochPhase::Running => panic!("收尾后不应停留在 Running"),
            }
        });
    }

    #[test]
    fn concurrent_registrations_schedule_exactly_once() {
        loom::model(|| {
            let epoch = Arc::new(EpochState::new());
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let epoch = Arc::clone(&epoch);
                    thread::spawn(move || epoch.arm())
                })
                .collect();
            let scheduled = handles
                .into_iter()
                .map(|handle| handle.join().expect("注册线程不应 panic"))
                .filter(|outcome| *outcome == ArmOutcome::ScheduleTrigger)
                .count();
            assert_eq!(scheduled, 1);
            assert_eq!(epoch.phase(), EpochPhase::Armed);
        });
    }
}
