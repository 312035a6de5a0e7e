use alloc::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;

use crate::{
    generation::Generation,
    sweep::{SweepRegistry, TwoRoundClean},
};

/// `live`/`victim` 两个可原子替换的代槽位，两种自由链表共用。
///
/// # 教案式说明
/// - **意图 (Why)**：清扫驱动与调用方线程并发访问同一对槽位，
///   槽位切换必须是单步原子操作，不能依赖外部锁，否则清扫会阻塞热路径。
/// - **逻辑 (How)**：
///   - `put` 先读 `live`；为空时用 `compare_and_swap(None -> fresh)` 建立新一代，
///     只有比较交换的赢家向注册表登记，输家直接写入赢家创建的那一代；
///   - `round_one_clean` 用 `swap(None)` 捕获交换瞬间的 `live`，整体搬入 `victim`；
///   - `round_two_clean` 直接把 `victim` 置空，这是被降级一代的唯一销毁点。
/// - **契约 (What)**：与 `round_one_clean` 竞争的 `put` 要么写进被捕获的那一代（随即成为 `victim`，
///   仍可被 `get` 取回），要么观察到空槽并重新建立、重新登记新一代；任何情况下值都不会丢失。
pub(crate) struct GenerationSlots<G> {
    live: ArcSwapOption<G>,
    victim: ArcSwapOption<G>,
}

impl<G: Generation> GenerationSlots<G> {
    pub(crate) fn new() -> Self {
        Self {
            live: ArcSwapOption::empty(),
            victim: ArcSwapOption::empty(),
        }
    }

    pub(crate) fn put(self: &Arc<Self>, registry: &SweepRegistry, item: G::Item) {
        if let Some(live) = &*self.live.load() {
            live.push(item);
            return;
        }
        self.install_live(registry).push(item);
    }

    /// `live` 优先，其次 `victim`；两代从不合并遍历。
    pub(crate) fn get(&self) -> Option<G::Item> {
        if let Some(live) = &*self.live.load() {
            if let Some(item) = live.pop() {
                return Some(item);
            }
        }
        if let Some(victim) = &*self.victim.load() {
            if let Some(item) = victim.pop() {
                return Some(item);
            }
        }
        None
    }

    fn install_live(self: &Arc<Self>, registry: &SweepRegistry) -> Arc<G> {
        let fresh = Arc::new(G::default());
        let previous = self
            .live
            .compare_and_swap(&None::<Arc<G>>, Some(Arc::clone(&fresh)));
        match &*previous {
            Some(winner) => Arc::clone(winner),
            None => {
                let weak: Weak<Self> = Arc::downgrade(self);
                let handle: Weak<dyn TwoRoundClean> = weak;
                registry.register(handle);
                fresh
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn has_live(&self) -> bool {
        self.live.load().is_some()
    }

    #[cfg(test)]
    pub(crate) fn has_victim(&self) -> bool {
        self.victim.load().is_some()
    }
}

impl<G: Generation> TwoRoundClean for GenerationSlots<G> {
    fn round_one_clean(&self) {
        let demoted = self.live.swap(None);
        self.victim.store(demoted);
    }

    fn round_two_clean(&self) {
        self.victim.store(None);
    }
}
