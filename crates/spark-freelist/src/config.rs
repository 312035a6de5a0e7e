//! 清扫驱动配置。
//!
//! # 设计初衷（Why）
//! - 库本身不读取任何文件或环境变量；配置以可序列化结构体的形式暴露，
//!   宿主可以把它嵌入自己的 TOML/JSON 配置树后再交给 [`SweepRegistry`](crate::SweepRegistry)。
//!
//! # 契约说明（What）
//! - 所有字段都有默认值（`#[serde(default)]`），缺省字段不会导致反序列化失败；
//! - 构造注册表前必须通过 [`SweepConfig::validate`]。

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FreeListError, Result};

/// 默认清扫间隔：1 秒。
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;

/// 默认后台线程名称。
pub const DEFAULT_SWEEP_THREAD_NAME: &str = "spark-freelist-sweep";

/// 后台清扫驱动的可调参数。
///
/// - `interval_ms`：一次触发被投递后，距离真正执行清扫的延迟；
///   池中未被使用的数据大约在两个间隔后被回收。
/// - `thread_name`：[`ThreadTrigger`](crate::sweep::ThreadTrigger) 拉起的后台线程名称，便于排障时辨认。
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub interval_ms: u64,
    pub thread_name: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            thread_name: DEFAULT_SWEEP_THREAD_NAME.to_owned(),
        }
    }
}

impl SweepConfig {
    /// 以毫秒为单位设置清扫间隔。
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// 设置后台线程名称。
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// 以 `Duration` 表示的清扫间隔。
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// 校验配置。
    ///
    /// # 契约（What）
    /// - 间隔为 0 会让后台线程退化为忙等，直接拒绝；
    /// - 线程名为空白时拒绝，`std::thread::Builder` 虽能接受，但无助于排障。
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(FreeListError::InvalidConfig {
                field: "interval_ms",
                detail: "sweep interval must be greater than zero".to_owned(),
            });
        }
        if self.thread_name.trim().is_empty() {
            return Err(FreeListError::InvalidConfig {
                field: "thread_name",
                detail: "sweep thread name must not be blank".to_owned(),
            });
        }
        Ok(())
    }
}
