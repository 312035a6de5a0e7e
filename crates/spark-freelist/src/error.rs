//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 自由链表的热路径（`put`/`get`）不返回错误：缺失以 `Option` 表达，越界容量退化为直接分配；
//! - 可能失败的只有装配阶段：配置校验、全局注册表安装、后台触发器的线程拉起。
//!
//! ## 设计要求（What）
//! - 统一派生 `thiserror::Error`，便于宿主以 `?` 汇入自身错误链；
//! - 变体携带可读上下文，直接写入日志即可定位问题。

use thiserror::Error;

/// 自由链表装配与调度路径上的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把“配置非法”“重复安装全局实例”“后台线程无法创建”等装配期故障
///   与运行期的池操作彻底隔离，池操作本身永远不失败。
/// - **契约 (What)**：所有变体均为 `Send + Sync + 'static`，可跨线程传播。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FreeListError {
    /// 配置字段取值非法。
    #[error("invalid sweep configuration `{field}`: {detail}")]
    InvalidConfig { field: &'static str, detail: String },

    /// 进程级注册表已经初始化，不允许二次安装。
    #[error("global sweep registry is already installed")]
    GlobalAlreadyInstalled,

    /// 后台清扫线程创建失败。
    #[error("failed to spawn sweep worker: {detail}")]
    TriggerSpawn { detail: String },

    /// 触发器的接收端已退出，任务无法投递。
    #[error("sweep trigger is no longer accepting tasks")]
    TriggerUnavailable,
}

/// crate 级 `Result` 别名。
pub type Result<T, E = FreeListError> = core::result::Result<T, E>;
