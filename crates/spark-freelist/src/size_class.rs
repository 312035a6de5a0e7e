//! 2 的幂分级换算。
//!
//! 归还时按容量向下取整（`floor_log2`），取用时按长度向上取整（`ceil_log2`）：
//! 第 `i` 级只存放容量落在 `[2^i, 2^(i+1))` 的缓冲，因此该级的任意缓冲都能满足
//! 向上取整后落在第 `i` 级的任意长度请求。

/// 分级数量。
pub const SIZE_CLASSES: usize = 32;

/// 可入池的最大容量 / 可请求的最大长度：`2^31 - 1`。
pub const MAX_BUCKET_LEN: usize = i32::MAX as usize;

/// 判断容量或长度是否落在可分级区间 `[1, 2^31 - 1]`。
#[inline]
pub fn in_range(value: usize) -> bool {
    (1..=MAX_BUCKET_LEN).contains(&value)
}

/// 不小于 `value` 的最小 2 的幂的指数；`value` 必须 `>= 1`。
#[inline]
pub fn ceil_log2(value: usize) -> usize {
    debug_assert!(value >= 1);
    (usize::BITS - (value - 1).leading_zeros()) as usize
}

/// 不大于 `value` 的最大 2 的幂的指数；`value` 必须 `>= 1`。
#[inline]
pub fn floor_log2(value: usize) -> usize {
    debug_assert!(value >= 1);
    value.ilog2() as usize
}
