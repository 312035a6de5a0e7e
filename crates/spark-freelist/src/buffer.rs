//! 可被分级缓冲池复用的缓冲类型。
//!
//! # 设计初衷（Why）
//! - 分级池只依赖缓冲的三个事实：当前容量、按容量新建、把长度重置为请求值；
//! - 以 trait 描述这三点，使 `Vec<T>` 与 `bytes::BytesMut` 共用同一套分级逻辑。
//!
//! # 契约说明（What）
//! - `reset_to_len(len)` 调用时保证 `len <= capacity()`，实现不得因此重新分配；
//! - 重置后的元素全部为默认值，复用的缓冲不会把上一位使用者的数据泄露给下一位。

use alloc::vec::Vec;

use bytes::BytesMut;

/// 分级池可复用的缓冲。
pub trait PoolableBuffer: Sized {
    /// 已分配的元素容量，决定归还时落入的分级。
    fn capacity(&self) -> usize;

    /// 新建长度为零、容量至少为 `capacity` 的缓冲。
    fn with_capacity(capacity: usize) -> Self;

    /// 把长度重置为 `len`，全部元素为默认值；调用方保证 `len <= capacity()`。
    fn reset_to_len(&mut self, len: usize);
}

impl<T: Clone + Default> PoolableBuffer for Vec<T> {
    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }

    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn reset_to_len(&mut self, len: usize) {
        self.clear();
        self.resize(len, T::default());
    }
}

impl PoolableBuffer for BytesMut {
    fn capacity(&self) -> usize {
        BytesMut::capacity(self)
    }

    fn with_capacity(capacity: usize) -> Self {
        BytesMut::with_capacity(capacity)
    }

    fn reset_to_len(&mut self, len: usize) {
        self.clear();
        self.resize(len, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_reset_zeroes_previous_contents() {
        let mut buf: Vec<u8> = PoolableBuffer::with_capacity(8);
        buf.extend_from_slice(&[7; 8]);
        let ptr = buf.as_ptr();
        buf.reset_to_len(4);
        assert_eq!(buf, [0; 4]);
        assert_eq!(buf.as_ptr(), ptr, "重置不得重新分配");
    }

    #[test]
    fn bytes_reset_keeps_capacity() {
        let mut buf = <BytesMut as PoolableBuffer>::with_capacity(16);
        buf.extend_from_slice(b"payload");
        buf.reset_to_len(10);
        assert_eq!(&buf[..], &[0u8; 10]);
        assert!(PoolableBuffer::capacity(&buf) >= 16);
    }
}
