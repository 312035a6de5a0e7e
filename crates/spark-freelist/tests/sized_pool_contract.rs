//! `sized_pool_contract` 集成测试：验证分级缓冲池在 2 的幂边界上的归还/取用匹配。
//!
//! # 测试目标（Why）
//! - 归还按容量向下取整、取用按长度向上取整；边界值（63、64、65、66）最容易写错，逐一覆盖；
//! - 越界容量不入池、越界长度直接分配。
#![cfg(not(any(loom, spark_loom)))]

use std::{sync::Arc, thread};

use bytes::BytesMut;
use spark_freelist::{
    BytesFreeList, BytesMpFreeList, MAX_BUCKET_LEN, ManualTrigger, SliceFreeList, SliceMpFreeList,
    SweepRegistry,
};

fn registry() -> (Arc<SweepRegistry>, Arc<ManualTrigger>) {
    let trigger = Arc::new(ManualTrigger::new());
    (SweepRegistry::with_trigger(trigger.clone()), trigger)
}

/// 容量 66 的缓冲落在 64 级：`get(64)` 命中并截为 64，`get(65)` 查 128 级而未命中。
#[test]
fn capacity_sixty_six_serves_sixty_four() {
    let (registry, _trigger) = registry();
    let pool: SliceFreeList<u8> = SliceFreeList::with_registry(registry);

    pool.put(Vec::with_capacity(66));
    assert!(pool.get(65).is_none(), "65 向上取整到 128 级");
    let buf = pool.get(64).expect("64 级应命中");
    assert_eq!(buf.len(), 64);
    assert!(buf.capacity() >= 66);
}

#[test]
fn boundary_capacities_land_in_expected_classes() {
    // (归还容量, 能命中的请求长度, 不能命中的请求长度)
    let cases = [
        (63usize, 32usize, 33usize),
        (64, 64, 65),
        (65, 64, 65),
        (66, 33, 65),
    ];
    for (capacity, hit, miss) in cases {
        let (registry, _trigger) = registry();
        let pool: SliceFreeList<u8> = SliceFreeList::with_registry(registry);

        pool.put(Vec::with_capacity(capacity));
        assert!(pool.get(miss).is_none(), "容量 {capacity} 不应服务长度 {miss}");
        let buf = pool
            .get(hit)
            .unwrap_or_else(|| panic!("容量 {capacity} 应服务长度 {hit}"));
        assert_eq!(buf.len(), hit);
    }
}

#[test]
fn out_of_range_lengths_bypass_the_pool() {
    let (registry, _trigger) = registry();
    let pool: SliceFreeList<u16> = SliceFreeList::with_registry(registry);
    assert!(pool.get(0).is_none());
    assert!(pool.get(MAX_BUCKET_LEN + 1).is_none());
    assert!(pool.get_or_create(0).is_empty());
}

#[test]
fn get_or_create_allocates_nominal_class_capacity_on_miss() {
    let (registry, _trigger) = registry();
    let pool: SliceFreeList<u32> = SliceFreeList::with_registry(registry);
    let buf = pool.get_or_create(100);
    assert_eq!(buf.len(), 100);
    assert_eq!(buf.capacity(), 128);

    pool.put(buf);
    let reused = pool.get_or_create(128);
    assert_eq!(reused.len(), 128);
    assert_eq!(reused.capacity(), 128, "同级请求复用同一块缓冲");
}

#[test]
fn bytes_pool_reuses_bytes_mut() {
    let (registry, _trigger) = registry();
    let pool = BytesFreeList::with_registry(registry);
    let mut buf = pool.get_or_create(1000);
    assert_eq!(buf.len(), 1000);
    buf[0] = 0xFF;
    let ptr = buf.as_ptr();
    pool.put(buf);

    let reused: BytesMut = pool.get(1024).expect("1024 级应命中");
    assert_eq!(reused.as_ptr(), ptr);
    assert_eq!(reused[0], 0, "复用缓冲不携带旧数据");
}

#[test]
fn sized_pools_are_swept_like_any_other_pool() {
    let (registry, trigger) = registry();
    let pool: SliceFreeList<u8> = SliceFreeList::with_registry(Arc::clone(&registry));
    pool.put(Vec::with_capacity(8));
    pool.put(Vec::with_capacity(512));
    assert_eq!(registry.stats().registrations, 2, "每个分级各自登记");

    trigger.fire_pending();
    trigger.fire_pending();
    assert!(pool.get(8).is_none());
    assert!(pool.get(512).is_none());
}

#[test]
fn concurrent_producers_feed_one_consumer() {
    let (registry, _trigger) = registry();
    let pool: Arc<SliceMpFreeList<u8>> = Arc::new(SliceMpFreeList::with_registry(registry));
    let producers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..100 {
                    pool.put(Vec::with_capacity(256));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("生产者线程不应 panic");
    }

    let mut reused = 0;
    while pool.get(200).is_some() {
        reused += 1;
    }
    assert_eq!(reused, 400);

    let bytes = BytesMpFreeList::with_registry(SweepRegistry::with_trigger(Arc::new(
        ManualTrigger::new(),
    )));
    bytes.put(BytesMut::with_capacity(32));
    assert!(bytes.get(17).is_some());
}
