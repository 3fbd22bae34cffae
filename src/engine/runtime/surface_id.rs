//! ### English
//! Surface identifiers and the identity-hashed map keyed by them.
//!
//! ### 中文
//! surface 标识符，以及以其为 key 的恒等哈希 map。

use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

/// ### English
/// Runtime-unique surface ID (never reused within one runtime; 0 is reserved).
///
/// ### 中文
/// 运行时内唯一的 surface ID（同一运行时内不复用；0 保留）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SurfaceId(pub(crate) u32);

impl SurfaceId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Hash for SurfaceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.0);
    }
}

/// ### English
/// Monotonic allocator for [`SurfaceId`].
///
/// ### 中文
/// [`SurfaceId`] 的单调分配器。
pub(super) struct SurfaceIdAllocator {
    next: AtomicU32,
}

impl SurfaceIdAllocator {
    pub(super) fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    pub(super) fn allocate(&self) -> SurfaceId {
        SurfaceId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// ### English
/// Identity hasher for surface IDs.
/// IDs are small dense integers, so SipHash buys nothing on the per-command lookup.
///
/// ### 中文
/// surface ID 的恒等哈希。
/// ID 是小而密集的整数，每条命令查找时使用 SipHash 没有收益。
#[derive(Default)]
pub(super) struct SurfaceIdHasher(u64);

impl Hasher for SurfaceIdHasher {
    fn write(&mut self, _bytes: &[u8]) {
        unreachable!("SurfaceId only hashes through write_u32");
    }

    fn write_u32(&mut self, i: u32) {
        self.0 = i as u64;
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// ### English
/// Map from [`SurfaceId`] to per-surface state.
///
/// ### 中文
/// 从 [`SurfaceId`] 到每 surface 状态的 map。
pub(super) type SurfaceMap<V> = HashMap<SurfaceId, V, BuildHasherDefault<SurfaceIdHasher>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_skip_zero() {
        let ids = SurfaceIdAllocator::new();
        assert_eq!(ids.allocate(), SurfaceId(1));
        assert_eq!(ids.allocate(), SurfaceId(2));
    }

    #[test]
    fn surface_ids_hash_to_themselves() {
        use std::hash::BuildHasher;

        let build = BuildHasherDefault::<SurfaceIdHasher>::default();
        assert_eq!(build.hash_one(SurfaceId(42)), 42);
    }

    #[test]
    fn map_round_trips_ids() {
        let mut map: SurfaceMap<&str> = SurfaceMap::default();
        map.insert(SurfaceId(7), "a");
        map.insert(SurfaceId(9), "b");
        assert_eq!(map.get(&SurfaceId(7)), Some(&"a"));
        assert_eq!(map.remove(&SurfaceId(9)), Some("b"));
        assert!(!map.contains_key(&SurfaceId(9)));
    }
}
