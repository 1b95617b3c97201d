use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::hash::BuildHasher;
use core::hash::Hasher;

use proptest::prelude::*;
use siphasher::sip::SipHasher;

use crate::HashMap;
use crate::KeyNotFound;

#[derive(Clone, Default)]
struct FixedSip;

impl BuildHasher for FixedSip {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new_with_keys(0x0123_4567, 0x89ab_cdef)
    }
}

/// Keeps only three bits of hash, so long shared probe chains are the norm.
#[derive(Clone, Default)]
struct ClusteringHash;

#[derive(Default)]
struct ClusteringHasher(u64);

impl Hasher for ClusteringHasher {
    fn finish(&self) -> u64 {
        self.0 & 0x7
    }

    fn write(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(*b as u64);
        }
    }
}

impl BuildHasher for ClusteringHash {
    type Hasher = ClusteringHasher;

    fn build_hasher(&self) -> Self::Hasher {
        ClusteringHasher::default()
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u64),
    Remove(u16),
    Find(u16),
    Clear,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    // A narrow key range makes overwrites, repeated removals and tombstone
    // reuse common.
    let key = 0u16..96;
    let op = prop_oneof![
        50 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => key.clone().prop_map(Op::Remove),
        19 => key.prop_map(Op::Find),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=1500)
}

fn run_against_model<S: BuildHasher>(
    mut map: HashMap<u16, u64, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<u16, u64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let capacity = map.capacity();
                let existed = model.contains_key(&key);

                prop_assert_eq!(map.insert(key, value), model.insert(key, value));
                prop_assert!(map.load_factor() <= 0.8);
                if existed {
                    prop_assert_eq!(map.capacity(), capacity);
                }
            }
            Op::Remove(key) => {
                prop_assert_eq!(map.remove(&key), model.remove(&key));
                prop_assert!(!map.contains_key(&key));
            }
            Op::Find(key) => {
                prop_assert_eq!(map.find(&key), model.get(&key).ok_or(KeyNotFound));
                prop_assert_eq!(map.contains_key(&key), model.contains_key(&key));
            }
            Op::Clear => {
                map.clear();
                model.clear();
            }
        }

        prop_assert_eq!(map.count(), model.len());
    }

    map.raw_table().assert_invariants();

    let mut got: Vec<(u16, u64)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    got.sort_unstable();
    let expected: Vec<(u16, u64)> = model.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(got, expected);

    let mut keys: Vec<u16> = map.key_set().into_iter().copied().collect();
    keys.sort_unstable();
    let expected_keys: Vec<u16> = model.keys().copied().collect();
    prop_assert_eq!(keys, expected_keys);

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_sip(ops in ops_strategy(), capacity in 0usize..64) {
        run_against_model(HashMap::with_capacity_and_hasher(capacity, FixedSip), ops)?;
    }

    #[test]
    fn prop_equivalence_clustered(ops in ops_strategy(), capacity in 0usize..64) {
        run_against_model(HashMap::with_capacity_and_hasher(capacity, ClusteringHash), ops)?;
    }

    #[test]
    fn prop_remove_keeps_neighbours(keys in prop::collection::btree_set(0u16..512, 1..200), pick in any::<prop::sample::Index>()) {
        let keys: Vec<u16> = keys.into_iter().collect();
        let victim = keys[pick.index(keys.len())];

        let mut map = HashMap::with_hasher(ClusteringHash);
        for &k in &keys {
            map.insert(k, u64::from(k) * 3);
        }
        map.remove(&victim);

        prop_assert_eq!(map.find(&victim), Err(KeyNotFound));
        for &k in keys.iter().filter(|&&k| k != victim) {
            prop_assert_eq!(map.find(&k), Ok(&(u64::from(k) * 3)));
        }
        map.raw_table().assert_invariants();
    }
}

#[test]
fn capacity_sweep_keeps_invariants() {
    for requested in 0..40usize {
        let mut map = HashMap::with_capacity_and_hasher(requested, ClusteringHash);
        assert_eq!(map.capacity(), requested.max(1).next_power_of_two());

        for k in 0..100u16 {
            map.insert(k, u64::from(k));
            if k % 4 == 0 {
                map.remove(&(k / 2));
            }
        }
        map.raw_table().assert_invariants();
    }
}
