//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store invariants across every eviction policy.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::cache::{CacheStore, EvictionPolicy};

// == Strategies ==
/// Small id space so sequences revisit keys often
fn id_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}".prop_map(|s| s)
}

fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
    prop_oneof![
        Just(EvictionPolicy::Lru),
        Just(EvictionPolicy::Lfu),
        Just(EvictionPolicy::Fifo),
        Just(EvictionPolicy::Random),
    ]
}

#[derive(Debug, Clone)]
enum StoreOp {
    Put { id: String, value: u32 },
    Get { id: String },
    Remove { id: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (id_strategy(), any::<u32>()).prop_map(|(id, value)| StoreOp::Put { id, value }),
        id_strategy().prop_map(|id| StoreOp::Get { id }),
        id_strategy().prop_map(|id| StoreOp::Remove { id }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Capacity bound: size never exceeds capacity after any put.
    #[test]
    fn prop_capacity_enforcement(
        policy in policy_strategy(),
        capacity in 1usize..8,
        ops in prop::collection::vec(store_op_strategy(), 1..120)
    ) {
        let mut store = CacheStore::with_seed(policy, capacity, None, 3);

        for op in ops {
            match op {
                StoreOp::Put { id, value } => {
                    store.put(id, value);
                    prop_assert!(store.len() <= capacity, "{} > {}", store.len(), capacity);
                }
                StoreOp::Get { id } => { store.get(&id); }
                StoreOp::Remove { id } => { store.remove(&id); }
            }
        }
    }

    // A get always returns the last value put for a key that is still present.
    #[test]
    fn prop_reads_see_latest_write(
        policy in policy_strategy(),
        ops in prop::collection::vec(store_op_strategy(), 1..120)
    ) {
        let mut store = CacheStore::with_seed(policy, 4, None, 11);
        let mut latest: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                StoreOp::Put { id, value } => {
                    latest.insert(id.clone(), value);
                    store.put(id, value);
                }
                StoreOp::Get { id } => {
                    if let Some(value) = store.get(&id) {
                        prop_assert_eq!(Some(&value), latest.get(&id));
                    }
                }
                StoreOp::Remove { id } => {
                    store.remove(&id);
                    latest.remove(&id);
                }
            }
        }
    }

    // Eviction counter accounts for every insert that did not fit.
    #[test]
    fn prop_eviction_accounting(
        policy in policy_strategy(),
        ids in prop::collection::vec(id_strategy(), 1..100)
    ) {
        let capacity = 3;
        let mut store = CacheStore::with_seed(policy, capacity, None, 5);
        let mut distinct_inserts = 0u64;

        for id in ids {
            if !store.contains(&id) {
                distinct_inserts += 1;
            }
            store.put(id, ());
        }

        let stats = store.stats();
        prop_assert_eq!(stats.evictions + stats.total_entries as u64, distinct_inserts);
    }

    // FIFO eviction follows first-insertion order no matter the access pattern.
    #[test]
    fn prop_fifo_matches_reference_queue(
        ops in prop::collection::vec(store_op_strategy(), 1..150)
    ) {
        let capacity = 3;
        let mut store = CacheStore::new(EvictionPolicy::Fifo, capacity, None);
        let mut model: VecDeque<String> = VecDeque::new();

        for op in ops {
            match op {
                StoreOp::Put { id, value } => {
                    if !model.contains(&id) {
                        if model.len() >= capacity {
                            model.pop_front();
                        }
                        model.push_back(id.clone());
                    }
                    store.put(id, value);
                }
                StoreOp::Get { id } => { store.get(&id); }
                StoreOp::Remove { id } => {
                    model.retain(|k| k != &id);
                    store.remove(&id);
                }
            }

            let present: HashSet<&String> = store.keys().collect();
            let expected: HashSet<&String> = model.iter().collect();
            prop_assert_eq!(present, expected);
        }
    }

    // LRU matches a reference list where both get and put move a key to the back.
    #[test]
    fn prop_lru_matches_reference_list(
        ops in prop::collection::vec(store_op_strategy(), 1..150)
    ) {
        let capacity = 3;
        let mut store = CacheStore::new(EvictionPolicy::Lru, capacity, None);
        let mut model: VecDeque<String> = VecDeque::new();

        for op in ops {
            match op {
                StoreOp::Put { id, value } => {
                    if model.contains(&id) {
                        model.retain(|k| k != &id);
                    } else if model.len() >= capacity {
                        model.pop_front();
                    }
                    model.push_back(id.clone());
                    store.put(id, value);
                }
                StoreOp::Get { id } => {
                    if model.contains(&id) {
                        model.retain(|k| k != &id);
                        model.push_back(id.clone());
                    }
                    store.get(&id);
                }
                StoreOp::Remove { id } => {
                    model.retain(|k| k != &id);
                    store.remove(&id);
                }
            }

            let present: HashSet<&String> = store.keys().collect();
            let expected: HashSet<&String> = model.iter().collect();
            prop_assert_eq!(present, expected);
        }
    }
}
