//! Property tests for the SIEVE policy and its persistence format.
//!
//! Run with: `cargo test --test properties`

use std::io::Cursor;

use proptest::prelude::*;
use sieve_policy::{read_int, write_int, PolicyError, SievePolicy};

fn write_key(key: &i32, writer: &mut Vec<u8>) -> Result<(), PolicyError> {
    write_int(writer, *key)
}

fn read_key(reader: &mut Cursor<Vec<u8>>) -> Result<i32, PolicyError> {
    read_int(reader)
}

fn state(policy: &SievePolicy<i32>) -> Vec<(i32, bool)> {
    policy
        .keys()
        .map(|key| (*key, policy.is_visited(key).unwrap()))
        .collect()
}

/// Access sequences over a small key space so hits and evictions both occur.
fn access_strategy() -> impl Strategy<Value = (usize, Vec<i32>)> {
    (2usize..16, prop::collection::vec(0i32..40, 0..300))
}

proptest! {
    #[test]
    fn distinct_keys_never_overgrow(capacity in 2usize..64, n in 0usize..256) {
        let mut policy = SievePolicy::new(capacity).unwrap();
        let mut evictions = 0;
        for key in 0..n as i32 {
            if policy.access(key).is_some() {
                evictions += 1;
            }
        }
        prop_assert_eq!(policy.len(), n.min(capacity));
        prop_assert_eq!(evictions, n - policy.len());
    }

    #[test]
    fn len_tracks_hits_and_misses((capacity, accesses) in access_strategy()) {
        let mut policy = SievePolicy::new(capacity).unwrap();
        for key in accesses {
            let was_tracked = policy.contains(&key);
            let before = policy.len();
            let evicted = policy.access(key);
            prop_assert!(policy.len() <= capacity);
            prop_assert!(policy.contains(&key));
            if was_tracked {
                prop_assert_eq!(evicted, None);
                prop_assert_eq!(policy.is_visited(&key), Some(true));
            } else if before == capacity {
                let evicted = evicted.expect("full policy must evict on a miss");
                prop_assert_ne!(evicted, key);
                prop_assert!(!policy.contains(&evicted));
                prop_assert_eq!(policy.is_visited(&key), Some(false));
            } else {
                prop_assert_eq!(evicted, None);
                prop_assert_eq!(policy.len(), before + 1);
            }
        }
    }

    #[test]
    fn visited_keys_only_evicted_when_all_visited((capacity, accesses) in access_strategy()) {
        let mut policy = SievePolicy::new(capacity).unwrap();
        for key in accesses {
            let before = state(&policy);
            if let Some(evicted) = policy.access(key) {
                let victim_visited = before
                    .iter()
                    .find(|(k, _)| *k == evicted)
                    .map(|(_, visited)| *visited)
                    .unwrap();
                if victim_visited {
                    prop_assert!(before.iter().all(|(_, visited)| *visited));
                }
            }
        }
    }

    #[test]
    fn save_load_round_trip((capacity, accesses) in access_strategy(), tail in prop::collection::vec(0i32..80, 0..50)) {
        let mut policy = SievePolicy::new(capacity).unwrap();
        for key in accesses {
            policy.access(key);
        }

        let mut bytes = Vec::new();
        policy.save(&mut bytes, write_key, None).unwrap();
        let mut loaded = SievePolicy::load(&mut Cursor::new(bytes), read_key).unwrap();

        prop_assert_eq!(loaded.capacity(), policy.capacity());
        prop_assert_eq!(loaded.len(), policy.len());
        prop_assert_eq!(state(&loaded), state(&policy));
        prop_assert_eq!(loaded.hand_position(), policy.hand_position());

        // identical state means identical future decisions
        for key in tail {
            prop_assert_eq!(loaded.access(key), policy.access(key));
        }
        prop_assert_eq!(state(&loaded), state(&policy));
    }

    #[test]
    fn load_never_panics_on_garbage(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = SievePolicy::load(&mut Cursor::new(bytes), read_key);
    }
}
