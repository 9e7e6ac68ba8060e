// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use proptest::prelude::*;
use retrieval_cache::core::types::*;
use retrieval_cache::index::scale::*;

#[cfg(test)]
mod scale_invariant_tests {
    use super::*;

    const ALL_CLASSES: [IndexScaleClass; 4] = [
        IndexScaleClass::Flat,
        IndexScaleClass::IvfFlat,
        IndexScaleClass::IvfPq,
        IndexScaleClass::IvfPqGpu,
    ];

    #[test]
    fn test_every_class_has_a_name_and_band() {
        for class in ALL_CLASSES {
            assert!(!class.name().is_empty());
            let band = class.expected_latency();
            assert!(band.min_ms > 0.0);
            assert!(band.min_ms < band.max_ms);
        }
    }

    #[test]
    fn test_only_gpu_class_requires_gpu() {
        for class in ALL_CLASSES {
            assert_eq!(class.requires_gpu(), class == IndexScaleClass::IvfPqGpu);
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_classify_is_total(count in any::<usize>(), use_gpu in any::<bool>()) {
            let class = IndexScaleClass::classify(count, use_gpu);
            prop_assert!(!class.name().is_empty());

            let band = class.expected_latency();
            prop_assert!(band.min_ms <= band.max_ms);
        }

        #[test]
        fn test_cpu_bands_widen_with_scale(a in any::<usize>(), b in any::<usize>()) {
            let (small, large) = if a <= b { (a, b) } else { (b, a) };
            let small_band = IndexScaleClass::classify(small, false).expected_latency();
            let large_band = IndexScaleClass::classify(large, false).expected_latency();

            // More vectors never promises a tighter budget on CPU.
            prop_assert!(small_band.max_ms <= large_band.max_ms);
        }

        #[test]
        fn test_gpu_flag_ignored_below_top_scale(count in 0usize..10_000_000) {
            prop_assert_eq!(
                IndexScaleClass::classify(count, true),
                IndexScaleClass::classify(count, false)
            );
        }

        #[test]
        fn test_fingerprint_is_deterministic(
            query in prop::collection::vec(-10.0f32..10.0f32, 1..64)
        ) {
            let first = QueryFingerprint::from_query(&query);
            let second = QueryFingerprint::from_query(&query);
            prop_assert_eq!(&first, &second);

            prop_assert_eq!(first.as_str().len(), 16);
            prop_assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn test_translate_covers_every_known_ordinal(
            ids in prop::collection::vec(any::<u64>(), 0..50),
            probe in any::<usize>()
        ) {
            let chunk_ids: Vec<ChunkId> = ids.iter().copied().map(ChunkId::from).collect();
            let mut map = ChunkIdMap::new();
            map.extend_from(&chunk_ids);
            prop_assert_eq!(map.len(), ids.len());

            if probe < ids.len() {
                prop_assert_eq!(map.translate(probe), Some(ChunkId::from(ids[probe])));
                prop_assert_eq!(map.translate_or_raw(probe), ChunkId::from(ids[probe]));
            } else {
                prop_assert_eq!(map.translate(probe), None);
                prop_assert_eq!(map.translate_or_raw(probe), ChunkId::from(probe as u64));
            }
        }
    }
}
