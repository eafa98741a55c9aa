//! Property-based test generators using proptest.
//!
//! Provides strategies for generating part names, index definitions and
//! merge plans that satisfy the storage layer's naming rules.

use proptest::prelude::*;
use vidx_storage::{IndexDefinition, PartInfo};

/// Strategy for generating partition ids.
pub fn partition_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("all".to_string()),
        prop::string::string_regex("20[0-9]{4}").expect("Invalid regex"),
    ]
}

/// Strategy for generating parsed part names, with or without mutation.
pub fn part_info_strategy() -> impl Strategy<Value = PartInfo> {
    (
        partition_id_strategy(),
        0u64..1_000,
        0u64..1_000,
        0u32..8,
        prop::option::of(1u64..100),
    )
        .prop_map(|(partition_id, a, b, level, mutation)| PartInfo {
            partition_id,
            min_block: a.min(b),
            max_block: a.max(b),
            level,
            mutation,
        })
}

/// Strategy for generating valid part names.
pub fn part_name_strategy() -> impl Strategy<Value = String> {
    part_info_strategy().prop_map(|info| info.to_string())
}

/// Strategy for generating index definitions.
pub fn index_definition_strategy() -> impl Strategy<Value = IndexDefinition> {
    (
        prop::string::string_regex("[a-z][a-z0-9]{0,11}").expect("Invalid regex"),
        prop::string::string_regex("[a-z][a-z0-9]{0,11}").expect("Invalid regex"),
    )
        .prop_map(|(name, column)| IndexDefinition::new(name, column))
}

/// Strategy for generating the distinct, non-overlapping ancestors of one
/// merge, in merge order.
///
/// Ancestor `i` covers block `i + 1`, so the merged part covers
/// `1..=count`; see [`merged_part_name`].
pub fn merge_sources_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    (1..=max.max(1)).prop_flat_map(|count| {
        prop::collection::vec(prop::option::of(1u64..10), count).prop_map(|mutations| {
            mutations
                .into_iter()
                .enumerate()
                .map(|(i, mutation)| {
                    let block = i as u64 + 1;
                    PartInfo {
                        partition_id: "all".to_string(),
                        min_block: block,
                        max_block: block,
                        level: 0,
                        mutation,
                    }
                    .to_string()
                })
                .collect()
        })
    })
}

/// Name of the part produced by merging `count` ancestors from
/// [`merge_sources_strategy`].
pub fn merged_part_name(count: usize) -> String {
    format!("all_1_{count}_1")
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn part_names_parse(name in part_name_strategy()) {
            let info = PartInfo::parse(&name);
            prop_assert!(info.is_some());
            prop_assert_eq!(info.map(|i| i.to_string()), Some(name));
        }

        #[test]
        fn merge_sources_are_distinct(sources in merge_sources_strategy(5)) {
            let mut stripped: Vec<String> = sources.iter().map(|s| PartInfo::strip_mutation(s)).collect();
            stripped.sort();
            stripped.dedup();
            prop_assert_eq!(stripped.len(), sources.len());
        }
    }
}
