//! End-to-end lifecycle of a vector index across builds and merges.

use vidx_core::segment::{resolve_all_segments, resolve_own_segment};
use vidx_core::{BuildState, BuildStatus, EventType, Provenance};
use vidx_storage::{naming, DataPart};
use vidx_testkit::{data_file_name, TestTable};

#[test]
fn unbuilt_part_serves_nothing() {
    let t = TestTable::new();
    let a = t.part("all_1_1_0");

    assert!(resolve_all_segments(&t.context, &a, &t.index()).is_empty());
    assert!(t.migrator().discover_inherited_segments(&a, &t.index()).is_empty());
}

#[test]
fn built_part_serves_own_segment() {
    let t = TestTable::new();
    let index = t.index();
    t.part("all_1_1_0");

    let mut task = t.task("all_1_1_0", &index);
    assert_eq!(task.prepare(), BuildStatus::Success);
    assert_eq!(task.execute(), BuildStatus::Success);
    assert_eq!(task.state(), BuildState::Succeeded);

    let a = t.open_part("all_1_1_0");
    let own = resolve_own_segment(&t.context, &a, &index).unwrap();
    assert!(own.provenance().is_none());
    assert_eq!(own.index_name(), "idx");
    assert_eq!(own.index_column(), "vec");
    assert!(own.files_present());

    let mut again = t.task("all_1_1_0", &index);
    assert_eq!(again.prepare(), BuildStatus::Skipped);

    assert_eq!(
        t.event_types(),
        vec![EventType::BuildStart, EventType::BuildSucceed]
    );
}

#[test]
fn merge_inherits_ancestor_segments() {
    let t = TestTable::new();
    let index = t.index();
    t.part("all_1_1_0");
    t.part("all_2_2_0");

    let c = t.merge("all_1_2_1", &["all_1_1_0", "all_2_2_0"]);
    let segments = t.migrator().discover_inherited_segments(&c, &index);
    let provenance: Vec<Provenance> = segments.iter().filter_map(|s| s.provenance().cloned()).collect();
    assert_eq!(
        provenance,
        vec![
            Provenance {
                source_part_name: "all_1_1_0".to_string(),
                source_part_ordinal: 0
            },
            Provenance {
                source_part_name: "all_2_2_0".to_string(),
                source_part_ordinal: 1
            },
        ]
    );

    let report = t.migrator().relocate_inherited_segments(&c).unwrap();
    assert!(report.is_complete());

    let names = c.file_names().unwrap();
    assert!(names.iter().any(|n| n.starts_with("merged-0-all_1_1_0-") && n.ends_with(".vidx3")));
    assert!(names.iter().any(|n| n.starts_with("merged-1-all_2_2_0-") && n.ends_with(".vidx3")));
}

#[test]
fn merge_relocates_built_ancestor_segments() {
    let t = TestTable::new();
    let index = t.index();
    t.part("all_1_1_0");
    t.part("all_2_2_0");
    assert_eq!(t.build("all_1_1_0", &index), BuildStatus::Success);
    assert_eq!(t.build("all_2_2_0", &index), BuildStatus::Success);

    let c = t.merge("all_1_2_1", &["all_1_1_0", "all_2_2_0"]);
    let migrator = t.migrator();
    let report = migrator.relocate_inherited_segments(&c).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.moved.len(), 6);

    let names = c.file_names().unwrap();
    assert!(names.contains(&naming::merged_file_name(0, "all_1_1_0", &data_file_name("idx"))));
    assert!(names.contains(&naming::merged_checksums_file_name(1, "all_2_2_0", "idx")));

    for segment in migrator.discover_inherited_segments(&c, &index) {
        assert!(segment.files_present());
        migrator.verify_segment_checksums(&segment).unwrap();
    }

    let ancestors = c.merged_source_parts();
    let expected = vec![data_file_name("idx"), naming::description_file_name("idx")];
    for ancestor in &ancestors {
        let verification = migrator.verify_relocation(ancestor, c.path(), &expected);
        assert!(verification.is_complete());
    }
}

#[test]
fn own_build_then_purge_leaves_only_own_segment() {
    let t = TestTable::new();
    let index = t.index();
    t.part("all_1_1_0");
    t.part("all_2_2_0");
    t.build("all_1_1_0", &index);
    t.build("all_2_2_0", &index);

    let c = t.merge("all_1_2_1", &["all_1_1_0", "all_2_2_0"]);
    let migrator = t.migrator();
    migrator.relocate_inherited_segments(&c).unwrap();

    for segment in migrator.discover_inherited_segments(&c, &index) {
        t.cache.insert(segment.cache_key(), ());
    }
    assert_eq!(t.cache.len(), 2);

    assert_eq!(t.build("all_1_2_1", &index), BuildStatus::Success);
    let c = t.open_part("all_1_2_1");

    let report = migrator.purge_inherited_segments(&c, &index);
    assert_eq!(report.cache_entries_removed, 2);
    assert!(report.errors.is_empty());
    assert!(t.cache.is_empty());
    assert!(c
        .file_names()
        .unwrap()
        .iter()
        .all(|n| !naming::is_merged_file(n)));

    let segments = resolve_all_segments(&t.context, &c, &index);
    assert_eq!(segments.len(), 1);
    assert!(segments[0].provenance().is_none());
    assert_eq!(segments[0].owning_part_name(), "all_1_2_1");

    assert_eq!(t.event_types().last(), Some(&EventType::Cleared));
}

#[test]
fn prepare_on_dropped_part_reports_no_data_part() {
    let t = TestTable::new();
    t.part("all_1_1_0");
    let mut task = t.task("all_1_1_0", &t.index());
    t.drop_part("all_1_1_0").unwrap();

    assert!(matches!(task.prepare(), BuildStatus::NoDataPart { .. }));
    assert_eq!(task.state(), BuildState::PrepareFailed);
    assert!(matches!(task.execute(), BuildStatus::NoDataPart { .. }));
    assert!(t.log.is_empty());
}

#[test]
fn part_dropped_between_prepare_and_execute() {
    let t = TestTable::new();
    t.part("all_1_1_0");
    let mut task = t.task("all_1_1_0", &t.index());
    assert_eq!(task.prepare(), BuildStatus::Success);
    t.drop_part("all_1_1_0").unwrap();

    assert!(matches!(task.execute(), BuildStatus::NoDataPart { .. }));
    let records = t.log.records();
    assert_eq!(records.last().map(|r| r.event_type), Some(EventType::BuildError));
    assert_eq!(records.last().map(|r| r.error), Some(232));
}

#[test]
fn mutated_part_shares_cache_key_with_its_base() {
    let t = TestTable::new();
    let index = t.index();
    t.part("all_1_1_0_4");
    t.build("all_1_1_0_4", &index);

    let mutated = t.open_part("all_1_1_0_4");
    let own = resolve_own_segment(&t.context, &mutated, &index).unwrap();
    assert_eq!(own.cache_key().part_name, "all_1_1_0");
    assert!(own.cache_prefix().ends_with("all_1_1_0"));
}
