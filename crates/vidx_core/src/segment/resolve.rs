//! Resolving the segments a part currently serves for an index.
//!
//! Paths derived here must reproduce exactly the layout the build step
//! wrote: the cache key is a pure function of these fields, so a divergence
//! is either a cache miss or, worse, two unrelated segments sharing a key.

use crate::context::VectorIndexContext;
use crate::segment::identity::{Provenance, SegmentId};
use std::path::PathBuf;
use vidx_storage::{DataPart, IndexDefinition, PartInfo};

/// `<cache_root>/<table relative path>/<part name without mutation>`
fn cache_prefix(ctx: &VectorIndexContext, part: &dyn DataPart, part_name: &str) -> PathBuf {
    ctx.cache_root()
        .join(&part.table().relative_data_path)
        .join(PartInfo::strip_mutation(part_name))
}

/// Resolves the part's own, freshly built segment.
///
/// Returns `None` unless the part reports a built index for `index`, or if
/// the part is not stored on disk.
pub fn resolve_own_segment(
    ctx: &VectorIndexContext,
    part: &dyn DataPart,
    index: &IndexDefinition,
) -> Option<SegmentId> {
    let storage = part.storage()?;
    if !part.contains_vector_index(index) {
        return None;
    }

    Some(SegmentId::new(
        storage.volume.clone(),
        storage.full_path.clone(),
        part.table().relative_data_path.clone(),
        part.name(),
        index,
        cache_prefix(ctx, part, part.name()),
    ))
}

/// Resolves the segments inherited from the ancestors of a merged part.
///
/// Returns one entry per ancestor, in merge order, but only while the part
/// still carries unconverted row-id maps. The cache prefix of each entry
/// uses the ancestor's name, not the owning part's.
pub fn resolve_inherited_segments(
    ctx: &VectorIndexContext,
    part: &dyn DataPart,
    index: &IndexDefinition,
) -> Vec<SegmentId> {
    let Some(storage) = part.storage() else {
        return Vec::new();
    };
    if !part.contains_row_ids_maps() {
        return Vec::new();
    }

    part.merged_source_parts()
        .iter()
        .map(|source| {
            SegmentId::new(
                storage.volume.clone(),
                storage.full_path.clone(),
                part.table().relative_data_path.clone(),
                part.name(),
                index,
                cache_prefix(ctx, part, &source.name),
            )
            .with_provenance(Provenance::from(source))
        })
        .collect()
}

/// Resolves every segment serving `index` on the part.
///
/// The part's own segment always supersedes inherited ones: the result is
/// either that single segment or the inherited segments, never a mix.
pub fn resolve_all_segments(
    ctx: &VectorIndexContext,
    part: &dyn DataPart,
    index: &IndexDefinition,
) -> Vec<SegmentId> {
    match resolve_own_segment(ctx, part, index) {
        Some(own) => vec![own],
        None => resolve_inherited_segments(ctx, part, index),
    }
}
