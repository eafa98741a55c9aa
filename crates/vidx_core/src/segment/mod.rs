//! Segment identity.
//!
//! A segment is one on-disk vector-index artifact bound to one part and one
//! index definition. A part serves an index either from its own segment or,
//! after a merge and until its own index is built, from the segments of its
//! ancestors, remapped through row-id maps.

mod identity;
mod resolve;

pub use identity::{CacheKey, Provenance, SegmentId};
pub use resolve::{resolve_all_segments, resolve_inherited_segments, resolve_own_segment};
