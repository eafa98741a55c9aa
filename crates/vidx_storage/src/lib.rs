//! # vidx Storage
//!
//! On-disk layout of storage parts and their vector-index artifacts.
//!
//! This crate is the lowest layer of vidx. It knows how parts are named,
//! where their files live and what the index files inside them are called.
//! It does **not** know how an index is built, loaded or cached.
//!
//! ## Layout
//!
//! ```text
//! <table_dir>/
//! ├─ table.meta                                    # TableMetadata (CBOR)
//! └─ <part_name>/
//!    ├─ part.meta                                  # PartManifest (CBOR)
//!    ├─ <index>-vector_index_description.vidx3     # own segment
//!    ├─ <index>-vector_index_checksums.vidx3
//!    ├─ merged-<ord>-<ancestor>-<file>.vidx3       # inherited segments
//!    └─ merged-<ord>-<ancestor>-row_ids_map.vidx3  # row-id maps
//! ```
//!
//! ## Available Parts
//!
//! - [`DataPart`] - the view of a part the lifecycle code needs
//! - [`DiskPart`] - a part stored in a directory on a local volume
//! - [`TableDir`] - the set of parts belonging to one table

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod checksums;
mod error;
mod manifest;
mod metadata;
pub mod naming;
mod part;
mod part_info;
mod table;

pub use error::{StorageError, StorageResult};
pub use manifest::{PartManifest, MANIFEST_VERSION};
pub use metadata::{IndexDefinition, TableMetadata};
pub use part::{DataPart, DiskPart, MergedSourcePart, PartStorage, VolumeId};
pub use part_info::PartInfo;
pub use table::TableDir;
