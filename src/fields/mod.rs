//! Field selection and resolution
//!
//! - `spec`: decoding of `path[:label[:default]]` field specs
//! - `resolver`: dotted path resolution with key/attribute/index fallback
//! - `catalog`: choosing and labelling the exported columns

pub mod catalog;
pub mod resolver;
pub mod spec;

pub use catalog::{CatalogOrigin, Column, FieldCatalog};
pub use resolver::{PathResolver, Resolved};
pub use spec::{FieldSpec, path_segments, safe_field_name};
