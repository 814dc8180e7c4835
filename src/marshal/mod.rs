//! Marshalling Engine
//!
//! Pure, schema-parameterized codecs over the request/response data model.
//! Column-family metadata selects a name codec once per nesting level
//! (`CfCodecs`), and the transforms thread it through the entity tree in
//! each direction: toward the store before the backend call, toward the
//! wire before JSON serialization. No I/O happens here.

mod codec;
mod transform;

pub use codec::{codec_for, generate_uuids, CfCodecs, LongCodec, NameCodec, TextCodec, UuidCodec};
pub use transform::{
    column_parent_to_store, column_path_to_store, column_to_store, column_to_wire,
    cosc_list_to_wire, cosc_to_store, cosc_to_wire, deletion_to_store, key_slices_to_wire,
    mutation_to_store, predicate_to_store, slice_range_to_store, super_column_to_store,
    super_column_to_wire,
};
