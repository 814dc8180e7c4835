//! Entity transforms
//!
//! Pure wire-to-store and store-to-wire transforms over the data model.
//! Each function consumes its input and returns a new tree; nothing is
//! mutated in place or shared across requests.
//!
//! Comparator selection depends on nesting level, not entity type: a name
//! addressing a super column or a top-level column uses the primary codec,
//! a name addressing a column inside a super column uses the subcolumn
//! codec. `nested` arguments carry the enclosing scope's super-column
//! presence down the tree.

use crate::error::Result;
use crate::model::{
    Column, ColumnOrSuperColumn, Deletion, KeySlice, Mutation, SlicePredicate, SliceRange,
    StoreColumn, StoreColumnOrSuperColumn, StoreColumnParent, StoreColumnPath, StoreDeletion,
    StoreKeySlice, StoreMutation, StoreSlicePredicate, StoreSliceRange, StoreSuperColumn,
    SuperColumn, WireColumn, WireColumnOrSuperColumn, WireColumnParent, WireColumnPath,
    WireDeletion, WireKeySlice, WireMutation, WireSlicePredicate, WireSliceRange, WireSuperColumn,
};

use super::codec::{CfCodecs, NameCodec};

// =============================================================================
// Toward the Store
// =============================================================================

pub fn column_path_to_store(path: WireColumnPath, codecs: &CfCodecs) -> Result<StoreColumnPath> {
    let nested = path.super_column.is_some();
    Ok(StoreColumnPath {
        super_column: path
            .super_column
            .as_deref()
            .map(|n| codecs.primary.to_store(n))
            .transpose()?,
        column: path
            .column
            .as_deref()
            .map(|n| codecs.at(nested).to_store(n))
            .transpose()?,
        column_family: path.column_family,
    })
}

pub fn column_parent_to_store(
    parent: WireColumnParent,
    codecs: &CfCodecs,
) -> Result<StoreColumnParent> {
    Ok(StoreColumnParent {
        super_column: parent
            .super_column
            .as_deref()
            .map(|n| codecs.primary.to_store(n))
            .transpose()?,
        column_family: parent.column_family,
    })
}

pub fn slice_range_to_store(
    range: WireSliceRange,
    codec: &dyn NameCodec,
) -> Result<StoreSliceRange> {
    // Empty boundaries mean "unbounded" and pass through untransformed.
    let boundary = |b: String| -> Result<Vec<u8>> {
        if b.is_empty() {
            Ok(Vec::new())
        } else {
            codec.to_store(&b)
        }
    };
    Ok(SliceRange {
        start: boundary(range.start)?,
        finish: boundary(range.finish)?,
        reversed: range.reversed,
        count: range.count,
    })
}

/// The codec is the caller's choice per the enclosing parent's
/// super-column presence.
pub fn predicate_to_store(
    predicate: WireSlicePredicate,
    codec: &dyn NameCodec,
) -> Result<StoreSlicePredicate> {
    match predicate {
        SlicePredicate::Names(names) => Ok(SlicePredicate::Names(
            names
                .iter()
                .map(|n| codec.to_store(n))
                .collect::<Result<_>>()?,
        )),
        SlicePredicate::Range(range) => Ok(SlicePredicate::Range(slice_range_to_store(
            range, codec,
        )?)),
    }
}

pub fn column_to_store(column: WireColumn, codec: &dyn NameCodec) -> Result<StoreColumn> {
    Ok(Column {
        name: codec.to_store(&column.name)?,
        value: column.value.into_bytes(),
        timestamp: column.timestamp,
    })
}

pub fn super_column_to_store(sc: WireSuperColumn, codecs: &CfCodecs) -> Result<StoreSuperColumn> {
    Ok(SuperColumn {
        name: codecs.primary.to_store(&sc.name)?,
        columns: sc
            .columns
            .into_iter()
            .map(|c| column_to_store(c, codecs.sub))
            .collect::<Result<_>>()?,
    })
}

pub fn cosc_to_store(
    cosc: WireColumnOrSuperColumn,
    codecs: &CfCodecs,
    nested: bool,
) -> Result<StoreColumnOrSuperColumn> {
    match cosc {
        ColumnOrSuperColumn::Column(c) => Ok(ColumnOrSuperColumn::Column(column_to_store(
            c,
            codecs.at(nested),
        )?)),
        ColumnOrSuperColumn::Super(sc) => Ok(ColumnOrSuperColumn::Super(super_column_to_store(
            sc, codecs,
        )?)),
    }
}

/// A deletion's predicate addresses subcolumns when a super column is
/// named, top-level columns otherwise. One pass, one codec.
pub fn deletion_to_store(deletion: WireDeletion, codecs: &CfCodecs) -> Result<StoreDeletion> {
    let nested = deletion.super_column.is_some();
    Ok(Deletion {
        timestamp: deletion.timestamp,
        super_column: deletion
            .super_column
            .as_deref()
            .map(|n| codecs.primary.to_store(n))
            .transpose()?,
        predicate: deletion
            .predicate
            .map(|p| predicate_to_store(p, codecs.at(nested)))
            .transpose()?,
    })
}

pub fn mutation_to_store(mutation: WireMutation, codecs: &CfCodecs) -> Result<StoreMutation> {
    match mutation {
        Mutation::Write(cosc) => Ok(Mutation::Write(cosc_to_store(cosc, codecs, false)?)),
        Mutation::Delete(del) => Ok(Mutation::Delete(deletion_to_store(del, codecs)?)),
    }
}

// =============================================================================
// Toward the Wire
// =============================================================================

pub fn column_to_wire(column: StoreColumn, codec: &dyn NameCodec) -> Result<WireColumn> {
    Ok(Column {
        name: codec.to_wire(&column.name)?,
        value: String::from_utf8_lossy(&column.value).into_owned(),
        timestamp: column.timestamp,
    })
}

pub fn super_column_to_wire(sc: StoreSuperColumn, codecs: &CfCodecs) -> Result<WireSuperColumn> {
    Ok(SuperColumn {
        name: codecs.primary.to_wire(&sc.name)?,
        columns: sc
            .columns
            .into_iter()
            .map(|c| column_to_wire(c, codecs.sub))
            .collect::<Result<_>>()?,
    })
}

pub fn cosc_to_wire(
    cosc: StoreColumnOrSuperColumn,
    codecs: &CfCodecs,
    nested: bool,
) -> Result<WireColumnOrSuperColumn> {
    match cosc {
        ColumnOrSuperColumn::Column(c) => Ok(ColumnOrSuperColumn::Column(column_to_wire(
            c,
            codecs.at(nested),
        )?)),
        ColumnOrSuperColumn::Super(sc) => Ok(ColumnOrSuperColumn::Super(super_column_to_wire(
            sc, codecs,
        )?)),
    }
}

pub fn cosc_list_to_wire(
    list: Vec<StoreColumnOrSuperColumn>,
    codecs: &CfCodecs,
    nested: bool,
) -> Result<Vec<WireColumnOrSuperColumn>> {
    list.into_iter()
        .map(|cosc| cosc_to_wire(cosc, codecs, nested))
        .collect()
}

pub fn key_slices_to_wire(
    slices: Vec<StoreKeySlice>,
    codecs: &CfCodecs,
    nested: bool,
) -> Result<Vec<WireKeySlice>> {
    slices
        .into_iter()
        .map(|ks| {
            Ok(KeySlice {
                key: ks.key,
                columns: cosc_list_to_wire(ks.columns, codecs, nested)?,
            })
        })
        .collect()
}
