//! The `Storable` trait: table/column metadata for an entity, analogous to
//! the teacher's `StorableObject` trait (`common/src/types/v0/store/pool.rs`)
//! which pairs a domain struct with an etcd key-builder. Generalized here
//! from a key-builder to a SQL table/column mapping, since `o2ims-repository`
//! targets Postgres rather than etcd (SPEC_FULL.md §4.2).
//!
//! Implemented alongside each entity in `model/`, the same way the teacher
//! colocates `StorableObject` impls with the structs they describe.

use sqlx::postgres::Postgres;
use sqlx::QueryBuilder;
use uuid::Uuid;

/// Declares an entity's table, primary key, and (for types the repository
/// upserts) its `ON CONFLICT` target columns.
pub trait Storable: Send + Sync + Unpin {
    /// The table this entity is stored in.
    const TABLE: &'static str;
    /// The primary-key column, always a `uuid`.
    const PK_COLUMN: &'static str;
    /// Columns in the same order `push_insert_values` binds them.
    const COLUMNS: &'static [&'static str];
    /// Columns forming the `ON CONFLICT (...)` target for `Upsert`, or
    /// `None` for entities never upserted (spec.md §4.2).
    const CONFLICT_COLUMNS: Option<&'static [&'static str]> = None;

    /// Columns assigned in `Upsert`'s shared `ON CONFLICT DO UPDATE SET`
    /// clause (`col = EXCLUDED.col`) — the same set `push_update_assignments`
    /// touches, named separately because that clause is written once and
    /// shared across every row of a batched insert, so it can't rebind a
    /// single entity's literal field values the way a single-row `Update`
    /// does. `None` for entities never upserted.
    const UPDATE_COLUMNS: Option<&'static [&'static str]> = None;

    fn primary_key(&self) -> Uuid;

    /// Bind this row's values, in `COLUMNS` order, onto an INSERT/UPSERT
    /// statement under construction.
    fn push_insert_values<'q>(&'q self, builder: &mut QueryBuilder<'q, Postgres>);

    /// Bind this row's values as `column = value, ...` assignments for an
    /// UPDATE statement (excludes the primary key).
    fn push_update_assignments<'q>(&'q self, builder: &mut QueryBuilder<'q, Postgres>);
}
