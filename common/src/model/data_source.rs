use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The generation-counter row backing one upstream data source
/// (spec.md §4.3: "each source has a database row holding a generation
/// counter"). Not named as a top-level entity in spec.md §3, but required
/// by the collection algorithm it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DataSource {
    pub data_source_id: Uuid,
    pub kind: String,
    pub current_generation: i64,
}

impl crate::Storable for DataSource {
    const TABLE: &'static str = "data_source";
    const PK_COLUMN: &'static str = "data_source_id";
    const COLUMNS: &'static [&'static str] = &["data_source_id", "kind", "current_generation"];

    fn primary_key(&self) -> Uuid {
        self.data_source_id
    }

    fn push_insert_values<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder
            .push_bind(self.data_source_id)
            .push(", ")
            .push_bind(&self.kind)
            .push(", ")
            .push_bind(self.current_generation);
    }

    fn push_update_assignments<'q>(&'q self, builder: &mut sqlx::QueryBuilder<'q, sqlx::Postgres>) {
        builder.push("current_generation = ").push_bind(self.current_generation);
    }
}
