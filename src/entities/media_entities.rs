use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "media_entities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    /// Lowercased title; the unique column backing case-insensitive dedup.
    #[sea_orm(unique)]
    pub title_key: String,
    pub base_title: Option<String>,
    pub kind: String,
    pub season_number: Option<i32>,
    pub total_seasons: Option<i32>,
    pub total_episodes: Option<i32>,
    pub last_enriched_at: Option<String>,
    /// JSON object: import stamps plus raw-title history.
    #[sea_orm(column_type = "Text")]
    pub provenance: String,
    pub created_at: String, // ISO8601 strings throughout, SQLite has no real datetime
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::consumption_records::Entity")]
    ConsumptionRecords,
}

impl Related<super::consumption_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumptionRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
