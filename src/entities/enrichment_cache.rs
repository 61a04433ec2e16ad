use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "enrichment_cache")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Lowercased lookup query. Negative lookups are cached too, under
    /// status "not_found".
    #[sea_orm(unique)]
    pub query: String,
    pub status: String,
    pub total_seasons: Option<i32>,
    pub total_episodes: Option<i32>,
    pub fetched_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
