use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "consumption_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub entity_id: i32,
    pub source_tag: String,
    pub consumed_at: Option<String>,
    /// Original source row as JSON, kept for audit.
    #[sea_orm(column_type = "Text")]
    pub raw_payload: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::media_entities::Entity",
        from = "Column::EntityId",
        to = "super::media_entities::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    MediaEntities,
}

impl Related<super::media_entities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MediaEntities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
