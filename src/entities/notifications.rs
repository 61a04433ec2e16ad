use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub trigger_entity_id: i32,
    pub related_entity_id: i32,
    pub confidence: f32,
    pub reason: String,
    pub is_read: bool,
    pub emailed: bool,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::media_entities::Entity",
        from = "Column::TriggerEntityId",
        to = "super::media_entities::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    TriggerEntity,
    #[sea_orm(
        belongs_to = "super::media_entities::Entity",
        from = "Column::RelatedEntityId",
        to = "super::media_entities::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    RelatedEntity,
}

impl Related<super::media_entities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RelatedEntity.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
