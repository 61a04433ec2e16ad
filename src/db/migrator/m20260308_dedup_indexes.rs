use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        // Conflict-insert dedup relies on these; sqlite rejects an ON
        // CONFLICT target without a matching unique index.
        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_consumption_user_entity_unique ON consumption_records(user_id, entity_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_notifications_user_related_unique ON notifications(user_id, related_entity_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_media_entities_base_title ON media_entities(base_title)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_consumption_user ON consumption_records(user_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_consumption_user")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_media_entities_base_title")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_notifications_user_related_unique")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_consumption_user_entity_unique")
            .await?;

        Ok(())
    }
}
