//! Notification command handlers

use crate::config::Config;
use crate::constants::limits;
use crate::db::Store;

pub async fn cmd_notifications(
    config: &Config,
    user: &str,
    unread_only: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let rows = store
        .notifications_for_user(user, unread_only, limits::DEFAULT_NOTIFICATION_LIMIT)
        .await?;

    if rows.is_empty() {
        if unread_only {
            println!("No unread notifications for user {user}.");
        } else {
            println!("No notifications for user {user}.");
        }
        return Ok(());
    }

    let unread = store.unread_notification_count(user).await?;
    println!("Notifications for user {user} ({unread} unread):");
    println!("{:-<70}", "");

    for notification in rows {
        let marker = if notification.is_read { "○" } else { "●" };
        let related = store
            .get_entity(notification.related_entity_id)
            .await?
            .map_or_else(
                || format!("entity {}", notification.related_entity_id),
                |e| e.title,
            );

        println!("{} [{}] {}", marker, notification.id, related);
        println!(
            "   {} (confidence {:.2}) | {}",
            notification.reason, notification.confidence, notification.created_at
        );
    }

    Ok(())
}

pub async fn cmd_mark_read(
    config: &Config,
    id: Option<i32>,
    user: Option<&str>,
    all: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    match (id, user, all) {
        (Some(id), _, false) => {
            if store.mark_notification_read(id).await? {
                println!("Marked notification {id} as read.");
            } else {
                println!("No notification with ID {id}.");
            }
        }
        (None, Some(user), true) => {
            let count = store.mark_all_notifications_read(user).await?;
            println!("Marked {count} notification(s) as read for user {user}.");
        }
        _ => {
            println!("Specify a notification ID, or --user <uuid> --all.");
        }
    }

    Ok(())
}
