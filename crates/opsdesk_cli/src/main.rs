//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `opsdesk_core` linkage.
//! - Walk one seeded subject through navigation and the notification feed
//!   against an in-memory database.

use opsdesk_core::{
    ConsoleConfig, ConsoleSession, DbHandle, FeedState, Notification, NotificationRepository,
    Role, SqliteNotificationRepository, SqliteRoleRepository,
};
use std::error::Error;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("opsdesk_core ping={}", opsdesk_core::ping());
    println!("opsdesk_core version={}", opsdesk_core::core_version());

    let db = DbHandle::in_memory()?;
    let subject = Uuid::new_v4();
    SqliteRoleRepository::new(db.clone()).assign_role(subject, Role::Manager)?;
    let notifications = SqliteNotificationRepository::new(db.clone());
    for (offset, title, target) in [
        (0, "Contract renewal due", Some("/contracts")),
        (1, "Incident reported", Some("/incidents")),
        (2, "Welcome to OpsDesk", None),
    ] {
        let mut notification = Notification::new(subject, title, "", 1_700_000_000_000 + offset);
        if let Some(target) = target {
            notification = notification.with_action_target(target);
        }
        notifications.create_notification(&notification).await?;
    }

    let session = ConsoleSession::from_db(db, &ConsoleConfig::default());
    session.sign_in(subject);

    let capabilities = session.capabilities().await?;
    let granted = capabilities
        .capabilities()
        .map(|capability| capability.as_str())
        .collect::<Vec<_>>();
    println!("subject={subject} capabilities={}", granted.join(","));

    for entry in session.navigation().await.entries() {
        println!("nav id={} route={}", entry.id, entry.route);
    }

    let client = session
        .notifications()
        .ok_or("session has no notification client")?;
    print_feed(FeedState::from_result(client.list().await));
    let updated = client.mark_all_read().await?;
    println!("mark_all_read updated={updated}");
    print_feed(FeedState::from_result(client.list().await));

    session.sign_out();
    Ok(())
}

fn print_feed(state: FeedState) {
    match state {
        FeedState::Loaded(view) => {
            println!(
                "feed items={} unread={} badge={}",
                view.items.len(),
                view.unread_count,
                view.badge_label().unwrap_or_default()
            );
        }
        FeedState::Unavailable { message } => println!("feed unavailable: {message}"),
    }
}
