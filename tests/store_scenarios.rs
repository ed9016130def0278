use guildkeeper::store::{Database, Document, InfractionKind, NewInfraction, Value};
use std::collections::HashSet;

fn scratch_db() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("guildkeeper.db");
    (dir, path)
}

#[tokio::test]
async fn test_config_survives_reopen() {
    let (_dir, path) = scratch_db();
    {
        let db = Database::open(&path).unwrap();
        let mut config = Document::new();
        config.set_path("automod.badwords", true);
        config.set_path("welcome_channel", Value::id(1_111_111_111_111_111_111));
        db.set_config(7, &config).await.unwrap();
    }

    let db = Database::open(&path).unwrap();
    let config = db.get_config(7).await.unwrap();
    assert_eq!(config.get_bool("automod.badwords"), Some(true));
    assert_eq!(
        config.get_u64("welcome_channel"),
        Some(1_111_111_111_111_111_111)
    );
    assert!(db.get_config(8).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reaction_role_lifecycle() {
    let (_dir, path) = scratch_db();
    let db = Database::open(&path).unwrap();

    db.bind_reaction_role(1, 500, "⭐", 900).await.unwrap();
    db.bind_reaction_role(1, 500, "🔥", 901).await.unwrap();
    assert_eq!(db.lookup_reaction_role(1, 500, "⭐").await.unwrap(), Some(900));

    // Rebinding replaces the role
    db.bind_reaction_role(1, 500, "⭐", 902).await.unwrap();
    assert_eq!(db.lookup_reaction_role(1, 500, "⭐").await.unwrap(), Some(902));

    // Other guilds see nothing
    assert_eq!(db.lookup_reaction_role(2, 500, "⭐").await.unwrap(), None);

    assert_eq!(db.unbind_message(1, 500).await.unwrap(), 2);
    assert!(db.reaction_roles_for_message(1, 500).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ledger_is_newest_first_and_scoped() {
    let (_dir, path) = scratch_db();
    let db = Database::open(&path).unwrap();

    db.append_infraction(NewInfraction::now(1, 10, 99, InfractionKind::Warn).at(100).with_reason("spam"))
        .await
        .unwrap();
    db.append_infraction(NewInfraction::now(1, 10, 99, InfractionKind::Kick).at(300))
        .await
        .unwrap();
    db.append_infraction(NewInfraction::now(1, 11, 99, InfractionKind::Ban).at(200))
        .await
        .unwrap();
    db.append_infraction(NewInfraction::now(2, 10, 99, InfractionKind::Mute).at(400))
        .await
        .unwrap();

    let records = db.list_infractions(1, 10).await.unwrap();
    let kinds = records.iter().map(|r| r.kind.clone()).collect::<Vec<_>>();
    assert_eq!(kinds, vec![InfractionKind::Kick, InfractionKind::Warn]);
    assert_eq!(records[1].reason.as_deref(), Some("spam"));
}

#[tokio::test]
async fn test_reminders_drain_once_across_reopen() {
    let (_dir, path) = scratch_db();
    {
        let db = Database::open(&path).unwrap();
        db.schedule_reminder(42, 100, "a").await.unwrap();
        db.schedule_reminder(42, 99, "b").await.unwrap();
        db.schedule_reminder(42, 200, "c").await.unwrap();
    }

    let db = Database::open(&path).unwrap();
    let due = db.drain_due(150).await.unwrap();
    let payloads = due.iter().map(|t| t.payload.as_str()).collect::<Vec<_>>();
    assert_eq!(payloads, vec!["b", "a"]);
    assert!(db.drain_due(150).await.unwrap().is_empty());

    let pending = db.pending_reminders(42).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload, "c");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_are_serialized() {
    let (_dir, path) = scratch_db();
    let db = Database::open(&path).unwrap();

    let tasks = (0..32)
        .map(|i| {
            let db = db.clone();
            tokio::spawn(async move {
                db.update_config(3, move |config| {
                    let count = config.get_i64("counter").unwrap_or(0);
                    config.set_path("counter", count + 1);
                    config.set_path(&format!("seen.k{i}"), true);
                })
                .await
                .unwrap();
            })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        task.await.unwrap();
    }

    let config = db.get_config(3).await.unwrap();
    assert_eq!(config.get_i64("counter"), Some(32));
    let seen = config
        .get_path("seen")
        .and_then(Value::as_document)
        .map(|doc| doc.iter().map(|(k, _)| k.clone()).collect::<HashSet<_>>())
        .unwrap_or_default();
    assert_eq!(seen.len(), 32);
}
