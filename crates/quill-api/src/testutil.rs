use quill_db::Database;
use uuid::Uuid;

pub(crate) fn test_db() -> Database {
    Database::open_in_memory().unwrap()
}

pub(crate) fn seed_user(db: &Database, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.create_user(
        &id.to_string(),
        username,
        &format!("{username}@example.com"),
        "hash",
    )
    .unwrap();
    id
}

pub(crate) fn seed_letter(db: &Database, creator: &Uuid, receiver: &str, text: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_letter(
        &id,
        text,
        Some("testing"),
        receiver,
        None,
        &creator.to_string(),
        None,
        None,
        None,
    )
    .unwrap();
    id
}

pub(crate) fn seed_challenge(db: &Database, creator: &Uuid, genre: &str, objective: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.insert_challenge(&id, genre, objective, &creator.to_string())
        .unwrap();
    id
}
