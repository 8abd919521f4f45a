use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS challenges (
            id          TEXT PRIMARY KEY,
            genre       TEXT NOT NULL,
            objective   TEXT NOT NULL,
            creator     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_challenges_creator
            ON challenges(creator);
        CREATE INDEX IF NOT EXISTS idx_challenges_genre
            ON challenges(genre);

        -- last_letter/next_letter carry no FK constraint: deleting a letter
        -- leaves its neighbours' links dangling rather than failing the delete.
        CREATE TABLE IF NOT EXISTS letters (
            id              TEXT PRIMARY KEY,
            text            TEXT NOT NULL,
            ambit           TEXT,
            receiver        TEXT NOT NULL,
            receiver_email  TEXT,
            creator         TEXT NOT NULL REFERENCES users(id),
            challenge       TEXT REFERENCES challenges(id),
            votes           INTEGER,
            last_letter     TEXT,
            next_letter     TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_letters_tail
            ON letters(creator, receiver);

        -- comments.letter is unconstrained so letter deletion orphans the
        -- thread instead of being rejected.
        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            text        TEXT NOT NULL,
            creator     TEXT NOT NULL REFERENCES users(id),
            letter      TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_letter
            ON comments(letter);

        CREATE TABLE IF NOT EXISTS stories (
            id          TEXT PRIMARY KEY,
            genre       TEXT NOT NULL,
            text        TEXT NOT NULL,
            creator     TEXT NOT NULL REFERENCES users(id),
            challenge   TEXT REFERENCES challenges(id),
            last_story  TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_stories_challenge
            ON stories(challenge);

        CREATE TABLE IF NOT EXISTS user_votes (
            user_id     TEXT NOT NULL REFERENCES users(id),
            letter_id   TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, letter_id)
        );

        CREATE TABLE IF NOT EXISTS user_favorites (
            user_id     TEXT NOT NULL REFERENCES users(id),
            letter_id   TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, letter_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
