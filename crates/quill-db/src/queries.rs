use crate::Database;
use crate::models::{ChallengeRow, CommentRow, LetterRow, StoryRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

/// Escape LIKE wildcards so a search term matches literally, then wrap it for
/// substring matching. SQLite LIKE is case-insensitive over ASCII, which is
/// the contract the search layer relies on.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare("SELECT id, username, email, password, created_at FROM users WHERE id = ?1")?
                .query_row([id], user_from_row)
                .optional()
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, username, email, password, created_at FROM users WHERE username = ?1",
            )?
            .query_row([username], user_from_row)
            .optional()
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, username, email, password, created_at FROM users WHERE email = ?1",
            )?
            .query_row([email], user_from_row)
            .optional()
        })
    }

    pub fn update_user(&self, id: &str, username: &str, email: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET username = ?2, email = ?3, password = ?4 WHERE id = ?1",
                (id, username, email, password_hash),
            )?;
            Ok(())
        })
    }

    /// Case-insensitive substring match on usernames, in insertion order.
    pub fn find_users_by_username(&self, term: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, created_at FROM users
                 WHERE username LIKE ?1 ESCAPE '\\' ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([like_pattern(term)], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Letters --

    #[allow(clippy::too_many_arguments)]
    pub fn insert_letter(
        &self,
        id: &str,
        text: &str,
        ambit: Option<&str>,
        receiver: &str,
        receiver_email: Option<&str>,
        creator: &str,
        challenge: Option<&str>,
        votes: Option<i64>,
        last_letter: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO letters (id, text, ambit, receiver, receiver_email, creator, challenge, votes, last_letter)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![id, text, ambit, receiver, receiver_email, creator, challenge, votes, last_letter],
            )?;
            Ok(())
        })
    }

    pub fn get_letter(&self, id: &str) -> Result<Option<LetterRow>> {
        self.with_conn(|conn| {
            conn.prepare(&format!("{LETTER_COLUMNS} WHERE id = ?1"))?
                .query_row([id], letter_from_row)
                .optional()
        })
    }

    /// Chain heads only: continuations (last_letter set) never surface in
    /// top-level listings.
    pub fn list_chain_heads(&self) -> Result<Vec<LetterRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{LETTER_COLUMNS} WHERE last_letter IS NULL ORDER BY rowid"))?;
            let rows = stmt
                .query_map([], letter_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_chain_heads_by_creator(&self, creator: &str) -> Result<Vec<LetterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{LETTER_COLUMNS} WHERE creator = ?1 AND last_letter IS NULL ORDER BY rowid"
            ))?;
            let rows = stmt
                .query_map([creator], letter_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_letter(
        &self,
        id: &str,
        text: &str,
        receiver: &str,
        receiver_email: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE letters SET text = ?2, receiver = ?3, receiver_email = ?4 WHERE id = ?1",
                rusqlite::params![id, text, receiver, receiver_email],
            )?;
            Ok(())
        })
    }

    pub fn delete_letter(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM letters WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// The open chain tail for an author/receiver pair: oldest letter by that
    /// creator addressed to that receiver with no forward link yet.
    /// `exclude` keeps a freshly created continuation from matching itself.
    pub fn find_open_tail(&self, creator: &str, receiver: &str, exclude: &str) -> Result<Option<LetterRow>> {
        self.with_conn(|conn| {
            conn.prepare(&format!(
                "{LETTER_COLUMNS}
                 WHERE creator = ?1 AND receiver = ?2 AND next_letter IS NULL AND id <> ?3
                 ORDER BY rowid LIMIT 1"
            ))?
            .query_row([creator, receiver, exclude], letter_from_row)
            .optional()
        })
    }

    pub fn set_next_letter(&self, id: &str, next_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE letters SET next_letter = ?2 WHERE id = ?1",
                [id, next_id],
            )?;
            Ok(())
        })
    }

    /// Record a vote and bump the letter's count. Returns the updated count,
    /// or None if this user already voted on this letter.
    pub fn cast_vote(&self, user_id: &str, letter_id: &str) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO user_votes (user_id, letter_id) VALUES (?1, ?2)",
                [user_id, letter_id],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            conn.execute(
                "UPDATE letters SET votes = votes + 1 WHERE id = ?1 AND votes IS NOT NULL",
                [letter_id],
            )?;
            let votes =
                conn.query_row("SELECT votes FROM letters WHERE id = ?1", [letter_id], |row| {
                    row.get(0)
                })?;
            Ok(votes)
        })
    }

    /// Toggle a favorite. Returns true if the letter was newly favorited,
    /// false if the existing favorite was removed.
    pub fn toggle_favorite(&self, user_id: &str, letter_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM user_favorites WHERE user_id = ?1 AND letter_id = ?2",
                [user_id, letter_id],
            )?;
            if removed > 0 {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO user_favorites (user_id, letter_id) VALUES (?1, ?2)",
                [user_id, letter_id],
            )?;
            Ok(true)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, id: &str, text: &str, creator: &str, letter: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (id, text, creator, letter) VALUES (?1, ?2, ?3, ?4)",
                (id, text, creator, letter),
            )?;
            Ok(())
        })
    }

    pub fn get_comments_for_letter(&self, letter_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            // JOIN users to resolve the commenter's name in a single query
            let mut stmt = conn.prepare(
                "SELECT c.id, c.text, c.creator, u.username, c.letter, c.created_at
                 FROM comments c
                 LEFT JOIN users u ON c.creator = u.id
                 WHERE c.letter = ?1
                 ORDER BY c.rowid",
            )?;
            let rows = stmt
                .query_map([letter_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        creator: row.get(2)?,
                        creator_username: row
                            .get::<_, Option<String>>(3)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        letter: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Challenges --

    pub fn insert_challenge(&self, id: &str, genre: &str, objective: &str, creator: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO challenges (id, genre, objective, creator) VALUES (?1, ?2, ?3, ?4)",
                (id, genre, objective, creator),
            )?;
            Ok(())
        })
    }

    pub fn get_challenge(&self, id: &str) -> Result<Option<ChallengeRow>> {
        self.with_conn(|conn| {
            conn.prepare(&format!("{CHALLENGE_COLUMNS} WHERE id = ?1"))?
                .query_row([id], challenge_from_row)
                .optional()
        })
    }

    pub fn list_challenges(&self, genre: Option<&str>) -> Result<Vec<ChallengeRow>> {
        self.with_conn(|conn| match genre {
            Some(genre) => {
                let mut stmt =
                    conn.prepare(&format!("{CHALLENGE_COLUMNS} WHERE genre = ?1 ORDER BY rowid"))?;
                let rows = stmt
                    .query_map([genre], challenge_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
            None => {
                let mut stmt = conn.prepare(&format!("{CHALLENGE_COLUMNS} ORDER BY rowid"))?;
                let rows = stmt
                    .query_map([], challenge_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
        })
    }

    /// Case-insensitive substring match on challenge objectives, in insertion
    /// order.
    pub fn find_challenges_by_objective(&self, term: &str) -> Result<Vec<ChallengeRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{CHALLENGE_COLUMNS} WHERE objective LIKE ?1 ESCAPE '\\' ORDER BY rowid"
            ))?;
            let rows = stmt
                .query_map([like_pattern(term)], challenge_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn find_challenges_by_creator(&self, creator: &str, genre: Option<&str>) -> Result<Vec<ChallengeRow>> {
        self.with_conn(|conn| match genre {
            Some(genre) => {
                let mut stmt = conn.prepare(&format!(
                    "{CHALLENGE_COLUMNS} WHERE creator = ?1 AND genre = ?2 ORDER BY rowid"
                ))?;
                let rows = stmt
                    .query_map([creator, genre], challenge_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("{CHALLENGE_COLUMNS} WHERE creator = ?1 ORDER BY rowid"))?;
                let rows = stmt
                    .query_map([creator], challenge_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
        })
    }

    // -- Stories --

    pub fn insert_story(
        &self,
        id: &str,
        genre: &str,
        text: &str,
        creator: &str,
        challenge: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO stories (id, genre, text, creator, challenge) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, genre, text, creator, challenge],
            )?;
            Ok(())
        })
    }

    /// Chain-head stories entered into a challenge.
    pub fn list_stories_for_challenge(&self, challenge_id: &str) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{STORY_COLUMNS} WHERE s.challenge = ?1 AND s.last_story IS NULL ORDER BY s.rowid"
            ))?;
            let rows = stmt
                .query_map([challenge_id], story_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Chain-head stories this user entered into any challenge, with the
    /// challenge objective populated.
    pub fn list_my_challenge_stories(&self, creator: &str, genre: Option<&str>) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            let base = format!(
                "{STORY_COLUMNS}
                 WHERE s.creator = ?1 AND s.challenge IS NOT NULL AND s.last_story IS NULL"
            );
            match genre {
                Some(genre) => {
                    let mut stmt = conn.prepare(&format!("{base} AND s.genre = ?2 ORDER BY s.rowid"))?;
                    let rows = stmt
                        .query_map([creator, genre], story_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
                None => {
                    let mut stmt = conn.prepare(&format!("{base} ORDER BY s.rowid"))?;
                    let rows = stmt
                        .query_map([creator], story_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    Ok(rows)
                }
            }
        })
    }
}

const LETTER_COLUMNS: &str = "SELECT id, text, ambit, receiver, receiver_email, creator, challenge, votes, last_letter, next_letter, created_at FROM letters";

const CHALLENGE_COLUMNS: &str = "SELECT id, genre, objective, creator, created_at FROM challenges";

// JOIN challenges so the objective rides along without a second query
const STORY_COLUMNS: &str = "SELECT s.id, s.genre, s.text, s.creator, s.challenge, s.last_story, ch.objective, s.created_at
     FROM stories s LEFT JOIN challenges ch ON s.challenge = ch.id";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn letter_from_row(row: &rusqlite::Row) -> rusqlite::Result<LetterRow> {
    Ok(LetterRow {
        id: row.get(0)?,
        text: row.get(1)?,
        ambit: row.get(2)?,
        receiver: row.get(3)?,
        receiver_email: row.get(4)?,
        creator: row.get(5)?,
        challenge: row.get(6)?,
        votes: row.get(7)?,
        last_letter: row.get(8)?,
        next_letter: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn challenge_from_row(row: &rusqlite::Row) -> rusqlite::Result<ChallengeRow> {
    Ok(ChallengeRow {
        id: row.get(0)?,
        genre: row.get(1)?,
        objective: row.get(2)?,
        creator: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn story_from_row(row: &rusqlite::Row) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        genre: row.get(1)?,
        text: row.get(2)?,
        creator: row.get(3)?,
        challenge: row.get(4)?,
        last_story: row.get(5)?,
        challenge_objective: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, id: &str, username: &str) {
        db.create_user(id, username, &format!("{username}@example.com"), "hash")
            .unwrap();
    }

    #[test]
    fn chain_links_are_mutually_consistent() {
        let db = test_db();
        seed_user(&db, "u1", "ada");
        db.insert_letter("l1", "first", Some("travel"), "Sam", None, "u1", None, None, None)
            .unwrap();
        db.insert_letter("l2", "part two", None, "Sam", None, "u1", None, None, Some("l1"))
            .unwrap();
        db.set_next_letter("l1", "l2").unwrap();

        let head = db.get_letter("l1").unwrap().unwrap();
        let tail = db.get_letter("l2").unwrap().unwrap();
        assert_eq!(head.next_letter.as_deref(), Some("l2"));
        assert_eq!(tail.last_letter.as_deref(), Some("l1"));
        assert!(tail.next_letter.is_none());
    }

    #[test]
    fn listings_exclude_continuations() {
        let db = test_db();
        seed_user(&db, "u1", "ada");
        db.insert_letter("l1", "head", None, "Sam", None, "u1", None, None, None)
            .unwrap();
        db.insert_letter("l2", "continuation", None, "Sam", None, "u1", None, None, Some("l1"))
            .unwrap();

        let all = db.list_chain_heads().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "l1");

        let mine = db.list_chain_heads_by_creator("u1").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "l1");
    }

    #[test]
    fn open_tail_skips_closed_letters_and_the_excluded_id() {
        let db = test_db();
        seed_user(&db, "u1", "ada");
        // l1 already has a forward link; l2 is the open tail.
        db.insert_letter("l1", "one", None, "Sam", None, "u1", None, None, None)
            .unwrap();
        db.insert_letter("l2", "two", None, "Sam", None, "u1", None, None, Some("l1"))
            .unwrap();
        db.set_next_letter("l1", "l2").unwrap();
        db.insert_letter("l3", "three", None, "Sam", None, "u1", None, None, Some("l2"))
            .unwrap();

        let tail = db.find_open_tail("u1", "Sam", "l3").unwrap().unwrap();
        assert_eq!(tail.id, "l2");

        // A different receiver has no open tail at all.
        assert!(db.find_open_tail("u1", "Alex", "l3").unwrap().is_none());
    }

    #[test]
    fn username_match_is_case_insensitive_and_literal() {
        let db = test_db();
        seed_user(&db, "u1", "DragonMaster");
        seed_user(&db, "u2", "knight_100%");

        assert_eq!(db.find_users_by_username("dragon").unwrap().len(), 1);
        assert_eq!(db.find_users_by_username("DRAGON").unwrap().len(), 1);
        // Wildcards in the term match literally, not as patterns.
        assert_eq!(db.find_users_by_username("100%").unwrap().len(), 1);
        assert!(db.find_users_by_username("0%Ma").unwrap().is_empty());
    }

    #[test]
    fn cast_vote_is_once_per_user() {
        let db = test_db();
        seed_user(&db, "u1", "ada");
        seed_user(&db, "u2", "brin");
        db.insert_challenge("c1", "Fantasy", "write a dragon tale", "u1")
            .unwrap();
        db.insert_letter("l1", "entry", None, "Sam", None, "u1", Some("c1"), Some(0), None)
            .unwrap();

        assert_eq!(db.cast_vote("u2", "l1").unwrap(), Some(1));
        assert_eq!(db.cast_vote("u2", "l1").unwrap(), None);
        assert_eq!(db.cast_vote("u1", "l1").unwrap(), Some(2));

        let letter = db.get_letter("l1").unwrap().unwrap();
        assert_eq!(letter.votes, Some(2));
    }

    #[test]
    fn toggle_favorite_round_trip() {
        let db = test_db();
        seed_user(&db, "u1", "ada");
        db.insert_letter("l1", "text", None, "Sam", None, "u1", None, None, None)
            .unwrap();

        assert!(db.toggle_favorite("u1", "l1").unwrap());
        assert!(!db.toggle_favorite("u1", "l1").unwrap());
        assert!(db.toggle_favorite("u1", "l1").unwrap());
    }

    #[test]
    fn my_challenge_stories_require_a_challenge_and_chain_head() {
        let db = test_db();
        seed_user(&db, "u1", "ada");
        db.insert_challenge("c1", "Fantasy", "write a dragon tale", "u1")
            .unwrap();
        db.insert_story("s1", "Fantasy", "once upon", "u1", Some("c1")).unwrap();
        // Free-standing story: no challenge, never listed here.
        db.insert_story("s2", "Fantasy", "loose", "u1", None).unwrap();

        let stories = db.list_my_challenge_stories("u1", None).unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].id, "s1");
        assert_eq!(stories[0].challenge_objective.as_deref(), Some("write a dragon tale"));

        assert!(db.list_my_challenge_stories("u1", Some("Noir")).unwrap().is_empty());
    }
}
