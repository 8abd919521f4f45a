use anyhow::{Context, Result};
use quill_db::Database;
use quill_db::models::LetterRow;
use quill_types::api::ContinueLetterRequest;
use uuid::Uuid;

/// Continue a letter: create the new entry pointing back at the original,
/// then close the open chain tail for this author/receiver pair by pointing
/// its forward link at the new entry.
///
/// The tail is matched on `(creator, receiver)`, not on the original letter
/// id. This reproduces the platform's historical linking rule: when an author
/// keeps several open chains to the same receiver, the oldest open tail gets
/// the forward link, which may not be the letter the continuation was started
/// from. Submitting a different receiver name leaves the new letter with no
/// inbound forward link at all — a disconnected continuation.
///
/// The create and the link are two separate store writes with no transaction
/// around them; a failure between the two leaves the new letter in place with
/// the tail still open.
pub fn continue_letter(
    db: &Database,
    actor: Uuid,
    original_id: &str,
    req: &ContinueLetterRequest,
) -> Result<LetterRow> {
    let id = Uuid::new_v4().to_string();
    let creator = actor.to_string();

    db.insert_letter(
        &id,
        &req.text,
        None,
        &req.receiver,
        req.receiver_email.as_deref(),
        &creator,
        None,
        None,
        Some(original_id),
    )?;

    if let Some(tail) = db.find_open_tail(&creator, &req.receiver, &id)? {
        db.set_next_letter(&tail.id, &id)?;
    }

    db.get_letter(&id)?
        .context("continuation letter missing immediately after insert")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_letter, seed_user, test_db};
    use quill_types::api::ContinueLetterRequest;

    fn continuation(text: &str, receiver: &str) -> ContinueLetterRequest {
        ContinueLetterRequest {
            text: text.into(),
            receiver: receiver.into(),
            receiver_email: None,
        }
    }

    #[test]
    fn continuation_links_both_directions() {
        let db = test_db();
        let ada = seed_user(&db, "ada");
        let l1 = seed_letter(&db, &ada, "Sam", "part one");

        let l2 = continue_letter(&db, ada, &l1, &continuation("part two", "Sam")).unwrap();

        assert_eq!(l2.last_letter.as_deref(), Some(l1.as_str()));
        let head = db.get_letter(&l1).unwrap().unwrap();
        assert_eq!(head.next_letter.as_deref(), Some(l2.id.as_str()));

        // Only the head surfaces in listings.
        let mine = db.list_chain_heads_by_creator(&ada.to_string()).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, l1);
    }

    #[test]
    fn second_continuation_moves_the_tail() {
        let db = test_db();
        let ada = seed_user(&db, "ada");
        let l1 = seed_letter(&db, &ada, "Sam", "part one");

        let l2 = continue_letter(&db, ada, &l1, &continuation("part two", "Sam")).unwrap();
        let l3 = continue_letter(&db, ada, &l2.id, &continuation("part three", "Sam")).unwrap();

        let mid = db.get_letter(&l2.id).unwrap().unwrap();
        assert_eq!(mid.next_letter.as_deref(), Some(l3.id.as_str()));
        assert_eq!(l3.last_letter.as_deref(), Some(l2.id.as_str()));
        assert!(db.get_letter(&l3.id).unwrap().unwrap().next_letter.is_none());
    }

    #[test]
    fn changed_receiver_leaves_a_disconnected_continuation() {
        let db = test_db();
        let ada = seed_user(&db, "ada");
        let l1 = seed_letter(&db, &ada, "Sam", "part one");

        let l2 = continue_letter(&db, ada, &l1, &continuation("part two", "Alex")).unwrap();

        // Backward link is set, but no open tail matched receiver "Alex",
        // so the original keeps its open forward slot.
        assert_eq!(l2.last_letter.as_deref(), Some(l1.as_str()));
        assert!(db.get_letter(&l1).unwrap().unwrap().next_letter.is_none());
    }

    #[test]
    fn tail_matching_ignores_which_letter_was_continued() {
        let db = test_db();
        let ada = seed_user(&db, "ada");
        // Two open chains to the same receiver.
        let first = seed_letter(&db, &ada, "Sam", "chain one");
        let second = seed_letter(&db, &ada, "Sam", "chain two");

        // Continuing the *second* chain still closes the oldest open tail.
        let l3 = continue_letter(&db, ada, &second, &continuation("more", "Sam")).unwrap();

        let oldest = db.get_letter(&first).unwrap().unwrap();
        assert_eq!(oldest.next_letter.as_deref(), Some(l3.id.as_str()));
        assert!(db.get_letter(&second).unwrap().unwrap().next_letter.is_none());
    }
}
