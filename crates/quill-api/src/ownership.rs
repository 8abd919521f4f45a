use quill_db::models::{ChallengeRow, LetterRow, StoryRow};
use uuid::Uuid;

use crate::error::ApiError;

/// Anything with an owning user.
pub trait Owned {
    fn creator_id(&self) -> &str;
}

impl Owned for LetterRow {
    fn creator_id(&self) -> &str {
        &self.creator
    }
}

impl Owned for ChallengeRow {
    fn creator_id(&self) -> &str {
        &self.creator
    }
}

impl Owned for StoryRow {
    fn creator_id(&self) -> &str {
        &self.creator
    }
}

/// True iff the record exists and its creator equals the actor, compared by
/// canonical string form. A missing record is simply "no".
pub fn authorize(actor: &Uuid, record: Option<&impl Owned>) -> bool {
    match record {
        Some(record) => record.creator_id() == actor.to_string(),
        None => false,
    }
}

/// Gate for mutations: hands back the record when the actor owns it and
/// collapses "missing" and "not yours" into the same denial.
pub fn require<T: Owned>(actor: &Uuid, record: Option<T>) -> Result<T, ApiError> {
    match record {
        Some(record) if authorize(actor, Some(&record)) => Ok(record),
        _ => Err(ApiError::Denied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_db::models::LetterRow;
    use uuid::Uuid;

    fn letter_owned_by(creator: &Uuid) -> LetterRow {
        LetterRow {
            id: Uuid::new_v4().to_string(),
            text: "hello".into(),
            ambit: None,
            receiver: "Sam".into(),
            receiver_email: None,
            creator: creator.to_string(),
            challenge: None,
            votes: None,
            last_letter: None,
            next_letter: None,
            created_at: "2024-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn owner_is_authorized() {
        let actor = Uuid::new_v4();
        let letter = letter_owned_by(&actor);
        assert!(authorize(&actor, Some(&letter)));
    }

    #[test]
    fn any_other_actor_is_refused() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let letter = letter_owned_by(&owner);
        assert!(!authorize(&stranger, Some(&letter)));
    }

    #[test]
    fn missing_record_is_false_not_an_error() {
        let actor = Uuid::new_v4();
        assert!(!authorize(&actor, None::<&LetterRow>));
    }

    #[test]
    fn foreign_challenges_and_stories_are_refused_too() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let challenge = ChallengeRow {
            id: Uuid::new_v4().to_string(),
            genre: "Fantasy".into(),
            objective: "write a dragon tale".into(),
            creator: owner.to_string(),
            created_at: "2024-01-01 00:00:00".into(),
        };
        let story = StoryRow {
            id: Uuid::new_v4().to_string(),
            genre: "Fantasy".into(),
            text: "once upon".into(),
            creator: owner.to_string(),
            challenge: Some(challenge.id.clone()),
            last_story: None,
            challenge_objective: None,
            created_at: "2024-01-01 00:00:00".into(),
        };

        assert!(authorize(&owner, Some(&challenge)));
        assert!(!authorize(&stranger, Some(&challenge)));
        assert!(authorize(&owner, Some(&story)));
        assert!(!authorize(&stranger, Some(&story)));
    }

    #[test]
    fn require_collapses_missing_and_foreign_into_denied() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        assert!(matches!(
            require(&owner, None::<LetterRow>),
            Err(ApiError::Denied)
        ));
        assert!(matches!(
            require(&stranger, Some(letter_owned_by(&owner))),
            Err(ApiError::Denied)
        ));
        assert!(require(&owner, Some(letter_owned_by(&owner))).is_ok());
    }
}
