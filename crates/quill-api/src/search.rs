use std::collections::HashSet;

use anyhow::Result;
use quill_db::Database;
use quill_db::models::ChallengeRow;

use crate::order::reverse_for_display;

/// Search challenges by a free-text term: challenges whose objective contains
/// the term, unioned with every challenge authored by a user whose username
/// contains the term. Both matches are case-insensitive substrings.
///
/// Dedup is by challenge identity, first-found-wins: direct objective matches
/// keep their store position, author matches are appended only when unseen.
/// The combined set is reversed for display like every other listing.
///
/// Callers guard the empty term themselves and fall back to the unfiltered
/// list; an empty term here would simply match everything.
pub fn search_challenges(db: &Database, term: &str) -> Result<Vec<ChallengeRow>> {
    let users = db.find_users_by_username(term)?;
    let mut challenges = db.find_challenges_by_objective(term)?;

    let mut seen: HashSet<String> = challenges.iter().map(|c| c.id.clone()).collect();
    for user in &users {
        for challenge in db.find_challenges_by_creator(&user.id, None)? {
            if seen.insert(challenge.id.clone()) {
                challenges.push(challenge);
            }
        }
    }

    Ok(reverse_for_display(&challenges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_challenge, seed_user, test_db};

    #[test]
    fn matches_objectives_case_insensitively() {
        let db = test_db();
        let ada = seed_user(&db, "ada");
        let c1 = seed_challenge(&db, &ada, "Fantasy", "write a dragon tale");

        let lower = search_challenges(&db, "dragon").unwrap();
        assert_eq!(lower.len(), 1);
        assert_eq!(lower[0].id, c1);

        let upper = search_challenges(&db, "DRAGON").unwrap();
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].id, c1);
    }

    #[test]
    fn pulls_in_challenges_authored_by_matched_users() {
        let db = test_db();
        let dragonmaster = seed_user(&db, "dragonmaster");
        let c1 = seed_challenge(&db, &dragonmaster, "Noir", "a rainy city mystery");

        let found = search_challenges(&db, "dragon").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, c1);
    }

    #[test]
    fn no_challenge_appears_twice() {
        let db = test_db();
        // Username and objective both match the term, covering the same
        // challenge from both directions.
        let dragonmaster = seed_user(&db, "dragonmaster");
        let c1 = seed_challenge(&db, &dragonmaster, "Fantasy", "write a dragon tale");
        let c2 = seed_challenge(&db, &dragonmaster, "Noir", "something else entirely");

        let found = search_challenges(&db, "dragon").unwrap();
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(found.len(), 2);
        assert!(ids.contains(&c1.as_str()));
        assert!(ids.contains(&c2.as_str()));
    }

    #[test]
    fn author_matches_follow_direct_matches_before_reversal() {
        let db = test_db();
        let dragonmaster = seed_user(&db, "dragonmaster");
        let plain = seed_user(&db, "plainuser");
        let direct = seed_challenge(&db, &plain, "Fantasy", "slay the dragon");
        let by_author = seed_challenge(&db, &dragonmaster, "Noir", "unrelated objective");

        // Pre-reversal order is [direct, by_author]; reversed for display.
        let found = search_challenges(&db, "dragon").unwrap();
        assert_eq!(found[0].id, by_author);
        assert_eq!(found[1].id, direct);
    }

    #[test]
    fn repeated_searches_return_identical_results() {
        let db = test_db();
        let dragonmaster = seed_user(&db, "dragonmaster");
        seed_challenge(&db, &dragonmaster, "Fantasy", "write a dragon tale");
        seed_challenge(&db, &dragonmaster, "Noir", "city of ash");

        let first: Vec<String> = search_challenges(&db, "dragon")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        let second: Vec<String> = search_challenges(&db, "dragon")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn no_matches_is_an_empty_result_not_an_error() {
        let db = test_db();
        let ada = seed_user(&db, "ada");
        seed_challenge(&db, &ada, "Fantasy", "write a dragon tale");

        assert!(search_challenges(&db, "zzz-no-match").unwrap().is_empty());
    }
}
