//! Match engine: converts like/pass actions into ledger state and detects
//! mutual interest.
//!
//! Likes are directed edges with a lifetime uniqueness constraint per ordered
//! pair; matches are undirected and stored canonically (`user_a < user_b`)
//! with a uniqueness constraint on the pair, so two concurrent
//! opposite-direction likes race into exactly one match row and exactly one
//! caller sees `MatchFormed`.

use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use blovely_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Match, NewLike, NewMatch, PublicProfile, User};
use crate::schema::{likes, matches, users};

/// Outcome of a `like` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Like recorded (or already present), no mutual interest yet.
    NoMatch,
    /// This like completed a mutual pair and created the match.
    MatchFormed,
}

impl LikeOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, LikeOutcome::MatchFormed)
    }
}

/// Order a pair so (A,B) and (B,A) address the same match row.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b { (a, b) } else { (b, a) }
}

/// Record a like from `liker_id` toward `target_id` and detect a mutual match.
///
/// Re-liking is an idempotent no-op that reports `NoMatch`; a user cannot
/// re-trigger a match notification by liking again.
pub fn like(conn: &mut PgConnection, liker_id: Uuid, target_id: Uuid) -> AppResult<LikeOutcome> {
    if liker_id == target_id {
        return Err(AppError::new(
            ErrorCode::CannotLikeSelf,
            "you cannot like yourself",
        ));
    }

    let target_exists: bool = diesel::select(exists(
        users::table.filter(users::id.eq(target_id)),
    ))
    .get_result(conn)?;

    if !target_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    // At most one like per ordered pair; a conflict means it already existed.
    let inserted = diesel::insert_into(likes::table)
        .values(&NewLike {
            liker_id,
            liked_id: target_id,
        })
        .on_conflict((likes::liker_id, likes::liked_id))
        .do_nothing()
        .execute(conn)?;

    if inserted == 0 {
        return Ok(LikeOutcome::NoMatch);
    }

    let reverse_exists: bool = diesel::select(exists(
        likes::table
            .filter(likes::liker_id.eq(target_id))
            .filter(likes::liked_id.eq(liker_id)),
    ))
    .get_result(conn)?;

    if !reverse_exists {
        return Ok(LikeOutcome::NoMatch);
    }

    // The pair uniqueness constraint arbitrates concurrent opposite-direction
    // likes: whichever insert lands first forms the match, the other is a
    // no-op reporting NoMatch.
    let (user_a, user_b) = canonical_pair(liker_id, target_id);
    let created = diesel::insert_into(matches::table)
        .values(&NewMatch { user_a, user_b })
        .on_conflict((matches::user_a, matches::user_b))
        .do_nothing()
        .execute(conn)?;

    if created == 1 {
        tracing::info!(user_a = %user_a, user_b = %user_b, "match formed");
        Ok(LikeOutcome::MatchFormed)
    } else {
        Ok(LikeOutcome::NoMatch)
    }
}

/// Withdraw a previously recorded like. Idempotent; never touches matches,
/// since passing only withdraws interest and cannot unmake a confirmed match.
pub fn pass(conn: &mut PgConnection, liker_id: Uuid, target_id: Uuid) -> AppResult<()> {
    diesel::delete(
        likes::table
            .filter(likes::liker_id.eq(liker_id))
            .filter(likes::liked_id.eq(target_id)),
    )
    .execute(conn)?;

    Ok(())
}

/// Every match partner of `user_id`, as public projections. No ordering is
/// guaranteed.
pub fn list_matches(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<PublicProfile>> {
    let rows: Vec<Match> = matches::table
        .filter(matches::user_a.eq(user_id).or(matches::user_b.eq(user_id)))
        .load::<Match>(conn)?;

    let partner_ids: Vec<Uuid> = rows
        .iter()
        .map(|m| if m.user_a == user_id { m.user_b } else { m.user_a })
        .collect();

    let partners: Vec<User> = users::table
        .filter(users::id.eq_any(&partner_ids))
        .load::<User>(conn)?;

    Ok(partners.iter().map(PublicProfile::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
    }

    #[test]
    fn canonical_pair_orders_low_first() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (lo, hi) = canonical_pair(a, b);
        assert!(lo < hi);
    }

    #[test]
    fn outcome_reports_match() {
        assert!(LikeOutcome::MatchFormed.is_match());
        assert!(!LikeOutcome::NoMatch.is_match());
    }
}
