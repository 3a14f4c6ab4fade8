//! Resolution of ambiguous caller-supplied identifiers to a canonical user id.
//!
//! Clients authenticated through federated login sometimes join with their
//! OAuth id or email instead of the canonical id. The registry tolerates this:
//! identifiers are tried against an ordered list of strategies, and an
//! unresolvable identifier is the caller's signal to drop the join.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use blovely_shared::errors::AppResult;

use crate::schema::users;

/// One resolution strategy, in the order it should be attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Syntactically valid canonical id: used directly, no lookup.
    Canonical(Uuid),
    /// Match against the stored OAuth identifier.
    OAuthId(String),
    /// Match against the stored email (only tried for email-like strings).
    Email(String),
}

/// Ordered resolution strategies for a raw identifier. Pure; the database
/// side lives in [`resolve_canonical_user`].
pub fn resolution_candidates(raw: &str) -> Vec<Lookup> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return vec![Lookup::Canonical(id)];
    }

    let mut candidates = vec![Lookup::OAuthId(raw.to_string())];
    if raw.contains('@') {
        candidates.push(Lookup::Email(raw.to_string()));
    }
    candidates
}

/// Resolve a raw identifier to a canonical user id, or `None` when no user
/// matches any strategy.
pub fn resolve_canonical_user(conn: &mut PgConnection, raw: &str) -> AppResult<Option<Uuid>> {
    for lookup in resolution_candidates(raw) {
        let resolved = match lookup {
            Lookup::Canonical(id) => Some(id),
            Lookup::OAuthId(value) => users::table
                .filter(users::google_id.eq(&value))
                .select(users::id)
                .first::<Uuid>(conn)
                .optional()?,
            Lookup::Email(value) => users::table
                .filter(users::email.eq(&value))
                .select(users::id)
                .first::<Uuid>(conn)
                .optional()?,
        };

        if resolved.is_some() {
            return Ok(resolved);
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_short_circuits() {
        let id = Uuid::new_v4();
        let candidates = resolution_candidates(&id.to_string());
        assert_eq!(candidates, vec![Lookup::Canonical(id)]);
    }

    #[test]
    fn opaque_string_tries_oauth_only() {
        let candidates = resolution_candidates("108427366241057692331");
        assert_eq!(
            candidates,
            vec![Lookup::OAuthId("108427366241057692331".to_string())]
        );
    }

    #[test]
    fn email_like_string_falls_back_to_email() {
        let candidates = resolution_candidates("ada@example.com");
        assert_eq!(
            candidates,
            vec![
                Lookup::OAuthId("ada@example.com".to_string()),
                Lookup::Email("ada@example.com".to_string()),
            ]
        );
    }
}
