use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{blocks, likes, matches, messages, users};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub google_id: Option<String>,
    pub display_name: String,
    pub age: i32,
    pub gender: String,
    pub interested_in: String,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub photos: Vec<String>,
    pub is_online: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// What other users are allowed to see of a profile.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub display_name: String,
    pub age: i32,
    pub city: Option<String>,
    pub photos: Vec<String>,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            age: user.age,
            city: user.city.clone(),
            photos: user.photos.clone(),
        }
    }
}

/// Minimal projection attached to delivered messages: name + primary photo.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserBrief {
    pub id: Uuid,
    pub display_name: String,
    pub photo: Option<String>,
}

impl From<&User> for UserBrief {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            photo: user.photos.first().cloned(),
        }
    }
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub liker_id: Uuid,
    pub liked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub liker_id: Uuid,
    pub liked_id: Uuid,
}

// --- Match ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
pub struct Match {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Always stored canonically: `user_a < user_b`.
#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub user_a: Uuid,
    pub user_b: Uuid,
}

// --- Block ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = blocks)]
pub struct Block {
    pub id: Uuid,
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = blocks)]
pub struct NewBlock {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

/// A stored message with its sender/receiver references expanded into the
/// public projection (read-side join, same shape over REST and the socket).
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub sender: UserBrief,
    pub receiver: UserBrief,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn expand(message: &Message, sender: &User, receiver: &User) -> Self {
        Self {
            id: message.id,
            sender: UserBrief::from(sender),
            receiver: UserBrief::from(receiver),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, photos: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{name}@example.com"),
            google_id: None,
            display_name: name.to_string(),
            age: 30,
            gender: "other".into(),
            interested_in: "all".into(),
            bio: None,
            city: Some("Berlin".into()),
            country: Some("Germany".into()),
            photos: photos.iter().map(|p| p.to_string()).collect(),
            is_online: false,
            last_active: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn brief_takes_primary_photo() {
        let u = user("ada", &["first.jpg", "second.jpg"]);
        let brief = UserBrief::from(&u);
        assert_eq!(brief.photo.as_deref(), Some("first.jpg"));

        let bare = user("bob", &[]);
        assert_eq!(UserBrief::from(&bare).photo, None);
    }

    #[test]
    fn message_view_serializes_camel_case() {
        let sender = user("ada", &["a.jpg"]);
        let receiver = user("bob", &[]);
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: sender.id,
            receiver_id: receiver.id,
            content: "hi".into(),
            created_at: Utc::now(),
        };

        let view = MessageView::expand(&message, &sender, &receiver);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["content"], "hi");
        assert_eq!(json["sender"]["displayName"], "ada");
        assert_eq!(json["receiver"]["displayName"], "bob");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn public_profile_hides_private_fields() {
        let u = user("ada", &["a.jpg"]);
        let json = serde_json::to_value(PublicProfile::from(&u)).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("googleId").is_none());
        assert_eq!(json["displayName"], "ada");
    }
}
