pub mod account;
pub mod blocks;
pub mod health;
pub mod likes;
pub mod messages;
