pub mod activity;
pub mod auth;
pub mod event;
pub mod judge;
pub mod participation;
pub mod push;
pub mod score;
pub mod shared;
pub mod user;
