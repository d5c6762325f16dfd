pub mod device;
pub mod event;
pub mod event_activity;
pub mod event_judge;
pub mod event_media;
pub mod event_participation;
pub mod notification_history;
pub mod participation_member;
pub mod score;
pub mod user;
