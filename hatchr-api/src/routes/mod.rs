pub mod comments;
pub mod connections;
pub mod health;
pub mod notifications;
pub mod profile;
pub mod projects;
pub mod uploads;
pub mod users;
pub mod votes;
