pub mod comment_service;
pub mod connection_service;
pub mod notification_service;
pub mod profile_service;
pub mod project_service;
pub mod vote_service;
