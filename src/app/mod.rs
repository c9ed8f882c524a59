pub mod accounts;
pub mod auth;
pub mod calendar;
pub mod media;
pub mod posts;
pub mod validation;
