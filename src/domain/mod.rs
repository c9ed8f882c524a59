pub mod account;
pub mod draft;
pub mod platform;
pub mod post;
