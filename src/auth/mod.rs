pub mod fetch;
pub mod oauth2;
