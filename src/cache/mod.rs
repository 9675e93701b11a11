pub mod credential;
pub mod token_refresher;
