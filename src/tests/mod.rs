mod common;
mod config_validation;
mod load_flow;
