pub mod classification;
pub mod endpoint;
pub mod observation;
pub mod price_probe;
pub mod query;
