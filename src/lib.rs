pub mod blink;
pub mod config;
pub mod constants;
pub mod detection;
pub mod dispatch;
pub mod extractors;
pub mod logging;
pub mod response;
pub mod routes;
pub mod source;
pub mod state;
pub mod validation;
