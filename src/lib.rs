pub mod banner;
pub mod config;
pub mod consts;
pub mod response;
pub mod server;
pub mod validate;
pub mod worker;
