pub mod db;
pub mod errors;
pub mod helpers;
pub mod kv;
pub mod query_params;
pub mod static_server;
