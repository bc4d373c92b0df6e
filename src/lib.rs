#[cfg(target_arch = "wasm32")]
use spin_sdk::{
    http::{IntoResponse, Request},
    http_component,
};

pub mod auth;
pub mod config;
pub mod core;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod posts;
pub mod templates;

// === Component entrypoint ===
#[cfg(target_arch = "wasm32")]
#[http_component]
fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
    let store = crate::core::helpers::store()?;
    if config::seed_demo_data() {
        crate::core::db::seed_demo_data(&store)?;
    }
    Ok(handlers::route(&store, req))
}
