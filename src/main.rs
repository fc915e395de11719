//! Supabase Todo Frontend Entry Point

mod app;
mod browser;
mod components;
mod context;
mod store;

use std::sync::Arc;

use app::App;
use browser::LocalStorageSessionStore;
use leptos::prelude::*;
use todo_core::repository::supabase::SupabaseClient;
use todo_core::SupabaseConfig;

fn main() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_logger::init_logger("supabase-todo", tracing::Level::INFO) {
        web_sys::console::warn_1(&err.to_string().into());
    }

    // Endpoint and anon key are baked in at build time
    let config = SupabaseConfig::new(
        option_env!("SUPABASE_URL").unwrap_or_default(),
        option_env!("SUPABASE_ANON_KEY").unwrap_or_default(),
    );

    match config {
        Ok(config) => {
            let sessions = Arc::new(LocalStorageSessionStore::new(config.storage_key()));
            let client = SupabaseClient::new(config, sessions);
            mount_to_body(move || view! { <App client=client /> });
        }
        Err(err) => {
            tracing::error!(error = %err, "missing Supabase configuration");
            mount_to_body(move || {
                view! {
                    <div class="config-error">
                        <h1>"Configuration error"</h1>
                        <p>{err.to_string()}</p>
                        <p>"Build with SUPABASE_URL and SUPABASE_ANON_KEY set."</p>
                    </div>
                }
            });
        }
    }
}
