//! Supabase Todo Frontend App
//!
//! Resolves who is signed in and switches between the auth panel and the
//! signed-in user's task list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;
use todo_core::repository::supabase::{SupabaseAuth, SupabaseClient};
use todo_core::{AuthState, SessionManager};

use crate::browser;
use crate::components::{AuthPanel, TodoListView};
use crate::context::AppContext;
use crate::store::{store_set_auth, AppState, AppStateStoreFields};

/// How often the session is checked for an upcoming expiry
const AUTO_REFRESH_TICK_MS: u32 = 30_000;

#[component]
pub fn App(client: SupabaseClient) -> impl IntoView {
    let store = Store::new(AppState::default());
    provide_context(store);
    provide_context(AppContext::new(client.clone()));

    let manager = Arc::new(SessionManager::new(client.identity(), move |auth: &AuthState| {
        store_set_auth(&store, auth.clone());
    }));

    // Finish an OAuth redirect first, then ask for the current session
    {
        let manager = Arc::clone(&manager);
        let auth = Arc::clone(client.auth());
        spawn_local(async move {
            complete_oauth_redirect(&auth).await;
            manager.resolve_initial().await;
        });
    }

    let refreshing = Arc::new(AtomicBool::new(true));
    spawn_local(auto_refresh(Arc::clone(client.auth()), Arc::clone(&refreshing)));

    on_cleanup(move || {
        refreshing.store(false, Ordering::Relaxed);
        manager.shutdown();
    });

    view! {
        <main class="app-layout">
            {move || match store.auth().get() {
                AuthState::Authenticated(user) => {
                    view! { <TodoListView user_id=user.id email=user.email /> }.into_any()
                }
                AuthState::Unauthenticated => view! { <AuthPanel /> }.into_any(),
                AuthState::Unknown => {
                    view! { <div class="loading">"Loading..."</div> }.into_any()
                }
            }}
        </main>
    }
}

async fn complete_oauth_redirect(auth: &SupabaseAuth) {
    let Some(fragment) = browser::location_hash() else {
        return;
    };
    match auth.session_from_url_fragment(&fragment).await {
        Ok(Some(_)) => browser::clear_location_hash(),
        Ok(None) => {}
        Err(err) => {
            tracing::error!(error = %err, "OAuth sign-in failed");
            browser::clear_location_hash();
        }
    }
}

async fn auto_refresh(auth: Arc<SupabaseAuth>, running: Arc<AtomicBool>) {
    loop {
        TimeoutFuture::new(AUTO_REFRESH_TICK_MS).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
        if let Err(err) = auth.refresh_if_expiring().await {
            tracing::warn!(error = %err, "session refresh failed");
        }
    }
    tracing::debug!("auto-refresh stopped");
}
