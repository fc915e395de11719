//! Auth Panel Component
//!
//! Authentication entry point: email/password sign-in and sign-up plus a
//! GitHub OAuth button. Errors are shown inline.

use leptos::prelude::*;
use leptos::task::spawn_local;
use todo_core::repository::supabase::{OAuthProvider, SignUpOutcome};
use todo_core::DomainError;

use crate::browser;
use crate::context::use_app_context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthMode {
    fn submit_label(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign in",
            AuthMode::SignUp => "Sign up",
        }
    }
}

/// Inline feedback under the form
#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    Error(String),
    Info(String),
}

fn describe(err: &DomainError) -> String {
    match err {
        DomainError::Service { message, .. } => message.clone(),
        DomainError::Network(_) => "Could not reach the server".to_string(),
        other => other.to_string(),
    }
}

#[component]
pub fn AuthPanel() -> impl IntoView {
    let ctx = use_app_context();

    let (mode, set_mode) = signal(AuthMode::SignIn);
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (notice, set_notice) = signal::<Option<Notice>>(None);
    let (busy, set_busy) = signal(false);

    let submit_auth = ctx.auth();
    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let email = email.get_untracked().trim().to_string();
        let password = password.get_untracked();
        if email.is_empty() || password.is_empty() {
            set_notice.set(Some(Notice::Error("Email and password are required".to_string())));
            return;
        }

        let auth = submit_auth.clone();
        let current_mode = mode.get_untracked();
        set_busy.set(true);
        set_notice.set(None);
        spawn_local(async move {
            let result = match current_mode {
                AuthMode::SignIn => auth.sign_in_with_password(&email, &password).await.map(|_| None),
                AuthMode::SignUp => auth.sign_up(&email, &password).await.map(|outcome| match outcome {
                    SignUpOutcome::SignedIn(_) => None,
                    SignUpOutcome::ConfirmationSent(_) => Some(Notice::Info(format!(
                        "Check {} for the confirmation link",
                        email
                    ))),
                }),
            };
            // The panel may already be unmounted after a successful sign-in
            match result {
                Ok(info) => {
                    set_notice.try_set(info);
                }
                Err(err) => {
                    tracing::error!(error = %err, "authentication failed");
                    set_notice.try_set(Some(Notice::Error(describe(&err))));
                }
            }
            set_busy.try_set(false);
        });
    };

    let github_auth = ctx.auth();
    let on_github = move |_| {
        let redirect = browser::redirect_target();
        match github_auth.oauth_authorize_url(OAuthProvider::Github, redirect.as_deref()) {
            Ok(url) => browser::navigate(url.as_str()),
            Err(err) => {
                tracing::error!(error = %err, "failed to build OAuth URL");
                set_notice.set(Some(Notice::Error(describe(&err))));
            }
        }
    };

    let toggle_mode = move |_| {
        set_notice.set(None);
        set_mode.update(|m| {
            *m = match m {
                AuthMode::SignIn => AuthMode::SignUp,
                AuthMode::SignUp => AuthMode::SignIn,
            }
        });
    };

    view! {
        <section class="auth-panel">
            <h1>"Todo List"</h1>
            <form class="auth-form" on:submit=on_submit>
                <input
                    type="email"
                    placeholder="Email"
                    autocomplete="email"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
                <button type="submit" disabled=move || busy.get()>
                    {move || mode.get().submit_label()}
                </button>
            </form>

            {move || notice.get().map(|n| match n {
                Notice::Error(text) => view! { <p class="auth-error">{text}</p> }.into_any(),
                Notice::Info(text) => view! { <p class="auth-info">{text}</p> }.into_any(),
            })}

            <button class="link-btn" on:click=toggle_mode>
                {move || match mode.get() {
                    AuthMode::SignIn => "No account? Sign up",
                    AuthMode::SignUp => "Have an account? Sign in",
                }}
            </button>

            <div class="auth-divider">"or"</div>
            <button class="github-btn" on:click=on_github>"Sign in with GitHub"</button>
        </section>
    }
}
