use crate::components::icons::{Activity, AlertCircle};
use crate::context::use_app;
use crate::error::AuthError;
use crate::session::validate_signup;
use crate::web::LocalStorage;
use crate::web::route::AppRoute;
use crate::web::router::{Link, use_router};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
fn Field(
    id: &'static str,
    label: &'static str,
    kind: &'static str,
    placeholder: &'static str,
    value: ReadSignal<String>,
    set_value: WriteSignal<String>,
) -> impl IntoView {
    view! {
        <div class="form-control">
            <label class="label" for=id>
                <span class="label-text">{label}</span>
            </label>
            <input
                id=id
                type=kind
                placeholder=placeholder
                on:input=move |ev| set_value.set(event_target_value(&ev))
                prop:value=value
                class="input input-bordered"
            />
        </div>
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let app = use_app();
    let auth_ready = app.config().firebase_api_key.is_some();
    let router = use_router();

    let (name, set_name) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (confirm, set_confirm) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        set_error_msg.set(None);
        let name = name.get_untracked();
        let email = email.get_untracked();
        let password = password.get_untracked();
        if let Err(e) = validate_signup(&name, &email, &password, &confirm.get_untracked()) {
            set_error_msg.set(Some(e.to_string()));
            return;
        }

        set_is_submitting.set(true);
        let sessions = app.sessions();
        spawn_local(async move {
            match sessions.signup(&email, &password, &name).await {
                Ok(_) => {
                    LocalStorage::remember_email(email.trim());
                    app.notifier.success("Account created successfully!");
                    router.go(AppRoute::Dashboard);
                }
                Err(e) => {
                    log::warn!("[Register] {}", e);
                    set_error_msg.set(Some(e.to_string()));
                }
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <div class="hero min-h-[calc(100vh-4rem)] bg-base-200">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4 flex flex-col items-center gap-2">
                    <div class="p-3 bg-primary/10 rounded-2xl text-primary">
                        <Activity attr:class="h-8 w-8" />
                    </div>
                    <h1 class="text-3xl font-bold">"Create Account"</h1>
                    <p class="text-base-content/70">"Start monitoring your health with AI"</p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <Show when=move || !auth_ready>
                            <div role="alert" class="alert alert-warning text-sm py-2">
                                <AlertCircle attr:class="h-5 w-5" />
                                <span>{AuthError::NotConfigured.to_string()}</span>
                            </div>
                        </Show>
                        <Show when=move || error_msg.get().is_some()>
                            <div role="alert" class="alert alert-error text-sm py-2">
                                <AlertCircle attr:class="h-5 w-5" />
                                <span>{move || error_msg.get().unwrap_or_default()}</span>
                            </div>
                        </Show>

                        <Field id="name" label="Full Name" kind="text" placeholder="John Doe" value=name set_value=set_name />
                        <Field id="email" label="Email" kind="email" placeholder="you@example.com" value=email set_value=set_email />
                        <Field id="password" label="Password" kind="password" placeholder="••••••••" value=password set_value=set_password />
                        <Field id="confirm" label="Confirm Password" kind="password" placeholder="••••••••" value=confirm set_value=set_confirm />

                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Creating account..." }.into_any()
                                } else {
                                    "Sign Up".into_any()
                                }}
                            </button>
                        </div>
                        <p class="text-center text-sm mt-2">
                            "Already have an account? "
                            <Link to=AppRoute::Login class="link link-primary">"Login"</Link>
                        </p>
                    </form>
                </div>
            </div>
        </div>
    }
}
