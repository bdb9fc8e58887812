use crate::components::icons::{CalendarIcon, UserIcon};
use crate::context::use_app;
use crate::session::validate_display_name;
use leptos::prelude::*;
use leptos::task::spawn_local;
use medisight_shared::UserStats;

#[component]
fn StatTile(label: &'static str, value: Signal<Option<u32>>) -> impl IntoView {
    view! {
        <div class="text-center p-4 bg-base-200 rounded-lg">
            <p class="text-sm text-base-content/60 mb-1">{label}</p>
            <p class="text-3xl font-bold text-primary">
                {move || value.get().map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())}
            </p>
        </div>
    }
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let app = use_app();
    let session = app.session();
    let current = move || session.with(|s| s.current.clone());

    let (is_editing, set_is_editing) = signal(false);
    let (is_saving, set_is_saving) = signal(false);
    let (draft, set_draft) = signal(String::new());
    let (stats, set_stats) = signal(Option::<UserStats>::None);

    if let Some(uid) = app.uid() {
        let api = app.api();
        spawn_local(async move {
            match api.user_stats(&uid).await {
                Ok(s) => {
                    let _ = set_stats.try_set(Some(s));
                }
                Err(e) => log::error!("[Profile] {}", e),
            }
        });
    }

    let start_edit = move |_| {
        set_draft.set(current().map(|s| s.name()).unwrap_or_default());
        set_is_editing.set(true);
    };

    let save = move |_| {
        let name = draft.get_untracked();
        if let Err(e) = validate_display_name(&name) {
            app.notifier.error(e.to_string());
            return;
        }
        if current().is_some_and(|s| s.name() == name.trim()) {
            app.notifier.info("No changes to save");
            set_is_editing.set(false);
            return;
        }
        set_is_saving.set(true);
        let sessions = app.sessions();
        spawn_local(async move {
            match sessions.update_display_name(&name).await {
                Ok(_) => {
                    app.notifier.success("Profile updated successfully!");
                    let _ = set_is_editing.try_set(false);
                }
                Err(e) => {
                    log::warn!("[Profile] {}", e);
                    app.notifier.error(e.to_string());
                }
            }
            let _ = set_is_saving.try_set(false);
        });
    };

    let stat = move |f: fn(&UserStats) -> u32| -> Signal<Option<u32>> {
        Signal::derive(move || stats.with(|s| s.as_ref().map(f)))
    };

    view! {
        <div class="max-w-3xl mx-auto p-4 md:p-8 space-y-6">
            <div>
                <h1 class="text-3xl font-bold">"Profile Settings"</h1>
                <p class="text-base-content/70">"Manage your account information"</p>
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body space-y-4">
                    <div>
                        <h2 class="card-title">"Personal Information"</h2>
                        <p class="text-sm text-base-content/60">"Update your profile details"</p>
                    </div>

                    <div class="flex items-center gap-4">
                        <div class="avatar placeholder">
                            <div class="bg-primary text-primary-content rounded-full w-20">
                                <span class="text-2xl">
                                    {move || current().map(|s| s.initials()).unwrap_or_default()}
                                </span>
                            </div>
                        </div>
                        <div>
                            <p class="text-xl font-semibold">
                                {move || current().map(|s| s.name()).unwrap_or_default()}
                            </p>
                            <p class="text-base-content/60">
                                {move || current().map(|s| s.email).unwrap_or_default()}
                            </p>
                        </div>
                    </div>

                    <div class="form-control">
                        <label class="label" for="display-name">
                            <span class="label-text flex items-center gap-2">
                                <UserIcon attr:class="h-4 w-4" />
                                "Display Name"
                            </span>
                        </label>
                        <Show
                            when=move || is_editing.get()
                            fallback=move || view! {
                                <div class="flex gap-2">
                                    <input
                                        class="input input-bordered flex-1"
                                        disabled=true
                                        prop:value=move || current().map(|s| s.name()).unwrap_or_default()
                                    />
                                    <button class="btn btn-outline" on:click=start_edit>"Edit"</button>
                                </div>
                            }
                        >
                            <div class="flex gap-2">
                                <input
                                    id="display-name"
                                    class="input input-bordered flex-1"
                                    prop:value=draft
                                    on:input=move |ev| set_draft.set(event_target_value(&ev))
                                />
                                <button class="btn btn-primary" disabled=move || is_saving.get() on:click=save>
                                    "Save"
                                </button>
                                <button class="btn btn-ghost" on:click=move |_| set_is_editing.set(false)>
                                    "Cancel"
                                </button>
                            </div>
                        </Show>
                    </div>

                    <div class="flex items-center gap-2 text-sm text-base-content/70">
                        <CalendarIcon attr:class="h-4 w-4" />
                        <span>"Member since "</span>
                        <span>{move || current().map(|s| s.member_since()).unwrap_or_default()}</span>
                    </div>
                </div>
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body">
                    <h2 class="card-title">"Account Statistics"</h2>
                    <p class="text-sm text-base-content/60">"Your activity summary"</p>
                    <div class="grid grid-cols-3 gap-4 mt-2">
                        <StatTile label="Total Scans" value=stat(|s| s.total_scans) />
                        <StatTile label="Skin Scans" value=stat(|s| s.skin_scans) />
                        <StatTile label="Eye Scans" value=stat(|s| s.eye_scans) />
                    </div>
                </div>
            </div>
        </div>
    }
}
