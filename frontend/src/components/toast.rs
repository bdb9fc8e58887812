use crate::context::use_app;
use leptos::prelude::*;

/// 全局通知，由 `Notifier` 驱动
#[component]
pub fn ToastHost() -> impl IntoView {
    let notifier = use_app().notifier;
    let toast = notifier.current();

    view! {
        <Show when=move || toast.get().is_some()>
            <div class="toast toast-top toast-end z-50">
                {move || toast.get().map(|t| view! {
                    <div class=t.kind.alert_class() on:click=move |_| notifier.dismiss()>
                        <span>{t.message}</span>
                    </div>
                })}
            </div>
        </Show>
    }
}
