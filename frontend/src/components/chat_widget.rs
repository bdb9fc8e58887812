use crate::components::icons::{MessageCircle, Send, XIcon};
use crate::context::use_app;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 对话面板：浮窗与 `/chat` 页面共用
#[component]
pub fn ChatPanel(#[prop(optional, into)] class: String) -> impl IntoView {
    let app = use_app();
    let log = app.chat_log();
    let messages = move || log.with(|(list, _)| list.clone());
    let waiting = move || log.with(|(_, busy)| *busy);
    let (input, set_input) = signal(String::new());

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let text = input.get_untracked();
        if text.trim().is_empty() {
            return;
        }
        set_input.set(String::new());
        let chat = app.chat();
        spawn_local(async move {
            chat.send(&text).await;
        });
    };

    view! {
        <div class=format!("flex flex-col {}", class)>
            <div class="flex-1 overflow-y-auto p-4 space-y-2">
                <For
                    each=move || messages().into_iter().enumerate()
                    key=|(i, _)| *i
                    children=move |(_, message)| {
                        let side = if message.is_user() { "chat chat-end" } else { "chat chat-start" };
                        let bubble = if message.is_user() {
                            "chat-bubble chat-bubble-primary"
                        } else {
                            "chat-bubble"
                        };
                        view! {
                            <div class=side>
                                <div class=bubble>{message.text}</div>
                            </div>
                        }
                    }
                />
                <Show when=waiting>
                    <div class="chat chat-start">
                        <div class="chat-bubble">
                            <span class="loading loading-dots loading-sm"></span>
                        </div>
                    </div>
                </Show>
            </div>
            <form class="p-4 border-t border-base-300 flex gap-2" on:submit=on_submit>
                <input
                    type="text"
                    class="input input-bordered flex-1"
                    placeholder="Type your message..."
                    prop:value=input
                    on:input=move |ev| set_input.set(event_target_value(&ev))
                />
                <button type="submit" class="btn btn-primary btn-square">
                    <Send attr:class="h-4 w-4" />
                </button>
            </form>
        </div>
    }
}

/// 仪表盘右下角的浮动助手
#[component]
pub fn ChatWidget() -> impl IntoView {
    let (open, set_open) = signal(false);

    view! {
        <Show
            when=move || open.get()
            fallback=move || view! {
                <button
                    class="btn btn-primary btn-circle btn-lg fixed bottom-6 right-6 shadow-lg z-50"
                    on:click=move |_| set_open.set(true)
                >
                    <MessageCircle attr:class="h-6 w-6" />
                </button>
            }
        >
            <div class="card bg-base-100 shadow-2xl fixed bottom-6 right-6 w-96 h-[500px] z-50">
                <div class="flex items-center justify-between p-4 border-b border-base-300">
                    <h3 class="font-semibold text-lg">"AI Health Assistant"</h3>
                    <button class="btn btn-ghost btn-sm btn-square" on:click=move |_| set_open.set(false)>
                        <XIcon attr:class="h-4 w-4" />
                    </button>
                </div>
                <ChatPanel class="flex-1 min-h-0" />
            </div>
        </Show>
    }
}
