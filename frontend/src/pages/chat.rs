use crate::components::chat_widget::ChatPanel;
use crate::components::icons::MessageCircle;
use leptos::prelude::*;

#[component]
pub fn ChatPage() -> impl IntoView {
    view! {
        <div class="max-w-3xl mx-auto p-4 md:p-8 space-y-6">
            <div>
                <h1 class="text-3xl font-bold flex items-center gap-3">
                    <MessageCircle attr:class="h-8 w-8 text-primary" />
                    "AI Health Assistant"
                </h1>
                <p class="text-base-content/70">
                    "Ask general health questions. Answers are informational and not a diagnosis."
                </p>
            </div>
            <div class="card bg-base-100 shadow-xl h-[600px]">
                <ChatPanel class="h-full" />
            </div>
        </div>
    }
}
