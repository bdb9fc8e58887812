use crate::web::route::AppRoute;
use crate::web::router::Link;
use leptos::prelude::*;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="hero min-h-[calc(100vh-4rem)]">
            <div class="hero-content text-center">
                <div>
                    <h1 class="text-6xl font-bold text-primary">"404"</h1>
                    <p class="text-xl text-base-content/70 my-6">"Page not found"</p>
                    <Link to=AppRoute::Home class="btn btn-primary">"Back to Home"</Link>
                </div>
            </div>
        </div>
    }
}
