use crate::components::icons::{
    CalendarIcon, EyeIcon, HistoryIcon, MapPin, MessageCircle, ScanIcon,
};
use crate::context::use_app;
use crate::web::route::AppRoute;
use crate::web::router::Link;
use leptos::prelude::*;

const STEPS: [(&str, &str); 3] = [
    (
        "Upload or Capture Image",
        "Take a photo using your device camera or upload an existing image of the affected area.",
    ),
    (
        "AI Analysis",
        "Our advanced AI model analyzes the image and detects potential diseases with high accuracy.",
    ),
    (
        "Get Results & Recommendations",
        "Receive instant results with confidence levels and personalized recommendations for next steps.",
    ),
];

#[component]
fn Feature(title: &'static str, description: &'static str, children: Children) -> impl IntoView {
    view! {
        <div class="card bg-base-100 shadow-md hover:shadow-xl transition-shadow">
            <div class="card-body">
                <div class="p-3 bg-primary/10 rounded-xl text-primary w-fit">{children()}</div>
                <h3 class="card-title">{title}</h3>
                <p class="text-base-content/70">{description}</p>
            </div>
        </div>
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let session = use_app().session();
    let signed_in = move || session.get().current.is_some();

    let cta = move || {
        if signed_in() {
            view! { <Link to=AppRoute::Dashboard class="btn btn-primary btn-lg">"Go to Dashboard"</Link> }
                .into_any()
        } else {
            view! {
                <Link to=AppRoute::Register class="btn btn-primary btn-lg">"Get Started"</Link>
                <Link to=AppRoute::Login class="btn btn-outline btn-lg">"Login"</Link>
            }
            .into_any()
        }
    };

    view! {
        <div>
            <section class="hero py-20 bg-gradient-to-br from-primary/10 to-base-100">
                <div class="hero-content text-center max-w-4xl">
                    <div>
                        <h1 class="text-4xl md:text-6xl font-bold mb-6 text-primary">"AI Health Scanner"</h1>
                        <p class="text-xl text-base-content/70 mb-8">
                            "Advanced AI-powered skin and eye disease detection system for early diagnosis and better health outcomes"
                        </p>
                        <div class="flex flex-col sm:flex-row gap-4 justify-center">{cta}</div>
                    </div>
                </div>
            </section>

            <section class="py-16 px-4 max-w-6xl mx-auto">
                <h2 class="text-3xl font-bold text-center mb-12">"Our Features"</h2>
                <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6">
                    <Feature title="Skin Scanner" description="AI-powered skin disease detection from images">
                        <ScanIcon attr:class="h-6 w-6" />
                    </Feature>
                    <Feature title="Eye Scanner" description="Advanced eye disease screening technology">
                        <EyeIcon attr:class="h-6 w-6" />
                    </Feature>
                    <Feature title="Appointments" description="Book consultations with healthcare professionals">
                        <CalendarIcon attr:class="h-6 w-6" />
                    </Feature>
                    <Feature title="Find Clinics" description="Locate nearby healthcare facilities">
                        <MapPin attr:class="h-6 w-6" />
                    </Feature>
                    <Feature title="AI Chatbot" description="Get instant health advice from our AI assistant">
                        <MessageCircle attr:class="h-6 w-6" />
                    </Feature>
                    <Feature title="Scan History" description="View all your past scans and results">
                        <HistoryIcon attr:class="h-6 w-6" />
                    </Feature>
                </div>
            </section>

            <section class="py-16 px-4 bg-base-200">
                <div class="max-w-3xl mx-auto">
                    <h2 class="text-3xl font-bold text-center mb-12">"How It Works"</h2>
                    <ul class="steps steps-vertical w-full">
                        {STEPS
                            .iter()
                            .map(|(title, text)| view! {
                                <li class="step step-primary text-left">
                                    <div class="ml-4 py-4">
                                        <h3 class="font-semibold text-lg mb-1">{*title}</h3>
                                        <p class="text-base-content/70">{*text}</p>
                                    </div>
                                </li>
                            })
                            .collect_view()}
                    </ul>
                </div>
            </section>

            <section class="py-16 px-4 text-center">
                <h2 class="text-3xl font-bold mb-4">"Ready to Get Started?"</h2>
                <p class="text-base-content/70 mb-8">
                    "Join thousands of users who trust AI Health Scanner for early disease detection"
                </p>
                <Show when=move || !signed_in()>
                    <Link to=AppRoute::Register class="btn btn-primary btn-lg">"Create Free Account"</Link>
                </Show>
            </section>
        </div>
    }
}
