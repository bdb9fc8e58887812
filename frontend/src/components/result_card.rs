use crate::components::icons::{AlertCircle, CheckCircle};
use crate::scan::{ConfidenceTier, severity_badge_class, severity_label};
use leptos::prelude::*;
use medisight_shared::ScanResult;

#[component]
pub fn ResultCard(result: ScanResult) -> impl IntoView {
    let tier = ConfidenceTier::of(result.confidence);
    let badge = format!("badge badge-outline {}", severity_badge_class(result.severity));
    let confidence_class = format!("text-3xl font-bold {}", tier.text_class());

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body space-y-4">
                <div class="flex items-start justify-between">
                    <div>
                        <h2 class="card-title text-2xl">{result.disease_name.clone()}</h2>
                        <p class="text-base-content/60">"AI Detection Results"</p>
                    </div>
                    <span class=badge>{severity_label(result.severity)}</span>
                </div>

                {result.image_url.clone().map(|url| view! {
                    <div class="rounded-lg overflow-hidden">
                        <img src=url alt="Scan" class="w-full h-48 object-cover" />
                    </div>
                })}

                <div class="flex items-center justify-between p-4 bg-base-200 rounded-lg">
                    <div>
                        <p class="text-sm text-base-content/60 mb-1">"Confidence Level"</p>
                        <p class=confidence_class>{format!("{}%", result.confidence)}</p>
                    </div>
                    {if tier == ConfidenceTier::High {
                        view! { <CheckCircle attr:class="h-12 w-12 text-success" /> }.into_any()
                    } else {
                        view! { <AlertCircle attr:class="h-12 w-12 text-warning" /> }.into_any()
                    }}
                </div>

                <div>
                    <h3 class="font-semibold mb-3 flex items-center gap-2">
                        <AlertCircle attr:class="h-4 w-4" />
                        "Recommendations"
                    </h3>
                    <ul class="space-y-2">
                        {result
                            .recommendations
                            .iter()
                            .map(|rec| view! {
                                <li class="flex items-start gap-2 text-sm">
                                    <span class="text-primary">"•"</span>
                                    <span>{rec.clone()}</span>
                                </li>
                            })
                            .collect_view()}
                    </ul>
                </div>

                <div role="alert" class="alert text-sm">
                    <AlertCircle attr:class="h-4 w-4" />
                    <span>
                        "This is an AI-assisted screening result, not a medical diagnosis. Please consult a healthcare professional."
                    </span>
                </div>
            </div>
        </div>
    }
}
