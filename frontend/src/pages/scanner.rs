use crate::api::ImagePayload;
use crate::components::icons::{AlertCircle, EyeIcon, ScanIcon};
use crate::components::image_upload::ImageUpload;
use crate::context::use_app;
use crate::scan::{ANALYSIS_COMPLETE_MESSAGE, NO_IMAGE_MESSAGE, ScanRequest, run_scan};
use crate::upload::ImageSource;
use crate::web::route::AppRoute;
use crate::web::router::use_router;
use crate::web::{BrowserFile, sleep};
use leptos::prelude::*;
use leptos::task::spawn_local;
use medisight_shared::ScanModality;

#[derive(Clone, Copy)]
struct ScannerCopy {
    title: &'static str,
    subtitle: &'static str,
    guidance: &'static str,
    tips: &'static [&'static str],
    action: &'static str,
    busy: &'static str,
}

fn copy_for(modality: ScanModality) -> ScannerCopy {
    match modality {
        ScanModality::Skin => ScannerCopy {
            title: "Skin Disease Scanner",
            subtitle: "Upload or capture an image of your skin condition for AI-powered analysis",
            guidance: "For best results, follow these guidelines",
            tips: &[
                "Ensure good lighting when taking the photo",
                "Focus clearly on the affected area",
                "Keep a distance of 15-20 cm from the skin",
                "Avoid shadows and reflections",
                "Use a plain background if possible",
            ],
            action: "Analyze Image",
            busy: "Analyzing Image...",
        },
        ScanModality::Eye => ScannerCopy {
            title: "Eye Disease Scanner",
            subtitle: "Upload or capture a clear image of your eye for AI-powered screening",
            guidance: "For accurate eye analysis, please follow these steps",
            tips: &[
                "Use bright, even lighting to capture the eye clearly",
                "Keep your eye wide open and look directly at the camera",
                "Ensure the entire eye is in frame and in focus",
                "Avoid glare or reflections from the camera flash",
                "Take the photo from a distance of about 10-15 cm",
                "Remove glasses or contact lenses before capturing",
            ],
            action: "Analyze Eye Image",
            busy: "Analyzing Eye Image...",
        },
    }
}

async fn payload_of(file: &BrowserFile) -> Result<ImagePayload, String> {
    let bytes = file.bytes().await.map_err(|e| e.to_string())?;
    Ok(ImagePayload {
        file_name: file.name(),
        content_type: file.mime_type(),
        bytes,
    })
}

/// 皮肤 / 眼部扫描页
#[component]
pub fn ScannerPage(modality: ScanModality) -> impl IntoView {
    let app = use_app();
    let router = use_router();
    let copy = copy_for(modality);
    let max_size_mb = app.config().max_upload_mb;

    let selected = RwSignal::new_local(Option::<BrowserFile>::None);
    let (is_analyzing, set_is_analyzing) = signal(false);

    let analyze = move |_| {
        let Some(file) = selected.get_untracked() else {
            app.notifier.error(NO_IMAGE_MESSAGE);
            return;
        };
        set_is_analyzing.set(true);
        let api = app.api();
        let sessions = app.sessions();
        spawn_local(async move {
            let image = match payload_of(&file).await {
                Ok(image) => image,
                Err(e) => {
                    log::error!("[Scanner] {}", e);
                    app.notifier.error(e);
                    let _ = set_is_analyzing.try_set(false);
                    return;
                }
            };
            let request = ScanRequest {
                modality,
                image,
                image_url: file.data_url().await.ok(),
                token: sessions.id_token().await,
            };

            let outcome = run_scan(&*api, request, |w| app.notifier.warning(w), sleep).await;
            if !outcome.is_demo() {
                app.notifier.success(ANALYSIS_COMPLETE_MESSAGE);
            }
            app.last_scan.set(Some(outcome.into_result()));
            let _ = set_is_analyzing.try_set(false);
            router.go(AppRoute::Result);
        });
    };

    view! {
        <div class="max-w-3xl mx-auto p-4 md:p-8 space-y-6">
            <div>
                <h1 class="text-3xl font-bold flex items-center gap-3">
                    {match modality {
                        ScanModality::Skin => view! { <ScanIcon attr:class="h-8 w-8 text-primary" /> }.into_any(),
                        ScanModality::Eye => view! { <EyeIcon attr:class="h-8 w-8 text-primary" /> }.into_any(),
                    }}
                    {copy.title}
                </h1>
                <p class="text-base-content/70 mt-2">{copy.subtitle}</p>
            </div>

            <ImageUpload
                max_size_mb=max_size_mb
                on_select=move |file: BrowserFile| selected.set(Some(file))
                on_clear=move |()| selected.set(None)
            />

            <div class="card bg-base-100 shadow">
                <div class="card-body">
                    <h2 class="card-title">"Instructions"</h2>
                    <p class="text-sm text-base-content/60">{copy.guidance}</p>
                    <ul class="list-disc list-inside space-y-1 text-sm">
                        {copy.tips.iter().map(|tip| view! { <li>{*tip}</li> }).collect_view()}
                    </ul>
                </div>
            </div>

            <button
                class="btn btn-primary btn-lg w-full"
                disabled=move || selected.with(Option::is_none) || is_analyzing.get()
                on:click=analyze
            >
                {move || if is_analyzing.get() {
                    view! { <span class="loading loading-spinner"></span> {copy.busy} }.into_any()
                } else {
                    copy.action.into_any()
                }}
            </button>

            <div role="alert" class="alert alert-warning text-xs">
                <AlertCircle attr:class="h-4 w-4" />
                <span>
                    <strong>"Medical Disclaimer: "</strong>
                    "This AI tool is for informational purposes only and should not replace professional medical advice. Always consult with a qualified healthcare provider for accurate diagnosis and treatment."
                </span>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_modality_has_its_own_guidance() {
        let skin = copy_for(ScanModality::Skin);
        let eye = copy_for(ScanModality::Eye);
        assert_eq!(skin.tips.len(), 5);
        assert_eq!(eye.tips.len(), 6);
        assert_eq!(skin.action, "Analyze Image");
        assert!(eye.tips.iter().any(|t| t.contains("glasses")));
    }
}
