use crate::components::icons::{ChevronLeft, MapPin};
use crate::components::result_card::ResultCard;
use crate::context::use_app;
use crate::scan::sample_result;
use crate::web::route::AppRoute;
use crate::web::router::Link;
use leptos::prelude::*;
use medisight_shared::ScanModality;

fn scanner_route(modality: ScanModality) -> AppRoute {
    match modality {
        ScanModality::Skin => AppRoute::SkinScan,
        ScanModality::Eye => AppRoute::EyeScan,
    }
}

/// 扫描结果：没有交接的结果时展示示例数据
#[component]
pub fn ResultPage() -> impl IntoView {
    let result = use_app()
        .last_scan
        .get_untracked()
        .unwrap_or_else(sample_result);
    let back = scanner_route(result.scan_type);

    view! {
        <div class="max-w-3xl mx-auto p-4 md:p-8 space-y-6">
            <Link to=back class="btn btn-ghost gap-2">
                <ChevronLeft attr:class="h-4 w-4" />
                "Back to Scanner"
            </Link>

            <div>
                <h1 class="text-3xl font-bold">"Scan Results"</h1>
                <p class="text-base-content/70">"AI analysis complete - Review your results below"</p>
            </div>

            <ResultCard result=result />

            <div class="grid grid-cols-1 md:grid-cols-3 gap-4">
                <Link to=AppRoute::Appointments class="btn btn-primary btn-lg">"Book Appointment"</Link>
                <Link to=AppRoute::Clinics class="btn btn-outline btn-lg gap-2">
                    <MapPin attr:class="h-4 w-4" />
                    "Find Clinics"
                </Link>
                <Link to=AppRoute::History class="btn btn-outline btn-lg">"View History"</Link>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_link_follows_scan_type() {
        assert_eq!(scanner_route(ScanModality::Skin), AppRoute::SkinScan);
        assert_eq!(scanner_route(ScanModality::Eye), AppRoute::EyeScan);
    }
}
