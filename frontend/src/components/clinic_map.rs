use crate::context::{Api, use_app};
use crate::clinics::ClinicDiscovery;
use crate::web::{BrowserGeolocator, GoogleMap, load_google_maps};
use leptos::html::Div;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;

pub type Discovery = ClinicDiscovery<BrowserGeolocator, Rc<Api>, GoogleMap>;

/// 地图容器：挂载后加载 SDK 并把地图交给发现流程
#[component]
pub fn ClinicMap(
    discovery: StoredValue<Discovery, LocalStorage>,
    /// 地图初始化失败时的提示
    map_error: Signal<Option<String>>,
) -> impl IntoView {
    let config = use_app().config();
    let container = NodeRef::<Div>::new();

    Effect::new(move |_| {
        let Some(element) = container.get() else {
            return;
        };
        let discovery = discovery.get_value();
        if discovery.has_map() {
            return;
        }
        let config = config.clone();
        spawn_local(async move {
            let loaded =
                load_google_maps(config.maps_api_key.as_deref(), config.maps_map_id.as_deref())
                    .await;
            let map = loaded.and_then(|()| {
                let center = discovery
                    .view()
                    .location
                    .unwrap_or(config.default_location);
                GoogleMap::new(&element, center, config.maps_map_id.as_deref())
            });
            match map {
                Ok(map) => discovery.attach_map(map),
                Err(err) => discovery.map_unavailable(err),
            }
        });
    });

    view! {
        <div class="relative w-full h-[500px] rounded-lg overflow-hidden bg-base-200">
            <div node_ref=container class="w-full h-full"></div>
            <Show when=move || map_error.get().is_some()>
                <div class="absolute inset-0 flex items-center justify-center p-6">
                    <div role="alert" class="alert alert-warning">
                        <span>{move || map_error.get().unwrap_or_default()}</span>
                    </div>
                </div>
            </Show>
        </div>
    }
}
