use crate::components::icons::{Camera, UploadIcon, XIcon};
use crate::context::use_app;
use crate::upload::{ACCEPT_IMAGES, Selection, UploadWidget};
use crate::web::BrowserFile;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;

/// 图像选择：文件选择器与摄像头两个入口
#[component]
pub fn ImageUpload(
    /// 通过校验的文件
    #[prop(into)]
    on_select: Callback<BrowserFile>,
    #[prop(optional, into)] on_clear: Option<Callback<()>>,
    max_size_mb: u32,
) -> impl IntoView {
    let app = use_app();
    let (preview, set_preview) = signal(Option::<String>::None);
    let (generation, set_generation) = signal(0u32);
    let widget = StoredValue::new_local(Rc::new(UploadWidget::new(
        max_size_mb,
        move |file: BrowserFile| on_select.run(file),
    )));

    let handle_change = move |ev: leptos::ev::Event| {
        let Some(file) = BrowserFile::from_event(&ev) else {
            return;
        };
        let widget = widget.get_value();
        spawn_local(async move {
            match widget.select_image(file).await {
                Ok(Selection::Accepted) => {
                    let _ = set_preview.try_set(widget.preview());
                    app.notifier.success("Image selected successfully");
                }
                Ok(Selection::Superseded) => {}
                Err(e) => app.notifier.error(e.to_string()),
            }
        });
    };

    let clear = move |_| {
        let widget = widget.get_value();
        widget.clear();
        set_preview.set(None);
        set_generation.set(widget.input_generation());
        if let Some(on_clear) = on_clear {
            on_clear.run(());
        }
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                {move || match preview.get() {
                    Some(url) => view! {
                        <div class="relative">
                            <img src=url alt="Selected" class="w-full h-64 object-cover rounded-lg" />
                            <button
                                class="btn btn-circle btn-sm btn-error absolute top-2 right-2"
                                on:click=clear
                            >
                                <XIcon attr:class="h-4 w-4" />
                            </button>
                        </div>
                    }
                    .into_any(),
                    None => view! {
                        <div class="border-2 border-dashed border-base-300 rounded-lg p-10 text-center space-y-2">
                            <UploadIcon attr:class="h-12 w-12 mx-auto text-base-content/40" />
                            <p class="font-medium">"Upload an image or capture from camera"</p>
                            <p class="text-sm text-base-content/60">
                                {format!("Supports JPG, PNG. Max size {}MB", max_size_mb)}
                            </p>
                        </div>
                    }
                    .into_any(),
                }}

                // 代号变化时重建输入框，允许再次选择同一文件
                {move || {
                    let _ = generation.get();
                    view! {
                        <div class="grid grid-cols-2 gap-3 mt-4">
                            <label class="btn btn-outline gap-2">
                                <UploadIcon attr:class="h-4 w-4" />
                                "Upload Image"
                                <input
                                    type="file"
                                    class="hidden"
                                    accept=ACCEPT_IMAGES
                                    on:change=handle_change
                                />
                            </label>
                            <label class="btn btn-outline gap-2">
                                <Camera attr:class="h-4 w-4" />
                                "Take Photo"
                                <input
                                    type="file"
                                    class="hidden"
                                    accept=ACCEPT_IMAGES
                                    capture="environment"
                                    on:change=handle_change
                                />
                            </label>
                        </div>
                    }
                }}
            </div>
        </div>
    }
}
