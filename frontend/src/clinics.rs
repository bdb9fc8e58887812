//! 附近诊所发现流程
//!
//! 状态机：`Idle -> LocatingUser -> FetchingClinics -> Ready`，
//! `Error` 可从 `LocatingUser` 与 `FetchingClinics` 进入。
//!
//! - 定位只做一次，失败时回落到配置的默认坐标，不自动重试
//! - 每次请求附带递增的代号，只应用最近一次发出的请求的结果
//! - 进入 `Ready` 且地图已挂载时同步标记；地图晚于结果挂载时立即同步

use crate::api::MediSightApi;
use crate::error::{ApiError, GeolocationError, MapError};
use crate::request::HttpClient;
use medisight_shared::{Clinic, Coordinate};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub mod markers;

pub use markers::{MapSurface, MarkerKind, MarkerLayer, MarkerSpec};

#[cfg(test)]
mod tests;

pub const NO_RESULTS_NOTICE: &str = "No clinics found within the search radius.";
const SERVER_ERROR_MESSAGE: &str =
    "The clinic search service is temporarily unavailable. Please try again later.";
const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Please check your internet connection.";
const GENERIC_ERROR_MESSAGE: &str = "Failed to load nearby clinics. Please try again.";
const LOCATION_ERROR_MESSAGE: &str = "Unable to determine your location.";

// =========================================================
// 外部协作者
// =========================================================

#[async_trait::async_trait(?Send)]
pub trait Geolocator {
    /// 一次性定位
    async fn locate(&self) -> Result<Coordinate, GeolocationError>;
}

#[async_trait::async_trait(?Send)]
pub trait ClinicSource {
    async fn nearby(&self, at: Coordinate, radius_m: u32) -> Result<Vec<Clinic>, ApiError>;
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> ClinicSource for MediSightApi<C> {
    async fn nearby(&self, at: Coordinate, radius_m: u32) -> Result<Vec<Clinic>, ApiError> {
        self.nearby_clinics(at, radius_m).await
    }
}

#[async_trait::async_trait(?Send)]
impl<T: ClinicSource + ?Sized> ClinicSource for Rc<T> {
    async fn nearby(&self, at: Coordinate, radius_m: u32) -> Result<Vec<Clinic>, ApiError> {
        (**self).nearby(at, radius_m).await
    }
}

#[async_trait::async_trait(?Send)]
impl<T: Geolocator + ?Sized> Geolocator for Rc<T> {
    async fn locate(&self) -> Result<Coordinate, GeolocationError> {
        (**self).locate().await
    }
}

/// 请求失败时展示的文案：区分服务端错误、网络错误与其他错误
pub fn fetch_error_message(err: &ApiError) -> &'static str {
    if err.is_server_error() {
        SERVER_ERROR_MESSAGE
    } else if err.is_network() {
        NETWORK_ERROR_MESSAGE
    } else {
        GENERIC_ERROR_MESSAGE
    }
}

// =========================================================
// 视图状态
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryPhase {
    #[default]
    Idle,
    LocatingUser,
    FetchingClinics,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscoveryView {
    pub phase: DiscoveryPhase,
    pub location: Option<Coordinate>,
    /// 当前坐标来自默认值
    pub used_fallback: bool,
    pub clinics: Vec<Clinic>,
    pub notice: Option<String>,
    pub error: Option<String>,
    /// 地图初始化失败（持久提示，列表仍可用）
    pub map_error: Option<String>,
    pub selected: Option<usize>,
}

impl DiscoveryView {
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            DiscoveryPhase::LocatingUser | DiscoveryPhase::FetchingClinics
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoverySettings {
    pub default_location: Coordinate,
    pub radius_m: u32,
}

// =========================================================
// ClinicDiscovery
// =========================================================

type Watcher = Rc<dyn Fn(&DiscoveryView)>;

struct Inner<G, S, M: MapSurface> {
    geolocator: G,
    source: S,
    settings: DiscoverySettings,
    view: RefCell<DiscoveryView>,
    layer: RefCell<Option<MarkerLayer<M>>>,
    generation: Cell<u64>,
    watchers: RefCell<Vec<Watcher>>,
}

pub struct ClinicDiscovery<G, S, M: MapSurface> {
    inner: Rc<Inner<G, S, M>>,
}

impl<G, S, M: MapSurface> Clone for ClinicDiscovery<G, S, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<G, S, M> ClinicDiscovery<G, S, M>
where
    G: Geolocator + 'static,
    S: ClinicSource + 'static,
    M: MapSurface + 'static,
{
    pub fn new(geolocator: G, source: S, settings: DiscoverySettings) -> Self {
        Self {
            inner: Rc::new(Inner {
                geolocator,
                source,
                settings,
                view: RefCell::new(DiscoveryView::default()),
                layer: RefCell::new(None),
                generation: Cell::new(0),
                watchers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn view(&self) -> DiscoveryView {
        self.inner.view.borrow().clone()
    }

    /// 注册视图观察者，立即以当前视图调用一次
    pub fn watch(&self, watcher: impl Fn(&DiscoveryView) + 'static) {
        let watcher: Watcher = Rc::new(watcher);
        let snapshot = self.view();
        self.inner.watchers.borrow_mut().push(watcher.clone());
        watcher(&snapshot);
    }

    fn update(&self, f: impl FnOnce(&mut DiscoveryView)) {
        Self::update_inner(&self.inner, f);
    }

    fn update_inner(inner: &Inner<G, S, M>, f: impl FnOnce(&mut DiscoveryView)) {
        let snapshot = {
            let mut view = inner.view.borrow_mut();
            f(&mut view);
            view.clone()
        };
        let watchers: Vec<Watcher> = inner.watchers.borrow().clone();
        for watcher in watchers {
            watcher(&snapshot);
        }
    }

    // =========================================================
    // 流程
    // =========================================================

    /// 页面挂载：仅从 `Idle` 启动一次
    pub async fn mount(&self) {
        if self.inner.view.borrow().phase != DiscoveryPhase::Idle {
            return;
        }
        self.relocate().await;
    }

    /// 重新定位，随后请求诊所
    pub async fn relocate(&self) {
        // 作废仍在途中的请求
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.update(|v| {
            v.phase = DiscoveryPhase::LocatingUser;
            v.error = None;
        });

        let (location, used_fallback) = match self.inner.geolocator.locate().await {
            Ok(at) if at.is_valid() => (at, false),
            Ok(at) => {
                log::warn!("[Clinics] Geolocation returned invalid coordinate {:?}", at);
                (self.inner.settings.default_location, true)
            }
            Err(err) => {
                log::warn!("[Clinics] Geolocation failed ({}), using default location", err);
                (self.inner.settings.default_location, true)
            }
        };

        if !location.is_valid() {
            self.update(|v| {
                v.phase = DiscoveryPhase::Error;
                v.error = Some(LOCATION_ERROR_MESSAGE.to_string());
            });
            return;
        }

        self.update(|v| {
            v.location = Some(location);
            v.used_fallback = used_fallback;
        });
        if let Some(layer) = self.inner.layer.borrow_mut().as_mut() {
            layer.set_user(location);
        }

        self.fetch(location).await;
    }

    /// 以最后一次的坐标重新请求；尚无坐标时重新定位
    pub async fn refresh(&self) {
        let location = self.inner.view.borrow().location;
        match location {
            Some(at) => self.fetch(at).await,
            None => self.relocate().await,
        }
    }

    async fn fetch(&self, at: Coordinate) {
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);

        // 请求期间保留上一组结果
        self.update(|v| {
            v.phase = DiscoveryPhase::FetchingClinics;
            v.error = None;
        });

        let result = self
            .inner
            .source
            .nearby(at, self.inner.settings.radius_m)
            .await;

        if self.inner.generation.get() != generation {
            log::debug!("[Clinics] Discarding stale response #{}", generation);
            return;
        }

        match result {
            Ok(clinics) => {
                log::info!("[Clinics] {} clinics near {:?}", clinics.len(), at);
                self.update(|v| {
                    v.notice = clinics.is_empty().then(|| NO_RESULTS_NOTICE.to_string());
                    v.clinics = clinics;
                    v.selected = None;
                    v.phase = DiscoveryPhase::Ready;
                });
                self.sync_markers();
            }
            Err(err) => {
                log::error!("[Clinics] {}", err);
                self.update(|v| {
                    v.phase = DiscoveryPhase::Error;
                    v.error = Some(fetch_error_message(&err).to_string());
                });
            }
        }
    }

    // =========================================================
    // 地图
    // =========================================================

    fn marker_callback(weak: Weak<Inner<G, S, M>>) -> impl Fn(usize) -> Rc<dyn Fn()> {
        move |index: usize| {
            let weak = weak.clone();
            let callback: Rc<dyn Fn()> = Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Self::activate_inner(&inner, index);
                }
            });
            callback
        }
    }

    fn sync_markers(&self) {
        let clinics = self.inner.view.borrow().clinics.clone();
        let callback = Self::marker_callback(Rc::downgrade(&self.inner));
        if let Some(layer) = self.inner.layer.borrow_mut().as_mut() {
            layer.sync(&clinics, &callback);
        }
    }

    /// 挂载地图；已有结果时立即同步标记
    pub fn attach_map(&self, surface: M) {
        let mut layer = MarkerLayer::new(surface);
        let (location, phase) = {
            let view = self.inner.view.borrow();
            (view.location, view.phase)
        };
        if let Some(at) = location {
            layer.set_user(at);
        }
        *self.inner.layer.borrow_mut() = Some(layer);

        if phase == DiscoveryPhase::Ready {
            self.sync_markers();
        }
        self.update(|v| v.map_error = None);
    }

    pub fn map_unavailable(&self, err: MapError) {
        log::error!("[Clinics] Map unavailable: {}", err);
        self.update(|v| v.map_error = Some(err.to_string()));
    }

    pub fn has_map(&self) -> bool {
        self.inner.layer.borrow().is_some()
    }

    /// 选中诊所（列表点击或标记点击）
    pub fn activate(&self, index: usize) {
        Self::activate_inner(&self.inner, index);
    }

    fn activate_inner(inner: &Inner<G, S, M>, index: usize) {
        let clinic = inner.view.borrow().clinics.get(index).cloned();
        let Some(clinic) = clinic else {
            return;
        };
        if let Some(layer) = inner.layer.borrow_mut().as_mut() {
            layer.activate(index, &clinic);
        }
        Self::update_inner(inner, |v| v.selected = Some(index));
    }

    /// 测试与调试用：查看标记层
    pub fn with_layer<R>(&self, f: impl FnOnce(&MarkerLayer<M>) -> R) -> Option<R> {
        self.inner.layer.borrow().as_ref().map(f)
    }
}
