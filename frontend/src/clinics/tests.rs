use super::*;
use crate::error::HttpError;
use futures::channel::oneshot;
use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};

const NYC: Coordinate = Coordinate::new(40.7128, -74.0060);
const HERE: Coordinate = Coordinate::new(51.5074, -0.1278);

fn settings() -> DiscoverySettings {
    DiscoverySettings {
        default_location: NYC,
        radius_m: 5000,
    }
}

// =========================================================
// 假协作者
// =========================================================

struct FakeGeolocator {
    result: Result<Coordinate, GeolocationError>,
    calls: Cell<u32>,
}

impl FakeGeolocator {
    fn at(at: Coordinate) -> Rc<Self> {
        Rc::new(Self {
            result: Ok(at),
            calls: Cell::new(0),
        })
    }

    fn failing(err: GeolocationError) -> Rc<Self> {
        Rc::new(Self {
            result: Err(err),
            calls: Cell::new(0),
        })
    }
}

#[async_trait::async_trait(?Send)]
impl Geolocator for FakeGeolocator {
    async fn locate(&self) -> Result<Coordinate, GeolocationError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

type Reply = Result<Vec<Clinic>, ApiError>;

enum Pending {
    Now(Reply),
    Later(oneshot::Receiver<Reply>),
}

#[derive(Default)]
struct FakeSource {
    replies: RefCell<VecDeque<Pending>>,
    calls: RefCell<Vec<(Coordinate, u32)>>,
}

impl FakeSource {
    fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn reply(&self, reply: Reply) {
        self.replies.borrow_mut().push_back(Pending::Now(reply));
    }

    fn deferred(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.borrow_mut().push_back(Pending::Later(rx));
        tx
    }
}

#[async_trait::async_trait(?Send)]
impl ClinicSource for FakeSource {
    async fn nearby(&self, at: Coordinate, radius_m: u32) -> Result<Vec<Clinic>, ApiError> {
        self.calls.borrow_mut().push((at, radius_m));
        let pending = self.replies.borrow_mut().pop_front();
        match pending {
            Some(Pending::Now(reply)) => reply,
            Some(Pending::Later(rx)) => rx.await.unwrap_or_else(|_| {
                Err(ApiError::Network {
                    operation: "nearby clinics",
                    source: HttpError::Network("dropped".into()),
                })
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
struct MapLog {
    next_id: usize,
    live: Vec<(usize, MarkerSpec)>,
    callbacks: HashMap<usize, Rc<dyn Fn()>>,
    open: Option<usize>,
    opened: Vec<String>,
    overlapping_opens: u32,
    fits: Vec<Vec<Coordinate>>,
}

#[derive(Clone, Default)]
struct FakeMap(Rc<RefCell<MapLog>>);

impl FakeMap {
    fn clinic_titles(&self) -> Vec<String> {
        self.0
            .borrow()
            .live
            .iter()
            .filter(|(_, s)| matches!(s.kind, MarkerKind::Clinic(_)))
            .map(|(_, s)| s.title.clone())
            .collect()
    }

    fn user_markers(&self) -> Vec<Coordinate> {
        self.0
            .borrow()
            .live
            .iter()
            .filter(|(_, s)| s.kind == MarkerKind::User)
            .map(|(_, s)| s.position)
            .collect()
    }

    fn click(&self, title: &str) {
        let callback = {
            let log = self.0.borrow();
            let id = log
                .live
                .iter()
                .find(|(_, s)| s.title == title)
                .map(|(id, _)| *id)
                .unwrap();
            log.callbacks[&id].clone()
        };
        callback();
    }
}

impl MapSurface for FakeMap {
    type Marker = usize;

    fn add_marker(&self, def: &MarkerSpec, on_activate: Rc<dyn Fn()>) -> usize {
        let mut log = self.0.borrow_mut();
        log.next_id += 1;
        let id = log.next_id;
        log.live.push((id, def.clone()));
        log.callbacks.insert(id, on_activate);
        id
    }

    fn remove_marker(&self, marker: usize) {
        let mut log = self.0.borrow_mut();
        log.live.retain(|(id, _)| *id != marker);
        log.callbacks.remove(&marker);
    }

    fn open_overlay(&self, marker: &usize, clinic: &Clinic) {
        let mut log = self.0.borrow_mut();
        if log.open.is_some() {
            log.overlapping_opens += 1;
        }
        log.open = Some(*marker);
        log.opened.push(clinic.name.clone());
    }

    fn close_overlay(&self) {
        self.0.borrow_mut().open = None;
    }

    fn fit_bounds(&self, points: &[Coordinate]) {
        self.0.borrow_mut().fits.push(points.to_vec());
    }
}

type Discovery = ClinicDiscovery<Rc<FakeGeolocator>, Rc<FakeSource>, FakeMap>;

fn discovery(geo: &Rc<FakeGeolocator>, source: &Rc<FakeSource>) -> Discovery {
    ClinicDiscovery::new(geo.clone(), source.clone(), settings())
}

fn clinic(name: &str, lat: f64, lng: f64) -> Clinic {
    Clinic::new(name).with_location(Coordinate::new(lat, lng))
}

fn server_error(status: u16) -> ApiError {
    ApiError::Status {
        operation: "nearby clinics",
        status,
    }
}

// =========================================================
// 定位
// =========================================================

#[tokio::test]
async fn mount_locates_then_fetches_with_radius() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("A", 51.5, -0.12)]));
    let d = discovery(&geo, &source);

    let phases = Rc::new(RefCell::new(Vec::new()));
    let sink = phases.clone();
    d.watch(move |v| {
        let mut phases = sink.borrow_mut();
        if phases.last() != Some(&v.phase) {
            phases.push(v.phase);
        }
    });

    d.mount().await;

    assert_eq!(
        *phases.borrow(),
        vec![
            DiscoveryPhase::Idle,
            DiscoveryPhase::LocatingUser,
            DiscoveryPhase::FetchingClinics,
            DiscoveryPhase::Ready
        ]
    );
    assert_eq!(*source.calls.borrow(), vec![(HERE, 5000)]);
    let view = d.view();
    assert_eq!(view.location, Some(HERE));
    assert!(!view.used_fallback);
    assert_eq!(view.clinics.len(), 1);
}

#[tokio::test]
async fn geolocation_failure_falls_back_without_retry() {
    for err in [
        GeolocationError::PermissionDenied,
        GeolocationError::Timeout,
        GeolocationError::Unsupported,
    ] {
        let geo = FakeGeolocator::failing(err);
        let source = FakeSource::new();
        let d = discovery(&geo, &source);

        d.mount().await;

        assert_eq!(geo.calls.get(), 1);
        assert_eq!(*source.calls.borrow(), vec![(NYC, 5000)]);
        let view = d.view();
        assert_eq!(view.location, Some(NYC));
        assert!(view.used_fallback);
        assert_eq!(view.phase, DiscoveryPhase::Ready);
    }
}

#[tokio::test]
async fn mount_runs_only_once() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    let d = discovery(&geo, &source);

    d.mount().await;
    d.mount().await;

    assert_eq!(geo.calls.get(), 1);
    assert_eq!(source.calls.borrow().len(), 1);
}

#[tokio::test]
async fn invalid_fallback_is_an_error() {
    let geo = FakeGeolocator::failing(GeolocationError::Unavailable);
    let source = FakeSource::new();
    let d: Discovery = ClinicDiscovery::new(
        geo.clone(),
        source.clone(),
        DiscoverySettings {
            default_location: Coordinate::new(f64::NAN, 0.0),
            radius_m: 5000,
        },
    );

    d.mount().await;
    let view = d.view();
    assert_eq!(view.phase, DiscoveryPhase::Error);
    assert!(source.calls.borrow().is_empty());
}

// =========================================================
// 请求
// =========================================================

#[tokio::test]
async fn fetch_errors_are_classified() {
    let cases = [
        (server_error(503), SERVER_ERROR_MESSAGE),
        (
            ApiError::Network {
                operation: "nearby clinics",
                source: HttpError::Network("offline".into()),
            },
            NETWORK_ERROR_MESSAGE,
        ),
        (server_error(404), GENERIC_ERROR_MESSAGE),
        (
            ApiError::Decode {
                operation: "nearby clinics",
                message: "missing field `name`".into(),
            },
            GENERIC_ERROR_MESSAGE,
        ),
    ];

    for (err, message) in cases {
        let geo = FakeGeolocator::at(HERE);
        let source = FakeSource::new();
        source.reply(Err(err));
        let d = discovery(&geo, &source);

        d.mount().await;
        let view = d.view();
        assert_eq!(view.phase, DiscoveryPhase::Error);
        assert_eq!(view.error.as_deref(), Some(message));
    }
}

#[tokio::test]
async fn retry_after_error_reuses_last_coordinate() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Err(server_error(500)));
    source.reply(Ok(vec![clinic("A", 51.5, -0.12)]));
    let d = discovery(&geo, &source);

    d.mount().await;
    d.refresh().await;

    assert_eq!(geo.calls.get(), 1);
    assert_eq!(*source.calls.borrow(), vec![(HERE, 5000), (HERE, 5000)]);
    let view = d.view();
    assert_eq!(view.phase, DiscoveryPhase::Ready);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn relocate_locates_again() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    let d = discovery(&geo, &source);

    d.mount().await;
    d.relocate().await;
    assert_eq!(geo.calls.get(), 2);
    assert_eq!(source.calls.borrow().len(), 2);
}

#[tokio::test]
async fn previous_results_stay_visible_while_fetching() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("Old", 51.5, -0.12)]));
    let map = FakeMap::default();
    let d = discovery(&geo, &source);
    d.attach_map(map.clone());
    d.mount().await;

    let tx = source.deferred();
    let observed = Rc::new(RefCell::new(None));
    let probe = {
        let d = d.clone();
        let map = map.clone();
        let observed = observed.clone();
        async move {
            let view = d.view();
            *observed.borrow_mut() = Some((view.phase, view.clinics.len(), map.clinic_titles()));
            let _ = tx.send(Ok(vec![clinic("New", 51.6, -0.1)]));
        }
    };
    futures::join!(d.refresh(), probe);

    assert_eq!(
        observed.borrow().clone(),
        Some((DiscoveryPhase::FetchingClinics, 1, vec!["Old".to_string()]))
    );
    assert_eq!(map.clinic_titles(), vec!["New".to_string()]);
}

#[tokio::test]
async fn overlapping_fetches_apply_latest_issued_only() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    let d = discovery(&geo, &source);
    d.mount().await;

    let first_tx = source.deferred();
    let second_tx = source.deferred();

    let driver = async move {
        // 后发的请求先返回
        let _ = second_tx.send(Ok(vec![clinic("Second", 51.5, -0.1)]));
        tokio::task::yield_now().await;
        let _ = first_tx.send(Ok(vec![clinic("First", 51.4, -0.2)]));
    };
    futures::join!(d.refresh(), d.refresh(), driver);

    let view = d.view();
    assert_eq!(view.phase, DiscoveryPhase::Ready);
    assert_eq!(view.clinics.len(), 1);
    assert_eq!(view.clinics[0].name, "Second");
}

#[tokio::test]
async fn stale_error_does_not_override_newer_result() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    let d = discovery(&geo, &source);
    d.mount().await;

    let first_tx = source.deferred();
    let second_tx = source.deferred();
    let driver = async move {
        let _ = second_tx.send(Ok(vec![clinic("Fresh", 51.5, -0.1)]));
        tokio::task::yield_now().await;
        let _ = first_tx.send(Err(server_error(502)));
    };
    futures::join!(d.refresh(), d.refresh(), driver);

    let view = d.view();
    assert_eq!(view.phase, DiscoveryPhase::Ready);
    assert!(view.error.is_none());
}

proptest! {
    #[test]
    fn empty_result_is_never_an_error(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
        let geo = FakeGeolocator::at(Coordinate::new(lat, lng));
        let source = FakeSource::new();
        source.reply(Ok(Vec::new()));
        let d = discovery(&geo, &source);

        futures::executor::block_on(d.mount());

        let view = d.view();
        prop_assert_eq!(view.phase, DiscoveryPhase::Ready);
        prop_assert!(view.error.is_none());
        prop_assert_eq!(view.notice.as_deref(), Some(NO_RESULTS_NOTICE));
    }
}

// =========================================================
// 标记同步
// =========================================================

#[tokio::test]
async fn markers_match_clinics_with_coordinates() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![
        clinic("A", 51.50, -0.12),
        Clinic::new("No location"),
        clinic("B", 51.51, -0.13),
        clinic("Broken", 95.0, 0.0),
    ]));
    let map = FakeMap::default();
    let d = discovery(&geo, &source);
    d.attach_map(map.clone());

    d.mount().await;

    assert_eq!(map.clinic_titles(), vec!["A".to_string(), "B".to_string()]);
    assert_eq!(map.user_markers(), vec![HERE]);
    let fits = map.0.borrow().fits.clone();
    assert_eq!(fits.last().map(Vec::len), Some(3));
    assert_eq!(d.with_layer(|l| l.clinic_marker_count()), Some(2));
}

#[tokio::test]
async fn refresh_replaces_markers_wholesale() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("A", 51.50, -0.12), clinic("B", 51.51, -0.13)]));
    source.reply(Ok(vec![clinic("C", 51.52, -0.14)]));
    let map = FakeMap::default();
    let d = discovery(&geo, &source);
    d.attach_map(map.clone());

    d.mount().await;
    d.refresh().await;

    assert_eq!(map.clinic_titles(), vec!["C".to_string()]);
    assert_eq!(map.user_markers().len(), 1);
}

#[tokio::test]
async fn empty_refresh_clears_markers() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("A", 51.50, -0.12)]));
    source.reply(Ok(Vec::new()));
    let map = FakeMap::default();
    let d = discovery(&geo, &source);
    d.attach_map(map.clone());

    d.mount().await;
    d.refresh().await;

    assert!(map.clinic_titles().is_empty());
    assert_eq!(d.view().notice.as_deref(), Some(NO_RESULTS_NOTICE));
}

#[tokio::test]
async fn map_attached_late_is_synchronized() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("A", 51.50, -0.12)]));
    let d = discovery(&geo, &source);
    d.mount().await;

    let map = FakeMap::default();
    d.attach_map(map.clone());

    assert_eq!(map.clinic_titles(), vec!["A".to_string()]);
    assert_eq!(map.user_markers(), vec![HERE]);
}

#[tokio::test]
async fn user_marker_is_replaced_on_relocate() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    let map = FakeMap::default();
    let d = discovery(&geo, &source);
    d.attach_map(map.clone());

    d.mount().await;
    d.relocate().await;

    assert_eq!(map.user_markers(), vec![HERE]);
}

#[tokio::test]
async fn at_most_one_overlay_is_open() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("A", 51.50, -0.12), clinic("B", 51.51, -0.13)]));
    let map = FakeMap::default();
    let d = discovery(&geo, &source);
    d.attach_map(map.clone());
    d.mount().await;

    map.click("A");
    map.click("B");
    d.activate(0);

    let log = map.0.borrow();
    assert_eq!(log.overlapping_opens, 0);
    assert_eq!(log.opened, vec!["A", "B", "A"]);
    drop(log);
    assert_eq!(d.view().selected, Some(0));
    assert_eq!(d.with_layer(|l| l.open_overlay()), Some(Some(0)));
}

#[tokio::test]
async fn refresh_closes_open_overlay() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("A", 51.50, -0.12)]));
    source.reply(Ok(vec![clinic("B", 51.51, -0.13)]));
    let map = FakeMap::default();
    let d = discovery(&geo, &source);
    d.attach_map(map.clone());
    d.mount().await;

    map.click("A");
    d.refresh().await;

    assert!(map.0.borrow().open.is_none());
    assert_eq!(d.view().selected, None);
}

#[tokio::test]
async fn list_selection_without_map_still_selects() {
    let geo = FakeGeolocator::at(HERE);
    let source = FakeSource::new();
    source.reply(Ok(vec![clinic("A", 51.50, -0.12)]));
    let d = discovery(&geo, &source);
    d.mount().await;

    d.map_unavailable(MapError::MissingApiKey);
    d.activate(0);
    d.activate(7);

    let view = d.view();
    assert_eq!(view.selected, Some(0));
    assert_eq!(
        view.map_error.as_deref(),
        Some("Google Maps API key is not configured")
    );
    assert!(!d.has_map());
}
