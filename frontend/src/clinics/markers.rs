//! 地图标记层
//!
//! 维护用户标记与诊所标记的生命周期：每次同步先清空全部诊所标记再重建，
//! 并保证任意时刻至多一个信息浮窗处于打开状态。

use medisight_shared::{Clinic, Coordinate};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    User,
    /// 诊所在结果列表中的下标
    Clinic(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: Coordinate,
    pub title: String,
    pub kind: MarkerKind,
}

/// 地图 SDK 的最小抽象
pub trait MapSurface {
    type Marker;

    fn add_marker(&self, def: &MarkerSpec, on_activate: Rc<dyn Fn()>) -> Self::Marker;
    fn remove_marker(&self, marker: Self::Marker);
    fn open_overlay(&self, marker: &Self::Marker, clinic: &Clinic);
    fn close_overlay(&self);
    /// 调整视野以包含所有点；单点时居中
    fn fit_bounds(&self, points: &[Coordinate]);
}

pub struct MarkerLayer<M: MapSurface> {
    surface: M,
    user: Option<(Coordinate, M::Marker)>,
    clinics: Vec<(usize, Coordinate, M::Marker)>,
    open: Option<usize>,
}

impl<M: MapSurface> MarkerLayer<M> {
    pub fn new(surface: M) -> Self {
        Self {
            surface,
            user: None,
            clinics: Vec::new(),
            open: None,
        }
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn clinic_marker_count(&self) -> usize {
        self.clinics.len()
    }

    pub fn open_overlay(&self) -> Option<usize> {
        self.open
    }

    /// 替换用户标记
    pub fn set_user(&mut self, at: Coordinate) {
        if let Some((_, old)) = self.user.take() {
            self.surface.remove_marker(old);
        }
        let def = MarkerSpec {
            position: at,
            title: "Your location".to_string(),
            kind: MarkerKind::User,
        };
        let marker = self.surface.add_marker(&def, Rc::new(|| {}));
        self.user = Some((at, marker));
    }

    fn close(&mut self) {
        if self.open.take().is_some() {
            self.surface.close_overlay();
        }
    }

    /// 清空并重建诊所标记，然后调整视野
    pub fn sync(&mut self, clinics: &[Clinic], on_activate: &dyn Fn(usize) -> Rc<dyn Fn()>) {
        self.close();
        for (_, _, marker) in self.clinics.drain(..) {
            self.surface.remove_marker(marker);
        }

        for (index, clinic) in clinics.iter().enumerate() {
            let Some(position) = clinic.marker_position() else {
                continue;
            };
            let def = MarkerSpec {
                position,
                title: clinic.name.clone(),
                kind: MarkerKind::Clinic(index),
            };
            let marker = self.surface.add_marker(&def, on_activate(index));
            self.clinics.push((index, position, marker));
        }

        let mut points: Vec<Coordinate> = self.clinics.iter().map(|(_, p, _)| *p).collect();
        if let Some((at, _)) = &self.user {
            points.push(*at);
        }
        if !points.is_empty() {
            self.surface.fit_bounds(&points);
        }
    }

    /// 打开指定诊所的浮窗；该诊所没有标记时返回 false
    pub fn activate(&mut self, index: usize, clinic: &Clinic) -> bool {
        self.close();
        let Some((_, _, marker)) = self.clinics.iter().find(|(i, _, _)| *i == index) else {
            return false;
        };
        self.surface.open_overlay(marker, clinic);
        self.open = Some(index);
        true
    }
}
