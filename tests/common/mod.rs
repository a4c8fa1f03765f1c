//! In-memory population sources shared by the integration tests.
#![allow(dead_code)]

use prefpop::models::LabeledSeries;
use prefpop::{Category, FetchError, PopulationComposition, PopulationPoint, PopulationSource, Prefecture};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Barrier, Mutex};

pub fn pref(code: u32, name: &str) -> Prefecture {
    Prefecture {
        code,
        name: name.into(),
    }
}

pub fn points(pts: &[(i32, i64)]) -> Vec<PopulationPoint> {
    pts.iter()
        .map(|&(year, value)| PopulationPoint {
            year,
            value,
            rate: None,
        })
        .collect()
}

pub fn series(category: Category, pts: &[(i32, i64)]) -> LabeledSeries {
    LabeledSeries {
        label: category.label().into(),
        data: points(pts),
    }
}

pub fn composition(data: Vec<LabeledSeries>) -> PopulationComposition {
    PopulationComposition {
        boundary_year: 2020,
        data,
    }
}

/// Composition with all four categories; young/working/elderly are fixed fractions of total.
pub fn full_composition(total: &[(i32, i64)]) -> PopulationComposition {
    let scaled = |div: i64| -> Vec<(i32, i64)> { total.iter().map(|&(y, v)| (y, v / div)).collect() };
    composition(vec![
        series(Category::Total, total),
        series(Category::Young, &scaled(8)),
        series(Category::Working, &scaled(2)),
        series(Category::Elderly, &scaled(4)),
    ])
}

#[derive(Default)]
pub struct FakeSource {
    pub prefectures: Vec<Prefecture>,
    pub compositions: HashMap<u32, PopulationComposition>,
    pub failing: Mutex<HashSet<u32>>,
    pub fail_prefectures: bool,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn with(mut self, code: u32, name: &str, comp: PopulationComposition) -> Self {
        self.prefectures.push(pref(code, name));
        self.compositions.insert(code, comp);
        self
    }

    pub fn fail(&self, code: u32) {
        self.failing.lock().unwrap().insert(code);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PopulationSource for FakeSource {
    fn prefectures(&self) -> Result<Vec<Prefecture>, FetchError> {
        if self.fail_prefectures {
            return Err(FetchError::Api("service unavailable".into()));
        }
        Ok(self.prefectures.clone())
    }

    fn composition(&self, pref_code: u32) -> Result<PopulationComposition, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&pref_code) {
            return Err(FetchError::Api(format!("boom {pref_code}")));
        }
        self.compositions
            .get(&pref_code)
            .cloned()
            .ok_or_else(|| FetchError::Api(format!("no data for {pref_code}")))
    }
}

/// Blocks the first fetch of `gated` until the test releases it.
///
/// The test calls `started.wait()` to know the fetch is in flight, does its work,
/// then `release.wait()` to let the fetch finish.
pub struct GatedSource {
    pub inner: FakeSource,
    pub gated: u32,
    armed: AtomicBool,
    pub started: Barrier,
    pub release: Barrier,
}

impl GatedSource {
    pub fn new(inner: FakeSource, gated: u32) -> Self {
        Self {
            inner,
            gated,
            armed: AtomicBool::new(false),
            started: Barrier::new(2),
            release: Barrier::new(2),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl PopulationSource for GatedSource {
    fn prefectures(&self) -> Result<Vec<Prefecture>, FetchError> {
        self.inner.prefectures()
    }

    fn composition(&self, pref_code: u32) -> Result<PopulationComposition, FetchError> {
        if pref_code == self.gated && self.armed.swap(false, Ordering::SeqCst) {
            self.started.wait();
            self.release.wait();
        }
        self.inner.composition(pref_code)
    }
}

/// Hokkaido (1) and Aomori (2) with the sample series.
pub fn hokkaido_aomori() -> FakeSource {
    FakeSource::default()
        .with(1, "Hokkaido", full_composition(&[(2015, 5_000_000), (2020, 4_900_000)]))
        .with(2, "Aomori", full_composition(&[(2015, 1_300_000)]))
}
