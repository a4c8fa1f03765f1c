use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Population sub-type shown in the chart. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// All ages (default).
    #[default]
    Total,
    /// Ages 0–14.
    Young,
    /// Ages 15–64.
    Working,
    /// Ages 65+.
    Elderly,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Total,
        Category::Young,
        Category::Working,
        Category::Elderly,
    ];

    /// Label the API uses for this category's series.
    pub fn label(self) -> &'static str {
        match self {
            Category::Total => "総人口",
            Category::Young => "年少人口",
            Category::Working => "生産年齢人口",
            Category::Elderly => "老年人口",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Total => "total",
            Category::Young => "young",
            Category::Working => "working",
            Category::Elderly => "elderly",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(Category::Total),
            "young" | "youth" => Ok(Category::Young),
            "working" | "working-age" | "working_age" => Ok(Category::Working),
            "elderly" => Ok(Category::Elderly),
            other => Err(format!(
                "unknown category {other:?}, expected total, young, working or elderly"
            )),
        }
    }
}

/// Envelope shared by every API response: `{ "message": ..., "result": ... }`.
///
/// On API-level errors `result` is absent and `message` explains why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub message: Option<String>,
    pub result: Option<T>,
}

/// A selectable prefecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prefecture {
    #[serde(rename = "prefCode")]
    pub code: u32,
    #[serde(rename = "prefName")]
    pub name: String,
}

/// One observation of a population series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationPoint {
    pub year: i32,
    pub value: i64,
    /// Share of the total population in percent; absent for the total series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

/// One labeled series inside a composition payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub label: String,
    pub data: Vec<PopulationPoint>,
}

/// Full per-prefecture dataset: one series per category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationComposition {
    /// Last year with measured (not projected) values.
    #[serde(rename = "boundaryYear")]
    pub boundary_year: i32,
    pub data: Vec<LabeledSeries>,
}

impl PopulationComposition {
    /// Points of the series labeled for `category`.
    pub fn series(&self, category: Category) -> Result<&[PopulationPoint], Error> {
        let label = category.label();
        self.data
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.data.as_slice())
            .ok_or(Error::CategoryNotFound { category, label })
    }
}

/// A selected prefecture together with its series for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSeries {
    pub code: u32,
    pub name: String,
    pub category: Category,
    pub points: Vec<PopulationPoint>,
}

impl SelectedSeries {
    /// Value for `year`; the first point wins if the series repeats a year.
    pub fn value_at(&self, year: i32) -> Option<i64> {
        self.points.iter().find(|p| p.year == year).map(|p| p.value)
    }
}
