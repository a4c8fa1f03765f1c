use crate::api::PopulationSource;
use crate::error::{Error, ErrorReport};
use crate::models::Prefecture;
use crate::regions::Region;

/// Reference list of selectable prefectures, loaded once.
///
/// A failed load leaves an empty list and an error report; there is no retry.
#[derive(Debug, Clone)]
pub struct PrefectureCatalog {
    prefectures: Vec<Prefecture>,
    loading: bool,
    error: Option<ErrorReport>,
}

impl Default for PrefectureCatalog {
    /// Catalog before its one request has settled.
    fn default() -> Self {
        Self {
            prefectures: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl PrefectureCatalog {
    /// Issue the single request for the prefecture list.
    pub fn load<S: PopulationSource + ?Sized>(source: &S) -> Self {
        match source.prefectures() {
            Ok(prefectures) => {
                log::debug!("loaded {} prefectures", prefectures.len());
                Self {
                    prefectures,
                    loading: false,
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("failed to load prefecture list: {e}");
                Self {
                    prefectures: Vec::new(),
                    loading: false,
                    error: Some(Error::LoadPrefecturesFailed(e).report()),
                }
            }
        }
    }

    /// Prefectures in the order the API returned them.
    pub fn prefectures(&self) -> &[Prefecture] {
        &self.prefectures
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ErrorReport> {
        self.error.as_ref()
    }

    pub fn find(&self, code: u32) -> Option<&Prefecture> {
        self.prefectures.iter().find(|p| p.code == code)
    }

    pub fn name_of(&self, code: u32) -> Option<&str> {
        self.find(code).map(|p| p.name.as_str())
    }

    /// Loaded prefectures of `region`, in code order.
    pub fn by_region(&self, region: Region) -> Vec<&Prefecture> {
        region
            .prefecture_codes()
            .iter()
            .filter_map(|&code| self.find(code))
            .collect()
    }
}
