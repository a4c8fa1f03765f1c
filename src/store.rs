//! Selection store: which prefectures are selected, and their series for the active category.
//!
//! All operations take `&self`. State sits behind a mutex that is never held across a
//! fetch, so every state transition is atomic from the caller's point of view and
//! operations may be issued from several threads at once.
//!
//! Overlapping operations are ordered by request tokens drawn from one monotonic
//! counter:
//! - every toggle-on of a prefecture claims a token for that prefecture, held until its
//!   fetch completes; a later toggle of the same prefecture releases or replaces it and
//!   the earlier fetch is discarded
//! - every category switch claims the category token; a toggle-on or refresh that
//!   started under an older category token is discarded on completion
//!
//! Category switches are all-or-nothing. If any prefecture fails to refresh, the
//! selection keeps its previous series and the active category reverts to the one
//! those series belong to. Prefectures selected while the failed switch ran are
//! fetched again for that category before the switch returns.

use crate::api::PopulationSource;
use crate::error::{Error, ErrorReport, Result};
use crate::join::{JoinedRow, join_series};
use crate::models::{Category, PopulationPoint, SelectedSeries};
use ahash::AHashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

/// What a [`SelectionStore::toggle_entity`] call did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Nothing to do: deselecting an absent prefecture or selecting a present one.
    Unchanged,
    /// The fetch finished after a newer toggle or category switch and was dropped.
    Discarded,
}

/// What a [`SelectionStore::change_category`] call did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// Series of this many prefectures were replaced.
    Refreshed(usize),
    /// A newer category switch was issued before this one settled.
    Superseded,
}

/// Point-in-time copy of everything the presentation layer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub category: Category,
    pub selection: Vec<SelectedSeries>,
    pub loading: bool,
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Default)]
struct State {
    /// Category shown to the user; switches immediately.
    category: Category,
    /// Category the committed series belong to; lags `category` during a refresh.
    committed_category: Category,
    selection: Vec<SelectedSeries>,
    in_flight: usize,
    error: Option<ErrorReport>,
    last_token: u64,
    /// Tokens of toggle-on fetches still in flight, by prefecture code.
    code_tokens: AHashMap<u32, u64>,
    category_token: u64,
}

impl State {
    fn next_token(&mut self) -> u64 {
        self.last_token += 1;
        self.last_token
    }

    fn claim_code(&mut self, code: u32) -> u64 {
        let token = self.next_token();
        self.code_tokens.insert(code, token);
        token
    }

    fn owns_code(&self, code: u32, token: u64) -> bool {
        self.code_tokens.get(&code) == Some(&token)
    }

    fn begin(&mut self) {
        self.in_flight += 1;
        self.error = None;
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

pub struct SelectionStore<S> {
    source: S,
    state: Mutex<State>,
}

impl<S: PopulationSource> SelectionStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(State::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is only written in short non-panicking sections.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn category(&self) -> Category {
        self.lock().category
    }

    pub fn selection(&self) -> Vec<SelectedSeries> {
        self.lock().selection.clone()
    }

    pub fn selected_codes(&self) -> Vec<u32> {
        self.lock().selection.iter().map(|s| s.code).collect()
    }

    pub fn is_selected(&self, code: u32) -> bool {
        self.lock().selection.iter().any(|s| s.code == code)
    }

    /// True while any fetch is in flight.
    pub fn loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<ErrorReport> {
        self.lock().error.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        let st = self.lock();
        Snapshot {
            category: st.category,
            selection: st.selection.clone(),
            loading: st.in_flight > 0,
            error: st.error.clone(),
        }
    }

    /// Chart table for the current selection, computed fresh on every call.
    pub fn joined_rows(&self) -> Vec<JoinedRow> {
        join_series(&self.lock().selection)
    }

    /// Select or deselect a prefecture.
    ///
    /// Deselecting never touches the network and is idempotent. Selecting fetches the
    /// prefecture's composition, extracts the active category and appends it to the
    /// end of the selection. On any error nothing is appended.
    pub fn toggle_entity(&self, code: u32, name: &str, selected: bool) -> Result<ToggleOutcome> {
        if !selected {
            return Ok(self.deselect(code));
        }

        let (token, category, category_token) = {
            let mut st = self.lock();
            if st.selection.iter().any(|s| s.code == code) {
                return Ok(ToggleOutcome::Unchanged);
            }
            let token = st.claim_code(code);
            st.begin();
            (token, st.category, st.category_token)
        };

        let fetched = self.fetch_points(code, category);

        let mut st = self.lock();
        st.settle();
        let owned = st.owns_code(code, token);
        if owned {
            st.code_tokens.remove(&code);
        }
        let current = owned && st.category_token == category_token;
        match fetched {
            Ok(_) if !current => {
                log::warn!("dropping stale {category} series for prefecture {code}");
                Ok(ToggleOutcome::Discarded)
            }
            Ok(points) => {
                log::debug!("selected prefecture {code} ({} points)", points.len());
                st.selection.push(SelectedSeries {
                    code,
                    name: name.to_string(),
                    category,
                    points,
                });
                Ok(ToggleOutcome::Added)
            }
            Err(err) => {
                log::warn!("{err}");
                if current {
                    st.error = Some(err.report());
                }
                Err(err)
            }
        }
    }

    fn deselect(&self, code: u32) -> ToggleOutcome {
        let mut st = self.lock();
        // Supersede any selection of this code still in flight.
        st.code_tokens.remove(&code);
        let before = st.selection.len();
        st.selection.retain(|s| s.code != code);
        if st.selection.len() < before {
            log::debug!("deselected prefecture {code}");
            ToggleOutcome::Removed
        } else {
            ToggleOutcome::Unchanged
        }
    }

    /// Switch the active category and refetch every selected prefecture for it.
    ///
    /// The category changes immediately. Fetches run concurrently; the refreshed
    /// selection keeps its prior order whatever order the fetches finish in.
    pub fn change_category(&self, category: Category) -> Result<CategoryOutcome> {
        let (token, targets) = {
            let mut st = self.lock();
            st.category = category;
            let token = st.next_token();
            st.category_token = token;
            st.begin();
            let targets: Vec<(u32, String)> = st
                .selection
                .iter()
                .map(|s| (s.code, s.name.clone()))
                .collect();
            (token, targets)
        };

        let codes: Vec<u32> = targets.iter().map(|&(code, _)| code).collect();
        let results = self.fetch_all(&codes, category);

        let mut st = self.lock();
        st.settle();

        let mut rebuilt = Vec::with_capacity(targets.len());
        let mut failure = None;
        for ((code, name), result) in targets.into_iter().zip(results) {
            match result {
                Ok(points) => rebuilt.push(SelectedSeries {
                    code,
                    name,
                    category,
                    points,
                }),
                Err(err) => {
                    log::warn!("{err}");
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }

        if st.category_token != token {
            log::debug!("refresh to {category} superseded by a newer category switch");
            return match failure {
                Some(err) => Err(err),
                None => Ok(CategoryOutcome::Superseded),
            };
        }

        if let Some(err) = failure {
            let committed = st.committed_category;
            log::warn!("refresh to {category} failed, staying on {committed}");
            st.category = committed;
            let revert = st.next_token();
            st.category_token = revert;
            st.error = Some(err.report());
            // Anything selected during the failed refresh holds the abandoned category.
            let (kept, stranded): (Vec<_>, Vec<_>) = std::mem::take(&mut st.selection)
                .into_iter()
                .partition(|s| s.category == committed);
            st.selection = kept;
            if !stranded.is_empty() {
                st.in_flight += 1;
                let targets: Vec<(u32, String, u64)> = stranded
                    .into_iter()
                    .map(|s| (s.code, s.name, st.claim_code(s.code)))
                    .collect();
                drop(st);
                self.reselect(targets, committed, revert);
            }
            return Err(err);
        }

        // Prefectures deselected meanwhile stay out; ones selected meanwhile were
        // fetched for the new category already and keep their place at the end.
        let current = std::mem::take(&mut st.selection);
        let refreshed = rebuilt
            .into_iter()
            .filter(|s| current.iter().any(|c| c.code == s.code))
            .collect::<Vec<_>>();
        let appended = current
            .into_iter()
            .filter(|c| !refreshed.iter().any(|s| s.code == c.code))
            .collect::<Vec<_>>();
        let count = refreshed.len();
        st.selection = refreshed.into_iter().chain(appended).collect();
        st.committed_category = category;
        log::debug!("switched {count} prefectures to {category}");
        Ok(CategoryOutcome::Refreshed(count))
    }

    /// Fetch `targets` (code, name, claimed token) for `category` and append each one
    /// no later toggle or category switch has claimed. The caller counts the batch as
    /// one fetch in flight. Failures are logged and leave the prefecture out.
    fn reselect(&self, targets: Vec<(u32, String, u64)>, category: Category, category_token: u64) {
        let codes: Vec<u32> = targets.iter().map(|&(code, _, _)| code).collect();
        let results = self.fetch_all(&codes, category);

        let mut st = self.lock();
        st.settle();
        for ((code, name, token), result) in targets.into_iter().zip(results) {
            if !st.owns_code(code, token) {
                continue;
            }
            st.code_tokens.remove(&code);
            if st.category_token != category_token {
                log::debug!("dropping stale {category} series for prefecture {code}");
                continue;
            }
            match result {
                Ok(points) => {
                    log::debug!("reselected prefecture {code} for {category}");
                    st.selection.push(SelectedSeries {
                        code,
                        name,
                        category,
                        points,
                    });
                }
                Err(err) => log::warn!("dropping prefecture {code} from the selection: {err}"),
            }
        }
    }

    fn fetch_points(&self, code: u32, category: Category) -> Result<Vec<PopulationPoint>> {
        let composition = self
            .source
            .composition(code)
            .map_err(|source| Error::FetchSeriesFailed { code, source })?;
        Ok(composition.series(category)?.to_vec())
    }

    /// Fetch every code in parallel, results in input order.
    fn fetch_all(&self, codes: &[u32], category: Category) -> Vec<Result<Vec<PopulationPoint>>> {
        if codes.is_empty() {
            return Vec::new();
        }
        thread::scope(|scope| {
            let handles: Vec<_> = codes
                .iter()
                .map(|&code| scope.spawn(move || self.fetch_points(code, category)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}
