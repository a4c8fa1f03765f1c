//! prefpop
//!
//! A lightweight Rust library for fetching, joining, exporting, and charting Japanese
//! prefecture population trends. Pairs with the `prefpop` CLI.
//!
//! ### Features
//! - Load the prefecture list once and group it by region
//! - Select prefectures and switch between total / young / working-age / elderly series
//! - Join the selected series into one year-indexed, sparse table
//! - Save the table as CSV or JSON, or render it as an SVG/PNG line chart
//!
//! ### Example
//! ```no_run
//! use prefpop::{Category, Client, ClientConfig, PrefectureCatalog, SelectionStore};
//!
//! let client = Client::new(ClientConfig::from_env())?;
//! let catalog = PrefectureCatalog::load(&client);
//! let store = SelectionStore::new(&client);
//! for code in [1, 13] {
//!     let name = catalog.name_of(code).unwrap_or("unknown");
//!     store.toggle_entity(code, name, true)?;
//! }
//! store.change_category(Category::Elderly)?;
//! let selection = store.selection();
//! let rows = prefpop::join::join_series(&selection);
//! prefpop::storage::save_csv(&rows, &prefpop::join::columns(&selection), "elderly.csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod join;
pub mod models;
pub mod regions;
pub mod storage;
pub mod store;
pub mod viz;

pub use api::{Client, PopulationSource};
pub use catalog::PrefectureCatalog;
pub use config::ClientConfig;
pub use error::{Error, ErrorKind, ErrorReport, FetchError};
pub use join::{JoinedRow, join_series};
pub use models::{Category, PopulationComposition, PopulationPoint, Prefecture, SelectedSeries};
pub use regions::Region;
pub use store::{CategoryOutcome, SelectionStore, Snapshot, ToggleOutcome};
