//! Saved map datasets and the active routing context.
//!
//! Downloading acquires a new area on the server; loading activates one.
//! Only one of the two runs at a time. Every listing, download, load and
//! safe-haven request is tagged so a late response cannot land on a
//! context that has moved on.

use tracing::{debug, info, warn};

use crate::api::{LoadResponse, SafeHavensResponse};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::model::{GeoPoint, HavenKind, MapDataset, SafeHaven};
use crate::token::{RequestToken, TokenSequence};

pub const DOWNLOAD_RADIUS_PRESETS_M: [u32; 4] = [2000, 5000, 10_000, 20_000];
pub const DEFAULT_DOWNLOAD_RADIUS_M: u32 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetTask {
    Downloading { name: String, radius_m: u32 },
    Loading { file: String },
}

/// The dataset the backend is currently routing on. `version` increases on
/// every successful load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveDataset {
    pub location: Option<String>,
    pub nodes: Option<u64>,
    pub edges: Option<u64>,
    version: u64,
    safe_havens: Vec<SafeHaven>,
}

impl ActiveDataset {
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn safe_havens(&self) -> &[SafeHaven] {
        &self.safe_havens
    }

    #[must_use]
    pub fn count(&self, kind: HavenKind) -> usize {
        self.safe_havens.iter().filter(|h| h.kind == kind).count()
    }

    /// Nearest haven to `point` with its distance in metres.
    #[must_use]
    pub fn nearest_haven(&self, point: GeoPoint) -> Option<(&SafeHaven, f64)> {
        self.safe_havens
            .iter()
            .map(|h| (h, h.location.distance_to(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetCompletion {
    /// Refresh the listing and reset selection/route. `fetch_havens` is set
    /// for a load, carrying the new context version.
    Changed {
        notice: String,
        fetch_havens: Option<u64>,
    },
    Failed(AppError),
    Stale,
}

#[derive(Debug, Default)]
pub struct DatasetManager {
    datasets: Vec<MapDataset>,
    listing: TokenSequence,
    task: Option<(RequestToken, DatasetTask)>,
    tasks: TokenSequence,
    active: ActiveDataset,
}

impl DatasetManager {
    #[must_use]
    pub fn datasets(&self) -> &[MapDataset] {
        &self.datasets
    }

    #[must_use]
    pub const fn active(&self) -> &ActiveDataset {
        &self.active
    }

    #[must_use]
    pub fn task(&self) -> Option<&DatasetTask> {
        self.task.as_ref().map(|(_, task)| task)
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.listing.is_pending()
    }

    pub fn begin_refresh(&mut self) -> RequestToken {
        self.listing.issue()
    }

    /// Replaces the list with the server's. On failure the old list stays.
    pub fn apply_listing(&mut self, token: RequestToken, outcome: AppResult<Vec<MapDataset>>) -> AppResult<()> {
        if !self.listing.settle(token) {
            debug!(%token, "discarding stale dataset listing");
            return Ok(());
        }

        match outcome {
            Ok(datasets) => {
                debug!(count = datasets.len(), "dataset listing refreshed");
                self.datasets = datasets;
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "dataset listing failed");
                Err(error)
            }
        }
    }

    pub fn begin_download(&mut self, name: &str, radius_m: u32) -> AppResult<RequestToken> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::new(ErrorKind::Validation, "Enter a location to download"));
        }
        if radius_m == 0 {
            return Err(AppError::new(ErrorKind::Validation, "Radius must be greater than zero"));
        }
        self.begin_task(DatasetTask::Downloading {
            name: name.to_string(),
            radius_m,
        })
    }

    /// The ack body is not inspected beyond a 2xx status.
    pub fn finish_download(&mut self, token: RequestToken, outcome: AppResult<()>) -> DatasetCompletion {
        let Some(DatasetTask::Downloading { name, radius_m }) = self.settle_task(token) else {
            return DatasetCompletion::Stale;
        };

        match outcome {
            Ok(()) => {
                info!(name = %name, radius_m, "dataset downloaded");
                DatasetCompletion::Changed {
                    notice: format!("Downloaded {name}"),
                    fetch_havens: None,
                }
            }
            Err(error) => {
                warn!(name = %name, error = %error, "dataset download failed");
                DatasetCompletion::Failed(error)
            }
        }
    }

    pub fn begin_load(&mut self, file: &str) -> AppResult<RequestToken> {
        if file.trim().is_empty() {
            return Err(AppError::new(ErrorKind::Validation, "Select a saved location to load"));
        }
        self.begin_task(DatasetTask::Loading {
            file: file.to_string(),
        })
    }

    pub fn finish_load(&mut self, token: RequestToken, outcome: AppResult<LoadResponse>) -> DatasetCompletion {
        let Some(DatasetTask::Loading { file }) = self.settle_task(token) else {
            return DatasetCompletion::Stale;
        };

        match outcome {
            Ok(response) => {
                self.active = ActiveDataset {
                    location: Some(response.location.clone()),
                    nodes: response.nodes,
                    edges: response.edges,
                    version: self.active.version + 1,
                    safe_havens: Vec::new(),
                };
                info!(
                    file = %file,
                    location = %response.location,
                    version = self.active.version,
                    "dataset loaded"
                );
                DatasetCompletion::Changed {
                    notice: format!("Loaded {}", response.location),
                    fetch_havens: Some(self.active.version),
                }
            }
            Err(error) => {
                warn!(file = %file, error = %error, "dataset load failed");
                DatasetCompletion::Failed(error)
            }
        }
    }

    /// Applies safe havens fetched for context `version`. Returns `false`
    /// when another dataset has been loaded since.
    pub fn apply_havens(&mut self, version: u64, outcome: AppResult<SafeHavensResponse>) -> AppResult<bool> {
        if version != self.active.version {
            debug!(version, current = self.active.version, "discarding safe havens for old dataset");
            return Ok(false);
        }

        let havens = outcome?.into_havens();
        self.active.safe_havens = havens;
        debug!(
            police = self.active.count(HavenKind::Police),
            hospital = self.active.count(HavenKind::Hospital),
            "safe havens updated"
        );
        Ok(true)
    }

    fn begin_task(&mut self, task: DatasetTask) -> AppResult<RequestToken> {
        if let Some((_, running)) = &self.task {
            debug!(?running, "dataset operation already running");
            return Err(AppError::new(
                ErrorKind::Validation,
                "Please wait for the current download or load to finish",
            ));
        }

        let token = self.tasks.issue();
        debug!(%token, ?task, "dataset operation started");
        self.task = Some((token, task));
        Ok(token)
    }

    fn settle_task(&mut self, token: RequestToken) -> Option<DatasetTask> {
        if !self.tasks.settle(token) {
            warn!(%token, "discarding stale dataset response");
            return None;
        }
        self.task.take().map(|(_, task)| task)
    }
}
