//! Timeline façade: the one surface presentation code talks to.
//!
//! Owns the query inputs, dispatches the three reconstruction modes, wraps
//! cumulative results in the session cache, and exposes chart-ready state.
//! Reconstruction runs carry a generation counter; a run that finishes after
//! the inputs changed discards its result instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::collect::collect;
use super::cumulative::cumulative;
use super::locate::locate_first_appearance;
use super::resolver::{resolve_last_event, ProbeConfig};
use crate::models::{Coordinate, Timeline, TimelineMode};
use crate::session::TimelineCache;
use crate::source::EventSource;

/// Series length a single-sample timeline is padded to, and the slot the
/// sample lands in. A one-point series is not chart-renderable otherwise.
const PAD_LEN: usize = 11;
const PAD_CENTER: usize = 5;

/// Inputs of one reconstruction. Any change re-enters `Loading`.
#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
    pub mode: TimelineMode,
    pub book_id: Option<String>,
    pub id1: Option<i64>,
    pub id2: Option<i64>,
    pub chapter: Option<u32>,
    /// Standalone mode: end of the explicit event window. Absent means the
    /// chapter's last valid event.
    pub event: Option<u32>,
    /// Upper bound on the chapter a query may address.
    pub max_chapter: Option<u32>,
}

/// Façade lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacadePhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Chart-ready snapshot consumed by presentation collaborators.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FacadeState {
    pub phase: FacadePhase,
    pub timeline: Vec<Option<f64>>,
    pub labels: Vec<String>,
    pub loading: bool,
    pub no_relation: bool,
    pub error: Option<String>,
}

/// Pad a single-sample series to a fixed-length chart window: length 11 with
/// the sample at index 5 and every other slot empty. Multi-sample and empty
/// series pass through untouched.
pub fn pad_single_sample(
    values: Vec<Option<f64>>,
    labels: Vec<String>,
) -> (Vec<Option<f64>>, Vec<String>) {
    if values.len() != 1 {
        return (values, labels);
    }
    let mut padded_values = vec![None; PAD_LEN];
    let mut padded_labels = vec![String::new(); PAD_LEN];
    padded_values[PAD_CENTER] = values[0];
    padded_labels[PAD_CENTER] = labels.into_iter().next().unwrap_or_default();
    (padded_values, padded_labels)
}

/// Orchestrates reconstruction modes over one event source and cache.
pub struct TimelineFacade {
    source: Arc<dyn EventSource>,
    cache: Arc<TimelineCache>,
    config: ProbeConfig,
    query: RwLock<TimelineQuery>,
    state: RwLock<FacadeState>,
    generation: AtomicU64,
}

impl TimelineFacade {
    pub fn new(source: Arc<dyn EventSource>, cache: Arc<TimelineCache>) -> Self {
        Self {
            source,
            cache,
            config: ProbeConfig::default(),
            query: RwLock::new(TimelineQuery::default()),
            state: RwLock::new(FacadeState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_config(
        source: Arc<dyn EventSource>,
        cache: Arc<TimelineCache>,
        config: ProbeConfig,
    ) -> Self {
        Self {
            source,
            cache,
            config,
            query: RwLock::new(TimelineQuery::default()),
            state: RwLock::new(FacadeState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the query inputs. Bumps the generation so any in-flight
    /// reconstruction becomes stale, and re-enters `Loading`.
    pub async fn set_query(&self, query: TimelineQuery) {
        *self.query.write().await = query;
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        state.phase = FacadePhase::Loading;
        state.loading = true;
    }

    /// Current state snapshot.
    pub async fn state(&self) -> FacadeState {
        self.state.read().await.clone()
    }

    /// Run the reconstruction for the current inputs and commit the result,
    /// unless the inputs changed while it ran.
    pub async fn fetch_data(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let query = self.query.read().await.clone();
        let outcome = self.reconstruct(&query).await;
        self.commit(generation, outcome).await;
    }

    /// Last valid event index of the queried chapter; 0 when unknown.
    pub async fn get_max_event_count(&self) -> u32 {
        let chapter = match self.query.read().await.chapter {
            Some(chapter) => chapter,
            None => return 0,
        };
        resolve_last_event(self.source.as_ref(), chapter, &self.config).await
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn commit(&self, generation: u64, outcome: Result<Timeline, String>) {
        if generation != self.current_generation() {
            debug!("Discarding stale reconstruction (generation {})", generation);
            return;
        }
        let mut state = self.state.write().await;
        match outcome {
            Ok(timeline) => {
                let values: Vec<Option<f64>> = timeline
                    .points
                    .iter()
                    .map(|p| p.clamped_positivity())
                    .collect();
                let labels: Vec<String> =
                    timeline.points.iter().map(|p| p.label.clone()).collect();
                let (values, labels) = pad_single_sample(values, labels);
                state.timeline = values;
                state.labels = labels;
                state.no_relation = timeline.no_relation;
                state.error = None;
                state.phase = FacadePhase::Ready;
            }
            Err(message) => {
                state.timeline = Vec::new();
                state.labels = Vec::new();
                state.no_relation = false;
                state.error = Some(message);
                state.phase = FacadePhase::Error;
            }
        }
        state.loading = false;
    }

    /// Mode dispatch. Internal faults have already been converted to empty
    /// results by the services layer; the only `Err` here is missing inputs.
    async fn reconstruct(&self, query: &TimelineQuery) -> Result<Timeline, String> {
        let book_id = query
            .book_id
            .as_deref()
            .ok_or("Missing required parameter: bookId")?;
        let id1 = query.id1.ok_or("Missing required parameter: id1")?;
        let id2 = query.id2.ok_or("Missing required parameter: id2")?;
        let chapter = query.chapter.ok_or("Missing required parameter: chapter")?;
        let chapter = match query.max_chapter {
            Some(max) => chapter.min(max),
            None => chapter,
        };

        let source = self.source.as_ref();
        Ok(match query.mode {
            TimelineMode::Standalone => self.standalone(id1, id2, chapter, query.event).await,
            TimelineMode::Viewer => self.viewer(id1, id2, chapter).await,
            TimelineMode::Cumulative => {
                let key = self.cache.key(book_id, chapter, id1, id2);
                if let Some(cached) = self.cache.get(&key).await {
                    match serde_json::from_value::<Timeline>(cached) {
                        Ok(timeline) => return Ok(timeline),
                        Err(e) => warn!("Ignoring malformed cached timeline '{}': {}", key, e),
                    }
                }
                let timeline = cumulative(source, id1, id2, chapter, &self.config).await;
                match serde_json::to_value(&timeline) {
                    Ok(value) => self.cache.set(&key, &value).await,
                    Err(e) => warn!("Failed to serialize timeline for cache: {}", e),
                }
                timeline
            }
        })
    }

    /// Explicit chapter/event window over manifest data only. A probe-only
    /// source yields an empty no-relation result here, not an error.
    async fn standalone(&self, id1: i64, id2: i64, chapter: u32, event: Option<u32>) -> Timeline {
        let source = self.source.as_ref();
        if source.manifest().is_none() {
            return Timeline::no_relation(TimelineMode::Standalone);
        }
        let last = resolve_last_event(source, chapter, &self.config).await;
        let end = event.map_or(last, |e| e.min(last));
        if end == 0 {
            return Timeline::no_relation(TimelineMode::Standalone);
        }
        let points = collect(
            source,
            id1,
            id2,
            Coordinate::new(chapter, 1),
            Coordinate::new(chapter, end),
            &self.config,
        )
        .await;
        Timeline {
            points,
            mode: TimelineMode::Standalone,
            no_relation: false,
        }
    }

    /// Current-chapter series from the pair's first appearance.
    async fn viewer(&self, id1: i64, id2: i64, chapter: u32) -> Timeline {
        let source = self.source.as_ref();
        let Some(first) =
            locate_first_appearance(source, id1, id2, chapter, &self.config).await
        else {
            return Timeline::no_relation(TimelineMode::Viewer);
        };
        let start = if first.chapter == chapter { first.event } else { 1 };
        let last = resolve_last_event(source, chapter, &self.config).await;
        let points = if last >= start {
            collect(
                source,
                id1,
                id2,
                Coordinate::new(chapter, start),
                Coordinate::new(chapter, last),
                &self.config,
            )
            .await
        } else {
            Vec::new()
        };
        Timeline {
            points,
            mode: TimelineMode::Viewer,
            no_relation: false,
        }
    }

    /// Drop every cached timeline for a book, or one chapter of it.
    pub async fn invalidate_cache(&self, book_id: &str, chapter: Option<u32>) {
        self.cache.invalidate(book_id, chapter).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStore;
    use crate::source::manifest::{BookData, ManifestSource};
    use serde_json::json;

    fn facade() -> TimelineFacade {
        let data: BookData = serde_json::from_value(json!({
            "bookId": "42",
            "chapters": [
                { "events": [
                    { "relations": [{ "id1": 3, "id2": 7, "positivity": 0.2 }] },
                    { "relations": [{ "id1": 3, "id2": 7, "positivity": 0.4 }] }
                ] }
            ]
        }))
        .unwrap();
        let source = Arc::new(ManifestSource::new(data));
        let cache = Arc::new(TimelineCache::new(Arc::new(MemoryStore::new())));
        TimelineFacade::new(source, cache)
    }

    fn full_query() -> TimelineQuery {
        TimelineQuery {
            mode: TimelineMode::Cumulative,
            book_id: Some("42".to_string()),
            id1: Some(3),
            id2: Some(7),
            chapter: Some(1),
            event: None,
            max_chapter: None,
        }
    }

    #[test]
    fn test_padding_law() {
        let (values, labels) =
            pad_single_sample(vec![Some(0.3)], vec!["E4".to_string()]);
        assert_eq!(values.len(), 11);
        assert_eq!(labels.len(), 11);
        assert_eq!(values[5], Some(0.3));
        assert_eq!(labels[5], "E4");
        for i in (0..11).filter(|&i| i != 5) {
            assert_eq!(values[i], None);
            assert_eq!(labels[i], "");
        }
    }

    #[test]
    fn test_padding_leaves_other_lengths_alone() {
        let (values, labels) = pad_single_sample(vec![], vec![]);
        assert!(values.is_empty() && labels.is_empty());
        let (values, labels) = pad_single_sample(
            vec![Some(0.1), Some(0.2)],
            vec!["E1".to_string(), "E2".to_string()],
        );
        assert_eq!(values.len(), 2);
        assert_eq!(labels.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_parameter_short_circuits_to_error() {
        let facade = facade();
        let mut query = full_query();
        query.id2 = None;
        facade.set_query(query).await;
        facade.fetch_data().await;

        let state = facade.state().await;
        assert_eq!(state.phase, FacadePhase::Error);
        assert!(state.timeline.is_empty());
        assert_eq!(state.error.as_deref(), Some("Missing required parameter: id2"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_set_query_enters_loading() {
        let facade = facade();
        facade.set_query(full_query()).await;
        let state = facade.state().await;
        assert_eq!(state.phase, FacadePhase::Loading);
        assert!(state.loading);
    }

    #[tokio::test]
    async fn test_fetch_commits_ready_state() {
        let facade = facade();
        facade.set_query(full_query()).await;
        facade.fetch_data().await;

        let state = facade.state().await;
        assert_eq!(state.phase, FacadePhase::Ready);
        assert_eq!(state.timeline, vec![Some(0.2), Some(0.4)]);
        assert_eq!(state.labels, vec!["E1", "E2"]);
        assert!(!state.no_relation);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_stale_generation_is_discarded() {
        let facade = facade();
        facade.set_query(full_query()).await;
        let stale_generation = facade.current_generation();
        let query = facade.query.read().await.clone();
        let outcome = facade.reconstruct(&query).await;

        // Inputs change while the reconstruction was in flight.
        facade.set_query(full_query()).await;
        facade.commit(stale_generation, outcome).await;

        let state = facade.state().await;
        assert_eq!(state.phase, FacadePhase::Loading);
        assert!(state.timeline.is_empty());
    }

    #[tokio::test]
    async fn test_max_event_count() {
        let facade = facade();
        facade.set_query(full_query()).await;
        assert_eq!(facade.get_max_event_count().await, 2);

        facade
            .set_query(TimelineQuery {
                chapter: None,
                ..full_query()
            })
            .await;
        assert_eq!(facade.get_max_event_count().await, 0);
    }

    #[tokio::test]
    async fn test_max_chapter_clamps_target() {
        let facade = facade();
        facade
            .set_query(TimelineQuery {
                chapter: Some(9),
                max_chapter: Some(1),
                ..full_query()
            })
            .await;
        facade.fetch_data().await;
        let state = facade.state().await;
        assert_eq!(state.phase, FacadePhase::Ready);
        assert_eq!(state.timeline, vec![Some(0.2), Some(0.4)]);
    }
}
