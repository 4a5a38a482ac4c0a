//! Interactive timeline state: which year is selected and what is on the map.
//!
//! Every selection bumps a generation counter and hands out a ticket. A
//! response is applied only if its ticket still carries the latest
//! generation, so a slow fetch for an old year never overwrites a newer one.

use crate::core::partition::Partitioner;
use crate::core::timeline::Timeline;
use crate::core::year_format::{data_token, display_label};
use crate::domain::model::{CountryData, MapEvent, TimelineYear};
use crate::domain::ports::{MapPresenter, YearSource};
use crate::utils::error::{BordersError, Result};
use geojson::FeatureCollection;
use tokio::sync::Mutex;

pub const DEFAULT_ZOOM: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub index: usize,
    pub year: TimelineYear,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    Applied {
        year: TimelineYear,
        borders: usize,
        labels: usize,
        skipped: usize,
    },
    /// The dataset has no file for this year; the map is cleared.
    NoData { year: TimelineYear },
    /// A newer selection was made while this one was in flight.
    Stale { year: TimelineYear },
    /// Fetch failed; whatever was displayed before stays displayed.
    Failed { year: TimelineYear, message: String },
}

#[derive(Debug, Clone, Copy)]
enum Move {
    To(i64),
    By(i64),
}

struct SessionState {
    timeline: Timeline,
    generation: u64,
    data: Option<CountryData>,
    displayed_year: Option<TimelineYear>,
    zoom: f64,
    presenter: Option<Box<dyn MapPresenter>>,
}

impl SessionState {
    fn present(&mut self) {
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.present(self.data.as_ref(), self.zoom);
        }
    }
}

pub struct TimelineSession<Y: YearSource> {
    source: Y,
    partitioner: Partitioner,
    state: Mutex<SessionState>,
}

impl<Y: YearSource> TimelineSession<Y> {
    pub fn new(source: Y, timeline: Timeline, partitioner: Partitioner) -> Self {
        Self {
            source,
            partitioner,
            state: Mutex::new(SessionState {
                timeline,
                generation: 0,
                data: None,
                displayed_year: None,
                zoom: DEFAULT_ZOOM,
                presenter: None,
            }),
        }
    }

    pub fn with_presenter(mut self, presenter: Box<dyn MapPresenter>) -> Self {
        self.state.get_mut().presenter = Some(presenter);
        self
    }

    /// Moves the scrubber and starts a new generation.
    pub async fn begin(&self, index: i64) -> FetchTicket {
        self.advance(Move::To(index)).await
    }

    /// Relative move. Read and update happen under one lock, so concurrent
    /// steps never land on the same index.
    pub async fn begin_step(&self, delta: i64) -> FetchTicket {
        self.advance(Move::By(delta)).await
    }

    async fn advance(&self, movement: Move) -> FetchTicket {
        let mut state = self.state.lock().await;
        let index = match movement {
            Move::To(index) => state.timeline.set_index(index),
            Move::By(delta) => state.timeline.step(delta),
        };
        state.generation += 1;
        let year = state.timeline.current_year();

        tracing::debug!(
            "Timeline -> #{} ({}), generation {}",
            index,
            display_label(year),
            state.generation
        );

        FetchTicket {
            generation: state.generation,
            index,
            year,
            token: data_token(year),
        }
    }

    /// Applies a fetch result if `ticket` is still the latest selection.
    pub async fn commit(&self, ticket: &FetchTicket, raw: Option<FeatureCollection>) -> Commit {
        let mut state = self.state.lock().await;
        if ticket.generation != state.generation {
            tracing::debug!(
                "Discarding stale response for {} (generation {} < {})",
                display_label(ticket.year),
                ticket.generation,
                state.generation
            );
            return Commit::Stale { year: ticket.year };
        }

        let commit = match raw {
            Some(raw) => {
                let outcome = self.partitioner.partition(&raw);
                let commit = Commit::Applied {
                    year: ticket.year,
                    borders: outcome.data.borders.features.len(),
                    labels: outcome.data.labels.features.len(),
                    skipped: outcome.skipped,
                };
                state.data = Some(outcome.data);
                commit
            }
            None => {
                state.data = None;
                Commit::NoData { year: ticket.year }
            }
        };
        state.displayed_year = Some(ticket.year);
        state.present();

        commit
    }

    async fn fail(&self, ticket: &FetchTicket, error: BordersError) -> Commit {
        let state = self.state.lock().await;
        if ticket.generation != state.generation {
            return Commit::Stale { year: ticket.year };
        }

        tracing::warn!(
            "⚠️  Failed to load {}: {} ({})",
            display_label(ticket.year),
            error,
            error.recovery_suggestion()
        );
        Commit::Failed {
            year: ticket.year,
            message: error.to_string(),
        }
    }

    async fn run(&self, ticket: FetchTicket) -> Commit {
        match self.source.fetch_year(&ticket.token).await {
            Ok(raw) => self.commit(&ticket, raw).await,
            Err(e) => self.fail(&ticket, e).await,
        }
    }

    pub async fn select(&self, index: i64) -> Commit {
        let ticket = self.begin(index).await;
        self.run(ticket).await
    }

    pub async fn step(&self, delta: i64) -> Commit {
        let ticket = self.begin_step(delta).await;
        self.run(ticket).await
    }

    pub async fn select_year(&self, year: TimelineYear) -> Result<Commit> {
        let index = self
            .state
            .lock()
            .await
            .timeline
            .index_of(year)
            .ok_or_else(|| BordersError::ValidationError {
                message: format!("{} is not on the timeline", display_label(year)),
            })?;
        Ok(self.select(index as i64).await)
    }

    pub async fn handle_map_event(&self, event: MapEvent) {
        let mut state = self.state.lock().await;
        match event {
            MapEvent::ZoomChanged(zoom) => {
                state.zoom = zoom;
            }
            // A fresh style drops all sources; draw the current year again.
            MapEvent::StyleLoaded => state.present(),
        }
    }

    pub async fn current_data(&self) -> Option<CountryData> {
        self.state.lock().await.data.clone()
    }

    pub async fn displayed_year(&self) -> Option<TimelineYear> {
        self.state.lock().await.displayed_year
    }

    pub async fn index(&self) -> usize {
        self.state.lock().await.timeline.index()
    }

    pub async fn zoom(&self) -> f64 {
        self.state.lock().await.zoom
    }

    pub async fn timeline(&self) -> Timeline {
        self.state.lock().await.timeline.clone()
    }
}
