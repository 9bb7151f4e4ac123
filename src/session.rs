// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Interactive route picking: choose a start point (which builds a [Graph] around it),
//! choose a destination within the radius, find a route between them and play it back.
//!
//! A [Session] holds at most one live graph. While a graph is being built,
//! all other picks are rejected with [SessionError::Busy].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::animation::{schedule, AnimationOptions, Frame, Player};
use crate::osm::{self, RoadDataProvider, DEFAULT_FILTER};
use crate::{find_route, Coordinates, Graph, Node, Route, SearchError, SearchOptions};

/// Tunables of a [Session].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Radius (in meters) of road data fetched around the start point.
    /// The destination must be within this distance from the start.
    pub radius: f64,

    pub animation: AnimationOptions,

    pub search: SearchOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            radius: osm::DEFAULT_RADIUS,
            animation: AnimationOptions::default(),
            search: SearchOptions::default(),
        }
    }
}

/// Reasons why a [Session] operation was rejected.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("road data is still being loaded")]
    Busy,

    #[error("no routes available nearby, choose another location")]
    NoRoutesNearby,

    #[error("choose a starting point first")]
    NoStart,

    #[error("choose a destination first")]
    NoDestination,

    #[error("destination is {distance:.0} m away from the start, outside of the {radius:.0} m radius")]
    OutsideRadius { distance: f64, radius: f64 },

    #[error("failed to load road data: {0}")]
    Build(#[source] osm::Error),

    #[error(transparent)]
    Search(#[from] SearchError),
}

#[derive(Debug, Default)]
struct State {
    graph: Option<Arc<Graph>>,
    destination: Option<Node>,
    player: Option<Player>,
}

impl State {
    fn cancel_playback(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.cancel();
        }
    }
}

/// Clears the loading flag when dropped, so that a failed (or abandoned) build
/// never leaves the session stuck.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State of interactive route picking over road data from a [RoadDataProvider].
#[derive(Debug)]
pub struct Session<P> {
    provider: P,
    config: Mutex<SessionConfig>,
    state: Mutex<State>,
    loading: AtomicBool,
}

impl<P: RoadDataProvider> Session<P> {
    pub fn new(provider: P, config: SessionConfig) -> Self {
        Self {
            provider,
            config: Mutex::new(config),
            state: Mutex::default(),
            loading: AtomicBool::new(false),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> SessionConfig {
        *lock(&self.config)
    }

    /// Changes the radius used by the following [Session::pick_start] and
    /// [Session::pick_destination] calls. Cancels any playback.
    pub fn set_radius(&self, radius: f64) {
        lock(&self.config).radius = radius;
        self.cancel_playback();
    }

    /// Changes the animation speed or visualization. Cancels any playback.
    pub fn set_animation(&self, animation: AnimationOptions) {
        lock(&self.config).animation = animation;
        self.cancel_playback();
    }

    /// Checks if a graph is currently being built.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Returns the current graph, if a start point was successfully picked.
    pub fn graph(&self) -> Option<Arc<Graph>> {
        lock(&self.state).graph.clone()
    }

    /// Returns the snapped start point, if one was picked.
    pub fn start(&self) -> Option<Node> {
        lock(&self.state)
            .graph
            .as_ref()
            .and_then(|g| g.start_node().copied())
    }

    /// Returns the snapped destination, if one was picked.
    pub fn destination(&self) -> Option<Node> {
        lock(&self.state).destination
    }

    /// Builds a new graph around `at` and picks its start node (the node closest to `at`).
    ///
    /// Any playback is cancelled, and the previous graph and destination are discarded,
    /// unless the road data couldn't be loaded at all.
    pub async fn pick_start(&self, at: Coordinates) -> Result<Node, SessionError> {
        let _loading = LoadingGuard::acquire(&self.loading).ok_or(SessionError::Busy)?;
        self.cancel_playback();

        let config = self.config();
        let options = osm::Options {
            filter: &DEFAULT_FILTER,
            radius: config.radius,
            output: osm::OutputFormat::default(),
        };

        let g = osm::build_graph(&self.provider, at, &options)
            .await
            .map_err(|e| {
                log::warn!("failed to build a graph around ({}, {}): {e}", at.lat, at.lon);
                SessionError::Build(e)
            })?;

        let mut state = lock(&self.state);
        state.cancel_playback();
        state.destination = None;

        match g.start_node().copied() {
            Some(start) => {
                log::info!("picked start node {} at ({}, {})", start.id, start.lat, start.lon);
                state.graph = Some(Arc::new(g));
                Ok(start)
            }
            None => {
                state.graph = None;
                Err(SessionError::NoRoutesNearby)
            }
        }
    }

    /// Snaps `at` to the closest node of the current graph and picks it as the destination.
    ///
    /// The previous destination is always discarded. Destinations further from the start
    /// than the configured radius are rejected.
    pub fn pick_destination(&self, at: Coordinates) -> Result<Node, SessionError> {
        if self.is_loading() {
            return Err(SessionError::Busy);
        }

        let radius = self.config().radius;
        let mut state = lock(&self.state);
        state.destination = None;

        let g = state.graph.clone().ok_or(SessionError::NoStart)?;
        let start = g.start_node().ok_or(SessionError::NoStart)?;
        let nearest = *g
            .find_nearest_node(at.lat, at.lon)
            .ok_or(SessionError::NoStart)?;

        state.cancel_playback();

        let distance = start.coordinates().distance_to(nearest.coordinates()) * 1000.0;
        if distance > radius {
            return Err(SessionError::OutsideRadius { distance, radius });
        }

        log::info!(
            "picked destination node {} at ({}, {})",
            nearest.id,
            nearest.lat,
            nearest.lon
        );
        state.destination = Some(nearest);
        Ok(nearest)
    }

    /// Finds a route between the picked start and destination.
    pub fn solve(&self) -> Result<Route, SessionError> {
        let search = self.config().search;
        let (g, destination) = {
            let mut state = lock(&self.state);
            state.cancel_playback();
            let g = state.graph.clone().ok_or(SessionError::NoStart)?;
            let destination = state.destination.ok_or(SessionError::NoDestination)?;
            (g, destination)
        };

        let start = g.start_node().ok_or(SessionError::NoStart)?;
        Ok(find_route(&g, start.id, destination.coordinates(), &search)?)
    }

    /// Starts playing back a route into `sink`, replacing any previous playback.
    /// Must be called from within a Tokio runtime.
    pub fn play(&self, route: &Route, sink: mpsc::UnboundedSender<Frame>) {
        let frames = schedule(route, &self.config().animation);
        let mut state = lock(&self.state);
        state.cancel_playback();
        state.player = Some(Player::start(frames, sink));
    }

    /// Aborts all animation frames which haven't been sent yet.
    pub fn cancel_playback(&self) {
        lock(&self.state).cancel_playback();
    }
}

/// Locks a mutex, ignoring poisoning. Session state is always left consistent
/// between statements, so a panic while holding the lock can't corrupt it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
