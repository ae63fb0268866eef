//! Defines the central, mutable state of a session.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::config::{ResolvedConfig, DEFAULT_PROFILE_NAME};
use crate::core::{FileTree, Statistics};

use super::proxy::EventSink;

/// The shared handle every task and command works through.
pub type Session = Arc<Mutex<SessionState>>;

/// What a generation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    /// A checkable [`FileTree`].
    Build,
    /// The ASCII rendering.
    Render,
}

impl GenerationKind {
    fn slot(self) -> usize {
        match self {
            GenerationKind::Build => 0,
            GenerationKind::Render => 1,
        }
    }
}

/// One user-triggered generation, owning its config snapshot and the sink
/// its outcome is reported to.
#[derive(Clone)]
pub struct GenerationRequest {
    pub id: u64,
    pub kind: GenerationKind,
    pub root: PathBuf,
    pub config: ResolvedConfig,
    pub reply: EventSink,
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Holds the complete, mutable state of a session.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` ([`Session`]) so that
/// commands and the background generation task can share it.
///
/// Builds and renders supersede only requests of their own kind: each kind
/// has its own newest id and its own pending slot. A single worker drains
/// both slots, so at most one generation is in flight.
#[derive(Debug)]
pub struct SessionState {
    /// Name of the profile `config` was resolved from.
    pub profile_name: String,
    /// The filter settings used for the next generation.
    pub config: ResolvedConfig,
    /// The root of the most recent generation.
    pub current_root: Option<PathBuf>,
    /// The tree of the most recent build. Selection commands act on it.
    pub tree: Option<FileTree>,
    /// Statistics of the most recent build or render.
    pub stats: Statistics,
    /// Text of the most recent render.
    pub rendered_text: Option<String>,
    /// `true` while a generation task is running.
    pub is_generating: bool,
    /// A handle to the running generation task.
    pub generation_task: Option<JoinHandle<()>>,
    /// Last id handed out, across both kinds.
    last_issued: u64,
    /// Newest id per kind. Older results of that kind are discarded.
    latest: [u64; 2],
    /// At most one waiting request per kind.
    pending: [Option<GenerationRequest>; 2],
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            profile_name: DEFAULT_PROFILE_NAME.to_string(),
            config: ResolvedConfig::default(),
            current_root: None,
            tree: None,
            stats: Statistics::default(),
            rendered_text: None,
            is_generating: false,
            generation_task: None,
            last_issued: 0,
            latest: [0; 2],
            pending: [None, None],
        }
    }
}

impl SessionState {
    pub fn new(profile_name: impl Into<String>, config: ResolvedConfig) -> Self {
        Self {
            profile_name: profile_name.into(),
            config,
            ..Default::default()
        }
    }

    /// Wraps a new state into a shareable [`Session`].
    pub fn shared(profile_name: impl Into<String>, config: ResolvedConfig) -> Session {
        Arc::new(Mutex::new(Self::new(profile_name, config)))
    }

    /// Issues the id for a new request and snapshots the current config.
    /// The request becomes the newest of its kind.
    pub fn next_request(&mut self, kind: GenerationKind, root: PathBuf, reply: EventSink) -> GenerationRequest {
        self.last_issued += 1;
        self.latest[kind.slot()] = self.last_issued;
        GenerationRequest {
            id: self.last_issued,
            kind,
            root,
            config: self.config.clone(),
            reply,
        }
    }

    /// `true` if `id` is still the newest request of its kind.
    pub fn is_current(&self, kind: GenerationKind, id: u64) -> bool {
        self.latest[kind.slot()] == id
    }

    /// Newest id issued for `kind`, zero if none.
    pub fn latest_generation(&self, kind: GenerationKind) -> u64 {
        self.latest[kind.slot()]
    }

    /// Parks `request` until the worker is free, returning the request of
    /// the same kind it replaces.
    pub fn queue(&mut self, request: GenerationRequest) -> Option<GenerationRequest> {
        self.pending[request.kind.slot()].replace(request)
    }

    /// Takes the oldest waiting request.
    pub fn take_pending(&mut self) -> Option<GenerationRequest> {
        let slot = self
            .pending
            .iter()
            .enumerate()
            .filter_map(|(slot, request)| request.as_ref().map(|r| (slot, r.id)))
            .min_by_key(|(_, id)| *id)
            .map(|(slot, _)| slot)?;
        self.pending[slot].take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(Option::is_some)
    }

    /// Drops the loaded tree and everything derived from it.
    pub fn reset_directory_state(&mut self) {
        self.current_root = None;
        self.tree = None;
        self.stats.reset();
        self.rendered_text = None;
    }
}
