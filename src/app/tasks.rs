//! Background generation of trees and renderings.
//!
//! At most one generation runs per session. A request that arrives while one
//! is running waits in the pending slot of its kind, replacing any older
//! pending request of that kind. A finished result is applied only if no
//! newer request of the same kind was issued in the meantime, and is
//! reported to the proxy of the caller that asked for it.

use std::path::PathBuf;

use crate::config::ResolvedConfig;
use crate::core::{BuildOutput, CoreError, FilterPolicy, RenderOutput, TreeBuilder, TreeGenerator};

use super::events::UserEvent;
use super::helpers::lock_state;
use super::proxy::{into_sink, EventProxy};
use super::state::{GenerationKind, GenerationRequest, Session, SessionState};

enum GenerationOutput {
    Tree(BuildOutput),
    Text(RenderOutput),
}

/// Queues a generation for `root` with the session's current config and
/// returns its id. Must be called from within a tokio runtime.
pub fn request_generation<P: EventProxy>(
    kind: GenerationKind,
    root: PathBuf,
    proxy: P,
    state: Session,
) -> u64 {
    let mut state_guard = lock_state(&state);
    let request = state_guard.next_request(kind, root, into_sink(proxy));
    let id = request.id;

    if state_guard.is_generating {
        if let Some(replaced) = state_guard.queue(request) {
            tracing::debug!("Request {} replaced pending request {}", id, replaced.id);
        }
        return id;
    }

    state_guard.is_generating = true;
    let state_clone = state.clone();
    let handle = tokio::spawn(async move {
        generation_task(request, state_clone).await;
    });
    state_guard.generation_task = Some(handle);
    id
}

/// Runs `first`, then keeps draining the pending slots until both are empty.
async fn generation_task(first: GenerationRequest, state: Session) {
    let mut request = first;
    loop {
        let GenerationRequest {
            id,
            kind,
            root,
            config,
            reply,
        } = request;
        tracing::info!("Starting generation {} ({:?}) for {}", id, kind, root.display());

        let job_root = root.clone();
        let result = tokio::task::spawn_blocking(move || run_request(kind, job_root, config))
            .await
            .map_err(CoreError::from)
            .and_then(|r| r);

        let (event, next) = {
            let mut state_guard = lock_state(&state);
            let event = apply_result(id, kind, root, result, &mut state_guard);

            let next = state_guard.take_pending();
            if next.is_none() {
                state_guard.is_generating = false;
                state_guard.generation_task = None;
            }
            (event, next)
        };
        if let Some(event) = event {
            reply(event);
        }

        match next {
            Some(next) => request = next,
            None => return,
        }
    }
}

/// Stores a finished generation unless a newer request of the same kind was
/// issued since, and returns the event to report.
fn apply_result(
    id: u64,
    kind: GenerationKind,
    root: PathBuf,
    result: Result<GenerationOutput, CoreError>,
    state: &mut SessionState,
) -> Option<UserEvent> {
    if !state.is_current(kind, id) {
        tracing::debug!(
            "Discarding generation {}, superseded by {}",
            id,
            state.latest_generation(kind)
        );
        return None;
    }

    if result.is_ok() && state.current_root.as_deref() != Some(root.as_path()) {
        state.reset_directory_state();
    }

    let event = match result {
        Ok(GenerationOutput::Tree(output)) => {
            state.current_root = Some(root);
            state.stats = output.stats;
            state.tree = Some(output.tree);
            UserEvent::TreeReady {
                generation: id,
                stats: output.stats,
            }
        }
        Ok(GenerationOutput::Text(output)) => {
            state.current_root = Some(root);
            state.stats = output.stats;
            state.rendered_text = Some(output.text.clone());
            UserEvent::RenderReady {
                generation: id,
                text: output.text,
                stats: output.stats,
            }
        }
        Err(e) => {
            tracing::warn!("Generation {} failed: {}", id, e);
            UserEvent::ShowError {
                generation: id,
                message: e.to_string(),
            }
        }
    };
    Some(event)
}

fn run_request(
    kind: GenerationKind,
    root: PathBuf,
    config: ResolvedConfig,
) -> Result<GenerationOutput, CoreError> {
    let policy = FilterPolicy::new(root, config);
    match kind {
        GenerationKind::Build => TreeBuilder::new(policy).run().map(GenerationOutput::Tree),
        GenerationKind::Render => TreeGenerator::new(policy).run().map(GenerationOutput::Text),
    }
}
