//! Reflow: replaying an interaction without pointer input
//!
//! A reflow measures the interactable's current rect and drives a synthetic
//! interaction through the full lifecycle, using the rect's top-left corner
//! as the gesture origin:
//!
//! ```text
//! <name>reflow → before-action-start → <name>start
//!              → before-action-move  → <name>move   (delta = cur − prev)
//!              → pointer up
//!              → before-action-end ──Veto──► pending until stop()
//!                        │
//!                        └──► <name>end → interaction leaves the scope
//! ```
//!
//! [`Interactable::reflow`] always returns immediately. The returned
//! [`ReflowHandle`] is a future that resolves to the interactable once the
//! end has been emitted. That happens during the call when nothing vetoes,
//! or later when something calls [`Interaction::stop`].
//!
//! ```rust
//! use grasp_core::{Rect, Scope, Target};
//!
//! let scope = Scope::new();
//! let panel = scope.interactable(Target::element(1));
//! panel.set_rect_checker(|_| Some(Rect::new(100.0, 200.0, 300.0, 400.0)));
//!
//! let reflow = panel.reflow("resize").unwrap();
//! assert!(!reflow.interaction().interacting());
//! assert_eq!(pollster::block_on(reflow).unwrap(), panel);
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::watch;

use crate::actions::ActionProps;
use crate::error::{GraspError, Result};
use crate::event::EventPhase;
use crate::geometry::{Coords, Rect};
use crate::interactable::Interactable;
use crate::interaction::{Interaction, InteractionPhase, PointerId, PointerType};
use crate::scope::Scope;
use crate::signals::channels;

/// Deferred completion of a reflow
///
/// Resolves to the reflowed interactable once the interaction has ended.
/// Polling is only needed to observe completion; the sequence itself runs
/// whether or not the handle is awaited.
pub struct ReflowHandle {
    interactable: Interactable,
    interaction: Interaction,
    done: watch::Receiver<bool>,
    wait: Pin<Box<dyn Future<Output = Result<Interactable>>>>,
}

impl ReflowHandle {
    fn new(interactable: &Interactable, interaction: &Interaction) -> Self {
        let mut completion = interaction.completion();
        let resolved = interactable.clone();
        let wait = Box::pin(async move {
            let completed = completion.wait_for(|done| *done).await.is_ok();
            if completed {
                Ok(resolved)
            } else {
                Err(GraspError::ReflowAbandoned)
            }
        });

        Self {
            interactable: interactable.clone(),
            interaction: interaction.clone(),
            done: interaction.completion(),
            wait,
        }
    }

    /// The interaction driving this reflow
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn interactable(&self) -> &Interactable {
        &self.interactable
    }

    /// Whether the end has been emitted
    pub fn is_complete(&self) -> bool {
        *self.done.borrow()
    }
}

impl Future for ReflowHandle {
    type Output = Result<Interactable>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().wait.as_mut().poll(cx)
    }
}

impl fmt::Debug for ReflowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflowHandle")
            .field("interaction", &self.interaction)
            .field("complete", &self.is_complete())
            .finish()
    }
}

pub(crate) fn reflow(interactable: &Interactable, action: ActionProps) -> Result<ReflowHandle> {
    if interactable.is_unset() {
        return Err(GraspError::InteractableUnset);
    }
    let scope = interactable.scope()?;
    if !scope.actions().contains(&action.name) {
        return Err(GraspError::InvalidActionName(action.name));
    }
    let rect = interactable
        .rect()
        .ok_or(GraspError::MeasurementUnavailable)?;

    let running = scope.interactions().find(|i| {
        i.interacting()
            && i.interactable().as_ref() == Some(interactable)
            && i.prepared().is_some_and(|p| p.name == action.name)
    });
    if let Some(running) = running {
        tracing::debug!(
            interaction = running.id().0,
            action = %action.name,
            "reflow joins running interaction"
        );
        running.begin_sequence();
        running.do_move();
        if running.end_sequence() {
            running.stop();
        }
        return Ok(ReflowHandle::new(interactable, &running));
    }

    Ok(start_reflow(&scope, interactable, action, rect))
}

fn start_reflow(
    scope: &Scope,
    interactable: &Interactable,
    action: ActionProps,
    rect: Rect,
) -> ReflowHandle {
    let interaction = scope.new_interaction(PointerType::Reflow);
    let name = action.name.clone();
    tracing::debug!(
        interaction = interaction.id().0,
        action = %name,
        target = %interactable.target(),
        "reflow"
    );

    interaction.prepare(
        interactable,
        action,
        rect,
        Coords::at(rect.origin(), scope.now()),
    );
    interaction.pointer_down(PointerId::SYNTHETIC);
    let handle = ReflowHandle::new(interactable, &interaction);

    interaction.begin_sequence();
    interaction.set_phase(InteractionPhase::Reflowed);
    interaction.fire_phase(EventPhase::Reflow, None);

    if !interaction.start() {
        interaction.pointer_up(PointerId::SYNTHETIC);
        interaction.end_sequence();
        interaction.terminate();
        return handle;
    }

    if interaction.phase() == InteractionPhase::Ended {
        interaction.end_sequence();
        return handle;
    }
    interaction.do_move();
    interaction.pointer_up(PointerId::SYNTHETIC);
    if interaction.phase() == InteractionPhase::Ended {
        interaction.end_sequence();
        return handle;
    }
    interaction.set_phase(InteractionPhase::Ending);

    let vetoed = scope
        .signals()
        .fire(channels::BEFORE_ACTION_END, &interaction.payload())
        .is_veto();
    let stop_requested = interaction.end_sequence();

    if vetoed && !stop_requested {
        tracing::debug!(
            interaction = interaction.id().0,
            action = %name,
            "end vetoed; waiting for stop"
        );
        return handle;
    }

    interaction.finish();
    handle
}
