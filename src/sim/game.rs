/// Game: the round state machine.
///
///   Idle ──build()──▶ Active ──consume() empties queue / clear()──▶ Idle
///
/// The queue is FIFO and only its head can be consumed. A step is
/// consumable once its decorator is ready (entry animation done) and the
/// pressed direction matches the step's direction.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use crate::domain::decorator::{DecorationSurface, Decorator, Gradient};
use crate::domain::ease::Ease;
use crate::domain::geometry::{Direction, Position};
use crate::domain::walk::{self, DirectionSource};
use crate::sim::event::GameEvent;
use crate::sim::host::TextEditor;
use crate::sim::tween::{FromTo, OnComplete, TargetId, TweenId, Tweens};

pub const STEP_COUNT: usize = 10;
/// Seconds between consecutive entry animations on the round timeline.
pub const ENTRY_STAGGER: f64 = 0.5;
pub const ENTRY_DURATION: f64 = 1.0;
pub const EXIT_DURATION: f64 = 0.5;
pub const DEFAULT_READY_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Step {
    pub id: TargetId,
    pub position: Position,
    pub direction: Direction,
}

pub struct Game {
    ready_epsilon: f64,
    ease: Ease,
    queue: VecDeque<Step>,
    occupied: HashSet<Position>,
    /// Decorators of queued steps and of consumed steps still animating out.
    decorators: HashMap<TargetId, Decorator>,
    tweens: Tweens,
    next_id: TargetId,
}

impl Game {
    pub fn new(ready_epsilon: f64, ease: Ease) -> Self {
        Game {
            ready_epsilon,
            ease,
            queue: VecDeque::with_capacity(STEP_COUNT),
            occupied: HashSet::with_capacity(STEP_COUNT),
            decorators: HashMap::with_capacity(STEP_COUNT),
            tweens: Tweens::new(),
            next_id: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn head(&self) -> Option<&Step> {
        self.queue.front()
    }

    #[cfg(test)]
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.queue.iter()
    }

    #[cfg(test)]
    pub fn occupied(&self) -> &HashSet<Position> {
        &self.occupied
    }

    #[cfg(test)]
    pub fn decorator(&self, id: TargetId) -> Option<&Decorator> {
        self.decorators.get(&id)
    }

    /// Start a new round from the caret. No-op without an editor.
    ///
    /// Entry animations share one timeline, step `i` starting at
    /// `i * ENTRY_STAGGER`. Each decorator is drawn at progress 0 right away.
    pub fn build<E: TextEditor>(
        &mut self,
        editor: Option<&mut E>,
        source: &mut impl DirectionSource,
    ) -> Vec<GameEvent> {
        let Some(editor) = editor else {
            tracing::debug!("build skipped: no active editor");
            return Vec::new();
        };

        let mut events = Vec::new();
        let discarded = self.clear(&mut *editor);
        if discarded > 0 {
            events.push(GameEvent::RoundCleared { discarded });
        }

        let start = editor.caret();
        let walk = walk::generate(start, STEP_COUNT, &mut self.occupied, source);
        let timeline = self.tweens.timeline();
        let mut rng = rand::thread_rng();

        for (i, ws) in walk.iter().enumerate() {
            self.next_id += 1;
            let id = self.next_id;

            let glyph = editor.glyph_at(ws.position);
            let mut decorator = Decorator::new(ws.position, glyph, Gradient::random(&mut rng));
            decorator.render_at_progress(&mut *editor, 0.0);
            self.decorators.insert(id, decorator);

            let entry = FromTo::new(id, 0.0, 1.0, ENTRY_DURATION).ease(self.ease);
            self.tweens.add(timeline, entry, i as f64 * ENTRY_STAGGER);

            tracing::trace!(id, cell = %ws.position.key(), direction = %ws.direction, "step queued");
            self.queue.push_back(Step { id, position: ws.position, direction: ws.direction });
        }

        let path: String = self.queue.iter().map(|s| s.direction.arrow()).collect();
        tracing::debug!(%start, steps = self.queue.len(), %path, "round built");
        events.push(GameEvent::RoundBuilt { steps: self.queue.len() });
        events
    }

    /// Try to advance past the head step with `direction`.
    ///
    /// On success the step leaves the queue and the occupied set, and its
    /// exit animation starts; the returned handle identifies that tween.
    /// On failure nothing changes.
    pub fn consume(&mut self, direction: Direction, surface: &mut dyn DecorationSurface) -> Option<TweenId> {
        let head = self.queue.front()?;
        if head.direction != direction {
            return None;
        }
        let ready = self
            .decorators
            .get(&head.id)
            .is_some_and(|d| d.is_ready(self.ready_epsilon));
        if !ready {
            return None;
        }

        let step = self.queue.pop_front()?;
        self.occupied.remove(&step.position);

        // The entry tween may still owe its last frame when readiness came
        // from the tolerance; it must not overwrite the exit.
        self.tweens.kill_target(step.id);
        if let Some(d) = self.decorators.get_mut(&step.id) {
            d.render_at_progress(surface, 1.0);
        }
        let exit = FromTo::new(step.id, 1.0, 2.0, EXIT_DURATION)
            .ease(self.ease)
            .on_complete(OnComplete::Dispose);
        Some(self.tweens.tween(exit))
    }

    /// Abort the round: dispose every queued step now. Returns how many were
    /// discarded. Steps already animating out finish on their own.
    pub fn clear(&mut self, surface: &mut dyn DecorationSurface) -> usize {
        let discarded = self.queue.len();
        for step in self.queue.drain(..) {
            self.tweens.kill_target(step.id);
            if let Some(mut d) = self.decorators.remove(&step.id) {
                d.dispose(surface);
            }
        }
        self.occupied.clear();
        discarded
    }

    /// `clear` without a surface to draw on: every step and decorator is
    /// dropped, queued or exiting, since no overlay can be removed later.
    pub fn abandon(&mut self) -> usize {
        let discarded = self.queue.len();
        for step in self.queue.drain(..) {
            self.tweens.kill_target(step.id);
        }
        for id in self.decorators.keys() {
            self.tweens.kill_target(*id);
        }
        self.decorators.clear();
        self.occupied.clear();
        discarded
    }

        /// Advance animations by `dt` and redraw whatever they touched.
    pub fn tick(&mut self, dt: Duration, surface: &mut dyn DecorationSurface) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for update in self.tweens.advance(dt.as_secs_f64()) {
            let Some(decorator) = self.decorators.get_mut(&update.target) else {
                continue;
            };
            decorator.render_at_progress(surface, update.value);

            if !update.finished {
                continue;
            }
            match update.on_complete {
                OnComplete::Dispose => {
                    decorator.dispose(surface);
                    self.decorators.remove(&update.target);
                }
                OnComplete::Nothing => {
                    events.push(GameEvent::StepReady { position: decorator.position() });
                }
            }
        }
        events
    }

    /// No decorator is left on screen and no tween is pending.
    #[cfg(test)]
    pub fn is_settled(&self) -> bool {
        self.decorators.is_empty() && self.tweens.is_idle()
    }
}
