/// Tween scheduler: timelines of from→to value animations.
///
/// The scheduler only produces values. It knows targets by id and never
/// touches them; the caller applies each `TweenUpdate` (see
/// `Game::tick`). That keeps "what to draw" separate from "when".
///
/// A timeline owns a clock and a list of entries, each starting at a fixed
/// offset on that clock. A standalone tween is a timeline with one entry at
/// offset 0. Time is in seconds.

use crate::domain::ease::Ease;

pub type TweenId = u64;
pub type TimelineId = u64;
pub type TargetId = u64;

/// What the caller should do with the target once a tween ends.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OnComplete {
    Nothing,
    Dispose,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TweenUpdate {
    pub tween: TweenId,
    pub target: TargetId,
    pub value: f64,
    /// Set on the final update of a tween (emitted exactly once).
    pub finished: bool,
    pub on_complete: OnComplete,
}

#[derive(Clone, Debug)]
struct Tween {
    id: TweenId,
    target: TargetId,
    from: f64,
    to: f64,
    start: f64,
    duration: f64,
    ease: Ease,
    on_complete: OnComplete,
    finished: bool,
}

impl Tween {
    fn sample(&mut self, clock: f64) -> Option<TweenUpdate> {
        if self.finished || clock < self.start {
            return None;
        }
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (clock - self.start) / self.duration
        };
        let finished = t >= 1.0;
        let value = if finished {
            self.to
        } else {
            self.from + (self.to - self.from) * self.ease.apply(t)
        };
        self.finished = finished;
        Some(TweenUpdate {
            tween: self.id,
            target: self.target,
            value,
            finished,
            on_complete: self.on_complete,
        })
    }
}

#[derive(Clone, Debug)]
struct Timeline {
    id: TimelineId,
    clock: f64,
    entries: Vec<Tween>,
}

impl Timeline {
    fn is_done(&self) -> bool {
        self.entries.iter().all(|e| e.finished)
    }
}

/// Parameters for one tween, shared by timeline entries and standalone tweens.
#[derive(Clone, Copy, Debug)]
pub struct FromTo {
    pub target: TargetId,
    pub from: f64,
    pub to: f64,
    pub duration: f64,
    pub ease: Ease,
    pub on_complete: OnComplete,
}

impl FromTo {
    pub fn new(target: TargetId, from: f64, to: f64, duration: f64) -> Self {
        FromTo {
            target,
            from,
            to,
            duration,
            ease: Ease::default(),
            on_complete: OnComplete::Nothing,
        }
    }

    pub fn on_complete(mut self, action: OnComplete) -> Self {
        self.on_complete = action;
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

#[derive(Default)]
pub struct Tweens {
    timelines: Vec<Timeline>,
    next_id: u64,
}

impl Tweens {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Start an empty timeline whose clock begins at 0 on the next `advance`.
    pub fn timeline(&mut self) -> TimelineId {
        let id = self.fresh_id();
        self.timelines.push(Timeline { id, clock: 0.0, entries: Vec::new() });
        id
    }

    fn entry(&mut self, spec: FromTo, at: f64) -> Tween {
        Tween {
            id: self.fresh_id(),
            target: spec.target,
            from: spec.from,
            to: spec.to,
            start: at,
            duration: spec.duration,
            ease: spec.ease,
            on_complete: spec.on_complete,
            finished: false,
        }
    }

    /// Add an entry to `timeline`, starting `at` seconds into its clock.
    /// Returns `None` if the timeline has already finished and been dropped.
    pub fn add(&mut self, timeline: TimelineId, spec: FromTo, at: f64) -> Option<TweenId> {
        let entry = self.entry(spec, at);
        let id = entry.id;
        let tl = self.timelines.iter_mut().find(|t| t.id == timeline)?;
        tl.entries.push(entry);
        Some(id)
    }

    /// Standalone tween starting now.
    pub fn tween(&mut self, spec: FromTo) -> TweenId {
        let entry = self.entry(spec, 0.0);
        let id = entry.id;
        let tl = self.fresh_id();
        self.timelines.push(Timeline { id: tl, clock: 0.0, entries: vec![entry] });
        id
    }

    /// Advance every timeline by `dt` seconds and collect value updates in
    /// scheduling order. Finished timelines are dropped afterwards.
    pub fn advance(&mut self, dt: f64) -> Vec<TweenUpdate> {
        let mut updates = Vec::new();
        for tl in &mut self.timelines {
            tl.clock += dt;
            let clock = tl.clock;
            updates.extend(tl.entries.iter_mut().filter_map(|e| e.sample(clock)));
        }
        self.timelines.retain(|tl| !tl.is_done());
        updates
    }

    /// Stop every unfinished tween driving `target`, without a final update.
    pub fn kill_target(&mut self, target: TargetId) {
        for e in self.timelines.iter_mut().flat_map(|tl| tl.entries.iter_mut()) {
            if e.target == target {
                e.finished = true;
            }
        }
        self.timelines.retain(|tl| !tl.is_done());
    }

    #[cfg(test)]
    pub fn is_running(&self, tween: TweenId) -> bool {
        self.timelines
            .iter()
            .flat_map(|tl| tl.entries.iter())
            .any(|e| e.id == tween && !e.finished)
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.timelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(target: TargetId, from: f64, to: f64, duration: f64) -> FromTo {
        FromTo::new(target, from, to, duration).ease(Ease::Linear)
    }

    #[test]
    fn standalone_tween_interpolates_and_finishes_once() {
        let mut tw = Tweens::new();
        let id = tw.tween(linear(7, 1.0, 2.0, 0.5).on_complete(OnComplete::Dispose));
        assert!(tw.is_running(id));

        let u = tw.advance(0.25);
        assert_eq!(u.len(), 1);
        assert_eq!(u[0].target, 7);
        assert!((u[0].value - 1.5).abs() < 1e-12);
        assert!(!u[0].finished);

        let u = tw.advance(0.5);
        assert_eq!(u.len(), 1);
        assert_eq!(u[0].value, 2.0);
        assert!(u[0].finished);
        assert_eq!(u[0].on_complete, OnComplete::Dispose);

        assert!(tw.advance(1.0).is_empty());
        assert!(!tw.is_running(id));
        assert!(tw.is_idle());
    }

    #[test]
    fn timeline_entries_wait_for_their_offset() {
        let mut tw = Tweens::new();
        let tl = tw.timeline();
        for i in 0..3u64 {
            tw.add(tl, linear(i, 0.0, 1.0, 1.0), i as f64 * 0.5).unwrap();
        }

        let u = tw.advance(0.25);
        assert_eq!(u.iter().map(|u| u.target).collect::<Vec<_>>(), vec![0]);

        let u = tw.advance(0.5); // clock 0.75
        assert_eq!(u.iter().map(|u| u.target).collect::<Vec<_>>(), vec![0, 1]);

        let u = tw.advance(0.5); // clock 1.25: target 0 done
        let done: Vec<_> = u.iter().filter(|u| u.finished).map(|u| u.target).collect();
        assert_eq!(done, vec![0]);
        assert_eq!(u.len(), 3);

        let u = tw.advance(10.0);
        assert_eq!(u.len(), 2);
        assert!(u.iter().all(|u| u.finished && u.value == 1.0));
        assert!(tw.is_idle());
    }

    #[test]
    fn large_step_lands_exactly_on_target() {
        let mut tw = Tweens::new();
        tw.tween(FromTo::new(1, 0.0, 1.0, 1.0));
        let u = tw.advance(3.0);
        assert_eq!(u[0].value, 1.0);
        assert!(u[0].finished);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut tw = Tweens::new();
        tw.tween(linear(1, 0.0, 5.0, 0.0));
        let u = tw.advance(0.0);
        assert_eq!(u[0].value, 5.0);
        assert!(u[0].finished);
    }

    #[test]
    fn adding_to_a_dropped_timeline_fails() {
        let mut tw = Tweens::new();
        let tl = tw.timeline();
        tw.advance(0.1); // empty timeline is done and dropped
        assert!(tw.add(tl, linear(1, 0.0, 1.0, 1.0), 0.0).is_none());
    }

    #[test]
    fn killed_target_gets_no_more_updates() {
        let mut tw = Tweens::new();
        let tl = tw.timeline();
        tw.add(tl, linear(1, 0.0, 1.0, 1.0), 0.0).unwrap();
        tw.add(tl, linear(2, 0.0, 1.0, 1.0), 0.0).unwrap();
        tw.advance(0.5);
        tw.kill_target(1);
        let u = tw.advance(0.1);
        assert_eq!(u.iter().map(|u| u.target).collect::<Vec<_>>(), vec![2]);

        tw.kill_target(2);
        assert!(tw.is_idle());
    }

    #[test]
    fn default_ease_is_power1_out() {
        let mut tw = Tweens::new();
        tw.tween(FromTo::new(1, 0.0, 1.0, 1.0));
        let u = tw.advance(0.5);
        assert!((u[0].value - 0.75).abs() < 1e-12);
    }
}
