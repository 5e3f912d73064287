/// Decorator: the visual overlay for one step's target cell.
///
/// `progress` drives everything:
///   0 → 1   entry: gradient-filled cell shrinks from 2x while fading in
///   1       ready: the step may be consumed
///   1 → 2   exit: gradient border grows while fading out
///
/// Each write installs a fresh overlay and then removes the previous one,
/// so a decorator never holds more than one overlay on the surface.

use rand::Rng;

use super::geometry::Position;

/// Handle to an overlay installed on a `DecorationSurface`.
pub type OverlayId = u64;

/// Anything that can show per-cell overlays (the editor view).
pub trait DecorationSurface {
    fn install(&mut self, at: Position, style: OverlayStyle) -> OverlayId;
    /// Removing an unknown or already removed id is a no-op.
    fn remove(&mut self, id: OverlayId);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Linear blend towards `other`; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    pub fn css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Top-to-bottom two-stop gradient.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Gradient {
    pub top: Rgb,
    pub bottom: Rgb,
}

impl Gradient {
    pub fn random(rng: &mut impl Rng) -> Self {
        Gradient {
            top: Rgb::new(rng.gen(), rng.gen(), rng.gen()),
            bottom: Rgb::new(rng.gen(), rng.gen(), rng.gen()),
        }
    }

    pub fn midpoint(&self) -> Rgb {
        self.top.lerp(self.bottom, 0.5)
    }

    pub fn css(&self) -> String {
        format!("linear-gradient(to bottom, {}, {})", self.top.css(), self.bottom.css())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Entry,
    Exit,
}

/// Everything needed to draw one overlay cell.
#[derive(Clone, PartialEq, Debug)]
pub struct OverlayStyle {
    pub phase: Phase,
    pub glyph: char,
    pub gradient: Gradient,
    pub scale: f64,
    /// 0.0 (invisible) ..= 1.0 (opaque)
    pub opacity: f64,
}

impl OverlayStyle {
    pub fn at_progress(glyph: char, gradient: Gradient, progress: f64) -> Self {
        if progress > 1.0 {
            OverlayStyle {
                phase: Phase::Exit,
                glyph,
                gradient,
                scale: progress,
                opacity: (2.0 - progress).clamp(0.0, 1.0),
            }
        } else {
            OverlayStyle {
                phase: Phase::Entry,
                glyph,
                gradient,
                scale: 2.0 - progress,
                opacity: progress.clamp(0.0, 1.0),
            }
        }
    }

    /// CSS-like property/value pairs describing this overlay.
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        let mut decls = vec![
            ("display", "inline-block".to_string()),
            ("position", "absolute".to_string()),
            ("color", "transparent".to_string()),
        ];
        match self.phase {
            Phase::Entry => {
                decls.push(("background-image", self.gradient.css()));
            }
            Phase::Exit => {
                decls.push(("border-width", "0.2ch".to_string()));
                decls.push(("border-style", "solid".to_string()));
                decls.push(("border-image", self.gradient.css()));
                decls.push(("border-image-slice", "1%".to_string()));
            }
        }
        decls.push(("pointer-events", "none".to_string()));
        decls.push(("transform", format!("scale({})", self.scale)));
        decls.push(("opacity", format!("{}%", self.opacity * 100.0)));
        decls.push(("z-index", "0".to_string()));
        decls
    }

    pub fn inline_style(&self) -> String {
        join_style(&self.declarations())
    }
}

/// `[("color", "red"), ("z-index", "0")]` → `"color: red; z-index: 0;"`
pub fn join_style(decls: &[(&str, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Decorator {
    position: Position,
    glyph: char,
    gradient: Gradient,
    progress: f64,
    overlay: Option<OverlayId>,
    disposed: bool,
}

impl Decorator {
    pub fn new(position: Position, glyph: char, gradient: Gradient) -> Self {
        Decorator {
            position,
            glyph,
            gradient,
            progress: 0.0,
            overlay: None,
            disposed: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    #[cfg(test)]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_ready(&self, epsilon: f64) -> bool {
        self.progress >= 1.0 - epsilon
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Set progress and redraw. Inert once disposed.
    pub fn render_at_progress(&mut self, surface: &mut dyn DecorationSurface, value: f64) {
        if self.disposed {
            return;
        }
        self.progress = value;
        let style = OverlayStyle::at_progress(self.glyph, self.gradient, value);
        tracing::trace!(at = %self.position, style = %style.inline_style(), "overlay");
        let fresh = surface.install(self.position, style);
        if let Some(old) = self.overlay.replace(fresh) {
            surface.remove(old);
        }
    }

    pub fn dispose(&mut self, surface: &mut dyn DecorationSurface) {
        if let Some(id) = self.overlay.take() {
            surface.remove(id);
        }
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemorySurface {
        live: BTreeMap<OverlayId, (Position, OverlayStyle)>,
        installs: usize,
        next: OverlayId,
    }

    impl DecorationSurface for MemorySurface {
        fn install(&mut self, at: Position, style: OverlayStyle) -> OverlayId {
            self.next += 1;
            self.installs += 1;
            self.live.insert(self.next, (at, style));
            self.next
        }

        fn remove(&mut self, id: OverlayId) {
            self.live.remove(&id);
        }
    }

    fn grad() -> Gradient {
        Gradient { top: Rgb::new(255, 0, 0), bottom: Rgb::new(0, 0, 255) }
    }

    #[test]
    fn every_write_replaces_the_single_overlay() {
        let mut s = MemorySurface::default();
        let mut d = Decorator::new(Position::new(2, 3), 'x', grad());
        for v in [0.0, 0.25, 0.5, 1.0, 1.5] {
            d.render_at_progress(&mut s, v);
            assert_eq!(s.live.len(), 1);
        }
        assert_eq!(s.installs, 5);
        let (at, style) = s.live.values().next().unwrap();
        assert_eq!(*at, Position::new(2, 3));
        assert_eq!(style.phase, Phase::Exit);
    }

    #[test]
    fn readiness_uses_tolerance() {
        let mut s = MemorySurface::default();
        let mut d = Decorator::new(Position::new(0, 0), 'a', grad());
        d.render_at_progress(&mut s, 0.5);
        assert!(!d.is_ready(1e-6));
        d.render_at_progress(&mut s, 1.0 - 1e-9);
        assert!(d.is_ready(1e-6));
        assert!(!d.is_ready(0.0));
        d.render_at_progress(&mut s, 1.0);
        assert!(d.is_ready(0.0));
    }

    #[test]
    fn dispose_is_idempotent_and_makes_writes_inert() {
        let mut s = MemorySurface::default();
        let mut d = Decorator::new(Position::new(0, 0), 'a', grad());
        d.render_at_progress(&mut s, 0.3);
        d.dispose(&mut s);
        d.dispose(&mut s);
        assert!(s.live.is_empty());
        assert!(d.is_disposed());

        d.render_at_progress(&mut s, 0.9);
        assert!(s.live.is_empty());
        assert_eq!(s.installs, 1);
        assert_eq!(d.progress(), 0.3);
    }

    #[test]
    fn entry_and_exit_curves_mirror() {
        let entry = OverlayStyle::at_progress('a', grad(), 0.25);
        assert_eq!(entry.phase, Phase::Entry);
        assert!((entry.scale - 1.75).abs() < 1e-12);
        assert!((entry.opacity - 0.25).abs() < 1e-12);

        let exit = OverlayStyle::at_progress('a', grad(), 1.75);
        assert_eq!(exit.phase, Phase::Exit);
        assert!((exit.scale - 1.75).abs() < 1e-12);
        assert!((exit.opacity - 0.25).abs() < 1e-12);

        let ready = OverlayStyle::at_progress('a', grad(), 1.0);
        assert_eq!(ready.phase, Phase::Entry);
        assert_eq!(ready.scale, 1.0);
        assert_eq!(ready.opacity, 1.0);
    }

    #[test]
    fn inline_style_lists_fixed_properties() {
        let entry = OverlayStyle::at_progress('a', grad(), 0.5).inline_style();
        assert!(entry.starts_with("display: inline-block; position: absolute; color: transparent;"));
        assert!(entry.contains("background-image: linear-gradient(to bottom, rgb(255, 0, 0), rgb(0, 0, 255));"));
        assert!(entry.contains("transform: scale(1.5);"));
        assert!(entry.contains("opacity: 50%;"));
        assert!(entry.ends_with("z-index: 0;"));

        let exit = OverlayStyle::at_progress('a', grad(), 1.5).inline_style();
        assert!(exit.contains("border-style: solid;"));
        assert!(exit.contains("border-image: linear-gradient"));
        assert!(!exit.contains("background-image"));
    }

    #[test]
    fn rgb_lerp_endpoints() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(200, 100, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 100, 100));
    }
}
