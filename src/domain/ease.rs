/// Easing curves for tweens. Input and output are normalized to [0, 1].

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Ease {
    Linear,
    /// Quadratic ease-out, `1 - (1 - t)^2`.
    #[default]
    Power1Out,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}
