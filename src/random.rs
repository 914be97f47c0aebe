use rand::Rng;

/// Exponential variates drawn from an injected uniform source.
///
/// The source is owned, so two engines never share random state.
pub struct VariateSource<R> {
    rng: R,
}

impl<R: Rng> VariateSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Inverse-CDF sample `-ln(1 - U) / rate` with `U` in `[0, 1)`.
    pub fn exponential(&mut self, rate: f64) -> f64 {
        let u = self.rng.gen::<f64>();
        -(1.0 - u).ln() / rate
    }
}
