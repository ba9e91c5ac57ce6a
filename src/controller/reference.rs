//! Control references: resolved bindings from logical input names to live
//! scalar samples delivered by an external device backend.

use tracing::debug;

/// Scalar sample type shared across the input pipeline.
pub type ControlState = f64;

/// Clamp domain of a control reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// Samples live in [0, 1]: buttons, directional half-axes, triggers.
    Unipolar,
    /// Samples live in [-1, 1]: full axes.
    Bipolar,
}

impl Polarity {
    fn clamp(self, value: ControlState) -> ControlState {
        match self {
            Polarity::Unipolar => value.clamp(0.0, 1.0),
            Polarity::Bipolar => value.clamp(-1.0, 1.0),
        }
    }
}

/// Device-backend seam. The core never enumerates devices or parses binding
/// expressions; it only consumes resolved scalars plus a bound-count per
/// expression.
pub trait InputSource {
    /// Current sample for the expression. Only meaningful when bound.
    fn sample(&self, expression: &str) -> ControlState;

    /// Number of physical sources currently satisfying the expression.
    /// Zero means unbound.
    fn bound_count(&self, expression: &str) -> usize;
}

/// Resolved binding from a logical input name to a cached scalar sample.
///
/// An unbound reference reads neutral (0.0); callers that need to tell
/// "neutral because unbound" from "neutral because centered" check
/// [`ControlReference::is_bound`].
#[derive(Clone, Debug)]
pub struct ControlReference {
    expression: String,
    polarity: Polarity,
    state: ControlState,
    bound_count: usize,
}

impl ControlReference {
    pub fn new(polarity: Polarity) -> Self {
        Self {
            expression: String::new(),
            polarity,
            state: 0.0,
            bound_count: 0,
        }
    }

    /// Rebind to a new expression. Only the resolved expression changes;
    /// the structural shape of the owning control stays fixed.
    pub fn set_expression(&mut self, expression: impl Into<String>) {
        self.expression = expression.into();
        debug!("Control reference rebound to '{}'", self.expression);
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Cached sample, neutral when unbound.
    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn bound_count(&self) -> usize {
        self.bound_count
    }

    pub fn is_bound(&self) -> bool {
        self.bound_count > 0
    }

    /// Push a backend sample into the cache. Out-of-range samples are clamped
    /// before use so they can never reach frame encoding unclamped.
    pub fn set_input(&mut self, sample: ControlState, bound_count: usize) {
        self.bound_count = bound_count;
        self.state = if bound_count == 0 {
            0.0
        } else {
            self.polarity.clamp(sample)
        };
    }

    /// Refresh the cached sample and bound-count from a device backend.
    pub fn update(&mut self, source: &dyn InputSource) {
        let bound = source.bound_count(&self.expression);
        let sample = if bound > 0 {
            source.sample(&self.expression)
        } else {
            0.0
        };
        self.set_input(sample, bound);
    }
}
