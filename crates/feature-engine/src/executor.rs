//! Per-channel execution of a resolved plan

use crate::error::{ExtractionError, Result};
use crate::registry::FeatureContext;
use crate::resolver::ResolvedPlan;

/// Position of a channel in the input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub epoch: usize,
    pub channel: usize,
}

/// Runs every feature of a plan on single-channel signals
pub struct ChannelExecutor<'a> {
    plan: &'a ResolvedPlan,
    ctx: FeatureContext<'a>,
}

impl<'a> ChannelExecutor<'a> {
    pub fn new(plan: &'a ResolvedPlan, ctx: FeatureContext<'a>) -> Self {
        Self { plan, ctx }
    }

    /// Values produced per channel
    pub fn width(&self) -> usize {
        self.plan.width()
    }

    /// Compute all features of one channel into `out`, in plan order.
    ///
    /// `out` must be exactly [`width`](Self::width) long.
    pub fn execute(&self, at: Location, samples: &[f64], out: &mut [f64]) -> Result<()> {
        debug_assert_eq!(out.len(), self.width());

        let mut offset = 0;
        for feature in self.plan.features() {
            let value = feature
                .def()
                .compute(samples, feature.params(), &self.ctx)
                .map_err(|source| ExtractionError::FeatureFailed {
                    alias: feature.alias().to_string(),
                    epoch: at.epoch,
                    channel: at.channel,
                    source,
                })?;

            let values = value.as_slice();
            if values.len() != feature.width() {
                return Err(ExtractionError::ArityMismatch {
                    alias: feature.alias().to_string(),
                    expected: feature.width(),
                    actual: values.len(),
                });
            }
            out[offset..offset + values.len()].copy_from_slice(values);
            offset += values.len();
        }
        Ok(())
    }

    /// Convenience wrapper allocating the output row
    pub fn execute_to_vec(&self, at: Location, samples: &[f64]) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.width()];
        self.execute(at, samples, &mut out)?;
        Ok(out)
    }
}
