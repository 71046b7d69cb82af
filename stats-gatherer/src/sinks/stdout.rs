use super::{
    MetricSink,
    SinkError,
    SinkFuture,
};
use crate::metrics::MergedMetricSample;

/// Prints every sample as a JSON line. Useful for dry runs.
pub struct StdoutSink;

impl MetricSink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn write<'a>(&'a self, sample: &'a MergedMetricSample) -> SinkFuture<'a> {
        Box::pin(async move {
            let line = serde_json::to_string(sample).map_err(SinkError::from)?;
            println!("{line}");
            Ok(())
        })
    }
}
