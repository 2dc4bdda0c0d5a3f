use super::{CloudApi, MetricQuery};
use chrono::{Duration, Utc};
use tracing::debug;

/// Trailing window a reading is taken from, in minutes.
pub const METRIC_WINDOW_MINUTES: i64 = 10;
/// Statistic granularity in seconds.
pub const METRIC_PERIOD_SECS: i32 = 300;

/// Reads the latest average of a metric. Every failure, including an empty
/// result, reads as `None`.
pub struct MetricReader<'a> {
    api: &'a dyn CloudApi,
}

impl<'a> MetricReader<'a> {
    pub fn new(api: &'a dyn CloudApi) -> Self {
        Self { api }
    }

    pub async fn latest_average(
        &self,
        namespace: &str,
        metric_name: &str,
        dimensions: &[(&str, &str)],
    ) -> Option<f64> {
        let end = Utc::now();
        let query = MetricQuery {
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            dimensions: dimensions
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            start: end - Duration::minutes(METRIC_WINDOW_MINUTES),
            end,
            period_secs: METRIC_PERIOD_SECS,
        };

        match self.api.get_metric_statistics(&query).await {
            Ok(datapoints) => datapoints
                .into_iter()
                .max_by_key(|dp| dp.timestamp)
                .and_then(|dp| dp.average),
            Err(e) => {
                debug!("📉 metric {namespace}/{metric_name} unavailable: {e:#}");
                None
            }
        }
    }
}
