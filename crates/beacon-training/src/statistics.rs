use serde::{Deserialize, Serialize};

/// Summary of the fitness values in one generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Upper median for even-sized populations.
    pub median: f32,
    /// Population standard deviation.
    pub std_dev: f32,
}

impl FitnessStats {
    /// Computes statistics from unsorted values.
    ///
    /// Returns `None` if `values` is empty.
    ///
    /// ```
    /// # use beacon_training::statistics::FitnessStats;
    /// let stats = FitnessStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f32::total_cmp);

        let min = *values.first()?;
        let max = *values.last()?;
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let median = values[values.len() / 2];
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;

        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}
