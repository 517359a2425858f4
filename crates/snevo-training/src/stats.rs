/// Summary of the fitness values of one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessStats {
    pub best: f64,
    pub worst: f64,
    pub mean: f64,
    /// Upper median for even-sized populations.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl FitnessStats {
    /// Computes statistics from unsorted fitness values.
    ///
    /// Returns `None` for an empty input.
    ///
    /// ```
    /// use snevo_training::FitnessStats;
    ///
    /// let stats = FitnessStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(stats.best, 5.0);
    /// assert_eq!(stats.worst, 1.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);

        let worst = *values.first()?;
        let best = *values.last()?;
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let median = values[values.len() / 2];
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            best,
            worst,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(FitnessStats::new([]), None);
    }

    #[test]
    fn test_spread() {
        let stats = FitnessStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.best, 9.0);
        assert_eq!(stats.worst, 2.0);
    }
}
