/// Running average of the scores recognized in one row.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScoreAggregator {
    sum: f64,
    count: usize,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a criterion score when it lies in (0, 10]. Returns whether it was counted.
    pub fn add_criterion(&mut self, score: f64) -> bool {
        if score > 0.0 && score <= 10.0 {
            self.push(score);
            true
        } else {
            false
        }
    }

    /// Counts a generic score; range checks happen at classification, only positives count.
    pub fn add_generic(&mut self, score: f64) -> bool {
        if score > 0.0 {
            self.push(score);
            true
        } else {
            false
        }
    }

    fn push(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Rounded average, halves away from zero; 0 when nothing was counted.
    pub fn average(&self) -> u8 {
        if self.count == 0 {
            0
        } else {
            (self.sum / self.count as f64).round().clamp(0.0, 10.0) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(ScoreAggregator::new().average(), 0);
    }

    #[test]
    fn halves_round_up() {
        let mut scores = ScoreAggregator::new();
        scores.add_criterion(7.0);
        scores.add_criterion(8.0);
        assert_eq!(scores.average(), 8);
    }

    #[test]
    fn average_rounds_to_nearest() {
        let mut scores = ScoreAggregator::new();
        scores.add_generic(6.0);
        scores.add_generic(6.0);
        scores.add_generic(7.0);
        assert_eq!(scores.count(), 3);
        assert_eq!(scores.average(), 6);
    }

    #[test]
    fn criterion_range_is_half_open() {
        let mut scores = ScoreAggregator::new();
        assert!(!scores.add_criterion(0.0));
        assert!(!scores.add_criterion(-3.0));
        assert!(!scores.add_criterion(15.0));
        assert!(scores.add_criterion(10.0));
        assert!(scores.add_criterion(0.5));
        assert_eq!(scores.count(), 2);
        assert_eq!(scores.average(), 5);
    }
}
