/// Run-time configuration of a [`RecordSet`](crate::RecordSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSetConfig {
    /// Slots allocated up front.
    pub initial_capacity: usize,
    /// Smallest capacity reached by automatic growth. Growth otherwise
    /// doubles the current capacity.
    pub min_growth: usize,
}

impl Default for RecordSetConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            min_growth: 4,
        }
    }
}

impl RecordSetConfig {
    /// Capacity after automatic growth from `capacity` when `required` slots
    /// are needed.
    pub(crate) fn grown_capacity(&self, capacity: usize, required: usize) -> usize {
        capacity
            .saturating_mul(2)
            .max(self.min_growth)
            .max(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_doubles_with_a_floor() {
        let config = RecordSetConfig::default();
        assert_eq!(config.grown_capacity(0, 1), 4);
        assert_eq!(config.grown_capacity(4, 5), 8);
        assert_eq!(config.grown_capacity(16, 17), 32);

        let eager = RecordSetConfig {
            initial_capacity: 0,
            min_growth: 0,
        };
        assert_eq!(eager.grown_capacity(0, 1), 1);
    }
}
