/// Direction of an `order by` clause.
///
/// `QueryBuilder::order_by` takes a `descending` flag and stores it as a
/// `SortOrder` in the resulting query clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Smallest to largest.
    #[default]
    Ascending,
    /// Largest to smallest.
    Descending,
}

impl SortOrder {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_descending() {
        assert_eq!(SortOrder::from_descending(true), SortOrder::Descending);
        assert_eq!(SortOrder::from_descending(false), SortOrder::Ascending);
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
    }

    #[test]
    fn test_is_descending() {
        assert!(SortOrder::Descending.is_descending());
        assert!(!SortOrder::Ascending.is_descending());
    }
}
