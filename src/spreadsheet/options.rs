use crate::spreadsheet::number::DateSystem;

/// Options controlling how a sheet is decoded.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Date system for serial numbers, overriding the workbook's `date1904` flag.
    pub date_system: Option<DateSystem>,

    /// Maximum number of data rows to read (the header is not counted).
    pub rows_limit: Option<usize>,
}

impl ReadOptions {
    /// Checks whether `count` rows already reached the row limit.
    pub(crate) fn reached_limit(&self, count: usize) -> bool {
        self.rows_limit.is_some_and(|limit| count >= limit)
    }

    /// Picks the date system: the override if set, else the workbook's.
    pub(crate) fn date_system_or(&self, workbook: DateSystem) -> DateSystem {
        self.date_system.unwrap_or(workbook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ReadOptions::default();
        assert!(!options.reached_limit(usize::MAX));
        assert_eq!(options.date_system_or(DateSystem::V1904), DateSystem::V1904);
    }

    #[test]
    fn overrides() {
        let options = ReadOptions {
            date_system: Some(DateSystem::V1900),
            rows_limit: Some(2),
        };
        assert!(!options.reached_limit(1));
        assert!(options.reached_limit(2));
        assert_eq!(options.date_system_or(DateSystem::V1904), DateSystem::V1900);
    }
}
