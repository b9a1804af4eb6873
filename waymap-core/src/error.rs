use std::sync::Mutex;

/// failure modes raised by pipeline components. fatal input problems are
/// collected into an [ErrorList] instead, so these mostly cover I/O and
/// internal invariant violations that stop the run outright.
#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("failure reading input file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failure writing output file '{path}': {source}")]
    FileWrite {
        path: String,
        source: std::io::Error,
    },
    #[error("failure parsing csv file '{path}': {message}")]
    CsvFormat { path: String, message: String },
    #[error("waypoint index is invalid: {0}")]
    IndexInvalid(String),
    #[error("{count} fatal data error(s) found, see console log")]
    FatalDataErrors { count: usize },
    #[error("internal error: {0}")]
    Internal(String),
}

/// accumulator for fatal data errors. any entry present at the pre-output
/// gate aborts the run before stats, graphs, or the database file are
/// written. appends may come from parallel workers.
#[derive(Debug, Default)]
pub struct ErrorList {
    entries: Mutex<Vec<String>>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&self, message: String) {
        log::error!("{message}");
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(message);
    }

    pub fn count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// drain all collected errors, for final reporting.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_list_accumulates() {
        let el = ErrorList::new();
        assert!(el.is_empty());
        el.add_error(String::from("bad line"));
        el.add_error(String::from("worse line"));
        assert_eq!(el.count(), 2);
        assert_eq!(el.take(), vec!["bad line", "worse line"]);
        assert!(el.is_empty());
    }
}
