use std::time::Instant;

/// elapsed-time stamps prefixed to console progress messages.
#[derive(Debug, Clone)]
pub struct ElapsedTime {
    start: Instant,
    precision: usize,
}

impl ElapsedTime {
    pub fn new(precision: usize) -> Self {
        Self {
            start: Instant::now(),
            precision: precision.clamp(1, 9),
        }
    }

    /// the stamp, e.g. `[12.3] `.
    pub fn et(&self) -> String {
        format!(
            "[{:.*}] ",
            self.precision,
            self.start.elapsed().as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_shape() {
        let et = ElapsedTime::new(2);
        let stamp = et.et();
        assert!(stamp.starts_with('['));
        assert!(stamp.ends_with("] "));
        let inner = &stamp[1..stamp.len() - 2];
        assert_eq!(inner.split('.').nth(1).map(str::len), Some(2));
    }
}
