//! Statistics dashboard state

use emisi_domain::repository::ReportRepository;
use emisi_types::{Result, Statistics};
use tracing::{debug, warn};

use crate::notify::Notifier;

/// Last loaded statistics plus the loading flag
#[derive(Debug, Clone, Default)]
pub struct StatisticsBoard {
    stats: Option<Statistics>,
    loading: bool,
}

impl StatisticsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Option<&Statistics> {
        self.stats.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Mark a request as started. Returns `false` when one is already running.
    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            debug!("Statistics already loading");
            return false;
        }
        self.loading = true;
        true
    }

    /// Apply the response. A failure keeps the previous numbers on screen.
    pub fn finish_load(&mut self, result: Result<Statistics>, notifier: &mut Notifier) -> bool {
        self.loading = false;
        match result {
            Ok(stats) => {
                self.stats = Some(stats);
                true
            }
            Err(e) => {
                warn!("Failed to load statistics: {}", e);
                notifier.error(format!("Gagal memuat statistik: {}", e.user_message()));
                false
            }
        }
    }

    pub fn load<R>(&mut self, repo: &R, notifier: &mut Notifier) -> bool
    where
        R: ReportRepository + ?Sized,
    {
        if !self.begin_load() {
            return false;
        }
        let result = repo.statistics();
        self.finish_load(result, notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emisi_infra::memory::Operation;
    use emisi_infra::InMemoryBackend;
    use emisi_types::ApiError;

    #[test]
    fn test_failure_keeps_previous_numbers() {
        let backend = InMemoryBackend::new();
        let mut notifier = Notifier::default();
        let mut board = StatisticsBoard::new();
        assert!(board.load(&backend, &mut notifier));
        assert_eq!(board.stats().map(|s| s.total_kendaraan), Some(0));

        backend.fail_next(
            Operation::Statistics,
            ApiError::Status {
                status: 500,
                message: "Database error".to_string(),
            },
        );
        assert!(!board.load(&backend, &mut notifier));
        assert!(board.stats().is_some());
        assert!(!board.is_loading());
        assert_eq!(
            notifier.last().map(|t| t.message.as_str()),
            Some("Gagal memuat statistik: Database error")
        );
    }

    #[test]
    fn test_one_request_at_a_time() {
        let mut board = StatisticsBoard::new();
        assert!(board.begin_load());
        assert!(!board.begin_load());
        board.finish_load(Ok(Statistics::default()), &mut Notifier::default());
        assert!(board.begin_load());
    }
}
