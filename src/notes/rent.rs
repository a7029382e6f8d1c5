//! Storage deposits
//!
//! Allocating a slot reserves a deposit from the owner large enough to keep
//! the slot alive indefinitely. Deleting the slot hands the deposit back.

/// Fixed per-account bookkeeping cost, charged as if it were data bytes
pub const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

pub const DEFAULT_LAMPORTS_PER_BYTE_YEAR: u64 = 3480;
pub const DEFAULT_EXEMPTION_THRESHOLD_YEARS: u64 = 2;

/// Deposit pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentSchedule {
    pub lamports_per_byte_year: u64,
    pub exemption_threshold_years: u64,
}

impl Default for RentSchedule {
    fn default() -> Self {
        Self {
            lamports_per_byte_year: DEFAULT_LAMPORTS_PER_BYTE_YEAR,
            exemption_threshold_years: DEFAULT_EXEMPTION_THRESHOLD_YEARS,
        }
    }
}

impl RentSchedule {
    pub fn new(lamports_per_byte_year: u64, exemption_threshold_years: u64) -> Self {
        Self {
            lamports_per_byte_year,
            exemption_threshold_years,
        }
    }

    /// A schedule under which storage costs nothing
    pub fn free() -> Self {
        Self::new(0, 0)
    }

    /// Deposit needed to keep `data_len` bytes alive
    pub fn minimum_deposit(&self, data_len: usize) -> u64 {
        (ACCOUNT_STORAGE_OVERHEAD.saturating_add(data_len as u64))
            .saturating_mul(self.lamports_per_byte_year)
            .saturating_mul(self.exemption_threshold_years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::layout::NOTE_ACCOUNT_SPACE;

    #[test]
    fn test_default_note_deposit() {
        // (128 + 615) * 3480 * 2
        assert_eq!(
            RentSchedule::default().minimum_deposit(NOTE_ACCOUNT_SPACE),
            5_171_280
        );
    }

    #[test]
    fn test_free_schedule() {
        assert_eq!(RentSchedule::free().minimum_deposit(NOTE_ACCOUNT_SPACE), 0);
    }

    #[test]
    fn test_saturates_instead_of_overflowing() {
        let schedule = RentSchedule::new(u64::MAX, 2);
        assert_eq!(schedule.minimum_deposit(1), u64::MAX);
    }
}
