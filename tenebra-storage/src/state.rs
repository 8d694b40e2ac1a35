use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::VecDeque;
use tenebra_config::Constants;

/// One sample per minute for 24 hours.
const WORK_OVER_TIME_CAP: usize = 1440;

#[derive(Debug)]
struct Inner {
    work: i64,
    validator: String,
    mining_enabled: bool,
    staking_enabled: bool,
    free_nonce: bool,
    motd: String,
    motd_date: DateTime<Utc>,
    genesis_genned: bool,
    work_over_time: VecDeque<i64>,
}

/// Process-wide mutable state: the hot values every submission reads and the
/// one-per-minute work ring. Not durable; reconstructed on restart with the
/// validator empty and work at `max_work`.
pub struct FastState {
    inner: RwLock<Inner>,
}

impl FastState {
    pub fn new(constants: &Constants, mining_enabled: bool, staking_enabled: bool) -> Self {
        Self {
            inner: RwLock::new(Inner {
                work: constants.max_work,
                validator: String::new(),
                mining_enabled,
                staking_enabled,
                free_nonce: false,
                motd: "Welcome to Tenebra!".to_string(),
                motd_date: Utc::now(),
                genesis_genned: false,
                work_over_time: VecDeque::with_capacity(WORK_OVER_TIME_CAP),
            }),
        }
    }

    pub fn work(&self) -> i64 {
        self.inner.read().work
    }

    pub fn set_work(&self, work: i64) {
        self.inner.write().work = work;
    }

    pub fn validator(&self) -> String {
        self.inner.read().validator.clone()
    }

    pub fn set_validator(&self, validator: String) {
        self.inner.write().validator = validator;
    }

    pub fn mining_enabled(&self) -> bool {
        self.inner.read().mining_enabled
    }

    pub fn staking_enabled(&self) -> bool {
        self.inner.read().staking_enabled
    }

    pub fn free_nonce(&self) -> bool {
        self.inner.read().free_nonce
    }

    pub fn set_free_nonce(&self, enabled: bool) {
        self.inner.write().free_nonce = enabled;
    }

    pub fn motd(&self) -> (String, DateTime<Utc>) {
        let inner = self.inner.read();
        (inner.motd.clone(), inner.motd_date)
    }

    pub fn set_motd(&self, motd: String) {
        let mut inner = self.inner.write();
        inner.motd = motd;
        inner.motd_date = Utc::now();
    }

    pub fn genesis_genned(&self) -> bool {
        self.inner.read().genesis_genned
    }

    pub fn set_genesis_genned(&self) {
        self.inner.write().genesis_genned = true;
    }

    /// Records the current work at the front of the ring, dropping the
    /// oldest sample beyond 24 hours.
    pub fn sample_work(&self) {
        let mut inner = self.inner.write();
        let work = inner.work;
        inner.work_over_time.push_front(work);
        inner.work_over_time.truncate(WORK_OVER_TIME_CAP);
    }

    /// Newest-first snapshot of the ring.
    pub fn work_over_time(&self) -> Vec<i64> {
        self.inner.read().work_over_time.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FastState {
        FastState::new(&Constants::default(), true, false)
    }

    #[test]
    fn defaults_follow_constants() {
        let state = state();
        assert_eq!(state.work(), 100_000);
        assert_eq!(state.validator(), "");
        assert!(state.mining_enabled());
        assert!(!state.staking_enabled());
        assert!(!state.free_nonce());
    }

    #[test]
    fn work_ring_is_capped_and_newest_first() {
        let state = state();
        for i in 0..(WORK_OVER_TIME_CAP + 5) {
            state.set_work(i as i64);
            state.sample_work();
        }
        let ring = state.work_over_time();
        assert_eq!(ring.len(), WORK_OVER_TIME_CAP);
        assert_eq!(ring[0], (WORK_OVER_TIME_CAP + 4) as i64);
        assert_eq!(ring[1], (WORK_OVER_TIME_CAP + 3) as i64);
    }

    #[test]
    fn motd_updates_stamp() {
        let state = state();
        let (_, before) = state.motd();
        state.set_motd("hello".into());
        let (motd, after) = state.motd();
        assert_eq!(motd, "hello");
        assert!(after >= before);
    }
}
