use tenebra_config::Constants;

/// Reward before bonuses: 25 TST for the first stretch of the chain, 1 after.
pub fn base_block_value(last_height: i64) -> i64 {
    if last_height < 325 {
        25
    } else {
        1
    }
}

/// The first 48 bits of a solution hash as a big-endian integer.
pub fn solution_prefix_value(hash: &str) -> i64 {
    i64::from_str_radix(&hash[..12.min(hash.len())], 16).unwrap_or(i64::MAX)
}

/// PoW acceptance: the hash prefix must not exceed the current work.
pub fn check_solution(hash: &str, work: i64) -> bool {
    solution_prefix_value(hash) <= work
}

/// Nudges work towards the observed block time. A block exactly on schedule
/// leaves work unchanged.
pub fn retarget(work: i64, seconds: i64, constants: &Constants) -> i64 {
    let work_f = work as f64;
    let target = seconds as f64 * work_f / constants.seconds_per_block as f64;
    let next = work_f + (target - work_f) * constants.work_factor;
    (next.round() as i64).clamp(constants.min_work, constants.max_work)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_value_steps_down() {
        assert_eq!(base_block_value(1), 25);
        assert_eq!(base_block_value(324), 25);
        assert_eq!(base_block_value(325), 1);
        assert_eq!(base_block_value(10_000), 1);
    }

    #[test]
    fn solution_prefix() {
        assert_eq!(solution_prefix_value("000000000000ffff"), 0);
        assert_eq!(solution_prefix_value("0000000186a0ffff"), 100_000);
        assert_eq!(solution_prefix_value("ffffffffffff"), 0xffff_ffff_ffff);
    }

    #[test]
    fn solution_check_is_inclusive() {
        assert!(check_solution("0000000186a0", 100_000));
        assert!(!check_solution("0000000186a1", 100_000));
        assert!(check_solution("000000000000", 100));
    }

    #[test]
    fn retarget_is_idempotent_on_schedule() {
        let constants = Constants::default();
        assert_eq!(retarget(100_000, 60, &constants), 100_000);
        assert_eq!(retarget(50_000, 60, &constants), 50_000);
        assert_eq!(retarget(constants.min_work, 60, &constants), constants.min_work);
    }

    #[test]
    fn retarget_moves_towards_observed_time() {
        let constants = Constants::default();
        // Slow block: work drifts up, 2.5% of the way to the doubled target.
        assert_eq!(retarget(50_000, 120, &constants), 51_250);
        // Fast block: work drifts down.
        assert_eq!(retarget(50_000, 30, &constants), 49_375);
        // Instant block: full 2.5% cut.
        assert_eq!(retarget(50_000, 0, &constants), 48_750);
    }

    #[test]
    fn retarget_clamps() {
        let constants = Constants::default();
        assert_eq!(retarget(100_000, 6_000, &constants), 100_000);
        assert_eq!(retarget(100, 0, &constants), 100);
    }
}
