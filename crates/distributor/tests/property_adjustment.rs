use ippan_distributor::*;
use proptest::prelude::*;

fn registry_with_adjustment(rate: Rate, adjustment: AdjustmentRecord) -> RecipientRegistry {
    let mut registry = RecipientRegistry::new();
    registry.push(RecipientRecord::new(Identity::derive("pool"), rate));
    registry.set_adjustment(0, adjustment).unwrap();
    registry
}

proptest! {
    #[test]
    fn reward_is_truncated_ppm_of_supply(
        supply in 0u128..=1_000_000_000_000_000_000u128,
        rate in 0u64..=1_000_000u64,
    ) {
        let reward = reward_from_supply(supply, rate).unwrap();
        prop_assert_eq!(reward, supply * rate as u128 / 1_000_000);
        prop_assert!(reward <= supply);
    }

    #[test]
    fn increase_never_moves_after_reaching_target(
        rate in 0u64..10_000,
        step in 1u64..500,
        target in 0u64..20_000,
    ) {
        let mut registry =
            registry_with_adjustment(rate, AdjustmentRecord::new(Direction::Increase, step, target));

        let mut epochs = 0u64;
        while registry.adjustment(0).unwrap().is_active() {
            let before = registry.get(0).unwrap().rate;
            let applied = registry.adjust(0).unwrap();
            prop_assert_eq!(applied.to, before + step);
            epochs += 1;
            prop_assert!(epochs <= 20_001);
        }

        let settled = registry.get(0).unwrap().rate;
        prop_assert!(settled >= target);
        if target > rate {
            prop_assert!(settled < target + step);
        } else {
            prop_assert_eq!(settled, rate + step);
        }
        let expected_epochs = if target <= rate { 1 } else { (target - rate).div_ceil(step) };
        prop_assert_eq!(epochs, expected_epochs);

        prop_assert!(registry.adjust(0).is_none());
        prop_assert_eq!(registry.get(0).unwrap().rate, settled);
    }

    #[test]
    fn decrease_never_moves_after_reaching_target(
        rate in 0u64..10_000,
        step in 1u64..500,
        target in 0u64..10_000,
    ) {
        let mut registry =
            registry_with_adjustment(rate, AdjustmentRecord::new(Direction::Decrease, step, target));

        let mut previous = rate;
        while registry.adjustment(0).unwrap().is_active() {
            let applied = registry.adjust(0).unwrap();
            prop_assert!(applied.to <= previous);
            previous = applied.to;
        }

        let settled = registry.get(0).unwrap().rate;
        prop_assert!(settled <= target);
        prop_assert!(registry.adjust(0).is_none());
        prop_assert_eq!(registry.get(0).unwrap().rate, settled);
    }

    #[test]
    fn guardian_limit_is_two_and_a_half_percent(rate in any::<u64>()) {
        let limit = guardian_step_limit(rate);
        prop_assert_eq!(limit as u128, rate as u128 * 25 / 1000);
        prop_assert!(limit <= rate);
    }
}
