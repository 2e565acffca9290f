use affix_core::config::ScalingConfig;
use affix_core::dice::{check_position, get_target_indices, NeighborTarget, PositionRequirement};
use affix_core::scaling::{fuzz_range, power_position, CurveShape};
use affix_core::status::{DecayStyle, StatusAffix, StatusInstance};
use affix_core::types::{DieType, Ordinal};
use affix_core::DieResource;
use proptest::prelude::*;
use std::sync::Arc;

fn monotonic_curve() -> impl Strategy<Value = Option<CurveShape>> {
    prop_oneof![
        Just(None),
        Just(Some(CurveShape::Linear)),
        Just(Some(CurveShape::SmoothStep)),
        (0.1f64..4.0).prop_map(|exponent| Some(CurveShape::Power { exponent })),
    ]
}

proptest! {
    #[test]
    fn power_position_is_bounded_and_non_decreasing(
        max_level in 2u32..120,
        curve in monotonic_curve(),
    ) {
        let mut previous = 0.0;
        for level in 1..=max_level {
            let t = power_position(level, max_level, curve.as_ref());
            prop_assert!((0.0..=1.0).contains(&t));
            prop_assert!(t + 1e-12 >= previous);
            previous = t;
        }
    }

    #[test]
    fn fuzz_window_stays_in_range(
        lo in -50.0f64..50.0,
        span in 0.0f64..100.0,
        t in 0.0f64..=1.0,
        pct in 0.0f64..1.0,
        floor in 0.0f64..10.0,
    ) {
        let hi = lo + span;
        let center = lo + span * t;
        let window = fuzz_range(center, lo, hi, pct, floor);
        prop_assert!(window.min >= lo && window.max <= hi);
        prop_assert!(window.min <= window.max);

        // unclamped on both sides means the window is at least 2 x floor wide
        if center - floor >= lo && center + floor <= hi {
            prop_assert!(window.width() + 1e-9 >= 2.0 * floor);
        }
    }

    #[test]
    fn zero_fuzz_collapses_to_center(
        lo in -20.0f64..20.0,
        span in 0.0f64..40.0,
        t in 0.0f64..=1.0,
    ) {
        let center = lo + span * t;
        let window = fuzz_range(center, lo, lo + span, 0.0, 0.0);
        prop_assert_eq!(window.min, center);
        prop_assert_eq!(window.max, center);
    }

    #[test]
    fn targets_are_in_bounds(n in 0usize..10, i in 0usize..10, ordinal in 0u8..8) {
        let target = NeighborTarget::from_ordinal(ordinal).unwrap();
        let indices = get_target_indices(i, n, target);
        prop_assert!(indices.iter().all(|&x| x < n));
        if matches!(
            target,
            NeighborTarget::Left | NeighborTarget::Right | NeighborTarget::AllOthers
        ) {
            prop_assert!(!indices.contains(&i));
        }
    }

    #[test]
    fn check_position_is_total(
        slot in 0usize..10,
        total in 0usize..10,
        ordinal in 0u8..8,
        required in 0usize..10,
    ) {
        let requirement = PositionRequirement::from_ordinal(ordinal).unwrap();
        let ok = check_position(slot, total, requirement, required);
        if requirement == PositionRequirement::Any {
            prop_assert!(ok);
        }
    }

    #[test]
    fn value_modifiers_never_go_below_one(
        start in 1i32..=20,
        ops in proptest::collection::vec((any::<bool>(), -30.0f64..30.0), 1..20),
    ) {
        let mut die = DieResource::new(DieType::D20).with_value(start);
        for (flat, amount) in ops {
            if flat {
                die.apply_flat_modifier(amount);
            } else {
                die.apply_percent_modifier(amount / 10.0);
            }
            prop_assert!(die.modified_value >= 1);
        }
    }

    #[test]
    fn stacks_clamp_to_max(max_stacks in 1u32..20, extra in 0u32..10) {
        let mut status = StatusAffix::new("burn", "Burn");
        status.max_stacks = max_stacks;
        let mut instance = StatusInstance::create(Arc::new(status), 1, "test");
        instance.add_stacks(max_stacks + extra);
        prop_assert_eq!(instance.current_stacks, max_stacks);
    }
}

#[test]
fn scenario_fuzz_window_small_range() {
    let config = ScalingConfig {
        global_fuzz_pct: 0.2,
        min_absolute_fuzz: 1.0,
        ..ScalingConfig::default()
    };
    let window = config.fuzz_range(3.0, 1.0, 5.0, None);
    assert!((window.min - 2.0).abs() < f64::EPSILON);
    assert!((window.max - 4.0).abs() < f64::EPSILON);
}

#[test]
fn scenario_targeting_examples() {
    assert!(get_target_indices(0, 4, NeighborTarget::Left).is_empty());
    assert_eq!(get_target_indices(2, 4, NeighborTarget::AllOthers), vec![0, 1, 3]);
}

#[test]
fn halving_one_stack_fully_decays() {
    let mut status = StatusAffix::new("poison", "Poison");
    status.max_stacks = 10;
    status.decay_style = DecayStyle::Halving;
    let mut instance = StatusInstance::create(Arc::new(status), 1, "test");
    instance.apply_decay();
    assert_eq!(instance.current_stacks, 0);
    assert!(instance.is_expired());
}
