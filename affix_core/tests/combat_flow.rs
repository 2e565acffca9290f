use affix_core::config::parse_set_catalog;
use affix_core::dice::DieEvent;
use affix_core::prelude::*;
use affix_core::value_source::STAT_NAME_KEY;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

const SETS: &str = r#"
[[sets]]
set_id = "ember"
name = "Ember Regalia"
total_pieces = 3

[[sets.thresholds]]
required_pieces = 2

[[sets.thresholds.affixes]]
name = "Kindled"
category = "damage_bonus"
effect_number = 2.0

[[sets.thresholds.dice_affixes]]
name = "Ember Mark"
trigger = "passive"
effect_type = "add_tag"
effect_data = { tag = "ember" }

[[sets.thresholds]]
required_pieces = 3

[[sets.thresholds.dice_affixes]]
name = "Ignite"
effect_type = "grant_status_effect"
effect_value = 1.0
effect_data = { status_id = "burn" }
"#;

fn ember_piece(name: &str, slot: EquipmentSlot) -> Item {
    Item::new(name, slot, Rarity::Rare)
        .with_set("ember")
        .with_die(DieResource::new(DieType::D6))
}

fn sword() -> Item {
    let mighty = Affix::new("Mighty", AffixCategory::DamageBonus, 0.5)
        .with_value_source(ValueSource::PlayerStat)
        .with_data(STAT_NAME_KEY, json!("strength"));
    Item::new("Longsword", EquipmentSlot::MainHand, Rarity::Uncommon)
        .with_affix(mighty)
        .with_die(DieResource::new(DieType::D8))
}

/// Host-side sync: item affixes and dice into the pools
fn load_items(player: &PlayerState, affixes: &mut AffixPool, dice: &mut DicePool) {
    for item in player.equipment.items() {
        for affix in &item.affixes {
            affixes.add(affix.instantiate(&format!("item:{}", item.name), "item"));
        }
        for die in &item.dice {
            dice.add_die(die.clone());
        }
    }
}

#[test]
fn equip_roll_and_tick() {
    let mut player = PlayerState::new("Hero", 40.0).with_stat("strength", 5.0);
    player.equipment.equip(ember_piece("Ember Hood", EquipmentSlot::Head));
    player.equipment.equip(ember_piece("Ember Grips", EquipmentSlot::Gloves));
    player.equipment.equip(ember_piece("Ember Treads", EquipmentSlot::Boots));
    player.equipment.equip(sword());

    let mut affixes = AffixPool::new();
    let mut dice = DicePool::new();
    load_items(&player, &mut affixes, &mut dice);
    assert_eq!(dice.len(), 4);

    let mut tracker = SetBonusTracker::new(parse_set_catalog(SETS).unwrap());
    let changes = tracker.recalculate_all(&player.equipment, &mut affixes, &mut dice);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].new_count, 3);
    assert_eq!(tracker.active_thresholds("ember"), vec![2, 3]);

    let evaluator = AffixEvaluator::new(ScalingConfig::default());
    let engine = DiceAffixEngine::with_defaults();
    let registry = StatusRegistry::with_defaults();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    let events = {
        let ctx = EvalContext::new().with_player(&player).with_turn(1);
        let totals = affixes.evaluate_all(&evaluator, &ctx);
        // Kindled 2.0 + Mighty 0.5 x strength 5
        assert!((totals.get(AffixCategory::DamageBonus) - 4.5).abs() < f64::EPSILON);
        dice.roll_all(&engine, &ctx, &mut rng)
    };

    let marked: Vec<_> = dice.dice().iter().filter(|d| d.has_tag("ember")).collect();
    assert_eq!(marked.len(), 3);
    assert!(marked.iter().all(|d| d.die_type == DieType::D6));

    let granted = events
        .iter()
        .filter(|e| matches!(e, DieEvent::StatusGranted { .. }))
        .count();
    assert_eq!(granted, 3);

    let mut enemy_statuses = StatusTracker::new();
    enemy_statuses.apply_die_events(&registry, &events, &player.name);
    assert_eq!(enemy_statuses.get("burn").unwrap().current_stacks, 3);

    let start =
        enemy_statuses.process_timing(StatusTiming::StartOfTurn, &evaluator, &EvalContext::new());
    assert!((start.total_damage - 6.0).abs() < f64::EPSILON);
    enemy_statuses.process_timing(StatusTiming::EndOfTurn, &evaluator, &EvalContext::new());
    assert_eq!(enemy_statuses.get("burn").unwrap().current_stacks, 2);
}

#[test]
fn dropping_below_threshold_strips_only_set_instances() {
    let mut player = PlayerState::new("Hero", 40.0).with_stat("strength", 5.0);
    player.equipment.equip(ember_piece("Ember Hood", EquipmentSlot::Head));
    player.equipment.equip(ember_piece("Ember Grips", EquipmentSlot::Gloves));
    player.equipment.equip(ember_piece("Ember Treads", EquipmentSlot::Boots));
    player.equipment.equip(sword());

    let mut affixes = AffixPool::new();
    let mut dice = DicePool::new();
    load_items(&player, &mut affixes, &mut dice);
    let mut tracker = SetBonusTracker::new(parse_set_catalog(SETS).unwrap());
    tracker.recalculate_all(&player.equipment, &mut affixes, &mut dice);
    assert_eq!(affixes.len(), 2);

    for slot in [EquipmentSlot::Gloves, EquipmentSlot::Boots] {
        if let Some(item) = player.equipment.unequip(slot) {
            affixes.remove_by_source(&format!("item:{}", item.name));
            dice.remove_dice_from_item(&item.name);
        }
    }
    let changes = tracker.recalculate_all(&player.equipment, &mut affixes, &mut dice);
    assert_eq!(changes[0].new_count, 1);

    let names: Vec<_> = affixes.get_all_affixes().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["Mighty"]);
    assert_eq!(dice.len(), 2);
    assert!(dice.dice().iter().all(|d| d.applied_affixes().is_empty()));

    // nothing changed, nothing reported
    assert!(tracker
        .recalculate_all(&player.equipment, &mut affixes, &mut dice)
        .is_empty());
}

#[test]
fn rolled_affix_lands_in_level_window() {
    let config = affix_core::config::default_scaling_config();
    let evaluator = AffixEvaluator::new(config.clone());
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for level in [1, 10, 25, 50] {
        let mut affix =
            Affix::new("Brawn", AffixCategory::StrengthBonus, 0.0).with_range(2.0, 20.0);
        evaluator.roll_for_level(&mut affix, level, &mut rng);
        let t = config.power_position(level);
        let center = 2.0 + 18.0 * t;
        let window = config.fuzz_range(center, 2.0, 20.0, None);
        // whole-number rolls stay inside the window
        assert!((window.min.ceil()..=window.max.floor()).contains(&affix.effect_number));
        assert_eq!(affix.effect_number.fract(), 0.0);
    }
}
