//! Position gates and neighbor targeting over an ordered die sequence

use super::affix::{NeighborTarget, PositionRequirement};

/// Whether a die at `slot_index` satisfies a position requirement
///
/// Total over every requirement and `(slot_index, total_slots)` pair; an
/// empty sequence satisfies nothing but `Any`.
pub fn check_position(
    slot_index: usize,
    total_slots: usize,
    requirement: PositionRequirement,
    required_slot: usize,
) -> bool {
    if requirement == PositionRequirement::Any {
        return true;
    }
    if total_slots == 0 {
        return false;
    }
    let last = total_slots - 1;
    match requirement {
        PositionRequirement::Any => true,
        PositionRequirement::First => slot_index == 0,
        PositionRequirement::Last => slot_index == last,
        PositionRequirement::NotFirst => slot_index != 0,
        PositionRequirement::NotLast => slot_index != last,
        PositionRequirement::SpecificSlot => {
            if required_slot > last {
                tracing::warn!(
                    required_slot,
                    total_slots,
                    "required slot outside the sequence, clamping"
                );
            }
            slot_index == required_slot.min(last)
        }
        PositionRequirement::EvenSlots => slot_index % 2 == 0,
        PositionRequirement::OddSlots => slot_index % 2 == 1,
    }
}

/// Indices targeted from `source_index`, in ascending order
///
/// Out-of-range neighbors are dropped; there is no wraparound.
pub fn get_target_indices(
    source_index: usize,
    total_dice: usize,
    target: NeighborTarget,
) -> Vec<usize> {
    if source_index >= total_dice {
        return Vec::new();
    }
    let left = source_index.checked_sub(1);
    let right = Some(source_index + 1).filter(|&i| i < total_dice);

    match target {
        NeighborTarget::SelfDie => vec![source_index],
        NeighborTarget::Left => left.into_iter().collect(),
        NeighborTarget::Right => right.into_iter().collect(),
        NeighborTarget::BothNeighbors => left.into_iter().chain(right).collect(),
        NeighborTarget::AllLeft => (0..source_index).collect(),
        NeighborTarget::AllRight => (source_index + 1..total_dice).collect(),
        NeighborTarget::AllOthers => (0..total_dice).filter(|&i| i != source_index).collect(),
        NeighborTarget::AllDice => (0..total_dice).collect(),
    }
}
