/// Number of (gender, height, weight) combinations when all three variables are observed.
pub const N_FULL : usize = 8;

/// Number of (height, weight) combinations when gender is missing.
pub const N_EFFECT : usize = 4;

/// Number of effect variables (height class, then weight class).
pub const N_EFFECT_VARS : usize = 2;

const GENDER_MASK : usize = 0b100;

const EFFECT_MASK : usize = 0b011;

/// Packs a gender hypothesis and an effect combination into the 3-bit index.
/// The reference gender occupies the lower half (gender bit = 0).
pub fn full_combo(gender_is_reference : bool, effect_combo : usize) -> usize {
    assert!(effect_combo < N_EFFECT, "Effect combination {} outside 0..4", effect_combo);
    if gender_is_reference {
        effect_combo
    } else {
        GENDER_MASK | effect_combo
    }
}

/// Whether the 3-bit index carries the reference gender.
pub fn gender_is_reference(full_combo : usize) -> bool {
    assert!(full_combo < N_FULL, "Full combination {} outside 0..8", full_combo);
    full_combo & GENDER_MASK == 0
}

/// Gender row (0 = reference, 1 = other) used to index the conditional effect table.
pub fn gender_row(full_combo : usize) -> usize {
    if gender_is_reference(full_combo) { 0 } else { 1 }
}

/// Drops the gender bit, leaving the 2-bit effect index.
pub fn effect_part(full_combo : usize) -> usize {
    assert!(full_combo < N_FULL, "Full combination {} outside 0..8", full_combo);
    full_combo & EFFECT_MASK
}

/// Whether effect variable `var` (0 = height, 1 = weight) takes its reference value
/// (bit = 1) in the informed effect combination. Height is the high bit.
pub fn effect_is_reference(effect_combo : usize, var : usize) -> bool {
    assert!(effect_combo < N_EFFECT, "Effect combination {} outside 0..4", effect_combo);
    assert!(var < N_EFFECT_VARS);
    let shift = N_EFFECT_VARS - 1 - var;
    (effect_combo >> shift) & 1 == 1
}

#[test]
fn packing() {
    for j in 0..N_EFFECT {
        assert_eq!(full_combo(true, j), j);
        assert_eq!(full_combo(false, j), j + 4);
        assert!(gender_is_reference(j));
        assert!(!gender_is_reference(j + 4));
        assert_eq!(effect_part(j + 4), j);
    }
    // 0b10: height at reference, weight not.
    assert!(effect_is_reference(2, 0));
    assert!(!effect_is_reference(2, 1));
    assert!(effect_is_reference(1, 1));
    assert!(!effect_is_reference(1, 0));
}
