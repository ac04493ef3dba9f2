use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::layout::{ALL_CROP_STRATEGIES, ALL_POSITIONS, CropStrategy, Position};
use crate::render::{ALL_BAND_STYLES, BandStyle};

/// The per-slide choices that are not layout math: where the band goes, how
/// it is dressed, how the background is framed.
#[derive(Debug, Clone, Copy)]
pub struct SlideVariants {
    pub position: Position,
    pub style: BandStyle,
    pub crop: CropStrategy,
}

/// Chooses variants for slides that don't pin them explicitly. Kept behind a
/// trait so the layout math stays testable with fixed inputs.
pub trait VariantPicker {
    fn pick(&mut self, index: usize) -> SlideVariants;
}

/// Deterministic rotation through the fixed tables.
pub struct RotationPicker;

impl VariantPicker for RotationPicker {
    fn pick(&mut self, index: usize) -> SlideVariants {
        SlideVariants {
            position: ALL_POSITIONS[index % ALL_POSITIONS.len()],
            style: ALL_BAND_STYLES[index % ALL_BAND_STYLES.len()],
            crop: ALL_CROP_STRATEGIES[index % ALL_CROP_STRATEGIES.len()],
        }
    }
}

/// Seeded random selection, reproducible across runs for the same seed.
pub struct ShufflePicker {
    rng: StdRng,
}

impl ShufflePicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl VariantPicker for ShufflePicker {
    fn pick(&mut self, _index: usize) -> SlideVariants {
        let position = ALL_POSITIONS
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Position::BottomCenter);
        let style = ALL_BAND_STYLES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(BandStyle::Solid);
        let crop = ALL_CROP_STRATEGIES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(CropStrategy::Wide);
        SlideVariants {
            position,
            style,
            crop,
        }
    }
}

pub fn build_picker(seed: Option<u64>) -> Box<dyn VariantPicker> {
    match seed {
        Some(seed) => Box::new(ShufflePicker::new(seed)),
        None => Box::new(RotationPicker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_cycles_through_positions() {
        let mut picker = RotationPicker;
        let first = picker.pick(0);
        let seventh = picker.pick(6);
        assert_eq!(first.position, seventh.position);
        assert_ne!(picker.pick(0).position, picker.pick(1).position);
    }

    #[test]
    fn shuffle_is_reproducible_for_a_seed() {
        let mut a = ShufflePicker::new(42);
        let mut b = ShufflePicker::new(42);
        for index in 0..12 {
            let left = a.pick(index);
            let right = b.pick(index);
            assert_eq!(left.position, right.position);
            assert_eq!(left.style, right.style);
            assert_eq!(left.crop, right.crop);
        }
    }

    #[test]
    fn different_seeds_eventually_diverge() {
        let mut a = ShufflePicker::new(1);
        let mut b = ShufflePicker::new(2);
        let diverges = (0..32).any(|index| {
            let left = a.pick(index);
            let right = b.pick(index);
            left.position != right.position
                || left.style != right.style
                || left.crop != right.crop
        });
        assert!(diverges);
    }
}
