//! Fisher–Yates shuffle.

use rand::Rng;

/// Return a uniformly random permutation of `items`.
///
/// Walks from the last index down to 1, swapping each element with one drawn
/// uniformly from `[0, i]`. The input slice is left untouched.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
  let mut out = items.to_vec();
  for i in (1..out.len()).rev() {
    let j = rng.random_range(0..=i);
    out.swap(i, j);
  }
  out
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  #[test]
  fn empty_and_single() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(shuffle::<u8, _>(&[], &mut rng).is_empty());
    assert_eq!(shuffle(&[7], &mut rng), vec![7]);
  }

  #[test]
  fn input_is_not_mutated_and_elements_survive() {
    let mut rng = StdRng::seed_from_u64(2);
    let input: Vec<u32> = (0..20).collect();
    let mut out = shuffle(&input, &mut rng);
    assert_eq!(input, (0..20).collect::<Vec<_>>());
    out.sort();
    assert_eq!(out, input);
  }

  #[test]
  fn every_permutation_of_three_shows_up_evenly() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut seen: HashMap<Vec<char>, usize> = HashMap::new();
    let draws = 6000;
    for _ in 0..draws {
      *seen.entry(shuffle(&['a', 'b', 'c'], &mut rng)).or_default() += 1;
    }
    assert_eq!(seen.len(), 6);
    for (perm, count) in seen {
      // Expected 1000 each; allow a generous band.
      assert!((800..1200).contains(&count), "{perm:?} drawn {count} times");
    }
  }
}
