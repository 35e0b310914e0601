//! The matching generator: who gives a gift to whom.
//!
//! Givers and receivers are two independent shuffles of the same
//! participants. Self-matches are first repaired by swapping receivers; if
//! any survive, the receiver shuffle is drawn again, and after
//! [`MAX_ATTEMPTS`] failed draws the receivers become the givers rotated by
//! one, which is always a derangement. The result is verified before it is
//! returned, so a self-match can never reach the store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  gift::{event::EventId, participant::Participant, shuffle::shuffle},
};

/// Receiver draws attempted before falling back to a rotation.
pub const MAX_ATTEMPTS: usize = 64;

// ─── Records ─────────────────────────────────────────────────────────────────

/// A generated pairing, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMatch {
  pub event_id:    EventId,
  pub giver_id:    Uuid,
  pub receiver_id: Uuid,
}

/// A stored pairing. `position` is the insertion order within the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
  pub match_id:    Uuid,
  pub event_id:    EventId,
  pub giver_id:    Uuid,
  pub receiver_id: Uuid,
  pub revealed:    bool,
  pub position:    u32,
  pub created_at:  DateTime<Utc>,
}

/// A stored pairing with both participants' display data joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
  #[serde(flatten)]
  pub record:                Match,
  pub giver_name:            String,
  pub giver_village_name:    String,
  pub receiver_name:         String,
  pub receiver_village_name: String,
}

// ─── Generator ───────────────────────────────────────────────────────────────

/// Pair every participant with a receiver other than themselves.
///
/// Fails with [`Error::NotEnoughParticipants`] below two participants and
/// with [`Error::DuplicateParticipant`] when an id repeats.
pub fn generate<R: Rng + ?Sized>(
  participants: &[Participant],
  event_id: EventId,
  rng: &mut R,
) -> Result<Vec<NewMatch>> {
  let ids: Vec<Uuid> = participants.iter().map(|p| p.participant_id).collect();
  let pairs = derange(&ids, rng)?;
  Ok(
    pairs
      .into_iter()
      .map(|(giver_id, receiver_id)| NewMatch { event_id, giver_id, receiver_id })
      .collect(),
  )
}

/// Produce `(giver, receiver)` pairs over `ids` with no fixed point.
pub fn derange<R: Rng + ?Sized>(ids: &[Uuid], rng: &mut R) -> Result<Vec<(Uuid, Uuid)>> {
  if ids.len() < 2 {
    return Err(Error::NotEnoughParticipants(ids.len()));
  }
  let mut seen = HashSet::with_capacity(ids.len());
  if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
    return Err(Error::DuplicateParticipant(*dup));
  }

  let givers = shuffle(ids, rng);
  let receivers = (0..MAX_ATTEMPTS)
    .map(|_| {
      let mut receivers = shuffle(ids, &mut *rng);
      repair_self_matches(&givers, &mut receivers);
      receivers
    })
    .find(|receivers| first_self_match(&givers, receivers).is_none())
    .unwrap_or_else(|| rotate(&givers));

  verify(ids, &givers, &receivers)?;
  Ok(givers.into_iter().zip(receivers).collect())
}

/// One left-to-right pass that swaps away self-matches.
///
/// At a self-match at `i`, prefer swapping with the neighbour (`i + 1`, or
/// `i - 1` at the end); otherwise take the first other index whose swap
/// leaves neither position self-matched. This can leave a self-match behind
/// when no safe swap exists; callers must check.
pub fn repair_self_matches(givers: &[Uuid], receivers: &mut [Uuid]) {
  let n = givers.len();
  if n < 2 {
    return;
  }
  for i in 0..n {
    if givers[i] != receivers[i] {
      continue;
    }
    let neighbour = if i + 1 < n { i + 1 } else { i - 1 };
    if swap_is_safe(givers, receivers, i, neighbour) {
      receivers.swap(i, neighbour);
    } else if let Some(j) = (0..n).find(|&j| j != i && swap_is_safe(givers, receivers, i, j)) {
      receivers.swap(i, j);
    }
  }
}

fn swap_is_safe(givers: &[Uuid], receivers: &[Uuid], i: usize, j: usize) -> bool {
  givers[j] != receivers[i] && givers[i] != receivers[j]
}

fn first_self_match(givers: &[Uuid], receivers: &[Uuid]) -> Option<Uuid> {
  givers
    .iter()
    .zip(receivers)
    .find(|(g, r)| g == r)
    .map(|(g, _)| *g)
}

/// `receivers[k] = givers[k + 1]`, wrapping. A derangement whenever the ids
/// are distinct and there are at least two.
fn rotate(givers: &[Uuid]) -> Vec<Uuid> {
  let mut receivers = givers.to_vec();
  receivers.rotate_left(1);
  receivers
}

fn verify(ids: &[Uuid], givers: &[Uuid], receivers: &[Uuid]) -> Result<()> {
  let expected: HashSet<&Uuid> = ids.iter().collect();
  let same_set = |side: &[Uuid]| {
    side.len() == ids.len() && side.iter().collect::<HashSet<_>>() == expected
  };
  if !same_set(givers) || !same_set(receivers) {
    return Err(Error::BrokenPermutation);
  }
  match first_self_match(givers, receivers) {
    Some(id) => Err(Error::ResidualSelfMatch(id)),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  fn ids(n: usize) -> Vec<Uuid> { (0..n).map(|_| Uuid::new_v4()).collect() }

  fn participant(name: &str, village: Uuid) -> Participant {
    Participant {
      participant_id: Uuid::new_v4(),
      name:           name.into(),
      village_id:     village,
      village_name:   "v".into(),
      registered_at:  Utc::now(),
    }
  }

  fn assert_derangement(ids: &[Uuid], pairs: &[(Uuid, Uuid)]) {
    assert_eq!(pairs.len(), ids.len());
    let mut givers: Vec<Uuid> = pairs.iter().map(|p| p.0).collect();
    let mut receivers: Vec<Uuid> = pairs.iter().map(|p| p.1).collect();
    let mut sorted = ids.to_vec();
    sorted.sort();
    givers.sort();
    receivers.sort();
    assert_eq!(givers, sorted, "givers are not a permutation");
    assert_eq!(receivers, sorted, "receivers are not a permutation");
    for (g, r) in pairs {
      assert_ne!(g, r, "self-match");
    }
  }

  #[test]
  fn no_self_matches_for_many_sizes_and_seeds() {
    for n in 2..=50 {
      let ids = ids(n);
      for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed * 1000 + n as u64);
        let pairs = derange(&ids, &mut rng).unwrap();
        assert_derangement(&ids, &pairs);
      }
    }
  }

  #[test]
  fn fewer_than_two_is_rejected() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(matches!(derange(&[], &mut rng), Err(Error::NotEnoughParticipants(0))));
    assert!(matches!(
      derange(&ids(1), &mut rng),
      Err(Error::NotEnoughParticipants(1))
    ));
  }

  #[test]
  fn duplicate_ids_are_rejected() {
    let mut rng = StdRng::seed_from_u64(0);
    let id = Uuid::new_v4();
    assert!(matches!(
      derange(&[id, Uuid::new_v4(), id], &mut rng),
      Err(Error::DuplicateParticipant(d)) if d == id
    ));
  }

  #[test]
  fn two_participants_swap() {
    let ids = ids(2);
    let mut rng = StdRng::seed_from_u64(9);
    let pairs = derange(&ids, &mut rng).unwrap();
    assert_derangement(&ids, &pairs);
  }

  #[test]
  fn repair_prefers_neighbour() {
    let ids = ids(3);
    let mut receivers = ids.clone();
    repair_self_matches(&ids, &mut receivers);
    // 0 swaps with 1, then 2 is still fixed and swaps with 1.
    assert_eq!(receivers, vec![ids[1], ids[2], ids[0]]);
    assert!(first_self_match(&ids, &receivers).is_none());
  }

  #[test]
  fn repair_at_last_index_uses_previous() {
    let ids = ids(3);
    let mut receivers = vec![ids[1], ids[0], ids[2]];
    repair_self_matches(&ids, &mut receivers);
    assert_eq!(receivers, vec![ids[1], ids[2], ids[0]]);
  }

  #[test]
  fn rotation_is_a_derangement() {
    for n in 2..10 {
      let ids = ids(n);
      let receivers = rotate(&ids);
      assert!(first_self_match(&ids, &receivers).is_none());
      assert!(verify(&ids, &ids, &receivers).is_ok());
    }
  }

  #[test]
  fn verify_catches_residuals() {
    let ids = ids(3);
    assert!(matches!(
      verify(&ids, &ids, &ids),
      Err(Error::ResidualSelfMatch(_))
    ));
    let broken = vec![ids[1], ids[1], ids[0]];
    assert!(matches!(verify(&ids, &ids, &broken), Err(Error::BrokenPermutation)));
  }

  #[test]
  fn three_participants_across_two_villages() {
    let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
    let people = vec![participant("A", v1), participant("B", v1), participant("C", v2)];
    let event: EventId = "2024-01-01".parse().unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let matches = generate(&people, event, &mut rng).unwrap();
    let pairs: Vec<(Uuid, Uuid)> =
      matches.iter().map(|m| (m.giver_id, m.receiver_id)).collect();
    let ids: Vec<Uuid> = people.iter().map(|p| p.participant_id).collect();
    assert_derangement(&ids, &pairs);
    assert!(matches.iter().all(|m| m.event_id == event));
  }
}
