//! The live reveal: stepping through matches one at a time.
//!
//! ```text
//! Waiting ──show_giver──▶ GiverRevealed ──spin──▶ Spinning ──complete──▶ Waiting
//!                                                                  └───▶ Finished
//! ```
//!
//! The machine only holds position. The one durable effect is the match id
//! that [`Reveal::complete`] hands back for the caller to mark revealed, so a
//! reload resumes at the first unrevealed match.

use rand::Rng;
use serde::Serialize;
use strum::IntoStaticStr;
use uuid::Uuid;

use crate::{Error, Result, gift::matching::MatchView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
  Waiting,
  GiverRevealed,
  Spinning,
  Finished,
}

#[derive(Debug, Clone)]
pub struct Reveal {
  matches: Vec<MatchView>,
  cursor:  usize,
  phase:   Phase,
}

impl Reveal {
  /// Start at the first unrevealed match, in insertion order.
  pub fn resume(matches: Vec<MatchView>) -> Self {
    let cursor = next_unrevealed(&matches, 0);
    let phase = if cursor < matches.len() { Phase::Waiting } else { Phase::Finished };
    Self { matches, cursor, phase }
  }

  pub fn phase(&self) -> Phase { self.phase }

  /// The match being revealed, or next up. `None` once finished.
  pub fn current(&self) -> Option<&MatchView> { self.matches.get(self.cursor) }

  /// Matches still to reveal, including the current one.
  pub fn remaining(&self) -> usize {
    self.matches[self.cursor.min(self.matches.len())..]
      .iter()
      .filter(|m| !m.record.revealed)
      .count()
  }

  /// `Waiting → GiverRevealed`.
  pub fn show_giver(&mut self) -> Result<&MatchView> {
    self.expect(Phase::Waiting, "show the giver")?;
    self.phase = Phase::GiverRevealed;
    self.current().ok_or_else(|| self.invalid("show the giver"))
  }

  /// `GiverRevealed → Spinning`.
  ///
  /// Returns `flashes` receiver names to cycle through before settling; the
  /// last one is always the true receiver. Purely cosmetic.
  pub fn spin<R: Rng + ?Sized>(&mut self, rng: &mut R, flashes: usize) -> Result<Vec<String>> {
    self.expect(Phase::GiverRevealed, "spin")?;
    let Some(current) = self.current() else {
      return Err(self.invalid("spin"));
    };
    let target = current.receiver_name.clone();

    let pool: Vec<&str> = self.matches.iter().map(|m| m.receiver_name.as_str()).collect();
    let mut names: Vec<String> = (1..flashes.max(1))
      .map(|_| pool[rng.random_range(0..pool.len())].to_owned())
      .collect();
    names.push(target);

    self.phase = Phase::Spinning;
    Ok(names)
  }

  /// `Spinning → Waiting` (or `Finished` after the last match).
  ///
  /// Returns the id of the match the caller must now mark revealed.
  pub fn complete(&mut self) -> Result<Uuid> {
    self.expect(Phase::Spinning, "complete")?;
    let Some(current) = self.matches.get_mut(self.cursor) else {
      return Err(self.invalid("complete"));
    };
    current.record.revealed = true;
    let done = current.record.match_id;

    self.cursor = next_unrevealed(&self.matches, self.cursor + 1);
    self.phase = if self.cursor < self.matches.len() {
      Phase::Waiting
    } else {
      Phase::Finished
    };
    Ok(done)
  }

  fn expect(&self, phase: Phase, action: &'static str) -> Result<()> {
    if self.phase == phase { Ok(()) } else { Err(self.invalid(action)) }
  }

  fn invalid(&self, action: &'static str) -> Error {
    Error::InvalidRevealTransition { action, phase: self.phase.into() }
  }
}

fn next_unrevealed(matches: &[MatchView], from: usize) -> usize {
  matches
    .iter()
    .enumerate()
    .skip(from)
    .find(|(_, m)| !m.record.revealed)
    .map_or(matches.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;
  use crate::gift::{event::EventId, matching::Match};

  fn view(position: u32, giver: &str, receiver: &str, revealed: bool) -> MatchView {
    MatchView {
      record:                Match {
        match_id:    Uuid::new_v4(),
        event_id:    "2024-12-22".parse::<EventId>().unwrap(),
        giver_id:    Uuid::new_v4(),
        receiver_id: Uuid::new_v4(),
        revealed,
        position,
        created_at:  Utc::now(),
      },
      giver_name:            giver.into(),
      giver_village_name:    "v1".into(),
      receiver_name:         receiver.into(),
      receiver_village_name: "v2".into(),
    }
  }

  fn three() -> Vec<MatchView> {
    vec![view(0, "A", "B", false), view(1, "B", "C", false), view(2, "C", "A", false)]
  }

  #[test]
  fn walks_every_match_in_order() {
    let matches = three();
    let ids: Vec<Uuid> = matches.iter().map(|m| m.record.match_id).collect();
    let mut reveal = Reveal::resume(matches);
    let mut rng = StdRng::seed_from_u64(5);

    for (i, id) in ids.iter().enumerate() {
      assert_eq!(reveal.phase(), Phase::Waiting);
      assert_eq!(reveal.remaining(), 3 - i);
      reveal.show_giver().unwrap();
      let names = reveal.spin(&mut rng, 8).unwrap();
      assert_eq!(names.len(), 8);
      assert_eq!(names.last(), Some(&reveal.current().unwrap().receiver_name));
      assert_eq!(reveal.complete().unwrap(), *id);
    }
    assert_eq!(reveal.phase(), Phase::Finished);
    assert!(reveal.current().is_none());
    assert_eq!(reveal.remaining(), 0);
  }

  #[test]
  fn resume_skips_revealed() {
    let mut matches = three();
    matches[0].record.revealed = true;
    let second = matches[1].record.match_id;
    let reveal = Reveal::resume(matches);
    assert_eq!(reveal.current().map(|m| m.record.match_id), Some(second));
    assert_eq!(reveal.remaining(), 2);
  }

  #[test]
  fn all_revealed_is_finished() {
    let matches: Vec<_> = three()
      .into_iter()
      .map(|mut m| {
        m.record.revealed = true;
        m
      })
      .collect();
    let mut reveal = Reveal::resume(matches);
    assert_eq!(reveal.phase(), Phase::Finished);
    assert!(matches!(
      reveal.show_giver(),
      Err(Error::InvalidRevealTransition { phase: "finished", .. })
    ));
  }

  #[test]
  fn out_of_order_actions_are_rejected() {
    let mut reveal = Reveal::resume(three());
    let mut rng = StdRng::seed_from_u64(0);
    assert!(reveal.spin(&mut rng, 3).is_err());
    assert!(reveal.complete().is_err());
    reveal.show_giver().unwrap();
    assert!(reveal.show_giver().is_err());
    assert!(reveal.complete().is_err());
    reveal.spin(&mut rng, 3).unwrap();
    assert!(reveal.spin(&mut rng, 3).is_err());
  }

  #[test]
  fn single_flash_is_just_the_receiver() {
    let mut reveal = Reveal::resume(three());
    let mut rng = StdRng::seed_from_u64(1);
    reveal.show_giver().unwrap();
    assert_eq!(reveal.spin(&mut rng, 0).unwrap(), vec!["B".to_string()]);
  }
}
