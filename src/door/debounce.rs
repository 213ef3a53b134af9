use super::state::DoorState;

/// How many consecutive identical samples confirm a state change.
///
/// At the 50ms tick this gives a 150ms settle time, enough to ride out
/// switch bounce and vibration while the door is moving.
pub const SETTLE_SAMPLES: u8 = 3;

/// A confirmed change of the debounced state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub previous: DoorState,
  pub current: DoorState,
}

/// Filters raw reed-switch samples into a stable door state.
///
/// A candidate state must be observed for [`SETTLE_SAMPLES`] consecutive
/// samples before it is confirmed; anything shorter is treated as noise.
/// Ambiguous samples (floating pin, no switch wired) reset the candidate
/// and can never confirm, so an unwired door stays `Unknown` forever
/// rather than flapping.
#[derive(Debug)]
pub struct Debouncer {
  settle_samples: u8,
  state: DoorState,
  candidate: Option<(DoorState, u8)>,
}

impl Debouncer {
  pub fn new(settle_samples: u8) -> Self {
    Debouncer {
      settle_samples,
      state: DoorState::Unknown,
      candidate: None,
    }
  }

  /// The last confirmed state
  pub fn state(&self) -> DoorState {
    self.state
  }

  /// Feed one semantic sample (`None` when the raw level was
  /// unreadable). Returns the transition if this sample confirmed one.
  ///
  /// The first confirmed state after startup is itself a transition
  /// (from `Unknown`) so subscribers learn the initial state.
  pub fn sample(&mut self, reading: Option<DoorState>) -> Option<Transition> {
    let Some(reading) = reading
    else {
      self.candidate = None;
      return None;
    };

    if reading == self.state {
      // back in agreement with the confirmed state, drop any candidate
      self.candidate = None;
      return None;
    }

    let count = match self.candidate {
      Some((candidate, count)) if candidate == reading => count + 1,
      _ => 1,
    };

    if count >= self.settle_samples {
      let previous = self.state;
      self.state = reading;
      self.candidate = None;
      Some(Transition {
        previous,
        current: reading,
      })
    }
    else {
      self.candidate = Some((reading, count));
      None
    }
  }
}
