use crate::midi_state::ActivatedNotes;
use core::ops::RangeInclusive;
use wmidi::Note;

/// The span of notes the chip's oscillators can reproduce.
pub const OSCILLATOR_RANGE: RangeInclusive<Note> = Note::C0..=Note::B7;

/// Implemented by settings which decide which of the held notes gets voiced.
pub trait ProvideNote {
    /// Picks one of `candidates`, which are yielded in activation order.
    fn pick(&self, candidates: impl Iterator<Item = Note>) -> Option<Note>;
}

/// Utility struct for selecting the appropriate [`Note`] to play based on configuration and instrument range.
#[derive(Clone, Debug)]
pub struct NoteProvider<T> {
    config: T,
    playable_range: RangeInclusive<Note>,
}

impl<T> NoteProvider<T> {
    /// Constructs a [`NoteProvider`].
    pub fn new(config: T, playable_range: RangeInclusive<Note>) -> Self {
        Self {
            config,
            playable_range,
        }
    }

    /// The setting in effect.
    pub fn config(&self) -> &T {
        &self.config
    }

    /// Swaps in a new setting, e.g., after the performer cycles it.
    pub fn set_config(&mut self, config: T) {
        self.config = config;
    }
}

impl<T: Default> Default for NoteProvider<T> {
    fn default() -> Self {
        Self::new(T::default(), OSCILLATOR_RANGE)
    }
}

impl<T: ProvideNote> NoteProvider<T> {
    /// Selects the [`Note`] to play, ignoring held notes outside the playable range.
    pub fn provide_note<const N: usize>(&self, notes: &ActivatedNotes<N>) -> Option<Note> {
        let playable = notes
            .iter()
            .filter(|note| self.playable_range.contains(note));
        self.config.pick(playable)
    }
}
