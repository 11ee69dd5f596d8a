//! Provides a struct [`ActivatedNotes`] for managing the activated notes of an instrument. Here "activated notes"
//! means the notes that are currently being played (e.g., depressed on a keyboard), regardless of whether or not
//! those notes are actually voiced. (The chip has three oscillators, but many more keys might be depressed.)

use crate::collections::{Deque, Error, GM2_SIMUL_NOTE_NUM, Insertion, Key, Strategy};
use core::fmt::{self, Write};
use embassy_time::Instant;
use wmidi::{Note, Velocity};

/// One of the sound chip's three oscillators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Voice {
    /// Oscillator 1.
    One,
    /// Oscillator 2.
    Two,
    /// Oscillator 3.
    Three,
}

/// A note which has been activated but not yet released.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveNote {
    /// The note that was struck.
    pub note: Note,
    /// How hard the note was struck, as of its latest NoteOn.
    pub velocity: Velocity,
    /// When the latest NoteOn for this note was received.
    pub on_time: Instant,
    /// The oscillator sounding the note, if any. A held note may go unvoiced, e.g., in a legato run only the most
    /// recent note sounds, but the others must be remembered in case it is released.
    pub voice: Option<Voice>,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ActiveNote {
    fn format(&self, fmt: defmt::Formatter) {
        let ActiveNote {
            note,
            velocity,
            on_time,
            voice,
        } = *self;
        defmt::write!(
            fmt,
            "ActiveNote {{ note: {} ({}), velocity: {}, on_time: {}, voice: {} }}",
            note.to_str(),
            u8::from(note),
            u8::from(velocity),
            on_time,
            voice
        );
    }
}

/// Keys an [`ActiveNote`] by its MIDI note number, which is unique among held notes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoteNumber;

impl NoteNumber {
    fn key_of(note: Note) -> Key {
        Key::from(u8::from(note))
    }
}

impl Strategy<ActiveNote> for NoteNumber {
    fn key(&self, value: &ActiveNote) -> Key {
        Self::key_of(value.note)
    }

    fn print(&self, value: &ActiveNote, out: &mut dyn Write) -> fmt::Result {
        write!(
            out,
            "{}@{}",
            value.note.to_str(),
            u8::from(value.velocity)
        )
    }
}

/// A struct for managing the activated notes of an instrument.
///
/// Notes are kept in activation order. When more notes are held than there is room for, the oldest is dropped
/// ("stolen") to make room for the newest.
#[derive(Clone, Debug)]
pub struct ActivatedNotes<const N: usize = GM2_SIMUL_NOTE_NUM> {
    data: Deque<ActiveNote, NoteNumber, N>,
}

impl Default for ActivatedNotes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for ActivatedNotes<N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ActivatedNotes {{ ");
        defmt::write!(fmt, "data: [");
        for (i, note) in self.iter().enumerate() {
            if i == 0 {
                defmt::write!(fmt, " ");
            } else {
                defmt::write!(fmt, ", ");
            }
            defmt::write!(fmt, "{} ({})", note.to_str(), u8::from(note));
        }
        defmt::write!(fmt, " ]");
        defmt::write!(fmt, " }}");
    }
}

impl ActivatedNotes {
    /// Construct a new `ActivatedNotes` able to hold [`GM2_SIMUL_NOTE_NUM`] notes.
    pub fn new() -> Self {
        Self::with_capacity(GM2_SIMUL_NOTE_NUM)
            .expect("General MIDI polyphony should fit the default storage")
    }
}

impl<const N: usize> ActivatedNotes<N> {
    /// Construct a new `ActivatedNotes` holding at most `capacity` notes, which may not exceed `N`.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Ok(Self {
            data: Deque::new(capacity, NoteNumber)?,
        })
    }

    /// Add a [`Note`] to the list of those currently activated. Equivalent to depressing a key on a keyboard.
    ///
    /// A note which is already active is retriggered: it keeps its place in line (and its voice), taking on the new
    /// velocity and activation time. If the list is full, the oldest note is stolen to make room and returned.
    pub fn add(&mut self, note: Note, velocity: Velocity, now: Instant) -> Option<ActiveNote> {
        let voice = self.get(note).and_then(|active| active.voice);
        match self.data.append_or_replace(ActiveNote {
            note,
            velocity,
            on_time: now,
            voice,
        }) {
            Insertion::Inserted | Insertion::Replaced(_) => None,
            Insertion::Evicted(stolen) => {
                warn!(
                    "Note list full; {} stolen to make room for {}",
                    stolen.note.to_str(),
                    note.to_str()
                );
                Some(stolen)
            }
        }
    }

    /// Remove a [`Note`] from the list of those currently activated. Equivalent to releasing a depressed key on a
    /// keyboard.
    pub fn remove(&mut self, note: Note) -> Option<ActiveNote> {
        self.data.remove_by_key(NoteNumber::key_of(note))
    }

    /// Release every note at once.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns the [`ActiveNote`] for a [`Note`], if it is activated.
    pub fn get(&self, note: Note) -> Option<&ActiveNote> {
        self.data.find_by_key(NoteNumber::key_of(note))
    }

    /// Records which oscillator, if any, is sounding an activated [`Note`]. Returns `false` if the note isn't activated.
    pub fn assign_voice(&mut self, note: Note, voice: Option<Voice>) -> bool {
        match self.data.find_by_key_mut(NoteNumber::key_of(note)) {
            Some(active) => {
                active.voice = voice;
                true
            }
            None => false,
        }
    }

    /// Returns the note that was activated first.
    pub fn first(&self) -> Option<Note> {
        self.data.first().map(|active| active.note)
    }

    /// Returns the note that was activated last.
    pub fn last(&self) -> Option<Note> {
        self.data.last().map(|active| active.note)
    }

    /// Returns the highest activated note.
    pub fn highest(&self) -> Option<Note> {
        self.iter().max()
    }

    /// Returns the lowest activated note.
    pub fn lowest(&self) -> Option<Note> {
        self.iter().min()
    }

    /// Determine if any [`Note`]s are activated.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of activated [`Note`]s.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns an [`Iterator`] over the activated [`Note`]s.
    ///
    /// Order is preserved; e.g., the first performed `Note` can be accessed via the first call to `.next()`, and the
    /// last performed `Note` is accessible via `.last()`.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Note> + '_ {
        self.data.iter().map(|active| active.note)
    }

    /// Returns an [`Iterator`] over the [`ActiveNote`]s, in activation order.
    pub fn active_notes(&self) -> impl DoubleEndedIterator<Item = &ActiveNote> + '_ {
        self.data.iter()
    }

    /// Writes a one-line dump of the underlying [`Deque`] for debugging.
    pub fn inspect(&self, out: &mut impl Write) -> Result<(), Error> {
        self.data.inspect(out)
    }
}
