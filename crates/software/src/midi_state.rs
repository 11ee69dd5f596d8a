use bitmask_enum::bitmask;
use embassy_time::Instant;
use wmidi::{ControlFunction, MidiMessage};

mod activated_notes;
pub use activated_notes::*;

/// Operations that may be performed during a state update.
#[bitmask(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// Indicates a note was added or removed during the last state update.
    NoteChange,
    /// Indicates a held note was dropped to make room for a newer one during the last state update.
    NoteStolen,
}

/// A straightforward representation of the MIDI messages the device has received.
///
/// Some data are represented in more convenient formats than those in which they were received. For example,
/// when a note is activated, it is added to a list; when released, it is dropped from the list. As a result,
/// the state object does not explicitly persist data about NoteOff events.
///
/// This struct is expected to continue to grow as more features are added. State is persisted only as needed.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MidiState {
    /// Holds a representation of notes which are currently activated.
    pub activated_notes: ActivatedNotes,
}

impl MidiState {
    /// Updates the `MidiState` given a slice of data received at `now`. Returns the type of [`Operation`] performed.
    ///
    /// Data may contain one or more USB-MIDI Event Packets.
    pub fn update(&mut self, data: &[u8], now: Instant) -> Operation {
        let mut operation = Operation::none();
        data.chunks(4)
            .filter_map(|potential_packet| {
                if potential_packet.len() != 4 {
                    error!("USB-MIDI Event Packets must always be 32 bits long");
                    None
                } else {
                    // the zeroth byte is intentionally ignored because the Packet Header is not of interest;
                    // the remaining three bytes contain the actual MIDI event
                    MidiMessage::from_bytes(&potential_packet[1..]).ok()
                }
            })
            .for_each(|msg| match msg {
                MidiMessage::ControlChange(channel, control_function, _)
                    if control_function == ControlFunction::ALL_NOTES_OFF
                        || control_function == ControlFunction::ALL_SOUND_OFF =>
                {
                    operation |= Operation::NoteChange;
                    self.activated_notes.clear();
                    info!(
                        "Received Control Change {}, releasing all notes: channel {}",
                        u8::from(control_function),
                        channel.number()
                    );
                }
                MidiMessage::ControlChange(channel, control_function, _) => {
                    info!(
                        "Received unsupported Control Change {} on channel {}",
                        u8::from(control_function),
                        channel.number()
                    );
                }
                // by convention, a NoteOn with zero velocity is a NoteOff
                MidiMessage::NoteOn(channel, note, velocity) if u8::from(velocity) == 0 => {
                    operation |= Operation::NoteChange;
                    self.activated_notes.remove(note);
                    info!(
                        "Received NoteOn with zero velocity, releasing: channel {}, note {}",
                        channel.number(),
                        note.to_str()
                    );
                }
                MidiMessage::NoteOff(channel, note, velocity) => {
                    operation |= Operation::NoteChange;
                    self.activated_notes.remove(note);
                    info!(
                        "Received NoteOff: channel {}, note {}, velocity: {}",
                        channel.number(),
                        note.to_str(),
                        u8::from(velocity)
                    );
                }
                MidiMessage::NoteOn(channel, note, velocity) => {
                    operation |= Operation::NoteChange;
                    if self.activated_notes.add(note, velocity, now).is_some() {
                        operation |= Operation::NoteStolen;
                    }
                    info!(
                        "Received NoteOn: channel {}, note {}, velocity: {}",
                        channel.number(),
                        note.to_str(),
                        u8::from(velocity)
                    );
                }
                _ => {
                    let mut data = [0_u8; 3];
                    let _ = msg.copy_to_slice(&mut data);
                    info!("Received unsupported MIDI message: {}", data);
                }
            });
        operation
    }
}
