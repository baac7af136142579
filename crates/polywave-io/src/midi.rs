//! MIDI input via midir, and wire-byte decoding into engine events.
//!
//! Decoding is omni: the channel nibble is ignored. Only the four message
//! kinds the engine understands are decoded; everything else is dropped.

use crate::stream::select_by_name;
use crate::{Error, Result};
use midir::{Ignore, MidiInputConnection};
use polywave_synth::{SynthEvent, pitch_bend_from_14bit};

const CLIENT_NAME: &str = "polywave";
const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const STATUS_CONTROL_CHANGE: u8 = 0xB0;
const STATUS_PITCH_BEND: u8 = 0xE0;

/// Decode one MIDI message.
///
/// Note-on with velocity 0 is a note-off. Pitch bend combines the LSB and
/// MSB into 14 bits and normalizes to [-1, 1]. Truncated messages and
/// unsupported statuses return `None`.
///
/// ```rust
/// use polywave_io::decode_midi;
/// use polywave_synth::SynthEvent;
///
/// assert_eq!(
///     decode_midi(&[0x93, 60, 100]),
///     Some(SynthEvent::NoteOn { note: 60, velocity: 100 })
/// );
/// assert_eq!(decode_midi(&[0xE0, 0x7F, 0x7F]), Some(SynthEvent::PitchBend(1.0)));
/// assert_eq!(decode_midi(&[0xC0, 5]), None);
/// ```
pub fn decode_midi(message: &[u8]) -> Option<SynthEvent> {
    let &[status, data1, data2, ..] = message else {
        return None;
    };
    let data1 = data1 & 0x7F;
    let data2 = data2 & 0x7F;

    match status & 0xF0 {
        STATUS_NOTE_ON if data2 == 0 => Some(SynthEvent::NoteOff {
            note: data1,
            velocity: 0,
        }),
        STATUS_NOTE_ON => Some(SynthEvent::NoteOn {
            note: data1,
            velocity: data2,
        }),
        STATUS_NOTE_OFF => Some(SynthEvent::NoteOff {
            note: data1,
            velocity: data2,
        }),
        STATUS_CONTROL_CHANGE => Some(SynthEvent::ControlChange {
            controller: data1,
            value: data2,
        }),
        STATUS_PITCH_BEND => {
            let raw = (u16::from(data2) << 7) | u16::from(data1);
            Some(SynthEvent::PitchBend(pitch_bend_from_14bit(raw)))
        }
        _ => None,
    }
}

/// Decode `message` and hand the event to `sink`, echoing it at debug level.
fn forward<F: FnMut(SynthEvent)>(message: &[u8], sink: &mut F) {
    match decode_midi(message) {
        Some(event) => {
            tracing::debug!(?event, "MIDI event");
            sink(event);
        }
        None => tracing::trace!(?message, "ignored MIDI message"),
    }
}

/// Names of all MIDI input ports.
pub fn list_midi_ports() -> Result<Vec<String>> {
    let midi_in = midir::MidiInput::new(CLIENT_NAME).map_err(|e| Error::Midi(e.to_string()))?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect())
}

/// An open MIDI input connection.
///
/// Events flow while this value is alive; dropping it closes the port.
pub struct MidiInput {
    _connection: MidiInputConnection<()>,
    port: String,
}

impl std::fmt::Debug for MidiInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiInput")
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl MidiInput {
    /// Connect to a port and forward every decoded event to `sink`.
    ///
    /// `port` is an index or a full or partial port name; `None` takes the
    /// first port. `sink` runs on the MIDI thread.
    pub fn connect<F>(port: Option<&str>, mut sink: F) -> Result<Self>
    where
        F: FnMut(SynthEvent) + Send + 'static,
    {
        let mut midi_in =
            midir::MidiInput::new(CLIENT_NAME).map_err(|e| Error::Midi(e.to_string()))?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(Error::DeviceNotFound("no MIDI input ports".to_string()));
        }
        let names: Vec<Option<String>> = ports.iter().map(|p| midi_in.port_name(p).ok()).collect();
        let index = match port {
            Some(search) => select_by_name(&names, search)?,
            None => 0,
        };
        let port_name = names[index]
            .clone()
            .unwrap_or_else(|| format!("port {index}"));

        let connection = midi_in
            .connect(
                &ports[index],
                "polywave-input",
                move |_stamp, message, _| forward(message, &mut sink),
                (),
            )
            .map_err(|e| Error::Midi(e.to_string()))?;

        tracing::info!(port = %port_name, "MIDI input connected");
        Ok(Self {
            _connection: connection,
            port: port_name,
        })
    }

    /// Name of the connected port.
    pub fn port(&self) -> &str {
        &self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_forward_delivers_and_echoes_events() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut received = Vec::new();
        tracing::subscriber::with_default(subscriber, || {
            let mut sink = |event: SynthEvent| received.push(event);
            forward(&[0x90, 60, 100], &mut sink);
            forward(&[0xB0, 64, 127], &mut sink);
            forward(&[0xF8], &mut sink);
        });

        assert_eq!(
            received,
            [
                SynthEvent::NoteOn {
                    note: 60,
                    velocity: 100
                },
                SynthEvent::ControlChange {
                    controller: 64,
                    value: 127
                },
            ]
        );
        let text = logs.contents();
        assert!(text.contains("DEBUG"), "{text}");
        assert!(text.contains("NoteOn { note: 60, velocity: 100 }"), "{text}");
        assert!(text.contains("ControlChange { controller: 64, value: 127 }"), "{text}");
        assert!(text.contains("ignored MIDI message"), "{text}");
    }

    #[test]
    fn test_note_on_any_channel() {
        for status in 0x90..=0x9F {
            assert_eq!(
                decode_midi(&[status, 64, 90]),
                Some(SynthEvent::NoteOn {
                    note: 64,
                    velocity: 90
                })
            );
        }
    }

    #[test]
    fn test_note_on_zero_velocity_is_note_off() {
        assert_eq!(
            decode_midi(&[0x90, 60, 0]),
            Some(SynthEvent::NoteOff {
                note: 60,
                velocity: 0
            })
        );
    }

    #[test]
    fn test_note_off() {
        assert_eq!(
            decode_midi(&[0x85, 60, 40]),
            Some(SynthEvent::NoteOff {
                note: 60,
                velocity: 40
            })
        );
    }

    #[test]
    fn test_control_change() {
        assert_eq!(
            decode_midi(&[0xB0, 64, 127]),
            Some(SynthEvent::ControlChange {
                controller: 64,
                value: 127
            })
        );
    }

    #[test]
    fn test_pitch_bend_center_and_extremes() {
        assert_eq!(
            decode_midi(&[0xE0, 0x00, 0x40]),
            Some(SynthEvent::PitchBend(0.0))
        );
        assert_eq!(
            decode_midi(&[0xE0, 0x00, 0x00]),
            Some(SynthEvent::PitchBend(-1.0))
        );
        assert_eq!(
            decode_midi(&[0xE0, 0x7F, 0x7F]),
            Some(SynthEvent::PitchBend(1.0))
        );
    }

    #[test]
    fn test_data_bytes_are_masked() {
        assert_eq!(
            decode_midi(&[0x90, 0xFF, 0xFF]),
            Some(SynthEvent::NoteOn {
                note: 127,
                velocity: 127
            })
        );
    }

    #[test]
    fn test_unsupported_and_truncated() {
        assert_eq!(decode_midi(&[]), None);
        assert_eq!(decode_midi(&[0x90, 60]), None);
        assert_eq!(decode_midi(&[0xA0, 60, 10]), None);
        assert_eq!(decode_midi(&[0xF8, 0, 0]), None);
    }
}
