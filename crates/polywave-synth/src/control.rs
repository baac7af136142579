//! Controller table, pitch bend and patch selection.
//!
//! [`ControlState`] stores the last value of all 128 controllers. Two of
//! them are edge-triggered patch selectors: pushing controller 1 up to 127
//! steps to the next patch, controller 2 to the previous one. Holding a
//! controller at 127 does not keep stepping; it has to drop below 127 first.
//! Controller 64 (sustain pedal) is read by the envelope release.

/// Number of controllers in the table.
pub const CONTROLLER_COUNT: usize = 128;

/// Highest controller value.
pub const MAX_CONTROL_VALUE: u8 = 127;

/// Controller that steps to the next patch on a rising edge to 127.
pub const CC_PATCH_NEXT: u8 = 1;

/// Controller that steps to the previous patch on a rising edge to 127.
pub const CC_PATCH_PREV: u8 = 2;

/// Sustain pedal controller; lengthens the release.
pub const CC_SUSTAIN: u8 = 64;

/// Center of the 14-bit pitch bend range.
const PITCH_BEND_CENTER: i32 = 8192;

/// Convert a raw 14-bit pitch bend (0-16383, center 8192) into [-1, 1].
///
/// The downward half has one more step than the upward half, so 0 would
/// land just below -1; it clamps. Inputs above 16383 are treated as 16383.
///
/// ```rust
/// use polywave_synth::pitch_bend_from_14bit;
///
/// assert_eq!(pitch_bend_from_14bit(8192), 0.0);
/// assert_eq!(pitch_bend_from_14bit(16383), 1.0);
/// assert_eq!(pitch_bend_from_14bit(0), -1.0);
/// ```
pub fn pitch_bend_from_14bit(raw: u16) -> f32 {
    let raw = i32::from(raw.min(0x3FFF));
    let normalized = (raw - PITCH_BEND_CENTER) as f32 / (PITCH_BEND_CENTER - 1) as f32;
    normalized.clamp(-1.0, 1.0)
}

/// A patch switch caused by a controller edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchChange {
    /// Index before the switch.
    pub previous: usize,
    /// Index after the switch.
    pub current: usize,
}

/// Controller values, current pitch bend and the active patch index.
///
/// # Invariants
///
/// - every stored controller value is in 0-127
/// - `-1.0 <= pitch <= 1.0`
/// - `patch_index < patch_count`
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    values: [u8; CONTROLLER_COUNT],
    pitch: f32,
    patch_index: usize,
    patch_count: usize,
}

impl ControlState {
    /// Fresh state for a set of `patch_count` patches, starting on patch 0.
    ///
    /// A count of zero is treated as one.
    pub fn new(patch_count: usize) -> Self {
        Self {
            values: [0; CONTROLLER_COUNT],
            pitch: 0.0,
            patch_index: 0,
            patch_count: patch_count.max(1),
        }
    }

    /// Last value stored for `controller` (controllers above 127 saturate).
    pub fn value(&self, controller: u8) -> u8 {
        self.values[usize::from(controller.min(MAX_CONTROL_VALUE))]
    }

    /// Current sustain pedal value.
    pub fn sustain(&self) -> u8 {
        self.values[usize::from(CC_SUSTAIN)]
    }

    /// Current pitch bend in [-1, 1].
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Index of the active patch.
    pub fn patch_index(&self) -> usize {
        self.patch_index
    }

    /// Number of selectable patches.
    pub fn patch_count(&self) -> usize {
        self.patch_count
    }

    /// Store a controller value and run the patch-selector edge detection.
    ///
    /// Returns the switch when the active patch index actually moved. A
    /// rising edge that is already at the first or last patch is absorbed.
    pub fn apply_control_change(&mut self, controller: u8, value: u8) -> Option<PatchChange> {
        let controller = controller.min(MAX_CONTROL_VALUE);
        let value = value.min(MAX_CONTROL_VALUE);
        let slot = &mut self.values[usize::from(controller)];
        let previous_value = *slot;
        *slot = value;

        let rising_edge = previous_value < MAX_CONTROL_VALUE && value == MAX_CONTROL_VALUE;
        if !rising_edge {
            return None;
        }

        let previous = self.patch_index;
        let current = match controller {
            CC_PATCH_NEXT => (previous + 1).min(self.patch_count - 1),
            CC_PATCH_PREV => previous.saturating_sub(1),
            _ => return None,
        };
        self.patch_index = current;

        (current != previous).then_some(PatchChange { previous, current })
    }

    /// Store an already-normalized pitch bend, clamped to [-1, 1].
    ///
    /// NaN recenters the bend.
    pub fn apply_pitch_bend(&mut self, pitch: f32) {
        self.pitch = if pitch.is_nan() {
            0.0
        } else {
            pitch.clamp(-1.0, 1.0)
        };
    }

    /// Normalize a raw 14-bit bend and store it.
    pub fn apply_pitch_bend_raw(&mut self, raw: u16) {
        self.apply_pitch_bend(pitch_bend_from_14bit(raw));
    }

    /// Return every controller, the bend and the patch selection to rest.
    pub fn reset(&mut self) {
        *self = Self::new(self.patch_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_at_rest() {
        let state = ControlState::new(2);
        assert_eq!(state.patch_index(), 0);
        assert_eq!(state.pitch(), 0.0);
        assert_eq!(state.sustain(), 0);
        assert_eq!(state.patch_count(), 2);
        assert_eq!(ControlState::new(0).patch_count(), 1);
    }

    #[test]
    fn test_values_are_stored() {
        let mut state = ControlState::new(2);
        assert_eq!(state.apply_control_change(7, 99), None);
        assert_eq!(state.value(7), 99);
        state.apply_control_change(CC_SUSTAIN, 127);
        assert_eq!(state.sustain(), 127);
    }

    #[test]
    fn test_out_of_range_values_saturate() {
        let mut state = ControlState::new(2);
        state.apply_control_change(200, 250);
        assert_eq!(state.value(127), 127);
        assert_eq!(state.value(255), 127);
    }

    #[test]
    fn test_next_patch_on_rising_edge_only() {
        let mut state = ControlState::new(3);
        state.apply_control_change(CC_PATCH_NEXT, 50);
        assert_eq!(
            state.apply_control_change(CC_PATCH_NEXT, 127),
            Some(PatchChange {
                previous: 0,
                current: 1
            })
        );
        assert_eq!(state.apply_control_change(CC_PATCH_NEXT, 127), None);
        assert_eq!(state.patch_index(), 1);

        state.apply_control_change(CC_PATCH_NEXT, 0);
        state.apply_control_change(CC_PATCH_NEXT, 127);
        assert_eq!(state.patch_index(), 2);
    }

    #[test]
    fn test_first_push_from_rest_is_an_edge() {
        let mut state = ControlState::new(2);
        assert!(state.apply_control_change(CC_PATCH_NEXT, 127).is_some());
    }

    #[test]
    fn test_patch_index_clamps_at_both_ends() {
        let mut state = ControlState::new(2);
        for _ in 0..4 {
            state.apply_control_change(CC_PATCH_NEXT, 0);
            state.apply_control_change(CC_PATCH_NEXT, 127);
        }
        assert_eq!(state.patch_index(), 1);

        // Already at the last patch: the edge is absorbed.
        state.apply_control_change(CC_PATCH_NEXT, 0);
        assert_eq!(state.apply_control_change(CC_PATCH_NEXT, 127), None);

        for _ in 0..4 {
            state.apply_control_change(CC_PATCH_PREV, 0);
            state.apply_control_change(CC_PATCH_PREV, 127);
        }
        assert_eq!(state.patch_index(), 0);
    }

    #[test]
    fn test_previous_patch() {
        let mut state = ControlState::new(2);
        state.apply_control_change(CC_PATCH_NEXT, 127);
        assert_eq!(
            state.apply_control_change(CC_PATCH_PREV, 127),
            Some(PatchChange {
                previous: 1,
                current: 0
            })
        );
    }

    #[test]
    fn test_other_controllers_at_127_do_not_switch() {
        let mut state = ControlState::new(2);
        assert_eq!(state.apply_control_change(3, 127), None);
        assert_eq!(state.patch_index(), 0);
    }

    #[test]
    fn test_pitch_bend_clamps() {
        let mut state = ControlState::new(1);
        state.apply_pitch_bend(0.25);
        assert_eq!(state.pitch(), 0.25);
        state.apply_pitch_bend(-3.0);
        assert_eq!(state.pitch(), -1.0);
        state.apply_pitch_bend(2.0);
        assert_eq!(state.pitch(), 1.0);
        state.apply_pitch_bend(f32::NAN);
        assert_eq!(state.pitch(), 0.0);
    }

    #[test]
    fn test_pitch_bend_from_14bit() {
        assert_eq!(pitch_bend_from_14bit(8192), 0.0);
        assert_eq!(pitch_bend_from_14bit(16383), 1.0);
        assert_eq!(pitch_bend_from_14bit(0), -1.0);
        assert_eq!(pitch_bend_from_14bit(u16::MAX), 1.0);
        assert!((pitch_bend_from_14bit(8192 + 4096) - 4096.0 / 8191.0).abs() < 1e-6);
    }

    #[test]
    fn test_apply_pitch_bend_raw() {
        let mut state = ControlState::new(1);
        state.apply_pitch_bend_raw(16383);
        assert_eq!(state.pitch(), 1.0);
    }

    #[test]
    fn test_reset_keeps_patch_count() {
        let mut state = ControlState::new(2);
        state.apply_control_change(CC_PATCH_NEXT, 127);
        state.apply_control_change(CC_SUSTAIN, 100);
        state.apply_pitch_bend(0.5);
        state.reset();
        assert_eq!(state, ControlState::new(2));
    }
}
