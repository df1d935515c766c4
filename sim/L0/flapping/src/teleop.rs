//! Line-based keyboard teleoperation of the control topics.

use crate::control::ControlUpdate;

/// Key bindings, printed by interactive front ends.
pub const HELP: &str = "\
Press 's' to start oscillation, 'x' to stop.
Press 'f' 'F' to increase/decrease frequency, 'a' 'A' to increase/decrease amplitude.
Press 'z' 'Z' to increase/decrease Z-axis amplitude, 'v' 'V' to increase/decrease Z-axis frequency.
Press 'q' to quit.";

const FREQUENCY_STEP: f32 = 0.5;
const AMPLITUDE_STEP: f32 = 0.02;
const Z_AMPLITUDE_STEP: f32 = 0.01;
const Z_FREQUENCY_STEP: f32 = 0.2;

/// What a command line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum TeleopCommand {
    /// Publish this update.
    Publish(ControlUpdate),
    /// Leave the teleop loop.
    Quit,
    /// Unrecognised input.
    Unknown(String),
}

/// Operator-side view of the parameters.
///
/// Tracks the values it has sent so that increments are relative to the last
/// command, not to whatever the plugin currently holds. Its starting values
/// are independent of the plugin's configured defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Teleop {
    /// Last flap frequency sent, in Hz.
    pub frequency: f32,
    /// Last flap amplitude sent.
    pub amplitude: f32,
    /// Last bounce amplitude sent, in meters.
    pub z_amplitude: f32,
    /// Last bounce frequency sent, in Hz.
    pub z_frequency: f32,
    /// Last oscillation flag sent.
    pub oscillating: bool,
}

impl Default for Teleop {
    fn default() -> Self {
        Self {
            frequency: 3.0,
            amplitude: 0.1,
            z_amplitude: 0.05,
            z_frequency: 1.0,
            oscillating: false,
        }
    }
}

impl Teleop {
    /// Interpret one line of input. Surrounding whitespace is ignored; the
    /// rest must be exactly one command key.
    pub fn handle(&mut self, line: &str) -> TeleopCommand {
        let update = match line.trim() {
            "s" => self.set_oscillating(true),
            "x" => self.set_oscillating(false),
            "f" => ControlUpdate::FlapFrequency(step(&mut self.frequency, FREQUENCY_STEP)),
            "F" => ControlUpdate::FlapFrequency(step(&mut self.frequency, -FREQUENCY_STEP)),
            "a" => ControlUpdate::FlapAmplitude(step(&mut self.amplitude, AMPLITUDE_STEP)),
            "A" => ControlUpdate::FlapAmplitude(step(&mut self.amplitude, -AMPLITUDE_STEP)),
            "z" => ControlUpdate::ZAmplitude(step(&mut self.z_amplitude, Z_AMPLITUDE_STEP)),
            "Z" => ControlUpdate::ZAmplitude(step(&mut self.z_amplitude, -Z_AMPLITUDE_STEP)),
            "v" => ControlUpdate::ZFrequency(step(&mut self.z_frequency, Z_FREQUENCY_STEP)),
            "V" => ControlUpdate::ZFrequency(step(&mut self.z_frequency, -Z_FREQUENCY_STEP)),
            "q" => return TeleopCommand::Quit,
            other => return TeleopCommand::Unknown(other.to_string()),
        };
        TeleopCommand::Publish(update)
    }

    fn set_oscillating(&mut self, enabled: bool) -> ControlUpdate {
        self.oscillating = enabled;
        ControlUpdate::Oscillation(enabled)
    }
}

fn step(value: &mut f32, delta: f32) -> f32 {
    *value += delta;
    *value
}

/// Human-readable confirmation of an update.
#[must_use]
pub fn describe(update: &ControlUpdate) -> String {
    match *update {
        ControlUpdate::FlapFrequency(hz) => format!("Frequency set to {hz} Hz"),
        ControlUpdate::FlapAmplitude(a) => format!("Amplitude set to {a}"),
        ControlUpdate::Oscillation(true) => "Oscillation started".to_string(),
        ControlUpdate::Oscillation(false) => "Oscillation stopped".to_string(),
        ControlUpdate::ZAmplitude(m) => format!("Z-axis amplitude set to {m} m"),
        ControlUpdate::ZFrequency(hz) => format!("Z-axis frequency set to {hz} Hz"),
    }
}
