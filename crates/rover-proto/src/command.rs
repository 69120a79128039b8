use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_SERVO_ANGLE: u8 = 180;
pub const PRESET_ANGLES: [u8; 5] = [0, 45, 90, 135, 180];

/// Clamps a requested angle into the servo range.
pub fn servo_angle(deg: i32) -> u8 {
    deg.clamp(0, MAX_SERVO_ANGLE as i32) as u8
}

/// Commands sent to the radar/laser controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Angle(u8),
    LaserOn,
    LaserOff,
    Auto,
    Manual,
}

impl Command {
    /// Servo angle command, clamped to the servo range.
    pub fn angle(deg: i32) -> Self {
        Command::Angle(servo_angle(deg))
    }

    /// Wire bytes, newline terminated.
    pub fn encode(&self) -> Vec<u8> {
        format!("{}\n", self).into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Angle(a) => write!(f, "{}", a),
            Command::LaserOn => f.write_str("LASER_ON"),
            Command::LaserOff => f.write_str("LASER_OFF"),
            Command::Auto => f.write_str("AUTO"),
            Command::Manual => f.write_str("MANUAL"),
        }
    }
}

/// Commands sent to the drive controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveCommand {
    Forward,
    Backward,
    Left,
    Right,
}

impl DriveCommand {
    pub fn encode(&self) -> Vec<u8> {
        format!("{}\n", self).into_bytes()
    }
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriveCommand::Forward => "FORWARD",
            DriveCommand::Backward => "BACKWARD",
            DriveCommand::Left => "LEFT",
            DriveCommand::Right => "RIGHT",
        })
    }
}

/// Operator input typed at the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    ToggleAuto,
    /// Slider position; clamped when sent.
    Angle(i32),
    /// One of the fixed angle buttons.
    Preset(u8),
    Drive(DriveCommand),
    ClearDetections,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` needs an angle argument")]
    MissingAngle(&'static str),
    #[error("invalid angle `{0}`")]
    InvalidAngle(String),
    #[error("no preset button for {0} degrees (have 0, 45, 90, 135, 180)")]
    NoSuchPreset(u8),
}

impl FromStr for OperatorCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().ok_or(ParseCommandError::Empty)?.to_ascii_lowercase();

        let cmd = match verb.as_str() {
            "auto" => OperatorCommand::ToggleAuto,
            "angle" | "slider" => OperatorCommand::Angle(parse_angle(words.next(), "angle")?),
            "preset" => {
                let deg = parse_angle(words.next(), "preset")?;
                let deg = u8::try_from(deg).map_err(|_| ParseCommandError::InvalidAngle(deg.to_string()))?;
                if !PRESET_ANGLES.contains(&deg) {
                    return Err(ParseCommandError::NoSuchPreset(deg));
                }
                OperatorCommand::Preset(deg)
            }
            "forward" | "f" => OperatorCommand::Drive(DriveCommand::Forward),
            "backward" | "b" => OperatorCommand::Drive(DriveCommand::Backward),
            "left" | "l" => OperatorCommand::Drive(DriveCommand::Left),
            "right" | "r" => OperatorCommand::Drive(DriveCommand::Right),
            "clear" => OperatorCommand::ClearDetections,
            "status" => OperatorCommand::Status,
            "quit" | "exit" => OperatorCommand::Quit,
            _ => return Err(ParseCommandError::Unknown(verb)),
        };
        Ok(cmd)
    }
}

fn parse_angle(arg: Option<&str>, verb: &'static str) -> Result<i32, ParseCommandError> {
    let arg = arg.ok_or(ParseCommandError::MissingAngle(verb))?;
    arg.parse().map_err(|_| ParseCommandError::InvalidAngle(arg.to_string()))
}
