//! Wire protocol shared by the rover console links: line framing, inbound
//! line decoding and outbound command encoding.

pub mod command;
pub mod framer;
pub mod message;

pub use command::{servo_angle, Command, DriveCommand, OperatorCommand, ParseCommandError};
pub use framer::LineFramer;
pub use message::{decode, BatterySample, LaserEvent, Message, RadarSample, VehicleStatus};
