use serde::{Deserialize, Serialize};

pub const LASER_ACTIVATED: &str = "LASER_ACTIVATED";
pub const LASER_DEACTIVATED: &str = "LASER_DEACTIVATED";

const BATTERY_TAG: &str = "B,";
const BATTERY_FIELDS: usize = 6;
const VEHICLE_STATUS_MIN_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarSample {
    /// degrees, 0..180 from the servo
    pub angle: f32,
    /// centimeters
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatterySample {
    pub bus_voltage: f32,   // V
    pub shunt_voltage: f32, // mV
    pub load_voltage: f32,  // V
    pub current: f32,       // mA
    pub power: f32,         // mW
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaserEvent {
    Activated,
    Deactivated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Radar(RadarSample),
    Battery(BatterySample),
    Laser(LaserEvent),
    Unknown,
}

/// Classifies one framed line from the radar/laser link.
///
/// Battery records are multiplexed onto this link behind a `B,` prefix. The
/// prefix wins over the generic comma check, so a malformed battery record
/// never falls through to the radar shape.
pub fn decode(line: &str) -> Message {
    if let Some(record) = line.strip_prefix(BATTERY_TAG) {
        return decode_battery(record).map_or(Message::Unknown, Message::Battery);
    }

    if line.contains(',') {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 2 {
            return Message::Unknown;
        }
        return Message::Radar(RadarSample {
            angle: parse_field(parts[0]),
            distance: parse_field(parts[1]),
        });
    }

    match line {
        LASER_ACTIVATED => Message::Laser(LaserEvent::Activated),
        LASER_DEACTIVATED => Message::Laser(LaserEvent::Deactivated),
        _ => Message::Unknown,
    }
}

/// Parses a 6-field battery record: a tag that is not inspected, then bus,
/// shunt and load voltage, current and power. The dedicated battery link
/// sends these bare; the radar link prefixes them with `B,`.
pub fn decode_battery(line: &str) -> Option<BatterySample> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != BATTERY_FIELDS {
        return None;
    }
    Some(BatterySample {
        bus_voltage: parse_field(parts[1]),
        shunt_voltage: parse_field(parts[2]),
        load_voltage: parse_field(parts[3]),
        current: parse_field(parts[4]),
        power: parse_field(parts[5]),
    })
}

/// Status record reported by the drive controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub camera: String,
    pub gps: String,
    pub accelerometer: String,
    pub imu: String,
    pub speed: i32,
}

/// `camera,<reserved>,gps,accelerometer,imu,speed[,...]`
pub fn decode_vehicle_status(line: &str) -> Option<VehicleStatus> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < VEHICLE_STATUS_MIN_FIELDS {
        return None;
    }
    Some(VehicleStatus {
        camera: parts[0].to_string(),
        gps: parts[2].to_string(),
        accelerometer: parts[3].to_string(),
        imu: parts[4].to_string(),
        speed: parts[5].parse().unwrap_or(0),
    })
}

// Malformed numbers read as 0 so one bad field doesn't drop the record.
fn parse_field(s: &str) -> f32 {
    s.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_battery_record() {
        let msg = decode("B,1,12.00,0.50,11.80,150.25,1800.00");
        assert_eq!(
            msg,
            Message::Battery(BatterySample {
                bus_voltage: 12.00,
                shunt_voltage: 0.50,
                load_voltage: 11.80,
                current: 150.25,
                power: 1800.00,
            })
        );
    }

    #[test]
    fn short_battery_record_is_unknown_not_radar() {
        assert_eq!(decode("B,1,2"), Message::Unknown);
        assert_eq!(decode("B,1,2,3,4,5,6,7"), Message::Unknown);
        assert_eq!(decode("B,"), Message::Unknown);
    }

    #[test]
    fn decodes_radar_sample() {
        assert_eq!(decode("30.0,45.0"), Message::Radar(RadarSample { angle: 30.0, distance: 45.0 }));
        assert_eq!(decode("30.0,45.0,99"), Message::Unknown);
    }

    #[test]
    fn bad_numbers_degrade_to_zero() {
        assert_eq!(decode("abc,45"), Message::Radar(RadarSample { angle: 0.0, distance: 45.0 }));
        match decode("B,x,12.0,oops,11.0,1.0,2.0") {
            Message::Battery(b) => {
                assert_eq!(b.bus_voltage, 12.0);
                assert_eq!(b.shunt_voltage, 0.0);
                assert_eq!(b.power, 2.0);
            }
            other => panic!("expected battery, got {:?}", other),
        }
    }

    #[test]
    fn laser_events_need_exact_match() {
        assert_eq!(decode("LASER_ACTIVATED"), Message::Laser(LaserEvent::Activated));
        assert_eq!(decode("LASER_DEACTIVATED"), Message::Laser(LaserEvent::Deactivated));
        assert_eq!(decode("LASER_ACTIVATED!"), Message::Unknown);
        assert_eq!(decode("laser_activated"), Message::Unknown);
        assert_eq!(decode(""), Message::Unknown);
    }

    #[test]
    fn battery_link_record_tag_is_free_form() {
        let b = decode_battery("BAT,12.1,0.4,12.0,99.0,1200.0").expect("six fields");
        assert_eq!(b.load_voltage, 12.0);
        assert!(decode_battery("12.1,0.4").is_none());
    }

    #[test]
    fn vehicle_status_needs_six_fields() {
        let s = decode_vehicle_status("cam-ok,x,52.1N 4.3E,0.1,ok,37").expect("status");
        assert_eq!(s.camera, "cam-ok");
        assert_eq!(s.gps, "52.1N 4.3E");
        assert_eq!(s.speed, 37);
        assert!(decode_vehicle_status("a,b,c,d,e").is_none());
        assert_eq!(decode_vehicle_status("a,b,c,d,e,fast").map(|s| s.speed), Some(0));
    }
}
