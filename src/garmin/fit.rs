//! Minimal FIT file writer for body composition uploads.
//!
//! Garmin Connect has no JSON endpoint for body composition. A weight scale
//! reading is written as a FIT file holding `file_id`, `device_info` and a
//! single `weight_scale` message, then uploaded like an activity.

use chrono::{DateTime, Utc};

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
const FIT_EPOCH_OFFSET: i64 = 631_065_600;

const HEADER_SIZE: u8 = 14;
const PROTOCOL_VERSION: u8 = 0x20;
const PROFILE_VERSION: u16 = 2132;

const MESG_FILE_ID: u16 = 0;
const MESG_DEVICE_INFO: u16 = 23;
const MESG_WEIGHT_SCALE: u16 = 30;

const FILE_TYPE_WEIGHT: u8 = 9;
const MANUFACTURER_DEVELOPMENT: u16 = 255;

const FIELD_TIMESTAMP: u8 = 253;

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// One body composition reading. Masses are in kilograms, rates in kcal/day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyComposition {
    pub weight: f64,
    pub percent_fat: Option<f64>,
    pub percent_hydration: Option<f64>,
    pub visceral_fat_mass: Option<f64>,
    pub bone_mass: Option<f64>,
    pub muscle_mass: Option<f64>,
    pub basal_met: Option<f64>,
    pub active_met: Option<f64>,
    pub physique_rating: Option<u8>,
    pub metabolic_age: Option<f64>,
    pub visceral_fat_rating: Option<u8>,
    pub bmi: Option<f64>,
}

#[derive(Clone, Copy)]
enum BaseType {
    Enum,
    U8,
    U16,
    U32,
    U32z,
}

impl BaseType {
    fn id(self) -> u8 {
        match self {
            BaseType::Enum => 0x00,
            BaseType::U8 => 0x02,
            BaseType::U16 => 0x84,
            BaseType::U32 => 0x86,
            BaseType::U32z => 0x8C,
        }
    }

    fn size(self) -> u8 {
        match self {
            BaseType::Enum | BaseType::U8 => 1,
            BaseType::U16 => 2,
            BaseType::U32 | BaseType::U32z => 4,
        }
    }

    fn invalid(self) -> u32 {
        match self {
            BaseType::Enum | BaseType::U8 => 0xFF,
            BaseType::U16 => 0xFFFF,
            BaseType::U32 => 0xFFFF_FFFF,
            BaseType::U32z => 0,
        }
    }
}

struct Field {
    number: u8,
    base: BaseType,
    value: Option<u32>,
}

impl Field {
    fn new(number: u8, base: BaseType, value: Option<u32>) -> Self {
        Self { number, base, value }
    }
}

/// Encode a weight scale FIT file for `composition` measured at `timestamp`.
pub fn encode_weight_scale(composition: &BodyComposition, timestamp: DateTime<Utc>) -> Vec<u8> {
    let ts = fit_timestamp(timestamp);
    let mut records = Vec::new();

    write_message(
        &mut records,
        0,
        MESG_FILE_ID,
        &[
            Field::new(0, BaseType::Enum, Some(FILE_TYPE_WEIGHT.into())),
            Field::new(1, BaseType::U16, Some(MANUFACTURER_DEVELOPMENT.into())),
            Field::new(2, BaseType::U16, Some(0)),
            Field::new(3, BaseType::U32z, None),
            Field::new(4, BaseType::U32, Some(ts)),
        ],
    );

    write_message(
        &mut records,
        1,
        MESG_DEVICE_INFO,
        &[
            Field::new(FIELD_TIMESTAMP, BaseType::U32, Some(ts)),
            Field::new(2, BaseType::U16, Some(MANUFACTURER_DEVELOPMENT.into())),
            Field::new(4, BaseType::U16, Some(0)),
            Field::new(5, BaseType::U16, None),
            Field::new(6, BaseType::U8, None),
        ],
    );

    let c = composition;
    write_message(
        &mut records,
        2,
        MESG_WEIGHT_SCALE,
        &[
            Field::new(FIELD_TIMESTAMP, BaseType::U32, Some(ts)),
            Field::new(0, BaseType::U16, scaled(Some(c.weight), 100.0, BaseType::U16)),
            Field::new(1, BaseType::U16, scaled(c.percent_fat, 100.0, BaseType::U16)),
            Field::new(2, BaseType::U16, scaled(c.percent_hydration, 100.0, BaseType::U16)),
            Field::new(3, BaseType::U16, scaled(c.visceral_fat_mass, 100.0, BaseType::U16)),
            Field::new(4, BaseType::U16, scaled(c.bone_mass, 100.0, BaseType::U16)),
            Field::new(5, BaseType::U16, scaled(c.muscle_mass, 100.0, BaseType::U16)),
            Field::new(7, BaseType::U16, scaled(c.basal_met, 4.0, BaseType::U16)),
            Field::new(8, BaseType::U8, c.physique_rating.map(u32::from)),
            Field::new(9, BaseType::U16, scaled(c.active_met, 4.0, BaseType::U16)),
            Field::new(10, BaseType::U8, scaled(c.metabolic_age, 1.0, BaseType::U8)),
            Field::new(11, BaseType::U8, c.visceral_fat_rating.map(u32::from)),
            Field::new(13, BaseType::U16, scaled(c.bmi, 10.0, BaseType::U16)),
        ],
    );

    let mut file = Vec::with_capacity(records.len() + usize::from(HEADER_SIZE) + 2);
    file.push(HEADER_SIZE);
    file.push(PROTOCOL_VERSION);
    file.extend_from_slice(&PROFILE_VERSION.to_le_bytes());
    // FIT caps files at 4 GiB; three small messages never come close.
    file.extend_from_slice(&(records.len() as u32).to_le_bytes());
    file.extend_from_slice(b".FIT");
    let header_crc = crc16(&file);
    file.extend_from_slice(&header_crc.to_le_bytes());

    file.extend_from_slice(&records);
    let file_crc = crc16(&file);
    file.extend_from_slice(&file_crc.to_le_bytes());
    file
}

/// FIT CRC-16 over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |crc, &byte| {
        let crc = crc_nibble(crc, byte & 0x0F);
        crc_nibble(crc, byte >> 4)
    })
}

fn crc_nibble(crc: u16, nibble: u8) -> u16 {
    let tmp = CRC_TABLE[usize::from(crc & 0x0F)];
    let crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[usize::from(nibble)]
}

fn fit_timestamp(timestamp: DateTime<Utc>) -> u32 {
    let secs = timestamp.timestamp() - FIT_EPOCH_OFFSET;
    u32::try_from(secs.max(0)).unwrap_or(u32::MAX - 1)
}

/// Scale a physical value into its stored integer, clamped below the
/// invalid sentinel of `base`.
fn scaled(value: Option<f64>, scale: f64, base: BaseType) -> Option<u32> {
    let value = value?;
    if !value.is_finite() {
        return None;
    }
    let max = f64::from(base.invalid() - 1);
    Some((value * scale).round().clamp(0.0, max) as u32)
}

fn write_message(out: &mut Vec<u8>, local: u8, global: u16, fields: &[Field]) {
    out.push(0x40 | local);
    out.push(0);
    out.push(0);
    out.extend_from_slice(&global.to_le_bytes());
    // Every message written here has fewer than 256 fields.
    out.push(fields.len() as u8);
    for field in fields {
        out.extend_from_slice(&[field.number, field.base.size(), field.base.id()]);
    }

    out.push(local);
    for field in fields {
        let value = field.value.unwrap_or(field.base.invalid());
        let bytes = value.to_le_bytes();
        out.extend_from_slice(&bytes[..usize::from(field.base.size())]);
    }
}
