//! AI conditions
//!
//! Stored tags are `0x04000000 | tag`. Payloads are packed C structs, so
//! multi-byte fields are aligned to their own size from the payload start.

use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::common::TaggedRecord;
use crate::io::{AlignedReader, AlignedWriter, TextEncoding};

/// How a stored value is compared against the live one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Comparison {
    #[default]
    Equal = 0,
    Greater = 1,
    GreaterEqual = 2,
    Less = 3,
    LessEqual = 4,
    NotEqual = 10,
}

impl TryFrom<u8> for Comparison {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Comparison::Equal,
            1 => Comparison::Greater,
            2 => Comparison::GreaterEqual,
            3 => Comparison::Less,
            4 => Comparison::LessEqual,
            10 => Comparison::NotEqual,
            other => {
                return Err(Error::InvalidTag {
                    family: "AI comparison",
                    value: u32::from(other),
                });
            }
        })
    }
}

impl Comparison {
    pub fn evaluate(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterEqual => lhs >= rhs,
            Comparison::Less => lhs < rhs,
            Comparison::LessEqual => lhs <= rhs,
            Comparison::NotEqual => lhs != rhs,
        }
    }

    fn read<R: Read + Seek>(reader: &mut AlignedReader<R>) -> Result<Self> {
        Self::try_from(reader.read_u8()?)
    }
}

/// A game-clock window in hours and minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl TimeWindow {
    fn read<R: Read + Seek>(reader: &mut AlignedReader<R>) -> Result<Self> {
        Ok(Self {
            start_hour: reader.read_u8()?,
            start_minute: reader.read_u8()?,
            end_hour: reader.read_u8()?,
            end_minute: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut AlignedWriter<W>) -> Result<()> {
        writer.write_u8(self.start_hour)?;
        writer.write_u8(self.start_minute)?;
        writer.write_u8(self.end_hour)?;
        writer.write_u8(self.end_minute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    FightOrDelay {
        fight: bool,
    },
    Damage {
        damage: i32,
        received: bool,
    },
    NearbyCharacters {
        distance: i32,
        is_allied: bool,
        level_min: i16,
        level_max: i16,
        count: u16,
    },
    DistanceFromSpawn {
        distance: i32,
    },
    DistanceToTarget {
        distance: i32,
        more: bool,
    },
    TargetAbility {
        ability: u8,
        difference: i32,
        more: bool,
    },
    HealthPercent {
        percent: i32,
        more: bool,
    },
    Random {
        percent: u8,
    },
    FindNearestTarget {
        distance: i32,
        level_min: i16,
        level_max: i16,
        is_allied: bool,
    },
    TargetChanged,
    CompareTargetAbility {
        ability: u8,
        more: bool,
    },
    CheckAbility {
        ability: u8,
        value: i32,
        more: bool,
    },
    TimeOfDay {
        night: bool,
    },
    TargetStatus {
        target: u8,
        status_type: u8,
        has: bool,
    },
    ObjectVariable {
        variable: u8,
        value: i32,
        comparison: Comparison,
    },
    WorldVariable {
        variable: i16,
        value: i32,
        comparison: Comparison,
    },
    EconomyVariable {
        variable: i16,
        value: i32,
        comparison: Comparison,
    },
    SelectNpc {
        npc: i32,
    },
    DistanceToOwner {
        distance: i32,
        comparison: Comparison,
    },
    ZoneTime {
        start: u32,
        end: u32,
    },
    OwnAbility {
        ability: u8,
        value: i32,
        comparison: Comparison,
    },
    HasNoOwner,
    HasOwner,
    WorldTime {
        start: u32,
        end: u32,
    },
    MonthDay {
        day: u8,
        window: TimeWindow,
    },
    WeekDay {
        weekday: u8,
        window: TimeWindow,
    },
    ChannelNumber {
        min: u16,
        max: u16,
    },
    NearbyCharactersCompare {
        distance: i32,
        is_allied: bool,
        level_min: i16,
        level_max: i16,
        count: u16,
        comparison: Comparison,
    },
    MonsterVariable {
        variable: i16,
        value: i32,
        comparison: Comparison,
    },
}

impl TaggedRecord for Condition {
    const FAMILY: &'static str = "AI condition";

    fn tag(&self) -> u32 {
        match self {
            Condition::FightOrDelay { .. } => 1,
            Condition::Damage { .. } => 2,
            Condition::NearbyCharacters { .. } => 3,
            Condition::DistanceFromSpawn { .. } => 4,
            Condition::DistanceToTarget { .. } => 5,
            Condition::TargetAbility { .. } => 6,
            Condition::HealthPercent { .. } => 7,
            Condition::Random { .. } => 8,
            Condition::FindNearestTarget { .. } => 9,
            Condition::TargetChanged => 10,
            Condition::CompareTargetAbility { .. } => 11,
            Condition::CheckAbility { .. } => 12,
            Condition::TimeOfDay { .. } => 13,
            Condition::TargetStatus { .. } => 14,
            Condition::ObjectVariable { .. } => 15,
            Condition::WorldVariable { .. } => 16,
            Condition::EconomyVariable { .. } => 17,
            Condition::SelectNpc { .. } => 18,
            Condition::DistanceToOwner { .. } => 19,
            Condition::ZoneTime { .. } => 20,
            Condition::OwnAbility { .. } => 21,
            Condition::HasNoOwner => 22,
            Condition::HasOwner => 23,
            Condition::WorldTime { .. } => 24,
            Condition::MonthDay { .. } => 25,
            Condition::WeekDay { .. } => 26,
            Condition::ChannelNumber { .. } => 27,
            Condition::NearbyCharactersCompare { .. } => 28,
            Condition::MonsterVariable { .. } => 29,
        }
    }

    fn read_payload<R: Read + Seek>(
        tag: u32,
        reader: &mut AlignedReader<R>,
        _encoding: TextEncoding,
    ) -> Result<Self> {
        Ok(match tag {
            1 => Condition::FightOrDelay {
                fight: reader.read_bool()?,
            },
            2 => Condition::Damage {
                damage: reader.read_i32()?,
                received: reader.read_bool()?,
            },
            3 => Condition::NearbyCharacters {
                distance: reader.read_i32()?,
                is_allied: reader.read_bool()?,
                level_min: reader.read_i16()?,
                level_max: reader.read_i16()?,
                count: reader.read_u16()?,
            },
            4 => Condition::DistanceFromSpawn {
                distance: reader.read_i32()?,
            },
            5 => Condition::DistanceToTarget {
                distance: reader.read_i32()?,
                more: reader.read_bool()?,
            },
            6 => Condition::TargetAbility {
                ability: reader.read_u8()?,
                difference: reader.read_i32()?,
                more: reader.read_bool()?,
            },
            7 => Condition::HealthPercent {
                percent: reader.read_i32()?,
                more: reader.read_bool()?,
            },
            8 => Condition::Random {
                percent: reader.read_u8()?,
            },
            9 => Condition::FindNearestTarget {
                distance: reader.read_i32()?,
                level_min: reader.read_i16()?,
                level_max: reader.read_i16()?,
                is_allied: reader.read_bool()?,
            },
            10 => Condition::TargetChanged,
            11 => Condition::CompareTargetAbility {
                ability: reader.read_u8()?,
                more: reader.read_bool()?,
            },
            12 => Condition::CheckAbility {
                ability: reader.read_u8()?,
                value: reader.read_i32()?,
                more: reader.read_bool()?,
            },
            13 => Condition::TimeOfDay {
                night: reader.read_bool()?,
            },
            14 => Condition::TargetStatus {
                target: reader.read_u8()?,
                status_type: reader.read_u8()?,
                has: reader.read_bool()?,
            },
            15 => Condition::ObjectVariable {
                variable: reader.read_u8()?,
                value: reader.read_i32()?,
                comparison: Comparison::read(reader)?,
            },
            16 => Condition::WorldVariable {
                variable: reader.read_i16()?,
                value: reader.read_i32()?,
                comparison: Comparison::read(reader)?,
            },
            17 => Condition::EconomyVariable {
                variable: reader.read_i16()?,
                value: reader.read_i32()?,
                comparison: Comparison::read(reader)?,
            },
            18 => Condition::SelectNpc {
                npc: reader.read_i32()?,
            },
            19 => Condition::DistanceToOwner {
                distance: reader.read_i32()?,
                comparison: Comparison::read(reader)?,
            },
            20 => Condition::ZoneTime {
                start: reader.read_u32()?,
                end: reader.read_u32()?,
            },
            21 => Condition::OwnAbility {
                ability: reader.read_u8()?,
                value: reader.read_i32()?,
                comparison: Comparison::read(reader)?,
            },
            22 => Condition::HasNoOwner,
            23 => Condition::HasOwner,
            24 => Condition::WorldTime {
                start: reader.read_u32()?,
                end: reader.read_u32()?,
            },
            25 => Condition::MonthDay {
                day: reader.read_u8()?,
                window: TimeWindow::read(reader)?,
            },
            26 => Condition::WeekDay {
                weekday: reader.read_u8()?,
                window: TimeWindow::read(reader)?,
            },
            27 => Condition::ChannelNumber {
                min: reader.read_u16()?,
                max: reader.read_u16()?,
            },
            28 => Condition::NearbyCharactersCompare {
                distance: reader.read_i32()?,
                is_allied: reader.read_bool()?,
                level_min: reader.read_i16()?,
                level_max: reader.read_i16()?,
                count: reader.read_u16()?,
                comparison: Comparison::read(reader)?,
            },
            29 => Condition::MonsterVariable {
                variable: reader.read_i16()?,
                value: reader.read_i32()?,
                comparison: Comparison::read(reader)?,
            },
            other => return Err(Self::invalid_tag(other)),
        })
    }

    fn write_payload<W: Write>(
        &self,
        writer: &mut AlignedWriter<W>,
        _encoding: TextEncoding,
    ) -> Result<()> {
        match self {
            Condition::FightOrDelay { fight } => writer.write_bool(*fight),
            Condition::Damage { damage, received } => {
                writer.write_i32(*damage)?;
                writer.write_bool(*received)
            }
            Condition::NearbyCharacters {
                distance,
                is_allied,
                level_min,
                level_max,
                count,
            } => {
                writer.write_i32(*distance)?;
                writer.write_bool(*is_allied)?;
                writer.write_i16(*level_min)?;
                writer.write_i16(*level_max)?;
                writer.write_u16(*count)
            }
            Condition::DistanceFromSpawn { distance } => writer.write_i32(*distance),
            Condition::DistanceToTarget { distance, more } => {
                writer.write_i32(*distance)?;
                writer.write_bool(*more)
            }
            Condition::TargetAbility {
                ability,
                difference,
                more,
            } => {
                writer.write_u8(*ability)?;
                writer.write_i32(*difference)?;
                writer.write_bool(*more)
            }
            Condition::HealthPercent { percent, more } => {
                writer.write_i32(*percent)?;
                writer.write_bool(*more)
            }
            Condition::Random { percent } => writer.write_u8(*percent),
            Condition::FindNearestTarget {
                distance,
                level_min,
                level_max,
                is_allied,
            } => {
                writer.write_i32(*distance)?;
                writer.write_i16(*level_min)?;
                writer.write_i16(*level_max)?;
                writer.write_bool(*is_allied)
            }
            Condition::TargetChanged | Condition::HasNoOwner | Condition::HasOwner => Ok(()),
            Condition::CompareTargetAbility { ability, more } => {
                writer.write_u8(*ability)?;
                writer.write_bool(*more)
            }
            Condition::CheckAbility {
                ability,
                value,
                more,
            } => {
                writer.write_u8(*ability)?;
                writer.write_i32(*value)?;
                writer.write_bool(*more)
            }
            Condition::TimeOfDay { night } => writer.write_bool(*night),
            Condition::TargetStatus {
                target,
                status_type,
                has,
            } => {
                writer.write_u8(*target)?;
                writer.write_u8(*status_type)?;
                writer.write_bool(*has)
            }
            Condition::ObjectVariable {
                variable,
                value,
                comparison,
            }
            | Condition::OwnAbility {
                ability: variable,
                value,
                comparison,
            } => {
                writer.write_u8(*variable)?;
                writer.write_i32(*value)?;
                writer.write_u8(*comparison as u8)
            }
            Condition::WorldVariable {
                variable,
                value,
                comparison,
            }
            | Condition::EconomyVariable {
                variable,
                value,
                comparison,
            }
            | Condition::MonsterVariable {
                variable,
                value,
                comparison,
            } => {
                writer.write_i16(*variable)?;
                writer.write_i32(*value)?;
                writer.write_u8(*comparison as u8)
            }
            Condition::SelectNpc { npc } => writer.write_i32(*npc),
            Condition::DistanceToOwner {
                distance,
                comparison,
            } => {
                writer.write_i32(*distance)?;
                writer.write_u8(*comparison as u8)
            }
            Condition::ZoneTime { start, end } | Condition::WorldTime { start, end } => {
                writer.write_u32(*start)?;
                writer.write_u32(*end)
            }
            Condition::MonthDay { day, window } | Condition::WeekDay { weekday: day, window } => {
                writer.write_u8(*day)?;
                window.write(writer)
            }
            Condition::ChannelNumber { min, max } => {
                writer.write_u16(*min)?;
                writer.write_u16(*max)
            }
            Condition::NearbyCharactersCompare {
                distance,
                is_allied,
                level_min,
                level_max,
                count,
                comparison,
            } => {
                writer.write_i32(*distance)?;
                writer.write_bool(*is_allied)?;
                writer.write_i16(*level_min)?;
                writer.write_i16(*level_max)?;
                writer.write_u16(*count)?;
                writer.write_u8(*comparison as u8)
            }
        }
    }
}
