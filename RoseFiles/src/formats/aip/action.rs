//! AI actions
//!
//! Stored tags are `0x0B000000 | tag`; payload alignment follows the same
//! packed-struct rules as conditions.

use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::common::TaggedRecord;
use crate::io::{AlignedReader, AlignedWriter, RoseReadExt, TextEncoding};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Stop,
    Emote {
        motion: u8,
    },
    Say {
        message: i32,
    },
    MoveRandom {
        distance: i32,
        speed: u8,
    },
    MoveToSpawn {
        distance: i32,
        speed: u8,
    },
    MoveToTarget {
        speed: u8,
    },
    AttackNearbyCharacter {
        distance: i32,
        ability: u8,
        more: bool,
    },
    SpecialAttack,
    MoveAwayFromTarget {
        distance: i32,
        speed: u8,
    },
    Transform {
        monster: u16,
    },
    SpawnMonster {
        monster: u16,
    },
    CallForHelp {
        distance: i32,
        monster_count: i32,
    },
    AttackNearestTarget,
    AttackFoundTarget,
    CallFamilyForAttack {
        distance: i32,
    },
    AttackDamageSource,
    RunAway {
        distance: i32,
    },
    DropItem {
        items: [i16; 5],
        to_owner: i32,
    },
    CallMonsters {
        monster: u16,
        count: u16,
        distance: i32,
    },
    AttackFoundCharacter,
    SpawnMonsterAt {
        monster: u16,
        position: u8,
        distance: i32,
    },
    KillSelf,
    UseSkill {
        target: u8,
        skill: i16,
        motion: i16,
    },
    SetObjectVariable {
        variable: u8,
        value: i32,
        operation: u8,
    },
    SetWorldVariable {
        variable: i16,
        value: i32,
        operation: u8,
    },
    SetEconomyVariable {
        variable: i16,
        value: i32,
        operation: u8,
    },
    Shout {
        message_type: u8,
        message: i32,
    },
    MoveToOwner,
    QuestTrigger {
        trigger: String,
    },
    AttackOwnersTarget,
    SetPvpFlag {
        zone: i16,
        enabled: bool,
    },
    SetRegenSystem {
        zone: i16,
        enabled: bool,
    },
    GiveItemToOwner {
        item: i16,
        count: i16,
    },
    SetMonsterVariable {
        variable: i16,
        value: i32,
        operation: u8,
    },
}

impl TaggedRecord for Action {
    const FAMILY: &'static str = "AI action";

    fn tag(&self) -> u32 {
        match self {
            Action::Stop => 1,
            Action::Emote { .. } => 2,
            Action::Say { .. } => 3,
            Action::MoveRandom { .. } => 4,
            Action::MoveToSpawn { .. } => 5,
            Action::MoveToTarget { .. } => 6,
            Action::AttackNearbyCharacter { .. } => 7,
            Action::SpecialAttack => 8,
            Action::MoveAwayFromTarget { .. } => 9,
            Action::Transform { .. } => 10,
            Action::SpawnMonster { .. } => 11,
            Action::CallForHelp { .. } => 12,
            Action::AttackNearestTarget => 13,
            Action::AttackFoundTarget => 14,
            Action::CallFamilyForAttack { .. } => 15,
            Action::AttackDamageSource => 16,
            Action::RunAway { .. } => 17,
            Action::DropItem { .. } => 18,
            Action::CallMonsters { .. } => 19,
            Action::AttackFoundCharacter => 20,
            Action::SpawnMonsterAt { .. } => 21,
            Action::KillSelf => 22,
            Action::UseSkill { .. } => 23,
            Action::SetObjectVariable { .. } => 24,
            Action::SetWorldVariable { .. } => 25,
            Action::SetEconomyVariable { .. } => 26,
            Action::Shout { .. } => 27,
            Action::MoveToOwner => 28,
            Action::QuestTrigger { .. } => 29,
            Action::AttackOwnersTarget => 30,
            Action::SetPvpFlag { .. } => 31,
            Action::SetRegenSystem { .. } => 32,
            Action::GiveItemToOwner { .. } => 33,
            Action::SetMonsterVariable { .. } => 34,
        }
    }

    fn read_payload<R: Read + Seek>(
        tag: u32,
        reader: &mut AlignedReader<R>,
        encoding: TextEncoding,
    ) -> Result<Self> {
        Ok(match tag {
            1 => Action::Stop,
            2 => Action::Emote {
                motion: reader.read_u8()?,
            },
            3 => Action::Say {
                message: reader.read_i32()?,
            },
            4 => Action::MoveRandom {
                distance: reader.read_i32()?,
                speed: reader.read_u8()?,
            },
            5 => Action::MoveToSpawn {
                distance: reader.read_i32()?,
                speed: reader.read_u8()?,
            },
            6 => Action::MoveToTarget {
                speed: reader.read_u8()?,
            },
            7 => Action::AttackNearbyCharacter {
                distance: reader.read_i32()?,
                ability: reader.read_u8()?,
                more: reader.read_bool()?,
            },
            8 => Action::SpecialAttack,
            9 => Action::MoveAwayFromTarget {
                distance: reader.read_i32()?,
                speed: reader.read_u8()?,
            },
            10 => Action::Transform {
                monster: reader.read_u16()?,
            },
            11 => Action::SpawnMonster {
                monster: reader.read_u16()?,
            },
            12 => Action::CallForHelp {
                distance: reader.read_i32()?,
                monster_count: reader.read_i32()?,
            },
            13 => Action::AttackNearestTarget,
            14 => Action::AttackFoundTarget,
            15 => Action::CallFamilyForAttack {
                distance: reader.read_i32()?,
            },
            16 => Action::AttackDamageSource,
            17 => Action::RunAway {
                distance: reader.read_i32()?,
            },
            18 => {
                let mut items = [0i16; 5];
                for item in &mut items {
                    *item = reader.read_i16()?;
                }
                Action::DropItem {
                    items,
                    to_owner: reader.read_i32()?,
                }
            }
            19 => Action::CallMonsters {
                monster: reader.read_u16()?,
                count: reader.read_u16()?,
                distance: reader.read_i32()?,
            },
            20 => Action::AttackFoundCharacter,
            21 => Action::SpawnMonsterAt {
                monster: reader.read_u16()?,
                position: reader.read_u8()?,
                distance: reader.read_i32()?,
            },
            22 => Action::KillSelf,
            23 => Action::UseSkill {
                target: reader.read_u8()?,
                skill: reader.read_i16()?,
                motion: reader.read_i16()?,
            },
            24 => Action::SetObjectVariable {
                variable: reader.read_u8()?,
                value: reader.read_i32()?,
                operation: reader.read_u8()?,
            },
            25 => Action::SetWorldVariable {
                variable: reader.read_i16()?,
                value: reader.read_i32()?,
                operation: reader.read_u8()?,
            },
            26 => Action::SetEconomyVariable {
                variable: reader.read_i16()?,
                value: reader.read_i32()?,
                operation: reader.read_u8()?,
            },
            27 => Action::Shout {
                message_type: reader.read_u8()?,
                message: reader.read_i32()?,
            },
            28 => Action::MoveToOwner,
            29 => {
                let length = reader.read_i16()?;
                let length = usize::try_from(length).map_err(|_| Error::InvalidDimension {
                    what: "quest trigger length",
                    value: i32::from(length),
                })?;
                Action::QuestTrigger {
                    trigger: reader.read_fixed_string(length, encoding)?,
                }
            }
            30 => Action::AttackOwnersTarget,
            31 => Action::SetPvpFlag {
                zone: reader.read_i16()?,
                enabled: reader.read_bool()?,
            },
            32 => Action::SetRegenSystem {
                zone: reader.read_i16()?,
                enabled: reader.read_bool()?,
            },
            33 => Action::GiveItemToOwner {
                item: reader.read_i16()?,
                count: reader.read_i16()?,
            },
            34 => Action::SetMonsterVariable {
                variable: reader.read_i16()?,
                value: reader.read_i32()?,
                operation: reader.read_u8()?,
            },
            other => return Err(Self::invalid_tag(other)),
        })
    }

    fn write_payload<W: Write>(
        &self,
        writer: &mut AlignedWriter<W>,
        encoding: TextEncoding,
    ) -> Result<()> {
        match self {
            Action::Stop
            | Action::SpecialAttack
            | Action::AttackNearestTarget
            | Action::AttackFoundTarget
            | Action::AttackDamageSource
            | Action::AttackFoundCharacter
            | Action::KillSelf
            | Action::MoveToOwner
            | Action::AttackOwnersTarget => Ok(()),
            Action::Emote { motion: value } | Action::MoveToTarget { speed: value } => writer.write_u8(*value),
            Action::Say { message: value }
            | Action::CallFamilyForAttack { distance: value }
            | Action::RunAway { distance: value } => writer.write_i32(*value),
            Action::MoveRandom { distance, speed }
            | Action::MoveToSpawn { distance, speed }
            | Action::MoveAwayFromTarget { distance, speed } => {
                writer.write_i32(*distance)?;
                writer.write_u8(*speed)
            }
            Action::AttackNearbyCharacter {
                distance,
                ability,
                more,
            } => {
                writer.write_i32(*distance)?;
                writer.write_u8(*ability)?;
                writer.write_bool(*more)
            }
            Action::Transform { monster } | Action::SpawnMonster { monster } => writer.write_u16(*monster),
            Action::CallForHelp {
                distance,
                monster_count,
            } => {
                writer.write_i32(*distance)?;
                writer.write_i32(*monster_count)
            }
            Action::DropItem { items, to_owner } => {
                for item in items {
                    writer.write_i16(*item)?;
                }
                writer.write_i32(*to_owner)
            }
            Action::CallMonsters {
                monster,
                count,
                distance,
            } => {
                writer.write_u16(*monster)?;
                writer.write_u16(*count)?;
                writer.write_i32(*distance)
            }
            Action::SpawnMonsterAt {
                monster,
                position,
                distance,
            } => {
                writer.write_u16(*monster)?;
                writer.write_u8(*position)?;
                writer.write_i32(*distance)
            }
            Action::UseSkill {
                target,
                skill,
                motion,
            } => {
                writer.write_u8(*target)?;
                writer.write_i16(*skill)?;
                writer.write_i16(*motion)
            }
            Action::SetObjectVariable {
                variable,
                value,
                operation,
            } => {
                writer.write_u8(*variable)?;
                writer.write_i32(*value)?;
                writer.write_u8(*operation)
            }
            Action::SetWorldVariable {
                variable,
                value,
                operation,
            }
            | Action::SetEconomyVariable {
                variable,
                value,
                operation,
            }
            | Action::SetMonsterVariable {
                variable,
                value,
                operation,
            } => {
                writer.write_i16(*variable)?;
                writer.write_i32(*value)?;
                writer.write_u8(*operation)
            }
            Action::Shout {
                message_type,
                message,
            } => {
                writer.write_u8(*message_type)?;
                writer.write_i32(*message)
            }
            Action::QuestTrigger { trigger } => {
                let bytes = encoding.encode(trigger)?;
                let length = i16::try_from(bytes.len()).map_err(|_| Error::StringTooLong {
                    length: bytes.len(),
                    max: i16::MAX as usize,
                })?;
                writer.write_i16(length)?;
                writer.write_bytes(&bytes)
            }
            Action::SetPvpFlag { zone, enabled } | Action::SetRegenSystem { zone, enabled } => {
                writer.write_i16(*zone)?;
                writer.write_bool(*enabled)
            }
            Action::GiveItemToOwner { item, count } => {
                writer.write_i16(*item)?;
                writer.write_i16(*count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::common::{read_enveloped, write_enveloped};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const MASK: u32 = super::super::ACTION_MASK;

    fn envelope(action: &Action) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        write_enveloped(&mut cursor, action, MASK, TextEncoding::EucKr).unwrap();
        cursor.into_inner()
    }

    fn round_trip(action: &Action) -> Action {
        let mut cursor = Cursor::new(envelope(action));
        let read = read_enveloped(&mut cursor, MASK, TextEncoding::EucKr).unwrap();
        assert_eq!(cursor.position(), cursor.get_ref().len() as u64);
        read
    }

    #[test]
    fn test_use_skill_layout() {
        let bytes = envelope(&Action::UseSkill {
            target: 1,
            skill: 300,
            motion: -1,
        });
        assert_eq!(&bytes[4..8], &(23u32 | 0x0B00_0000).to_le_bytes());
        // u8, pad, i16, i16, then 2 bytes to the next multiple of 4
        assert_eq!(bytes.len(), 8 + 8);
        assert_eq!(&bytes[10..12], &300i16.to_le_bytes());
    }

    #[test]
    fn test_quest_trigger() {
        let action = Action::QuestTrigger {
            trigger: "TRIGGER_01".to_string(),
        };
        let bytes = envelope(&action);
        // i16 length + 10 bytes, padded to 12
        assert_eq!(bytes.len(), 8 + 12);
        assert_eq!(round_trip(&action), action);
    }

    #[test]
    fn test_actions_round_trip() {
        let actions = vec![
            Action::Stop,
            Action::Emote { motion: 4 },
            Action::MoveRandom {
                distance: 200,
                speed: 1,
            },
            Action::AttackNearbyCharacter {
                distance: 500,
                ability: 2,
                more: true,
            },
            Action::Transform { monster: 99 },
            Action::DropItem {
                items: [1, 2, 3, 4, 5],
                to_owner: 1,
            },
            Action::CallMonsters {
                monster: 10,
                count: 2,
                distance: 100,
            },
            Action::SpawnMonsterAt {
                monster: 11,
                position: 2,
                distance: 50,
            },
            Action::SetWorldVariable {
                variable: 4,
                value: 100,
                operation: 6,
            },
            Action::Shout {
                message_type: 1,
                message: 77,
            },
            Action::SetPvpFlag {
                zone: 22,
                enabled: true,
            },
            Action::GiveItemToOwner { item: 401, count: 3 },
        ];
        for action in actions {
            assert_eq!(round_trip(&action), action);
        }
    }

    #[test]
    fn test_unknown_action_tag() {
        let mut bytes = envelope(&Action::Stop);
        bytes[4] = 99;
        let err = read_enveloped::<Action, _>(&mut Cursor::new(bytes), MASK, TextEncoding::EucKr)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTag {
                family: "AI action",
                value: 99
            }
        ));
    }
}
