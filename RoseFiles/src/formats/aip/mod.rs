//! AIP monster and NPC behaviour scripts
//!
//! A script is a list of patterns (idle, attacked, killed...). Each pattern
//! holds events; an event fires its actions when all its conditions hold.
//!
//! Layout: `i32` pattern count, `i32` idle interval, `i32` damage rate,
//! `i32`-prefixed name, then the patterns. Pattern and event names are fixed
//! 32-byte fields. Conditions and actions are size-prefixed, mask-tagged
//! records (see [`crate::formats::common::tagged`]).

pub mod action;
pub mod condition;

pub use action::Action;
pub use condition::{Comparison, Condition, TimeWindow};

use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use super::RoseFile;
use super::common::{read_enveloped, write_enveloped};
use crate::error::{Error, Result};
use crate::io::{CodecOptions, RoseReadExt, RoseWriteExt, TextEncoding, count, dimension};

/// Mask combined with condition tags.
pub const CONDITION_MASK: u32 = 0x0400_0000;

/// Mask combined with action tags.
pub const ACTION_MASK: u32 = 0x0B00_0000;

/// Width of pattern and event names.
pub const NAME_LENGTH: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiEvent {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiPattern {
    pub name: String,
    pub events: Vec<AiEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtificialIntelligenceFile {
    pub name: String,
    /// Seconds between idle pattern checks
    pub idle_interval: i32,
    /// Percent chance to run the damaged pattern when hit
    pub damage_rate: i32,
    pub patterns: Vec<AiPattern>,
}

impl Default for ArtificialIntelligenceFile {
    fn default() -> Self {
        Self {
            name: String::new(),
            idle_interval: 1,
            damage_rate: 100,
            patterns: Vec::new(),
        }
    }
}

impl ArtificialIntelligenceFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(&self, index: usize) -> Result<&AiPattern> {
        self.patterns.get(index).ok_or(Error::IndexOutOfRange {
            what: "pattern",
            index,
            len: self.patterns.len(),
        })
    }

    /// Total number of events across all patterns.
    pub fn event_count(&self) -> usize {
        self.patterns.iter().map(|p| p.events.len()).sum()
    }

    fn read_event<R: Read + Seek>(reader: &mut R, encoding: TextEncoding) -> Result<AiEvent> {
        let name = reader.read_fixed_string(NAME_LENGTH, encoding)?;

        let condition_count = dimension("condition count", reader.read_i32::<LittleEndian>()?)?;
        let conditions = (0..condition_count)
            .map(|_| read_enveloped(reader, CONDITION_MASK, encoding))
            .collect::<Result<_>>()?;

        let action_count = dimension("action count", reader.read_i32::<LittleEndian>()?)?;
        let actions = (0..action_count)
            .map(|_| read_enveloped(reader, ACTION_MASK, encoding))
            .collect::<Result<_>>()?;

        Ok(AiEvent {
            name,
            conditions,
            actions,
        })
    }

    fn write_event<W: Write + Seek>(writer: &mut W, event: &AiEvent, encoding: TextEncoding) -> Result<()> {
        writer.write_fixed_string(&event.name, NAME_LENGTH, encoding, 0)?;

        writer.write_i32::<LittleEndian>(count("conditions", event.conditions.len())?)?;
        for condition in &event.conditions {
            write_enveloped(writer, condition, CONDITION_MASK, encoding)?;
        }

        writer.write_i32::<LittleEndian>(count("actions", event.actions.len())?)?;
        for action in &event.actions {
            write_enveloped(writer, action, ACTION_MASK, encoding)?;
        }
        Ok(())
    }
}

impl RoseFile for ArtificialIntelligenceFile {
    const FORMAT: &'static str = "AIP";

    fn read_from<R: Read + Seek>(reader: &mut R, options: &CodecOptions) -> Result<Self> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        let pattern_count = dimension("pattern count", reader.read_i32::<LittleEndian>()?)?;
        let idle_interval = reader.read_i32::<LittleEndian>()?;
        let damage_rate = reader.read_i32::<LittleEndian>()?;
        let name = reader.read_u32_prefixed_string(encoding)?;

        let mut patterns = Vec::with_capacity(pattern_count.min(64));
        for _ in 0..pattern_count {
            let name = reader.read_fixed_string(NAME_LENGTH, encoding)?;
            let event_count = dimension("event count", reader.read_i32::<LittleEndian>()?)?;
            let events = (0..event_count)
                .map(|_| Self::read_event(reader, encoding))
                .collect::<Result<_>>()?;
            patterns.push(AiPattern { name, events });
        }

        let file = Self {
            name,
            idle_interval,
            damage_rate,
            patterns,
        };
        tracing::debug!(
            "Read AIP {:?}: {} patterns, {} events",
            file.name,
            file.patterns.len(),
            file.event_count()
        );
        Ok(file)
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W, options: &CodecOptions) -> Result<()> {
        let encoding = options.encoding_or(TextEncoding::EucKr);
        writer.write_i32::<LittleEndian>(count("patterns", self.patterns.len())?)?;
        writer.write_i32::<LittleEndian>(self.idle_interval)?;
        writer.write_i32::<LittleEndian>(self.damage_rate)?;
        writer.write_u32_prefixed_string(&self.name, encoding)?;

        for pattern in &self.patterns {
            writer.write_fixed_string(&pattern.name, NAME_LENGTH, encoding, 0)?;
            writer.write_i32::<LittleEndian>(count("events", pattern.events.len())?)?;
            for event in &pattern.events {
                Self::write_event(writer, event, encoding)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check_ability_script() -> ArtificialIntelligenceFile {
        ArtificialIntelligenceFile {
            name: "jelly bean".to_string(),
            patterns: vec![AiPattern {
                name: "idle".to_string(),
                events: vec![AiEvent {
                    name: "low level".to_string(),
                    conditions: vec![Condition::CheckAbility {
                        ability: 5,
                        value: 10,
                        more: true,
                    }],
                    actions: Vec::new(),
                }],
            }],
            ..ArtificialIntelligenceFile::default()
        }
    }

    #[test]
    fn test_check_ability_round_trip() {
        let script = check_ability_script();
        let bytes = script.to_bytes().unwrap();

        // header 12 + name 4+10, pattern name 32 + count 4, event name 32 + count 4,
        // one 20-byte condition, action count 4
        assert_eq!(bytes.len(), 26 + 36 + 36 + 20 + 4);

        let loaded = ArtificialIntelligenceFile::from_bytes(&bytes).unwrap();
        let event = &loaded.pattern(0).unwrap().events[0];
        assert_eq!(
            event.conditions,
            vec![Condition::CheckAbility {
                ability: 5,
                value: 10,
                more: true
            }]
        );
        assert!(event.actions.is_empty());
        assert_eq!(loaded, script);
    }

    #[test]
    fn test_mixed_records_round_trip() {
        let mut script = check_ability_script();
        script.patterns[0].events[0].actions = vec![
            Action::Say { message: 12 },
            Action::QuestTrigger {
                trigger: "MON_TRIGGER".to_string(),
            },
            Action::AttackNearestTarget,
        ];
        script.patterns.push(AiPattern {
            name: "attacked".to_string(),
            events: vec![AiEvent {
                name: "call friends".to_string(),
                conditions: vec![Condition::Random { percent: 30 }, Condition::TargetChanged],
                actions: vec![Action::CallForHelp {
                    distance: 1000,
                    monster_count: 3,
                }],
            }],
        });

        let bytes = script.to_bytes().unwrap();
        let loaded = ArtificialIntelligenceFile::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, script);
        assert_eq!(loaded.event_count(), 2);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_long_event_name_rejected() {
        let mut script = check_ability_script();
        script.patterns[0].events[0].name = "x".repeat(NAME_LENGTH + 1);
        assert!(matches!(
            script.to_bytes(),
            Err(Error::StringTooLong { length: 33, max: 32 })
        ));
    }
}
