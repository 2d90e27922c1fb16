//! Audio events: named sounds backed by one or more audio files.

use std::sync::LazyLock;

use crate::content::{ListedResource, Resource};
use crate::core::{Named, ObjectName, Reflect, Schema, ValueKind};
use crate::util::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AudioEventPlayMode {
    #[default]
    OneShot,
    Loop,
}

impl AudioEventPlayMode {
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(AudioEventPlayMode::OneShot),
            1 => Ok(AudioEventPlayMode::Loop),
            _ => Err(Error::invalid(format!("invalid audio play mode {}", value))),
        }
    }
}

/// One candidate file of an event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioFile {
    pub file_name: ObjectName,
}

impl Reflect for AudioFile {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<AudioFile>> = LazyLock::new(|| {
            Schema::<AudioFile>::new("AudioFile").property(
                "FileName",
                ValueKind::ObjectName,
                |f| f.file_name.into(),
                |f, v| {
                    f.file_name = v.as_object_name()?;
                    Ok(())
                },
            )
        });
        &SCHEMA
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioEvent {
    name: ObjectName,
    group: ObjectName,
    pub play_mode: AudioEventPlayMode,
    pub fade_in_time: f32,
    pub fade_out_time: f32,
    pub audio_files: Vec<AudioFile>,
}

impl AudioEvent {
    pub fn new(name: ObjectName, group: ObjectName) -> Self {
        Self {
            name,
            group,
            ..Default::default()
        }
    }

    pub fn file_names(&self) -> impl Iterator<Item = ObjectName> + '_ {
        self.audio_files.iter().map(|f| f.file_name)
    }
}

impl Named for AudioEvent {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for AudioEvent {
    const TYPE_NAME: &'static str = "AudioEvent";

    fn group_name(&self) -> ObjectName {
        self.group
    }
}

impl ListedResource for AudioEvent {
    const SUBDIR: &'static str = "Audio";
    const LIST_SUFFIX: &'static str = "events";
    const LIST_ROOT: &'static str = "AudioEventList";
    const ELEMENT: &'static str = "AudioEvent";

    fn create(name: ObjectName, group: ObjectName) -> Self {
        Self::new(name, group)
    }
}

impl Reflect for AudioEvent {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<AudioEvent>> = LazyLock::new(|| {
            Schema::<AudioEvent>::new("AudioEvent")
                .property("PlayMode", ValueKind::Byte, |e| (e.play_mode as u8).into(), |e, v| {
                    e.play_mode = AudioEventPlayMode::from_byte(v.as_byte()?)?;
                    Ok(())
                })
                .property("FadeInTime", ValueKind::Float, |e| e.fade_in_time.into(), |e, v| {
                    e.fade_in_time = v.as_float()?;
                    Ok(())
                })
                .property("FadeOutTime", ValueKind::Float, |e| e.fade_out_time.into(), |e, v| {
                    e.fade_out_time = v.as_float()?;
                    Ok(())
                })
                .array::<AudioFile>("AudioFile", |e| &e.audio_files, |e| &mut e.audio_files)
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{find_array, Serializable, XmlNode};

    #[test]
    fn test_event_from_xml() {
        let node = XmlNode::parse(
            r#"<AudioEvent name="Step" PlayMode="1" FadeOutTime="0.5">
                <AudioFile FileName="step01"/>
                <AudioFile FileName="step02"/>
            </AudioEvent>"#,
        )
        .unwrap();
        let mut event = AudioEvent::new(ObjectName::new("Step"), ObjectName::EMPTY);
        event.load_from_xml(&node).unwrap();

        assert_eq!(event.play_mode, AudioEventPlayMode::Loop);
        assert_eq!(event.fade_out_time, 0.5);
        let files: Vec<_> = event.file_names().collect();
        assert_eq!(files, vec![ObjectName::new("step01"), ObjectName::new("step02")]);
    }

    #[test]
    fn test_array_editing() {
        let mut event = AudioEvent::default();
        let files = find_array(&event, "AudioFile").unwrap();
        event
            .array_add(files)
            .unwrap()
            .set(ObjectName::new("FileName"), &ObjectName::new("a").into())
            .unwrap();
        event
            .array_add(files)
            .unwrap()
            .set(ObjectName::new("FileName"), &ObjectName::new("b").into())
            .unwrap();
        event.array_swap(files, 0, 1).unwrap();
        assert_eq!(event.audio_files[0].file_name, ObjectName::new("b"));

        event.array_remove(files, 0).unwrap();
        assert_eq!(event.array_len(files), 1);
        assert!(event.array_remove(files, 3).is_err());
    }
}
