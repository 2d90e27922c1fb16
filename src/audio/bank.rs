//! Audio banks: groups of events whose files are loaded together.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::content::{ContentData, ContentKind, ContentSource, ListedResource, Resource};
use crate::core::{Named, ObjectManager, ObjectName, Reflect, Schema, ValueKind};
use crate::util::Result;

use super::AudioEvent;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioEventEntry {
    pub event_name: ObjectName,
}

impl Reflect for AudioEventEntry {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<AudioEventEntry>> = LazyLock::new(|| {
            Schema::<AudioEventEntry>::new("AudioEventEntry").property(
                "EventName",
                ValueKind::ObjectName,
                |e| e.event_name.into(),
                |e, v| {
                    e.event_name = v.as_object_name()?;
                    Ok(())
                },
            )
        });
        &SCHEMA
    }
}

/// Bank of events. Audio files are read from `Audio/<bank>/<file>.wav`.
#[derive(Debug, Default)]
pub struct AudioBank {
    name: ObjectName,
    group: ObjectName,
    pub events: Vec<AudioEventEntry>,
    audio_files: HashMap<ObjectName, ContentData>,
    loaded: bool,
}

impl AudioBank {
    pub const AUDIO_EXTENSION: &'static str = "wav";

    pub fn new(name: ObjectName, group: ObjectName) -> Self {
        Self {
            name,
            group,
            ..Default::default()
        }
    }

    /// Directory holding the bank's audio files.
    pub fn audio_subdir(&self) -> String {
        format!("{}/{}", <Self as ListedResource>::SUBDIR, self.name.to_name_string())
    }

    /// Distinct file names used by the bank's events, in first-use order.
    ///
    /// Entries naming unknown events are skipped.
    pub fn required_files(&self, events: &ObjectManager<AudioEvent>) -> Vec<ObjectName> {
        let mut files: Vec<ObjectName> = Vec::new();
        for entry in &self.events {
            let Some(event) = events.get(entry.event_name) else {
                tracing::warn!(bank = %self.name, event = %entry.event_name, "audio bank references unknown event");
                continue;
            };
            for file in event.file_names() {
                if !files.contains(&file) {
                    files.push(file);
                }
            }
        }
        files
    }

    /// Read every required audio file. Does nothing if already loaded.
    pub fn load(&mut self, source: &dyn ContentSource, events: &ObjectManager<AudioEvent>) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        let subdir = self.audio_subdir();
        let mut loaded = HashMap::new();
        for file in self.required_files(events) {
            let data = source.read(
                ContentKind::Audio,
                &subdir,
                &file.to_name_string(),
                Self::AUDIO_EXTENSION,
            )?;
            loaded.insert(file, data);
        }
        self.set_audio_data(loaded);
        Ok(())
    }

    /// Install audio data decoded elsewhere and mark the bank loaded.
    pub fn set_audio_data(&mut self, files: impl IntoIterator<Item = (ObjectName, ContentData)>) {
        self.audio_files = files.into_iter().collect();
        self.loaded = true;
        tracing::debug!(bank = %self.name, files = self.audio_files.len(), "audio bank loaded");
    }

    pub fn unload(&mut self) {
        self.audio_files.clear();
        self.loaded = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn audio_data(&self, file: ObjectName) -> Option<&ContentData> {
        self.audio_files.get(&file)
    }
}

impl Named for AudioBank {
    fn name(&self) -> ObjectName {
        self.name
    }
}

impl Resource for AudioBank {
    const TYPE_NAME: &'static str = "AudioBank";

    fn group_name(&self) -> ObjectName {
        self.group
    }

    fn size_in_bytes(&self) -> usize {
        self.audio_files.values().map(|d| d.len()).sum()
    }
}

impl ListedResource for AudioBank {
    const SUBDIR: &'static str = "Audio";
    const LIST_SUFFIX: &'static str = "banks";
    const LIST_ROOT: &'static str = "AudioBankList";
    const ELEMENT: &'static str = "AudioBank";

    fn create(name: ObjectName, group: ObjectName) -> Self {
        Self::new(name, group)
    }
}

impl Reflect for AudioBank {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<AudioBank>> = LazyLock::new(|| {
            Schema::<AudioBank>::new("AudioBank").array::<AudioEventEntry>(
                "AudioEventEntry",
                |b| &b.events,
                |b| &mut b.events,
            )
        });
        &SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFile;
    use crate::content::MemoryContentSource;

    fn events() -> ObjectManager<AudioEvent> {
        let mut events = ObjectManager::new();
        for (name, files) in [("Step", &["step01", "step02"][..]), ("Jump", &["step02", "jump"][..])] {
            let mut e = AudioEvent::new(ObjectName::new(name), ObjectName::EMPTY);
            e.audio_files = files
                .iter()
                .map(|f| AudioFile { file_name: ObjectName::new(f) })
                .collect();
            events.add(e).unwrap();
        }
        events
    }

    fn bank() -> AudioBank {
        let mut bank = AudioBank::new(ObjectName::new("Player"), ObjectName::EMPTY);
        for name in ["Step", "Jump", "Missing"] {
            bank.events.push(AudioEventEntry { event_name: ObjectName::new(name) });
        }
        bank
    }

    #[test]
    fn test_required_files_are_distinct() {
        let files = bank().required_files(&events());
        assert_eq!(
            files,
            vec![ObjectName::new("step01"), ObjectName::new("step02"), ObjectName::new("jump")]
        );
    }

    #[test]
    fn test_load_reads_wav_files() {
        let source = MemoryContentSource::new();
        for f in ["step01", "step02", "jump"] {
            source.insert("Audio/Player", f, "wav", f.as_bytes().to_vec());
        }
        let mut bank = bank();
        bank.load(&source, &events()).unwrap();
        assert!(bank.is_loaded());
        assert_eq!(&bank.audio_data(ObjectName::new("jump")).unwrap()[..], b"jump");
        assert_eq!(bank.size_in_bytes(), 6 + 6 + 4);

        bank.unload();
        assert!(bank.audio_data(ObjectName::new("jump")).is_none());
    }
}
