//! Content loading façade.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use super::list::{list_file_name, read_list_packed, read_list_xml};
use super::{
    AnimationSet, AsyncLoadCounter, BackgroundLoader, ContentData, ContentFormat, ContentKind,
    ContentSettings, ContentSource, Font, FontTextureSink, FsContentSource, ListedResource, Mesh,
    PendingLoad, Resource, ResourcesManager, Skeleton,
};
use crate::audio::{AudioBank, AudioEvent};
use crate::core::{Named, ObjectName, Serializable, Value, ValueKind, XmlNode};
use crate::localization::{self, LocalizedString, StringVariables, STRINGS_SUBDIR};
use crate::util::{ByteReader, Error, Result};

/// Loads content from a [`ContentSource`] into a [`ResourcesManager`].
///
/// The descriptor format (XML or packed) comes from [`ContentSettings`].
pub struct ContentManager {
    settings: ContentSettings,
    source: Arc<dyn ContentSource>,
    resources: ResourcesManager,
    variables: StringVariables,
    string_sets: HashMap<String, Vec<ObjectName>>,
    loader: BackgroundLoader,
    audio_files_loaded: AsyncLoadCounter,
}

impl ContentManager {
    /// Manager reading from the directory named by `settings.root`.
    pub fn new(settings: ContentSettings) -> Result<Self> {
        let source = Arc::new(FsContentSource::new(settings.root.clone()));
        Self::with_source(settings, source)
    }

    pub fn with_source(settings: ContentSettings, source: Arc<dyn ContentSource>) -> Result<Self> {
        let resources = ResourcesManager::new(settings.builtin_meshes)?;
        tracing::info!(
            root = %settings.root.display(),
            format = ?settings.format,
            "content manager ready"
        );
        Ok(Self {
            settings,
            source,
            resources,
            variables: StringVariables::new(),
            string_sets: HashMap::new(),
            loader: BackgroundLoader::new(),
            audio_files_loaded: AsyncLoadCounter::new(),
        })
    }

    pub fn settings(&self) -> &ContentSettings {
        &self.settings
    }

    pub fn format(&self) -> ContentFormat {
        self.settings.format
    }

    pub fn source(&self) -> &Arc<dyn ContentSource> {
        &self.source
    }

    pub fn resources(&self) -> &ResourcesManager {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourcesManager {
        &mut self.resources
    }

    pub fn get<T: Resource>(&self, name: ObjectName) -> Option<&T> {
        self.resources.get(name)
    }

    pub fn unload<T: Resource>(&mut self, name: ObjectName) -> bool {
        self.resources.remove::<T>(name)
    }

    /// Read a descriptor in the configured format.
    fn read_descriptor(&self, subdir: &str, name: &str) -> Result<ContentData> {
        let kind = match self.settings.format {
            ContentFormat::Xml => ContentKind::GenericTextData,
            ContentFormat::Binary => ContentKind::GenericBinaryData,
        };
        self.source.read(kind, subdir, name, self.settings.format.extension())
    }

    /// Load `Meshes/<name>.mesh.ge`.
    pub fn load_mesh(&mut self, name: &str, group: ObjectName) -> Result<&Mesh> {
        let data = self
            .source
            .read(ContentKind::GenericBinaryData, Mesh::SUBDIR, name, Mesh::EXTENSION)?;
        let mesh = Mesh::from_bytes(ObjectName::new(name), group, &data)?;
        tracing::debug!(mesh = name, vertices = mesh.vertex_count(), "mesh loaded");
        self.resources.add(mesh).map(|m| &*m)
    }

    pub fn load_skeleton(&mut self, name: &str) -> Result<&Skeleton> {
        let skeleton = Skeleton::load(self.source.as_ref(), name, self.settings.format)?;
        self.resources.add(skeleton).map(|s| &*s)
    }

    pub fn load_animation_set(&mut self, name: &str) -> Result<&AnimationSet> {
        let set = AnimationSet::load(self.source.as_ref(), name, self.settings.format)?;
        self.resources.add(set).map(|s| &*s)
    }

    /// Load every instance of a list document into the resource registry.
    ///
    /// Either all instances are registered or none are.
    pub fn load_list<T: ListedResource>(&mut self, list: &str) -> Result<Vec<ObjectName>> {
        let _span = tracing::info_span!("load_list", kind = T::TYPE_NAME, list).entered();
        let group = ObjectName::new(list);
        let data = self.read_descriptor(T::SUBDIR, &list_file_name::<T>(list))?;
        let items: Vec<T> = match self.settings.format {
            ContentFormat::Xml => read_list_xml(&XmlNode::parse_bytes(&data)?, group)?,
            ContentFormat::Binary => read_list_packed(&mut ByteReader::new(&data), group)?,
        };
        let names: Vec<ObjectName> = items.iter().map(|i| i.name()).collect();
        self.resources.add_all(items)?;
        tracing::debug!(count = names.len(), "list loaded");
        Ok(names)
    }

    /// Remove every instance loaded from `list`. Returns how many went.
    pub fn unload_list<T: ListedResource>(&mut self, list: &str) -> Result<usize> {
        self.unload_group::<T>(ObjectName::new(list))
    }

    fn unload_group<T: Resource>(&mut self, group: ObjectName) -> Result<usize> {
        Ok(self.resources.manager_mut::<T>()?.retain(|r| r.group_name() != group))
    }

    /// Load a font list: `Fonts/<list>.fonts.{xml,ge}`.
    ///
    /// XML lists name fonts whose `.fnt` files and atlas live under
    /// `Fonts/<list>/`; packed lists embed everything.
    pub fn load_fonts(&mut self, list: &str, sink: &mut dyn FontTextureSink) -> Result<Vec<ObjectName>> {
        let _span = tracing::info_span!("load_fonts", list).entered();
        let group = ObjectName::new(list);
        let data = self.read_descriptor(Font::SUBDIR, &format!("{}.fonts", list))?;

        match self.settings.format {
            ContentFormat::Xml => {
                let root = XmlNode::parse_bytes(&data)?;
                if root.name != "FontList" {
                    return Err(Error::invalid(format!("expected <FontList>, found <{}>", root.name)));
                }
                let mut fonts = Vec::new();
                for element in root.children_named("Font") {
                    let mut font = Font::new(ObjectName::new(element.required_attribute("name")?), group);
                    font.load_from_xml(element)?;
                    let image = font.load(self.source.as_ref())?;
                    fonts.push((font, image));
                }
                self.register_fonts(fonts, sink)
            }
            ContentFormat::Binary => {
                let mut r = ByteReader::new(&data);
                let count = Value::read(ValueKind::Byte, &mut r)?.as_byte()?;
                // Leading name table
                for _ in 0..count {
                    Value::read(ValueKind::ObjectName, &mut r)?;
                }
                let mut fonts = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let name = Value::read(ValueKind::ObjectName, &mut r)?.as_object_name()?;
                    fonts.push(Font::read_packed(name, group, &mut r)?);
                }
                self.register_fonts(fonts, sink)
            }
        }
    }

    /// Register decoded fonts, then hand their atlases to `sink`.
    ///
    /// Nothing reaches the sink unless every font was registered.
    fn register_fonts<B>(&mut self, loaded: Vec<(Font, B)>, sink: &mut dyn FontTextureSink) -> Result<Vec<ObjectName>>
    where
        B: Deref<Target = [u8]>,
    {
        let (fonts, images): (Vec<Font>, Vec<B>) = loaded.into_iter().unzip();
        let names: Vec<ObjectName> = fonts.iter().map(|f| f.name()).collect();
        self.resources.add_all(fonts)?;
        for (name, image) in names.iter().zip(&images) {
            sink.create_font_texture(*name, &**image)?;
        }
        Ok(names)
    }

    pub fn unload_fonts(&mut self, list: &str) -> Result<usize> {
        self.unload_group::<Font>(ObjectName::new(list))
    }

    /// Load the string set `<set>.<language>`, falling back to the
    /// configured fallback language when that file does not exist.
    pub fn load_strings(&mut self, set: &str, language: &str) -> Result<usize> {
        let extension = self.settings.format.extension();
        let mut file = localization::strings_file_name(set, language);
        if !self.source.exists(ContentKind::GenericTextData, STRINGS_SUBDIR, &file, extension) {
            tracing::debug!(set, language, fallback = %self.settings.fallback_language, "string set missing, using fallback");
            file = localization::strings_file_name(set, &self.settings.fallback_language);
        }

        let data = self.read_descriptor(STRINGS_SUBDIR, &file)?;
        let strings: Vec<LocalizedString> = match self.settings.format {
            ContentFormat::Xml => localization::read_strings_xml(&XmlNode::parse_bytes(&data)?)?,
            ContentFormat::Binary => localization::read_strings_packed(&mut ByteReader::new(&data))?,
        };
        let ids: Vec<ObjectName> = strings.iter().map(|s| s.name()).collect();
        self.resources.add_all(strings)?;
        let count = ids.len();
        self.string_sets.entry(set.to_owned()).or_default().extend(ids);
        Ok(count)
    }

    /// Remove the strings loaded for `set`. Returns how many went.
    pub fn unload_strings(&mut self, set: &str) -> usize {
        let Some(ids) = self.string_sets.remove(set) else {
            return 0;
        };
        ids.into_iter()
            .filter(|&id| self.resources.remove::<LocalizedString>(id))
            .count()
    }

    pub fn string(&self, id: ObjectName) -> Option<&str> {
        self.resources.get::<LocalizedString>(id).map(LocalizedString::text)
    }

    /// Localized text with `$variable` references substituted.
    pub fn format_string(&self, id: ObjectName) -> Option<String> {
        self.string(id).map(|text| self.variables.substitute(text))
    }

    pub fn set_variable(&mut self, name: ObjectName, value: impl Into<String>) {
        self.variables.set(name, value);
    }

    pub fn variable(&self, name: ObjectName) -> Option<&str> {
        self.variables.get(name)
    }

    /// Read the audio files of a registered bank on the calling thread.
    pub fn load_audio_bank(&mut self, bank: ObjectName) -> Result<()> {
        let events = self.resources.manager::<AudioEvent>()?;
        let files = self
            .resources
            .get::<AudioBank>(bank)
            .ok_or_else(|| Error::ContentNotFound(format!("audio bank {}", bank)))?
            .required_files(events);
        let loaded = {
            let subdir = self.bank_subdir(bank)?;
            files
                .into_iter()
                .map(|f| {
                    let data = self.source.read(ContentKind::Audio, &subdir, &f.to_name_string(), AudioBank::AUDIO_EXTENSION)?;
                    Ok((f, data))
                })
                .collect::<Result<Vec<_>>>()?
        };
        self.install_audio_files(bank, loaded)
    }

    /// Start reading a bank's audio files in the background.
    ///
    /// Finish with [`install_audio_files`](Self::install_audio_files) once
    /// the returned handle is ready.
    pub fn load_audio_bank_async(
        &self,
        bank: ObjectName,
    ) -> Result<PendingLoad<Vec<(ObjectName, ContentData)>>> {
        let events = self.resources.manager::<AudioEvent>()?;
        let files = self
            .resources
            .get::<AudioBank>(bank)
            .ok_or_else(|| Error::ContentNotFound(format!("audio bank {}", bank)))?
            .required_files(events);
        Ok(self.loader.load_audio_files(
            Arc::clone(&self.source),
            self.bank_subdir(bank)?,
            files,
            AudioBank::AUDIO_EXTENSION,
            self.audio_files_loaded.clone(),
        ))
    }

    pub fn install_audio_files(
        &mut self,
        bank: ObjectName,
        files: Vec<(ObjectName, ContentData)>,
    ) -> Result<()> {
        let bank = self
            .resources
            .get_mut::<AudioBank>(bank)
            .ok_or_else(|| Error::ContentNotFound(format!("audio bank {}", bank)))?;
        bank.set_audio_data(files);
        Ok(())
    }

    fn bank_subdir(&self, bank: ObjectName) -> Result<String> {
        self.resources
            .get::<AudioBank>(bank)
            .map(AudioBank::audio_subdir)
            .ok_or_else(|| Error::ContentNotFound(format!("audio bank {}", bank)))
    }

    /// Number of audio files read by background loads so far.
    pub fn async_audio_files_loaded(&self) -> u32 {
        self.audio_files_loaded.get()
    }

    pub fn background_loader(&self) -> &BackgroundLoader {
        &self.loader
    }
}

impl std::fmt::Debug for ContentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentManager")
            .field("settings", &self.settings)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentSource;
    use crate::localization::write_strings_packed;
    use crate::rendering::Material;

    fn manager(format: ContentFormat) -> (ContentManager, Arc<MemoryContentSource>) {
        let source = Arc::new(MemoryContentSource::new());
        let settings = ContentSettings {
            format,
            builtin_meshes: false,
            ..Default::default()
        };
        let manager = ContentManager::with_source(settings, source.clone()).unwrap();
        (manager, source)
    }

    #[test]
    fn test_material_list_load_and_unload() {
        let (mut content, source) = manager(ContentFormat::Xml);
        source.insert(
            "Materials",
            "world.materials",
            "xml",
            r#"<MaterialList><Material name="Stone"/><Material name="Moss" BatchRendering="true"/></MaterialList>"#,
        );
        let names = content.load_list::<Material>("world").unwrap();
        assert_eq!(names.len(), 2);
        assert!(content.get::<Material>(ObjectName::new("Moss")).unwrap().batch_rendering);

        // Loading again collides and registers nothing new
        assert!(content.load_list::<Material>("world").is_err());
        assert_eq!(content.resources().count::<Material>(), 2);

        assert_eq!(content.unload_list::<Material>("world").unwrap(), 2);
        assert_eq!(content.resources().count::<Material>(), 0);
    }

    #[test]
    fn test_strings_fallback_and_variables() {
        let (mut content, source) = manager(ContentFormat::Binary);
        let strings = vec![LocalizedString::new(ObjectName::new("Hud.Lives"), "Lives: $lives")];
        let mut buf = Vec::new();
        write_strings_packed(&strings, &mut buf).unwrap();
        source.insert("Strings", "hud.en", "ge", buf);

        assert_eq!(content.load_strings("hud", "fr").unwrap(), 1);
        content.set_variable(ObjectName::new("lives"), "3");
        assert_eq!(content.format_string(ObjectName::new("Hud.Lives")).unwrap(), "Lives: 3");

        assert_eq!(content.unload_strings("hud"), 1);
        assert!(content.string(ObjectName::new("Hud.Lives")).is_none());
        assert_eq!(content.unload_strings("hud"), 0);
    }

    #[test]
    fn test_duplicate_font_creates_no_texture() {
        let (mut content, source) = manager(ContentFormat::Xml);
        source.insert(
            "Fonts",
            "ui.fonts",
            "xml",
            r#"<FontList><Font name="Main"/><Font name="Main"/></FontList>"#,
        );
        source.insert(
            "Fonts/ui",
            "Main",
            "fnt",
            r#"<font><common lineHeight="32" base="26" scaleW="256" scaleH="256"/></font>"#,
        );
        source.insert("Fonts/ui", "Main", "png", vec![1u8, 2]);

        let mut textures = Vec::new();
        let mut sink = |name: ObjectName, image: &[u8]| -> Result<()> {
            textures.push((name, image.len()));
            Ok(())
        };
        let err = content.load_fonts("ui", &mut sink).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        assert!(textures.is_empty());
        assert_eq!(content.resources().count::<Font>(), 0);

        source.insert("Fonts", "ui.fonts", "xml", r#"<FontList><Font name="Main"/></FontList>"#);
        let mut sink = |name: ObjectName, image: &[u8]| -> Result<()> {
            textures.push((name, image.len()));
            Ok(())
        };
        content.load_fonts("ui", &mut sink).unwrap();
        assert_eq!(textures, vec![(ObjectName::new("Main"), 2)]);
    }

    #[test]
    fn test_missing_mesh() {
        let (mut content, _) = manager(ContentFormat::Xml);
        let err = content.load_mesh("Ghost", ObjectName::EMPTY).unwrap_err();
        assert!(matches!(err, Error::ContentNotFound(_)));
    }
}
