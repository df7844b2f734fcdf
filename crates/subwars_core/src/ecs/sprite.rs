//! # Sprites and the Texture Cache
//!
//! The sprite component is the one indirect kind: its slot holds a
//! [`SpriteRef`] tag that selects which concrete sub-array (static or
//! animated) owns the value for that entity. Both sub-arrays are indexed by
//! the same identifier as every other component array.
//!
//! Textures are produced by a [`TextureLoader`] and cached in a
//! [`SpriteCache`] that the entity manager owns.

use super::entity::{EntityId, EntityType};
use super::storage::ComponentStorage;
use crate::error::TextureError;
use std::collections::{HashMap, HashSet};

/// Opaque handle to a texture owned by the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Font family used for glyphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Font {
    /// Monospaced UI font.
    #[default]
    SfMonoRegular,
}

/// Cache key of a glyph texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    /// Font family.
    pub font: Font,
    /// Glyph height in pixels.
    pub size: u32,
    /// The character.
    pub character: char,
}

/// What a texture is loaded for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteSource {
    /// The texture of an entity type.
    Entity(EntityType),
    /// A rasterized glyph.
    Glyph(GlyphKey),
}

/// A loaded texture and its geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureInfo {
    /// Renderer handle.
    pub handle: TextureHandle,
    /// Width of one frame, in pixels.
    pub width: f32,
    /// Height, in pixels.
    pub height: f32,
    /// Number of frames in the strip.
    pub frames: u32,
    /// Horizontal pen advance for glyphs; equals `width` otherwise.
    pub advance: f32,
}

/// Produces textures for the [`SpriteCache`].
pub trait TextureLoader {
    /// Loads the texture for `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`TextureError`] if the asset cannot be produced.
    fn load(&mut self, source: &SpriteSource) -> Result<TextureInfo, TextureError>;
}

/// Texture loader that fabricates geometry without touching a GPU.
///
/// Used by headless runs and tests. Individual sources can be marked as
/// failing to exercise the factory error path.
#[derive(Clone, Debug, Default)]
pub struct HeadlessTextureLoader {
    next_handle: u32,
    failing: HashSet<SpriteSource>,
}

impl HeadlessTextureLoader {
    /// Width and height of a headless entity frame.
    pub const FRAME_SIZE: f32 = 64.0;

    /// Creates a loader that succeeds for every source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `source` as failing to load.
    #[must_use]
    pub fn with_failure(mut self, source: SpriteSource) -> Self {
        self.failing.insert(source);
        self
    }
}

impl TextureLoader for HeadlessTextureLoader {
    fn load(&mut self, source: &SpriteSource) -> Result<TextureInfo, TextureError> {
        if self.failing.contains(source) {
            let asset = match source {
                SpriteSource::Entity(kind) => kind.asset_name().to_string(),
                SpriteSource::Glyph(key) => format!("glyph '{}'", key.character),
            };
            return Err(TextureError {
                asset,
                reason: "marked as failing".to_string(),
            });
        }

        self.next_handle += 1;
        let handle = TextureHandle(self.next_handle);

        Ok(match *source {
            SpriteSource::Entity(kind) => TextureInfo {
                handle,
                width: Self::FRAME_SIZE,
                height: Self::FRAME_SIZE,
                frames: kind.frame_count(),
                advance: Self::FRAME_SIZE,
            },
            SpriteSource::Glyph(key) => {
                let height = key.size as f32;
                let width = (height * 0.6).ceil();
                TextureInfo {
                    handle,
                    width,
                    height,
                    frames: 1,
                    advance: width,
                }
            }
        })
    }
}

/// Texture cache owned by the entity manager.
///
/// Each source is loaded at most once; failures are not cached so a later
/// spawn may retry.
pub struct SpriteCache {
    loader: Box<dyn TextureLoader>,
    textures: HashMap<SpriteSource, TextureInfo>,
}

impl SpriteCache {
    /// Creates an empty cache over `loader`.
    #[must_use]
    pub fn new(loader: Box<dyn TextureLoader>) -> Self {
        Self {
            loader,
            textures: HashMap::new(),
        }
    }

    /// Returns the texture for `source`, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the loader's [`TextureError`].
    pub fn fetch(&mut self, source: SpriteSource) -> Result<TextureInfo, TextureError> {
        if let Some(info) = self.textures.get(&source) {
            return Ok(*info);
        }

        let info = self.loader.load(&source)?;
        tracing::debug!(?source, handle = info.handle.0, "texture loaded");
        self.textures.insert(source, info);
        Ok(info)
    }

    /// Number of cached textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Checks whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl std::fmt::Debug for SpriteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteCache")
            .field("textures", &self.textures.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SPRITE SUB-ARRAYS
// ============================================================================

/// Single-frame sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StaticSprite {
    /// Texture, `None` while the slot is empty.
    pub texture: Option<TextureHandle>,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl StaticSprite {
    /// Builds a sprite from a loaded texture.
    #[must_use]
    pub fn from_texture(info: &TextureInfo) -> Self {
        Self {
            texture: Some(info.handle),
            width: info.width,
            height: info.height,
        }
    }
}

/// Multi-frame sprite strip; the current frame lives in the animation
/// component.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimatedSprite {
    /// Texture strip, `None` while the slot is empty.
    pub texture: Option<TextureHandle>,
    /// Width of one frame in pixels.
    pub frame_width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Frames in the strip.
    pub frame_count: u32,
}

impl AnimatedSprite {
    /// Builds a sprite strip from a loaded texture.
    #[must_use]
    pub fn from_texture(info: &TextureInfo) -> Self {
        Self {
            texture: Some(info.handle),
            frame_width: info.width,
            height: info.height,
            frame_count: info.frames,
        }
    }
}

/// The indirect sprite slot: which sub-array owns this entity's sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpriteRef {
    /// No sprite attached.
    #[default]
    None,
    /// Owned by the static sub-array.
    Static,
    /// Owned by the animated sub-array.
    Animated,
}

/// Borrowed view of an entity's sprite, resolved through its [`SpriteRef`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sprite<'a> {
    /// A static sprite.
    Static(&'a StaticSprite),
    /// An animated sprite.
    Animated(&'a AnimatedSprite),
}

impl Sprite<'_> {
    /// Unscaled size of one frame.
    #[must_use]
    pub fn size(&self) -> (f32, f32) {
        match self {
            Self::Static(sprite) => (sprite.width, sprite.height),
            Self::Animated(sprite) => (sprite.frame_width, sprite.height),
        }
    }

    /// Axis-aligned bounds `(min, max)` when drawn centered at `center`
    /// with `scale`.
    #[must_use]
    pub fn bounding_box(&self, scale: [f32; 2], center: [f32; 2]) -> ([f32; 2], [f32; 2]) {
        let (width, height) = self.size();
        let half_w = width * scale[0].abs() / 2.0;
        let half_h = height * scale[1].abs() / 2.0;
        (
            [center[0] - half_w, center[1] - half_h],
            [center[0] + half_w, center[1] + half_h],
        )
    }
}

/// The indirect sprite array plus the two concrete sub-arrays it points
/// into.
#[derive(Clone, Debug)]
pub struct SpriteStorage {
    refs: ComponentStorage<SpriteRef>,
    statics: ComponentStorage<StaticSprite>,
    animated: ComponentStorage<AnimatedSprite>,
}

impl SpriteStorage {
    /// Creates all three arrays with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            refs: ComponentStorage::new(capacity),
            statics: ComponentStorage::new(capacity),
            animated: ComponentStorage::new(capacity),
        }
    }

    /// Resolves the sprite owned by `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Sprite<'_>> {
        match self.refs.get(id.index())? {
            SpriteRef::None => None,
            SpriteRef::Static => self.statics.get(id.index()).map(Sprite::Static),
            SpriteRef::Animated => self.animated.get(id.index()).map(Sprite::Animated),
        }
    }

    /// Returns the reference tag stored for `id`.
    #[must_use]
    pub fn kind(&self, id: EntityId) -> SpriteRef {
        self.refs.get(id.index()).copied().unwrap_or_default()
    }

    /// Stores a static sprite for `id` and points the slot at it.
    pub fn set_static(&mut self, id: EntityId, sprite: StaticSprite) {
        self.reset(id);
        *self.statics.slot_mut(id) = sprite;
        *self.refs.slot_mut(id) = SpriteRef::Static;
    }

    /// Stores an animated sprite for `id` and points the slot at it.
    pub fn set_animated(&mut self, id: EntityId, sprite: AnimatedSprite) {
        self.reset(id);
        *self.animated.slot_mut(id) = sprite;
        *self.refs.slot_mut(id) = SpriteRef::Animated;
    }

    /// Mutable access to a static sprite, if that is what `id` holds.
    pub fn static_mut(&mut self, id: EntityId) -> Option<&mut StaticSprite> {
        match self.refs.get(id.index()) {
            Some(SpriteRef::Static) => self.statics.get_mut(id.index()),
            _ => None,
        }
    }

    /// Deinitializes the referenced sub-array slot, then the reference.
    pub fn reset(&mut self, id: EntityId) {
        match self.kind(id) {
            SpriteRef::None => {}
            SpriteRef::Static => self.statics.reset(id.index()),
            SpriteRef::Animated => self.animated.reset(id.index()),
        }
        self.refs.reset(id.index());
    }

    /// The reference array.
    #[must_use]
    pub fn refs(&self) -> &ComponentStorage<SpriteRef> {
        &self.refs
    }

    /// The static sub-array.
    #[must_use]
    pub fn statics(&self) -> &ComponentStorage<StaticSprite> {
        &self.statics
    }

    /// The animated sub-array.
    #[must_use]
    pub fn animated(&self) -> &ComponentStorage<AnimatedSprite> {
        &self.animated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(frames: u32) -> TextureInfo {
        TextureInfo {
            handle: TextureHandle(1),
            width: 32.0,
            height: 16.0,
            frames,
            advance: 32.0,
        }
    }

    #[test]
    fn test_indirect_slot_resolves_to_sub_array() {
        let mut storage = SpriteStorage::new(8);
        let id = EntityId::new(2);

        storage.set_animated(id, AnimatedSprite::from_texture(&texture(15)));
        assert!(matches!(storage.get(id), Some(Sprite::Animated(s)) if s.frame_count == 15));
        assert!(storage.static_mut(id).is_none());
    }

    #[test]
    fn test_reset_clears_referenced_slot() {
        let mut storage = SpriteStorage::new(8);
        let id = EntityId::new(5);

        storage.set_static(id, StaticSprite::from_texture(&texture(1)));
        storage.reset(id);

        assert!(storage.get(id).is_none());
        assert_eq!(*storage.statics().slot(id), StaticSprite::default());
        assert_eq!(storage.kind(id), SpriteRef::None);
    }

    #[test]
    fn test_switching_kind_clears_previous_sub_array() {
        let mut storage = SpriteStorage::new(8);
        let id = EntityId::new(1);

        storage.set_static(id, StaticSprite::from_texture(&texture(1)));
        storage.set_animated(id, AnimatedSprite::from_texture(&texture(12)));

        assert_eq!(*storage.statics().slot(id), StaticSprite::default());
        assert_eq!(storage.kind(id), SpriteRef::Animated);
    }

    #[test]
    fn test_cache_loads_once() {
        let mut cache = SpriteCache::new(Box::new(HeadlessTextureLoader::new()));
        let first = cache.fetch(SpriteSource::Entity(EntityType::Boat)).unwrap();
        let second = cache.fetch(SpriteSource::Entity(EntityType::Boat)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.frames, 24);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failing_source_is_not_cached() {
        let source = SpriteSource::Entity(EntityType::Fish);
        let loader = HeadlessTextureLoader::new().with_failure(source);
        let mut cache = SpriteCache::new(Box::new(loader));

        assert!(cache.fetch(source).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounding_box_ignores_mirroring() {
        let sprite = StaticSprite::from_texture(&texture(1));
        let (min, max) = Sprite::Static(&sprite).bounding_box([-1.0, 1.0], [100.0, 50.0]);
        assert_eq!(min, [84.0, 42.0]);
        assert_eq!(max, [116.0, 58.0]);
    }
}
