//! Where level assets come from.
//!
//! Loaders ask an [`AssetSource`] for an [`AssetRef`]; only the source knows
//! how refs map onto storage.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use sef_core::string_operations::decode_legacy;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// Per-level string table (`.sdb`).
    StringTable { mode: String, level: String },
    /// Per-level scene text (`.sef`).
    Scene { mode: String, level: String },
    /// Level container (`.lvl`) of a pack.
    LevelContainer { pack: String },
    /// Animation table (`.lao`) of a pack.
    AnimationTable { pack: String },
    /// Background layer of a pack (JPEG).
    Background { pack: String },
    Static { pack: String, number: u32 },
    Mask { pack: String, number: u32 },
    Animation { pack: String, number: u32 },
    /// Animated cursor (`.ani`) by file name.
    Cursor { name: String },
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::StringTable { mode, level } => write!(f, "string table {mode}/{level}"),
            AssetRef::Scene { mode, level } => write!(f, "scene {mode}/{level}"),
            AssetRef::LevelContainer { pack } => write!(f, "level container {pack}"),
            AssetRef::AnimationTable { pack } => write!(f, "animation table {pack}"),
            AssetRef::Background { pack } => write!(f, "background {pack}"),
            AssetRef::Static { pack, number } => write!(f, "static {pack}#{number}"),
            AssetRef::Mask { pack, number } => write!(f, "mask {pack}#{number}"),
            AssetRef::Animation { pack, number } => write!(f, "animation {pack}#{number}"),
            AssetRef::Cursor { name } => write!(f, "cursor {name}"),
        }
    }
}

/// Blocking byte fetch. Failures are plain I/O errors; callers decide whether
/// the asset was required.
pub trait AssetSource {
    fn fetch(&self, asset: &AssetRef) -> io::Result<Vec<u8>>;

    /// Fetches a text asset. UTF-8 is taken as is; anything else is read in
    /// the legacy codepage.
    fn fetch_text(&self, asset: &AssetRef) -> io::Result<String> {
        let bytes = self.fetch(asset)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => decode_legacy(e.as_bytes()),
        })
    }
}

/// Assets laid out on disk the way the game ships them.
///
/// ```text
/// <root>/levels/<mode>/<level>/<level>.sdb|.sef
/// <root>/levels/lvl/<pack>.lvl
/// <root>/levels/pack/<pack>/bitmaps/layer.jpg
/// <root>/levels/pack/<pack>/bitmaps/{static,masks,animated}/*.csx
/// <root>/levels/pack/<pack>/data/animated/<pack>.lao
/// <root>/cursors/<name>
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn levels(&self) -> PathBuf {
        self.root.join("levels")
    }

    fn pack_dir(&self, pack: &str) -> PathBuf {
        self.levels().join("pack").join(pack)
    }

    pub fn path_for(&self, asset: &AssetRef) -> PathBuf {
        match asset {
            AssetRef::StringTable { mode, level } => self
                .levels()
                .join(mode)
                .join(level)
                .join(format!("{level}.sdb")),
            AssetRef::Scene { mode, level } => self
                .levels()
                .join(mode)
                .join(level)
                .join(format!("{level}.sef")),
            AssetRef::LevelContainer { pack } => {
                self.levels().join("lvl").join(format!("{pack}.lvl"))
            }
            AssetRef::AnimationTable { pack } => self
                .pack_dir(pack)
                .join("data")
                .join("animated")
                .join(format!("{pack}.lao")),
            AssetRef::Background { pack } => self.pack_dir(pack).join("bitmaps").join("layer.jpg"),
            AssetRef::Static { pack, number } => self
                .pack_dir(pack)
                .join("bitmaps")
                .join("static")
                .join(format!("static_{number}.csx")),
            AssetRef::Mask { pack, number } => self
                .pack_dir(pack)
                .join("bitmaps")
                .join("masks")
                .join(format!("mask_{number}.csx")),
            AssetRef::Animation { pack, number } => self
                .pack_dir(pack)
                .join("bitmaps")
                .join("animated")
                .join(format!("anim_{number}.csx")),
            AssetRef::Cursor { name } => self.root.join("cursors").join(name),
        }
    }
}

impl AssetSource for DirectorySource {
    fn fetch(&self, asset: &AssetRef) -> io::Result<Vec<u8>> {
        let path = self.path_for(asset);
        log::debug!("reading {} from {}", asset, path.display());
        std::fs::read(&path)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))
    }
}

/// In-memory assets, keyed by ref.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<AssetRef, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: AssetRef, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.assets.insert(asset, bytes.into());
        self
    }

    pub fn remove(&mut self, asset: &AssetRef) -> Option<Vec<u8>> {
        self.assets.remove(asset)
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, asset: &AssetRef) -> io::Result<Vec<u8>> {
        self.assets
            .get(asset)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{asset} not found")))
    }
}
