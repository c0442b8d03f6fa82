//! Model library shared by every loaded `.vox` file.
//!
//! Models from all files live in one flat list so instances can refer to
//! them by a single global index. Model keys are the file name followed by
//! the model's index within that file (`"tree.vox0"`, `"tree.vox1"`, ...).
//! Keys can collide across files (`"a"` model 10 and `"a1"` model 0 are both
//! `"a10"`); the model loaded first keeps the key.

use std::collections::hash_map::Entry;
use std::ops::Range;
use std::path::Path;

use glam::UVec3;
use nebula_vox::{Instance, Palette, ParseOptions};
use nebula_voxel::VoxelBrickAS;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::error::AssetError;
use crate::loader::{VoxAsset, load_vox_bytes, load_vox_file};

/// A model stored in the library.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryModel {
    pub key: String,
    pub bricks: VoxelBrickAS,
}

/// The slices of the library owned by one file.
#[derive(Clone, Debug)]
struct FileEntry {
    name: String,
    models: Range<usize>,
    instances: Range<usize>,
    palette: Palette,
}

/// Explicitly owned store of loaded models and their instances.
#[derive(Debug, Default)]
pub struct VoxelModelLibrary {
    models: Vec<LibraryModel>,
    instances: Vec<Instance>,
    files: Vec<FileEntry>,
    by_key: FxHashMap<String, usize>,
}

impl VoxelModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and converts `bytes`, then adds the result under `name`.
    ///
    /// A file already loaded under `name` is replaced. On error the library
    /// is left as it was.
    pub fn load(
        &mut self,
        name: &str,
        bytes: &[u8],
        repeat: UVec3,
        options: &ParseOptions,
    ) -> Result<Range<usize>, AssetError> {
        let asset = load_vox_bytes(bytes, repeat, options)?;
        Ok(self.insert(name, asset))
    }

    /// Loads the file at `path` under its displayed path as the name.
    pub fn load_file(
        &mut self,
        path: &Path,
        repeat: UVec3,
        options: &ParseOptions,
    ) -> Result<Range<usize>, AssetError> {
        let asset = load_vox_file(path, repeat, options)?;
        Ok(self.insert(&path.display().to_string(), asset))
    }

    /// Adds an already converted asset and returns the global indices of its
    /// models.
    pub fn insert(&mut self, name: &str, asset: VoxAsset) -> Range<usize> {
        if self.unload(name) {
            debug!(name, "replacing previously loaded file");
        }

        let base = self.models.len();
        let models = base..base + asset.models.len();
        self.models.extend(
            asset
                .models
                .into_iter()
                .enumerate()
                .map(|(index, bricks)| LibraryModel {
                    key: format!("{name}{index}"),
                    bricks,
                }),
        );

        let first_instance = self.instances.len();
        self.instances
            .extend(asset.instances.into_iter().map(|mut instance| {
                instance.model_id += base as u32;
                instance
            }));

        info!(
            name,
            models = models.len(),
            instances = self.instances.len() - first_instance,
            "added file to model library"
        );
        self.files.push(FileEntry {
            name: name.to_string(),
            models: models.clone(),
            instances: first_instance..self.instances.len(),
            palette: asset.palette,
        });
        self.reindex();
        models
    }

    /// Removes every model and instance that came from `name`. Returns
    /// whether anything was removed.
    pub fn unload(&mut self, name: &str) -> bool {
        let Some(position) = self.files.iter().position(|f| f.name == name) else {
            return false;
        };
        let entry = self.files.remove(position);
        let model_count = entry.models.len();
        let instance_count = entry.instances.len();

        self.models.drain(entry.models.clone());
        self.instances.drain(entry.instances.clone());

        for instance in &mut self.instances {
            if instance.model_id as usize >= entry.models.end {
                instance.model_id -= model_count as u32;
            }
        }
        for later in &mut self.files[position..] {
            later.models = later.models.start - model_count..later.models.end - model_count;
            later.instances =
                later.instances.start - instance_count..later.instances.end - instance_count;
        }

        self.reindex();
        debug!(name, model_count, instance_count, "unloaded file");
        true
    }

    fn reindex(&mut self) {
        self.by_key.clear();
        for (index, model) in self.models.iter().enumerate() {
            match self.by_key.entry(model.key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(slot) => {
                    warn!(
                        key = %model.key,
                        kept = *slot.get(),
                        shadowed = index,
                        "model key collision, keeping the earlier model"
                    );
                }
            }
        }
    }

    pub fn models(&self) -> &[LibraryModel] {
        &self.models
    }

    /// All instances; `model_id` indexes [`Self::models`].
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Global index of the model stored under `key`.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&VoxelBrickAS> {
        self.index_of(key).map(|index| &self.models[index].bricks)
    }

    pub fn palette(&self, name: &str) -> Option<&Palette> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.palette)
    }

    /// Models that came from `name`, in file order.
    pub fn file_models(&self, name: &str) -> Option<&[LibraryModel]> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| &self.models[f.models.clone()])
    }

    /// Instances that came from `name`.
    pub fn file_instances(&self, name: &str) -> Option<&[Instance]> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| &self.instances[f.instances.clone()])
    }

    /// Names of loaded files in load order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;

    fn asset(models: usize, instance_models: &[u32]) -> VoxAsset {
        VoxAsset {
            models: (0..models)
                .map(|i| VoxelBrickAS::empty(UVec3::splat(i as u32 + 1)))
                .collect(),
            instances: instance_models
                .iter()
                .map(|&model_id| Instance {
                    model_id,
                    transform: Mat4::IDENTITY,
                    name: None,
                    hidden: false,
                    layer_id: 0,
                })
                .collect(),
            palette: Palette::default(),
        }
    }

    fn model_ids(library: &VoxelModelLibrary) -> Vec<u32> {
        library.instances().iter().map(|i| i.model_id).collect()
    }

    #[test]
    fn test_insert_rebases_model_ids() {
        let mut library = VoxelModelLibrary::new();
        assert_eq!(library.insert("a.vox", asset(2, &[0, 1, 1])), 0..2);
        assert_eq!(library.insert("b.vox", asset(3, &[2, 0])), 2..5);

        assert_eq!(library.model_count(), 5);
        assert_eq!(library.instance_count(), 5);
        assert_eq!(model_ids(&library), vec![0, 1, 1, 4, 2]);
        assert_eq!(library.index_of("a.vox1"), Some(1));
        assert_eq!(library.index_of("b.vox0"), Some(2));
        assert_eq!(library.models()[4].key, "b.vox2");
    }

    #[test]
    fn test_unload_compacts_later_files() {
        let mut library = VoxelModelLibrary::new();
        library.insert("a.vox", asset(2, &[0, 1]));
        library.insert("b.vox", asset(1, &[0]));
        library.insert("c.vox", asset(2, &[1, 0]));

        assert!(library.unload("a.vox"));
        assert!(!library.unload("a.vox"));

        assert_eq!(library.model_count(), 3);
        assert_eq!(model_ids(&library), vec![0, 2, 1]);
        assert_eq!(library.index_of("a.vox0"), None);
        assert_eq!(library.index_of("c.vox1"), Some(2));
        assert_eq!(library.file_instances("c.vox").unwrap().len(), 2);
        let keys: Vec<&str> = library
            .file_models("c.vox")
            .unwrap()
            .iter()
            .map(|m| m.key.as_str())
            .collect();
        assert_eq!(keys, ["c.vox0", "c.vox1"]);
        assert_eq!(
            library.get("c.vox0").unwrap().size_in_bricks,
            UVec3::splat(1)
        );
        for instance in library.instances() {
            assert!((instance.model_id as usize) < library.model_count());
        }
    }

    #[test]
    fn test_reinsert_replaces_file() {
        let mut library = VoxelModelLibrary::new();
        library.insert("a.vox", asset(2, &[0]));
        library.insert("b.vox", asset(1, &[0]));
        library.insert("a.vox", asset(1, &[0, 0]));

        assert_eq!(library.model_count(), 2);
        assert_eq!(library.file_names().collect::<Vec<_>>(), ["b.vox", "a.vox"]);
        assert_eq!(model_ids(&library), vec![0, 1, 1]);
        assert_eq!(library.index_of("a.vox1"), None);
    }

    #[test]
    fn test_key_collision_keeps_first_model() {
        let mut library = VoxelModelLibrary::new();
        library.insert("a", asset(11, &[10]));
        library.insert("a1", asset(1, &[0]));

        assert_eq!(library.model_count(), 12);
        assert_eq!(library.models()[11].key, "a10");
        assert_eq!(library.index_of("a10"), Some(10));
        assert_eq!(
            library.get("a10").unwrap().size_in_bricks,
            UVec3::splat(11)
        );
        assert_eq!(library.file_models("a1").unwrap().len(), 1);
        assert_eq!(model_ids(&library), vec![10, 11]);

        // Once the earlier owner is gone the key resolves to the survivor.
        assert!(library.unload("a"));
        assert_eq!(library.index_of("a10"), Some(0));
    }

    #[test]
    fn test_failed_load_leaves_library_untouched() {
        let mut library = VoxelModelLibrary::new();
        library.insert("a.vox", asset(1, &[0]));

        let result = library.load("a.vox", b"not a vox file", UVec3::ONE, &ParseOptions::default());
        assert!(result.is_err(), "expected error, got {result:?}");
        assert_eq!(library.model_count(), 1);
        assert_eq!(library.instance_count(), 1);
        assert!(library.palette("a.vox").is_some());
    }
}
