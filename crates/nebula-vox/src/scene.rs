//! Single-pass scene graph parser.
//!
//! Walks the children of the `MAIN` chunk in order, pairing `SIZE`/`XYZI`
//! chunks into models and resolving `nTRN → nGRP | nSHP` node pairs into
//! world-space [`Instance`]s. Nesting is tracked with an explicit stack of
//! open group frames rather than recursion, so deeply nested scenes cannot
//! exhaust the call stack.

use glam::Mat4;
use tracing::{debug, trace, warn};

use crate::chunk::{
    CHUNK_HEADER_LEN, ChunkHeader, ChunkId, GroupNode, PackChunk, Palette, ShapeNode, SizeChunk,
    TransformNode, VoxelRecord, XyziChunk,
};
use crate::cursor::ByteCursor;
use crate::error::VoxError;
use crate::transform::{DEFAULT_MAX_DICT_VALUE_LEN, decode_frame_transform};

/// Magic bytes at the start of every `.vox` file.
pub const VOX_MAGIC: [u8; 4] = *b"VOX ";

/// Oldest file version this parser accepts.
pub const MIN_VOX_VERSION: i32 = 150;

/// How to treat a bad magic number or an old version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Fail before reading any chunk.
    #[default]
    Strict,
    /// Log a warning and try to parse anyway.
    Lenient,
}

/// Knobs for [`parse_scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub header_policy: HeaderPolicy,
    /// Upper bound on the byte length of `_r` / `_t` values.
    pub max_dict_value_len: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            header_policy: HeaderPolicy::Strict,
            max_dict_value_len: DEFAULT_MAX_DICT_VALUE_LEN,
        }
    }
}

/// One `SIZE`/`XYZI` pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoxModel {
    pub size: SizeChunk,
    pub voxels: Vec<VoxelRecord>,
}

/// A placement of a model in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    /// Index into [`VoxScene::models`].
    pub model_id: u32,
    /// World transform in source axis convention.
    pub transform: Mat4,
    /// `_name` attribute of the owning transform node.
    pub name: Option<String>,
    /// `_hidden` attribute of the owning transform node.
    pub hidden: bool,
    pub layer_id: i32,
}

impl Instance {
    /// Maps source space (Z up) into engine space (Y up), matching the axis
    /// remap applied to raw voxel models.
    pub const SOURCE_TO_ENGINE: Mat4 = Mat4::from_cols_array(&[
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, -1.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// World transform expressed in engine axis convention.
    pub fn engine_transform(&self) -> Mat4 {
        Self::SOURCE_TO_ENGINE * self.transform
    }
}

/// Everything extracted from one `.vox` file.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxScene {
    pub version: i32,
    /// Model count announced by `PACK`, or 1 if absent.
    pub declared_models: usize,
    pub models: Vec<VoxModel>,
    pub instances: Vec<Instance>,
    pub palette: Palette,
}

/// An open `nGRP` whose children are still being read.
#[derive(Clone, Copy, Debug)]
struct GroupFrame {
    /// Children not yet started. Frames are popped when this reaches zero.
    remaining: usize,
    transform: Mat4,
}

/// Parses a complete `.vox` file held in memory.
pub fn parse_scene(bytes: &[u8], options: &ParseOptions) -> Result<VoxScene, VoxError> {
    if bytes.is_empty() {
        return Err(VoxError::Empty);
    }
    let mut cursor = ByteCursor::new(bytes);
    let version = read_file_header(&mut cursor, options.header_policy)?;

    let main = ChunkHeader::read(&mut cursor)?;
    if main.id != ChunkId::Main {
        return Err(VoxError::MissingMainChunk(main.id));
    }
    cursor.skip(main.content_len)?;
    let children = cursor.split(main.children_len)?;
    if !cursor.is_at_end() {
        debug!(bytes = cursor.remaining(), "ignoring data after MAIN chunk");
    }

    let mut parser = SceneParser::new(children, options);
    parser.read_pack()?;
    parser.run()?;
    parser.finish(version)
}

/// Checks the `"VOX "` magic and version and returns the version.
fn read_file_header(cursor: &mut ByteCursor<'_>, policy: HeaderPolicy) -> Result<i32, VoxError> {
    let magic: [u8; 4] = cursor.read_array()?;
    if magic != VOX_MAGIC {
        match policy {
            HeaderPolicy::Strict => return Err(VoxError::InvalidMagic(magic)),
            HeaderPolicy::Lenient => warn!(?magic, "invalid vox magic, parsing anyway"),
        }
    }

    let version = cursor.read_i32()?;
    if version < MIN_VOX_VERSION {
        match policy {
            HeaderPolicy::Strict => return Err(VoxError::UnsupportedVersion(version)),
            HeaderPolicy::Lenient => warn!(version, "unsupported vox version, parsing anyway"),
        }
    }
    Ok(version)
}

struct SceneParser<'a> {
    cursor: ByteCursor<'a>,
    max_value_len: usize,
    group_stack: Vec<GroupFrame>,
    previous_node_id: i32,
    declared_models: usize,
    models: Vec<VoxModel>,
    instances: Vec<Instance>,
    palette: Option<Palette>,
    saw_scene_graph: bool,
}

impl<'a> SceneParser<'a> {
    fn new(cursor: ByteCursor<'a>, options: &ParseOptions) -> Self {
        Self {
            cursor,
            max_value_len: options.max_dict_value_len,
            group_stack: Vec::new(),
            previous_node_id: -1,
            declared_models: 1,
            models: Vec::new(),
            instances: Vec::new(),
            palette: None,
            saw_scene_graph: false,
        }
    }

    /// Consumes a leading `PACK` chunk if present, otherwise rewinds so the
    /// header just read is parsed again by [`Self::run`].
    fn read_pack(&mut self) -> Result<(), VoxError> {
        if self.cursor.is_at_end() {
            return Ok(());
        }
        let header = ChunkHeader::read(&mut self.cursor)?;
        if header.id == ChunkId::Pack {
            let mut content = header.read_content(&mut self.cursor)?;
            self.declared_models = PackChunk::read(&mut content)?.num_models;
        } else {
            self.cursor.rewind(CHUNK_HEADER_LEN);
        }
        Ok(())
    }

    fn run(&mut self) -> Result<(), VoxError> {
        while !self.cursor.is_at_end() {
            let header = ChunkHeader::read(&mut self.cursor)?;
            match header.id {
                ChunkId::Size => self.read_model(&header)?,
                ChunkId::Rgba => {
                    let mut content = header.read_content(&mut self.cursor)?;
                    self.palette = Some(Palette::read(&mut content)?);
                }
                ChunkId::Transform => self.read_transform(&header)?,
                ChunkId::Xyzi | ChunkId::Group | ChunkId::Shape | ChunkId::Pack | ChunkId::Main => {
                    debug!(tag = %header.id, offset = self.cursor.offset(), "skipping unpaired chunk");
                    header.skip(&mut self.cursor)?;
                }
                ChunkId::Opaque(_) => {
                    trace!(tag = %header.id, bytes = header.body_len(), "skipping chunk");
                    header.skip(&mut self.cursor)?;
                }
            }
        }
        Ok(())
    }

    fn read_model(&mut self, size_header: &ChunkHeader) -> Result<(), VoxError> {
        let size = SizeChunk::read(&mut size_header.read_content(&mut self.cursor)?)?;

        let xyzi_header = ChunkHeader::read(&mut self.cursor)?;
        if xyzi_header.id != ChunkId::Xyzi {
            return Err(VoxError::SizeWithoutXyzi {
                found: xyzi_header.id,
            });
        }
        let xyzi = XyziChunk::read(&mut xyzi_header.read_content(&mut self.cursor)?)?;
        trace!(
            model = self.models.len(),
            size = ?(size.x, size.y, size.z),
            voxels = xyzi.voxels.len(),
            "read model"
        );
        self.models.push(VoxModel {
            size,
            voxels: xyzi.voxels,
        });
        Ok(())
    }

    fn check_node_id(&mut self, found: i32) -> Result<(), VoxError> {
        let expected = self.previous_node_id + 1;
        if found != expected {
            return Err(VoxError::NodeIdOutOfSequence { expected, found });
        }
        self.previous_node_id = found;
        Ok(())
    }

    /// Handles an `nTRN` and the `nGRP`/`nSHP` chunk that must follow it.
    fn read_transform(&mut self, header: &ChunkHeader) -> Result<(), VoxError> {
        self.saw_scene_graph = true;
        let node = TransformNode::read(&mut header.read_content(&mut self.cursor)?)?;
        self.check_node_id(node.node_id)?;
        if node.frame_count > 1 {
            trace!(
                node = node.node_id,
                frames = node.frame_count,
                "ignoring animation frames after the first"
            );
        }

        let local = match &node.first_frame {
            Some(frame) => decode_frame_transform(frame, self.max_value_len)?,
            None => Mat4::IDENTITY,
        };
        let world = match self.group_stack.last() {
            Some(parent) => parent.transform * local,
            None => local,
        };

        // This node is a child of the enclosing group; account for it before a
        // nested group frame is pushed on top.
        self.finish_child();

        let child = ChunkHeader::read(&mut self.cursor)?;
        match child.id {
            ChunkId::Group => {
                let group = GroupNode::read(&mut child.read_content(&mut self.cursor)?)?;
                self.check_node_id(group.node_id)?;
                if group.child_count > 0 {
                    self.group_stack.push(GroupFrame {
                        remaining: group.child_count,
                        transform: world,
                    });
                } else {
                    trace!(node = group.node_id, "empty group");
                }
            }
            ChunkId::Shape => {
                let shape = ShapeNode::read(&mut child.read_content(&mut self.cursor)?)?;
                self.check_node_id(shape.node_id)?;
                let name = node.attributes.get("_name").map(str::to_string);
                let hidden = node.attributes.get("_hidden") == Some("1");
                for model in &shape.models {
                    let model_id = u32::try_from(model.model_id)
                        .map_err(|_| VoxError::InvalidModelReference(model.model_id))?;
                    self.instances.push(Instance {
                        model_id,
                        transform: world,
                        name: name.clone(),
                        hidden,
                        layer_id: node.layer_id,
                    });
                }
            }
            other => {
                warn!(
                    node = node.node_id,
                    tag = %other,
                    "transform node not followed by a group or shape, skipping"
                );
                child.skip(&mut self.cursor)?;
            }
        }
        Ok(())
    }

    /// Counts one child against the innermost open group.
    fn finish_child(&mut self) {
        if let Some(top) = self.group_stack.last_mut() {
            top.remaining -= 1;
            if top.remaining == 0 {
                self.group_stack.pop();
            }
        }
    }

    fn finish(self, version: i32) -> Result<VoxScene, VoxError> {
        if !self.group_stack.is_empty() {
            warn!(
                open_groups = self.group_stack.len(),
                "scene ended with unfinished groups"
            );
        }
        if self.declared_models != self.models.len() {
            warn!(
                declared = self.declared_models,
                found = self.models.len(),
                "PACK model count does not match SIZE/XYZI pairs"
            );
        }

        if let Some(bad) = self
            .instances
            .iter()
            .find(|i| i.model_id as usize >= self.models.len())
        {
            return Err(VoxError::InvalidModelReference(bad.model_id as i32));
        }

        let mut instances = self.instances;
        if !self.saw_scene_graph {
            // Files written before the scene graph existed place every model
            // once at the origin.
            instances = (0..self.models.len() as u32)
                .map(|model_id| Instance {
                    model_id,
                    transform: Mat4::IDENTITY,
                    name: None,
                    hidden: false,
                    layer_id: 0,
                })
                .collect();
        }

        Ok(VoxScene {
            version,
            declared_models: self.declared_models,
            models: self.models,
            instances,
            palette: self.palette.unwrap_or_default(),
        })
    }
}
