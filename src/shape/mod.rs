//! The shape aggregate.
//!
//! A [`Shape`] owns every entity list of one model. Entities refer to each
//! other and to the [`NamePool`] by plain integer index.
//!
//! ## Example
//!
//! ```ignore
//! use dts::Shape;
//!
//! let shape = Shape::open("player.dts")?;
//! for node in &shape.nodes {
//!     println!("{}", shape.names.get(node.name).unwrap_or("?"));
//! }
//! shape.save("player_v24.dts", 24)?;
//! ```

mod names;
mod read;
mod write;

pub use names::NamePool;

use crate::stream::DEFAULT_VERSION;
use crate::types::{
    Decal, DetailLevel, IflMaterial, Material, Mesh, Node, Object, ObjectState, Sequence,
    Subshape, Trigger,
};
use crate::util::{Box3, Error, Mat4, Quat, Result, Vec3};

/// A complete shape: hierarchy, geometry, materials and animation.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    /// Version the shape was read from, or [`DEFAULT_VERSION`] for new shapes.
    /// Informational only; saving takes an explicit version.
    pub version: i32,
    pub exporter_version: i16,

    pub nodes: Vec<Node>,
    pub objects: Vec<Object>,
    pub decals: Vec<Decal>,
    pub subshapes: Vec<Subshape>,
    pub ifl_materials: Vec<IflMaterial>,
    pub materials: Vec<Material>,

    /// Rest pose, one entry per node.
    pub default_rotations: Vec<Quat>,
    pub default_translations: Vec<Vec3>,

    /// Keyframe arrays addressed by sequence base offsets.
    pub node_rotations: Vec<Quat>,
    pub node_translations: Vec<Vec3>,
    pub node_uniform_scales: Vec<f32>,
    pub node_aligned_scales: Vec<Vec3>,
    pub node_arbitrary_scale_factors: Vec<Vec3>,
    pub node_arbitrary_scale_rots: Vec<Quat>,
    pub ground_translations: Vec<Vec3>,
    pub ground_rotations: Vec<Quat>,
    pub object_states: Vec<ObjectState>,
    pub decal_states: Vec<i32>,

    pub triggers: Vec<Trigger>,
    pub detail_levels: Vec<DetailLevel>,
    pub meshes: Vec<Mesh>,
    pub sequences: Vec<Sequence>,
    pub names: NamePool,

    /// Per detail level fade values, present from version 26.
    pub alpha_in: Vec<i32>,
    pub alpha_out: Vec<i32>,

    pub smallest_size: f32,
    pub smallest_detail_level: i32,
    pub radius: f32,
    /// Bounding radius in the XY plane.
    pub radius_tube: f32,
    pub center: Vec3,
    pub bounds: Box3,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            exporter_version: 0,
            nodes: Vec::new(),
            objects: Vec::new(),
            decals: Vec::new(),
            subshapes: Vec::new(),
            ifl_materials: Vec::new(),
            materials: Vec::new(),
            default_rotations: Vec::new(),
            default_translations: Vec::new(),
            node_rotations: Vec::new(),
            node_translations: Vec::new(),
            node_uniform_scales: Vec::new(),
            node_aligned_scales: Vec::new(),
            node_arbitrary_scale_factors: Vec::new(),
            node_arbitrary_scale_rots: Vec::new(),
            ground_translations: Vec::new(),
            ground_rotations: Vec::new(),
            object_states: Vec::new(),
            decal_states: Vec::new(),
            triggers: Vec::new(),
            detail_levels: Vec::new(),
            meshes: Vec::new(),
            sequences: Vec::new(),
            names: NamePool::new(),
            alpha_in: Vec::new(),
            alpha_out: Vec::new(),
            smallest_size: 0.0,
            smallest_detail_level: 0,
            radius: 0.0,
            radius_tube: 0.0,
            center: Vec3::ZERO,
            bounds: Box3::default(),
        }
    }
}

impl Shape {
    /// Create an empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name and return its pool index.
    pub fn name(&mut self, name: &str) -> i32 {
        self.names.intern(name)
    }

    /// Append a node with its rest transform, keeping the parallel arrays
    /// in step. Returns the node index.
    pub fn add_node(&mut self, name: &str, parent: i32, translation: Vec3, rotation: Quat) -> usize {
        let name = self.name(name);
        self.nodes.push(Node::new(name, parent));
        self.default_translations.push(translation);
        self.default_rotations.push(rotation);
        self.nodes.len() - 1
    }

    /// Index of the node called `name`, compared case-insensitively.
    pub fn find_node(&self, name: &str) -> Option<usize> {
        let index = self.names.find(name)?;
        self.nodes.iter().position(|n| n.name == index)
    }

    /// Meshes of `object`, one per object detail.
    pub fn object_meshes(&self, object: &Object) -> &[Mesh] {
        let first = object.first_mesh.max(0) as usize;
        let end = first.saturating_add(object.num_meshes.max(0) as usize);
        self.meshes.get(first..end.min(self.meshes.len())).unwrap_or(&[])
    }

    /// World transform of `node` in the rest pose.
    ///
    /// Composes `translation * rotation` from the node up to its root.
    pub fn world_matrix(&self, node: usize) -> Result<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = node as i64;
        let mut steps = 0;

        while current >= 0 {
            let i = current as usize;
            let (Some(n), Some(&t), Some(&r)) = (
                self.nodes.get(i),
                self.default_translations.get(i),
                self.default_rotations.get(i),
            ) else {
                return Err(Error::corrupt(format!("node index {} out of range", i)));
            };

            steps += 1;
            if steps > self.nodes.len() {
                return Err(Error::corrupt(format!("parent cycle through node {}", node)));
            }

            matrix = Mat4::from_rotation_translation(r, t) * matrix;
            current = n.parent as i64;
        }

        Ok(matrix)
    }

    /// World transforms for every node.
    pub fn world_matrices(&self) -> Result<Vec<Mat4>> {
        (0..self.nodes.len()).map(|i| self.world_matrix(i)).collect()
    }

    /// Check the cross-list invariants. Not run by load or save.
    pub fn verify(&self) -> Result<()> {
        fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(Error::CorruptData(msg()))
            }
        }

        check(!self.detail_levels.is_empty(), || "shape has no detail levels".into())?;
        check(!self.subshapes.is_empty(), || "shape has no subshapes".into())?;
        check(
            self.nodes.len() == self.default_translations.len()
                && self.nodes.len() == self.default_rotations.len(),
            || {
                format!(
                    "{} nodes but {} default translations and {} default rotations",
                    self.nodes.len(),
                    self.default_translations.len(),
                    self.default_rotations.len()
                )
            },
        )?;
        check(self.objects.len() == self.object_states.len(), || {
            format!("{} objects but {} object states", self.objects.len(), self.object_states.len())
        })?;
        check(
            self.node_arbitrary_scale_factors.len() == self.node_arbitrary_scale_rots.len(),
            || "arbitrary scale factors and rotations differ in length".into(),
        )?;
        check(self.ground_translations.len() == self.ground_rotations.len(), || {
            "ground translations and rotations differ in length".into()
        })?;
        check(self.names.is_unique(), || "name pool has case-insensitive duplicates".into())?;

        let name_ok = |index: i32| self.names.get(index).is_some();
        for (i, node) in self.nodes.iter().enumerate() {
            check(name_ok(node.name), || format!("node {} has bad name index {}", i, node.name))?;
            check(node.parent < 0 || (node.parent as usize) < self.nodes.len(), || {
                format!("node {} has bad parent {}", i, node.parent)
            })?;
        }
        for (i, obj) in self.objects.iter().enumerate() {
            check(name_ok(obj.name), || format!("object {} has bad name index {}", i, obj.name))?;
            check(obj.node < 0 || (obj.node as usize) < self.nodes.len(), || {
                format!("object {} has bad node {}", i, obj.node)
            })?;
            check(
                obj.first_mesh >= 0
                    && obj.num_meshes >= 0
                    && (obj.first_mesh as usize + obj.num_meshes as usize) <= self.meshes.len(),
                || format!("object {} mesh range out of bounds", i),
            )?;
        }
        for (i, ifl) in self.ifl_materials.iter().enumerate() {
            check(name_ok(ifl.name), || format!("IFL material {} has bad name index {}", i, ifl.name))?;
        }
        for (i, dl) in self.detail_levels.iter().enumerate() {
            check(name_ok(dl.name), || format!("detail level {} has bad name index {}", i, dl.name))?;
        }
        for (i, seq) in self.sequences.iter().enumerate() {
            check(name_ok(seq.name), || format!("sequence {} has bad name index {}", i, seq.name))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Shape {
        let mut shape = Shape::new();
        shape.add_node("Root", -1, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        shape.add_node("Child", 0, Vec3::new(0.0, 2.0, 0.0), Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        shape.add_node("Leaf", 1, Vec3::new(3.0, 0.0, 0.0), Quat::IDENTITY);
        shape
    }

    #[test]
    fn test_world_matrix_composes_parents() -> Result<()> {
        let shape = chain();
        let origin = shape.world_matrix(2)?.transform_point3(Vec3::ZERO);
        // Leaf offset (3,0,0) rotated 90 degrees about Z is (0,3,0).
        assert!(origin.abs_diff_eq(Vec3::new(1.0, 5.0, 0.0), 1e-5));
        assert_eq!(shape.world_matrices()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_world_matrix_detects_cycle() {
        let mut shape = chain();
        shape.nodes[0].parent = 2;
        assert!(matches!(shape.world_matrix(2), Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_world_matrix_bad_index() {
        assert!(matches!(chain().world_matrix(7), Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_find_node() {
        let shape = chain();
        assert_eq!(shape.find_node("child"), Some(1));
        assert_eq!(shape.find_node("nope"), None);
    }

    #[test]
    fn test_verify() {
        let mut shape = chain();
        assert!(shape.verify().is_err());

        let detail = shape.name("detail2");
        shape.detail_levels.push(DetailLevel::new(detail, 0, 0, 2.0));
        shape.subshapes.push(Subshape { num_nodes: 3, ..Default::default() });
        shape.verify().unwrap();

        shape.default_rotations.pop();
        assert!(matches!(shape.verify(), Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_verify_object_states() {
        let mut shape = chain();
        let detail = shape.name("detail2");
        shape.detail_levels.push(DetailLevel::new(detail, 0, 0, 2.0));
        shape.subshapes.push(Subshape::default());
        let name = shape.name("box");
        shape.objects.push(Object::new(name, 0, 0, 0));
        assert!(shape.verify().is_err());
        shape.object_states.push(ObjectState::default());
        shape.verify().unwrap();
    }

    #[test]
    fn test_verify_ifl_names() {
        let mut shape = chain();
        let detail = shape.name("detail2");
        shape.detail_levels.push(DetailLevel::new(detail, 0, 0, 2.0));
        shape.subshapes.push(Subshape::default());
        shape.ifl_materials.push(IflMaterial::new(99, 0));
        assert!(matches!(shape.verify(), Err(Error::CorruptData(_))));

        let name = shape.name("flash.ifl");
        shape.ifl_materials[0].name = name;
        shape.verify().unwrap();
    }

    #[test]
    fn test_object_meshes() {
        let mut shape = Shape::new();
        shape.meshes = vec![Mesh::Null, Mesh::Null, Mesh::Null];
        assert_eq!(shape.object_meshes(&Object::new(0, 2, 1, 0)).len(), 2);
        assert!(shape.object_meshes(&Object::new(0, 2, 5, 0)).is_empty());
    }
}
