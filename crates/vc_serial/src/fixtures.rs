//! Types shared by the unit tests.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::hash::{HashMap, HashSet};
use crate::registry::TypeRegistry;
use crate::{FieldOptions, FourCC, SerialError, SerializedObject, SerializedVersion, Serializer};

// -----------------------------------------------------------------------------
// Value types

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec3I {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3I {
    pub const ZERO: Self = Self::new(0, 0, 0);
    pub const ONE: Self = Self::new(1, 1, 1);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

pub fn serialize_vec3i(v: &mut Vec3I, s: &mut Serializer<'_>) -> Result<(), SerialError> {
    s.serialize("x", &mut v.x, FieldOptions::NONE)?;
    s.serialize("y", &mut v.y, FieldOptions::NONE)?;
    s.serialize("z", &mut v.z, FieldOptions::NONE)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundsInt {
    pub min: Vec3I,
    pub max: Vec3I,
}

pub fn serialize_bounds(b: &mut BoundsInt, s: &mut Serializer<'_>) -> Result<(), SerialError> {
    s.serialize_custom_or("min", &mut b.min, Vec3I::ZERO, FieldOptions::PREFER_COMPACT)?;
    s.serialize_custom_or("max", &mut b.max, Vec3I::ONE, FieldOptions::PREFER_COMPACT)
}

// -----------------------------------------------------------------------------
// Objects

#[derive(Debug, Default, PartialEq)]
pub struct Circle {
    pub radius: f32,
}

impl SerializedObject for Circle {
    fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
        s.serialize_or("radius", &mut self.radius, 1.0, FieldOptions::PREFER_COMPACT)
    }
}

/// Version 1 persisted the side as `size`.
#[derive(Debug, Default, PartialEq)]
pub struct Square {
    pub side: f32,
    pub label: String,
}

impl SerializedVersion for Square {
    fn version(&self) -> u16 {
        2
    }
}

impl SerializedObject for Square {
    fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
        let key = if s.version() >= 2 { "side" } else { "size" };
        s.serialize(key, &mut self.side, FieldOptions::NONE)?;
        s.serialize_or("label", &mut self.label, String::new(), FieldOptions::PREFER_COMPACT)
    }

    fn versioned(&self) -> Option<&dyn SerializedVersion> {
        Some(self)
    }
}

/// Only constructible through an explicit constructor.
#[derive(Debug)]
pub struct NoDefault {
    pub seed: u32,
}

impl NoDefault {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl SerializedObject for NoDefault {
    fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
        s.serialize("seed", &mut self.seed, FieldOptions::NONE)
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    pub name: String,
    pub code: FourCC,
    pub bounds: BoundsInt,
    pub points: Vec<Vec3I>,
    pub tags: HashSet<String>,
    pub weights: HashMap<u32, f64>,
    pub shapes: Vec<Option<Box<dyn SerializedObject>>>,
    pub focus: Option<Box<dyn SerializedObject>>,
}

impl Scene {
    pub fn sample() -> Self {
        let mut scene = Self {
            name: String::from("level-1"),
            code: FourCC::from_bytes(*b"LVL1"),
            bounds: BoundsInt {
                min: Vec3I::new(-1, -1, -1),
                max: Vec3I::new(8, 8, 8),
            },
            points: vec![Vec3I::ZERO, Vec3I::new(1, 2, 3)],
            ..Self::default()
        };
        scene.tags.insert(String::from("outdoor"));
        scene.weights.insert(1, 0.5);
        scene.weights.insert(2, 0.25);
        scene
    }
}

impl SerializedObject for Scene {
    fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
        s.serialize("name", &mut self.name, FieldOptions::NONE)?;
        s.serialize_or("code", &mut self.code, FourCC::default(), FieldOptions::PREFER_COMPACT)?;
        s.serialize_custom("bounds", &mut self.bounds, FieldOptions::NONE)?;
        s.custom_array("points", &mut self.points, FieldOptions::PREFER_COMPACT)?;
        s.set("tags", &mut self.tags, FieldOptions::PREFER_COMPACT)?;
        s.map("weights", &mut self.weights, FieldOptions::PREFER_COMPACT)?;
        s.dyn_array("shapes", &mut self.shapes, FieldOptions::PREFER_COMPACT)?;
        s.serialize_dyn("focus", &mut self.focus, FieldOptions::PREFER_COMPACT)
    }
}

/// Exercises the struct, custom and object flavours of every collection.
#[derive(Debug, Default, PartialEq)]
pub struct Inventory {
    pub anchor: Vec3I,
    pub origin: Vec3I,
    pub marker: Circle,
    pub corners: HashSet<Vec3I>,
    pub cells: HashSet<Vec3I>,
    pub slots: HashMap<u16, Vec3I>,
    pub regions: HashMap<String, BoundsInt>,
    pub rings: HashMap<i8, Circle>,
    pub circles: Vec<Circle>,
}

impl Inventory {
    pub fn sample() -> Self {
        let mut inventory = Self {
            origin: Vec3I::new(4, 5, 6),
            marker: Circle { radius: 2.5 },
            circles: vec![Circle { radius: 1.0 }, Circle { radius: 3.0 }],
            ..Self::default()
        };
        inventory.corners.insert(Vec3I::ZERO);
        inventory.corners.insert(Vec3I::new(1, 0, 1));
        inventory.cells.insert(Vec3I::new(-2, 3, 9));
        inventory.slots.insert(0, Vec3I::ONE);
        inventory.slots.insert(65535, Vec3I::new(7, 7, 7));
        inventory.regions.insert(
            String::from("spawn"),
            BoundsInt {
                min: Vec3I::ZERO,
                max: Vec3I::new(2, 2, 2),
            },
        );
        inventory.rings.insert(-3, Circle { radius: 0.5 });
        inventory.rings.insert(4, Circle::default());
        inventory
    }
}

impl SerializedObject for Inventory {
    fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
        s.serialize_struct_or("anchor", &mut self.anchor, Vec3I::ZERO, FieldOptions::PREFER_COMPACT, serialize_vec3i)?;
        s.serialize_struct_or("origin", &mut self.origin, Vec3I::ZERO, FieldOptions::PREFER_COMPACT, serialize_vec3i)?;
        s.serialize_object("marker", &mut self.marker, FieldOptions::NONE)?;
        s.struct_set("corners", &mut self.corners, FieldOptions::NONE, serialize_vec3i)?;
        s.custom_set("cells", &mut self.cells, FieldOptions::NONE)?;
        s.struct_map("slots", &mut self.slots, FieldOptions::NONE, serialize_vec3i)?;
        s.custom_map("regions", &mut self.regions, FieldOptions::NONE)?;
        s.object_map("rings", &mut self.rings, FieldOptions::NONE)?;
        s.object_array("circles", &mut self.circles, FieldOptions::NONE)
    }
}

/// A registry knowing every fixture.
pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register::<Circle>();
    registry.register_alias::<Circle>("circle");
    registry.register::<Square>();
    registry.register_alias::<Square>("square");
    registry.register::<Scene>();
    registry.register_alias::<Scene>("scene");
    registry.register_serializer::<Vec3I>(serialize_vec3i);
    registry.register_alias::<Vec3I>("V3I");
    registry.register_serializer::<BoundsInt>(serialize_bounds);
    registry
}
