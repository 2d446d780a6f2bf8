use alloc::boxed::Box;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};

use super::{MapKey, Scalar, Serializer};
use crate::hash::{HashMap, HashSet};
use crate::registry::TypeSerializerFn;
use crate::{FieldOptions, SerialError, SerializedObject};

/// Upper bound of elements reserved up front on read, the count comes from
/// untrusted data.
const PREALLOC_LIMIT: usize = 1024;

const ENTRY_KEY: &str = "key";
const ENTRY_VALUE: &str = "value";

/// Visits one element. The key is `None` for array and set elements, and
/// the entry value key for map values.
type Element<'e, 's, T> = &'e mut dyn FnMut(&mut Serializer<'s>, Option<&str>, &mut T) -> Result<(), SerialError>;

impl<'s> Serializer<'s> {
    /// Presence handling shared by collections, whose default is empty.
    fn enter_collection(
        &mut self,
        key: Option<&str>,
        options: FieldOptions,
        is_empty: bool,
        clear: impl FnOnce(),
    ) -> Result<bool, SerialError> {
        if self.enter_field(key, options, false, || is_empty)? {
            return Ok(true);
        }
        if self.is_reading() && !options.contains(FieldOptions::OPTIONAL) {
            clear();
        }
        Ok(false)
    }

    /// Runs `body` between `begin_array` and `end_array`, passing the
    /// element count. The array is closed even if `body` fails.
    fn array_scope(
        &mut self,
        key: Option<&str>,
        len: usize,
        body: impl FnOnce(&mut Self, usize) -> Result<(), SerialError>,
    ) -> Result<(), SerialError> {
        let count = self.begin_array(key, len)?;
        self.path.push(key);
        let result = body(self, count);
        self.path.pop();
        let end = self.end_array();
        result.and(end)
    }

    fn element<T>(&mut self, index: usize, item: &mut T, element: Element<'_, 's, T>) -> Result<(), SerialError> {
        self.path.push_index(index);
        let result = element(self, None, item);
        self.path.pop();
        result
    }

    fn do_array<T: Default>(
        &mut self,
        key: &str,
        array: &mut Vec<T>,
        options: FieldOptions,
        element: Element<'_, 's, T>,
    ) -> Result<(), SerialError> {
        let key = Some(key);
        if !self.enter_collection(key, options, array.is_empty(), || array.clear())? {
            return Ok(());
        }
        self.array_scope(key, array.len(), |s, count| {
            if s.is_writing() {
                for (index, item) in array.iter_mut().enumerate() {
                    s.element(index, item, element)?;
                }
            } else {
                array.clear();
                array.reserve(count.min(PREALLOC_LIMIT));
                for index in 0..count {
                    let mut item = T::default();
                    s.element(index, &mut item, element)?;
                    array.push(item);
                }
            }
            Ok(())
        })
    }

    fn do_set<T: Eq + Hash + Clone + Default, S: BuildHasher>(
        &mut self,
        key: &str,
        set: &mut HashSet<T, S>,
        options: FieldOptions,
        element: Element<'_, 's, T>,
    ) -> Result<(), SerialError> {
        let key = Some(key);
        if !self.enter_collection(key, options, set.is_empty(), || set.clear())? {
            return Ok(());
        }
        self.array_scope(key, set.len(), |s, count| {
            if s.is_writing() {
                for (index, item) in set.iter().enumerate() {
                    let mut item = item.clone();
                    s.element(index, &mut item, element)?;
                }
            } else {
                set.clear();
                set.reserve(count.min(PREALLOC_LIMIT));
                for index in 0..count {
                    let mut item = T::default();
                    s.element(index, &mut item, element)?;
                    set.insert(item);
                }
            }
            Ok(())
        })
    }

    /// Maps are arrays of `{key, value}` entry objects.
    fn do_map<K: MapKey, V: Default, S: BuildHasher>(
        &mut self,
        key: &str,
        map: &mut HashMap<K, V, S>,
        options: FieldOptions,
        element: Element<'_, 's, V>,
    ) -> Result<(), SerialError> {
        let key = Some(key);
        if !self.enter_collection(key, options, map.is_empty(), || map.clear())? {
            return Ok(());
        }
        self.array_scope(key, map.len(), |s, count| {
            if s.is_writing() {
                for (index, (entry_key, value)) in map.iter_mut().enumerate() {
                    let mut entry_key = entry_key.clone();
                    s.map_entry(index, &mut entry_key, value, element)?;
                }
            } else {
                map.clear();
                map.reserve(count.min(PREALLOC_LIMIT));
                for index in 0..count {
                    let mut entry_key = K::default();
                    let mut value = V::default();
                    s.map_entry(index, &mut entry_key, &mut value, element)?;
                    if map.contains_key(&entry_key) {
                        log::warn!("{}: duplicate map key {entry_key:?}, the last one wins", s.path);
                    }
                    map.insert(entry_key, value);
                }
            }
            Ok(())
        })
    }

    fn map_entry<K: MapKey, V>(
        &mut self,
        index: usize,
        entry_key: &mut K,
        value: &mut V,
        element: Element<'_, 's, V>,
    ) -> Result<(), SerialError> {
        self.path.push_index(index);
        let result = self.object_scope(None, |s| {
            s.scalar(Some(ENTRY_KEY), entry_key)?;
            element(s, Some(ENTRY_VALUE), value)
        });
        self.path.pop();
        result
    }

    // -------------------------------------------------------------------------
    // Arrays

    /// Visits an ordered sequence of scalars.
    ///
    /// Like every collection, an empty one is omitted with
    /// [`FieldOptions::PREFER_COMPACT`] and an absent one reads as empty.
    pub fn array<T: Scalar + Default>(
        &mut self,
        key: &str,
        array: &mut Vec<T>,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        self.do_array(key, array, options, &mut |s, key, item| s.scalar(key, item))
    }

    /// Visits an ordered sequence of structs decomposed by `func`.
    pub fn struct_array<T: Default>(
        &mut self,
        key: &str,
        array: &mut Vec<T>,
        options: FieldOptions,
        func: TypeSerializerFn<T>,
    ) -> Result<(), SerialError> {
        self.do_array(key, array, options, &mut |s, key, item| {
            s.struct_value(key, item, func, None)
        })
    }

    /// Visits an ordered sequence of structs through the serializer
    /// registered for `T`.
    pub fn custom_array<T: Default + 'static>(
        &mut self,
        key: &str,
        array: &mut Vec<T>,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        let (func, version) = self.custom_fn::<T>()?;
        self.do_array(key, array, options, &mut |s, key, item| {
            s.struct_value(key, item, func, version)
        })
    }

    /// Visits an ordered sequence of owned objects of a known type.
    pub fn object_array<T: SerializedObject + Default>(
        &mut self,
        key: &str,
        array: &mut Vec<T>,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        self.do_array(key, array, options, &mut |s, key, item| s.object_value(key, item))
    }

    /// Visits an ordered sequence of polymorphic slots.
    ///
    /// Elements that can not be resolved on read become `None`, so the
    /// positions of the others are preserved.
    pub fn dyn_array(
        &mut self,
        key: &str,
        array: &mut Vec<Option<Box<dyn SerializedObject>>>,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        self.do_array(key, array, options, &mut |s, key, item| s.dyn_value(key, item, true))
    }

    // -------------------------------------------------------------------------
    // Sets

    /// Visits an unordered set of scalars. Duplicates read back collapse.
    pub fn set<T, S>(&mut self, key: &str, set: &mut HashSet<T, S>, options: FieldOptions) -> Result<(), SerialError>
    where
        T: Scalar + Eq + Hash + Clone + Default,
        S: BuildHasher,
    {
        self.do_set(key, set, options, &mut |s, key, item| s.scalar(key, item))
    }

    /// Visits an unordered set of structs decomposed by `func`.
    pub fn struct_set<T, S>(
        &mut self,
        key: &str,
        set: &mut HashSet<T, S>,
        options: FieldOptions,
        func: TypeSerializerFn<T>,
    ) -> Result<(), SerialError>
    where
        T: Eq + Hash + Clone + Default,
        S: BuildHasher,
    {
        self.do_set(key, set, options, &mut |s, key, item| {
            s.struct_value(key, item, func, None)
        })
    }

    /// Visits an unordered set of structs through the serializer registered
    /// for `T`.
    pub fn custom_set<T, S>(&mut self, key: &str, set: &mut HashSet<T, S>, options: FieldOptions) -> Result<(), SerialError>
    where
        T: Eq + Hash + Clone + Default + 'static,
        S: BuildHasher,
    {
        let (func, version) = self.custom_fn::<T>()?;
        self.do_set(key, set, options, &mut |s, key, item| {
            s.struct_value(key, item, func, version)
        })
    }

    // -------------------------------------------------------------------------
    // Maps

    /// Visits a map of scalars. On read, the last of duplicate keys wins.
    pub fn map<K, V, S>(&mut self, key: &str, map: &mut HashMap<K, V, S>, options: FieldOptions) -> Result<(), SerialError>
    where
        K: MapKey,
        V: Scalar + Default,
        S: BuildHasher,
    {
        self.do_map(key, map, options, &mut |s, key, value| s.scalar(key, value))
    }

    /// Visits a map of structs decomposed by `func`.
    pub fn struct_map<K, V, S>(
        &mut self,
        key: &str,
        map: &mut HashMap<K, V, S>,
        options: FieldOptions,
        func: TypeSerializerFn<V>,
    ) -> Result<(), SerialError>
    where
        K: MapKey,
        V: Default,
        S: BuildHasher,
    {
        self.do_map(key, map, options, &mut |s, key, value| {
            s.struct_value(key, value, func, None)
        })
    }

    /// Visits a map of structs through the serializer registered for `V`.
    pub fn custom_map<K, V, S>(&mut self, key: &str, map: &mut HashMap<K, V, S>, options: FieldOptions) -> Result<(), SerialError>
    where
        K: MapKey,
        V: Default + 'static,
        S: BuildHasher,
    {
        let (func, version) = self.custom_fn::<V>()?;
        self.do_map(key, map, options, &mut |s, key, value| {
            s.struct_value(key, value, func, version)
        })
    }

    /// Visits a map of owned objects of a known type.
    pub fn object_map<K, V, S>(&mut self, key: &str, map: &mut HashMap<K, V, S>, options: FieldOptions) -> Result<(), SerialError>
    where
        K: MapKey,
        V: SerializedObject + Default,
        S: BuildHasher,
    {
        self.do_map(key, map, options, &mut |s, key, value| s.object_value(key, value))
    }

    /// Visits a map of polymorphic slots. Unresolvable values become `None`.
    pub fn dyn_map<K, S>(
        &mut self,
        key: &str,
        map: &mut HashMap<K, Option<Box<dyn SerializedObject>>, S>,
        options: FieldOptions,
    ) -> Result<(), SerialError>
    where
        K: MapKey,
        S: BuildHasher,
    {
        self.do_map(key, map, options, &mut |s, key, value| s.dyn_value(key, value, true))
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use serde_json::json;

    use crate::fixtures::{self, Circle, Vec3I, serialize_vec3i};
    use crate::format::json::{JsonReader, JsonWriter};
    use crate::hash::{HashMap, HashSet};
    use crate::registry::TypeRegistry;
    use crate::{FieldOptions, SerializedObject, read_with, write_with};

    #[test]
    fn arrays_keep_order() {
        let registry = TypeRegistry::new();
        let mut writer = JsonWriter::new();
        write_with(&registry, &mut writer, |s| {
            s.array("ints", &mut vec![3_i64, 1, 2], FieldOptions::NONE)?;
            s.struct_array(
                "points",
                &mut vec![Vec3I::new(1, 0, 0), Vec3I::new(0, 1, 0)],
                FieldOptions::NONE,
                serialize_vec3i,
            )
        })
        .unwrap();

        let value = writer.into_value().unwrap();
        assert_eq!(
            value,
            json!({
                "ints": [3, 1, 2],
                "points": [{ "x": 1, "y": 0, "z": 0 }, { "x": 0, "y": 1, "z": 0 }],
            })
        );

        let (ints, points) = read_with(&registry, &mut JsonReader::new(&value), |s| {
            let mut ints: Vec<i64> = vec![9];
            let mut points: Vec<Vec3I> = Vec::new();
            s.array("ints", &mut ints, FieldOptions::NONE)?;
            s.struct_array("points", &mut points, FieldOptions::NONE, serialize_vec3i)?;
            Ok((ints, points))
        })
        .unwrap();
        assert_eq!(ints, [3, 1, 2]);
        assert_eq!(points, [Vec3I::new(1, 0, 0), Vec3I::new(0, 1, 0)]);
    }

    #[test]
    fn empty_compact_collection_is_omitted_and_read_as_empty() {
        let registry = TypeRegistry::new();
        let mut writer = JsonWriter::new();
        write_with(&registry, &mut writer, |s| {
            s.array("a", &mut Vec::<u8>::new(), FieldOptions::PREFER_COMPACT)?;
            s.array("b", &mut Vec::<u8>::new(), FieldOptions::NONE)
        })
        .unwrap();
        let value = writer.into_value().unwrap();
        assert_eq!(value, json!({ "b": [] }));

        let a = read_with(&registry, &mut JsonReader::new(&value), |s| {
            let mut a = vec![1_u8];
            s.array("a", &mut a, FieldOptions::PREFER_COMPACT)?;
            Ok(a)
        })
        .unwrap();
        assert!(a.is_empty());
    }

    #[test]
    fn set_elements_are_deduplicated() {
        let registry = TypeRegistry::new();
        let value = json!({ "tags": ["a", "b", "a"] });
        let tags = read_with(&registry, &mut JsonReader::new(&value), |s| {
            let mut tags = HashSet::<String>::default();
            s.set("tags", &mut tags, FieldOptions::NONE)?;
            Ok(tags)
        })
        .unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("a") && tags.contains("b"));
    }

    #[test]
    fn map_entries_and_duplicate_keys() {
        let registry = TypeRegistry::new();
        let mut writer = JsonWriter::new();
        let mut input = HashMap::<i32, String>::default();
        input.insert(-4, String::from("minus four"));
        write_with(&registry, &mut writer, |s| s.map("names", &mut input, FieldOptions::NONE)).unwrap();
        assert_eq!(
            writer.into_value().unwrap(),
            json!({ "names": [{ "key": -4, "value": "minus four" }] })
        );

        let value = json!({
            "names": [
                { "key": 1, "value": "first" },
                { "key": 1, "value": "second" },
            ]
        });
        let names = read_with(&registry, &mut JsonReader::new(&value), |s| {
            let mut names = HashMap::<i32, String>::default();
            s.map("names", &mut names, FieldOptions::NONE)?;
            Ok(names)
        })
        .unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[&1], "second");
    }

    #[test]
    fn unresolved_array_elements_keep_positions() {
        let registry = fixtures::registry();
        let value = json!({
            "shapes": [
                { "$type": "circle", "radius": 1.5 },
                { "$type": "gone.Hexagon" },
                null,
                { "$type": "circle" },
            ]
        });
        let shapes = read_with(&registry, &mut JsonReader::new(&value), |s| {
            let mut shapes: Vec<Option<Box<dyn SerializedObject>>> = Vec::new();
            s.dyn_array("shapes", &mut shapes, FieldOptions::NONE)?;
            Ok(shapes)
        })
        .unwrap();

        assert_eq!(shapes.len(), 4);
        let circle = |slot: &Option<Box<dyn SerializedObject>>| {
            slot.as_deref().and_then(|object| object.downcast_ref::<Circle>()).map(|c| c.radius)
        };
        assert_eq!(circle(&shapes[0]), Some(1.5));
        assert!(shapes[1].is_none());
        assert!(shapes[2].is_none());
        assert_eq!(circle(&shapes[3]), Some(1.0));
    }

    #[test]
    fn dyn_map_round_trip() {
        let registry = fixtures::registry();
        let mut input = HashMap::<String, Option<Box<dyn SerializedObject>>>::default();
        input.insert(String::from("big"), Some(Box::new(Circle { radius: 9.0 })));
        input.insert(String::from("none"), None);

        let mut writer = JsonWriter::new();
        write_with(&registry, &mut writer, |s| s.dyn_map("shapes", &mut input, FieldOptions::NONE)).unwrap();
        let value = writer.into_value().unwrap();

        let output = read_with(&registry, &mut JsonReader::new(&value), |s| {
            let mut output = HashMap::<String, Option<Box<dyn SerializedObject>>>::default();
            s.dyn_map("shapes", &mut output, FieldOptions::NONE)?;
            Ok(output)
        })
        .unwrap();

        assert_eq!(output.len(), 2);
        assert!(output["none"].is_none());
        let big = output["big"].as_deref().and_then(|o| o.downcast_ref::<Circle>());
        assert_eq!(big, Some(&Circle { radius: 9.0 }));
    }
}
