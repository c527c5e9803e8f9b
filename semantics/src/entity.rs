use alloc::{collections::BTreeMap, string::String, vec, vec::Vec};

use crate::{intern, lookup_symbol, resolve, InternerSymbol};

/// Name of the implicit root of every type hierarchy.
pub const ROOT_TYPE: &str = "object";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Type {
    name: InternerSymbol,
}

impl Type {
    pub fn new(name: &str) -> Self {
        Self { name: intern(name) }
    }

    pub fn root() -> Self {
        Self::new(ROOT_TYPE)
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub type SubType = Type;
pub type SuperType = Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeError {
    AlreadyHasSuperType(SuperType),
    CreatesCircularInheritance,
}

/// Declared types and their single-parent inheritance.
///
/// The root type is always present and every type without
/// an explicit super type inherits from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeHierarchy {
    types: Vec<Type>,
    supertypes: BTreeMap<SubType, SuperType>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        Self {
            types: vec![Type::root()],
            supertypes: BTreeMap::new(),
        }
    }
}

impl TypeHierarchy {
    pub fn get_or_create(&mut self, type_name: &str) -> Type {
        let t = Type::new(type_name);
        if !self.types.contains(&t) {
            self.types.push(t);
        }
        t
    }

    pub fn get(&self, type_name: &str) -> Option<Type> {
        let name = lookup_symbol(type_name)?;
        self.types.iter().copied().find(|t| t.name == name)
    }

    pub fn contains(&self, r#type: &Type) -> bool {
        self.types.contains(r#type)
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn create_inheritance(
        &mut self,
        sub_type: &SubType,
        super_type: &SuperType,
    ) -> Result<(), TypeError> {
        if let Some(t) = self.supertypes.get(sub_type) {
            if t == super_type {
                return Ok(());
            }
            return Err(TypeError::AlreadyHasSuperType(*t));
        }

        if sub_type == super_type || self.inherits(super_type, sub_type) {
            return Err(TypeError::CreatesCircularInheritance);
        }

        self.supertypes.insert(*sub_type, *super_type);
        Ok(())
    }

    pub fn get_parent(&self, r#type: &Type) -> Option<SuperType> {
        self.supertypes.get(r#type).copied()
    }

    /// The type itself followed by its chain of super types.
    ///
    /// Types declared without a parent still reach the root.
    pub fn ancestors(&self, r#type: &Type) -> Vec<Type> {
        let mut res = vec![*r#type];
        let mut t = *r#type;
        while let Some(parent) = self.get_parent(&t) {
            t = parent;
            res.push(t);
        }
        let root = Type::root();
        if !res.contains(&root) {
            res.push(root);
        }
        res
    }

    pub fn inherits(&self, sub_type: &SubType, super_type: &SuperType) -> bool {
        self.ancestors(sub_type)[1..].contains(super_type)
    }

    pub fn inherits_or_eq(&self, sub_type: &SubType, super_type: &SuperType) -> bool {
        sub_type == super_type || self.inherits(sub_type, super_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Object {
    name: InternerSymbol,
    r#type: Type,
}

impl Object {
    pub fn new(name: &str, r#type: Type) -> Self {
        Self {
            name: intern(name),
            r#type,
        }
    }

    pub fn name(&self) -> String {
        resolve(self.name)
    }

    pub fn r#type(&self) -> Type {
        self.r#type
    }
}

impl core::fmt::Display for Object {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Typed symbol table over every constant and object of a problem.
///
/// Each object is listed under its declared type and every
/// ancestor of it, in the order the objects were added.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectIndex {
    types: TypeHierarchy,
    objects: Vec<Object>,
    by_name: BTreeMap<InternerSymbol, Object>,
    by_type: BTreeMap<Type, Vec<Object>>,
}

impl ObjectIndex {
    pub fn new(types: TypeHierarchy, objects: impl IntoIterator<Item = Object>) -> Self {
        let mut index = Self {
            by_type: types.types().iter().map(|t| (*t, Vec::new())).collect(),
            types,
            objects: Vec::new(),
            by_name: BTreeMap::new(),
        };

        for object in objects {
            if let Some(existing) = index.by_name.get(&object.name) {
                log::warn!(
                    "Object `{}` is declared more than once, keeping type `{}`.",
                    object,
                    existing.r#type
                );
                continue;
            }

            index.by_name.insert(object.name, object);
            index.objects.push(object);
            for t in index.types.ancestors(&object.r#type) {
                index.by_type.entry(t).or_default().push(object);
            }
        }

        index
    }

    /// All objects satisfying `type`. Empty if there are none.
    pub fn lookup(&self, r#type: &Type) -> &[Object] {
        self.by_type.get(r#type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        lookup_symbol(name).and_then(|s| self.by_name.get(&s).copied())
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn types(&self) -> &TypeHierarchy {
        &self.types
    }

    pub fn satisfies(&self, object: &Object, r#type: &Type) -> bool {
        self.types.inherits_or_eq(&object.r#type, r#type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inheritance() {
        let mut types = TypeHierarchy::default();
        let t1 = types.get_or_create("foo");
        let t2 = types.get_or_create("bar");
        let t3 = types.get_or_create("baz");
        let t4 = types.get_or_create("qux");

        let res = types.create_inheritance(&t1, &t2);
        assert!(res.is_ok());
        assert_eq!(types.get_parent(&t1).unwrap(), t2);

        let _ = types.create_inheritance(&t2, &t3);
        assert_eq!(types.ancestors(&t1), vec![t1, t2, t3, Type::root()]);

        let res = types.create_inheritance(&t1, &t3);
        assert_eq!(res, Err(TypeError::AlreadyHasSuperType(t2)));

        // Redeclaring the same parent is fine
        assert!(types.create_inheritance(&t1, &t2).is_ok());

        let _ = types.create_inheritance(&t3, &t4);

        assert!(types.inherits(&t1, &t2));
        assert!(types.inherits(&t1, &t3));
        assert!(types.inherits(&t2, &t4));
        assert!(types.inherits(&t1, &Type::root()));
        assert!(!types.inherits(&t3, &t1));
        assert!(!types.inherits(&t1, &t1));
        assert!(types.inherits_or_eq(&t1, &t1));

        let res = types.create_inheritance(&t4, &t1);
        assert_eq!(res, Err(TypeError::CreatesCircularInheritance));
        let res = types.create_inheritance(&t4, &t4);
        assert_eq!(res, Err(TypeError::CreatesCircularInheritance));
    }

    #[test]
    fn test_lookup_by_type() {
        let mut types = TypeHierarchy::default();
        let vehicle = types.get_or_create("vehicle");
        let truck = types.get_or_create("truck");
        let plane = types.get_or_create("plane");
        let place = types.get_or_create("place");
        let _ = types.create_inheritance(&truck, &vehicle);
        let _ = types.create_inheritance(&plane, &vehicle);

        let t1 = Object::new("t1", truck);
        let p1 = Object::new("p1", plane);
        let t2 = Object::new("t2", truck);
        let index = ObjectIndex::new(types, [t1, p1, t2]);

        assert_eq!(index.lookup(&truck), &[t1, t2]);
        assert_eq!(index.lookup(&plane), &[p1]);
        // Insertion order is kept across subtypes
        assert_eq!(index.lookup(&vehicle), &[t1, p1, t2]);
        assert_eq!(index.lookup(&Type::root()), &[t1, p1, t2]);
        // Declared type without objects
        assert!(index.lookup(&place).is_empty());
        // Stable across calls
        assert_eq!(index.lookup(&vehicle), index.lookup(&vehicle));

        assert!(index.satisfies(&t1, &vehicle));
        assert!(!index.satisfies(&t1, &plane));
        assert_eq!(index.get("p1"), Some(p1));
        assert_eq!(index.get("nowhere-to-be-found"), None);
    }

    #[test]
    fn test_duplicate_objects_keep_first() {
        let mut types = TypeHierarchy::default();
        let a = types.get_or_create("a");
        let b = types.get_or_create("b");

        let first = Object::new("x", a);
        let second = Object::new("x", b);
        let index = ObjectIndex::new(types, [first, second]);

        assert_eq!(index.objects(), &[first]);
        assert_eq!(index.get("x"), Some(first));
        assert!(index.lookup(&b).is_empty());
    }
}
