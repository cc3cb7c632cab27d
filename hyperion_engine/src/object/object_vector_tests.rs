use super::*;

struct Material {
    id: Id<Material>,
    name: &'static str,
}

impl Material {
    fn new(name: &'static str) -> Self {
        Self { id: Id::BAD, name }
    }
}

impl Identified for Material {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

// ============================================================================
// Identity assignment
// ============================================================================

#[test]
fn test_add_assigns_one_based_ids() {
    let mut objects: ObjectVector<Material> = ObjectVector::new();
    let a = objects.add(Material::new("a"));
    let b = objects.add(Material::new("b"));

    assert_eq!(a.value(), 1);
    assert_eq!(b.value(), 2);
    assert_eq!(objects.get(a).map(|m| m.id), Some(a));
    assert_eq!(objects.len(), 2);
}

#[test]
fn test_add_then_get_returns_same_object() {
    let mut objects: ObjectVector<Material> = ObjectVector::new();
    let id = objects.add(Material::new("brick"));

    assert_eq!(objects.get(id).map(|m| m.name), Some("brick"));
    objects.get_mut(id).unwrap().name = "stone";
    assert_eq!(objects.get(id).map(|m| m.name), Some("stone"));
}

#[test]
#[should_panic(expected = "already carries identity")]
fn test_add_rejects_object_with_identity() {
    let mut first: ObjectVector<Material> = ObjectVector::new();
    let mut second: ObjectVector<Material> = ObjectVector::new();
    let id = first.add(Material::new("shared"));

    let mut moved = first.remove(id).unwrap();
    moved.name = "moved";
    second.add(moved);
}

#[test]
fn test_bad_id_never_resolves() {
    let mut objects: ObjectVector<Material> = ObjectVector::new();
    objects.add(Material::new("a"));
    assert!(objects.get(Id::BAD).is_none());
    assert!(!objects.contains(Id::BAD));
}

// ============================================================================
// Removal and recycling
// ============================================================================

#[test]
fn test_remove_recycles_slot_with_new_generation() {
    let mut objects: ObjectVector<Material> = ObjectVector::new();
    let a = objects.add(Material::new("a"));
    let _b = objects.add(Material::new("b"));

    assert!(objects.remove(a).is_some());
    let c = objects.add(Material::new("c"));

    assert_eq!(c.value(), a.value());
    assert_ne!(c, a);
    assert!(objects.get(a).is_none());
    assert_eq!(objects.get(c).map(|m| m.name), Some("c"));
}

#[test]
fn test_remove_twice_returns_none() {
    let mut objects: ObjectVector<Material> = ObjectVector::new();
    let a = objects.add(Material::new("a"));
    assert!(objects.remove(a).is_some());
    assert!(objects.remove(a).is_none());
    assert!(objects.is_empty());
}

#[test]
fn test_iteration_follows_slot_order() {
    let mut objects: ObjectVector<Material> = ObjectVector::new();
    let a = objects.add(Material::new("a"));
    objects.add(Material::new("b"));
    objects.add(Material::new("c"));
    objects.remove(a);
    objects.add(Material::new("d"));

    let names: Vec<_> = objects.iter().map(|(_, m)| m.name).collect();
    assert_eq!(names, vec!["d", "b", "c"]);
}

#[test]
fn test_find_and_drain() {
    let mut objects: ObjectVector<Material> = ObjectVector::new();
    objects.add(Material::new("a"));
    objects.add(Material::new("b"));

    assert_eq!(objects.find(|m| m.name == "b").map(|m| m.id.value()), Some(2));

    let drained = objects.drain();
    assert_eq!(drained.len(), 2);
    assert!(objects.is_empty());
}

#[test]
fn test_insert_with_wrapped_storage() {
    let mut objects: ObjectVector<Box<u32>, Material> = ObjectVector::new();
    let id = objects.insert_with(|id| Box::new(id.value() * 10));
    assert_eq!(objects.get(id).map(|v| **v), Some(10));
}
