use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Shader {
    id: Id<Shader>,
    name: &'static str,
    teardowns: Arc<AtomicUsize>,
}

impl Shader {
    fn new(name: &'static str, teardowns: &Arc<AtomicUsize>) -> Self {
        Self {
            id: Id::BAD,
            name,
            teardowns: Arc::clone(teardowns),
        }
    }
}

impl Identified for Shader {
    fn id(&self) -> Id<Self> {
        self.id
    }

    fn set_id(&mut self, id: Id<Self>) {
        self.id = id;
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Counting
// ============================================================================

#[test]
fn test_add_starts_with_one_reference() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let shaders = RefCounter::new();
    let shader = shaders.add(Shader::new("forward", &teardowns));

    assert!(shader.id().is_valid());
    assert_eq!(shader.name, "forward");
    assert_eq!(shaders.ref_count(shader.id()), 1);
    shader.release();
}

#[test]
fn test_clone_and_get_acquire() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let shaders = RefCounter::new();
    let first = shaders.add(Shader::new("deferred", &teardowns));
    let id = first.id();

    let second = first.clone();
    let third = shaders.get(id).unwrap();
    assert_eq!(shaders.ref_count(id), 3);
    assert_eq!(third.id, id);

    drop(second);
    third.release();
    assert_eq!(shaders.ref_count(id), 1);
    first.release();
}

#[test]
fn test_last_release_tears_down_once() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let shaders = RefCounter::new();
    let first = shaders.add(Shader::new("blur", &teardowns));
    let second = first.clone();
    let id = first.id();

    first.release();
    assert_eq!(teardowns.load(Ordering::SeqCst), 0);
    assert!(shaders.contains(id));

    second.release();
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    assert!(!shaders.contains(id));
    assert_eq!(shaders.ref_count(id), 0);
    assert!(shaders.get(id).is_none());
    assert!(shaders.is_empty());
}

#[test]
fn test_released_slot_is_recycled() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let shaders = RefCounter::new();
    let a = shaders.add(Shader::new("a", &teardowns));
    let a_id = a.id();
    a.release();

    let b = shaders.add(Shader::new("b", &teardowns));
    assert_eq!(b.id().value(), a_id.value());
    assert_ne!(b.id(), a_id);
    assert!(shaders.get(a_id).is_none());
    b.release();
}

#[test]
fn test_stale_id_counts_zero_after_slot_reuse() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let shaders = RefCounter::new();
    let a = shaders.add(Shader::new("a", &teardowns));
    let a_id = a.id();
    drop(a);

    let b = shaders.add(Shader::new("b", &teardowns));
    let b2 = b.clone();
    assert_eq!(b.id().value(), a_id.value());

    assert_eq!(shaders.ref_count(a_id), 0);
    assert_eq!(shaders.ref_count(b.id()), 2);
    b2.release();
    b.release();
}

// ============================================================================
// Contract violations
// ============================================================================

#[test]
#[should_panic(expected = "still referenced")]
fn test_drop_with_live_references_panics() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let shaders = RefCounter::new();
    let shader = shaders.add(Shader::new("leaked", &teardowns));
    std::mem::forget(shader);
    drop(shaders);
}

#[test]
fn test_references_shared_across_threads() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let shaders = RefCounter::new();
    let shader = shaders.add(Shader::new("threaded", &teardowns));
    let id = shader.id();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let local = shader.clone();
            std::thread::spawn(move || {
                assert_eq!(local.name, "threaded");
                local.release();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(shaders.ref_count(id), 1);
    shader.release();
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}
