/// Object module - typed identities and the tables that issue them

pub mod id;
pub mod object_vector;
pub mod object_holder;
pub mod object_map;
pub mod ref_counter;

pub use id::{Id, Identified};
pub use object_vector::ObjectVector;
pub use object_holder::{GpuComponent, ObjectHolder};
pub use object_map::ObjectMap;
pub use ref_counter::{Ref, RefCounter};
