use std::collections::BTreeMap;

use crate::{
    capsule::Capsule,
    exception::{ErrorKind, RunResult},
    iter::StepIter,
};

/// Index of an object in a session [`Heap`].
///
/// Slots are recycled after [`Heap::free`]; the generation makes ids of freed
/// objects stay dangling even when their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HeapId {
    index: usize,
    generation: u32,
}

impl HeapId {
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }
}

/// Objects that live in the heap rather than inline in an [`Object`](crate::Object).
#[derive(Debug)]
pub(crate) enum HeapData {
    Iter(StepIter),
    Capsule(Capsule),
}

impl HeapData {
    /// Host-facing type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Iter(_) => "RangeIterator",
            Self::Capsule(_) => "PyCapsule",
        }
    }

    /// Variant name used in [`HeapStats::objects_by_type`].
    fn variant_name(&self) -> &'static str {
        match self {
            Self::Iter(_) => "Iter",
            Self::Capsule(_) => "Capsule",
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    data: Option<HeapData>,
}

/// Point-in-time summary of a heap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total heap capacity (live + free).
    pub total_slots: usize,
    /// Breakdown of live objects by `HeapData` variant name ("Iter", "Capsule").
    pub objects_by_type: BTreeMap<&'static str, usize>,
    /// Resource tracker allocation count, if the tracker records it.
    pub tracker_allocations: Option<usize>,
    /// Resource tracker memory usage in bytes, if the tracker records it.
    pub tracker_memory_bytes: Option<usize>,
}

/// Slab of heap objects with free-slot reuse.
#[derive(Debug, Default)]
pub(crate) struct Heap {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
}

impl Heap {
    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index];
            slot.data = Some(data);
            HeapId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            HeapId {
                index: self.slots.len() - 1,
                generation: 0,
            }
        }
    }

    fn slot(&self, id: HeapId) -> Option<&Slot> {
        self.slots.get(id.index).filter(|slot| slot.generation == id.generation)
    }

    pub fn get(&self, id: HeapId) -> RunResult<&HeapData> {
        self.slot(id)
            .and_then(|slot| slot.data.as_ref())
            .ok_or_else(ErrorKind::dangling_ref)
    }

    pub fn get_mut(&mut self, id: HeapId) -> RunResult<&mut HeapData> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
            .ok_or_else(ErrorKind::dangling_ref)
    }

    /// Removes the object, returning it to the caller to drop.
    pub fn free(&mut self, id: HeapId) -> RunResult<HeapData> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation && slot.data.is_some())
            .ok_or_else(ErrorKind::dangling_ref)?;
        let data = slot.data.take().ok_or_else(ErrorKind::dangling_ref)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        Ok(data)
    }

    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type = BTreeMap::new();
        for data in self.slots.iter().filter_map(|slot| slot.data.as_ref()) {
            *objects_by_type.entry(data.variant_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects: self.slots.len() - self.free_list.len(),
            free_slots: self.free_list.len(),
            total_slots: self.slots.len(),
            objects_by_type,
            tracker_allocations: None,
            tracker_memory_bytes: None,
        }
    }
}
