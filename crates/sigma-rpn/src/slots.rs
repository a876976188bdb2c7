//! Per-method JVM local-slot assignment.

use rustc_hash::FxHashMap;

use sigma_analysis::ty::Ty;

/// Assigns JVM local-variable slots within one method.
///
/// Instance methods reserve slot 0 for `this` at construction. Wide types
/// (`double`) take two consecutive slots; everything else takes one.
/// `next` never decreases, so `max_locals` is simply its final value.
#[derive(Debug)]
pub struct SlotAllocator {
    is_instance: bool,
    slots: FxHashMap<String, u16>,
    next: u16,
}

/// The reserved name for the receiver slot.
pub const THIS: &str = "this";

impl SlotAllocator {
    /// Create an allocator; instance methods pre-bind `this` to slot 0.
    pub fn new(is_instance: bool) -> Self {
        let mut slots = FxHashMap::default();
        let mut next = 0;
        if is_instance {
            slots.insert(THIS.to_string(), 0);
            next = 1;
        }
        Self {
            is_instance,
            slots,
            next,
        }
    }

    /// Whether this allocator belongs to an instance method.
    pub fn is_instance(&self) -> bool {
        self.is_instance
    }

    /// Assign a slot for `name`, reserving two for wide types.
    ///
    /// Assigning a name that already has a slot returns the existing one:
    /// shadowed block locals share their name's slot in this model.
    pub fn allocate(&mut self, name: &str, ty: &Ty) -> u16 {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        let slot = self.next;
        self.next += if ty.is_wide() { 2 } else { 1 };
        self.slots.insert(name.to_string(), slot);
        slot
    }

    /// The slot previously assigned to `name`.
    pub fn slot_of(&self, name: &str) -> Option<u16> {
        self.slots.get(name).copied()
    }

    /// Total number of local slots this method needs.
    pub fn max_locals(&self) -> u16 {
        self.next
    }
}
