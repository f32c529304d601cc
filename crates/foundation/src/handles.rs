/// Generational handle: (slot index, generation).
///
/// A slot is reused across instances; every allocation bumps the slot's
/// generation so a handle to a released instance never equals a live one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32, u32);

impl Handle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }
}

#[derive(Debug, Default, Clone)]
pub struct HandleAllocator {
    generations: Vec<u32>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh handle for `slot`.
    pub fn alloc(&mut self, slot: u32) -> Handle {
        let idx = slot as usize;
        if self.generations.len() <= idx {
            self.generations.resize(idx + 1, 0);
        }
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        Handle::new(slot, self.generations[idx])
    }

    /// Latest generation handed out for `slot` (0 if never allocated).
    pub fn current_generation(&self, slot: u32) -> u32 {
        self.generations.get(slot as usize).copied().unwrap_or(0)
    }
}
