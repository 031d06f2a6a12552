use super::{Grain, GrainPool};

// -------------------------------------------------------------------------------------------------

impl Grain {
    /// Move the grain's render window to the next block. Returns false when the grain finished
    /// within the current block.
    #[inline]
    pub fn advance_window(&mut self, block_len: usize) -> bool {
        if self.stop <= block_len {
            false
        } else {
            self.start = 0;
            self.stop -= block_len;
            true
        }
    }
}

// -------------------------------------------------------------------------------------------------

impl GrainPool {
    /// Render all active grains of the current block with the given `render` function, then
    /// return finished grains to the pool and move the survivors' windows to the next block.
    pub fn process_active<F: FnMut(&mut Grain)>(&mut self, block_len: usize, mut render: F) {
        self.retain_active(|grain| {
            render(grain);
            grain.advance_window(block_len)
        });
    }
}

// -------------------------------------------------------------------------------------------------
