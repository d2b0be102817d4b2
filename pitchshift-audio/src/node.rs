use crate::block::{AudioBlockMut, AudioBlockRef};

/// One stage of the effects pipeline.
///
/// A stage is called once per tick. It reads shared input blocks and fills
/// the exclusive output blocks the graph preallocated for it; leaving an
/// output slot `None` means "no block this tick" and downstream sees silence.
pub trait AudioNode {
    const NUM_INPUTS: usize;
    const NUM_OUTPUTS: usize;

    /// Process one block.
    ///
    /// `inputs` has `NUM_INPUTS` slots and `outputs` has `NUM_OUTPUTS` slots.
    /// Must not block, allocate from the heap, or loop beyond the block size.
    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef>],
        outputs: &mut [Option<AudioBlockMut>],
    );
}
