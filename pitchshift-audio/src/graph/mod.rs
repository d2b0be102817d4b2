//! Declarative wiring of processing stages.
//!
//! [`audio_graph!`] generates a struct holding every node plus an
//! `update_all()` that runs them once, in declaration order, moving blocks
//! from each node's outputs to the inputs wired to them.
//!
//! # Syntax
//!
//! Nodes are listed in processing order: sources first, consumers after the
//! nodes they read from. Inputs are declared inline.
//!
//! ```ignore
//! audio_graph! {
//!     pub struct Chain {
//!         input: AudioPlayQueue {},
//!         granular: AudioEffectGranular { (input, 0) },
//!         reverb: AudioEffectFreeverb { (granular, 0) },
//!         mixer: AudioMixer<2> { (granular, 0), (reverb, 0) },
//!         output: AudioRecordQueue { (mixer, 0) },
//!     }
//! }
//! ```
//!
//! ## Inputs
//!
//! - `{}`: no inputs (source)
//! - `{ (node, port) }`: input 0 reads `node`'s output `port`
//! - `{ (a, 0), _ }`: input 1 left open; the node sees `None` (silence)
//! - `{ (a, 0), (a, 0) }`: the same output feeding two inputs
//!
//! ## Generated API
//!
//! - `pub` fields named after the nodes, for configuration between ticks
//! - `new()` / `Default`: every node built with its own `new()`
//! - `update_all()`: one tick through the whole graph
//!
//! ## Block routing
//!
//! - Each node's outputs are preallocated from the pool before it runs and
//!   shared downstream as `AudioBlockRef`s afterwards.
//! - Fan-out clones the reference; samples are never copied.
//! - All blocks of a tick are released when `update_all()` returns, except
//!   those a node chose to keep (e.g. a queued output).
//! - An exhausted pool leaves output slots `None`; the affected stages are
//!   skipped for that tick.

/// Declare and wire a processing graph.
///
/// See the [module documentation](crate::graph) for the syntax.
#[macro_export]
macro_rules! audio_graph {
    (
        $(#[$struct_meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $node_name:ident : $node_type:ty { $( $input_item:tt ),* $(,)? }
            ),+
            $(,)?
        }
    ) => {
        $(#[$struct_meta])*
        $vis struct $name {
            $( pub $node_name: $node_type, )+
        }

        impl $name {
            /// Build every node with its default settings.
            pub fn new() -> Self {
                Self {
                    $( $node_name: <$node_type>::new(), )+
                }
            }

            /// Run one tick through every node in declaration order.
            #[allow(unused_variables)]
            pub fn update_all(&mut self) {
                $(
                    #[allow(unused_variables, clippy::let_unit_value)]
                    let $node_name: [Option<$crate::block::AudioBlockRef>;
                        <$node_type as $crate::node::AudioNode>::NUM_OUTPUTS
                    ] = {
                        let _inputs: [Option<$crate::block::AudioBlockRef>;
                            <$node_type as $crate::node::AudioNode>::NUM_INPUTS
                        ] = [ $( $crate::audio_graph!(@input_expr $input_item) ),* ];

                        let mut _outs: [Option<$crate::block::AudioBlockMut>;
                            <$node_type as $crate::node::AudioNode>::NUM_OUTPUTS
                        ] = core::array::from_fn(|_| $crate::block::AudioBlockMut::alloc());

                        <$node_type as $crate::node::AudioNode>::update(
                            &mut self.$node_name, &_inputs, &mut _outs
                        );

                        _outs.map(|opt| opt.map(|b| b.into_shared()))
                    };
                )+
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };

    (@input_expr _) => { None };

    (@input_expr ($src:ident, $port:expr)) => {
        $src[$port].clone()
    };
}
