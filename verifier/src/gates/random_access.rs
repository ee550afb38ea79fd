use crate::gates::{CircuitGate, EvaluationVarsExt, GOLDILOCKS_PHANTOM};
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// Reads `list[index]` from a list of `2^bits` wires, `num_copies` times per
/// row, and copies `num_extra_constants` constants into routed wires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomAccessGate {
    /// The number of bits of the index.
    pub bits: usize,
    /// The number of lookups of a row.
    pub num_copies: usize,
    /// The number of constants copied into wires.
    pub num_extra_constants: usize,
}

impl RandomAccessGate {
    fn vec_size(&self) -> usize {
        1 << self.bits
    }

    fn wire_access_index(&self, copy: usize) -> usize {
        (2 + self.vec_size()) * copy
    }

    fn wire_claimed_element(&self, copy: usize) -> usize {
        (2 + self.vec_size()) * copy + 1
    }

    fn wire_list_item(&self, i: usize, copy: usize) -> usize {
        (2 + self.vec_size()) * copy + 2 + i
    }

    fn start_extra_constants(&self) -> usize {
        (2 + self.vec_size()) * self.num_copies
    }

    fn wire_extra_constant(&self, i: usize) -> usize {
        self.start_extra_constants() + i
    }

    fn num_routed_wires(&self) -> usize {
        self.start_extra_constants() + self.num_extra_constants
    }

    fn wire_bit(&self, i: usize, copy: usize) -> usize {
        self.num_routed_wires() + copy * self.bits + i
    }
}

impl CircuitGate for RandomAccessGate {
    fn id(&self) -> String {
        format!(
            "RandomAccessGate {{ bits: {}, num_copies: {}, num_extra_constants: {}, _phantom: {} }}<D=2>",
            self.bits, self.num_copies, self.num_extra_constants, GOLDILOCKS_PHANTOM
        )
    }

    fn num_wires(&self) -> usize {
        self.num_routed_wires() + self.num_copies * self.bits
    }

    fn num_constants(&self) -> usize {
        self.num_extra_constants
    }

    fn num_constraints(&self) -> usize {
        (self.bits + 2) * self.num_copies + self.num_extra_constants
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let one = ExtVar::one(cs);
        let mut constraints = Vec::with_capacity(self.num_constraints());

        for copy in 0..self.num_copies {
            let access_index = vars.local_wires[self.wire_access_index(copy)];
            let claimed_element = vars.local_wires[self.wire_claimed_element(copy)];
            let bits = (0..self.bits)
                .map(|i| vars.local_wires[self.wire_bit(i, copy)])
                .collect::<Vec<_>>();
            let mut list_items = (0..self.vec_size())
                .map(|i| vars.local_wires[self.wire_list_item(i, copy)])
                .collect::<Vec<_>>();

            for b in bits.iter() {
                let b_minus_one = b.sub(cs, &one);
                constraints.push(b.mul(cs, &b_minus_one));
            }

            let two = one.add(cs, &one);
            let mut reconstructed_index = ExtVar::zero(cs);
            for b in bits.iter().rev() {
                reconstructed_index = reconstructed_index.mul_add(cs, &two, b);
            }
            constraints.push(reconstructed_index.sub(cs, &access_index));

            // fold the list pairwise, the least significant bit first
            for b in bits.iter() {
                list_items = list_items
                    .chunks(2)
                    .map(|pair| {
                        let diff = pair[1].sub(cs, &pair[0]);
                        b.mul_add(cs, &diff, &pair[0])
                    })
                    .collect();
            }
            constraints.push(list_items[0].sub(cs, &claimed_element));
        }

        for i in 0..self.num_extra_constants {
            let wire = vars.local_wires[self.wire_extra_constant(i)];
            constraints.push(vars.local_constants[i].sub(cs, &wire));
        }
        constraints
    }
}
