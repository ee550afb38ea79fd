use crate::errors::{PloverError, Result};
use crate::gates::{
    ArithmeticExtensionGate, ArithmeticGate, BaseSumGate, CircuitGate, ConstantGate,
    CosetInterpolationGate, ExponentiationGate, Gate, MulExtensionGate, NoopGate, PoseidonGate,
    PoseidonMdsGate, PublicInputGate, RandomAccessGate, ReducingExtensionGate, ReducingGate,
    GOLDILOCKS_PHANTOM,
};
use crate::parameters::MAX_ARITY_BITS;
use crate::structs::{
    CommonCircuitData, FriQueryRound, ProofWithPublicInputs, RawExt, RawGoldilocks,
    VerifierOnlyCircuitData,
};
use plover_algebra::goldilocks::GOLDILOCKS_MODULUS;
use plover_crypto::merkle_tree::{MerkleCap, MerkleProof};
use regex::{Captures, Regex};

type GateParser = fn(&Captures<'_>) -> Result<Gate>;

lazy_static! {
    static ref GATE_PARSERS: Vec<(Regex, GateParser)> = {
        let phantom = regex::escape(GOLDILOCKS_PHANTOM);
        let patterns: Vec<(String, GateParser)> = vec![
            (r"^ArithmeticGate \{ num_ops: (\d+) \}$".into(), |c| {
                Ok(Gate::Arithmetic(ArithmeticGate {
                    num_ops: positive(c, 1)?,
                }))
            }),
            (r"^ArithmeticExtensionGate \{ num_ops: (\d+) \}$".into(), |c| {
                Ok(Gate::ArithmeticExtension(ArithmeticExtensionGate {
                    num_ops: positive(c, 1)?,
                }))
            }),
            (r"^BaseSumGate \{ num_limbs: (\d+) \} \+ Base: (\d+)$".into(), |c| {
                let base = number(c, 2)?;
                if base < 2 {
                    return Err(PloverError::Deserialization(format!(
                        "BaseSumGate base {} is below 2",
                        base
                    )));
                }
                Ok(Gate::BaseSum(BaseSumGate {
                    num_limbs: positive(c, 1)?,
                    base,
                }))
            }),
            (r"^ConstantGate \{ num_consts: (\d+) \}$".into(), |c| {
                Ok(Gate::Constant(ConstantGate {
                    num_consts: positive(c, 1)?,
                }))
            }),
            (
                format!(
                    r"^CosetInterpolationGate \{{ subgroup_bits: (\d+), degree: (\d+), barycentric_weights: \[([\d, ]*)\], _phantom: {} \}}<D=2>$",
                    phantom
                ),
                parse_coset_interpolation,
            ),
            (
                format!(
                    r"^ExponentiationGate \{{ num_power_bits: (\d+), _phantom: {} \}}<D=2>$",
                    phantom
                ),
                |c| {
                    Ok(Gate::Exponentiation(ExponentiationGate {
                        num_power_bits: positive(c, 1)?,
                    }))
                },
            ),
            (r"^MulExtensionGate \{ num_ops: (\d+) \}$".into(), |c| {
                Ok(Gate::MulExtension(MulExtensionGate {
                    num_ops: positive(c, 1)?,
                }))
            }),
            (r"^NoopGate$".into(), |_| Ok(Gate::Noop(NoopGate))),
            (
                format!(r"^PoseidonGate\({}\)<WIDTH=12>$", phantom),
                |_| Ok(Gate::Poseidon(PoseidonGate)),
            ),
            (
                format!(r"^PoseidonMdsGate\({}\)<WIDTH=12>$", phantom),
                |_| Ok(Gate::PoseidonMds(PoseidonMdsGate)),
            ),
            (r"^PublicInputGate$".into(), |_| {
                Ok(Gate::PublicInput(PublicInputGate))
            }),
            (
                format!(
                    r"^RandomAccessGate \{{ bits: (\d+), num_copies: (\d+), num_extra_constants: (\d+), _phantom: {} \}}<D=2>$",
                    phantom
                ),
                |c| {
                    Ok(Gate::RandomAccess(RandomAccessGate {
                        bits: number(c, 1)?,
                        num_copies: positive(c, 2)?,
                        num_extra_constants: number(c, 3)?,
                    }))
                },
            ),
            (r"^ReducingExtensionGate \{ num_coeffs: (\d+) \}$".into(), |c| {
                Ok(Gate::ReducingExtension(ReducingExtensionGate {
                    num_coeffs: positive(c, 1)?,
                }))
            }),
            (r"^ReducingGate \{ num_coeffs: (\d+) \}$".into(), |c| {
                Ok(Gate::Reducing(ReducingGate {
                    num_coeffs: positive(c, 1)?,
                }))
            }),
        ];
        patterns
            .into_iter()
            .map(|(pattern, parser)| (Regex::new(&pattern).unwrap(), parser))
            .collect()
    };
}

fn number(captures: &Captures<'_>, group: usize) -> Result<usize> {
    let text = captures.get(group).map(|m| m.as_str()).unwrap_or_default();
    text.parse::<usize>()
        .map_err(|e| PloverError::Deserialization(format!("gate parameter {}: {}", text, e)))
}

fn positive(captures: &Captures<'_>, group: usize) -> Result<usize> {
    match number(captures, group)? {
        0 => Err(PloverError::Deserialization(format!(
            "gate parameter must be positive in {}",
            captures.get(0).map(|m| m.as_str()).unwrap_or_default()
        ))),
        n => Ok(n),
    }
}

fn parse_coset_interpolation(captures: &Captures<'_>) -> Result<Gate> {
    let subgroup_bits = positive(captures, 1)?;
    let degree = number(captures, 2)?;
    let weights = captures.get(3).map(|m| m.as_str()).unwrap_or_default();
    let barycentric_weights = weights
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.parse::<u64>()
                .map_err(|e| PloverError::Deserialization(format!("weight {}: {}", w, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let num_points = 1usize << subgroup_bits;
    if degree < 2 || degree > num_points {
        return Err(PloverError::Deserialization(format!(
            "CosetInterpolationGate degree {} out of range for {} points",
            degree, num_points
        )));
    }
    if barycentric_weights != CosetInterpolationGate::compute_barycentric_weights(subgroup_bits) {
        return Err(PloverError::Deserialization(
            "CosetInterpolationGate barycentric weights do not match its subgroup".into(),
        ));
    }
    Ok(Gate::CosetInterpolation(CosetInterpolationGate {
        subgroup_bits,
        degree,
        barycentric_weights,
    }))
}

/// Parse a gate from the id plonky2 serializes it as.
pub fn parse_gate_id(id: &str) -> Result<Gate> {
    GATE_PARSERS
        .iter()
        .find_map(|(regex, parser)| regex.captures(id).map(|c| parser(&c)))
        .unwrap_or_else(|| Err(PloverError::UnsupportedGate(id.to_string())))
}

/// Read a proof with its public inputs.
pub fn deserialize_proof(json: &str) -> Result<ProofWithPublicInputs> {
    Ok(serde_json::from_str(json)?)
}

/// Read the verifier-only circuit data.
pub fn deserialize_verifier_only(json: &str) -> Result<VerifierOnlyCircuitData> {
    Ok(serde_json::from_str(json)?)
}

/// Read the common circuit data and check it describes a circuit the
/// verifier supports.
pub fn deserialize_common(json: &str) -> Result<CommonCircuitData> {
    let common: CommonCircuitData = serde_json::from_str(json)?;
    validate_common_data(&common)?;
    Ok(common)
}

fn shape_error(what: &str, expected: usize, found: usize) -> PloverError {
    PloverError::Deserialization(format!(
        "{}: expected {} entries, found {}",
        what, expected, found
    ))
}

fn check_len(what: &str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(shape_error(what, expected, found));
    }
    Ok(())
}

fn check_canonical(what: &str, values: &[RawGoldilocks]) -> Result<()> {
    match values.iter().find(|v| **v >= GOLDILOCKS_MODULUS) {
        Some(v) => Err(PloverError::Deserialization(format!(
            "{}: {} is not a canonical Goldilocks element",
            what, v
        ))),
        None => Ok(()),
    }
}

fn check_canonical_ext(what: &str, values: &[RawExt]) -> Result<()> {
    for v in values {
        check_canonical(what, v)?;
    }
    Ok(())
}

fn check_cap(what: &str, cap: &MerkleCap, cap_height: usize) -> Result<()> {
    check_len(what, 1 << cap_height, cap.len())
}

fn check_path(what: &str, proof: &MerkleProof, height: usize) -> Result<()> {
    check_len(what, height, proof.siblings.len())
}

/// Check that the common data describes a circuit the verifier supports.
pub fn validate_common_data(common: &CommonCircuitData) -> Result<()> {
    if common.num_lookup_polys != 0 || common.num_lookup_selectors != 0 || !common.luts.is_empty() {
        return Err(PloverError::UnsupportedLookups);
    }

    let params = &common.fri_params;
    if params.degree_bits == 0 {
        return Err(PloverError::Deserialization("degree_bits is 0".into()));
    }
    if let Some(bits) = params
        .reduction_arity_bits
        .iter()
        .find(|b| **b == 0 || **b > MAX_ARITY_BITS)
    {
        return Err(PloverError::Deserialization(format!(
            "FRI arity of {} bits is not supported",
            bits
        )));
    }
    let total_arity_bits: usize = params.reduction_arity_bits.iter().sum();
    if total_arity_bits + params.config.cap_height > common.lde_bits() {
        return Err(PloverError::Deserialization(
            "FRI reductions go below the cap height".into(),
        ));
    }
    if common.quotient_degree_factor == 0 {
        return Err(PloverError::Deserialization("quotient_degree_factor is 0".into()));
    }

    check_len("gate selectors", common.gates.len(), common.selectors_info.selector_indices.len())?;
    if let Some(i) = common
        .selectors_info
        .selector_indices
        .iter()
        .find(|i| **i >= common.num_selectors())
    {
        return Err(PloverError::Deserialization(format!(
            "selector index {} has no group",
            i
        )));
    }
    for (row, &group) in common.selectors_info.selector_indices.iter().enumerate() {
        if !common.selectors_info.groups[group].contains(&row) {
            return Err(PloverError::Deserialization(format!(
                "gate {} lies outside its selector group",
                row
            )));
        }
    }
    if common.num_selectors() > common.num_constants {
        return Err(PloverError::Deserialization(
            "more selector columns than constants".into(),
        ));
    }

    let gate_constants = common.num_constants - common.num_selectors();
    for gate in common.gates.iter() {
        if gate.num_wires() > common.config.num_wires
            || gate.num_constants() > gate_constants
            || gate.num_constraints() > common.num_gate_constraints
        {
            return Err(PloverError::Deserialization(format!(
                "{} does not fit the circuit configuration",
                gate.id()
            )));
        }
    }

    if common.config.num_routed_wires > common.config.num_wires {
        return Err(PloverError::Deserialization(
            "more routed wires than wires".into(),
        ));
    }
    if common.k_is.len() < common.config.num_routed_wires {
        return Err(shape_error("k_is", common.config.num_routed_wires, common.k_is.len()));
    }
    check_canonical("k_is", &common.k_is)?;
    check_len(
        "num_partial_products",
        common.config.num_routed_wires.div_ceil(common.quotient_degree_factor) - 1,
        common.num_partial_products,
    )?;
    Ok(())
}

fn validate_query_round(
    round: &FriQueryRound,
    common: &CommonCircuitData,
) -> Result<()> {
    let cap_height = common.fri_params.config.cap_height;
    let evals_proofs = &round.initial_trees_proof.evals_proofs;
    check_len("initial tree proofs", common.oracle_sizes().len(), evals_proofs.len())?;
    for (oracle, (leaf, proof)) in evals_proofs.iter().enumerate() {
        check_len("initial tree leaf", common.leaf_len(oracle), leaf.len())?;
        check_canonical("initial tree leaf", leaf)?;
        check_path("initial tree path", proof, common.lde_bits() - cap_height)?;
    }

    let arity_bits = &common.fri_params.reduction_arity_bits;
    check_len("query steps", arity_bits.len(), round.steps.len())?;
    let mut height = common.lde_bits();
    for (step, bits) in round.steps.iter().zip(arity_bits.iter()) {
        height -= bits;
        check_len("step evaluations", 1 << bits, step.evals.len())?;
        check_canonical_ext("step evaluations", &step.evals)?;
        check_path("step path", &step.merkle_proof, height - cap_height)?;
    }
    Ok(())
}

/// Check that a proof and the verifier-only data have the shape the common
/// data prescribes. The number of query rounds is left to the FRI verifier.
pub fn validate_proof_shape(
    proof: &ProofWithPublicInputs,
    verifier_only: &VerifierOnlyCircuitData,
    common: &CommonCircuitData,
) -> Result<()> {
    let cap_height = common.fri_params.config.cap_height;
    let num_challenges = common.num_challenges();

    check_cap("constants_sigmas_cap", &verifier_only.constants_sigmas_cap, cap_height)?;
    check_len("public inputs", common.num_public_inputs, proof.public_inputs.len())?;
    check_canonical("public inputs", &proof.public_inputs)?;

    let proof = &proof.proof;
    check_cap("wires_cap", &proof.wires_cap, cap_height)?;
    check_cap("plonk_zs_partial_products_cap", &proof.plonk_zs_partial_products_cap, cap_height)?;
    check_cap("quotient_polys_cap", &proof.quotient_polys_cap, cap_height)?;

    let openings = &proof.openings;
    if !openings.lookup_zs.is_empty() || !openings.lookup_zs_next.is_empty() {
        return Err(PloverError::UnsupportedLookups);
    }
    for (what, expected, values) in [
        ("constants", common.num_constants, &openings.constants),
        ("plonk_sigmas", common.config.num_routed_wires, &openings.plonk_sigmas),
        ("wires", common.config.num_wires, &openings.wires),
        ("plonk_zs", num_challenges, &openings.plonk_zs),
        ("plonk_zs_next", num_challenges, &openings.plonk_zs_next),
        (
            "partial_products",
            num_challenges * common.num_partial_products,
            &openings.partial_products,
        ),
        ("quotient_polys", common.num_quotient_polys(), &openings.quotient_polys),
    ] {
        check_len(what, expected, values.len())?;
        check_canonical_ext(what, values)?;
    }

    let fri = &proof.opening_proof;
    check_len(
        "commit_phase_merkle_caps",
        common.fri_params.reduction_arity_bits.len(),
        fri.commit_phase_merkle_caps.len(),
    )?;
    for cap in fri.commit_phase_merkle_caps.iter() {
        check_cap("commit phase cap", cap, cap_height)?;
    }
    check_len("final_poly", common.final_poly_len(), fri.final_poly.coeffs.len())?;
    check_canonical_ext("final_poly", &fri.final_poly.coeffs)?;
    check_canonical("pow_witness", &[fri.pow_witness])?;
    for round in fri.query_round_proofs.iter() {
        validate_query_round(round, common)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::parse_gate_id;
    use crate::errors::PloverError;
    use crate::gates::{ArithmeticGate, BaseSumGate, CircuitGate, Gate, PoseidonGate};

    #[test]
    fn test_parse_gate_ids() {
        let gates = [
            Gate::Arithmetic(ArithmeticGate { num_ops: 20 }),
            Gate::BaseSum(BaseSumGate {
                num_limbs: 63,
                base: 2,
            }),
            Gate::Poseidon(PoseidonGate),
        ];
        for gate in gates {
            assert_eq!(parse_gate_id(&gate.id()).unwrap(), gate);
        }
    }

    #[test]
    fn test_reject_gate_ids() {
        let unknown = "LookupGate { num_slots: 4 }";
        assert_eq!(
            parse_gate_id(unknown),
            Err(PloverError::UnsupportedGate(unknown.to_string()))
        );
        assert!(matches!(
            parse_gate_id("ArithmeticGate { num_ops: 0 }"),
            Err(PloverError::Deserialization(_))
        ));
        assert!(matches!(
            parse_gate_id("BaseSumGate { num_limbs: 4 } + Base: 1"),
            Err(PloverError::Deserialization(_))
        ));
        assert!(parse_gate_id("ArithmeticGate { num_ops: 20 } ").is_err());
    }
}
