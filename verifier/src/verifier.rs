use crate::challenger::get_challenges;
use crate::deserializer::{
    deserialize_common, deserialize_proof, deserialize_verifier_only, validate_common_data,
    validate_proof_shape,
};
use crate::errors::{PloverError, Result};
use crate::fri::verify_fri_proof;
use crate::plonk::verify_plonk_identity;
use crate::structs::{CommonCircuitData, ProofWithPublicInputs, VerifierOnlyCircuitData};
use crate::vars::{ProofWithPublicInputsVar, VerifierCS, VerifierOnlyCircuitDataVar};
use ark_std::{end_timer, start_timer};
use plover_algebra::bn254::BN254Scalar;

/// Constrain `proof` to be a valid proof of the circuit described by
/// `verifier_only` and `common`. Nothing is returned: an invalid proof makes
/// the constraint system unsatisfiable.
///
/// Panics if the proof does not have the shape `common` prescribes; use
/// [`validate_proof_shape`] first on untrusted data.
pub fn verify(
    cs: &mut VerifierCS,
    proof: &ProofWithPublicInputsVar,
    verifier_only: &VerifierOnlyCircuitDataVar,
    common: &CommonCircuitData,
) {
    let timer = start_timer!(|| "Fiat-Shamir transcript");
    let size = cs.size;
    let public_inputs_hash = cs.poseidon_goldilocks_hash_no_pad(&proof.public_inputs);
    let challenges = get_challenges(
        cs,
        proof,
        &public_inputs_hash,
        &verifier_only.circuit_digest,
        common,
    );
    end_timer!(timer, || format!("{} gates", cs.size - size));

    let timer = start_timer!(|| "Plonk identity");
    let size = cs.size;
    let inner = &proof.proof;
    verify_plonk_identity(
        cs,
        common,
        &inner.openings,
        &challenges,
        &public_inputs_hash,
    );
    end_timer!(timer, || format!("{} gates", cs.size - size));

    let timer = start_timer!(|| "FRI");
    let size = cs.size;
    verify_fri_proof(
        cs,
        common,
        &inner.openings,
        &challenges.plonk_zeta,
        &challenges.fri_challenges,
        &[
            &verifier_only.constants_sigmas_cap,
            &inner.wires_cap,
            &inner.plonk_zs_partial_products_cap,
            &inner.quotient_polys_cap,
        ],
        &inner.opening_proof,
    );
    end_timer!(timer, || format!("{} gates", cs.size - size));
}

/// Build the constraint system verifying `proof`, with its witness filled
/// in. The public inputs of the proof are the public inputs of the system.
pub fn build_verifier_circuit(
    proof: &ProofWithPublicInputs,
    verifier_only: &VerifierOnlyCircuitData,
    common: &CommonCircuitData,
) -> Result<VerifierCS> {
    validate_common_data(common)?;
    validate_proof_shape(proof, verifier_only, common)?;

    let mut cs = VerifierCS::new();
    let timer = start_timer!(|| "Allocate the proof");
    let proof_var = ProofWithPublicInputsVar::alloc(&mut cs, proof)?;
    let verifier_only_var = VerifierOnlyCircuitDataVar::alloc_constant(&mut cs, verifier_only);
    end_timer!(timer, || format!("{} variables", cs.num_vars));

    verify(&mut cs, &proof_var, &verifier_only_var, common);
    Ok(cs)
}

/// Build the verifier circuit of `proof` and check its witness.
pub fn verify_proof(
    proof: &ProofWithPublicInputs,
    verifier_only: &VerifierOnlyCircuitData,
    common: &CommonCircuitData,
) -> Result<()> {
    let mut cs = build_verifier_circuit(proof, verifier_only, common)?;
    let online_inputs = proof
        .public_inputs
        .iter()
        .map(|v| BN254Scalar::from(*v))
        .collect::<Vec<_>>();

    let timer = start_timer!(|| format!("Check the witness of {} gates", cs.size));
    let witness = cs.get_and_clear_witness();
    let res = cs
        .verify_witness(&witness, &online_inputs)
        .map_err(|_| PloverError::VerificationError);
    end_timer!(timer);
    res
}

/// [`verify_proof`] on the JSON documents plonky2 serializes.
pub fn verify_proof_json(
    proof_json: &str,
    verifier_only_json: &str,
    common_json: &str,
) -> Result<()> {
    let timer = start_timer!(|| "Deserialize");
    let proof = deserialize_proof(proof_json)?;
    let verifier_only = deserialize_verifier_only(verifier_only_json)?;
    let common = deserialize_common(common_json)?;
    end_timer!(timer);

    verify_proof(&proof, &verifier_only, &common)
}
