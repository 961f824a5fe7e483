use crate::domain::coset_generator;
use crate::key::VerificationKey;
use crate::public_inputs::compute_public_input_delta;
use crate::transcript::PlonkTranscript;
use ark_ff::PrimeField;
use ark_std::{collections::BTreeMap, One, Zero};
use ruc::*;

/// Rebuild the permutation share of the quotient evaluation T(z) from the
/// openings carried by the transcript and add it to `t_eval`.
///
/// With linearisation the prover sends width - 1 sigma openings plus an
/// opening of r(X); without it the verifier receives width sigma openings
/// and an opening of Z itself, and reconstructs the terms that would
/// otherwise live in r. Returns alpha^4.
pub fn compute_quotient_evaluation_contribution<F: PrimeField>(
    key: &VerificationKey<F>,
    alpha: &F,
    transcript: &PlonkTranscript<F>,
    t_eval: &mut F,
    use_linearisation: bool,
) -> Result<F> {
    let z_challenge = transcript.get_challenge("z", 0)?;
    let beta = transcript.get_challenge("beta", 0)?;
    let gamma = transcript.get_challenge("beta", 1)?;
    let alpha_squared = alpha.square();
    let alpha_cubed = alpha_squared * alpha;

    let width = key.program_width;
    let num_sigma_evaluations = if use_linearisation { width - 1 } else { width };
    let mut sigma_evaluations = Vec::with_capacity(num_sigma_evaluations);
    for i in 0..num_sigma_evaluations {
        sigma_evaluations.push(transcript.get_element(&format!("sigma_{}", i + 1))?);
    }
    let mut wire_evaluations = Vec::with_capacity(width);
    for i in 0..width {
        wire_evaluations.push(transcript.get_element(&format!("w_{}", i + 1))?);
    }
    let z_omega_evaluation = transcript.get_element("z_omega")?;

    let lagrange_evals = key.domain.lagrange_evaluations(&z_challenge);

    let public_inputs = transcript.get_element_vector("public_inputs")?;
    let public_input_delta =
        compute_public_input_delta(&public_inputs, &beta, &gamma, &key.domain.root).c(d!())?;

    // alpha * Z(z * root) * (w_last + gamma)
    //       * prod_{k < width - 1} (w_k + beta * sigma_k + gamma)
    let mut sigma_contribution = F::one();
    for i in 0..width - 1 {
        sigma_contribution *= sigma_evaluations[i] * beta + wire_evaluations[i] + gamma;
    }
    sigma_contribution *= wire_evaluations[width - 1] + gamma;
    sigma_contribution *= z_omega_evaluation;
    sigma_contribution *= alpha;

    let mut t1 = (z_omega_evaluation - public_input_delta) * lagrange_evals.l_end * alpha_squared;
    t1 -= lagrange_evals.l_1 * alpha_cubed;
    t1 -= sigma_contribution;
    if use_linearisation {
        t1 += transcript.get_element("r")?;
    }
    *t_eval += t1;

    if !use_linearisation {
        let z_evaluation = transcript.get_element("z")?;
        let z_beta = z_challenge * beta;

        let mut z_contribution = F::one();
        for (i, wire_evaluation) in wire_evaluations.iter().enumerate() {
            let coset_gen = if i == 0 {
                F::one()
            } else {
                coset_generator::<F>(i - 1)
            };
            z_contribution *= z_beta * coset_gen + wire_evaluation + gamma;
        }
        let z_multiplicand = z_contribution * alpha + lagrange_evals.l_1 * alpha_cubed;

        let mut sigma_last_contribution = F::one();
        for i in 0..width - 1 {
            sigma_last_contribution *=
                sigma_evaluations[i] * beta + wire_evaluations[i] + gamma;
        }
        sigma_last_contribution *= z_omega_evaluation;
        let sigma_last_multiplicand = -(sigma_last_contribution * alpha) * beta;

        *t_eval += z_multiplicand * z_evaluation;
        *t_eval += sigma_last_multiplicand * sigma_evaluations[width - 1];
    }

    Ok(alpha.square().square())
}

/// Accumulate this widget's scalar multipliers of the committed Z and last
/// sigma polynomials into the label-keyed scalar map of the final
/// multi-scalar multiplication. Only the linearised verifier path
/// contributes. Returns alpha_base * alpha^3.
pub fn append_scalar_multiplication_inputs<F: PrimeField>(
    key: &VerificationKey<F>,
    alpha_base: &F,
    transcript: &PlonkTranscript<F>,
    scalars: &mut BTreeMap<String, F>,
    use_linearisation: bool,
    idpolys: bool,
) -> Result<F> {
    let alpha_step = transcript.get_challenge("alpha", 0)?;
    let z_omega_evaluation = transcript.get_element("z_omega")?;
    let z_challenge = transcript.get_challenge("z", 0)?;
    let beta = transcript.get_challenge("beta", 0)?;
    let gamma = transcript.get_challenge("beta", 1)?;
    let width = key.program_width;

    if use_linearisation {
        let linear_nu = transcript.get_challenge_from_map("nu", "r")?;
        let alpha_cubed = *alpha_base * alpha_step.square();
        let l_1 = key.domain.lagrange_evaluations(&z_challenge).l_1;
        let z_beta = z_challenge * beta;

        let mut wire_evaluations = Vec::with_capacity(width);
        for i in 0..width {
            wire_evaluations.push(transcript.get_element(&format!("w_{}", i + 1))?);
        }

        let mut z_contribution = F::one();
        if !idpolys {
            for (i, wire_evaluation) in wire_evaluations.iter().enumerate() {
                let coset_gen = if i == 0 {
                    F::one()
                } else {
                    coset_generator::<F>(i - 1)
                };
                z_contribution *= z_beta * coset_gen + wire_evaluation + gamma;
            }
        } else {
            for (i, wire_evaluation) in wire_evaluations.iter().enumerate() {
                let id_evaluation = transcript.get_element(&format!("id_{}", i + 1))?;
                z_contribution *= id_evaluation * beta + wire_evaluation + gamma;
            }
        }
        let mut z_multiplicand = z_contribution * alpha_base + l_1 * alpha_cubed;
        z_multiplicand *= linear_nu;
        *scalars.entry(String::from("Z")).or_insert_with(F::zero) += z_multiplicand;

        let mut sigma_contribution = F::one();
        for i in 0..width - 1 {
            let permutation_evaluation = transcript.get_element(&format!("sigma_{}", i + 1))?;
            sigma_contribution *= permutation_evaluation * beta + wire_evaluations[i] + gamma;
        }
        sigma_contribution *= z_omega_evaluation;
        let mut sigma_last_multiplicand = -(sigma_contribution * alpha_base) * beta;
        sigma_last_multiplicand *= linear_nu;
        *scalars
            .entry(format!("SIGMA_{}", width))
            .or_insert_with(F::zero) += sigma_last_multiplicand;
    }

    Ok(*alpha_base * alpha_step.square() * alpha_step)
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_ff::Field;
    use ark_std::UniformRand;
    use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

    fn synthetic_transcript(width: usize, prng: &mut ChaChaRng) -> PlonkTranscript<Fr> {
        let mut transcript = PlonkTranscript::<Fr>::new(b"test");
        transcript.append_elements("public_inputs", &[]);
        transcript.insert_challenge("beta", Fr::rand(prng));
        transcript.insert_challenge("beta", Fr::rand(prng));
        transcript.insert_challenge("alpha", Fr::rand(prng));
        transcript.insert_challenge("z", Fr::rand(prng));
        transcript.insert_map_challenge("nu", "r", Fr::rand(prng));
        for i in 0..width {
            transcript.append_element(&format!("w_{}", i + 1), &Fr::rand(prng));
            transcript.append_element(&format!("sigma_{}", i + 1), &Fr::rand(prng));
        }
        transcript.append_element("z_omega", &Fr::rand(prng));
        transcript
    }

    #[test]
    fn test_scalar_accumulation_matches_manual_formula() {
        let width = 3;
        let mut prng = ChaChaRng::from_seed([9u8; 32]);
        let transcript = synthetic_transcript(width, &mut prng);
        let key = VerificationKey::<Fr>::new(16, width).unwrap();
        let alpha = transcript.get_challenge("alpha", 0).unwrap();

        let mut scalars = BTreeMap::new();
        let next_alpha = append_scalar_multiplication_inputs(
            &key,
            &alpha,
            &transcript,
            &mut scalars,
            true,
            false,
        )
        .unwrap();
        assert_eq!(next_alpha, alpha.square().square());

        let beta = transcript.get_challenge("beta", 0).unwrap();
        let gamma = transcript.get_challenge("beta", 1).unwrap();
        let z_challenge = transcript.get_challenge("z", 0).unwrap();
        let nu = transcript.get_challenge_from_map("nu", "r").unwrap();
        let l_1 = key.domain.lagrange_evaluations(&z_challenge).l_1;

        let mut z_scalar = Fr::one();
        for i in 0..width {
            let coset_gen = if i == 0 {
                Fr::one()
            } else {
                coset_generator::<Fr>(i - 1)
            };
            let w = transcript.get_element(&format!("w_{}", i + 1)).unwrap();
            z_scalar *= w + beta * coset_gen * z_challenge + gamma;
        }
        let expected_z = (z_scalar * alpha + l_1 * alpha.square() * alpha) * nu;
        assert_eq!(scalars["Z"], expected_z);

        let mut sigma_scalar = Fr::one();
        for i in 0..width - 1 {
            let w = transcript.get_element(&format!("w_{}", i + 1)).unwrap();
            let s = transcript.get_element(&format!("sigma_{}", i + 1)).unwrap();
            sigma_scalar *= w + beta * s + gamma;
        }
        sigma_scalar *= transcript.get_element("z_omega").unwrap();
        let expected_sigma = -(sigma_scalar * alpha * beta) * nu;
        assert_eq!(scalars[&format!("SIGMA_{}", width)], expected_sigma);
    }

    #[test]
    fn test_non_linearised_path_skips_scalar_accumulation() {
        let width = 2;
        let mut prng = ChaChaRng::from_seed([10u8; 32]);
        let transcript = synthetic_transcript(width, &mut prng);
        let key = VerificationKey::<Fr>::new(16, width).unwrap();
        let alpha = transcript.get_challenge("alpha", 0).unwrap();

        let mut scalars = BTreeMap::new();
        append_scalar_multiplication_inputs(&key, &alpha, &transcript, &mut scalars, false, false)
            .unwrap();
        assert!(scalars.is_empty());
    }
}
