use crate::domain::coset_generator;
use crate::errors::PlonkError;
use crate::key::ProvingKey;
use crate::public_inputs::compute_public_input_delta;
use crate::transcript::PlonkTranscript;
use crate::work_queue::{WorkItem, WorkQueue, WorkType};
use ark_ff::PrimeField;
use ark_std::{end_timer, start_timer, One, Zero};
use rayon::prelude::*;
use ruc::*;

/// The round in which the grand-product commitment is produced.
const GRAND_PRODUCT_ROUND: usize = 3;

/// Build the grand-product polynomial Z(X), leave its coefficients in `z`,
/// and enqueue the `Commit("Z")` and `Fft("z")` work items. Rounds other
/// than round 3 are no-ops.
///
/// Z is defined by Z(root^0) = 1 and
///
/// Z(root^{i+1}) = Z(root^i)
///     * prod_k (w_k(root^i) + beta * id_k(root^i) + gamma)
///     / prod_k (w_k(root^i) + beta * sigma_k(root^i) + gamma)
///
/// with id_k(X) = coset_generator(k - 1) * X when the identity polynomials
/// are implicit.
pub fn compute_round_commitments<F: PrimeField>(
    key: &mut ProvingKey<F>,
    transcript: &PlonkTranscript<F>,
    round_number: usize,
    queue: &mut WorkQueue<F>,
) -> Result<()> {
    if round_number != GRAND_PRODUCT_ROUND {
        return Ok(());
    }

    let beta = transcript.get_challenge("beta", 0)?;
    let gamma = transcript.get_challenge("beta", 1)?;
    compute_grand_product(key, &beta, &gamma).c(d!())?;

    let n = key.small_domain.size;
    key.z[0] = F::one();
    let coeffs = key.small_domain.ifft(&key.z[..n]);
    key.z[..n].copy_from_slice(&coeffs);

    queue.add_to_queue(WorkItem {
        work_type: WorkType::Commit,
        label: String::from("Z"),
        scalar: F::zero(),
        index: 0,
    });
    queue.add_to_queue(WorkItem {
        work_type: WorkType::Fft,
        label: String::from("z"),
        scalar: F::zero(),
        index: 0,
    });
    Ok(())
}

/// Fill `z[0..n]` with the evaluations of Z over the small domain.
///
/// Three phases run inside one fork-join region, with a barrier between
/// phases. Phase A fills the 2 * width factor columns, partitioned by rows.
/// Phase B turns each column into its prefix product, partitioned by
/// columns. Phase C folds the width numerator columns into column 0 and the
/// width denominator columns into column `width`, then divides point-wise
/// with a fused Montgomery batch inversion, partitioned by rows; the last
/// thread stops one row short so the wrap slot is never written.
fn compute_grand_product<F: PrimeField>(key: &mut ProvingKey<F>, beta: &F, gamma: &F) -> Result<()> {
    let width = key.program_width;
    let idpolys = key.idpolys;
    let n = key.small_domain.size;
    let num_threads = key.small_domain.num_threads;
    let thread_size = key.small_domain.thread_size;
    let root = key.small_domain.root;
    let beta = *beta;
    let gamma = *gamma;

    for i in 0..width {
        if key.wire_lagrange[i].len() != n || key.sigma_lagrange[i].len() != n {
            return Err(eg!(PlonkError::FuncParamsError));
        }
        if idpolys && key.id_lagrange[i].len() != n {
            return Err(eg!(PlonkError::FuncParamsError));
        }
    }

    // Column 2 doubles as the inversion buffer at width 1, so three columns
    // are carved rather than two.
    let num_columns = if width == 1 { 3 } else { 2 * width };
    let inversion_index = if width == 1 { 2 } else { 2 * width - 1 };
    // The fixed scratch buffers provide twelve columns; wider circuits fall
    // back to allocation, freed again when this function returns.
    let mut extra: Vec<Vec<F>> = (12..num_columns).map(|_| vec![F::zero(); n]).collect();

    let timer = start_timer!(|| "compute permutation grand product");

    let ProvingKey {
        z,
        z_fft,
        opening_poly,
        shifted_opening_poly,
        quotient_large,
        linear_poly,
        wire_lagrange,
        sigma_lagrange,
        id_lagrange,
        ..
    } = key;
    let wires: Vec<&[F]> = wire_lagrange.iter().map(|w| w.as_slice()).collect();
    let sigmas: Vec<&[F]> = sigma_lagrange.iter().map(|s| s.as_slice()).collect();
    let ids: Vec<&[F]> = id_lagrange.iter().map(|id| id.as_slice()).collect();
    let coset_gens: Vec<F> = (1..width).map(|k| coset_generator::<F>(k - 1)).collect();

    // Phase A: numerator factors in columns [0, width), denominator factors
    // in columns [width, 2 * width). Each thread seeds root^start * beta
    // once and steps by root.
    {
        let columns = accumulator_columns(
            2 * width,
            n,
            z,
            z_fft,
            opening_poly,
            shifted_opening_poly,
            quotient_large,
            linear_poly,
            &mut extra,
        );
        let bundles = partition_rows(columns, num_threads, thread_size);
        bundles.into_par_iter().enumerate().for_each(|(j, mut bundle)| {
            let start = j * thread_size;
            let mut cur_root_times_beta = root.pow([start as u64]) * beta;
            for i in 0..thread_size {
                let row = start + i;
                let mut wire_plus_gamma = gamma + wires[0][row];
                bundle[0][i] = if idpolys {
                    ids[0][row] * beta + wire_plus_gamma
                } else {
                    wire_plus_gamma + cur_root_times_beta
                };
                bundle[width][i] = sigmas[0][row] * beta + wire_plus_gamma;

                for k in 1..width {
                    wire_plus_gamma = gamma + wires[k][row];
                    let t0 = if idpolys {
                        ids[k][row] * beta
                    } else {
                        coset_gens[k - 1] * cur_root_times_beta
                    };
                    bundle[k][i] = t0 + wire_plus_gamma;
                    bundle[width + k][i] = sigmas[k][row] * beta + wire_plus_gamma;
                }
                if !idpolys {
                    cur_root_times_beta *= root;
                }
            }
        });
    }

    // Phase B: prefix products. 2 * width serial scans, one per column.
    {
        let columns = accumulator_columns(
            2 * width,
            n,
            z,
            z_fft,
            opening_poly,
            shifted_opening_poly,
            quotient_large,
            linear_poly,
            &mut extra,
        );
        columns.into_par_iter().for_each(|column| {
            for j in 0..n - 1 {
                let t0 = column[j];
                column[j + 1] *= t0;
            }
        });
    }

    // Phase C: fold and batch-divide. Column 0 ends up holding
    // Z(root^{i+1}) at local row i, which is why it overlays z[1..].
    {
        let columns = accumulator_columns(
            num_columns,
            n,
            z,
            z_fft,
            opening_poly,
            shifted_opening_poly,
            quotient_large,
            linear_poly,
            &mut extra,
        );
        let bundles = partition_rows(columns, num_threads, thread_size);
        bundles.into_par_iter().enumerate().for_each(|(j, mut bundle)| {
            let rows = if j == num_threads - 1 {
                thread_size - 1
            } else {
                thread_size
            };
            let mut inversion_accumulator = F::one();
            for i in 0..rows {
                for k in 1..width {
                    let t0 = bundle[k][i];
                    bundle[0][i] *= t0;
                    let t0 = bundle[width + k][i];
                    bundle[width][i] *= t0;
                }
                let t0 = bundle[0][i] * inversion_accumulator;
                bundle[inversion_index][i] = t0;
                inversion_accumulator *= bundle[width][i];
            }
            inversion_accumulator = inversion_accumulator.inverse().unwrap();
            for i in (0..rows).rev() {
                // full reduction of z[i + 1] is deferred to the inverse FFT
                let t0 = inversion_accumulator * bundle[inversion_index][i];
                bundle[0][i] = t0;
                inversion_accumulator *= bundle[width][i];
            }
        });
    }

    end_timer!(timer);
    Ok(())
}

/// Add the permutation terms of the quotient polynomial, point-wise over the
/// large domain, into `quotient_large`:
///
/// T(X) = (Z(X) * prod_k (w_k(X) + beta * id_k(X) + gamma)
///         + (Z(X * root) - delta) * alpha_base * L_end(X)
///         + (Z(X) - 1) * alpha_base^2 * L_1(X)
///         - Z(X * root) * prod_k (w_k(X) + beta * sigma_k(X) + gamma))
///        * alpha_base
///
/// `z_fft` must hold the unscaled coset FFT of Z. On the 4x oversampled
/// domain the shift by `root` is an index shift of 4, and the L_end kernel
/// is the L_1 coset FFT shifted by 8. The wrap check against delta is kept
/// for verifier compatibility even though the reduction to a single Z(X)
/// makes it redundant. Returns alpha_base^4.
pub fn compute_quotient_contribution<F: PrimeField>(
    key: &mut ProvingKey<F>,
    alpha_base: &F,
    transcript: &PlonkTranscript<F>,
) -> Result<F> {
    let beta = transcript.get_challenge("beta", 0)?;
    let gamma = transcript.get_challenge("beta", 1)?;
    let public_inputs = transcript.get_element_vector("public_inputs")?;
    let public_input_delta =
        compute_public_input_delta(&public_inputs, &beta, &gamma, &key.small_domain.root).c(d!())?;

    let width = key.program_width;
    let idpolys = key.idpolys;
    let large_n = key.large_domain.size;
    let block_mask = large_n - 1;
    let thread_size = key.large_domain.thread_size;
    let alpha_base = *alpha_base;
    let alpha_squared = alpha_base.square();
    let coset_gens: Vec<F> = (1..width).map(|k| coset_generator::<F>(k - 1)).collect();

    for i in 0..width {
        if key.wire_ffts[i].len() != large_n || key.sigma_ffts[i].len() != large_n {
            return Err(eg!(PlonkError::FuncParamsError));
        }
        if idpolys && key.id_ffts[i].len() != large_n {
            return Err(eg!(PlonkError::FuncParamsError));
        }
    }

    let timer = start_timer!(|| "compute permutation quotient contribution");

    let ProvingKey {
        quotient_large,
        z_fft,
        wire_ffts,
        sigma_ffts,
        id_ffts,
        lagrange_1,
        small_domain,
        large_domain,
        ..
    } = key;
    let wires: Vec<&[F]> = wire_ffts.iter().map(|w| w.as_slice()).collect();
    let sigmas: Vec<&[F]> = sigma_ffts.iter().map(|s| s.as_slice()).collect();
    let ids: Vec<&[F]> = id_ffts.iter().map(|id| id.as_slice()).collect();
    let z_fft = &z_fft[..];
    let lagrange_1 = &lagrange_1[..];
    let large_root = large_domain.root;
    let generator = small_domain.generator;

    quotient_large[..large_n]
        .par_chunks_mut(thread_size)
        .enumerate()
        .for_each(|(j, chunk)| {
            let start = j * thread_size;
            let mut cur_root_times_beta = large_root.pow([start as u64]) * generator * beta;
            for (offset, out) in chunk.iter_mut().enumerate() {
                let i = start + offset;
                let mut wire_plus_gamma = gamma + wires[0][i];

                let mut numerator = if idpolys {
                    ids[0][i] * beta + wire_plus_gamma
                } else {
                    cur_root_times_beta + wire_plus_gamma
                };
                let mut denominator = sigmas[0][i] * beta + wire_plus_gamma;

                for k in 1..width {
                    wire_plus_gamma = gamma + wires[k][i];
                    let t0 = if idpolys {
                        ids[k][i] * beta
                    } else {
                        coset_gens[k - 1] * cur_root_times_beta
                    };
                    numerator *= t0 + wire_plus_gamma;
                    denominator *= sigmas[k][i] * beta + wire_plus_gamma;
                }

                numerator *= z_fft[i];
                denominator *= z_fft[(i + 4) & block_mask];

                // wrap check: (Z(X * root) - delta) * alpha_base * L_end(X)
                let mut t0 = z_fft[(i + 4) & block_mask] - public_input_delta;
                t0 *= alpha_base;
                t0 *= lagrange_1[(i + 8) & block_mask];
                numerator += t0;

                // start check: (Z(X) - 1) * alpha_base^2 * L_1(X)
                let mut t0 = z_fft[i] - F::one();
                t0 *= alpha_squared;
                t0 *= lagrange_1[i];
                numerator += t0;

                *out = (numerator - denominator) * alpha_base;
                cur_root_times_beta *= large_root;
            }
        });

    end_timer!(timer);
    Ok(alpha_base.square().square())
}

/// Compute the prover's linearisation contribution over the small domain:
///
/// r(X) = Z(X) * (alpha * prod_k (w_k(z) + beta * id_k(z) + gamma)
///                + alpha^3 * L_1(z))
///      - sigma_width(X) * alpha * beta * Z(z * root)
///        * prod_{k < width - 1} (w_k(z) + beta * sigma_k(z) + gamma)
///
/// The last permutation selector is consumed in coefficient form; its
/// opening is implicit in r. Returns alpha^4.
pub fn compute_linear_contribution<F: PrimeField>(
    key: &ProvingKey<F>,
    alpha: &F,
    transcript: &PlonkTranscript<F>,
    r: &mut [F],
) -> Result<F> {
    let width = key.program_width;
    let n = key.small_domain.size;
    if r.len() != n || key.sigma_coeffs[width - 1].len() != n {
        return Err(eg!(PlonkError::FuncParamsError));
    }

    let z_challenge = transcript.get_challenge("z", 0)?;
    let beta = transcript.get_challenge("beta", 0)?;
    let gamma = transcript.get_challenge("beta", 1)?;
    let lagrange_evals = key.small_domain.lagrange_evaluations(&z_challenge);
    let alpha_cubed = alpha.square() * alpha;
    let z_beta = z_challenge * beta;

    let mut wire_evaluations = Vec::with_capacity(width);
    for i in 0..width {
        wire_evaluations.push(transcript.get_element(&format!("w_{}", i + 1))?);
    }
    let z_omega_evaluation = transcript.get_element("z_omega")?;

    let mut z_contribution = F::one();
    if !key.idpolys {
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
    let z_multiplicand = z_contribution * alpha + lagrange_evals.l_1 * alpha_cubed;

    let mut sigma_contribution = F::one();
    for i in 0..width - 1 {
        let permutation_evaluation = transcript.get_element(&format!("sigma_{}", i + 1))?;
        sigma_contribution *= permutation_evaluation * beta + wire_evaluations[i] + gamma;
    }
    sigma_contribution *= z_omega_evaluation;
    let sigma_last_multiplicand = -(sigma_contribution * alpha) * beta;

    let z_coefficients = &key.z[..n];
    let sigma_last = &key.sigma_coeffs[width - 1][..];
    r.par_iter_mut().enumerate().for_each(|(i, r_i)| {
        *r_i = z_coefficients[i] * z_multiplicand + sigma_last[i] * sigma_last_multiplicand;
    });

    Ok(alpha.square().square())
}

/// Carve the grand-product accumulator columns out of the scratch buffers,
/// in the fixed overlay order. The first twelve columns cost no memory:
///
/// 0: z[1..]          1-4: z_fft quarters    5: opening_poly
/// 6: shifted_opening_poly                   7: quotient_large[0..n]
/// 8: linear_poly     9-11: remaining quotient_large quarters
///
/// Columns past eleven come from `extra`.
#[allow(clippy::too_many_arguments)]
fn accumulator_columns<'a, F: PrimeField>(
    num_columns: usize,
    n: usize,
    z: &'a mut [F],
    z_fft: &'a mut [F],
    opening_poly: &'a mut [F],
    shifted_opening_poly: &'a mut [F],
    quotient_large: &'a mut [F],
    linear_poly: &'a mut [F],
    extra: &'a mut [Vec<F>],
) -> Vec<&'a mut [F]> {
    let mut columns: Vec<&'a mut [F]> = Vec::with_capacity(num_columns);
    columns.push(&mut z[1..n + 1]);
    columns.extend(z_fft[..4 * n].chunks_exact_mut(n));
    columns.push(&mut opening_poly[..n]);
    columns.push(&mut shifted_opening_poly[..n]);
    let (first_quarter, upper_quarters) = quotient_large[..4 * n].split_at_mut(n);
    columns.push(first_quarter);
    columns.push(&mut linear_poly[..n]);
    columns.extend(upper_quarters.chunks_exact_mut(n));
    columns.extend(extra.iter_mut().map(|column| column.as_mut_slice()));
    columns.truncate(num_columns);
    columns
}

/// Re-slice every column into per-thread row ranges, so each rayon task owns
/// a disjoint range of every column. Bundle j holds rows
/// [j * thread_size, (j + 1) * thread_size) of each column.
fn partition_rows<'a, F>(
    columns: Vec<&'a mut [F]>,
    num_threads: usize,
    thread_size: usize,
) -> Vec<Vec<&'a mut [F]>> {
    let mut bundles: Vec<Vec<&'a mut [F]>> = (0..num_threads)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for column in columns {
        let mut rest = column;
        for bundle in bundles.iter_mut() {
            let (head, tail) = rest.split_at_mut(thread_size);
            bundle.push(head);
            rest = tail;
        }
    }
    bundles
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::encode_permutation;
    use ark_bls12_381::Fr;
    use ark_ff::Field;
    use ark_std::UniformRand;
    use rand_chacha::{
        rand_core::{RngCore, SeedableRng},
        ChaChaRng,
    };

    fn keyed_instance(
        n: usize,
        width: usize,
        idpolys: bool,
        wires: &[Vec<Fr>],
        mapping: &[usize],
    ) -> ProvingKey<Fr> {
        let mut key = ProvingKey::<Fr>::new(n, width, idpolys).unwrap();
        key.load_witness(wires).unwrap();
        let sigmas = encode_permutation(&key.small_domain, width, mapping).unwrap();
        key.load_sigmas(&sigmas).unwrap();
        key
    }

    fn random_copy_constraints(
        n: usize,
        width: usize,
        prng: &mut ChaChaRng,
    ) -> (Vec<Vec<Fr>>, Vec<usize>) {
        let size = width * n;
        let mut mapping: Vec<usize> = (0..size).collect();
        for i in (1..size).rev() {
            let j = (prng.next_u64() as usize) % (i + 1);
            mapping.swap(i, j);
        }
        // wires consistent with the permutation: constant on each cycle
        let mut values = vec![Fr::zero(); size];
        let mut visited = vec![false; size];
        for start in 0..size {
            if visited[start] {
                continue;
            }
            let value = Fr::rand(prng);
            let mut cell = start;
            while !visited[cell] {
                visited[cell] = true;
                values[cell] = value;
                cell = mapping[cell];
            }
        }
        let wires = (0..width)
            .map(|col| values[col * n..(col + 1) * n].to_vec())
            .collect();
        (wires, mapping)
    }

    fn run_round_3(key: &mut ProvingKey<Fr>, beta: Fr, gamma: Fr) -> WorkQueue<Fr> {
        let mut transcript = PlonkTranscript::<Fr>::new(b"test");
        transcript.insert_challenge("beta", beta);
        transcript.insert_challenge("beta", gamma);
        let mut queue = WorkQueue::new();
        compute_round_commitments(key, &transcript, 3, &mut queue).unwrap();
        queue
    }

    #[test]
    fn test_other_rounds_are_noops() {
        let n = 4;
        let wires = vec![vec![Fr::zero(); n]; 3];
        let mapping: Vec<usize> = (0..3 * n).collect();
        let mut key = keyed_instance(n, 3, false, &wires, &mapping);
        let transcript = PlonkTranscript::<Fr>::new(b"test");
        let mut queue = WorkQueue::new();
        compute_round_commitments(&mut key, &transcript, 2, &mut queue).unwrap();
        assert!(queue.items().is_empty());
        assert_eq!(key.z, vec![Fr::zero(); n + 1]);
    }

    #[test]
    fn test_identity_permutation_gives_constant_z() {
        let n = 4;
        let wires = vec![vec![Fr::zero(); n]; 3];
        let mapping: Vec<usize> = (0..3 * n).collect();
        let mut key = keyed_instance(n, 3, false, &wires, &mapping);
        // beta = gamma = 1 would put 1 + root^{n/2} = 0 among the factors;
        // any non-degenerate pair leaves Z identically one
        let queue = run_round_3(&mut key, Fr::from(2u64), Fr::from(3u64));

        // Z is the all-ones vector in evaluation form
        assert_eq!(key.z[0], Fr::one());
        for i in 1..n {
            assert_eq!(key.z[i], Fr::zero());
        }

        assert_eq!(queue.items().len(), 2);
        assert_eq!(queue.items()[0].work_type, WorkType::Commit);
        assert_eq!(queue.items()[0].label, "Z");
        assert_eq!(queue.items()[1].work_type, WorkType::Fft);
        assert_eq!(queue.items()[1].label, "z");
    }

    #[test]
    fn test_width_one_uses_third_column_for_inversion() {
        let n = 4;
        let wires = vec![vec![Fr::zero(); n]];
        let mapping: Vec<usize> = (0..n).collect();
        let mut key = keyed_instance(n, 1, false, &wires, &mapping);
        run_round_3(&mut key, Fr::from(2u64), Fr::from(3u64));
        assert_eq!(key.z[0], Fr::one());
        for i in 1..n {
            assert_eq!(key.z[i], Fr::zero());
        }
    }

    #[test]
    fn test_grand_product_matches_naive_construction() {
        let n = 8;
        let width = 3;
        let mut prng = ChaChaRng::from_seed([2u8; 32]);
        let (wires, mapping) = random_copy_constraints(n, width, &mut prng);
        let beta = Fr::rand(&mut prng);
        let gamma = Fr::rand(&mut prng);

        let mut key = keyed_instance(n, width, false, &wires, &mapping);
        let sigmas = encode_permutation(&key.small_domain, width, &mapping).unwrap();
        run_round_3(&mut key, beta, gamma);
        let z_evals = key.small_domain.fft(&key.z[..n]);

        let row_ratio = |i: usize| -> Fr {
            let mut numerator = Fr::one();
            let mut denominator = Fr::one();
            for k in 0..width {
                let id_value = if k == 0 {
                    key.small_domain.element(i)
                } else {
                    coset_generator::<Fr>(k - 1) * key.small_domain.element(i)
                };
                numerator *= wires[k][i] + beta * id_value + gamma;
                denominator *= wires[k][i] + beta * sigmas[k][i] + gamma;
            }
            numerator * denominator.inverse().unwrap()
        };

        let mut prev = Fr::one();
        assert_eq!(z_evals[0], Fr::one());
        for i in 0..n - 1 {
            prev *= row_ratio(i);
            assert_eq!(z_evals[i + 1], prev);
        }
        // the wrap: applying the last row's ratio returns to one
        prev *= row_ratio(n - 1);
        assert_eq!(prev, Fr::one());
    }

    #[test]
    fn test_inconsistent_wires_break_the_wrap() {
        let n = 8;
        let width = 3;
        let mut prng = ChaChaRng::from_seed([3u8; 32]);
        let (mut wires, mapping) = random_copy_constraints(n, width, &mut prng);
        wires[0][1] += Fr::one();
        let beta = Fr::rand(&mut prng);
        let gamma = Fr::rand(&mut prng);

        let mut key = keyed_instance(n, width, false, &wires, &mapping);
        let sigmas = encode_permutation(&key.small_domain, width, &mapping).unwrap();
        run_round_3(&mut key, beta, gamma);
        let z_evals = key.small_domain.fft(&key.z[..n]);

        let mut total = z_evals[n - 1];
        let mut numerator = Fr::one();
        let mut denominator = Fr::one();
        for k in 0..width {
            let id_value = if k == 0 {
                key.small_domain.element(n - 1)
            } else {
                coset_generator::<Fr>(k - 1) * key.small_domain.element(n - 1)
            };
            numerator *= wires[k][n - 1] + beta * id_value + gamma;
            denominator *= wires[k][n - 1] + beta * sigmas[k][n - 1] + gamma;
        }
        total *= numerator * denominator.inverse().unwrap();
        assert_ne!(total, Fr::one());
    }

    #[test]
    fn test_idpolys_matches_implicit_identity() {
        let n = 8;
        let width = 3;
        let mut prng = ChaChaRng::from_seed([4u8; 32]);
        let (wires, mapping) = random_copy_constraints(n, width, &mut prng);
        let beta = Fr::rand(&mut prng);
        let gamma = Fr::rand(&mut prng);

        let mut implicit_key = keyed_instance(n, width, false, &wires, &mapping);
        run_round_3(&mut implicit_key, beta, gamma);

        let mut explicit_key = keyed_instance(n, width, true, &wires, &mapping);
        let identity_mapping: Vec<usize> = (0..width * n).collect();
        let ids =
            encode_permutation(&explicit_key.small_domain, width, &identity_mapping).unwrap();
        explicit_key.load_ids(&ids).unwrap();
        run_round_3(&mut explicit_key, beta, gamma);

        assert_eq!(implicit_key.z, explicit_key.z);
    }
}
