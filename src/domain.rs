use crate::errors::PlonkError;
use ark_ff::{batch_inversion, FftField};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_std::One;
use ruc::*;

/// A multiplicative subgroup of the scalar field, together with the fixed
/// thread partition used by the data-parallel kernels. Two instances are in
/// play per proof: the small domain of size n and the large domain of size
/// 4n used for the quotient computation. FFTs are delegated to the
/// arkworks radix-2 domain; the coset variants shift by the field's
/// multiplicative generator.
#[derive(Clone, Debug)]
pub struct Domain<F: FftField> {
    /// The domain size, a power of two.
    pub size: usize,
    /// log2 of the domain size.
    pub log2_size: usize,
    /// A primitive `size`-th root of unity.
    pub root: F,
    /// The inverse of `root`.
    pub root_inverse: F,
    /// The coset shift applied by the coset FFTs.
    pub generator: F,
    /// The inverse of `generator`.
    pub generator_inverse: F,
    /// The inverse of `size` as a field element.
    pub size_inverse: F,
    /// Number of worker threads the kernels partition over.
    pub num_threads: usize,
    /// Rows owned by each worker; `num_threads * thread_size == size`.
    pub thread_size: usize,
    subgroup: Radix2EvaluationDomain<F>,
    coset: Radix2EvaluationDomain<F>,
}

/// Evaluations of the first and last Lagrange kernels of a domain at an
/// arbitrary point. `l_end` is the kernel pinned to the distinguished last
/// root used by the grand-product wrap check.
#[derive(Clone, Copy, Debug)]
pub struct LagrangeEvaluations<F> {
    /// L_1 evaluated at the point.
    pub l_1: F,
    /// The last kernel evaluated at the point.
    pub l_end: F,
}

impl<F: FftField> Domain<F> {
    /// Build a domain of the given power-of-two size.
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(eg!(PlonkError::SetupError));
        }
        let subgroup =
            Radix2EvaluationDomain::<F>::new(size).ok_or_else(|| eg!(PlonkError::SetupError))?;
        let coset = subgroup
            .get_coset(F::GENERATOR)
            .ok_or_else(|| eg!(PlonkError::SetupError))?;

        let mut num_threads = rayon::current_num_threads();
        if !num_threads.is_power_of_two() {
            num_threads = num_threads.next_power_of_two() >> 1;
        }
        let num_threads = num_threads.clamp(1, size);

        Ok(Self {
            size,
            log2_size: subgroup.log_size_of_group as usize,
            root: subgroup.group_gen,
            root_inverse: subgroup.group_gen_inv,
            generator: coset.offset,
            generator_inverse: coset.offset_inv,
            size_inverse: subgroup.size_inv,
            num_threads,
            thread_size: size / num_threads,
            subgroup,
            coset,
        })
    }

    /// Return `root^i`.
    pub fn element(&self, i: usize) -> F {
        self.subgroup.element(i)
    }

    /// Evaluate a coefficient-form polynomial on the subgroup.
    pub fn fft(&self, coeffs: &[F]) -> Vec<F> {
        self.subgroup.fft(coeffs)
    }

    /// Interpolate subgroup evaluations back to coefficient form.
    pub fn ifft(&self, evals: &[F]) -> Vec<F> {
        self.subgroup.ifft(evals)
    }

    /// Evaluate a coefficient-form polynomial on the coset
    /// `generator * <root>`.
    pub fn coset_fft(&self, coeffs: &[F]) -> Vec<F> {
        self.coset.fft(coeffs)
    }

    /// Interpolate coset evaluations back to coefficient form.
    pub fn coset_ifft(&self, evals: &[F]) -> Vec<F> {
        self.coset.ifft(evals)
    }

    /// Evaluate the first and last Lagrange kernels at `point`, computing
    /// `point^size` by `log2_size` successive squarings and batching the two
    /// denominator inversions into one.
    pub fn lagrange_evaluations(&self, point: &F) -> LagrangeEvaluations<F> {
        let mut point_pow = *point;
        for _ in 0..self.log2_size {
            point_pow.square_in_place();
        }
        let numerator = (point_pow - F::one()) * self.size_inverse;
        let mut denominators = [*point - F::one(), *point * self.root.square() - F::one()];
        batch_inversion(&mut denominators);
        LagrangeEvaluations {
            l_1: numerator * denominators[0],
            l_end: numerator * denominators[1],
        }
    }
}

/// The k-th member of the deterministic coset-representative family used by
/// the implicit identity polynomials: wire j > 0 lives on the coset
/// `coset_generator(j - 1) * <root>`, wire 0 on the subgroup itself. Both
/// prover and verifier recompute the family, so it must not depend on any
/// per-proof state. Successive powers of the multiplicative generator give
/// pairwise-distinct cosets of every power-of-two subgroup.
pub fn coset_generator<F: FftField>(k: usize) -> F {
    F::GENERATOR.pow([k as u64 + 1])
}
