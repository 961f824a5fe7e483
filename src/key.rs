use crate::domain::{coset_generator, Domain};
use crate::errors::PlonkError;
use ark_ff::FftField;
use ark_std::{One, Zero};
use ruc::*;

/// Proving-side state of the permutation argument.
///
/// Wires and permutation selectors are carried in the forms the kernels
/// consume them in: Lagrange base over the small domain, monomial
/// coefficients, and coset-FFT over the large domain. The remaining buffers
/// double as the scratch arena of the grand-product construction (see
/// `prover::accumulator_columns` for the column overlay), so their sizes are
/// part of the contract: `z` is n+1 long because its tail `z[1..]` is
/// accumulator column 0, and `z_fft`/`quotient_large` each contribute four
/// n-sized columns.
#[derive(Clone, Debug)]
pub struct ProvingKey<F: FftField> {
    /// Number of wires per gate.
    pub program_width: usize,
    /// Whether identity polynomials are materialised (`id_i`) or implicit
    /// (`coset_generator(i - 1) * X`).
    pub idpolys: bool,
    /// The size-n domain.
    pub small_domain: Domain<F>,
    /// The size-4n domain.
    pub large_domain: Domain<F>,
    /// Lagrange-base wire values, one column per wire.
    pub wire_lagrange: Vec<Vec<F>>,
    /// Coset-FFT of each wire over the large domain.
    pub wire_ffts: Vec<Vec<F>>,
    /// Lagrange-base permutation selectors.
    pub sigma_lagrange: Vec<Vec<F>>,
    /// Monomial form of the permutation selectors; the last one is consumed
    /// by the linearisation contribution.
    pub sigma_coeffs: Vec<Vec<F>>,
    /// Coset-FFT of each permutation selector over the large domain.
    pub sigma_ffts: Vec<Vec<F>>,
    /// Lagrange-base identity polynomials, loaded only when `idpolys`.
    pub id_lagrange: Vec<Vec<F>>,
    /// Coset-FFT of each identity polynomial over the large domain.
    pub id_ffts: Vec<Vec<F>>,
    /// Coset-FFT of the first Lagrange kernel over the large domain.
    pub lagrange_1: Vec<F>,
    /// The grand-product polynomial; evaluations during construction,
    /// coefficients afterwards. Length n+1.
    pub z: Vec<F>,
    /// Coset-FFT of `z` over the large domain, filled by the queued FFT
    /// work item. Scratch during the grand-product construction.
    pub z_fft: Vec<F>,
    /// The quotient contribution destination. Scratch during the
    /// grand-product construction.
    pub quotient_large: Vec<F>,
    /// Scratch, one accumulator column.
    pub opening_poly: Vec<F>,
    /// Scratch, one accumulator column.
    pub shifted_opening_poly: Vec<F>,
    /// Scratch, one accumulator column.
    pub linear_poly: Vec<F>,
}

impl<F: FftField> ProvingKey<F> {
    /// Allocate the state for a circuit of `n` gates and `program_width`
    /// wires per gate.
    pub fn new(n: usize, program_width: usize, idpolys: bool) -> Result<Self> {
        if program_width == 0 {
            return Err(eg!(PlonkError::FuncParamsError));
        }
        let small_domain = Domain::new(n)?;
        let large_domain = Domain::new(4 * n)?;

        let l_1_coeffs = vec![small_domain.size_inverse; n];
        let lagrange_1 = large_domain.coset_fft(&l_1_coeffs);

        Ok(Self {
            program_width,
            idpolys,
            small_domain,
            large_domain,
            wire_lagrange: vec![Vec::new(); program_width],
            wire_ffts: vec![Vec::new(); program_width],
            sigma_lagrange: vec![Vec::new(); program_width],
            sigma_coeffs: vec![Vec::new(); program_width],
            sigma_ffts: vec![Vec::new(); program_width],
            id_lagrange: vec![Vec::new(); program_width],
            id_ffts: vec![Vec::new(); program_width],
            lagrange_1,
            z: vec![F::zero(); n + 1],
            z_fft: vec![F::zero(); 4 * n],
            quotient_large: vec![F::zero(); 4 * n],
            opening_poly: vec![F::zero(); n],
            shifted_opening_poly: vec![F::zero(); n],
            linear_poly: vec![F::zero(); n],
        })
    }

    /// Load the Lagrange-base wire values and derive their coset FFTs.
    pub fn load_witness(&mut self, wires: &[Vec<F>]) -> Result<()> {
        if wires.len() != self.program_width {
            return Err(eg!(PlonkError::FuncParamsError));
        }
        for (i, values) in wires.iter().enumerate() {
            if values.len() != self.small_domain.size {
                return Err(eg!(PlonkError::FuncParamsError));
            }
            let coeffs = self.small_domain.ifft(values);
            self.wire_ffts[i] = self.large_domain.coset_fft(&coeffs);
            self.wire_lagrange[i] = values.clone();
        }
        Ok(())
    }

    /// Load the Lagrange-base permutation selectors and derive their
    /// monomial and coset-FFT forms.
    pub fn load_sigmas(&mut self, sigmas: &[Vec<F>]) -> Result<()> {
        if sigmas.len() != self.program_width {
            return Err(eg!(PlonkError::FuncParamsError));
        }
        for (i, values) in sigmas.iter().enumerate() {
            if values.len() != self.small_domain.size {
                return Err(eg!(PlonkError::FuncParamsError));
            }
            let coeffs = self.small_domain.ifft(values);
            self.sigma_ffts[i] = self.large_domain.coset_fft(&coeffs);
            self.sigma_coeffs[i] = coeffs;
            self.sigma_lagrange[i] = values.clone();
        }
        Ok(())
    }

    /// Load materialised identity polynomials in Lagrange base.
    pub fn load_ids(&mut self, ids: &[Vec<F>]) -> Result<()> {
        if ids.len() != self.program_width {
            return Err(eg!(PlonkError::FuncParamsError));
        }
        for (i, values) in ids.iter().enumerate() {
            if values.len() != self.small_domain.size {
                return Err(eg!(PlonkError::FuncParamsError));
            }
            let coeffs = self.small_domain.ifft(values);
            self.id_ffts[i] = self.large_domain.coset_fft(&coeffs);
            self.id_lagrange[i] = values.clone();
        }
        Ok(())
    }
}

/// Verification-side parameters of the permutation argument.
#[derive(Clone, Debug)]
pub struct VerificationKey<F: FftField> {
    /// Number of wires per gate.
    pub program_width: usize,
    /// The size-n domain.
    pub domain: Domain<F>,
}

impl<F: FftField> VerificationKey<F> {
    /// Build the verification key for a circuit of `n` gates.
    pub fn new(n: usize, program_width: usize) -> Result<Self> {
        if program_width == 0 {
            return Err(eg!(PlonkError::FuncParamsError));
        }
        Ok(Self {
            program_width,
            domain: Domain::new(n)?,
        })
    }
}

/// Encode a cell-level copy permutation as permutation-selector values in
/// Lagrange base. Cell `col * n + row` denotes wire `col` at gate `row`, and
/// `mapping[cell]` names the cell it is copied from; the selector value is
/// the image cell's coordinate in the coset basis {coset_generator * root^row},
/// with wire 0 on the subgroup itself.
pub fn encode_permutation<F: FftField>(
    domain: &Domain<F>,
    width: usize,
    mapping: &[usize],
) -> Result<Vec<Vec<F>>> {
    let n = domain.size;
    if mapping.len() != width * n {
        return Err(eg!(PlonkError::FuncParamsError));
    }

    let mut powers = Vec::with_capacity(n);
    let mut cur = F::one();
    for _ in 0..n {
        powers.push(cur);
        cur *= domain.root;
    }

    let sigmas = (0..width)
        .map(|col| {
            (0..n)
                .map(|row| {
                    let target = mapping[col * n + row];
                    let (target_col, target_row) = (target / n, target % n);
                    if target_col == 0 {
                        powers[target_row]
                    } else {
                        coset_generator::<F>(target_col - 1) * powers[target_row]
                    }
                })
                .collect()
        })
        .collect();
    Ok(sigmas)
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_bls12_381::Fr;

    #[test]
    fn test_lagrange_1_coset_fft() {
        let n = 8;
        let key = ProvingKey::<Fr>::new(n, 3, false).unwrap();
        let coeffs = key.large_domain.coset_ifft(&key.lagrange_1);
        for coeff in coeffs.iter().take(n) {
            assert_eq!(*coeff, key.small_domain.size_inverse);
        }
        for coeff in coeffs.iter().skip(n) {
            assert_eq!(*coeff, Fr::zero());
        }
    }

    #[test]
    fn test_encode_identity_permutation() {
        let n = 4;
        let width = 3;
        let domain = Domain::<Fr>::new(n).unwrap();
        let mapping: Vec<usize> = (0..width * n).collect();
        let sigmas = encode_permutation(&domain, width, &mapping).unwrap();
        for (col, sigma) in sigmas.iter().enumerate() {
            for (row, value) in sigma.iter().enumerate() {
                let expected = if col == 0 {
                    domain.element(row)
                } else {
                    coset_generator::<Fr>(col - 1) * domain.element(row)
                };
                assert_eq!(*value, expected);
            }
        }
    }

    #[test]
    fn test_key_rejects_bad_shapes() {
        assert!(ProvingKey::<Fr>::new(8, 0, false).is_err());
        let mut key = ProvingKey::<Fr>::new(8, 2, false).unwrap();
        assert!(key.load_witness(&[vec![Fr::zero(); 8]]).is_err());
        assert!(key
            .load_witness(&[vec![Fr::zero(); 4], vec![Fr::zero(); 8]])
            .is_err());
    }
}
