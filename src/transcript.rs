use crate::errors::PlonkError;
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use ark_std::{collections::BTreeMap, One, UniformRand};
use merlin::Transcript;
use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
use ruc::*;

/// The transcript the engine reads challenges and openings from, by name.
///
/// Fiat-Shamir squeezing is driven by the outer orchestrator through the
/// `generate_*` helpers (or injected directly with `insert_challenge` when
/// the challenges come from elsewhere); the engine itself only consumes.
/// Two field elements can share one label: the permutation challenges live
/// under `"beta"` at indices 0 (beta) and 1 (gamma).
pub struct PlonkTranscript<F: PrimeField> {
    transcript: Transcript,
    challenges: BTreeMap<String, Vec<F>>,
    challenge_maps: BTreeMap<String, BTreeMap<String, F>>,
    elements: BTreeMap<String, Vec<F>>,
}

impl<F: PrimeField> PlonkTranscript<F> {
    /// Start a transcript under a protocol label.
    pub fn new(label: &'static [u8]) -> Self {
        Self {
            transcript: Transcript::new(label),
            challenges: BTreeMap::new(),
            challenge_maps: BTreeMap::new(),
            elements: BTreeMap::new(),
        }
    }

    /// Absorb one field element and record it under `label`.
    pub fn append_element(&mut self, label: &str, value: &F) {
        let mut bytes = Vec::new();
        value.serialize_compressed(&mut bytes).unwrap();
        self.transcript.append_message(b"append field element", &bytes);
        self.elements.entry(label.to_string()).or_default().push(*value);
    }

    /// Absorb a vector of field elements under one label. An empty vector
    /// still registers the label.
    pub fn append_elements(&mut self, label: &str, values: &[F]) {
        self.elements.entry(label.to_string()).or_default();
        for value in values {
            self.append_element(label, value);
        }
    }

    /// Squeeze a challenge under `label` and record it; repeated calls with
    /// the same label stack up at successive indices. The sample is rejected
    /// while it is a `group_order`-th root of unity.
    pub fn generate_challenge(&mut self, label: &'static [u8], group_order: usize) -> F {
        let value = self.squeeze(label, group_order);
        self.insert_challenge(&String::from_utf8_lossy(label), value);
        value
    }

    /// Squeeze a challenge belonging to a named challenge map, such as the
    /// opening-combination map `"nu"`.
    pub fn generate_map_challenge(
        &mut self,
        map_label: &'static [u8],
        key: &'static [u8],
        group_order: usize,
    ) -> F {
        let value = self.squeeze(key, group_order);
        self.insert_map_challenge(
            &String::from_utf8_lossy(map_label),
            &String::from_utf8_lossy(key),
            value,
        );
        value
    }

    /// Record an externally produced challenge under `label`.
    pub fn insert_challenge(&mut self, label: &str, value: F) {
        self.challenges.entry(label.to_string()).or_default().push(value);
    }

    /// Record an externally produced challenge inside a challenge map.
    pub fn insert_map_challenge(&mut self, map_label: &str, key: &str, value: F) {
        self.challenge_maps
            .entry(map_label.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Return the challenge stored under `label` at `index`.
    pub fn get_challenge(&self, label: &str, index: usize) -> Result<F> {
        self.challenges
            .get(label)
            .and_then(|values| values.get(index))
            .copied()
            .ok_or_else(|| eg!(PlonkError::ChallengeError))
    }

    /// Return the challenge stored under `key` inside the map `map_label`.
    pub fn get_challenge_from_map(&self, map_label: &str, key: &str) -> Result<F> {
        self.challenge_maps
            .get(map_label)
            .and_then(|map| map.get(key))
            .copied()
            .ok_or_else(|| eg!(PlonkError::ChallengeError))
    }

    /// Return the first element recorded under `label`.
    pub fn get_element(&self, label: &str) -> Result<F> {
        self.elements
            .get(label)
            .and_then(|values| values.first())
            .copied()
            .ok_or_else(|| eg!(PlonkError::ChallengeError))
    }

    /// Return every element recorded under `label`.
    pub fn get_element_vector(&self, label: &str) -> Result<Vec<F>> {
        self.elements
            .get(label)
            .cloned()
            .ok_or_else(|| eg!(PlonkError::ChallengeError))
    }

    fn squeeze(&mut self, label: &'static [u8], group_order: usize) -> F {
        let mut buff = [0u8; 32];
        self.transcript.challenge_bytes(label, &mut buff);
        let mut prng = ChaChaRng::from_seed(buff);
        loop {
            let elem = F::rand(&mut prng);
            // the challenge must not be a root of unity
            if elem.pow([group_order as u64]) != F::one() {
                return elem;
            }
        }
    }
}
