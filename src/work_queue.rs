use crate::errors::PlonkError;
use crate::key::ProvingKey;
use ark_ff::FftField;
use ruc::*;

/// The kind of deferred work the engine hands to the outer framework.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkType {
    /// Commit to a polynomial through the commitment backend.
    Commit,
    /// Produce the large-domain coset FFT of a polynomial.
    Fft,
    /// A queued scalar multiplication.
    ScalarMult,
}

/// A deferred work item. Buffers cross the queue boundary by polynomial
/// label and are resolved against the proving key when processed.
#[derive(Clone, Debug)]
pub struct WorkItem<F> {
    /// What to do.
    pub work_type: WorkType,
    /// The polynomial the item applies to.
    pub label: String,
    /// Optional scalar attached to the item.
    pub scalar: F,
    /// Optional index attached to the item.
    pub index: usize,
}

/// FIFO queue of deferred work items.
#[derive(Debug)]
pub struct WorkQueue<F> {
    items: Vec<WorkItem<F>>,
}

impl<F: FftField> WorkQueue<F> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Push a work item.
    pub fn add_to_queue(&mut self, item: WorkItem<F>) {
        self.items.push(item);
    }

    /// The queued items, oldest first.
    pub fn items(&self) -> &[WorkItem<F>] {
        &self.items
    }

    /// Replay the queued FFT items against the proving key: the `"z"` item
    /// fills `z_fft` with the unscaled coset FFT of Z over the large domain.
    /// Commitment and scalar-multiplication items stay queued for the
    /// commitment backend, which is outside this engine.
    pub fn process(&mut self, key: &mut ProvingKey<F>) -> Result<()> {
        let n = key.small_domain.size;
        for item in self.items.iter() {
            if item.work_type != WorkType::Fft {
                continue;
            }
            if item.label != "z" {
                return Err(eg!(PlonkError::FuncParamsError));
            }
            let evals = key.large_domain.coset_fft(&key.z[..n]);
            key.z_fft.copy_from_slice(&evals);
        }
        self.items.retain(|item| item.work_type != WorkType::Fft);
        Ok(())
    }
}

impl<F: FftField> Default for WorkQueue<F> {
    fn default() -> Self {
        Self::new()
    }
}
