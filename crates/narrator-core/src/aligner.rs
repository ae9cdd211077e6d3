//! Dataset Aligner
//!
//! Inner join of generated and reference collections on their key.
//!
//! Policy:
//! 1. Output order follows the generated collection.
//! 2. A generated record without a reference partner is dropped, never padded.
//! 3. When reference keys repeat, the first occurrence wins and later ones are
//!    ignored. Duplicate-key datasets should ideally be rejected upstream; the
//!    count is reported in [`Alignment::duplicate_reference_keys`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::records::Keyed;

/// Result of joining two keyed collections.
#[derive(Debug)]
pub struct Alignment<'a, G, R> {
    /// Matched pairs, in generated-collection order.
    pub pairs: Vec<(&'a G, &'a R)>,

    /// Generated records with no reference partner.
    pub dropped: usize,

    /// Reference records shadowed by an earlier record with the same key.
    pub duplicate_reference_keys: usize,
}

impl<'a, G, R> Alignment<'a, G, R> {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Join `generated` with `reference` on [`Keyed::key`].
pub fn align<'a, G, R>(generated: &'a [G], reference: &'a [R]) -> Alignment<'a, G, R>
where
    G: Keyed,
    R: Keyed,
{
    let mut by_key: HashMap<&'a str, &'a R> = HashMap::with_capacity(reference.len());
    let mut duplicate_reference_keys = 0;
    for record in reference {
        match by_key.entry(record.key()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(_) => duplicate_reference_keys += 1,
        }
    }

    if duplicate_reference_keys > 0 {
        tracing::warn!(
            duplicates = duplicate_reference_keys,
            "Reference data has duplicate keys, keeping first occurrence"
        );
    }

    let mut pairs = Vec::with_capacity(generated.len().min(reference.len()));
    let mut dropped = 0;
    for record in generated {
        match by_key.get(record.key()) {
            Some(partner) => pairs.push((record, *partner)),
            None => {
                dropped += 1;
                tracing::debug!(key = record.key(), "No reference record for key");
            }
        }
    }

    Alignment {
        pairs,
        dropped,
        duplicate_reference_keys,
    }
}
