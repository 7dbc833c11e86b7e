//! Job id derivation for generated jobs

/// Derive the id of the job produced for the record at `position`.
///
/// id = `<generator_id>.<natural_key>.<position>`
///
/// Pure: the same inputs always give the same id. Positions increase
/// strictly within one batch, which keeps ids unique even when natural keys
/// repeat.
pub fn derive_job_id(generator_id: &str, natural_key: &str, position: usize) -> String {
    format!("{}.{}.{}", generator_id, natural_key, position)
}
