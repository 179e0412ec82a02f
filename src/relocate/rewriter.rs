//! Assigns destination coordinates to a batch of image records

use crate::error::{RelocateError, Result};
use crate::image::ImageRecord;
use crate::relocate::tag::TagDeriver;

/// Rewrites every record to live under one destination repository,
/// distinguished only by its derived tag.
#[derive(Debug, Clone)]
pub struct ReferenceRewriter {
    destination: String,
    tags: TagDeriver,
}

impl ReferenceRewriter {
    /// The destination is expected to be validated already, see [`crate::config::RelocationConfig`]
    pub fn new(destination: impl Into<String>, tags: TagDeriver) -> Self {
        Self {
            destination: destination.into(),
            tags,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Compute the destination `(name, tag)` for one record
    pub fn destination_for(&self, record: &ImageRecord) -> (String, String) {
        (
            self.destination.clone(),
            self.tags.derive(&record.original_name, &record.original_tag),
        )
    }

    /// Rewrite the batch in place.
    ///
    /// Every record is checked before any is touched, so a contract violation
    /// leaves the batch unchanged.
    pub fn rewrite(&self, records: &mut [ImageRecord]) -> Result<()> {
        check_records(records)?;

        for record in records.iter_mut() {
            let (new_name, new_tag) = self.destination_for(record);
            record.new_name = new_name;
            record.new_tag = new_tag;
        }

        tracing::debug!(
            destination = %self.destination,
            records = records.len(),
            "Rewrote image references"
        );
        Ok(())
    }

    /// Rewrite into a new batch, leaving the input untouched
    pub fn rewritten(&self, records: &[ImageRecord]) -> Result<Vec<ImageRecord>> {
        let mut out = records.to_vec();
        self.rewrite(&mut out)?;
        Ok(out)
    }
}

fn check_records(records: &[ImageRecord]) -> Result<()> {
    match records.iter().position(|r| r.original_name.is_empty()) {
        Some(pos) => Err(RelocateError::ContractViolation(format!(
            "Image {} (ref '{}' in manifest '{}') has an empty original name",
            pos + 1,
            records[pos].original_ref,
            records[pos].manifest
        ))),
        None => Ok(()),
    }
}
