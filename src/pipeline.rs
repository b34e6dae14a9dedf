//! Stream assembly: build the layered read pipeline for one sample.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::error::CollectionError;
use crate::models::ContentType;
use crate::registry::SampleRef;
use crate::stream::{
    ByteStream, CryptoHashAlgs, CryptoHashStream, FuzzyHashAlgs, FuzzyHashStream, SharedStream,
    StringsStream,
};

/// What the assembler interposes above every source stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineConfig {
    pub crypto: CryptoHashAlgs,
    pub fuzzy: FuzzyHashAlgs,
    /// Inherited by string extraction when a spec leaves both bounds zero.
    pub default_min_chars: u32,
    pub default_max_chars: u32,
}

/// Build the read pipeline for `sample` and record its size.
///
/// Layers, bottom to top: the content source selected by the sample's
/// `ContentSpec`, then the crypto hash tap when any digest is requested,
/// then the fuzzy hash tap. The top becomes the sample's copy stream; tap
/// handles are retained on the sample for digest harvesting. Partially
/// built layers are dropped on failure.
pub fn configure_sample_streams(
    sample: &mut SampleRef,
    config: &PipelineConfig,
) -> Result<(), CollectionError> {
    if sample.sample_name.is_empty() {
        return Err(CollectionError::Config(
            "sample has no in-archive name".into(),
        ));
    }

    let primary = sample
        .matches
        .first()
        .ok_or_else(|| CollectionError::Config("sample covers no match".into()))?;
    let attribute = primary
        .attributes
        .get(sample.id.attribute_index)
        .ok_or_else(|| {
            CollectionError::Config(format!(
                "match has no attribute at index {}",
                sample.id.attribute_index
            ))
        })?;

    let source: SharedStream = match sample.content.kind {
        ContentType::Data => attribute.data_stream.clone(),
        ContentType::Raw => match &attribute.raw_stream {
            Some(raw) => raw.clone(),
            None => {
                debug!(
                    "no raw stream for '{}', falling back to the data stream",
                    sample.full_name()
                );
                attribute.data_stream.clone()
            }
        },
        ContentType::Strings => {
            let (min_chars, max_chars) =
                if sample.content.min_chars == 0 && sample.content.max_chars == 0 {
                    (config.default_min_chars, config.default_max_chars)
                } else {
                    (sample.content.min_chars, sample.content.max_chars)
                };
            let strings = StringsStream::open(attribute.data_stream.clone(), min_chars, max_chars);
            Rc::new(RefCell::new(strings))
        }
    };

    let mut top: SharedStream = source;

    if config.crypto.any() {
        let tap = Rc::new(RefCell::new(CryptoHashStream::open_to_read(
            config.crypto,
            top,
        )));
        sample.hash_stream = Some(tap.clone());
        top = tap;
    }

    if config.fuzzy.any() {
        let tap = Rc::new(RefCell::new(FuzzyHashStream::open_to_read(
            config.fuzzy,
            top,
        )));
        sample.fuzzy_hash_stream = Some(tap.clone());
        top = tap;
    }

    sample.sample_size = top.borrow().size()?;
    sample.copy_stream = Some(top);
    Ok(())
}
