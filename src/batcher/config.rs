use derive_builder::Builder;

/// Batching limits and concurrency bounds.
///
/// A zero value for `max_batch_size` or `max_batch_byte_size` means
/// "unbounded". The defaults cut a single unbounded batch as soon as one
/// item is queued, handled by one invocation at a time.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Options {
    /// Minimum number of queued items before a cut is attempted.
    ///
    /// Ignored while draining: shutdown dispatches every remainder.
    #[builder(default = "1")]
    pub(crate) min_batch_size: usize,

    /// Maximum number of items in a single batch (0 = unbounded).
    #[builder(default = "0")]
    pub(crate) max_batch_size: usize,

    /// Maximum total byte size of a single batch (0 = unbounded).
    ///
    /// Byte sizes are reported by the [`Sizable`](super::Sizable) capability;
    /// items report 0 unless they override it.
    #[builder(default = "0")]
    pub(crate) max_batch_byte_size: usize,

    /// Maximum number of concurrently running handler invocations.
    ///
    /// Also caps how many batches one dispatch decision may cut.
    #[builder(default = "1")]
    pub(crate) max_handlers: usize,
}

impl Options {
    /// Returns the minimum queued-item count required before dispatch.
    #[inline]
    pub fn min_batch_size(&self) -> usize {
        self.min_batch_size
    }

    /// Returns the per-batch item-count ceiling (0 = unbounded).
    #[inline]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Returns the per-batch byte ceiling (0 = unbounded).
    #[inline]
    pub fn max_batch_byte_size(&self) -> usize {
        self.max_batch_byte_size
    }

    /// Returns the handler concurrency bound.
    #[inline]
    pub fn max_handlers(&self) -> usize {
        self.max_handlers
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            min_batch_size: 1,
            max_batch_size: 0,
            max_batch_byte_size: 0,
            max_handlers: 1,
        }
    }
}

impl OptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.min_batch_size {
            return Err("min_batch_size must be at least 1".into());
        }
        if let Some(0) = self.max_handlers {
            return Err("max_handlers must be at least 1".into());
        }
        if let (Some(max), Some(min)) = (self.max_batch_size, self.min_batch_size) {
            if max > 0 && max < min {
                return Err(format!(
                    "max_batch_size ({max}) must not be below min_batch_size ({min})"
                ));
            }
        }
        Ok(())
    }
}
