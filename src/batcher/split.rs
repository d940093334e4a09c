use super::config::Options;

/// Computes how a pool of `n` queued items would be partitioned into
/// dispatchable batches right now.
///
/// Returns the item count of each batch, front of the queue first. Greedy:
/// batches are filled to `max_batch_size` (or take everything when the limit
/// is 0) until fewer than `min_batch_size` items remain or `max_handlers`
/// batches have been produced. Whatever is left over stays queued for a
/// later dispatch decision.
///
/// This is the cut engine for count-only configurations; the byte-aware
/// pass in the dispatcher generalizes the same loop to a running byte total.
pub fn split(n: usize, options: &Options) -> Vec<usize> {
    let mut remaining = n;
    let mut batches = Vec::new();

    while remaining >= options.min_batch_size && batches.len() < options.max_handlers {
        let size = if options.max_batch_size == 0 {
            remaining
        } else {
            options.max_batch_size.min(remaining)
        };
        batches.push(size);
        remaining -= size;
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::OptionsBuilder;

    fn opts(min: usize, max: usize, handlers: usize) -> Options {
        OptionsBuilder::default()
            .min_batch_size(min)
            .max_batch_size(max)
            .max_handlers(handlers)
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_batches_then_remainder() {
        assert_eq!(split(12, &opts(1, 5, 10)), vec![5, 5, 2]);
    }

    #[test]
    fn test_handler_cap_leaves_items_queued() {
        // 8 items deliberately left unconsumed.
        assert_eq!(split(20, &opts(1, 9, 2)), vec![9, 9]);
    }

    #[test]
    fn test_empty_pool_yields_nothing() {
        assert_eq!(split(0, &opts(1, 0, 1)), Vec::<usize>::new());
    }

    #[test]
    fn test_defaults_take_everything_in_one_batch() {
        assert_eq!(split(100, &Options::default()), vec![100]);
    }

    #[test]
    fn test_below_threshold_yields_nothing() {
        assert_eq!(split(4, &opts(5, 0, 4)), Vec::<usize>::new());
        assert_eq!(split(5, &opts(5, 0, 4)), vec![5]);
    }

    #[test]
    fn test_remainder_below_threshold_stays_queued() {
        // 10 = 4 + 4, then 2 < min so the tail stays.
        assert_eq!(split(10, &opts(3, 4, 8)), vec![4, 4]);
    }

    #[test]
    fn test_conservation_over_grid() {
        for n in 0..=64 {
            for min in 1..=5 {
                for max in [0usize, 1, 3, 7, 16] {
                    if max > 0 && max < min {
                        continue;
                    }
                    for handlers in 1..=4 {
                        let options = opts(min, max, handlers);
                        let sizes = split(n, &options);

                        let total: usize = sizes.iter().sum();
                        assert!(total <= n, "split overdrew: n={n} sizes={sizes:?}");
                        assert!(sizes.len() <= handlers);
                        for &size in &sizes {
                            assert!(size >= 1);
                            if max > 0 {
                                assert!(size <= max);
                            }
                        }
                        // Leftover is either below threshold or blocked by
                        // the handler cap.
                        let leftover = n - total;
                        assert!(
                            leftover < min || sizes.len() == handlers,
                            "unexplained leftover: n={n} min={min} max={max} \
                             handlers={handlers} sizes={sizes:?}"
                        );
                    }
                }
            }
        }
    }
}
