//! Simple batcher example showing bounded, byte-aware batching.
//!
//! Run with: cargo run --example simple_batcher

use async_trait::async_trait;
use microbatch::{BatchHandler, Batcher, HandlerError, OptionsBuilder};
use std::time::Duration;

/// Handler that prints batch information, standing in for a provider
/// publish call.
struct PrintingHandler;

#[async_trait]
impl BatchHandler<String> for PrintingHandler {
    async fn handle(&self, items: Vec<String>) -> Result<(), HandlerError> {
        let bytes: usize = items.iter().map(|m| m.len()).sum();
        println!("publishing batch of {} messages ({} bytes)", items.len(), bytes);
        // Simulate some work
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let options = OptionsBuilder::default()
        .min_batch_size(5usize)
        .max_batch_size(20usize)
        .max_batch_byte_size(512usize)
        .max_handlers(2usize)
        .build()?;

    let batcher = Batcher::new(options, PrintingHandler);

    println!("Feeding 100 messages through the batcher...");
    let mut completions = Vec::new();
    for i in 0..100 {
        completions.push(batcher.add_no_wait(format!("message-{i}")));
    }

    batcher.shutdown_and_drain().await;

    let mut delivered = 0usize;
    for completion in completions {
        completion.await?;
        delivered += 1;
    }
    println!("All {delivered} messages delivered.");

    Ok(())
}
