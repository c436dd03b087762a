//! Basic rotation usage example
//!
//! Runs a rotation manager against a local demo issuer:
//! - Start rotation for a subject
//! - Follow the countdown through a snapshot subscription
//! - Watch the code renew itself at expiry
//! - Stop and observe the frozen snapshot

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use turnstile_credential::prelude::*;

/// Mints sequential demo codes with a short validity window
struct DemoIssuer {
    minted: AtomicU32,
}

#[async_trait]
impl CredentialIssuer for DemoIssuer {
    async fn issue(&self, _subject: &SubjectId) -> RotationResult<Credential> {
        let serial = self.minted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Credential::new(format!("TURN-{serial:03}"), 3))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Rotation Manager: Basic Usage Example ===\n");

    // 1. Build a manager around the issuer seam
    println!("1. Building rotation manager...");
    let issuer = Arc::new(DemoIssuer {
        minted: AtomicU32::new(0),
    });
    let manager = RotationManager::builder()
        .issuer(issuer)
        .subject("member-42")
        .build()?;
    println!("   ✓ Manager built for subject {}\n", manager.subject());

    // 2. Start rotation; the first credential is issued before start returns
    println!("2. Starting rotation...");
    manager.start().await?;
    let snapshot = manager.snapshot();
    println!(
        "   ✓ Live: code {} valid {}s\n",
        snapshot.code().unwrap_or("?"),
        snapshot.seconds_remaining()
    );

    // 3. Follow the countdown; at zero the manager renews on its own
    println!("3. Watching two full windows...");
    let mut updates = manager.subscribe();
    let mut seen_codes = 1;
    while seen_codes < 3 {
        updates.changed().await?;
        let snapshot = updates.borrow_and_update().clone();
        if let Some(code) = snapshot.code() {
            println!("   {}  {:>2}s", code, snapshot.seconds_remaining());
            if snapshot.seconds_remaining() == 3 {
                seen_codes += 1;
            }
        }
    }
    println!("   ✓ Renewed twice without intervention\n");

    // 4. Stop; the last snapshot stays frozen
    println!("4. Stopping...");
    manager.stop().await;
    let frozen = manager.snapshot();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(manager.snapshot().seconds_remaining(), frozen.seconds_remaining());
    println!(
        "   ✓ Stopped; display frozen at {} ({}s)\n",
        frozen.code().unwrap_or("?"),
        frozen.seconds_remaining()
    );

    Ok(())
}
