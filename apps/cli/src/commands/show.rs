//! `show`: run rotation for a subject and render each refresh
//!
//! What a wall-mounted display does, on a terminal: start a rotation
//! manager against the service, print the code and countdown on every
//! snapshot change, renew automatically at expiry. Runs until Ctrl-C or,
//! with `--rotations`, until that many codes have been issued.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio::signal;
use tokio::sync::Notify;
use tracing::info;

use turnstile_client::HttpCredentialIssuer;
use turnstile_credential::rotation::{
    RotationEvent, RotationManager, RotationObserver, RotationPhase, RotationSnapshot,
};

use crate::settings::Settings;

/// Arguments for `turnstile show`
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Subject the codes are issued for
    #[arg(long, value_name = "ID")]
    pub subject: String,

    /// Exit after this many issued codes instead of running until Ctrl-C
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub rotations: Option<u32>,
}

/// Counts issued codes and wakes the render loop once the quota is reached
struct RotationQuota {
    issued: AtomicU32,
    limit: u32,
    reached: Notify,
}

impl RotationQuota {
    fn new(limit: u32) -> Self {
        Self {
            issued: AtomicU32::new(0),
            limit,
            reached: Notify::new(),
        }
    }
}

#[async_trait::async_trait]
impl RotationObserver for RotationQuota {
    async fn notify(&self, event: &RotationEvent) {
        if matches!(event, RotationEvent::Issued { .. }) {
            let issued = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            if issued >= self.limit {
                self.reached.notify_one();
            }
        }
    }
}

pub async fn run(settings: &Settings, args: ShowArgs) -> Result<ExitCode> {
    let api = settings.api_client()?;
    let issuer = Arc::new(HttpCredentialIssuer::new(api));

    let quota = args.rotations.map(|limit| Arc::new(RotationQuota::new(limit)));

    let mut builder = RotationManager::builder()
        .issuer(issuer)
        .subject(args.subject.as_str());
    if let Some(quota) = &quota {
        builder = builder.observer(quota.clone());
    }
    let manager = builder.build().context("building rotation manager")?;

    manager.start().await.context("starting rotation")?;
    info!(subject_id = %args.subject, "Rotation started");

    let mut rx = manager.subscribe();
    render(&rx.borrow_and_update());

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            () = quota_reached(quota.as_deref()) => {
                // The quota observer fires right after the snapshot with the
                // final code was published; render it if we have not yet.
                if rx.has_changed().unwrap_or(false) {
                    render(&rx.borrow_and_update());
                }
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                render(&snapshot);
                if snapshot.last_error().is_some() && !manager.is_running().await {
                    bail!(
                        "rotation parked: {}",
                        snapshot.last_error().unwrap_or("issuance failed")
                    );
                }
            }
        }
    }

    manager.stop().await;
    println!("stopped");
    Ok(ExitCode::SUCCESS)
}

async fn quota_reached(quota: Option<&RotationQuota>) {
    match quota {
        Some(quota) => quota.reached.notified().await,
        None => std::future::pending().await,
    }
}

fn render(snapshot: &RotationSnapshot) {
    match snapshot.phase() {
        RotationPhase::Active => {
            if let Some(code) = snapshot.code() {
                println!("{code}  {:>2}s", snapshot.seconds_remaining());
            }
        }
        RotationPhase::Refreshing => println!("refreshing..."),
        RotationPhase::Idle => {}
    }
}
