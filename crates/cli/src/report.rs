// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-of-tick reporting: a textual change summary for the log, emailed
//! out when notification addresses are configured.

use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::Options;
use crate::status::{DeviceState, StatusStore};

/// Build the per-device change summary and the appended diff bodies,
/// iterating devices in configuration order.
pub fn build_report(opts: &Options, store: &StatusStore) -> (String, String) {
    let mut report = String::new();
    let mut diffs = String::new();

    for device in &opts.devices {
        let host = &device.hostname;
        let Some(status) = store.get(host) else {
            report.push_str(&format!("{host}: error: never collected\n"));
            continue;
        };
        if status.state != DeviceState::Success {
            report.push_str(&format!("{host}: error: {}\n", status.error_message));
            continue;
        }
        if status.diffs.is_empty() {
            report.push_str(&format!("{host}: no changes\n"));
            continue;
        }
        report.push_str(&format!("{host}: changes!\n"));
        for (name, diff) in &status.diffs {
            if diff.new_file {
                report.push_str(&format!("\t{name}: new config\n"));
            } else {
                report.push_str(&format!("\t{name}: +{} -{}\n", diff.added, diff.removed));
                diffs.push_str(&format!("\n---- Diff for {host} {name}:\n{}\n", diff.diff));
            }
        }
    }

    (report, diffs)
}

/// Log the change report and submit it by email when both addresses are
/// set. SMTP failures are logged and never abort the cycle.
pub async fn run_reporter(opts: &Options, store: &StatusStore) {
    info!("starting reporter");
    let (report, diffs) = build_report(opts, store);
    for line in report.lines() {
        info!("{line}");
    }

    if let (Some(to), Some(from)) = (&opts.to_email, &opts.from_email) {
        info!("sending notification email to {to} from {from}");
        let body = format!("{report}{diffs}");
        if let Err(e) = send_email(opts, to, from, &body).await {
            warn!("notification email failed: {e:#}");
        }
    }
    info!("finished reporter");
}

async fn send_email(opts: &Options, to: &str, from: &str, body: &str) -> anyhow::Result<()> {
    let (host, port) = match opts.smtp.rsplit_once(':') {
        Some((host, port)) => (host.to_owned(), port.parse::<u16>()?),
        None => (opts.smtp.clone(), 25),
    };

    let hostname = nix::unistd::gethostname()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_owned());

    let message = Message::builder()
        .from(from.parse::<Mailbox>()?)
        .to(to.parse::<Mailbox>()?)
        .subject(format!("Change notification from Sweet on {hostname}"))
        .body(body.to_owned())?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port).build();
    mailer.send(message).await?;
    Ok(())
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
