use std::io::Write;
use std::sync::Mutex;

use super::*;

/// Writes a line when each download starts and another when it completes.
pub struct DetailedProgressReporter {
	out: Mutex<ReportWriter>,
}

impl DetailedProgressReporter {
	pub fn new(out: ReportWriter) -> Self {
		Self { out: Mutex::new(out) }
	}

	fn line(&self, line: std::fmt::Arguments) {
		if let Ok(mut out) = self.out.lock() {
			let _ = out.write_fmt(line).and_then(|_| out.write_all(b"\n")).and_then(|_| out.flush());
		}
	}
}

/// Rounds up so any non-empty transfer reports at least 1KB.
fn kilobytes(bytes: u64) -> u64 {
	(bytes + 1023) / 1024
}

impl TransferListener for DetailedProgressReporter {
	fn transfer_event(&self, event: &TransferEvent) {
		match event {
			TransferEvent::Initiated { resource } => self.line(format_args!("Downloading: {}", resource)),
			TransferEvent::Succeeded { resource, transferred } => {
				self.line(format_args!("Downloaded: {} ({}KB)", resource, kilobytes(*transferred)))
			},
			TransferEvent::Failed { resource, reason } => self.line(format_args!("Failed: {} ({})", resource, reason)),
			TransferEvent::Progressed { .. } => {},
		}
	}
}

impl ProgressReporter for DetailedProgressReporter {
	fn finished(&self) {}
}
