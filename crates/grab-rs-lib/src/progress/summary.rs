use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::*;

const DOT_INTERVAL: Duration = Duration::from_secs(1);

struct SummaryState {
	out: ReportWriter,
	started: bool,
	last_dot: Instant,
}

/// Writes `Resolving dependencies..` once transfers begin, a dot per second while they continue
/// and ends the line when the resolve finishes. Resolves that download nothing write nothing.
pub struct SummaryProgressReporter {
	state: Mutex<SummaryState>,
	interval: Duration,
}

impl SummaryProgressReporter {
	pub fn new(out: ReportWriter) -> Self {
		Self::with_interval(out, DOT_INTERVAL)
	}

	pub fn with_interval(out: ReportWriter, interval: Duration) -> Self {
		Self {
			state: Mutex::new(SummaryState { out, started: false, last_dot: Instant::now() }),
			interval,
		}
	}
}

impl TransferListener for SummaryProgressReporter {
	fn transfer_event(&self, event: &TransferEvent) {
		let Ok(mut state) = self.state.lock() else { return };
		if !state.started {
			state.started = true;
			state.last_dot = Instant::now();
			let _ = state.out.write_all(b"Resolving dependencies..").and_then(|_| state.out.flush());
			return;
		}
		if let TransferEvent::Progressed { .. } | TransferEvent::Succeeded { .. } = event {
			if state.last_dot.elapsed() >= self.interval {
				state.last_dot = Instant::now();
				let _ = state.out.write_all(b".").and_then(|_| state.out.flush());
			}
		}
	}
}

impl ProgressReporter for SummaryProgressReporter {
	fn finished(&self) {
		let Ok(mut state) = self.state.lock() else { return };
		if state.started {
			state.started = false;
			let _ = state.out.write_all(b"\n").and_then(|_| state.out.flush());
		}
	}
}
