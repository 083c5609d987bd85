//! Observers of artifact transfers.
//!
//! A [`ProgressReporter`] only ever writes text, replacing it with [`NoopProgressReporter`] changes nothing
//! about what gets resolved.

pub mod summary;
pub use summary::SummaryProgressReporter;
pub mod detailed;
pub use detailed::DetailedProgressReporter;

use std::io::Write;

/// Something that happened to one transfer, `resource` is the url being fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent<'a> {
	Initiated { resource: &'a str },
	Progressed { resource: &'a str, transferred: u64, total: Option<u64> },
	Succeeded { resource: &'a str, transferred: u64 },
	Failed { resource: &'a str, reason: String },
}

impl TransferEvent<'_> {
	pub fn resource(&self) -> &str {
		match self {
			TransferEvent::Initiated { resource } |
			TransferEvent::Progressed { resource, .. } |
			TransferEvent::Succeeded { resource, .. } |
			TransferEvent::Failed { resource, .. } => resource,
		}
	}
}

/// Receives transfer events from a resolution engine while it downloads.
pub trait TransferListener {
	fn transfer_event(&self, event: &TransferEvent);
}

/// A [`TransferListener`] told when each resolve call is over so it can flush its output.
pub trait ProgressReporter: TransferListener {
	/// Called once after every resolve, successful or not.
	fn finished(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressReporter;

impl TransferListener for NoopProgressReporter {
	fn transfer_event(&self, _event: &TransferEvent) {}
}

impl ProgressReporter for NoopProgressReporter {
	fn finished(&self) {}
}

/// Where reporters write to.
pub type ReportWriter = Box<dyn Write + Send>;

/// The reporter selected by [`Config::report_downloads()`](crate::Config::report_downloads()), writing to stdout.
pub fn progress_reporter_for(config: &crate::Config) -> Box<dyn ProgressReporter + Send + Sync> {
	if config.report_downloads() {
		Box::new(DetailedProgressReporter::new(Box::new(std::io::stdout())))
	} else {
		Box::new(SummaryProgressReporter::new(Box::new(std::io::stdout())))
	}
}

#[cfg(test)]
pub(crate) mod test {
	use super::*;
	use std::sync::{Arc, Mutex};

	/// A writer tests can read back from.
	#[derive(Clone, Default)]
	pub(crate) struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

	impl SharedBuffer {
		pub(crate) fn contents(&self) -> String {
			String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
		}
	}

	impl Write for SharedBuffer {
		fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
			self.0.lock().unwrap().write(buf)
		}
		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	#[test] fn event_exposes_resource() { assert_eq!(TransferEvent::Succeeded { resource: "https://x/a.jar", transferred: 1 }.resource(), "https://x/a.jar") }

	#[test]
	fn detailed_selected_by_config() {
		let mut config = crate::Config::default();
		config.set_report_downloads(true);
		/* Only checks selection does not panic, both write to stdout */
		progress_reporter_for(&config).finished();
	}
}
