fn main() {
	env_logger::init();

	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag(  "h", "help",             "Show help");
		opts.optmulti( "r", "repository",       "Add a repository searched before all others", "NAME=URL");
		opts.optmulti( "x", "exclude",          "Exclude a module from every dependency", "GROUP:MODULE");
		opts.optflag(  "",  "no-transitive",    "Only grab the named dependencies");
		opts.optflag(  "",  "report-downloads", "Print a line for every download");
		opts.optflag(  "",  "save-config",      "Write the config in use to disk");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") || parsed_options.free.is_empty() {
			eprintln!("{}", opts.usage("Usage: grab-rs-terminal [options] GROUP:MODULE:VERSION[:EXT]..."));
			return;
		}

		parsed_options
	};

	let mut config = grab_rs::Config::load_from_disk().unwrap_or_else(|e| {
		log::warn!("Failed to read config file: {}", e);
		log::warn!("Using default config.");
		grab_rs::Config::default()
	});
	if parsed_options.opt_present("report-downloads") {
		config.set_report_downloads(true);
	}
	if parsed_options.opt_present("save-config") {
		if let Err(e) = config.save_to_disk() {
			log::error!("Failed to save config: {}", e);
		}
	}

	match grab(&config, &parsed_options) {
		Ok(path) => println!("{}", path),
		Err(e) => {
			log::error!("{}", e);
			std::process::exit(1);
		},
	}
}

/// Grabs every coordinate given on the command line, returning the resulting class path.
fn grab(config: &grab_rs::Config, options: &getopts::Matches) -> Result<String, Error> {
	let mut engine = grab_rs::GrabEngine::new(config);

	for repository in options.opt_strs("r") {
		let (name, root) = repository.split_once('=').ok_or_else(|| Error::BadArgument(repository.clone()))?;
		engine.add_resolver(&record(serde_json::json!({ "name": name, "root": root })))?;
	}

	let excludes = options.opt_strs("x").iter()
		.map(|e| match e.split_once(':') {
			Some((group, module)) => Ok(serde_json::json!({ "group": group, "module": module })),
			None => Err(Error::BadArgument(e.clone())),
		})
		.collect::<Result<Vec<_>, _>>()?;
	let args = record(serde_json::json!({ "excludes": excludes }));

	let transitive = !options.opt_present("no-transitive");
	let dependencies = options.free.iter()
		.map(|c| dependency_record(c, transitive))
		.collect::<Result<Vec<_>, _>>()?;

	log::info!("Grabbing {} dependencies from {} repositories", dependencies.len(), engine.repositories().len());
	engine.grab(&args, &dependencies, None)?;

	for managed in engine.managed_dependencies() {
		log::info!("Resolved {}", managed.coordinate);
	}
	Ok(engine.load_path().to_path_string())
}

/// `group:module:version` with an optional `:ext`.
fn dependency_record(coordinate: &str, transitive: bool) -> Result<grab_rs::Record, Error> {
	let parts: Vec<&str> = coordinate.split(':').collect();
	let value = match parts.as_slice() {
		[group, module, version] => serde_json::json!({ "group": group, "module": module, "version": version, "transitive": transitive }),
		[group, module, version, ext] => serde_json::json!({ "group": group, "module": module, "version": version, "ext": ext, "transitive": transitive }),
		_ => return Err(Error::BadArgument(coordinate.to_string())),
	};
	Ok(record(value))
}

fn record(value: serde_json::Value) -> grab_rs::Record {
	match value {
		serde_json::Value::Object(map) => map,
		_ => grab_rs::Record::new(),
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("grab-rs error: {0}")]
	GrabError(#[from] grab_rs::Error),
	#[error("Malformed argument: {0}")]
	BadArgument(String),
}
