use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::path::{Path, PathBuf};

use blocksync::config::Config;
use blocksync::index::{format_index, IndexStore};
use blocksync::logging::init_tracing;

fn cli() -> Command {
	Command::new("blocksync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Block-level content-addressed file synchronizer")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.global(true)
				.help("Config file (TOML or JSON5)"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.global(true)
				.help("Debug logging"),
		)
		.subcommand(
			Command::new("sync")
				.about("Synchronize a directory with a server")
				.arg(Arg::new("server").value_name("HOST:PORT").required(true))
				.arg(Arg::new("dir").value_name("BASE_DIR").required(true))
				.arg(
					Arg::new("block_size")
						.value_name("BLOCK_SIZE")
						.required(true)
						.value_parser(value_parser!(usize)),
				),
		)
		.subcommand(
			Command::new("serve")
				.about("Run the block and metadata server")
				.arg(Arg::new("listen").value_name("LISTEN_ADDR")),
		)
		.subcommand(
			Command::new("dump")
				.about("Print the local index of a directory")
				.arg(Arg::new("dir").value_name("BASE_DIR").required(true)),
		)
}

/// Defaults, then config file, then environment
fn load_config(matches: &ArgMatches) -> Result<Config, Box<dyn Error>> {
	let mut config = match matches.get_one::<String>("config") {
		Some(path) => Config::load_file(Path::new(path))?,
		None => Config::default(),
	};
	config.apply_env()?;
	Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let matches = cli().get_matches();
	let mut config = load_config(&matches)?;

	let level = if matches.get_flag("verbose") { "debug".to_string() } else { config.log_level.clone() };
	init_tracing(&level);

	if let Some(sub) = matches.subcommand_matches("sync") {
		let server = sub.get_one::<String>("server").ok_or("sync: server address required")?;
		let dir = sub.get_one::<String>("dir").ok_or("sync: base directory required")?;
		let block_size =
			*sub.get_one::<usize>("block_size").ok_or("sync: block size required")?;

		config.server_address = server.clone();
		config.base_dir = PathBuf::from(dir);
		config.block_size = block_size;

		let report = blocksync::sync::sync(&config).await?;
		for (name, reason) in &report.failed {
			eprintln!("{}: {}", name, reason);
		}
	} else if let Some(sub) = matches.subcommand_matches("serve") {
		if let Some(listen) = sub.get_one::<String>("listen") {
			config.listen_address = listen.clone();
		}
		blocksync::serve::serve(&config).await?;
	} else if let Some(sub) = matches.subcommand_matches("dump") {
		let dir = sub.get_one::<String>("dir").ok_or("dump: base directory required")?;
		let store = IndexStore::new(Path::new(dir), &config.index_file);
		print!("{}", format_index(&store.load().await?));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cli_is_consistent() {
		cli().debug_assert();
	}

	#[test]
	fn test_sync_requires_three_positionals() {
		assert!(cli().try_get_matches_from(["blocksync", "sync", "localhost:1", "dir"]).is_err());
		assert!(cli()
			.try_get_matches_from(["blocksync", "sync", "localhost:1", "dir", "4096", "extra"])
			.is_err());

		let matches =
			cli().try_get_matches_from(["blocksync", "sync", "localhost:1", "dir", "4096"]).unwrap();
		let sub = matches.subcommand_matches("sync").unwrap();
		assert_eq!(sub.get_one::<usize>("block_size"), Some(&4096));
	}

	#[test]
	fn test_block_size_must_be_numeric() {
		assert!(cli().try_get_matches_from(["blocksync", "sync", "h:1", "dir", "big"]).is_err());
	}
}

// vim: ts=4
