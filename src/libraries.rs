//! Per-user state: where the config, the session token and the list of
//! recently opened libraries live.

use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};

const RECENT_LIBRARIES_FILE: &str = "recent_libraries.tsv";
const MAX_RECENT_LIBRARIES: usize = 50;
const CONFIG_FILE: &str = "config.toml";
const TOKEN_FILE: &str = "session_token";
const APP_DIR: &str = "wrappedup";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentLibrary {
	pub path: PathBuf,
	/// `None` for rows written without a timestamp.
	pub opened_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct StateDir {
	root: PathBuf,
}

impl StateDir {
	pub fn at(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// `WRAPPEDUP_STATE_DIR`, else the platform state directory.
	pub fn locate() -> Self {
		if let Some(path) = env::var_os("WRAPPEDUP_STATE_DIR") {
			if !path.is_empty() {
				return Self::at(path);
			}
		}

		#[cfg(target_os = "windows")]
		{
			if let Some(path) = env::var_os("LOCALAPPDATA") {
				return Self::at(PathBuf::from(path).join(APP_DIR));
			}
		}

		let root = env::var_os("XDG_STATE_HOME")
			.map(|path| PathBuf::from(path).join(APP_DIR))
			.or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state").join(APP_DIR)))
			.unwrap_or_else(|| PathBuf::from(".wrappedup"));
		Self::at(root)
	}

	pub fn config_path(&self) -> PathBuf {
		self.root.join(CONFIG_FILE)
	}

	pub fn token_path(&self) -> PathBuf {
		self.root.join(TOKEN_FILE)
	}

	fn recent_path(&self) -> PathBuf {
		self.root.join(RECENT_LIBRARIES_FILE)
	}

	/// Picks the library to open: explicit path, then `WRAPPEDUP_LIBRARY`,
	/// then the most recently opened library that still exists.
	pub fn resolve_library(&self, cli_path: Option<PathBuf>) -> Result<PathBuf, Error> {
		let from_env = env::var_os("WRAPPEDUP_LIBRARY")
			.map(PathBuf::from)
			.filter(|path| !path.as_os_str().is_empty());
		if let Some(path) = cli_path.or(from_env) {
			return Ok(absolutize(path));
		}

		match self.recent_libraries(MAX_RECENT_LIBRARIES) {
			Ok(recent) => {
				if let Some(entry) = recent.into_iter().find(|entry| entry.path.exists()) {
					debug!("using most recent library {}", entry.path.display());
					return Ok(entry.path);
				}
			}
			Err(err) => warn!("could not read recent libraries: {err}"),
		}

		Err(Error::new(
			ErrorKind::NotFound,
			"no library selected: pass --library <path>, set WRAPPEDUP_LIBRARY, or pick one from `libraries`",
		))
	}

	/// Moves `path` to the front of the recent list, stamped with `now`.
	pub fn remember(&self, path: &Path, now: DateTime<Utc>) -> Result<(), Error> {
		let path = absolutize(path.to_path_buf());
		let mut entries = self.recent_libraries(MAX_RECENT_LIBRARIES)?;
		entries.retain(|entry| entry.path != path);
		entries.insert(
			0,
			RecentLibrary {
				path,
				opened_at: Some(now),
			},
		);
		entries.truncate(MAX_RECENT_LIBRARIES);

		fs::create_dir_all(&self.root)?;
		let body: String = entries.iter().map(format_row).collect();
		fs::write(self.recent_path(), body)
	}

	/// Most recent first.
	pub fn recent_libraries(&self, limit: usize) -> Result<Vec<RecentLibrary>, Error> {
		let raw = match fs::read_to_string(self.recent_path()) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(err) => return Err(err),
		};

		Ok(raw.lines().filter_map(parse_row).take(limit).collect())
	}
}

fn format_row(entry: &RecentLibrary) -> String {
	match entry.opened_at {
		Some(opened_at) => format!("{}\t{}\n", opened_at.to_rfc3339(), entry.path.display()),
		None => format!("{}\n", entry.path.display()),
	}
}

fn parse_row(line: &str) -> Option<RecentLibrary> {
	let line = line.trim();
	if line.is_empty() {
		return None;
	}

	let (opened_at, path) = match line.split_once('\t') {
		Some((stamp, path)) => match DateTime::parse_from_rfc3339(stamp.trim()) {
			Ok(stamp) => (Some(stamp.with_timezone(&Utc)), path.trim()),
			Err(_) => (None, line),
		},
		None => (None, line),
	};

	Some(RecentLibrary {
		path: PathBuf::from(path),
		opened_at,
	})
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = match env::current_dir() {
		Ok(cwd) if path.is_relative() => cwd.join(path),
		_ => path,
	};
	fs::canonicalize(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::PathBuf;

	use chrono::{TimeZone, Utc};

	use super::{StateDir, parse_row};

	fn temp_state(name: &str) -> (StateDir, PathBuf) {
		let mut root = std::env::temp_dir();
		root.push(format!("wrappedup_state_{}_{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&root);
		(StateDir::at(&root), root)
	}

	#[test]
	fn remember_moves_library_to_front() {
		let (state, root) = temp_state("recent");
		let first = root.join("first.wrap");
		let second = root.join("second.wrap");
		let monday = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
		let tuesday = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();

		state.remember(&first, monday).unwrap();
		state.remember(&second, monday).unwrap();
		state.remember(&first, tuesday).unwrap();

		let recent = state.recent_libraries(10).unwrap();
		assert_eq!(recent.len(), 2);
		assert_eq!(recent[0].path, first);
		assert_eq!(recent[0].opened_at, Some(tuesday));
		assert_eq!(recent[1].path, second);
		assert_eq!(state.recent_libraries(1).unwrap().len(), 1);
		let _ = fs::remove_dir_all(root);
	}

	#[test]
	fn missing_recent_file_is_empty() {
		let (state, _root) = temp_state("empty");
		assert!(state.recent_libraries(5).unwrap().is_empty());
		assert!(state.config_path().ends_with("config.toml"));
	}

	#[test]
	fn rows_without_timestamp_still_parse() {
		let row = parse_row("/books/old.wrap").unwrap();
		assert_eq!(row.path, PathBuf::from("/books/old.wrap"));
		assert_eq!(row.opened_at, None);
		assert!(parse_row("   ").is_none());

		let stamped = parse_row("2024-03-04T09:00:00+00:00\t/books/new.wrap").unwrap();
		assert_eq!(stamped.path, PathBuf::from("/books/new.wrap"));
		assert!(stamped.opened_at.is_some());
	}
}
