//! Turning a spoken app name into a path.
//!
//! Stages run in strict order and stop at the first hit:
//!
//! 1. built-in system commands
//! 2. learned apps whose path still exists
//! 3. fuzzy correction against system and learned names (stages 1 and 2 are
//!    retried with the corrected name)
//! 4. filesystem search over the configured roots, asking the user to choose
//!    when several entries match

mod choice;
mod fuzzy;
mod search;
mod system;

use std::path::PathBuf;

use crate::config::SearchConfig;
use crate::core::index::LaunchableKinds;
use crate::core::learned::LearnedAppStore;
use crate::core::normalize_name;

pub use choice::{Choice, Disambiguator, NoPrompt, parse_selection};
pub use fuzzy::{correct, similarity};
pub use search::{Candidate, find};
pub use system::{SYSTEM_COMMANDS, SystemCommand, lookup};

/// Which stage produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    SystemCommand,
    Learned,
    Search,
}

/// Outcome of resolving a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Effective name, after fuzzy correction.
    pub name: String,
    /// Path to launch, `None` when nothing suitable was found or chosen.
    pub path: Option<PathBuf>,
    /// Admin requirement carried by the source.
    pub requires_admin: bool,
    /// Whether several entries matched and the user was asked.
    pub ambiguous: bool,
    /// Search matches, shortcuts first.
    pub candidates: Vec<PathBuf>,
    pub source: ResolutionSource,
}

impl Resolution {
    fn not_found(name: String) -> Self {
        Self {
            name,
            path: None,
            requires_admin: false,
            ambiguous: false,
            candidates: Vec::new(),
            source: ResolutionSource::Search,
        }
    }

    /// Whether the name came from the built-in table.
    #[must_use]
    pub fn is_system_command(&self) -> bool {
        self.source == ResolutionSource::SystemCommand
    }
}

/// Resolves names using the system table, learned apps and the filesystem.
pub struct NameResolver {
    commands: &'static [SystemCommand],
    roots: Vec<PathBuf>,
    kinds: LaunchableKinds,
    max_candidates: usize,
    fuzzy_cutoff: f64,
    max_depth: Option<usize>,
    chooser: Box<dyn Disambiguator>,
}

impl std::fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameResolver")
            .field("roots", &self.roots)
            .field("max_candidates", &self.max_candidates)
            .field("fuzzy_cutoff", &self.fuzzy_cutoff)
            .finish_non_exhaustive()
    }
}

impl NameResolver {
    /// Create a resolver using the platform's system commands.
    #[must_use]
    pub fn new(config: &SearchConfig, chooser: Box<dyn Disambiguator>) -> Self {
        Self {
            commands: SYSTEM_COMMANDS,
            roots: config.roots.clone(),
            kinds: LaunchableKinds::new(&config.shortcut_extensions, &config.executable_extensions),
            max_candidates: config.max_candidates.max(1),
            fuzzy_cutoff: config.fuzzy_cutoff,
            max_depth: config.max_depth,
            chooser,
        }
    }

    /// Replace the system command table.
    #[must_use]
    pub fn with_commands(mut self, commands: &'static [SystemCommand]) -> Self {
        self.commands = commands;
        self
    }

    /// Look up a built-in command.
    #[must_use]
    pub fn system_command(&self, name: &str) -> Option<&SystemCommand> {
        lookup(self.commands, name)
    }

    /// Resolve `raw` to a path.
    ///
    /// May block on the disambiguator when the search is ambiguous.
    pub fn resolve(&mut self, raw: &str, learned: &LearnedAppStore) -> Resolution {
        let name = normalize_name(raw);
        if name.is_empty() {
            return Resolution::not_found(name);
        }

        if let Some(hit) = self.known(&name, learned) {
            return hit;
        }

        let known = self
            .commands
            .iter()
            .map(|c| c.name)
            .chain(learned.names());
        let corrected = correct(&name, known, self.fuzzy_cutoff);
        if corrected != name {
            tracing::info!(heard = %name, corrected = %corrected, "corrected app name");
            if let Some(hit) = self.known(&corrected, learned) {
                return hit;
            }
        }

        let candidates = find(&self.roots, &self.kinds, &corrected, self.max_depth);
        self.settle(corrected, candidates)
    }

    /// Stages 1 and 2.
    fn known(&self, name: &str, learned: &LearnedAppStore) -> Option<Resolution> {
        if let Some(command) = self.system_command(name) {
            tracing::debug!(name, path = command.path, "system command");
            return Some(Resolution {
                name: command.name.to_string(),
                path: Some(PathBuf::from(command.path)),
                requires_admin: command.requires_admin,
                ambiguous: false,
                candidates: Vec::new(),
                source: ResolutionSource::SystemCommand,
            });
        }

        let record = learned.get(name)?;
        tracing::debug!(name, path = %record.path.display(), "learned app");
        Some(Resolution {
            name: record.name.clone(),
            path: Some(record.path.clone()),
            requires_admin: record.requires_admin,
            ambiguous: false,
            candidates: Vec::new(),
            source: ResolutionSource::Learned,
        })
    }

    /// Stage 4 result policy.
    fn settle(&mut self, name: String, candidates: Vec<Candidate>) -> Resolution {
        let paths: Vec<PathBuf> = candidates.iter().map(|c| c.path.clone()).collect();

        match candidates.as_slice() {
            [] => {
                tracing::info!(name = %name, "no matching application");
                Resolution::not_found(name)
            }
            [only] => Resolution {
                name,
                path: Some(only.path.clone()),
                requires_admin: false,
                ambiguous: false,
                candidates: paths,
                source: ResolutionSource::Search,
            },
            many => {
                let shown = &many[..many.len().min(self.max_candidates)];
                let options: Vec<String> = shown.iter().map(Candidate::display_name).collect();
                let choice = self.chooser.choose(&options);
                let path = choice.position(options.len()).map(|i| shown[i].path.clone());

                if path.is_none() {
                    tracing::info!(name = %name, ?choice, "no valid selection");
                }

                Resolution {
                    name,
                    path,
                    requires_admin: false,
                    ambiguous: true,
                    candidates: paths,
                    source: ResolutionSource::Search,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::learned::AppRecord;
    use crate::core::storage::Storage;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    const COMMANDS: &[SystemCommand] = &[
        SystemCommand {
            name: "notepad",
            path: "notepad.exe",
            requires_admin: false,
        },
        SystemCommand {
            name: "task manager",
            path: "taskmgr.exe",
            requires_admin: true,
        },
    ];

    struct Fixture {
        _data: tempfile::TempDir,
        root: tempfile::TempDir,
        learned: LearnedAppStore,
    }

    impl Fixture {
        fn new() -> Self {
            let data = tempfile::tempdir().unwrap();
            let learned = LearnedAppStore::empty(Storage::with_root(data.path().to_path_buf()));
            Self {
                _data: data,
                root: tempfile::tempdir().unwrap(),
                learned,
            }
        }

        fn touch(&self, rel: &str) -> PathBuf {
            let path = self.root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"").unwrap();
            path
        }

        fn resolver(&self, chooser: impl Disambiguator + 'static) -> NameResolver {
            let config = SearchConfig {
                roots: vec![self.root.path().to_path_buf()],
                shortcut_extensions: vec!["lnk".to_string()],
                executable_extensions: vec!["exe".to_string()],
                max_candidates: 5,
                fuzzy_cutoff: 0.7,
                max_depth: None,
            };
            NameResolver::new(&config, Box::new(chooser)).with_commands(COMMANDS)
        }
    }

    /// A disambiguator that records what it was shown.
    fn recording(choice: Choice) -> (impl Disambiguator, Rc<RefCell<Vec<Vec<String>>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let chooser = move |options: &[String]| {
            log.borrow_mut().push(options.to_vec());
            choice.clone()
        };
        (chooser, seen)
    }

    fn never_asked(_: &[String]) -> Choice {
        panic!("disambiguator should not be consulted");
    }

    #[test]
    fn system_command_beats_everything() {
        let mut fx = Fixture::new();
        fx.touch("Notepad/notepad.exe");
        let elsewhere = fx.touch("other/notepad.lnk");
        fx.learned.put(AppRecord::new("notepad", &elsewhere, true));

        let res = fx.resolver(never_asked).resolve("  NOTEPAD ", &fx.learned);
        assert_eq!(res.source, ResolutionSource::SystemCommand);
        assert_eq!(res.path, Some(PathBuf::from("notepad.exe")));
        assert!(!res.requires_admin);

        let res = fx.resolver(never_asked).resolve("Task Manager", &fx.learned);
        assert!(res.requires_admin);
        assert!(res.is_system_command());
    }

    #[test]
    fn learned_hit_skips_search() {
        let mut fx = Fixture::new();
        let learned = fx.touch("learned/Spotify.exe");
        fx.touch("a/spotify.exe");
        fx.touch("b/spotify.lnk");
        fx.learned.put(AppRecord::new("spotify", &learned, true));

        let res = fx.resolver(never_asked).resolve("Spotify", &fx.learned);
        assert_eq!(res.source, ResolutionSource::Learned);
        assert_eq!(res.path, Some(learned));
        assert!(res.requires_admin);
        assert!(res.candidates.is_empty());
    }

    #[test]
    fn stale_learned_path_falls_through_to_search() {
        let mut fx = Fixture::new();
        fx.learned.put(AppRecord::new("zoom", "/gone/zoom.exe", false));
        let fresh = fx.touch("Zoom/zoom.exe");

        let res = fx.resolver(never_asked).resolve("zoom", &fx.learned);
        assert_eq!(res.source, ResolutionSource::Search);
        assert_eq!(res.path, Some(fresh));
    }

    #[test]
    fn nothing_found_is_absent() {
        let fx = Fixture::new();
        fx.touch("tools/unrelated.exe");

        let res = fx.resolver(never_asked).resolve("blender", &fx.learned);
        assert_eq!(res.path, None);
        assert!(!res.ambiguous);
        assert!(res.candidates.is_empty());
    }

    #[test]
    fn single_match_is_taken_without_asking() {
        let fx = Fixture::new();
        let gimp = fx.touch("GIMP/gimp-2.10.exe");

        let res = fx.resolver(never_asked).resolve("gimp", &fx.learned);
        assert_eq!(res.path, Some(gimp));
        assert!(!res.requires_admin);
        assert!(!res.ambiguous);
    }

    #[test]
    fn ambiguous_match_uses_the_chosen_candidate() {
        let fx = Fixture::new();
        fx.touch("1/chrome.exe");
        fx.touch("2/chrome_proxy.exe");
        fx.touch("3/chrome_pwa.exe");

        let (chooser, seen) = recording(Choice::Index(2));
        let res = fx.resolver(chooser).resolve("chrome", &fx.learned);

        assert!(res.ambiguous);
        assert_eq!(res.candidates.len(), 3);
        assert_eq!(res.path.as_deref(), Some(res.candidates[1].as_path()));
        assert!(!res.requires_admin);
        assert_eq!(
            seen.borrow().as_slice(),
            &[vec![
                "chrome".to_string(),
                "chrome_proxy".to_string(),
                "chrome_pwa".to_string()
            ]]
        );
    }

    #[test]
    fn spoken_reply_selects_candidate() {
        let fx = Fixture::new();
        fx.touch("1/vlc.exe");
        let second = fx.touch("2/vlc-cache-gen.exe");

        let (chooser, _) = recording(Choice::Reply("option two".to_string()));
        let res = fx.resolver(chooser).resolve("vlc", &fx.learned);
        assert_eq!(res.path, Some(second));
    }

    #[test]
    fn invalid_choice_is_absent() {
        let fx = Fixture::new();
        fx.touch("1/code.exe");
        fx.touch("2/code-tunnel.exe");
        fx.touch("3/codecs.exe");

        for choice in [
            Choice::Index(4),
            Choice::Index(0),
            Choice::Reply("maybe".to_string()),
            Choice::Declined,
        ] {
            let (chooser, _) = recording(choice);
            let res = fx.resolver(chooser).resolve("code", &fx.learned);
            assert!(res.ambiguous);
            assert_eq!(res.path, None);
            assert_eq!(res.candidates.len(), 3);
        }
    }

    #[test]
    fn at_most_five_options_are_offered() {
        let fx = Fixture::new();
        for i in 0..7 {
            fx.touch(&format!("{i}/python{i}.exe"));
        }

        let (chooser, seen) = recording(Choice::Index(6));
        let res = fx.resolver(chooser).resolve("python", &fx.learned);
        assert_eq!(seen.borrow()[0].len(), 5);
        assert_eq!(res.candidates.len(), 7);
        assert_eq!(res.path, None);
    }

    #[test]
    fn shortcuts_are_offered_first() {
        let fx = Fixture::new();
        fx.touch("a/steam.exe");
        let shortcut = fx.touch("z/Steam.lnk");

        let (chooser, _) = recording(Choice::Index(1));
        let res = fx.resolver(chooser).resolve("steam", &fx.learned);
        assert_eq!(res.path, Some(shortcut));
    }

    #[test]
    fn close_name_is_corrected_to_a_system_command() {
        let fx = Fixture::new();
        fx.touch("tools/notepd.exe");

        let res = fx.resolver(never_asked).resolve("notepd", &fx.learned);
        assert_eq!(res.name, "notepad");
        assert_eq!(res.source, ResolutionSource::SystemCommand);
    }

    #[test]
    fn distant_name_is_searched_unchanged() {
        let fx = Fixture::new();
        let paint = fx.touch("paint/paint.exe");

        let res = fx.resolver(never_asked).resolve("paint", &fx.learned);
        assert_eq!(res.name, "paint");
        assert_eq!(res.path, Some(paint));
    }

    #[test]
    fn corrected_stale_name_is_searched_by_corrected_name() {
        let mut fx = Fixture::new();
        fx.learned.put(AppRecord::new("spotify", "/gone/Spotify.exe", false));
        let fresh = fx.touch("Spotify/Spotify.exe");

        let res = fx.resolver(never_asked).resolve("spotifi", &fx.learned);
        assert_eq!(res.name, "spotify");
        assert_eq!(res.source, ResolutionSource::Search);
        assert_eq!(res.path, Some(fresh));
    }

    #[test]
    fn blank_name_resolves_to_nothing() {
        let fx = Fixture::new();
        fx.touch("a/app.exe");
        let res = fx.resolver(never_asked).resolve("   ", &fx.learned);
        assert_eq!(res.path, None);
        assert!(res.candidates.is_empty());
    }
}
