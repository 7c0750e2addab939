//! Integration tests for opening apps and running routines end to end.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use hark::config::SearchConfig;
use hark::core::activity::FileLog;
use hark::core::assistant::Assistant;
use hark::core::{
    AbortHandle, AppOpener, Choice, Disambiguator, LaunchError, Launcher, LearnedAppStore,
    NameResolver, ProcessHost, ResolutionSource, RoutineEngine, RoutineStep, Storage,
};

type Launches = Rc<RefCell<Vec<PathBuf>>>;

/// Records launches; fails for paths containing `fail_on`.
#[derive(Default)]
struct FakeHost {
    launches: Launches,
    fail_on: Option<String>,
    abort_after_first: Option<AbortHandle>,
    decline_elevation: bool,
}

impl ProcessHost for FakeHost {
    fn start_detached(&self, path: &Path) -> Result<(), LaunchError> {
        self.launches.borrow_mut().push(path.to_path_buf());
        if let Some(handle) = &self.abort_after_first {
            handle.abort();
        }
        if self
            .fail_on
            .as_deref()
            .is_some_and(|f| path.to_string_lossy().contains(f))
        {
            return Err(LaunchError::Spawn {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            });
        }
        Ok(())
    }

    fn start_elevated(&self, path: &Path) -> Result<(), LaunchError> {
        if self.decline_elevation {
            return Err(LaunchError::ElevationDeclined(path.to_path_buf()));
        }
        self.start_detached(path)
    }

    fn is_elevated(&self) -> bool {
        false
    }
}

struct Env {
    data: tempfile::TempDir,
    apps: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            data: tempfile::tempdir().unwrap(),
            apps: tempfile::tempdir().unwrap(),
        }
    }

    fn install(&self, rel: &str) -> PathBuf {
        let path = self.apps.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();
        path
    }

    fn storage(&self) -> Storage {
        Storage::with_root(self.data.path().to_path_buf())
    }

    fn opener(&self, host: FakeHost, chooser: impl Disambiguator + 'static) -> AppOpener {
        let search = SearchConfig {
            roots: vec![self.apps.path().to_path_buf()],
            shortcut_extensions: vec!["lnk".to_string()],
            executable_extensions: vec!["exe".to_string()],
            ..SearchConfig::default()
        };
        AppOpener::new(
            NameResolver::new(&search, Box::new(chooser)).with_commands(&[]),
            Launcher::new(Box::new(host)),
            LearnedAppStore::load(self.storage()),
            Box::new(FileLog::in_dir(self.data.path())),
        )
    }

    fn engine(&self, host: FakeHost) -> RoutineEngine {
        RoutineEngine::new(self.storage(), self.opener(host, |_: &[String]| Choice::Declined))
    }

    fn activity(&self) -> Vec<String> {
        std::fs::read_to_string(self.data.path().join("activity.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[test]
fn routine_isolates_failing_step() {
    let env = Env::new();
    env.install("Spotify/Spotify.exe");
    env.install("Broken/discord.exe");
    env.install("Code/code.exe");

    let launches = Launches::default();
    let mut engine = env.engine(FakeHost {
        launches: Rc::clone(&launches),
        fail_on: Some("Broken".to_string()),
        ..FakeHost::default()
    });
    let _ = engine
        .create(
            "Morning",
            vec![
                RoutineStep::new("spotify", false),
                RoutineStep::new("discord", false),
                RoutineStep::new("code", false),
            ],
        )
        .unwrap();

    let outcomes = engine.run("MORNING").unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes.iter().filter(|o| !o.launched).count(), 1);
    assert!(!outcomes[1].launched);
    assert!(outcomes[1].reason.as_deref().unwrap().contains("denied"));
    assert_eq!(launches.borrow().len(), 3);

    // Only successful launches are learned and logged.
    let learned = LearnedAppStore::load(env.storage());
    assert!(learned.get("spotify").is_some());
    assert!(learned.get("discord").is_none());
    assert!(learned.get("code").is_some());
    let log = env.activity();
    assert_eq!(log.len(), 2);
    assert!(log[0].ends_with("Opened spotify"));
    assert!(log[1].ends_with("Opened code"));
}

#[test]
fn abort_stops_before_next_step() {
    let env = Env::new();
    env.install("a/alpha.exe");
    env.install("b/beta.exe");
    env.install("c/gamma.exe");

    let handle = AbortHandle::new();
    let launches = Launches::default();
    let mut engine = env
        .engine(FakeHost {
            launches: Rc::clone(&launches),
            abort_after_first: Some(handle.clone()),
            ..FakeHost::default()
        })
        .with_abort_handle(handle);
    let _ = engine
        .create(
            "Greek",
            vec![
                RoutineStep::new("alpha", false),
                RoutineStep::new("beta", false),
                RoutineStep::new("gamma", false),
            ],
        )
        .unwrap();

    let outcomes = engine.run("greek").unwrap();

    assert_eq!(launches.borrow().len(), 1);
    assert!(outcomes[0].launched);
    for outcome in &outcomes[1..] {
        assert!(!outcome.launched);
        assert_eq!(outcome.reason.as_deref(), Some("aborted"));
    }

    // A fresh run starts with the flag cleared, then aborts again after one step.
    let outcomes = engine.run("greek").unwrap();
    assert_eq!(outcomes.iter().filter(|o| o.launched).count(), 1);
}

#[test]
fn declined_elevation_fails_only_that_step() {
    let env = Env::new();
    env.install("Tools/regedit.exe");
    env.install("Notes/notes.exe");

    let launches = Launches::default();
    let mut engine = env.engine(FakeHost {
        launches: Rc::clone(&launches),
        decline_elevation: true,
        ..FakeHost::default()
    });
    let _ = engine
        .create(
            "Admin",
            vec![RoutineStep::new("regedit", true), RoutineStep::new("notes", false)],
        )
        .unwrap();

    let outcomes = engine.run("admin").unwrap();

    assert!(!outcomes[0].launched);
    assert!(outcomes[0].reason.as_deref().unwrap().contains("elevation declined"));
    assert!(outcomes[1].launched);
    assert_eq!(launches.borrow().len(), 1);

    // The declined app is neither learned nor logged.
    let learned = LearnedAppStore::load(env.storage());
    assert!(learned.get("regedit").is_none());
    assert!(learned.get("notes").is_some());
    let log = env.activity();
    assert_eq!(log.len(), 1);
    assert!(log[0].ends_with("Opened notes"));
}

#[test]
fn chosen_candidate_is_learned_for_next_time() {
    let env = Env::new();
    env.install("1/python.exe");
    let chosen = env.install("2/python3.exe");
    env.install("3/pythonw.exe");

    let mut opener = env.opener(FakeHost::default(), |options: &[String]| {
        assert_eq!(options.len(), 3);
        Choice::Reply("two".to_string())
    });
    let opened = opener.open("python", false).unwrap();
    assert_eq!(opened.path, chosen);

    // A new session resolves from the learned table without asking.
    let mut opener = env.opener(FakeHost::default(), |_: &[String]| -> Choice {
        panic!("should not ask again")
    });
    let resolution = opener.resolve("Python");
    assert_eq!(resolution.source, ResolutionSource::Learned);
    assert_eq!(resolution.path, Some(chosen));
}

#[test]
fn assistant_loop_until_exit() {
    let env = Env::new();
    env.install("VideoLAN/vlc.exe");
    env.install("Spotify/Spotify.exe");

    let launches = Launches::default();
    let mut engine = env.engine(FakeHost {
        launches: Rc::clone(&launches),
        ..FakeHost::default()
    });
    let _ = engine
        .create("Chill", vec![RoutineStep::new("spotify", false)])
        .unwrap();

    let mut assistant = Assistant::new(engine, hark::core::security::default_blocked());
    let input = [
        "open vlc as administrator",
        "",
        "open blender",
        "format the disk",
        "list routines",
        "run routine chill",
        "tell me a joke",
        "exit",
        "open spotify",
    ]
    .map(str::to_string);

    let mut out = Vec::new();
    assistant.run(input, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("Opened vlc"));
    assert!(!out.contains("vlcistrator"));
    assert!(out.contains("Could not find blender"));
    assert!(out.contains("Blocked: 'format' is not allowed."));
    assert!(out.contains("  - Chill"));
    assert!(out.contains("Starting routine: Chill"));
    assert!(out.contains("  spotify: opened"));
    assert!(out.contains("Command not recognized"));
    assert!(out.trim_end().ends_with("Goodbye!"));
    // Nothing after "exit" runs.
    assert_eq!(launches.borrow().len(), 2);
}
