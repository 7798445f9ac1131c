use habitally_core::Database;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("habitally/habits.db")
    }

    /// Write a config file that never generates insights on toggle and
    /// hashes passwords at the cheapest bcrypt cost.
    fn quiet_config(&self) {
        let dir = self.xdg_config.join("habitally");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(
            dir.join("config.toml"),
            "[insights]\ngenerate_chance = 0.0\n\n[auth]\nbcrypt_cost = 4\n",
        )
        .expect("failed to write config");
    }
}

fn command(env: &CliTestEnv, args: &[&str]) -> Command {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("habitally"));

    let mut cmd = Command::new(bin_path);
    cmd.args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("HABITALLY_PASSWORD");
    cmd
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    command(env, args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute habitally: {e}"))
}

fn run_with_password(env: &CliTestEnv, password: &str, args: &[&str]) -> Output {
    command(env, args)
        .env("HABITALLY_PASSWORD", password)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute habitally: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "habitally {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn register(env: &CliTestEnv, username: &str, password: &str) {
    let email = format!("{username}@example.com");
    let args = ["register", "--username", username, "--email", email.as_str()];
    let output = run_with_password(env, password, &args);
    assert_success(&args, &output);
}

fn register_ada(env: &CliTestEnv) {
    register(env, "ada", "secret");
}

#[test]
fn register_creates_database_and_login_checks_password() {
    let env = CliTestEnv::new();
    env.quiet_config();
    register_ada(&env);

    let db_path = env.db_path();
    assert!(
        db_path.exists(),
        "database file should exist at {}",
        db_path.display()
    );

    let login = ["login", "--email", "ada@example.com"];
    let good = run_with_password(&env, "secret", &login);
    assert_success(&login, &good);
    assert!(String::from_utf8_lossy(&good.stdout).contains("Logged in as ada"));

    let bad = run_with_password(&env, "nope", &login);
    assert!(!bad.status.success());
    assert!(String::from_utf8_lossy(&bad.stderr).contains("invalid email or password"));
}

#[test]
fn passwords_are_not_accepted_as_arguments() {
    let env = CliTestEnv::new();
    env.quiet_config();
    register_ada(&env);

    let flag = run_with_password(
        &env,
        "secret",
        &["login", "--email", "ada@example.com", "--password", "secret"],
    );
    assert!(!flag.status.success());
    assert!(String::from_utf8_lossy(&flag.stderr).contains("--password"));

    // No env var and no terminal to prompt on
    let missing = run_bin(&env, &["login", "--email", "ada@example.com"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("HABITALLY_PASSWORD"));
}

#[test]
fn backfilled_day_is_logged_without_moving_today() {
    let env = CliTestEnv::new();
    env.quiet_config();
    register_ada(&env);
    run_ok(
        &env,
        &["--user", "ada", "habit", "add", "Read", "--category", "learning"],
    );

    let stdout = run_ok(
        &env,
        &[
            "--user", "ada", "--date", "2024-01-10", "habit", "toggle", "1", "--on", "2024-01-09",
        ],
    );
    assert!(stdout.contains("2024-01-09 marked done"), "unexpected output:\n{stdout}");

    let future = run_bin(
        &env,
        &[
            "--user", "ada", "--date", "2024-01-10", "habit", "toggle", "1", "--on", "2024-01-11",
        ],
    );
    assert!(!future.status.success());

    let history = run_ok(&env, &["--user", "ada", "history"]);
    assert!(history.contains("2024-01-09 done"));
    assert!(!history.contains("2024-01-11"));
}

#[test]
fn toggling_days_builds_streak_and_unlocks_achievements() {
    let env = CliTestEnv::new();
    env.quiet_config();
    register_ada(&env);

    let stdout = run_ok(
        &env,
        &[
            "--user", "ada", "--date", "2024-01-01", "habit", "add", "Read", "--category",
            "learning",
        ],
    );
    assert!(stdout.contains("Created habit Read (id 1)"));

    for date in ["2024-01-01", "2024-01-02", "2024-01-03"] {
        let stdout = run_ok(&env, &["--user", "ada", "--date", date, "habit", "toggle", "1"]);
        assert!(stdout.contains("marked done"), "unexpected output:\n{stdout}");
    }

    let json = run_ok(
        &env,
        &["--user", "ada", "--date", "2024-01-03", "--format", "json", "dashboard"],
    );
    let dash: serde_json::Value = serde_json::from_str(&json).expect("dashboard JSON");
    assert_eq!(dash["completed_today"], 1);
    assert_eq!(dash["longest_current_streak"], 3);
    assert_eq!(dash["stats"]["total_points"], 30);
    assert_eq!(dash["habits"][0]["streak"], 3);

    let achievements = run_ok(&env, &["--user", "ada", "achievements"]);
    assert!(achievements.contains("First Steps"));

    let goals = run_ok(&env, &["--user", "ada", "--date", "2024-01-03", "goals", "1"]);
    assert!(goals.contains("Complete Read for 7 days"));
    assert!(goals.contains("3/7"));

    // The store agrees with what the CLI printed
    let db = Database::open(&env.db_path()).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let stats = db
        .get_user_stats(1)
        .expect("failed to read stats")
        .expect("stats row");
    assert_eq!(stats.total_habits_completed, 3);
}

#[test]
fn insights_and_history_are_listed() {
    let env = CliTestEnv::new();
    env.quiet_config();
    register_ada(&env);

    let stdout = run_ok(&env, &["--user", "ada", "insights"]);
    assert!(stdout.contains("Welcome to Your Habit Ally!"));

    let stdout = run_ok(&env, &["--user", "ada", "--seed", "7", "insight"]);
    assert!(stdout.contains("Start Your First Habit"));

    run_ok(
        &env,
        &["--user", "ada", "habit", "add", "Run", "--category", "health"],
    );
    run_ok(
        &env,
        &["--user", "ada", "--date", "2024-02-01", "habit", "toggle", "1"],
    );
    let history = run_ok(&env, &["--user", "ada", "history"]);
    assert!(history.contains("Run [health]: 1 of 1 logged days completed"));
    assert!(history.contains("2024-02-01 done"));
}

#[test]
fn user_is_required_and_habits_are_private() {
    let env = CliTestEnv::new();
    env.quiet_config();
    register_ada(&env);
    register(&env, "bob", "pw");
    run_ok(
        &env,
        &["--user", "ada", "habit", "add", "Read", "--category", "learning"],
    );

    let missing_user = run_bin(&env, &["dashboard"]);
    assert!(!missing_user.status.success());
    assert!(String::from_utf8_lossy(&missing_user.stderr).contains("--user"));

    let foreign = run_bin(&env, &["--user", "bob", "habit", "toggle", "1"]);
    assert!(!foreign.status.success());
    assert!(String::from_utf8_lossy(&foreign.stderr).contains("forbidden"));
}

#[test]
fn pause_and_delete_account() {
    let env = CliTestEnv::new();
    env.quiet_config();
    register_ada(&env);
    run_ok(
        &env,
        &["--user", "ada", "habit", "add", "Read", "--category", "learning"],
    );

    let stdout = run_ok(&env, &["--user", "ada", "habit", "pause", "1"]);
    assert!(stdout.contains("Read paused"));
    let listed = run_ok(&env, &["--user", "ada", "habit", "list"]);
    assert!(!listed.contains("Read"));
    let listed = run_ok(&env, &["--user", "ada", "habit", "list", "--all"]);
    assert!(listed.contains("(paused)"));

    let refused = run_bin(&env, &["--user", "ada", "delete-account"]);
    assert!(!refused.status.success());

    run_ok(&env, &["--user", "ada", "delete-account", "--yes"]);
    let gone = run_bin(&env, &["--user", "ada", "dashboard"]);
    assert!(!gone.status.success());
    assert!(String::from_utf8_lossy(&gone.stderr).contains("unknown user"));
}
