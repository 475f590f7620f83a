/// End-to-end tests for the CLI
///
/// Everything here fails before the first network call: argument
/// parsing, configuration resolution, and inventory loading all run
/// ahead of the connectivity preflight.
mod exit_code_tests {
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("cpescan").arg("--help").assert().code(0);
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("cpescan").arg("--version").assert().code(0);
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_argument() {
        cargo_bin_cmd!("cpescan")
            .arg("--invalid-option")
            .assert()
            .code(2);
    }

    /// Exit code 3: Application error - no mapping service API key
    #[test]
    fn test_exit_code_missing_api_key() {
        let dir = TempDir::new().unwrap();
        cargo_bin_cmd!("cpescan")
            .current_dir(dir.path())
            .env_remove("GENAI_API_KEY")
            .assert()
            .code(3)
            .stderr(predicate::str::contains("No mapping service API key"));
    }

    /// Exit code 3: Application error - inventory file does not exist
    #[test]
    fn test_exit_code_missing_inventory() {
        let dir = TempDir::new().unwrap();
        cargo_bin_cmd!("cpescan")
            .current_dir(dir.path())
            .env("GENAI_API_KEY", "test-key")
            .args(["--inventory", "missing.toml"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Inventory file not found"));
    }

    /// Exit code 3: Application error - malformed inventory
    #[test]
    fn test_exit_code_malformed_inventory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("inventory.toml"), "[machines.web01\n").unwrap();
        cargo_bin_cmd!("cpescan")
            .current_dir(dir.path())
            .env("GENAI_API_KEY", "test-key")
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Failed to parse inventory file"));
    }

    /// Exit code 3: Application error - unknown machine filter
    #[test]
    fn test_exit_code_unknown_machine_filter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("inventory.toml"),
            "[machines.web01]\nhost = \"192.0.2.10\"\n",
        )
        .unwrap();
        cargo_bin_cmd!("cpescan")
            .current_dir(dir.path())
            .env("GENAI_API_KEY", "test-key")
            .args(["--machine", "ghost"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("not in the inventory"));
    }

    /// Help text mentions the cache flush flag
    #[test]
    fn test_help_mentions_flags() {
        cargo_bin_cmd!("cpescan")
            .arg("--help")
            .assert()
            .stdout(predicate::str::contains("--flush-cache"))
            .stdout(predicate::str::contains("--force-check"))
            .stdout(predicate::str::contains("--dry-run"));
    }
}
