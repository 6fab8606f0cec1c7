#[cfg(test)]
mod test {
    use assert_cmd::Command;
    use predicates::{ord::eq, str::contains};
    use rstest::{fixture, rstest};

    #[fixture]
    fn cmd() -> Command {
        Command::cargo_bin("gridsynth").unwrap()
    }

    #[rstest]
    fn quarter_turn(mut cmd: Command) {
        cmd.args(["-t", "0.25", "-p", "3"])
            .assert()
            .success()
            .stdout(eq("T w\n"));
    }

    #[rstest]
    fn several_angles(mut cmd: Command) {
        cmd.args(["-t", "0.5", "-0.25", "0"])
            .assert()
            .success()
            .stdout(eq("S W W W W W W W\nS S S T W W W W W w\n\n"));
    }

    #[rstest]
    fn approximation_passes_check(mut cmd: Command) {
        cmd.args(["-t", "0.1", "-p", "3", "--seed", "7", "--check"])
            .assert()
            .success()
            .stdout(contains("H"))
            .stderr(contains("check flag = 1"));
    }

    #[rstest]
    fn details(mut cmd: Command) {
        cmd.args(["-t", "0.3", "-p", "3", "--seed", "7", "-d"])
            .assert()
            .success()
            .stderr(contains("T count = "))
            .stderr(contains("error = "));
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let run = || {
            Command::cargo_bin("gridsynth")
                .unwrap()
                .args(["-t", "0.37", "-1.2", "-p", "4", "--seed", "11"])
                .output()
                .unwrap()
        };
        let (a, b) = (run(), run());
        assert!(a.status.success());
        assert_eq!(a.stdout, b.stdout);
    }

    #[rstest]
    fn timer(mut cmd: Command) {
        cmd.args(["-t", "0.3", "-p", "2", "--time"])
            .assert()
            .success()
            .stderr(contains("Duration = "));
    }

    #[rstest]
    fn invalid_angle(mut cmd: Command) {
        cmd.args(["-t", "abc"])
            .assert()
            .failure()
            .stderr(contains("Invalid angle provided: abc"));
    }

    #[rstest]
    fn missing_angle(mut cmd: Command) {
        cmd.args(["-p", "3"]).assert().failure();
    }

    #[rstest]
    fn zero_precision(mut cmd: Command) {
        cmd.args(["-t", "0.3", "-p", "0"])
            .assert()
            .failure()
            .stderr(contains("Invalid configuration"));
    }

    #[rstest]
    fn read_and_write_table_conflict(mut cmd: Command) {
        cmd.args(["-t", "0.3", "-r", "a.csv", "-w", "b.csv"])
            .assert()
            .failure()
            .stderr(contains("cannot be used with"));
    }

    #[rstest]
    fn missing_table_file(mut cmd: Command) {
        cmd.args(["-t", "0.3", "-r", "does/not/exist.csv"])
            .assert()
            .failure()
            .stderr(contains("IO error"));
    }

    #[test]
    fn written_table_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let path = path.to_str().unwrap();

        Command::cargo_bin("gridsynth")
            .unwrap()
            .args(["-t", "0.3", "-p", "2", "--seed", "5", "-w", path])
            .assert()
            .success();
        assert!(std::path::Path::new(path).exists());

        Command::cargo_bin("gridsynth")
            .unwrap()
            .args(["-t", "0.3", "-p", "2", "--seed", "5", "-r", path])
            .assert()
            .success();
    }

    #[test]
    fn options_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"precision": 3, "seed": 3, "check": true}"#).unwrap();

        Command::cargo_bin("gridsynth")
            .unwrap()
            .args(["-t", "0.25", "--config", path.to_str().unwrap()])
            .assert()
            .success()
            .stdout(eq("T w\n"));
    }
}
