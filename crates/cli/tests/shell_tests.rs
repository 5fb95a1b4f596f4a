//! End-to-end descriptor tests against a fixture store.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get a Command for the dsh binary.
fn dsh_cmd() -> Command {
    Command::cargo_bin("dsh").unwrap()
}

/// Isolated test environment: a descriptor file plus a fixture store laid
/// out for the current platform.
struct TestEnv {
    temp: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn new(descriptor: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("shell.lua");
        std::fs::write(&config_path, descriptor).unwrap();

        let base = temp.path().join("store").join(triple());

        std::fs::create_dir_all(base.join("uv/bin")).unwrap();
        std::fs::create_dir_all(base.join("cacert/etc/ssl/certs")).unwrap();
        std::fs::write(base.join("cacert/etc/ssl/certs/ca-bundle.crt"), "certs").unwrap();

        std::fs::create_dir_all(base.join("cudatoolkit/gpu/lib")).unwrap();
        std::fs::write(
            base.join("cudatoolkit/package.toml"),
            "unfree = true\n\n[variants]\ngpu = \"gpu\"\n",
        )
        .unwrap();

        Self { temp, config_path }
    }

    fn store_path(&self) -> PathBuf {
        self.temp.path().join("store")
    }

    fn pkg_path(&self, rel: &str) -> PathBuf {
        self.store_path().join(triple()).join(rel)
    }

    /// Install a fake shell into the store: an executable that prints the
    /// environment variables it cares about and exits.
    #[cfg(unix)]
    fn install_fake_shell(&self) {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.pkg_path("fakesh/bin");
        std::fs::create_dir_all(&bin).unwrap();
        let script = bin.join("fakesh");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"endpoint=$HF_ENDPOINT\"\necho \"cuda=$CUDA_PATH\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn cmd(&self, subcommand: &str) -> Command {
        let mut cmd = dsh_cmd();
        cmd.arg(subcommand);
        cmd.arg(&self.config_path);
        cmd.env("DSH_STORE", self.store_path());
        cmd
    }
}

fn triple() -> String {
    dsh_platform::Platform::current().triple()
}

const SCENARIO: &str = r#"
shell {
    allow_unfree = true,
    with_gpu = true,
    packages = { "uv", "cudatoolkit", "cacert" },
    env = {
        { "HF_ENDPOINT", "https://hf-mirror.com" },
        { name = "LD_LIBRARY_PATH", value = "$${pkg:cudatoolkit}/lib", prepend = true },
        { name = "CUDA_PATH", value = "$${pkg:cudatoolkit}" },
        { name = "SSL_CERT_FILE", value = "$${pkg:cacert}/etc/ssl/certs/ca-bundle.crt" },
    },
}
"#;

#[test]
fn resolve_lists_packages_and_variables() {
    let env = TestEnv::new(SCENARIO);

    env.cmd("resolve")
        .assert()
        .success()
        .stderr(predicate::str::contains("uv"))
        .stderr(predicate::str::contains("cudatoolkit"))
        .stderr(predicate::str::contains("HF_ENDPOINT"))
        .stderr(predicate::str::contains("SSL_CERT_FILE"));
}

#[test]
fn print_env_exports_scenario_variables() {
    let env = TestEnv::new(SCENARIO);

    let cuda_gpu = env.pkg_path("cudatoolkit/gpu");
    let bundle = env.pkg_path("cacert/etc/ssl/certs/ca-bundle.crt");

    env.cmd("print-env")
        .arg("--shell")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"export HF_ENDPOINT="https://hf-mirror.com""#,
        ))
        .stdout(predicate::str::contains(format!(
            "{}/lib",
            cuda_gpu.display()
        )))
        .stdout(predicate::str::contains(format!(
            r#"export CUDA_PATH="{}""#,
            cuda_gpu.display()
        )))
        .stdout(predicate::str::contains(format!("{}", bundle.display())));
}

#[test]
fn print_env_is_deterministic() {
    let env = TestEnv::new(SCENARIO);

    let run = |env: &TestEnv| {
        let output = env
            .cmd("print-env")
            .arg("--shell")
            .arg("sh")
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    assert_eq!(run(&env), run(&env));
}

#[test]
fn print_env_fish_syntax() {
    let env = TestEnv::new(SCENARIO);

    env.cmd("print-env")
        .arg("--shell")
        .arg("fish")
        .assert()
        .success()
        .stdout(predicate::str::contains("set -gx HF_ENDPOINT"));
}

#[test]
fn unresolved_package_fails_before_export() {
    let env = TestEnv::new(
        r#"
        shell {
            packages = { "uv", "ghost" },
            env = { { "HF_ENDPOINT", "https://hf-mirror.com" } },
        }
    "#,
    );

    env.cmd("print-env")
        .arg("--shell")
        .arg("bash")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"))
        .stdout(predicate::str::contains("HF_ENDPOINT").not());
}

#[test]
fn unfree_package_blocked_without_flag() {
    let env = TestEnv::new(
        r#"
        shell {
            with_gpu = true,
            packages = { "cudatoolkit" },
        }
    "#,
    );

    env.cmd("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unfree"));
}

#[test]
fn declared_platform_without_package_set_is_unsupported() {
    let env = TestEnv::new(
        r#"
        shell {
            platform = "aarch64-darwin",
            packages = { "uv" },
        }
    "#,
    );

    // The fixture store only carries the current platform's package set;
    // only run when that differs from the declared one.
    if triple() == "aarch64-darwin" {
        return;
    }

    env.cmd("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("aarch64-darwin"));
}

#[test]
#[cfg(unix)]
fn enter_replaces_process_with_exec_target() {
    let env = TestEnv::new(
        r#"
        shell {
            allow_unfree = true,
            with_gpu = true,
            packages = { "uv", "cudatoolkit", "cacert", "fakesh" },
            env = {
                { "HF_ENDPOINT", "https://hf-mirror.com" },
                { name = "CUDA_PATH", value = "$${pkg:cudatoolkit}" },
            },
            exec = "fakesh",
        }
    "#,
    );
    env.install_fake_shell();

    let cuda_gpu = env.pkg_path("cudatoolkit/gpu");

    env.cmd("enter")
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint=https://hf-mirror.com"))
        .stdout(predicate::str::contains(format!(
            "cuda={}",
            cuda_gpu.display()
        )));
}

#[test]
fn enter_fails_for_missing_exec_target() {
    let env = TestEnv::new(
        r#"
        shell {
            packages = { "uv" },
            exec = "no-such-shell-anywhere",
        }
    "#,
    );

    env.cmd("enter")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-such-shell-anywhere"));
}

#[test]
#[cfg(unix)]
fn tilde_paths_expand_against_home() {
    let env = TestEnv::new(SCENARIO);

    // The fixture directory doubles as $HOME, so both the descriptor path
    // and the --store flag can be given with a leading tilde.
    dsh_cmd()
        .arg("resolve")
        .arg("~/shell.lua")
        .arg("--store")
        .arg("~/store")
        .env("HOME", env.temp.path())
        .env_remove("DSH_STORE")
        .assert()
        .success()
        .stderr(predicate::str::contains("uv"))
        .stderr(predicate::str::contains("HF_ENDPOINT"));
}

#[test]
#[cfg(unix)]
fn store_env_var_expands_tilde() {
    let env = TestEnv::new(SCENARIO);

    dsh_cmd()
        .arg("resolve")
        .arg(&env.config_path)
        .env("HOME", env.temp.path())
        .env("DSH_STORE", "~/store")
        .assert()
        .success()
        .stderr(predicate::str::contains("uv"));
}

#[test]
fn store_flag_overrides_env_var() {
    let env = TestEnv::new(SCENARIO);
    let empty = TempDir::new().unwrap();

    // Pointing --store at an empty directory must make resolution fail even
    // though DSH_STORE still names the populated fixture store.
    env.cmd("resolve")
        .arg("--store")
        .arg(empty.path())
        .assert()
        .failure();
}
