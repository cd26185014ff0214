//! End-to-end bootstrap tests through the library API.
//!
//! These compose real steps (installer, clone, deps, build, render)
//! against a throwaway workspace, a local git remote, and a fake tool
//! binary, then assert the run-report contract: always Ready, idempotent
//! on re-run, warnings instead of failures.

#![cfg(unix)]

use groundwork::probe::VersionProbe;
use groundwork::repo::{self, RepoSpec};
use groundwork::runner::{self, Outcome, RunOptions};
use groundwork::secrets::{OutputMasker, SecretStore};
use groundwork::shell::{execute, CommandOptions};
use groundwork::steps::{Step, StepStatus};
use groundwork::template::{self, Mapping, OverwritePolicy, TemplateSource, TemplateSpec};
use groundwork::tools::{self, InstallStrategy, InstallerContext, ToolSpec};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn git_available() -> bool {
    VersionProbe::new("git").detect().is_present()
}

fn sh(command: &str, cwd: &Path) -> bool {
    let options = CommandOptions {
        cwd: Some(cwd.to_path_buf()),
        timeout: Some(Duration::from_secs(30)),
        ..Default::default()
    };
    execute(command, &options).map(|r| r.success).unwrap_or(false)
}

/// Create a local "remote" repository to clone from.
fn make_local_remote(temp: &TempDir) -> PathBuf {
    let remote = temp.path().join("remote-opendata-mcp");
    fs::create_dir_all(&remote).unwrap();
    fs::write(remote.join("package.json"), "{\"name\":\"opendata-mcp\"}").unwrap();
    assert!(sh("git init -q .", &remote));
    assert!(sh(
        "git -c user.name=test -c user.email=test@example.com add -A && \
         git -c user.name=test -c user.email=test@example.com commit -qm init",
        &remote
    ));
    remote
}

struct Fixture {
    workspace: TempDir,
    bin_dir: PathBuf,
    repo: RepoSpec,
    template_path: PathBuf,
}

impl Fixture {
    fn new(build_command: &str) -> Self {
        let workspace = TempDir::new().unwrap();
        let bin_dir = workspace.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();

        let remote = make_local_remote(&workspace);
        let repo = RepoSpec {
            name: "opendata-mcp".to_string(),
            remote: remote.display().to_string(),
            target: workspace.path().join("servers/opendata-mcp"),
            deps_command: "touch deps-ran".to_string(),
            build_command: build_command.to_string(),
            artifact: PathBuf::from("dist/index.js"),
            clone_timeout: Duration::from_secs(30),
            deps_timeout: Duration::from_secs(30),
            build_timeout: Duration::from_secs(30),
        };

        let template_path = workspace.path().join("opendata.json.tmpl");
        fs::write(
            &template_path,
            "{\"command\":\"__SERVER__\",\"token\":\"__TOKEN__\"}",
        )
        .unwrap();

        Self {
            workspace,
            bin_dir,
            repo,
            template_path,
        }
    }

    fn config_path(&self) -> PathBuf {
        self.workspace.path().join("config/opendata.json")
    }

    /// Assemble the full step list. Called once per run: steps are
    /// consumed by execution, re-running means re-assembling.
    fn steps(&self, secrets: &SecretStore) -> Vec<Step> {
        let mut steps = Vec::new();

        // Installer: the tool is absent until the strategy drops a fake
        // binary into our bin dir; detection is pinned to that dir.
        let bin_dir = self.bin_dir.clone();
        let install_cmd = format!(
            "printf '#!/bin/sh\\necho v1.2.3\\n' > {bin}/fetchctl && chmod +x {bin}/fetchctl",
            bin = bin_dir.display()
        );
        let spec = ToolSpec::new("fetchctl", VersionProbe::new("fetchctl")).with_strategy(
            InstallStrategy::new("script", install_cmd, Duration::from_secs(30)),
        );
        steps.push(Step::new(
            "fetchctl",
            Box::new(move |ctx| {
                let run = |cmd: &str, timeout: Duration| {
                    execute(cmd, &CommandOptions::timed(timeout))
                        .map(|r| r.success)
                        .unwrap_or(false)
                };
                let detect =
                    |probe: &VersionProbe| probe.detect_on_path(std::slice::from_ref(&bin_dir));
                let ictx = InstallerContext {
                    run_command: &run,
                    detect: &detect,
                };
                tools::ensure_with(&spec, ctx, &ictx)
            }),
        ));

        let spec = self.repo.clone();
        steps.push(Step::new(
            spec.clone_step(),
            Box::new(move |_| repo::ensure_clone(&spec)),
        ));
        let spec = self.repo.clone();
        steps.push(Step::new(
            spec.deps_step(),
            Box::new(move |_| repo::ensure_deps(&spec)),
        ));
        let spec = self.repo.clone();
        steps.push(Step::new(
            spec.build_step(),
            Box::new(move |ctx| repo::ensure_build(&spec, ctx)),
        ));

        let token = template::resolve("SVC_TOKEN_TEST", secrets, "YOUR_TOKEN_HERE");
        let repo_spec = self.repo.clone();
        let source = self.template_path.clone();
        let destination = self.config_path();
        steps.push(Step::new(
            "render opendata config",
            Box::new(move |_| {
                let server = if repo_spec.is_built() {
                    Mapping::new("__SERVER__", repo_spec.artifact_path().display().to_string())
                } else {
                    Mapping::degraded(
                        "__SERVER__",
                        repo_spec.artifact_path().display().to_string(),
                    )
                };
                let spec = TemplateSpec {
                    name: "opendata config".to_string(),
                    source: TemplateSource::File(source.clone()),
                    destination: destination.clone(),
                    mapping: vec![server, Mapping::from_resolved("__TOKEN__", &token)],
                    overwrite: OverwritePolicy::IfAbsent,
                };
                template::render(&spec, false)
            }),
        ));

        steps
    }
}

fn statuses(report: &runner::RunReport) -> Vec<(String, StepStatus)> {
    report
        .steps
        .iter()
        .map(|s| (s.name.clone(), s.status))
        .collect()
}

#[test]
fn clean_filesystem_run_bootstraps_everything() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }

    let fixture = Fixture::new("mkdir -p dist && touch dist/index.js");
    let secrets = SecretStore::parse("SVC_TOKEN_TEST=real-token-value");

    let report = runner::execute(
        fixture.steps(&secrets),
        &OutputMasker::new(),
        &RunOptions::default(),
    );

    assert_eq!(report.outcome, Outcome::Ready);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);

    // Installer ran a strategy because the tool was absent.
    assert_eq!(report.steps[0].name, "fetchctl");
    assert_eq!(report.steps[0].status, StepStatus::Succeeded);

    // The checkout is real and non-empty.
    assert!(fixture.repo.target.join("package.json").exists());
    assert!(fixture.repo.is_built());

    // The rendered config carries the real secret.
    let config = fs::read_to_string(fixture.config_path()).unwrap();
    assert!(config.contains("real-token-value"));
    assert!(config.contains("dist/index.js"));
}

#[test]
fn second_run_flips_mutating_steps_to_skipped() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }

    let fixture = Fixture::new("mkdir -p dist && touch dist/index.js");
    let secrets = SecretStore::parse("SVC_TOKEN_TEST=stable-token");

    let first = runner::execute(
        fixture.steps(&secrets),
        &OutputMasker::new(),
        &RunOptions::default(),
    );
    let second = runner::execute(
        fixture.steps(&secrets),
        &OutputMasker::new(),
        &RunOptions::default(),
    );

    for ((name, before), (_, after)) in statuses(&first).iter().zip(statuses(&second).iter()) {
        match before {
            StepStatus::Succeeded => assert_eq!(
                *after,
                StepStatus::Skipped,
                "step '{}' should skip on re-run",
                name
            ),
            other => assert_eq!(after, other, "step '{}' changed outcome", name),
        }
    }
}

#[test]
fn failing_build_still_ends_ready_with_remediation() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }

    let fixture = Fixture::new("exit 1");
    let secrets = SecretStore::empty();

    let report = runner::execute(
        fixture.steps(&secrets),
        &OutputMasker::new(),
        &RunOptions::default(),
    );

    assert_eq!(report.outcome, Outcome::Ready);

    let build = report
        .steps
        .iter()
        .find(|s| s.name == "build opendata-mcp")
        .unwrap();
    assert_eq!(build.status, StepStatus::Failed);

    // The warning names the exact command to re-run.
    let warning = report
        .warnings
        .iter()
        .find(|w| w.contains("build opendata-mcp"))
        .unwrap();
    assert!(warning.contains("retry with: cd "));

    // Rendering still happened, degraded, pointing at the path the build
    // would have produced.
    let config = fs::read_to_string(fixture.config_path()).unwrap();
    assert!(config.contains("dist/index.js"));
    let render = report
        .steps
        .iter()
        .find(|s| s.name == "render opendata config")
        .unwrap();
    assert_eq!(render.status, StepStatus::Warned);
}

#[test]
fn missing_secret_renders_placeholder_and_never_fails() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }

    let fixture = Fixture::new("mkdir -p dist && touch dist/index.js");
    let secrets = SecretStore::empty();

    let report = runner::execute(
        fixture.steps(&secrets),
        &OutputMasker::new(),
        &RunOptions::default(),
    );

    assert_eq!(report.outcome, Outcome::Ready);
    let config = fs::read_to_string(fixture.config_path()).unwrap();
    assert!(config.contains("YOUR_TOKEN_HERE"));
}

#[test]
fn secret_values_never_reach_report_text() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }

    let fixture = Fixture::new("mkdir -p dist && touch dist/index.js");
    let secrets = SecretStore::parse("SVC_TOKEN_TEST=hunter2-token");

    let mut masker = OutputMasker::new();
    masker.add_secrets(secrets.values().map(str::to_string));

    let report = runner::execute(fixture.steps(&secrets), &masker, &RunOptions::default());

    let json = report.to_json().unwrap();
    assert!(!json.contains("hunter2-token"));
    assert!(!report.render_text().contains("hunter2-token"));
}
