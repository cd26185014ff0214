//! The bootstrap plan: which tools, which checkout, which configs.
//!
//! Everything here is defined once at startup. The plan produces the
//! ordered step list the orchestrator executes: probes and installers
//! first, then fetch/build, then config rendering — rendering reads tool
//! paths the earlier steps resolved.

use crate::probe::VersionProbe;
use crate::repo::{self, RepoSpec};
use crate::secrets::{OutputMasker, SecretStore};
use crate::steps::Step;
use crate::template::{self, Mapping, OverwritePolicy, TemplateSource, TemplateSpec};
use crate::tools::{self, InstallStrategy, ToolSpec};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the open-data service token.
pub const SOCRATA_TOKEN_KEY: &str = "SOCRATA_APP_TOKEN";
/// Environment variable holding the GitHub token.
pub const GITHUB_TOKEN_KEY: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";

const SOCRATA_TOKEN_PLACEHOLDER: &str = "YOUR_SOCRATA_APP_TOKEN_HERE";
const GITHUB_TOKEN_PLACEHOLDER: &str = "YOUR_GITHUB_TOKEN_HERE";

const OPENDATA_REMOTE: &str = "https://github.com/civic-mcp/opendata-mcp.git";

const CLONE_TIMEOUT: Duration = Duration::from_secs(300);
const DEPS_TIMEOUT: Duration = Duration::from_secs(600);
const BUILD_TIMEOUT: Duration = Duration::from_secs(600);
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Filesystem layout of the bootstrap workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Workspace root (`--home`, `$GROUNDWORK_HOME`, or `~/.groundwork`).
    pub home: PathBuf,
    /// Secrets file path (`--secrets` or `<home>/secrets.env`).
    pub secrets_path: PathBuf,
}

impl Workspace {
    /// Resolve the workspace from CLI overrides.
    pub fn resolve(home: Option<PathBuf>, secrets: Option<PathBuf>) -> Self {
        let home = home
            .or_else(|| std::env::var_os("GROUNDWORK_HOME").map(PathBuf::from))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".groundwork")
            });
        let secrets_path = secrets.unwrap_or_else(|| home.join("secrets.env"));
        Self { home, secrets_path }
    }

    /// Directory for rendered MCP client configs.
    pub fn config_dir(&self) -> PathBuf {
        self.home.join("config")
    }

    /// Directory for source checkouts.
    pub fn servers_dir(&self) -> PathBuf {
        self.home.join("servers")
    }
}

/// The full bootstrap plan.
pub struct BootstrapPlan {
    pub workspace: Workspace,
    pub tools: Vec<ToolSpec>,
    pub repos: Vec<RepoSpec>,
    force: bool,
}

impl BootstrapPlan {
    /// Build the shipped plan for a workspace.
    pub fn new(workspace: Workspace, force: bool) -> Self {
        let tools = vec![
            // git comes from the base image; there is no strategy worth
            // trying if it is missing, so a miss is report-only.
            ToolSpec::new("git", VersionProbe::new("git")),
            ToolSpec::new("node", VersionProbe::new("node"))
                .with_strategy(InstallStrategy::new(
                    "apt",
                    "sudo apt-get install -y nodejs npm",
                    INSTALL_TIMEOUT,
                )),
            ToolSpec::new("github-mcp", VersionProbe::new("mcp-server-github"))
                .with_strategy(InstallStrategy::new(
                    "npm",
                    "npm install -g @modelcontextprotocol/server-github",
                    INSTALL_TIMEOUT,
                ))
                .with_strategy(InstallStrategy::new(
                    "pipx",
                    "pipx install mcp-server-github",
                    INSTALL_TIMEOUT,
                ))
                .with_strategy(InstallStrategy::new(
                    "pip --user",
                    "pip install --user mcp-server-github",
                    INSTALL_TIMEOUT,
                )),
        ];

        let repos = vec![RepoSpec {
            name: "opendata-mcp".to_string(),
            remote: OPENDATA_REMOTE.to_string(),
            target: workspace.servers_dir().join("opendata-mcp"),
            deps_command: "npm install".to_string(),
            build_command: "npm run build".to_string(),
            artifact: PathBuf::from("dist/index.js"),
            clone_timeout: CLONE_TIMEOUT,
            deps_timeout: DEPS_TIMEOUT,
            build_timeout: BUILD_TIMEOUT,
        }];

        Self {
            workspace,
            tools,
            repos,
            force,
        }
    }

    /// Assemble the ordered step list.
    ///
    /// Secrets are resolved here, before any step runs, and registered with
    /// the masker so nothing downstream can echo them.
    pub fn steps(&self, secrets: &SecretStore, masker: &mut OutputMasker) -> Vec<Step> {
        let mut steps: Vec<Step> = Vec::new();

        for tool in &self.tools {
            let spec = tool.clone();
            steps.push(Step::new(
                spec.name.clone(),
                Box::new(move |ctx| tools::ensure(&spec, ctx)),
            ));
        }

        for repo in &self.repos {
            let spec = repo.clone();
            steps.push(Step::new(
                spec.clone_step(),
                Box::new(move |_ctx| repo::ensure_clone(&spec)),
            ));

            let spec = repo.clone();
            steps.push(Step::new(
                spec.deps_step(),
                Box::new(move |_ctx| repo::ensure_deps(&spec)),
            ));

            let spec = repo.clone();
            steps.push(Step::new(
                spec.build_step(),
                Box::new(move |ctx| repo::ensure_build(&spec, ctx)),
            ));
        }

        let socrata = template::resolve(SOCRATA_TOKEN_KEY, secrets, SOCRATA_TOKEN_PLACEHOLDER);
        let github = template::resolve(GITHUB_TOKEN_KEY, secrets, GITHUB_TOKEN_PLACEHOLDER);
        if socrata.is_secret() {
            masker.add_secret(socrata.value.clone());
        }
        if github.is_secret() {
            masker.add_secret(github.value.clone());
        }

        let opendata_repo = self.repos[0].clone();
        let config_dir = self.workspace.config_dir();
        let force = self.force;

        let destination = config_dir.join("opendata-mcp.json");
        steps.push(Step::new(
            "render opendata-mcp config",
            Box::new(move |ctx| {
                let node = match ctx.tool_path("node") {
                    Some(p) => Mapping::new("__NODE_BIN__", p.display().to_string()),
                    // Degraded: the installer never found node; a bare
                    // "node" keeps the config human-repairable.
                    None => Mapping::degraded("__NODE_BIN__", "node"),
                };
                let server_path = opendata_repo.artifact_path();
                let server = if opendata_repo.is_built() {
                    Mapping::new("__OPENDATA_SERVER__", server_path.display().to_string())
                } else {
                    Mapping::degraded("__OPENDATA_SERVER__", server_path.display().to_string())
                };
                let spec = TemplateSpec {
                    name: "opendata-mcp config".to_string(),
                    source: TemplateSource::Embedded("opendata-mcp.json.tmpl"),
                    destination: destination.clone(),
                    mapping: vec![
                        node,
                        server,
                        Mapping::from_resolved("__SOCRATA_APP_TOKEN__", &socrata),
                    ],
                    overwrite: OverwritePolicy::IfAbsent,
                };
                template::render(&spec, force)
            }),
        ));

        let destination = config_dir.join("github-mcp.json");
        steps.push(Step::new(
            "render github-mcp config",
            Box::new(move |ctx| {
                let bin = match ctx.tool_path("github-mcp") {
                    Some(p) => Mapping::new("__GITHUB_MCP_BIN__", p.display().to_string()),
                    None => Mapping::degraded("__GITHUB_MCP_BIN__", "mcp-server-github"),
                };
                let spec = TemplateSpec {
                    name: "github-mcp config".to_string(),
                    source: TemplateSource::Embedded("github-mcp.json.tmpl"),
                    destination: destination.clone(),
                    mapping: vec![bin, Mapping::from_resolved("__GITHUB_TOKEN__", &github)],
                    overwrite: OverwritePolicy::IfAbsent,
                };
                template::render(&spec, force)
            }),
        ));

        steps
    }

    /// Describe what a run would do, for `--dry-run`.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for tool in &self.tools {
            let strategies: Vec<&str> = tool.strategies.iter().map(|s| s.label.as_str()).collect();
            lines.push(if strategies.is_empty() {
                format!("{}: probe only", tool.name)
            } else {
                format!("{}: probe, then install via {}", tool.name, strategies.join(" → "))
            });
        }
        for repo in &self.repos {
            lines.push(format!(
                "{}: clone {} into {}, then `{}` and `{}`",
                repo.name,
                repo.remote,
                repo.target.display(),
                repo.deps_command,
                repo.build_command,
            ));
        }
        lines.push(format!(
            "render configs into {}",
            self.workspace.config_dir().display()
        ));
        lines
    }
}
