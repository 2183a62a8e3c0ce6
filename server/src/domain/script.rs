//! Setup script rendering.
//!
//! The rendered script is submitted to the instance's command agent and runs
//! as root. `buildCommand` and `startCommand` are caller-supplied shell and
//! are embedded verbatim: anyone allowed to call `POST /deploy` can run
//! arbitrary commands on the new instance. Everything else that reaches the
//! script is data and is quoted so it cannot change the script's structure.

#![allow(clippy::format_push_string)]

use launchpad_common::DeploymentRequest;

/// Heredoc terminator used for the `.env` block.
pub const ENV_TERMINATOR: &str = "LAUNCHPAD_ENV_EOF";

/// Node.js setup script for the instance's package manager.
const NODE_SETUP_URL: &str = "https://rpm.nodesource.com/setup_16.x";

/// Directory the repository is cloned into.
#[must_use]
pub fn app_dir(identifier: &str) -> String {
    format!("/home/{identifier}/app")
}

/// File receiving the application's stdout and stderr.
#[must_use]
pub fn log_path(identifier: &str) -> String {
    format!("{}/logs.log", app_dir(identifier))
}

/// Wrap `value` in single quotes for POSIX shells.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render the script that installs and launches `request` on an instance
/// tagged `identifier`.
///
/// Steps run in a fixed order: system update, git, clone, optional `.env`,
/// Node.js and yarn, optional build, detached start.
#[must_use]
pub fn render_setup_script(identifier: &str, request: &DeploymentRequest) -> String {
    let app_dir = app_dir(identifier);
    let root = request.root_directory.trim().trim_matches('/');
    let work_dir = if root.is_empty() {
        app_dir.clone()
    } else {
        format!("{app_dir}/{root}")
    };

    let mut script = String::new();
    script.push_str("#!/bin/bash\n");
    script.push('\n');
    script.push_str("# Update the system and install required packages\n");
    script.push_str("sudo yum update -y\n");
    script.push_str("sudo yum install -y git\n");
    script.push('\n');
    script.push_str("# Clone the repository\n");
    script.push_str(&format!(
        "git clone -- {} {}\n",
        shell_quote(request.git_url.trim()),
        shell_quote(&app_dir)
    ));
    script.push('\n');
    script.push_str(&format!("cd {} || exit 1\n", shell_quote(&work_dir)));

    let env_block = request.env_variables.replace("\r\n", "\n");
    if !env_block.trim().is_empty() {
        script.push('\n');
        script.push_str("echo \"Creating .env file with provided environment variables\"\n");
        script.push_str(&format!("cat <<'{ENV_TERMINATOR}' > .env\n"));
        script.push_str(&env_block);
        if !env_block.ends_with('\n') {
            script.push('\n');
        }
        script.push_str(&format!("{ENV_TERMINATOR}\n"));
    }

    script.push('\n');
    script.push_str("echo \"Setting up Node.js project\"\n");
    script.push_str(&format!("curl -sL {NODE_SETUP_URL} | sudo -E bash -\n"));
    script.push_str("sudo yum install -y nodejs\n");
    script.push_str("sudo npm install -g yarn\n");

    if !request.build_command.trim().is_empty() {
        script.push('\n');
        script.push_str("echo \"Running build command\"\n");
        script.push_str(&request.build_command);
        script.push('\n');
    }

    script.push('\n');
    script.push_str("echo \"Starting the application with start command\"\n");
    script.push_str(&format!(
        "nohup {} > {} 2>&1 &\n",
        request.start_command,
        shell_quote(&log_path(identifier))
    ));
    script
}
