//! Export-script generation
//!
//! Renders the variables a materialized descriptor touched as shell syntax,
//! for `eval "$(dsh print-env)"` style use when process replacement is not
//! wanted.

use crate::materialize::Materialized;
use dsh_platform::Shell;

/// Generate an export script for the given shell
///
/// Values are the final materialized ones, so the script is deterministic
/// and does not depend on evaluation order at source time.
pub fn generate_env_script(materialized: &Materialized, shell: &Shell) -> String {
    let mut script = String::new();

    script.push_str(shell.header());
    script.push('\n');
    script.push_str(&format!(
        "# {} environment for {}\n",
        env!("CARGO_PKG_NAME"),
        materialized.platform.triple()
    ));

    for (name, value) in &materialized.exports {
        script.push_str(&shell.export_var(name, value));
        script.push('\n');
    }

    script
}
