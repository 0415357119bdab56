// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! The hooks in the order `platformio.ini` lists the scripts.

use {
    crate::{build_date, clangd, manifest, progname, BuildContext, BuildEnv, Target},
    chrono::NaiveDate,
};

/// Run the pre build hooks against `env` and register the post build ones.
///
/// Only a missing firmware version fails; the editor config is a developer
/// convenience and its errors are logged instead. Returns what the editor
/// config generator did.
pub fn pre_build(
    env: &mut dyn BuildEnv,
    today: NaiveDate,
) -> Result<clangd::Outcome, progname::Error> {
    let name = progname::apply(env)?;
    tracing::info!("program name: {name}");

    let define = build_date::apply(env, today);
    tracing::info!("define: {define}");

    let paths = clangd::Paths::for_project(env.project_dir());
    // Hook mode logs errors and reports them as Outcome::Failed.
    let outcome =
        clangd::run(&paths, clangd::RunMode::Hook).unwrap_or(clangd::Outcome::Failed);
    tracing::debug!("clangd config: {outcome:?}");

    env.add_post_action(Target::Program, manifest::post_build);
    Ok(outcome)
}

/// Run the actions [`pre_build`] registered for the linked program. Returns
/// how many ran.
pub fn post_build(context: &BuildContext) -> usize {
    context.run_post_actions(Target::Program)
}
