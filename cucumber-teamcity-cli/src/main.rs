// Copyright (c) The cucumber-teamcity Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use cucumber_teamcity_cli::App;

fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();
    app.init_logging();
    app.exec()
}
