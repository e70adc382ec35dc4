//! Build script for pagevox
//!
//! Renders man pages for `pagevox`, each subcommand and each `read` action.

use clap::CommandFactory;
use clap_mangen::Man;
use std::env;
use std::fs::{self, File};
use std::io::Error;
use std::path::{Path, PathBuf};

include!("src/cli.rs");

fn render(page: &clap::Command, dir: &Path, name: &str) -> Result<(), Error> {
    let mut file = File::create(dir.join(format!("{}.1", name)))?;
    Man::new(page.clone()).render(&mut file)
}

fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=PAGEVOX_GEN_MANPAGES");

    let release = env::var("PROFILE").is_ok_and(|profile| profile == "release");
    if !release && env::var_os("PAGEVOX_GEN_MANPAGES").is_none() {
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap_or_else(|_| "target".to_string()));
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let cli = Cli::command();
    render(&cli, &man_dir, "pagevox")?;

    // listen, read, interpret, config
    for command in cli.get_subcommands() {
        render(command, &man_dir, &format!("pagevox-{}", command.get_name()))?;
    }

    // pagevox-read-headers, pagevox-read-links, ...
    if let Some(read) = cli.find_subcommand("read") {
        for action in read.get_subcommands() {
            render(action, &man_dir, &format!("pagevox-read-{}", action.get_name()))?;
        }
    }

    println!("cargo:warning=Man pages generated in: {}", man_dir.display());
    Ok(())
}
