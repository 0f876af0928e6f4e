// SPDX-License-Identifier: MIT

mod manifest;
mod utils;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use rimapfs::prelude::*;
use std::path::PathBuf;

use crate::manifest::{ChownRequest, Manifest, Overrides};

#[derive(Parser)]
#[command(name = "rimchown", version, about = "Set owner/group of files inside raw APFS images", long_about = None)]
struct Cli {
    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the 99:99 placeholder owner on files of an APFS volume
    Chown {
        /// Raw disk image (bare container or GPT disk)
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Volume role: data, system, preboot, ... or a number
        #[arg(short, long)]
        role: Option<VolumeRole>,
        #[arg(short, long)]
        uid: Option<u32>,
        #[arg(short, long)]
        gid: Option<u32>,
        /// TOML manifest with image, role, uid, gid and paths
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Resolve and check every path, don't write the image
        #[arg(long)]
        dry_run: bool,

        /// Paths relative to the volume root
        paths: Vec<String>,
    },
    /// List the volumes of the container
    Volumes {
        #[arg(short, long)]
        image: PathBuf,
    },
    /// Show the inode record a path resolves to
    Stat {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long, default_value = "data")]
        role: VolumeRole,
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    utils::log::init(utils::log::level_filter(cli.verbose, cli.quiet))?;

    match cli.command {
        Commands::Chown {
            image,
            role,
            uid,
            gid,
            manifest,
            dry_run,
            paths,
        } => {
            let manifest = manifest.as_deref().map(Manifest::from_file).transpose()?;
            let request = ChownRequest::resolve(
                Overrides {
                    image,
                    role,
                    uid,
                    gid,
                    paths,
                },
                manifest,
            )?;
            request.validate()?;
            request.print_summary();

            if dry_run {
                info!("Dry run mode: no data will be written.");
                let checked = check(&request.image, request.role, request.paths.as_slice())
                    .with_context(|| format!("checking {}", request.image.display()))?;
                for (path, record) in checked {
                    info!(
                        "{path}: inode {} owned {}:{}, would become {}:{}",
                        record.inode, record.owner, record.group, request.uid, request.gid
                    );
                }
            } else {
                let patched = chown(
                    &request.image,
                    request.role,
                    request.uid,
                    request.gid,
                    request.paths.as_slice(),
                )
                .with_context(|| format!("patching {}", request.image.display()))?;
                info!("{} inode(s) now owned by {}:{}", patched.len(), request.uid, request.gid);
            }
        }
        Commands::Volumes { image } => {
            let list = volumes(&image).with_context(|| format!("reading {}", image.display()))?;
            println!("{:<8} {:<10} {:<6} {:<6} NAME", "OID", "ROLE", "INDEX", "CASE");
            for volume in list {
                println!(
                    "{:<8} {:<10} {:<6} {:<6} {}",
                    volume.oid,
                    volume.role.to_string(),
                    volume.fs_index,
                    if volume.case_insensitive { "ci" } else { "cs" },
                    volume.name
                );
            }
        }
        Commands::Stat { image, role, path } => {
            let record = stat(&image, role, &path)
                .with_context(|| format!("reading {}", image.display()))?;
            println!("path:    {path}");
            println!("inode:   {}", record.inode);
            println!("parent:  {}", record.parent_id);
            println!("owner:   {}:{}", record.owner, record.group);
            println!("mode:    {:o}", record.mode);
            println!("block:   {}", record.addr);
        }
    }

    Ok(())
}
