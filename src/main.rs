/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

mod args;
mod config;
mod db;
mod errors;
mod fs;
mod path;
mod rowset;
mod schema;
mod sql;
mod unmount;

use anyhow::Context;
use args::Args;
use clap::Parser;
use config::Options;
use db::DbClient;
use fs::DbFs;
use fuser::MountOption;
use log::{LevelFilter, error, info};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

const BINARY_NAME: &str = "dbfs";

fn main() {
    let status = run();
    if let Err(ref err) = status {
        error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file, args.debug).with_context(|| "failed to init logger")?;
    info!("init logger");

    let options = Options::from_args(args)?;

    if options.unmount {
        info!("unmounting '{}'", options.mountpoint);
        unmount::teardown(&options.mountpoint, BINARY_NAME, options.force);
        return Ok(());
    }

    if options.force {
        unmount::teardown(&options.mountpoint, BINARY_NAME, true);
    }

    info!("connecting to '{}' as '{}'", options.server, options.user);
    let db = DbClient::connect(&options.server, &options.user, &options.password)
        .with_context(|| format!("failed to connect to database server '{}'", options.server))?;

    let mountpoint = options.mountpoint.clone();
    let mount_options = vec![
        MountOption::FSName(BINARY_NAME.to_owned()),
        if options.read_only { MountOption::RO } else { MountOption::RW },
        MountOption::AutoUnmount,
    ];

    let filesystem = DbFs::new(db, options);
    info!("mounting on '{mountpoint}'");
    fuser::mount2(filesystem, &mountpoint, &mount_options)
        .with_context(|| format!("failed to mount on '{mountpoint}'"))?;
    info!("unmounted, exiting");
    Ok(())
}

/// Prefers a `log4rs.yml` in the working directory, matching the way the
/// teacher crate loads its own logger config; when none is present (or
/// `--log-file` names an explicit target), a config is assembled here so a
/// missing YAML file never silently suppresses logging.
fn init_logging(log_file: &Option<String>, debug: bool) -> anyhow::Result<()> {
    if log_file.is_none() && std::path::Path::new("log4rs.yml").exists() {
        log4rs::init_file("log4rs.yml", Default::default())
            .with_context(|| "failed to load log4rs.yml")?;
        return Ok(());
    }

    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let encoder = Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {l} {t} - {m}{n}"));

    let appender_name = "dbfs";
    let appender: Box<dyn log4rs::append::Append> = match log_file {
        Some(path) => Box::new(
            FileAppender::builder()
                .encoder(encoder)
                .build(path)
                .with_context(|| format!("failed to open log file '{path}'"))?,
        ),
        None => Box::new(ConsoleAppender::builder().encoder(encoder).build()),
    };

    let config = log4rs::Config::builder()
        .appender(Appender::builder().build(appender_name, appender))
        .build(Root::builder().appender(appender_name).build(level))
        .with_context(|| "failed to assemble logging configuration")?;
    log4rs::init_config(config).with_context(|| "failed to initialise logging")?;
    Ok(())
}
