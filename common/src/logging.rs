// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! Shared slog setup.  Every process (and every test that wants logs) builds
//! its root logger here, then hands out per-unit children via
//! `log.new(o!("unit" => ...))`.

use std::fs::OpenOptions;
use std::str::FromStr;

use anyhow::Context;
use slog::Drain;

/// How log records are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LogFormat {
    /// Colorized, human-readable output for a terminal
    Human,
    /// Bunyan-format JSON, one record per line
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            x => Err(anyhow::anyhow!("invalid log format: {x}")),
        }
    }
}

fn async_root(drain: slog::Fuse<slog_async::Async>, name: &str) -> slog::Logger {
    slog::Logger::root(drain, slog::o!("name" => name.to_string()))
}

/// Initialize a root logger.  With no log file, records go to stdout in the
/// requested format; with one, the file is opened in append mode.
pub fn init(
    name: &str,
    log_file: &Option<String>,
    format: LogFormat,
) -> anyhow::Result<slog::Logger> {
    let log = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {path}"))?;
            match format {
                LogFormat::Human => {
                    let decorator = slog_term::PlainDecorator::new(file);
                    let drain =
                        slog_term::FullFormat::new(decorator).build().fuse();
                    let drain = slog_async::Async::new(drain).build().fuse();
                    async_root(drain, name)
                }
                LogFormat::Json => {
                    let drain =
                        slog_bunyan::with_name(
                            Box::leak(name.to_string().into_boxed_str()),
                            file,
                        )
                        .build()
                        .fuse();
                    let drain = slog_async::Async::new(drain).build().fuse();
                    async_root(drain, name)
                }
            }
        }
        None => match format {
            LogFormat::Human => {
                let decorator = slog_term::TermDecorator::new().build();
                let drain =
                    slog_term::FullFormat::new(decorator).build().fuse();
                let drain = slog_async::Async::new(drain).build().fuse();
                async_root(drain, name)
            }
            LogFormat::Json => {
                let drain =
                    slog_bunyan::with_name(
                        Box::leak(name.to_string().into_boxed_str()),
                        std::io::stdout(),
                    )
                    .build();
                let drain = slog_async::Async::new(drain.fuse()).build().fuse();
                async_root(drain, name)
            }
        },
    };
    Ok(log)
}
