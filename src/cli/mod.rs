// Copyright 2025 OpenObserve Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::sync::Arc;

use config::{utils::time, Settings};
use tokio::sync::watch;

use crate::{
    handler,
    job,
    service::{backfill, db::Partitions, elastic::Elastic, search::LocalStore},
};

fn config_arg() -> clap::Arg {
    clap::Arg::new("config")
        .short('c')
        .long("config")
        .value_name("file")
        .required(true)
        .help("path to the yaml config file")
}

pub async fn cli() -> Result<(), anyhow::Error> {
    let app = clap::Command::new("farmer")
        .version(clap::crate_version!())
        .about("query accelerator for HPC job accounting records")
        .subcommand_required(true)
        .subcommands(&[
            clap::Command::new("backfill")
                .about("pull a period of history from the remote cluster into the local store")
                .arg(config_arg())
                .arg(
                    clap::Arg::new("period")
                        .short('p')
                        .long("period")
                        .value_name("period")
                        .required(true)
                        .help("how far back to pull: an integer plus h, d, w, m or y"),
                ),
            clap::Command::new("serve")
                .about("serve the search facade; blocks until interrupted")
                .arg(config_arg()),
        ])
        .get_matches();

    let (name, command) = app.subcommand().unwrap();
    let config_path = command.get_one::<String>("config").unwrap();
    let settings = Arc::new(Settings::load(config_path)?);
    match name {
        "backfill" => {
            let period = time::parse_period(command.get_one::<String>("period").unwrap())?;
            let stored = backfill::run(&settings, period).await?;
            println!("backfilled {stored} records");
            Ok(())
        }
        "serve" => serve(settings).await,
        _ => unreachable!("unknown subcommand {name}"),
    }
}

async fn serve(settings: Arc<Settings>) -> Result<(), anyhow::Error> {
    let partitions = Arc::new(Partitions::open(&settings.farmer.database_dir).await?);
    let pool = Arc::new(flatfile::Pool::new());
    pool.warmup(64);

    match Elastic::new(&settings).info().await {
        Ok(info) => log::info!(
            "[HTTP] remote cluster version {}",
            info.pointer("/version/number")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown"),
        ),
        Err(e) => log::warn!("[HTTP] remote cluster unreachable: {}", e),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = tokio::task::spawn(job::partitions::run(
        partitions.clone(),
        settings.farmer.update_frequency,
        shutdown_rx,
    ));

    let store = LocalStore::new(partitions, pool, settings.farmer.buffer_size);
    let state = Arc::new(handler::http::AppState::new(settings, store));
    let served = handler::http::serve(state).await;

    let _ = shutdown_tx.send(true);
    let _ = monitor.await;
    served
}
