pub mod app;
pub mod cli;
pub mod commands;
pub mod composer;
pub mod config;
pub mod datetime;
pub mod edit;
pub mod persist;
pub mod render;
pub mod reorder;
pub mod store;
pub mod task;

use std::ffi::OsString;
use std::io::{
  self,
  IsTerminal
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting jot"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.jotrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;
  let key = cfg.storage_key()?;

  let slots =
    persist::FileSlots::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open storage at \
           {}",
          data_dir.display()
        )
      })?;
  let bridge =
    persist::PersistenceBridge::new(
      Box::new(slots),
      key
    );
  let app = app::App::open(bridge);

  let renderer =
    render::Renderer::new(&cfg)?;
  let mut session =
    commands::Session::new(
      app,
      &cfg,
      renderer,
      io::stdout().lock(),
      datetime::today()
    );

  if cli.rest.is_empty() {
    let stdin = io::stdin();
    let prompt =
      stdin.is_terminal();
    session.run_loop(
      stdin.lock(),
      prompt
    )?;
  } else {
    let line = cli
      .rest
      .iter()
      .map(|arg| {
        arg.to_string_lossy().to_string()
      })
      .collect::<Vec<_>>()
      .join(" ");
    debug!(line = %line, "running single command line");
    session.run_line(&line)?;
    session.finish()?;
  }

  info!("done");
  Ok(())
}
