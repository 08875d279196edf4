use anyhow::Context as _;
use std::path::Path;
use std::sync::Arc;

use cidbench_core::runner::{IdentifierSink, ListSource, SyntheticSource, read_identifiers};
use cidbench_core::{Executor, RunConfig, RunSummary, WorkloadSource};
use cidbench_http::HttpClient;

use crate::cli::{
    CidListArgs, Command, CommonArgs, DownloadArgs, FindProvidersArgs, IndexerLookupArgs,
    UploadArgs,
};
use crate::exit_codes::ExitCode;
use crate::ops::{Download, FindProviders, IndexerLookup, Operation, Upload};
use crate::output::{self, Persisted, RunHeader};
use crate::run_error::RunError;

pub async fn run(command: Command) -> Result<ExitCode, RunError> {
    match command {
        Command::Upload(args) => upload(args).await,
        Command::Download(args) => download(args).await,
        Command::FindProviders(args) => find_providers(args).await,
        Command::IndexerLookup(args) => indexer_lookup(args).await,
    }
}

async fn upload(args: UploadArgs) -> Result<ExitCode, RunError> {
    let count = (args.count > 0).then_some(args.count);
    let source = SyntheticSource::new(args.size, count)?;
    let executor = Upload::new(HttpClient::default(), &args.common.api)
        .map_err(RunError::InvalidInput)?;

    let workload = output::describe_payloads(args.size, count);
    let out = output::formatter(args.common.output, Operation::Upload, args.common.duration);
    let header = header(Operation::Upload, &args.common, args.common.api.clone(), workload);

    let summary = execute(&args.common, &header, out.as_ref(), source, executor).await?;

    // Persist whatever was produced, also after an interrupt or deadline.
    let mut sink = IdentifierSink::new(&args.cids_out);
    let written = sink
        .flush(&summary.produced)
        .with_context(|| format!("failed to write CIDs to {}", args.cids_out.display()))
        .map_err(RunError::RuntimeError)?;
    let persisted = written.then(|| Persisted {
        path: args.cids_out.clone(),
        count: summary.produced.len(),
    });

    out.print_summary(&summary, persisted.as_ref())
        .map_err(RunError::RuntimeError)?;
    Ok(ExitCode::Success)
}

async fn download(args: DownloadArgs) -> Result<ExitCode, RunError> {
    let source = cid_list(&args.list)?;
    let executor = Download::new(HttpClient::default(), &args.common.api)
        .map_err(RunError::InvalidInput)?;
    let target = args.common.api.clone();

    run_cid_list(Operation::Download, &args.common, &args.list, target, source, executor).await
}

async fn find_providers(args: FindProvidersArgs) -> Result<ExitCode, RunError> {
    let source = cid_list(&args.list)?;
    let executor = FindProviders::new(HttpClient::default(), &args.common.api, args.num_providers)
        .map_err(RunError::InvalidInput)?;
    let target = args.common.api.clone();

    run_cid_list(
        Operation::FindProviders,
        &args.common,
        &args.list,
        target,
        source,
        executor,
    )
    .await
}

async fn indexer_lookup(args: IndexerLookupArgs) -> Result<ExitCode, RunError> {
    let source = cid_list(&args.list)?;
    let executor =
        IndexerLookup::new(HttpClient::default(), &args.indexer).map_err(RunError::InvalidInput)?;
    let target = args.indexer.clone();

    run_cid_list(
        Operation::IndexerLookup,
        &args.common,
        &args.list,
        target,
        source,
        executor,
    )
    .await
}

async fn run_cid_list<E: Executor>(
    operation: Operation,
    common: &CommonArgs,
    list: &CidListArgs,
    target: String,
    source: ListSource,
    executor: E,
) -> Result<ExitCode, RunError> {
    if source.is_empty() {
        tracing::warn!(path = %list.cids.display(), "CID list is empty, nothing to dispatch");
    }

    let order = if list.no_shuffle { "file order" } else { "shuffled" };
    let workload = format!(
        "{} CIDs from {} ({order})",
        source.len(),
        list.cids.display()
    );

    let out = output::formatter(common.output, operation, common.duration);
    let header = header(operation, common, target, workload);

    let summary = execute(common, &header, out.as_ref(), source, executor).await?;
    out.print_summary(&summary, None)
        .map_err(RunError::RuntimeError)?;
    Ok(ExitCode::Success)
}

async fn execute<S, E>(
    common: &CommonArgs,
    header: &RunHeader,
    out: &dyn output::OutputFormatter,
    source: S,
    executor: E,
) -> Result<RunSummary, RunError>
where
    S: WorkloadSource,
    E: Executor,
{
    let cfg = run_config(common);
    cfg.validate()?;

    out.print_header(header);
    let summary = cidbench_core::run(
        cfg,
        source,
        Arc::new(executor),
        out.progress(),
        shutdown_signal(),
    )
    .await?;
    Ok(summary)
}

fn cid_list(list: &CidListArgs) -> Result<ListSource, RunError> {
    let ids = read_cids(&list.cids).map_err(RunError::InvalidInput)?;

    Ok(if list.no_shuffle {
        ListSource::new(ids)
    } else if let Some(seed) = list.seed {
        ListSource::shuffled_with_seed(ids, seed)
    } else {
        ListSource::shuffled(ids, &mut rand::rng())
    })
}

fn read_cids(path: &Path) -> anyhow::Result<Vec<String>> {
    read_identifiers(path).with_context(|| format!("failed to read CID list: {}", path.display()))
}

fn run_config(common: &CommonArgs) -> RunConfig {
    RunConfig {
        rate_per_tick: common.rate,
        tick_interval: common.tick,
        report_interval: common.report_interval,
        op_timeout: common.timeout,
        max_duration: common.duration,
    }
}

fn header(operation: Operation, common: &CommonArgs, target: String, workload: String) -> RunHeader {
    let cfg = run_config(common);
    RunHeader {
        operation,
        target,
        workload,
        rate_per_tick: cfg.rate_per_tick,
        tick: cfg.tick_interval,
        target_rate_per_sec: cfg.target_rate_per_sec(),
        max_duration: cfg.max_duration,
    }
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed the run is never
/// interrupted this way.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("interrupt received, draining in-flight operations");
}
