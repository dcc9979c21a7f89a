use anyhow::Result;

mod args;

fn main() -> Result<()> {
    let invocation = args::parse(std::env::args_os());

    let level = if invocation.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    log::info!(
        "Converting {} to {}",
        invocation.options.input.display(),
        invocation.options.output.display()
    );

    // anyhow prints the error and exits with status 1
    let report = scn_core::convert(&invocation.options)?;
    log::info!(
        "Done: {} nodes pruned, {} references inlined, {} triangles added",
        report.pruned,
        report.references_inlined,
        report.triangles_added
    );
    Ok(())
}
