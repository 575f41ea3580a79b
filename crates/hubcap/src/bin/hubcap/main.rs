mod cli;

use hubcap::documents::Documents;
use hubcap::target::MemoryTarget;
use hubcap::{Filters, Hub};
use indexmap::IndexMap;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HUBCAP_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Servers(input) => report(&input, hubcap::report::summary),
        cli::Command::List(input) => report(&input, hubcap::report::list),
        cli::Command::Tree(input) => report(&input, hubcap::report::tree),
        cli::Command::Export(export_cli) => export(export_cli),
        cli::Command::Configure(configure_cli) => configure(configure_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn report(input: &cli::InputArgs, render: fn(&Hub) -> String) -> anyhow::Result<()> {
    let hub = build(input)?;
    println!("{}", render(&hub));
    Ok(())
}

pub fn export(cli: cli::ExportCommand) -> anyhow::Result<()> {
    let hub = build(&cli.input)?;

    let exports: IndexMap<String, hubcap::node::ServerExport> = hub
        .servers()
        .into_iter()
        .map(|server| {
            let address = server.address().unwrap_or_else(|| server.name());
            (address.to_string(), server.export())
        })
        .collect();

    output(&cli.output, &exports)
}

pub fn configure(cli: cli::ConfigureCommand) -> anyhow::Result<()> {
    let hub = build(&cli.input)?;

    let mut target = MemoryTarget::requesting(cli.tasks);
    hub.configure(&mut target)?;

    output(&cli.output, &target)
}

fn build(input: &cli::InputArgs) -> anyhow::Result<Hub> {
    let filters: Filters = input.filters.iter().map(String::as_str).collect();
    tracing::debug!(%filters, "building hub");

    let documents = load(input)?;
    Ok(Hub::from_documents(filters, &documents)?)
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Documents> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let body = hcl_edit::parser::parse_body(&stdin)?;
        return Ok(hcl::Body::from(body).into());
    }

    let mut documents = Documents::default();

    if input.workdir {
        documents.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        documents.load_file(&hubcap::documents::locate(file_path)?)?;
    }

    for dir_path in &input.directories {
        documents.load_directory(dir_path)?;
    }

    anyhow::ensure!(documents.source_count() > 0, "No files loaded");

    Ok(documents)
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}
