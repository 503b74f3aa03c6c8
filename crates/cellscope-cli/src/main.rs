use anyhow::{bail, Context, Result};
use cellscope_lib::{
    aggregate::aggregate,
    channel::Channel,
    io::{
        decode_upload,
        export::{write_aggregate_csv, write_tidy_csv},
        load_workbook, load_workbook_path,
    },
    build_chart_data, Dataset, ExportFormat, Selection, ViewMode,
};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use serde_json::json;
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

mod config;
mod render;

use config::{read_selection_config, SelectionConfig, SelectionOverrides};

#[derive(Parser)]
#[command(
    name = "cellscope",
    version,
    about = "Cellscope: live-cell imaging plate reader dashboards"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Workbook (xlsx, xls or ods)
    #[arg(long)]
    input: PathBuf,
    /// Input holds base64 upload contents (optionally a data: URL)
    #[arg(long)]
    base64: bool,
}

#[derive(Args, Debug, Clone)]
struct SelectionArgs {
    /// Selection file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Treatment to include; repeat for several
    #[arg(long = "treatment")]
    treatments: Vec<String>,
    /// Cell type to include; repeat for several
    #[arg(long = "celltype")]
    celltypes: Vec<String>,
    /// phase, green, red or ratio
    #[arg(long)]
    channel: Option<Channel>,
    /// individual, multi, heatmap or diagnostics
    #[arg(long)]
    view: Option<ViewMode>,
    /// svg or png
    #[arg(long)]
    format: Option<ExportFormat>,
    #[arg(long)]
    filename: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print sheet names plus treatment and cell type options as JSON
    Sheets {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the chart description for a selection as JSON
    Chart {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Render the chart for a selection to SVG or PNG
    Render {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write joined per-well rows (or per-group mean/std) as CSV
    Tidy {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Aggregate the selected groups instead of writing every well
        #[arg(long)]
        aggregate: bool,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    match cli.command {
        Commands::Sheets { input } => cmd_sheets(&input)?,
        Commands::Chart { input, selection } => cmd_chart(&input, selection)?,
        Commands::Render {
            input,
            selection,
            out_dir,
        } => cmd_render(&input, selection, &out_dir)?,
        Commands::Tidy {
            input,
            selection,
            aggregate,
            out,
        } => cmd_tidy(&input, selection, aggregate, out.as_deref())?,
    }
    Ok(())
}

fn load_dataset(input: &InputArgs) -> Result<Dataset> {
    let loaded = if input.base64 {
        let contents = fs::read_to_string(&input.input)
            .with_context(|| format!("failed to read {}", input.input.display()))?;
        let bytes = decode_upload(&contents)
            .with_context(|| format!("decoding upload {}", input.input.display()))?;
        load_workbook(&bytes)
    } else {
        load_workbook_path(&input.input)
    };
    let sheets =
        loaded.with_context(|| format!("loading workbook {}", input.input.display()))?;
    Ok(Dataset::from_sheets(sheets))
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolve_selection(args: SelectionArgs, dataset: &Dataset) -> Result<Selection> {
    let config = match &args.config {
        Some(path) => read_selection_config(path)?,
        None => SelectionConfig::default(),
    };
    let overrides = SelectionOverrides {
        treatments: args.treatments,
        celltypes: args.celltypes,
        channel: args.channel,
        view: args.view,
        format: args.format,
        filename: args.filename,
    };
    let selection = config.resolve(overrides, dataset);
    info!(
        "Selection: view={:?} channel={} treatments={:?} celltypes={:?}",
        selection.view,
        selection.channel,
        selection.conditions.treatments,
        selection.conditions.celltypes
    );
    Ok(selection)
}

fn cmd_sheets(input: &InputArgs) -> Result<()> {
    let dataset = load_dataset(input)?;
    let summary = dataset.summary(&upload_name(&input.input));
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_chart(input: &InputArgs, args: SelectionArgs) -> Result<()> {
    let dataset = load_dataset(input)?;
    let selection = resolve_selection(args, &dataset)?;
    match build_chart_data(&dataset, &selection) {
        Ok(chart) => println!("{}", serde_json::to_string_pretty(&chart)?),
        Err(err) => {
            warn!("Chart not built: {}", err);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "message": err.user_message() }))?
            );
        }
    }
    Ok(())
}

fn cmd_render(input: &InputArgs, args: SelectionArgs, out_dir: &Path) -> Result<()> {
    let dataset = load_dataset(input)?;
    let selection = resolve_selection(args, &dataset)?;
    let chart = match build_chart_data(&dataset, &selection) {
        Ok(chart) => chart,
        Err(err) => bail!("{}", err.user_message()),
    };
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let path = render::render_chart(&chart, out_dir)?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_tidy(
    input: &InputArgs,
    args: SelectionArgs,
    aggregated: bool,
    out: Option<&Path>,
) -> Result<()> {
    let dataset = load_dataset(input)?;
    let selection = resolve_selection(args, &dataset)?;
    let channel = selection.channel;
    let Some(series) = dataset.channel(channel)? else {
        bail!("No data available for {}", channel);
    };
    let join = dataset.tidy(&series)?;
    let writer: Box<dyn Write> = match out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    if aggregated {
        let rows = aggregate(&join.rows, &selection.conditions);
        write_aggregate_csv(writer, &rows)?;
    } else {
        write_tidy_csv(writer, &join.rows)?;
    }
    Ok(())
}
