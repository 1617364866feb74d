use clap::Parser;
use ibom_extract::bom::group_components;
use ibom_extract::model::{BoardModel, Component};
use ibom_extract::select::SelectionRect;
use ibom_extract::types::{BBox, Side};
use ibom_extract::{load_file, LoadOptions};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ibom-extract", about = "Extract components from InteractiveHtmlBom exports")]
struct Cli {
    /// Input ibom HTML file
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// CSV with Designator and LCSC columns to fill in missing part numbers
    #[arg(long)]
    lcsc: Option<PathBuf>,

    /// Do not look for BOM-lcsc.csv next to the input
    #[arg(long)]
    no_discover: bool,

    /// Only components inside the rectangle x1,y1,x2,y2 (board units)
    #[arg(long, allow_hyphen_values = true)]
    select: Option<SelectionRect>,

    /// Only components on one side (F or B)
    #[arg(long, value_parser = parse_side)]
    layer: Option<Side>,

    /// Emit BOM rows grouped by value, footprint and LCSC code
    #[arg(long)]
    group: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    board_bbox: BBox,
    components: Vec<&'a Component>,
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s.to_uppercase().as_str() {
        "F" => Ok(Side::Front),
        "B" => Ok(Side::Back),
        _ => Err(format!("Unknown layer: {s}. Use: F, B")),
    }
}

fn filtered<'a>(model: &'a BoardModel, cli: &Cli) -> Vec<&'a Component> {
    match (cli.select, cli.layer) {
        (Some(rect), Some(side)) => model.select_on(&rect, side),
        (Some(rect), None) => {
            let b = rect.bounds();
            model.select(b.minx, b.miny, b.maxx, b.maxy)
        }
        (None, side) => model
            .components()
            .iter()
            .filter(|c| side.map_or(true, |s| c.layer == s))
            .collect(),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let opts = LoadOptions {
        lcsc_csv: cli.lcsc.clone(),
        discover_lcsc: !cli.no_discover,
    };

    let model = match load_file(&cli.input, &opts) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let components = filtered(&model, &cli);
    let json = if cli.group {
        let rows = group_components(components);
        if cli.pretty {
            serde_json::to_string_pretty(&rows)
        } else {
            serde_json::to_string(&rows)
        }
    } else {
        let report = Report {
            board_bbox: model.board_bbox(),
            components,
        };
        if cli.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        }
    }
    .expect("JSON serialization failed");

    if let Some(output_path) = cli.output {
        std::fs::write(&output_path, &json).expect("Failed to write output file");
        eprintln!("Written to {}", output_path.display());
    } else {
        println!("{json}");
    }
}
