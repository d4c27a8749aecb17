#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the building sandbox against a save file.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grid_sandbox_core::{BuildingTypeId, CellCoord};
use grid_sandbox_registry::{BuildingRegistry, JsonFile};
use grid_sandbox_shell::{
    render_grid, ClickOutcome, Editor, HeadlessScene, SandboxConfig, UniformGridGeometry,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

type SandboxEditor = Editor<UniformGridGeometry, HeadlessScene>;

#[derive(Debug, Parser)]
#[command(name = "grid-sandbox")]
#[command(about = "Place and remove buildings on a grid", long_about = None)]
struct Cli {
    /// Sandbox configuration (TOML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Save document to operate on, overriding the configured location.
    #[arg(long, global = true)]
    save: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Place a building with its bottom-left corner at the given cell
    Place {
        /// Building type identifier from the catalog
        building: String,
        /// Column of the bottom-left cell
        #[arg(allow_negative_numbers = true)]
        x: i32,
        /// Row of the bottom-left cell
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },
    /// Remove the building covering the given cell
    Delete {
        /// Column of the cell
        #[arg(allow_negative_numbers = true)]
        x: i32,
        /// Row of the cell
        #[arg(allow_negative_numbers = true)]
        y: i32,
    },
    /// List placed buildings in placement order
    List,
    /// Draw the occupancy grid
    Show,
    /// Upgrade the save document to the current format
    Migrate,
    /// List the building types that can be placed
    Catalog,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SandboxConfig::from_path(path)?,
        None => SandboxConfig::default(),
    };

    if let Command::Catalog = cli.command {
        return print_catalog(&config, out);
    }

    let save_path = match cli.save {
        Some(path) => path,
        None => config.resolved_save_path()?,
    };
    info!(path = %save_path.display(), "using save document");
    let mut editor = open_editor(&config, save_path.clone());
    let reload = editor
        .load_buildings()
        .with_context(|| format!("failed to load buildings from {}", save_path.display()))?;

    match cli.command {
        Command::Place { building, x, y } => {
            let cell = CellCoord::new(x, y);
            editor.select_building_by_id(&BuildingTypeId::new(building))?;
            let outcome = editor
                .click_cell(cell)
                .with_context(|| format!("failed to place building at {cell}"))?;
            if let ClickOutcome::Placed(record) = outcome {
                writeln!(out, "placed {} at {cell}", record.instance_id())?;
            }
        }
        Command::Delete { x, y } => {
            let cell = CellCoord::new(x, y);
            let _ = editor.toggle_delete_mode();
            match editor
                .click_cell(cell)
                .with_context(|| format!("failed to delete building at {cell}"))?
            {
                ClickOutcome::Deleted(record) => {
                    writeln!(out, "deleted {}", record.instance_id())?;
                }
                _ => writeln!(out, "no building at {cell}")?,
            }
        }
        Command::List => {
            for record in editor.registry().records() {
                let region = record.region();
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}x{}",
                    record.instance_id(),
                    record.type_id(),
                    region.origin(),
                    region.size().width(),
                    region.size().height()
                )?;
            }
        }
        Command::Show => write!(out, "{}", render_grid(editor.grid(), editor.registry()))?,
        Command::Migrate => match reload.load.migration {
            Some(report) if report.migrated() => {
                writeln!(
                    out,
                    "migrated {} from version {} to {}",
                    save_path.display(),
                    report.original_version,
                    report.final_version
                )?;
                for step in &report.steps_applied {
                    writeln!(out, "  {step}")?;
                }
                if !reload.load.repersisted {
                    anyhow::bail!("migrated document could not be written back");
                }
            }
            Some(report) => writeln!(
                out,
                "{} is already at version {}",
                save_path.display(),
                report.final_version
            )?,
            None => writeln!(out, "no save document at {}", save_path.display())?,
        },
        Command::Catalog => {}
    }
    Ok(())
}

fn open_editor(config: &SandboxConfig, save_path: PathBuf) -> SandboxEditor {
    Editor::new(
        config.grid(),
        BuildingRegistry::new(JsonFile::new(save_path)),
        config.catalog(),
        config.geometry(),
        HeadlessScene::new(),
    )
}

fn print_catalog(config: &SandboxConfig, out: &mut impl Write) -> Result<()> {
    for (index, building) in config.catalog().iter().enumerate() {
        let footprint = building.footprint();
        writeln!(
            out,
            "{index}\t{}\t{}x{}\t{}",
            building.id(),
            footprint.width(),
            footprint.height(),
            building.visual_asset()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    fn invoke(save: &Path, args: &[&str]) -> Result<String> {
        let save = save.to_str().expect("utf-8 temp path");
        let mut argv = vec!["grid-sandbox", "--save", save];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("arguments parse");
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out).expect("utf-8 output"))
    }

    #[test]
    fn place_list_and_delete_through_the_save_file() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let save = dir.path().join("SaveData.json");

        let placed = invoke(&save, &["place", "house", "5", "5"]).expect("house fits");
        assert!(placed.starts_with("placed house_"));

        let rejected = invoke(&save, &["place", "farm", "4", "4"]);
        assert!(rejected.is_err());

        let listed = invoke(&save, &["list"]).expect("list succeeds");
        assert_eq!(listed.lines().count(), 1);
        assert!(listed.contains("\thouse\t(5, 5)\t2x2"));

        let deleted = invoke(&save, &["delete", "6", "6"]).expect("delete succeeds");
        assert!(deleted.starts_with("deleted house_"));
        let empty = invoke(&save, &["delete", "6", "6"]).expect("delete succeeds");
        assert_eq!(empty, "no building at (6, 6)\n");

        assert!(invoke(&save, &["list"]).expect("list succeeds").is_empty());
    }

    #[test]
    fn show_draws_placed_buildings() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let save = dir.path().join("SaveData.json");
        let _ = invoke(&save, &["place", "tower", "0", "0"]).expect("tower fits");

        let shown = invoke(&save, &["show"]).expect("show succeeds");
        let lines: Vec<&str> = shown.lines().collect();
        assert_eq!(lines.len(), 30);
        assert!(lines[28].ends_with(&format!("t{}", ".".repeat(39))));
        assert!(lines[29].ends_with(&format!("t{}", ".".repeat(39))));
    }

    #[test]
    fn migrate_rewrites_legacy_documents() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let save = dir.path().join("SaveData.json");
        fs::write(
            &save,
            r#"{ "buildings": [ { "id": "farm", "x": 2, "y": 3, "w": 3, "h": 3 } ] }"#,
        )
        .expect("seed legacy document");

        let migrated = invoke(&save, &["migrate"]).expect("migration succeeds");
        assert!(migrated.contains("from version 1 to 2"));

        let again = invoke(&save, &["migrate"]).expect("second run succeeds");
        assert!(again.contains("already at version 2"));
    }

    #[test]
    fn unknown_building_type_is_an_error() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let save = dir.path().join("SaveData.json");
        assert!(invoke(&save, &["place", "castle", "1", "1"]).is_err());
        assert!(!save.exists());
    }

    #[test]
    fn catalog_lists_builtin_types() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let listed = invoke(&dir.path().join("unused.json"), &["catalog"]).expect("catalog");
        let ids: Vec<&str> = listed
            .lines()
            .filter_map(|line| line.split('\t').nth(1))
            .collect();
        assert_eq!(ids, ["house", "farm", "tower"]);
    }
}
