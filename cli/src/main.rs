use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tap_common::db::core::LayoutDB;
use tap_common::db::writer::save_def;
use tap_common::util::config::Config;
use tap_common::util::generator::{self, FloorplanParams};
use tap_common::util::{check, logger, visualization};
use tapcell::{Options, Tapcell};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut rows, insert every configured filler and write the result.
    Run,
    /// Only split rows around macros.
    Cut,
    /// Delete instances whose name starts with PREFIX.
    Remove {
        #[arg(long)]
        prefix: String,
    },
    /// Write a random floorplan DEF and a matching LEF library.
    Generate {
        #[arg(long, default_value_t = 40)]
        rows: usize,
        #[arg(long, default_value_t = 500)]
        sites: i64,
        #[arg(long, default_value_t = 3)]
        macros: usize,
        #[arg(long, default_value = "inputs/floorplan.def")]
        output: String,
        #[arg(long, default_value = "inputs/tech.lef")]
        lef: String,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let command = args.command.unwrap_or(Commands::Run);

    match command {
        Commands::Generate {
            rows,
            sites,
            macros,
            output,
            lef,
        } => {
            prepare_output_dir(&output)?;
            prepare_output_dir(&lef)?;
            let params = FloorplanParams {
                num_rows: rows,
                sites_per_row: sites,
                num_macros: macros,
                ..FloorplanParams::default()
            };
            generator::generate_library_lef(&lef, &params)?;
            let placed = generator::generate_random_floorplan(&output, &params)?;
            log::info!("Generated: {} and {} ({} macros)", lef, output, placed.len());
        }
        Commands::Run => {
            validate_input_paths(&config)?;
            prepare_output_dir(&config.input.output_def)?;
            if let Err(e) = run_tapcell(&config) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Cut => {
            validate_input_paths(&config)?;
            prepare_output_dir(&config.input.output_def)?;
            let mut db = load_design(&config)?;
            let options = Options::from_config(&config.tapcell, &db)?;
            Tapcell::init(&mut db).cut_rows(&options);
            write_output(&db, &config)?;
        }
        Commands::Remove { prefix } => {
            validate_input_paths(&config)?;
            prepare_output_dir(&config.input.output_def)?;
            let mut db = load_design(&config)?;
            let removed = Tapcell::init(&mut db).remove_cells(&prefix);
            if removed == 0 {
                log::warn!("No instances start with '{}'", prefix);
            }
            write_output(&db, &config)?;
        }
    }

    Ok(())
}

fn validate_input_paths(config: &Config) -> anyhow::Result<()> {
    for lef in &config.input.lef_files {
        if !Path::new(lef).exists() {
            return Err(anyhow::anyhow!("Input LEF file missing: {}", lef));
        }
    }
    if !Path::new(&config.input.def_file).exists() {
        return Err(anyhow::anyhow!(
            "Input DEF file missing: {}",
            config.input.def_file
        ));
    }
    Ok(())
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn load_design(config: &Config) -> anyhow::Result<LayoutDB> {
    let mut db = LayoutDB::new();
    for lef_path in &config.input.lef_files {
        log::info!("Parsing LEF: {}", lef_path);
        tap_common::db::parser::lef::parse(&mut db, lef_path)
            .map_err(|e| anyhow::anyhow!("Invalid LEF syntax in '{}': {}", lef_path, e))?;
    }

    log::info!("Parsing DEF: {}", config.input.def_file);
    tap_common::db::parser::def::parse(&mut db, &config.input.def_file).map_err(|e| {
        anyhow::anyhow!("Invalid DEF syntax in '{}': {}", config.input.def_file, e)
    })?;

    log::info!(
        "Design {}: {} masters, {} rows, {} instances",
        db.design,
        db.num_masters(),
        db.num_rows(),
        db.num_insts()
    );
    Ok(db)
}

fn run_tapcell(config: &Config) -> anyhow::Result<()> {
    let mut db = load_design(config)?;
    let options = Options::from_config(&config.tapcell, &db)?;

    {
        let mut tapcell = Tapcell::init(&mut db);
        tapcell.set_tap_prefix(config.tapcell.tap_prefix.clone());
        tapcell.set_endcap_prefix(config.tapcell.endcap_prefix.clone());

        tapcell.cut_rows(&options);
        let summary = tapcell.run(&options)?;
        log::info!(
            "Endcaps: {}, top/bottom: {}, around macros: {}, tapcells: {}",
            summary.endcaps,
            summary.top_bottom,
            summary.around_macros,
            summary.tapcells
        );
    }

    if let Err(e) = check::run_filler_check(&db) {
        return Err(anyhow::anyhow!(e));
    }

    write_output(&db, config)
}

fn write_output(db: &LayoutDB, config: &Config) -> anyhow::Result<()> {
    if let Some(image) = &config.output.image {
        prepare_output_dir(image)?;
        log::info!("Generating floorplan visualization...");
        let size = config.output.image_size;
        visualization::draw_floorplan(db, image, size, size);
    }

    log::info!("Writing DEF to {}", config.input.output_def);
    save_def(db, &config.input.output_def)?;
    Ok(())
}
