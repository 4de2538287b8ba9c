mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands, ParseArgs};
use divi_blocks_config::Config;
use divi_blocks_engine::preset::ModuleDefinition;
use divi_blocks_engine::{
    BlockParser, BlockParserStore, FilterMode, GlobalData, GlobalPreset, LayoutType, MemoryHost,
    MemoryOptions, ModuleRegistry, NullHost, Post, ROOT_ID, layout_types, normalize_blocks,
    serialize_blocks,
};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "divi-blocks.toml";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    // init must not read the file it is about to replace
    let config = match cli.command {
        Commands::Init { .. } => Config::default(),
        _ => Config::load_or_default(&config_path)?,
    };
    log::debug!("Using config from {}", config_path.display());

    match cli.command {
        Commands::Init { force } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists, use --force to replace it",
                    config_path.display()
                );
            }
            config.save_to_path(&config_path)?;
            println!("Wrote {}", config_path.display());
        }
        Commands::Parse {
            file,
            parse,
            normalize,
            serialize,
        } => {
            let content = read_input(file.as_deref())?;
            let host = load_host(&parse)?;
            let mut store = BlockParserStore::new();
            let mut blocks = BlockParser::new(config.parser.clone())
                .with_mode(parse.mode.into())
                .parse(&content, &mut store, &host);
            if normalize {
                blocks = normalize_blocks(blocks, config.parser.max_block_depth);
            }

            if serialize {
                print!("{}", serialize_blocks(&blocks));
            } else {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            }
        }
        Commands::Tree {
            file,
            parse,
            layout,
        } => {
            let content = read_input(file.as_deref())?;
            let host = load_host(&parse)?;
            let layout_type = LayoutType::from_name(&layout);
            if !layout_types(&host).contains(&layout_type) {
                bail!("Unknown layout type: {layout}");
            }

            let mut store = BlockParserStore::new();
            store.set_layout(layout.as_str(), layout_type);
            let mut parser = BlockParser::new(config.parser.clone()).with_mode(parse.mode.into());
            if !parser.handles(&content) {
                log::warn!("No Divi blocks found, nothing is stored");
            }
            parser.parse(&content, &mut store, &host);
            print_tree(&store, ROOT_ID, 0);
        }
        Commands::Presets {
            module,
            attrs,
            presets,
            modules,
            global_data,
            classes,
        } => {
            let attrs: Value =
                serde_json::from_str(&attrs).context("--attrs is not valid JSON")?;

            let mut options = MemoryOptions::new();
            if let Some(path) = presets {
                options = options.with(&config.presets.option_key, read_json(&path)?);
            }
            let mut registry = ModuleRegistry::new();
            if let Some(path) = modules {
                let definitions: Vec<ModuleDefinition> = serde_json::from_value(read_json(&path)?)
                    .with_context(|| format!("Invalid module definitions in {}", path.display()))?;
                for definition in definitions {
                    registry.register(definition);
                }
            }
            let presets = GlobalPreset::from_options(&options, registry, config.presets.clone())?;

            if classes {
                for name in presets.selector_class_names(&module, &attrs) {
                    println!("{name}");
                }
                return Ok(());
            }

            let mut merged = presets.get_merged_attrs(&module, Some(&attrs), &NullHost)?;
            if let Some(path) = global_data {
                let data = load_global_data(&path, &config)?;
                merged = data.resolve_attrs(
                    &merged,
                    FilterMode::from_nest_flag(config.global_data.nest_filters),
                );
            }
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
        Commands::Color {
            value,
            global_data,
            nest,
        } => {
            let data = match global_data {
                Some(path) => load_global_data(&path, &config)?,
                None => GlobalData::new(config.global_data.max_depth),
            };
            let mode = FilterMode::from_nest_flag(nest || config.global_data.nest_filters);
            println!("{}", data.resolve_color(&value, mode));
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read stdin")?;
            Ok(content)
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn load_global_data(path: &Path, config: &Config) -> Result<GlobalData> {
    let options = MemoryOptions::new().with(&config.global_data.option_key, read_json(path)?);
    Ok(GlobalData::from_options(&options, &config.global_data)?)
}

/// A host whose posts are the `<id>.html` files of `--layouts-dir`.
fn load_host(args: &ParseArgs) -> Result<MemoryHost> {
    let mut host = MemoryHost::new();
    let Some(dir) = &args.layouts_dir else {
        return Ok(host);
    };

    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        log::debug!("Loaded layout {id} from {}", path.display());
        host.insert_post(Post::layout(id, content));
    }
    Ok(host)
}

fn print_tree(store: &BlockParserStore, id: &str, depth: usize) {
    for child in store.get_children(id) {
        println!(
            "{}{} [{}]",
            "  ".repeat(depth),
            child.id,
            child.layout_type
        );
        print_tree(store, child.id.as_str(), depth + 1);
    }
}
