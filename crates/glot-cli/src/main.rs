use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use glot_services::Engine;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "glot", version, about = "Message catalog & style resolution toolkit (Rust)")]
struct Cli {
    /// Путь к каталогу (.i18n/.bin — бинарный формат, иначе текст)
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Строгая загрузка: любая ошибка формата фатальна
    #[arg(long, global = true)]
    strict: bool,

    /// Писать подробный лог в указанную директорию
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Подавить консольные логи
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a token with positional arguments
    Translate {
        token: String,
        args: Vec<String>,
    },

    /// Resolve a token after plural variant selection
    Plural {
        token: String,
        count: i64,
        args: Vec<String>,
    },

    /// Print the canonical style string and the native physical record
    Style {
        token: String,
        args: Vec<String>,
    },

    /// List the catalog as a deterministic table
    Dump {
        #[arg(long, default_value = "text")]
        format: String,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Case-insensitive substring search over templates and labels
    Find {
        query: String,
    },

    /// Run catalog integrity checks; process exit code mirrors the report
    Check {
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Export the catalog as a v2 binary file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

fn load_engine(catalog: Option<PathBuf>, strict_flag: bool) -> Result<Engine> {
    let config = glot_config::load_config().unwrap_or_default();
    let path = catalog
        .or_else(|| config.catalog.as_deref().map(PathBuf::from))
        .ok_or_else(|| eyre!("no catalog given: pass --catalog or set `catalog` in glot.toml"))?;
    let strict = strict_flag || config.strict.unwrap_or(false);

    let engine = Engine::new();
    if engine.load_file(&path, strict).is_err() {
        return Err(eyre!(
            "failed to load {}: {}",
            path.display(),
            engine.last_error()
        ));
    }
    Ok(engine)
}

fn run(cli: Cli) -> Result<i32> {
    let config = glot_config::load_config().unwrap_or_default();
    info!("▶ Starting command: {:?}", cli.cmd);

    match cli.cmd {
        Commands::Translate { ref token, ref args } => {
            debug!("Translate args: token={token:?} args={args:?}");
            let engine = load_engine(cli.catalog, cli.strict)?;
            println!("{}", engine.translate(token, args));
        }

        Commands::Plural {
            ref token,
            count,
            ref args,
        } => {
            debug!("Plural args: token={token:?} count={count} args={args:?}");
            let engine = load_engine(cli.catalog, cli.strict)?;
            println!("{}", engine.translate_plural(token, count, args));
        }

        Commands::Style { ref token, ref args } => {
            debug!("Style args: token={token:?} args={args:?}");
            let engine = load_engine(cli.catalog, cli.strict)?;
            let style = engine.native_style(token, args);
            println!("{}", engine.translate(token, args));
            println!(
                "mass: {} | friction: {} | restitution: {} | drag: {} | gravity-scale: {} | spacing: {} | physical: {}",
                style.mass,
                style.friction,
                style.restitution,
                style.drag,
                style.gravity_scale,
                style.spacing,
                style.has_physical
            );
        }

        Commands::Dump { ref format, limit } => {
            let engine = load_engine(cli.catalog, cli.strict)?;
            let limit = limit.or(config.list_limit);
            match format.as_str() {
                "text" => {
                    let table = engine.dump_table();
                    match limit {
                        // Две строки заголовка + limit строк данных.
                        Some(n) => {
                            for line in table.lines().take(2 + n) {
                                println!("{line}");
                            }
                        }
                        None => print!("{table}"),
                    }
                }
                "json" => {
                    let mut rows = engine.dump_rows();
                    if let Some(n) = limit {
                        rows.truncate(n);
                    }
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
                other => return Err(eyre!("unknown format '{other}' (use text|json)")),
            }
        }

        Commands::Find { ref query } => {
            let engine = load_engine(cli.catalog, cli.strict)?;
            print!("{}", engine.find_any(query));
        }

        Commands::Check { ref format } => {
            let engine = load_engine(cli.catalog, cli.strict)?;
            match format.as_str() {
                "text" => {
                    let (report, code) = engine.check_report();
                    print!("{report}");
                    return Ok(code);
                }
                "json" => {
                    let summary = engine.check_summary();
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                    return Ok(summary.code);
                }
                other => return Err(eyre!("unknown format '{other}' (use text|json)")),
            }
        }

        Commands::Export { ref out } => {
            let engine = load_engine(cli.catalog, cli.strict)?;
            if engine.export_binary(out).is_err() {
                return Err(eyre!("export failed: {}", engine.last_error()));
            }
            println!("✔ Binary catalog saved to {}", out.display());
        }
    }

    Ok(0)
}

fn init_tracing(
    quiet: bool,
    log_dir: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let console_layer = (!quiet).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
    });

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = rolling::daily(dir, "glot.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let guard = init_tracing(cli.quiet, cli.log_dir.as_deref());

    let code = run(cli)?;
    drop(guard);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
