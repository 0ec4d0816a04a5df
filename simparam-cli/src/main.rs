use clap::{Parser, Subcommand};
use simparam::{
    Element, ElementPtr, ParamRegistry, PhysicsEngine, TypedValue, ValueKind, config,
    physics::{DefaultBackend, engine::TYPE},
};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(about = "Inspect and edit physics engine parameters")]
struct Args {
    /// JSON file of overrides applied to the <physics> description
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    #[arg(short, long, default_value = "ode", help = "Physics engine type")]
    engine: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every description parameter with its type and value
    Show,
    /// Print one engine parameter
    Get { key: String },
    /// Set one engine parameter, parsed as the parameter's current type
    Set { key: String, value: String },
    /// Print the canonical form of TEXT parsed as KIND
    Parse { kind: String, text: String },
    /// Print the <physics> description reflecting live values
    Sdf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Parse { kind, text } => {
            let kind = ValueKind::from_tag(kind)?;
            println!("{}", TypedValue::parse(kind, text)?);
        }
        Command::Show => {
            let session = Session::load(&args)?;
            for param in session.registry.iter() {
                let param = param.read();
                let marker = if param.is_set() { "*" } else { " " };
                println!(
                    "{marker} {:<24} {:<12} {}",
                    param.key(),
                    param.type_name(),
                    param.as_string()
                );
            }
        }
        Command::Get { key } => {
            let session = Session::load(&args)?;
            match session.engine.get_param(key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown parameter [{key}]").into()),
            }
        }
        Command::Set { key, value } => {
            let mut session = Session::load(&args)?;
            let engine = &mut session.engine;
            let current = engine
                .get_param(key)
                .ok_or_else(|| format!("unknown parameter [{key}]"))?;
            let value = TypedValue::parse(current.kind(), value)?;
            engine.try_set_param(key, &value)?;
            println!("{key} = {}", engine.get_param(key).unwrap_or(value));
        }
        Command::Sdf => {
            let session = Session::load(&args)?;
            print!("{}", session.engine.sdf().to_sdf_string());
        }
    }
    Ok(())
}

/// Description element, its registered parameters and the engine loaded from it.
struct Session {
    registry: ParamRegistry,
    _sdf: ElementPtr,
    engine: PhysicsEngine,
}

impl Session {
    fn load(args: &Args) -> Result<Self> {
        let mut registry = ParamRegistry::new();
        let sdf = Element::physics_template(Some(&mut registry))?;
        if let Some(attr) = sdf.attribute(TYPE) {
            attr.write().try_set_from_string(&args.engine)?;
        }
        if let Some(path) = &args.config {
            let json = std::fs::read_to_string(path)?;
            let applied = config::apply_json_overrides(&sdf, &json)?;
            tracing::info!("Applied {} overrides from {}", applied, path.display());
        }

        let engine_type = sdf.get::<String>(TYPE)?;
        let mut engine = PhysicsEngine::new(DefaultBackend::new(engine_type))?;
        engine.load(&sdf)?;
        Ok(Self {
            registry,
            _sdf: sdf,
            engine,
        })
    }
}
