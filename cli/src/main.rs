use clap::{Parser, Subcommand};
use regex::Regex;
use std::fs;
use std::path::PathBuf;

use xidl::{compile_file, to_json, Layout, NormalizedSchema, RenderOptions, XidlError};

#[derive(Parser)]
#[command(name = "xidl")]
#[command(about = "Compile FlatBuffers reflection schemas into WAMP interface documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a `.bfbs` schema to a JSON document
    Compile {
        /// Input `.bfbs` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// Document layout: `uri` or `listing`
        #[arg(long, default_value = "uri")]
        layout: Layout,

        /// Keep only definitions whose qualified name matches this regex
        #[arg(long)]
        only: Option<Regex>,
    },

    /// Print the interfaces of a `.bfbs` schema and their slots
    Inspect {
        /// Input `.bfbs` file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn warn_anomalies(schema: &NormalizedSchema) {
    for anomaly in &schema.anomalies {
        eprintln!("warning: {anomaly}");
    }
}

fn main() -> Result<(), XidlError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { input, output, pretty, layout, only } => {
            let schema = compile_file(&input)?;
            warn_anomalies(&schema);

            let json = to_json(&schema, &RenderOptions { layout, pretty, only })?;
            if let Some(out_path) = output {
                fs::write(&out_path, json)?;
                let out_path = fs::canonicalize(&out_path)?;
                println!("output file written: {}", out_path.display());
            } else {
                println!("{json}");
            }
            Ok(())
        }

        Commands::Inspect { input } => {
            let schema = compile_file(&input)?;
            warn_anomalies(&schema);

            let meta = &schema.meta;
            println!("file:       {}", meta.filepath);
            println!("identifier: {}", meta.file_ident);
            println!("extension:  {}", meta.file_ext);
            println!("root:       {}", meta.root.as_deref().unwrap_or("-"));
            println!(
                "{} enums, {} tables, {} interfaces",
                schema.enums.len(),
                schema.objects.len(),
                schema.services.len()
            );

            for service in &schema.services {
                println!();
                match &service.uuid {
                    Some(uuid) => println!("interface {} ({uuid})", service.name),
                    None => println!("interface {}", service.name),
                }
                for call in service.calls.values() {
                    println!("{:>12}: {}", call.kind.as_str(), call.name);
                }
            }
            Ok(())
        }
    }
}
