use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use soundbite::auth::key_store;
use soundbite::condense::Condenser;
use soundbite::config::{CONDENSER_SECTION, Config, SCRIPT_SECTION, load_config, resolve_api_key};
use soundbite::llm::HttpChatClient;
use soundbite::mail::digest::read_payloads;
use soundbite::script::{save_script, script_file_name, write_script};
use soundbite::store::batch::{batch_file_name, read_batch_file, write_batch_file};

#[derive(Parser)]
#[command(name = "soundbite")]
#[command(about = "Newsletter emails to condensed sound bites", long_about = None)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract articles from message dumps (.json) or .eml files into one batch file
    Digest {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the tracked links of the first message in an input
    Links { input: PathBuf },

    /// Condense a text document, or every article of a batch file, to the configured length band
    Condense {
        input: PathBuf,

        /// Treat the input as a batch file and condense each article
        #[arg(long)]
        batch: bool,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write a podcast script for a batch file
    Script {
        batch: PathBuf,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Store an API key in the keyring
    SetApiKey {
        #[arg(long, value_parser = [CONDENSER_SECTION, SCRIPT_SECTION])]
        service: String,
    },
}

fn config(path: Option<&Path>) -> Result<Config> {
    load_config(path).map_err(|e| anyhow!("Configuration error: {e}"))
}

/// `shortened_<name>` next to the input.
fn shortened_path(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| anyhow!("{} has no file name", input.display()))?;
    Ok(input.with_file_name(format!("shortened_{}", name.to_string_lossy())))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.cmd {
        Command::SetApiKey { service } => {
            eprintln!("Paste API key (end with Ctrl-D):");
            let mut key = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut key)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(anyhow!("empty API key"));
            }
            key_store::save_api_key(&service, key)?;
            println!("Saved API key for [{}]", service);
            Ok(())
        }

        Command::Digest { inputs, output } => {
            let cfg = config(config_path)?;
            let digest = cfg.digest.digest()?;

            let mut payloads = Vec::new();
            for input in &inputs {
                match read_payloads(input) {
                    Ok(mut p) => payloads.append(&mut p),
                    Err(e) => log::warn!("skipping {}: {e:#}", input.display()),
                }
            }

            let articles = digest.collect(&payloads);
            if articles.is_empty() {
                return Err(anyhow!("no articles found in {} message(s)", payloads.len()));
            }

            let output = output
                .unwrap_or_else(|| PathBuf::from(batch_file_name(chrono::Local::now().naive_local())));
            write_batch_file(&output, &articles)?;
            println!("Wrote {} article(s) to {}", articles.len(), output.display());
            Ok(())
        }

        Command::Links { input } => {
            let cfg = config(config_path)?;
            let extractor = cfg.digest.extractor()?;
            let payloads = read_payloads(&input)?;
            let first = payloads
                .first()
                .ok_or_else(|| anyhow!("no messages in {}", input.display()))?;
            for (text, url) in extractor.extract_payload_links(first) {
                println!("{text}\t{url}");
            }
            Ok(())
        }

        Command::Condense {
            input,
            batch,
            output,
        } => {
            let cfg = config(config_path)?;
            let api_key = resolve_api_key(CONDENSER_SECTION, &cfg.condenser.api_key_env)?;
            let client = HttpChatClient::new(cfg.condenser.chat_settings(api_key))?;
            log::info!("condensing with {}", client.model());
            let condenser = Condenser::new(&client, cfg.condenser.length_target());

            let output = match output {
                Some(p) => p,
                None => shortened_path(&input)?,
            };
            if batch {
                let articles = read_batch_file(&input)?;
                if articles.is_empty() {
                    return Err(anyhow!("no articles in {}", input.display()));
                }
                write_batch_file(&output, &condenser.condense_batch(&articles))?;
            } else {
                let document = std::fs::read_to_string(&input)?;
                std::fs::write(&output, condenser.condense_document(&document))?;
            }
            println!("Wrote {}", output.display());
            Ok(())
        }

        Command::Script { batch, output } => {
            let cfg = config(config_path)?;
            let articles = read_batch_file(&batch)?;
            if articles.is_empty() {
                return Err(anyhow!("no articles in {}", batch.display()));
            }

            let api_key = resolve_api_key(SCRIPT_SECTION, &cfg.script.api_key_env)?;
            let client = HttpChatClient::new(cfg.script.chat_settings(api_key))?;
            let script = write_script(&client, &articles)
                .ok_or_else(|| anyhow!("script generation failed"))?;

            let output = output.unwrap_or_else(|| PathBuf::from(script_file_name(&articles)));
            save_script(&output, &script)?;
            println!("Wrote {}", output.display());
            Ok(())
        }
    }
}
