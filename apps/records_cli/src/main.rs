use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{load_settings, RecordsClient, Settings};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod surface;

use surface::TerminalSurface;

#[derive(Parser, Debug)]
#[command(name = "records", about = "School records contract client")]
struct Cli {
    /// TOML settings file; `records.toml` is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    rpc_url: Option<String>,
    #[arg(long, global = true)]
    contract: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the roster in listing order.
    Students,
    AddTeacher {
        address: String,
    },
    AddStudent {
        address: String,
        id: String,
        name: String,
    },
    AssignGrade {
        address: String,
        subject: String,
        grade: String,
    },
    Grades {
        address: String,
        /// Subject to query; repeat for several. Defaults to the configured list.
        #[arg(long = "subject")]
        subjects: Vec<String>,
    },
    /// Show the admin, the signing account and its teacher flag.
    Status {
        address: Option<String>,
    },
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = load_settings(self.config.as_deref());
        if let Some(rpc_url) = &self.rpc_url {
            settings.rpc_url = rpc_url.clone();
        }
        if let Some(contract) = &self.contract {
            settings.contract_address = contract.clone();
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let settings = cli.settings();
    info!(rpc_url = %settings.rpc_url, command = ?cli.command, "records: starting");
    let client = RecordsClient::connect(&settings, Arc::new(TerminalSurface))
        .inspect_err(|err| error!(error = %format!("{err:#}"), "records: cannot connect"))?;

    match cli.command {
        Command::Students => {
            client.load_students().await?;
        }
        Command::AddTeacher { address } => {
            let tx_hash = client.add_teacher(&address).await?;
            println!("tx_hash={tx_hash}");
        }
        Command::AddStudent { address, id, name } => {
            let tx_hash = client.add_student(&address, &id, &name).await?;
            println!("tx_hash={tx_hash}");
        }
        Command::AssignGrade {
            address,
            subject,
            grade,
        } => {
            let tx_hash = client.assign_grade(&address, &subject, &grade).await?;
            println!("tx_hash={tx_hash}");
        }
        Command::Grades { address, subjects } => {
            if subjects.is_empty() {
                client.view_grades(&address).await?;
            } else {
                client.view_grades_for(&address, &subjects).await?;
            }
        }
        Command::Status { address } => {
            let admin = client.admin().await?;
            println!("admin={admin}");
            let account = match address {
                Some(address) => address,
                None => {
                    let identity = client.primary_identity().await?;
                    println!("signer={identity}");
                    identity.to_string()
                }
            };
            let teacher = client.is_teacher(&account).await?;
            println!("{account} teacher={teacher}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_collects_repeated_subjects() {
        let cli = Cli::try_parse_from([
            "records",
            "grades",
            "0xabc",
            "--subject",
            "Math",
            "--subject",
            "Art",
        ])
        .expect("parse");

        match cli.command {
            Command::Grades { address, subjects } => {
                assert_eq!(address, "0xabc");
                assert_eq!(subjects, vec!["Math", "Art"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_override_loaded_settings() {
        let cli = Cli::try_parse_from([
            "records",
            "students",
            "--rpc-url",
            "http://node:8545",
            "--contract",
            "0x0000000000000000000000000000000000000001",
        ])
        .expect("parse");

        let settings = cli.settings();
        assert_eq!(settings.rpc_url, "http://node:8545");
        assert_eq!(
            settings.contract_address,
            "0x0000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn add_student_takes_three_positionals() {
        let cli = Cli::try_parse_from(["records", "add-student", "0xabc", "7", "Alice Smith"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::AddStudent { ref name, .. } if name == "Alice Smith"
        ));
    }
}
